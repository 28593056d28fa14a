//! Liveness signalling between a session's watcher and its engine.
//!
//! The watcher never touches session or ledger state. It only bumps a
//! counter; the engine notices the change, wakes from its blocking read and
//! re-checks the session itself.

use std::sync::Arc;

use tokio::sync::{broadcast::error::RecvError, watch};
use tokio::task::JoinHandle;
use tracing::{debug, trace};
use urna_store::EventStream;
use urna_types::BallotBoxId;

/// Requests a liveness check from one engine. Cheap to clone.
#[derive(Clone, Debug)]
pub struct LivenessHandle {
    tx: Arc<watch::Sender<u64>>,
}

impl LivenessHandle {
    /// Ask the engine to re-check its session.
    pub fn request_check(&self) {
        self.tx.send_modify(|pending| *pending = pending.wrapping_add(1));
    }
}

/// The engine's side of the liveness channel.
#[derive(Debug)]
pub struct LivenessSignal {
    rx: watch::Receiver<u64>,
    open: bool,
}

impl LivenessSignal {
    /// Wait for a check request. Cancel safe.
    ///
    /// Once every handle is gone this never resolves.
    pub async fn requested(&mut self) {
        if self.open && self.rx.changed().await.is_ok() {
            return;
        }
        self.open = false;
        std::future::pending::<()>().await
    }
}

/// Create a connected handle and signal.
pub fn liveness_channel() -> (LivenessHandle, LivenessSignal) {
    let (tx, rx) = watch::channel(0);
    (
        LivenessHandle { tx: Arc::new(tx) },
        LivenessSignal { rx, open: true },
    )
}

/// Forward store events about `ballot_box` to the engine as check requests.
///
/// Lagging behind the event stream requests a check as well, since a
/// relevant event may have been dropped.
pub fn spawn_watcher(
    mut events: EventStream,
    ballot_box: BallotBoxId,
    handle: LivenessHandle,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) if event.ballot_box() == ballot_box => {
                    trace!(?event, "liveness check requested");
                    handle.request_check();
                }
                Ok(_) => {}
                Err(RecvError::Lagged(skipped)) => {
                    debug!(skipped, "watcher lagged behind store events");
                    handle.request_check();
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
