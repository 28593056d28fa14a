use tokio::sync::broadcast;
use urna_types::{BallotBoxId, SessionToken};

/// Change notification published by the registry and session lifecycle.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum StoreEvent {
    /// The ballot box's stored state changed (status, credential).
    BallotBoxChanged(BallotBoxId),
    /// A session on the ballot box is no longer running.
    SessionStopped {
        ballot_box: BallotBoxId,
        token: SessionToken,
    },
}

impl StoreEvent {
    /// The ballot box the event concerns.
    pub fn ballot_box(&self) -> BallotBoxId {
        match self {
            Self::BallotBoxChanged(id) => *id,
            Self::SessionStopped { ballot_box, .. } => *ballot_box,
        }
    }
}

/// A broadcast channel receiver for store events.
pub type EventStream = broadcast::Receiver<StoreEvent>;

/// Fan-out publisher shared by the in-memory collaborators.
#[derive(Debug)]
pub(crate) struct EventBus {
    sender: broadcast::Sender<StoreEvent>,
}

impl EventBus {
    pub(crate) fn new(capacity: usize) -> Self {
        let (sender, _) = broadcast::channel(capacity);
        Self { sender }
    }

    pub(crate) fn subscribe(&self) -> EventStream {
        self.sender.subscribe()
    }

    /// Publish an event. Having no subscribers is not an error.
    pub(crate) fn publish(&self, event: StoreEvent) {
        tracing::trace!(?event, receivers = self.sender.receiver_count(), "store event");
        let _ = self.sender.send(event);
    }
}
