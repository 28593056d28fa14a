//! The per-terminal read, dispatch and write loop.

use std::fmt;

use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, error, info, trace, warn};
use urna_ledger::{LedgerError, VotingLedger};
use urna_protocol::{
    LineReader, LineTerminator, LineWriter, ProtocolError, ProtocolResult, Request, Response,
};
use urna_store::StoreError;
use urna_types::{BallotBox, BallotBoxId, Election, Session};

use crate::backend::Backend;
use crate::commands::{Command, CommandContext, CommandOutput, LoopControl};
use crate::error::{CommandError, CommandResult, ServerResult};
use crate::watcher::{liveness_channel, spawn_watcher, LivenessHandle, LivenessSignal};

/// Why a session ended.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum TerminationReason {
    /// The terminal sent `quit`.
    Quit,
    /// The terminal closed its side of the stream.
    EndOfStream,
    /// The session was stopped or became invalid; `-1023` was sent.
    SessionTerminated(String),
    /// Reading or writing the stream failed. Nothing more is sent.
    Transport(String),
}

impl fmt::Display for TerminationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Quit => f.write_str("quit"),
            Self::EndOfStream => f.write_str("end of stream"),
            Self::SessionTerminated(message) => write!(f, "session terminated: {message}"),
            Self::Transport(message) => write!(f, "transport failure: {message}"),
        }
    }
}

/// Lifecycle of a [`ProtocolEngine`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EngineState {
    Running,
    Terminated(TerminationReason),
}

enum Wake {
    LivenessCheck,
    Line(ProtocolResult<Option<String>>),
}

/// Drives one terminal session against one ballot box.
///
/// Each round-trip re-validates the session, the ballot box and its
/// election before the command runs. A concurrent watcher may request a
/// liveness check at any time through [`LivenessHandle`]; the engine picks it
/// up even while blocked on a read.
pub struct ProtocolEngine<R, W> {
    backend: Backend,
    ledger: VotingLedger,
    ballot_box: BallotBoxId,
    reader: LineReader<R>,
    writer: LineWriter<W>,
    liveness: LivenessHandle,
    signal: LivenessSignal,
    state: EngineState,
}

impl<R, W> ProtocolEngine<R, W>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    /// Create an engine for one connection. Nothing is read until
    /// [`Self::run`].
    pub fn new(
        backend: Backend,
        ballot_box: BallotBoxId,
        reader: R,
        writer: W,
        terminator: LineTerminator,
    ) -> Self {
        let (liveness, signal) = liveness_channel();
        Self {
            ledger: backend.ledger(),
            backend,
            ballot_box,
            reader: LineReader::new(reader, terminator.clone()),
            writer: LineWriter::new(writer, terminator),
            liveness,
            signal,
            state: EngineState::Running,
        }
    }

    /// A handle other tasks can use to request a liveness check.
    pub fn liveness_handle(&self) -> LivenessHandle {
        self.liveness.clone()
    }

    /// Current state; `Terminated` once `run` returned.
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Start a session and serve the terminal until the session ends.
    ///
    /// Fails only if no session can be started. Everything after that ends
    /// in a [`TerminationReason`].
    pub async fn run(&mut self) -> ServerResult<TerminationReason> {
        Command::validate_registry()?;
        let events = self.backend.registry.subscribe();
        let mut session = self.backend.sessions.start(self.ballot_box)?;
        let watcher = spawn_watcher(events, self.ballot_box, self.liveness.clone());
        info!(session = %session.token, "session started");

        let reason = loop {
            if let LoopControl::Terminate(reason) = self.round_trip(&mut session).await {
                break reason;
            }
        };

        watcher.abort();
        if let Err(error) = self.backend.sessions.finish(&session) {
            warn!(%error, "could not mark session finished");
        }
        if let Err(error) = self.writer.shutdown().await {
            debug!(%error, "shutdown after session end failed");
        }
        info!(session = %session.token, %reason, "session ended");
        self.state = EngineState::Terminated(reason.clone());
        Ok(reason)
    }

    async fn round_trip(&mut self, session: &mut Session) -> LoopControl {
        let wake = tokio::select! {
            biased;
            () = self.signal.requested() => Wake::LivenessCheck,
            read = self.reader.next_line() => Wake::Line(read),
        };

        let line = match wake {
            Wake::LivenessCheck => {
                debug!("liveness check");
                return match self.check_session(session) {
                    Ok(()) => LoopControl::Continue,
                    Err(error) => self.report(error).await,
                };
            }
            Wake::Line(Ok(Some(line))) => line,
            Wake::Line(Ok(None)) => return LoopControl::Terminate(TerminationReason::EndOfStream),
            Wake::Line(Err(ProtocolError::Io(error))) => {
                error!(%error, "read failed");
                return LoopControl::Terminate(TerminationReason::Transport(error.to_string()));
            }
            Wake::Line(Err(error)) => return self.report(error.into()).await,
        };

        match self.dispatch(session, &line) {
            Ok(None) => LoopControl::Continue,
            Ok(Some((command, output))) => {
                let response = if command.is_listing() {
                    Response::listing(output.lines)
                } else {
                    Response::ok(output.lines)
                };
                match self.send(&response).await {
                    Ok(()) => output.control,
                    Err(reason) => LoopControl::Terminate(reason),
                }
            }
            Err(error) => self.report(error).await,
        }
    }

    /// Validate, parse and run one line. `Ok(None)` for a blank line.
    fn dispatch(
        &self,
        session: &mut Session,
        line: &str,
    ) -> CommandResult<Option<(Command, CommandOutput)>> {
        let (ballot_box, election) = self.check_availability(session)?;

        let Some(request) = Request::parse(line.trim()) else {
            trace!("keepalive");
            return Ok(None);
        };
        let command = Command::from_name(&request.name)
            .ok_or_else(|| CommandError::UnknownCommand(request.name.clone()))?;
        debug!(%command, params = ?request.params, "command");

        let ctx = CommandContext {
            backend: &self.backend,
            ledger: &self.ledger,
            ballot_box: &ballot_box,
            election: &election,
        };
        let output = command.process(&ctx, &request.params)?;
        Ok(Some((command, output)))
    }

    fn check_session(&self, session: &mut Session) -> CommandResult<()> {
        *session = match self.backend.sessions.refresh(session) {
            Ok(fresh) => fresh,
            Err(StoreError::NotFound { .. }) => {
                return Err(CommandError::SessionTerminated(format!(
                    "session {} no longer exists",
                    session.token
                )))
            }
            Err(error) => return Err(error.into()),
        };
        if !session.is_running() {
            warn!(session = %session.token, "session is no longer running");
            return Err(CommandError::SessionTerminated(format!(
                "session {} was stopped",
                session.token
            )));
        }
        Ok(())
    }

    fn check_availability(&self, session: &mut Session) -> CommandResult<(BallotBox, Election)> {
        self.check_session(session)?;

        let ballot_box = self
            .backend
            .registry
            .ballot_box(self.ballot_box)?
            .ok_or_else(|| {
                CommandError::SessionTerminated(format!("{} no longer exists", self.ballot_box))
            })?;
        let election = self
            .backend
            .registry
            .election(ballot_box.election)?
            .ok_or_else(|| {
                CommandError::SessionTerminated(format!("{} no longer exists", ballot_box.election))
            })?;

        if !election.is_active() {
            warn!(election = %election.id, "election is not active");
            return Err(CommandError::NotPermitted(format!(
                "election {} is not active",
                election.name
            )));
        }
        if !ballot_box.is_available_for_voting_session() {
            warn!(status = %ballot_box.status, "ballot box is locked");
            return Err(CommandError::NotPermitted(format!(
                "ballot box {} is {}",
                ballot_box.name, ballot_box.status
            )));
        }
        Ok((ballot_box, election))
    }

    async fn report(&mut self, error: CommandError) -> LoopControl {
        let code = error.code();
        let message = error.to_string();
        match &error {
            CommandError::Store(_) | CommandError::Ledger(LedgerError::Storage(_)) => {
                warn!(%code, name = code.name(), %message, "command failed")
            }
            _ => debug!(%code, name = code.name(), %message, "command refused"),
        }

        if let Err(reason) = self.send(&Response::error(code, message.clone())).await {
            return LoopControl::Terminate(reason);
        }
        if code.terminates_session() {
            LoopControl::Terminate(TerminationReason::SessionTerminated(message))
        } else {
            LoopControl::Continue
        }
    }

    async fn send(&mut self, response: &Response) -> Result<(), TerminationReason> {
        self.writer.send(response).await.map_err(|error| {
            error!(%error, "write failed");
            TerminationReason::Transport(error.to_string())
        })
    }
}
