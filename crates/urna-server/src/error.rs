use thiserror::Error;
use urna_ledger::LedgerError;
use urna_protocol::{ErrorCode, ProtocolError};
use urna_store::StoreError;
use urna_types::BallotBoxId;

use crate::resolver::ResolveError;

/// Errors that stop a server, a listener, or a session from starting.
#[derive(Debug, Error)]
pub enum ServerError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("ballot box not found: {0}")]
    BallotBoxNotFound(BallotBoxId),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

/// Result type for server operations.
pub type ServerResult<T> = Result<T, ServerError>;

/// Failure of one protocol round-trip. The engine turns it into a
/// `-<code> <message>` line.
#[derive(Debug, Error)]
pub enum CommandError {
    /// The election is not active or the ballot box is locked.
    #[error("{0}")]
    NotPermitted(String),

    #[error("voter not found: {0}")]
    VoterNotFound(String),

    #[error("letters do not match: {0}")]
    LettersDontMatch(String),

    /// The session is over; reported once, then the connection closes.
    #[error("{0}")]
    SessionTerminated(String),

    #[error("unknown command: {0}")]
    UnknownCommand(String),

    #[error("invalid parameter: {0}")]
    InvalidParameter(String),

    #[error(transparent)]
    Ledger(#[from] LedgerError),

    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Line(#[from] ProtocolError),
}

impl CommandError {
    /// The wire code this error is reported with.
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::NotPermitted(_) => ErrorCode::BallotBoxNotPermitted,
            Self::VoterNotFound(_) => ErrorCode::VoterNotFound,
            Self::LettersDontMatch(_) => ErrorCode::LettersDontMatch,
            Self::SessionTerminated(_) => ErrorCode::SessionTerminated,
            Self::Ledger(LedgerError::AlreadyParticipated { .. }) => {
                ErrorCode::AlreadyParticipated
            }
            Self::UnknownCommand(_)
            | Self::InvalidParameter(_)
            | Self::Ledger(_)
            | Self::Store(_)
            | Self::Line(_) => ErrorCode::Generic,
        }
    }

    pub(crate) fn missing(what: &str) -> Self {
        Self::InvalidParameter(format!("missing {what}"))
    }
}

impl From<ResolveError> for CommandError {
    fn from(error: ResolveError) -> Self {
        match error {
            ResolveError::NotFound(id) => Self::VoterNotFound(id),
            ResolveError::LettersMismatch(id) => Self::LettersDontMatch(id),
            ResolveError::Store(e) => Self::Store(e),
        }
    }
}

/// Result type for command execution.
pub type CommandResult<T> = Result<T, CommandError>;

#[cfg(test)]
mod tests {
    use super::*;
    use urna_types::{VoterId, VotingId};

    #[test]
    fn already_participated_has_its_own_code() {
        let err = CommandError::from(LedgerError::AlreadyParticipated {
            voter: VoterId::new(1),
            voting: VotingId::new(2),
        });
        assert_eq!(err.code(), ErrorCode::AlreadyParticipated);
    }

    #[test]
    fn infrastructure_failures_are_generic() {
        let err = CommandError::from(LedgerError::Storage(StoreError::TransactionAborted(
            "deadlock".into(),
        )));
        assert_eq!(err.code(), ErrorCode::Generic);
        assert_eq!(CommandError::UnknownCommand("x".into()).code(), ErrorCode::Generic);
    }

    #[test]
    fn resolver_errors_map_to_voter_codes() {
        let nf = CommandError::from(ResolveError::NotFound("100AB".into()));
        assert_eq!(nf.code(), ErrorCode::VoterNotFound);
        let lm = CommandError::from(ResolveError::LettersMismatch("100YZ".into()));
        assert_eq!(lm.code(), ErrorCode::LettersDontMatch);
    }
}
