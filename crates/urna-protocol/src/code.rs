use std::fmt;

use serde::{Deserialize, Serialize};

/// Numeric error codes sent in `-<code> <message>` lines.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// The election is not active or the ballot box is locked.
    BallotBoxNotPermitted,
    VoterNotFound,
    /// The checksum letters of an external id do not match the voter.
    LettersDontMatch,
    /// The voter already has a vote for one of the requested votings.
    AlreadyParticipated,
    /// The session has ended; the connection is closed after this line.
    SessionTerminated,
    /// Any failure without a dedicated code. The session continues.
    Generic,
}

impl ErrorCode {
    /// The number sent on the wire.
    pub const fn code(self) -> u16 {
        match self {
            Self::BallotBoxNotPermitted => 1001,
            Self::VoterNotFound => 1002,
            Self::LettersDontMatch => 1003,
            Self::AlreadyParticipated => 1004,
            Self::SessionTerminated => 1023,
            Self::Generic => 65533,
        }
    }

    /// Symbolic name, used in logs.
    pub const fn name(self) -> &'static str {
        match self {
            Self::BallotBoxNotPermitted => "ERROR_BALLOTBOX_NOT_PERMITTED",
            Self::VoterNotFound => "ERROR_VOTER_NOT_FOUND",
            Self::LettersDontMatch => "ERROR_LETTERS_DONT_MATCH",
            Self::AlreadyParticipated => "ERROR_ALREADY_PARTICIPATED",
            Self::SessionTerminated => "SESSION_TERMINATED",
            Self::Generic => "GENERIC",
        }
    }

    /// Whether the session ends after this error is reported.
    pub fn terminates_session(self) -> bool {
        matches!(self, Self::SessionTerminated)
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fixed_codes() {
        assert_eq!(ErrorCode::SessionTerminated.code(), 1023);
        assert_eq!(ErrorCode::Generic.code(), 65533);
        assert_eq!(ErrorCode::VoterNotFound.name(), "ERROR_VOTER_NOT_FOUND");
    }

    #[test]
    fn only_session_terminated_ends_the_session() {
        assert!(ErrorCode::SessionTerminated.terminates_session());
        assert!(!ErrorCode::Generic.terminates_session());
        assert!(!ErrorCode::BallotBoxNotPermitted.terminates_session());
    }
}
