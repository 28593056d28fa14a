use thiserror::Error;

use crate::ballot_box::BallotBoxStatus;

/// Errors produced by type operations.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypeError {
    #[error("cannot {action} a ballot box in state {from}")]
    IllegalTransition {
        action: &'static str,
        from: BallotBoxStatus,
    },

    #[error("unknown ballot box status: {0}")]
    UnknownStatus(String),

    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid period: end {end} is not after start {start}")]
    InvalidPeriod { start: String, end: String },
}
