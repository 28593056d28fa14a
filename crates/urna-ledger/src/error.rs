use urna_store::StoreError;
use urna_types::{BallotBoxId, ElectionId, VoterId, VotingId};

/// Errors produced by ledger operations.
#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    /// The voter already has a vote row (queued or committed) for the voting.
    #[error("{voter} has already participated in {voting}")]
    AlreadyParticipated { voter: VoterId, voting: VotingId },

    /// The voter is registered for a different election than the box serves.
    #[error("{voter} belongs to {voter_election}, but {ballot_box} serves {box_election}")]
    ForeignVoter {
        voter: VoterId,
        voter_election: ElectionId,
        ballot_box: BallotBoxId,
        box_election: ElectionId,
    },

    /// Infrastructure failure (lock, deadlock, connection). Never retried.
    #[error("storage failure: {0}")]
    Storage(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::UniqueViolation { voter, voting, .. } => {
                Self::AlreadyParticipated { voter, voting }
            }
            other => Self::Storage(other),
        }
    }
}

impl LedgerError {
    /// Whether the caller can recover by correcting its request, as opposed
    /// to an infrastructure failure.
    pub fn is_conflict(&self) -> bool {
        !matches!(self, Self::Storage(_))
    }
}

/// Result type for ledger operations.
pub type LedgerResult<T> = Result<T, LedgerError>;
