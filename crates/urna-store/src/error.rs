use urna_types::{TypeError, VoterId, VotingId};

/// Errors from storage collaborator operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The requested entity does not exist.
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    /// An entity with the same key already exists.
    #[error("duplicate {entity}: {key}")]
    Duplicate { entity: &'static str, key: String },

    /// The `(voter, voting)` uniqueness constraint rejected a vote row.
    #[error("unique constraint {constraint} violated for {voter} in {voting}")]
    UniqueViolation {
        constraint: &'static str,
        voter: VoterId,
        voting: VotingId,
    },

    /// The transaction was chosen as a deadlock victim or failed to serialize.
    #[error("transaction aborted: {0}")]
    TransactionAborted(String),

    /// The backend cannot serve requests (e.g. poisoned lock, lost connection).
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// A guarded ballot-box transition was refused.
    #[error(transparent)]
    Transition(#[from] TypeError),

    /// The election fixture is malformed or inconsistent.
    #[error("invalid fixture: {0}")]
    Fixture(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    /// Whether this error is a uniqueness conflict rather than an
    /// infrastructure failure.
    pub fn is_unique_violation(&self) -> bool {
        matches!(self, Self::UniqueViolation { .. })
    }
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
