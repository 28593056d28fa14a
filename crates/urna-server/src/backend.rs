use std::sync::Arc;

use urna_ledger::VotingLedger;
use urna_store::{InMemoryRegistry, InMemoryVoteStore, Registry, SessionLifecycle, VoteStore};

/// The storage collaborators a session works against.
#[derive(Clone)]
pub struct Backend {
    pub registry: Arc<dyn Registry>,
    pub sessions: Arc<dyn SessionLifecycle>,
    pub votes: Arc<dyn VoteStore>,
}

impl Backend {
    /// Bundle explicit collaborator implementations.
    pub fn new(
        registry: Arc<dyn Registry>,
        sessions: Arc<dyn SessionLifecycle>,
        votes: Arc<dyn VoteStore>,
    ) -> Self {
        Self {
            registry,
            sessions,
            votes,
        }
    }

    /// In-memory registry doubling as session lifecycle, with an empty vote
    /// table.
    pub fn in_memory(registry: InMemoryRegistry) -> Self {
        let registry = Arc::new(registry);
        Self {
            registry: registry.clone(),
            sessions: registry,
            votes: Arc::new(InMemoryVoteStore::new()),
        }
    }

    /// A ledger over this backend's vote store.
    pub fn ledger(&self) -> VotingLedger {
        VotingLedger::new(self.votes.clone())
    }
}

impl std::fmt::Debug for Backend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Backend").finish_non_exhaustive()
    }
}
