use thiserror::Error;
use tracing::debug;
use urna_store::{Registry, StoreError, VoteStore};
use urna_types::{ElectionId, EligibleVoter, MATRICULATION_NUMBER};

/// Number of checksum letters at the end of an external id.
const CHECKSUM_LEN: usize = 2;

/// Why an external voter id did not resolve.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("no voter for {0}")]
    NotFound(String),

    #[error("checksum letters of {0} do not match")]
    LettersMismatch(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Finds voters by external id (`<matriculation number><checksum letters>`).
pub struct VoterResolver<'a> {
    registry: &'a dyn Registry,
    votes: &'a dyn VoteStore,
    election: ElectionId,
}

impl<'a> VoterResolver<'a> {
    /// A resolver for voters of `election`.
    pub fn new(registry: &'a dyn Registry, votes: &'a dyn VoteStore, election: ElectionId) -> Self {
        Self {
            registry,
            votes,
            election,
        }
    }

    /// Resolve an external id to a voter of this election, with their votes
    /// loaded from the vote store.
    ///
    /// Ids too short to carry a matriculation number are not found.
    pub fn find_voter(&self, external_id: &str) -> Result<EligibleVoter, ResolveError> {
        let split = external_id
            .char_indices()
            .rev()
            .nth(CHECKSUM_LEN - 1)
            .map(|(index, _)| index)
            .filter(|&index| index > 0)
            .ok_or_else(|| ResolveError::NotFound(external_id.to_string()))?;
        let (number, letters) = external_id.split_at(split);

        let mut voter = self
            .registry
            .find_voter(self.election, MATRICULATION_NUMBER, number)?
            .ok_or_else(|| ResolveError::NotFound(external_id.to_string()))?;
        if !voter.checksum_matches(letters) {
            debug!(external_id, voter = %voter.id, "checksum mismatch");
            return Err(ResolveError::LettersMismatch(external_id.to_string()));
        }

        voter.votes = self.votes.votes_of(voter.id)?;
        Ok(voter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{self, ELECTION};
    use urna_types::{BallotBoxId, Vote, VoterId, VotingId};

    fn resolve(backend: &crate::backend::Backend, id: &str) -> Result<EligibleVoter, ResolveError> {
        VoterResolver::new(backend.registry.as_ref(), backend.votes.as_ref(), ELECTION).find_voter(id)
    }

    #[test]
    fn resolves_matching_id() {
        let backend = testing::backend();
        let voter = resolve(&backend, "100FR").unwrap();
        assert_eq!(voter.id, VoterId::new(1));
    }

    #[test]
    fn letters_are_case_insensitive() {
        let backend = testing::backend();
        assert!(resolve(&backend, "100fr").is_ok());
        assert!(resolve(&backend, "200am").is_ok());
    }

    #[test]
    fn unknown_number_is_not_found() {
        let backend = testing::backend();
        assert!(matches!(resolve(&backend, "999AB"), Err(ResolveError::NotFound(_))));
    }

    #[test]
    fn wrong_letters_mismatch() {
        let backend = testing::backend();
        assert!(matches!(resolve(&backend, "100YZ"), Err(ResolveError::LettersMismatch(_))));
    }

    #[test]
    fn short_ids_are_not_found() {
        let backend = testing::backend();
        for id in ["", "F", "FR", "Ä"] {
            assert!(matches!(resolve(&backend, id), Err(ResolveError::NotFound(_))), "{id}");
        }
    }

    #[test]
    fn votes_are_loaded_from_the_store() {
        let backend = testing::backend();
        let mut tx = backend.votes.begin().unwrap();
        tx.execute(&urna_store::Statement::InsertVote(Vote::queued(
            VoterId::new(1),
            VotingId::new(10),
            BallotBoxId::new(1),
            chrono::Utc::now(),
        )))
        .unwrap();
        tx.commit().unwrap();

        let voter = resolve(&backend, "100FR").unwrap();
        assert_eq!(voter.votes.len(), 1);
    }
}
