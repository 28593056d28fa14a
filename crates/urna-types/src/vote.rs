use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BallotBoxId, VoteId, VoterId, VotingId};

/// Status of a vote row.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VoteStatus {
    /// Recorded but not finalized; may still be cancelled.
    Queued,
    /// Finalized and permanent.
    Committed,
}

impl fmt::Display for VoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Queued => f.write_str("QUEUED"),
            Self::Committed => f.write_str("COMMITTED"),
        }
    }
}

/// One voter's participation in one voting, cast at one ballot box.
///
/// At most one row exists per `(voter, voting)` regardless of status.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Vote {
    pub id: VoteId,
    pub voter: VoterId,
    pub voting: VotingId,
    pub ballot_box: BallotBoxId,
    pub created: DateTime<Utc>,
    pub committed: Option<DateTime<Utc>>,
    pub status: VoteStatus,
}

impl Vote {
    /// A new queued vote stamped with `created`.
    pub fn queued(
        voter: VoterId,
        voting: VotingId,
        ballot_box: BallotBoxId,
        created: DateTime<Utc>,
    ) -> Self {
        Self {
            id: VoteId::new(),
            voter,
            voting,
            ballot_box,
            created,
            committed: None,
            status: VoteStatus::Queued,
        }
    }

    pub fn is_queued(&self) -> bool {
        self.status == VoteStatus::Queued
    }

    /// Mark the vote committed at `at`.
    pub fn commit(&mut self, at: DateTime<Utc>) {
        self.status = VoteStatus::Committed;
        self.committed = Some(at);
    }

    /// The uniqueness key enforced by vote storage.
    pub fn participation(&self) -> (VoterId, VotingId) {
        (self.voter, self.voting)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn queued_vote_has_no_commit_stamp() {
        let v = Vote::queued(VoterId::new(1), VotingId::new(2), BallotBoxId::new(3), Utc::now());
        assert!(v.is_queued());
        assert!(v.committed.is_none());
        assert_eq!(v.participation(), (VoterId::new(1), VotingId::new(2)));
    }

    #[test]
    fn commit_stamps_and_changes_status() {
        let created = Utc::now();
        let mut v = Vote::queued(VoterId::new(1), VotingId::new(2), BallotBoxId::new(3), created);
        let at = created + chrono::Duration::seconds(5);
        v.commit(at);
        assert_eq!(v.status, VoteStatus::Committed);
        assert_eq!(v.committed, Some(at));
        assert_eq!(v.status.to_string(), "COMMITTED");
    }
}
