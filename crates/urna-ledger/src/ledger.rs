use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};
use urna_store::{Statement, VoteStore, VoteTransaction};
use urna_types::{BallotBox, BallotBoxId, EligibleVoter, Vote, VoterId, Voting};

use crate::error::{LedgerError, LedgerResult};

/// Atomic create, commit, and cancel of votes.
///
/// The ledger holds no locks of its own. Two sessions racing to register the
/// same `(voter, voting)` pair are arbitrated by the store: exactly one
/// insert succeeds and the other fails with
/// [`LedgerError::AlreadyParticipated`].
pub struct VotingLedger {
    store: Arc<dyn VoteStore>,
}

impl VotingLedger {
    /// Create a ledger over a transactional vote store.
    pub fn new(store: Arc<dyn VoteStore>) -> Self {
        Self { store }
    }

    /// Queue one vote per voting for the voter, in a single transaction.
    ///
    /// If any registration fails the whole batch is rolled back and the
    /// error is returned; no partial batch is ever committed. On success the
    /// new votes are appended to `voter.votes`.
    pub fn create_votes(
        &self,
        ballot_box: &BallotBox,
        voter: &mut EligibleVoter,
        votings: &[&Voting],
    ) -> LedgerResult<Vec<Vote>> {
        ensure_same_election(ballot_box, voter)?;
        let now = Utc::now();
        let mut tx = self.store.begin()?;
        let mut created = Vec::with_capacity(votings.len());

        for voting in votings {
            match register_vote(tx.as_mut(), ballot_box, voter, voting, now) {
                Ok(vote) => created.push(vote),
                Err(error) => {
                    if let Err(rollback) = tx.rollback() {
                        warn!(%rollback, "rollback after failed registration also failed");
                    }
                    match &error {
                        LedgerError::Storage(_) => {
                            warn!(voter = %voter.id, voting = %voting.id, %error, "vote batch aborted")
                        }
                        _ => debug!(voter = %voter.id, voting = %voting.id, %error, "vote batch refused"),
                    }
                    return Err(error);
                }
            }
        }

        tx.commit()?;
        voter.votes.extend(created.iter().cloned());
        info!(
            ballot_box = %ballot_box.id,
            voter = %voter.id,
            votes = created.len(),
            "votes queued"
        );
        Ok(created)
    }

    /// Mark every queued vote of the voter in this ballot box as committed.
    ///
    /// Returns the number of votes committed; zero is not an error.
    pub fn commit_pending_votes_for_voter(
        &self,
        ballot_box: &BallotBox,
        voter: &mut EligibleVoter,
    ) -> LedgerResult<u64> {
        let at = Utc::now();
        let statement = Statement::CommitQueued {
            voter: voter.id,
            ballot_box: ballot_box.id,
            at,
        };
        let committed = self.run_single(&statement)?;

        voter
            .votes
            .iter_mut()
            .filter(|v| v.ballot_box == ballot_box.id && v.is_queued())
            .for_each(|v| v.commit(at));
        info!(ballot_box = %ballot_box.id, voter = %voter.id, committed, "votes committed");
        Ok(committed)
    }

    /// Delete every queued vote of the voter in this ballot box.
    ///
    /// Committed votes are untouched. Returns the number of votes deleted and
    /// drops the same entries from `voter.votes`.
    pub fn cancel_pending_votes_for_voter(
        &self,
        ballot_box: &BallotBox,
        voter: &mut EligibleVoter,
    ) -> LedgerResult<u64> {
        let statement = Statement::DeleteQueued {
            voter: voter.id,
            ballot_box: ballot_box.id,
        };
        let cancelled = self.run_single(&statement)?;

        voter
            .votes
            .retain(|v| !(v.ballot_box == ballot_box.id && v.is_queued()));
        info!(ballot_box = %ballot_box.id, voter = %voter.id, cancelled, "votes cancelled");
        Ok(cancelled)
    }

    /// Queued votes in the ballot box, oldest first.
    pub fn queued_votes(&self, ballot_box: BallotBoxId) -> LedgerResult<Vec<Vote>> {
        Ok(self.store.queued_in(ballot_box)?)
    }

    /// Every vote row of the voter, regardless of status.
    pub fn votes_of(&self, voter: VoterId) -> LedgerResult<Vec<Vote>> {
        Ok(self.store.votes_of(voter)?)
    }

    fn run_single(&self, statement: &Statement) -> LedgerResult<u64> {
        let mut tx = self.store.begin()?;
        // An error drops `tx`, which rolls it back.
        let affected = tx.execute(statement)?;
        tx.commit()?;
        Ok(affected)
    }
}

fn register_vote(
    tx: &mut (dyn VoteTransaction + '_),
    ballot_box: &BallotBox,
    voter: &EligibleVoter,
    voting: &Voting,
    at: DateTime<Utc>,
) -> LedgerResult<Vote> {
    let vote = Vote::queued(voter.id, voting.id, ballot_box.id, at);
    tx.execute(&Statement::InsertVote(vote.clone()))?;
    Ok(vote)
}

fn ensure_same_election(ballot_box: &BallotBox, voter: &EligibleVoter) -> LedgerResult<()> {
    if voter.election != ballot_box.election {
        return Err(LedgerError::ForeignVoter {
            voter: voter.id,
            voter_election: voter.election,
            ballot_box: ballot_box.id,
            box_election: ballot_box.election,
        });
    }
    Ok(())
}
