use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use urna_types::{BallotBoxId, Vote, VoteId, VoterId, VotingId};

use crate::error::{StoreError, StoreResult};
use crate::traits::{Statement, VoteStore, VoteTransaction};

/// Name of the `(voter, voting)` uniqueness constraint.
pub const PARTICIPATION_CONSTRAINT: &str = "vote_voter_voting_key";

/// In-memory vote table with serializable transactions.
///
/// A transaction holds the table lock from `begin` until commit or
/// rollback, so concurrent transactions observe each other only after
/// commit. Rolled-back writes are undone from an undo log.
pub struct InMemoryVoteStore {
    table: Mutex<VoteTable>,
}

#[derive(Default)]
struct VoteTable {
    rows: BTreeMap<VoteId, Vote>,
    participation: HashMap<(VoterId, VotingId), VoteId>,
}

impl VoteTable {
    fn insert(&mut self, vote: &Vote) -> StoreResult<()> {
        let key = vote.participation();
        if self.participation.contains_key(&key) {
            return Err(StoreError::UniqueViolation {
                constraint: PARTICIPATION_CONSTRAINT,
                voter: vote.voter,
                voting: vote.voting,
            });
        }
        self.participation.insert(key, vote.id);
        self.rows.insert(vote.id, vote.clone());
        Ok(())
    }

    fn remove(&mut self, id: &VoteId) -> Option<Vote> {
        let vote = self.rows.remove(id)?;
        self.participation.remove(&vote.participation());
        Some(vote)
    }

    fn queued_ids(&self, voter: VoterId, ballot_box: BallotBoxId) -> Vec<VoteId> {
        self.rows
            .values()
            .filter(|v| v.voter == voter && v.ballot_box == ballot_box && v.is_queued())
            .map(|v| v.id)
            .collect()
    }
}

enum Undo {
    Inserted(VoteId),
    Updated(Vote),
    Deleted(Vote),
}

impl InMemoryVoteStore {
    /// Create an empty vote table.
    pub fn new() -> Self {
        Self {
            table: Mutex::new(VoteTable::default()),
        }
    }

    /// Number of vote rows, regardless of status.
    pub fn len(&self) -> usize {
        self.table
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .rows
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn lock(&self) -> StoreResult<MutexGuard<'_, VoteTable>> {
        self.table
            .lock()
            .map_err(|e| StoreError::Unavailable(format!("vote table lock poisoned: {e}")))
    }
}

impl Default for InMemoryVoteStore {
    fn default() -> Self {
        Self::new()
    }
}

impl VoteStore for InMemoryVoteStore {
    fn begin(&self) -> StoreResult<Box<dyn VoteTransaction + '_>> {
        Ok(Box::new(InMemoryTransaction {
            table: self.lock()?,
            undo: Vec::new(),
            open: true,
        }))
    }

    fn votes_of(&self, voter: VoterId) -> StoreResult<Vec<Vote>> {
        let table = self.lock()?;
        let mut votes: Vec<Vote> = table.rows.values().filter(|v| v.voter == voter).cloned().collect();
        votes.sort_by_key(|v| v.created);
        Ok(votes)
    }

    fn queued_in(&self, ballot_box: BallotBoxId) -> StoreResult<Vec<Vote>> {
        let table = self.lock()?;
        let mut votes: Vec<Vote> = table
            .rows
            .values()
            .filter(|v| v.ballot_box == ballot_box && v.is_queued())
            .cloned()
            .collect();
        votes.sort_by_key(|v| v.created);
        Ok(votes)
    }
}

struct InMemoryTransaction<'a> {
    table: MutexGuard<'a, VoteTable>,
    undo: Vec<Undo>,
    open: bool,
}

impl InMemoryTransaction<'_> {
    fn undo_all(&mut self) {
        while let Some(step) = self.undo.pop() {
            match step {
                Undo::Inserted(id) => {
                    self.table.remove(&id);
                }
                Undo::Updated(previous) => {
                    self.table.rows.insert(previous.id, previous);
                }
                Undo::Deleted(vote) => {
                    self.table.participation.insert(vote.participation(), vote.id);
                    self.table.rows.insert(vote.id, vote);
                }
            }
        }
    }
}

impl VoteTransaction for InMemoryTransaction<'_> {
    fn execute(&mut self, statement: &Statement) -> StoreResult<u64> {
        match statement {
            Statement::InsertVote(vote) => {
                self.table.insert(vote)?;
                self.undo.push(Undo::Inserted(vote.id));
                Ok(1)
            }
            Statement::CommitQueued {
                voter,
                ballot_box,
                at,
            } => {
                let ids = self.table.queued_ids(*voter, *ballot_box);
                for id in &ids {
                    if let Some(row) = self.table.rows.get_mut(id) {
                        self.undo.push(Undo::Updated(row.clone()));
                        row.commit(*at);
                    }
                }
                Ok(ids.len() as u64)
            }
            Statement::DeleteQueued { voter, ballot_box } => {
                let ids = self.table.queued_ids(*voter, *ballot_box);
                for id in &ids {
                    if let Some(vote) = self.table.remove(id) {
                        self.undo.push(Undo::Deleted(vote));
                    }
                }
                Ok(ids.len() as u64)
            }
        }
    }

    fn commit(mut self: Box<Self>) -> StoreResult<()> {
        self.undo.clear();
        self.open = false;
        Ok(())
    }

    fn rollback(mut self: Box<Self>) -> StoreResult<()> {
        self.undo_all();
        self.open = false;
        Ok(())
    }
}

impl Drop for InMemoryTransaction<'_> {
    fn drop(&mut self) {
        if self.open {
            self.undo_all();
        }
    }
}
