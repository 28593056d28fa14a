use chrono::{DateTime, Utc};
use tokio::sync::broadcast;
use urna_types::{
    BallotBox, BallotBoxId, BallotBoxStatus, Election, ElectionId, EligibleVoter, Session, Vote,
    VoterId,
};

use crate::error::StoreResult;
use crate::events::StoreEvent;

/// Read access to election setup, plus the guarded ballot-box transitions.
///
/// Implementations return fresh copies; callers refetch to observe changes
/// made by other sessions or by operators.
pub trait Registry: Send + Sync {
    fn ballot_box(&self, id: BallotBoxId) -> StoreResult<Option<BallotBox>>;

    fn election(&self, id: ElectionId) -> StoreResult<Option<Election>>;

    fn voter(&self, id: VoterId) -> StoreResult<Option<EligibleVoter>>;

    /// Find the voter of `election` whose discriminator `name` equals `value`.
    fn find_voter(
        &self,
        election: ElectionId,
        name: &str,
        value: &str,
    ) -> StoreResult<Option<EligibleVoter>>;

    /// Apply [`BallotBox::emit`] and persist the result.
    fn emit_ballot_box(&self, id: BallotBoxId) -> StoreResult<BallotBox>;

    /// Apply [`BallotBox::return_box`] and persist the result.
    fn return_ballot_box(&self, id: BallotBoxId) -> StoreResult<BallotBox>;

    /// Unguarded administrative transition (open, close, count, void, ...).
    fn set_ballot_box_status(
        &self,
        id: BallotBoxId,
        status: BallotBoxStatus,
    ) -> StoreResult<BallotBox>;

    /// Subscribe to change notifications.
    fn subscribe(&self) -> broadcast::Receiver<StoreEvent>;
}

/// Starts, tracks, and validates terminal sessions.
pub trait SessionLifecycle: Send + Sync {
    /// Start a running session for the ballot box.
    fn start(&self, ballot_box: BallotBoxId) -> StoreResult<Session>;

    /// Refetch the stored state of a session.
    fn refresh(&self, session: &Session) -> StoreResult<Session>;

    /// Stop whatever session is running on the ballot box.
    fn stop(&self, ballot_box: BallotBoxId) -> StoreResult<Option<Session>>;

    /// Mark a session as ended by its own engine.
    fn finish(&self, session: &Session) -> StoreResult<()>;
}

/// A parameterized statement against the vote table.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Statement {
    /// Insert a vote row. Subject to the `(voter, voting)` constraint.
    InsertVote(Vote),
    /// Mark every queued vote of the voter in the box as committed.
    CommitQueued {
        voter: VoterId,
        ballot_box: BallotBoxId,
        at: DateTime<Utc>,
    },
    /// Delete every queued vote of the voter in the box.
    DeleteQueued {
        voter: VoterId,
        ballot_box: BallotBoxId,
    },
}

/// An open transaction on the vote table.
///
/// Dropping a transaction without committing rolls it back.
pub trait VoteTransaction {
    /// Execute a statement and return the number of affected rows.
    fn execute(&mut self, statement: &Statement) -> StoreResult<u64>;

    fn commit(self: Box<Self>) -> StoreResult<()>;

    fn rollback(self: Box<Self>) -> StoreResult<()>;
}

/// Transactional vote storage with a uniqueness constraint on
/// `(voter, voting)` across all rows regardless of status.
pub trait VoteStore: Send + Sync {
    fn begin(&self) -> StoreResult<Box<dyn VoteTransaction + '_>>;

    /// All vote rows of a voter, in creation order.
    fn votes_of(&self, voter: VoterId) -> StoreResult<Vec<Vote>>;

    /// All queued vote rows in a ballot box, in creation order.
    fn queued_in(&self, ballot_box: BallotBoxId) -> StoreResult<Vec<Vote>>;
}
