//! Transactional voting ledger for Urna.
//!
//! The ledger is the only component that writes vote rows. Every operation
//! runs in one storage transaction:
//! - [`VotingLedger::create_votes`] queues a batch of votes, all or nothing
//! - [`VotingLedger::commit_pending_votes_for_voter`] finalizes a voter's queue
//! - [`VotingLedger::cancel_pending_votes_for_voter`] drops a voter's queue
//!
//! Concurrency between sessions is delegated to the store's uniqueness
//! constraint on `(voter, voting)`; a violation surfaces as
//! [`LedgerError::AlreadyParticipated`].

pub mod error;
pub mod ledger;

pub use error::{LedgerError, LedgerResult};
pub use ledger::VotingLedger;
