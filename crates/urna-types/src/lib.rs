//! Domain types for Urna.
//!
//! This crate provides the entities shared by every other Urna crate: the
//! physical ballot box and its status lifecycle, elections with their
//! periods and votings, eligible voters with their derived identifiers,
//! votes, and terminal sessions.
//!
//! # Key Types
//!
//! - [`BallotBox`] — A physical voting unit with a guarded status lifecycle
//! - [`Election`] — Periods plus an ordered list of [`Voting`]s
//! - [`Voting`] — One decision, with an optional [`DiscriminatorRule`]
//! - [`EligibleVoter`] — A voter whose identifier is derived, not stored
//! - [`Vote`] — A queued or committed vote row
//! - [`Session`] — One terminal connection against one ballot box

pub mod ballot_box;
pub mod election;
pub mod error;
pub mod ids;
pub mod session;
pub mod vote;
pub mod voter;
pub mod voting;

pub use ballot_box::{BallotBox, BallotBoxStatus, Credential};
pub use election::{Election, Period};
pub use error::TypeError;
pub use ids::{BallotBoxId, ElectionId, SessionToken, VoteId, VoterId, VotingId};
pub use session::Session;
pub use vote::{Vote, VoteStatus};
pub use voter::{checksum_letter, EligibleVoter, DEPARTMENT, MATRICULATION_NUMBER};
pub use voting::{DiscriminatorRule, RuleMode, Voting, VotingKind};
