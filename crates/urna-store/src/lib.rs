//! Storage collaborators for Urna.
//!
//! The protocol engine and the voting ledger consume storage only through
//! the traits defined here:
//!
//! - [`Registry`] — elections, ballot boxes and eligible voters, with the
//!   guarded ballot-box transitions and a change-event subscription
//! - [`SessionLifecycle`] — start, refresh and stop terminal sessions
//! - [`VoteStore`] — the transactional vote table whose `(voter, voting)`
//!   uniqueness constraint is the only cross-session concurrency guard
//!
//! In-memory implementations ([`InMemoryRegistry`], [`InMemoryVoteStore`])
//! back tests, demos and the bundled server; [`Fixture`] seeds a registry
//! from a TOML document.

pub mod error;
pub mod events;
pub mod fixture;
pub mod registry;
pub mod traits;
pub mod votes;

pub use error::{StoreError, StoreResult};
pub use events::{EventStream, StoreEvent};
pub use fixture::{BallotBoxEntry, Fixture};
pub use registry::InMemoryRegistry;
pub use traits::{Registry, SessionLifecycle, Statement, VoteStore, VoteTransaction};
pub use votes::{InMemoryVoteStore, PARTICIPATION_CONSTRAINT};
