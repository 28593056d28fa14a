//! Urna terminal server.
//!
//! Each ballot-box terminal drives one long-lived session over a duplex byte
//! stream. The [`ProtocolEngine`] reads a line, re-validates the session and
//! ballot box, runs the matching [`Command`], and writes `+OK` plus result
//! lines or a coded error line. Votes go through the transactional
//! [`urna_ledger::VotingLedger`].
//!
//! [`UrnaServer`] binds one TCP listener per configured ballot box and an
//! optional admin API whose operations (emit, return, stop session) reach
//! running sessions through store events.

pub mod backend;
pub mod commands;
pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod resolver;
pub mod router;
pub mod server;
pub mod watcher;

#[cfg(test)]
mod testing;

pub use backend::Backend;
pub use commands::{Command, CommandContext, CommandOutput, LoopControl};
pub use config::{ServerConfig, TerminalConfig};
pub use engine::{EngineState, ProtocolEngine, TerminationReason};
pub use error::{CommandError, CommandResult, ServerError, ServerResult};
pub use handler::{AdminState, BallotBoxView};
pub use resolver::{ResolveError, VoterResolver};
pub use server::{TerminalListener, UrnaServer};
pub use watcher::{liveness_channel, spawn_watcher, LivenessHandle, LivenessSignal};
