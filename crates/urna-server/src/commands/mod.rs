//! The protocol command set.
//!
//! Every verb a terminal may send is a [`Command`] variant; the name table
//! below is the whole registry. Each command reads its parameters, calls the
//! resolver or the ledger, and returns its result lines. The engine writes
//! `+OK`, the lines, and for listing commands a trailing empty line.

mod check_voter;
mod commit_queue_element;
mod delete_queue_element;
mod insert_queue_element;
mod quit;
mod show_elections;
mod show_queue;

use std::collections::HashSet;

use urna_ledger::VotingLedger;
use urna_types::{BallotBox, Election, EligibleVoter, Voting};

use crate::backend::Backend;
use crate::engine::TerminationReason;
use crate::error::{CommandError, CommandResult, ServerError, ServerResult};
use crate::resolver::VoterResolver;

/// What the engine does after a round-trip.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopControl {
    Continue,
    Terminate(TerminationReason),
}

/// Result lines of a command and whether the session goes on.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CommandOutput {
    pub lines: Vec<String>,
    pub control: LoopControl,
}

impl CommandOutput {
    /// Continue with result lines.
    pub fn lines(lines: Vec<String>) -> Self {
        Self {
            lines,
            control: LoopControl::Continue,
        }
    }

    /// Continue without result lines.
    pub fn empty() -> Self {
        Self::lines(Vec::new())
    }

    /// End the session after the response is written.
    pub fn terminate(reason: TerminationReason) -> Self {
        Self {
            lines: Vec::new(),
            control: LoopControl::Terminate(reason),
        }
    }
}

/// Fresh state a command runs against. Rebuilt by the engine for every
/// round-trip after the availability check.
pub struct CommandContext<'a> {
    pub backend: &'a Backend,
    pub ledger: &'a VotingLedger,
    pub ballot_box: &'a BallotBox,
    pub election: &'a Election,
}

impl<'a> CommandContext<'a> {
    /// Resolver scoped to the session's election.
    pub fn resolver(&self) -> VoterResolver<'a> {
        VoterResolver::new(
            self.backend.registry.as_ref(),
            self.backend.votes.as_ref(),
            self.election.id,
        )
    }

    /// Resolve the voter named by the first parameter.
    fn voter(&self, params: &[String]) -> CommandResult<EligibleVoter> {
        let external_id = params
            .first()
            .ok_or_else(|| CommandError::missing("external voter id"))?;
        Ok(self.resolver().find_voter(external_id)?)
    }

    /// Map 1-based voting positions to the election's votings.
    fn votings_at(&self, positions: &[String]) -> CommandResult<Vec<&'a Voting>> {
        positions
            .iter()
            .map(|raw| {
                let position: usize = raw
                    .parse()
                    .map_err(|_| CommandError::InvalidParameter(format!("not a voting index: {raw}")))?;
                self.election
                    .voting_at(position)
                    .ok_or_else(|| CommandError::InvalidParameter(format!("no voting at index {position}")))
            })
            .collect()
    }
}

/// Every command a terminal may send, by wire name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Command {
    ShowElections,
    CheckVoter,
    InsertQueueElement,
    DeleteQueueElement,
    CommitQueueElement,
    ShowQueue,
    Quit,
}

impl Command {
    /// Every registered command.
    pub const ALL: [Command; 7] = [
        Self::ShowElections,
        Self::CheckVoter,
        Self::InsertQueueElement,
        Self::DeleteQueueElement,
        Self::CommitQueueElement,
        Self::ShowQueue,
        Self::Quit,
    ];

    /// The name terminals send, e.g. `check-voter`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::ShowElections => "show-elections",
            Self::CheckVoter => "check-voter",
            Self::InsertQueueElement => "insert-queue-element",
            Self::DeleteQueueElement => "delete-queue-element",
            Self::CommitQueueElement => "commit-queue-element",
            Self::ShowQueue => "show-queue",
            Self::Quit => "quit",
        }
    }

    /// Look a command up by its wire name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.name() == name)
    }

    /// Listing commands end their output with an empty line.
    pub const fn is_listing(self) -> bool {
        matches!(self, Self::ShowElections | Self::CheckVoter | Self::ShowQueue)
    }

    /// Check that every command has a distinct wire name that maps back to
    /// it. Run once when a server or session starts.
    pub fn validate_registry() -> ServerResult<()> {
        let mut seen = HashSet::new();
        for command in Self::ALL {
            let name = command.name();
            if name.is_empty() || name.contains(char::is_whitespace) {
                return Err(ServerError::Internal(format!("malformed command name {name:?}")));
            }
            if !seen.insert(name) || Self::from_name(name) != Some(command) {
                return Err(ServerError::Internal(format!("command name {name} is ambiguous")));
            }
        }
        Ok(())
    }

    /// Run the command for one request line.
    pub fn process(self, ctx: &CommandContext<'_>, params: &[String]) -> CommandResult<CommandOutput> {
        match self {
            Self::ShowElections => show_elections::process(ctx),
            Self::CheckVoter => check_voter::process(ctx, params),
            Self::InsertQueueElement => insert_queue_element::process(ctx, params),
            Self::DeleteQueueElement => delete_queue_element::process(ctx, params),
            Self::CommitQueueElement => commit_queue_element::process(ctx, params),
            Self::ShowQueue => show_queue::process(ctx),
            Self::Quit => Ok(quit::process()),
        }
    }
}

impl std::fmt::Display for Command {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// `"<n> <name>"` with a 1-based position.
fn numbered(position: usize, voting: &Voting) -> String {
    format!("{position} {}", voting.name)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::testing::{self, BOX, ELECTION};

    /// Runs commands against a fixed backend, the way the engine would.
    pub(crate) struct Harness {
        pub backend: Backend,
        ledger: VotingLedger,
    }

    impl Harness {
        pub fn new() -> Self {
            let backend = testing::backend();
            let ledger = backend.ledger();
            Self { backend, ledger }
        }

        pub fn run(&self, line: &str) -> CommandResult<CommandOutput> {
            let mut tokens = line.split(' ').map(str::to_string);
            let name = tokens.next().unwrap();
            let params: Vec<String> = tokens.collect();
            let command = Command::from_name(&name).ok_or(CommandError::UnknownCommand(name))?;
            let ballot_box = self.backend.registry.ballot_box(BOX).unwrap().unwrap();
            let election = self.backend.registry.election(ELECTION).unwrap().unwrap();
            let ctx = CommandContext {
                backend: &self.backend,
                ledger: &self.ledger,
                ballot_box: &ballot_box,
                election: &election,
            };
            command.process(&ctx, &params)
        }

        pub fn lines(&self, line: &str) -> Vec<String> {
            self.run(line).unwrap().lines
        }
    }

    #[test]
    fn registry_is_consistent() {
        Command::validate_registry().unwrap();
        for command in Command::ALL {
            assert_eq!(Command::from_name(command.name()), Some(command));
        }
    }

    #[test]
    fn unknown_names_are_not_commands() {
        assert_eq!(Command::from_name("format-disk"), None);
        assert_eq!(Command::from_name("QUIT"), None);
        assert_eq!(Command::from_name(""), None);
    }

    #[test]
    fn listing_commands() {
        let listing: Vec<_> = Command::ALL.into_iter().filter(|c| c.is_listing()).collect();
        assert_eq!(
            listing,
            [Command::ShowElections, Command::CheckVoter, Command::ShowQueue]
        );
    }

    #[test]
    fn bad_voting_index_is_rejected() {
        let h = Harness::new();
        for line in ["insert-queue-element 100FR 0", "insert-queue-element 100FR 4", "insert-queue-element 100FR x"] {
            assert!(matches!(h.run(line), Err(CommandError::InvalidParameter(_))), "{line}");
        }
    }

    #[test]
    fn missing_voter_id_is_rejected() {
        let h = Harness::new();
        assert!(matches!(h.run("check-voter"), Err(CommandError::InvalidParameter(_))));
        assert!(matches!(h.run("commit-queue-element"), Err(CommandError::InvalidParameter(_))));
    }
}
