use std::collections::{BTreeMap, HashMap};

use tracing::warn;
use urna_types::VoterId;

use super::{CommandContext, CommandOutput};
use crate::error::CommandResult;

/// `show-queue`: queued votes in the box, one line per voter
/// (`<externalId> <position>...`), sorted by external id.
pub(super) fn process(ctx: &CommandContext<'_>) -> CommandResult<CommandOutput> {
    let mut by_voter: HashMap<VoterId, Vec<usize>> = HashMap::new();
    for vote in ctx.ledger.queued_votes(ctx.ballot_box.id)? {
        match ctx.election.position_of(vote.voting) {
            Some(position) => by_voter.entry(vote.voter).or_default().push(position),
            None => warn!(vote = %vote.id.short_id(), voting = %vote.voting, "queued vote outside election"),
        }
    }

    let mut queue = BTreeMap::new();
    for (voter_id, mut positions) in by_voter {
        let external_id = ctx
            .backend
            .registry
            .voter(voter_id)?
            .and_then(|voter| voter.identifier())
            .unwrap_or_else(|| voter_id.to_string());
        positions.sort_unstable();
        queue.insert(external_id, positions);
    }

    let lines = queue
        .into_iter()
        .map(|(external_id, positions)| {
            positions
                .iter()
                .fold(external_id, |line, position| format!("{line} {position}"))
        })
        .collect();
    Ok(CommandOutput::lines(lines))
}
