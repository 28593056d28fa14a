use super::{numbered, CommandContext, CommandOutput};
use crate::error::CommandResult;

/// `show-elections`: every voting of the box's election, numbered from 1.
pub(super) fn process(ctx: &CommandContext<'_>) -> CommandResult<CommandOutput> {
    let lines = ctx
        .election
        .votings()
        .into_iter()
        .enumerate()
        .map(|(index, voting)| numbered(index + 1, voting))
        .collect();
    Ok(CommandOutput::lines(lines))
}
