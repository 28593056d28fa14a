use tracing::debug;

use super::{CommandContext, CommandOutput};
use crate::error::CommandResult;

/// `delete-queue-element <externalId> [votingIndex...]`: cancel every queued
/// vote of the voter in this box.
///
/// Indices are validated but do not narrow the cancellation.
pub(super) fn process(ctx: &CommandContext<'_>, params: &[String]) -> CommandResult<CommandOutput> {
    let mut voter = ctx.voter(params)?;
    let listed = ctx.votings_at(params.get(1..).unwrap_or_default())?;
    if !listed.is_empty() {
        debug!(voter = %voter.id, indices = listed.len(), "indices ignored, cancelling whole queue");
    }

    ctx.ledger.cancel_pending_votes_for_voter(ctx.ballot_box, &mut voter)?;
    Ok(CommandOutput::empty())
}
