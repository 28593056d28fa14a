use tracing::debug;

use super::{CommandContext, CommandOutput};
use crate::error::CommandResult;

/// `commit-queue-element <externalId>`: commit the voter's queued votes in
/// this box. Committing an empty queue succeeds.
pub(super) fn process(ctx: &CommandContext<'_>, params: &[String]) -> CommandResult<CommandOutput> {
    let mut voter = ctx.voter(params)?;
    let committed = ctx
        .ledger
        .commit_pending_votes_for_voter(ctx.ballot_box, &mut voter)?;
    debug!(voter = %voter.id, committed, "queue element committed");
    Ok(CommandOutput::empty())
}

#[cfg(test)]
mod tests {
    use crate::commands::tests::Harness;
    use urna_types::{VoteStatus, VoterId};

    #[test]
    fn commits_queued_votes() {
        let h = Harness::new();
        h.run("insert-queue-element 100FR 1 3").unwrap();
        h.run("commit-queue-element 100FR").unwrap();

        let votes = h.backend.votes.votes_of(VoterId::new(1)).unwrap();
        assert_eq!(votes.len(), 2);
        assert!(votes.iter().all(|v| v.status == VoteStatus::Committed && v.committed.is_some()));
    }

    #[test]
    fn empty_queue_is_fine() {
        let h = Harness::new();
        assert!(h.lines("commit-queue-element 200AM").is_empty());
    }
}
