use tracing::debug;

use super::{CommandContext, CommandOutput};
use crate::error::{CommandError, CommandResult};

/// `insert-queue-element <externalId> <votingIndex>...`: queue one vote per
/// listed voting, all or nothing.
pub(super) fn process(ctx: &CommandContext<'_>, params: &[String]) -> CommandResult<CommandOutput> {
    let mut voter = ctx.voter(params)?;
    let votings = ctx.votings_at(params.get(1..).unwrap_or_default())?;
    if votings.is_empty() {
        return Err(CommandError::missing("voting index"));
    }

    let created = ctx.ledger.create_votes(ctx.ballot_box, &mut voter, &votings)?;
    debug!(voter = %voter.id, queued = created.len(), "queue element inserted");
    Ok(CommandOutput::empty())
}

#[cfg(test)]
mod tests {
    use crate::commands::tests::Harness;
    use crate::error::CommandError;
    use urna_ledger::LedgerError;
    use urna_protocol::ErrorCode;
    use urna_types::{BallotBoxId, VoterId};

    #[test]
    fn queues_selected_votings() {
        let h = Harness::new();
        assert!(h.lines("insert-queue-element 100FR 1 2").is_empty());
        assert_eq!(h.backend.votes.queued_in(BallotBoxId::new(1)).unwrap().len(), 2);
    }

    #[test]
    fn second_insert_for_same_voting_is_refused() {
        let h = Harness::new();
        h.run("insert-queue-element 100FR 1").unwrap();
        let err = h.run("insert-queue-element 100FR 2 1").unwrap_err();
        assert!(matches!(err, CommandError::Ledger(LedgerError::AlreadyParticipated { .. })));
        assert_eq!(err.code(), ErrorCode::AlreadyParticipated);
        // The batch rolled back: voting 2 was not queued either.
        assert_eq!(h.backend.votes.votes_of(VoterId::new(1)).unwrap().len(), 1);
    }

    #[test]
    fn requires_an_index() {
        let h = Harness::new();
        assert!(matches!(
            h.run("insert-queue-element 100FR"),
            Err(CommandError::InvalidParameter(_))
        ));
    }
}
