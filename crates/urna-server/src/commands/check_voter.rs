use super::{numbered, CommandContext, CommandOutput};
use crate::error::CommandResult;

/// `check-voter <externalId>`: name, department, then the votings the voter
/// is eligible for with their election positions.
pub(super) fn process(ctx: &CommandContext<'_>, params: &[String]) -> CommandResult<CommandOutput> {
    let voter = ctx.voter(params)?;

    let mut lines = vec![
        format!("{},{}", voter.given_name, voter.family_name),
        voter.department().unwrap_or_default().to_string(),
    ];
    lines.extend(
        ctx.election
            .eligible_votings(&voter)
            .into_iter()
            .map(|(position, voting)| numbered(position, voting)),
    );
    Ok(CommandOutput::lines(lines))
}

#[cfg(test)]
mod tests {
    use crate::commands::tests::Harness;
    use crate::error::CommandError;

    #[test]
    fn shows_name_department_and_eligible_votings() {
        let h = Harness::new();
        assert_eq!(
            h.lines("check-voter 100FR"),
            ["Foo,Bar", "physics", "1 voting-0", "2 voting-1", "3 voting-2"]
        );
    }

    #[test]
    fn restricted_votings_are_omitted() {
        let h = Harness::new();
        assert_eq!(
            h.lines("check-voter 200AM"),
            ["Anna,Lindström", "law", "1 voting-0", "2 voting-1"]
        );
    }

    #[test]
    fn unknown_voter() {
        let h = Harness::new();
        assert!(matches!(h.run("check-voter 300AB"), Err(CommandError::VoterNotFound(_))));
    }

    #[test]
    fn mismatching_letters() {
        let h = Harness::new();
        assert!(matches!(h.run("check-voter 100YZ"), Err(CommandError::LettersDontMatch(_))));
    }
}
