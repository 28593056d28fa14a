use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::ids::VotingId;
use crate::voter::EligibleVoter;

/// Whether a [`DiscriminatorRule`] admits or excludes the listed values.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RuleMode {
    Allow,
    Deny,
}

/// Restricts a voting to voters whose discriminator matches a value set.
///
/// A voter lacking the discriminator is excluded by an `Allow` rule and
/// admitted by a `Deny` rule.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscriminatorRule {
    pub name: String,
    pub mode: RuleMode,
    pub values: BTreeSet<String>,
}

impl DiscriminatorRule {
    /// Admit voters whose discriminator `name` has one of `values`.
    pub fn allow<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            mode: RuleMode::Allow,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    /// Admit voters whose discriminator `name` has none of `values`.
    pub fn deny<I, S>(name: impl Into<String>, values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            name: name.into(),
            mode: RuleMode::Deny,
            values: values.into_iter().map(Into::into).collect(),
        }
    }

    pub fn admits(&self, voter: &EligibleVoter) -> bool {
        let listed = voter
            .discriminator(&self.name)
            .is_some_and(|value| self.values.contains(value));
        match self.mode {
            RuleMode::Allow => listed,
            RuleMode::Deny => !listed,
        }
    }
}

/// The closed set of voting variants.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum VotingKind {
    SingleList,
    MultipleList,
    Plebiscite,
    /// A group of sub-votings. The group itself carries no ballot; its
    /// members take its place in the election's voting order.
    Group { members: Vec<Voting> },
}

/// One decision being voted on.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Voting {
    pub id: VotingId,
    pub name: String,
    #[serde(flatten)]
    pub kind: VotingKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule: Option<DiscriminatorRule>,
}

impl Voting {
    pub fn single_list(id: VotingId, name: impl Into<String>) -> Self {
        Self::with_kind(id, name, VotingKind::SingleList)
    }

    pub fn multiple_list(id: VotingId, name: impl Into<String>) -> Self {
        Self::with_kind(id, name, VotingKind::MultipleList)
    }

    pub fn plebiscite(id: VotingId, name: impl Into<String>) -> Self {
        Self::with_kind(id, name, VotingKind::Plebiscite)
    }

    /// A group of member votings, flattened into positions by the election.
    pub fn group(id: VotingId, name: impl Into<String>, members: Vec<Voting>) -> Self {
        Self::with_kind(id, name, VotingKind::Group { members })
    }

    fn with_kind(id: VotingId, name: impl Into<String>, kind: VotingKind) -> Self {
        Self {
            id,
            name: name.into(),
            kind,
            rule: None,
        }
    }

    /// Restrict the voting to voters the rule admits.
    pub fn restricted_by(mut self, rule: DiscriminatorRule) -> Self {
        self.rule = Some(rule);
        self
    }

    /// Whether this voting's own rule admits the voter. Rules of enclosing
    /// groups are applied by [`crate::Election::eligible_votings`].
    pub fn admits(&self, voter: &EligibleVoter) -> bool {
        self.rule.as_ref().map_or(true, |rule| rule.admits(voter))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ids::{ElectionId, VoterId};

    fn voter_in(department: &str) -> EligibleVoter {
        EligibleVoter::new(VoterId::new(1), ElectionId::new(1), "Foo", "Bar")
            .with_discriminator("department", department)
    }

    #[test]
    fn allow_rule_admits_listed_values_only() {
        let rule = DiscriminatorRule::allow("department", ["physics", "maths"]);
        assert!(rule.admits(&voter_in("physics")));
        assert!(!rule.admits(&voter_in("history")));
    }

    #[test]
    fn deny_rule_excludes_listed_values() {
        let rule = DiscriminatorRule::deny("department", ["physics"]);
        assert!(!rule.admits(&voter_in("physics")));
        assert!(rule.admits(&voter_in("history")));
    }

    #[test]
    fn missing_discriminator_depends_on_mode() {
        let voter = EligibleVoter::new(VoterId::new(2), ElectionId::new(1), "A", "B");
        assert!(!DiscriminatorRule::allow("faculty", ["x"]).admits(&voter));
        assert!(DiscriminatorRule::deny("faculty", ["x"]).admits(&voter));
    }

    #[test]
    fn unrestricted_voting_admits_everyone() {
        let voting = Voting::plebiscite(VotingId::new(1), "referendum");
        assert!(voting.admits(&voter_in("anything")));
    }

    #[test]
    fn voting_kind_serializes_with_tag() {
        let voting = Voting::multiple_list(VotingId::new(4), "senate");
        let json = serde_json::to_value(&voting).unwrap();
        assert_eq!(json["kind"], "multiple-list");
        assert_eq!(json["name"], "senate");
        assert!(json.get("rule").is_none());
    }
}
