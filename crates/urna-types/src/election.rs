use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{ElectionId, VotingId};
use crate::voter::EligibleVoter;
use crate::voting::{DiscriminatorRule, Voting, VotingKind};

/// A half-open time window `[start, end)` during which an election is active.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Period {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Period {
    /// A period from `start` (inclusive) to `end` (exclusive).
    pub fn new(start: DateTime<Utc>, end: DateTime<Utc>) -> Result<Self, TypeError> {
        if end <= start {
            return Err(TypeError::InvalidPeriod {
                start: start.to_rfc3339(),
                end: end.to_rfc3339(),
            });
        }
        Ok(Self { start, end })
    }

    /// Whether `instant` falls inside the period.
    pub fn contains(&self, instant: DateTime<Utc>) -> bool {
        self.start <= instant && instant < self.end
    }
}

/// An election: periods plus an ordered list of votings.
///
/// Voting positions are 1-based and follow [`Election::votings`], which
/// expands groups into their members. These positions are what terminals
/// send as voting indices.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Election {
    pub id: ElectionId,
    pub name: String,
    #[serde(default)]
    pub periods: Vec<Period>,
    #[serde(default)]
    pub votings: Vec<Voting>,
}

impl Election {
    /// An election with no periods and no votings.
    pub fn new(id: ElectionId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            periods: Vec::new(),
            votings: Vec::new(),
        }
    }

    pub fn with_period(mut self, period: Period) -> Self {
        self.periods.push(period);
        self
    }

    pub fn with_voting(mut self, voting: Voting) -> Self {
        self.votings.push(voting);
        self
    }

    /// Whether the election is active now.
    pub fn is_active(&self) -> bool {
        self.is_active_at(Utc::now())
    }

    pub fn is_active_at(&self, instant: DateTime<Utc>) -> bool {
        self.periods.iter().any(|p| p.contains(instant))
    }

    /// Ballot-bearing votings in election order.
    pub fn votings(&self) -> Vec<&Voting> {
        self.flatten().into_iter().map(|(voting, _)| voting).collect()
    }

    /// The voting at a 1-based position.
    pub fn voting_at(&self, position: usize) -> Option<&Voting> {
        position
            .checked_sub(1)
            .and_then(|index| self.votings().get(index).copied())
    }

    /// The 1-based position of a voting, if it belongs to this election.
    pub fn position_of(&self, voting: VotingId) -> Option<usize> {
        self.votings()
            .iter()
            .position(|v| v.id == voting)
            .map(|index| index + 1)
    }

    /// Votings the voter may take part in, with their 1-based positions.
    ///
    /// A voting nested in groups must be admitted by its own rule and by the
    /// rule of every enclosing group.
    pub fn eligible_votings(&self, voter: &EligibleVoter) -> Vec<(usize, &Voting)> {
        self.flatten()
            .into_iter()
            .enumerate()
            .filter(|(_, (voting, rules))| {
                voting.admits(voter) && rules.iter().all(|rule| rule.admits(voter))
            })
            .map(|(index, (voting, _))| (index + 1, voting))
            .collect()
    }

    fn flatten(&self) -> Vec<(&Voting, Vec<&DiscriminatorRule>)> {
        fn walk<'a>(
            votings: &'a [Voting],
            inherited: &[&'a DiscriminatorRule],
            out: &mut Vec<(&'a Voting, Vec<&'a DiscriminatorRule>)>,
        ) {
            for voting in votings {
                match &voting.kind {
                    VotingKind::Group { members } => {
                        let mut rules = inherited.to_vec();
                        rules.extend(voting.rule.as_ref());
                        walk(members, &rules, out);
                    }
                    _ => out.push((voting, inherited.to_vec())),
                }
            }
        }

        let mut out = Vec::new();
        walk(&self.votings, &[], &mut out);
        out
    }
}
