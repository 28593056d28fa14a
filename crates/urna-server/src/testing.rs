//! Shared setup for unit tests.

use chrono::{Duration, Utc};
use urna_store::{InMemoryRegistry, Registry};
use urna_types::{
    BallotBox, BallotBoxId, DiscriminatorRule, Election, ElectionId, EligibleVoter, Period,
    VoterId, Voting, VotingId, DEPARTMENT, MATRICULATION_NUMBER,
};

use crate::backend::Backend;

pub(crate) const BOX: BallotBoxId = BallotBoxId::new(1);
pub(crate) const ELECTION: ElectionId = ElectionId::new(1);

pub(crate) fn active_period() -> Period {
    let now = Utc::now();
    Period::new(now - Duration::hours(1), now + Duration::hours(1)).unwrap()
}

/// Election 1 with `voting-0..voting-2` (the last one restricted to
/// physics), emitted box 1, and voters `100FR` (Foo Bar, physics) and
/// `200AM` (Anna Lindström, law).
pub(crate) fn registry() -> InMemoryRegistry {
    let registry = InMemoryRegistry::new();
    registry
        .insert_election(
            Election::new(ELECTION, "Student Parliament")
                .with_period(active_period())
                .with_voting(Voting::single_list(VotingId::new(10), "voting-0"))
                .with_voting(Voting::plebiscite(VotingId::new(11), "voting-1"))
                .with_voting(
                    Voting::multiple_list(VotingId::new(12), "voting-2")
                        .restricted_by(DiscriminatorRule::allow(DEPARTMENT, ["physics"])),
                ),
        )
        .unwrap();
    registry
        .insert_ballot_box(BallotBox::new(BOX, "Library", "north", ELECTION))
        .unwrap();
    registry.emit_ballot_box(BOX).unwrap();
    registry
        .insert_voter(
            EligibleVoter::new(VoterId::new(1), ELECTION, "Foo", "Bar")
                .with_discriminator(MATRICULATION_NUMBER, "100")
                .with_discriminator(DEPARTMENT, "physics"),
        )
        .unwrap();
    registry
        .insert_voter(
            EligibleVoter::new(VoterId::new(2), ELECTION, "Anna", "Lindström")
                .with_discriminator(MATRICULATION_NUMBER, "200")
                .with_discriminator(DEPARTMENT, "law"),
        )
        .unwrap();
    registry
}

pub(crate) fn backend() -> Backend {
    Backend::in_memory(registry())
}
