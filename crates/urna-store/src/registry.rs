//! In-memory election registry and session lifecycle.
//!
//! [`InMemoryRegistry`] holds elections, ballot boxes, eligible voters and
//! sessions behind a `RwLock` and publishes a [`StoreEvent`] whenever a
//! ballot box or session changes, so running engines can re-check their
//! availability without polling.

use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use urna_types::{
    BallotBox, BallotBoxId, BallotBoxStatus, Election, ElectionId, EligibleVoter, Session,
    SessionToken, TypeError, VoterId,
};

use crate::error::{StoreError, StoreResult};
use crate::events::{EventBus, EventStream, StoreEvent};
use crate::traits::{Registry, SessionLifecycle};

const EVENT_CAPACITY: usize = 256;

/// An in-memory implementation of [`Registry`] and [`SessionLifecycle`].
///
/// Starting a session on a ballot box that already has a running session
/// stops the older one; at most one session per box is running at a time.
#[derive(Debug)]
pub struct InMemoryRegistry {
    state: RwLock<RegistryState>,
    events: EventBus,
}

#[derive(Debug, Default)]
struct RegistryState {
    elections: HashMap<ElectionId, Election>,
    ballot_boxes: HashMap<BallotBoxId, BallotBox>,
    voters: HashMap<VoterId, EligibleVoter>,
    sessions: HashMap<SessionToken, Session>,
    running: HashMap<BallotBoxId, SessionToken>,
}

impl InMemoryRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self {
            state: RwLock::new(RegistryState::default()),
            events: EventBus::new(EVENT_CAPACITY),
        }
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, RegistryState>> {
        self.state
            .read()
            .map_err(|e| StoreError::Unavailable(format!("registry lock poisoned: {e}")))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, RegistryState>> {
        self.state
            .write()
            .map_err(|e| StoreError::Unavailable(format!("registry lock poisoned: {e}")))
    }

    /// Add an election. Ids must be unique.
    pub fn insert_election(&self, election: Election) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.elections.contains_key(&election.id) {
            return Err(StoreError::Duplicate {
                entity: "election",
                key: election.id.to_string(),
            });
        }
        state.elections.insert(election.id, election);
        Ok(())
    }

    /// Add a ballot box for an existing election.
    pub fn insert_ballot_box(&self, ballot_box: BallotBox) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.elections.contains_key(&ballot_box.election) {
            return Err(StoreError::not_found("election", ballot_box.election));
        }
        if state.ballot_boxes.contains_key(&ballot_box.id) {
            return Err(StoreError::Duplicate {
                entity: "ballot box",
                key: ballot_box.id.to_string(),
            });
        }
        state.ballot_boxes.insert(ballot_box.id, ballot_box);
        Ok(())
    }

    /// Register an eligible voter. Matriculation numbers are unique per
    /// election.
    pub fn insert_voter(&self, voter: EligibleVoter) -> StoreResult<()> {
        let mut state = self.write()?;
        if !state.elections.contains_key(&voter.election) {
            return Err(StoreError::not_found("election", voter.election));
        }
        if state.voters.contains_key(&voter.id) {
            return Err(StoreError::Duplicate {
                entity: "voter",
                key: voter.id.to_string(),
            });
        }
        if let Some(number) = voter.matriculation_number() {
            let taken = state.voters.values().any(|other| {
                other.election == voter.election && other.matriculation_number() == Some(number)
            });
            if taken {
                return Err(StoreError::Duplicate {
                    entity: "matriculation number",
                    key: number.to_string(),
                });
            }
        }
        state.voters.insert(voter.id, voter);
        Ok(())
    }

    /// The token of the session currently running on the ballot box.
    pub fn running_session(&self, ballot_box: BallotBoxId) -> StoreResult<Option<SessionToken>> {
        Ok(self.read()?.running.get(&ballot_box).copied())
    }

    fn transition<F>(&self, id: BallotBoxId, apply: F) -> StoreResult<BallotBox>
    where
        F: FnOnce(&mut BallotBox) -> Result<(), TypeError>,
    {
        let updated = {
            let mut state = self.write()?;
            let ballot_box = state
                .ballot_boxes
                .get_mut(&id)
                .ok_or_else(|| StoreError::not_found("ballot box", id))?;
            apply(ballot_box)?;
            ballot_box.clone()
        };
        self.events.publish(StoreEvent::BallotBoxChanged(id));
        Ok(updated)
    }

    fn stop_running(state: &mut RegistryState, ballot_box: BallotBoxId) -> Option<Session> {
        let token = state.running.remove(&ballot_box)?;
        let session = state.sessions.get_mut(&token)?;
        session.running = false;
        Some(session.clone())
    }
}

impl Default for InMemoryRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl Registry for InMemoryRegistry {
    fn ballot_box(&self, id: BallotBoxId) -> StoreResult<Option<BallotBox>> {
        Ok(self.read()?.ballot_boxes.get(&id).cloned())
    }

    fn election(&self, id: ElectionId) -> StoreResult<Option<Election>> {
        Ok(self.read()?.elections.get(&id).cloned())
    }

    fn voter(&self, id: VoterId) -> StoreResult<Option<EligibleVoter>> {
        Ok(self.read()?.voters.get(&id).cloned())
    }

    fn find_voter(
        &self,
        election: ElectionId,
        name: &str,
        value: &str,
    ) -> StoreResult<Option<EligibleVoter>> {
        let state = self.read()?;
        Ok(state
            .voters
            .values()
            .find(|v| v.election == election && v.discriminator(name) == Some(value))
            .cloned())
    }

    fn emit_ballot_box(&self, id: BallotBoxId) -> StoreResult<BallotBox> {
        let updated = self.transition(id, BallotBox::emit)?;
        tracing::info!(ballot_box = %id, "ballot box emitted");
        Ok(updated)
    }

    fn return_ballot_box(&self, id: BallotBoxId) -> StoreResult<BallotBox> {
        let updated = self.transition(id, BallotBox::return_box)?;
        tracing::info!(ballot_box = %id, "ballot box returned");
        Ok(updated)
    }

    fn set_ballot_box_status(
        &self,
        id: BallotBoxId,
        status: BallotBoxStatus,
    ) -> StoreResult<BallotBox> {
        let updated = self.transition(id, |b| {
            b.status = status;
            Ok(())
        })?;
        tracing::warn!(ballot_box = %id, %status, "ballot box status overridden");
        Ok(updated)
    }

    fn subscribe(&self) -> EventStream {
        self.events.subscribe()
    }
}

impl SessionLifecycle for InMemoryRegistry {
    fn start(&self, ballot_box: BallotBoxId) -> StoreResult<Session> {
        let (session, replaced) = {
            let mut state = self.write()?;
            if !state.ballot_boxes.contains_key(&ballot_box) {
                return Err(StoreError::not_found("ballot box", ballot_box));
            }
            let replaced = Self::stop_running(&mut state, ballot_box);
            let session = Session::start(ballot_box);
            state.running.insert(ballot_box, session.token);
            state.sessions.insert(session.token, session.clone());
            (session, replaced)
        };

        if let Some(old) = replaced {
            tracing::warn!(ballot_box = %ballot_box, replaced = %old.token, "session taken over");
            self.events.publish(StoreEvent::SessionStopped {
                ballot_box,
                token: old.token,
            });
        }
        Ok(session)
    }

    fn refresh(&self, session: &Session) -> StoreResult<Session> {
        self.read()?
            .sessions
            .get(&session.token)
            .cloned()
            .ok_or_else(|| StoreError::not_found("session", session.token))
    }

    fn stop(&self, ballot_box: BallotBoxId) -> StoreResult<Option<Session>> {
        let stopped = Self::stop_running(&mut *self.write()?, ballot_box);
        if let Some(session) = &stopped {
            self.events.publish(StoreEvent::SessionStopped {
                ballot_box,
                token: session.token,
            });
        }
        Ok(stopped)
    }

    fn finish(&self, session: &Session) -> StoreResult<()> {
        let mut state = self.write()?;
        if state.running.get(&session.ballot_box) == Some(&session.token) {
            state.running.remove(&session.ballot_box);
        }
        if let Some(stored) = state.sessions.get_mut(&session.token) {
            stored.running = false;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use urna_types::{Voting, VotingId, MATRICULATION_NUMBER};

    fn seeded() -> InMemoryRegistry {
        let registry = InMemoryRegistry::new();
        registry
            .insert_election(
                Election::new(ElectionId::new(1), "e")
                    .with_voting(Voting::single_list(VotingId::new(1), "voting-0")),
            )
            .unwrap();
        registry
            .insert_ballot_box(BallotBox::new(BallotBoxId::new(1), "box", "g", ElectionId::new(1)))
            .unwrap();
        registry
            .insert_voter(
                EligibleVoter::new(VoterId::new(1), ElectionId::new(1), "Foo", "Bar")
                    .with_discriminator(MATRICULATION_NUMBER, "100"),
            )
            .unwrap();
        registry
    }

    #[test]
    fn ballot_box_requires_known_election() {
        let registry = InMemoryRegistry::new();
        let err = registry
            .insert_ballot_box(BallotBox::new(BallotBoxId::new(1), "b", "g", ElectionId::new(9)))
            .unwrap_err();
        assert!(matches!(err, StoreError::NotFound { entity: "election", .. }));
    }

    #[test]
    fn matriculation_numbers_are_unique_per_election() {
        let registry = seeded();
        let err = registry
            .insert_voter(
                EligibleVoter::new(VoterId::new(2), ElectionId::new(1), "Baz", "Qux")
                    .with_discriminator(MATRICULATION_NUMBER, "100"),
            )
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate { .. }));
    }

    #[test]
    fn find_voter_by_discriminator() {
        let registry = seeded();
        let found = registry
            .find_voter(ElectionId::new(1), MATRICULATION_NUMBER, "100")
            .unwrap()
            .unwrap();
        assert_eq!(found.id, VoterId::new(1));
        assert!(registry
            .find_voter(ElectionId::new(1), MATRICULATION_NUMBER, "101")
            .unwrap()
            .is_none());
        assert!(registry
            .find_voter(ElectionId::new(2), MATRICULATION_NUMBER, "100")
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn guarded_transitions_publish_events() {
        let registry = seeded();
        let mut events = registry.subscribe();

        let b = registry.emit_ballot_box(BallotBoxId::new(1)).unwrap();
        assert_eq!(b.status, BallotBoxStatus::Emitted);
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::BallotBoxChanged(BallotBoxId::new(1))
        );

        let err = registry.emit_ballot_box(BallotBoxId::new(1)).unwrap_err();
        assert!(matches!(err, StoreError::Transition(_)));
        assert_eq!(
            registry.ballot_box(BallotBoxId::new(1)).unwrap().unwrap().status,
            BallotBoxStatus::Emitted
        );
    }

    #[test]
    fn status_override_is_unguarded() {
        let registry = seeded();
        let b = registry
            .set_ballot_box_status(BallotBoxId::new(1), BallotBoxStatus::Opened)
            .unwrap();
        assert!(b.is_available_for_voting_session());
        registry.return_ballot_box(BallotBoxId::new(1)).unwrap();
    }

    #[test]
    fn session_start_requires_ballot_box() {
        let registry = seeded();
        assert!(registry.start(BallotBoxId::new(5)).is_err());
    }

    #[tokio::test]
    async fn starting_a_second_session_stops_the_first() {
        let registry = seeded();
        let first = registry.start(BallotBoxId::new(1)).unwrap();
        let mut events = registry.subscribe();
        let second = registry.start(BallotBoxId::new(1)).unwrap();

        assert!(!registry.refresh(&first).unwrap().is_running());
        assert!(registry.refresh(&second).unwrap().is_running());
        assert_eq!(registry.running_session(BallotBoxId::new(1)).unwrap(), Some(second.token));
        assert_eq!(
            events.recv().await.unwrap(),
            StoreEvent::SessionStopped {
                ballot_box: BallotBoxId::new(1),
                token: first.token
            }
        );
    }

    #[test]
    fn stop_and_finish_end_sessions() {
        let registry = seeded();
        let session = registry.start(BallotBoxId::new(1)).unwrap();
        let stopped = registry.stop(BallotBoxId::new(1)).unwrap().unwrap();
        assert_eq!(stopped.token, session.token);
        assert!(registry.stop(BallotBoxId::new(1)).unwrap().is_none());

        let next = registry.start(BallotBoxId::new(1)).unwrap();
        registry.finish(&next).unwrap();
        assert!(!registry.refresh(&next).unwrap().is_running());
        assert_eq!(registry.running_session(BallotBoxId::new(1)).unwrap(), None);
    }
}
