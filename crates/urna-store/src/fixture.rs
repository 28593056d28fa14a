//! Election fixtures: TOML documents that seed an [`InMemoryRegistry`].
//!
//! ```toml
//! [[elections]]
//! id = 1
//! name = "Student Parliament"
//! periods = [{ start = "2026-10-19T08:00:00Z", end = "2026-10-23T18:00:00Z" }]
//!
//! [[elections.votings]]
//! id = 1
//! name = "parliament"
//! kind = "single-list"
//!
//! [[ballot_boxes]]
//! id = 1
//! name = "Library"
//! group = "north"
//! election = 1
//! status = "EMITTED"
//!
//! [[voters]]
//! id = 1
//! election = 1
//! given_name = "Foo"
//! family_name = "Bar"
//! discriminators = { matriculationNumber = "100", department = "physics" }
//! ```
//!
//! Timestamps are quoted RFC 3339 strings.

use std::path::Path;

use serde::Deserialize;
use urna_types::{
    BallotBox, BallotBoxId, BallotBoxStatus, Credential, Election, ElectionId, EligibleVoter,
};

use crate::error::{StoreError, StoreResult};
use crate::registry::InMemoryRegistry;

/// Elections, ballot boxes and voters to seed a registry with.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Fixture {
    #[serde(default)]
    pub elections: Vec<Election>,
    #[serde(default)]
    pub ballot_boxes: Vec<BallotBoxEntry>,
    #[serde(default)]
    pub voters: Vec<EligibleVoter>,
}

/// Ballot box as written in a fixture: status defaults to `NEW` and the
/// credential is hex-encoded.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct BallotBoxEntry {
    pub id: BallotBoxId,
    pub name: String,
    #[serde(default)]
    pub group: String,
    pub election: ElectionId,
    #[serde(default)]
    pub status: BallotBoxStatus,
    #[serde(default)]
    pub credential: Option<String>,
}

impl BallotBoxEntry {
    fn into_ballot_box(self) -> StoreResult<BallotBox> {
        let mut ballot_box = BallotBox::new(self.id, self.name, self.group, self.election);
        ballot_box.status = self.status;
        match self.credential {
            Some(hex) => Ok(ballot_box.with_credential(Credential::from_hex(&hex)?)),
            None => Ok(ballot_box),
        }
    }
}

impl Fixture {
    pub fn from_toml_str(s: &str) -> StoreResult<Self> {
        toml::from_str(s).map_err(|e| StoreError::Fixture(e.to_string()))
    }

    /// Read a fixture file.
    pub fn load(path: impl AsRef<Path>) -> StoreResult<Self> {
        let text = std::fs::read_to_string(path.as_ref())?;
        Self::from_toml_str(&text)
    }

    /// Build a registry from this fixture. References between entities are
    /// validated as they are inserted.
    pub fn into_registry(self) -> StoreResult<InMemoryRegistry> {
        let registry = InMemoryRegistry::new();
        let (elections, boxes, voters) = (
            self.elections.len(),
            self.ballot_boxes.len(),
            self.voters.len(),
        );
        for election in self.elections {
            registry.insert_election(election)?;
        }
        for entry in self.ballot_boxes {
            registry.insert_ballot_box(entry.into_ballot_box()?)?;
        }
        for voter in self.voters {
            registry.insert_voter(voter)?;
        }
        tracing::info!(elections, ballot_boxes = boxes, voters, "fixture loaded");
        Ok(registry)
    }
}
