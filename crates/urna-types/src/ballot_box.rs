use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::TypeError;
use crate::ids::{BallotBoxId, ElectionId};

/// Lifecycle status of a physical ballot box.
///
/// Only [`BallotBox::emit`] and [`BallotBox::return_box`] are guarded here.
/// The remaining statuses are reached through administrative transitions
/// driven outside the terminal protocol.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum BallotBoxStatus {
    #[default]
    New,
    Emitted,
    Opened,
    Closed,
    Returned,
    Counting,
    Counted,
    Recounting,
    Valid,
    Void,
    Unused,
}

impl BallotBoxStatus {
    /// Every status, in lifecycle order.
    pub const ALL: [BallotBoxStatus; 11] = [
        Self::New,
        Self::Emitted,
        Self::Opened,
        Self::Closed,
        Self::Returned,
        Self::Counting,
        Self::Counted,
        Self::Recounting,
        Self::Valid,
        Self::Void,
        Self::Unused,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::New => "NEW",
            Self::Emitted => "EMITTED",
            Self::Opened => "OPENED",
            Self::Closed => "CLOSED",
            Self::Returned => "RETURNED",
            Self::Counting => "COUNTING",
            Self::Counted => "COUNTED",
            Self::Recounting => "RECOUNTING",
            Self::Valid => "VALID",
            Self::Void => "VOID",
            Self::Unused => "UNUSED",
        }
    }

    /// Whether a terminal session may run against a box in this state.
    pub fn is_available_for_voting_session(&self) -> bool {
        matches!(self, Self::Emitted | Self::Closed | Self::Opened)
    }
}

impl fmt::Display for BallotBoxStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BallotBoxStatus {
    type Err = TypeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| TypeError::UnknownStatus(s.to_string()))
    }
}

/// Credential a ballot box terminal presents, e.g. a public key.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Credential(Vec<u8>);

impl Credential {
    /// Parse a hex-encoded credential.
    pub fn from_hex(s: &str) -> Result<Self, TypeError> {
        hex::decode(s)
            .map(Self)
            .map_err(|e| TypeError::InvalidHex(e.to_string()))
    }

    /// Lowercase hex encoding, as shown by the admin API.
    pub fn to_hex(&self) -> String {
        hex::encode(&self.0)
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hex = self.to_hex();
        write!(f, "Credential({})", &hex[..hex.len().min(16)])
    }
}

/// A physical voting unit bound to exactly one election.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BallotBox {
    pub id: BallotBoxId,
    pub name: String,
    pub group: String,
    pub election: ElectionId,
    pub status: BallotBoxStatus,
    pub credential: Option<Credential>,
}

impl BallotBox {
    /// A fresh box in state `NEW`.
    pub fn new(
        id: BallotBoxId,
        name: impl Into<String>,
        group: impl Into<String>,
        election: ElectionId,
    ) -> Self {
        Self {
            id,
            name: name.into(),
            group: group.into(),
            election,
            status: BallotBoxStatus::New,
            credential: None,
        }
    }

    /// Attach the credential the box's terminal presents.
    pub fn with_credential(mut self, credential: Credential) -> Self {
        self.credential = Some(credential);
        self
    }

    /// Hand the box out to a polling station. Legal from `NEW` or `RETURNED`.
    pub fn emit(&mut self) -> Result<(), TypeError> {
        match self.status {
            BallotBoxStatus::New | BallotBoxStatus::Returned => {
                self.status = BallotBoxStatus::Emitted;
                Ok(())
            }
            from => Err(TypeError::IllegalTransition {
                action: "emit",
                from,
            }),
        }
    }

    /// Take the box back from a polling station. Legal from `EMITTED`,
    /// `OPENED` or `CLOSED`.
    pub fn return_box(&mut self) -> Result<(), TypeError> {
        match self.status {
            BallotBoxStatus::Emitted | BallotBoxStatus::Closed | BallotBoxStatus::Opened => {
                self.status = BallotBoxStatus::Returned;
                Ok(())
            }
            from => Err(TypeError::IllegalTransition {
                action: "return",
                from,
            }),
        }
    }

    /// Whether a terminal may run a voting session on this box.
    pub fn is_available_for_voting_session(&self) -> bool {
        self.status.is_available_for_voting_session()
    }
}
