use std::fmt;

use serde::{Deserialize, Serialize};

macro_rules! entity_id {
    ($(#[$meta:meta])* $name:ident, $prefix:literal) => {
        $(#[$meta])*
        #[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
        #[serde(transparent)]
        pub struct $name(u64);

        impl $name {
            pub const fn new(raw: u64) -> Self {
                Self(raw)
            }

            pub const fn get(self) -> u64 {
                self.0
            }
        }

        impl From<u64> for $name {
            fn from(raw: u64) -> Self {
                Self(raw)
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, "{}({})", stringify!($name), self.0)
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, ":{}"), self.0)
            }
        }
    };
}

entity_id!(
    /// Identifier of an election, assigned by election setup.
    ElectionId,
    "election"
);
entity_id!(
    /// Identifier of a physical ballot box. Unique and immutable.
    BallotBoxId,
    "box"
);
entity_id!(
    /// Identifier of a voting within an election.
    VotingId,
    "voting"
);
entity_id!(
    /// Storage identifier of an eligible voter.
    ///
    /// This is not the voter's external identifier, which is derived from
    /// the matriculation number and name (see [`crate::EligibleVoter::identifier`]).
    VoterId,
    "voter"
);

/// Unique identifier for a vote row (UUID v7 for time-ordering).
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VoteId(uuid::Uuid);

impl VoteId {
    /// Generate a new time-ordered vote ID.
    pub fn new() -> Self {
        Self(uuid::Uuid::now_v7())
    }

    pub fn as_uuid(&self) -> &uuid::Uuid {
        &self.0
    }

    /// Short representation (first 8 characters of the UUID).
    pub fn short_id(&self) -> String {
        self.0.to_string()[..8].to_string()
    }
}

impl Default for VoteId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "VoteId({})", self.short_id())
    }
}

impl fmt::Display for VoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identity token of the process driving a session.
///
/// Pairs the OS process id with a UUID v7 so two sessions started by the
/// same process remain distinguishable.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SessionToken {
    pub process: u32,
    pub nonce: uuid::Uuid,
}

impl SessionToken {
    /// A fresh token for the current process.
    pub fn new() -> Self {
        Self {
            process: std::process::id(),
            nonce: uuid::Uuid::now_v7(),
        }
    }
}

impl Default for SessionToken {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "SessionToken({self})")
    }
}

impl fmt::Display for SessionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.process, &self.nonce.to_string()[..8])
    }
}
