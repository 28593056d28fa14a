use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::{BallotBoxId, SessionToken};

/// One terminal's connection lifetime against one ballot box.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub token: SessionToken,
    pub ballot_box: BallotBoxId,
    pub started: DateTime<Utc>,
    pub running: bool,
}

impl Session {
    /// A new running session on `ballot_box`.
    pub fn start(ballot_box: BallotBoxId) -> Self {
        Self {
            token: SessionToken::new(),
            ballot_box,
            started: Utc::now(),
            running: true,
        }
    }

    pub fn is_running(&self) -> bool {
        self.running
    }
}
