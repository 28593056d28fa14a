use std::collections::HashSet;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use urna_protocol::LineTerminator;
use urna_types::BallotBoxId;

use crate::error::{ServerError, ServerResult};

/// Server configuration, read from TOML.
///
/// ```toml
/// line_terminator = "\r\n"
/// admin_addr = "127.0.0.1:7080"
/// fixture = "election.toml"
///
/// [[terminals]]
/// ballot_box = 1
/// bind_addr = "127.0.0.1:7001"
/// ```
#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    #[serde(default)]
    pub line_terminator: LineTerminator,
    #[serde(default)]
    pub admin_addr: Option<SocketAddr>,
    #[serde(default)]
    pub terminals: Vec<TerminalConfig>,
    /// Election fixture seeding the in-memory registry. Relative paths are
    /// resolved against the configuration file's directory.
    #[serde(default)]
    pub fixture: Option<PathBuf>,
}

/// One terminal listener. Accepts one connection at a time.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TerminalConfig {
    pub ballot_box: BallotBoxId,
    pub bind_addr: SocketAddr,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            line_terminator: LineTerminator::default(),
            admin_addr: None,
            terminals: vec![TerminalConfig {
                ballot_box: BallotBoxId::new(1),
                bind_addr: SocketAddr::from(([127, 0, 0, 1], 7001)),
            }],
            fixture: None,
        }
    }
}

impl ServerConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(s: &str) -> ServerResult<Self> {
        let config: Self = toml::from_str(s).map_err(|e| ServerError::Config(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Load a config file. A relative fixture path is resolved against the
    /// file's directory.
    pub fn load(path: impl AsRef<Path>) -> ServerResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .map_err(|e| ServerError::Config(format!("{}: {e}", path.display())))?;
        let mut config = Self::from_toml_str(&text)?;
        if let (Some(fixture), Some(dir)) = (&config.fixture, path.parent()) {
            if fixture.is_relative() {
                config.fixture = Some(dir.join(fixture));
            }
        }
        Ok(config)
    }

    /// Reject configurations no server could serve.
    pub fn validate(&self) -> ServerResult<()> {
        if self.terminals.is_empty() {
            return Err(ServerError::Config("no terminals configured".into()));
        }

        let mut boxes = HashSet::new();
        let mut addrs = HashSet::new();
        for terminal in &self.terminals {
            if !boxes.insert(terminal.ballot_box) {
                return Err(ServerError::Config(format!(
                    "{} has more than one terminal",
                    terminal.ballot_box
                )));
            }
            // Port 0 asks the OS for a fresh port, so it never clashes.
            if terminal.bind_addr.port() != 0 && !addrs.insert(terminal.bind_addr) {
                return Err(ServerError::Config(format!(
                    "{} is bound more than once",
                    terminal.bind_addr
                )));
            }
        }
        if let Some(admin) = self.admin_addr {
            if admin.port() != 0 && addrs.contains(&admin) {
                return Err(ServerError::Config(format!(
                    "admin address {admin} is also a terminal address"
                )));
            }
        }
        Ok(())
    }
}
