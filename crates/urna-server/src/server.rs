use std::net::SocketAddr;

use tokio::io::BufReader;
use tokio::net::TcpListener;
use tokio::task::JoinSet;
use tracing::{error, info, info_span, Instrument};
use urna_protocol::LineTerminator;
use urna_store::{Fixture, InMemoryRegistry};
use urna_types::BallotBoxId;

use crate::backend::Backend;
use crate::commands::Command;
use crate::config::ServerConfig;
use crate::engine::ProtocolEngine;
use crate::error::{ServerError, ServerResult};
use crate::handler::AdminState;
use crate::router::build_router;

/// A TCP listener serving one ballot box, one connection at a time.
///
/// Further connections wait in the accept backlog until the current session
/// ends.
pub struct TerminalListener {
    listener: TcpListener,
    ballot_box: BallotBoxId,
    backend: Backend,
    terminator: LineTerminator,
}

impl TerminalListener {
    /// Bind a listener for a ballot box known to the registry.
    pub async fn bind(
        addr: SocketAddr,
        ballot_box: BallotBoxId,
        backend: Backend,
        terminator: LineTerminator,
    ) -> ServerResult<Self> {
        if backend.registry.ballot_box(ballot_box)?.is_none() {
            return Err(ServerError::BallotBoxNotFound(ballot_box));
        }
        let listener = TcpListener::bind(addr).await?;
        Ok(Self {
            listener,
            ballot_box,
            backend,
            terminator,
        })
    }

    pub fn local_addr(&self) -> ServerResult<SocketAddr> {
        Ok(self.listener.local_addr()?)
    }

    /// Accept and serve terminals until the task is dropped.
    pub async fn run(self) -> ServerResult<()> {
        info!(ballot_box = %self.ballot_box, addr = %self.local_addr()?, "terminal listener ready");
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(e) => {
                    error!(ballot_box = %self.ballot_box, error = %e, "accept failed");
                    continue;
                }
            };
            let span = info_span!("session", ballot_box = %self.ballot_box, %peer);
            let (read, write) = stream.into_split();
            let mut engine = ProtocolEngine::new(
                self.backend.clone(),
                self.ballot_box,
                BufReader::new(read),
                write,
                self.terminator.clone(),
            );
            async {
                if let Err(e) = engine.run().await {
                    error!(error = %e, "session could not start");
                }
            }
            .instrument(span)
            .await;
        }
    }
}

/// Urna terminal server: one listener per configured ballot box plus the
/// optional admin API.
pub struct UrnaServer {
    config: ServerConfig,
    backend: Backend,
}

impl UrnaServer {
    /// Create a server over an existing backend.
    pub fn new(config: ServerConfig, backend: Backend) -> Self {
        Self { config, backend }
    }

    /// Build a server over in-memory storage seeded from the configured
    /// fixture, or empty if none is configured.
    pub fn from_config(config: ServerConfig) -> ServerResult<Self> {
        let registry = match &config.fixture {
            Some(path) => Fixture::load(path)?.into_registry()?,
            None => InMemoryRegistry::new(),
        };
        Ok(Self::new(config, Backend::in_memory(registry)))
    }

    pub fn config(&self) -> &ServerConfig {
        &self.config
    }

    pub fn backend(&self) -> &Backend {
        &self.backend
    }

    /// Build the admin router (useful for testing).
    pub fn router(&self) -> axum::Router {
        build_router(AdminState {
            backend: self.backend.clone(),
            terminals: self.config.terminals.iter().map(|t| t.ballot_box).collect(),
        })
    }

    /// Bind every listener, then serve until one of them fails.
    pub async fn serve(self) -> ServerResult<()> {
        self.config.validate()?;
        Command::validate_registry()?;

        let mut tasks = JoinSet::new();
        for terminal in &self.config.terminals {
            let listener = TerminalListener::bind(
                terminal.bind_addr,
                terminal.ballot_box,
                self.backend.clone(),
                self.config.line_terminator.clone(),
            )
            .await?;
            tasks.spawn(listener.run());
        }

        if let Some(addr) = self.config.admin_addr {
            let app = self.router();
            let listener = TcpListener::bind(addr).await?;
            info!(%addr, "admin API listening");
            tasks.spawn(async move {
                axum::serve(listener, app)
                    .await
                    .map_err(|e| ServerError::Internal(e.to_string()))
            });
        }

        while let Some(joined) = tasks.join_next().await {
            joined.map_err(|e| ServerError::Internal(e.to_string()))??;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing;

    #[test]
    fn server_construction() {
        let server = UrnaServer::new(ServerConfig::default(), testing::backend());
        assert_eq!(server.config().terminals.len(), 1);
        let _router = server.router();
    }

    #[test]
    fn from_config_without_fixture_is_empty() {
        let server = UrnaServer::from_config(ServerConfig::default()).unwrap();
        assert!(server.backend().registry.ballot_box(BallotBoxId::new(1)).unwrap().is_none());
    }

    #[tokio::test]
    async fn listener_requires_known_ballot_box() {
        let result = TerminalListener::bind(
            "127.0.0.1:0".parse().unwrap(),
            BallotBoxId::new(42),
            testing::backend(),
            LineTerminator::default(),
        )
        .await;
        assert!(matches!(result, Err(ServerError::BallotBoxNotFound(_))));
    }

    #[tokio::test]
    async fn serve_fails_for_unknown_ballot_box() {
        let mut config = ServerConfig::default();
        config.terminals[0].bind_addr = "127.0.0.1:0".parse().unwrap();
        let server = UrnaServer::from_config(config).unwrap();
        assert!(matches!(server.serve().await, Err(ServerError::BallotBoxNotFound(_))));
    }
}
