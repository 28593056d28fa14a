//! Drives a terminal listener over real TCP.

use std::net::SocketAddr;
use std::time::Duration;

use chrono::Utc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::tcp::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::TcpStream;
use tokio::time::timeout;
use urna_protocol::LineTerminator;
use urna_server::{Backend, TerminalListener};
use urna_store::Fixture;
use urna_types::BallotBoxId;

const WAIT: Duration = Duration::from_secs(5);

fn fixture() -> String {
    let start = (Utc::now() - chrono::Duration::hours(1)).to_rfc3339();
    let end = (Utc::now() + chrono::Duration::hours(1)).to_rfc3339();
    format!(
        r#"
[[elections]]
id = 1
name = "Student Parliament"
periods = [{{ start = "{start}", end = "{end}" }}]

[[elections.votings]]
id = 1
name = "voting-0"
kind = "single-list"

[[elections.votings]]
id = 2
name = "voting-1"
kind = "plebiscite"

[[ballot_boxes]]
id = 1
name = "Library"
election = 1
status = "EMITTED"

[[voters]]
id = 1
election = 1
given_name = "Foo"
family_name = "Bar"
discriminators = {{ matriculationNumber = "100", department = "physics" }}
"#
    )
}

struct Terminal {
    lines: tokio::io::Lines<BufReader<OwnedReadHalf>>,
    input: OwnedWriteHalf,
}

impl Terminal {
    async fn connect(addr: SocketAddr) -> Self {
        let stream = TcpStream::connect(addr).await.unwrap();
        let (read, write) = stream.into_split();
        Self {
            lines: BufReader::new(read).lines(),
            input: write,
        }
    }

    async fn send(&mut self, line: &str) {
        self.input.write_all(format!("{line}\r\n").as_bytes()).await.unwrap();
    }

    async fn line(&mut self) -> Option<String> {
        timeout(WAIT, self.lines.next_line()).await.unwrap().unwrap()
    }

    async fn expect(&mut self, expected: &[&str]) {
        for want in expected {
            assert_eq!(self.line().await.as_deref(), Some(*want));
        }
    }
}

async fn start() -> (Backend, SocketAddr) {
    let registry = Fixture::from_toml_str(&fixture()).unwrap().into_registry().unwrap();
    let backend = Backend::in_memory(registry);
    let listener = TerminalListener::bind(
        "127.0.0.1:0".parse().unwrap(),
        BallotBoxId::new(1),
        backend.clone(),
        LineTerminator::default(),
    )
    .await
    .unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(listener.run());
    (backend, addr)
}

#[tokio::test]
async fn full_voting_session_over_tcp() {
    let (_backend, addr) = start().await;
    let mut t = Terminal::connect(addr).await;

    t.send("show-elections").await;
    t.expect(&["+OK", "1 voting-0", "2 voting-1", ""]).await;

    t.send("check-voter 100FR").await;
    t.expect(&["+OK", "Foo,Bar", "physics", "1 voting-0", "2 voting-1", ""]).await;

    t.send("insert-queue-element 100FR 1 2").await;
    t.expect(&["+OK"]).await;
    t.send("show-queue").await;
    t.expect(&["+OK", "100FR 1 2", ""]).await;

    t.send("commit-queue-element 100FR").await;
    t.expect(&["+OK"]).await;
    t.send("show-queue").await;
    t.expect(&["+OK", ""]).await;

    t.send("insert-queue-element 100FR 1").await;
    assert!(t.line().await.unwrap().starts_with("-1004 "));

    t.send("quit").await;
    t.expect(&["+OK"]).await;
    assert_eq!(t.line().await, None);
}

#[tokio::test]
async fn listener_serves_next_terminal_after_quit() {
    let (_backend, addr) = start().await;

    let mut first = Terminal::connect(addr).await;
    first.send("quit").await;
    first.expect(&["+OK"]).await;
    assert_eq!(first.line().await, None);

    let mut second = Terminal::connect(addr).await;
    second.send("show-queue").await;
    second.expect(&["+OK", ""]).await;
}

#[tokio::test]
async fn operator_stop_terminates_idle_session() {
    let (backend, addr) = start().await;
    let mut t = Terminal::connect(addr).await;
    t.send("show-queue").await;
    t.expect(&["+OK", ""]).await;

    backend.sessions.stop(BallotBoxId::new(1)).unwrap();
    assert!(t.line().await.unwrap().starts_with("-1023 "));
    assert_eq!(t.line().await, None);
}
