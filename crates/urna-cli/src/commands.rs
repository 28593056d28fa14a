use anyhow::Context;
use colored::Colorize;
use tokio::io::BufReader;
use urna_protocol::LineTerminator;
use urna_server::{Backend, ProtocolEngine, ServerConfig, TerminationReason, UrnaServer};
use urna_store::{Fixture, InMemoryRegistry, Registry};
use urna_types::BallotBoxId;

use crate::cli::*;

/// Dispatch a parsed command line.
pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Command::Serve(args) => cmd_serve(args).await,
        Command::Attach(args) => cmd_attach(args).await,
        Command::CheckConfig(args) => cmd_check_config(args),
    }
}

async fn cmd_serve(args: ServeArgs) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => ServerConfig::load(path)
            .with_context(|| format!("loading {}", path.display()))?,
        None => ServerConfig::default(),
    };
    let server = UrnaServer::from_config(config)?;
    for terminal in &server.config().terminals {
        println!(
            "{} terminal for {} on {}",
            "→".cyan(),
            terminal.ballot_box.to_string().yellow(),
            terminal.bind_addr.to_string().bold()
        );
    }
    if let Some(addr) = server.config().admin_addr {
        println!("{} admin API on {}", "→".cyan(), addr.to_string().bold());
    }

    tokio::select! {
        served = server.serve() => served?,
        signal = tokio::signal::ctrl_c() => {
            signal?;
            println!("{} Shutting down.", "✓".green());
        }
    }
    Ok(())
}

async fn cmd_attach(args: AttachArgs) -> anyhow::Result<()> {
    let registry = Fixture::load(&args.fixture)
        .and_then(Fixture::into_registry)
        .with_context(|| format!("loading fixture {}", args.fixture.display()))?;
    let terminator = LineTerminator::new(args.line_terminator)?;
    tracing::debug!(ballot_box = args.ballot_box, "attaching session to stdio");

    let mut engine = ProtocolEngine::new(
        Backend::in_memory(registry),
        BallotBoxId::new(args.ballot_box),
        BufReader::new(tokio::io::stdin()),
        tokio::io::stdout(),
        terminator,
    );
    match engine.run().await? {
        TerminationReason::Quit | TerminationReason::EndOfStream => {}
        reason => eprintln!("{} {reason}", "✗".red().bold()),
    }
    Ok(())
}

fn cmd_check_config(args: CheckConfigArgs) -> anyhow::Result<()> {
    let config = ServerConfig::load(&args.config)
        .with_context(|| format!("loading {}", args.config.display()))?;
    let registry = match &config.fixture {
        Some(path) => {
            let registry = Fixture::load(path)
                .and_then(Fixture::into_registry)
                .with_context(|| format!("loading fixture {}", path.display()))?;
            println!("Fixture: {}", path.display().to_string().bold());
            registry
        }
        None => {
            println!("Fixture: {}", "none (empty registry)".dimmed());
            InMemoryRegistry::new()
        }
    };
    println!("Line terminator: {:?}", config.line_terminator.as_str());

    let mut problems = 0;
    for terminal in &config.terminals {
        let Some(ballot_box) = registry.ballot_box(terminal.ballot_box)? else {
            println!(
                "  {} {} on {}: {}",
                "✗".red().bold(),
                terminal.ballot_box,
                terminal.bind_addr,
                "unknown ballot box".red()
            );
            problems += 1;
            continue;
        };
        let active = registry
            .election(ballot_box.election)?
            .is_some_and(|e| e.is_active());
        println!(
            "  {} {} ({}) on {}: {}, election {}",
            "✓".green(),
            ballot_box.id.to_string().yellow(),
            ballot_box.name,
            terminal.bind_addr.to_string().bold(),
            ballot_box.status,
            if active { "active".green() } else { "inactive".dimmed() }
        );
    }
    if let Some(addr) = config.admin_addr {
        println!("Admin API: {}", addr.to_string().bold());
    }

    if problems > 0 {
        anyhow::bail!("{problems} terminal(s) reference unknown ballot boxes");
    }
    println!("{} Configuration OK", "✓".green().bold());
    Ok(())
}
