//! Gateway binary: a thin CLI shell around the `orc_gateway` library.
//! Grounded on the teacher's `Cli`/`Command` split in
//! `crates/gateway/src/main.rs` — `main` owns `anyhow` and process exit
//! codes; everything else returns typed `Result`s.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};

use orc_domain::{config::ConfigSeverity, Config};
use orc_gateway::{init_tracing, load_config, InboundRequest, RequestEntryPoint};
use orc_kernel::SpecialistRegistry;

#[derive(Parser)]
#[command(name = "orc-gateway", about = "Multi-agent orchestration runtime gateway")]
struct Cli {
    /// Path to the TOML config file. Defaults to $ORC_CONFIG, then ./orchestrator.toml.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Run the entry point against stdin, one message per line.
    Serve,
    /// Inspect the resolved configuration.
    Config {
        #[command(subcommand)]
        action: ConfigCommand,
    },
    /// Print the gateway's version.
    Version,
}

#[derive(Subcommand)]
enum ConfigCommand {
    /// Print the fully resolved configuration as TOML.
    Show,
    /// Validate the resolved configuration and exit nonzero on errors.
    Validate,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let cli = Cli::parse();
    let config = load_config(cli.config.as_deref()).context("loading configuration")?;

    match cli.command {
        Command::Serve => run_serve(config).await,
        Command::Config { action } => run_config(&config, action),
        Command::Version => {
            println!("orc-gateway {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
    }
}

fn run_config(config: &Config, action: ConfigCommand) -> anyhow::Result<()> {
    match action {
        ConfigCommand::Show => {
            println!("{}", toml::to_string_pretty(config).context("serializing config")?);
            Ok(())
        }
        ConfigCommand::Validate => {
            let issues = config.validate();
            for issue in &issues {
                println!("{issue}");
            }
            let error_count = issues.iter().filter(|i| i.severity == ConfigSeverity::Error).count();
            if error_count > 0 {
                anyhow::bail!("configuration has {error_count} error(s)");
            }
            println!("configuration OK ({} warning(s))", issues.len() - error_count);
            Ok(())
        }
    }
}

async fn run_serve(config: Config) -> anyhow::Result<()> {
    let issues = config.validate();
    for issue in &issues {
        tracing::warn!(%issue, "config issue");
    }
    if issues.iter().any(|i| i.severity == ConfigSeverity::Error) {
        anyhow::bail!("refusing to start: configuration has errors, run `config validate` for details");
    }

    let entry_point = Arc::new(RequestEntryPoint::new(config, SpecialistRegistry::new()));
    tracing::info!("orchestration gateway ready, reading messages from stdin");

    let stdin = std::io::stdin();
    let mut line = String::new();
    loop {
        line.clear();
        let read = stdin.read_line(&mut line).context("reading stdin")?;
        if read == 0 {
            break;
        }
        let message = line.trim();
        if message.is_empty() {
            continue;
        }
        let envelope = entry_point.handle(InboundRequest::new(message)).await;
        println!("{}", serde_json::to_string_pretty(&envelope).context("serializing envelope")?);
    }

    entry_point.shutdown(Duration::from_secs(30)).await;
    Ok(())
}
