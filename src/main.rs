use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::{generate, Shell};
use std::io;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod core;
mod poller;
mod transport;

#[derive(Parser)]
#[command(name = "pollbridge")]
#[command(
    author,
    version,
    about = "Periodic resource-polling controller with cancellation-safe snapshots"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Poll a URL on a fixed interval and print each snapshot change
    Watch {
        /// URL to poll
        url: String,

        /// Polling interval in milliseconds (defaults to config, 2000)
        #[arg(long)]
        interval_ms: Option<u64>,

        /// Query parameter as name=value (repeatable)
        #[arg(long = "param")]
        params: Vec<String>,

        /// Exit after this many settled snapshots
        #[arg(long)]
        cycles: Option<u32>,
    },

    /// Fetch a URL once through the same transport
    Fetch {
        /// URL to fetch
        url: String,

        /// Query parameter as name=value (repeatable)
        #[arg(long = "param")]
        params: Vec<String>,

        /// Output as a single JSON line
        #[arg(long)]
        json: bool,
    },

    /// Generate shell completions
    Completions {
        /// Shell to generate completions for
        #[arg(value_enum)]
        shell: Shell,
    },
}

fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Watch {
            url,
            interval_ms,
            params,
            cycles,
        } => {
            init_logging();
            cli::watch::run(url, interval_ms, params, cycles).await
        }
        Commands::Fetch { url, params, json } => {
            init_logging();
            cli::fetch::run(url, params, json).await
        }
        Commands::Completions { shell } => {
            let mut cmd = Cli::command();
            let name = cmd.get_name().to_string();
            generate(shell, &mut cmd, name, &mut io::stdout());
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_fetch_accepts_json_flag() {
        let cli = Cli::try_parse_from(["pollbridge", "fetch", "http://localhost", "--json"])
            .unwrap();
        match cli.command {
            Commands::Fetch { json, .. } => assert!(json),
            _ => panic!("expected fetch subcommand"),
        }
    }
}
