//! `routegate` command line
//!
//! Loads a TOML route table and drives simulated navigations through the
//! gate and prefetch scheduler.

mod commands;
mod loader;
mod logging;

use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

#[derive(Debug, Parser)]
#[command(name = "routegate", version, about = "Route gating and idle-time prefetch simulator")]
struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    log_json: bool,

    /// Latency of every simulated route load, in milliseconds
    #[arg(long, global = true, default_value_t = 50)]
    load_delay_ms: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Print the flattened route table
    Routes {
        /// Route table file
        #[arg(long)]
        config: PathBuf,
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate a route table strictly
    Check {
        /// Route table file
        #[arg(long)]
        config: PathBuf,
    },
    /// Navigate once and wait for the prefetches it schedules
    Simulate {
        /// Route table file
        #[arg(long)]
        config: PathBuf,
        /// Navigation target
        #[arg(long)]
        path: String,
        /// Start with a signed-in user
        #[arg(long)]
        authenticated: bool,
        /// Make loads of this path fail (repeatable)
        #[arg(long = "fail", value_name = "PATH")]
        fail: Vec<String>,
    },
    /// Prefetch every registered route
    Warm {
        /// Route table file
        #[arg(long)]
        config: PathBuf,
        /// Load right away instead of waiting for idle
        #[arg(long)]
        immediate: bool,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    logging::init(cli.log_json);

    let load_delay = Duration::from_millis(cli.load_delay_ms);
    let result = match cli.command {
        Command::Routes { config, json } => commands::routes(&config, json),
        Command::Check { config } => commands::check(&config),
        Command::Simulate {
            config,
            path,
            authenticated,
            fail,
        } => commands::simulate(&config, &path, authenticated, &fail, load_delay).await,
        Command::Warm { config, immediate } => commands::warm(&config, immediate, load_delay).await,
    };

    match result {
        Ok(true) => ExitCode::SUCCESS,
        Ok(false) => ExitCode::FAILURE,
        Err(error) => {
            eprintln!("error: {error:#}");
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn simulate_collects_repeated_failures() {
        let cli = Cli::parse_from([
            "routegate",
            "simulate",
            "--config",
            "routes.toml",
            "--path",
            "/",
            "--fail",
            "/a",
            "--fail",
            "/b",
            "--log-json",
        ]);
        assert!(cli.log_json);
        let Command::Simulate { fail, authenticated, .. } = cli.command else {
            panic!("expected simulate");
        };
        assert_eq!(fail, vec!["/a".to_string(), "/b".to_string()]);
        assert!(!authenticated);
    }
}
