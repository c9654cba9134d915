//! HyperCore Simulator CLI
//!
//! Runs a seeded workload against an in-memory ledger and prints a report.

use anyhow::Context;
use clap::{Parser, Subcommand};
use hypercore_simulator::{AccountDistribution, Simulator, SimulatorConfig};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "hypercore-sim")]
#[command(about = "Workload simulator for the HyperCore ledger")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the default configuration as TOML
    Config,

    /// Run a simulation
    Run {
        /// TOML configuration file; flags below override it
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Random seed
        #[arg(long)]
        seed: Option<u64>,

        /// Number of funded accounts
        #[arg(long)]
        accounts: Option<usize>,

        /// Simulated time to run (e.g., "30m", "2h", "7days")
        #[arg(short, long, default_value = "1h")]
        duration: humantime::Duration,

        /// Simulated time between blocks (e.g., "2s")
        #[arg(long)]
        tick: Option<humantime::Duration>,

        /// Actions submitted per block
        #[arg(long)]
        batch_size: Option<usize>,

        /// Account selection mode (random, round-robin, zipf, zipf:<exponent>)
        #[arg(long)]
        selection: Option<String>,

        /// Print the report as JSON
        #[arg(long)]
        json: bool,
    },
}

fn parse_selection_mode(s: &str) -> Result<AccountDistribution, String> {
    match s.to_lowercase().as_str() {
        "random" => Ok(AccountDistribution::Random),
        "round-robin" | "roundrobin" => Ok(AccountDistribution::RoundRobin),
        "zipf" => Ok(AccountDistribution::Zipf { exponent: 1 }),
        s if s.starts_with("zipf:") => {
            let exponent: u32 = s[5..]
                .parse()
                .map_err(|_| format!("Invalid zipf exponent: {}", &s[5..]))?;
            Ok(AccountDistribution::Zipf { exponent })
        }
        _ => Err(format!("Unknown selection mode: {}", s)),
    }
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Config => {
            // No tracing here - output goes to stdout
            print!("{}", toml::to_string_pretty(&SimulatorConfig::default())?);
        }

        Commands::Run {
            config,
            seed,
            accounts,
            duration,
            tick,
            batch_size,
            selection,
            json,
        } => {
            let filter =
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();

            let mut config = match config {
                Some(path) => SimulatorConfig::load(&path)
                    .with_context(|| format!("loading {}", path.display()))?,
                None => SimulatorConfig::default(),
            };
            if let Some(seed) = seed {
                config = config.with_seed(seed);
            }
            if let Some(accounts) = accounts {
                config = config.with_accounts(accounts);
            }
            if let Some(tick) = tick {
                config = config.with_tick_interval(*tick);
            }
            if let Some(batch_size) = batch_size {
                config.workload = config.workload.with_batch_size(batch_size);
            }
            if let Some(selection) = selection {
                let distribution =
                    parse_selection_mode(&selection).map_err(anyhow::Error::msg)?;
                config.workload = config.workload.with_account_distribution(distribution);
            }
            if config.tick_interval.is_zero() {
                anyhow::bail!("tick interval must be positive");
            }

            let mut simulator = Simulator::new(config)?;
            let report = simulator.run_for(*duration);

            if json {
                println!("{}", serde_json::to_string_pretty(&report)?);
            } else {
                report.print();
            }
        }
    }

    Ok(())
}
