//! Tandem network CLI
//!
//! Simulate a single run or estimate steady-state metrics over many replications.
//!
//! # Example
//!
//! ```bash
//! # One run of the classic three-station line, summarised as JSON
//! cargo run --example tandem -- run --seed 1
//!
//! # Replicate a study file in parallel until the system time converges
//! cargo run --example tandem -- estimate --config study.toml --parallel
//! ```

use anyhow::Context;
use clap::{Parser, Subcommand};
use tandem::config::{Horizon, NetworkConfig, ReplicationConfig, StudyConfig};
use tandem::metrics::summarize;
use tandem::model::{simulate, ExponentialVariates};
use tandem::replication::estimate;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "tandem")]
#[command(version, about, long_about = None)]
struct Args {
    /// TOML study file. Overrides the network flags below.
    #[arg(short, long, global = true)]
    config: Option<std::path::PathBuf>,

    /// Log every dispatched event
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Rate of external arrivals into station 0
    #[arg(long, global = true, default_value_t = 1.0 / 7.0)]
    arrival_rate: f64,

    /// Service rate of each station, in visiting order
    #[arg(long, global = true, value_delimiter = ',', default_value = "0.25,0.5,1.0")]
    service_rates: Vec<f64>,

    /// Feedback probability after each station
    #[arg(long, global = true, value_delimiter = ',')]
    feedback: Vec<f64>,

    /// Stop admitting arrivals at this time
    #[arg(long, global = true, default_value_t = 5000.0)]
    horizon: f64,

    /// Random seed for reproducible results. When omitted, a random seed is used.
    #[arg(long, global = true)]
    seed: Option<u64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Simulate one run and print its summary
    Run {
        /// Keep serving admitted clients past the horizon
        #[arg(long)]
        drain: bool,

        /// Print the full timestamp trace instead of the summary
        #[arg(long)]
        trace: bool,
    },
    /// Replicate drained runs until the system time estimate converges
    Estimate {
        #[arg(long, default_value_t = 10)]
        min: usize,

        #[arg(long, default_value_t = 1000)]
        max: usize,

        #[arg(long, default_value_t = 0.01)]
        threshold: f64,

        /// Run replications on all cores
        #[arg(long)]
        parallel: bool,
    },
}

fn study(args: &Args) -> anyhow::Result<StudyConfig> {
    if let Some(path) = &args.config {
        return StudyConfig::load(path).with_context(|| format!("loading {}", path.display()));
    }

    let network = NetworkConfig::new(args.arrival_rate, args.service_rates.clone())
        .with_feedback(args.feedback.clone())
        .with_horizon(Horizon::Until(args.horizon));
    let mut replication = ReplicationConfig::default();
    replication.seed = args.seed;
    Ok(StudyConfig { network, replication })
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_filter = if args.verbose { "tandem=trace" } else { "warn,tandem=info" };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)))
        .init();

    let StudyConfig { network, replication } = study(&args)?;
    let seed = args.seed.or(replication.seed).unwrap_or_else(rand::random);

    match args.command {
        Command::Run { drain, trace } => {
            let network = if drain { network.draining(true) } else { network };
            info!(stations = network.stations(), seed, "simulating one run");

            let variates = ExponentialVariates::seeded(&network, seed)?;
            let outcome = simulate(&network, variates)?;
            if trace {
                println!("{}", serde_json::to_string_pretty(&outcome)?);
            } else {
                let summary = summarize(&outcome);
                println!(
                    "final time {:.3}, {} arrivals, {} departures",
                    outcome.final_time, outcome.arrivals, outcome.departures
                );
                println!("{}", serde_json::to_string_pretty(&summary.stations)?);
                println!("mean system time: {:?}", summary.mean_system_time());
            }
        }
        Command::Estimate {
            min,
            max,
            threshold,
            parallel,
        } => {
            let replication = if args.config.is_some() {
                replication
            } else {
                replication.with_bounds(min, max).with_threshold(threshold)
            };
            let parallel = parallel || replication.parallel;
            let replication = replication.with_seed(seed).parallel(parallel);

            let report = estimate(network, replication)?;
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
    }
    Ok(())
}
