mod generator;
mod logger;
mod rng;
mod sim;
mod stats;
mod sweep;

use anyhow::Result;
use clap::{Parser, Subcommand};
use hartirq_io::BoardConfig;

#[derive(Parser)]
struct Cli {
    /// Log verbosity; repeat for more detail.
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replays a scenario script on the simulated board.
    Simulate {
        #[arg(short, long)]
        script: String,
    },
    /// Checks the tick catch-up arithmetic over random timer states.
    Sweep {
        #[arg(short = 'n', long, default_value_t = 1_000_000)]
        samples: usize,
        #[arg(long, default_value_t = 64)]
        max_lag: u64,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    },
    /// Writes a randomized stress script.
    Gen {
        #[arg(short, long, default_value = "stress.script")]
        out: String,
        #[arg(long, default_value_t = 8)]
        sources: usize,
        #[arg(long, default_value_t = 10_000)]
        events: usize,
        #[arg(long, default_value_t = 0.05)]
        mask_rate: f64,
        #[arg(long, default_value_t = 32)]
        max_mask_periods: u64,
        #[arg(long, default_value_t = 12345)]
        seed: u64,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    logger::init(cli.verbose);

    match cli.command {
        Commands::Simulate { script } => {
            let script = hartirq_io::load_script(&script)?;
            log::info!(
                "{} setup statements, {} events",
                script.setup.len(),
                script.events.len()
            );
            sim::run(&script)?.print();
        }
        Commands::Sweep {
            samples,
            max_lag,
            seed,
        } => {
            sweep::run_sweep(samples, max_lag, seed)?;
        }
        Commands::Gen {
            out,
            sources,
            events,
            mask_rate,
            max_mask_periods,
            seed,
        } => {
            let params = generator::StressParams {
                board: BoardConfig::default(),
                sources,
                events,
                mask_rate,
                max_mask_periods,
                seed,
            };
            generator::generate_stress_script(&out, &params)?;
        }
    }
    Ok(())
}
