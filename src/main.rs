//! Coderace CLI - Command-line interface for simulating races and
//! inspecting the payout ladder.

// Allow print in the CLI binary
#![allow(clippy::print_stdout, clippy::print_stderr)]

mod cli;

use clap::{Parser, Subcommand};
use std::process::ExitCode;

/// Coderace - a deterministic code-breaking race engine
#[derive(Parser, Debug)]
#[command(name = "coderace")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
enum Commands {
    /// Run mass parallel race simulations and aggregate statistics
    Simulate {
        /// Number of races to simulate (default: 1000)
        #[arg(short, long, default_value = "1000")]
        races: u64,

        /// Synthetic opponents per race (default: 7)
        #[arg(short, long, default_value = "7")]
        bots: usize,

        /// Buy-in per entrant, in cents (default: 1000)
        #[arg(long, default_value = "1000")]
        buy_in: u64,

        /// Rake per entrant, in cents (default: 100)
        #[arg(long, default_value = "100")]
        rake: u64,

        /// Skill tier played in the human seat
        #[arg(short, long, default_value = "pro")]
        tier: cli::TierArg,

        /// Starting seed (increments for each race)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Parallel threads (default: CPU count)
        #[arg(short = 'j', long)]
        threads: Option<usize>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,

        /// Show progress bar
        #[arg(short, long)]
        progress: bool,
    },

    /// Print the payout ladder for a field
    Ladder {
        /// Field size including the human entrant
        #[arg(short, long, default_value = "8")]
        entrants: u32,

        /// Buy-in per entrant, in cents (default: 1000)
        #[arg(long, default_value = "1000")]
        buy_in: u64,

        /// Rake per entrant, in cents (default: 100)
        #[arg(long, default_value = "100")]
        rake: u64,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },

    /// Report empirical win rates for each bot skill tier
    Tiers {
        /// Games to simulate per tier (default: 500)
        #[arg(short, long, default_value = "500")]
        games: u64,

        /// Starting seed (increments for each game)
        #[arg(short, long)]
        seed: Option<u64>,

        /// Output format: text or json
        #[arg(short, long, default_value = "text")]
        format: cli::OutputFormat,
    },
}

fn main() -> ExitCode {
    let args = Args::parse();

    let result = match args.command {
        Commands::Simulate {
            races,
            bots,
            buy_in,
            rake,
            tier,
            seed,
            threads,
            format,
            progress,
        } => cli::simulate::execute(
            races, bots, buy_in, rake, tier, seed, threads, format, progress,
        ),

        Commands::Ladder {
            entrants,
            buy_in,
            rake,
            format,
        } => cli::ladder::execute(entrants, buy_in, rake, format),

        Commands::Tiers {
            games,
            seed,
            format,
        } => cli::tiers::execute(games, seed, format),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
