//! Batch simulation command implementation.

use super::output::{JsonSimulationResult, SimulationStats, format_simulation_text};
use super::{CliError, OutputFormat, TierArg};
use coderace::Cents;
use coderace::tournament::{RaceConfig, simulate_race};
use indicatif::{ProgressBar, ProgressStyle};
use rayon::prelude::*;
use std::time::Instant;

/// Execute the simulate command.
///
/// # Errors
///
/// Returns an error if the race configuration is invalid.
#[allow(clippy::too_many_arguments)]
pub(crate) fn execute(
    races: u64,
    bots: usize,
    buy_in: Cents,
    rake: Cents,
    tier: TierArg,
    seed: Option<u64>,
    threads: Option<usize>,
    format: OutputFormat,
    progress: bool,
) -> Result<(), CliError> {
    if rake > buy_in {
        return Err(CliError::new(format!(
            "rake {rake} exceeds buy-in {buy_in}"
        )));
    }

    let config = RaceConfig::with_field(bots, buy_in, rake);
    let entrants = usize::try_from(config.entrants()).unwrap_or(usize::MAX);

    // Set thread pool size if specified
    if let Some(num_threads) = threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(num_threads)
            .build_global()
            .ok(); // Ignore error if already initialized
    }

    let base_seed = seed.unwrap_or_else(default_seed);

    // Progress bar
    let pb = if progress {
        let pb = ProgressBar::new(races);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} races ({per_sec})")
                .map_err(|e| CliError::new(format!("invalid progress template: {e}")))?
                .progress_chars("=>-"),
        );
        Some(pb)
    } else {
        None
    };

    let start = Instant::now();

    // Each thread folds into its own stats; merged at the end so the hot
    // path has no shared mutable state.
    let stats = (0..races)
        .into_par_iter()
        .fold(
            || SimulationStats::new(entrants),
            |mut local_stats, i| {
                let race_seed = base_seed.wrapping_add(i);
                if let Ok(standings) = simulate_race(&config, race_seed, tier.into()) {
                    local_stats.add_race(&standings, config.buy_in);
                }
                local_stats
            },
        )
        .reduce(
            || SimulationStats::new(entrants),
            |mut a, b| {
                a.merge(&b);
                a
            },
        );

    if let Some(pb) = pb {
        pb.set_position(stats.races_played);
        pb.finish_with_message("done");
    }

    let duration = start.elapsed();

    match format {
        OutputFormat::Text => {
            println!();
            print!("{}", format_simulation_text(&stats));
            println!();
            println!("Duration: {:.2}s", duration.as_secs_f64());
        }
        OutputFormat::Json => {
            let json_result = JsonSimulationResult::from_stats(&stats);
            let json = serde_json::to_string_pretty(&json_result)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Nanosecond clock seed when none is supplied.
pub(super) fn default_seed() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| u64::try_from(d.as_nanos() & u128::from(u64::MAX)).unwrap_or(42))
        .unwrap_or(42)
}
