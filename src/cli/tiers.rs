//! Tier calibration command implementation.

use super::{CliError, OutputFormat};
use coderace::bot::{SkillTier, simulate_game};
use coderace::round::RaceRules;
use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use serde::Serialize;

/// Empirical performance of one tier over a batch of solo games.
#[derive(Debug, Serialize)]
struct TierReport {
    /// Tier name.
    tier: String,
    /// Numeric rating.
    rating: u32,
    /// Configured per-turn error rate.
    error_rate: f64,
    /// Games simulated.
    games: u64,
    /// Empirical win rate (0.0-1.0).
    win_rate: f64,
    /// Average attempts among winning games.
    avg_winning_attempts: f64,
    /// Fraction of games lost to the clock (0.0-1.0).
    timeout_rate: f64,
}

/// Execute the tiers command: simulate each tier in isolation and report
/// empirical win rates next to the configured parameters.
///
/// # Errors
///
/// Returns an error if JSON serialization fails.
pub(crate) fn execute(
    games: u64,
    seed: Option<u64>,
    format: OutputFormat,
) -> Result<(), CliError> {
    let base_seed = seed.unwrap_or_else(super::simulate::default_seed);
    let rules = RaceRules::default();

    let reports: Vec<TierReport> = SkillTier::ALL
        .iter()
        .map(|&tier| calibrate(tier, rules, games, base_seed))
        .collect();

    match format {
        OutputFormat::Text => {
            println!("Tier calibration ({games} games per tier)");
            println!("--------------------------------------------------------");
            println!(
                "{:<14} {:>7} {:>10} {:>10} {:>12} {:>9}",
                "tier", "rating", "err rate", "win rate", "avg win att", "timeouts"
            );
            for r in &reports {
                println!(
                    "{:<14} {:>7} {:>9.0}% {:>9.1}% {:>12.2} {:>8.1}%",
                    r.tier,
                    r.rating,
                    r.error_rate * 100.0,
                    r.win_rate * 100.0,
                    r.avg_winning_attempts,
                    r.timeout_rate * 100.0
                );
            }
        }
        OutputFormat::Json => {
            let json = serde_json::to_string_pretty(&reports)
                .map_err(|e| CliError::new(format!("JSON serialization failed: {e}")))?;
            println!("{json}");
        }
    }

    Ok(())
}

/// Simulate `games` solo games for a tier and aggregate the outcomes.
fn calibrate(tier: SkillTier, rules: RaceRules, games: u64, base_seed: u64) -> TierReport {
    let (wins, winning_attempts, timeouts) = (0..games)
        .into_par_iter()
        .map(|i| {
            let mut rng = SmallRng::seed_from_u64(base_seed.wrapping_add(i));
            let outcome = simulate_game(tier, rules, &mut rng);
            let timed_out =
                !outcome.won && outcome.attempts_used < rules.attempt_cap;
            (
                u64::from(outcome.won),
                if outcome.won {
                    u64::from(outcome.attempts_used)
                } else {
                    0
                },
                u64::from(timed_out),
            )
        })
        .reduce(|| (0, 0, 0), |a, b| (a.0 + b.0, a.1 + b.1, a.2 + b.2));

    TierReport {
        tier: tier.to_string(),
        rating: tier.rating(),
        error_rate: tier.error_rate(),
        games,
        win_rate: ratio(wins, games),
        avg_winning_attempts: ratio(winning_attempts, wins),
        timeout_rate: ratio(timeouts, games),
    }
}

#[allow(clippy::cast_precision_loss)]
fn ratio(numerator: u64, denominator: u64) -> f64 {
    if denominator == 0 {
        0.0
    } else {
        numerator as f64 / denominator as f64
    }
}
