//! Output formatting utilities for CLI.

use coderace::Cents;
use coderace::tournament::RaceStandings;
use serde::Serialize;

/// Aggregated statistics over a batch of simulated races, from the human
/// seat's perspective.
#[derive(Debug, Default)]
pub(super) struct SimulationStats {
    /// Total races simulated.
    pub(super) races_played: u64,
    /// Races the human seat won outright.
    pub(super) wins: u64,
    /// Races where the human seat finished in the paid band.
    pub(super) cashes: u64,
    /// Count of finishes per rank (index 0 is rank 1).
    rank_counts: Vec<u64>,
    /// Total prize money collected by the human seat.
    prize_total: Cents,
    /// Total buy-ins paid by the human seat.
    buy_in_total: Cents,
    /// Sum of the human seat's scores.
    score_total: u64,
    /// Sum of the human seat's attempt counts.
    attempts_total: u64,
}

impl SimulationStats {
    /// Create new stats for a field of `entrants`.
    pub(super) fn new(entrants: usize) -> Self {
        Self {
            rank_counts: vec![0; entrants],
            ..Self::default()
        }
    }

    /// Fold one finished race into the stats.
    pub(super) fn add_race(&mut self, standings: &RaceStandings, buy_in: Cents) {
        self.races_played += 1;
        self.buy_in_total += buy_in;

        let Some(human) = standings.human() else {
            return;
        };
        if human.won {
            self.wins += 1;
        }
        if human.prize > 0 {
            self.cashes += 1;
        }
        if let Some(count) = self
            .rank_counts
            .get_mut(usize::try_from(human.rank).unwrap_or(usize::MAX).saturating_sub(1))
        {
            *count += 1;
        }
        self.prize_total += human.prize;
        self.score_total += u64::from(human.score);
        self.attempts_total += u64::from(human.attempts_used);
    }

    /// Merge another thread's stats into this one.
    pub(super) fn merge(&mut self, other: &SimulationStats) {
        self.races_played += other.races_played;
        self.wins += other.wins;
        self.cashes += other.cashes;
        for (a, b) in self.rank_counts.iter_mut().zip(&other.rank_counts) {
            *a += b;
        }
        self.prize_total += other.prize_total;
        self.buy_in_total += other.buy_in_total;
        self.score_total += other.score_total;
        self.attempts_total += other.attempts_total;
    }

    /// Win rate of the human seat (0.0-1.0).
    pub(super) fn win_rate(&self) -> f64 {
        ratio(self.wins, self.races_played)
    }

    /// In-the-money rate of the human seat (0.0-1.0).
    pub(super) fn cash_rate(&self) -> f64 {
        ratio(self.cashes, self.races_played)
    }

    /// Average score per race.
    pub(super) fn avg_score(&self) -> f64 {
        ratio(self.score_total, self.races_played)
    }

    /// Average attempts per race.
    pub(super) fn avg_attempts(&self) -> f64 {
        ratio(self.attempts_total, self.races_played)
    }

    /// Net result in cents: prizes collected minus buy-ins paid.
    pub(super) fn net_cents(&self) -> i128 {
        i128::from(self.prize_total) - i128::from(self.buy_in_total)
    }

    /// Rank distribution as `(rank, count)` pairs, skipping empty ranks.
    pub(super) fn rank_distribution(&self) -> Vec<(u32, u64)> {
        self.rank_counts
            .iter()
            .enumerate()
            .filter(|&(_, &count)| count > 0)
            .map(|(i, &count)| (u32::try_from(i).unwrap_or(u32::MAX) + 1, count))
            .collect()
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

/// JSON-serializable batch simulation result.
#[derive(Debug, Serialize)]
pub(super) struct JsonSimulationResult {
    /// Total races simulated.
    races_played: u64,
    /// Human-seat wins.
    wins: u64,
    /// Human-seat win rate (0.0-1.0).
    win_rate: f64,
    /// Human-seat in-the-money rate (0.0-1.0).
    cash_rate: f64,
    /// Average score per race.
    avg_score: f64,
    /// Average attempts per race.
    avg_attempts: f64,
    /// Net cents over the batch (prizes minus buy-ins).
    net_cents: i128,
    /// Finishes per rank.
    ranks: Vec<JsonRankCount>,
}

/// One rank's finish count.
#[derive(Debug, Serialize)]
pub(super) struct JsonRankCount {
    /// Rank, 1-based.
    rank: u32,
    /// Number of finishes at this rank.
    count: u64,
}

impl JsonSimulationResult {
    /// Create from aggregated stats.
    pub(super) fn from_stats(stats: &SimulationStats) -> Self {
        Self {
            races_played: stats.races_played,
            wins: stats.wins,
            win_rate: stats.win_rate(),
            cash_rate: stats.cash_rate(),
            avg_score: stats.avg_score(),
            avg_attempts: stats.avg_attempts(),
            net_cents: stats.net_cents(),
            ranks: stats
                .rank_distribution()
                .into_iter()
                .map(|(rank, count)| JsonRankCount { rank, count })
                .collect(),
        }
    }
}

/// Format batch simulation stats as human-readable text.
pub(super) fn format_simulation_text(stats: &SimulationStats) -> String {
    let mut output = String::new();

    output.push_str(&format!(
        "Simulation Results ({} races)\n",
        stats.races_played
    ));
    output.push_str("========================================\n\n");

    output.push_str(&format!(
        "  Wins:     {} ({:.1}%)\n",
        stats.wins,
        stats.win_rate() * 100.0
    ));
    output.push_str(&format!(
        "  Cashes:   {} ({:.1}%)\n",
        stats.cashes,
        stats.cash_rate() * 100.0
    ));
    output.push_str(&format!("  Avg score:    {:.1}\n", stats.avg_score()));
    output.push_str(&format!("  Avg attempts: {:.1}\n", stats.avg_attempts()));
    let net_per_race = stats.net_cents() / i128::from(stats.races_played.max(1));
    output.push_str(&format!(
        "  Net: {:+.2} per race\n\n",
        cents_to_dollars(net_per_race)
    ));

    output.push_str("Rank distribution:\n");
    for (rank, count) in stats.rank_distribution() {
        output.push_str(&format!("  #{rank:<3} {count}\n"));
    }

    output
}

#[allow(clippy::cast_precision_loss)]
fn cents_to_dollars(cents: i128) -> f64 {
    cents as f64 / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use coderace::tournament::{RaceConfig, simulate_race};
    use coderace::bot::SkillTier;

    #[test]
    fn test_stats_fold_and_merge() {
        let config = RaceConfig::with_field(7, 1000, 100);
        let standings = simulate_race(&config, 3, SkillTier::Pro).unwrap();

        let mut a = SimulationStats::new(8);
        a.add_race(&standings, config.buy_in);
        let mut b = SimulationStats::new(8);
        b.add_race(&standings, config.buy_in);

        a.merge(&b);
        assert_eq!(a.races_played, 2);
        // Both races finished at the same rank: one entry with count 2,
        // zero-count ranks skipped.
        let distribution = a.rank_distribution();
        assert_eq!(distribution.len(), 1);
        assert_eq!(distribution[0].1, 2);
    }

    #[test]
    fn test_empty_stats_are_safe() {
        let stats = SimulationStats::new(8);
        assert!(stats.win_rate().abs() < f64::EPSILON);
        assert_eq!(stats.net_cents(), 0);
        assert!(stats.rank_distribution().is_empty());
    }
}
