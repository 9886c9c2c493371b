//! Race orchestration: one human, N synthetic opponents, one ruleset.
//!
//! The orchestrator owns the human's [`Round`], simulates every bot's game
//! independently (in parallel — each bot has a private secret, history, and
//! rng), computes final standings with deterministic tie-breaks, and maps
//! ranks onto the payout ladder. It never touches balances; standings are
//! handed to the settlement service, which is the only writer of persisted
//! balances.
//!
//! Ranking keys, in order: outcome (won before lost), fewer attempts
//! (among winners only), higher score, more time remaining. Ties surviving
//! all four keys fall back to stable entry order — nondeterministic
//! tie-breaking would affect payouts, so it is treated as a defect.

mod payout;

pub use payout::{PayoutBand, describe_ladder, paid_positions, pool_size, prize_for_rank};

use rand::SeedableRng;
use rand::rngs::SmallRng;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bot::{BotPlayer, SkillTier, simulate_game};
use crate::round::{RaceRules, Round, RoundOutcome};
use crate::{Cents, PlayerId};

/// Player id reserved for the human entrant.
pub const HUMAN_PLAYER_ID: PlayerId = 0;

/// Configuration for a single race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceConfig {
    /// Rules shared by the human and every bot.
    pub rules: RaceRules,
    /// Buy-in per entrant, in cents.
    pub buy_in: Cents,
    /// House rake per entrant, in cents.
    pub rake: Cents,
    /// Skill tier of each synthetic opponent; one bot per entry.
    pub bot_tiers: Vec<SkillTier>,
}

impl RaceConfig {
    /// Config with `bot_count` bots, tiers assigned cyclically across the
    /// ladder so a default field is mixed-skill.
    #[must_use]
    pub fn with_field(bot_count: usize, buy_in: Cents, rake: Cents) -> Self {
        let bot_tiers = (0..bot_count)
            .map(|i| SkillTier::ALL[i % SkillTier::ALL.len()])
            .collect();
        Self {
            rules: RaceRules::default(),
            buy_in,
            rake,
            bot_tiers,
        }
    }

    /// Total entrants: the human plus every bot.
    #[must_use]
    pub fn entrants(&self) -> u32 {
        u32::try_from(self.bot_tiers.len() + 1).unwrap_or(u32::MAX)
    }

    /// Prize pool after the per-entrant rake carve-out.
    #[must_use]
    pub fn pool(&self) -> Cents {
        pool_size(self.buy_in, self.rake, self.entrants())
    }
}

/// Error type for race orchestration.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TournamentError {
    /// A race needs at least one synthetic opponent.
    NoBots,
    /// Standings requested while the human's round is still in progress.
    RoundInProgress,
}

impl std::fmt::Display for TournamentError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TournamentError::NoBots => write!(f, "race requires at least one bot"),
            TournamentError::RoundInProgress => {
                write!(f, "human round has not reached a terminal state")
            }
        }
    }
}

impl std::error::Error for TournamentError {}

/// Final standing for one entrant. `rank` is assigned only after all
/// participants finish.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentResult {
    /// Entrant id (`HUMAN_PLAYER_ID` for the human).
    pub player_id: PlayerId,
    /// Display name.
    pub display_name: String,
    /// Whether the entrant cracked their secret.
    pub won: bool,
    /// Guesses used.
    pub attempts_used: u32,
    /// Accrued score.
    pub score: u32,
    /// Seconds remaining when the entrant's round ended.
    pub time_remaining_secs: u32,
    /// Final rank, 1-based.
    pub rank: u32,
    /// Prize awarded by the ladder (zero outside the paid band).
    pub prize: Cents,
}

/// Complete standings for a finished race.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceStandings {
    /// Results ordered by rank.
    pub results: Vec<TournamentResult>,
    /// Pool the ladder was scaled to.
    pub pool: Cents,
}

impl RaceStandings {
    /// The human's result row.
    #[must_use]
    pub fn human(&self) -> Option<&TournamentResult> {
        self.results
            .iter()
            .find(|r| r.player_id == HUMAN_PLAYER_ID)
    }

    /// Sum of prizes awarded to synthetic entrants; returned to the
    /// bot-funding pool at settlement.
    #[must_use]
    pub fn bot_prizes_total(&self) -> Cents {
        self.results
            .iter()
            .filter(|r| r.player_id != HUMAN_PLAYER_ID)
            .map(|r| r.prize)
            .sum()
    }

    /// Sum of every prize awarded.
    #[must_use]
    pub fn total_prizes(&self) -> Cents {
        self.results.iter().map(|r| r.prize).sum()
    }
}

/// One race in progress: the human's live round plus the bot roster.
#[derive(Debug, Clone)]
pub struct Race {
    config: RaceConfig,
    seed: u64,
    round: Round,
    bots: Vec<BotPlayer>,
}

impl Race {
    /// Start a race: creates the human's round (with its immutable secret)
    /// and the bot roster.
    ///
    /// # Errors
    ///
    /// Returns `TournamentError::NoBots` for an empty bot field.
    pub fn new(config: RaceConfig, seed: u64) -> Result<Self, TournamentError> {
        if config.bot_tiers.is_empty() {
            return Err(TournamentError::NoBots);
        }

        let mut rng = entrant_rng(seed, HUMAN_PLAYER_ID);
        let round = Round::new(config.rules, &mut rng);
        let bots = config
            .bot_tiers
            .iter()
            .enumerate()
            .map(|(i, &tier)| BotPlayer::new(u32::try_from(i + 1).unwrap_or(u32::MAX), tier))
            .collect();

        Ok(Self {
            config,
            seed,
            round,
            bots,
        })
    }

    /// The human's round, for reading history and status.
    #[must_use]
    pub fn round(&self) -> &Round {
        &self.round
    }

    /// Mutable access to the human's round for guess submission. The
    /// secret itself has no setter; only starting a new race replaces it.
    pub fn round_mut(&mut self) -> &mut Round {
        &mut self.round
    }

    /// The synthetic roster.
    #[must_use]
    pub fn bots(&self) -> &[BotPlayer] {
        &self.bots
    }

    /// Finish the race: simulate every bot, rank all entrants, and map
    /// ranks to prizes.
    ///
    /// Bot simulations are fully independent (private secret, history, and
    /// rng each), so they run in parallel without shared mutable state.
    ///
    /// # Errors
    ///
    /// Returns `TournamentError::RoundInProgress` if the human's round has
    /// not terminated.
    pub fn finish(self) -> Result<RaceStandings, TournamentError> {
        let human_outcome = self
            .round
            .outcome()
            .ok_or(TournamentError::RoundInProgress)?;

        let rules = self.config.rules;
        let seed = self.seed;
        let bot_outcomes: Vec<(BotPlayer, RoundOutcome)> = self
            .bots
            .into_par_iter()
            .map(|bot| {
                let mut rng = entrant_rng(seed, bot.id);
                let outcome = simulate_game(bot.tier, rules, &mut rng);
                (bot, outcome)
            })
            .collect();

        let mut entries = Vec::with_capacity(bot_outcomes.len() + 1);
        entries.push((HUMAN_PLAYER_ID, "you".to_owned(), human_outcome));
        for (bot, outcome) in bot_outcomes {
            entries.push((bot.id, bot.display_name, outcome));
        }

        Ok(standings(entries, self.config.pool()))
    }
}

/// Simulate an entire race offline, with the human played by a bot of the
/// given tier. Used by batch simulation and tier calibration.
///
/// # Errors
///
/// Returns `TournamentError::NoBots` for an empty bot field.
pub fn simulate_race(
    config: &RaceConfig,
    seed: u64,
    human_tier: SkillTier,
) -> Result<RaceStandings, TournamentError> {
    if config.bot_tiers.is_empty() {
        return Err(TournamentError::NoBots);
    }

    let mut entries = Vec::with_capacity(config.bot_tiers.len() + 1);
    let mut rng = entrant_rng(seed, HUMAN_PLAYER_ID);
    entries.push((
        HUMAN_PLAYER_ID,
        "you".to_owned(),
        simulate_game(human_tier, config.rules, &mut rng),
    ));

    for (i, &tier) in config.bot_tiers.iter().enumerate() {
        let bot = BotPlayer::new(u32::try_from(i + 1).unwrap_or(u32::MAX), tier);
        let mut rng = entrant_rng(seed, bot.id);
        let outcome = simulate_game(tier, config.rules, &mut rng);
        entries.push((bot.id, bot.display_name, outcome));
    }

    Ok(standings(entries, config.pool()))
}

/// Per-entrant rng, mixed from the race seed and the entrant id.
fn entrant_rng(seed: u64, id: PlayerId) -> SmallRng {
    let mut x = seed ^ (u64::from(id).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    x ^= x >> 33;
    x = x.wrapping_mul(0xff51_afd7_ed55_8ccd);
    x ^= x >> 33;
    SmallRng::seed_from_u64(x)
}

/// Rank all entrants and attach ladder prizes.
///
/// `Vec::sort_by` is stable, so entrants tied on every key keep their
/// entry order — the deterministic final tie-break.
fn standings(entries: Vec<(PlayerId, String, RoundOutcome)>, pool: Cents) -> RaceStandings {
    let entrants = u32::try_from(entries.len()).unwrap_or(u32::MAX);

    let mut ordered: Vec<(PlayerId, String, RoundOutcome)> = entries;
    ordered.sort_by(|a, b| compare_outcomes(&a.2, &b.2));

    let results = ordered
        .into_iter()
        .enumerate()
        .map(|(i, (player_id, display_name, outcome))| {
            let rank = u32::try_from(i + 1).unwrap_or(u32::MAX);
            TournamentResult {
                player_id,
                display_name,
                won: outcome.won,
                attempts_used: outcome.attempts_used,
                score: outcome.score,
                time_remaining_secs: outcome.time_remaining_secs,
                rank,
                prize: prize_for_rank(rank, entrants, pool),
            }
        })
        .collect();

    RaceStandings { results, pool }
}

/// Four-key ranking comparator. Attempts only separate winners; among
/// losers a low attempt count usually means a timeout, not skill.
fn compare_outcomes(a: &RoundOutcome, b: &RoundOutcome) -> std::cmp::Ordering {
    b.won
        .cmp(&a.won)
        .then_with(|| {
            if a.won && b.won {
                a.attempts_used.cmp(&b.attempts_used)
            } else {
                std::cmp::Ordering::Equal
            }
        })
        .then_with(|| b.score.cmp(&a.score))
        .then_with(|| b.time_remaining_secs.cmp(&a.time_remaining_secs))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::Code;
    use crate::round::SubmitOutcome;

    fn outcome(won: bool, attempts: u32, score: u32, time: u32) -> RoundOutcome {
        RoundOutcome {
            won,
            attempts_used: attempts,
            score,
            time_remaining_secs: time,
        }
    }

    fn named(entries: Vec<RoundOutcome>) -> Vec<(PlayerId, String, RoundOutcome)> {
        entries
            .into_iter()
            .enumerate()
            .map(|(i, o)| (i as PlayerId, format!("p{i}"), o))
            .collect()
    }

    #[test]
    fn test_winners_rank_above_losers() {
        let ranked = standings(
            named(vec![
                outcome(false, 3, 900, 250),
                outcome(true, 10, 500, 5),
            ]),
            0,
        );
        assert!(ranked.results[0].won);
        assert_eq!(ranked.results[0].rank, 1);
        assert_eq!(ranked.results[1].rank, 2);
    }

    #[test]
    fn test_fewer_attempts_break_winner_ties() {
        let ranked = standings(
            named(vec![
                outcome(true, 7, 900, 100),
                outcome(true, 4, 700, 100),
            ]),
            0,
        );
        assert_eq!(ranked.results[0].attempts_used, 4);
    }

    #[test]
    fn test_attempts_do_not_separate_losers() {
        // The loser with fewer attempts timed out; score decides instead.
        let ranked = standings(
            named(vec![
                outcome(false, 2, 100, 0),
                outcome(false, 10, 400, 0),
            ]),
            0,
        );
        assert_eq!(ranked.results[0].score, 400);
    }

    #[test]
    fn test_score_then_time_break_ties() {
        let ranked = standings(
            named(vec![
                outcome(true, 5, 800, 40),
                outcome(true, 5, 800, 90),
                outcome(true, 5, 900, 10),
            ]),
            0,
        );
        assert_eq!(ranked.results[0].score, 900);
        assert_eq!(ranked.results[1].time_remaining_secs, 90);
        assert_eq!(ranked.results[2].time_remaining_secs, 40);
    }

    #[test]
    fn test_full_ties_keep_entry_order() {
        let tied = outcome(true, 5, 800, 40);
        let ranked = standings(named(vec![tied, tied, tied]), 0);
        assert_eq!(ranked.results[0].player_id, 0);
        assert_eq!(ranked.results[1].player_id, 1);
        assert_eq!(ranked.results[2].player_id, 2);
    }

    #[test]
    fn test_ranking_is_deterministic() {
        let entries = vec![
            outcome(true, 6, 810, 33),
            outcome(false, 10, 420, 0),
            outcome(true, 6, 810, 33),
            outcome(true, 3, 1100, 180),
        ];
        let a = standings(named(entries.clone()), 5000);
        let b = standings(named(entries), 5000);
        assert_eq!(a, b);
    }

    #[test]
    fn test_race_requires_bots() {
        let config = RaceConfig {
            bot_tiers: Vec::new(),
            ..RaceConfig::with_field(0, 1000, 100)
        };
        assert_eq!(Race::new(config, 1).unwrap_err(), TournamentError::NoBots);
    }

    #[test]
    fn test_finish_requires_terminal_round() {
        let config = RaceConfig::with_field(3, 1000, 100);
        let race = Race::new(config, 42).unwrap();
        assert_eq!(
            race.finish().unwrap_err(),
            TournamentError::RoundInProgress
        );
    }

    #[test]
    fn test_race_end_to_end() {
        let config = RaceConfig::with_field(7, 1000, 100);
        let pool = config.pool();
        let mut race = Race::new(config, 42).unwrap();

        // Human plays badly and runs out of attempts.
        let guess = Code::new([0, 0, 0, 0]).unwrap();
        while !race.round().status().is_terminal() {
            let submitted = race.round_mut().submit(guess, 5).unwrap();
            assert!(matches!(
                submitted,
                SubmitOutcome::Scored(_) | SubmitOutcome::TimedOut
            ));
        }

        let standings = race.finish().unwrap();
        assert_eq!(standings.results.len(), 8);
        assert_eq!(standings.pool, pool);
        assert!(standings.total_prizes() <= pool);
        assert!(standings.human().is_some());

        // Ranks are 1..=8 in order.
        for (i, result) in standings.results.iter().enumerate() {
            assert_eq!(result.rank as usize, i + 1);
        }
    }

    #[test]
    fn test_simulated_race_is_deterministic() {
        let config = RaceConfig::with_field(5, 1000, 100);
        let a = simulate_race(&config, 7, SkillTier::Pro).unwrap();
        let b = simulate_race(&config, 7, SkillTier::Pro).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn test_bot_outcomes_differ_per_entrant() {
        let config = RaceConfig {
            bot_tiers: vec![SkillTier::Pro; 4],
            ..RaceConfig::with_field(4, 1000, 100)
        };
        let standings = simulate_race(&config, 11, SkillTier::Pro).unwrap();

        // Same tier everywhere, but private rngs: outcomes should not all
        // be identical.
        let first = &standings.results[0];
        assert!(
            standings
                .results
                .iter()
                .any(|r| r.score != first.score || r.attempts_used != first.attempts_used),
            "all entrants produced identical outcomes"
        );
    }
}
