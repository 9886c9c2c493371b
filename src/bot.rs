//! Synthetic opponents: skill tiers, guess planning, and full-game simulation.
//!
//! A bot's skill tier fixes two things: its per-turn error probability and
//! the sophistication of the deduction it applies when not erring. Full-game
//! simulation runs a private [`Round`] to completion, charging simulated
//! think time against the round's clock — a bot can time out without
//! exhausting its attempts.

mod strategy;

pub use strategy::{GuessPlan, SlotDecision, available_symbols, plan_guess};

use rand::Rng;
use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::PlayerId;
use crate::code::Code;
use crate::round::{RaceRules, Round, RoundOutcome};

/// Skill tiers, ordered by rating.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum SkillTier {
    /// Rating 80: elimination only, no positional memory.
    Rookie,
    /// Rating 90: keeps prior exacts in place, relocates presents.
    Amateur,
    /// Rating 100: additionally locks probable confirmed positions.
    Pro,
    /// Rating 110: same deduction as Pro with a lower error rate.
    Elite,
}

impl SkillTier {
    /// Every tier, in ascending order.
    pub const ALL: [SkillTier; 4] = [
        SkillTier::Rookie,
        SkillTier::Amateur,
        SkillTier::Pro,
        SkillTier::Elite,
    ];

    /// Numeric rating for display and matchmaking.
    #[must_use]
    pub const fn rating(self) -> u32 {
        match self {
            SkillTier::Rookie => 80,
            SkillTier::Amateur => 90,
            SkillTier::Pro => 100,
            SkillTier::Elite => 110,
        }
    }

    /// Fixed per-turn probability of ignoring deduction entirely.
    #[must_use]
    pub const fn error_rate(self) -> f64 {
        match self {
            SkillTier::Rookie => 0.25,
            SkillTier::Amateur => 0.15,
            SkillTier::Pro => 0.08,
            SkillTier::Elite => 0.03,
        }
    }

    /// Whether the tier retains and relocates symbols based on the prior
    /// guess (tier 90 and above).
    #[must_use]
    pub const fn tracks_positions(self) -> bool {
        !matches!(self, SkillTier::Rookie)
    }

    /// Whether the tier cross-references guess pairs to lock probable
    /// confirmed positions (tier 100 and above).
    #[must_use]
    pub const fn locks_confirmed_positions(self) -> bool {
        matches!(self, SkillTier::Pro | SkillTier::Elite)
    }

    /// Base and spread of simulated per-turn think time, in seconds.
    /// Lower tiers think longer, so they can run out the clock.
    const fn think_time_secs(self) -> (u32, u32) {
        match self {
            SkillTier::Rookie => (22, 16),
            SkillTier::Amateur => (18, 12),
            SkillTier::Pro => (14, 10),
            SkillTier::Elite => (10, 8),
        }
    }
}

impl std::fmt::Display for SkillTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SkillTier::Rookie => write!(f, "rookie (80)"),
            SkillTier::Amateur => write!(f, "amateur (90)"),
            SkillTier::Pro => write!(f, "pro (100)"),
            SkillTier::Elite => write!(f, "elite (110)"),
        }
    }
}

/// Fixed roster of bot display names.
const ROSTER: [&str; 12] = [
    "Vela", "Quark", "Nyx", "Sable", "Rook", "Ivy", "Moss", "Flint", "Echo", "Wren", "Juno",
    "Dax",
];

/// A synthetic player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BotPlayer {
    /// Unique identifier within a race.
    pub id: PlayerId,
    /// Display name, drawn deterministically from a fixed roster.
    pub display_name: String,
    /// Skill tier controlling error rate and deduction.
    pub tier: SkillTier,
}

impl BotPlayer {
    /// Create a bot with a roster name derived from its id.
    #[must_use]
    pub fn new(id: PlayerId, tier: SkillTier) -> Self {
        let index = usize::try_from(id).unwrap_or(0) % ROSTER.len();
        let name = ROSTER[index];
        Self {
            id,
            display_name: format!("{name}-{}", tier.rating()),
            tier,
        }
    }
}

/// Simulate one complete game for a bot of the given tier.
///
/// The bot plays a private round with its own secret, history, and rng.
/// The game ends on a win, on the attempt cap, or when accumulated think
/// time exceeds the time budget — whichever comes first. A strategist
/// defect (a plan that fails code validation) is recovered by substituting
/// a random legal guess rather than stalling.
#[must_use]
pub fn simulate_game(tier: SkillTier, rules: RaceRules, rng: &mut SmallRng) -> RoundOutcome {
    let mut round = Round::new(rules, rng);
    let (base, spread) = tier.think_time_secs();

    while !round.status().is_terminal() {
        let plan = plan_guess(tier, round.history(), rng);
        let guess = match Code::new(plan.symbols) {
            Ok(guess) => guess,
            // Defect recovery: a bot must never block the round.
            Err(_) => crate::code::generate_secret(rules.policy, rng),
        };

        let think = base + rng.random_range(0..=spread);
        // The round is only terminated above, so submission cannot fail.
        if round.submit(guess, think).is_err() {
            break;
        }
    }

    // Status is terminal when the loop exits.
    round.outcome().unwrap_or(RoundOutcome {
        won: false,
        attempts_used: round.attempts_used(),
        score: round.score(),
        time_remaining_secs: 0,
    })
}
