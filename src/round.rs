//! Round state: one secret, one append-only history, one terminal status.
//!
//! The secret is owned privately by [`Round`] and no setter exists, so it is
//! immutable by construction for the lifetime of the round. Starting a new
//! round is the only way to get a new secret.
//!
//! The countdown clock lives outside the round; callers report elapsed time
//! with each submission or via [`Round::expire`]. Whichever terminal
//! condition is observed first (win, attempts exhausted, time expired) wins,
//! and a second trigger after termination is a no-op.

use rand::rngs::SmallRng;
use serde::{Deserialize, Serialize};

use crate::code::{Code, DuplicatePolicy, Feedback, evaluate, generate_secret};

/// Points awarded per exact match in a submitted guess.
pub const POINTS_PER_EXACT: u32 = 50;

/// Points awarded per present (wrong-position) match.
pub const POINTS_PER_PRESENT: u32 = 20;

/// Flat bonus for winning the round.
pub const WIN_BONUS: u32 = 300;

/// Rules shared by every participant in a race.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RaceRules {
    /// Maximum guesses before the round is lost.
    pub attempt_cap: u32,
    /// Time budget in seconds; the clock can end the round on its own.
    pub time_budget_secs: u32,
    /// Duplicate policy for secret generation, fixed for the round.
    pub policy: DuplicatePolicy,
}

impl Default for RaceRules {
    fn default() -> Self {
        Self {
            attempt_cap: 10,
            time_budget_secs: 300,
            policy: DuplicatePolicy::NoDuplicates,
        }
    }
}

/// One guess and the feedback it earned. History entries are immutable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AttemptRecord {
    /// The submitted guess.
    pub guess: Code,
    /// Feedback for the guess against this round's secret.
    pub feedback: Feedback,
}

/// Round lifecycle status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoundStatus {
    /// Accepting submissions.
    InProgress,
    /// Guess matched the secret exactly.
    Won,
    /// Attempt cap reached without a win.
    LostAttempts,
    /// Time budget exhausted. A loss, not an error.
    LostTimeout,
}

impl RoundStatus {
    /// True once the round has reached any terminal state.
    #[must_use]
    pub fn is_terminal(self) -> bool {
        self != RoundStatus::InProgress
    }
}

/// Result of a single submission.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Guess was evaluated; round may or may not have ended.
    Scored(Feedback),
    /// The think time for this submission exhausted the budget first;
    /// the guess was not scored.
    TimedOut,
}

/// Error for submissions against a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoundOver;

impl std::fmt::Display for RoundOver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "round already terminated")
    }
}

impl std::error::Error for RoundOver {}

/// Terminal summary of a finished round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoundOutcome {
    /// Whether the secret was cracked.
    pub won: bool,
    /// Guesses submitted.
    pub attempts_used: u32,
    /// Accrued score including win and time bonuses.
    pub score: u32,
    /// Seconds left on the clock (zero on timeout).
    pub time_remaining_secs: u32,
}

/// In-memory state for a single round.
///
/// Submissions are synchronous with respect to this state: the caller holds
/// `&mut Round`, so no two guesses can be evaluated concurrently against
/// the same secret.
#[derive(Debug, Clone)]
pub struct Round {
    secret: Code,
    rules: RaceRules,
    history: Vec<AttemptRecord>,
    remaining_secs: u32,
    score: u32,
    status: RoundStatus,
}

impl Round {
    /// Start a new round, generating a fresh secret under the rules' policy.
    #[must_use]
    pub fn new(rules: RaceRules, rng: &mut SmallRng) -> Self {
        Self::with_secret(generate_secret(rules.policy, rng), rules)
    }

    /// Start a round with a known secret. Used by tests and simulations
    /// that need reproducible rounds.
    #[must_use]
    pub fn with_secret(secret: Code, rules: RaceRules) -> Self {
        Self {
            secret,
            rules,
            history: Vec::new(),
            remaining_secs: rules.time_budget_secs,
            score: 0,
            status: RoundStatus::InProgress,
        }
    }

    /// Current status.
    #[must_use]
    pub const fn status(&self) -> RoundStatus {
        self.status
    }

    /// Append-only guess history, ordered by submission.
    #[must_use]
    pub fn history(&self) -> &[AttemptRecord] {
        &self.history
    }

    /// Guesses submitted so far.
    #[must_use]
    pub fn attempts_used(&self) -> u32 {
        u32::try_from(self.history.len()).unwrap_or(u32::MAX)
    }

    /// Seconds left on the clock.
    #[must_use]
    pub const fn remaining_secs(&self) -> u32 {
        self.remaining_secs
    }

    /// Accrued score.
    #[must_use]
    pub const fn score(&self) -> u32 {
        self.score
    }

    /// The rules this round runs under.
    #[must_use]
    pub const fn rules(&self) -> &RaceRules {
        &self.rules
    }

    /// Submit one guess, reporting the seconds spent on it.
    ///
    /// If the think time exhausts the budget the round times out and the
    /// guess is not scored. Otherwise the guess is evaluated, recorded, and
    /// the round terminates on a win or on reaching the attempt cap.
    ///
    /// # Errors
    ///
    /// Returns [`RoundOver`] if the round already terminated; state is not
    /// mutated in that case.
    pub fn submit(&mut self, guess: Code, think_secs: u32) -> Result<SubmitOutcome, RoundOver> {
        if self.status.is_terminal() {
            return Err(RoundOver);
        }

        if think_secs >= self.remaining_secs {
            self.remaining_secs = 0;
            self.status = RoundStatus::LostTimeout;
            return Ok(SubmitOutcome::TimedOut);
        }
        self.remaining_secs -= think_secs;

        let feedback = evaluate(&self.secret, &guess);
        self.history.push(AttemptRecord { guess, feedback });
        self.score += u32::from(feedback.exact) * POINTS_PER_EXACT
            + u32::from(feedback.present) * POINTS_PER_PRESENT;

        if feedback.is_victory() {
            self.score += WIN_BONUS + time_bonus(self.remaining_secs, self.rules.time_budget_secs);
            self.status = RoundStatus::Won;
        } else if self.attempts_used() >= self.rules.attempt_cap {
            self.status = RoundStatus::LostAttempts;
        }

        Ok(SubmitOutcome::Scored(feedback))
    }

    /// Expire the round from the external clock.
    ///
    /// Idempotent: expiring an already-terminated round is a no-op, so the
    /// clock and the submission path cannot race over the terminal status.
    pub fn expire(&mut self) {
        if !self.status.is_terminal() {
            self.remaining_secs = 0;
            self.status = RoundStatus::LostTimeout;
        }
    }

    /// Terminal summary.
    ///
    /// Returns `None` while the round is still in progress.
    #[must_use]
    pub fn outcome(&self) -> Option<RoundOutcome> {
        if !self.status.is_terminal() {
            return None;
        }
        Some(RoundOutcome {
            won: self.status == RoundStatus::Won,
            attempts_used: self.attempts_used(),
            score: self.score,
            time_remaining_secs: self.remaining_secs,
        })
    }
}

/// Banded time-remaining bonus: more remaining time, higher bonus.
#[must_use]
pub fn time_bonus(remaining_secs: u32, budget_secs: u32) -> u32 {
    if budget_secs == 0 || remaining_secs == 0 {
        0
    } else if remaining_secs >= budget_secs.saturating_mul(2) / 3 {
        200
    } else if remaining_secs >= budget_secs / 3 {
        100
    } else {
        50
    }
}
