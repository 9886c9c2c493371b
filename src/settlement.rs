//! Settlement: the only writer of persisted balances.
//!
//! Two-phase protocol per race. The **validate** phase is read-only and
//! callable before play begins; a session abandoned after validation
//! leaves every balance untouched. The **commit** phase runs once at race
//! completion as a saga of compensable steps under a single lock:
//!
//! 1. Debit the player's buy-in.
//! 2. Debit the bot-funding pool for every synthetic buy-in.
//! 3. Credit the rake pool with the per-entrant rake plus the ladder's
//!    rounding residue.
//! 4. Credit the player's prize (may be zero).
//! 5. Credit the bot prizes back to the bot-funding pool.
//!
//! Debits run before credits so a mid-sequence failure never leaves value
//! created from nothing; a failure after any applied step triggers
//! compensating reversal in reverse order. Across the three accounts every
//! commit is zero-sum: value only moves, it is never created or destroyed.

mod ledger;

pub use ledger::{Account, GameRecord, Ledger, LedgerError, MemoryLedger, PlayerStats};

use std::sync::Mutex;

use serde::{Deserialize, Serialize};

use crate::{Cents, PlayerId};

/// Upper bound on synthetic opponents a single race can settle. Keeps the
/// entrant count (`bot_count + 1`) far from `u32` overflow and the pool
/// arithmetic within sane ranges.
pub const MAX_BOT_COUNT: u32 = 999;

/// Settlement-level errors. Insufficient player funds and an insufficient
/// house pool are distinct, user-facing, and carry the shortfall so the
/// caller can explain exactly what is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SettlementError {
    /// The player cannot cover the buy-in.
    InsufficientFunds {
        /// Amount the player is short.
        shortfall: Cents,
    },
    /// The shared bot-funding pool cannot cover the synthetic buy-ins.
    PoolInsufficient {
        /// Amount the pool is short.
        shortfall: Cents,
    },
    /// Malformed request: a contract error, not a gameplay outcome.
    InvalidRequest(String),
    /// Storage failure surfaced from the ledger.
    Ledger(LedgerError),
}

impl std::fmt::Display for SettlementError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SettlementError::InsufficientFunds { shortfall } => {
                write!(f, "insufficient funds: {shortfall} short of the buy-in")
            }
            SettlementError::PoolInsufficient { shortfall } => {
                write!(f, "bot pool cannot cover this game: {shortfall} short")
            }
            SettlementError::InvalidRequest(msg) => write!(f, "invalid request: {msg}"),
            SettlementError::Ledger(e) => write!(f, "ledger error: {e}"),
        }
    }
}

impl std::error::Error for SettlementError {}

impl From<LedgerError> for SettlementError {
    fn from(e: LedgerError) -> Self {
        SettlementError::Ledger(e)
    }
}

/// Validate-phase request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateRequest {
    /// The player who would enter.
    pub player_id: PlayerId,
    /// Buy-in per entrant; must be positive.
    pub buy_in: Cents,
    /// Rake per entrant; must not exceed the buy-in.
    pub rake: Cents,
    /// Synthetic opponents; at least one.
    pub bot_count: u32,
}

/// Validate-phase response for external callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidateResponse {
    /// Whether the race can be funded.
    pub accepted: bool,
    /// Pool size the race would play for.
    pub pool_total: Cents,
    /// Human-readable rejection reason.
    pub reason: Option<String>,
}

/// Commit-phase request: the validate parameters plus the final outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitRequest {
    /// The human entrant.
    pub player_id: PlayerId,
    /// Buy-in per entrant.
    pub buy_in: Cents,
    /// Rake per entrant.
    pub rake: Cents,
    /// Synthetic opponents.
    pub bot_count: u32,
    /// The player's final rank, 1-based.
    pub final_rank: u32,
    /// Prize owed to the player (may be zero).
    pub player_prize: Cents,
    /// Sum of prizes owed to synthetic entrants (may be zero).
    pub bot_prizes_total: Cents,
    /// Guesses the player used.
    pub attempts: u32,
    /// The player's final score.
    pub score: u32,
    /// Seconds remaining, or `None` for untimed modes.
    pub time_remaining_secs: Option<u32>,
    /// Whether the player won.
    pub won: bool,
}

/// Commit-phase response for external callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommitResponse {
    /// Whether the commit applied.
    pub accepted: bool,
    /// The player's balance after settlement, when accepted.
    pub new_player_balance: Option<Cents>,
    /// Human-readable rejection reason.
    pub reason: Option<String>,
}

/// One compensable saga step. The inverse of a debit is a credit of the
/// same amount to the same account, and vice versa.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    Debit(Account, Cents),
    Credit(Account, Cents),
}

impl Step {
    fn apply<L: Ledger>(self, ledger: &mut L) -> Result<(), LedgerError> {
        match self {
            Step::Debit(account, amount) => ledger.debit(account, amount),
            Step::Credit(account, amount) => ledger.credit(account, amount),
        }
    }

    fn inverse(self) -> Step {
        match self {
            Step::Debit(account, amount) => Step::Credit(account, amount),
            Step::Credit(account, amount) => Step::Debit(account, amount),
        }
    }
}

/// The settlement service. Owns the ledger behind a mutex: the commit
/// phase is a critical section over every balance it reads and writes, so
/// concurrent commits cannot interleave a stale balance check with a
/// later mutation.
#[derive(Debug)]
pub struct SettlementService<L: Ledger> {
    ledger: Mutex<L>,
}

impl<L: Ledger> SettlementService<L> {
    /// Wrap a ledger.
    #[must_use]
    pub fn new(ledger: L) -> Self {
        Self {
            ledger: Mutex::new(ledger),
        }
    }

    /// Consume the service and return the ledger. A poisoned mutex is
    /// recovered: the saga never leaves partial state behind, so the
    /// ledger is consistent even after a panicked thread.
    #[must_use]
    pub fn into_ledger(self) -> L {
        match self.ledger.into_inner() {
            Ok(ledger) => ledger,
            Err(poisoned) => poisoned.into_inner(),
        }
    }

    /// Run a closure against the ledger, recovering from poisoning: the
    /// saga never leaves a partial application behind, so the ledger is
    /// consistent even after a panicked thread.
    fn with_ledger<T>(&self, f: impl FnOnce(&mut L) -> T) -> T {
        let mut guard = match self.ledger.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }

    /// Validate phase: read-only funding check.
    ///
    /// Confirms the player can cover the buy-in and the bot pool can cover
    /// every synthetic buy-in, and returns the pool the race would play
    /// for. Performs no mutation, so a session that ends here leaves no
    /// funds in limbo.
    ///
    /// # Errors
    ///
    /// `InvalidRequest` for contract violations, `InsufficientFunds` or
    /// `PoolInsufficient` (with shortfalls) for funding gaps, `Ledger` for
    /// storage failures.
    pub fn validate(&self, request: &ValidateRequest) -> Result<Cents, SettlementError> {
        check_contract(request.buy_in, request.rake, request.bot_count)?;
        self.with_ledger(|ledger| {
            check_funding(
                ledger,
                request.player_id,
                request.buy_in,
                request.bot_count,
            )
        })?;
        Ok(crate::tournament::pool_size(
            request.buy_in,
            request.rake,
            request.bot_count + 1,
        ))
    }

    /// Commit phase: settle a finished race as a single logical unit.
    ///
    /// Re-validates both balances inside the critical section (the
    /// validate-phase snapshot may be stale), then applies debits before
    /// credits. If any step fails after earlier steps applied, the applied
    /// steps are reversed in reverse order before the error is returned —
    /// partial application is never a terminal state. Returns the player's
    /// new balance.
    ///
    /// # Errors
    ///
    /// Same taxonomy as [`Self::validate`], plus `Ledger` errors from the
    /// history write (which also roll the balances back).
    pub fn commit(&self, request: &CommitRequest) -> Result<Cents, SettlementError> {
        check_contract(request.buy_in, request.rake, request.bot_count)?;

        let entrants = request.bot_count + 1;
        let pool = crate::tournament::pool_size(request.buy_in, request.rake, entrants);
        let prizes_total = request
            .player_prize
            .checked_add(request.bot_prizes_total)
            .ok_or_else(|| SettlementError::InvalidRequest("prize total overflows".into()))?;
        if prizes_total > pool {
            return Err(SettlementError::InvalidRequest(format!(
                "prizes {prizes_total} exceed pool {pool}"
            )));
        }
        if request.final_rank == 0 {
            return Err(SettlementError::InvalidRequest("rank is 1-based".into()));
        }

        // Ladder flooring leaves residual cents; the house absorbs them so
        // the three-account sum is exactly conserved.
        let residue = pool - prizes_total;
        let rake_total = request
            .rake
            .saturating_mul(Cents::from(entrants))
            .saturating_add(residue);

        let steps = [
            Step::Debit(Account::Player(request.player_id), request.buy_in),
            Step::Debit(
                Account::BotPool,
                request.buy_in.saturating_mul(Cents::from(request.bot_count)),
            ),
            Step::Credit(Account::RakePool, rake_total),
            Step::Credit(Account::Player(request.player_id), request.player_prize),
            Step::Credit(Account::BotPool, request.bot_prizes_total),
        ];

        self.with_ledger(|ledger| {
            // Not trusting the validate-phase snapshot: balances may have
            // changed since, so re-check inside the lock.
            check_funding(ledger, request.player_id, request.buy_in, request.bot_count)?;

            let mut applied: Vec<Step> = Vec::with_capacity(steps.len());
            for step in steps {
                if let Err(e) = step.apply(ledger) {
                    roll_back(ledger, &applied);
                    return Err(SettlementError::Ledger(e));
                }
                applied.push(step);
            }

            let record = GameRecord {
                player_id: request.player_id,
                mode: "race".to_owned(),
                won: request.won,
                attempts: request.attempts,
                score: request.score,
                time_remaining_secs: request.time_remaining_secs,
                rank: request.final_rank,
                prize_won: request.player_prize,
                buy_in: request.buy_in,
                pool,
                timestamp_secs: unix_now(),
            };
            if let Err(e) = ledger.record_game(record) {
                roll_back(ledger, &applied);
                return Err(SettlementError::Ledger(e));
            }

            Ok(ledger.balance(Account::Player(request.player_id))?)
        })
    }

    /// Sum of the three settlement accounts for a player. Any successful
    /// commit leaves this total unchanged — the zero-sum invariant tests
    /// assert against.
    ///
    /// # Errors
    ///
    /// Returns a `Ledger` error if any balance cannot be read.
    pub fn totals(&self, player_id: PlayerId) -> Result<Cents, SettlementError> {
        self.with_ledger(|ledger| {
            Ok(ledger.balance(Account::Player(player_id))?
                + ledger.balance(Account::BotPool)?
                + ledger.balance(Account::RakePool)?)
        })
    }

    /// External-interface wrapper over [`Self::validate`].
    #[must_use]
    pub fn handle_validate(&self, request: &ValidateRequest) -> ValidateResponse {
        match self.validate(request) {
            Ok(pool_total) => ValidateResponse {
                accepted: true,
                pool_total,
                reason: None,
            },
            Err(e) => ValidateResponse {
                accepted: false,
                pool_total: 0,
                reason: Some(e.to_string()),
            },
        }
    }

    /// External-interface wrapper over [`Self::commit`].
    #[must_use]
    pub fn handle_commit(&self, request: &CommitRequest) -> CommitResponse {
        match self.commit(request) {
            Ok(new_player_balance) => CommitResponse {
                accepted: true,
                new_player_balance: Some(new_player_balance),
                reason: None,
            },
            Err(e) => CommitResponse {
                accepted: false,
                new_player_balance: None,
                reason: Some(e.to_string()),
            },
        }
    }
}

/// Contract checks shared by both phases.
fn check_contract(buy_in: Cents, rake: Cents, bot_count: u32) -> Result<(), SettlementError> {
    if buy_in == 0 {
        return Err(SettlementError::InvalidRequest("buy-in must be positive".into()));
    }
    if rake > buy_in {
        return Err(SettlementError::InvalidRequest(format!(
            "rake {rake} exceeds buy-in {buy_in}"
        )));
    }
    if bot_count == 0 {
        return Err(SettlementError::InvalidRequest(
            "at least one synthetic opponent required".into(),
        ));
    }
    if bot_count > MAX_BOT_COUNT {
        return Err(SettlementError::InvalidRequest(format!(
            "bot count {bot_count} exceeds the field cap {MAX_BOT_COUNT}"
        )));
    }
    Ok(())
}

/// Funding checks shared by validate and (re-run inside the lock) commit.
fn check_funding<L: Ledger>(
    ledger: &L,
    player_id: PlayerId,
    buy_in: Cents,
    bot_count: u32,
) -> Result<(), SettlementError> {
    let player_balance = ledger.balance(Account::Player(player_id))?;
    if player_balance < buy_in {
        return Err(SettlementError::InsufficientFunds {
            shortfall: buy_in - player_balance,
        });
    }

    let bots_need = buy_in.saturating_mul(Cents::from(bot_count));
    let pool_balance = ledger.balance(Account::BotPool)?;
    if pool_balance < bots_need {
        return Err(SettlementError::PoolInsufficient {
            shortfall: bots_need - pool_balance,
        });
    }
    Ok(())
}

/// Reverse already-applied steps, newest first.
///
/// The inverse of an applied debit is a credit of funds that were just
/// removed, and the inverse of a credit is a debit of funds that were just
/// added, so compensation cannot legitimately fail; a storage-level
/// failure here is ignored in favor of surfacing the original error.
fn roll_back<L: Ledger>(ledger: &mut L, applied: &[Step]) {
    for step in applied.iter().rev() {
        let _ = step.inverse().apply(ledger);
    }
}

fn unix_now() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map_or(0, |d| d.as_secs())
}
