//! Ledger abstraction: the balances, records, and stats the settlement
//! service reads and writes.
//!
//! The trait keeps the settlement saga independent of storage; the bundled
//! [`MemoryLedger`] holds everything in memory and snapshots to JSON. The
//! two pools and the player balances may live in different storage
//! partitions in a real deployment, which is why every mutation is a
//! separate fallible step.

use std::collections::HashMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::{Cents, PlayerId};

/// The accounts settlement can touch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Account {
    /// A human player's personal balance.
    Player(PlayerId),
    /// The shared pool that funds synthetic entrants' buy-ins.
    BotPool,
    /// The house rake pool.
    RakePool,
}

impl std::fmt::Display for Account {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Account::Player(id) => write!(f, "player {id}"),
            Account::BotPool => write!(f, "bot pool"),
            Account::RakePool => write!(f, "rake pool"),
        }
    }
}

/// Storage-level errors.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    /// No account exists for the player.
    UnknownPlayer(PlayerId),
    /// A debit would drive the account negative. Balances are non-negative
    /// at all times; the caller validates first, so hitting this means the
    /// balance changed underneath it.
    InsufficientBalance {
        /// The account that could not cover the debit.
        account: Account,
        /// Balance at the time of the attempted debit.
        have: Cents,
        /// Amount the debit required.
        need: Cents,
    },
    /// Snapshot persistence failed.
    Snapshot(String),
}

impl std::fmt::Display for LedgerError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            LedgerError::UnknownPlayer(id) => write!(f, "no account for player {id}"),
            LedgerError::InsufficientBalance { account, have, need } => {
                write!(f, "{account} has {have} but needs {need}")
            }
            LedgerError::Snapshot(msg) => write!(f, "snapshot failed: {msg}"),
        }
    }
}

impl std::error::Error for LedgerError {}

/// Cumulative per-player statistics, updated once per commit.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Races entered.
    pub races_played: u32,
    /// Races won.
    pub wins: u32,
    /// Most seconds ever left on the clock at a win.
    pub best_time_remaining_secs: u32,
}

/// Game-history record written on commit. Append-only, never mutated.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRecord {
    /// The human entrant.
    pub player_id: PlayerId,
    /// Game mode label.
    pub mode: String,
    /// Whether the player cracked the secret.
    pub won: bool,
    /// Guesses used.
    pub attempts: u32,
    /// Final score.
    pub score: u32,
    /// Seconds remaining, or `None` when the mode is untimed.
    pub time_remaining_secs: Option<u32>,
    /// Final rank in the field.
    pub rank: u32,
    /// Prize credited to the player.
    pub prize_won: Cents,
    /// Buy-in paid.
    pub buy_in: Cents,
    /// Pool the race was played for.
    pub pool: Cents,
    /// Unix timestamp (seconds) of the commit.
    pub timestamp_secs: u64,
}

/// Storage seam for the settlement service.
///
/// `debit` must reject (not saturate) an overdraw, and every method must
/// leave the ledger unchanged when it returns an error.
pub trait Ledger {
    /// Current balance of an account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::UnknownPlayer` for a missing player account.
    fn balance(&self, account: Account) -> Result<Cents, LedgerError>;

    /// Remove funds from an account.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientBalance` if the account cannot
    /// cover the amount, or `UnknownPlayer` for a missing account.
    fn debit(&mut self, account: Account, amount: Cents) -> Result<(), LedgerError>;

    /// Add funds to an account.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPlayer` for a missing player account.
    fn credit(&mut self, account: Account, amount: Cents) -> Result<(), LedgerError>;

    /// Append a game-history record and fold it into the player's
    /// cumulative stats, as one all-or-nothing write.
    ///
    /// # Errors
    ///
    /// Returns `UnknownPlayer` for a missing player account, with the
    /// ledger unchanged.
    fn record_game(&mut self, record: GameRecord) -> Result<(), LedgerError>;
}

/// A player's balance plus cumulative stats.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
struct PlayerAccount {
    balance: Cents,
    stats: PlayerStats,
}

/// In-memory ledger with JSON snapshot persistence.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryLedger {
    players: HashMap<PlayerId, PlayerAccount>,
    bot_pool: Cents,
    rake_pool: Cents,
    records: Vec<GameRecord>,
}

impl MemoryLedger {
    /// Empty ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create or top up a player account.
    pub fn fund_player(&mut self, player: PlayerId, amount: Cents) {
        let account = self.players.entry(player).or_default();
        account.balance = account.balance.saturating_add(amount);
    }

    /// Top up the shared bot-funding pool.
    pub fn fund_bot_pool(&mut self, amount: Cents) {
        self.bot_pool = self.bot_pool.saturating_add(amount);
    }

    /// Cumulative stats for a player.
    #[must_use]
    pub fn stats(&self, player: PlayerId) -> Option<PlayerStats> {
        self.players.get(&player).map(|a| a.stats)
    }

    /// All game-history records, oldest first.
    #[must_use]
    pub fn records(&self) -> &[GameRecord] {
        &self.records
    }

    /// Write a JSON snapshot of the whole ledger.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Snapshot` on serialization or I/O failure.
    pub fn save(&self, path: &Path) -> Result<(), LedgerError> {
        let json = serde_json::to_string_pretty(self)
            .map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        std::fs::write(path, json).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    /// Load a ledger from a JSON snapshot.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::Snapshot` on I/O or parse failure.
    pub fn load(path: &Path) -> Result<Self, LedgerError> {
        let json =
            std::fs::read_to_string(path).map_err(|e| LedgerError::Snapshot(e.to_string()))?;
        serde_json::from_str(&json).map_err(|e| LedgerError::Snapshot(e.to_string()))
    }

    fn account_balance_mut(&mut self, account: Account) -> Result<&mut Cents, LedgerError> {
        match account {
            Account::Player(id) => self
                .players
                .get_mut(&id)
                .map(|a| &mut a.balance)
                .ok_or(LedgerError::UnknownPlayer(id)),
            Account::BotPool => Ok(&mut self.bot_pool),
            Account::RakePool => Ok(&mut self.rake_pool),
        }
    }
}

impl Ledger for MemoryLedger {
    fn balance(&self, account: Account) -> Result<Cents, LedgerError> {
        match account {
            Account::Player(id) => self
                .players
                .get(&id)
                .map(|a| a.balance)
                .ok_or(LedgerError::UnknownPlayer(id)),
            Account::BotPool => Ok(self.bot_pool),
            Account::RakePool => Ok(self.rake_pool),
        }
    }

    fn debit(&mut self, account: Account, amount: Cents) -> Result<(), LedgerError> {
        let balance = self.account_balance_mut(account)?;
        if *balance < amount {
            return Err(LedgerError::InsufficientBalance {
                account,
                have: *balance,
                need: amount,
            });
        }
        *balance -= amount;
        Ok(())
    }

    fn credit(&mut self, account: Account, amount: Cents) -> Result<(), LedgerError> {
        let balance = self.account_balance_mut(account)?;
        *balance = balance.saturating_add(amount);
        Ok(())
    }

    fn record_game(&mut self, record: GameRecord) -> Result<(), LedgerError> {
        // The account lookup is the only fallible part; do it before any
        // mutation so an error leaves the ledger untouched.
        let account = self
            .players
            .get_mut(&record.player_id)
            .ok_or(LedgerError::UnknownPlayer(record.player_id))?;
        account.stats.races_played += 1;
        if record.won {
            account.stats.wins += 1;
            account.stats.best_time_remaining_secs = account
                .stats
                .best_time_remaining_secs
                .max(record.time_remaining_secs.unwrap_or(0));
        }
        self.records.push(record);
        Ok(())
    }
}
