// Allow unwrap and unreadable literals in tests (test code is not production)
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::unreadable_literal))]
#![cfg_attr(test, allow(clippy::cast_precision_loss))]
#![cfg_attr(test, allow(clippy::cast_possible_truncation))]
//! Coderace: a deterministic code-breaking race engine with synthetic
//! opponents and real-money settlement.
//!
//! This crate provides:
//! - A pure guess-evaluation engine with bit-exact deterministic feedback
//! - Skill-tiered bot strategists for simulated opposition
//! - A tournament orchestrator with a scaled payout ladder
//! - A two-phase atomic settlement service over persisted balances
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────┐
//! │        Settlement Service           │
//! ├─────────────────────────────────────┤
//! │      Tournament Orchestrator        │
//! ├──────────────────┬──────────────────┤
//! │   Bot Strategist │   Round Logic    │
//! ├──────────────────┴──────────────────┤
//! │       Code Engine (pure)            │
//! └─────────────────────────────────────┘
//! ```

pub mod bot;
pub mod code;
pub mod round;
pub mod settlement;
pub mod tournament;

// Re-export key types at crate root for convenience
pub use code::{Code, CodeError, DuplicatePolicy, Feedback};
pub use round::{RaceRules, Round, RoundOutcome, RoundStatus};

/// Unique identifier for a human or synthetic entrant within a race.
pub type PlayerId = u32;

/// Monetary amounts in integer cents. All balance and prize arithmetic
/// stays in this type; fractional cents never exist.
pub type Cents = u64;
