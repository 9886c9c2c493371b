//! Code engine: secret generation, guess evaluation, and victory detection.
//!
//! Pure functions over fixed-length symbol codes. The evaluator implements
//! the classical two-pass algorithm:
//!
//! 1. Scan positions left to right and count exact matches, consuming both
//!    the secret slot and the guess slot.
//! 2. For each unconsumed guess slot, search unconsumed secret slots in order
//!    for an identity match; the first hit counts as `present` and consumes
//!    that secret slot.
//!
//! No slot is ever consumed twice, so a repeated symbol in the guess can
//! never earn more partial credit than the secret actually contains.

use rand::Rng;
use rand::rngs::SmallRng;
use rand::seq::SliceRandom;
use serde::{Deserialize, Serialize};

/// Number of symbols in a secret code or guess.
pub const CODE_LENGTH: usize = 4;

/// Number of distinct symbols in the catalog.
pub const CATALOG_SIZE: usize = 6;

/// Stable identifier for a symbol. Valid ids are `0..CATALOG_SIZE`.
pub type SymbolId = u8;

/// A symbol from the fixed catalog.
///
/// The label is presentation-only; all game logic keys on `id`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Symbol {
    /// Stable identity used by the evaluator.
    pub id: SymbolId,
    /// Display label (irrelevant to logic).
    pub label: &'static str,
}

/// The fixed symbol catalog.
pub const CATALOG: [Symbol; CATALOG_SIZE] = [
    Symbol { id: 0, label: "ruby" },
    Symbol { id: 1, label: "amber" },
    Symbol { id: 2, label: "jade" },
    Symbol { id: 3, label: "azure" },
    Symbol { id: 4, label: "violet" },
    Symbol { id: 5, label: "onyx" },
];

/// Duplicate policy for secret generation.
///
/// Fixed for the lifetime of a round; the secret is never regenerated
/// mid-round.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DuplicatePolicy {
    /// Sample without replacement (all four symbols distinct).
    NoDuplicates,
    /// Uniform random fill (repeats allowed).
    AllowDuplicates,
}

/// Contract errors for malformed codes.
///
/// These are programming errors, never gameplay outcomes. A malformed call
/// is always distinct from "no match" feedback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeError {
    /// Input sequence was not exactly `CODE_LENGTH` symbols.
    LengthMismatch {
        /// Number of symbols actually supplied.
        got: usize,
    },
    /// A symbol id outside the catalog.
    UnknownSymbol(SymbolId),
}

impl std::fmt::Display for CodeError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CodeError::LengthMismatch { got } => {
                write!(f, "code must have exactly {CODE_LENGTH} symbols, got {got}")
            }
            CodeError::UnknownSymbol(id) => {
                write!(f, "unknown symbol id {id} (catalog has {CATALOG_SIZE})")
            }
        }
    }
}

impl std::error::Error for CodeError {}

/// An ordered sequence of exactly four catalog symbols.
///
/// Used for both secrets and guesses. Construction validates every symbol
/// id, so a `Code` in hand is always well-formed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Code {
    symbols: [SymbolId; CODE_LENGTH],
}

impl Code {
    /// Create a code from a fixed array of symbol ids.
    ///
    /// # Errors
    ///
    /// Returns `CodeError::UnknownSymbol` if any id is outside the catalog.
    pub fn new(symbols: [SymbolId; CODE_LENGTH]) -> Result<Self, CodeError> {
        for &id in &symbols {
            if usize::from(id) >= CATALOG_SIZE {
                return Err(CodeError::UnknownSymbol(id));
            }
        }
        Ok(Self { symbols })
    }

    /// Create a code from a dynamically sized slice.
    ///
    /// # Errors
    ///
    /// Returns `CodeError::LengthMismatch` if the slice is not exactly
    /// `CODE_LENGTH` long, or `CodeError::UnknownSymbol` for an id outside
    /// the catalog.
    pub fn from_slice(symbols: &[SymbolId]) -> Result<Self, CodeError> {
        let fixed: [SymbolId; CODE_LENGTH] = symbols
            .try_into()
            .map_err(|_| CodeError::LengthMismatch { got: symbols.len() })?;
        Self::new(fixed)
    }

    /// The symbol ids in order.
    #[must_use]
    pub const fn symbols(&self) -> &[SymbolId; CODE_LENGTH] {
        &self.symbols
    }
}

/// Evaluation feedback: `(exact, present)` counts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feedback {
    /// Symbols matching both identity and position.
    pub exact: u8,
    /// Symbols matching identity only, counted without double-consuming
    /// any secret or guess slot.
    pub present: u8,
}

impl Feedback {
    /// True iff every position matched exactly — the sole win condition.
    #[must_use]
    pub fn is_victory(&self) -> bool {
        usize::from(self.exact) == CODE_LENGTH
    }
}

/// Generate a secret code under the given duplicate policy.
///
/// The rng is a seeded `SmallRng`: deterministic under a fixed seed, and
/// not inferable from observed feedback within a game's attempt budget.
#[must_use]
pub fn generate_secret(policy: DuplicatePolicy, rng: &mut SmallRng) -> Code {
    let symbols = match policy {
        DuplicatePolicy::NoDuplicates => {
            let mut pool: [SymbolId; CATALOG_SIZE] = [0, 1, 2, 3, 4, 5];
            pool.shuffle(rng);
            [pool[0], pool[1], pool[2], pool[3]]
        }
        DuplicatePolicy::AllowDuplicates => {
            let max = u8::try_from(CATALOG_SIZE).unwrap_or(u8::MAX);
            let mut symbols = [0; CODE_LENGTH];
            for slot in &mut symbols {
                *slot = rng.random_range(0..max);
            }
            symbols
        }
    };
    // Ids are drawn from the catalog range, so construction cannot fail.
    Code { symbols }
}

/// Evaluate a guess against a secret.
///
/// Pure: neither argument is mutated, and identical inputs always produce
/// identical feedback. Both codes are validated at construction, so length
/// and symbol contract errors cannot reach this function.
#[must_use]
pub fn evaluate(secret: &Code, guess: &Code) -> Feedback {
    let s = secret.symbols();
    let g = guess.symbols();

    let mut secret_used = [false; CODE_LENGTH];
    let mut guess_used = [false; CODE_LENGTH];
    let mut exact: u8 = 0;
    let mut present: u8 = 0;

    // Pass 1: exact matches consume both slots.
    for i in 0..CODE_LENGTH {
        if s[i] == g[i] {
            secret_used[i] = true;
            guess_used[i] = true;
            exact += 1;
        }
    }

    // Pass 2: identity matches against unconsumed secret slots, in order.
    for i in 0..CODE_LENGTH {
        if guess_used[i] {
            continue;
        }
        for j in 0..CODE_LENGTH {
            if !secret_used[j] && s[j] == g[i] {
                secret_used[j] = true;
                present += 1;
                break;
            }
        }
    }

    Feedback { exact, present }
}

/// Evaluate raw symbol slices, validating both before scoring.
///
/// This is the entry point for callers holding unvalidated input (e.g. a
/// UI submission). Malformed input fails loudly here rather than being
/// silently truncated or coerced.
///
/// # Errors
///
/// Returns a `CodeError` if either slice has the wrong length or contains
/// an unknown symbol id.
pub fn evaluate_slices(secret: &[SymbolId], guess: &[SymbolId]) -> Result<Feedback, CodeError> {
    let secret = Code::from_slice(secret)?;
    let guess = Code::from_slice(guess)?;
    Ok(evaluate(&secret, &guess))
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Prove the feedback bound `exact + present <= CODE_LENGTH` for all
    /// well-formed inputs.
    #[kani::proof]
    fn prove_feedback_bounded() {
        let s: [SymbolId; CODE_LENGTH] = kani::any();
        let g: [SymbolId; CODE_LENGTH] = kani::any();
        for &id in s.iter().chain(g.iter()) {
            kani::assume(usize::from(id) < CATALOG_SIZE);
        }

        let secret = Code { symbols: s };
        let guess = Code { symbols: g };
        let fb = evaluate(&secret, &guess);

        assert!(usize::from(fb.exact) + usize::from(fb.present) <= CODE_LENGTH);
    }

    /// Prove that a guess equal to the secret is always a victory.
    #[kani::proof]
    fn prove_self_match_wins() {
        let s: [SymbolId; CODE_LENGTH] = kani::any();
        for &id in &s {
            kani::assume(usize::from(id) < CATALOG_SIZE);
        }

        let code = Code { symbols: s };
        let fb = evaluate(&code, &code);

        assert!(fb.is_victory());
        assert_eq!(fb.present, 0);
    }
}
