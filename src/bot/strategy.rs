//! Guess planning: tier-graded deduction over the round history.
//!
//! Every plan tags each slot with the decision that produced it, so tests
//! can assert on deduction quality independently of the random error path.
//! The confirmed-position heuristic is a probabilistic pattern match over
//! guess pairs, not a guaranteed deduction; candidate locks are checked
//! against the whole history and released the moment any guess refutes
//! them.

// Catalog ids fit in u8 by construction.
#![allow(clippy::cast_possible_truncation)]

use rand::Rng;
use rand::rngs::SmallRng;
use rand::seq::{IndexedRandom, SliceRandom};

use crate::bot::SkillTier;
use crate::code::{CATALOG_SIZE, CODE_LENGTH, SymbolId};
use crate::round::AttemptRecord;

/// How a slot of a planned guess was chosen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SlotDecision {
    /// Cross-referenced as a probable confirmed position and locked in.
    Locked,
    /// Retained from the prior guess on the strength of its exact count.
    Kept,
    /// Moved away from the slot it occupied in the prior guess.
    Relocated,
    /// Drawn from the elimination-aware symbol pool.
    Filled,
}

/// A planned guess with per-slot decision tags.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GuessPlan {
    /// Symbol ids for each slot.
    pub symbols: [SymbolId; CODE_LENGTH],
    /// Decision tag for each slot.
    pub decisions: [SlotDecision; CODE_LENGTH],
    /// True when the error path fired and history was ignored.
    pub erred: bool,
}

/// Plan the next guess for a bot of the given tier.
///
/// With probability equal to the tier's error rate, positional history is
/// ignored and the guess is drawn uniformly from the elimination-aware
/// pool. Otherwise the tier's deduction ladder applies.
pub fn plan_guess(tier: SkillTier, history: &[AttemptRecord], rng: &mut SmallRng) -> GuessPlan {
    if rng.random::<f64>() < tier.error_rate() {
        let mut plan = random_plan(history, rng);
        plan.erred = true;
        return plan;
    }
    deduce(tier, history, rng)
}

/// Symbols not ruled out by an all-zero-feedback guess.
///
/// A guess with zero exact and zero present proves none of its symbols
/// appear in the secret. Secret symbols can never be eliminated this way,
/// so the pool is never truly empty; if every symbol somehow got marked,
/// the full catalog is returned instead.
#[must_use]
pub fn available_symbols(history: &[AttemptRecord]) -> Vec<SymbolId> {
    let mut eliminated = [false; CATALOG_SIZE];
    for record in history {
        if record.feedback.exact == 0 && record.feedback.present == 0 {
            for &id in record.guess.symbols() {
                eliminated[usize::from(id)] = true;
            }
        }
    }

    let pool: Vec<SymbolId> = (0..CATALOG_SIZE as u8)
        .filter(|&id| !eliminated[usize::from(id)])
        .collect();
    if pool.is_empty() {
        (0..CATALOG_SIZE as u8).collect()
    } else {
        pool
    }
}

/// Uniform random guess from the elimination-aware pool.
fn random_plan(history: &[AttemptRecord], rng: &mut SmallRng) -> GuessPlan {
    let pool = available_symbols(history);
    let mut symbols = [0; CODE_LENGTH];
    for slot in &mut symbols {
        // Pool is never empty (see available_symbols), but fall back to
        // symbol 0 rather than panic if it ever were.
        *slot = pool.choose(rng).copied().unwrap_or(0);
    }
    GuessPlan {
        symbols,
        decisions: [SlotDecision::Filled; CODE_LENGTH],
        erred: false,
    }
}

/// Cross-reference guess pairs for a probable confirmed position.
///
/// Evidence for a slot: the same symbol held it across two guesses that
/// differ at some other slot, the earlier guess scored at least one
/// exact, and the later exact count did not drop below the earlier one.
/// A pair of identical guesses carries no positional information, and a
/// zero-exact guess proves the slot wrong rather than right.
fn confirmed_symbol(history: &[AttemptRecord], slot: usize) -> Option<SymbolId> {
    for (i, earlier) in history.iter().enumerate() {
        for later in &history[i + 1..] {
            let symbol = earlier.guess.symbols()[slot];
            if symbol != later.guess.symbols()[slot] {
                continue;
            }
            let differs_elsewhere = (0..CODE_LENGTH)
                .any(|s| s != slot && earlier.guess.symbols()[s] != later.guess.symbols()[s]);
            if differs_elsewhere
                && earlier.feedback.exact > 0
                && later.feedback.exact >= earlier.feedback.exact
            {
                return Some(symbol);
            }
        }
    }
    None
}

/// Candidate locks for every slot, checked against the whole history.
///
/// A guess that agrees with more candidate slots than its exact count
/// refutes at least one candidate; the whole set is released rather than
/// guessing which one is wrong. A candidate whose symbol has been
/// eliminated from the pool is released the same way. The refuting guess
/// stays in the history, so a released false lock cannot re-establish
/// itself from the same evidence.
fn confirmed_positions(
    history: &[AttemptRecord],
    pool: &[SymbolId],
) -> [Option<SymbolId>; CODE_LENGTH] {
    let mut locked = [None; CODE_LENGTH];
    for (slot, lock) in locked.iter_mut().enumerate() {
        *lock = confirmed_symbol(history, slot).filter(|symbol| pool.contains(symbol));
    }

    for record in history {
        let agreed = (0..CODE_LENGTH)
            .filter(|&slot| locked[slot] == Some(record.guess.symbols()[slot]))
            .count();
        if agreed > usize::from(record.feedback.exact) {
            return [None; CODE_LENGTH];
        }
    }
    locked
}

/// Non-erring deduction, by ascending tier sophistication.
fn deduce(tier: SkillTier, history: &[AttemptRecord], rng: &mut SmallRng) -> GuessPlan {
    let pool = available_symbols(history);
    let mut symbols: [Option<SymbolId>; CODE_LENGTH] = [None; CODE_LENGTH];
    let mut decisions = [SlotDecision::Filled; CODE_LENGTH];

    // Tier 100+: lock probable confirmed positions before anything else.
    if tier.locks_confirmed_positions() {
        let locked = confirmed_positions(history, &pool);
        for slot in 0..CODE_LENGTH {
            if let Some(symbol) = locked[slot] {
                symbols[slot] = Some(symbol);
                decisions[slot] = SlotDecision::Locked;
            }
        }
    }

    // Tier 90+: keep prior exacts in place, relocate prior presents.
    if tier.tracks_positions()
        && let Some(last) = history.last()
    {
        let mut open: Vec<usize> = (0..CODE_LENGTH).filter(|&s| symbols[s].is_none()).collect();
        open.shuffle(rng);

        // The feedback does not say which slots were exact, so keeping
        // `exact` of the open slots is a heuristic, not a deduction.
        let keep = usize::from(last.feedback.exact).min(open.len());
        for &slot in open.iter().take(keep) {
            symbols[slot] = Some(last.guess.symbols()[slot]);
            decisions[slot] = SlotDecision::Kept;
        }

        let mut sources: Vec<usize> = open.iter().skip(keep).copied().collect();
        sources.shuffle(rng);
        let relocate = usize::from(last.feedback.present).min(sources.len());
        for &source in sources.iter().take(relocate) {
            let symbol = last.guess.symbols()[source];
            // A present symbol goes to a different slot than it occupied.
            let targets: Vec<usize> = (0..CODE_LENGTH)
                .filter(|&t| t != source && symbols[t].is_none())
                .collect();
            if let Some(&target) = targets.choose(rng) {
                symbols[target] = Some(symbol);
                decisions[target] = SlotDecision::Relocated;
            }
        }
    }

    // Fill the remaining slots from the pool.
    let mut filled = [0; CODE_LENGTH];
    for slot in 0..CODE_LENGTH {
        filled[slot] = match symbols[slot] {
            Some(symbol) => symbol,
            None => pool.choose(rng).copied().unwrap_or(0),
        };
    }

    // The lowest tier does not try to preserve position information at
    // all: shuffle the final slot order.
    if !tier.tracks_positions() {
        filled.shuffle(rng);
    }

    GuessPlan {
        symbols: filled,
        decisions,
        erred: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::code::{Code, Feedback};
    use rand::SeedableRng;

    fn record(guess: [u8; 4], exact: u8, present: u8) -> AttemptRecord {
        AttemptRecord {
            guess: Code::new(guess).unwrap(),
            feedback: Feedback { exact, present },
        }
    }

    #[test]
    fn test_zero_feedback_eliminates_symbols() {
        let history = vec![record([4, 5, 4, 5], 0, 0)];
        let pool = available_symbols(&history);
        assert_eq!(pool, vec![0, 1, 2, 3]);
    }

    #[test]
    fn test_scoring_guess_eliminates_nothing() {
        let history = vec![record([4, 5, 4, 5], 1, 0)];
        let pool = available_symbols(&history);
        assert_eq!(pool.len(), CATALOG_SIZE);
    }

    #[test]
    fn test_empty_pool_falls_back_to_catalog() {
        // Contrived: every symbol "eliminated". Cannot arise in a real
        // round but must not panic or return an empty pool.
        let history = vec![
            record([0, 1, 2, 3], 0, 0),
            record([4, 5, 4, 5], 0, 0),
        ];
        let pool = available_symbols(&history);
        assert_eq!(pool.len(), CATALOG_SIZE);
    }

    #[test]
    fn test_rookie_avoids_eliminated_symbols() {
        let mut rng = SmallRng::seed_from_u64(3);
        let history = vec![record([4, 5, 4, 5], 0, 0)];

        for _ in 0..200 {
            let plan = plan_guess(SkillTier::Rookie, &history, &mut rng);
            if plan.erred {
                continue;
            }
            for &symbol in &plan.symbols {
                assert!(symbol <= 3, "eliminated symbol {symbol} used in {plan:?}");
            }
        }
    }

    #[test]
    fn test_confirmed_position_locked_for_high_tiers() {
        // Slot 0 held symbol 2 in both guesses and exact never decreased:
        // probable confirmed position.
        let history = vec![record([2, 0, 1, 3], 1, 0), record([2, 4, 5, 0], 2, 0)];
        let mut rng = SmallRng::seed_from_u64(9);

        let mut saw_lock = false;
        for _ in 0..50 {
            let plan = plan_guess(SkillTier::Pro, &history, &mut rng);
            if plan.erred {
                continue;
            }
            assert_eq!(plan.decisions[0], SlotDecision::Locked);
            assert_eq!(plan.symbols[0], 2);
            saw_lock = true;
        }
        assert!(saw_lock);
    }

    #[test]
    fn test_refuted_lock_is_released() {
        // Slot 0 looks confirmed after two guesses, then a zero-exact
        // guess holding the same symbol at slot 0 disproves it. The lock
        // must never come back while the refuting guess is in history.
        let history = vec![
            record([2, 0, 1, 3], 1, 0),
            record([2, 4, 5, 0], 2, 0),
            record([2, 1, 0, 5], 0, 2),
        ];
        let mut rng = SmallRng::seed_from_u64(21);

        for _ in 0..50 {
            let plan = plan_guess(SkillTier::Elite, &history, &mut rng);
            assert!(
                plan.decisions.iter().all(|&d| d != SlotDecision::Locked),
                "refuted position stayed locked in {plan:?}"
            );
        }
    }

    #[test]
    fn test_repeated_identical_guesses_are_not_lock_evidence() {
        // The same guess twice says nothing about individual slots.
        let history = vec![record([2, 0, 1, 3], 1, 0), record([2, 0, 1, 3], 1, 0)];
        let mut rng = SmallRng::seed_from_u64(27);

        for _ in 0..50 {
            let plan = plan_guess(SkillTier::Pro, &history, &mut rng);
            assert!(plan.decisions.iter().all(|&d| d != SlotDecision::Locked));
        }
    }

    #[test]
    fn test_zero_exact_pair_is_not_lock_evidence() {
        // The earlier guess of the pair scored no exacts: its slots are
        // all wrong, so a repeat at slot 0 proves nothing.
        let history = vec![record([2, 0, 1, 3], 0, 1), record([2, 4, 5, 0], 2, 0)];
        let mut rng = SmallRng::seed_from_u64(29);

        for _ in 0..50 {
            let plan = plan_guess(SkillTier::Pro, &history, &mut rng);
            assert!(plan.decisions.iter().all(|&d| d != SlotDecision::Locked));
        }
    }

    #[test]
    fn test_amateur_does_not_lock_positions() {
        let history = vec![record([2, 0, 1, 3], 1, 0), record([2, 4, 5, 0], 2, 0)];
        let mut rng = SmallRng::seed_from_u64(9);

        for _ in 0..50 {
            let plan = plan_guess(SkillTier::Amateur, &history, &mut rng);
            assert!(
                plan.decisions.iter().all(|&d| d != SlotDecision::Locked),
                "tier 90 must not cross-reference guess pairs"
            );
        }
    }

    #[test]
    fn test_amateur_keeps_exact_count_slots() {
        let history = vec![record([0, 1, 2, 3], 2, 0)];
        let mut rng = SmallRng::seed_from_u64(11);

        for _ in 0..50 {
            let plan = plan_guess(SkillTier::Amateur, &history, &mut rng);
            if plan.erred {
                continue;
            }
            let kept = plan
                .decisions
                .iter()
                .filter(|&&d| d == SlotDecision::Kept)
                .count();
            assert_eq!(kept, 2);
            // Kept slots retain the prior guess's symbol in the same slot.
            for slot in 0..CODE_LENGTH {
                if plan.decisions[slot] == SlotDecision::Kept {
                    assert_eq!(plan.symbols[slot], history[0].guess.symbols()[slot]);
                }
            }
        }
    }

    #[test]
    fn test_relocated_symbols_change_slot() {
        let history = vec![record([0, 1, 2, 3], 0, 2)];
        let mut rng = SmallRng::seed_from_u64(13);

        for _ in 0..100 {
            let plan = plan_guess(SkillTier::Amateur, &history, &mut rng);
            if plan.erred {
                continue;
            }
            for slot in 0..CODE_LENGTH {
                if plan.decisions[slot] == SlotDecision::Relocated {
                    assert_ne!(
                        plan.symbols[slot],
                        history[0].guess.symbols()[slot],
                        "relocated symbol landed back in its old slot"
                    );
                }
            }
        }
    }

    #[test]
    fn test_error_path_is_tagged() {
        let mut rng = SmallRng::seed_from_u64(17);
        let history = vec![record([0, 1, 2, 3], 3, 0)];

        // Rookie errs 25% of the time; over 1000 plans both paths appear.
        let mut erred = 0;
        for _ in 0..1000 {
            if plan_guess(SkillTier::Rookie, &history, &mut rng).erred {
                erred += 1;
            }
        }
        assert!(erred > 0);
        assert!(erred < 1000);
    }

    #[test]
    fn test_error_rate_tracks_configuration() {
        // Over 20,000 plans the observed erring fraction lands within two
        // points of each tier's configured rate (binomial stddev here is
        // about 0.003 at the worst case).
        let history = vec![record([0, 1, 2, 3], 1, 1)];
        let plans = 20_000u32;

        for tier in SkillTier::ALL {
            let mut rng = SmallRng::seed_from_u64(31);
            let erred = (0..plans)
                .filter(|_| plan_guess(tier, &history, &mut rng).erred)
                .count();
            let observed = erred as f64 / f64::from(plans);
            assert!(
                (observed - tier.error_rate()).abs() < 0.02,
                "{tier:?} erred at {observed:.3}, configured {:.3}",
                tier.error_rate()
            );
        }
    }

    #[test]
    fn test_first_guess_with_no_history() {
        let mut rng = SmallRng::seed_from_u64(19);
        for tier in SkillTier::ALL {
            let plan = plan_guess(tier, &[], &mut rng);
            for &symbol in &plan.symbols {
                assert!(usize::from(symbol) < CATALOG_SIZE);
            }
        }
    }
}
