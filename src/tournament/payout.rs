//! Payout ladder: a fixed schedule of in-the-money positions scaled to the
//! actual pool.
//!
//! The canonical schedule pays the top 25 positions of a 100-player field,
//! with weights in basis points that sum to 10,000. For any other field
//! size the paid band is a quarter of the field (at least one position) and
//! each paid rank takes the canonical weight at `ceil(rank * 25 / paid)`,
//! collapsing bands for small fields and stretching them for large ones.
//! Prizes are renormalized against the sum of mapped weights with floor
//! division, so the sum of prizes never exceeds the pool; residual cents
//! stay with the house.

use serde::{Deserialize, Serialize};

use crate::Cents;

/// Paid positions in the canonical 100-player field.
const CANONICAL_PAID: u64 = 25;

/// Per-position weights in basis points for the canonical field.
/// Largest share to rank 1, non-increasing down the ladder; sums to 10,000.
const CANONICAL_WEIGHTS_BP: [u64; 25] = [
    2800, 1700, 1100, 800, 600, // ranks 1-5
    300, 300, 300, 300, 300, // ranks 6-10
    160, 160, 160, 160, 160, // ranks 11-15
    70, 70, 70, 70, 70, 70, 70, 70, 70, 70, // ranks 16-25
];

/// A run of consecutive ranks paid the same prize.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayoutBand {
    /// First rank in the band (1-based).
    pub first_rank: u32,
    /// Last rank in the band, inclusive.
    pub last_rank: u32,
    /// Prize for each rank in the band.
    pub prize_each: Cents,
}

/// Total prize pool for a field: `(buy_in - rake) x entrants`.
///
/// The rake is carved out per entrant before pooling; a rake larger than
/// the buy-in contributes nothing rather than underflowing.
#[must_use]
pub fn pool_size(buy_in: Cents, rake: Cents, entrants: u32) -> Cents {
    buy_in
        .saturating_sub(rake)
        .saturating_mul(Cents::from(entrants))
}

/// Number of in-the-money positions for a field of the given size.
///
/// A quarter of the field, floored, but never less than one and never more
/// than the field itself.
#[must_use]
pub fn paid_positions(entrants: u32) -> u32 {
    (entrants / 4).clamp(1, entrants.max(1))
}

/// Canonical weight for a paid rank in a field with `paid` positions.
fn mapped_weight(rank: u32, paid: u32) -> u64 {
    // ceil(rank * 25 / paid), clamped into the canonical table.
    let band = (u64::from(rank) * CANONICAL_PAID).div_ceil(u64::from(paid));
    let index = band.clamp(1, CANONICAL_PAID) - 1;
    CANONICAL_WEIGHTS_BP[usize::try_from(index).unwrap_or(0)]
}

/// Prize for a single rank (1-based) in a field of `entrants` with the
/// given pool. Ranks outside the paid band earn zero.
#[must_use]
pub fn prize_for_rank(rank: u32, entrants: u32, pool: Cents) -> Cents {
    if rank == 0 || entrants == 0 {
        return 0;
    }
    let paid = paid_positions(entrants);
    if rank > paid {
        return 0;
    }

    let weight_sum: u64 = (1..=paid).map(|r| mapped_weight(r, paid)).sum();
    if weight_sum == 0 {
        return 0;
    }

    // u128 intermediate: pool * weight can exceed u64.
    let share = u128::from(pool) * u128::from(mapped_weight(rank, paid)) / u128::from(weight_sum);
    u64::try_from(share).unwrap_or(u64::MAX)
}

/// The complete `(rank range, prize each)` table for a field and pool.
///
/// Display-only companion to [`prize_for_rank`]; the last band covers the
/// unpaid ranks with a zero prize.
#[must_use]
pub fn describe_ladder(entrants: u32, pool: Cents) -> Vec<PayoutBand> {
    if entrants == 0 {
        return Vec::new();
    }

    let mut bands: Vec<PayoutBand> = Vec::new();
    for rank in 1..=entrants {
        let prize = prize_for_rank(rank, entrants, pool);
        match bands.last_mut() {
            Some(band) if band.prize_each == prize => band.last_rank = rank,
            _ => bands.push(PayoutBand {
                first_rank: rank,
                last_rank: rank,
                prize_each: prize,
            }),
        }
    }
    bands
}

/// Kani formal verification proofs.
///
/// Run with: `cargo kani`
#[cfg(kani)]
mod kani_proofs {
    use super::*;

    /// Prove the canonical weight table is non-increasing and sums to
    /// 10,000 basis points.
    #[kani::proof]
    fn prove_canonical_weights_well_formed() {
        let mut sum = 0u64;
        for pair in CANONICAL_WEIGHTS_BP.windows(2) {
            assert!(pair[0] >= pair[1]);
        }
        for w in CANONICAL_WEIGHTS_BP {
            sum += w;
        }
        assert_eq!(sum, 10_000);
    }

    /// Prove that no single prize exceeds the pool.
    #[kani::proof]
    fn prove_prize_bounded_by_pool() {
        let rank: u32 = kani::any();
        let entrants: u32 = kani::any();
        let pool: u64 = kani::any();
        kani::assume(entrants <= 1000);
        kani::assume(rank <= entrants);

        let prize = prize_for_rank(rank, entrants, pool);
        assert!(prize <= pool);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_canonical_weights_sum_to_ten_thousand() {
        assert_eq!(CANONICAL_WEIGHTS_BP.iter().sum::<u64>(), 10_000);
    }

    #[test]
    fn test_pool_size() {
        assert_eq!(pool_size(1000, 100, 10), 9000);
        assert_eq!(pool_size(1000, 0, 4), 4000);
        // Rake above buy-in contributes nothing, never underflows.
        assert_eq!(pool_size(100, 200, 10), 0);
    }

    #[test]
    fn test_paid_positions() {
        assert_eq!(paid_positions(100), 25);
        assert_eq!(paid_positions(40), 10);
        assert_eq!(paid_positions(4), 1);
        assert_eq!(paid_positions(3), 1);
        assert_eq!(paid_positions(1), 1);
    }

    #[test]
    fn test_winner_take_all_small_field() {
        // 4 entrants: one paid position takes the whole pool.
        let pool = 3600;
        assert_eq!(prize_for_rank(1, 4, pool), pool);
        assert_eq!(prize_for_rank(2, 4, pool), 0);
    }

    #[test]
    fn test_canonical_field_top_prize_share() {
        let pool = 1_000_000;
        // Rank 1 of 100 takes 2,800 of 10,000 basis points.
        assert_eq!(prize_for_rank(1, 100, pool), 280_000);
        assert_eq!(prize_for_rank(25, 100, pool), 7_000);
        assert_eq!(prize_for_rank(26, 100, pool), 0);
    }

    #[test]
    fn test_prizes_never_exceed_pool() {
        for entrants in [1u32, 2, 3, 4, 7, 10, 40, 100, 250, 1000] {
            for pool in [0u64, 1, 99, 10_000, 1_000_003] {
                let total: u64 = (1..=entrants)
                    .map(|r| prize_for_rank(r, entrants, pool))
                    .sum();
                assert!(
                    total <= pool,
                    "field {entrants} pool {pool} paid {total}"
                );
            }
        }
    }

    #[test]
    fn test_prizes_monotonically_non_increasing() {
        for entrants in [2u32, 5, 13, 40, 100, 400] {
            let pool = 999_999;
            let mut previous = Cents::MAX;
            for rank in 1..=entrants {
                let prize = prize_for_rank(rank, entrants, pool);
                assert!(
                    prize <= previous,
                    "rank {rank} of {entrants} pays {prize} > {previous}"
                );
                previous = prize;
            }
        }
    }

    #[test]
    fn test_large_field_stretches_bands() {
        // 400 entrants pay 100 positions; the ladder still covers them all
        // with non-zero prizes at the bottom of the paid band.
        let pool = 10_000_000;
        assert_eq!(paid_positions(400), 100);
        assert!(prize_for_rank(100, 400, pool) > 0);
        assert_eq!(prize_for_rank(101, 400, pool), 0);
    }

    #[test]
    fn test_describe_ladder_matches_prizes() {
        let entrants = 40;
        let pool = 123_456;
        let bands = describe_ladder(entrants, pool);

        // Bands tile the field exactly.
        assert_eq!(bands[0].first_rank, 1);
        assert_eq!(bands.last().unwrap().last_rank, entrants);
        for pair in bands.windows(2) {
            assert_eq!(pair[0].last_rank + 1, pair[1].first_rank);
            assert!(pair[0].prize_each > pair[1].prize_each);
        }

        for band in &bands {
            for rank in band.first_rank..=band.last_rank {
                assert_eq!(prize_for_rank(rank, entrants, pool), band.prize_each);
            }
        }
    }

    #[test]
    fn test_zero_pool_pays_nothing() {
        for rank in 1..=10 {
            assert_eq!(prize_for_rank(rank, 10, 0), 0);
        }
    }

    #[test]
    fn test_empty_field_describes_empty_ladder() {
        assert!(describe_ladder(0, 1000).is_empty());
        assert_eq!(prize_for_rank(1, 0, 1000), 0);
    }
}
