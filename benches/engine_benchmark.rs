//! Benchmarks for the guess-evaluation hot path and full race simulation.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use std::hint::black_box;

use criterion::{Criterion, criterion_group, criterion_main};

use coderace::bot::{SkillTier, simulate_game};
use coderace::code::{Code, evaluate};
use coderace::round::RaceRules;
use coderace::tournament::{RaceConfig, simulate_race};
use rand::SeedableRng;
use rand::rngs::SmallRng;

fn bench_evaluate(c: &mut Criterion) {
    let secret = Code::new([0, 1, 2, 3]).unwrap();
    let guesses: Vec<Code> = [
        [0, 1, 2, 3],
        [3, 2, 1, 0],
        [0, 0, 0, 0],
        [4, 5, 4, 5],
        [1, 1, 2, 2],
    ]
    .into_iter()
    .map(|symbols| Code::new(symbols).unwrap())
    .collect();

    c.bench_function("evaluate_5_guesses", |b| {
        b.iter(|| {
            for guess in &guesses {
                let feedback = evaluate(black_box(&secret), black_box(guess));
                black_box(feedback);
            }
        });
    });
}

fn bench_bot_game(c: &mut Criterion) {
    let rules = RaceRules::default();

    c.bench_function("bot_game_elite", |b| {
        let mut rng = SmallRng::seed_from_u64(42);
        b.iter(|| {
            let outcome = simulate_game(black_box(SkillTier::Elite), rules, &mut rng);
            black_box(outcome)
        });
    });

    c.bench_function("bot_game_rookie", |b| {
        let mut rng = SmallRng::seed_from_u64(42);
        b.iter(|| {
            let outcome = simulate_game(black_box(SkillTier::Rookie), rules, &mut rng);
            black_box(outcome)
        });
    });
}

fn bench_full_race(c: &mut Criterion) {
    let config = RaceConfig::with_field(7, 1000, 100);

    c.bench_function("race_8_entrants", |b| {
        b.iter(|| {
            let standings =
                simulate_race(black_box(&config), black_box(42), SkillTier::Pro);
            black_box(standings)
        });
    });

    let big = RaceConfig::with_field(99, 1000, 100);
    c.bench_function("race_100_entrants", |b| {
        b.iter(|| {
            let standings = simulate_race(black_box(&big), black_box(42), SkillTier::Pro);
            black_box(standings)
        });
    });
}

criterion_group!(benches, bench_evaluate, bench_bot_game, bench_full_race);
criterion_main!(benches);
