//! Integration tests for the settlement saga.
//!
//! Atomicity is exercised with a fault-injecting ledger wrapper that fails
//! on the nth mutation: whatever step fails, the balances must come out
//! exactly as they went in.

#![allow(missing_docs)]
#![allow(clippy::unwrap_used)]

use coderace::settlement::{
    Account, GameRecord, Ledger, LedgerError, MemoryLedger, SettlementError, SettlementService,
    ValidateRequest,
};

fn base_commit() -> coderace::settlement::CommitRequest {
    coderace::settlement::CommitRequest {
        player_id: 1,
        buy_in: 1_000,
        rake: 100,
        bot_count: 7,
        final_rank: 1,
        player_prize: 7_200,
        bot_prizes_total: 0,
        attempts: 4,
        score: 950,
        time_remaining_secs: Some(180),
        won: true,
    }
}

/// Ledger decorator that fails the nth mutation with a storage error, then
/// behaves normally. Exactly one failure, so compensating reversals go
/// through. Reads always pass through.
#[derive(Debug)]
struct FlakyLedger {
    inner: MemoryLedger,
    fuse: Option<u32>,
}

impl FlakyLedger {
    fn new(inner: MemoryLedger, mutations_until_failure: u32) -> Self {
        Self {
            inner,
            fuse: Some(mutations_until_failure),
        }
    }

    fn trip(&mut self) -> Result<(), LedgerError> {
        if let Some(n) = self.fuse.as_mut() {
            if *n == 0 {
                self.fuse = None;
                return Err(LedgerError::Snapshot("injected fault".to_owned()));
            }
            *n -= 1;
        }
        Ok(())
    }
}

impl Ledger for FlakyLedger {
    fn balance(&self, account: Account) -> Result<u64, LedgerError> {
        self.inner.balance(account)
    }

    fn debit(&mut self, account: Account, amount: u64) -> Result<(), LedgerError> {
        self.trip()?;
        self.inner.debit(account, amount)
    }

    fn credit(&mut self, account: Account, amount: u64) -> Result<(), LedgerError> {
        self.trip()?;
        self.inner.credit(account, amount)
    }

    fn record_game(&mut self, record: GameRecord) -> Result<(), LedgerError> {
        self.trip()?;
        self.inner.record_game(record)
    }
}

fn funded() -> MemoryLedger {
    let mut ledger = MemoryLedger::new();
    ledger.fund_player(1, 25_000);
    ledger.fund_bot_pool(200_000);
    ledger
}

#[test]
fn test_failure_at_every_step_leaves_balances_untouched() {
    // The saga issues 5 balance mutations, then one history write. Fail
    // each one in turn.
    for failing_step in 0..6 {
        let flaky = FlakyLedger::new(funded(), failing_step);
        let service = SettlementService::new(flaky);
        let before = service.totals(1).unwrap();

        let err = service.commit(&base_commit()).unwrap_err();
        assert!(
            matches!(err, SettlementError::Ledger(LedgerError::Snapshot(_))),
            "step {failing_step}: unexpected error {err}"
        );

        assert_eq!(
            service.totals(1).unwrap(),
            before,
            "step {failing_step}: total value changed after a failed commit"
        );

        let ledger = service.into_ledger();
        assert_eq!(
            ledger.balance(Account::Player(1)).unwrap(),
            25_000,
            "step {failing_step}: player balance not restored"
        );
        assert_eq!(
            ledger.balance(Account::BotPool).unwrap(),
            200_000,
            "step {failing_step}: bot pool not restored"
        );
        assert_eq!(
            ledger.balance(Account::RakePool).unwrap(),
            0,
            "step {failing_step}: rake pool not restored"
        );
        assert!(
            ledger.inner.records().is_empty(),
            "step {failing_step}: record survived a rolled-back commit"
        );
    }
}

#[test]
fn test_commit_succeeds_once_faults_are_past() {
    // 6 mutations in a full commit; a fuse longer than that never blows.
    let flaky = FlakyLedger::new(funded(), 6);
    let service = SettlementService::new(flaky);

    let new_balance = service.commit(&base_commit()).unwrap();
    assert_eq!(new_balance, 25_000 - 1_000 + 7_200);
}

#[test]
fn test_zero_sum_across_many_commits() {
    let mut ledger = MemoryLedger::new();
    ledger.fund_player(1, 50_000);
    ledger.fund_bot_pool(500_000);
    let service = SettlementService::new(ledger);
    let before = service.totals(1).unwrap();

    // A mix of wins, losses, and mid-field finishes.
    let outcomes = [
        (1, 7_200, true, Some(120)),
        (8, 0, false, Some(0)),
        (4, 0, false, Some(33)),
        (1, 7_200, true, Some(200)),
        (2, 0, false, Some(90)),
    ];
    for (rank, prize, won, time) in outcomes {
        let request = coderace::settlement::CommitRequest {
            final_rank: rank,
            player_prize: prize,
            won,
            time_remaining_secs: time,
            ..base_commit()
        };
        service.commit(&request).unwrap();
    }

    assert_eq!(
        service.totals(1).unwrap(),
        before,
        "value was created or destroyed across commits"
    );

    let ledger = service.into_ledger();
    assert_eq!(ledger.records().len(), 5);
    let stats = ledger.stats(1).unwrap();
    assert_eq!(stats.races_played, 5);
    assert_eq!(stats.wins, 2);
    assert_eq!(stats.best_time_remaining_secs, 200);
}

#[test]
fn test_validate_commit_full_cycle_with_persistence() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("ledger.json");

    let service = SettlementService::new(funded());
    let pool = service
        .validate(&ValidateRequest {
            player_id: 1,
            buy_in: 1_000,
            rake: 100,
            bot_count: 7,
        })
        .unwrap();
    assert_eq!(pool, 7_200);

    service.commit(&base_commit()).unwrap();

    let ledger = service.into_ledger();
    ledger.save(&path).unwrap();
    let restored = MemoryLedger::load(&path).unwrap();
    assert_eq!(restored, ledger);
    assert_eq!(restored.balance(Account::Player(1)).unwrap(), 31_200);
}

#[test]
fn test_insufficient_player_rejected_before_any_mutation() {
    let mut ledger = MemoryLedger::new();
    ledger.fund_player(1, 400);
    ledger.fund_bot_pool(100_000);
    // A zero fuse would fail the first mutation, but the funding check
    // rejects the commit before any mutation is attempted.
    let flaky = FlakyLedger::new(ledger, 0);
    let service = SettlementService::new(flaky);

    let err = service.commit(&base_commit()).unwrap_err();
    assert_eq!(err, SettlementError::InsufficientFunds { shortfall: 600 });
}
