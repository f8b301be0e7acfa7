use super::*;
use crate::{
    error::Error,
    obs::{EventSink, ExecEvent, with_event_sink},
    session::SessionContext,
    store::{
        IndexDef, MemStore, Predicate, ProbeSpec, ReadSpec, RecordKey, RecordStore, Row,
        StoreError, StoreFault, TableDef, UpdateFn, VisitFn,
    },
};
use std::{
    sync::{
        Mutex,
        atomic::{AtomicU32, AtomicU64, Ordering},
        mpsc::{self, Sender},
    },
    thread,
    time::Duration,
};
use time::{Date, Month};

static PICK_LINES: TableDef = TableDef {
    name: "pick_lines",
    indexes: &[IndexDef {
        name: "K1",
        fields: &["CONO", "ORNO", "DLIX", "PONR", "POSX"],
        unique: true,
    }],
};

static LEDGER_ROWS: TableDef = TableDef {
    name: "ledger_rows",
    indexes: &[IndexDef {
        name: "K1",
        fields: &["CONO", "DIVI", "TRDT", "SEQN"],
        unique: true,
    }],
};

fn session() -> SessionContext {
    let date = Date::from_calendar_date(2023, Month::October, 10).expect("valid date");
    SessionContext::new(100, "TESTUSR", date)
}

fn line_row() -> Row {
    Row::new()
        .with("CONO", 100)
        .with("ORNO", "ORD1")
        .with("DLIX", 500)
        .with("PONR", 10)
        .with("POSX", "1")
        .with("BOPC", "A0")
}

fn line_key() -> RecordKey {
    RecordKey::new()
        .field(100)
        .field("ORD1")
        .field(500)
        .field(10)
        .field("1")
}

fn line_spec() -> ReadSpec {
    ReadSpec::new(PICK_LINES.name, "K1").key(line_key())
}

fn line_store() -> MemStore {
    let store = MemStore::new();
    store.register(&PICK_LINES).expect("register");
    store.insert(PICK_LINES.name, line_row()).expect("seed");
    store
}

fn ledger_row(seq: i64, voucher: i64) -> Row {
    Row::new()
        .with("CONO", 100)
        .with("DIVI", "DEN")
        .with("TRDT", 20_231_010)
        .with("SEQN", seq)
        .with("VONO", voucher)
}

fn ledger_store() -> MemStore {
    let store = MemStore::new();
    store.register(&LEDGER_ROWS).expect("register");
    for seq in 1..=3 {
        store
            .insert(LEDGER_ROWS.name, ledger_row(seq, 12_345))
            .expect("seed");
    }
    store
        .insert(LEDGER_ROWS.name, ledger_row(4, 99_999))
        .expect("seed");
    store
}

fn voucher_spec(voucher: i64) -> ReadSpec {
    ReadSpec::new(LEDGER_ROWS.name, "K1")
        .key(RecordKey::new().field(100).field("DEN").field(20_231_010))
        .filter(Predicate::eq("VONO", voucher))
}

///
/// RetrySpy
/// Event sink counting lock-retry accounting for one invocation.
///

#[derive(Default)]
struct RetrySpy {
    retries: AtomicU64,
    exhaustions: AtomicU64,
    release_on_first_retry: Mutex<Option<Sender<()>>>,
}

impl EventSink for RetrySpy {
    fn record(&self, event: ExecEvent) {
        match event {
            ExecEvent::LockRetry { .. } => {
                if self.retries.fetch_add(1, Ordering::SeqCst) == 0
                    && let Ok(mut slot) = self.release_on_first_retry.lock()
                    && let Some(release) = slot.take()
                {
                    release.send(()).expect("release");
                }
            }
            ExecEvent::LockExhausted { .. } => {
                self.exhaustions.fetch_add(1, Ordering::SeqCst);
            }
            _ => {}
        }
    }
}

///
/// FlakyStore
/// Store wrapper refusing the first N locked calls with `Busy`.
///

struct FlakyStore<'a> {
    inner: &'a MemStore,
    busy_left: AtomicU32,
}

impl<'a> FlakyStore<'a> {
    fn new(inner: &'a MemStore, busy: u32) -> Self {
        Self {
            inner,
            busy_left: AtomicU32::new(busy),
        }
    }

    fn busy(&self) -> bool {
        self.busy_left
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |n| n.checked_sub(1))
            .is_ok()
    }
}

impl RecordStore for FlakyStore<'_> {
    fn probe(&self, spec: &ProbeSpec) -> Result<bool, StoreFault> {
        self.inner.probe(spec)
    }

    fn update_locked(&self, spec: &ReadSpec, apply: UpdateFn<'_>) -> Result<bool, StoreError> {
        if self.busy() {
            return Err(StoreError::Busy {
                table: spec.table,
                key: spec.key.clone(),
            });
        }
        self.inner.update_locked(spec, apply)
    }

    fn visit_locked(&self, spec: &ReadSpec, visit: VisitFn<'_>) -> Result<(), StoreError> {
        if self.busy() {
            return Err(StoreError::Busy {
                table: spec.table,
                key: spec.key.clone(),
            });
        }
        self.inner.visit_locked(spec, visit)
    }
}

// ---------------------------------------------------------------------
// Update
// ---------------------------------------------------------------------

#[test]
fn update_applies_business_fields_and_stamps_once() {
    let store = line_store();
    let executor = UpdateExecutor::new(&store, RetryPolicy::new());

    executor
        .execute(&session(), &line_spec(), &mut |row| {
            let mut next = row.clone();
            next.set("BOPC", "X1");
            next
        })
        .expect("update");

    let row = store
        .get(PICK_LINES.name, &line_key())
        .expect("read")
        .expect("row present");
    assert_eq!(row.text("BOPC"), Some("X1"));
    assert_eq!(row.int(crate::store::row::FIELD_CHANGE_SEQ), Some(1));
    assert_eq!(row.int(crate::store::row::FIELD_MODIFIED_DATE), Some(20_231_010));
    assert_eq!(row.text(crate::store::row::FIELD_MODIFIED_BY), Some("TESTUSR"));
}

#[test]
fn update_missing_row_is_not_found() {
    let store = line_store();
    let executor = UpdateExecutor::new(&store, RetryPolicy::new());
    let spec = ReadSpec::new(PICK_LINES.name, "K1").key(
        RecordKey::new()
            .field(100)
            .field("ORD9")
            .field(500)
            .field(10)
            .field("1"),
    );

    let err = executor
        .execute(&session(), &spec, &mut |row| row.clone())
        .expect_err("must fail");
    assert!(matches!(
        err,
        Error::Mutation(MutationError::NotFound { table: "pick_lines" })
    ));
}

#[test]
fn update_retries_through_transient_contention() {
    let store = line_store();
    let flaky = FlakyStore::new(&store, 2);
    let executor = UpdateExecutor::new(&flaky, RetryPolicy::new().attempts(3).backoff(Duration::ZERO));
    let spy = RetrySpy::default();

    with_event_sink(&spy, || {
        executor.execute(&session(), &line_spec(), &mut |row| {
            let mut next = row.clone();
            next.set("BOPC", "X1");
            next
        })
    })
    .expect("third attempt succeeds");

    assert_eq!(spy.retries.load(Ordering::SeqCst), 2);
    assert_eq!(spy.exhaustions.load(Ordering::SeqCst), 0);
}

#[test]
fn update_lock_budget_exhaustion_surfaces_lock_error() {
    let store = line_store();
    store.grab_lock_for_tests(PICK_LINES.name, &line_key());

    let executor = UpdateExecutor::new(&store, RetryPolicy::new().attempts(3).backoff(Duration::ZERO));
    let spy = RetrySpy::default();

    let err = with_event_sink(&spy, || {
        executor.execute(&session(), &line_spec(), &mut |row| row.clone())
    })
    .expect_err("must exhaust");

    assert!(matches!(
        err,
        Error::Mutation(MutationError::Lock {
            table: "pick_lines",
            attempts: 3
        })
    ));
    assert_eq!(spy.retries.load(Ordering::SeqCst), 2);
    assert_eq!(spy.exhaustions.load(Ordering::SeqCst), 1);

    // The row is untouched and updatable once the holder lets go.
    store.release_lock_for_tests(PICK_LINES.name, &line_key());
    let row = store
        .get(PICK_LINES.name, &line_key())
        .expect("read")
        .expect("row present");
    assert_eq!(row.change_seq(), 0);
}

// ---------------------------------------------------------------------
// Delete
// ---------------------------------------------------------------------

#[test]
fn delete_counts_only_predicate_matches() {
    let store = ledger_store();
    let executor = DeleteExecutor::new(&store, RetryPolicy::new());

    let deleted = executor.execute(&voucher_spec(12_345)).expect("delete");
    assert_eq!(deleted, 3);
    assert_eq!(store.count(LEDGER_ROWS.name).expect("count"), 1);

    // Re-running the same delete is a success with count 0.
    let deleted = executor.execute(&voucher_spec(12_345)).expect("delete");
    assert_eq!(deleted, 0);
}

#[test]
fn delete_with_no_matches_is_success() {
    let store = ledger_store();
    let executor = DeleteExecutor::new(&store, RetryPolicy::new());

    let deleted = executor.execute(&voucher_spec(55_555)).expect("delete");
    assert_eq!(deleted, 0);
    assert_eq!(store.count(LEDGER_ROWS.name).expect("count"), 4);
}

#[test]
fn delete_keeps_earlier_deletions_when_budget_exhausts() {
    let store = ledger_store();
    let held = RecordKey::new()
        .field(100)
        .field("DEN")
        .field(20_231_010)
        .field(2);
    store.grab_lock_for_tests(LEDGER_ROWS.name, &held);

    let executor = DeleteExecutor::new(&store, RetryPolicy::new().attempts(2).backoff(Duration::ZERO));
    let err = executor.execute(&voucher_spec(12_345)).expect_err("must exhaust");
    assert!(matches!(
        err,
        Error::Mutation(MutationError::Lock {
            table: "ledger_rows",
            attempts: 2
        })
    ));

    // The first row fell before the contended one; it stays deleted.
    assert_eq!(store.count(LEDGER_ROWS.name).expect("count"), 3);

    store.release_lock_for_tests(LEDGER_ROWS.name, &held);
    let deleted = executor.execute(&voucher_spec(12_345)).expect("delete");
    assert_eq!(deleted, 2);
    assert_eq!(store.count(LEDGER_ROWS.name).expect("count"), 1);
}

#[test]
fn delete_count_stays_exact_across_retries() {
    let store = ledger_store();
    let held = RecordKey::new()
        .field(100)
        .field("DEN")
        .field(20_231_010)
        .field(2);
    store.grab_lock_for_tests(LEDGER_ROWS.name, &held);

    let executor = DeleteExecutor::new(
        &store,
        RetryPolicy::new().attempts(50).backoff(Duration::from_millis(2)),
    );

    thread::scope(|scope| {
        let store_ref = &store;
        let held_ref = &held;
        scope.spawn(move || {
            thread::sleep(Duration::from_millis(20));
            store_ref.release_lock_for_tests(LEDGER_ROWS.name, held_ref);
        });

        let deleted = executor.execute(&voucher_spec(12_345)).expect("delete");
        assert_eq!(deleted, 3);
    });

    assert_eq!(store.count(LEDGER_ROWS.name).expect("count"), 1);
}

// ---------------------------------------------------------------------
// Concurrent contention
// ---------------------------------------------------------------------

#[test]
fn concurrent_updates_serialize_through_the_row_lock() {
    let store = line_store();
    let session = session();
    let policy = RetryPolicy::new().attempts(200).backoff(Duration::from_millis(2));

    let (started_tx, started_rx) = mpsc::channel();
    let (release_tx, release_rx) = mpsc::channel();

    let first_spy = RetrySpy::default();
    let second_spy = RetrySpy {
        release_on_first_retry: Mutex::new(Some(release_tx)),
        ..RetrySpy::default()
    };

    thread::scope(|scope| {
        let store_ref = &store;
        let session_ref = &session;
        let first = &first_spy;
        let second = &second_spy;

        // Holds the row lock inside its update callback until the other
        // invocation has observed contention at least once.
        scope.spawn(move || {
            with_event_sink(first, || {
                UpdateExecutor::new(store_ref, policy).execute(
                    session_ref,
                    &line_spec(),
                    &mut |row| {
                        started_tx.send(()).expect("signal start");
                        release_rx.recv().expect("wait for contention");
                        let mut next = row.clone();
                        next.set("BOPC", "AA");
                        next
                    },
                )
            })
            .expect("first invocation succeeds");
        });

        scope.spawn(move || {
            started_rx.recv().expect("lock holder running");
            with_event_sink(second, || {
                UpdateExecutor::new(store_ref, policy).execute(
                    session_ref,
                    &line_spec(),
                    &mut |row| {
                        let mut next = row.clone();
                        next.set("BOPC", "BB");
                        next
                    },
                )
            })
            .expect("second invocation succeeds after retrying");
        });
    });

    // One invocation went through on its first attempt, the other only
    // after retry accounting; neither overwrote silently.
    assert_eq!(first_spy.retries.load(Ordering::SeqCst), 0);
    assert!(second_spy.retries.load(Ordering::SeqCst) >= 1);

    let row = store
        .get(PICK_LINES.name, &line_key())
        .expect("read")
        .expect("row present");
    assert_eq!(row.text("BOPC"), Some("BB"));
    assert_eq!(row.change_seq(), 2);
}
