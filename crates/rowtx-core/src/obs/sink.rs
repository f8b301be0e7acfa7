//! Event sink boundary.
//!
//! Engine code MUST NOT touch `obs::metrics` directly. All instrumentation
//! flows through [`ExecEvent`] and [`EventSink`]; this module is the only
//! bridge between execution logic and the counter state.

use crate::obs::metrics;
use std::cell::RefCell;

thread_local! {
    static SINK_OVERRIDE: RefCell<Option<*const dyn EventSink>> = RefCell::new(None);
}

///
/// ExecEvent
///

#[derive(Clone, Copy, Debug)]
pub enum ExecEvent {
    TxStart {
        name: &'static str,
    },
    TxFinish {
        name: &'static str,
        ok: bool,
    },
    ValidationFailed {
        field: &'static str,
    },
    ReferenceMiss {
        entity: &'static str,
    },
    LockRetry {
        table: &'static str,
        attempt: u32,
    },
    LockExhausted {
        table: &'static str,
        attempts: u32,
    },
    RowUpdated {
        table: &'static str,
    },
    RowsDeleted {
        table: &'static str,
        rows: u64,
    },
}

///
/// EventSink
///

pub trait EventSink {
    fn record(&self, event: ExecEvent);
}

///
/// CounterSink
/// Default sink that writes into the thread-local counter state.
///

pub(crate) struct CounterSink;

impl EventSink for CounterSink {
    fn record(&self, event: ExecEvent) {
        metrics::with_state_mut(|m| m.apply(event));
    }
}

pub(crate) const COUNTER_SINK: CounterSink = CounterSink;

pub(crate) fn record(event: ExecEvent) {
    let override_ptr = SINK_OVERRIDE.with(|cell| *cell.borrow());

    if let Some(ptr) = override_ptr {
        // SAFETY:
        // - `ptr` was produced from a valid `&dyn EventSink` in
        //   `with_event_sink`, which restores the previous slot on every
        //   exit, including unwind, so `ptr` cannot dangle here.
        // - Only a shared reference is materialized and it never outlives
        //   this synchronous call.
        unsafe { (&*ptr).record(event) };
    } else {
        COUNTER_SINK.record(event);
    }
}

/// Run a closure with a temporary event sink override.
pub fn with_event_sink<T>(sink: &dyn EventSink, f: impl FnOnce() -> T) -> T {
    struct Guard(Option<*const dyn EventSink>);

    impl Drop for Guard {
        fn drop(&mut self) {
            SINK_OVERRIDE.with(|cell| {
                *cell.borrow_mut() = self.0;
            });
        }
    }

    // SAFETY:
    // - The erased pointer is installed only for this dynamic scope.
    // - `Guard` restores the previous slot on all exits, including panic.
    // - `record` dereferences synchronously and never persists the pointer.
    let sink_ptr = unsafe { std::mem::transmute::<&dyn EventSink, *const dyn EventSink>(sink) };
    let prev = SINK_OVERRIDE.with(|cell| {
        let mut slot = cell.borrow_mut();
        slot.replace(sink_ptr)
    });
    let _guard = Guard(prev);

    f()
}
