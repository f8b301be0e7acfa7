pub mod metrics;
pub mod sink;

pub use sink::{EventSink, ExecEvent, with_event_sink};

pub(crate) use sink::record;
