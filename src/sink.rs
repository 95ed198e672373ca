//! Diagnostic sink for messages the materializer cannot return as errors.
//!
//! Teardown failures during [`close_all`](crate::Materializer::close_all) and
//! values dropped without being closed are reported here instead of being
//! propagated.

/// Receives best-effort diagnostics.
///
/// Any `Fn(&str) + Send + Sync` closure is a sink, which is handy in tests:
///
/// ```rust
/// use materialize::Materializer;
/// use std::sync::{Arc, Mutex};
///
/// let lines = Arc::new(Mutex::new(Vec::<String>::new()));
/// let captured = lines.clone();
/// let m = Materializer::new().with_sink(move |msg: &str| {
///     captured.lock().unwrap().push(msg.to_string());
/// });
/// m.close_all();
/// assert!(lines.lock().unwrap().is_empty());
/// ```
pub trait LogSink: Send + Sync {
    fn log(&self, message: &str);
}

impl<F> LogSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn log(&self, message: &str) {
        self(message)
    }
}

/// Process-default sink: forwards every message to `tracing` at warn level.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl LogSink for TracingSink {
    fn log(&self, message: &str) {
        tracing::warn!(target: "materialize", "{}", message);
    }
}
