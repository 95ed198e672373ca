//! Internal disposal bag for cached values that need teardown.

use std::panic::{self, AssertUnwindSafe};
use std::sync::Arc;

use super::AnyArc;
use crate::sink::LogSink;

/// Normalized teardown hook: runs the value's dispose operation and reports
/// failure as a message. Both `Dispose` and `TryDispose` end up as one of these.
pub(crate) type Teardown = Arc<dyn Fn(&AnyArc) -> Result<(), String> + Send + Sync>;

struct Disposer {
    type_name: &'static str,
    value: AnyArc,
    hook: Teardown,
}

/// Values awaiting teardown, in the order they were first cached.
#[derive(Default)]
pub(crate) struct DisposeBag {
    entries: Vec<Disposer>,
}

impl DisposeBag {
    pub(crate) fn push(&mut self, type_name: &'static str, value: AnyArc, hook: Teardown) {
        self.entries.push(Disposer { type_name, value, hook });
    }

    /// Tears down every value in reverse order (LIFO).
    ///
    /// Failures, including panics inside a dispose hook, are reported to
    /// `sink` and never stop the sweep.
    pub(crate) fn run_all_reverse(&mut self, sink: &dyn LogSink) {
        while let Some(disposer) = self.entries.pop() {
            let Disposer { type_name, value, hook } = disposer;
            tracing::debug!(type_name, "closing cached value");
            match panic::catch_unwind(AssertUnwindSafe(|| hook(&value))) {
                Ok(Ok(())) => {}
                Ok(Err(message)) => sink.log(&format!("failed to {type_name}.close: {message}")),
                Err(_) => sink.log(&format!("failed to {type_name}.close: panicked")),
            }
        }
    }

    pub(crate) fn len(&self) -> usize {
        self.entries.len()
    }
}
