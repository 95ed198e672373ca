//! Teardown traits for cached values.

use std::fmt;

/// Infallible teardown.
///
/// Register the factory with [`Factory::disposable`](crate::Factory::disposable)
/// and the cached value is disposed on [`close_all`](crate::Materializer::close_all),
/// last created first.
///
/// # Examples
///
/// ```
/// use materialize::{Dispose, Factory, Materializer};
/// use std::sync::Arc;
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// struct Pool {
///     open: AtomicBool,
/// }
///
/// impl Dispose for Pool {
///     fn dispose(&self) {
///         self.open.store(false, Ordering::SeqCst);
///     }
/// }
///
/// let m = Materializer::new();
/// m.add(Factory::new(|| Arc::new(Pool { open: AtomicBool::new(true) })).disposable())
///     .unwrap();
///
/// let pool = m.materialize::<Pool>(&[]).unwrap();
/// m.close_all();
/// assert!(!pool.open.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    fn dispose(&self);
}

/// Fallible teardown.
///
/// A failure is written to the materializer's [`LogSink`](crate::LogSink)
/// and does not stop the remaining values from being closed.
///
/// # Examples
///
/// ```
/// use materialize::{Factory, Materializer, TryDispose};
/// use std::sync::{Arc, Mutex};
///
/// struct Journal;
///
/// impl TryDispose for Journal {
///     type Error = String;
///
///     fn try_dispose(&self) -> Result<(), String> {
///         Err("flush failed".to_string())
///     }
/// }
///
/// let lines = Arc::new(Mutex::new(Vec::<String>::new()));
/// let sink = lines.clone();
/// let m = Materializer::new().with_sink(move |msg: &str| sink.lock().unwrap().push(msg.to_string()));
/// m.add(Factory::new(|| Arc::new(Journal)).try_disposable()).unwrap();
///
/// m.materialize::<Journal>(&[]).unwrap();
/// m.close_all();
/// assert!(lines.lock().unwrap()[0].ends_with("Journal.close: flush failed"));
/// ```
pub trait TryDispose: Send + Sync + 'static {
    type Error: fmt::Display;

    fn try_dispose(&self) -> Result<(), Self::Error>;
}
