//! Traits implemented by materialized values.

pub mod dispose;

pub use dispose::{Dispose, TryDispose};
