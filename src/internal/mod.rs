//! Internal implementation details.

pub(crate) mod dispose_bag;
pub(crate) mod fault;
pub(crate) mod reentry;

pub use fault::{FaultKind, ResolutionFault};
pub(crate) use dispose_bag::{DisposeBag, Teardown};
pub(crate) use fault::{catch_fault, raise};
pub(crate) use reentry::ActiveGuard;

use std::any::Any;
use std::sync::Arc;

/// Type-erased storage for a cached product.
///
/// A product of type `T` is always stored as an `Arc<Arc<T>>` behind this
/// alias so unsized products (`Arc<dyn Trait>`) fit the same slot.
pub(crate) type AnyArc = Arc<dyn Any + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type Map<K, V> = ahash::AHashMap<K, V>;
#[cfg(not(feature = "ahash"))]
pub(crate) type Map<K, V> = std::collections::HashMap<K, V>;
