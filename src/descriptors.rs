//! Factory descriptors for introspection and diagnostics.

use crate::tags::TagSet;

/// Snapshot of one registered factory.
///
/// # Examples
///
/// ```rust
/// use materialize::{Factory, Materializer};
/// use std::sync::Arc;
///
/// let m = Materializer::new();
/// m.add(Factory::new(|| Arc::new(5u16)).tags(["port"])).unwrap();
///
/// let before = m.descriptors();
/// assert_eq!(before[0].type_name, "u16");
/// assert!(before[0].tags.contains("port"));
/// assert!(!before[0].cached);
///
/// m.materialize::<u16>(&["port"]).unwrap();
/// assert!(m.descriptors()[0].cached);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct FactoryDescriptor {
    /// Produced type.
    pub type_name: &'static str,
    pub tags: TagSet,
    /// Capability types the produced type was declared to satisfy.
    pub capabilities: Vec<&'static str>,
    /// Whether the factory carries a teardown hook.
    pub disposable: bool,
    /// Whether an instance is currently cached. Always `false` for a
    /// descriptor taken from a bare [`Repository`](crate::Repository).
    pub cached: bool,
}
