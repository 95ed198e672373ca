//! Process-wide default materializer.
//!
//! Convenience for applications wired once at start-up. Libraries should
//! take a [`Materializer`] instead.
//!
//! ```
//! use materialize::{global, Factory};
//! use std::sync::Arc;
//!
//! struct AppName(&'static str);
//!
//! global::must_add(Factory::new(|| Arc::new(AppName("demo"))));
//! assert_eq!(global::materialize::<AppName>(&[]).unwrap().0, "demo");
//! global::close_all();
//! ```

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::error::Result;
use crate::factory::Factory;
use crate::materializer::Materializer;

static DEFAULT: Lazy<Materializer> = Lazy::new(Materializer::new);

/// The shared default materializer.
pub fn default_materializer() -> &'static Materializer {
    &DEFAULT
}

/// Registers a factory with the default materializer.
pub fn add<T>(factory: Factory<T>) -> Result<()>
where
    T: ?Sized + Send + Sync + 'static,
{
    DEFAULT.add(factory)
}

/// Registers a factory with the default materializer, panicking on a duplicate.
pub fn must_add<T>(factory: Factory<T>)
where
    T: ?Sized + Send + Sync + 'static,
{
    DEFAULT.must_add(factory);
}

/// See [`Materializer::materialize`].
pub fn materialize<T>(tags: &[&str]) -> Result<Arc<T>>
where
    T: Send + Sync + 'static,
{
    DEFAULT.materialize(tags)
}

/// See [`Materializer::materialize_dyn`].
pub fn materialize_dyn<C>(tags: &[&str]) -> Result<Arc<C>>
where
    C: ?Sized + Send + Sync + 'static,
{
    DEFAULT.materialize_dyn(tags)
}

/// See [`Materializer::close_all`].
pub fn close_all() {
    DEFAULT.close_all();
}
