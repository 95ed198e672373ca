//! # materialize
//!
//! Lazy, tag-qualified object-graph materialization for Rust.
//!
//! Register factories for the types your application needs, then ask for a
//! type. The materializer picks the best factory for the request, builds the
//! value on first use (recursively building its dependencies), caches it and
//! returns the same `Arc` for every later request.
//!
//! ## Features
//!
//! - **Lazy and cached**: each factory runs at most once until `close_all`
//! - **Tags**: several factories per type, selected by best tag match
//! - **Capabilities**: request a `dyn Trait` and get any type declared to provide it
//! - **Circular references**: early binding through [`Context::resolve`]
//! - **Ordered teardown**: disposable values are torn down last-built first
//!
//! ## Quick Start
//!
//! ```rust
//! use materialize::{Context, Factory, Materializer};
//! use std::sync::Arc;
//!
//! struct Database {
//!     url: String,
//! }
//!
//! struct UserService {
//!     db: Arc<Database>,
//! }
//!
//! let m = Materializer::new();
//! m.add(Factory::new(|| Arc::new(Database { url: "postgres://primary".into() })).tags(["primary"]))
//!     .unwrap();
//! m.add(Factory::new(|| Arc::new(Database { url: "postgres://replica".into() })).tags(["replica"]))
//!     .unwrap();
//! m.add(Factory::with_context(|cx: &mut Context<'_>| -> materialize::Result<_> {
//!     Ok(Arc::new(UserService { db: cx.materialize::<Database>(&["replica"])? }))
//! }))
//! .unwrap();
//!
//! let users = m.materialize::<UserService>(&[]).unwrap();
//! assert_eq!(users.db.url, "postgres://replica");
//! ```
//!
//! ## Tag Matching
//!
//! Every candidate is scored against the requested tags as
//! `100 * (1 + matched) - extraneous`, both counts capped at 99. The highest
//! score wins and a tie keeps the factory registered first. An untagged
//! factory therefore acts as the fallback for any query its type has no
//! better match for.
//!
//! ## Capabilities
//!
//! ```rust
//! use materialize::{Factory, Materializer};
//! use std::sync::Arc;
//!
//! trait Store: Send + Sync {
//!     fn name(&self) -> &'static str;
//! }
//!
//! struct Memory;
//! impl Store for Memory {
//!     fn name(&self) -> &'static str { "memory" }
//! }
//!
//! let m = Materializer::new();
//! m.add(Factory::new(|| Arc::new(Memory)).provides::<dyn Store>(|s| s as Arc<dyn Store>))
//!     .unwrap();
//!
//! let store = m.materialize_dyn::<dyn Store>(&[]).unwrap();
//! assert_eq!(store.name(), "memory");
//! // Concrete requests only ever see factories for that exact type.
//! assert!(m.materialize::<Memory>(&[]).is_ok());
//! ```
//!
//! ## Logging
//!
//! Resolution is traced through `tracing` (`debug` for factory invocations,
//! `trace` for scoring and cache hits). Teardown failures and undisposed
//! values are reported through a [`LogSink`], [`TracingSink`] by default.

pub mod context;
pub mod descriptors;
pub mod error;
pub mod factory;
pub mod global;
pub mod key;
pub mod materializer;
pub mod receiver;
pub mod repository;
pub mod sink;
pub mod tags;
pub mod traits;

mod cache;
mod internal;

pub use context::Context;
pub use descriptors::FactoryDescriptor;
pub use error::{Error, Result};
pub use factory::{BoxError, Factory, FactoryOutput};
pub use internal::{FaultKind, ResolutionFault};
pub use key::TypeKey;
pub use materializer::Materializer;
pub use receiver::Receiver;
pub use repository::Repository;
pub use sink::{LogSink, TracingSink};
pub use tags::TagSet;
pub use traits::{Dispose, TryDispose};
