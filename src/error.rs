//! Error types for the materializer.

use std::sync::Arc;

use thiserror::Error;

use crate::internal::ResolutionFault;
use crate::tags::TagSet;

/// Errors returned by registration and resolution.
///
/// Every variant except [`Error::Fault`] is a recoverable runtime condition.
/// `Fault` carries a defect in a registered constructor (double `resolve`,
/// resolving a value of the wrong type, ...) and should be fixed, not handled.
///
/// # Examples
///
/// ```rust
/// use materialize::{Error, Materializer};
///
/// struct Unregistered;
///
/// let m = Materializer::new();
/// match m.materialize::<Unregistered>(&[]) {
///     Err(Error::NotFound { type_name, .. }) => assert!(type_name.ends_with("Unregistered")),
///     other => panic!("unexpected: {:?}", other.map(|_| ())),
/// }
/// ```
#[derive(Debug, Clone, Error)]
pub enum Error {
    /// A factory with the same produced type and tag set is already registered.
    #[error("duplicated factory for type: {type_name} tags: {tags}")]
    DuplicateFactory { type_name: &'static str, tags: TagSet },

    /// No registered or assignable factory for the requested type.
    #[error("not found factories for: {type_name} (tags: {tags})")]
    NotFound { type_name: &'static str, tags: TagSet },

    /// The factory produced nothing (`None`).
    #[error("factory for {type_name} returned nil")]
    NilProduct { type_name: &'static str },

    /// The factory returned its own error.
    #[error("factory for {type_name} failed: {source}")]
    FactoryFailed {
        type_name: &'static str,
        source: Arc<dyn std::error::Error + Send + Sync>,
    },

    /// A cycle reached a factory that has not called `Context::resolve` yet.
    #[error("not resolved context for {type_name}: resolve it before materializing dependencies that refer back to it")]
    UnresolvedCircularReference { type_name: &'static str },

    /// The receiver slot cannot take a value (e.g. an already filled `OnceLock`).
    #[error("receiver for {type_name} is not settable")]
    InvalidReceiver { type_name: &'static str },

    /// A top-level resolution is already in flight on this materializer.
    #[error("busy or recursive materialization, use Context::materialize inside factories instead")]
    Busy,

    /// A dependency of `type_name` failed to materialize. `tags` are the
    /// query tags `type_name` itself was requested with.
    #[error("while materializing {type_name} (tags: {tags}): {source}")]
    Dependency {
        type_name: &'static str,
        tags: TagSet,
        source: Box<Error>,
    },

    /// A factory misused its context. Not a recoverable condition.
    #[error("resolution fault: {0}")]
    Fault(ResolutionFault),
}

impl Error {
    /// Strips the `Dependency` wrappers added while the error travelled up
    /// the factory chain and returns the original error.
    ///
    /// ```rust
    /// use materialize::{Error, TagSet};
    ///
    /// let nested = Error::Dependency {
    ///     type_name: "Outer",
    ///     tags: TagSet::empty(),
    ///     source: Box::new(Error::NilProduct { type_name: "Inner" }),
    /// };
    /// assert!(matches!(nested.root_cause(), Error::NilProduct { type_name: "Inner" }));
    /// ```
    pub fn root_cause(&self) -> &Error {
        let mut current = self;
        while let Error::Dependency { source, .. } = current {
            current = source;
        }
        current
    }

    /// Names of the types whose factories this error travelled through,
    /// outermost first.
    pub fn trail(&self) -> Vec<&'static str> {
        let mut trail = Vec::new();
        let mut current = self;
        while let Error::Dependency { type_name, source, .. } = current {
            trail.push(*type_name);
            current = source;
        }
        trail
    }

    /// Whether this is a programming-error fault rather than a runtime condition.
    pub fn is_fault(&self) -> bool {
        matches!(self.root_cause(), Error::Fault(_))
    }
}

/// Result type for materializer operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
