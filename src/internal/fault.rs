//! Programming-error faults raised by misbehaving factories.
//!
//! A fault is raised as a panic carrying a [`ResolutionFault`] payload, so it
//! unwinds straight through every factory on the stack. The top-level entry
//! point catches exactly that payload and turns it into
//! [`Error::Fault`](crate::Error::Fault); any other panic keeps unwinding.

use std::fmt;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{Error, Result};

/// What a factory did wrong.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FaultKind {
    /// `Context::resolve` was called twice while building one value.
    AlreadyResolved,
    /// `Context::resolve` was handed a value of another type.
    ResolvedTypeMismatch {
        /// Type of the value passed to `resolve`.
        given: &'static str,
    },
    /// The factory returned a different value than the one it resolved.
    ReturnedOtherThanResolved,
    /// A cached or cast value did not have the expected type.
    ProductTypeMismatch,
    /// A factory called a blocking operation on the materializer that is
    /// running it. `type_name` is the materializer's own type here.
    Reentrant {
        /// The materializer method that was called.
        operation: &'static str,
    },
}

/// Panic payload (and error payload) for programming-error faults.
///
/// These are defects in a registered constructor, never runtime conditions,
/// and they are kept out of the recoverable error taxonomy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFault {
    /// Type whose construction went wrong.
    pub type_name: &'static str,
    pub kind: FaultKind,
}

impl fmt::Display for ResolutionFault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.kind {
            FaultKind::AlreadyResolved => {
                write!(f, "have resolved already {}", self.type_name)
            }
            FaultKind::ResolvedTypeMismatch { given } => write!(
                f,
                "unmatched type, required type is {} but resolved {}",
                self.type_name, given
            ),
            FaultKind::ReturnedOtherThanResolved => write!(
                f,
                "factory for {} returned a different value than it resolved",
                self.type_name
            ),
            FaultKind::ProductTypeMismatch => {
                write!(f, "product is not of type {}", self.type_name)
            }
            FaultKind::Reentrant { operation } => write!(
                f,
                "{}::{} called from inside one of its own factories",
                self.type_name, operation
            ),
        }
    }
}

impl std::error::Error for ResolutionFault {}

/// Aborts the current resolution path with a fault.
pub(crate) fn raise(type_name: &'static str, kind: FaultKind) -> ! {
    tracing::error!(type_name, ?kind, "factory misuse detected");
    panic::panic_any(ResolutionFault { type_name, kind })
}

/// Runs a resolution, converting a [`ResolutionFault`] panic into an error.
pub(crate) fn catch_fault<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T>,
{
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(result) => result,
        Err(payload) => match payload.downcast::<ResolutionFault>() {
            Ok(fault) => Err(Error::Fault(*fault)),
            Err(other) => panic::resume_unwind(other),
        },
    }
}
