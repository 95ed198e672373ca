//! Slots that `materialize_into` can fill.

use std::sync::{Arc, OnceLock};

/// A writable slot for a materialized value.
///
/// Implemented for `&mut Option<Arc<T>>`, `&OnceLock<Arc<T>>` and
/// `&once_cell::sync::OnceCell<Arc<T>>`. The cell variants are what a value
/// resolved early (see [`Context::resolve`](crate::Context::resolve)) uses to
/// receive its dependencies after it has already been shared.
///
/// A slot that cannot take a value is reported as
/// [`Error::InvalidReceiver`](crate::Error::InvalidReceiver), and nothing is
/// materialized for it.
pub trait Receiver {
    /// Type of the value the slot holds.
    type Target: ?Sized + Send + Sync + 'static;

    /// Whether [`receive`](Receiver::receive) would succeed right now.
    fn is_settable(&self) -> bool;

    /// Stores `value`, handing it back if the slot was filled in the meantime.
    fn receive(self, value: Arc<Self::Target>) -> Result<(), Arc<Self::Target>>;
}

impl<T> Receiver for &mut Option<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    type Target = T;

    fn is_settable(&self) -> bool {
        true
    }

    fn receive(self, value: Arc<T>) -> Result<(), Arc<T>> {
        *self = Some(value);
        Ok(())
    }
}

impl<T> Receiver for &OnceLock<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    type Target = T;

    fn is_settable(&self) -> bool {
        self.get().is_none()
    }

    fn receive(self, value: Arc<T>) -> Result<(), Arc<T>> {
        self.set(value)
    }
}

impl<T> Receiver for &once_cell::sync::OnceCell<Arc<T>>
where
    T: ?Sized + Send + Sync + 'static,
{
    type Target = T;

    fn is_settable(&self) -> bool {
        self.get().is_none()
    }

    fn receive(self, value: Arc<T>) -> Result<(), Arc<T>> {
        self.set(value)
    }
}
