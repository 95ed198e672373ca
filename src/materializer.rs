//! The materializer: a repository plus an instance cache behind one lock.

use std::fmt;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::context::{invalid_receiver, State};
use crate::descriptors::FactoryDescriptor;
use crate::error::{Error, Result};
use crate::factory::Factory;
use crate::internal::{catch_fault, raise, reentry, ActiveGuard, FaultKind};
use crate::key::FactoryId;
use crate::receiver::Receiver;
use crate::repository::Repository;
use crate::sink::{LogSink, TracingSink};
use crate::tags::TagSet;

/// Lazily builds and caches values from registered factories.
///
/// Each factory runs at most once between two [`close_all`] calls; every
/// later request selecting it gets the same `Arc`.
///
/// # Thread Safety
///
/// `Materializer` is `Send + Sync`, but only one top-level request runs at a
/// time. A request issued while another one is in flight, on any thread or
/// from inside a factory, fails at once with [`Error::Busy`]. Factories
/// resolve their dependencies through their [`Context`](crate::Context)
/// instead.
///
/// # Examples
///
/// ```
/// use materialize::{Context, Factory, Materializer};
/// use std::sync::Arc;
///
/// struct Config { url: String }
/// struct Database { config: Arc<Config> }
///
/// let m = Materializer::new();
/// m.add(Factory::new(|| Arc::new(Config { url: "postgres://localhost".into() }))).unwrap();
/// m.add(Factory::with_context(|cx: &mut Context<'_>| -> materialize::Result<_> {
///     Ok(Arc::new(Database { config: cx.materialize::<Config>(&[])? }))
/// }))
/// .unwrap();
///
/// let db = m.materialize::<Database>(&[]).unwrap();
/// assert_eq!(db.config.url, "postgres://localhost");
/// assert!(Arc::ptr_eq(&db, &m.materialize::<Database>(&[]).unwrap()));
/// ```
///
/// [`close_all`]: Materializer::close_all
pub struct Materializer {
    state: Mutex<State>,
}

impl Materializer {
    /// Creates a materializer with an empty repository, logging through
    /// [`TracingSink`].
    pub fn new() -> Self {
        Self::with_repository(Repository::new())
    }

    /// Creates a materializer over factories registered up front.
    pub fn with_repository(repo: Repository) -> Self {
        Self {
            state: Mutex::new(State::new(repo, Arc::new(TracingSink))),
        }
    }

    /// Replaces the diagnostic sink.
    pub fn with_sink(mut self, sink: impl LogSink + 'static) -> Self {
        self.state.get_mut().sink = Arc::new(sink);
        self
    }

    /// Registers a factory. See [`Repository::add`].
    ///
    /// Waits for a request in flight on another thread. Called from inside
    /// one of this materializer's own factories it fails with
    /// [`Error::Busy`] instead.
    pub fn add<T>(&self, factory: Factory<T>) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if reentry::is_active(self.id()) {
            return Err(Error::Busy);
        }
        self.state.lock().repo.add(factory)
    }

    /// Registers a factory, panicking on a duplicate.
    ///
    /// Meant for start-up wiring where a duplicate is a programming error.
    pub fn must_add<T>(&self, factory: Factory<T>) -> &Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        if let Err(err) = self.add(factory) {
            panic!("{err}");
        }
        self
    }

    /// Materializes the best factory registered for the concrete type `T`.
    ///
    /// Only factories whose product is exactly `T` are considered.
    pub fn materialize<T>(&self, tags: &[&str]) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let tags = TagSet::from_query(tags);
        self.top_level(|state| state.resolve_concrete::<T>(&tags))
    }

    /// Materializes a capability: a factory registered for `C` itself, or
    /// for any type declared with [`Factory::provides`] to satisfy `C`.
    pub fn materialize_dyn<C>(&self, tags: &[&str]) -> Result<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let tags = TagSet::from_query(tags);
        self.top_level(|state| state.resolve_capability::<C>(&tags))
    }

    /// Materializes `R::Target` into `receiver`.
    ///
    /// An unsettable receiver fails with [`Error::InvalidReceiver`] before
    /// anything is resolved.
    pub fn materialize_into<R>(&self, receiver: R, tags: &[&str]) -> Result<()>
    where
        R: Receiver,
        R::Target: Sized,
    {
        if !receiver.is_settable() {
            return Err(invalid_receiver::<R::Target>());
        }
        let value = self.materialize::<R::Target>(tags)?;
        receiver
            .receive(value)
            .map_err(|_| invalid_receiver::<R::Target>())
    }

    /// Capability counterpart of [`materialize_into`](Materializer::materialize_into).
    pub fn materialize_dyn_into<R>(&self, receiver: R, tags: &[&str]) -> Result<()>
    where
        R: Receiver,
    {
        if !receiver.is_settable() {
            return Err(invalid_receiver::<R::Target>());
        }
        let value = self.materialize_dyn::<R::Target>(tags)?;
        receiver
            .receive(value)
            .map_err(|_| invalid_receiver::<R::Target>())
    }

    /// Tears down every cached disposable value, most recently built first,
    /// and empties the cache. Registrations stay.
    ///
    /// Teardown failures go to the sink. The next request builds fresh values.
    ///
    /// # Panics
    ///
    /// Called from inside one of this materializer's own factories, raises a
    /// [`FaultKind::Reentrant`] fault; the running request then returns
    /// [`Error::Fault`]. A request on another thread is waited for.
    pub fn close_all(&self) {
        self.guard_reentry("close_all");
        self.state.lock().close_all();
    }

    /// Describes every registered factory, flagging the ones with a cached value.
    ///
    /// # Panics
    ///
    /// Same re-entrance rule as [`close_all`](Materializer::close_all).
    pub fn descriptors(&self) -> Vec<FactoryDescriptor> {
        self.guard_reentry("descriptors");
        let state = self.state.lock();
        let mut descriptors = state.repo.descriptors();
        for (i, descriptor) in descriptors.iter_mut().enumerate() {
            descriptor.cached = state.cache.contains(FactoryId(i));
        }
        descriptors
    }

    fn top_level<V>(&self, resolve: impl FnOnce(&mut State) -> Result<V>) -> Result<V> {
        let Some(mut state) = self.state.try_lock() else {
            tracing::debug!("rejected request while another materialization is in flight");
            return Err(Error::Busy);
        };
        let _active = ActiveGuard::enter(self.id());
        state.reset_frames();
        let result = catch_fault(|| resolve(&mut *state));
        state.reset_frames();
        result
    }

    fn guard_reentry(&self, operation: &'static str) {
        if reentry::is_active(self.id()) {
            raise(
                std::any::type_name::<Self>(),
                FaultKind::Reentrant { operation },
            );
        }
    }

    fn id(&self) -> usize {
        self as *const Self as usize
    }
}

impl Default for Materializer {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for Materializer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let Some(state) = self.state.try_lock() else {
            return f.debug_struct("Materializer").field("state", &"<busy>").finish();
        };
        f.debug_struct("Materializer")
            .field("factories", &state.repo.len())
            .field("cached", &state.cache.len())
            .field("pending_teardown", &state.cache.pending_teardown())
            .finish()
    }
}

impl Drop for Materializer {
    fn drop(&mut self) {
        let state = self.state.get_mut();
        let pending = state.cache.pending_teardown();
        if pending > 0 {
            state.sink.log(&format!(
                "materializer dropped with {pending} undisposed values, call close_all() before dropping"
            ));
        }
    }
}
