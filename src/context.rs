//! Resolution context: the frame stack that lets a factory resolve its own
//! dependencies and break cycles through early binding.
//!
//! Every factory invocation pushes a frame naming the factory and, once
//! the factory calls [`Context::resolve`], the value it is still building.
//! A nested request for a factory that already has a frame on the stack is a
//! cycle: it is answered with that frame's partial value instead of calling
//! the factory again.

use std::sync::Arc;

use crate::cache::InstanceCache;
use crate::error::{Error, Result};
use crate::internal::{raise, AnyArc, FaultKind, ResolutionFault};
use crate::key::{FactoryId, TypeKey};
use crate::receiver::Receiver;
use crate::repository::Repository;
use crate::sink::LogSink;
use crate::tags::TagSet;

/// One in-progress construction.
struct Frame {
    factory: FactoryId,
    key: TypeKey,
    /// Query tags the factory was selected with.
    tags: TagSet,
    partial: Option<AnyArc>,
}

/// Pops a frame when its factory returns or unwinds.
///
/// A frame that published a partial value and did not succeed also takes
/// back every value cached while it was on the stack: those were built
/// against a value that will never be cached.
struct FrameGuard<'a> {
    state: &'a mut State,
    depth: usize,
    mark: usize,
    succeeded: bool,
}

impl<'a> FrameGuard<'a> {
    fn push(state: &'a mut State, frame: Frame) -> Self {
        let depth = state.frames.len();
        let mark = state.cache.mark();
        state.frames.push(frame);
        Self {
            state,
            depth,
            mark,
            succeeded: false,
        }
    }
}

impl Drop for FrameGuard<'_> {
    fn drop(&mut self) {
        let published = self
            .state
            .frames
            .get(self.depth)
            .map_or(false, |frame| frame.partial.is_some());
        if published && !self.succeeded {
            let dropped = self.state.cache.forget_since(self.mark);
            if dropped > 0 {
                tracing::debug!(dropped, "discarded values built against a failed partial");
            }
        }
        self.state.frames.truncate(self.depth);
    }
}

/// Everything guarded by the materializer lock.
pub(crate) struct State {
    pub(crate) repo: Repository,
    pub(crate) cache: InstanceCache,
    pub(crate) sink: Arc<dyn LogSink>,
    frames: Vec<Frame>,
}

impl State {
    pub(crate) fn new(repo: Repository, sink: Arc<dyn LogSink>) -> Self {
        Self {
            repo,
            cache: InstanceCache::default(),
            sink,
            frames: Vec::new(),
        }
    }

    /// Drops every frame. Called around each top-level request so a request
    /// aborted by a panic cannot leak frames into the next one.
    pub(crate) fn reset_frames(&mut self) {
        self.frames.clear();
    }

    pub(crate) fn resolve_concrete<T>(&mut self, tags: &TagSet) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        let candidate = self.repo.query_concrete(&TypeKey::of::<T>(), tags)?;
        let value = self.produce(candidate.factory, tags)?;
        downcast::<T>(&value)
    }

    pub(crate) fn resolve_capability<C>(&mut self, tags: &TagSet) -> Result<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let candidate = self.repo.query_capability(&TypeKey::of::<C>(), tags)?;
        let value = self.produce(candidate.factory, tags)?;
        match candidate.cast {
            Some(cast) => match cast(&value) {
                Some(upcast) => downcast::<C>(&upcast),
                None => Err(mismatch::<C>()),
            },
            None => downcast::<C>(&value),
        }
    }

    /// Returns the value for `id`: a resolving ancestor's partial value, the
    /// cached instance, or a freshly built one (which is then cached).
    fn produce(&mut self, id: FactoryId, tags: &TagSet) -> Result<AnyArc> {
        let factory = self.repo.factory(id).clone();
        let type_name = factory.type_name();

        if let Some(frame) = self.frames.iter().rev().find(|frame| frame.factory == id) {
            tracing::debug!(type_name, "cycle answered by resolving ancestor");
            return frame
                .partial
                .clone()
                .ok_or(Error::UnresolvedCircularReference { type_name });
        }

        if let Some(value) = self.cache.get(id) {
            tracing::trace!(type_name, "cache hit");
            return Ok(value);
        }

        tracing::debug!(type_name, tags = %factory.tags, depth = self.frames.len(), "invoking factory");
        let built = {
            let mut guard = FrameGuard::push(
                self,
                Frame {
                    factory: id,
                    key: factory.key,
                    tags: tags.clone(),
                    partial: None,
                },
            );
            let depth = guard.depth;
            let built = (factory.ctor)(&mut Context::new(&mut *guard.state, depth));
            guard.succeeded = built.is_ok();
            built
        };

        let value = built?;
        Ok(self.cache.put(&factory, value))
    }

    pub(crate) fn close_all(&mut self) {
        let sink = self.sink.clone();
        self.cache.close_all(sink.as_ref());
    }
}

fn mismatch<T: ?Sized>() -> Error {
    Error::Fault(ResolutionFault {
        type_name: std::any::type_name::<T>(),
        kind: FaultKind::ProductTypeMismatch,
    })
}

fn downcast<T: ?Sized + 'static>(value: &AnyArc) -> Result<Arc<T>> {
    value
        .downcast_ref::<Arc<T>>()
        .cloned()
        .ok_or_else(mismatch::<T>)
}

/// Handle passed to factories registered with
/// [`Factory::with_context`](crate::Factory::with_context).
///
/// Nested resolution goes through here, never back through the
/// [`Materializer`](crate::Materializer): the top-level call already holds
/// the lock. The first nested error is recorded; afterwards every nested
/// request on this context returns that error without doing anything, and
/// once the factory returns the recorded error replaces its result.
///
/// # Circular references
///
/// A factory whose product may be reached again by its own dependencies
/// must call [`resolve`](Context::resolve) with the value under
/// construction *before* requesting them:
///
/// ```
/// use materialize::{Context, Factory, Materializer};
/// use std::sync::{Arc, OnceLock};
///
/// struct Parent { child: OnceLock<Arc<Child>> }
/// struct Child { parent: OnceLock<Arc<Parent>> }
///
/// let m = Materializer::new();
/// m.add(Factory::with_context(|cx: &mut Context<'_>| {
///     let parent = Arc::new(Parent { child: OnceLock::new() });
///     cx.resolve(&parent).materialize_into(&parent.child, &[]);
///     parent
/// }))
/// .unwrap();
/// m.add(Factory::with_context(|cx: &mut Context<'_>| {
///     let child = Arc::new(Child { parent: OnceLock::new() });
///     cx.resolve(&child).materialize_into(&child.parent, &[]);
///     child
/// }))
/// .unwrap();
///
/// let parent = m.materialize::<Parent>(&[]).unwrap();
/// let child = parent.child.get().unwrap();
/// assert!(Arc::ptr_eq(child.parent.get().unwrap(), &parent));
/// ```
pub struct Context<'a> {
    state: &'a mut State,
    frame: usize,
    error: Option<Error>,
}

impl<'a> Context<'a> {
    pub(crate) fn new(state: &'a mut State, frame: usize) -> Self {
        Self {
            state,
            frame,
            error: None,
        }
    }

    /// Type being built by the factory that owns this context.
    pub fn type_name(&self) -> &'static str {
        self.state.frames[self.frame].key.name()
    }

    /// Tags of the request that selected this factory.
    pub fn query_tags(&self) -> &TagSet {
        &self.state.frames[self.frame].tags
    }

    /// Publishes `value` as this factory's (not yet complete) product, so a
    /// dependency that refers back to this type receives it.
    ///
    /// # Panics
    ///
    /// Raises a [`ResolutionFault`] when called twice, or with a value that
    /// is not of the factory's product type. The top-level call reports it as
    /// [`Error::Fault`].
    pub fn resolve<T>(&mut self, value: &Arc<T>) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let frame = &mut self.state.frames[self.frame];
        if frame.partial.is_some() {
            raise(frame.key.name(), FaultKind::AlreadyResolved);
        }
        if frame.key != TypeKey::of::<T>() {
            raise(
                frame.key.name(),
                FaultKind::ResolvedTypeMismatch {
                    given: std::any::type_name::<T>(),
                },
            );
        }
        frame.partial = Some(Arc::new(value.clone()));
        self
    }

    /// Materializes a concrete dependency.
    pub fn materialize<T>(&mut self, tags: &[&str]) -> Result<Arc<T>>
    where
        T: Send + Sync + 'static,
    {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let result = self.state.resolve_concrete::<T>(&TagSet::from_query(tags));
        self.record(result)
    }

    /// Materializes a capability (`dyn Trait`) dependency.
    pub fn materialize_dyn<C>(&mut self, tags: &[&str]) -> Result<Arc<C>>
    where
        C: ?Sized + Send + Sync + 'static,
    {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        let result = self.state.resolve_capability::<C>(&TagSet::from_query(tags));
        self.record(result)
    }

    /// Like [`materialize`](Context::materialize), but an unregistered
    /// dependency yields `Ok(None)` and is not recorded as a failure.
    pub fn materialize_optional<T>(&mut self, tags: &[&str]) -> Result<Option<Arc<T>>>
    where
        T: Send + Sync + 'static,
    {
        if let Some(err) = &self.error {
            return Err(err.clone());
        }
        match self.state.resolve_concrete::<T>(&TagSet::from_query(tags)) {
            Ok(value) => Ok(Some(value)),
            Err(Error::NotFound { .. }) => Ok(None),
            Err(err) => self.record(Err(err)),
        }
    }

    /// Materializes a concrete dependency into `receiver`. Errors are
    /// recorded on the context, which makes calls chainable.
    pub fn materialize_into<R>(&mut self, receiver: R, tags: &[&str]) -> &mut Self
    where
        R: Receiver,
        R::Target: Sized,
    {
        if self.error.is_some() {
            return self;
        }
        if !receiver.is_settable() {
            return self.fail(invalid_receiver::<R::Target>());
        }
        if let Ok(value) = self.materialize::<R::Target>(tags) {
            if receiver.receive(value).is_err() {
                return self.fail(invalid_receiver::<R::Target>());
            }
        }
        self
    }

    /// Capability counterpart of [`materialize_into`](Context::materialize_into).
    pub fn materialize_dyn_into<R>(&mut self, receiver: R, tags: &[&str]) -> &mut Self
    where
        R: Receiver,
    {
        if self.error.is_some() {
            return self;
        }
        if !receiver.is_settable() {
            return self.fail(invalid_receiver::<R::Target>());
        }
        if let Ok(value) = self.materialize_dyn::<R::Target>(tags) {
            if receiver.receive(value).is_err() {
                return self.fail(invalid_receiver::<R::Target>());
            }
        }
        self
    }

    /// First error recorded by a nested request, if any.
    pub fn error(&self) -> Option<&Error> {
        self.error.as_ref()
    }

    pub(crate) fn take_error(&mut self) -> Option<Error> {
        self.error.take()
    }

    /// Checks the product against the value published with `resolve`.
    pub(crate) fn verify_resolved<T>(&self, product: &Arc<T>)
    where
        T: ?Sized + 'static,
    {
        let frame = &self.state.frames[self.frame];
        if let Some(partial) = &frame.partial {
            let same = partial
                .downcast_ref::<Arc<T>>()
                .map_or(false, |resolved| Arc::ptr_eq(resolved, product));
            if !same {
                raise(frame.key.name(), FaultKind::ReturnedOtherThanResolved);
            }
        }
    }

    fn record<V>(&mut self, result: Result<V>) -> Result<V> {
        if let Err(err) = &result {
            if self.error.is_none() {
                self.error = Some(err.clone());
            }
        }
        result
    }

    fn fail(&mut self, err: Error) -> &mut Self {
        if self.error.is_none() {
            self.error = Some(err);
        }
        self
    }
}

pub(crate) fn invalid_receiver<T: ?Sized>() -> Error {
    Error::InvalidReceiver {
        type_name: std::any::type_name::<T>(),
    }
}
