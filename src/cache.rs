//! Instance cache: one value per factory plus the teardown log.

use crate::factory::ErasedFactory;
use crate::internal::{AnyArc, DisposeBag, Map};
use crate::key::FactoryId;
use crate::sink::LogSink;

/// Values already built, keyed by the factory that built them.
///
/// Values whose factory carries a teardown hook are also logged, in the
/// order they were first cached. A value taken back with
/// [`forget_since`](InstanceCache::forget_since) stays in that log and is
/// still torn down by [`close_all`](InstanceCache::close_all).
#[derive(Default)]
pub(crate) struct InstanceCache {
    values: Map<FactoryId, AnyArc>,
    order: Vec<FactoryId>,
    disposers: DisposeBag,
}

impl InstanceCache {
    pub(crate) fn get(&self, id: FactoryId) -> Option<AnyArc> {
        self.values.get(&id).cloned()
    }

    pub(crate) fn contains(&self, id: FactoryId) -> bool {
        self.values.contains_key(&id)
    }

    /// Stores `value` for `factory`. The first value stored wins; later calls
    /// return the value already cached.
    pub(crate) fn put(&mut self, factory: &ErasedFactory, value: AnyArc) -> AnyArc {
        if let Some(existing) = self.values.get(&factory.id) {
            return existing.clone();
        }
        self.values.insert(factory.id, value.clone());
        self.order.push(factory.id);
        if let Some(hook) = &factory.teardown {
            self.disposers.push(factory.type_name(), value.clone(), hook.clone());
        }
        value
    }

    /// Position to roll back to with [`forget_since`](InstanceCache::forget_since).
    pub(crate) fn mark(&self) -> usize {
        self.order.len()
    }

    /// Evicts every value cached after `mark` and returns how many went.
    pub(crate) fn forget_since(&mut self, mark: usize) -> usize {
        if mark >= self.order.len() {
            return 0;
        }
        let evicted: Vec<FactoryId> = self.order.drain(mark..).collect();
        for id in &evicted {
            self.values.remove(id);
        }
        evicted.len()
    }

    pub(crate) fn len(&self) -> usize {
        self.values.len()
    }

    /// Number of cached values still waiting for teardown.
    pub(crate) fn pending_teardown(&self) -> usize {
        self.disposers.len()
    }

    /// Tears down logged values last-first, then forgets everything.
    pub(crate) fn close_all(&mut self, sink: &dyn LogSink) {
        tracing::debug!(
            cached = self.values.len(),
            disposable = self.disposers.len(),
            "closing instance cache"
        );
        self.disposers.run_all_reverse(sink);
        self.values.clear();
        self.order.clear();
    }
}
