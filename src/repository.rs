//! Factory registry: registration, duplicate detection and tag-scored queries.

use std::any::TypeId;
use std::sync::Arc;

use crate::descriptors::FactoryDescriptor;
use crate::error::{Error, Result};
use crate::factory::{CapabilityBinding, Caster, ErasedFactory, Factory};
use crate::internal::Map;
use crate::key::{FactoryId, TypeKey};
use crate::tags::{TagSet, MIN_SCORE};

/// All factories registered for one produced type.
#[derive(Clone)]
struct TypeGroup {
    key: TypeKey,
    factories: Vec<FactoryId>,
    /// Capabilities this type was declared to satisfy, by any of its factories.
    capabilities: Vec<CapabilityBinding>,
}

impl TypeGroup {
    fn new(key: TypeKey) -> Self {
        Self {
            key,
            factories: Vec::new(),
            capabilities: Vec::new(),
        }
    }

    fn caster_for(&self, capability: &TypeKey) -> Option<&Caster> {
        self.capabilities
            .iter()
            .find(|binding| binding.capability == *capability)
            .map(|binding| &binding.cast)
    }
}

/// The factory chosen for a query, plus the upcast to apply to its product
/// when it was found through a capability.
#[derive(Clone)]
pub(crate) struct Candidate {
    pub(crate) factory: FactoryId,
    pub(crate) cast: Option<Caster>,
    pub(crate) score: i32,
}

/// Registry mapping produced types to their factories.
///
/// Usually owned by a [`Materializer`](crate::Materializer), but it can be
/// filled up front and handed over with
/// [`Materializer::with_repository`](crate::Materializer::with_repository).
/// Cloning is cheap: factories are shared, not copied.
///
/// # Examples
///
/// ```rust
/// use materialize::{Factory, Materializer, Repository};
/// use std::sync::Arc;
///
/// let mut repo = Repository::new();
/// repo.add(Factory::new(|| Arc::new(7u32))).unwrap();
/// repo.add(Factory::new(|| Arc::new(8u32)).tags(["eight"])).unwrap();
/// assert_eq!(repo.len(), 2);
///
/// // Same type, same tag set: rejected.
/// assert!(repo.add(Factory::new(|| Arc::new(9u32)).tags(["eight"])).is_err());
///
/// let m = Materializer::with_repository(repo);
/// assert_eq!(*m.materialize::<u32>(&["eight"]).unwrap(), 8);
/// ```
#[derive(Clone, Default)]
pub struct Repository {
    factories: Vec<Arc<ErasedFactory>>,
    groups: Vec<TypeGroup>,
    index: Map<TypeId, usize>,
}

impl Repository {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a factory.
    ///
    /// Fails with [`Error::DuplicateFactory`] when a factory for the same
    /// type with an equal tag set exists; the repository is left untouched.
    pub fn add<T>(&mut self, mut factory: Factory<T>) -> Result<()>
    where
        T: ?Sized + Send + Sync + 'static,
    {
        let key = TypeKey::of::<T>();
        if let Some(group) = self.group(&key) {
            let duplicate = group
                .factories
                .iter()
                .any(|id| self.factories[id.0].tags == *factory.tag_set());
            if duplicate {
                return Err(Error::DuplicateFactory {
                    type_name: key.name(),
                    tags: factory.tag_set().clone(),
                });
            }
        }

        let capabilities = factory.take_capabilities();
        let id = FactoryId(self.factories.len());
        let erased = factory.erase(id);
        tracing::debug!(type_name = key.name(), tags = %erased.tags, "registered factory");
        self.factories.push(Arc::new(erased));

        let group = self.group_mut_or_insert(key);
        group.factories.push(id);
        for binding in capabilities {
            // Capability relations belong to the type; first declaration wins.
            if group.caster_for(&binding.capability).is_none() {
                group.capabilities.push(binding);
            }
        }
        Ok(())
    }

    /// Number of registered factories.
    pub fn len(&self) -> usize {
        self.factories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.factories.is_empty()
    }

    /// Describes every registered factory in registration order.
    pub fn descriptors(&self) -> Vec<FactoryDescriptor> {
        self.factories
            .iter()
            .map(|factory| {
                let capabilities = self
                    .group(&factory.key)
                    .map(|group| {
                        group
                            .capabilities
                            .iter()
                            .map(|binding| binding.capability.name())
                            .collect()
                    })
                    .unwrap_or_default();
                FactoryDescriptor {
                    type_name: factory.type_name(),
                    tags: factory.tags.clone(),
                    capabilities,
                    disposable: factory.teardown.is_some(),
                    cached: false,
                }
            })
            .collect()
    }

    pub(crate) fn factory(&self, id: FactoryId) -> &Arc<ErasedFactory> {
        &self.factories[id.0]
    }

    /// Best factory registered directly for `key`. Never scans capabilities.
    pub(crate) fn query_concrete(&self, key: &TypeKey, tags: &TagSet) -> Result<Candidate> {
        let mut best = None;
        if let Some(group) = self.group(key) {
            self.fold_group(&mut best, group, None, tags);
        }
        best.ok_or_else(|| not_found(key, tags))
    }

    /// Best factory for capability `key`: its own group first, then every
    /// type declared to satisfy it, all folded into one ranking.
    pub(crate) fn query_capability(&self, key: &TypeKey, tags: &TagSet) -> Result<Candidate> {
        let mut best = None;
        if let Some(group) = self.group(key) {
            self.fold_group(&mut best, group, None, tags);
        }
        for group in &self.groups {
            if group.key == *key {
                continue;
            }
            if let Some(cast) = group.caster_for(key) {
                self.fold_group(&mut best, group, Some(cast), tags);
            }
        }
        best.ok_or_else(|| not_found(key, tags))
    }

    fn fold_group(
        &self,
        best: &mut Option<Candidate>,
        group: &TypeGroup,
        cast: Option<&Caster>,
        tags: &TagSet,
    ) {
        for &id in &group.factories {
            let score = self.factories[id.0].tags.score(tags);
            tracing::trace!(type_name = group.key.name(), factory = id.0, score, "scored candidate");
            if score < MIN_SCORE {
                continue;
            }
            // Strictly better only: on a tie the first candidate seen stays.
            if best.as_ref().map_or(true, |current| current.score < score) {
                *best = Some(Candidate {
                    factory: id,
                    cast: cast.cloned(),
                    score,
                });
            }
        }
    }

    fn group(&self, key: &TypeKey) -> Option<&TypeGroup> {
        self.index.get(&key.id()).map(|&i| &self.groups[i])
    }

    fn group_mut_or_insert(&mut self, key: TypeKey) -> &mut TypeGroup {
        let next = self.groups.len();
        let i = *self.index.entry(key.id()).or_insert(next);
        if i == next {
            self.groups.push(TypeGroup::new(key));
        }
        &mut self.groups[i]
    }
}

fn not_found(key: &TypeKey, tags: &TagSet) -> Error {
    Error::NotFound {
        type_name: key.name(),
        tags: tags.clone(),
    }
}
