//! Type and factory identifiers for the repository and the instance cache.

use std::any::TypeId;
use std::fmt;
use std::hash::{Hash, Hasher};

/// Stable identifier of a produced (or requested) type.
///
/// Pairs the `TypeId` used for lookup with the `type_name` used in
/// diagnostics. Equality and hashing only look at the `TypeId`.
///
/// # Examples
///
/// ```rust
/// use materialize::TypeKey;
///
/// let key = TypeKey::of::<String>();
/// assert_eq!(key.name(), "alloc::string::String");
/// assert_eq!(key, TypeKey::of::<String>());
/// assert_ne!(key, TypeKey::of::<u32>());
/// ```
#[derive(Debug, Clone, Copy)]
pub struct TypeKey {
    id: TypeId,
    name: &'static str,
}

impl TypeKey {
    /// Key of `T`. Works for unsized types such as `dyn Trait`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
        }
    }

    /// The `TypeId` this key stands for.
    pub fn id(&self) -> TypeId {
        self.id
    }

    /// Human readable type name.
    pub fn name(&self) -> &'static str {
        self.name
    }
}

impl PartialEq for TypeKey {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for TypeKey {}

impl Hash for TypeKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Display for TypeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name)
    }
}

/// Identity of one registered factory: its slot in the repository.
///
/// Two factories for the same type but different tag sets get different ids,
/// which is what both the cache and cycle detection key on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub(crate) struct FactoryId(pub(crate) usize);
