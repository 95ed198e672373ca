//! Factory construction: wrapping caller constructors into erased factories.

use std::marker::PhantomData;
use std::sync::Arc;

use crate::context::Context;
use crate::error::{Error, Result};
use crate::internal::{AnyArc, Teardown};
use crate::key::{FactoryId, TypeKey};
use crate::tags::TagSet;
use crate::traits::{Dispose, TryDispose};

/// Boxed error accepted from fallible factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Erased constructor: runs the caller's function and yields the stored product.
pub(crate) type Ctor = Arc<dyn Fn(&mut Context<'_>) -> Result<AnyArc> + Send + Sync>;

/// Erased upcast from a stored `Arc<T>` to a stored `Arc<C>` for a capability `C`.
pub(crate) type Caster = Arc<dyn Fn(&AnyArc) -> Option<AnyArc> + Send + Sync>;

/// Return shapes a factory may have.
///
/// | Return type                    | Meaning                                   |
/// |--------------------------------|-------------------------------------------|
/// | `Arc<T>`                       | always a product                          |
/// | `Option<Arc<T>>`               | `None` fails with `NilProduct`            |
/// | `Result<Arc<T>, E>`            | `Err` fails with `FactoryFailed`          |
/// | `Result<Option<Arc<T>>, E>`    | both of the above                         |
///
/// `E` is anything convertible into [`BoxError`], including [`Error`].
pub trait FactoryOutput {
    type Product: ?Sized + Send + Sync + 'static;

    fn into_product(self) -> std::result::Result<Option<Arc<Self::Product>>, BoxError>;
}

impl<T: ?Sized + Send + Sync + 'static> FactoryOutput for Arc<T> {
    type Product = T;

    fn into_product(self) -> std::result::Result<Option<Arc<T>>, BoxError> {
        Ok(Some(self))
    }
}

impl<T: ?Sized + Send + Sync + 'static> FactoryOutput for Option<Arc<T>> {
    type Product = T;

    fn into_product(self) -> std::result::Result<Option<Arc<T>>, BoxError> {
        Ok(self)
    }
}

impl<T, E> FactoryOutput for std::result::Result<Arc<T>, E>
where
    T: ?Sized + Send + Sync + 'static,
    E: Into<BoxError>,
{
    type Product = T;

    fn into_product(self) -> std::result::Result<Option<Arc<T>>, BoxError> {
        self.map(Some).map_err(Into::into)
    }
}

impl<T, E> FactoryOutput for std::result::Result<Option<Arc<T>>, E>
where
    T: ?Sized + Send + Sync + 'static,
    E: Into<BoxError>,
{
    type Product = T;

    fn into_product(self) -> std::result::Result<Option<Arc<T>>, BoxError> {
        self.map_err(Into::into)
    }
}

/// A capability declared by a factory: "my product can be used as `C`".
#[derive(Clone)]
pub(crate) struct CapabilityBinding {
    pub(crate) capability: TypeKey,
    pub(crate) cast: Caster,
}

/// A constructor for `T` plus its tag set, capabilities and teardown hook.
///
/// Built fluently and handed to [`Materializer::add`](crate::Materializer::add)
/// or [`Repository::add`](crate::Repository::add).
///
/// # Examples
///
/// ```
/// use materialize::{Context, Factory, Materializer};
/// use std::sync::Arc;
///
/// trait Greeter: Send + Sync {
///     fn greet(&self) -> String;
/// }
///
/// struct English;
/// impl Greeter for English {
///     fn greet(&self) -> String { "hello".into() }
/// }
///
/// struct Service {
///     greeter: Arc<dyn Greeter>,
/// }
///
/// let m = Materializer::new();
/// m.add(
///     Factory::new(|| Arc::new(English))
///         .tags(["en"])
///         .provides::<dyn Greeter>(|e| e as Arc<dyn Greeter>),
/// )
/// .unwrap();
/// m.add(Factory::with_context(|cx: &mut Context<'_>| -> materialize::Result<Arc<Service>> {
///     Ok(Arc::new(Service { greeter: cx.materialize_dyn::<dyn Greeter>(&["en"])? }))
/// }))
/// .unwrap();
///
/// let service = m.materialize::<Service>(&[]).unwrap();
/// assert_eq!(service.greeter.greet(), "hello");
/// ```
pub struct Factory<T: ?Sized> {
    ctor: Ctor,
    tags: TagSet,
    capabilities: Vec<CapabilityBinding>,
    teardown: Option<Teardown>,
    _product: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Send + Sync + 'static> Factory<T> {
    /// Wraps a constructor that takes no context.
    pub fn new<F, O>(f: F) -> Self
    where
        F: Fn() -> O + Send + Sync + 'static,
        O: FactoryOutput<Product = T>,
    {
        Self::with_context(move |_: &mut Context<'_>| f())
    }

    /// Wraps a constructor that receives its [`Context`].
    ///
    /// The context resolves dependencies and, through
    /// [`Context::resolve`], publishes the value under construction so
    /// circular references back to it can be satisfied.
    pub fn with_context<F, O>(f: F) -> Self
    where
        F: Fn(&mut Context<'_>) -> O + Send + Sync + 'static,
        O: FactoryOutput<Product = T>,
    {
        let type_name = std::any::type_name::<T>();
        let ctor = move |cx: &mut Context<'_>| -> Result<AnyArc> {
            let output = f(cx);
            // A failed nested resolution wins over whatever the factory returned.
            if let Some(nested) = cx.take_error() {
                return Err(Error::Dependency {
                    type_name,
                    tags: cx.query_tags().clone(),
                    source: Box::new(nested),
                });
            }
            let product = output
                .into_product()
                .map_err(|source| Error::FactoryFailed {
                    type_name,
                    source: Arc::from(source),
                })?
                .ok_or(Error::NilProduct { type_name })?;
            cx.verify_resolved(&product);
            Ok(Arc::new(product) as AnyArc)
        };
        Self {
            ctor: Arc::new(ctor),
            tags: TagSet::empty(),
            capabilities: Vec::new(),
            teardown: None,
            _product: PhantomData,
        }
    }

    /// Sets the tag set, replacing any tags given before.
    pub fn tags<I, S>(mut self, tags: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.tags = TagSet::new(tags);
        self
    }

    /// Declares that the product can be served for capability requests of `C`.
    ///
    /// `cast` is almost always `|v| v as Arc<dyn C>`.
    pub fn provides<C>(mut self, cast: impl Fn(Arc<T>) -> Arc<C> + Send + Sync + 'static) -> Self
    where
        C: ?Sized + Send + Sync + 'static,
    {
        let caster = move |value: &AnyArc| -> Option<AnyArc> {
            value
                .downcast_ref::<Arc<T>>()
                .map(|product| Arc::new(cast(product.clone())) as AnyArc)
        };
        self.capabilities.push(CapabilityBinding {
            capability: TypeKey::of::<C>(),
            cast: Arc::new(caster),
        });
        self
    }

    /// Disposes the cached product on `close_all`.
    pub fn disposable(mut self) -> Self
    where
        T: Dispose,
    {
        self.teardown = Some(Arc::new(|value: &AnyArc| -> Result<(), String> {
            if let Some(product) = value.downcast_ref::<Arc<T>>() {
                product.dispose();
            }
            Ok(())
        }));
        self
    }

    /// Disposes the cached product on `close_all`, logging a failure.
    pub fn try_disposable(mut self) -> Self
    where
        T: TryDispose,
    {
        self.teardown = Some(Arc::new(|value: &AnyArc| -> Result<(), String> {
            match value.downcast_ref::<Arc<T>>() {
                Some(product) => product.try_dispose().map_err(|e| e.to_string()),
                None => Ok(()),
            }
        }));
        self
    }

    pub(crate) fn erase(self, id: FactoryId) -> ErasedFactory {
        ErasedFactory {
            id,
            key: TypeKey::of::<T>(),
            tags: self.tags,
            ctor: self.ctor,
            teardown: self.teardown,
        }
    }

    pub(crate) fn tag_set(&self) -> &TagSet {
        &self.tags
    }

    pub(crate) fn take_capabilities(&mut self) -> Vec<CapabilityBinding> {
        std::mem::take(&mut self.capabilities)
    }
}

/// A registered factory with its product type erased.
pub(crate) struct ErasedFactory {
    pub(crate) id: FactoryId,
    pub(crate) key: TypeKey,
    pub(crate) tags: TagSet,
    pub(crate) ctor: Ctor,
    pub(crate) teardown: Option<Teardown>,
}

impl ErasedFactory {
    pub(crate) fn type_name(&self) -> &'static str {
        self.key.name()
    }
}
