//! Provider descriptors: the recipes an injector builds instances from.

use std::fmt;
use std::sync::Arc;

use super::Instance;
use crate::args::Args;
use crate::error::BoxError;
use crate::lifetime::Lifetime;
use crate::token::Token;
use crate::traits::{Constructible, Dispose};

/// Type-erased constructor shared by class and factory providers.
pub type BuildFn = Arc<dyn Fn(&mut Args) -> Result<Instance, BoxError> + Send + Sync>;
/// Type-erased disposal hook.
pub type DisposeFn = Arc<dyn Fn(&Instance) + Send + Sync>;

/// The three kinds of recipe.
#[derive(Clone)]
pub enum ProviderKind {
    /// Construct `target` from resolved dependencies.
    Class {
        target: &'static str,
        deps: Arc<[Token]>,
        construct: BuildFn,
    },
    /// Hand out a fixed, pre-built value.
    Value(Instance),
    /// Call a function with resolved dependencies.
    Factory { deps: Arc<[Token]>, factory: BuildFn },
}

/// Recipe telling an injector how to produce the instance for a token.
///
/// Descriptors are cheap to clone; the closures and values they carry are
/// reference counted.
///
/// # Examples
///
/// ```rust
/// use stratum_di::{Lifetime, ProviderDescriptor, Token};
///
/// let value = ProviderDescriptor::value(3u8);
/// assert_eq!(value.kind_name(), "value");
/// assert!(value.dependencies().is_empty());
///
/// let factory = ProviderDescriptor::factory(vec![Token::named("seed")], |args| {
///     Ok(*args.next::<u64>()? * 2)
/// })
/// .transient();
/// assert_eq!(factory.lifetime(), Lifetime::Transient);
/// assert_eq!(factory.dependencies(), &[Token::named("seed")]);
/// ```
#[derive(Clone)]
pub struct ProviderDescriptor {
    kind: ProviderKind,
    lifetime: Lifetime,
    disposer: Option<DisposeFn>,
}

impl ProviderDescriptor {
    fn with_kind(kind: ProviderKind) -> Self {
        Self {
            kind,
            lifetime: Lifetime::Singleton,
            disposer: None,
        }
    }

    /// Value provider for a concrete value.
    pub fn value<T: Send + Sync + 'static>(value: T) -> Self {
        Self::value_arc(Arc::new(value))
    }

    /// Value provider for an already type-erased instance.
    pub fn value_arc(value: Instance) -> Self {
        Self::with_kind(ProviderKind::Value(value))
    }

    /// Value provider for a trait object; resolve it with `resolve_trait`.
    pub fn trait_value<T: ?Sized + Send + Sync + 'static>(value: Arc<T>) -> Self {
        Self::value_arc(Arc::new(value))
    }

    /// Class provider building `T` from `deps`.
    pub fn class<T: Constructible>(deps: Vec<Token>) -> Self {
        let construct: BuildFn = Arc::new(|args: &mut Args| -> Result<Instance, BoxError> {
            Ok(Arc::new(T::construct(args)?))
        });
        Self::with_kind(ProviderKind::Class {
            target: std::any::type_name::<T>(),
            deps: deps.into(),
            construct,
        })
    }

    /// Class provider using the type's own dependency list.
    pub fn constructible<T: Constructible>() -> Self {
        Self::class::<T>(T::dependencies())
    }

    /// Factory provider producing a `T`.
    pub fn factory<T, F>(deps: Vec<Token>, factory: F) -> Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        let factory: BuildFn = Arc::new(move |args: &mut Args| -> Result<Instance, BoxError> {
            Ok(Arc::new(factory(args)?))
        });
        Self::with_kind(ProviderKind::Factory {
            deps: deps.into(),
            factory,
        })
    }

    /// Factory provider producing a trait object.
    pub fn trait_factory<T, F>(deps: Vec<Token>, factory: F) -> Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Args) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        Self::factory::<Arc<T>, _>(deps, factory)
    }

    /// Factory provider that already returns type-erased instances.
    pub fn factory_any<F>(deps: Vec<Token>, factory: F) -> Self
    where
        F: Fn(&mut Args) -> Result<Instance, BoxError> + Send + Sync + 'static,
    {
        Self::with_kind(ProviderKind::Factory {
            deps: deps.into(),
            factory: Arc::new(factory),
        })
    }

    /// Marks the provider non-cached: every resolution builds a new instance.
    pub fn transient(self) -> Self {
        self.with_lifetime(Lifetime::Transient)
    }

    pub fn with_lifetime(mut self, lifetime: Lifetime) -> Self {
        self.lifetime = lifetime;
        self
    }

    /// Calls [`Dispose::dispose`] on the cached `T` when its injector is
    /// destroyed. Transient instances are never tracked.
    pub fn with_disposer<T: Dispose>(mut self) -> Self {
        self.disposer = Some(Arc::new(|instance: &Instance| {
            if let Some(service) = instance.downcast_ref::<T>() {
                service.dispose();
            }
        }));
        self
    }

    pub fn kind(&self) -> &ProviderKind {
        &self.kind
    }

    pub fn lifetime(&self) -> Lifetime {
        self.lifetime
    }

    pub fn is_cacheable(&self) -> bool {
        self.lifetime.is_cacheable()
    }

    /// Dependency tokens in declared order; empty for value providers.
    pub fn dependencies(&self) -> &[Token] {
        match &self.kind {
            ProviderKind::Class { deps, .. } | ProviderKind::Factory { deps, .. } => deps,
            ProviderKind::Value(_) => &[],
        }
    }

    pub fn kind_name(&self) -> &'static str {
        match self.kind {
            ProviderKind::Class { .. } => "class",
            ProviderKind::Value(_) => "value",
            ProviderKind::Factory { .. } => "factory",
        }
    }

    pub(crate) fn disposer(&self) -> Option<&DisposeFn> {
        self.disposer.as_ref()
    }
}

impl fmt::Debug for ProviderDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut s = f.debug_struct("ProviderDescriptor");
        s.field("kind", &self.kind_name());
        if let ProviderKind::Class { target, .. } = &self.kind {
            s.field("target", target);
        }
        s.field("deps", &self.dependencies())
            .field("lifetime", &self.lifetime)
            .field("disposable", &self.disposer.is_some())
            .finish()
    }
}
