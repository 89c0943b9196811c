//! Resolver traits for token resolution.

use std::sync::Arc;

use crate::args::{downcast, downcast_trait};
use crate::error::DiResult;
use crate::provider::Instance;
use crate::token::{InjectionToken, Token};

/// Core resolver trait for object-safe resolution.
///
/// Implementors resolve a token to a type-erased instance. Most callers use
/// [`Resolver`], which layers typed accessors on top.
pub trait ResolverCore: Send + Sync {
    /// Resolves `token` to its instance.
    fn resolve_any(&self, token: &Token) -> DiResult<Instance>;
}

/// Typed resolution helpers, available on every [`ResolverCore`].
///
/// # Examples
///
/// ```
/// use stratum_di::{Injector, ProviderSet, Resolver, Token};
/// use std::sync::Arc;
///
/// trait Clock: Send + Sync {
///     fn now(&self) -> u64;
/// }
///
/// struct Fixed;
/// impl Clock for Fixed {
///     fn now(&self) -> u64 { 42 }
/// }
///
/// let mut providers = ProviderSet::new();
/// providers.add_value(7usize);
/// providers.add_trait_value::<dyn Clock>(Arc::new(Fixed));
///
/// let injector = Injector::root(providers);
/// assert_eq!(*injector.get::<usize>().unwrap(), 7);
/// assert_eq!(injector.get_trait::<dyn Clock>().unwrap().now(), 42);
/// ```
pub trait Resolver: ResolverCore {
    /// Resolves the type token of `T` and downcasts the instance.
    fn get<T: Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolve_as::<T>(&Token::of::<T>())
    }

    /// Resolves `token` and downcasts the instance to `T`.
    fn resolve_as<T: Send + Sync + 'static>(&self, token: &Token) -> DiResult<Arc<T>> {
        let any = self.resolve_any(token)?;
        downcast::<T>(token, any)
    }

    /// Resolves the type token of the unsized `T` (usually `dyn Trait`).
    fn get_trait<T: ?Sized + Send + Sync + 'static>(&self) -> DiResult<Arc<T>> {
        self.resolve_trait::<T>(&Token::of::<T>())
    }

    /// Resolves `token` to an instance registered as `Arc<T>`.
    fn resolve_trait<T: ?Sized + Send + Sync + 'static>(&self, token: &Token) -> DiResult<Arc<T>> {
        let any = self.resolve_any(token)?;
        downcast_trait::<T>(token, any)
    }

    /// Resolves a typed string token.
    fn get_token<T: Send + Sync + 'static>(&self, token: &InjectionToken<T>) -> DiResult<Arc<T>> {
        self.resolve_as::<T>(token.token())
    }

    /// Like [`get`](Self::get) but panics on failure.
    ///
    /// # Panics
    ///
    /// Panics if `T` cannot be resolved.
    fn get_required<T: Send + Sync + 'static>(&self) -> Arc<T> {
        self.get::<T>()
            .unwrap_or_else(|e| panic!("Failed to resolve {}: {}", std::any::type_name::<T>(), e))
    }
}

impl<R: ResolverCore + ?Sized> Resolver for R {}
