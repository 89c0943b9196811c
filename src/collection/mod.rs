//! Provider set module for dependency injection.
//!
//! This module contains the [`ProviderSet`] builder used to describe the
//! registrations of one injector scope, plus the [`DependencyManifest`]
//! metadata source and [`ProviderModule`] grouping.

use std::sync::Arc;

use crate::args::Args;
use crate::error::{BoxError, DiResult};
use crate::observer::{DiObserver, Observers};
use crate::provider::ProviderDescriptor;
use crate::token::Token;
use crate::traits::{Constructible, Dispose};

pub mod manifest;
pub mod module_system;

pub use manifest::DependencyManifest;
pub use module_system::ProviderModule;

/// Ordered list of registrations for one injector scope.
///
/// Later entries for the same token replace earlier ones once the set is
/// registered. Chaining methods return `&mut Self`.
///
/// # Examples
///
/// ```rust
/// use stratum_di::{Injector, ProviderSet, Resolver, Token};
///
/// struct Config {
///     url: String,
/// }
///
/// let mut providers = ProviderSet::new();
/// providers
///     .add_value(Config { url: "postgres://localhost".into() })
///     .add_factory(Token::named("url"), vec![Token::of::<Config>()], |args| {
///         Ok(args.next::<Config>()?.url.clone())
///     });
///
/// let injector = Injector::root(providers);
/// let url = injector.resolve_as::<String>(&Token::named("url")).unwrap();
/// assert_eq!(&*url, "postgres://localhost");
/// ```
#[derive(Default)]
pub struct ProviderSet {
    entries: Vec<(Token, ProviderDescriptor)>,
    observers: Observers,
}

impl ProviderSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `descriptor` under `token`.
    pub fn add(&mut self, token: impl Into<Token>, descriptor: ProviderDescriptor) -> &mut Self {
        self.entries.push((token.into(), descriptor));
        self
    }

    /// Registers `descriptor` only if this set has nothing for `token` yet.
    ///
    /// Returns `true` when the registration was added.
    pub fn try_add(&mut self, token: impl Into<Token>, descriptor: ProviderDescriptor) -> bool {
        let token = token.into();
        if self.contains(&token) {
            return false;
        }
        self.entries.push((token, descriptor));
        true
    }

    // ----- Value providers -----

    /// Registers a pre-built value under the type token of `T`.
    pub fn add_value<T: Send + Sync + 'static>(&mut self, value: T) -> &mut Self {
        self.add(Token::of::<T>(), ProviderDescriptor::value(value))
    }

    /// Registers a pre-built value under a string token.
    pub fn add_named_value<T: Send + Sync + 'static>(
        &mut self,
        name: impl Into<Arc<str>>,
        value: T,
    ) -> &mut Self {
        self.add(Token::named(name), ProviderDescriptor::value(value))
    }

    /// Registers a trait object under the type token of `T` (usually `dyn Trait`).
    pub fn add_trait_value<T: ?Sized + Send + Sync + 'static>(&mut self, value: Arc<T>) -> &mut Self {
        self.add(Token::of::<T>(), ProviderDescriptor::trait_value(value))
    }

    /// Like [`add_value`](Self::add_value), disposing the value on teardown
    /// once it has been resolved through the owning injector.
    pub fn add_disposable_value<T: Dispose>(&mut self, value: T) -> &mut Self {
        self.add(
            Token::of::<T>(),
            ProviderDescriptor::value(value).with_disposer::<T>(),
        )
    }

    // ----- Class providers -----

    /// Registers `T` built from `deps` in the given order.
    pub fn add_class<T: Constructible>(&mut self, deps: Vec<Token>) -> &mut Self {
        self.add(Token::of::<T>(), ProviderDescriptor::class::<T>(deps))
    }

    /// Like [`add_class`](Self::add_class), disposing the cached instance on teardown.
    pub fn add_disposable_class<T: Constructible + Dispose>(&mut self, deps: Vec<Token>) -> &mut Self {
        self.add(
            Token::of::<T>(),
            ProviderDescriptor::class::<T>(deps).with_disposer::<T>(),
        )
    }

    /// Registers `T` with the dependencies `manifest` declares for it, or
    /// none if the manifest has no entry.
    pub fn add_type<T: Constructible>(&mut self, manifest: &DependencyManifest) -> &mut Self {
        let deps = manifest
            .dependencies_of::<T>()
            .map(<[Token]>::to_vec)
            .unwrap_or_default();
        self.add_class::<T>(deps)
    }

    /// Registers `T` with the dependencies from [`Constructible::dependencies`].
    pub fn add_constructible<T: Constructible>(&mut self) -> &mut Self {
        self.add(Token::of::<T>(), ProviderDescriptor::constructible::<T>())
    }

    // ----- Factory providers -----

    /// Registers a cached factory under `token`.
    pub fn add_factory<T, F>(&mut self, token: impl Into<Token>, deps: Vec<Token>, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.add(token, ProviderDescriptor::factory(deps, factory))
    }

    /// Registers a factory that runs on every resolution.
    pub fn add_transient_factory<T, F>(&mut self, token: impl Into<Token>, deps: Vec<Token>, factory: F) -> &mut Self
    where
        T: Send + Sync + 'static,
        F: Fn(&mut Args) -> Result<T, BoxError> + Send + Sync + 'static,
    {
        self.add(token, ProviderDescriptor::factory(deps, factory).transient())
    }

    /// Registers a cached factory producing a trait object, keyed by the
    /// type token of `T`.
    pub fn add_trait_factory<T, F>(&mut self, deps: Vec<Token>, factory: F) -> &mut Self
    where
        T: ?Sized + Send + Sync + 'static,
        F: Fn(&mut Args) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    {
        self.add(Token::of::<T>(), ProviderDescriptor::trait_factory(deps, factory))
    }

    /// Makes `token` resolve to whatever `existing` resolves to.
    ///
    /// The alias itself caches nothing, so both tokens always yield the same
    /// instance as long as `existing` is cached.
    ///
    /// ```rust
    /// use stratum_di::{Injector, ProviderSet, Resolver, Token};
    /// use std::sync::Arc;
    ///
    /// let mut providers = ProviderSet::new();
    /// providers
    ///     .add_named_value("primary", 5u32)
    ///     .add_alias("replica", "primary");
    ///
    /// let injector = Injector::root(providers);
    /// let a = injector.resolve_as::<u32>(&Token::named("primary")).unwrap();
    /// let b = injector.resolve_as::<u32>(&Token::named("replica")).unwrap();
    /// assert!(Arc::ptr_eq(&a, &b));
    /// ```
    pub fn add_alias(&mut self, token: impl Into<Token>, existing: impl Into<Token>) -> &mut Self {
        let descriptor = ProviderDescriptor::factory_any(vec![existing.into()], |args| {
            Ok(args.next_any()?)
        })
        .transient();
        self.add(token, descriptor)
    }

    // ----- Observers and modules -----

    /// Attaches an observer to the injector this set is registered with.
    pub fn add_observer(&mut self, observer: Arc<dyn DiObserver>) -> &mut Self {
        self.observers.add(observer);
        self
    }

    /// Lets `module` add its registrations to this set.
    pub fn add_module<M: ProviderModule>(&mut self, module: M) -> DiResult<&mut Self> {
        module.register_providers(self)?;
        Ok(self)
    }

    /// Appends every registration and observer of `other`.
    pub fn extend(&mut self, other: ProviderSet) -> &mut Self {
        self.entries.extend(other.entries);
        self.observers.extend(other.observers);
        self
    }

    // ----- Introspection -----

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.entries.iter().any(|(t, _)| t == token)
    }

    /// Registered tokens in insertion order, duplicates included.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.entries.iter().map(|(token, _)| token)
    }

    pub(crate) fn into_parts(self) -> (Vec<(Token, ProviderDescriptor)>, Observers) {
        (self.entries, self.observers)
    }
}

impl std::fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderSet")
            .field("entries", &self.entries)
            .field("observers", &self.observers.len())
            .finish()
    }
}

impl FromIterator<(Token, ProviderDescriptor)> for ProviderSet {
    fn from_iter<I: IntoIterator<Item = (Token, ProviderDescriptor)>>(iter: I) -> Self {
        Self {
            entries: iter.into_iter().collect(),
            observers: Observers::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf;
    impl Constructible for Leaf {
        fn construct(_: &mut Args) -> Result<Self, BoxError> {
            Ok(Leaf)
        }
    }

    #[test]
    fn try_add_keeps_the_first_registration() {
        let mut set = ProviderSet::new();
        assert!(set.try_add("a", ProviderDescriptor::value(1u8)));
        assert!(!set.try_add("a", ProviderDescriptor::value(2u8)));
        assert_eq!(set.len(), 1);
    }

    #[test]
    fn add_type_without_manifest_entry_has_no_deps() {
        let manifest = DependencyManifest::new();
        let mut set = ProviderSet::new();
        set.add_type::<Leaf>(&manifest);
        let (entries, _) = set.into_parts();
        assert_eq!(entries[0].0, Token::of::<Leaf>());
        assert!(entries[0].1.dependencies().is_empty());
        assert_eq!(entries[0].1.kind_name(), "class");
    }

    #[test]
    fn add_type_reads_the_manifest() {
        let mut manifest = DependencyManifest::new();
        manifest.declare::<Leaf>(vec![Token::named("x"), Token::named("y")]);
        let mut set = ProviderSet::new();
        set.add_type::<Leaf>(&manifest);
        let (entries, _) = set.into_parts();
        assert_eq!(entries[0].1.dependencies(), &[Token::named("x"), Token::named("y")]);
    }

    #[test]
    fn extend_keeps_order_and_duplicates() {
        let mut a = ProviderSet::new();
        a.add_named_value("x", 1u8);
        let mut b = ProviderSet::new();
        b.add_named_value("y", 2u8).add_named_value("x", 3u8);
        a.extend(b);
        let tokens: Vec<_> = a.tokens().cloned().collect();
        assert_eq!(tokens, vec![Token::named("x"), Token::named("y"), Token::named("x")]);
    }

    #[test]
    fn alias_is_a_transient_single_dependency_factory() {
        let mut set = ProviderSet::new();
        set.add_alias("b", "a");
        let (entries, _) = set.into_parts();
        let descriptor = &entries[0].1;
        assert_eq!(descriptor.kind_name(), "factory");
        assert!(!descriptor.is_cacheable());
        assert_eq!(descriptor.dependencies(), &[Token::named("a")]);
    }
}
