//! Provider lifetime definitions.

/// Controls whether an instance produced by a provider is cached.
///
/// # Examples
///
/// ```rust
/// use stratum_di::{Injector, ProviderDescriptor, ProviderSet, Resolver, Token};
/// use std::sync::atomic::{AtomicUsize, Ordering};
/// use std::sync::Arc;
///
/// static BUILT: AtomicUsize = AtomicUsize::new(0);
///
/// let mut providers = ProviderSet::new();
/// providers.add(
///     Token::named("request_id"),
///     ProviderDescriptor::factory(Vec::new(), |_| Ok(BUILT.fetch_add(1, Ordering::SeqCst))).transient(),
/// );
///
/// let injector = Injector::root(providers);
/// let a = injector.resolve_as::<usize>(&Token::named("request_id")).unwrap();
/// let b = injector.resolve_as::<usize>(&Token::named("request_id")).unwrap();
/// assert!(!Arc::ptr_eq(&a, &b));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Lifetime {
    /// One instance per owning injector scope, built lazily on first request
    /// and kept until the scope is destroyed.
    #[default]
    Singleton,
    /// New instance per resolution, never cached.
    Transient,
}

impl Lifetime {
    #[inline]
    pub fn is_cacheable(self) -> bool {
        matches!(self, Lifetime::Singleton)
    }
}
