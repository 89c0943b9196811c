//! Hierarchical injector scopes.

use std::fmt;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use tracing::{debug, warn};

use crate::cache::InstanceCache;
use crate::collection::ProviderSet;
use crate::config::InjectorConfig;
use crate::engine::{self, ResolutionContext};
use crate::error::{DiError, DiResult};
use crate::internal::DisposeBag;
use crate::observer::Observers;
use crate::provider::{DisposeFn, Instance, ProviderDescriptor, ProviderTable};
use crate::token::{Token, TokenRegistry};
use crate::traits::ResolverCore;

/// One scope in a tree of injectors.
///
/// An injector owns a provider table and a cache. Resolution first looks at
/// the injector's own cache and providers and then falls back to the parent.
/// Whatever an injector builds is cached in that injector, so a provider
/// registered on the root is shared by every descendant while a child can
/// shadow it with its own registration without affecting siblings.
///
/// `Injector` is a cheap handle; clones refer to the same scope. A child keeps
/// its parent alive.
///
/// # Examples
///
/// ```
/// use stratum_di::{Injector, ProviderSet, Resolver, Token};
/// use std::sync::Arc;
///
/// let mut root_providers = ProviderSet::new();
/// root_providers.add_named_value("greeting", "hello".to_string());
/// let root = Injector::root(root_providers);
///
/// let mut overrides = ProviderSet::new();
/// overrides.add_named_value("greeting", "bonjour".to_string());
/// let french = root.create_child(overrides);
/// let plain = root.create_child(ProviderSet::new());
///
/// let token = Token::named("greeting");
/// assert_eq!(&*french.resolve_as::<String>(&token).unwrap(), "bonjour");
/// assert_eq!(&*plain.resolve_as::<String>(&token).unwrap(), "hello");
/// assert!(Arc::ptr_eq(
///     &plain.resolve_as::<String>(&token).unwrap(),
///     &root.resolve_as::<String>(&token).unwrap(),
/// ));
/// ```
#[derive(Clone)]
pub struct Injector {
    inner: Arc<InjectorInner>,
}

struct InjectorInner {
    name: String,
    depth: usize,
    config: InjectorConfig,
    parent: Option<Injector>,
    tokens: Arc<TokenRegistry>,
    table: RwLock<ProviderTable>,
    cache: InstanceCache,
    observers: RwLock<Observers>,
    disposers: Mutex<DisposeBag>,
    destroyed: AtomicBool,
    children: AtomicUsize,
}

impl Injector {
    /// Creates a root injector with default settings.
    pub fn root(providers: ProviderSet) -> Self {
        Self::with_config(InjectorConfig::default(), providers)
    }

    /// Creates a root injector with the given settings.
    pub fn with_config(config: InjectorConfig, providers: ProviderSet) -> Self {
        let name = config.name.clone().unwrap_or_else(|| "root".to_string());
        let injector = Self::new_scope(
            name,
            0,
            config,
            None,
            Arc::new(TokenRegistry::new()),
            InstanceCache::new(),
            Observers::new(),
        );
        debug!(injector = injector.name(), providers = providers.len(), "created root injector");
        injector.register(providers);
        injector
    }

    fn new_scope(
        name: String,
        depth: usize,
        config: InjectorConfig,
        parent: Option<Injector>,
        tokens: Arc<TokenRegistry>,
        cache: InstanceCache,
        observers: Observers,
    ) -> Self {
        Self {
            inner: Arc::new(InjectorInner {
                name,
                depth,
                config,
                parent,
                tokens,
                table: RwLock::new(ProviderTable::new()),
                cache,
                observers: RwLock::new(observers),
                disposers: Mutex::new(DisposeBag::default()),
                destroyed: AtomicBool::new(false),
                children: AtomicUsize::new(0),
            }),
        }
    }

    /// Creates a child scope with its own providers.
    ///
    /// The child is named after its parent, e.g. `root.1` for the first child
    /// of `root`.
    pub fn create_child(&self, providers: ProviderSet) -> Injector {
        let seq = self.inner.children.fetch_add(1, Ordering::Relaxed) + 1;
        self.create_named_child(format!("{}.{}", self.inner.name, seq), providers)
    }

    /// Creates a child scope with an explicit diagnostic name.
    pub fn create_named_child(&self, name: impl Into<String>, providers: ProviderSet) -> Injector {
        let name = name.into();
        let mut config = self.inner.config.for_child();
        config.name = Some(name.clone());
        let observers = self.inner.observers.read().clone();
        let child = Self::new_scope(
            name,
            self.inner.depth + 1,
            config,
            Some(self.clone()),
            self.inner.tokens.clone(),
            self.inner.cache.for_child(),
            observers,
        );
        debug!(injector = child.name(), parent = self.name(), providers = providers.len(), "created child injector");
        child.register(providers);
        child
    }

    /// Adds `providers` to this scope.
    ///
    /// A token registered again replaces its descriptor. With
    /// `evict_on_reregister` set, an instance already cached for that token
    /// is dropped so the next resolution uses the new descriptor.
    pub fn register(&self, providers: ProviderSet) {
        let (entries, observers) = providers.into_parts();
        if observers.has_observers() {
            self.inner.observers.write().extend(observers);
        }

        let mut table = self.inner.table.write();
        for (token, descriptor) in entries {
            let token = self.inner.tokens.canonicalize(token);
            debug!(
                injector = self.name(),
                token = %token,
                kind = descriptor.kind_name(),
                lifetime = ?descriptor.lifetime(),
                "registered provider"
            );
            let replaced = table.register(token.clone(), descriptor).is_some();
            if replaced && self.inner.config.evict_on_reregister && self.inner.cache.evict(&token).is_some() {
                warn!(injector = self.name(), token = %token, "re-registration evicted cached instance");
            }
        }
    }

    /// Resolves `token` to its type-erased instance.
    ///
    /// Use the [`Resolver`](crate::Resolver) methods for typed access.
    pub fn resolve(&self, token: &Token) -> DiResult<Instance> {
        let mut ctx = ResolutionContext::new(self.inner.config.max_depth);
        engine::resolve(self, token, &mut ctx)
    }

    /// Tears the scope down.
    ///
    /// Runs the disposers of instances cached here in reverse creation order,
    /// empties the cache and marks the injector destroyed. Resolution through
    /// it afterwards, directly or from a child, fails with
    /// [`DiError::Disposed`]. Ancestors and siblings are not touched. Calling
    /// it again does nothing.
    pub fn destroy(&self) {
        if self.inner.destroyed.swap(true, Ordering::SeqCst) {
            return;
        }
        let mut bag = self.inner.disposers.lock().take();
        let disposed = bag.run_all_reverse();
        let dropped = self.inner.cache.clear();
        debug!(injector = self.name(), disposed, dropped, "destroyed injector");
    }

    pub fn is_destroyed(&self) -> bool {
        self.inner.destroyed.load(Ordering::SeqCst)
    }

    // ----- Introspection -----

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Distance from the root; the root is 0.
    pub fn depth(&self) -> usize {
        self.inner.depth
    }

    pub fn parent(&self) -> Option<&Injector> {
        self.inner.parent.as_ref()
    }

    pub fn config(&self) -> &InjectorConfig {
        &self.inner.config
    }

    /// Token registry shared by the whole injector tree.
    pub fn token_registry(&self) -> &TokenRegistry {
        &self.inner.tokens
    }

    /// Whether this injector or an ancestor has a provider for `token`.
    pub fn contains(&self, token: &Token) -> bool {
        self.ancestry().any(|injector| injector.contains_local(token))
    }

    pub fn contains_local(&self, token: &Token) -> bool {
        self.inner.table.read().contains(token)
    }

    /// Descriptor registered on this injector for `token`.
    pub fn lookup_local(&self, token: &Token) -> Option<ProviderDescriptor> {
        self.inner.table.read().lookup_local(token).cloned()
    }

    /// Tokens registered on this injector, in first-registration order.
    pub fn registered_tokens(&self) -> Vec<Token> {
        self.inner.table.read().tokens().cloned().collect()
    }

    /// Number of instances cached in this scope.
    pub fn cached_count(&self) -> usize {
        self.inner.cache.len()
    }

    /// Whether both handles refer to the same scope.
    pub fn ptr_eq(&self, other: &Injector) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }

    /// This injector followed by each ancestor up to the root.
    pub fn ancestry(&self) -> impl Iterator<Item = &Injector> {
        std::iter::successors(Some(self), |injector| injector.parent())
    }

    // ----- Engine hooks -----

    pub(crate) fn ensure_alive(&self) -> DiResult<()> {
        if self.is_destroyed() {
            return Err(DiError::Disposed(self.inner.name.clone()));
        }
        Ok(())
    }

    pub(crate) fn table_snapshot(&self) -> ProviderTable {
        self.inner.table.read().clone()
    }

    pub(crate) fn cache(&self) -> &InstanceCache {
        &self.inner.cache
    }

    pub(crate) fn observers(&self) -> Option<Observers> {
        let observers = self.inner.observers.read();
        observers.has_observers().then(|| observers.clone())
    }

    /// Queues `disposer` for teardown, or runs it at once if the injector was
    /// destroyed while the instance was being built.
    pub(crate) fn track_disposal(&self, instance: Instance, disposer: DisposeFn) {
        let hook: Box<dyn FnOnce() + Send> = Box::new(move || disposer(&instance));
        let mut bag = self.inner.disposers.lock();
        if self.is_destroyed() {
            drop(bag);
            hook();
        } else {
            bag.push(hook);
        }
    }
}

impl ResolverCore for Injector {
    fn resolve_any(&self, token: &Token) -> DiResult<Instance> {
        self.resolve(token)
    }
}

impl fmt::Debug for Injector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Injector")
            .field("name", &self.inner.name)
            .field("depth", &self.inner.depth)
            .field("providers", &self.inner.table.read().len())
            .field("cached", &self.inner.cache.len())
            .field("destroyed", &self.is_destroyed())
            .finish()
    }
}

impl Drop for InjectorInner {
    fn drop(&mut self) {
        if !*self.destroyed.get_mut() && !self.disposers.get_mut().is_empty() {
            warn!(
                injector = %self.name,
                pending = self.disposers.get_mut().len(),
                "injector dropped with undisposed instances; call destroy() first"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::traits::Resolver;

    #[test]
    fn children_are_numbered_after_their_parent() {
        let root = Injector::root(ProviderSet::new());
        let first = root.create_child(ProviderSet::new());
        let second = root.create_child(ProviderSet::new());
        let grandchild = first.create_child(ProviderSet::new());

        assert_eq!(root.name(), "root");
        assert_eq!(first.name(), "root.1");
        assert_eq!(second.name(), "root.2");
        assert_eq!(grandchild.name(), "root.1.1");
        assert_eq!(grandchild.depth(), 2);
        assert!(grandchild.parent().unwrap().ptr_eq(&first));
        assert_eq!(grandchild.ancestry().count(), 3);
    }

    #[test]
    fn children_inherit_config_but_not_name() {
        let root = Injector::with_config(
            InjectorConfig::default().with_name("app").with_max_depth(7),
            ProviderSet::new(),
        );
        let child = root.create_named_child("request", ProviderSet::new());
        assert_eq!(root.name(), "app");
        assert_eq!(child.name(), "request");
        assert_eq!(child.config().max_depth, 7);
        assert_eq!(child.config().name.as_deref(), Some("request"));
    }

    #[test]
    fn name_tokens_are_interned_across_the_tree() {
        let mut providers = ProviderSet::new();
        providers.add_named_value(String::from("shared"), 1u8);
        let root = Injector::root(providers);
        let child = root.create_child(ProviderSet::new());
        assert!(child.token_registry().lookup("shared").is_some());
        assert!(child.contains(&Token::named("shared")));
        assert!(!child.contains_local(&Token::named("shared")));
    }

    #[test]
    fn destroy_is_idempotent() {
        let mut providers = ProviderSet::new();
        providers.add_value(3u16);
        let root = Injector::root(providers);
        root.get::<u16>().unwrap();
        assert_eq!(root.cached_count(), 1);

        root.destroy();
        root.destroy();
        assert!(root.is_destroyed());
        assert_eq!(root.cached_count(), 0);
        assert!(matches!(root.get::<u16>(), Err(DiError::Disposed(name)) if name == "root"));
    }
}
