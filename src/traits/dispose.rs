//! Disposal trait for scope teardown.

/// Trait for synchronous resource disposal.
///
/// Implement this for services that need structured teardown (flushing
/// buffers, closing connections). A provider registered with a disposer has
/// `dispose` called on its cached instance when the owning injector is
/// destroyed. Disposers run in LIFO order of instance creation.
///
/// # Examples
///
/// ```
/// use stratum_di::{Dispose, Injector, ProviderSet, Resolver};
/// use std::sync::atomic::{AtomicBool, Ordering};
///
/// #[derive(Default)]
/// struct Pool {
///     closed: AtomicBool,
/// }
///
/// impl Dispose for Pool {
///     fn dispose(&self) {
///         self.closed.store(true, Ordering::SeqCst);
///     }
/// }
///
/// let mut providers = ProviderSet::new();
/// providers.add_disposable_value(Pool::default());
///
/// let injector = Injector::root(providers);
/// let pool = injector.get::<Pool>().unwrap();
/// injector.destroy();
/// assert!(pool.closed.load(Ordering::SeqCst));
/// ```
pub trait Dispose: Send + Sync + 'static {
    /// Perform synchronous cleanup of resources.
    fn dispose(&self);
}
