//! Grouped registrations.

use super::ProviderSet;
use crate::error::DiResult;

/// A reusable group of registrations.
///
/// # Example
///
/// ```rust
/// use stratum_di::{DiResult, Injector, ProviderModule, ProviderSet, Resolver, Token};
///
/// struct StorageModule {
///     root: String,
/// }
///
/// impl ProviderModule for StorageModule {
///     fn register_providers(self, providers: &mut ProviderSet) -> DiResult<()> {
///         providers.add_named_value("storage.root", self.root);
///         Ok(())
///     }
/// }
///
/// # fn main() -> DiResult<()> {
/// let mut providers = ProviderSet::new();
/// providers.add_module(StorageModule { root: "/var/data".into() })?;
///
/// let injector = Injector::root(providers);
/// let root = injector.resolve_as::<String>(&Token::named("storage.root"))?;
/// assert_eq!(&*root, "/var/data");
/// # Ok(())
/// # }
/// ```
pub trait ProviderModule {
    /// Adds this module's registrations to `providers`.
    fn register_providers(self, providers: &mut ProviderSet) -> DiResult<()>;
}

impl<F> ProviderModule for F
where
    F: FnOnce(&mut ProviderSet) -> DiResult<()>,
{
    fn register_providers(self, providers: &mut ProviderSet) -> DiResult<()> {
        self(providers)
    }
}
