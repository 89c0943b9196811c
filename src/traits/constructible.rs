//! Constructible types for class providers.

use crate::args::Args;
use crate::error::BoxError;
use crate::token::Token;

/// A type the container can build from positional arguments.
///
/// `construct` receives the resolved dependencies in the order they were
/// declared for the type, either through a [`DependencyManifest`] entry or the
/// type's own [`dependencies`](Constructible::dependencies) list.
///
/// [`DependencyManifest`]: crate::DependencyManifest
///
/// # Examples
///
/// ```
/// use stratum_di::{Args, BoxError, Constructible, Injector, ProviderSet, Resolver, Token};
/// use std::sync::Arc;
///
/// struct Engine;
///
/// impl Constructible for Engine {
///     fn construct(_: &mut Args) -> Result<Self, BoxError> {
///         Ok(Engine)
///     }
/// }
///
/// struct Car {
///     engine: Arc<Engine>,
/// }
///
/// impl Constructible for Car {
///     fn construct(args: &mut Args) -> Result<Self, BoxError> {
///         Ok(Car { engine: args.next()? })
///     }
///
///     fn dependencies() -> Vec<Token> {
///         vec![Token::of::<Engine>()]
///     }
/// }
///
/// let mut providers = ProviderSet::new();
/// providers.add_constructible::<Engine>();
/// providers.add_constructible::<Car>();
///
/// let injector = Injector::root(providers);
/// let car = injector.get::<Car>().unwrap();
/// assert!(Arc::ptr_eq(&car.engine, &injector.get::<Engine>().unwrap()));
/// ```
pub trait Constructible: Sized + Send + Sync + 'static {
    /// Builds an instance from resolved arguments.
    fn construct(args: &mut Args) -> Result<Self, BoxError>;

    /// Tokens this type needs, in constructor order.
    fn dependencies() -> Vec<Token> {
        Vec::new()
    }
}
