//! Core traits for the dependency injection container.

mod constructible;
mod dispose;
mod resolver;

pub use constructible::Constructible;
pub use dispose::Dispose;
pub use resolver::{Resolver, ResolverCore};
