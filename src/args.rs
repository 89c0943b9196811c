//! Resolved constructor arguments.

use std::sync::Arc;

use crate::error::{DiError, DiResult};
use crate::provider::Instance;
use crate::token::Token;

/// Ordered arguments handed to a class constructor or factory.
///
/// Values appear in the order the provider declared its dependencies. Typed
/// accessors check the concrete type and report [`DiError::TypeMismatch`]
/// naming the dependency token on failure.
///
/// # Examples
///
/// ```rust
/// use stratum_di::{Injector, ProviderDescriptor, ProviderSet, Resolver, Token};
///
/// let mut providers = ProviderSet::new();
/// providers.add_named_value("host", "localhost".to_string());
/// providers.add_named_value("port", 5432u16);
/// providers.add(
///     Token::named("dsn"),
///     ProviderDescriptor::factory(vec![Token::named("host"), Token::named("port")], |args| {
///         let host = args.next::<String>()?;
///         let port = args.next::<u16>()?;
///         Ok(format!("{}:{}", host, port))
///     }),
/// );
///
/// let injector = Injector::root(providers);
/// let dsn = injector.resolve_as::<String>(&Token::named("dsn")).unwrap();
/// assert_eq!(&*dsn, "localhost:5432");
/// ```
pub struct Args {
    owner: Token,
    deps: Arc<[Token]>,
    values: Vec<Instance>,
    cursor: usize,
}

impl Args {
    pub(crate) fn new(owner: Token, deps: Arc<[Token]>, values: Vec<Instance>) -> Self {
        debug_assert_eq!(deps.len(), values.len());
        Self {
            owner,
            deps,
            values,
            cursor: 0,
        }
    }

    /// Token of the provider being built.
    pub fn owner(&self) -> &Token {
        &self.owner
    }

    /// Dependency tokens, in declared order.
    pub fn dependencies(&self) -> &[Token] {
        &self.deps
    }

    /// Next argument as `Arc<T>`.
    pub fn next<T: Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        let index = self.cursor;
        let value = self.get::<T>(index)?;
        self.cursor += 1;
        Ok(value)
    }

    /// Next argument registered as `Arc<T>` for an unsized `T` (trait objects).
    pub fn next_trait<T: ?Sized + Send + Sync + 'static>(&mut self) -> DiResult<Arc<T>> {
        let index = self.cursor;
        let any = self.any_at(index)?;
        let value = downcast_trait::<T>(&self.deps[index], any)?;
        self.cursor += 1;
        Ok(value)
    }

    /// Next argument without a type check.
    pub fn next_any(&mut self) -> DiResult<Instance> {
        let value = self.any_at(self.cursor)?;
        self.cursor += 1;
        Ok(value)
    }

    /// Argument at `index` as `Arc<T>`, independent of the cursor.
    pub fn get<T: Send + Sync + 'static>(&self, index: usize) -> DiResult<Arc<T>> {
        let any = self.any_at(index)?;
        downcast::<T>(&self.deps[index], any)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Arguments not yet consumed through the `next*` accessors.
    pub fn remaining(&self) -> usize {
        self.values.len().saturating_sub(self.cursor)
    }

    /// Consumes the arguments, returning the raw instances in order.
    pub fn into_vec(self) -> Vec<Instance> {
        self.values
    }

    fn any_at(&self, index: usize) -> DiResult<Instance> {
        self.values
            .get(index)
            .cloned()
            .ok_or_else(|| DiError::MissingArgument {
                token: self.owner.clone(),
                index,
            })
    }
}

impl std::fmt::Debug for Args {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Args")
            .field("owner", &self.owner)
            .field("deps", &self.deps)
            .field("cursor", &self.cursor)
            .finish()
    }
}

pub(crate) fn downcast<T: Send + Sync + 'static>(token: &Token, any: Instance) -> DiResult<Arc<T>> {
    any.downcast::<T>().map_err(|_| DiError::TypeMismatch {
        token: token.clone(),
        expected: std::any::type_name::<T>(),
    })
}

// Trait objects are stored as Arc<Arc<dyn Trait>>.
pub(crate) fn downcast_trait<T: ?Sized + Send + Sync + 'static>(
    token: &Token,
    any: Instance,
) -> DiResult<Arc<T>> {
    any.downcast::<Arc<T>>()
        .map(|boxed| (*boxed).clone())
        .map_err(|_| DiError::TypeMismatch {
            token: token.clone(),
            expected: std::any::type_name::<T>(),
        })
}
