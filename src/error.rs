//! Error types for the dependency injection container.

use thiserror::Error;

use crate::token::Token;

/// Boxed cause carried by [`DiError::ConstructionFailure`].
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Dependency injection errors
///
/// Every variant names the token it concerns so failures can be traced back
/// to a registration.
///
/// # Examples
///
/// ```rust
/// use stratum_di::{DiError, Injector, ProviderSet, Token};
///
/// let injector = Injector::root(ProviderSet::new());
/// match injector.resolve(&Token::named("missing")) {
///     Err(DiError::NotFound(token)) => assert_eq!(token, Token::named("missing")),
///     _ => unreachable!(),
/// }
///
/// let cycle = DiError::CyclicDependency(vec![
///     Token::named("A"),
///     Token::named("B"),
///     Token::named("A"),
/// ]);
/// assert_eq!(cycle.to_string(), "Cyclic dependency: \"A\" -> \"B\" -> \"A\"");
/// ```
#[derive(Debug, Error)]
pub enum DiError {
    /// No provider in the resolving scope or any ancestor
    #[error("No provider for {0}")]
    NotFound(Token),
    /// Dependency chain revisits a token (includes the full path)
    #[error("Cyclic dependency: {}", join_path(.0))]
    CyclicDependency(Vec<Token>),
    /// The class constructor or factory failed
    #[error("Failed to construct {token}: {source}")]
    ConstructionFailure {
        token: Token,
        #[source]
        source: BoxError,
    },
    /// Resolved instance is not of the requested type
    #[error("Type mismatch for {token}: expected {expected}")]
    TypeMismatch { token: Token, expected: &'static str },
    /// Constructor asked for more arguments than its dependency list declares
    #[error("Missing argument {index} while constructing {token}")]
    MissingArgument { token: Token, index: usize },
    /// Maximum recursion depth exceeded
    #[error("Max depth {0} exceeded")]
    DepthExceeded(usize),
    /// Resolution went through an injector that has been destroyed
    #[error("Injector {0} has been destroyed")]
    Disposed(String),
}

impl DiError {
    /// Token the error is about, when there is a single one.
    pub fn token(&self) -> Option<&Token> {
        match self {
            DiError::NotFound(token)
            | DiError::ConstructionFailure { token, .. }
            | DiError::TypeMismatch { token, .. }
            | DiError::MissingArgument { token, .. } => Some(token),
            DiError::CyclicDependency(path) => path.first(),
            DiError::DepthExceeded(_) | DiError::Disposed(_) => None,
        }
    }

    pub(crate) fn construction(token: &Token, source: BoxError) -> Self {
        DiError::ConstructionFailure {
            token: token.clone(),
            source,
        }
    }
}

fn join_path(path: &[Token]) -> String {
    path.iter()
        .map(|t| t.to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}

/// Result type for DI operations
pub type DiResult<T> = Result<T, DiError>;
