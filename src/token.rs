//! Lookup tokens for the dependency injection container.

use std::any::TypeId;
use std::collections::HashSet;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::marker::PhantomData;
use std::sync::Arc;

use parking_lot::Mutex;

/// Key identifying a requestable dependency.
///
/// A token is either the identity of a Rust type or a string name. The two
/// kinds never coerce into each other: `Token::named("Engine")` and
/// `Token::of::<Engine>()` are different tokens even though they read alike.
///
/// # Examples
///
/// ```rust
/// use stratum_di::Token;
///
/// struct Engine;
///
/// let by_type = Token::of::<Engine>();
/// let by_name = Token::named("Engine");
///
/// assert_eq!(by_type, Token::of::<Engine>());
/// assert_eq!(by_name, Token::named("Engine"));
/// assert_ne!(by_type, by_name);
/// ```
#[derive(Debug, Clone)]
pub enum Token {
    /// Type identity, with the type name kept for diagnostics only.
    Type(TypeId, &'static str),
    /// String token, compared by content.
    Name(Arc<str>),
}

impl Token {
    /// Token for the concrete type `T`.
    #[inline]
    pub fn of<T: ?Sized + 'static>() -> Self {
        Token::Type(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// String token.
    pub fn named(name: impl Into<Arc<str>>) -> Self {
        Token::Name(name.into())
    }

    /// Human-readable name used in errors and logs.
    ///
    /// ```rust
    /// use stratum_di::Token;
    ///
    /// assert_eq!(Token::named("api_url").display_name(), "api_url");
    /// assert_eq!(Token::of::<u32>().display_name(), "u32");
    /// ```
    pub fn display_name(&self) -> &str {
        match self {
            Token::Type(_, name) => name,
            Token::Name(name) => name,
        }
    }

    /// Returns the `TypeId` for type tokens.
    pub fn type_id(&self) -> Option<TypeId> {
        match self {
            Token::Type(id, _) => Some(*id),
            Token::Name(_) => None,
        }
    }

    pub fn is_named(&self) -> bool {
        matches!(self, Token::Name(_))
    }
}

// Type tokens compare on TypeId only; the name is diagnostic.
impl PartialEq for Token {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Token::Type(a, _), Token::Type(b, _)) => a == b,
            (Token::Name(a), Token::Name(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Token {}

impl Hash for Token {
    #[inline]
    fn hash<H: Hasher>(&self, state: &mut H) {
        match self {
            Token::Type(id, _) => {
                0u8.hash(state);
                id.hash(state);
            }
            Token::Name(name) => {
                1u8.hash(state);
                name.hash(state);
            }
        }
    }
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Token::Type(_, name) => f.write_str(name),
            Token::Name(name) => write!(f, "\"{}\"", name),
        }
    }
}

impl From<&str> for Token {
    fn from(name: &str) -> Self {
        Token::named(name)
    }
}

impl From<String> for Token {
    fn from(name: String) -> Self {
        Token::named(name)
    }
}

impl<T: ?Sized + 'static> From<&InjectionToken<T>> for Token {
    fn from(token: &InjectionToken<T>) -> Self {
        token.token.clone()
    }
}

/// String token that remembers the type it resolves to.
///
/// Useful for values that have no type of their own worth keying on, such as
/// configuration strings or numbers.
///
/// ```rust
/// use stratum_di::{InjectionToken, Injector, ProviderSet, Resolver};
///
/// let api_url: InjectionToken<String> = InjectionToken::new("api_url");
///
/// let mut providers = ProviderSet::new();
/// providers.add_named_value(api_url.name(), "https://example.test".to_string());
///
/// let injector = Injector::root(providers);
/// assert_eq!(&*injector.get_token(&api_url).unwrap(), "https://example.test");
/// ```
pub struct InjectionToken<T: ?Sized> {
    token: Token,
    _marker: PhantomData<fn() -> Box<T>>,
}

impl<T: ?Sized + 'static> InjectionToken<T> {
    pub fn new(name: impl Into<Arc<str>>) -> Self {
        Self {
            token: Token::named(name),
            _marker: PhantomData,
        }
    }

    pub fn token(&self) -> &Token {
        &self.token
    }

    pub fn name(&self) -> &str {
        self.token.display_name()
    }
}

impl<T: ?Sized> Clone for InjectionToken<T> {
    fn clone(&self) -> Self {
        Self {
            token: self.token.clone(),
            _marker: PhantomData,
        }
    }
}

impl<T: ?Sized> fmt::Debug for InjectionToken<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("InjectionToken").field(&self.token).finish()
    }
}

/// Canonicalizes tokens shared by an injector tree.
///
/// String tokens are interned so every registration and lookup of the same
/// name shares one allocation. Type tokens are already canonical and pass
/// through unchanged.
#[derive(Debug, Default)]
pub struct TokenRegistry {
    names: Mutex<HashSet<Arc<str>>>,
}

impl TokenRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Interned string token for `name`.
    pub fn intern(&self, name: &str) -> Token {
        let mut names = self.names.lock();
        if let Some(existing) = names.get(name) {
            return Token::Name(existing.clone());
        }
        let interned: Arc<str> = Arc::from(name);
        names.insert(interned.clone());
        Token::Name(interned)
    }

    /// Canonical form of `token`.
    pub fn canonicalize(&self, token: Token) -> Token {
        match token {
            Token::Name(name) => {
                let mut names = self.names.lock();
                if let Some(existing) = names.get(&name) {
                    return Token::Name(existing.clone());
                }
                names.insert(name.clone());
                Token::Name(name)
            }
            ty @ Token::Type(..) => ty,
        }
    }

    /// Looks up a previously interned name without inserting it.
    pub fn lookup(&self, name: &str) -> Option<Token> {
        self.names.lock().get(name).map(|n| Token::Name(n.clone()))
    }

    pub fn len(&self) -> usize {
        self.names.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.lock().is_empty()
    }
}
