//! Per-scope provider table.

use super::{ProviderDescriptor, TokenMap};
use crate::token::Token;

/// Maps each token to its provider descriptor within one injector scope.
///
/// Registering a token that is already present replaces the descriptor;
/// the token keeps its original position in registration order.
///
/// # Examples
///
/// ```rust
/// use stratum_di::{ProviderDescriptor, ProviderTable, Token};
///
/// let mut table = ProviderTable::new();
/// table.register(Token::named("answer"), ProviderDescriptor::value(41u32));
/// let previous = table.register(Token::named("answer"), ProviderDescriptor::value(42u32));
///
/// assert!(previous.is_some());
/// assert_eq!(table.len(), 1);
/// assert!(table.lookup_local(&Token::named("answer")).is_some());
/// assert!(table.lookup_local(&Token::named("question")).is_none());
/// ```
#[derive(Default, Clone)]
pub struct ProviderTable {
    entries: TokenMap<ProviderDescriptor>,
    order: Vec<Token>,
}

impl ProviderTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `descriptor` for `token`, returning the descriptor it replaced.
    pub fn register(&mut self, token: Token, descriptor: ProviderDescriptor) -> Option<ProviderDescriptor> {
        let previous = self.entries.insert(token.clone(), descriptor);
        if previous.is_none() {
            self.order.push(token);
        }
        previous
    }

    /// Descriptor registered in this scope only; no parent fallback.
    #[inline]
    pub fn lookup_local(&self, token: &Token) -> Option<&ProviderDescriptor> {
        self.entries.get(token)
    }

    #[inline]
    pub fn contains(&self, token: &Token) -> bool {
        self.entries.contains_key(token)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Tokens in first-registration order.
    pub fn tokens(&self) -> impl Iterator<Item = &Token> {
        self.order.iter()
    }

    /// Token/descriptor pairs in first-registration order.
    pub fn iter(&self) -> impl Iterator<Item = (&Token, &ProviderDescriptor)> {
        self.order
            .iter()
            .filter_map(move |token| self.entries.get(token).map(|d| (token, d)))
    }
}

impl std::fmt::Debug for ProviderTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}
