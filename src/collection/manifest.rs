//! External dependency metadata for constructible types.

use std::any::TypeId;
use std::collections::HashMap;

use crate::token::Token;

#[derive(Debug, Clone)]
struct ManifestEntry {
    type_name: &'static str,
    deps: Vec<Token>,
}

/// Maps constructible types to their ordered dependency tokens.
///
/// Lets a type be registered with [`ProviderSet::add_type`] without the type
/// itself listing what it needs, for example when the list comes from a
/// generated table or a plugin description.
///
/// [`ProviderSet::add_type`]: crate::ProviderSet::add_type
///
/// ```rust
/// use stratum_di::{DependencyManifest, Token};
///
/// struct Repo;
///
/// let mut manifest = DependencyManifest::new();
/// manifest.declare::<Repo>(vec![Token::named("dsn")]);
///
/// assert_eq!(manifest.dependencies_of::<Repo>(), Some(&[Token::named("dsn")][..]));
/// assert!(manifest.dependencies_of::<String>().is_none());
/// ```
#[derive(Debug, Clone, Default)]
pub struct DependencyManifest {
    entries: HashMap<TypeId, ManifestEntry>,
}

impl DependencyManifest {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the dependencies of `T`, replacing any earlier declaration.
    pub fn declare<T: 'static>(&mut self, deps: Vec<Token>) -> &mut Self {
        self.entries.insert(
            TypeId::of::<T>(),
            ManifestEntry {
                type_name: std::any::type_name::<T>(),
                deps,
            },
        );
        self
    }

    pub fn dependencies_of<T: 'static>(&self) -> Option<&[Token]> {
        self.entries
            .get(&TypeId::of::<T>())
            .map(|entry| entry.deps.as_slice())
    }

    pub fn contains<T: 'static>(&self) -> bool {
        self.entries.contains_key(&TypeId::of::<T>())
    }

    /// Names of the declared types, sorted.
    pub fn type_names(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.entries.values().map(|e| e.type_name).collect();
        names.sort_unstable();
        names
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
