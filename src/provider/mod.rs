//! Provider descriptors and the per-scope provider table.

use std::any::Any;
use std::collections::HashMap;
use std::sync::Arc;

use crate::token::Token;

pub mod descriptor;
pub mod table;

pub use descriptor::{BuildFn, DisposeFn, ProviderDescriptor, ProviderKind};
pub use table::ProviderTable;

/// Type-erased instance as stored and handed out by the container.
pub type Instance = Arc<dyn Any + Send + Sync>;

#[cfg(feature = "ahash")]
pub(crate) type TokenMap<V> = HashMap<Token, V, ahash::RandomState>;
#[cfg(not(feature = "ahash"))]
pub(crate) type TokenMap<V> = HashMap<Token, V>;
