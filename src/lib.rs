//! # stratum-di
//!
//! Hierarchical, token-keyed dependency injection for Rust.
//!
//! ## Features
//!
//! - **Tokens**: dependencies are keyed by Rust type or by string name
//! - **Three kinds of provider**: classes, pre-built values and factories
//! - **Injector trees**: children inherit their ancestors' providers and may shadow them
//! - **Per-scope caching**: an instance lives in the injector that built it
//! - **Cycle detection**: failures carry the full dependency path
//! - **Thread-safe**: concurrent resolution builds each cached instance at most once
//!
//! ## Quick Start
//!
//! ```rust
//! use stratum_di::{Args, BoxError, Constructible, Injector, ProviderSet, Resolver, Token};
//! use std::sync::Arc;
//!
//! struct Engine;
//! struct Tires;
//!
//! struct Car {
//!     engine: Arc<Engine>,
//!     tires: Arc<Tires>,
//! }
//!
//! impl Constructible for Car {
//!     fn construct(args: &mut Args) -> Result<Self, BoxError> {
//!         Ok(Car {
//!             engine: args.next()?,
//!             tires: args.next()?,
//!         })
//!     }
//! }
//!
//! let mut providers = ProviderSet::new();
//! providers
//!     .add_value(Engine)
//!     .add_value(Tires)
//!     .add_class::<Car>(vec![Token::of::<Engine>(), Token::of::<Tires>()]);
//!
//! let injector = Injector::root(providers);
//! let car = injector.get::<Car>().unwrap();
//! assert!(Arc::ptr_eq(&car, &injector.get::<Car>().unwrap()));
//! assert!(Arc::ptr_eq(&car.engine, &injector.get::<Engine>().unwrap()));
//! # let _ = &car.tires;
//! ```
//!
//! ## Scopes
//!
//! ```rust
//! use stratum_di::{Injector, ProviderDescriptor, ProviderSet, Resolver, Token};
//! use std::sync::atomic::{AtomicUsize, Ordering};
//! use std::sync::Arc;
//!
//! static REQUESTS: AtomicUsize = AtomicUsize::new(0);
//!
//! let root = Injector::root(ProviderSet::new());
//! let request_scope = || {
//!     let mut providers = ProviderSet::new();
//!     providers.add_factory(Token::named("request_id"), Vec::new(), |_| {
//!         Ok(REQUESTS.fetch_add(1, Ordering::SeqCst))
//!     });
//!     root.create_child(providers)
//! };
//!
//! let first = request_scope();
//! let second = request_scope();
//! let token = Token::named("request_id");
//! assert_eq!(*first.resolve_as::<usize>(&token).unwrap(), 0);
//! assert_eq!(*second.resolve_as::<usize>(&token).unwrap(), 1);
//! // cached per scope
//! assert_eq!(*first.resolve_as::<usize>(&token).unwrap(), 0);
//! ```
//!
//! ## Logging
//!
//! The container emits [`tracing`] events: registrations and teardown at
//! `DEBUG`, individual resolution steps at `TRACE`, provider failures at
//! `WARN`. Attach a [`TracingObserver`] for per-build timings.

// Module declarations
pub mod args;
pub mod cache;
pub mod collection;
pub mod config;
pub mod error;
pub mod injector;
pub mod lifetime;
pub mod observer;
pub mod provider;
pub mod token;
pub mod traits;
pub mod validation;

// Internal modules
mod engine;
mod internal;

// Re-export core types
pub use args::Args;
pub use cache::InstanceCache;
pub use collection::{DependencyManifest, ProviderModule, ProviderSet};
pub use config::{ConfigError, ConfigSource, EnvironmentConfigSource, InjectorConfig, MapConfigSource};
pub use error::{BoxError, DiError, DiResult};
pub use injector::Injector;
pub use lifetime::Lifetime;
pub use observer::{CountingObserver, DiObserver, TracingObserver};
pub use provider::{BuildFn, DisposeFn, Instance, ProviderDescriptor, ProviderKind, ProviderTable};
pub use token::{InjectionToken, Token, TokenRegistry};
pub use traits::{Constructible, Dispose, Resolver, ResolverCore};
pub use validation::{ValidationError, ValidationReport, ValidationWarning};
