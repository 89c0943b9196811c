//! Diagnostic observers for resolution events.
//!
//! Observers see every build an injector performs: when it starts, how long it
//! took, and why it failed. Cache hits and parent delegation are not reported;
//! those show up as `trace!` events from the engine instead.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use crate::error::DiError;
use crate::token::Token;

/// Observer trait for dependency injection resolution events.
///
/// Observer calls are made synchronously on the resolving thread. Keep
/// implementations lightweight.
///
/// # Examples
///
/// ```
/// use stratum_di::{DiObserver, Injector, ProviderSet, Resolver, Token};
/// use std::sync::{Arc, Mutex};
/// use std::time::Duration;
///
/// #[derive(Default)]
/// struct Recorder {
///     built: Mutex<Vec<String>>,
/// }
///
/// impl DiObserver for Recorder {
///     fn resolving(&self, _: &Token) {}
///
///     fn resolved(&self, token: &Token, _: Duration) {
///         self.built.lock().unwrap().push(token.to_string());
///     }
/// }
///
/// let recorder = Arc::new(Recorder::default());
/// let mut providers = ProviderSet::new();
/// providers.add_observer(recorder.clone());
/// providers.add_value(1u8);
///
/// let injector = Injector::root(providers);
/// injector.get::<u8>().unwrap();
/// injector.get::<u8>().unwrap();
/// assert_eq!(*recorder.built.lock().unwrap(), vec!["u8".to_string()]);
/// ```
pub trait DiObserver: Send + Sync {
    /// Called before a provider owned by the injector is built.
    fn resolving(&self, token: &Token);

    /// Called after a successful build.
    fn resolved(&self, token: &Token, duration: Duration);

    /// Called when a build fails, including failures in its dependencies.
    fn failed(&self, token: &Token, error: &DiError) {
        let _ = (token, error);
    }
}

/// Collection of observers attached to one injector.
#[derive(Clone, Default)]
pub(crate) struct Observers {
    observers: Vec<Arc<dyn DiObserver>>,
}

impl Observers {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn add(&mut self, observer: Arc<dyn DiObserver>) {
        self.observers.push(observer);
    }

    pub(crate) fn extend(&mut self, other: Observers) {
        self.observers.extend(other.observers);
    }

    #[inline]
    pub(crate) fn has_observers(&self) -> bool {
        !self.observers.is_empty()
    }

    pub(crate) fn len(&self) -> usize {
        self.observers.len()
    }

    pub(crate) fn resolving(&self, token: &Token) {
        for observer in &self.observers {
            observer.resolving(token);
        }
    }

    pub(crate) fn resolved(&self, token: &Token, duration: Duration) {
        for observer in &self.observers {
            observer.resolved(token, duration);
        }
    }

    pub(crate) fn failed(&self, token: &Token, error: &DiError) {
        for observer in &self.observers {
            observer.failed(token, error);
        }
    }
}

/// Observer that forwards resolution events to `tracing`.
///
/// Builds are logged at `DEBUG`, failures at `WARN`. Every event carries the
/// observer's label so several injector trees can share one subscriber.
///
/// ```
/// use stratum_di::{Injector, ProviderSet, TracingObserver};
/// use std::sync::Arc;
///
/// let mut providers = ProviderSet::new();
/// providers.add_observer(Arc::new(TracingObserver::with_label("app")));
/// let injector = Injector::root(providers);
/// # let _ = injector;
/// ```
#[derive(Debug, Clone)]
pub struct TracingObserver {
    label: String,
}

impl TracingObserver {
    pub fn new() -> Self {
        Self::with_label("stratum-di")
    }

    pub fn with_label(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl DiObserver for TracingObserver {
    fn resolving(&self, token: &Token) {
        tracing::trace!(label = %self.label, token = %token, "resolving");
    }

    fn resolved(&self, token: &Token, duration: Duration) {
        tracing::debug!(
            label = %self.label,
            token = %token,
            elapsed_us = duration.as_micros() as u64,
            "resolved"
        );
    }

    fn failed(&self, token: &Token, error: &DiError) {
        tracing::warn!(label = %self.label, token = %token, error = %error, "resolution failed");
    }
}

/// Observer that counts builds, failures and total build time.
#[derive(Debug, Default)]
pub struct CountingObserver {
    builds: AtomicU64,
    failures: AtomicU64,
    total_nanos: AtomicU64,
}

impl CountingObserver {
    pub fn new() -> Self {
        Self::default()
    }

    /// Successful builds observed.
    pub fn builds(&self) -> u64 {
        self.builds.load(Ordering::Relaxed)
    }

    pub fn failures(&self) -> u64 {
        self.failures.load(Ordering::Relaxed)
    }

    pub fn total_time(&self) -> Duration {
        Duration::from_nanos(self.total_nanos.load(Ordering::Relaxed))
    }

    /// Mean build time, zero before the first build.
    pub fn average_time(&self) -> Duration {
        match self.builds() {
            0 => Duration::ZERO,
            n => self.total_time() / n as u32,
        }
    }
}

impl DiObserver for CountingObserver {
    fn resolving(&self, _token: &Token) {}

    fn resolved(&self, _token: &Token, duration: Duration) {
        self.builds.fetch_add(1, Ordering::Relaxed);
        self.total_nanos
            .fetch_add(duration.as_nanos() as u64, Ordering::Relaxed);
    }

    fn failed(&self, _token: &Token, _error: &DiError) {
        self.failures.fetch_add(1, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counting_observer_tracks_builds_and_failures() {
        let counter = CountingObserver::new();
        assert_eq!(counter.average_time(), Duration::ZERO);

        counter.resolved(&Token::named("a"), Duration::from_millis(2));
        counter.resolved(&Token::named("b"), Duration::from_millis(4));
        counter.failed(&Token::named("c"), &DiError::NotFound(Token::named("c")));

        assert_eq!(counter.builds(), 2);
        assert_eq!(counter.failures(), 1);
        assert_eq!(counter.total_time(), Duration::from_millis(6));
        assert_eq!(counter.average_time(), Duration::from_millis(3));
    }

    #[test]
    fn observers_fan_out() {
        let a = Arc::new(CountingObserver::new());
        let b = Arc::new(CountingObserver::new());
        let mut observers = Observers::new();
        assert!(!observers.has_observers());
        observers.add(a.clone());
        observers.add(b.clone());
        assert_eq!(observers.len(), 2);

        observers.resolved(&Token::named("x"), Duration::from_micros(1));
        assert_eq!(a.builds(), 1);
        assert_eq!(b.builds(), 1);
    }
}
