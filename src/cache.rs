//! Per-scope singleton storage with at-most-once construction.
//!
//! Each token owns a slot. The first caller to claim an empty slot runs the
//! build; concurrent callers for the same token wait on the slot and observe
//! the same instance once the build completes. A failed build leaves the slot
//! empty so the next caller retries from scratch.
//!
//! Claims and waits are recorded in a [`BuildTracker`] shared by every cache
//! of one injector tree. Before a caller waits on a slot that another
//! resolution is building, it follows the chain of blocked builders. If the
//! chain leads back to the caller, the wait could never end, and the caller
//! fails with [`DiError::CyclicDependency`] instead.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use once_cell::sync::OnceCell;
use parking_lot::{Condvar, Mutex, RwLock};
use tracing::trace;

use crate::error::{DiError, DiResult};
use crate::provider::{Instance, TokenMap};
use crate::token::Token;

#[derive(Default)]
struct Slot {
    value: OnceCell<Instance>,
    ready: Condvar,
}

impl Slot {
    fn filled(instance: Instance) -> Self {
        let slot = Slot::default();
        let _ = slot.value.set(instance);
        slot
    }
}

type SlotRef = Arc<Slot>;

static NEXT_BUILD_ID: AtomicU64 = AtomicU64::new(1);

/// Fresh identity for one top-level resolution.
pub(crate) fn next_build_id() -> u64 {
    NEXT_BUILD_ID.fetch_add(1, Ordering::Relaxed)
}

/// What the cache needs to know about the resolution asking it to build.
pub(crate) trait BuildContext {
    fn build_id(&self) -> u64;

    /// Tokens the resolution is currently building, outermost first.
    fn build_path(&self) -> &[Token];
}

/// A caller outside any resolution.
struct Detached(u64);

impl BuildContext for Detached {
    fn build_id(&self) -> u64 {
        self.0
    }

    fn build_path(&self) -> &[Token] {
        &[]
    }
}

/// Who is building which slot, and who is blocked on which slot.
#[derive(Default)]
pub(crate) struct BuildTracker {
    state: Mutex<TrackerState>,
}

#[derive(Default)]
struct TrackerState {
    // slot address -> resolution building it
    builders: HashMap<usize, u64>,
    // resolution -> slot it is blocked on
    waiting: HashMap<u64, Waiting>,
}

struct Waiting {
    slot: usize,
    token: Token,
    path: Vec<Token>,
}

impl TrackerState {
    /// Follows builders and their waits from `slot`. Returns the token cycle
    /// when the chain ends at `me`, i.e. when waiting on `slot` would never
    /// return.
    fn cycle_back_to(&self, me: u64, my_path: &[Token], slot: usize, token: &Token) -> Option<Vec<Token>> {
        let mut through: Vec<Token> = Vec::new();
        let mut slot = slot;
        let mut token = token.clone();
        for _ in 0..=self.waiting.len() {
            let owner = *self.builders.get(&slot)?;
            if owner == me {
                let start = my_path.iter().position(|t| *t == token).unwrap_or(0);
                let mut path = my_path[start..].to_vec();
                path.extend(through);
                path.push(token);
                return Some(path);
            }
            let blocked = self.waiting.get(&owner)?;
            let start = blocked.path.iter().position(|t| *t == token).unwrap_or(0);
            through.extend_from_slice(&blocked.path[start..]);
            slot = blocked.slot;
            token = blocked.token.clone();
        }
        None
    }
}

// Releases a claimed slot and wakes its waiters, also when the build panics.
struct Claim<'a> {
    tracker: &'a BuildTracker,
    slot: &'a Slot,
    key: usize,
}

impl Drop for Claim<'_> {
    fn drop(&mut self) {
        self.tracker.state.lock().builders.remove(&self.key);
        self.slot.ready.notify_all();
    }
}

/// Store of already-built singleton instances for one injector scope.
///
/// The map lock is never held while a build runs, so builds for different
/// tokens proceed in parallel and may recurse into the same cache.
///
/// # Examples
///
/// ```rust
/// use stratum_di::{InstanceCache, Token};
/// use std::sync::Arc;
///
/// let cache = InstanceCache::new();
/// let token = Token::named("answer");
///
/// let (first, built) = cache
///     .get_or_try_init(&token, || Ok(Arc::new(42u32) as _))
///     .unwrap();
/// assert!(built);
///
/// let (second, built) = cache
///     .get_or_try_init(&token, || Ok(Arc::new(0u32) as _))
///     .unwrap();
/// assert!(!built);
/// assert!(Arc::ptr_eq(&first, &second));
///
/// cache.clear();
/// assert!(cache.get(&token).is_none());
/// ```
#[derive(Default)]
pub struct InstanceCache {
    slots: RwLock<TokenMap<SlotRef>>,
    tracker: Arc<BuildTracker>,
}

impl InstanceCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Empty cache for a child scope. Builds in both caches are tracked
    /// together so waits across scopes are seen.
    pub(crate) fn for_child(&self) -> Self {
        Self {
            slots: RwLock::default(),
            tracker: self.tracker.clone(),
        }
    }

    /// Cached instance for `token`, if one has been built.
    #[inline]
    pub fn get(&self, token: &Token) -> Option<Instance> {
        self.slots.read().get(token).and_then(|slot| slot.value.get().cloned())
    }

    /// Stores `instance` for `token`, replacing any previous instance.
    pub fn put(&self, token: Token, instance: Instance) {
        self.slots.write().insert(token, Arc::new(Slot::filled(instance)));
    }

    /// Returns the cached instance or runs `build` to create it.
    ///
    /// The boolean is `true` when this call ran `build` successfully.
    pub fn get_or_try_init<F>(&self, token: &Token, build: F) -> DiResult<(Instance, bool)>
    where
        F: FnOnce() -> DiResult<Instance>,
    {
        let mut caller = Detached(next_build_id());
        self.get_or_build(token, &mut caller, |_| build())
    }

    /// Like [`get_or_try_init`](Self::get_or_try_init) on behalf of a
    /// resolution, failing with `CyclicDependency` where waiting for another
    /// builder would deadlock.
    pub(crate) fn get_or_build<C, F>(&self, token: &Token, ctx: &mut C, build: F) -> DiResult<(Instance, bool)>
    where
        C: BuildContext,
        F: FnOnce(&mut C) -> DiResult<Instance>,
    {
        let slot = self.slot_for(token);
        if let Some(hit) = slot.value.get() {
            return Ok((hit.clone(), false));
        }

        let key = Arc::as_ptr(&slot) as usize;
        let me = ctx.build_id();
        {
            let mut state = self.tracker.state.lock();
            loop {
                if let Some(hit) = slot.value.get() {
                    return Ok((hit.clone(), false));
                }
                if !state.builders.contains_key(&key) {
                    state.builders.insert(key, me);
                    break;
                }
                if let Some(path) = state.cycle_back_to(me, ctx.build_path(), key, token) {
                    trace!(token = %token, path = ?path, "waiting would deadlock");
                    return Err(DiError::CyclicDependency(path));
                }
                state.waiting.insert(
                    me,
                    Waiting {
                        slot: key,
                        token: token.clone(),
                        path: ctx.build_path().to_vec(),
                    },
                );
                slot.ready.wait(&mut state);
                state.waiting.remove(&me);
            }
        }

        let claim = Claim {
            tracker: &self.tracker,
            slot: &slot,
            key,
        };
        let instance = build(ctx)?;
        let _ = slot.value.set(instance.clone());
        drop(claim);
        Ok((instance, true))
    }

    /// Drops the cached instance for `token`.
    pub fn evict(&self, token: &Token) -> Option<Instance> {
        self.slots
            .write()
            .remove(token)
            .and_then(|slot| slot.value.get().cloned())
    }

    /// Drops every cached instance, returning how many were built.
    pub fn clear(&self) -> usize {
        let mut slots = self.slots.write();
        let built = slots.values().filter(|slot| slot.value.get().is_some()).count();
        slots.clear();
        built
    }

    pub fn contains(&self, token: &Token) -> bool {
        self.get(token).is_some()
    }

    /// Number of built instances.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.value.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    fn slot_for(&self, token: &Token) -> SlotRef {
        if let Some(slot) = self.slots.read().get(token) {
            return slot.clone();
        }
        self.slots
            .write()
            .entry(token.clone())
            .or_insert_with(|| Arc::new(Slot::default()))
            .clone()
    }
}

impl std::fmt::Debug for InstanceCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InstanceCache")
            .field("built", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Barrier;
    use std::thread;
    use std::time::Duration;

    #[test]
    fn failed_build_leaves_cell_empty() {
        let cache = InstanceCache::new();
        let token = Token::named("flaky");

        let err = cache.get_or_try_init(&token, || Err(DiError::NotFound(Token::named("config"))));
        assert!(matches!(err, Err(DiError::NotFound(_))));
        assert!(cache.get(&token).is_none());
        assert!(cache.is_empty());

        let (value, built) = cache
            .get_or_try_init(&token, || Ok(Arc::new(1u8) as Instance))
            .unwrap();
        assert!(built);
        assert_eq!(value.downcast_ref::<u8>(), Some(&1));
    }

    #[test]
    fn put_overwrites_and_evict_removes() {
        let cache = InstanceCache::new();
        let token = Token::of::<u8>();
        cache.put(token.clone(), Arc::new(1u8));
        cache.put(token.clone(), Arc::new(2u8));
        assert_eq!(cache.get(&token).unwrap().downcast_ref::<u8>(), Some(&2));

        assert!(cache.evict(&token).is_some());
        assert!(!cache.contains(&token));
    }

    #[test]
    fn concurrent_builders_run_once() {
        let cache = Arc::new(InstanceCache::new());
        let builds = Arc::new(AtomicUsize::new(0));
        let barrier = Arc::new(Barrier::new(8));
        let token = Token::named("slow");

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let cache = cache.clone();
                let builds = builds.clone();
                let barrier = barrier.clone();
                let token = token.clone();
                thread::spawn(move || {
                    barrier.wait();
                    cache
                        .get_or_try_init(&token, || {
                            builds.fetch_add(1, Ordering::SeqCst);
                            thread::sleep(Duration::from_millis(20));
                            Ok(Arc::new(7u64) as Instance)
                        })
                        .unwrap()
                        .0
                })
            })
            .collect();

        let results: Vec<Instance> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert_eq!(builds.load(Ordering::SeqCst), 1);
        for r in &results[1..] {
            assert!(Arc::ptr_eq(&results[0], r));
        }
    }

    #[test]
    fn wait_chain_back_to_the_caller_is_a_cycle() {
        let (a, b) = (Token::named("A"), Token::named("B"));
        let mut state = TrackerState::default();
        // resolution 1 builds A and waits on B; resolution 2 builds B
        state.builders.insert(10, 1);
        state.builders.insert(20, 2);
        state.waiting.insert(
            1,
            Waiting {
                slot: 20,
                token: b.clone(),
                path: vec![a.clone()],
            },
        );

        let path = state.cycle_back_to(2, &[b.clone()], 10, &a).unwrap();
        assert_eq!(path, vec![b.clone(), a.clone(), b.clone()]);

        // a builder that is still running is not a deadlock
        state.waiting.clear();
        assert!(state.cycle_back_to(2, &[b], 10, &a).is_none());
    }

    #[test]
    fn panicking_build_releases_the_slot() {
        let cache = Arc::new(InstanceCache::new());
        let token = Token::named("fragile");

        let panicking = {
            let cache = cache.clone();
            let token = token.clone();
            thread::spawn(move || cache.get_or_try_init(&token, || panic!("constructor panicked")))
        };
        assert!(panicking.join().is_err());

        let (value, built) = cache.get_or_try_init(&token, || Ok(Arc::new(3u8) as Instance)).unwrap();
        assert!(built);
        assert_eq!(value.downcast_ref::<u8>(), Some(&3));
    }
}
