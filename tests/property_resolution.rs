/// Property-based tests for resolution
///
/// Random acyclic graphs always resolve, also from several threads at once,
/// random graphs with a back edge always report a cycle, and scope shadowing
/// never leaks upwards.

use proptest::prelude::*;
use stratum_di::{DiError, Injector, ProviderDescriptor, ProviderSet, Resolver, Token};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Barrier};

fn node(i: usize) -> Token {
    Token::named(format!("n{}", i))
}

/// Each node `i` may depend on any node with a larger index, so the graph
/// is acyclic by construction.
fn dag_edges() -> impl Strategy<Value = Vec<Vec<usize>>> {
    (2usize..12).prop_flat_map(|n| {
        (0..n)
            .map(|i| proptest::collection::vec((i + 1)..=n, 0..3))
            .collect::<Vec<_>>()
    })
}

fn providers_for(edges: &[Vec<usize>]) -> ProviderSet {
    counted_providers(edges, &Arc::new(build_counters(edges.len())))
}

fn build_counters(n: usize) -> Vec<AtomicUsize> {
    (0..n).map(|_| AtomicUsize::new(0)).collect()
}

/// Like `providers_for`, counting how often each node's factory runs.
fn counted_providers(edges: &[Vec<usize>], builds: &Arc<Vec<AtomicUsize>>) -> ProviderSet {
    let leaf = edges.len();
    let mut providers = ProviderSet::new();
    for (i, deps) in edges.iter().enumerate() {
        let deps: Vec<Token> = deps.iter().map(|d| node(*d)).collect();
        let builds = builds.clone();
        providers.add(
            node(i),
            ProviderDescriptor::factory(deps, move |args| {
                builds[i].fetch_add(1, Ordering::SeqCst);
                let mut sum = i as u64;
                while args.remaining() > 0 {
                    sum += *args.next::<u64>()?;
                }
                Ok(sum)
            }),
        );
    }
    providers.add(node(leaf), ProviderDescriptor::value(0u64));
    providers
}

proptest! {
    #[test]
    fn acyclic_graphs_always_resolve(edges in dag_edges()) {
        let injector = Injector::root(providers_for(&edges));
        for i in 0..edges.len() {
            let first = injector.resolve_as::<u64>(&node(i)).unwrap();
            let again = injector.resolve_as::<u64>(&node(i)).unwrap();
            prop_assert!(Arc::ptr_eq(&first, &again));
        }
        prop_assert_eq!(injector.cached_count(), edges.len() + 1);
        prop_assert!(injector.validate().is_ok());
    }

    #[test]
    fn back_edge_is_always_reported_as_a_cycle(len in 1usize..10) {
        // chain n0 -> n1 -> ... -> n(len-1) -> n0
        let mut providers = ProviderSet::new();
        for i in 0..len {
            let next = (i + 1) % len;
            providers.add(node(i), ProviderDescriptor::factory(vec![node(next)], |_| Ok(())));
        }
        let injector = Injector::root(providers);

        match injector.resolve(&node(0)) {
            Err(DiError::CyclicDependency(path)) => {
                prop_assert_eq!(path.len(), len + 1);
                prop_assert_eq!(path.first(), path.last());
            }
            other => prop_assert!(false, "unexpected {:?}", other),
        }
        prop_assert_eq!(injector.cached_count(), 0);
        prop_assert!(injector.validate().is_err());
    }

    #[test]
    fn shadowing_never_leaks_to_the_parent(root_value in any::<u32>(), child_value in any::<u32>()) {
        let mut root_providers = ProviderSet::new();
        root_providers.add_named_value("value", root_value);
        let root = Injector::root(root_providers);

        let mut child_providers = ProviderSet::new();
        child_providers.add_named_value("value", child_value);
        let child = root.create_child(child_providers);
        let sibling = root.create_child(ProviderSet::new());

        let token = Token::named("value");
        prop_assert_eq!(*child.resolve_as::<u32>(&token).unwrap(), child_value);
        prop_assert_eq!(*root.resolve_as::<u32>(&token).unwrap(), root_value);
        prop_assert_eq!(*sibling.resolve_as::<u32>(&token).unwrap(), root_value);
    }

    #[test]
    fn optional_resolution_matches_registration(register in any::<bool>()) {
        let mut providers = ProviderSet::new();
        if register {
            providers.add_value(42u64);
        }
        let injector = Injector::root(providers);
        prop_assert_eq!(injector.get::<u64>().is_ok(), register);
        prop_assert_eq!(injector.contains(&Token::of::<u64>()), register);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(64))]

    #[test]
    fn concurrent_resolution_builds_every_node_once(edges in dag_edges(), threads in 2usize..6) {
        let n = edges.len();
        let builds = Arc::new(build_counters(n));
        let injector = Injector::root(counted_providers(&edges, &builds));
        let barrier = Barrier::new(threads);

        // every thread walks all nodes, starting at a different one and
        // alternating direction so the threads meet mid-graph
        let seen: Vec<Vec<Arc<u64>>> = crossbeam_utils::thread::scope(|s| {
            let handles: Vec<_> = (0..threads)
                .map(|t| {
                    let (injector, barrier) = (&injector, &barrier);
                    s.spawn(move |_| {
                        barrier.wait();
                        let mut found: Vec<Option<Arc<u64>>> = vec![None; n];
                        for k in 0..n {
                            let i = if t % 2 == 0 { (k + t) % n } else { (n - 1 - k + t) % n };
                            found[i] = Some(injector.resolve_as::<u64>(&node(i)).unwrap());
                        }
                        found.into_iter().flatten().collect::<Vec<_>>()
                    })
                })
                .collect();
            handles.into_iter().map(|h| h.join().unwrap()).collect()
        })
        .unwrap();

        for (i, count) in builds.iter().enumerate() {
            prop_assert_eq!(count.load(Ordering::SeqCst), 1, "node {} built more than once", i);
        }
        for other in &seen[1..] {
            prop_assert_eq!(other.len(), n);
            for (a, b) in seen[0].iter().zip(other) {
                prop_assert!(Arc::ptr_eq(a, b));
            }
        }
        prop_assert_eq!(injector.cached_count(), n + 1);
    }
}
