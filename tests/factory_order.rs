//! Dependencies are built depth first, in declared order, exactly once.

use stratum_di::{Injector, ProviderDescriptor, ProviderSet, Token};
use std::sync::{Arc, Mutex};

type Order = Arc<Mutex<Vec<String>>>;

fn recording(order: &Order, name: &'static str, deps: &[&str]) -> ProviderDescriptor {
    let order = order.clone();
    let deps = deps.iter().map(|d| Token::named(*d)).collect();
    ProviderDescriptor::factory(deps, move |args| {
        assert_eq!(args.remaining(), args.len());
        order.lock().unwrap().push(name.to_string());
        Ok(name)
    })
}

#[test]
fn dependencies_finish_before_their_dependents() {
    let order: Order = Arc::default();
    let mut providers = ProviderSet::new();
    providers
        .add("app", recording(&order, "app", &["db", "cache"]))
        .add("db", recording(&order, "db", &["config"]))
        .add("cache", recording(&order, "cache", &["config"]))
        .add("config", recording(&order, "config", &[]));
    let injector = Injector::root(providers);

    injector.resolve(&Token::named("app")).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["config", "db", "cache", "app"]);
}

#[test]
fn transient_dependency_is_rebuilt_for_each_dependent() {
    let order: Order = Arc::default();
    let mut providers = ProviderSet::new();
    providers
        .add("left", recording(&order, "left", &["fresh"]))
        .add("right", recording(&order, "right", &["fresh"]))
        .add("fresh", recording(&order, "fresh", &[]).transient());
    let injector = Injector::root(providers);

    injector.resolve(&Token::named("left")).unwrap();
    injector.resolve(&Token::named("right")).unwrap();
    injector.resolve(&Token::named("left")).unwrap();
    assert_eq!(*order.lock().unwrap(), vec!["fresh", "left", "fresh", "right"]);
}

#[test]
fn first_failing_dependency_stops_the_walk() {
    let order: Order = Arc::default();
    let mut providers = ProviderSet::new();
    providers
        .add("app", recording(&order, "app", &["first", "missing", "last"]))
        .add("first", recording(&order, "first", &[]))
        .add("last", recording(&order, "last", &[]));
    let injector = Injector::root(providers);

    assert!(injector.resolve(&Token::named("app")).is_err());
    assert_eq!(*order.lock().unwrap(), vec!["first"]);
    // "first" succeeded and stays cached
    assert_eq!(injector.cached_count(), 1);
}
