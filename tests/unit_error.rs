/// Unit tests for DiError and DiResult types

use stratum_di::{DiError, DiResult, Injector, ProviderSet, Token};
use std::error::Error;

#[test]
fn test_error_display_not_found() {
    let error = DiError::NotFound(Token::named("db"));
    assert_eq!(error.to_string(), "No provider for \"db\"");

    let typed = DiError::NotFound(Token::of::<u8>());
    assert_eq!(typed.to_string(), "No provider for u8");
}

#[test]
fn test_error_display_cycle() {
    let error = DiError::CyclicDependency(vec![Token::named("A"), Token::of::<u16>(), Token::named("A")]);
    assert_eq!(error.to_string(), "Cyclic dependency: \"A\" -> u16 -> \"A\"");
}

#[test]
fn test_error_display_type_mismatch() {
    let error = DiError::TypeMismatch {
        token: Token::named("port"),
        expected: "u32",
    };
    assert_eq!(error.to_string(), "Type mismatch for \"port\": expected u32");
}

#[test]
fn test_error_display_other_variants() {
    assert_eq!(DiError::DepthExceeded(8).to_string(), "Max depth 8 exceeded");
    assert_eq!(
        DiError::Disposed("root.2".into()).to_string(),
        "Injector root.2 has been destroyed"
    );
    assert_eq!(
        DiError::MissingArgument {
            token: Token::named("svc"),
            index: 3
        }
        .to_string(),
        "Missing argument 3 while constructing \"svc\""
    );
}

#[test]
fn test_construction_failure_keeps_its_source() {
    let mut providers = ProviderSet::new();
    providers.add_factory(Token::named("broken"), Vec::new(), |_| -> Result<u8, _> {
        Err(std::io::Error::new(std::io::ErrorKind::Other, "disk on fire").into())
    });
    let injector = Injector::root(providers);

    let error = injector.resolve(&Token::named("broken")).unwrap_err();
    assert_eq!(error.to_string(), "Failed to construct \"broken\": disk on fire");
    let source = error.source().expect("source");
    assert!(source.downcast_ref::<std::io::Error>().is_some());
    assert_eq!(error.token(), Some(&Token::named("broken")));
}

#[test]
fn test_dependency_errors_propagate_unwrapped() {
    let mut providers = ProviderSet::new();
    providers.add_factory(Token::named("outer"), vec![Token::named("inner")], |_| Ok(()));
    let injector = Injector::root(providers);

    match injector.resolve(&Token::named("outer")) {
        Err(DiError::NotFound(token)) => assert_eq!(token, Token::named("inner")),
        other => panic!("unexpected {:?}", other),
    }
}

#[test]
fn test_token_accessor() {
    assert_eq!(DiError::DepthExceeded(1).token(), None);
    let cycle = DiError::CyclicDependency(vec![Token::named("x"), Token::named("x")]);
    assert_eq!(cycle.token(), Some(&Token::named("x")));
}

#[test]
fn test_di_result_alias() {
    fn lookup(found: bool) -> DiResult<u8> {
        if found {
            Ok(1)
        } else {
            Err(DiError::NotFound(Token::named("x")))
        }
    }
    assert_eq!(lookup(true).unwrap(), 1);
    assert!(lookup(false).is_err());
}

#[test]
fn test_errors_are_send_and_sync() {
    fn assert_send_sync<T: Send + Sync + 'static>() {}
    assert_send_sync::<DiError>();
}
