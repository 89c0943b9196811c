#![no_main]

use libfuzzer_sys::fuzz_target;
use stratum_di::{DiError, Injector, ProviderDescriptor, ProviderSet, Token};

const NODES: usize = 16;

fn node(i: usize) -> Token {
    Token::named(format!("n{}", i % NODES))
}

// Bytes come in triples: (owner scope, node, dependency). Every resolution
// must finish with a value or an error; panics and hangs are bugs.
fuzz_target!(|data: &[u8]| {
    if data.len() < 3 {
        return;
    }

    let mut edges = vec![[Vec::new(), Vec::new()]; NODES];
    let mut present = [[false; NODES]; 2];
    for chunk in data.chunks_exact(3) {
        let scope = (chunk[0] % 2) as usize;
        let from = chunk[1] as usize % NODES;
        present[scope][from] = true;
        if chunk[2] < 200 {
            edges[from][scope].push(node(chunk[2] as usize));
        }
    }

    let build = |scope: usize| {
        let mut providers = ProviderSet::new();
        for i in 0..NODES {
            if present[scope][i] {
                let deps = edges[i][scope].clone();
                let descriptor = ProviderDescriptor::factory(deps, |_| Ok(()));
                let descriptor = if data[0] & 1 == 0 { descriptor } else { descriptor.transient() };
                providers.add(node(i), descriptor);
            }
        }
        providers
    };

    let root = Injector::root(build(0));
    let child = root.create_child(build(1));
    let valid = child.validate().is_ok();

    for i in 0..NODES {
        match child.resolve(&node(i)) {
            Ok(_) => {}
            Err(DiError::NotFound(_)) | Err(DiError::CyclicDependency(_)) | Err(DiError::DepthExceeded(_)) => {
                assert!(!valid || !child.contains(&node(i)));
            }
            Err(other) => panic!("unexpected error: {}", other),
        }
    }
});
