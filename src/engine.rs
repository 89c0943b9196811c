//! Resolution engine: turns a token into an instance for a given injector.
//!
//! One resolution walks the dependency graph depth first. The tokens under
//! construction form a stack carried in a [`ResolutionContext`]; meeting a
//! token already on the stack is a cycle. Each step runs in this order:
//!
//! 1. cycle check against the stack
//! 2. the injector's own cache
//! 3. a provider registered on the injector itself, built here and cached here
//! 4. the parent injector, which owns whatever it builds
//! 5. `NotFound`
//!
//! Recursion is bounded by the context's `max_depth`. Every level costs stack,
//! so the limit has to fit the stack of the thread that calls `resolve`.

use std::time::Instant;

use smallvec::SmallVec;
use tracing::{trace, warn};

use crate::args::Args;
use crate::cache::{self, BuildContext};
use crate::error::{DiError, DiResult};
use crate::injector::Injector;
use crate::provider::{Instance, ProviderDescriptor, ProviderKind};
use crate::token::Token;

/// Per-call resolution state.
pub(crate) struct ResolutionContext {
    id: u64,
    stack: SmallVec<[Token; 8]>,
    max_depth: usize,
}

impl ResolutionContext {
    pub(crate) fn new(max_depth: usize) -> Self {
        Self {
            id: cache::next_build_id(),
            stack: SmallVec::new(),
            max_depth,
        }
    }

    /// Tokens currently under construction, outermost first.
    pub(crate) fn path(&self) -> &[Token] {
        &self.stack
    }

    /// Cycle path if `token` is already being built: from its first
    /// occurrence to the top of the stack, then `token` again.
    fn cycle_through(&self, token: &Token) -> Option<Vec<Token>> {
        let start = self.stack.iter().position(|t| t == token)?;
        let mut path: Vec<Token> = self.stack[start..].to_vec();
        path.push(token.clone());
        Some(path)
    }

    fn enter(&mut self, token: &Token) -> DiResult<()> {
        if self.stack.len() >= self.max_depth {
            return Err(DiError::DepthExceeded(self.max_depth));
        }
        self.stack.push(token.clone());
        Ok(())
    }

    fn exit(&mut self) {
        self.stack.pop();
    }
}

impl BuildContext for ResolutionContext {
    fn build_id(&self) -> u64 {
        self.id
    }

    fn build_path(&self) -> &[Token] {
        &self.stack
    }
}

/// Resolves `token` starting at `injector`.
pub(crate) fn resolve(injector: &Injector, token: &Token, ctx: &mut ResolutionContext) -> DiResult<Instance> {
    if let Some(path) = ctx.cycle_through(token) {
        trace!(token = %token, stack = ?ctx.path(), "cycle detected");
        return Err(DiError::CyclicDependency(path));
    }
    injector.ensure_alive()?;

    if let Some(hit) = injector.cache().get(token) {
        trace!(injector = injector.name(), token = %token, "cache hit");
        return Ok(hit);
    }

    if let Some(descriptor) = injector.lookup_local(token) {
        return resolve_owned(injector, token, &descriptor, ctx);
    }

    match injector.parent() {
        Some(parent) => {
            trace!(injector = injector.name(), parent = parent.name(), token = %token, "delegating to parent");
            resolve(parent, token, ctx)
        }
        None => Err(DiError::NotFound(token.clone())),
    }
}

fn resolve_owned(
    injector: &Injector,
    token: &Token,
    descriptor: &ProviderDescriptor,
    ctx: &mut ResolutionContext,
) -> DiResult<Instance> {
    if !descriptor.is_cacheable() {
        let instance = observed_build(injector, token, descriptor, ctx)?;
        trace!(injector = injector.name(), token = %token, kind = descriptor.kind_name(), "built transient");
        return Ok(instance);
    }

    let (instance, built) = injector
        .cache()
        .get_or_build(token, ctx, |ctx| observed_build(injector, token, descriptor, ctx))?;
    if built {
        trace!(injector = injector.name(), token = %token, kind = descriptor.kind_name(), "built and cached");
        if let Some(disposer) = descriptor.disposer() {
            injector.track_disposal(instance.clone(), disposer.clone());
        }
    }
    Ok(instance)
}

// Callers that only waited for another thread's build are not reported.
fn observed_build(
    injector: &Injector,
    token: &Token,
    descriptor: &ProviderDescriptor,
    ctx: &mut ResolutionContext,
) -> DiResult<Instance> {
    let observers = injector.observers();
    if let Some(observers) = &observers {
        observers.resolving(token);
    }
    let started = Instant::now();

    let result = build(injector, token, descriptor, ctx);

    if let Some(observers) = &observers {
        match &result {
            Ok(_) => observers.resolved(token, started.elapsed()),
            Err(err) => observers.failed(token, err),
        }
    }
    result
}

fn build(
    injector: &Injector,
    token: &Token,
    descriptor: &ProviderDescriptor,
    ctx: &mut ResolutionContext,
) -> DiResult<Instance> {
    let (deps, construct) = match descriptor.kind() {
        ProviderKind::Value(value) => return Ok(value.clone()),
        ProviderKind::Class { deps, construct, .. } => (deps, construct),
        ProviderKind::Factory { deps, factory } => (deps, factory),
    };

    ctx.enter(token)?;
    let result = resolve_dependencies(injector, deps, ctx).and_then(|values| {
        let mut args = Args::new(token.clone(), deps.clone(), values);
        construct(&mut args).map_err(|source| {
            warn!(injector = injector.name(), token = %token, error = %source, "provider failed");
            DiError::construction(token, source)
        })
    });
    ctx.exit();
    result
}

// Dependencies resolve through the injector that owns the provider, in
// declared order; the first failure stops the walk.
fn resolve_dependencies(injector: &Injector, deps: &[Token], ctx: &mut ResolutionContext) -> DiResult<Vec<Instance>> {
    let mut values = Vec::with_capacity(deps.len());
    for dep in deps {
        values.push(resolve(injector, dep, ctx)?);
    }
    Ok(values)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cycle_path_starts_at_first_occurrence() {
        let mut ctx = ResolutionContext::new(16);
        for name in ["Root", "A", "B"] {
            ctx.enter(&Token::named(name)).unwrap();
        }
        let path = ctx.cycle_through(&Token::named("A")).unwrap();
        assert_eq!(path, vec![Token::named("A"), Token::named("B"), Token::named("A")]);
        assert!(ctx.cycle_through(&Token::named("C")).is_none());
    }

    #[test]
    fn enter_respects_max_depth() {
        let mut ctx = ResolutionContext::new(2);
        ctx.enter(&Token::named("a")).unwrap();
        ctx.enter(&Token::named("b")).unwrap();
        assert!(matches!(ctx.enter(&Token::named("c")), Err(DiError::DepthExceeded(2))));
        ctx.exit();
        assert_eq!(ctx.path(), &[Token::named("a")]);
    }
}
