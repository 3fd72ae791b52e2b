//! Negotiated pipelines: the executable materialization of routes.

use crate::negotiator::Value;
use crate::router::{Route, RouteStep};
use std::any::Any;
use std::fmt;
use std::marker::PhantomData;
use tracing::debug;

// ============================================================================
// NegotiationContext
// ============================================================================

/// Execution context passed to every step of a route.
///
/// Exposes the first and previous route steps so a step can make decisions
/// based on its position in the chain.
#[derive(Clone, Default)]
pub struct NegotiationContext {
    first: Option<RouteStep>,
    previous: Option<RouteStep>,
}

impl NegotiationContext {
    /// The first step of the route being executed.
    pub fn first(&self) -> Option<&RouteStep> {
        self.first.as_ref()
    }

    /// The step executed immediately before the current one. `None` for
    /// the first step.
    pub fn previous(&self) -> Option<&RouteStep> {
        self.previous.as_ref()
    }
}

impl fmt::Debug for NegotiationContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NegotiationContext")
            .field("first", &self.first.as_ref().map(|s| s.negotiator.name()))
            .field(
                "previous",
                &self.previous.as_ref().map(|s| s.negotiator.name()),
            )
            .finish()
    }
}

// ============================================================================
// Negotiated
// ============================================================================

/// The executable result of a negotiation: one or more candidate routes.
///
/// Stateless and re-executable. The default router produces at most one
/// route; multiple candidates exist only when a caller assembles them, and
/// provide redundancy: the first route whose every step produces a value
/// wins.
pub struct Negotiated {
    routes: Vec<Route>,
}

impl Negotiated {
    /// Wrap the given candidate routes.
    pub fn new(routes: Vec<Route>) -> Self {
        Self { routes }
    }

    /// The candidate routes, in the order they are attempted.
    pub fn routes(&self) -> &[Route] {
        &self.routes
    }

    /// Execute against a single input value.
    ///
    /// Runs the first route's steps in order, feeding each step's output to
    /// the next. A step returning `None` abandons execution; since the
    /// value is consumed there is nothing left to feed the remaining
    /// candidates (use [`invoke_with`](Self::invoke_with) when fallback
    /// across candidates is wanted). A step panicking propagates
    /// unmodified.
    pub fn invoke(&self, source: Value) -> Option<Value> {
        let route = self.routes.first()?;
        Self::run_route(route, source)
    }

    /// Execute with a re-suppliable input, retrying each candidate route
    /// with a fresh value until one fully executes.
    pub fn invoke_with(&self, supplier: &dyn Fn() -> Value) -> Option<Value> {
        for route in &self.routes {
            if let Some(output) = Self::run_route(route, supplier()) {
                return Some(output);
            }
            debug!(route = %route, "candidate route declined, trying next");
        }
        None
    }

    fn run_route(route: &Route, mut value: Value) -> Option<Value> {
        let first = route.steps.first().cloned();
        let mut previous: Option<RouteStep> = None;
        for step in &route.steps {
            let context = NegotiationContext {
                first: first.clone(),
                previous: previous.take(),
            };
            value = step.negotiator.execute(value, &context)?;
            previous = Some(step.clone());
        }
        Some(value)
    }
}

impl fmt::Debug for Negotiated {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Negotiated")
            .field("routes", &self.routes.len())
            .finish()
    }
}

// ============================================================================
// TypedNegotiated
// ============================================================================

/// Typed wrapper over [`Negotiated`] for the service's generic entry point.
pub struct TypedNegotiated<TSource, TOutput> {
    inner: Negotiated,
    _marker: PhantomData<fn(TSource) -> TOutput>,
}

impl<TSource, TOutput> TypedNegotiated<TSource, TOutput>
where
    TSource: Any + Send,
    TOutput: Any + Send,
{
    /// Wrap an untyped pipeline.
    pub fn new(inner: Negotiated) -> Self {
        Self {
            inner,
            _marker: PhantomData,
        }
    }

    /// The underlying untyped pipeline.
    pub fn as_untyped(&self) -> &Negotiated {
        &self.inner
    }

    /// Execute against a typed input.
    ///
    /// # Panics
    ///
    /// Panics if a route fully executes but yields a value that is not a
    /// `TOutput`: an executable lied about its output contract, which is a
    /// configuration bug, not a negotiable outcome.
    pub fn invoke(&self, source: TSource) -> Option<TOutput> {
        let output = self.inner.invoke(Box::new(source))?;
        match output.downcast::<TOutput>() {
            Ok(output) => Some(*output),
            Err(_) => panic!(
                "negotiated pipeline produced a value that is not {}",
                std::any::type_name::<TOutput>()
            ),
        }
    }
}

impl<TSource, TOutput> fmt::Debug for TypedNegotiated<TSource, TOutput> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypedNegotiated")
            .field("routes", &self.inner.routes.len())
            .field("source", &std::any::type_name::<TSource>())
            .field("output", &std::any::type_name::<TOutput>())
            .finish()
    }
}
