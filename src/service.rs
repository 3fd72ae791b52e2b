//! The negotiation service: the public entry point.
//!
//! The service owns the shared base graph, overlays request-scoped ad-hoc
//! negotiators onto it, routes, and wraps the winning route in an
//! executable pipeline. Providers supply the negotiator population once at
//! construction and are assumed pure.

use crate::error::{Error, Result};
use crate::graph::{BaseNegotiationGraph, MergedNegotiationGraph, NegotiationGraph};
use crate::negotiator::{Negotiator, NegotiatorBuilder};
use crate::pipeline::{Negotiated, TypedNegotiated};
use crate::router;
use std::any::Any;
use std::sync::Arc;
use tracing::debug;

// ============================================================================
// Provider traits
// ============================================================================

/// A factory that yields one or more negotiators.
pub trait Connector: Send + Sync {
    /// Build this connector's negotiators.
    fn configure(&self) -> Vec<Arc<Negotiator>>;
}

/// Supplies connectors from a composition layer.
pub trait ConnectorProvider: Send + Sync {
    /// The available connectors.
    fn connectors(&self) -> Vec<Arc<dyn Connector>>;
}

/// Supplies negotiators directly.
pub trait NegotiatorProvider: Send + Sync {
    /// The available negotiators.
    fn negotiators(&self) -> Vec<Arc<Negotiator>>;
}

// ============================================================================
// NegotiationService
// ============================================================================

/// Orchestrates negotiation requests over a shared base graph.
///
/// Safe to share across threads; each request allocates its own router
/// state and, when ad-hoc negotiators are involved, its own graph overlay.
/// The only shared mutable state is the base graph's neighbor cache.
pub struct NegotiationService {
    graph: Arc<BaseNegotiationGraph>,
}

impl NegotiationService {
    /// Create a service over the given negotiator set.
    pub fn new(negotiators: Vec<Arc<Negotiator>>) -> Self {
        Self {
            graph: Arc::new(BaseNegotiationGraph::new(negotiators)),
        }
    }

    /// Create a service by aggregating negotiator providers.
    pub fn from_providers(providers: &[&dyn NegotiatorProvider]) -> Self {
        let negotiators = providers
            .iter()
            .flat_map(|provider| provider.negotiators())
            .collect();
        Self::new(negotiators)
    }

    /// Create a service by configuring every connector of every provider.
    pub fn from_connectors(providers: &[&dyn ConnectorProvider]) -> Self {
        let negotiators = providers
            .iter()
            .flat_map(|provider| provider.connectors())
            .flat_map(|connector| connector.configure())
            .collect();
        Self::new(negotiators)
    }

    /// The shared base graph.
    pub fn graph(&self) -> &Arc<BaseNegotiationGraph> {
        &self.graph
    }

    /// Negotiate between two explicit negotiators, overlaying `extra`
    /// ad-hoc negotiators onto the base graph for this request only.
    ///
    /// `head` must have an output role and `tail` a source role; violating
    /// either is API misuse and fails fast. `Ok(None)` means no route
    /// exists, the expected outcome for incompatible endpoints.
    pub fn negotiate_between(
        &self,
        head: &Arc<Negotiator>,
        tail: &Arc<Negotiator>,
        extra: Vec<Arc<Negotiator>>,
    ) -> Result<Option<Negotiated>> {
        if !head.has_output_role() {
            return Err(Error::RoleMismatch {
                negotiator: head.name().to_string(),
                expected: "output",
            });
        }
        if !tail.has_source_role() {
            return Err(Error::RoleMismatch {
                negotiator: tail.name().to_string(),
                expected: "source",
            });
        }

        let mut owned = extra;
        if !owned.iter().any(|n| Arc::ptr_eq(n, head)) {
            owned.push(head.clone());
        }
        if !owned.iter().any(|n| Arc::ptr_eq(n, tail)) {
            owned.push(tail.clone());
        }
        let merged = MergedNegotiationGraph::new(owned, self.graph.clone() as Arc<dyn NegotiationGraph>);

        let routes = router::route(&merged, head, tail);
        if routes.is_empty() {
            debug!(head = head.name(), tail = tail.name(), "negotiation failed: no route");
            return Ok(None);
        }
        Ok(Some(Negotiated::new(routes)))
    }

    /// Negotiate from type `TSource` to type `TOutput`.
    ///
    /// Synthesizes one identity terminal per type and routes between them,
    /// with both terminals overlaid as the request's ad-hoc negotiator set.
    pub fn negotiate<TSource, TOutput>(&self) -> Result<Option<TypedNegotiated<TSource, TOutput>>>
    where
        TSource: Any + Send,
        TOutput: Any + Send,
    {
        self.negotiate_with::<TSource, TOutput>(|b| b, |b| b)
    }

    /// Negotiate from `TSource` to `TOutput`, letting the caller extend
    /// each synthesized terminal (for example to attach a media-type
    /// requirement).
    pub fn negotiate_with<TSource, TOutput>(
        &self,
        configure_source: impl FnOnce(NegotiatorBuilder) -> NegotiatorBuilder,
        configure_output: impl FnOnce(NegotiatorBuilder) -> NegotiatorBuilder,
    ) -> Result<Option<TypedNegotiated<TSource, TOutput>>>
    where
        TSource: Any + Send,
        TOutput: Any + Send,
    {
        let head = configure_source(terminal_builder::<TSource>()).build()?;
        let tail = configure_output(terminal_builder::<TOutput>()).build()?;

        let negotiated = self.negotiate_between(&head, &tail, vec![head.clone(), tail.clone()])?;
        Ok(negotiated.map(TypedNegotiated::new))
    }
}

impl std::fmt::Debug for NegotiationService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NegotiationService")
            .field("graph", &self.graph)
            .finish()
    }
}

/// Builder for an identity terminal: type `T` as the sole type contract in
/// both roles, identity executable.
fn terminal_builder<T: Any>() -> NegotiatorBuilder {
    Negotiator::builder(format!("terminal<{}>", std::any::type_name::<T>()))
        .of_type::<T>()
        .as_type::<T>()
        .run_raw(|value, _| Some(value))
}
