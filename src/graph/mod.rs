//! The negotiation graph: lazy, cached adjacency over a negotiator set.
//!
//! Edges are not stored; they are discovered by running the negotiation
//! protocol between a producing node and every registered consumer, then
//! memoized. Two implementations exist:
//!
//! - [`BaseNegotiationGraph`]: the shared, long-lived graph with a
//!   read-through neighbor cache.
//! - [`MergedNegotiationGraph`]: a request-scoped overlay that adds ad-hoc
//!   negotiators (such as auto-synthesized terminals) without ever mutating
//!   the parent graph or its cache.

mod base;
mod merged;

pub use base::BaseNegotiationGraph;
pub use merged::MergedNegotiationGraph;

use crate::negotiator::Negotiator;
use crate::protocol::NegotiationResult;
use std::sync::Arc;

/// A successful negotiation between two nodes: a directed edge.
#[derive(Debug, Clone)]
pub struct Neighbor {
    /// The producing node the edge leaves.
    pub head: Arc<Negotiator>,
    /// The consuming node the edge reaches.
    pub tail: Arc<Negotiator>,
    /// The negotiation that established the edge.
    pub negotiation: NegotiationResult,
}

/// Adjacency abstraction over a set of negotiators.
///
/// Implementations must be cheap to query repeatedly; the router asks for
/// neighbors once per expanded node.
pub trait NegotiationGraph: Send + Sync {
    /// All negotiators known to this graph.
    fn negotiators(&self) -> Vec<Arc<Negotiator>>;

    /// The outgoing edges of a producing node.
    ///
    /// Empty when the node has no output role or negotiates with nothing.
    /// A node never neighbors itself: exclusion is by pointer identity, so
    /// a structurally identical peer is still a legitimate neighbor.
    fn neighbors(&self, output: &Arc<Negotiator>) -> Arc<[Neighbor]>;
}
