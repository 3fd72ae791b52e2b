//! Request-scoped graph overlay.

use super::base::compute_neighbors_against;
use super::{NegotiationGraph, Neighbor};
use crate::negotiator::Negotiator;
use std::sync::Arc;

/// An overlay that merges a small ad-hoc negotiator set onto a parent
/// graph.
///
/// A one-off negotiation (such as the service's auto-synthesized terminal
/// pair) needs its ad-hoc nodes to participate in routing without being
/// registered on the shared graph. The overlay owns those nodes:
///
/// - For an owned node, neighbors are computed against the owned set plus
///   the parent's full negotiator set.
/// - For any other node, the query delegates verbatim to the parent.
///
/// The parent is never mutated and its cache stays valid across requests.
pub struct MergedNegotiationGraph {
    /// Ad-hoc negotiators owned by this overlay.
    owned: Vec<Arc<Negotiator>>,
    /// The shared graph being overlaid.
    parent: Arc<dyn NegotiationGraph>,
}

impl MergedNegotiationGraph {
    /// Create an overlay owning the given negotiators.
    pub fn new(owned: Vec<Arc<Negotiator>>, parent: Arc<dyn NegotiationGraph>) -> Self {
        Self { owned, parent }
    }

    /// Whether this overlay owns the given negotiator.
    pub fn owns(&self, negotiator: &Arc<Negotiator>) -> bool {
        self.owned.iter().any(|n| Arc::ptr_eq(n, negotiator))
    }
}

impl NegotiationGraph for MergedNegotiationGraph {
    fn negotiators(&self) -> Vec<Arc<Negotiator>> {
        let mut all = self.owned.clone();
        for negotiator in self.parent.negotiators() {
            if !self.owns(&negotiator) {
                all.push(negotiator);
            }
        }
        all
    }

    fn neighbors(&self, output: &Arc<Negotiator>) -> Arc<[Neighbor]> {
        if !self.owns(output) {
            return self.parent.neighbors(output);
        }

        // Owned nodes negotiate against the union of the owned set and the
        // parent's negotiators. Computed per call: overlays are
        // request-scoped and queried at most once per node by the router.
        let mut candidates = self.owned.clone();
        for negotiator in self.parent.negotiators() {
            if !self.owns(&negotiator) {
                candidates.push(negotiator);
            }
        }
        compute_neighbors_against(output, &candidates)
    }
}

impl std::fmt::Debug for MergedNegotiationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MergedNegotiationGraph")
            .field("owned", &self.owned.len())
            .finish_non_exhaustive()
    }
}
