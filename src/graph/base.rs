//! The shared, cached negotiation graph.

use super::{NegotiationGraph, Neighbor};
use crate::negotiator::{Negotiator, NegotiatorId};
use crate::protocol::negotiate;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use tracing::debug;

/// The long-lived negotiation graph over a registered negotiator set.
///
/// Neighbors are computed on demand and memoized per producing node.
/// Negotiators and their contracts are immutable once registered, so the
/// cache is a safe unconditional compute-once-per-key store and is never
/// invalidated within the graph's lifetime.
pub struct BaseNegotiationGraph {
    /// Registered negotiators, in registration order.
    negotiators: Vec<Arc<Negotiator>>,
    /// Memoized outgoing edges per producing node.
    cache: RwLock<HashMap<NegotiatorId, Arc<[Neighbor]>>>,
}

impl BaseNegotiationGraph {
    /// Create a graph over the given negotiator set.
    pub fn new(negotiators: Vec<Arc<Negotiator>>) -> Self {
        Self {
            negotiators,
            cache: RwLock::new(HashMap::new()),
        }
    }

    /// The number of registered negotiators.
    pub fn len(&self) -> usize {
        self.negotiators.len()
    }

    /// Whether the graph has no negotiators.
    pub fn is_empty(&self) -> bool {
        self.negotiators.is_empty()
    }

    /// Negotiate `output` against every registered consumer except itself.
    fn compute_neighbors(&self, output: &Arc<Negotiator>) -> Arc<[Neighbor]> {
        compute_neighbors_against(output, &self.negotiators)
    }
}

/// Negotiate `output` against every candidate with a source role, excluding
/// `output` itself by pointer identity.
pub(super) fn compute_neighbors_against(
    output: &Arc<Negotiator>,
    candidates: &[Arc<Negotiator>],
) -> Arc<[Neighbor]> {
    if !output.has_output_role() {
        return Arc::from([]);
    }
    candidates
        .iter()
        .filter(|candidate| !Arc::ptr_eq(candidate, output))
        .filter(|candidate| candidate.has_source_role())
        .filter_map(|candidate| {
            negotiate(output, candidate).map(|negotiation| Neighbor {
                head: output.clone(),
                tail: candidate.clone(),
                negotiation,
            })
        })
        .collect()
}

impl NegotiationGraph for BaseNegotiationGraph {
    fn negotiators(&self) -> Vec<Arc<Negotiator>> {
        self.negotiators.clone()
    }

    fn neighbors(&self, output: &Arc<Negotiator>) -> Arc<[Neighbor]> {
        let id = NegotiatorId::of(output);

        if let Some(cached) = self.cache.read().unwrap().get(&id) {
            return cached.clone();
        }

        // Read-through: no lock is held while negotiating, so two threads
        // missing on the same key may compute the same result twice. Both
        // computations are identical and either insert is fine.
        let neighbors = self.compute_neighbors(output);
        debug!(
            negotiator = output.name(),
            neighbors = neighbors.len(),
            "negotiation graph cache populated"
        );
        self.cache
            .write()
            .unwrap()
            .entry(id)
            .or_insert_with(|| neighbors.clone());
        neighbors
    }
}

impl std::fmt::Debug for BaseNegotiationGraph {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let cache = self.cache.read().unwrap();
        f.debug_struct("BaseNegotiationGraph")
            .field("negotiators", &self.negotiators.len())
            .field("cached", &cache.len())
            .finish()
    }
}
