//! Shortest-path routing over a negotiation graph.
//!
//! Single-source Dijkstra with lazy edge discovery: node state is created
//! on demand and neighbors are only queried when a node is expanded, so
//! unreachable parts of the graph are never negotiated. The node table and
//! priority queue are request-scoped; concurrent route computations against
//! the same graph each allocate their own.

mod heap;
mod route;

pub use route::{Route, RouteStep};

use crate::graph::NegotiationGraph;
use crate::negotiator::{Negotiator, NegotiatorId};
use crate::protocol::NegotiationResult;
use heap::MinHeap;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, trace};

/// Per-node search state, created on demand.
struct NodeState {
    negotiator: Arc<Negotiator>,
    /// Current best distance from the root.
    distance: f64,
    /// Best-known predecessor on the path from the root.
    predecessor: Option<NegotiatorId>,
    /// The negotiation of the edge from the predecessor.
    incoming: Option<NegotiationResult>,
    /// Whether the node's distance is final.
    finished: bool,
}

/// Compute the least-cost route from `root` to `dest`.
///
/// Returns at most one route; an empty vector means no chain of compatible
/// negotiators connects the pair. Equal-distance ties are broken by queue
/// order and are not deterministic. `root == dest` is not special-cased and
/// yields a zero-distance single-step route.
pub fn route(
    graph: &dyn NegotiationGraph,
    root: &Arc<Negotiator>,
    dest: &Arc<Negotiator>,
) -> Vec<Route> {
    let root_id = NegotiatorId::of(root);
    let dest_id = NegotiatorId::of(dest);

    let mut table: HashMap<NegotiatorId, NodeState> = HashMap::new();
    table.insert(
        root_id,
        NodeState {
            negotiator: root.clone(),
            distance: 0.0,
            predecessor: None,
            incoming: None,
            finished: false,
        },
    );
    let mut queue = MinHeap::new();
    queue.push(root_id, 0.0);

    while let Some((current_id, distance)) = queue.pop_min() {
        let current = table.get_mut(&current_id).expect("queued node has state");
        current.finished = true;
        let negotiator = current.negotiator.clone();

        if current_id == dest_id {
            let found = reconstruct(&table, root, dest_id);
            debug!(
                root = root.name(),
                dest = dest.name(),
                distance = found.distance,
                hops = found.len(),
                "route found"
            );
            return vec![found];
        }

        // Pure sinks have no outgoing edges and terminate expansion.
        if !negotiator.has_output_role() {
            continue;
        }

        for neighbor in graph.neighbors(&negotiator).iter() {
            let edge_weight = neighbor.negotiation.weight();
            let candidate = distance + edge_weight;
            let tail_id = NegotiatorId::of(&neighbor.tail);

            let state = table.entry(tail_id).or_insert_with(|| NodeState {
                negotiator: neighbor.tail.clone(),
                distance: f64::INFINITY,
                predecessor: None,
                incoming: None,
                finished: false,
            });
            if state.finished || candidate >= state.distance {
                continue;
            }
            trace!(
                from = negotiator.name(),
                to = state.negotiator.name(),
                candidate,
                "relaxed edge"
            );
            state.distance = candidate;
            state.predecessor = Some(current_id);
            state.incoming = Some(neighbor.negotiation);
            if queue.contains(tail_id) {
                queue.decrease_key(tail_id, candidate);
            } else {
                queue.push(tail_id, candidate);
            }
        }
    }

    debug!(root = root.name(), dest = dest.name(), "no route");
    Vec::new()
}

/// Walk predecessors from the destination back to the root and reverse.
fn reconstruct(
    table: &HashMap<NegotiatorId, NodeState>,
    root: &Arc<Negotiator>,
    dest_id: NegotiatorId,
) -> Route {
    let mut steps = Vec::new();
    let mut cursor = Some(dest_id);
    while let Some(id) = cursor {
        let state = table.get(&id).expect("path node has state");
        steps.push(RouteStep {
            negotiator: state.negotiator.clone(),
            weight: state.incoming.map_or(0.0, |n| n.weight()),
        });
        cursor = state.predecessor;
    }
    steps.reverse();

    let dest_state = table.get(&dest_id).expect("destination has state");
    Route {
        head: root.clone(),
        tail: dest_state.negotiator.clone(),
        distance: dest_state.distance,
        steps,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::BaseNegotiationGraph;
    use crate::negotiator::Negotiator;

    /// Chainable node requiring `I` and offering `O`; entering it costs
    /// `weight` (a source-role weight contract only, so the cost is paid
    /// once, on the incoming edge).
    fn hop<I: std::any::Any, O: std::any::Any>(name: &str, weight: f64) -> Arc<Negotiator> {
        Negotiator::builder(name)
            .of_type::<I>()
            .source_contract(crate::contract::Contract::Weight(weight))
            .as_type::<O>()
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap()
    }

    #[test]
    fn test_route_to_self_is_zero_distance() {
        let node = Negotiator::identity::<String>();
        let graph = BaseNegotiationGraph::new(vec![node.clone()]);

        let routes = route(&graph, &node, &node);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].distance, 0.0);
        assert_eq!(routes[0].len(), 1);
        assert!(Arc::ptr_eq(&routes[0].head, &routes[0].tail));
    }

    #[test]
    fn test_route_direct_edge() {
        let a = Negotiator::identity::<String>();
        let b = Negotiator::identity::<String>();
        let graph = BaseNegotiationGraph::new(vec![a.clone(), b.clone()]);

        let routes = route(&graph, &a, &b);
        assert_eq!(routes.len(), 1);
        let found = &routes[0];
        assert_eq!(found.distance, 0.0);
        assert_eq!(found.len(), 2);
        assert_eq!(found.steps[0].weight, 0.0);
    }

    #[test]
    fn test_route_unreachable_is_empty() {
        let a = Negotiator::identity::<String>();
        let b = Negotiator::identity::<i32>();
        let graph = BaseNegotiationGraph::new(vec![a.clone(), b.clone()]);

        assert!(route(&graph, &a, &b).is_empty());
    }

    #[test]
    fn test_route_prefers_cheaper_detour() {
        // Marker types shape the topology; source-role weight contracts
        // price the edges:
        //
        //   root -(3)-> direct -(0)-> dest
        //   root -(1)-> mid  -(1)-> last -(0)-> dest
        struct A;
        struct B;
        struct Z;

        let root = Negotiator::builder("root")
            .as_type::<A>()
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();
        let direct = hop::<A, Z>("direct", 3.0);
        let mid = hop::<A, B>("mid", 1.0);
        let last = hop::<B, Z>("last", 1.0);
        let dest = Negotiator::builder("dest")
            .of_type::<Z>()
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();

        let graph = BaseNegotiationGraph::new(vec![
            root.clone(),
            direct.clone(),
            mid.clone(),
            last.clone(),
            dest.clone(),
        ]);

        let routes = route(&graph, &root, &dest);
        assert_eq!(routes.len(), 1);
        let found = &routes[0];
        assert_eq!(found.distance, 2.0);
        let names: Vec<_> = found
            .steps
            .iter()
            .map(|s| s.negotiator.name().to_string())
            .collect();
        assert_eq!(names, vec!["root", "mid", "last", "dest"]);
    }

    #[test]
    fn test_route_distance_accumulates_weights() {
        struct A;
        let a = Negotiator::builder("a")
            .as_type::<A>()
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();
        let b = hop::<A, String>("b", 2.5);
        let graph = BaseNegotiationGraph::new(vec![a.clone(), b.clone()]);

        let routes = route(&graph, &a, &b);
        assert_eq!(routes.len(), 1);
        assert_eq!(routes[0].distance, 2.5);
        assert_eq!(routes[0].steps[1].weight, 2.5);
        assert_eq!(routes[0].steps[0].weight, 0.0);
    }
}
