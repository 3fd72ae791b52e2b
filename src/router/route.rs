//! Routes: ordered, weighted paths of negotiators.

use crate::negotiator::Negotiator;
use std::fmt;
use std::sync::Arc;

/// One hop of a route: a negotiator and the weight of the edge leading
/// into it. The first step's incoming weight is 0.
#[derive(Clone)]
pub struct RouteStep {
    /// The node executed at this step.
    pub negotiator: Arc<Negotiator>,
    /// Weight of the edge from the previous step.
    pub weight: f64,
}

impl fmt::Debug for RouteStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RouteStep")
            .field("negotiator", &self.negotiator.name())
            .field("weight", &self.weight)
            .finish()
    }
}

/// An ordered, weighted path from a root negotiator to a destination.
///
/// Produced by the router; immutable and re-executable.
#[derive(Clone, Debug)]
pub struct Route {
    /// The root the route starts from.
    pub head: Arc<Negotiator>,
    /// The destination the route ends at.
    pub tail: Arc<Negotiator>,
    /// Total weight incurred along the route.
    pub distance: f64,
    /// The hops, root first. A route from a node to itself has one step.
    pub steps: Vec<RouteStep>,
}

impl Route {
    /// The number of hops.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// Whether the route has no hops.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

impl fmt::Display for Route {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, step) in self.steps.iter().enumerate() {
            if i > 0 {
                write!(f, " -({})-> ", step.weight)?;
            }
            f.write_str(step.negotiator.name())?;
        }
        write!(f, " [distance {}]", self.distance)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_route_display() {
        let a = Negotiator::identity::<String>();
        let b = Negotiator::identity::<String>();
        let route = Route {
            head: a.clone(),
            tail: b.clone(),
            distance: 2.0,
            steps: vec![
                RouteStep {
                    negotiator: a,
                    weight: 0.0,
                },
                RouteStep {
                    negotiator: b,
                    weight: 2.0,
                },
            ],
        };
        let rendered = route.to_string();
        assert!(rendered.contains("-(2)->"));
        assert!(rendered.contains("[distance 2]"));
        assert_eq!(route.len(), 2);
        assert!(!route.is_empty());
    }
}
