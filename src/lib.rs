//! # Transit
//!
//! A type negotiation and routing engine.
//!
//! Transit models a set of typed, composable transformation nodes
//! ("negotiators") as a directed graph, determines which pairs of nodes are
//! compatible ("negotiation"), and computes the least-cost path ("route")
//! from a source type to a desired output type. The winning route is
//! materialized into an executable pipeline that threads a value through
//! each hop's transformation function.
//!
//! ## How it fits together
//!
//! - **Contracts** describe one compatibility dimension a negotiator
//!   requires or offers: a type, a media type, or a fixed weight.
//! - The **protocol** decides whether a producing node and a consuming node
//!   are compatible, and at what summed weight.
//! - The **graph** discovers edges lazily by running the protocol against
//!   the registered negotiator set, and memoizes the result.
//! - The **router** runs Dijkstra over the graph and emits a route.
//! - A **negotiated pipeline** executes the route against an input value.
//!
//! Edges are expensive to discover (every contract pair is evaluated), so
//! the graph caches aggressively; negotiators are immutable once built,
//! which makes the cache unconditional.
//!
//! ## Quick start
//!
//! ```rust
//! use transit::prelude::*;
//!
//! let parse = Negotiator::builder("parse-int")
//!     .of_type::<String>()
//!     .as_type::<i32>()
//!     .run(|s: String, _| s.parse::<i32>().ok())
//!     .build()
//!     .unwrap();
//! let double = Negotiator::builder("double")
//!     .of_type::<i32>()
//!     .as_type::<i32>()
//!     .run(|n: i32, _| Some(n * 2))
//!     .build()
//!     .unwrap();
//!
//! let service = NegotiationService::new(vec![parse.clone(), double.clone()]);
//! let negotiated = service
//!     .negotiate_between(&parse, &double, vec![])
//!     .unwrap()
//!     .expect("route exists");
//! let out = negotiated.invoke(Box::new("21".to_string())).unwrap();
//! assert_eq!(*out.downcast::<i32>().unwrap(), 42);
//! ```
//!
//! The typed entry point synthesizes identity terminals for a pair of
//! types and routes between them:
//!
//! ```rust
//! use transit::prelude::*;
//!
//! let service = NegotiationService::new(vec![]);
//! let negotiated = service.negotiate::<String, String>().unwrap().unwrap();
//! assert_eq!(negotiated.invoke("x".to_string()), Some("x".to_string()));
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod contract;
pub mod error;
pub mod graph;
pub mod negotiator;
pub mod pipeline;
pub mod protocol;
pub mod router;
pub mod service;

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::contract::{Contract, MediaType, TypeDesc};
    pub use crate::error::{Error, Result};
    pub use crate::graph::{BaseNegotiationGraph, NegotiationGraph};
    pub use crate::negotiator::{Negotiator, NegotiatorBuilder, Value};
    pub use crate::pipeline::{Negotiated, NegotiationContext, TypedNegotiated};
    pub use crate::router::{Route, RouteStep};
    pub use crate::service::NegotiationService;
}

pub use error::{Error, Result};
