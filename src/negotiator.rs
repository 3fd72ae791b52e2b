//! Negotiator nodes.
//!
//! A negotiator is a node in the negotiation graph: an ordered list of
//! source contracts (what it requires), an ordered list of output contracts
//! (what it offers), and an executable transformation function. Negotiators
//! are immutable once built; the graph layer's neighbor cache relies on
//! this, so construction goes through a consuming builder and the contract
//! lists are never exposed mutably.

use crate::contract::{Contract, MediaType, TypeDesc};
use crate::error::{Error, Result};
use crate::pipeline::NegotiationContext;
use smallvec::SmallVec;
use std::any::Any;
use std::fmt;
use std::sync::Arc;

/// The dynamically typed payload threaded through a pipeline.
pub type Value = Box<dyn Any + Send>;

/// A transformation step.
///
/// Returning `None` means the step declined to produce output; the pipeline
/// then abandons the route. Panics propagate to the caller unmodified.
pub type Executable = Arc<dyn Fn(Value, &NegotiationContext) -> Option<Value> + Send + Sync>;

/// Contract list storage. Negotiators rarely carry more than two contracts
/// per role.
pub type Contracts = SmallVec<[Contract; 2]>;

// ============================================================================
// Negotiator
// ============================================================================

/// A typed transformation node with compatibility contracts.
///
/// A pure entry node populates only output contracts, a pure exit node only
/// source contracts; an intermediate hop populates both. Negotiators are
/// compared by pointer identity (`Arc::ptr_eq`), never structurally: two
/// structurally identical negotiators are distinct nodes and may
/// legitimately negotiate with each other.
pub struct Negotiator {
    /// Human-readable name, for diagnostics.
    name: String,
    /// Contracts this node requires from an upstream producer.
    source_contracts: Contracts,
    /// Contracts this node offers to a downstream consumer.
    output_contracts: Contracts,
    /// The transformation function.
    executable: Executable,
}

impl Negotiator {
    /// Start building a negotiator.
    pub fn builder(name: impl Into<String>) -> NegotiatorBuilder {
        NegotiatorBuilder::new(name)
    }

    /// Create a terminal negotiator for type `T`: a sole type contract of
    /// `T` in both roles and an identity executable.
    pub fn identity<T: Any>() -> Arc<Self> {
        Self::identity_for(TypeDesc::of::<T>())
    }

    /// Create a terminal negotiator for an arbitrary type descriptor.
    pub fn identity_for(desc: TypeDesc) -> Arc<Self> {
        let mut source_contracts = Contracts::new();
        source_contracts.push(Contract::Type(desc));
        let mut output_contracts = Contracts::new();
        output_contracts.push(Contract::Type(desc));
        Arc::new(Self {
            name: format!("identity<{}>", desc.name()),
            source_contracts,
            output_contracts,
            executable: Arc::new(|value, _| Some(value)),
        })
    }

    /// The negotiator's name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Contracts this node requires from an upstream producer.
    pub fn source_contracts(&self) -> &[Contract] {
        &self.source_contracts
    }

    /// Contracts this node offers to a downstream consumer.
    pub fn output_contracts(&self) -> &[Contract] {
        &self.output_contracts
    }

    /// Whether this node can act as a consumer (has source contracts).
    pub fn has_source_role(&self) -> bool {
        !self.source_contracts.is_empty()
    }

    /// Whether this node can act as a producer (has output contracts).
    pub fn has_output_role(&self) -> bool {
        !self.output_contracts.is_empty()
    }

    /// Execute this node's transformation.
    pub fn execute(&self, value: Value, context: &NegotiationContext) -> Option<Value> {
        (self.executable)(value, context)
    }
}

impl fmt::Debug for Negotiator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Negotiator")
            .field("name", &self.name)
            .field("source_contracts", &self.source_contracts)
            .field("output_contracts", &self.output_contracts)
            .finish_non_exhaustive()
    }
}

// ============================================================================
// NegotiatorId
// ============================================================================

/// Pointer-derived identity of a negotiator.
///
/// Used as the key for graph caches and router node tables. Valid only
/// while the `Arc` it was taken from is alive; all holders in this crate
/// keep the `Arc` alongside the id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NegotiatorId(usize);

impl NegotiatorId {
    /// The identity of a negotiator.
    pub fn of(negotiator: &Arc<Negotiator>) -> Self {
        Self(Arc::as_ptr(negotiator) as usize)
    }
}

// ============================================================================
// NegotiatorBuilder
// ============================================================================

/// Consuming builder for [`Negotiator`].
///
/// # Example
///
/// ```rust
/// use transit::negotiator::Negotiator;
///
/// let parse = Negotiator::builder("parse-int")
///     .of_type::<String>()
///     .as_type::<i32>()
///     .run(|s: String, _| s.parse::<i32>().ok())
///     .build()
///     .unwrap();
/// assert!(parse.has_source_role());
/// assert!(parse.has_output_role());
/// ```
pub struct NegotiatorBuilder {
    name: String,
    source_contracts: Contracts,
    output_contracts: Contracts,
    executable: Option<Executable>,
}

impl NegotiatorBuilder {
    /// Start a builder with the given name.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            source_contracts: Contracts::new(),
            output_contracts: Contracts::new(),
            executable: None,
        }
    }

    /// Require values of type `T` (appends a source type contract).
    pub fn of_type<T: Any>(mut self) -> Self {
        self.source_contracts.push(Contract::of_type::<T>());
        self
    }

    /// Require values of any type.
    pub fn of_any(mut self) -> Self {
        self.source_contracts.push(Contract::Type(TypeDesc::Any));
        self
    }

    /// Offer values of type `T` (appends an output type contract).
    pub fn as_type<T: Any>(mut self) -> Self {
        self.output_contracts.push(Contract::of_type::<T>());
        self
    }

    /// Offer values of any type.
    pub fn as_any(mut self) -> Self {
        self.output_contracts.push(Contract::Type(TypeDesc::Any));
        self
    }

    /// Require the given media type.
    pub fn of_media(mut self, media: impl Into<MediaType>) -> Self {
        self.source_contracts.push(Contract::Media(media.into()));
        self
    }

    /// Offer the given media type.
    pub fn as_media(mut self, media: impl Into<MediaType>) -> Self {
        self.output_contracts.push(Contract::Media(media.into()));
        self
    }

    /// Attach a fixed weight to both roles.
    ///
    /// Weight contracts contribute their value to every successful
    /// negotiation this node participates in, independent of type matching.
    /// Duplicates stack. Weights must be non-negative; the router assumes
    /// non-negative edge weights.
    pub fn with_weight(mut self, weight: f64) -> Self {
        debug_assert!(weight >= 0.0, "negotiation weights must be non-negative");
        self.source_contracts.push(Contract::Weight(weight));
        self.output_contracts.push(Contract::Weight(weight));
        self
    }

    /// Append an arbitrary source contract.
    pub fn source_contract(mut self, contract: Contract) -> Self {
        self.source_contracts.push(contract);
        self
    }

    /// Append an arbitrary output contract.
    pub fn output_contract(mut self, contract: Contract) -> Self {
        self.output_contracts.push(contract);
        self
    }

    /// Set a typed transformation function.
    ///
    /// The value is downcast to `T` before the closure runs. A value of an
    /// unexpected type is declined (the step yields `None`); with type
    /// contracts in place the router never feeds a step a type it did not
    /// ask for, but a node requiring `TypeDesc::Any` may see anything.
    pub fn run<T, U, F>(self, f: F) -> Self
    where
        T: Any + Send,
        U: Any + Send,
        F: Fn(T, &NegotiationContext) -> Option<U> + Send + Sync + 'static,
    {
        self.run_raw(move |value, context| {
            let input = value.downcast::<T>().ok()?;
            f(*input, context).map(|output| Box::new(output) as Value)
        })
    }

    /// Set an untyped transformation function.
    pub fn run_raw<F>(mut self, f: F) -> Self
    where
        F: Fn(Value, &NegotiationContext) -> Option<Value> + Send + Sync + 'static,
    {
        self.executable = Some(Arc::new(f));
        self
    }

    /// Finalize into an immutable negotiator.
    ///
    /// Fails fast if no executable was set or no contracts were declared in
    /// either role; both are configuration errors, not negotiable states.
    pub fn build(self) -> Result<Arc<Negotiator>> {
        if self.source_contracts.is_empty() && self.output_contracts.is_empty() {
            return Err(Error::NoContracts {
                negotiator: self.name,
            });
        }
        let executable = self.executable.ok_or_else(|| Error::MissingExecutable {
            negotiator: self.name.clone(),
        })?;
        Ok(Arc::new(Negotiator {
            name: self.name,
            source_contracts: self.source_contracts,
            output_contracts: self.output_contracts,
            executable,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_roles() {
        let entry = Negotiator::builder("entry")
            .as_type::<String>()
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();
        assert!(entry.has_output_role());
        assert!(!entry.has_source_role());

        let exit = Negotiator::builder("exit")
            .of_type::<String>()
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();
        assert!(exit.has_source_role());
        assert!(!exit.has_output_role());
    }

    #[test]
    fn test_builder_requires_executable() {
        let result = Negotiator::builder("no-exec").of_type::<String>().build();
        assert!(matches!(result, Err(Error::MissingExecutable { .. })));
    }

    #[test]
    fn test_builder_requires_contracts() {
        let result = Negotiator::builder("bare")
            .run_raw(|v, _| Some(v))
            .build();
        assert!(matches!(result, Err(Error::NoContracts { .. })));
    }

    #[test]
    fn test_identity_terminal() {
        let terminal = Negotiator::identity::<String>();
        assert!(terminal.has_source_role());
        assert!(terminal.has_output_role());
        assert_eq!(terminal.name(), "identity<alloc::string::String>");

        let ctx = NegotiationContext::default();
        let out = terminal.execute(Box::new("x".to_string()), &ctx).unwrap();
        assert_eq!(*out.downcast::<String>().unwrap(), "x");
    }

    #[test]
    fn test_typed_run_declines_wrong_type() {
        let upper = Negotiator::builder("upper")
            .of_any()
            .as_type::<String>()
            .run(|s: String, _| Some(s.to_uppercase()))
            .build()
            .unwrap();

        let ctx = NegotiationContext::default();
        assert!(upper.execute(Box::new(7_i32), &ctx).is_none());

        let out = upper.execute(Box::new("abc".to_string()), &ctx).unwrap();
        assert_eq!(*out.downcast::<String>().unwrap(), "ABC");
    }

    #[test]
    fn test_negotiator_id_is_pointer_identity() {
        let a = Negotiator::identity::<String>();
        let b = Negotiator::identity::<String>();
        assert_eq!(NegotiatorId::of(&a), NegotiatorId::of(&a.clone()));
        assert_ne!(NegotiatorId::of(&a), NegotiatorId::of(&b));
    }
}
