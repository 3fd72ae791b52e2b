//! The pairwise negotiation protocol.
//!
//! Given a producing negotiator and a consuming negotiator, every contract
//! on both sides must find a counterpart it settles with; the result is the
//! summed weight of each contract's settlement. Incompatibility is the
//! normal "no edge" case and is reported as `None`, never as an error.

use crate::contract::Contract;
use crate::negotiator::Negotiator;

/// The outcome of a successful negotiation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NegotiationResult {
    weight: f64,
}

impl NegotiationResult {
    /// Create a result with the given weight.
    ///
    /// Weights are non-negative; the router relies on this.
    pub fn new(weight: f64) -> Self {
        debug_assert!(weight >= 0.0, "negotiation weights must be non-negative");
        Self { weight }
    }

    /// The accumulated weight of the negotiation.
    #[inline]
    pub fn weight(&self) -> f64 {
        self.weight
    }
}

/// Negotiate a producing negotiator against a consuming one.
///
/// Two passes:
///
/// 1. Every source contract of `source` must settle with some output
///    contract of `output` (first acceptable counterpart, in list order).
/// 2. Every output contract of `output` must settle with some source
///    contract of `source`.
///
/// Any contract with no acceptable counterpart fails the whole negotiation.
/// On success the weight is the sum of each contract's settlement, once per
/// contract on both sides. Duplicate contracts each contribute their own
/// weight; stacked `Weight` contracts are an intentional penalty mechanism.
pub fn negotiate(output: &Negotiator, source: &Negotiator) -> Option<NegotiationResult> {
    let mut weight = 0.0;

    for requirement in source.source_contracts() {
        weight += settle_requirement(requirement, output.output_contracts())?;
    }
    for offer in output.output_contracts() {
        weight += settle_offer(offer, source.source_contracts())?;
    }

    Some(NegotiationResult::new(weight))
}

/// Settle a requirement against a list of offers.
fn settle_requirement(requirement: &Contract, offers: &[Contract]) -> Option<f64> {
    offers
        .iter()
        .find_map(|offer| requirement.require(offer))
        .or_else(|| requirement.unconditional_weight())
}

/// Settle an offer against a list of requirements.
fn settle_offer(offer: &Contract, requirements: &[Contract]) -> Option<f64> {
    requirements
        .iter()
        .find_map(|requirement| offer.offer(requirement))
        .or_else(|| offer.unconditional_weight())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contract::TypeDesc;

    #[test]
    fn test_negotiate_matching_types() {
        let producer = Negotiator::identity::<String>();
        let consumer = Negotiator::identity::<String>();

        let result = negotiate(&producer, &consumer).unwrap();
        assert_eq!(result.weight(), 0.0);
    }

    #[test]
    fn test_negotiate_incompatible_types() {
        let producer = Negotiator::identity::<String>();
        let consumer = Negotiator::identity::<i32>();

        assert!(negotiate(&producer, &consumer).is_none());
    }

    #[test]
    fn test_negotiate_concrete_into_any() {
        let producer = Negotiator::identity::<String>();
        let consumer = Negotiator::identity_for(TypeDesc::Any);

        let result = negotiate(&producer, &consumer).unwrap();
        assert_eq!(result.weight(), 0.0);

        // The other direction fails: an "any" producer does not satisfy a
        // concrete requirement.
        assert!(negotiate(&consumer, &producer).is_none());
    }

    #[test]
    fn test_negotiate_sums_weight_contracts() {
        let producer = Negotiator::builder("weighted")
            .as_type::<String>()
            .with_weight(2.0)
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();
        let consumer = Negotiator::identity::<String>();

        // Producer side contributes: output Type (0.0) + output Weight (2.0).
        // Consumer side contributes its source Type (0.0). The producer's
        // source-side Weight contract is not consulted: this negotiation
        // only reads the producer's output role.
        let result = negotiate(&producer, &consumer).unwrap();
        assert_eq!(result.weight(), 2.0);
    }

    #[test]
    fn test_negotiate_duplicate_weights_stack() {
        let producer = Negotiator::builder("stacked")
            .as_type::<String>()
            .with_weight(1.0)
            .with_weight(1.5)
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();
        let consumer = Negotiator::identity::<String>();

        let result = negotiate(&producer, &consumer).unwrap();
        assert_eq!(result.weight(), 2.5);
    }

    #[test]
    fn test_negotiate_each_contract_counted_once() {
        // A weight contract on both roles of both sides contributes once
        // per consulted role: producer output pass + consumer source pass.
        let producer = Negotiator::builder("a")
            .as_type::<String>()
            .output_contract(crate::contract::Contract::Weight(1.0))
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();
        let consumer = Negotiator::builder("b")
            .of_type::<String>()
            .source_contract(crate::contract::Contract::Weight(3.0))
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();

        let result = negotiate(&producer, &consumer).unwrap();
        assert_eq!(result.weight(), 4.0);
    }

    #[test]
    fn test_negotiate_media_requirement_blocks() {
        let producer = Negotiator::builder("plain")
            .as_type::<String>()
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();
        let consumer = Negotiator::builder("json-only")
            .of_type::<String>()
            .of_media("application/json")
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();

        // The consumer's media requirement finds no counterpart offer.
        assert!(negotiate(&producer, &consumer).is_none());

        let json_producer = Negotiator::builder("json")
            .as_type::<String>()
            .as_media("application/json")
            .run_raw(|v, _| Some(v))
            .build()
            .unwrap();
        assert!(negotiate(&json_producer, &consumer).is_some());
    }

    #[test]
    fn test_negotiate_failure_is_symmetric_in_success() {
        // Both directions are independently validated: success one way
        // implies nothing about the reverse pairing of roles.
        let producer = Negotiator::identity::<String>();
        let consumer = Negotiator::identity::<String>();
        assert!(negotiate(&producer, &consumer).is_some());
        assert!(negotiate(&consumer, &producer).is_some());
    }
}
