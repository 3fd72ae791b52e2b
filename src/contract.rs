//! Compatibility contracts.
//!
//! A contract describes one dimension of compatibility a negotiator
//! requires (source role) or offers (output role): an accepted/produced
//! type, a media type, or a fixed weight. Contracts are immutable values
//! and pure predicates; negotiating them has no side effects.

use std::any::{Any, TypeId};
use std::fmt;

// ============================================================================
// TypeDesc
// ============================================================================

/// A type descriptor used by type contracts.
///
/// `Any` is the wildcard descriptor: it accepts every concrete type. A
/// concrete descriptor accepts only an identical type. Note the asymmetry:
/// a producer that offers `Any` does not satisfy a consumer requiring a
/// concrete type.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeDesc {
    /// Matches every concrete type.
    Any,
    /// A single concrete type, identified by its `TypeId`.
    Concrete(TypeId, &'static str),
}

impl TypeDesc {
    /// Create a descriptor for the concrete type `T`.
    pub fn of<T: Any>() -> Self {
        Self::Concrete(TypeId::of::<T>(), std::any::type_name::<T>())
    }

    /// Check whether a consumer requiring `self` accepts a produced type.
    pub fn accepts(&self, produced: &TypeDesc) -> bool {
        match (self, produced) {
            (Self::Any, _) => true,
            (Self::Concrete(required, _), Self::Concrete(offered, _)) => required == offered,
            (Self::Concrete(..), Self::Any) => false,
        }
    }

    /// The type name, for diagnostics.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Any => "any",
            Self::Concrete(_, name) => name,
        }
    }
}

impl fmt::Debug for TypeDesc {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeDesc({})", self.name())
    }
}

// ============================================================================
// MediaType
// ============================================================================

/// A media type such as `text/plain` or `application/json`.
///
/// Normalized (trimmed, lowercased) at construction so comparison is plain
/// equality. Parameters are not parsed.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct MediaType(String);

impl MediaType {
    /// Create a media type, normalizing case and surrounding whitespace.
    pub fn new(value: impl AsRef<str>) -> Self {
        Self(value.as_ref().trim().to_ascii_lowercase())
    }

    /// The normalized media type string.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MediaType({})", self.0)
    }
}

impl fmt::Display for MediaType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for MediaType {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

// ============================================================================
// Contract
// ============================================================================

/// One compatibility dimension required or offered by a negotiator.
///
/// Role is positional: the same value can sit in a negotiator's source list
/// (a requirement) or output list (an offer).
#[derive(Clone, Debug)]
pub enum Contract {
    /// Requires/offers a value of the described type.
    Type(TypeDesc),
    /// Requires/offers a specific media type.
    Media(MediaType),
    /// Contributes a fixed weight unconditionally. Duplicates stack.
    Weight(f64),
}

impl Contract {
    /// Create a type contract for `T`.
    pub fn of_type<T: Any>() -> Self {
        Self::Type(TypeDesc::of::<T>())
    }

    /// Create a media type contract.
    pub fn media(value: impl Into<MediaType>) -> Self {
        Self::Media(value.into())
    }

    /// Evaluate this contract as a requirement against an offered
    /// counterpart.
    ///
    /// Returns the weight this pairing contributes, or `None` if the offer
    /// does not satisfy the requirement. Weight contracts succeed against
    /// anything.
    pub fn require(&self, offered: &Contract) -> Option<f64> {
        match (self, offered) {
            (Self::Type(required), Self::Type(produced)) => {
                required.accepts(produced).then_some(0.0)
            }
            (Self::Media(a), Self::Media(b)) => (a == b).then_some(0.0),
            (Self::Weight(w), _) => Some(*w),
            _ => None,
        }
    }

    /// Evaluate this contract as an offer against a requiring counterpart.
    ///
    /// The mirror of [`require`](Self::require): the type acceptance check
    /// still runs requirement-side, but the weight contributed is this
    /// contract's own.
    pub fn offer(&self, requirement: &Contract) -> Option<f64> {
        match (self, requirement) {
            (Self::Type(produced), Self::Type(required)) => {
                required.accepts(produced).then_some(0.0)
            }
            (Self::Media(a), Self::Media(b)) => (a == b).then_some(0.0),
            (Self::Weight(w), _) => Some(*w),
            _ => None,
        }
    }

    /// Whether this contract succeeds with no counterpart at all.
    ///
    /// Only weight contracts do; they are independent of what the other
    /// side declares.
    pub fn is_unconditional(&self) -> bool {
        matches!(self, Self::Weight(_))
    }

    /// The unconditional weight of this contract, if any.
    pub(crate) fn unconditional_weight(&self) -> Option<f64> {
        match self {
            Self::Weight(w) => Some(*w),
            _ => None,
        }
    }
}
