//! Stable identities for classes, members and action parameters.
//!
//! A [`FeatureIdentifier`] is the key used everywhere in the metamodel: facet holders are
//! named by it, validation failures point at it, and construction errors report it. Two
//! identifiers with equal attribute tuples are equal, hash identically and order identically.
//!
//! # Examples
//!
//! ```rust
//! use facetmodel::metamodel::identifier::{FeatureIdentifier, FeatureKind};
//!
//! let name = FeatureIdentifier::property("Customer", "name");
//! assert_eq!(name.kind(), FeatureKind::Property);
//! assert_eq!(name.to_string(), "Customer#name");
//!
//! let param = FeatureIdentifier::parameter("Customer", "placeOrder", 1);
//! assert_eq!(param.to_string(), "Customer#placeOrder[1]");
//! ```

use std::fmt;

use bitflags::bitflags;
use strum::{Display, EnumCount, EnumIter};

/// The kind of feature an identifier names.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumCount,
)]
pub enum FeatureKind {
    /// The class itself
    Type,
    /// A scalar association (getter-based)
    Property,
    /// A multi-valued association
    Collection,
    /// An invokable behavior
    Action,
    /// A parameter of an action
    ActionParameter,
}

impl FeatureKind {
    /// The single-bit mask of this kind
    #[must_use]
    pub fn mask(self) -> FeatureKinds {
        match self {
            FeatureKind::Type => FeatureKinds::TYPE,
            FeatureKind::Property => FeatureKinds::PROPERTY,
            FeatureKind::Collection => FeatureKinds::COLLECTION,
            FeatureKind::Action => FeatureKinds::ACTION,
            FeatureKind::ActionParameter => FeatureKinds::PARAMETER,
        }
    }

    /// Returns true for properties and collections
    #[must_use]
    pub fn is_association(self) -> bool {
        matches!(self, FeatureKind::Property | FeatureKind::Collection)
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    /// The set of feature kinds a facet factory applies to
    pub struct FeatureKinds: u8 {
        /// Class level
        const TYPE = 0x01;
        /// Properties
        const PROPERTY = 0x02;
        /// Collections
        const COLLECTION = 0x04;
        /// Actions
        const ACTION = 0x08;
        /// Action parameters
        const PARAMETER = 0x10;
        /// Properties and collections
        const ASSOCIATIONS = Self::PROPERTY.bits() | Self::COLLECTION.bits();
        /// Every member, but not the class itself
        const MEMBERS = Self::ASSOCIATIONS.bits() | Self::ACTION.bits();
        /// Members and parameters
        const MEMBERS_AND_PARAMETERS = Self::MEMBERS.bits() | Self::PARAMETER.bits();
        /// Everything
        const ALL = Self::TYPE.bits() | Self::MEMBERS_AND_PARAMETERS.bits();
    }
}

impl FeatureKinds {
    /// Returns true if `kind` is part of this set
    #[must_use]
    pub fn applies_to(self, kind: FeatureKind) -> bool {
        self.contains(kind.mask())
    }
}

/// Immutable identity of a class, member or action parameter.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FeatureIdentifier {
    class_name: String,
    member_name: Option<String>,
    parameter_index: Option<usize>,
    kind: FeatureKind,
}

impl FeatureIdentifier {
    /// Identifier of a class
    pub fn type_id(class_name: impl Into<String>) -> Self {
        FeatureIdentifier {
            class_name: class_name.into(),
            member_name: None,
            parameter_index: None,
            kind: FeatureKind::Type,
        }
    }

    /// Identifier of a property
    pub fn property(class_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self::member(class_name, member, FeatureKind::Property)
    }

    /// Identifier of a collection
    pub fn collection(class_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self::member(class_name, member, FeatureKind::Collection)
    }

    /// Identifier of an action
    pub fn action(class_name: impl Into<String>, member: impl Into<String>) -> Self {
        Self::member(class_name, member, FeatureKind::Action)
    }

    /// Identifier of a member of the given kind
    pub fn member(
        class_name: impl Into<String>,
        member: impl Into<String>,
        kind: FeatureKind,
    ) -> Self {
        FeatureIdentifier {
            class_name: class_name.into(),
            member_name: Some(member.into()),
            parameter_index: None,
            kind,
        }
    }

    /// Identifier of the `index`-th parameter of an action
    pub fn parameter(
        class_name: impl Into<String>,
        action: impl Into<String>,
        index: usize,
    ) -> Self {
        FeatureIdentifier {
            class_name: class_name.into(),
            member_name: Some(action.into()),
            parameter_index: Some(index),
            kind: FeatureKind::ActionParameter,
        }
    }

    /// Returns the identifier of the `index`-th parameter of this action
    #[must_use]
    pub fn with_parameter(&self, index: usize) -> Self {
        FeatureIdentifier {
            class_name: self.class_name.clone(),
            member_name: self.member_name.clone(),
            parameter_index: Some(index),
            kind: FeatureKind::ActionParameter,
        }
    }

    /// The same member, re-homed onto another class (used for inherited members)
    #[must_use]
    pub fn rehome(&self, class_name: &str) -> Self {
        FeatureIdentifier {
            class_name: class_name.to_string(),
            ..self.clone()
        }
    }

    /// Name of the owning class
    #[must_use]
    pub fn class_name(&self) -> &str {
        &self.class_name
    }

    /// Name of the member, `None` for class identifiers
    #[must_use]
    pub fn member_name(&self) -> Option<&str> {
        self.member_name.as_deref()
    }

    /// Parameter position, only set for action parameters
    #[must_use]
    pub fn parameter_index(&self) -> Option<usize> {
        self.parameter_index
    }

    /// The kind of feature
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        self.kind
    }

    /// Returns true if this names the class itself
    #[must_use]
    pub fn is_type(&self) -> bool {
        self.kind == FeatureKind::Type
    }
}

impl fmt::Display for FeatureIdentifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.class_name)?;
        if let Some(member) = &self.member_name {
            write!(f, "#{member}")?;
        }
        if let Some(index) = self.parameter_index {
            write!(f, "[{index}]")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::{BTreeSet, HashMap};
    use strum::IntoEnumIterator;

    #[test]
    fn test_equal_tuples_are_interchangeable_keys() {
        let mut map = HashMap::new();
        map.insert(FeatureIdentifier::property("Customer", "name"), 1);

        let other = FeatureIdentifier::property(String::from("Customer"), String::from("name"));
        assert_eq!(map.get(&other), Some(&1));
        assert_ne!(
            FeatureIdentifier::property("Customer", "name"),
            FeatureIdentifier::collection("Customer", "name")
        );
    }

    #[test]
    fn test_display() {
        assert_eq!(FeatureIdentifier::type_id("Order").to_string(), "Order");
        assert_eq!(
            FeatureIdentifier::action("Order", "cancel").to_string(),
            "Order#cancel"
        );
        assert_eq!(
            FeatureIdentifier::action("Order", "cancel")
                .with_parameter(0)
                .to_string(),
            "Order#cancel[0]"
        );
    }

    #[test]
    fn test_ordering_is_total_and_stable() {
        let set: BTreeSet<_> = [
            FeatureIdentifier::action("B", "x"),
            FeatureIdentifier::type_id("B"),
            FeatureIdentifier::property("A", "z"),
        ]
        .into_iter()
        .collect();

        let ordered: Vec<String> = set.iter().map(ToString::to_string).collect();
        assert_eq!(ordered, vec!["A#z", "B", "B#x"]);
    }

    #[test]
    fn test_feature_kinds_mask() {
        for kind in FeatureKind::iter() {
            assert!(FeatureKinds::ALL.applies_to(kind));
        }
        assert!(!FeatureKinds::MEMBERS.applies_to(FeatureKind::Type));
        assert!(!FeatureKinds::MEMBERS.applies_to(FeatureKind::ActionParameter));
        assert!(FeatureKinds::ASSOCIATIONS.applies_to(FeatureKind::Collection));
        assert_eq!(FeatureKind::COUNT, 5);
    }

    #[test]
    fn test_rehome() {
        let id = FeatureIdentifier::property("Party", "name");
        let rehomed = id.rehome("Customer");
        assert_eq!(rehomed.class_name(), "Customer");
        assert_eq!(rehomed.member_name(), Some("name"));
        assert_eq!(rehomed.kind(), FeatureKind::Property);
    }
}
