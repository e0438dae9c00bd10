//! Interaction advisors: the facet kinds consulted per request to decide whether a feature
//! is visible, usable and whether proposed values are valid.
//!
//! Every advisor answers with `Ok(None)` to allow and `Ok(Some(reason))` to veto. An `Err`
//! only signals that a support method could not be invoked.

use crate::{
    metamodel::{
        facets::{AsFacet, Facet, FacetBase, FacetType, InteractionContext, Precedence},
        identifier::FeatureIdentifier,
        reflect::MethodDescriptorRc,
    },
    Result,
};

/// Hides a feature (hiding interaction advisor)
pub trait HiddenFacet: Facet + AsFacet {
    /// `Some(reason)` if the feature is hidden in this context
    ///
    /// # Errors
    /// Returns an error if a support method fails.
    fn hides(&self, ctx: &InteractionContext<'_>) -> Result<Option<String>>;
}

/// Disables a feature (disabling interaction advisor)
pub trait DisabledFacet: Facet + AsFacet {
    /// `Some(reason)` if the feature is disabled in this context
    ///
    /// # Errors
    /// Returns an error if a support method fails.
    fn disabled_reason(&self, ctx: &InteractionContext<'_>) -> Result<Option<String>>;
}

/// Validates proposed values (validating interaction advisor)
pub trait ValidateFacet: Facet + AsFacet {
    /// `Some(reason)` if the proposed arguments in `ctx` are invalid
    ///
    /// # Errors
    /// Returns an error if a support method fails.
    fn invalid_reason(&self, ctx: &InteractionContext<'_>) -> Result<Option<String>>;
}

/// Unconditionally hidden, e.g. through `@Hidden`
#[derive(Debug)]
pub struct HiddenFacetWithReason {
    base: FacetBase,
}

impl HiddenFacetWithReason {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, precedence: Precedence) -> Self {
        HiddenFacetWithReason {
            base: FacetBase::new(holder, precedence),
        }
    }
}

impl HiddenFacet for HiddenFacetWithReason {
    fn hides(&self, _ctx: &InteractionContext<'_>) -> Result<Option<String>> {
        Ok(Some("Hidden".to_string()))
    }
}

/// Hidden through a `hideXxx()` support method returning a boolean
#[derive(Debug)]
pub struct HiddenFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl HiddenFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        HiddenFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }

    /// The support method
    #[must_use]
    pub fn method(&self) -> &MethodDescriptorRc {
        &self.method
    }
}

impl HiddenFacet for HiddenFacetViaMethod {
    fn hides(&self, ctx: &InteractionContext<'_>) -> Result<Option<String>> {
        let returned = self
            .method
            .invoke(self.holder(), ctx.target(), ctx.arguments())?;
        Ok(returned.into_reason("Hidden"))
    }
}

/// Disabled with a fixed reason: `@Disabled`, `editing = DISABLED`, configuration defaults
/// and the facet derived from an immutable type.
#[derive(Debug)]
pub struct DisabledFacetWithReason {
    base: FacetBase,
    reason: String,
}

impl DisabledFacetWithReason {
    /// Creates a directly contributed facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, reason: &str, precedence: Precedence) -> Self {
        DisabledFacetWithReason {
            base: FacetBase::new(holder, precedence),
            reason: reason.to_string(),
        }
    }

    /// Creates a facet derived from a facet of kind `source`
    #[must_use]
    pub fn derived(holder: &FeatureIdentifier, reason: &str, source: FacetType) -> Self {
        DisabledFacetWithReason {
            base: FacetBase::derived(holder, source),
            reason: reason.to_string(),
        }
    }

    /// The fixed reason
    #[must_use]
    pub fn reason(&self) -> &str {
        &self.reason
    }
}

impl DisabledFacet for DisabledFacetWithReason {
    fn disabled_reason(&self, _ctx: &InteractionContext<'_>) -> Result<Option<String>> {
        Ok(Some(self.reason.clone()))
    }
}

/// Disabled through a `disableXxx()` support method returning a reason string
#[derive(Debug)]
pub struct DisabledFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl DisabledFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        DisabledFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl DisabledFacet for DisabledFacetViaMethod {
    fn disabled_reason(&self, ctx: &InteractionContext<'_>) -> Result<Option<String>> {
        let returned = self
            .method
            .invoke(self.holder(), ctx.target(), ctx.arguments())?;
        Ok(returned.into_reason("Disabled"))
    }
}

/// Validation through a `validateXxx(..)` support method returning a reason string
#[derive(Debug)]
pub struct ValidateFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl ValidateFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        ValidateFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl ValidateFacet for ValidateFacetViaMethod {
    fn invalid_reason(&self, ctx: &InteractionContext<'_>) -> Result<Option<String>> {
        let returned = self
            .method
            .invoke(self.holder(), ctx.target(), ctx.arguments())?;
        Ok(returned.into_reason("Invalid"))
    }
}

impl_facet!(
    HiddenFacetWithReason,
    HiddenFacetViaMethod,
    DisabledFacetWithReason,
    DisabledFacetViaMethod,
    ValidateFacetViaMethod,
);

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::metamodel::reflect::{MethodBuilder, TypeRef, Value};

    #[test]
    fn test_hidden_via_method() {
        let id = FeatureIdentifier::property("Customer", "name");
        let method = Arc::new(
            MethodBuilder::new("hideName")
                .returns(TypeRef::value("boolean"))
                .returning(true)
                .build_method(),
        );
        let facet = HiddenFacetViaMethod::new(&id, method);

        let reason = facet.hides(&InteractionContext::new()).unwrap();
        assert_eq!(reason.as_deref(), Some("Hidden"));
        assert_eq!(facet.precedence(), Precedence::Default);
        assert!(!facet.is_derived());
    }

    #[test]
    fn test_disabled_via_method_uses_returned_reason() {
        let id = FeatureIdentifier::property("Customer", "name");
        let method = Arc::new(
            MethodBuilder::new("disableName")
                .returns(TypeRef::value("String"))
                .invoker(|target, _| {
                    let locked = target
                        .and_then(|t| t.downcast_ref::<bool>())
                        .copied()
                        .unwrap_or(false);
                    Ok(if locked {
                        Value::from("Customer is locked")
                    } else {
                        Value::Null
                    })
                })
                .build_method(),
        );
        let facet = DisabledFacetViaMethod::new(&id, method);

        let locked = true;
        let unlocked = false;
        assert_eq!(
            facet
                .disabled_reason(&InteractionContext::new().on(&locked))
                .unwrap()
                .as_deref(),
            Some("Customer is locked")
        );
        assert_eq!(
            facet
                .disabled_reason(&InteractionContext::new().on(&unlocked))
                .unwrap(),
            None
        );
    }

    #[test]
    fn test_validate_via_method_receives_arguments() {
        let id = FeatureIdentifier::property("Customer", "name");
        let method = Arc::new(
            MethodBuilder::new("validateName")
                .param("name", TypeRef::value("String"))
                .invoker(|_, args| {
                    Ok(match args.first().and_then(Value::as_str) {
                        Some(name) if name.is_empty() => Value::from("Name is required"),
                        _ => Value::Null,
                    })
                })
                .build_method(),
        );
        let facet = ValidateFacetViaMethod::new(&id, method);

        let empty = [Value::from("")];
        let ok = [Value::from("Sven")];
        assert_eq!(
            facet
                .invalid_reason(&InteractionContext::new().with_arguments(&empty))
                .unwrap()
                .as_deref(),
            Some("Name is required")
        );
        assert!(facet
            .invalid_reason(&InteractionContext::new().with_arguments(&ok))
            .unwrap()
            .is_none());
    }

    #[test]
    fn test_derived_disabled_facet() {
        let id = FeatureIdentifier::collection("Order", "lines");
        let facet =
            DisabledFacetWithReason::derived(&id, "Immutable", FacetType::of::<dyn HiddenFacet>());
        assert!(facet.is_derived());
        assert_eq!(facet.reason(), "Immutable");
        assert_eq!(facet.precedence(), Precedence::Inferred);
    }
}
