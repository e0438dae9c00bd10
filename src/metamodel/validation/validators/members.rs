//! Member-level validators.

use crate::metamodel::{
    facets::{AutoCompleteFacet, ChoicesFacet, MemberOrderFacet},
    spec::order,
    validation::{MetaModelValidator, ValidationContext, ValidationFailures},
};

/// A feature offers either a fixed list of choices or auto-complete, never both
pub struct ChoicesConflictValidator;

impl ChoicesConflictValidator {
    /// Creates the validator
    #[must_use]
    pub fn new() -> Self {
        ChoicesConflictValidator
    }
}

impl Default for ChoicesConflictValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaModelValidator for ChoicesConflictValidator {
    fn name(&self) -> &'static str {
        "ChoicesConflictValidator"
    }

    fn priority(&self) -> u32 {
        140
    }

    fn validate(&self, ctx: &ValidationContext<'_>, failures: &mut ValidationFailures) {
        for spec in ctx.specifications() {
            for holder in spec.holders() {
                if holder.contains_facet::<dyn ChoicesFacet>()
                    && holder.contains_facet::<dyn AutoCompleteFacet>()
                {
                    failures.add(
                        holder.identifier(),
                        "has both choices and auto-complete",
                    );
                }
            }
        }
    }
}

/// Member order sequences consist of non-empty dotted segments
pub struct MemberOrderSyntaxValidator;

impl MemberOrderSyntaxValidator {
    /// Creates the validator
    #[must_use]
    pub fn new() -> Self {
        MemberOrderSyntaxValidator
    }
}

impl Default for MemberOrderSyntaxValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaModelValidator for MemberOrderSyntaxValidator {
    fn name(&self) -> &'static str {
        "MemberOrderSyntaxValidator"
    }

    fn priority(&self) -> u32 {
        150
    }

    fn validate(&self, ctx: &ValidationContext<'_>, failures: &mut ValidationFailures) {
        for spec in ctx.specifications() {
            for member in spec.declared_members() {
                let Some(facet) = member.get_facet::<dyn MemberOrderFacet>() else {
                    continue;
                };
                if !order::is_valid_sequence(facet.sequence()) {
                    failures.add(
                        member.identifier(),
                        format!("invalid member order sequence '{}'", facet.sequence()),
                    );
                }
            }
        }
    }
}

/// Support methods that named a member but matched none of its conventions
pub struct OrphanedSupportMethodsValidator;

impl OrphanedSupportMethodsValidator {
    /// Creates the validator
    #[must_use]
    pub fn new() -> Self {
        OrphanedSupportMethodsValidator
    }
}

impl Default for OrphanedSupportMethodsValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaModelValidator for OrphanedSupportMethodsValidator {
    fn name(&self) -> &'static str {
        "OrphanedSupportMethodsValidator"
    }

    fn priority(&self) -> u32 {
        100
    }

    fn should_run(&self, ctx: &ValidationContext<'_>) -> bool {
        ctx.config().enable_orphan_validation
    }

    fn validate(&self, ctx: &ValidationContext<'_>, failures: &mut ValidationFailures) {
        for spec in ctx.specifications() {
            for method in spec.orphaned_methods() {
                failures.add(
                    spec.identifier(),
                    format!(
                        "'{}' with {} parameter(s) returning {} does not match any support method convention",
                        method.name,
                        method.param_count(),
                        method.return_type
                    ),
                );
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        metamodel::{
            config::MetaModelConfig,
            reflect::{Annotation, ClassBuilder, MethodBuilder, TypeRef},
        },
        test::{bootstrap, run_validator},
    };

    #[test]
    fn test_choices_conflict() {
        let loader = bootstrap(vec![ClassBuilder::new("Order")
            .method(MethodBuilder::new("getStatus").returns(TypeRef::value("String")))
            .method(MethodBuilder::new("choicesStatus").returns(TypeRef::collection("String")))
            .method(
                MethodBuilder::new("autoCompleteStatus")
                    .param("search", TypeRef::value("String"))
                    .returns(TypeRef::collection("String")),
            )]);

        let failures = run_validator(
            &ChoicesConflictValidator::new(),
            &loader,
            &MetaModelConfig::production(),
        );
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].identifier().member_name(), Some("status"));
    }

    #[test]
    fn test_member_order_syntax() {
        let loader = bootstrap(vec![ClassBuilder::new("Customer")
            .method(
                MethodBuilder::new("getName")
                    .returns(TypeRef::value("String"))
                    .annotate(Annotation::new("MemberOrder").with("sequence", "1.2")),
            )
            .method(
                MethodBuilder::new("getEmail")
                    .returns(TypeRef::value("String"))
                    .annotate(Annotation::new("MemberOrder").with("sequence", "1..3")),
            )]);

        let failures = run_validator(
            &MemberOrderSyntaxValidator::new(),
            &loader,
            &MetaModelConfig::production(),
        );
        assert_eq!(failures.len(), 1);
        assert_eq!(failures[0].identifier().member_name(), Some("email"));
    }

    #[test]
    fn test_orphaned_support_methods() {
        let loader = bootstrap(vec![ClassBuilder::new("Customer")
            .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
            .method(MethodBuilder::new("defaultName"))]);

        let failures = run_validator(
            &OrphanedSupportMethodsValidator::new(),
            &loader,
            &MetaModelConfig::production(),
        );
        assert_eq!(failures.len(), 1);
        assert!(failures[0].message().starts_with("'defaultName'"));

        let specs = loader.all_specifications();
        let relaxed = MetaModelConfig {
            enable_orphan_validation: false,
            ..MetaModelConfig::production()
        };
        assert!(!OrphanedSupportMethodsValidator::new()
            .should_run(&ValidationContext::new(&specs, &relaxed)));
    }
}
