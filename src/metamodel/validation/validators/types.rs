//! Type-level validators: hierarchy, persistence identity, mixins and titles.

use crate::metamodel::{
    facets::{EntityFacet, IdentityStrategy, MixinFacet, TitleFacet},
    reflect::Annotated,
    validation::{MetaModelValidator, ValidationContext, ValidationFailures},
};

/// Superclass chains must not be deeper than `max_supertype_depth`
pub struct SupertypeDepthValidator;

impl SupertypeDepthValidator {
    /// Creates the validator
    #[must_use]
    pub fn new() -> Self {
        SupertypeDepthValidator
    }
}

impl Default for SupertypeDepthValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaModelValidator for SupertypeDepthValidator {
    fn name(&self) -> &'static str {
        "SupertypeDepthValidator"
    }

    fn priority(&self) -> u32 {
        200
    }

    fn validate(&self, ctx: &ValidationContext<'_>, failures: &mut ValidationFailures) {
        let limit = ctx.config().max_supertype_depth;
        for spec in ctx.specifications() {
            let mut depth = 0;
            let mut current = spec.superclass();
            while let Some(superclass) = current {
                depth += 1;
                if depth > limit {
                    failures.add(
                        spec.identifier(),
                        format!("superclass chain is deeper than {limit}"),
                    );
                    break;
                }
                current = superclass.superclass();
            }
        }
    }
}

/// Entities with application identity need at least one `@PrimaryKey` property
pub struct EntityIdentityValidator;

impl EntityIdentityValidator {
    /// Creates the validator
    #[must_use]
    pub fn new() -> Self {
        EntityIdentityValidator
    }
}

impl Default for EntityIdentityValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaModelValidator for EntityIdentityValidator {
    fn name(&self) -> &'static str {
        "EntityIdentityValidator"
    }

    fn priority(&self) -> u32 {
        190
    }

    fn validate(&self, ctx: &ValidationContext<'_>, failures: &mut ValidationFailures) {
        for spec in ctx.specifications() {
            let Some(entity) = spec.holder().get_facet::<dyn EntityFacet>() else {
                continue;
            };
            if entity.identity_strategy() != IdentityStrategy::Application || spec.is_abstract() {
                continue;
            }

            let has_key = spec.properties().iter().any(|p| {
                spec.member_method(p.id())
                    .is_some_and(|accessor| accessor.has_annotation("PrimaryKey"))
            });
            if !has_key {
                failures.add(
                    spec.identifier(),
                    "application identity requires a @PrimaryKey property",
                );
            }
        }
    }
}

/// A mixin declares exactly one action, the one named by its `MixinFacet`
pub struct MixinShapeValidator;

impl MixinShapeValidator {
    /// Creates the validator
    #[must_use]
    pub fn new() -> Self {
        MixinShapeValidator
    }
}

impl Default for MixinShapeValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaModelValidator for MixinShapeValidator {
    fn name(&self) -> &'static str {
        "MixinShapeValidator"
    }

    fn priority(&self) -> u32 {
        180
    }

    fn validate(&self, ctx: &ValidationContext<'_>, failures: &mut ValidationFailures) {
        for spec in ctx.specifications() {
            let Some(mixin) = spec.holder().get_facet::<dyn MixinFacet>() else {
                continue;
            };

            let actions: Vec<&str> = spec
                .declared_members()
                .iter()
                .filter(|m| m.is_action() && !m.is_local_override())
                .map(|m| m.id())
                .collect();
            if !actions.contains(&mixin.method_name()) {
                failures.add(
                    spec.identifier(),
                    format!("mixin method '{}' not found", mixin.method_name()),
                );
            } else if actions.len() > 1 {
                failures.add(
                    spec.identifier(),
                    format!(
                        "mixin declares {} actions ({}); exactly one expected",
                        actions.len(),
                        actions.join(", ")
                    ),
                );
            }
        }
    }
}

/// Concrete entities must have a title
pub struct TitleRequiredValidator;

impl TitleRequiredValidator {
    /// Creates the validator
    #[must_use]
    pub fn new() -> Self {
        TitleRequiredValidator
    }
}

impl Default for TitleRequiredValidator {
    fn default() -> Self {
        Self::new()
    }
}

impl MetaModelValidator for TitleRequiredValidator {
    fn name(&self) -> &'static str {
        "TitleRequiredValidator"
    }

    fn priority(&self) -> u32 {
        170
    }

    fn should_run(&self, ctx: &ValidationContext<'_>) -> bool {
        ctx.config().require_entity_titles
    }

    fn validate(&self, ctx: &ValidationContext<'_>, failures: &mut ValidationFailures) {
        for spec in ctx.specifications() {
            if spec.is_entity() && !spec.is_abstract() && !spec.contains_facet::<dyn TitleFacet>() {
                failures.add(spec.identifier(), "entity has no title");
            }
        }
    }
}
