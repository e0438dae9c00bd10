//! Factories driven purely by annotations and naming conventions.
//!
//! These all run in [`ProcessingStage::Discovery`]. Member-level factories skip subtype-local
//! holders (no method) so that the fallback facets they contribute never shadow the facets
//! a subtype inherits.

use std::{str::FromStr, sync::Arc};

use crate::{
    metamodel::{
        facets::{
            ActionSemantics, ActionSemanticsFacet, ActionSemanticsFacetImpl, Contributed,
            DescribedAsFacet, DescribedAsFacetImpl, DisabledFacet, DisabledFacetWithReason,
            FacetHolder, HiddenFacet, HiddenFacetWithReason, MandatoryFacet, MandatoryFacetImpl,
            MaxLengthFacet, MaxLengthFacetImpl, MemberOrderFacet, MemberOrderFacetImpl,
            NamedFacet, NamedFacetImpl, NotContributedFacet, NotContributedFacetImpl, Precedence,
        },
        factory::{
            naming, ClassContext, FacetFactory, MethodContext, ParameterContext, ProcessingStage,
        },
        identifier::{FeatureIdentifier, FeatureKind, FeatureKinds},
        reflect::{Annotated, Annotation, MethodDescriptor},
    },
    Result,
};

/// Reason reported by `@Disabled` without an explicit reason
pub const DISABLED_REASON: &str = "Disabled";

/// The `@Property` / `@Collection` / `@Action` annotation matching the member kind
pub(super) fn semantic_annotation(
    method: &MethodDescriptor,
    kind: FeatureKind,
) -> Option<&Annotation> {
    match kind {
        FeatureKind::Property => method.annotation("Property"),
        FeatureKind::Collection => method.annotation("Collection"),
        FeatureKind::Action => method.annotation("Action"),
        FeatureKind::Type | FeatureKind::ActionParameter => None,
    }
}

fn parse_annotated<T: FromStr>(
    identifier: &FeatureIdentifier,
    annotation: &Annotation,
    key: &str,
) -> Result<Option<T>> {
    let Some(raw) = annotation.str_arg(key) else {
        return Ok(None);
    };
    T::from_str(raw).map(Some).map_err(|_| {
        construction_error!(
            identifier,
            "invalid value '{}' for @{}({})",
            raw,
            annotation.name,
            key
        )
    })
}

/// Display names: `@Named` on types and members, the natural name of the member id
/// otherwise
pub struct NamedFacetFactory;

impl FacetFactory for NamedFacetFactory {
    fn name(&self) -> &'static str {
        "NamedFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::TYPE | FeatureKinds::MEMBERS
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
        let class = ctx.class();
        let facet = match class.annotation("Named").and_then(|a| a.str_arg("value")) {
            Some(name) => NamedFacetImpl::new(ctx.identifier(), name, Precedence::Annotated),
            None => NamedFacetImpl::new(
                ctx.identifier(),
                &naming::natural_name(class.simple_name()),
                Precedence::Fallback,
            ),
        };
        ctx.holder().add_facet::<dyn NamedFacet>(Arc::new(facet))
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let Some(method) = ctx.method() else {
            return Ok(());
        };

        let facet = match method.annotation("Named").and_then(|a| a.str_arg("value")) {
            Some(name) => NamedFacetImpl::new(ctx.identifier(), name, Precedence::Annotated),
            None => NamedFacetImpl::new(
                ctx.identifier(),
                &naming::natural_name(ctx.member_name()),
                Precedence::Fallback,
            ),
        };
        ctx.holder().add_facet::<dyn NamedFacet>(Arc::new(facet))
    }
}

/// `@DescribedAs(value)` on types, members and parameters
pub struct DescribedAsFacetFactory;

impl FacetFactory for DescribedAsFacetFactory {
    fn name(&self) -> &'static str {
        "DescribedAsFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::ALL
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
        if let Some(description) = ctx
            .class()
            .annotation("DescribedAs")
            .and_then(|a| a.str_arg("value"))
        {
            ctx.holder()
                .add_facet::<dyn DescribedAsFacet>(Arc::new(DescribedAsFacetImpl::new(
                    ctx.identifier(),
                    description,
                )))?;
        }
        Ok(())
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        if let Some(description) = ctx
            .method()
            .and_then(|m| m.annotation("DescribedAs"))
            .and_then(|a| a.str_arg("value"))
        {
            ctx.holder()
                .add_facet::<dyn DescribedAsFacet>(Arc::new(DescribedAsFacetImpl::new(
                    ctx.identifier(),
                    description,
                )))?;
        }
        Ok(())
    }

    fn process_param(&self, ctx: &mut ParameterContext<'_>) -> Result<()> {
        if let Some(description) = ctx
            .parameter()
            .and_then(|p| p.annotation("DescribedAs"))
            .and_then(|a| a.str_arg("value"))
        {
            ctx.holder()
                .add_facet::<dyn DescribedAsFacet>(Arc::new(DescribedAsFacetImpl::new(
                    ctx.identifier(),
                    description,
                )))?;
        }
        Ok(())
    }
}

/// `@MemberOrder(sequence, name)`
pub struct MemberOrderFacetFactory;

impl FacetFactory for MemberOrderFacetFactory {
    fn name(&self) -> &'static str {
        "MemberOrderFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::MEMBERS
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let Some(order) = ctx.method().and_then(|m| m.annotation("MemberOrder")) else {
            return Ok(());
        };

        ctx.holder()
            .add_facet::<dyn MemberOrderFacet>(Arc::new(MemberOrderFacetImpl::new(
                ctx.identifier(),
                order.str_arg("sequence").unwrap_or_default(),
                order.str_arg("name"),
            )))
    }
}

/// `@Hidden`, or `hidden` on `@Property` / `@Collection` / `@Action`
pub struct HiddenAnnotationFacetFactory;

impl HiddenAnnotationFacetFactory {
    fn is_hidden(annotation: &Annotation) -> bool {
        match annotation.bool_arg("hidden") {
            Some(hidden) => hidden,
            None => annotation.str_arg("hidden").is_some_and(|where_| {
                !where_.eq_ignore_ascii_case("NOWHERE")
                    && !where_.eq_ignore_ascii_case("NOT_SPECIFIED")
            }),
        }
    }
}

impl FacetFactory for HiddenAnnotationFacetFactory {
    fn name(&self) -> &'static str {
        "HiddenAnnotationFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::MEMBERS
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let Some(method) = ctx.method() else {
            return Ok(());
        };

        let hidden = method.has_annotation("Hidden")
            || semantic_annotation(method, ctx.kind()).is_some_and(Self::is_hidden);
        if hidden {
            ctx.holder()
                .add_facet::<dyn HiddenFacet>(Arc::new(HiddenFacetWithReason::new(
                    ctx.identifier(),
                    Precedence::Annotated,
                )))?;
        }
        Ok(())
    }
}

/// `@Disabled(reason)`, or `editing = DISABLED` on `@Property` / `@Collection`
pub struct DisabledAnnotationFacetFactory;

impl FacetFactory for DisabledAnnotationFacetFactory {
    fn name(&self) -> &'static str {
        "DisabledAnnotationFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::MEMBERS
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let Some(method) = ctx.method() else {
            return Ok(());
        };

        let reason = if let Some(disabled) = method.annotation("Disabled") {
            Some(disabled.str_arg("reason").unwrap_or(DISABLED_REASON))
        } else {
            semantic_annotation(method, ctx.kind())
                .filter(|a| a.arg_is("editing", "DISABLED"))
                .map(|a| a.str_arg("editingDisabledReason").unwrap_or(DISABLED_REASON))
        };

        if let Some(reason) = reason {
            ctx.holder()
                .add_facet::<dyn DisabledFacet>(Arc::new(DisabledFacetWithReason::new(
                    ctx.identifier(),
                    reason,
                    Precedence::Annotated,
                )))?;
        }
        Ok(())
    }
}

/// Optionality of properties and parameters; mandatory unless `@Optional`, `@Nullable` or
/// `optionality = OPTIONAL` says otherwise
pub struct MandatoryFacetFactory;

impl MandatoryFacetFactory {
    fn is_optional(element: &dyn Annotated, semantic: &str) -> bool {
        element.has_annotation("Optional")
            || element.has_annotation("Nullable")
            || element
                .annotation(semantic)
                .is_some_and(|a| a.arg_is("optionality", "OPTIONAL"))
    }

    fn install(holder: &FacetHolder, optional: bool) -> Result<()> {
        let precedence = if optional {
            Precedence::Annotated
        } else {
            Precedence::Fallback
        };
        holder.add_facet::<dyn MandatoryFacet>(Arc::new(MandatoryFacetImpl::new(
            holder.identifier(),
            optional,
            precedence,
        )))
    }
}

impl FacetFactory for MandatoryFacetFactory {
    fn name(&self) -> &'static str {
        "MandatoryFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::PROPERTY | FeatureKinds::PARAMETER
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let Some(method) = ctx.method() else {
            return Ok(());
        };
        Self::install(ctx.holder(), Self::is_optional(&**method, "Property"))
    }

    fn process_param(&self, ctx: &mut ParameterContext<'_>) -> Result<()> {
        let Some(parameter) = ctx.parameter() else {
            return Ok(());
        };
        Self::install(ctx.holder(), Self::is_optional(parameter, "Parameter"))
    }
}

/// `@MaxLength(value)` or `maxLength` on `@Property` / `@Parameter`
pub struct MaxLengthFacetFactory;

impl MaxLengthFacetFactory {
    fn install(
        holder: &FacetHolder,
        element: &dyn Annotated,
        semantic: &str,
    ) -> Result<()> {
        let max_length = element
            .annotation("MaxLength")
            .and_then(|a| a.int_arg("value"))
            .or_else(|| {
                element
                    .annotation(semantic)
                    .and_then(|a| a.int_arg("maxLength"))
            });
        let Some(max_length) = max_length else {
            return Ok(());
        };

        let max_length = usize::try_from(max_length)
            .ok()
            .filter(|length| *length > 0)
            .ok_or_else(|| {
                construction_error!(
                    holder.identifier(),
                    "max length must be positive, got {}",
                    max_length
                )
            })?;
        holder.add_facet::<dyn MaxLengthFacet>(Arc::new(MaxLengthFacetImpl::new(
            holder.identifier(),
            max_length,
        )))
    }
}

impl FacetFactory for MaxLengthFacetFactory {
    fn name(&self) -> &'static str {
        "MaxLengthFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::PROPERTY | FeatureKinds::PARAMETER
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let Some(method) = ctx.method() else {
            return Ok(());
        };
        Self::install(ctx.holder(), &**method, "Property")
    }

    fn process_param(&self, ctx: &mut ParameterContext<'_>) -> Result<()> {
        let Some(parameter) = ctx.parameter() else {
            return Ok(());
        };
        Self::install(ctx.holder(), parameter, "Parameter")
    }
}

/// `@Action(semantics)` / `@ActionSemantics(value)`, non-idempotent otherwise
pub struct ActionSemanticsFacetFactory;

impl FacetFactory for ActionSemanticsFacetFactory {
    fn name(&self) -> &'static str {
        "ActionSemanticsFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::ACTION
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let Some(method) = ctx.method() else {
            return Ok(());
        };

        let annotated = match (method.annotation("Action"), method.annotation("ActionSemantics")) {
            (Some(action), _) if action.arg("semantics").is_some() => {
                parse_annotated::<ActionSemantics>(ctx.identifier(), action, "semantics")?
            }
            (_, Some(semantics)) => {
                parse_annotated::<ActionSemantics>(ctx.identifier(), semantics, "value")?
            }
            _ => None,
        };

        let facet = match annotated {
            Some(semantics) => {
                ActionSemanticsFacetImpl::new(ctx.identifier(), semantics, Precedence::Annotated)
            }
            None => ActionSemanticsFacetImpl::new(
                ctx.identifier(),
                ActionSemantics::NonIdempotent,
                Precedence::Fallback,
            ),
        };
        ctx.holder()
            .add_facet::<dyn ActionSemanticsFacet>(Arc::new(facet))
    }
}

/// `@Action(contributed)` and `@NotContributed`
pub struct NotContributedFacetFactory;

impl FacetFactory for NotContributedFacetFactory {
    fn name(&self) -> &'static str {
        "NotContributedFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::ACTION
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let Some(method) = ctx.method() else {
            return Ok(());
        };

        let contributed = if method.has_annotation("NotContributed") {
            Some(Contributed::AsNeither)
        } else if let Some(action) = method.annotation("Action") {
            parse_annotated::<Contributed>(ctx.identifier(), action, "contributed")?
        } else {
            None
        };

        if let Some(contributed) = contributed {
            ctx.holder()
                .add_facet::<dyn NotContributedFacet>(Arc::new(NotContributedFacetImpl::new(
                    ctx.identifier(),
                    contributed,
                )))?;
        }
        Ok(())
    }
}

/// Parameter names: the declared name, overridden by `@ParameterName` or `@Named`
pub struct ParameterNameFacetFactory;

impl FacetFactory for ParameterNameFacetFactory {
    fn name(&self) -> &'static str {
        "ParameterNameFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::PARAMETER
    }

    fn process_param(&self, ctx: &mut ParameterContext<'_>) -> Result<()> {
        let Some(parameter) = ctx.parameter() else {
            return Ok(());
        };

        let annotated = parameter
            .annotation("ParameterName")
            .or_else(|| parameter.annotation("Named"))
            .and_then(|a| a.str_arg("value"));
        let facet = match annotated {
            Some(name) => NamedFacetImpl::new(ctx.identifier(), name, Precedence::Annotated),
            None => NamedFacetImpl::new(ctx.identifier(), &parameter.name, Precedence::Inferred),
        };
        ctx.holder().add_facet::<dyn NamedFacet>(Arc::new(facet))
    }
}
