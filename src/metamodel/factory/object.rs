//! Factories contributing type-level facets.

use std::{str::FromStr, sync::Arc};

use crate::{
    metamodel::{
        facets::{
            CallbackFacet, CallbackFacetViaMethod, Created, CssClassFacet, CssClassFacetImpl,
            EntityFacet, EntityFacetAnnotation, IconFacet, IconFacetViaMethod, IdentityStrategy,
            ImmutableFacet, ImmutableFacetImpl, LifecycleEvent, Loaded, MixinFacet,
            MixinFacetImpl, Persisted, Persisting, Precedence, Removing, TitleComponent,
            TitleFacet, TitleFacetViaAnnotations, TitleFacetViaMethod, Updated, Updating,
            ValueFacet, ValueFacetImpl,
        },
        factory::{naming, ClassContext, FacetFactory, MethodContext, ProcessingStage},
        identifier::FeatureKinds,
        reflect::{Annotated, TypeRef},
        spec::order,
    },
    Result,
};

/// Default reason reported for members disabled by immutability
pub const IMMUTABLE_REASON: &str = "Immutable";

/// Default name of the method a mixin contributes
pub const DEFAULT_MIXIN_METHOD: &str = "act";

/// Simple names of the types with built-in value semantics
const BUILTIN_VALUE_TYPES: [&str; 20] = [
    "String",
    "string",
    "boolean",
    "Boolean",
    "bool",
    "byte",
    "Byte",
    "short",
    "Short",
    "int",
    "Integer",
    "long",
    "Long",
    "float",
    "Float",
    "double",
    "Double",
    "BigDecimal",
    "BigInteger",
    "LocalDate",
];

/// Contributes the facets declared by class-level annotations: `@Immutable`,
/// `@DomainObject(editing = DISABLED)`, `@PersistenceCapable` / `@Entity`, `@Value`,
/// `@Mixin` and `@CssClass`. `@CssClass` is honored on members as well.
pub struct ObjectAnnotationsFacetFactory;

impl ObjectAnnotationsFacetFactory {
    fn immutable(ctx: &ClassContext<'_>) -> Result<()> {
        let class = ctx.class();
        let reason = if class.has_annotation("Immutable") {
            Some(IMMUTABLE_REASON)
        } else {
            class
                .annotation("DomainObject")
                .filter(|a| a.arg_is("editing", "DISABLED"))
                .map(|a| a.str_arg("editingDisabledReason").unwrap_or(IMMUTABLE_REASON))
        };

        if let Some(reason) = reason {
            ctx.holder()
                .add_facet::<dyn ImmutableFacet>(Arc::new(ImmutableFacetImpl::new(
                    ctx.identifier(),
                    reason,
                )))?;
        }
        Ok(())
    }

    fn entity(ctx: &ClassContext<'_>) -> Result<()> {
        let class = ctx.class();
        let Some(annotation) = class
            .annotation("PersistenceCapable")
            .or_else(|| class.annotation("Entity"))
        else {
            return Ok(());
        };

        let strategy = match annotation.str_arg("identityType") {
            Some(value) => IdentityStrategy::from_str(value).map_err(|_| {
                construction_error!(
                    ctx.identifier(),
                    "unknown identityType '{}' on @{}",
                    value,
                    annotation.name
                )
            })?,
            None => IdentityStrategy::Datastore,
        };

        ctx.holder()
            .add_facet::<dyn EntityFacet>(Arc::new(EntityFacetAnnotation::new(
                ctx.identifier(),
                strategy,
                annotation.str_arg("table"),
            )))
    }

    fn value(ctx: &ClassContext<'_>) -> Result<()> {
        if ctx.class().has_annotation("Value") {
            ctx.holder()
                .add_facet::<dyn ValueFacet>(Arc::new(ValueFacetImpl::new(
                    ctx.identifier(),
                    &ctx.class().name,
                    Precedence::Annotated,
                )))?;
        }
        Ok(())
    }

    fn mixin(ctx: &ClassContext<'_>) -> Result<()> {
        let class = ctx.class();
        let Some(annotation) = class.annotation("Mixin") else {
            return Ok(());
        };

        // the target is the type of the single constructor argument
        let target = class.constructors.iter().find_map(|params| match params.as_slice() {
            [TypeRef::Class(target)] => Some(target.as_str()),
            _ => None,
        });
        if let Some(target) = target {
            ctx.holder()
                .add_facet::<dyn MixinFacet>(Arc::new(MixinFacetImpl::new(
                    ctx.identifier(),
                    target,
                    annotation.str_arg("method").unwrap_or(DEFAULT_MIXIN_METHOD),
                )))?;
        }
        Ok(())
    }
}

impl FacetFactory for ObjectAnnotationsFacetFactory {
    fn name(&self) -> &'static str {
        "ObjectAnnotationsFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::TYPE | FeatureKinds::MEMBERS
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
        Self::immutable(ctx)?;
        Self::entity(ctx)?;
        Self::value(ctx)?;
        Self::mixin(ctx)?;

        if let Some(css) = ctx
            .class()
            .annotation("CssClass")
            .and_then(|a| a.str_arg("value"))
        {
            ctx.holder()
                .add_facet::<dyn CssClassFacet>(Arc::new(CssClassFacetImpl::new(
                    ctx.identifier(),
                    css,
                )))?;
        }
        Ok(())
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        if let Some(css) = ctx
            .method()
            .and_then(|m| m.annotation("CssClass"))
            .and_then(|a| a.str_arg("value"))
        {
            ctx.holder()
                .add_facet::<dyn CssClassFacet>(Arc::new(CssClassFacetImpl::new(
                    ctx.identifier(),
                    css,
                )))?;
        }
        Ok(())
    }
}

/// Infers value semantics for the built-in value types
pub struct ValueTypesFacetFactory;

impl FacetFactory for ValueTypesFacetFactory {
    fn name(&self) -> &'static str {
        "ValueTypesFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::TYPE
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
        let simple_name = ctx.class().simple_name();
        if BUILTIN_VALUE_TYPES.contains(&simple_name) {
            ctx.holder()
                .add_facet::<dyn ValueFacet>(Arc::new(ValueFacetImpl::new(
                    ctx.identifier(),
                    simple_name,
                    Precedence::Inferred,
                )))?;
        }
        Ok(())
    }
}

/// Builds a composite title from the `@Title(sequence, prepend, append)` annotated
/// property accessors of a class
pub struct TitleAnnotationFacetFactory;

impl FacetFactory for TitleAnnotationFacetFactory {
    fn name(&self) -> &'static str {
        "TitleAnnotationFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Dependent
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::TYPE
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
        let mut components: Vec<TitleComponent> = Vec::new();
        for method in &ctx.class().methods {
            let Some(title) = method.annotation("Title") else {
                continue;
            };
            if naming::accessor_name(method).is_none() {
                return Err(construction_error!(
                    ctx.identifier(),
                    "@Title on '{}', which is not a property accessor",
                    method.name
                ));
            }
            components.push(TitleComponent {
                sequence: title.str_arg("sequence").unwrap_or("1").to_string(),
                prepend: title.str_arg("prepend").unwrap_or_default().to_string(),
                append: title.str_arg("append").unwrap_or(" ").to_string(),
                accessor: method.clone(),
            });
        }

        if components.is_empty() {
            return Ok(());
        }

        // stable: equal sequences keep declaration order
        components.sort_by(|a, b| order::compare_sequences(&a.sequence, &b.sequence));
        ctx.holder()
            .add_facet::<dyn TitleFacet>(Arc::new(TitleFacetViaAnnotations::new(
                ctx.identifier(),
                components,
            )))
    }
}

/// Consumes a `title()` method
pub struct TitleMethodFacetFactory;

impl FacetFactory for TitleMethodFacetFactory {
    fn name(&self) -> &'static str {
        "TitleMethodFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::MethodRemoval
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::TYPE
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
        if let Some(method) = ctx.remover().remove_method(naming::TITLE_METHOD, Some(0)) {
            ctx.holder()
                .add_facet::<dyn TitleFacet>(Arc::new(TitleFacetViaMethod::new(
                    ctx.identifier(),
                    method,
                )))?;
        }
        Ok(())
    }
}

/// Consumes an `iconName()` method
pub struct IconNameFacetFactory;

impl FacetFactory for IconNameFacetFactory {
    fn name(&self) -> &'static str {
        "IconNameFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::MethodRemoval
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::TYPE
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
        if let Some(method) = ctx
            .remover()
            .remove_method(naming::ICON_NAME_METHOD, Some(0))
        {
            ctx.holder()
                .add_facet::<dyn IconFacet>(Arc::new(IconFacetViaMethod::new(
                    ctx.identifier(),
                    method,
                )))?;
        }
        Ok(())
    }
}

/// Consumes the persistence lifecycle callbacks `created()`, `loaded()`, `persisting()`,
/// `persisted()`, `updating()`, `updated()` and `removing()`
pub struct LifecycleCallbackFacetFactory;

impl LifecycleCallbackFacetFactory {
    fn install<E: LifecycleEvent>(ctx: &mut ClassContext<'_>) -> Result<()> {
        if let Some(method) = ctx.remover().remove_method(E::METHOD, Some(0)) {
            ctx.holder()
                .add_facet::<dyn CallbackFacet<E>>(Arc::new(CallbackFacetViaMethod::<E>::new(
                    ctx.identifier(),
                    method,
                )))?;
        }
        Ok(())
    }
}

impl FacetFactory for LifecycleCallbackFacetFactory {
    fn name(&self) -> &'static str {
        "LifecycleCallbackFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::MethodRemoval
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::TYPE
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
        Self::install::<Created>(ctx)?;
        Self::install::<Loaded>(ctx)?;
        Self::install::<Persisting>(ctx)?;
        Self::install::<Persisted>(ctx)?;
        Self::install::<Updating>(ctx)?;
        Self::install::<Updated>(ctx)?;
        Self::install::<Removing>(ctx)
    }
}
