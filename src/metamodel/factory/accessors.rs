//! Accessor, mutator and invocation facets.
//!
//! These run in [`ProcessingStage::Dependent`], after the annotation factories, and consume
//! the mutators (`setXxx`, `clearXxx`, `addToXxx`, `removeFromXxx`) of the member they
//! process.

use std::sync::Arc;

use tracing::trace;

use crate::{
    metamodel::{
        config::{ConfigurationProperties, CONFIG_PROPERTIES_EDITING},
        facets::{
            ActionInvocationFacet, ActionInvocationFacetViaMethod, CollectionAccessorFacet,
            CollectionAccessorFacetViaMethod, CollectionAddToFacet, CollectionMutatorFacetViaMethod,
            CollectionRemoveFromFacet, DisabledFacet, DisabledFacetWithReason,
            PropertyAccessorFacet, PropertyAccessorFacetViaMethod, PropertyClearFacet,
            PropertyClearFacetViaMethod, PropertySetterFacet, PropertySetterFacetViaMethod,
            Precedence, TypeOfFacet, TypeOfFacetImpl,
        },
        factory::{
            annotations::semantic_annotation, naming, FacetFactory, MethodContext,
            ProcessingStage,
        },
        identifier::FeatureKinds,
        reflect::TypeRef,
    },
    Result,
};

/// Reason reported for members disabled by the editing configuration
pub const DISABLED_BY_CONFIGURATION: &str = "Disabled by configuration";

fn install_type_of(ctx: &MethodContext<'_>, return_type: &TypeRef) -> Result<()> {
    if let TypeRef::Collection(element) = return_type {
        ctx.holder()
            .add_facet::<dyn TypeOfFacet>(Arc::new(TypeOfFacetImpl::new(
                ctx.identifier(),
                element,
            )))?;
    }
    Ok(())
}

/// Property accessor plus the optional `setXxx(value)` / `clearXxx()` mutators
pub struct PropertyAccessorFacetFactory;

impl FacetFactory for PropertyAccessorFacetFactory {
    fn name(&self) -> &'static str {
        "PropertyAccessorFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Dependent
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::PROPERTY
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let identifier = ctx.identifier();
        let member = ctx.member_name();

        // subtype-local holders still claim mutators declared by the subtype
        if let Some(accessor) = ctx.method() {
            ctx.holder()
                .add_facet::<dyn PropertyAccessorFacet>(Arc::new(
                    PropertyAccessorFacetViaMethod::new(identifier, accessor.clone()),
                ))?;
        }

        let setter = naming::support_method_name(naming::SET_PREFIX, member);
        if let Some(method) = ctx.remover().remove_method(&setter, Some(1)) {
            ctx.holder()
                .add_facet::<dyn PropertySetterFacet>(Arc::new(
                    PropertySetterFacetViaMethod::new(identifier, method),
                ))?;
        }

        let clear = naming::support_method_name(naming::CLEAR_PREFIX, member);
        if let Some(method) = ctx.remover().remove_method(&clear, Some(0)) {
            ctx.holder()
                .add_facet::<dyn PropertyClearFacet>(Arc::new(PropertyClearFacetViaMethod::new(
                    identifier, method,
                )))?;
        }
        Ok(())
    }
}

/// Collection accessor, element type and the optional `addToXxx(e)` / `removeFromXxx(e)`
/// mutators
pub struct CollectionAccessorFacetFactory;

impl FacetFactory for CollectionAccessorFacetFactory {
    fn name(&self) -> &'static str {
        "CollectionAccessorFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Dependent
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::COLLECTION
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let identifier = ctx.identifier();
        let member = ctx.member_name();

        if let Some(accessor) = ctx.method() {
            ctx.holder()
                .add_facet::<dyn CollectionAccessorFacet>(Arc::new(
                    CollectionAccessorFacetViaMethod::new(identifier, accessor.clone()),
                ))?;
            install_type_of(ctx, &accessor.return_type)?;
        }

        let add_to = naming::support_method_name(naming::ADD_TO_PREFIX, member);
        if let Some(method) = ctx.remover().remove_method(&add_to, Some(1)) {
            ctx.holder()
                .add_facet::<dyn CollectionAddToFacet>(Arc::new(
                    CollectionMutatorFacetViaMethod::new(identifier, method),
                ))?;
        }

        let remove_from = naming::support_method_name(naming::REMOVE_FROM_PREFIX, member);
        if let Some(method) = ctx.remover().remove_method(&remove_from, Some(1)) {
            ctx.holder()
                .add_facet::<dyn CollectionRemoveFromFacet>(Arc::new(
                    CollectionMutatorFacetViaMethod::new(identifier, method),
                ))?;
        }
        Ok(())
    }
}

/// Invocation of actions; actions returning a collection also get a `TypeOfFacet`
pub struct ActionInvocationFacetFactory;

impl FacetFactory for ActionInvocationFacetFactory {
    fn name(&self) -> &'static str {
        "ActionInvocationFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Dependent
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::ACTION
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let Some(action) = ctx.method() else {
            return Ok(());
        };

        ctx.holder()
            .add_facet::<dyn ActionInvocationFacet>(Arc::new(
                ActionInvocationFacetViaMethod::new(ctx.identifier(), action.clone()),
            ))?;
        install_type_of(ctx, &action.return_type)
    }
}

/// Disables every association when the configuration turns editing off
/// (`facetmodel.objects.editing = false`).
///
/// The facet has [`Precedence::Default`]: an explicit `@Disabled` still supplies its own
/// reason, and `editing = ENABLED` on `@Property` / `@Collection` opts a member back in.
pub struct PropertyEditingConfigurationFacetFactory {
    editing_enabled: bool,
}

impl PropertyEditingConfigurationFacetFactory {
    /// Reads the editing default from `configuration`; editing is enabled if the key is absent
    #[must_use]
    pub fn new(configuration: &ConfigurationProperties) -> Self {
        PropertyEditingConfigurationFacetFactory {
            editing_enabled: configuration.get_bool(CONFIG_PROPERTIES_EDITING, true),
        }
    }
}

impl FacetFactory for PropertyEditingConfigurationFacetFactory {
    fn name(&self) -> &'static str {
        "PropertyEditingConfigurationFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Dependent
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::ASSOCIATIONS
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        if self.editing_enabled {
            return Ok(());
        }
        let Some(accessor) = ctx.method() else {
            return Ok(());
        };

        if semantic_annotation(accessor, ctx.kind()).is_some_and(|a| a.arg_is("editing", "ENABLED"))
        {
            trace!(member = %ctx.identifier(), "editing explicitly enabled");
            return Ok(());
        }

        ctx.holder()
            .add_facet::<dyn DisabledFacet>(Arc::new(DisabledFacetWithReason::new(
                ctx.identifier(),
                DISABLED_BY_CONFIGURATION,
                Precedence::Default,
            )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{
        facets::{FacetHolder, InteractionContext},
        factory::MethodRemover,
        identifier::FeatureIdentifier,
        reflect::{Annotation, ClassBuilder, ClassDescriptor, MethodBuilder, Value},
    };

    fn order_class() -> ClassDescriptor {
        ClassBuilder::new("Order")
            .method(MethodBuilder::new("getLines").returns(TypeRef::collection("OrderLine")))
            .method(MethodBuilder::new("addToLines").param("line", TypeRef::class("OrderLine")))
            .method(
                MethodBuilder::new("removeFromLines").param("line", TypeRef::class("OrderLine")),
            )
            .method(
                MethodBuilder::new("getReference")
                    .returns(TypeRef::value("String"))
                    .returning("ORD-1"),
            )
            .method(MethodBuilder::new("setReference").param("value", TypeRef::value("String")))
            .method(MethodBuilder::new("clearReference"))
            .build()
            .unwrap()
    }

    fn process(
        factory: &dyn FacetFactory,
        class: &ClassDescriptor,
        accessor: usize,
        identifier: FeatureIdentifier,
        remover: &mut MethodRemover,
    ) -> FacetHolder {
        let holder = FacetHolder::new(identifier);
        factory
            .process_method(&mut MethodContext::new(
                class,
                class.methods.get(accessor),
                &holder,
                remover,
            ))
            .unwrap();
        holder
    }

    #[test]
    fn test_collection_mutators_are_consumed() {
        let class = order_class();
        let mut remover = MethodRemover::new(class.methods[1..].iter().cloned());
        let holder = process(
            &CollectionAccessorFacetFactory,
            &class,
            0,
            FeatureIdentifier::collection("Order", "lines"),
            &mut remover,
        );

        assert!(holder.contains_facet::<dyn CollectionAddToFacet>());
        assert!(holder.contains_facet::<dyn CollectionRemoveFromFacet>());
        assert_eq!(
            holder.get_facet::<dyn TypeOfFacet>().unwrap().element_class(),
            "OrderLine"
        );
        assert!(remover.find("addToLines").is_none());
        assert!(remover.find("removeFromLines").is_none());
        assert_eq!(remover.len(), 3);
    }

    #[test]
    fn test_property_mutators_are_consumed() {
        let class = order_class();
        let mut remover = MethodRemover::new(class.methods.iter().cloned());
        let holder = process(
            &PropertyAccessorFacetFactory,
            &class,
            3,
            FeatureIdentifier::property("Order", "reference"),
            &mut remover,
        );

        let accessor = holder.get_facet::<dyn PropertyAccessorFacet>().unwrap();
        assert_eq!(accessor.get(&()).unwrap(), Value::from("ORD-1"));
        assert!(holder.contains_facet::<dyn PropertySetterFacet>());
        assert!(holder.contains_facet::<dyn PropertyClearFacet>());
        assert!(remover.find("setReference").is_none());
        assert!(remover.find("clearReference").is_none());
    }

    #[test]
    fn test_editing_configuration() {
        let disabled = PropertyEditingConfigurationFacetFactory::new(
            &ConfigurationProperties::new().with(CONFIG_PROPERTIES_EDITING, "false"),
        );
        let class = order_class();
        let mut remover = MethodRemover::default();
        let holder = process(
            &disabled,
            &class,
            3,
            FeatureIdentifier::property("Order", "reference"),
            &mut remover,
        );
        let facet = holder.get_facet::<dyn DisabledFacet>().unwrap();
        assert_eq!(
            facet
                .disabled_reason(&InteractionContext::new())
                .unwrap()
                .as_deref(),
            Some(DISABLED_BY_CONFIGURATION)
        );

        let opted_in = ClassBuilder::new("Order")
            .method(
                MethodBuilder::new("getReference")
                    .returns(TypeRef::value("String"))
                    .annotate(Annotation::new("Property").with_enum("editing", "ENABLED")),
            )
            .build()
            .unwrap();
        let holder = process(
            &disabled,
            &opted_in,
            0,
            FeatureIdentifier::property("Order", "reference"),
            &mut remover,
        );
        assert!(holder.is_empty());

        let enabled = PropertyEditingConfigurationFacetFactory::new(&ConfigurationProperties::new());
        let holder = process(
            &enabled,
            &class,
            3,
            FeatureIdentifier::property("Order", "reference"),
            &mut remover,
        );
        assert!(holder.is_empty());
    }
}
