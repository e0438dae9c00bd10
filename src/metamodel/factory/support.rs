//! Consumption of the support methods that configure members and action parameters.
//!
//! | Method | Applies to | Shape | Facet |
//! |---|---|---|---|
//! | `hideXxx()` | members | returns boolean | [`HiddenFacet`] |
//! | `disableXxx()` | members | returns a reason string | [`DisabledFacet`] |
//! | `validateXxx(v)` | properties | one argument, returns a reason string | [`ValidateFacet`] |
//! | `validateXxx(a, b, ..)` | actions | the action's arguments, returns a reason string | [`ValidateFacet`] |
//! | `choicesXxx()` / `defaultXxx()` | properties | no argument, non-void | [`ChoicesFacet`] / [`DefaultedFacet`] |
//! | `autoCompleteXxx(search)` | properties | one argument, non-void | [`AutoCompleteFacet`] |
//! | `choicesNXxx(..)` / `defaultNXxx(..)` | parameter `N` | non-void | [`ChoicesFacet`] / [`DefaultedFacet`] |
//! | `autoCompleteNXxx(.., search)` | parameter `N` | at least one argument, non-void | [`AutoCompleteFacet`] |
//! | `validateNXxx(v)` | parameter `N` | one argument, returns a reason string | [`ValidateFacet`] |
//!
//! A method with the right name but the wrong shape is left in the candidate set and ends up
//! reported as an orphaned support method.

use std::sync::Arc;

use tracing::trace;

use crate::{
    metamodel::{
        facets::{
            AutoCompleteFacet, AutoCompleteFacetViaMethod, ChoicesFacet, ChoicesFacetViaMethod,
            DefaultedFacet, DefaultedFacetViaMethod, DisabledFacet, DisabledFacetViaMethod,
            FacetHolder, HiddenFacet, HiddenFacetViaMethod, ValidateFacet, ValidateFacetViaMethod,
        },
        factory::{
            naming, FacetFactory, MethodContext, MethodRemover, ParameterContext, ProcessingStage,
        },
        identifier::{FeatureKind, FeatureKinds},
        reflect::{MethodDescriptor, MethodDescriptorRc, TypeRef},
    },
    Result,
};

fn returns_string(method: &MethodDescriptor) -> bool {
    matches!(&method.return_type, TypeRef::Value(name) if matches!(name.as_str(), "String" | "string" | "str"))
}

fn returns_boolean(method: &MethodDescriptor) -> bool {
    method.return_type.is_boolean()
}

fn returns_value(method: &MethodDescriptor) -> bool {
    !method.return_type.is_void()
}

/// Removes the first remaining method called `name` that `accepts`
fn take<F>(remover: &mut MethodRemover, name: &str, accepts: F) -> Option<MethodDescriptorRc>
where
    F: Fn(&MethodDescriptor) -> bool,
{
    let mut taken = false;
    remover
        .remove_where(|m| {
            if !taken && m.name == name && accepts(&**m) {
                taken = true;
                return true;
            }
            false
        })
        .pop()
}

/// Consumes `hideXxx`, `disableXxx`, `validateXxx`, `choicesXxx`, `defaultXxx` and
/// `autoCompleteXxx` support methods, for members and (with a parameter index) for action
/// parameters
pub struct SupportMethodsFacetFactory;

impl SupportMethodsFacetFactory {
    fn consumed(holder: &FacetHolder, method: &MethodDescriptor) {
        trace!(feature = %holder.identifier(), method = %method.name, "support method consumed");
    }
}

impl FacetFactory for SupportMethodsFacetFactory {
    fn name(&self) -> &'static str {
        "SupportMethodsFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::MethodRemoval
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::MEMBERS_AND_PARAMETERS
    }

    fn process_method(&self, ctx: &mut MethodContext<'_>) -> Result<()> {
        let holder = ctx.holder();
        let identifier = ctx.identifier();
        let member = ctx.member_name();
        let kind = ctx.kind();

        let hide = naming::support_method_name(naming::HIDE_PREFIX, member);
        if let Some(method) = take(ctx.remover(), &hide, |m| {
            m.param_count() == 0 && returns_boolean(m)
        }) {
            Self::consumed(holder, &method);
            holder.add_facet::<dyn HiddenFacet>(Arc::new(HiddenFacetViaMethod::new(
                identifier, method,
            )))?;
        }

        let disable = naming::support_method_name(naming::DISABLE_PREFIX, member);
        if let Some(method) = take(ctx.remover(), &disable, |m| {
            m.param_count() == 0 && returns_string(m)
        }) {
            Self::consumed(holder, &method);
            holder.add_facet::<dyn DisabledFacet>(Arc::new(DisabledFacetViaMethod::new(
                identifier, method,
            )))?;
        }

        // properties validate the proposed value, actions the full argument list
        let arity = match kind {
            FeatureKind::Property => Some(1),
            FeatureKind::Action => ctx.method().map(|m| m.param_count()),
            _ => None,
        };
        if matches!(kind, FeatureKind::Property | FeatureKind::Action) {
            let validate = naming::support_method_name(naming::VALIDATE_PREFIX, member);
            if let Some(method) = take(ctx.remover(), &validate, |m| {
                returns_string(m) && arity.is_none_or(|count| m.param_count() == count)
            }) {
                Self::consumed(holder, &method);
                holder.add_facet::<dyn ValidateFacet>(Arc::new(ValidateFacetViaMethod::new(
                    identifier, method,
                )))?;
            }
        }

        if kind != FeatureKind::Property {
            return Ok(());
        }

        let choices = naming::support_method_name(naming::CHOICES_PREFIX, member);
        if let Some(method) = take(ctx.remover(), &choices, |m| {
            m.param_count() == 0 && returns_value(m)
        }) {
            Self::consumed(holder, &method);
            holder.add_facet::<dyn ChoicesFacet>(Arc::new(ChoicesFacetViaMethod::new(
                identifier, method,
            )))?;
        }

        let default = naming::support_method_name(naming::DEFAULT_PREFIX, member);
        if let Some(method) = take(ctx.remover(), &default, |m| {
            m.param_count() == 0 && returns_value(m)
        }) {
            Self::consumed(holder, &method);
            holder.add_facet::<dyn DefaultedFacet>(Arc::new(DefaultedFacetViaMethod::new(
                identifier, method,
            )))?;
        }

        let auto_complete = naming::support_method_name(naming::AUTO_COMPLETE_PREFIX, member);
        if let Some(method) = take(ctx.remover(), &auto_complete, |m| {
            m.param_count() == 1 && returns_value(m)
        }) {
            Self::consumed(holder, &method);
            holder.add_facet::<dyn AutoCompleteFacet>(Arc::new(AutoCompleteFacetViaMethod::new(
                identifier, method,
            )))?;
        }
        Ok(())
    }

    fn process_param(&self, ctx: &mut ParameterContext<'_>) -> Result<()> {
        let holder = ctx.holder();
        let identifier = ctx.identifier();
        let index = ctx.index();
        let action = ctx.action_name();

        let choices = naming::param_support_method_name(naming::CHOICES_PREFIX, index, action);
        if let Some(method) = take(ctx.remover(), &choices, returns_value) {
            Self::consumed(holder, &method);
            holder.add_facet::<dyn ChoicesFacet>(Arc::new(ChoicesFacetViaMethod::new(
                identifier, method,
            )))?;
        }

        let default = naming::param_support_method_name(naming::DEFAULT_PREFIX, index, action);
        if let Some(method) = take(ctx.remover(), &default, returns_value) {
            Self::consumed(holder, &method);
            holder.add_facet::<dyn DefaultedFacet>(Arc::new(DefaultedFacetViaMethod::new(
                identifier, method,
            )))?;
        }

        let auto_complete =
            naming::param_support_method_name(naming::AUTO_COMPLETE_PREFIX, index, action);
        if let Some(method) = take(ctx.remover(), &auto_complete, |m| {
            m.param_count() >= 1 && returns_value(m)
        }) {
            Self::consumed(holder, &method);
            holder.add_facet::<dyn AutoCompleteFacet>(Arc::new(AutoCompleteFacetViaMethod::new(
                identifier, method,
            )))?;
        }

        let validate = naming::param_support_method_name(naming::VALIDATE_PREFIX, index, action);
        if let Some(method) = take(ctx.remover(), &validate, |m| {
            m.param_count() == 1 && returns_string(m)
        }) {
            Self::consumed(holder, &method);
            holder.add_facet::<dyn ValidateFacet>(Arc::new(ValidateFacetViaMethod::new(
                identifier, method,
            )))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{
        facets::InteractionContext,
        identifier::FeatureIdentifier,
        reflect::{ClassBuilder, ClassDescriptor, MethodBuilder, Value},
    };

    fn customer() -> ClassDescriptor {
        ClassBuilder::new("Customer")
            .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
            .method(
                MethodBuilder::new("hideName")
                    .returns(TypeRef::value("boolean"))
                    .returning(false),
            )
            .method(
                MethodBuilder::new("disableName")
                    .returns(TypeRef::value("String"))
                    .returning("Locked"),
            )
            .method(
                MethodBuilder::new("validateName")
                    .returns(TypeRef::value("String"))
                    .param("proposed", TypeRef::value("String"))
                    .invoker(|_, args| {
                        Ok(Value::from(
                            (args.first().and_then(Value::as_str) == Some(""))
                                .then_some("Required"),
                        ))
                    }),
            )
            .method(
                MethodBuilder::new("choicesName")
                    .returns(TypeRef::collection("String"))
                    .returning(Value::List(vec![Value::from("a"), Value::from("b")])),
            )
            // wrong shape: a default must return a value
            .method(MethodBuilder::new("defaultName"))
            .method(
                MethodBuilder::new("placeOrder")
                    .param("product", TypeRef::class("Product"))
                    .param("quantity", TypeRef::value("int")),
            )
            .method(
                MethodBuilder::new("choices0PlaceOrder")
                    .returns(TypeRef::collection("Product"))
                    .returning(Value::List(vec![])),
            )
            .method(
                MethodBuilder::new("default1PlaceOrder")
                    .returns(TypeRef::value("int"))
                    .returning(1_i64),
            )
            .build()
            .unwrap()
    }

    #[test]
    fn test_member_support_methods() {
        let class = customer();
        let mut remover = MethodRemover::new(class.methods[1..].iter().cloned());
        let holder = FacetHolder::new(FeatureIdentifier::property("Customer", "name"));
        SupportMethodsFacetFactory
            .process_method(&mut MethodContext::new(
                &class,
                class.methods.first(),
                &holder,
                &mut remover,
            ))
            .unwrap();

        let ctx = InteractionContext::new();
        assert_eq!(
            holder.get_facet::<dyn HiddenFacet>().unwrap().hides(&ctx).unwrap(),
            None
        );
        assert_eq!(
            holder
                .get_facet::<dyn DisabledFacet>()
                .unwrap()
                .disabled_reason(&ctx)
                .unwrap()
                .as_deref(),
            Some("Locked")
        );

        let empty = [Value::from("")];
        let validate = holder.get_facet::<dyn ValidateFacet>().unwrap();
        assert_eq!(
            validate
                .invalid_reason(&InteractionContext::new().with_arguments(&empty))
                .unwrap()
                .as_deref(),
            Some("Required")
        );
        assert_eq!(
            holder
                .get_facet::<dyn ChoicesFacet>()
                .unwrap()
                .choices(&ctx)
                .unwrap()
                .len(),
            2
        );

        for consumed in ["hideName", "disableName", "validateName", "choicesName"] {
            assert!(remover.find(consumed).is_none(), "{consumed} not consumed");
        }
        assert!(remover.find("defaultName").is_some());
        assert!(!holder.contains_facet::<dyn DefaultedFacet>());
    }

    #[test]
    fn test_parameter_support_methods() {
        let class = customer();
        let action = &class.methods[6];
        let id = FeatureIdentifier::action("Customer", "placeOrder");
        let mut remover = MethodRemover::new(class.methods.iter().cloned());

        let first = FacetHolder::new(id.with_parameter(0));
        let second = FacetHolder::new(id.with_parameter(1));
        for (index, holder) in [&first, &second].into_iter().enumerate() {
            SupportMethodsFacetFactory
                .process_param(&mut ParameterContext::new(
                    &class,
                    Some(action),
                    action.parameters.get(index),
                    holder,
                    &mut remover,
                ))
                .unwrap();
        }

        assert!(first.contains_facet::<dyn ChoicesFacet>());
        assert!(!first.contains_facet::<dyn DefaultedFacet>());
        assert_eq!(
            second
                .get_facet::<dyn DefaultedFacet>()
                .unwrap()
                .default_value(&InteractionContext::new())
                .unwrap(),
            Value::Int(1)
        );
        assert!(remover.find("choices0PlaceOrder").is_none());
        assert!(remover.find("default1PlaceOrder").is_none());
    }
}
