use tracing::trace;

use crate::{
    metamodel::{
        factory::{ClassContext, FacetFactory, ProcessingStage},
        identifier::FeatureKinds,
        reflect::{Annotated, MethodDescriptorRc, MethodModifiers},
    },
    Result,
};

/// Methods every class inherits from the host runtime that are never domain members
const RUNTIME_METHODS: [&str; 4] = ["getClass", "hashCode", "equals", "toString"];

/// Removes methods that can never be members: static, synthetic and non-public methods,
/// runtime plumbing, and methods annotated `@Programmatic` or `@Ignore`.
///
/// Registered first so that no later factory mistakes one of them for a member or a
/// support method.
pub struct IgnoredMethodsFacetFactory;

impl IgnoredMethodsFacetFactory {
    fn is_ignored(method: &MethodDescriptorRc) -> bool {
        method.is_static()
            || !method.is_public()
            || method.modifiers.contains(MethodModifiers::SYNTHETIC)
            || RUNTIME_METHODS.contains(&method.name.as_str())
            || method.has_annotation("Programmatic")
            || method.has_annotation("Ignore")
    }
}

impl FacetFactory for IgnoredMethodsFacetFactory {
    fn name(&self) -> &'static str {
        "IgnoredMethodsFacetFactory"
    }

    fn stage(&self) -> ProcessingStage {
        ProcessingStage::Discovery
    }

    fn feature_kinds(&self) -> FeatureKinds {
        FeatureKinds::TYPE
    }

    fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
        let identifier = ctx.identifier();
        for removed in ctx.remover().remove_where(Self::is_ignored) {
            trace!(class = %identifier, method = %removed.name, "ignored");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metamodel::{
        facets::FacetHolder,
        factory::MethodRemover,
        identifier::FeatureIdentifier,
        reflect::{Annotation, ClassBuilder, MethodBuilder, TypeRef},
    };

    #[test]
    fn test_ignored_methods_are_removed() {
        let class = ClassBuilder::new("Customer")
            .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
            .method(MethodBuilder::new("create").static_method())
            .method(MethodBuilder::new("internal").annotate(Annotation::new("Programmatic")))
            .method(MethodBuilder::new("skip").annotate(Annotation::new("Ignore")))
            .method(MethodBuilder::new("hashCode").returns(TypeRef::value("int")))
            .method(MethodBuilder::new("helper").modifiers(MethodModifiers::empty()))
            .build()
            .unwrap();

        let holder = FacetHolder::new(FeatureIdentifier::type_id("Customer"));
        let mut remover = MethodRemover::new(class.methods.iter().cloned());
        IgnoredMethodsFacetFactory
            .process_class(&mut ClassContext::new(&class, &holder, &mut remover))
            .unwrap();

        let remaining: Vec<&str> = remover.remaining().iter().map(|m| m.name.as_str()).collect();
        assert_eq!(remaining, vec!["getName"]);
        assert!(holder.is_empty());
    }
}
