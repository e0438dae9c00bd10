//! Facet factories: the pluggable analyzers that turn raw class descriptors into facets.
//!
//! A [`FacetFactory`] inspects a class, one of its members or one action parameter and
//! contributes facets to the corresponding [`FacetHolder`]. Factories are registered in a
//! [`crate::metamodel::programming::ProgrammingModel`] under a [`ProcessingStage`]; the
//! introspector runs the stages in their fixed total order for every holder, and within a
//! stage runs the factories in registration order.
//!
//! # Key Components
//!
//! - [`FacetFactory`] - the analyzer interface
//! - [`ProcessingStage`] - the fixed order of processing stages
//! - [`ClassContext`] / [`MethodContext`] / [`ParameterContext`] - per-holder processing input
//! - [`MethodRemover`] - the candidate method set from which support methods are consumed
//!
//! # Failure semantics
//!
//! A factory that returns an error aborts construction of the class. The introspector wraps
//! the error in [`crate::Error::FacetFactory`] with the factory name and the identifier of
//! the holder being processed; nothing is published for the class.

mod accessors;
mod annotations;
mod ignored;
pub(crate) mod naming;
mod object;
mod support;

use std::fmt;

use strum::{Display, EnumCount, EnumIter};

pub use accessors::{
    ActionInvocationFacetFactory, CollectionAccessorFacetFactory, PropertyAccessorFacetFactory,
    PropertyEditingConfigurationFacetFactory,
};
pub use annotations::{
    ActionSemanticsFacetFactory, DescribedAsFacetFactory, DisabledAnnotationFacetFactory,
    HiddenAnnotationFacetFactory, MandatoryFacetFactory, MaxLengthFacetFactory,
    MemberOrderFacetFactory, NamedFacetFactory, NotContributedFacetFactory,
    ParameterNameFacetFactory,
};
pub use ignored::IgnoredMethodsFacetFactory;
pub use object::{
    IconNameFacetFactory, LifecycleCallbackFacetFactory, ObjectAnnotationsFacetFactory,
    TitleAnnotationFacetFactory, TitleMethodFacetFactory, ValueTypesFacetFactory,
};
pub use support::SupportMethodsFacetFactory;

use crate::{
    metamodel::{
        facets::FacetHolder,
        identifier::{FeatureIdentifier, FeatureKind, FeatureKinds},
        reflect::{ClassDescriptor, MethodDescriptorRc, ParameterDescriptor},
    },
    Error, Result,
};

/// Processing stages in their fixed total order.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Display, EnumIter, EnumCount,
)]
pub enum ProcessingStage {
    /// Facets derived purely from annotations and naming conventions
    Discovery,
    /// Facets that require facets contributed during discovery
    Dependent,
    /// Support methods are consumed and removed from the candidate set
    MethodRemoval,
    /// Run by the post-processor once every specification exists
    PostProcessing,
}

impl ProcessingStage {
    /// The stages run while a single class is constructed
    pub const CONSTRUCTION: [ProcessingStage; 3] = [
        ProcessingStage::Discovery,
        ProcessingStage::Dependent,
        ProcessingStage::MethodRemoval,
    ];
}

/// A pluggable analyzer contributing facets to classes, members and parameters.
///
/// All processing methods default to no-ops so a factory only implements what applies to
/// the feature kinds it declares. A factory is invoked exactly once per matching holder.
pub trait FacetFactory: Send + Sync {
    /// Name used in diagnostics and error reports
    fn name(&self) -> &'static str;

    /// The stage this factory runs in
    fn stage(&self) -> ProcessingStage;

    /// The feature kinds this factory applies to
    fn feature_kinds(&self) -> FeatureKinds;

    /// Processes the type-level holder of a class
    ///
    /// # Errors
    /// Returns an error if the class is inconsistent; construction is aborted.
    fn process_class(&self, _ctx: &mut ClassContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Processes a property, collection or action holder
    ///
    /// # Errors
    /// Returns an error if the member is inconsistent; construction is aborted.
    fn process_method(&self, _ctx: &mut MethodContext<'_>) -> Result<()> {
        Ok(())
    }

    /// Processes an action parameter holder
    ///
    /// # Errors
    /// Returns an error if the parameter is inconsistent; construction is aborted.
    fn process_param(&self, _ctx: &mut ParameterContext<'_>) -> Result<()> {
        Ok(())
    }
}

/// Wraps an error returned by `factory` while it processed `identifier`
pub(crate) fn factory_error(
    factory: &dyn FacetFactory,
    identifier: &FeatureIdentifier,
    error: Error,
) -> Error {
    Error::FacetFactory {
        factory: factory.name(),
        identifier: identifier.clone(),
        source: Box::new(error),
    }
}

impl fmt::Debug for dyn FacetFactory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FacetFactory({}, {})", self.name(), self.stage())
    }
}

/// The methods of a class that have not yet been claimed by a member or a facet factory.
///
/// Methods keep their declaration order. Once removed, a method can never become a member.
#[derive(Debug, Clone, Default)]
pub struct MethodRemover {
    methods: Vec<MethodDescriptorRc>,
}

impl MethodRemover {
    /// Creates a remover over `methods`
    #[must_use]
    pub fn new(methods: impl IntoIterator<Item = MethodDescriptorRc>) -> Self {
        MethodRemover {
            methods: methods.into_iter().collect(),
        }
    }

    /// Removes the first remaining method called `name`, optionally restricted to a
    /// parameter count, and returns it
    pub fn remove_method(
        &mut self,
        name: &str,
        param_count: Option<usize>,
    ) -> Option<MethodDescriptorRc> {
        let position = self.methods.iter().position(|m| {
            m.name == name && param_count.is_none_or(|count| m.param_count() == count)
        })?;
        Some(self.methods.remove(position))
    }

    /// Removes every remaining method whose name starts with `prefix`
    pub fn remove_prefixed(&mut self, prefix: &str) -> Vec<MethodDescriptorRc> {
        self.remove_where(|m| m.name.starts_with(prefix))
    }

    /// Removes every remaining method matching `predicate`, in declaration order
    pub fn remove_where<F>(&mut self, mut predicate: F) -> Vec<MethodDescriptorRc>
    where
        F: FnMut(&MethodDescriptorRc) -> bool,
    {
        let mut removed = Vec::new();
        self.methods.retain(|m| {
            if predicate(m) {
                removed.push(m.clone());
                false
            } else {
                true
            }
        });
        removed
    }

    /// The first remaining method called `name`, without removing it
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&MethodDescriptorRc> {
        self.methods.iter().find(|m| m.name == name)
    }

    /// Remaining methods in declaration order
    #[must_use]
    pub fn remaining(&self) -> &[MethodDescriptorRc] {
        &self.methods
    }

    /// Takes every remaining method, leaving the remover empty
    pub fn drain(&mut self) -> Vec<MethodDescriptorRc> {
        std::mem::take(&mut self.methods)
    }

    /// Number of remaining methods
    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    /// Returns true if no method remains
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }
}

/// Input of [`FacetFactory::process_class`]
pub struct ClassContext<'a> {
    class: &'a ClassDescriptor,
    holder: &'a FacetHolder,
    remover: &'a mut MethodRemover,
}

impl<'a> ClassContext<'a> {
    /// Creates a context
    pub fn new(
        class: &'a ClassDescriptor,
        holder: &'a FacetHolder,
        remover: &'a mut MethodRemover,
    ) -> Self {
        ClassContext {
            class,
            holder,
            remover,
        }
    }

    /// The class being processed
    #[must_use]
    pub fn class(&self) -> &'a ClassDescriptor {
        self.class
    }

    /// The type-level holder
    #[must_use]
    pub fn holder(&self) -> &'a FacetHolder {
        self.holder
    }

    /// Identifier of the type-level holder
    #[must_use]
    pub fn identifier(&self) -> &'a FeatureIdentifier {
        self.holder.identifier()
    }

    /// The candidate method set
    pub fn remover(&mut self) -> &mut MethodRemover {
        self.remover
    }
}

/// Input of [`FacetFactory::process_method`].
///
/// `method` is the accessor or action method of the member. It is `None` for a
/// subtype-local holder created because the subtype declares support methods for a member
/// inherited from a supertype.
pub struct MethodContext<'a> {
    class: &'a ClassDescriptor,
    method: Option<&'a MethodDescriptorRc>,
    holder: &'a FacetHolder,
    remover: &'a mut MethodRemover,
}

impl<'a> MethodContext<'a> {
    /// Creates a context
    pub fn new(
        class: &'a ClassDescriptor,
        method: Option<&'a MethodDescriptorRc>,
        holder: &'a FacetHolder,
        remover: &'a mut MethodRemover,
    ) -> Self {
        MethodContext {
            class,
            method,
            holder,
            remover,
        }
    }

    /// The owning class
    #[must_use]
    pub fn class(&self) -> &'a ClassDescriptor {
        self.class
    }

    /// The accessor or action method
    #[must_use]
    pub fn method(&self) -> Option<&'a MethodDescriptorRc> {
        self.method
    }

    /// The member holder
    #[must_use]
    pub fn holder(&self) -> &'a FacetHolder {
        self.holder
    }

    /// Identifier of the member
    #[must_use]
    pub fn identifier(&self) -> &'a FeatureIdentifier {
        self.holder.identifier()
    }

    /// Kind of the member
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        self.holder.identifier().kind()
    }

    /// Name of the member (`name` for `getName()`)
    #[must_use]
    pub fn member_name(&self) -> &'a str {
        self.holder.identifier().member_name().unwrap_or_default()
    }

    /// The candidate method set
    pub fn remover(&mut self) -> &mut MethodRemover {
        self.remover
    }
}

/// Input of [`FacetFactory::process_param`]
pub struct ParameterContext<'a> {
    class: &'a ClassDescriptor,
    action: Option<&'a MethodDescriptorRc>,
    parameter: Option<&'a ParameterDescriptor>,
    holder: &'a FacetHolder,
    remover: &'a mut MethodRemover,
}

impl<'a> ParameterContext<'a> {
    /// Creates a context
    pub fn new(
        class: &'a ClassDescriptor,
        action: Option<&'a MethodDescriptorRc>,
        parameter: Option<&'a ParameterDescriptor>,
        holder: &'a FacetHolder,
        remover: &'a mut MethodRemover,
    ) -> Self {
        ParameterContext {
            class,
            action,
            parameter,
            holder,
            remover,
        }
    }

    /// The owning class
    #[must_use]
    pub fn class(&self) -> &'a ClassDescriptor {
        self.class
    }

    /// The action method, `None` for parameters of an inherited action
    #[must_use]
    pub fn action(&self) -> Option<&'a MethodDescriptorRc> {
        self.action
    }

    /// The parameter descriptor, `None` for parameters of an inherited action
    #[must_use]
    pub fn parameter(&self) -> Option<&'a ParameterDescriptor> {
        self.parameter
    }

    /// The parameter holder
    #[must_use]
    pub fn holder(&self) -> &'a FacetHolder {
        self.holder
    }

    /// Identifier of the parameter
    #[must_use]
    pub fn identifier(&self) -> &'a FeatureIdentifier {
        self.holder.identifier()
    }

    /// Zero-based position of the parameter
    #[must_use]
    pub fn index(&self) -> usize {
        self.holder.identifier().parameter_index().unwrap_or_default()
    }

    /// Name of the owning action
    #[must_use]
    pub fn action_name(&self) -> &'a str {
        self.holder.identifier().member_name().unwrap_or_default()
    }

    /// The candidate method set
    pub fn remover(&mut self) -> &mut MethodRemover {
        self.remover
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use strum::IntoEnumIterator;

    use super::*;
    use crate::metamodel::reflect::{MethodBuilder, TypeRef};

    fn method(name: &str, params: usize) -> MethodDescriptorRc {
        let mut builder = MethodBuilder::new(name);
        for i in 0..params {
            builder = builder.param(format!("p{i}"), TypeRef::value("String"));
        }
        Arc::new(builder.build_method())
    }

    #[test]
    fn test_stage_order() {
        let stages: Vec<ProcessingStage> = ProcessingStage::iter().collect();
        assert_eq!(stages.len(), ProcessingStage::COUNT);
        assert!(stages.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(stages.last(), Some(&ProcessingStage::PostProcessing));
        assert!(!ProcessingStage::CONSTRUCTION.contains(&ProcessingStage::PostProcessing));
    }

    #[test]
    fn test_remove_method_by_name_and_arity() {
        let mut remover = MethodRemover::new(vec![
            method("validateName", 1),
            method("validateName", 2),
            method("hideName", 0),
        ]);

        let removed = remover.remove_method("validateName", Some(2)).unwrap();
        assert_eq!(removed.param_count(), 2);
        assert!(remover.remove_method("validateName", Some(2)).is_none());
        assert!(remover.remove_method("hideName", None).is_some());
        assert_eq!(remover.len(), 1);
    }

    #[test]
    fn test_remove_prefixed_keeps_order() {
        let mut remover = MethodRemover::new(vec![
            method("choices0Place", 0),
            method("placeOrder", 1),
            method("choices1Place", 1),
        ]);

        let removed: Vec<String> = remover
            .remove_prefixed("choices")
            .iter()
            .map(|m| m.name.clone())
            .collect();
        assert_eq!(removed, vec!["choices0Place", "choices1Place"]);
        assert_eq!(remover.remaining()[0].name, "placeOrder");
        assert!(remover.find("placeOrder").is_some());
    }
}
