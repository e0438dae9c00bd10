//! Construction of one [`ObjectSpecification`] from a class descriptor.
//!
//! Discovery is a two-phase visitor. Candidate enumeration classifies the methods left after
//! type-level processing into accessors and everything else, using naming conventions only.
//! The facet factory pipeline then runs over every holder, and support methods are consumed
//! from the [`MethodRemover`] as factories claim them; whatever is not a support method for
//! a known member becomes an action.
//!
//! Order of processing:
//!
//! 1. the type-level holder (all construction stages)
//! 2. properties and collections, in declaration order
//! 3. actions and their parameters, from the remaining candidates
//! 4. subtype-local holders for inherited members configured by this class, and for every
//!    inherited association of an immutable type
//! 5. leftovers are recorded as orphaned support methods

use std::{collections::HashSet, sync::Arc};

use tracing::debug;

use crate::{
    metamodel::{
        facets::{FacetHolder, ImmutableFacet, MixinFacet},
        factory::{
            factory_error, naming, ClassContext, MethodContext, MethodRemover, ParameterContext,
            ProcessingStage,
        },
        identifier::{FeatureIdentifier, FeatureKind},
        programming::ProgrammingModel,
        reflect::{ClassDescriptorRc, MethodDescriptorRc, TypeRef},
        spec::{
            ActionParameter, ObjectMember, ObjectMemberRc, ObjectSpecification,
            SpecificationRef, SpecificationResolver,
        },
    },
    Error, Result,
};

/// Builds the specification of one class; supertypes must already be published
pub(crate) struct Introspector<'a> {
    model: &'a ProgrammingModel,
    class: &'a ClassDescriptorRc,
    resolver: &'a dyn SpecificationResolver,
    superclass: Option<SpecificationRef>,
    interfaces: Vec<SpecificationRef>,
    supertypes: Vec<Arc<ObjectSpecification>>,
}

impl<'a> Introspector<'a> {
    pub(crate) fn new(
        model: &'a ProgrammingModel,
        class: &'a ClassDescriptorRc,
        resolver: &'a dyn SpecificationResolver,
    ) -> Self {
        Introspector {
            model,
            class,
            resolver,
            superclass: None,
            interfaces: Vec::new(),
            supertypes: Vec::new(),
        }
    }

    /// Sets the published superclass specification
    pub(crate) fn with_superclass(mut self, superclass: Arc<ObjectSpecification>) -> Self {
        self.superclass = Some(self.resolver.reference(superclass.name()));
        self.supertypes.insert(0, superclass);
        self
    }

    /// Adds a published interface specification
    pub(crate) fn with_interface(mut self, interface: Arc<ObjectSpecification>) -> Self {
        self.interfaces.push(self.resolver.reference(interface.name()));
        self.supertypes.push(interface);
        self
    }

    fn reference(&self, type_ref: &TypeRef) -> Option<SpecificationRef> {
        type_ref
            .referenced_class()
            .map(|name| self.resolver.reference(name))
    }

    fn inherited_member(&self, id: &str) -> Option<ObjectMemberRc> {
        self.supertypes.iter().find_map(|spec| spec.member(id))
    }

    /// Runs the pipeline and assembles the specification
    ///
    /// # Errors
    /// Returns [`Error::FacetFactory`] if a factory fails and [`Error::AmbiguousMember`] if
    /// two methods describe the same member.
    pub(crate) fn introspect(self) -> Result<ObjectSpecification> {
        let class = self.class;
        let type_id = FeatureIdentifier::type_id(class.name.as_str());
        let holder = FacetHolder::new(type_id.clone());
        let mut remover = MethodRemover::new(class.methods.iter().cloned());

        for stage in ProcessingStage::CONSTRUCTION {
            for factory in self.model.factories_for(stage) {
                if !factory.feature_kinds().applies_to(FeatureKind::Type) {
                    continue;
                }
                factory
                    .process_class(&mut ClassContext::new(class, &holder, &mut remover))
                    .map_err(|e| factory_error(factory, &type_id, e))?;
            }
        }

        let mut members = self.associations(&mut remover)?;
        let actions = self.actions(&mut remover, &members)?;
        members.extend(actions);
        let immutable = holder.contains_facet::<dyn ImmutableFacet>()
            || self
                .supertypes
                .iter()
                .any(|spec| spec.contains_facet::<dyn ImmutableFacet>());
        let overrides = self.local_overrides(&mut remover, &members, immutable)?;
        members.extend(overrides);

        let orphaned_methods = remover.drain();
        let referenced_classes = self.referenced_classes(&holder, &members);

        debug!(
            class = %class.name,
            members = members.len(),
            facets = holder.len(),
            orphaned = orphaned_methods.len(),
            "introspected"
        );

        Ok(ObjectSpecification {
            class: class.clone(),
            holder,
            members: members.into_iter().map(Arc::new).collect(),
            superclass: self.superclass,
            interfaces: self.interfaces,
            subclasses: boxcar::Vec::new(),
            contributed: boxcar::Vec::new(),
            orphaned_methods,
            referenced_classes,
        })
    }

    fn associations(&self, remover: &mut MethodRemover) -> Result<Vec<ObjectMember>> {
        let mut accessors: Vec<(String, MethodDescriptorRc)> = Vec::new();
        for method in remover.remaining() {
            let Some(name) = naming::accessor_name(method) else {
                continue;
            };
            if let Some((_, existing)) = accessors.iter().find(|(n, _)| *n == name) {
                return Err(Error::AmbiguousMember {
                    identifier: FeatureIdentifier::property(self.class.name.as_str(), name),
                    reason: format!(
                        "accessors '{}' and '{}' describe the same member",
                        existing.name, method.name
                    ),
                });
            }
            accessors.push((name, method.clone()));
        }
        remover.remove_where(|m| accessors.iter().any(|(_, a)| Arc::ptr_eq(a, m)));

        let mut members = Vec::with_capacity(accessors.len());
        for (name, method) in accessors {
            let kind = if naming::is_collection_accessor(&method.return_type) {
                FeatureKind::Collection
            } else {
                FeatureKind::Property
            };
            let member = ObjectMember {
                holder: FacetHolder::new(FeatureIdentifier::member(
                    self.class.name.as_str(),
                    name,
                    kind,
                )),
                value_type: method.return_type.clone(),
                type_spec: self.reference(&method.return_type),
                method: Some(method),
                parameters: Vec::new(),
            };
            self.process_member(&member, remover)?;
            members.push(member);
        }
        Ok(members)
    }

    fn actions(
        &self,
        remover: &mut MethodRemover,
        associations: &[ObjectMember],
    ) -> Result<Vec<ObjectMember>> {
        let plain: HashSet<String> = remover
            .remaining()
            .iter()
            .filter(|m| naming::support_target(&m.name).is_none())
            .map(|m| m.name.clone())
            .collect();
        let is_known = |member: &str| {
            plain.contains(member)
                || associations.iter().any(|a| a.id() == member)
                || self.inherited_member(member).is_some()
        };

        let candidates: Vec<MethodDescriptorRc> = remover.remove_where(|m| {
            naming::support_target(&m.name).is_none_or(|target| !is_known(&target.member))
        });

        let mut actions: Vec<ObjectMember> = Vec::with_capacity(candidates.len());
        for method in candidates {
            let identifier = FeatureIdentifier::action(self.class.name.as_str(), method.name.as_str());
            if associations.iter().any(|a| a.id() == method.name)
                || actions.iter().any(|a| a.id() == method.name)
            {
                return Err(Error::AmbiguousMember {
                    identifier,
                    reason: format!("'{}' is declared more than once", method.name),
                });
            }

            let parameters = method
                .parameters
                .iter()
                .enumerate()
                .map(|(index, parameter)| ActionParameter {
                    holder: FacetHolder::new(identifier.with_parameter(index)),
                    descriptor: Some(parameter.clone()),
                    param_type: parameter.param_type.clone(),
                    type_spec: self.reference(&parameter.param_type),
                })
                .collect();

            let action = ObjectMember {
                holder: FacetHolder::new(identifier),
                value_type: method.return_type.clone(),
                type_spec: self.reference(&method.return_type),
                method: Some(method),
                parameters,
            };
            self.process_member(&action, remover)?;
            actions.push(action);
        }
        Ok(actions)
    }

    fn local_overrides(
        &self,
        remover: &mut MethodRemover,
        own: &[ObjectMember],
        immutable: bool,
    ) -> Result<Vec<ObjectMember>> {
        let mut targets: Vec<ObjectMemberRc> = Vec::new();
        for method in remover.remaining() {
            let Some(target) = naming::support_target(&method.name) else {
                continue;
            };
            if own.iter().any(|m| m.id() == target.member)
                || targets.iter().any(|m| m.id() == target.member)
            {
                continue;
            }
            if let Some(inherited) = self.inherited_member(&target.member) {
                targets.push(inherited);
            }
        }
        // an immutable type disables inherited associations on holders of its own
        if immutable {
            for inherited in self.supertypes.iter().flat_map(|spec| spec.associations()) {
                if !own.iter().any(|m| m.id() == inherited.id())
                    && !targets.iter().any(|m| m.id() == inherited.id())
                {
                    targets.push(inherited);
                }
            }
        }

        let mut overrides = Vec::with_capacity(targets.len());
        for inherited in targets {
            let identifier = inherited.identifier().rehome(&self.class.name);
            let parameters = inherited
                .parameters
                .iter()
                .map(|p| ActionParameter {
                    holder: FacetHolder::new(identifier.with_parameter(p.index())),
                    descriptor: p.descriptor.clone(),
                    param_type: p.param_type.clone(),
                    type_spec: p.type_spec.clone(),
                })
                .collect();
            let local = ObjectMember {
                holder: FacetHolder::new(identifier),
                method: None,
                value_type: inherited.value_type.clone(),
                type_spec: inherited.type_spec.clone(),
                parameters,
            };
            self.process_member(&local, remover)?;
            overrides.push(local);
        }
        Ok(overrides)
    }

    /// Runs every construction stage over one member and its parameters
    fn process_member(&self, member: &ObjectMember, remover: &mut MethodRemover) -> Result<()> {
        let kind = member.kind();
        for stage in ProcessingStage::CONSTRUCTION {
            for factory in self.model.factories_for(stage) {
                let kinds = factory.feature_kinds();
                if kinds.applies_to(kind) {
                    factory
                        .process_method(&mut MethodContext::new(
                            self.class,
                            member.method.as_ref(),
                            &member.holder,
                            remover,
                        ))
                        .map_err(|e| factory_error(factory, member.identifier(), e))?;
                }

                if !kinds.applies_to(FeatureKind::ActionParameter) {
                    continue;
                }
                for parameter in &member.parameters {
                    factory
                        .process_param(&mut ParameterContext::new(
                            self.class,
                            member.method.as_ref(),
                            parameter.descriptor.as_ref(),
                            &parameter.holder,
                            remover,
                        ))
                        .map_err(|e| factory_error(factory, parameter.identifier(), e))?;
                }
            }
        }
        Ok(())
    }

    fn referenced_classes(&self, holder: &FacetHolder, members: &[ObjectMember]) -> Vec<String> {
        let mut referenced: Vec<String> = Vec::new();
        let mut push = |name: &str| {
            if !referenced.iter().any(|r| r == name) {
                referenced.push(name.to_string());
            }
        };

        for member in members {
            if let Some(name) = member.type_name() {
                push(name);
            }
            for parameter in &member.parameters {
                if let Some(r) = &parameter.type_spec {
                    push(r.name());
                }
            }
        }
        if let Some(mixin) = holder.get_facet::<dyn MixinFacet>() {
            push(mixin.target());
        }
        referenced
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        metamodel::{
            config::MetaModelConfig,
            facets::{PropertySetterFacet, TypeOfFacet},
            factory::{ClassContext, FacetFactory, ProcessingStage},
            identifier::{FeatureKind, FeatureKinds},
            loader::SpecificationLoader,
            programming::ProgrammingModel,
            reflect::{ClassBuilder, MemoryClassRepository, MethodBuilder, TypeRef},
        },
        test::loader_with,
        Error, Result,
    };
    use std::sync::Arc;

    #[test]
    fn test_discovery_classifies_members() {
        let loader = loader_with(
            vec![ClassBuilder::new("Customer")
                .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
                .method(MethodBuilder::new("setName").param("name", TypeRef::value("String")))
                .method(MethodBuilder::new("isActive").returns(TypeRef::value("boolean")))
                .method(MethodBuilder::new("getOrders").returns(TypeRef::collection("Order")))
                .method(
                    MethodBuilder::new("placeOrder")
                        .param("product", TypeRef::class("Product"))
                        .returns(TypeRef::class("Order")),
                )
                .method(MethodBuilder::new("lookup").static_method())],
            MetaModelConfig::minimal(),
        );
        let customer = loader.load_specification("Customer").unwrap();

        let kinds: Vec<(&str, FeatureKind)> = customer
            .declared_members()
            .iter()
            .map(|m| (m.id(), m.kind()))
            .collect();
        assert_eq!(
            kinds,
            vec![
                ("name", FeatureKind::Property),
                ("active", FeatureKind::Property),
                ("orders", FeatureKind::Collection),
                ("placeOrder", FeatureKind::Action),
            ]
        );

        let name = customer.member("name").unwrap();
        assert!(name.get_facet::<dyn PropertySetterFacet>().is_some());
        let orders = customer.member("orders").unwrap();
        assert_eq!(orders.get_facet::<dyn TypeOfFacet>().unwrap().element_class(), "Order");

        let place = customer.member("placeOrder").unwrap();
        assert_eq!(place.parameters().len(), 1);
        assert_eq!(place.parameter(0).unwrap().identifier().parameter_index(), Some(0));
        assert_eq!(customer.referenced_classes(), ["Order", "Product"]);
        assert!(customer.orphaned_methods().is_empty());
    }

    #[test]
    fn test_duplicate_accessors_are_ambiguous() {
        let loader = loader_with(
            vec![ClassBuilder::new("Customer")
                .method(MethodBuilder::new("getActive").returns(TypeRef::value("boolean")))
                .method(MethodBuilder::new("isActive").returns(TypeRef::value("boolean")))],
            MetaModelConfig::minimal(),
        );

        match loader.load_specification("Customer") {
            Err(Error::AmbiguousMember { identifier, .. }) => {
                assert_eq!(identifier.member_name(), Some("active"));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(loader.specification("Customer").is_none());
    }

    #[test]
    fn test_overloaded_actions_are_ambiguous() {
        let loader = loader_with(
            vec![ClassBuilder::new("Customer")
                .method(MethodBuilder::new("notify"))
                .method(MethodBuilder::new("notify").param("message", TypeRef::value("String")))],
            MetaModelConfig::minimal(),
        );

        match loader.load_specification("Customer") {
            Err(Error::AmbiguousMember { identifier, .. }) => {
                assert_eq!(identifier.kind(), FeatureKind::Action);
                assert_eq!(identifier.member_name(), Some("notify"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    struct Failing;

    impl FacetFactory for Failing {
        fn name(&self) -> &'static str {
            "Failing"
        }

        fn stage(&self) -> ProcessingStage {
            ProcessingStage::Dependent
        }

        fn feature_kinds(&self) -> FeatureKinds {
            FeatureKinds::TYPE
        }

        fn process_class(&self, ctx: &mut ClassContext<'_>) -> Result<()> {
            Err(construction_error!(ctx.identifier(), "unsupported class"))
        }
    }

    #[test]
    fn test_factory_failure_aborts_construction() {
        let repository: MemoryClassRepository = [ClassBuilder::new("Customer").build().unwrap()]
            .into_iter()
            .collect();
        let loader = SpecificationLoader::new(
            ProgrammingModel::builder().add_factory(Failing).build(),
            Arc::new(repository),
            MetaModelConfig::minimal(),
        );

        match loader.load_specification("Customer") {
            Err(Error::FacetFactory {
                factory,
                identifier,
                source,
            }) => {
                assert_eq!(factory, "Failing");
                assert_eq!(identifier.class_name(), "Customer");
                assert!(matches!(*source, Error::Construction { .. }));
            }
            other => panic!("unexpected {other:?}"),
        }
        assert!(loader.specification("Customer").is_none());
        assert_eq!(loader.construction_count(), 0);
    }

    #[test]
    fn test_local_override_for_inherited_member() {
        let loader = loader_with(
            vec![
                ClassBuilder::new("Party")
                    .method(MethodBuilder::new("getName").returns(TypeRef::value("String"))),
                ClassBuilder::new("Person").extends("Party").method(
                    MethodBuilder::new("disableName")
                        .returns(TypeRef::value("String"))
                        .returning("Locked"),
                ),
            ],
            MetaModelConfig::minimal(),
        );
        let person = loader.load_specification("Person").unwrap();

        let local = &person.declared_members()[0];
        assert_eq!(local.id(), "name");
        assert_eq!(local.kind(), FeatureKind::Property);
        assert!(local.is_local_override());
        assert!(local.method().is_none());
        assert_eq!(local.identifier().class_name(), "Person");
        assert!(person.actions().is_empty());
    }

    #[test]
    fn test_unmatched_support_method_is_orphaned() {
        let loader = loader_with(
            vec![ClassBuilder::new("Customer")
                .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
                .method(MethodBuilder::new("hideName").returns(TypeRef::value("String")))],
            MetaModelConfig::minimal(),
        );
        let customer = loader.load_specification("Customer").unwrap();

        let orphaned: Vec<&str> = customer
            .orphaned_methods()
            .iter()
            .map(|m| m.name.as_str())
            .collect();
        assert_eq!(orphaned, vec!["hideName"]);
        assert!(customer.member("hideName").is_none());
    }
}
