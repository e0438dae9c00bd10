//! Post-processing: facets that need knowledge of other specifications.
//!
//! Post-processors run once the loader has passed the introspection barrier, when the set
//! of specifications is complete and stable. Each processor is applied to every
//! specification (in parallel across specifications) before the next processor starts;
//! processors run highest [`PostProcessor::priority`] first.
//!
//! Post-processors only add facets. Facets they synthesize from other facets are created
//! as derived facets ([`crate::metamodel::facets::Facet::is_derived`]) so validators and
//! consumers can tell declared from inferred behavior.
//!
//! # Standard passes
//!
//! | Priority | Processor                     | Effect                                           |
//! |----------|-------------------------------|--------------------------------------------------|
//! | 300      | [`DisabledFromImmutable`]     | associations of immutable types become disabled  |
//! | 200      | [`MixinContributions`]        | mixin actions are contributed to their target    |
//! | 100      | [`SubclassLinking`]           | specifications register with their superclass    |
//! | 0        | [`FacetFactoryPostProcessor`] | runs `PostProcessing`-stage facet factories      |

mod factories;
mod hierarchy;
mod immutable;
mod mixins;

use std::sync::Arc;

pub use factories::FacetFactoryPostProcessor;
pub use hierarchy::SubclassLinking;
pub use immutable::DisabledFromImmutable;
pub use mixins::MixinContributions;

use crate::{
    metamodel::{
        config::MetaModelConfig,
        programming::ProgrammingModel,
        spec::{ObjectSpecification, ObjectSpecificationRc, SpecificationRef, SpecificationResolver},
    },
    Result,
};

/// A pass over one specification after the introspection barrier
pub trait PostProcessor: Send + Sync {
    /// Name used in diagnostics
    fn name(&self) -> &'static str;

    /// Higher priorities run first
    fn priority(&self) -> u32 {
        0
    }

    /// Derives facets for `spec`
    ///
    /// # Errors
    /// Returns an error if a derived facet cannot be installed; bootstrap is aborted.
    fn post_process(&self, spec: &ObjectSpecification, ctx: &PostProcessContext<'_>) -> Result<()>;
}

/// The complete metamodel as seen by the post-processors
pub struct PostProcessContext<'a> {
    specs: &'a [ObjectSpecificationRc],
    model: &'a ProgrammingModel,
    config: &'a MetaModelConfig,
    resolver: &'a dyn SpecificationResolver,
}

impl<'a> PostProcessContext<'a> {
    pub(crate) fn new(
        specs: &'a [ObjectSpecificationRc],
        model: &'a ProgrammingModel,
        config: &'a MetaModelConfig,
        resolver: &'a dyn SpecificationResolver,
    ) -> Self {
        PostProcessContext {
            specs,
            model,
            config,
            resolver,
        }
    }

    /// Every specification of the metamodel
    #[must_use]
    pub fn specifications(&self) -> &'a [ObjectSpecificationRc] {
        self.specs
    }

    /// The specification of `name`, if it is part of the metamodel
    #[must_use]
    pub fn find(&self, name: &str) -> Option<&'a ObjectSpecificationRc> {
        self.specs.iter().find(|spec| spec.name() == name)
    }

    /// A weak handle to the specification of `name`
    #[must_use]
    pub fn reference(&self, name: &str) -> SpecificationRef {
        self.resolver.reference(name)
    }

    /// The programming model
    #[must_use]
    pub fn model(&self) -> &'a ProgrammingModel {
        self.model
    }

    /// The loader configuration
    #[must_use]
    pub fn config(&self) -> &'a MetaModelConfig {
        self.config
    }
}

/// The standard post-processors in registration order
pub(crate) fn standard_post_processors() -> Vec<Arc<dyn PostProcessor>> {
    vec![
        Arc::new(DisabledFromImmutable),
        Arc::new(MixinContributions),
        Arc::new(SubclassLinking),
        Arc::new(FacetFactoryPostProcessor),
    ]
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::*;
    use crate::{
        metamodel::{
            config::MetaModelConfig,
            facets::{
                Contributed, DisabledFacet, FacetType, ImmutableFacet, InteractionContext,
                MixinFacet, NotContributedFacet,
            },
            factory::{ClassContext, FacetFactory, MethodContext, ParameterContext, ProcessingStage},
            identifier::FeatureKinds,
            loader::SpecificationLoader,
            reflect::{Annotation, ClassBuilder, MemoryClassRepository, MethodBuilder, TypeRef},
        },
        test::{bootstrap, loader_with},
    };

    fn disabled_reason(loader: &SpecificationLoader, class: &str, member: &str) -> Option<String> {
        let spec = loader.specification(class).unwrap();
        let facet = spec.effective_facet::<dyn DisabledFacet>(member)?;
        facet.disabled_reason(&InteractionContext::new()).unwrap()
    }

    #[test]
    fn test_immutable_disables_associations() {
        let loader = bootstrap(vec![ClassBuilder::new("Invoice")
            .annotate(Annotation::new("Immutable"))
            .method(MethodBuilder::new("getNumber").returns(TypeRef::value("String")))
            .method(MethodBuilder::new("getLines").returns(TypeRef::collection("InvoiceLine")))
            .method(
                MethodBuilder::new("getTotal")
                    .returns(TypeRef::value("BigDecimal"))
                    .annotate(Annotation::new("Disabled").with("reason", "Computed")),
            )
            .method(MethodBuilder::new("cancel"))]);

        assert_eq!(disabled_reason(&loader, "Invoice", "number").as_deref(), Some("Immutable"));
        assert_eq!(disabled_reason(&loader, "Invoice", "lines").as_deref(), Some("Immutable"));
        assert_eq!(disabled_reason(&loader, "Invoice", "total").as_deref(), Some("Computed"));
        assert!(disabled_reason(&loader, "Invoice", "cancel").is_none());

        let spec = loader.specification("Invoice").unwrap();
        let derived = spec.effective_facet::<dyn DisabledFacet>("lines").unwrap();
        assert!(derived.is_derived());
        assert!(derived.derived_from() == Some(FacetType::of::<dyn ImmutableFacet>()));
    }

    #[test]
    fn test_immutable_is_inherited() {
        let loader = bootstrap(vec![
            ClassBuilder::new("Document")
                .annotate(Annotation::new("DomainObject").with_enum("editing", "DISABLED")),
            ClassBuilder::new("Receipt")
                .extends("Document")
                .method(MethodBuilder::new("getAmount").returns(TypeRef::value("Long"))),
        ]);

        assert_eq!(disabled_reason(&loader, "Receipt", "amount").as_deref(), Some("Immutable"));
    }

    #[test]
    fn test_immutable_keeps_declared_disabled_facet() {
        let loader = bootstrap(vec![ClassBuilder::new("Invoice")
            .annotate(Annotation::new("Immutable"))
            .method(MethodBuilder::new("getNumber").returns(TypeRef::value("String")))
            .method(
                MethodBuilder::new("disableNumber")
                    .returns(TypeRef::value("String"))
                    .returning("Locked"),
            )]);

        assert_eq!(disabled_reason(&loader, "Invoice", "number").as_deref(), Some("Locked"));
        let spec = loader.specification("Invoice").unwrap();
        let declared = spec.effective_facet::<dyn DisabledFacet>("number").unwrap();
        assert!(!declared.is_derived());
    }

    #[test]
    fn test_immutable_subtype_disables_inherited_associations() {
        let loader = bootstrap(vec![
            ClassBuilder::new("Party")
                .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
                .method(MethodBuilder::new("getTags").returns(TypeRef::collection("Tag"))),
            ClassBuilder::new("FrozenParty")
                .extends("Party")
                .annotate(Annotation::new("Immutable")),
        ]);

        assert_eq!(disabled_reason(&loader, "FrozenParty", "name").as_deref(), Some("Immutable"));
        assert_eq!(disabled_reason(&loader, "FrozenParty", "tags").as_deref(), Some("Immutable"));
        assert!(disabled_reason(&loader, "Party", "name").is_none());
        assert!(disabled_reason(&loader, "Party", "tags").is_none());

        let frozen = loader.specification("FrozenParty").unwrap();
        let ids: Vec<&str> = frozen.declared_members().iter().map(|m| m.id()).collect();
        assert_eq!(ids, ["name", "tags"]);
        assert!(frozen.declared_members().iter().all(|m| m.method().is_none()));

        let members = frozen.members();
        let ordered: Vec<&str> = members.iter().map(|m| m.id()).collect();
        assert_eq!(ordered, ["name", "tags"]);
        assert!(frozen.member("tags").unwrap().is_collection());
    }

    fn mixin_classes() -> Vec<ClassBuilder> {
        vec![
            ClassBuilder::new("Customer")
                .method(MethodBuilder::new("getName").returns(TypeRef::value("String"))),
            ClassBuilder::new("Customer_placeOrder")
                .annotate(Annotation::new("Mixin"))
                .constructor(vec![TypeRef::class("Customer")])
                .method(
                    MethodBuilder::new("act")
                        .param("quantity", TypeRef::value("Integer"))
                        .returns(TypeRef::class("Customer")),
                ),
        ]
    }

    #[test]
    fn test_mixin_contributions() {
        let loader = bootstrap(mixin_classes());

        let customer = loader.specification("Customer").unwrap();
        let contributed = customer.contributed_actions();
        assert_eq!(contributed.len(), 1);
        assert_eq!(contributed[0].identifier().class_name(), "Customer_placeOrder");

        let mixin = loader.specification("Customer_placeOrder").unwrap();
        assert_eq!(mixin.holder().get_facet::<dyn MixinFacet>().unwrap().target(), "Customer");
        let contributed = mixin
            .effective_facet::<dyn NotContributedFacet>("act")
            .unwrap();
        assert_eq!(contributed.contributed(), Contributed::AsBoth);
        assert!(contributed.is_derived());
    }

    #[test]
    fn test_mixin_loaded_after_barrier() {
        let loader = loader_with(mixin_classes(), MetaModelConfig::minimal());
        loader.load_specification("Customer").unwrap();
        loader.complete_introspection().unwrap();
        assert!(loader
            .specification("Customer")
            .unwrap()
            .contributed_actions()
            .is_empty());

        loader.load_specification("Customer_placeOrder").unwrap();
        let customer = loader.specification("Customer").unwrap();
        assert_eq!(customer.contributed_actions().len(), 1);
        assert!(loader.specification("Customer_placeOrder").unwrap().is_sealed());
    }

    #[test]
    fn test_subclass_linking() {
        let loader = bootstrap(vec![
            ClassBuilder::new("Party"),
            ClassBuilder::new("Person").extends("Party"),
            ClassBuilder::new("Organisation").extends("Party"),
        ]);

        let party = loader.specification("Party").unwrap();
        let names: Vec<String> = party
            .subclasses()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["Organisation", "Person"]);
        assert!(loader.specification("Person").unwrap().subclasses().is_empty());
    }

    #[derive(Default)]
    struct Counting {
        types: AtomicUsize,
        members: AtomicUsize,
        params: AtomicUsize,
    }

    impl FacetFactory for Arc<Counting> {
        fn name(&self) -> &'static str {
            "Counting"
        }

        fn stage(&self) -> ProcessingStage {
            ProcessingStage::PostProcessing
        }

        fn feature_kinds(&self) -> FeatureKinds {
            FeatureKinds::ALL
        }

        fn process_class(&self, _ctx: &mut ClassContext<'_>) -> Result<()> {
            self.types.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn process_method(&self, _ctx: &mut MethodContext<'_>) -> Result<()> {
            self.members.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }

        fn process_param(&self, _ctx: &mut ParameterContext<'_>) -> Result<()> {
            self.params.fetch_add(1, Ordering::SeqCst);
            Ok(())
        }
    }

    #[test]
    fn test_post_processing_factories_run_once_per_holder() {
        let counting = Arc::new(Counting::default());
        let model = ProgrammingModel::builder()
            .add_factory(counting.clone())
            .build();
        let repository: MemoryClassRepository = [ClassBuilder::new("Customer")
            .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
            .method(
                MethodBuilder::new("rename")
                    .param("first", TypeRef::value("String"))
                    .param("last", TypeRef::value("String")),
            )
            .build()
            .unwrap()]
        .into_iter()
        .collect();
        let loader = SpecificationLoader::new(model, Arc::new(repository), MetaModelConfig::minimal());

        loader.introspect_all().unwrap();
        assert_eq!(counting.types.load(Ordering::SeqCst), 0);

        loader.complete_introspection().unwrap();
        assert_eq!(counting.types.load(Ordering::SeqCst), 1);
        assert_eq!(counting.members.load(Ordering::SeqCst), 2);
        assert_eq!(counting.params.load(Ordering::SeqCst), 2);

        loader.complete_introspection().unwrap();
        assert_eq!(counting.types.load(Ordering::SeqCst), 1);
    }
}
