//! The programming model: the ordered registry of facet factories, post-processors and
//! validators that together define how domain classes are interpreted.
//!
//! A [`ProgrammingModel`] is built once at bootstrap and shared immutably (behind an `Arc`)
//! by the loader and every introspection worker. Factories run stage by stage
//! ([`ProcessingStage`]); within a stage they run in registration order, so a factory
//! registered later wins ties between facets of equal [`Precedence`].
//!
//! # Examples
//!
//! ```rust
//! use facetmodel::metamodel::{
//!     config::{ConfigurationProperties, CONFIG_PROPERTIES_EDITING},
//!     factory::{ProcessingStage, SupportMethodsFacetFactory},
//!     programming::ProgrammingModel,
//! };
//!
//! let model = ProgrammingModel::builder()
//!     .configuration(ConfigurationProperties::new().with(CONFIG_PROPERTIES_EDITING, "false"))
//!     .without_factory("IconNameFacetFactory")
//!     .build();
//!
//! assert!(model
//!     .factories_for(ProcessingStage::MethodRemoval)
//!     .any(|f| f.name() == "SupportMethodsFacetFactory"));
//! assert!(model.factories().all(|f| f.name() != "IconNameFacetFactory"));
//! ```
//!
//! [`Precedence`]: crate::metamodel::facets::Precedence

use std::{fmt, sync::Arc};

use crate::metamodel::{
    config::ConfigurationProperties,
    factory::{
        ActionInvocationFacetFactory, ActionSemanticsFacetFactory, CollectionAccessorFacetFactory,
        DescribedAsFacetFactory, DisabledAnnotationFacetFactory, FacetFactory,
        HiddenAnnotationFacetFactory, IconNameFacetFactory, IgnoredMethodsFacetFactory,
        LifecycleCallbackFacetFactory, MandatoryFacetFactory, MaxLengthFacetFactory,
        MemberOrderFacetFactory, NamedFacetFactory, NotContributedFacetFactory,
        ObjectAnnotationsFacetFactory, ParameterNameFacetFactory, ProcessingStage,
        PropertyAccessorFacetFactory, PropertyEditingConfigurationFacetFactory,
        SupportMethodsFacetFactory, TitleAnnotationFacetFactory, TitleMethodFacetFactory,
        ValueTypesFacetFactory,
    },
    postprocess::{self, PostProcessor},
    validation::{self, MetaModelValidator},
};

/// The standard facet factories in registration order
fn standard_factories(configuration: &ConfigurationProperties) -> Vec<Arc<dyn FacetFactory>> {
    vec![
        // discovery
        Arc::new(IgnoredMethodsFacetFactory),
        Arc::new(ObjectAnnotationsFacetFactory),
        Arc::new(ValueTypesFacetFactory),
        Arc::new(NamedFacetFactory),
        Arc::new(DescribedAsFacetFactory),
        Arc::new(MemberOrderFacetFactory),
        Arc::new(HiddenAnnotationFacetFactory),
        Arc::new(DisabledAnnotationFacetFactory),
        Arc::new(MandatoryFacetFactory),
        Arc::new(MaxLengthFacetFactory),
        Arc::new(ActionSemanticsFacetFactory),
        Arc::new(NotContributedFacetFactory),
        Arc::new(ParameterNameFacetFactory),
        // dependent
        Arc::new(PropertyAccessorFacetFactory),
        Arc::new(CollectionAccessorFacetFactory),
        Arc::new(ActionInvocationFacetFactory),
        Arc::new(PropertyEditingConfigurationFacetFactory::new(configuration)),
        Arc::new(TitleAnnotationFacetFactory),
        // method removal
        Arc::new(SupportMethodsFacetFactory),
        Arc::new(TitleMethodFacetFactory),
        Arc::new(IconNameFacetFactory),
        Arc::new(LifecycleCallbackFacetFactory),
    ]
}

/// Ordered registry of facet factories, post-processors and validators
pub struct ProgrammingModel {
    factories: Vec<Arc<dyn FacetFactory>>,
    post_processors: Vec<Arc<dyn PostProcessor>>,
    validators: Vec<Arc<dyn MetaModelValidator>>,
    configuration: ConfigurationProperties,
}

impl ProgrammingModel {
    /// The standard model configured with `configuration`
    #[must_use]
    pub fn with_configuration(configuration: ConfigurationProperties) -> Self {
        Self::builder().configuration(configuration).build()
    }

    /// A builder starting from the standard model
    #[must_use]
    pub fn builder() -> ProgrammingModelBuilder {
        ProgrammingModelBuilder::default()
    }

    /// Factories registered under `stage`, in registration order
    pub fn factories_for(&self, stage: ProcessingStage) -> impl Iterator<Item = &dyn FacetFactory> {
        self.factories
            .iter()
            .filter(move |factory| factory.stage() == stage)
            .map(|factory| &**factory)
    }

    /// Every factory, in registration order
    pub fn factories(&self) -> impl Iterator<Item = &dyn FacetFactory> {
        self.factories.iter().map(|factory| &**factory)
    }

    /// Post-processors, highest priority first
    #[must_use]
    pub fn post_processors(&self) -> &[Arc<dyn PostProcessor>] {
        &self.post_processors
    }

    /// Validators, highest priority first
    #[must_use]
    pub fn validators(&self) -> &[Arc<dyn MetaModelValidator>] {
        &self.validators
    }

    /// The configuration the model was built with
    #[must_use]
    pub fn configuration(&self) -> &ConfigurationProperties {
        &self.configuration
    }
}

impl Default for ProgrammingModel {
    fn default() -> Self {
        Self::builder().build()
    }
}

impl fmt::Debug for ProgrammingModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProgrammingModel")
            .field(
                "factories",
                &self.factories.iter().map(|x| x.name()).collect::<Vec<_>>(),
            )
            .field(
                "post_processors",
                &self.post_processors.iter().map(|x| x.name()).collect::<Vec<_>>(),
            )
            .field(
                "validators",
                &self.validators.iter().map(|x| x.name()).collect::<Vec<_>>(),
            )
            .finish_non_exhaustive()
    }
}

/// Builds a [`ProgrammingModel`] from the standard registrations plus custom ones
#[derive(Default)]
pub struct ProgrammingModelBuilder {
    configuration: ConfigurationProperties,
    prepended: Vec<Arc<dyn FacetFactory>>,
    appended: Vec<Arc<dyn FacetFactory>>,
    excluded: Vec<&'static str>,
    post_processors: Vec<Arc<dyn PostProcessor>>,
    validators: Vec<Arc<dyn MetaModelValidator>>,
}

impl ProgrammingModelBuilder {
    /// Configuration passed to configuration-aware factories
    #[must_use]
    pub fn configuration(mut self, configuration: ConfigurationProperties) -> Self {
        self.configuration = configuration;
        self
    }

    /// Registers `factory` ahead of the standard factories of its stage
    #[must_use]
    pub fn prepend_factory(mut self, factory: impl FacetFactory + 'static) -> Self {
        self.prepended.push(Arc::new(factory));
        self
    }

    /// Registers `factory` after the standard factories of its stage
    #[must_use]
    pub fn add_factory(mut self, factory: impl FacetFactory + 'static) -> Self {
        self.appended.push(Arc::new(factory));
        self
    }

    /// Drops the standard factory called `name`
    #[must_use]
    pub fn without_factory(mut self, name: &'static str) -> Self {
        self.excluded.push(name);
        self
    }

    /// Registers an additional post-processor
    #[must_use]
    pub fn add_post_processor(mut self, processor: impl PostProcessor + 'static) -> Self {
        self.post_processors.push(Arc::new(processor));
        self
    }

    /// Registers an additional validator
    #[must_use]
    pub fn add_validator(mut self, validator: impl MetaModelValidator + 'static) -> Self {
        self.validators.push(Arc::new(validator));
        self
    }

    /// Finishes the model
    #[must_use]
    pub fn build(self) -> ProgrammingModel {
        let excluded = self.excluded;
        let standard = standard_factories(&self.configuration)
            .into_iter()
            .filter(|factory| !excluded.contains(&factory.name()));
        let factories = self
            .prepended
            .into_iter()
            .chain(standard)
            .chain(self.appended)
            .collect();

        let mut post_processors = postprocess::standard_post_processors();
        post_processors.extend(self.post_processors);
        // stable: equal priorities keep registration order
        post_processors.sort_by_key(|p| std::cmp::Reverse(p.priority()));

        let mut validators = validation::standard_validators();
        validators.extend(self.validators);
        validators.sort_by_key(|v| std::cmp::Reverse(v.priority()));

        ProgrammingModel {
            factories,
            post_processors,
            validators,
            configuration: self.configuration,
        }
    }
}
