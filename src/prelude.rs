//! # facetmodel Prelude
//!
//! Convenient re-exports of the types needed to describe domain classes, bootstrap a
//! metamodel and query the resulting specifications.

// ================================================================================================
// Core Types and Error Handling
// ================================================================================================

/// The main error type for all facetmodel operations
pub use crate::Error;

/// The result type used throughout facetmodel
pub use crate::Result;

/// Configuration of construction and validation
pub use crate::metamodel::config::{
    ConfigurationProperties, DeploymentType, IntrospectionPolicy, MetaModelConfig,
    CONFIG_PROPERTIES_EDITING,
};

// ================================================================================================
// Reflection Input
// ================================================================================================

/// Raw class descriptions and their repository
pub use crate::metamodel::reflect::{
    Annotated, Annotation, AnnotationValue, ClassBuilder, ClassDescriptor, ClassDescriptorRc,
    ClassRepository, MemoryClassRepository, MethodBuilder, MethodDescriptor, MethodDescriptorRc,
    MethodInvoker, ParameterDescriptor, TypeRef, Value,
};

/// Identity of classes, members and parameters
pub use crate::metamodel::identifier::{FeatureIdentifier, FeatureKind, FeatureKinds};

// ================================================================================================
// Bootstrap
// ================================================================================================

/// The specification cache and its lifecycle
pub use crate::metamodel::loader::SpecificationLoader;

/// Registry of factories, post-processors and validators
pub use crate::metamodel::programming::{ProgrammingModel, ProgrammingModelBuilder};

/// Extension points of the pipeline
pub use crate::metamodel::{
    factory::{
        ClassContext, FacetFactory, MethodContext, MethodRemover, ParameterContext,
        ProcessingStage,
    },
    postprocess::{PostProcessContext, PostProcessor},
    validation::{
        MetaModelValidator, ValidationContext, ValidationFailure, ValidationFailures,
        ValidationReport,
    },
};

// ================================================================================================
// Specifications
// ================================================================================================

/// Object specifications and their members
pub use crate::metamodel::spec::{
    ActionParameter, ObjectMember, ObjectMemberRc, ObjectSpecification, ObjectSpecificationRc,
    SpecificationRef,
};

// ================================================================================================
// Facets
// ================================================================================================

/// Facet infrastructure
pub use crate::metamodel::facets::{
    AsFacet, Facet, FacetHolder, FacetType, InteractionContext, Precedence,
};

/// Interaction advisors
pub use crate::metamodel::facets::{DisabledFacet, HiddenFacet, ValidateFacet};

/// Member facets
pub use crate::metamodel::facets::{
    ActionInvocationFacet, ActionSemantics, ActionSemanticsFacet, AutoCompleteFacet,
    ChoicesFacet, CollectionAccessorFacet, Contributed, DefaultedFacet, DescribedAsFacet,
    MandatoryFacet, MaxLengthFacet, MemberOrderFacet, NamedFacet, NotContributedFacet,
    PropertyAccessorFacet, PropertySetterFacet, TypeOfFacet,
};

/// Type-level facets
pub use crate::metamodel::facets::{
    EntityFacet, IconFacet, IdentityStrategy, ImmutableFacet, MixinFacet, TitleFacet, ValueFacet,
};
