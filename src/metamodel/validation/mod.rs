//! Metamodel validation.
//!
//! Validators walk the complete set of specifications read-only after post-processing and
//! record [`ValidationFailure`]s; they never mutate facets and never stop at the first
//! problem. The [`ValidationEngine`] runs every applicable validator (in parallel, results
//! kept in priority order) and returns a [`ValidationReport`]. Whether failures abort
//! bootstrap is decided by the deployment type of the [`MetaModelConfig`]:
//!
//! - [`DeploymentType::Production`](crate::metamodel::config::DeploymentType::Production):
//!   any failure becomes one aggregate [`Error::MetaModelInvalid`]
//! - [`DeploymentType::Prototyping`](crate::metamodel::config::DeploymentType::Prototyping):
//!   failures are logged with `tracing::warn!` and bootstrap continues
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use facetmodel::prelude::*;
//!
//! let repository: MemoryClassRepository = [ClassBuilder::new("Customer")
//!     .annotate(Annotation::new("PersistenceCapable").with("identityType", "application"))
//!     .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
//!     .build()?]
//! .into_iter()
//! .collect();
//!
//! let loader = SpecificationLoader::new(
//!     ProgrammingModel::default(),
//!     Arc::new(repository),
//!     MetaModelConfig::prototyping(),
//! );
//! loader.introspect_all()?;
//!
//! // prototyping: failures are reported, not fatal
//! let report = loader.complete_introspection()?;
//! assert_eq!(report.failures().len(), 1);
//! assert_eq!(report.failures()[0].validator(), "EntityIdentityValidator");
//! # Ok::<(), facetmodel::Error>(())
//! ```

mod validators;

use std::{fmt, sync::Arc};

use rayon::prelude::*;
use tracing::{debug, warn};

pub use validators::{
    ChoicesConflictValidator, EntityIdentityValidator, MemberOrderSyntaxValidator,
    MixinShapeValidator, OrphanedSupportMethodsValidator, SupertypeDepthValidator,
    TitleRequiredValidator,
};

use crate::{
    metamodel::{
        config::MetaModelConfig, identifier::FeatureIdentifier, spec::ObjectSpecificationRc,
    },
    Error, Result,
};

/// A read-only check over the complete metamodel
pub trait MetaModelValidator: Send + Sync {
    /// Name used in failure reports
    fn name(&self) -> &'static str;

    /// Higher priorities run (and report) first
    fn priority(&self) -> u32 {
        0
    }

    /// Returns true if the validator applies under the given configuration
    fn should_run(&self, _ctx: &ValidationContext<'_>) -> bool {
        true
    }

    /// Records every problem found in `failures`
    fn validate(&self, ctx: &ValidationContext<'_>, failures: &mut ValidationFailures);
}

/// The metamodel as seen by the validators
pub struct ValidationContext<'a> {
    specs: &'a [ObjectSpecificationRc],
    config: &'a MetaModelConfig,
}

impl<'a> ValidationContext<'a> {
    /// Creates a context over `specs`
    #[must_use]
    pub fn new(specs: &'a [ObjectSpecificationRc], config: &'a MetaModelConfig) -> Self {
        ValidationContext { specs, config }
    }

    /// Every specification, sorted by name
    #[must_use]
    pub fn specifications(&self) -> &'a [ObjectSpecificationRc] {
        self.specs
    }

    /// The validation configuration
    #[must_use]
    pub fn config(&self) -> &'a MetaModelConfig {
        self.config
    }
}

/// One problem found by a validator
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    identifier: FeatureIdentifier,
    validator: &'static str,
    message: String,
}

impl ValidationFailure {
    /// The offending feature
    #[must_use]
    pub fn identifier(&self) -> &FeatureIdentifier {
        &self.identifier
    }

    /// Name of the validator that reported the failure
    #[must_use]
    pub fn validator(&self) -> &'static str {
        self.validator
    }

    /// Human-readable reason
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }
}

impl fmt::Display for ValidationFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {}: {}", self.validator, self.identifier, self.message)
    }
}

/// Failures collected by one validator
#[derive(Debug)]
pub struct ValidationFailures {
    validator: &'static str,
    failures: Vec<ValidationFailure>,
}

impl ValidationFailures {
    /// An empty collection for `validator`
    #[must_use]
    pub fn new(validator: &'static str) -> Self {
        ValidationFailures {
            validator,
            failures: Vec::new(),
        }
    }

    /// Records a failure against `identifier`
    pub fn add(&mut self, identifier: &FeatureIdentifier, message: impl Into<String>) {
        self.failures.push(ValidationFailure {
            identifier: identifier.clone(),
            validator: self.validator,
            message: message.into(),
        });
    }

    /// Number of failures recorded
    #[must_use]
    pub fn len(&self) -> usize {
        self.failures.len()
    }

    /// Returns true if nothing was recorded
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.failures.is_empty()
    }

    /// The recorded failures
    #[must_use]
    pub fn as_slice(&self) -> &[ValidationFailure] {
        &self.failures
    }
}

/// Outcome of a validation run
#[derive(Debug, Clone, Default)]
pub struct ValidationReport {
    failures: Vec<ValidationFailure>,
}

impl ValidationReport {
    /// Returns true if no validator reported a failure
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.failures.is_empty()
    }

    /// Every failure, validators in priority order
    #[must_use]
    pub fn failures(&self) -> &[ValidationFailure] {
        &self.failures
    }

    /// Applies the deployment policy of `config`.
    ///
    /// # Errors
    /// Returns [`Error::MetaModelInvalid`] carrying every failure if the report is not
    /// valid and `config` treats validation failures as fatal.
    pub fn into_result(self, config: &MetaModelConfig) -> Result<Self> {
        if self.is_valid() {
            return Ok(self);
        }
        if config.validation_is_fatal() {
            return Err(Error::MetaModelInvalid {
                failures: self.failures,
            });
        }

        for failure in &self.failures {
            warn!(
                validator = failure.validator(),
                feature = %failure.identifier(),
                "{}",
                failure.message()
            );
        }
        Ok(self)
    }
}

/// Runs a set of validators over a metamodel
pub struct ValidationEngine<'a> {
    validators: &'a [Arc<dyn MetaModelValidator>],
    config: &'a MetaModelConfig,
}

impl<'a> ValidationEngine<'a> {
    /// Creates an engine; `validators` are expected in priority order
    #[must_use]
    pub fn new(validators: &'a [Arc<dyn MetaModelValidator>], config: &'a MetaModelConfig) -> Self {
        ValidationEngine { validators, config }
    }

    /// Validates `specs`
    #[must_use]
    pub fn validate(&self, specs: &[ObjectSpecificationRc]) -> ValidationReport {
        let ctx = ValidationContext::new(specs, self.config);
        let collected: Vec<ValidationFailures> = self
            .validators
            .par_iter()
            .filter(|validator| validator.should_run(&ctx))
            .map(|validator| {
                let mut failures = ValidationFailures::new(validator.name());
                validator.validate(&ctx, &mut failures);
                debug!(validator = validator.name(), failures = failures.len(), "validated");
                failures
            })
            .collect();

        ValidationReport {
            failures: collected.into_iter().flat_map(|f| f.failures).collect(),
        }
    }
}

/// The standard validators in registration order
pub(crate) fn standard_validators() -> Vec<Arc<dyn MetaModelValidator>> {
    vec![
        Arc::new(SupertypeDepthValidator::new()),
        Arc::new(EntityIdentityValidator::new()),
        Arc::new(MixinShapeValidator::new()),
        Arc::new(TitleRequiredValidator::new()),
        Arc::new(MemberOrderSyntaxValidator::new()),
        Arc::new(ChoicesConflictValidator::new()),
        Arc::new(OrphanedSupportMethodsValidator::new()),
    ]
}
