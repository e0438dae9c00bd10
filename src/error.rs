use thiserror::Error;

use crate::metamodel::{identifier::FeatureIdentifier, validation::ValidationFailure};

macro_rules! construction_error {
    // Single string version
    ($identifier:expr, $msg:expr) => {
        crate::Error::Construction {
            identifier: $identifier.clone(),
            message: $msg.to_string(),
            file: file!(),
            line: line!(),
        }
    };

    // Format string with arguments version
    ($identifier:expr, $fmt:expr, $($arg:tt)*) => {
        crate::Error::Construction {
            identifier: $identifier.clone(),
            message: format!($fmt, $($arg)*),
            file: file!(),
            line: line!(),
        }
    };
}

/// The generic Error type, which provides coverage for all errors this library can potentially
/// return.
///
/// # Error Categories
///
/// ## Fatal construction errors
/// - [`Error::Construction`] - A class is structurally inconsistent
/// - [`Error::AmbiguousMember`] - Two members share one identifier
/// - [`Error::FacetFactory`] - A facet factory failed while processing a feature
/// - [`Error::CyclicSupertype`] - A class is its own transitive supertype
/// - [`Error::ClassNotFound`] - A requested class is unknown to the class repository
///
/// ## Lifecycle errors
/// - [`Error::MetaModelSealed`] - Attempted to mutate a facet holder after publication
/// - [`Error::LoaderShutdown`] - The loader was torn down
///
/// ## Validation
/// - [`Error::MetaModelInvalid`] - Aggregate of all validation failures
///
/// ## Domain methods
/// - [`Error::Invocation`] - A support or action method could not be invoked
///
/// Interaction outcomes (hidden, disabled, invalid) are never errors; they are reported as
/// reason strings by the corresponding facets.
#[derive(Error, Debug)]
pub enum Error {
    /// A class could not be turned into a specification.
    ///
    /// Includes the source location where the inconsistency was detected.
    #[error("Construction of {identifier} failed - {file}:{line}: {message}")]
    Construction {
        /// The feature whose construction failed
        identifier: FeatureIdentifier,
        /// Description of the inconsistency
        message: String,
        /// The source file in which this error occured
        file: &'static str,
        /// The source line in which this error occured
        line: u32,
    },

    /// Two members of one class resolve to the same identifier (e.g. an overloaded action).
    #[error("Ambiguous member {identifier}: {reason}")]
    AmbiguousMember {
        /// The conflicting identifier
        identifier: FeatureIdentifier,
        /// Why the members could not be told apart
        reason: String,
    },

    /// A facet factory returned an error; construction of the class is aborted.
    #[error("Facet factory '{factory}' failed on {identifier}: {source}")]
    FacetFactory {
        /// Name of the failing factory
        factory: &'static str,
        /// The feature being processed
        identifier: FeatureIdentifier,
        /// The underlying failure
        #[source]
        source: Box<Error>,
    },

    /// The supertype chain of a class loops back onto itself.
    #[error("Cyclic supertype chain: {0}")]
    CyclicSupertype(String),

    /// The class repository does not know the requested class.
    #[error("Class not found - {0}")]
    ClassNotFound(String),

    /// A facet holder was mutated after the owning specification was sealed.
    #[error("Facet holder {0} is sealed")]
    MetaModelSealed(FeatureIdentifier),

    /// The specification loader was torn down.
    #[error("The specification loader has been shut down")]
    LoaderShutdown,

    /// The metamodel validator reported failures.
    #[error("Metamodel validation failed with {} failure(s)", failures.len())]
    MetaModelInvalid {
        /// Every failure found, in validator order
        failures: Vec<ValidationFailure>,
    },

    /// Invoking a domain method failed.
    #[error("Invocation of {identifier} failed: {message}")]
    Invocation {
        /// The invoked feature
        identifier: FeatureIdentifier,
        /// Failure reported by the invoker
        message: String,
    },
}
