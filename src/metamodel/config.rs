//! Configuration for metamodel construction and validation
//!
//! [`MetaModelConfig`] controls how the loader introspects classes and how strictly the
//! validator judges the result. [`ConfigurationProperties`] is the opaque key-value input
//! that configuration-aware facet factories consult (e.g. the default property editing
//! style). Neither is loaded from disk here; both derive `Deserialize` so that the host
//! application can produce them from whatever configuration source it uses.

use std::collections::BTreeMap;

use serde::Deserialize;
use strum::Display;

/// Key consulted for the default editing style of properties (`"true"` / `"false"`).
pub const CONFIG_PROPERTIES_EDITING: &str = "facetmodel.objects.editing";

/// Deployment mode, deciding whether validation failures are fatal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum DeploymentType {
    /// Validation failures abort bootstrap
    Production,
    /// Validation failures are logged but tolerated
    Prototyping,
}

/// How the loader treats referenced classes that the class repository does not know.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntrospectionPolicy {
    /// Unknown member types stay unresolved references
    Lenient,
    /// Every referenced class must be known
    Strict,
}

/// Configuration for metamodel construction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(default)]
#[allow(clippy::struct_excessive_bools)]
pub struct MetaModelConfig {
    /// Decides whether validation failures are fatal
    pub deployment: DeploymentType,

    /// Treatment of unknown referenced classes
    pub introspection_policy: IntrospectionPolicy,

    /// Introspect independent classes on the rayon pool during bootstrap
    pub parallel_introspection: bool,

    /// Run the metamodel validators at the introspection barrier
    pub enable_validation: bool,

    /// Report support methods that matched no member
    pub enable_orphan_validation: bool,

    /// Require every entity to have a title facet
    pub require_entity_titles: bool,

    /// Maximum depth of a supertype chain (default: 64)
    pub max_supertype_depth: usize,
}

impl Default for MetaModelConfig {
    fn default() -> Self {
        Self::production()
    }
}

impl MetaModelConfig {
    /// Production configuration: all validation on and fatal
    #[must_use]
    pub fn production() -> Self {
        Self {
            deployment: DeploymentType::Production,
            introspection_policy: IntrospectionPolicy::Lenient,
            parallel_introspection: true,
            enable_validation: true,
            enable_orphan_validation: true,
            require_entity_titles: false,
            max_supertype_depth: 64,
        }
    }

    /// Prototyping configuration: validation failures are only logged
    #[must_use]
    pub fn prototyping() -> Self {
        Self {
            deployment: DeploymentType::Prototyping,
            ..Self::production()
        }
    }

    /// Strict configuration: every check on, unknown references are fatal
    #[must_use]
    pub fn strict() -> Self {
        Self {
            deployment: DeploymentType::Production,
            introspection_policy: IntrospectionPolicy::Strict,
            parallel_introspection: true,
            enable_validation: true,
            enable_orphan_validation: true,
            require_entity_titles: true,
            max_supertype_depth: 64,
        }
    }

    /// Minimal configuration: single threaded, no validation
    #[must_use]
    pub fn minimal() -> Self {
        Self {
            deployment: DeploymentType::Prototyping,
            introspection_policy: IntrospectionPolicy::Lenient,
            parallel_introspection: false,
            enable_validation: false,
            enable_orphan_validation: false,
            require_entity_titles: false,
            max_supertype_depth: 64,
        }
    }

    /// Returns true if validation failures must abort bootstrap
    #[must_use]
    pub fn validation_is_fatal(&self) -> bool {
        self.deployment == DeploymentType::Production
    }
}

/// Opaque key-value configuration handed to configuration-aware facet factories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct ConfigurationProperties {
    values: BTreeMap<String, String>,
}

impl ConfigurationProperties {
    /// Creates an empty property set
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a property, builder style
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    /// Sets a property
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.values.insert(key.into(), value.into());
    }

    /// Raw string value
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values.get(key).map(String::as_str)
    }

    /// Boolean value; anything other than `true`/`false` (case-insensitive) yields `default`
    #[must_use]
    pub fn get_bool(&self, key: &str, default: bool) -> bool {
        match self.get(key).map(str::trim) {
            Some(v) if v.eq_ignore_ascii_case("true") => true,
            Some(v) if v.eq_ignore_ascii_case("false") => false,
            _ => default,
        }
    }

    /// Integer value, `default` if missing or unparsable
    #[must_use]
    pub fn get_usize(&self, key: &str, default: usize) -> usize {
        self.get(key)
            .and_then(|v| v.trim().parse().ok())
            .unwrap_or(default)
    }

    /// Number of properties
    #[must_use]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Returns true if no property is set
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
