// Copyright 2025 Johann Kempter
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.
//
// SPDX-License-Identifier: Apache-2.0

#![doc(html_no_source)]
#![deny(missing_docs)]
#![deny(unsafe_code)]

//! # facetmodel
//!
//! A metamodel construction engine for "naked objects" style domain frameworks.
//!
//! Domain classes are described to the engine as plain reflection data (methods, parameter
//! and return types, annotations). The engine introspects them once at bootstrap and
//! synthesizes an immutable, queryable [`ObjectSpecification`] per class: which properties,
//! collections and actions exist, and how each of them behaves. Behavior is expressed as
//! *facets*, small capability objects contributed by a pipeline of pluggable *facet
//! factories* that read annotations and naming conventions (`getName` / `hideName` /
//! `disableName` / `choices0PlaceOrder` ...). Persistence adapters, UI viewers and security
//! layers consume the specifications; none of them is part of this crate.
//!
//! ## Features
//!
//! - **Type-indexed facet holders** - one active facet per kind with explicit precedence
//! - **Ordered factory pipeline** - discovery, dependent and method-removal stages
//! - **Inheritance by fallback** - facets are looked up through the supertype chain, never
//!   copied
//! - **Concurrent bootstrap** - independent classes are introspected on a rayon pool with
//!   first-request-wins construction per class
//! - **Post-processing and validation** - cross-specification facets and fail-fast
//!   validation behind an explicit introspection barrier
//!
//! ## Quick Start
//!
//! ```rust
//! use std::sync::Arc;
//! use facetmodel::prelude::*;
//!
//! let repository: MemoryClassRepository = [ClassBuilder::new("com.example.Customer")
//!     .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
//!     .method(
//!         MethodBuilder::new("disableName")
//!             .returns(TypeRef::value("String"))
//!             .returning("Name is managed by CRM"),
//!     )
//!     .method(
//!         MethodBuilder::new("placeOrder")
//!             .param("product", TypeRef::class("com.example.Product"))
//!             .returns(TypeRef::class("com.example.Order")),
//!     )
//!     .build()?]
//! .into_iter()
//! .collect();
//!
//! let loader = SpecificationLoader::new(
//!     ProgrammingModel::default(),
//!     Arc::new(repository),
//!     MetaModelConfig::default(),
//! );
//! loader.introspect_all()?;
//! loader.complete_introspection()?;
//!
//! let customer = loader.specification("com.example.Customer").unwrap();
//! assert_eq!(customer.properties().len(), 1);
//! assert_eq!(customer.actions().len(), 1);
//!
//! let disabled = customer.effective_facet::<dyn DisabledFacet>("name").unwrap();
//! assert_eq!(
//!     disabled.disabled_reason(&InteractionContext::new())?.as_deref(),
//!     Some("Name is managed by CRM")
//! );
//! # Ok::<(), facetmodel::Error>(())
//! ```
//!
//! ## Architecture
//!
//! - [`metamodel::reflect`] - the raw class descriptions and the class repository
//! - [`metamodel::facets`] - facet kinds, concrete facets and the facet holder
//! - [`metamodel::factory`] - the facet factories and processing stages
//! - [`metamodel::programming`] - the ordered registry of factories and extensions
//! - [`metamodel::spec`] - object specifications and their construction
//! - [`metamodel::loader`] - the specification cache and its lifecycle
//! - [`metamodel::postprocess`] / [`metamodel::validation`] - the barrier passes
//!
//! [`ObjectSpecification`]: metamodel::spec::ObjectSpecification

#[macro_use]
pub(crate) mod macros;

#[macro_use]
pub(crate) mod error;

/// Shared functionality which is used in unit- and integration-tests
#[cfg(test)]
pub(crate) mod test;

/// Convenient re-exports of the most commonly used types and traits.
///
/// # Example
///
/// ```rust
/// use facetmodel::prelude::*;
///
/// let class = ClassBuilder::new("Customer")
///     .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
///     .build()?;
/// assert_eq!(class.simple_name(), "Customer");
/// # Ok::<(), facetmodel::Error>(())
/// ```
pub mod prelude;

/// The metamodel: reflection input, facets, factories, specifications and their loader
///
/// # Key Components
///
/// - [`metamodel::loader::SpecificationLoader`] - entry point; builds and caches specifications
/// - [`metamodel::programming::ProgrammingModel`] - which factories, post-processors and
///   validators run
/// - [`metamodel::spec::ObjectSpecification`] - the synthesized descriptor of one class
/// - [`metamodel::facets::FacetHolder`] - per-feature facet storage
pub mod metamodel;

/// `facetmodel` Result type
///
/// A type alias for [`std::result::Result<T, Error>`] where the error type is always [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// `facetmodel` Error type
///
/// # Examples
///
/// ```rust
/// use std::sync::Arc;
/// use facetmodel::prelude::*;
///
/// let loader = SpecificationLoader::new(
///     ProgrammingModel::default(),
///     Arc::new(MemoryClassRepository::new()),
///     MetaModelConfig::default(),
/// );
/// match loader.load_specification("Unknown") {
///     Err(Error::ClassNotFound(name)) => assert_eq!(name, "Unknown"),
///     other => panic!("unexpected {other:?}"),
/// }
/// ```
pub use error::Error;
