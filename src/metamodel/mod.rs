//! The metamodel construction engine.
//!
//! Modules are listed leaf first: reflection input and identifiers, facets and their
//! holders, the factories that contribute facets, the programming model registering them,
//! specifications and their construction, and finally the loader with the post-processing
//! and validation passes it runs at the introspection barrier.

pub mod config;
pub mod facets;
pub mod factory;
pub mod identifier;
pub mod loader;
pub mod postprocess;
pub mod programming;
pub mod reflect;
pub mod spec;
pub mod validation;
