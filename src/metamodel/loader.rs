//! The specification loader: the process-wide cache of [`ObjectSpecification`]s with an
//! explicit lifecycle.
//!
//! # Lifecycle
//!
//! 1. **Construct on demand** - [`SpecificationLoader::load_specification`] builds a class
//!    the first time it is requested, together with its supertypes (before) and the classes
//!    its members reference (after). [`SpecificationLoader::introspect`] fans a list of
//!    classes out over the rayon pool.
//! 2. **Barrier** - [`SpecificationLoader::complete_introspection`] runs the post-processors
//!    and the validators over the complete, stable set of specifications and seals every
//!    facet holder. Specifications loaded afterwards are post-processed and sealed on their
//!    own before they are published.
//! 3. **Teardown** - [`SpecificationLoader::teardown`] drops the cache; further loads fail
//!    with [`Error::LoaderShutdown`].
//!
//! # Concurrency
//!
//! Every class name maps to one [`SpecCell`] holding a construction mutex and a write-once
//! publication slot. The first thread to take the mutex constructs the class; threads that
//! lose the race block on the mutex and receive the published instance. No lock is held
//! while supertypes are loaded, and member references never recurse into construction:
//! they are weak [`SpecificationRef`] handles to the cell, so a class referencing itself
//! (or two classes referencing each other) completes without re-entrance. Constructions
//! and the barrier pass exclude each other, so a class published concurrently with
//! [`SpecificationLoader::complete_introspection`] is either part of the pass or
//! post-processed as a late load.
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use facetmodel::prelude::*;
//!
//! let repository: MemoryClassRepository = [
//!     ClassBuilder::new("Node")
//!         .method(MethodBuilder::new("getParent").returns(TypeRef::class("Node")))
//!         .method(MethodBuilder::new("getChildren").returns(TypeRef::collection("Node")))
//!         .build()?,
//! ]
//! .into_iter()
//! .collect();
//!
//! let loader = SpecificationLoader::new(
//!     ProgrammingModel::default(),
//!     Arc::new(repository),
//!     MetaModelConfig::default(),
//! );
//! let node = loader.load_specification("Node")?;
//! let children = node.member("children").unwrap();
//! assert!(Arc::ptr_eq(&children.type_specification().unwrap(), &node));
//!
//! let report = loader.complete_introspection()?;
//! assert!(report.is_valid());
//! assert!(node.is_sealed());
//! # Ok::<(), facetmodel::Error>(())
//! ```

use std::{
    collections::{HashSet, VecDeque},
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Arc, Mutex, OnceLock, RwLock,
    },
};

use crossbeam_skiplist::SkipMap;
use dashmap::DashMap;
use rayon::prelude::*;
use tracing::{debug, info, trace};

use crate::{
    metamodel::{
        config::{IntrospectionPolicy, MetaModelConfig},
        postprocess::PostProcessContext,
        programming::ProgrammingModel,
        reflect::{ClassDescriptorRc, ClassRepository},
        spec::{
            Introspector, ObjectSpecification, ObjectSpecificationRc, SpecificationRef,
            SpecificationResolver,
        },
        validation::{ValidationEngine, ValidationReport},
    },
    Error, Result,
};

/// Cache slot of one class: construction lock plus publication slot
pub(crate) struct SpecCell {
    construction: Mutex<()>,
    published: OnceLock<ObjectSpecificationRc>,
}

impl SpecCell {
    fn new() -> Self {
        SpecCell {
            construction: Mutex::new(()),
            published: OnceLock::new(),
        }
    }

    /// The published specification, if construction has completed
    pub(crate) fn published(&self) -> Option<ObjectSpecificationRc> {
        self.published.get().cloned()
    }
}

/// Builds, caches and post-processes object specifications.
///
/// One loader is one independent metamodel; tests create as many as they need.
pub struct SpecificationLoader {
    model: ProgrammingModel,
    repository: Arc<dyn ClassRepository>,
    config: MetaModelConfig,
    cells: DashMap<String, Arc<SpecCell>>,
    index: SkipMap<String, ObjectSpecificationRc>,
    // constructions hold it shared, the barrier pass exclusively
    barrier: RwLock<()>,
    introspection_complete: AtomicBool,
    shutdown: AtomicBool,
    constructions: AtomicUsize,
}

impl SpecificationLoader {
    /// Creates an empty loader
    #[must_use]
    pub fn new(
        model: ProgrammingModel,
        repository: Arc<dyn ClassRepository>,
        config: MetaModelConfig,
    ) -> Self {
        SpecificationLoader {
            model,
            repository,
            config,
            cells: DashMap::new(),
            index: SkipMap::new(),
            barrier: RwLock::new(()),
            introspection_complete: AtomicBool::new(false),
            shutdown: AtomicBool::new(false),
            constructions: AtomicUsize::new(0),
        }
    }

    /// The programming model used for construction
    #[must_use]
    pub fn model(&self) -> &ProgrammingModel {
        &self.model
    }

    /// The loader configuration
    #[must_use]
    pub fn config(&self) -> &MetaModelConfig {
        &self.config
    }

    fn ensure_running(&self) -> Result<()> {
        if self.shutdown.load(Ordering::Acquire) {
            return Err(Error::LoaderShutdown);
        }
        Ok(())
    }

    /// Returns the specification of `name`, constructing it if necessary.
    ///
    /// Supertypes are loaded first; classes referenced by the new specification's members
    /// are loaded after it has been published.
    ///
    /// # Errors
    /// - [`Error::ClassNotFound`] if the repository does not know `name` (or, with
    ///   [`IntrospectionPolicy::Strict`], a class it references)
    /// - [`Error::CyclicSupertype`] if `name` is its own transitive supertype
    /// - construction errors of `name` or of any class loaded on its behalf
    /// - [`Error::LoaderShutdown`] after [`SpecificationLoader::teardown`]
    pub fn load_specification(&self, name: &str) -> Result<ObjectSpecificationRc> {
        self.ensure_running()?;
        let spec = self.ensure_loaded(name)?;
        self.load_referenced(&spec)?;
        Ok(spec)
    }

    /// The published specification of `name`, without loading anything
    #[must_use]
    pub fn specification(&self, name: &str) -> Option<ObjectSpecificationRc> {
        self.index.get(name).map(|entry| entry.value().clone())
    }

    /// A weak handle to the (possibly not yet constructed) specification of `name`
    #[must_use]
    pub fn reference(&self, name: &str) -> SpecificationRef {
        SpecificationRef::new(name, &self.cell(name))
    }

    /// Loads every class in `names`; on the rayon pool if parallel introspection is enabled
    ///
    /// # Errors
    /// Returns the first error in `names` order.
    pub fn introspect<S>(&self, names: &[S]) -> Result<()>
    where
        S: AsRef<str> + Sync,
    {
        self.ensure_running()?;
        let results: Vec<Result<()>> = if self.config.parallel_introspection {
            names
                .par_iter()
                .map(|name| self.load_specification(name.as_ref()).map(|_| ()))
                .collect()
        } else {
            names
                .iter()
                .map(|name| self.load_specification(name.as_ref()).map(|_| ()))
                .collect()
        };

        for result in results {
            result?;
        }
        Ok(())
    }

    /// Loads every class the repository knows
    ///
    /// # Errors
    /// See [`SpecificationLoader::introspect`].
    pub fn introspect_all(&self) -> Result<()> {
        self.introspect(&self.repository.class_names())
    }

    /// Every published specification, sorted by class name
    #[must_use]
    pub fn all_specifications(&self) -> Vec<ObjectSpecificationRc> {
        self.index.iter().map(|entry| entry.value().clone()).collect()
    }

    /// Number of published specifications
    #[must_use]
    pub fn len(&self) -> usize {
        self.index.len()
    }

    /// Returns true if nothing has been published
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.index.is_empty()
    }

    /// Number of times the construction pipeline has run to completion
    #[must_use]
    pub fn construction_count(&self) -> usize {
        self.constructions.load(Ordering::Acquire)
    }

    /// Returns true once [`SpecificationLoader::complete_introspection`] has run
    #[must_use]
    pub fn is_introspection_complete(&self) -> bool {
        self.introspection_complete.load(Ordering::Acquire)
    }

    /// The introspection barrier: post-processes, validates and seals the metamodel.
    ///
    /// Calling it again re-runs validation only.
    ///
    /// # Errors
    /// - [`Error::MetaModelInvalid`] if validation failed and the deployment treats
    ///   failures as fatal
    /// - the first post-processor error
    /// - [`Error::LoaderShutdown`] after [`SpecificationLoader::teardown`]
    pub fn complete_introspection(&self) -> Result<ValidationReport> {
        self.ensure_running()?;
        let barrier = write_lock!(self.barrier);
        let specs = self.all_specifications();

        if !self.is_introspection_complete() {
            let ctx = PostProcessContext::new(&specs, &self.model, &self.config, self);
            for processor in self.model.post_processors() {
                let results: Vec<Result<()>> = specs
                    .par_iter()
                    .map(|spec| processor.post_process(spec, &ctx))
                    .collect();

                for result in results {
                    result?;
                }
                debug!(processor = processor.name(), "post-processed");
            }

            specs.par_iter().for_each(|spec| spec.seal());
            self.introspection_complete.store(true, Ordering::Release);
        }
        drop(barrier);

        let report = if self.config.enable_validation {
            ValidationEngine::new(self.model.validators(), &self.config).validate(&specs)
        } else {
            ValidationReport::default()
        };

        info!(
            specifications = specs.len(),
            constructions = self.construction_count(),
            failures = report.failures().len(),
            "introspection complete"
        );
        report.into_result(&self.config)
    }

    /// Drops every cached specification; later loads fail with [`Error::LoaderShutdown`].
    ///
    /// Specifications still held by callers stay usable, but their references to other
    /// specifications no longer resolve.
    pub fn teardown(&self) {
        self.shutdown.store(true, Ordering::Release);
        self.index.clear();
        self.cells.clear();
        debug!("specification loader torn down");
    }

    fn find_class(&self, name: &str) -> Result<ClassDescriptorRc> {
        self.repository
            .find_class(name)
            .ok_or_else(|| Error::ClassNotFound(name.to_string()))
    }

    fn cell(&self, name: &str) -> Arc<SpecCell> {
        self.cells
            .entry(name.to_string())
            .or_insert_with(|| Arc::new(SpecCell::new()))
            .clone()
    }

    /// Supertype names of `class` known to the repository; unknown ones are skipped unless
    /// the policy is strict
    fn supertypes_of(&self, class: &ClassDescriptorRc) -> Result<Vec<ClassDescriptorRc>> {
        let mut supertypes = Vec::new();
        for name in class.superclass.iter().chain(class.interfaces.iter()) {
            match self.repository.find_class(name) {
                Some(supertype) => supertypes.push(supertype),
                None if self.config.introspection_policy == IntrospectionPolicy::Strict => {
                    return Err(Error::ClassNotFound(name.clone()));
                }
                None => trace!(class = %class.name, supertype = %name, "unknown supertype skipped"),
            }
        }
        Ok(supertypes)
    }

    /// Fails if `class` is reachable from its own supertypes
    fn check_supertype_cycle(&self, class: &ClassDescriptorRc) -> Result<()> {
        let mut visited: HashSet<String> = HashSet::new();
        let mut pending: Vec<(ClassDescriptorRc, Vec<String>)> =
            vec![(class.clone(), vec![class.name.clone()])];

        while let Some((current, path)) = pending.pop() {
            for supertype in current.superclass.iter().chain(current.interfaces.iter()) {
                if *supertype == class.name {
                    return Err(Error::CyclicSupertype(format!(
                        "{} -> {}",
                        path.join(" -> "),
                        supertype
                    )));
                }
                if !visited.insert(supertype.clone()) {
                    continue;
                }
                if let Some(next) = self.repository.find_class(supertype) {
                    let mut next_path = path.clone();
                    next_path.push(supertype.clone());
                    pending.push((next, next_path));
                }
            }
        }
        Ok(())
    }

    fn ensure_loaded(&self, name: &str) -> Result<ObjectSpecificationRc> {
        if let Some(published) = self.cells.get(name).and_then(|cell| cell.published()) {
            return Ok(published);
        }

        let class = self.find_class(name)?;
        self.check_supertype_cycle(&class)?;

        let mut introspector = Introspector::new(&self.model, &class, self);
        let supertypes = self.supertypes_of(&class)?;
        for supertype in &supertypes {
            self.ensure_running()?;
            let spec = self.ensure_loaded(&supertype.name)?;
            introspector = if class.superclass.as_ref() == Some(&supertype.name) {
                introspector.with_superclass(spec)
            } else {
                introspector.with_interface(spec)
            };
        }

        let cell = self.cell(name);
        let _guard = lock!(cell.construction);
        let _barrier = read_lock!(self.barrier);
        if let Some(published) = cell.published() {
            trace!(class = name, "construction race lost");
            return Ok(published);
        }

        let spec = Arc::new(introspector.introspect()?);
        self.constructions.fetch_add(1, Ordering::AcqRel);

        if self.is_introspection_complete() {
            self.post_process_late(&spec)?;
        }

        let published = cell.published.get_or_init(|| spec).clone();
        self.index.insert(name.to_string(), published.clone());
        debug!(class = name, "published");
        Ok(published)
    }

    /// Post-processes and seals a specification loaded after the barrier
    fn post_process_late(&self, spec: &ObjectSpecificationRc) -> Result<()> {
        let mut specs = self.all_specifications();
        specs.push(spec.clone());
        let ctx = PostProcessContext::new(&specs, &self.model, &self.config, self);
        for processor in self.model.post_processors() {
            processor.post_process(spec, &ctx)?;
        }
        spec.seal();
        Ok(())
    }

    /// Loads the classes referenced by `spec`'s members, transitively
    fn load_referenced(&self, spec: &ObjectSpecification) -> Result<()> {
        let mut seen: HashSet<String> = HashSet::new();
        seen.insert(spec.name().to_string());
        let mut pending: VecDeque<String> = spec.referenced_classes().iter().cloned().collect();

        while let Some(name) = pending.pop_front() {
            if !seen.insert(name.clone()) {
                continue;
            }
            self.ensure_running()?;

            if self.repository.find_class(&name).is_none() {
                if self.config.introspection_policy == IntrospectionPolicy::Strict {
                    return Err(Error::ClassNotFound(name));
                }
                trace!(class = %spec.name(), referenced = %name, "unknown class left unresolved");
                continue;
            }

            let referenced = self.ensure_loaded(&name)?;
            pending.extend(
                referenced
                    .referenced_classes()
                    .iter()
                    .filter(|r| !seen.contains(*r))
                    .cloned(),
            );
        }
        Ok(())
    }
}

impl SpecificationResolver for SpecificationLoader {
    fn reference(&self, name: &str) -> SpecificationRef {
        SpecificationLoader::reference(self, name)
    }
}

#[cfg(test)]
mod tests {
    use std::thread;

    use super::*;
    use crate::metamodel::reflect::{
        Annotation, ClassBuilder, MemoryClassRepository, MethodBuilder, TypeRef,
    };

    fn loader(classes: Vec<ClassBuilder>, config: MetaModelConfig) -> SpecificationLoader {
        let repository: MemoryClassRepository =
            classes.into_iter().map(|c| c.build().unwrap()).collect();
        SpecificationLoader::new(ProgrammingModel::default(), Arc::new(repository), config)
    }

    #[test]
    fn test_identity_and_lookup() {
        let loader = loader(
            vec![ClassBuilder::new("Customer")
                .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))],
            MetaModelConfig::minimal(),
        );

        assert!(loader.specification("Customer").is_none());
        let first = loader.load_specification("Customer").unwrap();
        let second = loader.load_specification("Customer").unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert!(Arc::ptr_eq(&first, &loader.specification("Customer").unwrap()));
        assert_eq!(loader.construction_count(), 1);

        assert!(matches!(
            loader.load_specification("Missing"),
            Err(Error::ClassNotFound(name)) if name == "Missing"
        ));
    }

    #[test]
    fn test_supertypes_load_first() {
        let loader = loader(
            vec![
                ClassBuilder::new("Party")
                    .method(MethodBuilder::new("getName").returns(TypeRef::value("String"))),
                ClassBuilder::new("Customer").extends("Party"),
            ],
            MetaModelConfig::minimal(),
        );

        let customer = loader.load_specification("Customer").unwrap();
        let party = loader.specification("Party").unwrap();
        assert!(Arc::ptr_eq(&customer.superclass().unwrap(), &party));
        assert!(customer.member("name").is_some());
        assert_eq!(loader.construction_count(), 2);
    }

    #[test]
    fn test_cyclic_supertypes() {
        let loader = loader(
            vec![
                ClassBuilder::new("A").extends("B"),
                ClassBuilder::new("B").extends("C"),
                ClassBuilder::new("C").extends("A"),
            ],
            MetaModelConfig::minimal(),
        );

        let err = loader.load_specification("A").unwrap_err();
        assert!(matches!(err, Error::CyclicSupertype(chain) if chain == "A -> B -> C -> A"));
        assert_eq!(loader.construction_count(), 0);
        assert!(loader.is_empty());
    }

    #[test]
    fn test_references_are_loaded_after_publication() {
        let loader = loader(
            vec![
                ClassBuilder::new("Order")
                    .method(MethodBuilder::new("getCustomer").returns(TypeRef::class("Customer")))
                    .method(MethodBuilder::new("getLines").returns(TypeRef::collection("OrderLine"))),
                ClassBuilder::new("Customer")
                    .method(MethodBuilder::new("getOrders").returns(TypeRef::collection("Order"))),
                ClassBuilder::new("OrderLine")
                    .method(MethodBuilder::new("getOrder").returns(TypeRef::class("Order"))),
            ],
            MetaModelConfig::minimal(),
        );

        let order = loader.load_specification("Order").unwrap();
        assert_eq!(loader.len(), 3);
        assert_eq!(loader.construction_count(), 3);

        let customer = order.member("customer").unwrap().type_specification().unwrap();
        let back = customer.member("orders").unwrap().type_specification().unwrap();
        assert!(Arc::ptr_eq(&back, &order));
    }

    #[test]
    fn test_unknown_references_by_policy() {
        let classes = || {
            vec![ClassBuilder::new("Invoice")
                .method(MethodBuilder::new("getPayer").returns(TypeRef::class("ExternalParty")))]
        };

        let lenient = loader(classes(), MetaModelConfig::minimal());
        let invoice = lenient.load_specification("Invoice").unwrap();
        let payer = invoice.member("payer").unwrap();
        assert_eq!(payer.type_name(), Some("ExternalParty"));
        assert!(payer.type_specification().is_none());

        let strict = loader(
            classes(),
            MetaModelConfig {
                enable_validation: false,
                ..MetaModelConfig::strict()
            },
        );
        assert!(matches!(
            strict.load_specification("Invoice"),
            Err(Error::ClassNotFound(name)) if name == "ExternalParty"
        ));
    }

    #[test]
    fn test_concurrent_first_requests() {
        let loader = Arc::new(loader(
            vec![ClassBuilder::new("Customer")
                .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))],
            MetaModelConfig::minimal(),
        ));

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let loader = loader.clone();
                thread::spawn(move || loader.load_specification("Customer").unwrap())
            })
            .collect();
        let specs: Vec<ObjectSpecificationRc> =
            handles.into_iter().map(|h| h.join().unwrap()).collect();

        assert_eq!(loader.construction_count(), 1);
        assert!(specs.iter().all(|s| Arc::ptr_eq(s, &specs[0])));
    }

    #[test]
    fn test_barrier_seals_and_late_loads() {
        let loader = loader(
            vec![
                ClassBuilder::new("Customer")
                    .annotate(Annotation::new("Immutable"))
                    .method(MethodBuilder::new("getName").returns(TypeRef::value("String"))),
                ClassBuilder::new("Product")
                    .annotate(Annotation::new("Immutable"))
                    .method(MethodBuilder::new("getCode").returns(TypeRef::value("String"))),
            ],
            MetaModelConfig::minimal(),
        );

        let customer = loader.load_specification("Customer").unwrap();
        assert!(!customer.is_sealed());
        loader.complete_introspection().unwrap();
        assert!(loader.is_introspection_complete());
        assert!(customer.is_sealed());

        let product = loader.load_specification("Product").unwrap();
        assert!(product.is_sealed());
        assert!(product
            .effective_facet::<dyn crate::metamodel::facets::DisabledFacet>("code")
            .is_some());
    }

    #[test]
    fn test_teardown() {
        let loader = loader(
            vec![
                ClassBuilder::new("Party"),
                ClassBuilder::new("Customer").extends("Party"),
            ],
            MetaModelConfig::minimal(),
        );
        let customer = loader.load_specification("Customer").unwrap();
        loader.teardown();

        assert!(loader.is_empty());
        assert!(customer.superclass().is_none());
        assert_eq!(customer.superclass_name(), Some("Party"));
        assert!(matches!(
            loader.load_specification("Customer"),
            Err(Error::LoaderShutdown)
        ));
        assert!(matches!(
            loader.complete_introspection(),
            Err(Error::LoaderShutdown)
        ));
    }

    #[test]
    fn test_parallel_introspect() {
        let loader = loader(
            (0..16)
                .map(|i| {
                    ClassBuilder::new(format!("Type{i}"))
                        .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
                })
                .collect(),
            MetaModelConfig::default(),
        );
        loader.introspect_all().unwrap();
        assert_eq!(loader.len(), 16);
        assert_eq!(loader.construction_count(), 16);

        let names: Vec<String> = loader
            .all_specifications()
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        let mut sorted = names.clone();
        sorted.sort();
        assert_eq!(names, sorted);
    }
}
