//! The per-feature facet map.

use std::{
    any::{Any, TypeId},
    collections::HashMap,
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, RwLock,
    },
};

use tracing::trace;

use crate::{
    metamodel::{
        facets::{AsFacet, Facet, FacetType},
        identifier::FeatureIdentifier,
    },
    Error, Result,
};

struct FacetSlot {
    facet_type: FacetType,
    facet: Arc<dyn Facet>,
    /// `Arc<Arc<K>>` for the kind `K` the facet was installed as
    typed: Arc<dyn Any + Send + Sync>,
}

/// Owns at most one active facet per kind for one class, member or parameter.
///
/// Holders are mutated by the facet factory pipeline and the post-processors; once the
/// loader seals the metamodel every further mutation fails with [`Error::MetaModelSealed`].
/// Lookups never fail: absence of a facet is a normal state.
pub struct FacetHolder {
    identifier: FeatureIdentifier,
    facets: RwLock<HashMap<TypeId, FacetSlot>>,
    sealed: AtomicBool,
}

impl FacetHolder {
    /// Creates an empty holder for `identifier`
    #[must_use]
    pub fn new(identifier: FeatureIdentifier) -> Self {
        FacetHolder {
            identifier,
            facets: RwLock::new(HashMap::new()),
            sealed: AtomicBool::new(false),
        }
    }

    /// The feature this holder describes
    #[must_use]
    pub fn identifier(&self) -> &FeatureIdentifier {
        &self.identifier
    }

    /// Installs `facet` as kind `K`.
    ///
    /// An existing facet of the same kind is replaced unless it has a strictly higher
    /// [`Precedence`](crate::metamodel::facets::Precedence) than the newcomer, in which case
    /// the newcomer is discarded. Neither case is an error.
    ///
    /// # Errors
    /// Returns [`Error::MetaModelSealed`] if the holder has been sealed.
    pub fn add_facet<K>(&self, facet: Arc<K>) -> Result<()>
    where
        K: ?Sized + AsFacet + Send + Sync + 'static,
    {
        if self.is_sealed() {
            return Err(Error::MetaModelSealed(self.identifier.clone()));
        }

        let facet_type = FacetType::of::<K>();
        let common = facet.clone().into_facet();

        let mut facets = write_lock!(self.facets);
        if let Some(existing) = facets.get(&facet_type.type_id()) {
            if common.precedence() < existing.facet.precedence() {
                trace!(
                    holder = %self.identifier,
                    kind = %facet_type,
                    kept = %existing.facet.precedence(),
                    discarded = %common.precedence(),
                    "facet not overridable"
                );
                return Ok(());
            }
        }

        facets.insert(
            facet_type.type_id(),
            FacetSlot {
                facet_type,
                facet: common,
                typed: Arc::new(facet),
            },
        );
        Ok(())
    }

    /// The facet installed as kind `K`, if any
    #[must_use]
    pub fn get_facet<K>(&self) -> Option<Arc<K>>
    where
        K: ?Sized + 'static,
    {
        let facets = read_lock!(self.facets);
        facets
            .get(&TypeId::of::<K>())
            .and_then(|slot| slot.typed.downcast_ref::<Arc<K>>().cloned())
    }

    /// Returns true if a facet of kind `K` is installed
    #[must_use]
    pub fn contains_facet<K>(&self) -> bool
    where
        K: ?Sized + 'static,
    {
        read_lock!(self.facets).contains_key(&TypeId::of::<K>())
    }

    /// Returns true if a facet of the given kind is installed
    #[must_use]
    pub fn contains(&self, facet_type: FacetType) -> bool {
        read_lock!(self.facets).contains_key(&facet_type.type_id())
    }

    /// The facet of the given kind, as `dyn Facet`
    #[must_use]
    pub fn facet_by_type(&self, facet_type: FacetType) -> Option<Arc<dyn Facet>> {
        read_lock!(self.facets)
            .get(&facet_type.type_id())
            .map(|slot| slot.facet.clone())
    }

    /// Removes the facet of kind `K`, returning it.
    ///
    /// # Errors
    /// Returns [`Error::MetaModelSealed`] if the holder has been sealed.
    pub fn remove_facet<K>(&self) -> Result<Option<Arc<K>>>
    where
        K: ?Sized + 'static,
    {
        if self.is_sealed() {
            return Err(Error::MetaModelSealed(self.identifier.clone()));
        }

        Ok(write_lock!(self.facets)
            .remove(&TypeId::of::<K>())
            .and_then(|slot| slot.typed.downcast_ref::<Arc<K>>().cloned()))
    }

    /// Kinds of all installed facets, sorted by name
    #[must_use]
    pub fn facet_types(&self) -> Vec<FacetType> {
        let mut types: Vec<FacetType> =
            with_read!(self.facets, |facets: &HashMap<TypeId, FacetSlot>| facets
                .values()
                .map(|slot| slot.facet_type)
                .collect());
        types.sort();
        types
    }

    /// All installed facets, sorted by kind name
    #[must_use]
    pub fn facets(&self) -> Vec<(FacetType, Arc<dyn Facet>)> {
        let mut facets: Vec<(FacetType, Arc<dyn Facet>)> = read_lock!(self.facets)
            .values()
            .map(|slot| (slot.facet_type, slot.facet.clone()))
            .collect();
        facets.sort_by(|a, b| a.0.cmp(&b.0));
        facets
    }

    /// Number of installed facets
    #[must_use]
    pub fn len(&self) -> usize {
        read_lock!(self.facets).len()
    }

    /// Returns true if no facet is installed
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Makes the holder read-only
    pub fn seal(&self) {
        self.sealed.store(true, Ordering::Release);
    }

    /// Returns true once the holder is read-only
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.sealed.load(Ordering::Acquire)
    }
}

impl fmt::Debug for FacetHolder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FacetHolder")
            .field("identifier", &self.identifier)
            .field("facets", &self.facet_types())
            .field("sealed", &self.is_sealed())
            .finish()
    }
}
