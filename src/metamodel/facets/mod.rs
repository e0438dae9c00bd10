//! Facets: single behavioral capabilities attached to classes and members.
//!
//! A facet kind is a trait (e.g. [`HiddenFacet`], [`DisabledFacet`], [`TitleFacet`]) with one
//! or two semantic methods. Any number of concrete facets may implement a kind; a
//! [`FacetHolder`] keeps at most one active facet per kind, keyed by the [`FacetType`] of the
//! kind's trait object. Downstream crates add new kinds simply by declaring another trait
//! with `Facet + AsFacet` as supertraits; the holder needs no changes.
//!
//! # Key Components
//!
//! - [`Facet`] - behavior shared by every facet (holder back-reference, precedence, derivation)
//! - [`AsFacet`] - upcast from a kind trait object to `dyn Facet`
//! - [`FacetType`] - type-identity key of a facet kind
//! - [`Precedence`] - explicit override rank of a facet
//! - [`FacetHolder`] - the per-feature facet map
//! - [`InteractionContext`] - per-request input to the interaction advisors
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use facetmodel::metamodel::facets::{
//!     DisabledFacet, DisabledFacetWithReason, FacetHolder, InteractionContext, Precedence,
//! };
//! use facetmodel::metamodel::identifier::FeatureIdentifier;
//!
//! let id = FeatureIdentifier::property("Customer", "name");
//! let holder = FacetHolder::new(id.clone());
//! holder.add_facet::<dyn DisabledFacet>(Arc::new(DisabledFacetWithReason::new(
//!     &id,
//!     "Locked",
//!     Precedence::Annotated,
//! )))?;
//!
//! let facet = holder.get_facet::<dyn DisabledFacet>().unwrap();
//! let reason = facet.disabled_reason(&InteractionContext::new())?;
//! assert_eq!(reason.as_deref(), Some("Locked"));
//! # Ok::<(), facetmodel::Error>(())
//! ```

use std::{
    any::{type_name, Any, TypeId},
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
    sync::Arc,
};

use strum::Display;

use crate::metamodel::{identifier::FeatureIdentifier, reflect::Value};

/// Implements [`Facet`] for a concrete facet struct carrying a `base: FacetBase` field.
macro_rules! impl_facet {
    ($($ty:ty),+ $(,)?) => {
        $(
            impl crate::metamodel::facets::Facet for $ty {
                fn base(&self) -> &crate::metamodel::facets::FacetBase {
                    &self.base
                }
            }
        )+
    };
}

mod holder;
mod interaction;
mod member;
mod object;

pub use holder::FacetHolder;
pub use interaction::{
    DisabledFacet, DisabledFacetViaMethod, DisabledFacetWithReason, HiddenFacet,
    HiddenFacetViaMethod, HiddenFacetWithReason, ValidateFacet, ValidateFacetViaMethod,
};
pub use member::{
    ActionInvocationFacet, ActionInvocationFacetViaMethod, ActionSemantics, ActionSemanticsFacet,
    ActionSemanticsFacetImpl, AutoCompleteFacet, AutoCompleteFacetViaMethod, ChoicesFacet,
    ChoicesFacetViaMethod, CollectionAccessorFacet, CollectionAccessorFacetViaMethod,
    CollectionAddToFacet, CollectionRemoveFromFacet, CollectionMutatorFacetViaMethod,
    Contributed, DefaultedFacet, DefaultedFacetViaMethod, DescribedAsFacet, DescribedAsFacetImpl,
    MandatoryFacet, MandatoryFacetImpl, MaxLengthFacet, MaxLengthFacetImpl, MemberOrderFacet,
    MemberOrderFacetImpl, NamedFacet, NamedFacetImpl, NotContributedFacet,
    NotContributedFacetImpl, PropertyAccessorFacet, PropertyAccessorFacetViaMethod,
    PropertyClearFacet, PropertyClearFacetViaMethod, PropertySetterFacet,
    PropertySetterFacetViaMethod, TypeOfFacet, TypeOfFacetImpl,
};
pub use object::{
    CallbackFacet, CallbackFacetViaMethod, Created, CssClassFacet, CssClassFacetImpl,
    EntityFacet, EntityFacetAnnotation, IconFacet, IconFacetViaMethod, IdentityStrategy,
    ImmutableFacet, ImmutableFacetImpl, LifecycleEvent, Loaded, MixinFacet, MixinFacetImpl,
    Persisted, Persisting, Removing, TitleComponent, TitleFacet, TitleFacetViaAnnotations,
    TitleFacetViaMethod, Updated, Updating, ValueFacet, ValueFacetImpl,
};

/// Explicit override rank of a facet.
///
/// When two facets of the same kind are installed on one holder, the newcomer replaces the
/// incumbent iff its precedence is greater than or equal to the incumbent's. Equal ranks
/// therefore fall back to last-writer-wins in pipeline order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Display)]
pub enum Precedence {
    /// A default that anything may replace
    Fallback,
    /// Inferred from naming conventions or derived from another facet
    Inferred,
    /// Contributed by a support method or a configuration default
    Default,
    /// Declared through an annotation
    Annotated,
    /// Explicit override (e.g. configuration overriding an annotation)
    Override,
}

/// Type-identity key of a facet kind.
///
/// Equality and hashing use the [`TypeId`] of the kind's trait object; the name is only
/// used for diagnostics and for deterministic ordering.
#[derive(Clone, Copy)]
pub struct FacetType {
    id: TypeId,
    name: &'static str,
}

impl FacetType {
    /// The key of facet kind `K` (usually a trait object type such as `dyn HiddenFacet`)
    #[must_use]
    pub fn of<K: ?Sized + 'static>() -> Self {
        FacetType {
            id: TypeId::of::<K>(),
            name: short_type_name(type_name::<K>()),
        }
    }

    /// Readable name of the kind, e.g. `HiddenFacet`
    #[must_use]
    pub fn name(&self) -> &'static str {
        self.name
    }

    pub(crate) fn type_id(&self) -> TypeId {
        self.id
    }
}

/// Strips the `dyn` prefix and module path from a type name, keeping generic arguments.
fn short_type_name(full: &'static str) -> &'static str {
    let full = full.strip_prefix("dyn ").unwrap_or(full);
    let base_end = full.find('<').unwrap_or(full.len());
    match full[..base_end].rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}

impl PartialEq for FacetType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for FacetType {}

impl Hash for FacetType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl PartialOrd for FacetType {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for FacetType {
    fn cmp(&self, other: &Self) -> Ordering {
        self.name.cmp(other.name).then_with(|| self.id.cmp(&other.id))
    }
}

impl fmt::Debug for FacetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "FacetType({})", self.name)
    }
}

impl fmt::Display for FacetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)
    }
}

/// State shared by every facet: the owning holder, the precedence and the derivation source.
#[derive(Debug, Clone)]
pub struct FacetBase {
    holder: FeatureIdentifier,
    precedence: Precedence,
    derived_from: Option<FacetType>,
}

impl FacetBase {
    /// A directly contributed facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, precedence: Precedence) -> Self {
        FacetBase {
            holder: holder.clone(),
            precedence,
            derived_from: None,
        }
    }

    /// A facet derived from a facet of kind `source`
    #[must_use]
    pub fn derived(holder: &FeatureIdentifier, source: FacetType) -> Self {
        FacetBase {
            holder: holder.clone(),
            precedence: Precedence::Inferred,
            derived_from: Some(source),
        }
    }
}

/// Behavior shared by every facet.
///
/// Facets are immutable once attached; replacing behavior means installing a new facet of
/// the same kind.
pub trait Facet: fmt::Debug + Send + Sync + 'static {
    /// Shared facet state
    fn base(&self) -> &FacetBase;

    /// Identifier of the owning holder
    fn holder(&self) -> &FeatureIdentifier {
        &self.base().holder
    }

    /// Override rank
    fn precedence(&self) -> Precedence {
        self.base().precedence
    }

    /// Kind of the facet this one was derived from, `None` for directly contributed facets
    fn derived_from(&self) -> Option<FacetType> {
        self.base().derived_from
    }

    /// Returns true if this facet was synthesized from another facet
    fn is_derived(&self) -> bool {
        self.base().derived_from.is_some()
    }
}

/// Upcast from a facet kind trait object to `dyn Facet`.
///
/// Every facet kind trait lists `Facet + AsFacet` as supertraits; the blanket impl below
/// makes every concrete facet satisfy it.
pub trait AsFacet {
    /// Borrow as `dyn Facet`
    fn as_facet(&self) -> &dyn Facet;

    /// Convert a shared pointer into `Arc<dyn Facet>`
    fn into_facet(self: Arc<Self>) -> Arc<dyn Facet>;
}

impl<T: Facet> AsFacet for T {
    fn as_facet(&self) -> &dyn Facet {
        self
    }

    fn into_facet(self: Arc<Self>) -> Arc<dyn Facet> {
        self
    }
}

/// Per-request input of the interaction advisors (hide / disable / validate, choices, ...).
///
/// Carries the target domain object, the acting user and positional argument values
/// (the proposed value for property validation, the argument list for actions).
#[derive(Clone, Copy, Default)]
pub struct InteractionContext<'a> {
    target: Option<&'a dyn Any>,
    user: Option<&'a str>,
    arguments: &'a [Value],
}

impl<'a> InteractionContext<'a> {
    /// A context without target, user or arguments
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the target object
    #[must_use]
    pub fn on(mut self, target: &'a dyn Any) -> Self {
        self.target = Some(target);
        self
    }

    /// Sets the acting user
    #[must_use]
    pub fn as_user(mut self, user: &'a str) -> Self {
        self.user = Some(user);
        self
    }

    /// Sets the arguments / proposed values
    #[must_use]
    pub fn with_arguments(mut self, arguments: &'a [Value]) -> Self {
        self.arguments = arguments;
        self
    }

    /// The target object
    #[must_use]
    pub fn target(&self) -> Option<&'a dyn Any> {
        self.target
    }

    /// The acting user
    #[must_use]
    pub fn user(&self) -> Option<&'a str> {
        self.user
    }

    /// The arguments
    #[must_use]
    pub fn arguments(&self) -> &'a [Value] {
        self.arguments
    }
}

impl fmt::Debug for InteractionContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InteractionContext")
            .field("target", &self.target.is_some())
            .field("user", &self.user)
            .field("arguments", &self.arguments)
            .finish()
    }
}
