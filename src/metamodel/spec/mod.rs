//! Object specifications: the synthesized runtime descriptor of one domain class.
//!
//! An [`ObjectSpecification`] owns the type-level [`FacetHolder`] of its class and the
//! holders of every member the class declares. Inherited behavior is not copied: member and
//! facet lookups that find nothing on the specification itself walk up the supertype chain
//! and then the implemented interfaces, so every facet instance exists exactly once in a
//! class hierarchy.
//!
//! Specifications refer to each other (supertypes, member types, subclasses) through
//! [`SpecificationRef`], a weak handle into the loader's cache. A handle to a class that is
//! still under construction, or that was never loaded, simply does not resolve yet.
//!
//! # Key Components
//!
//! - [`ObjectSpecification`] - the descriptor with its ordered member queries
//! - [`ObjectMember`] / [`ActionParameter`] - members and their parameters
//! - [`SpecificationRef`] - weak, name-carrying handle to another specification
//! - [`order`] - dotted member-order sequence comparison
//!
//! # Examples
//!
//! ```rust
//! use std::sync::Arc;
//! use facetmodel::prelude::*;
//!
//! let repository = MemoryClassRepository::new();
//! repository.register(
//!     ClassBuilder::new("Customer")
//!         .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
//!         .method(MethodBuilder::new("disableName").returns(TypeRef::value("String")).returning("Locked"))
//!         .build()?,
//! );
//!
//! let loader = SpecificationLoader::new(
//!     ProgrammingModel::default(),
//!     Arc::new(repository),
//!     MetaModelConfig::default(),
//! );
//! let customer = loader.load_specification("Customer")?;
//! let disabled = customer.effective_facet::<dyn DisabledFacet>("name").unwrap();
//! assert_eq!(
//!     disabled.disabled_reason(&InteractionContext::new())?.as_deref(),
//!     Some("Locked")
//! );
//! # Ok::<(), facetmodel::Error>(())
//! ```

mod introspector;
mod member;
pub mod order;

use std::{
    any::Any,
    fmt,
    sync::{Arc, Weak},
};

pub(crate) use introspector::Introspector;
pub use member::{ActionParameter, ObjectMember, ObjectMemberRc};

use crate::{
    metamodel::{
        facets::{
            EntityFacet, FacetHolder, MemberOrderFacet, MixinFacet, TitleFacet, ValueFacet,
        },
        identifier::{FeatureIdentifier, FeatureKind},
        loader::SpecCell,
        reflect::{ClassDescriptorRc, MethodDescriptorRc},
    },
    Result,
};

/// A reference to an `ObjectSpecification`
pub type ObjectSpecificationRc = Arc<ObjectSpecification>;

/// Weak, name-carrying handle to a specification owned by the loader's cache
#[derive(Clone)]
pub struct SpecificationRef {
    name: String,
    cell: Weak<SpecCell>,
}

impl SpecificationRef {
    pub(crate) fn new(name: &str, cell: &Arc<SpecCell>) -> Self {
        SpecificationRef {
            name: name.to_string(),
            cell: Arc::downgrade(cell),
        }
    }

    /// Name of the referenced class
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The referenced specification, if it has been published and the loader is alive
    #[must_use]
    pub fn resolve(&self) -> Option<Arc<ObjectSpecification>> {
        self.cell.upgrade().and_then(|cell| cell.published())
    }
}

impl fmt::Debug for SpecificationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpecificationRef")
            .field("name", &self.name)
            .field("resolved", &self.resolve().is_some())
            .finish()
    }
}

/// Hands out [`SpecificationRef`]s during construction without loading anything
pub(crate) trait SpecificationResolver: Send + Sync {
    fn reference(&self, name: &str) -> SpecificationRef;
}

/// The synthesized descriptor of one domain class.
///
/// Facet holders are mutable only until the loader seals the metamodel; afterwards every
/// query is read-only and the specification can be shared freely across threads.
pub struct ObjectSpecification {
    pub(crate) class: ClassDescriptorRc,
    pub(crate) holder: FacetHolder,
    pub(crate) members: Vec<ObjectMemberRc>,
    pub(crate) superclass: Option<SpecificationRef>,
    pub(crate) interfaces: Vec<SpecificationRef>,
    pub(crate) subclasses: boxcar::Vec<SpecificationRef>,
    pub(crate) contributed: boxcar::Vec<ObjectMemberRc>,
    pub(crate) orphaned_methods: Vec<MethodDescriptorRc>,
    pub(crate) referenced_classes: Vec<String>,
}

impl ObjectSpecification {
    /// Type-level identifier
    #[must_use]
    pub fn identifier(&self) -> &FeatureIdentifier {
        self.holder.identifier()
    }

    /// Fully qualified class name
    #[must_use]
    pub fn name(&self) -> &str {
        &self.class.name
    }

    /// Class name without package prefix
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.class.simple_name()
    }

    /// The class descriptor this specification was built from
    #[must_use]
    pub fn class(&self) -> &ClassDescriptorRc {
        &self.class
    }

    /// The type-level holder (own facets only)
    #[must_use]
    pub fn holder(&self) -> &FacetHolder {
        &self.holder
    }

    /// Type-level facet of kind `K`, falling back to the supertype chain and then to the
    /// implemented interfaces
    #[must_use]
    pub fn facet<K>(&self) -> Option<Arc<K>>
    where
        K: ?Sized + 'static,
    {
        if let Some(facet) = self.holder.get_facet::<K>() {
            return Some(facet);
        }
        self.supertypes().find_map(|spec| spec.facet::<K>())
    }

    /// Returns true if a type-level facet of kind `K` is present, own or inherited
    #[must_use]
    pub fn contains_facet<K>(&self) -> bool
    where
        K: ?Sized + 'static,
    {
        self.facet::<K>().is_some()
    }

    /// Effective facet of kind `K` for member `member`: the member's own holder in this
    /// class, then the supertype chain, then interfaces
    #[must_use]
    pub fn effective_facet<K>(&self, member: &str) -> Option<Arc<K>>
    where
        K: ?Sized + 'static,
    {
        if let Some(facet) = self.own_member(member).and_then(|m| m.get_facet::<K>()) {
            return Some(facet);
        }
        self.supertypes()
            .find_map(|spec| spec.effective_facet::<K>(member))
    }

    /// Effective facet of kind `K` for parameter `index` of action `action`
    #[must_use]
    pub fn effective_parameter_facet<K>(&self, action: &str, index: usize) -> Option<Arc<K>>
    where
        K: ?Sized + 'static,
    {
        let own = self
            .own_member(action)
            .and_then(|m| m.parameter(index))
            .and_then(ActionParameter::get_facet::<K>);
        if own.is_some() {
            return own;
        }
        self.supertypes()
            .find_map(|spec| spec.effective_parameter_facet::<K>(action, index))
    }

    /// Members declared by this class itself, including subtype-local holders for
    /// inherited members, in declaration order
    #[must_use]
    pub fn declared_members(&self) -> &[ObjectMemberRc] {
        &self.members
    }

    fn own_member(&self, id: &str) -> Option<&ObjectMemberRc> {
        self.members.iter().find(|m| m.id() == id)
    }

    /// The member called `id`, own or inherited
    #[must_use]
    pub fn member(&self, id: &str) -> Option<ObjectMemberRc> {
        if let Some(member) = self.own_member(id) {
            return Some(member.clone());
        }
        self.supertypes().find_map(|spec| spec.member(id))
    }

    /// The method declaring member `id`; a subtype-local holder defers to its supertype
    #[must_use]
    pub fn member_method(&self, id: &str) -> Option<MethodDescriptorRc> {
        if let Some(method) = self.own_member(id).and_then(|m| m.method()) {
            return Some(method.clone());
        }
        self.supertypes().find_map(|spec| spec.member_method(id))
    }

    /// Every member, own and inherited, in member order.
    ///
    /// A member redeclared by this class replaces the inherited one at the inherited
    /// position. Members without a `MemberOrderFacet` come first in declaration order
    /// (inherited before own), followed by ordered members sorted by sequence.
    #[must_use]
    pub fn members(&self) -> Vec<ObjectMemberRc> {
        let mut merged: Vec<ObjectMemberRc> = Vec::new();
        for spec in self.supertypes() {
            for inherited in spec.members() {
                if !merged.iter().any(|m| m.id() == inherited.id()) {
                    merged.push(inherited);
                }
            }
        }
        for own in &self.members {
            match merged.iter().position(|m| m.id() == own.id()) {
                Some(index) => merged[index] = own.clone(),
                None => merged.push(own.clone()),
            }
        }

        let sequences: Vec<Option<Arc<dyn MemberOrderFacet>>> = merged
            .iter()
            .map(|m| self.effective_facet::<dyn MemberOrderFacet>(m.id()))
            .collect();
        let mut ranked: Vec<(usize, ObjectMemberRc)> = merged.into_iter().enumerate().collect();
        ranked.sort_by(|(a, _), (b, _)| {
            order::compare_members(
                (sequences[*a].as_ref().map(|f| f.sequence()), *a),
                (sequences[*b].as_ref().map(|f| f.sequence()), *b),
            )
        });
        ranked.into_iter().map(|(_, member)| member).collect()
    }

    fn members_of(&self, kind: FeatureKind) -> Vec<ObjectMemberRc> {
        self.members()
            .into_iter()
            .filter(|m| m.kind() == kind)
            .collect()
    }

    /// Properties, own and inherited, in member order
    #[must_use]
    pub fn properties(&self) -> Vec<ObjectMemberRc> {
        self.members_of(FeatureKind::Property)
    }

    /// Collections, own and inherited, in member order
    #[must_use]
    pub fn collections(&self) -> Vec<ObjectMemberRc> {
        self.members_of(FeatureKind::Collection)
    }

    /// Properties and collections, in member order
    #[must_use]
    pub fn associations(&self) -> Vec<ObjectMemberRc> {
        self.members()
            .into_iter()
            .filter(|m| m.is_association())
            .collect()
    }

    /// Actions, own and inherited, in member order
    #[must_use]
    pub fn actions(&self) -> Vec<ObjectMemberRc> {
        self.members_of(FeatureKind::Action)
    }

    /// The direct superclass specification
    #[must_use]
    pub fn superclass(&self) -> Option<Arc<ObjectSpecification>> {
        self.superclass.as_ref().and_then(SpecificationRef::resolve)
    }

    /// Name of the direct superclass
    #[must_use]
    pub fn superclass_name(&self) -> Option<&str> {
        self.superclass.as_ref().map(SpecificationRef::name)
    }

    /// Specifications of the directly implemented interfaces
    #[must_use]
    pub fn interfaces(&self) -> Vec<Arc<ObjectSpecification>> {
        self.interfaces
            .iter()
            .filter_map(SpecificationRef::resolve)
            .collect()
    }

    /// Superclass first, then interfaces
    fn supertypes(&self) -> impl Iterator<Item = Arc<ObjectSpecification>> + '_ {
        self.superclass
            .iter()
            .chain(self.interfaces.iter())
            .filter_map(SpecificationRef::resolve)
    }

    /// Direct subclasses known to the loader, sorted by name.
    ///
    /// Populated when the metamodel is post-processed.
    #[must_use]
    pub fn subclasses(&self) -> Vec<Arc<ObjectSpecification>> {
        let mut subclasses: Vec<Arc<ObjectSpecification>> = self
            .subclasses
            .iter()
            .filter_map(|(_, r)| r.resolve())
            .collect();
        subclasses.sort_by(|a, b| a.name().cmp(b.name()));
        subclasses
    }

    pub(crate) fn add_subclass(&self, subclass: SpecificationRef) {
        if !self
            .subclasses
            .iter()
            .any(|(_, existing)| existing.name() == subclass.name())
        {
            self.subclasses.push(subclass);
        }
    }

    /// Actions contributed to this type by mixins, sorted by identifier
    #[must_use]
    pub fn contributed_actions(&self) -> Vec<ObjectMemberRc> {
        let mut actions: Vec<ObjectMemberRc> =
            self.contributed.iter().map(|(_, m)| m.clone()).collect();
        actions.sort_by(|a, b| a.identifier().cmp(b.identifier()));
        actions
    }

    pub(crate) fn add_contributed_action(&self, action: ObjectMemberRc) {
        if !self
            .contributed
            .iter()
            .any(|(_, existing)| existing.identifier() == action.identifier())
        {
            self.contributed.push(action);
        }
    }

    /// Returns true if the type has value semantics
    #[must_use]
    pub fn is_value(&self) -> bool {
        self.contains_facet::<dyn ValueFacet>()
    }

    /// Returns true if the type is persisted
    #[must_use]
    pub fn is_entity(&self) -> bool {
        self.contains_facet::<dyn EntityFacet>()
    }

    /// Returns true if the type is a mixin
    #[must_use]
    pub fn is_mixin(&self) -> bool {
        self.holder.contains_facet::<dyn MixinFacet>()
    }

    /// Returns true if the class is abstract or an interface
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.class.is_abstract()
    }

    /// Title of `target`: the `TitleFacet` if present, `Untitled <SimpleName>` otherwise
    ///
    /// # Errors
    /// Returns an error if the title facet fails to invoke the domain method.
    pub fn title(&self, target: &dyn Any) -> Result<String> {
        match self.facet::<dyn TitleFacet>() {
            Some(facet) => facet.title(target),
            None => Ok(format!("Untitled {}", self.simple_name())),
        }
    }

    /// Support-looking methods that named a member but did not match any convention
    #[must_use]
    pub fn orphaned_methods(&self) -> &[MethodDescriptorRc] {
        &self.orphaned_methods
    }

    /// Names of the domain classes referenced by members and parameters
    #[must_use]
    pub fn referenced_classes(&self) -> &[String] {
        &self.referenced_classes
    }

    /// Every holder owned by this specification: the type holder, then members and their
    /// parameters in declaration order
    pub fn holders(&self) -> impl Iterator<Item = &FacetHolder> {
        std::iter::once(&self.holder).chain(self.members.iter().flat_map(|m| m.holders()))
    }

    pub(crate) fn seal(&self) {
        for holder in self.holders() {
            holder.seal();
        }
    }

    /// Returns true once the metamodel holding this specification has been sealed
    #[must_use]
    pub fn is_sealed(&self) -> bool {
        self.holder.is_sealed()
    }
}

impl fmt::Debug for ObjectSpecification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ObjectSpecification")
            .field("name", &self.class.name)
            .field("superclass", &self.superclass_name())
            .field("members", &self.members.iter().map(|m| m.identifier().to_string()).collect::<Vec<_>>())
            .field("facets", &self.holder.facet_types())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use crate::{
        metamodel::{
            facets::{EntityFacet, ImmutableFacet, MaxLengthFacet},
            reflect::{
                Annotation, ClassBuilder, ClassModifiers, MethodBuilder, ParameterDescriptor,
                TypeRef, Value,
            },
        },
        test::bootstrap,
    };

    #[test]
    fn test_title_falls_back_to_simple_name() {
        let loader = bootstrap(vec![ClassBuilder::new("com.example.Customer")]);
        let customer = loader.specification("com.example.Customer").unwrap();

        assert_eq!(customer.title(&()).unwrap(), "Untitled Customer");
    }

    #[test]
    fn test_title_method_receives_target() {
        let loader = bootstrap(vec![ClassBuilder::new("Customer").method(
            MethodBuilder::new("title")
                .returns(TypeRef::value("String"))
                .invoker(|target, _| {
                    let name = target
                        .and_then(|t| t.downcast_ref::<String>())
                        .ok_or_else(|| "no target".to_string())?;
                    Ok(Value::from(format!("Customer {name}")))
                }),
        )]);
        let customer = loader.specification("Customer").unwrap();

        assert_eq!(customer.title(&"Ada".to_string()).unwrap(), "Customer Ada");
        assert!(customer.title(&42_i64).is_err());
        assert!(customer.actions().is_empty());
    }

    #[test]
    fn test_type_facets_fall_back_to_interfaces() {
        let loader = bootstrap(vec![
            ClassBuilder::new("Auditable")
                .modifiers(ClassModifiers::INTERFACE)
                .annotate(Annotation::new("Immutable")),
            ClassBuilder::new("Invoice").implements("Auditable"),
        ]);
        let invoice = loader.specification("Invoice").unwrap();

        assert!(!invoice.holder().contains_facet::<dyn ImmutableFacet>());
        let immutable = invoice.facet::<dyn ImmutableFacet>().unwrap();
        assert_eq!(immutable.reason(), "Immutable");

        let interfaces: Vec<String> = invoice
            .interfaces()
            .iter()
            .map(|i| i.name().to_string())
            .collect();
        assert_eq!(interfaces, ["Auditable"]);
        assert!(invoice.superclass().is_none());
    }

    #[test]
    fn test_fallback_spans_several_levels() {
        let loader = bootstrap(vec![
            ClassBuilder::new("Asset")
                .annotate(Annotation::new("Entity"))
                .method(
                    MethodBuilder::new("getCode")
                        .returns(TypeRef::value("String"))
                        .annotate(Annotation::new("MaxLength").with("value", 12_i64)),
                ),
            ClassBuilder::new("Vehicle")
                .extends("Asset")
                .method(MethodBuilder::new("getWheels").returns(TypeRef::value("Integer"))),
            ClassBuilder::new("Truck")
                .extends("Vehicle")
                .method(MethodBuilder::new("getPayload").returns(TypeRef::value("Integer"))),
        ]);
        let vehicle = loader.specification("Vehicle").unwrap();
        let truck = loader.specification("Truck").unwrap();

        assert!(!truck.holder().contains_facet::<dyn EntityFacet>());
        assert!(!vehicle.holder().contains_facet::<dyn EntityFacet>());
        assert!(truck.is_entity());

        assert_eq!(vehicle.declared_members().len(), 1);
        let max_length = truck.effective_facet::<dyn MaxLengthFacet>("code").unwrap();
        assert_eq!(max_length.max_length(), 12);
        assert_eq!(truck.member("code").unwrap().identifier().class_name(), "Asset");
        assert!(truck.effective_facet::<dyn MaxLengthFacet>("wheels").is_none());

        let ids: Vec<String> = truck.members().iter().map(|m| m.id().to_string()).collect();
        assert_eq!(ids, ["code", "wheels", "payload"]);
        assert_eq!(truck.superclass().unwrap().name(), "Vehicle");
    }

    #[test]
    fn test_redeclared_member_keeps_inherited_position() {
        let loader = bootstrap(vec![
            ClassBuilder::new("Party")
                .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
                .method(MethodBuilder::new("getEmail").returns(TypeRef::value("String"))),
            ClassBuilder::new("Person")
                .extends("Party")
                .method(MethodBuilder::new("getNotes").returns(TypeRef::value("String")))
                .method(MethodBuilder::new("getEmail").returns(TypeRef::value("String"))),
        ]);
        let person = loader.specification("Person").unwrap();

        let members = person.members();
        let ids: Vec<&str> = members.iter().map(|m| m.id()).collect();
        assert_eq!(ids, ["name", "email", "notes"]);
        assert_eq!(members[0].identifier().class_name(), "Party");
        assert_eq!(members[1].identifier().class_name(), "Person");
        assert_eq!(person.properties().len(), 3);
        assert_eq!(person.declared_members().len(), 2);
    }

    #[test]
    fn test_type_flags() {
        let loader = bootstrap(vec![
            ClassBuilder::new("Order").annotate(Annotation::new("Entity")),
            ClassBuilder::new("Money").annotate(Annotation::new("Value")),
            ClassBuilder::new("Party").modifiers(ClassModifiers::ABSTRACT),
        ]);
        let order = loader.specification("Order").unwrap();
        let money = loader.specification("Money").unwrap();
        let party = loader.specification("Party").unwrap();

        assert!(order.is_entity() && !order.is_value() && !order.is_abstract());
        assert!(money.is_value() && !money.is_entity());
        assert!(party.is_abstract() && !party.is_entity());
        assert!(!order.is_mixin());
    }

    #[test]
    fn test_parameter_facets_fall_back_to_supertype() {
        let loader = bootstrap(vec![
            ClassBuilder::new("Party").method(
                MethodBuilder::new("rename").parameter(
                    ParameterDescriptor::new("name", TypeRef::value("String"))
                        .annotate(Annotation::new("MaxLength").with("value", 20_i64)),
                ),
            ),
            ClassBuilder::new("Person").extends("Party"),
        ]);
        let person = loader.specification("Person").unwrap();

        let max_length = person
            .effective_parameter_facet::<dyn MaxLengthFacet>("rename", 0)
            .unwrap();
        assert_eq!(max_length.max_length(), 20);
        assert!(person
            .effective_parameter_facet::<dyn MaxLengthFacet>("rename", 1)
            .is_none());
        assert!(person.declared_members().is_empty());
        assert_eq!(person.actions().len(), 1);
    }
}
