//! Members of an object specification: properties, collections and actions with their
//! parameters.

use std::sync::Arc;

use crate::metamodel::{
    facets::{FacetHolder, NamedFacet},
    identifier::{FeatureIdentifier, FeatureKind},
    reflect::{MethodDescriptorRc, ParameterDescriptor, TypeRef},
    spec::{ObjectSpecification, SpecificationRef},
};

/// A reference to an `ObjectMember`
pub type ObjectMemberRc = Arc<ObjectMember>;

/// A property, collection or action of a specification.
///
/// A member owns the facet holder for its identifier. Members whose `method` is `None` are
/// subtype-local holders: they exist because a subtype configures a member it inherits
/// (e.g. a `hideName()` in a subclass of the class declaring `getName()`), carry only the
/// subtype's facets, and defer every other facet to the supertype's member.
#[derive(Debug)]
pub struct ObjectMember {
    pub(crate) holder: FacetHolder,
    pub(crate) method: Option<MethodDescriptorRc>,
    pub(crate) value_type: TypeRef,
    pub(crate) type_spec: Option<SpecificationRef>,
    pub(crate) parameters: Vec<ActionParameter>,
}

impl ObjectMember {
    /// Identifier of the member
    #[must_use]
    pub fn identifier(&self) -> &FeatureIdentifier {
        self.holder.identifier()
    }

    /// Member id, e.g. `name` for `getName()`
    #[must_use]
    pub fn id(&self) -> &str {
        self.identifier().member_name().unwrap_or_default()
    }

    /// Display name: the `NamedFacet` if present, the member id otherwise
    #[must_use]
    pub fn name(&self) -> String {
        self.holder
            .get_facet::<dyn NamedFacet>()
            .map_or_else(|| self.id().to_string(), |f| f.name().to_string())
    }

    /// Kind of the member
    #[must_use]
    pub fn kind(&self) -> FeatureKind {
        self.identifier().kind()
    }

    /// Returns true for properties
    #[must_use]
    pub fn is_property(&self) -> bool {
        self.kind() == FeatureKind::Property
    }

    /// Returns true for collections
    #[must_use]
    pub fn is_collection(&self) -> bool {
        self.kind() == FeatureKind::Collection
    }

    /// Returns true for properties and collections
    #[must_use]
    pub fn is_association(&self) -> bool {
        self.kind().is_association()
    }

    /// Returns true for actions
    #[must_use]
    pub fn is_action(&self) -> bool {
        self.kind() == FeatureKind::Action
    }

    /// The member's own facets (no inheritance fallback; see
    /// [`ObjectSpecification::effective_facet`])
    #[must_use]
    pub fn holder(&self) -> &FacetHolder {
        &self.holder
    }

    /// The facet of kind `K` installed on this member's own holder
    #[must_use]
    pub fn get_facet<K>(&self) -> Option<Arc<K>>
    where
        K: ?Sized + 'static,
    {
        self.holder.get_facet::<K>()
    }

    /// The accessor or action method; `None` for subtype-local holders
    #[must_use]
    pub fn method(&self) -> Option<&MethodDescriptorRc> {
        self.method.as_ref()
    }

    /// Returns true if this is a subtype-local holder for an inherited member
    #[must_use]
    pub fn is_local_override(&self) -> bool {
        self.method.is_none()
    }

    /// Declared type: the property type, the collection type or the action return type
    #[must_use]
    pub fn value_type(&self) -> &TypeRef {
        &self.value_type
    }

    /// Specification of the referenced domain class (property type, collection element
    /// type or action return type), once it has been loaded
    #[must_use]
    pub fn type_specification(&self) -> Option<Arc<ObjectSpecification>> {
        self.type_spec.as_ref().and_then(SpecificationRef::resolve)
    }

    /// Name of the referenced domain class, if any
    #[must_use]
    pub fn type_name(&self) -> Option<&str> {
        self.type_spec.as_ref().map(SpecificationRef::name)
    }

    /// Action parameters in declaration order (empty for associations)
    #[must_use]
    pub fn parameters(&self) -> &[ActionParameter] {
        &self.parameters
    }

    /// Action parameter at `index`
    #[must_use]
    pub fn parameter(&self, index: usize) -> Option<&ActionParameter> {
        self.parameters.get(index)
    }

    /// Every holder owned by this member: its own and its parameters'
    pub fn holders(&self) -> impl Iterator<Item = &FacetHolder> {
        std::iter::once(&self.holder).chain(self.parameters.iter().map(|p| &p.holder))
    }
}

/// One parameter of an action
#[derive(Debug)]
pub struct ActionParameter {
    pub(crate) holder: FacetHolder,
    pub(crate) descriptor: Option<ParameterDescriptor>,
    pub(crate) param_type: TypeRef,
    pub(crate) type_spec: Option<SpecificationRef>,
}

impl ActionParameter {
    /// Identifier of the parameter
    #[must_use]
    pub fn identifier(&self) -> &FeatureIdentifier {
        self.holder.identifier()
    }

    /// Zero-based position
    #[must_use]
    pub fn index(&self) -> usize {
        self.identifier().parameter_index().unwrap_or_default()
    }

    /// Display name: the `NamedFacet` if present, the declared name otherwise
    #[must_use]
    pub fn name(&self) -> String {
        if let Some(named) = self.holder.get_facet::<dyn NamedFacet>() {
            return named.name().to_string();
        }
        self.descriptor
            .as_ref()
            .map_or_else(|| format!("arg{}", self.index()), |d| d.name.clone())
    }

    /// The parameter's facets
    #[must_use]
    pub fn holder(&self) -> &FacetHolder {
        &self.holder
    }

    /// The facet of kind `K` installed on this parameter's own holder
    #[must_use]
    pub fn get_facet<K>(&self) -> Option<Arc<K>>
    where
        K: ?Sized + 'static,
    {
        self.holder.get_facet::<K>()
    }

    /// Declared type
    #[must_use]
    pub fn param_type(&self) -> &TypeRef {
        &self.param_type
    }

    /// Specification of the referenced domain class, once loaded
    #[must_use]
    pub fn type_specification(&self) -> Option<Arc<ObjectSpecification>> {
        self.type_spec.as_ref().and_then(SpecificationRef::resolve)
    }
}
