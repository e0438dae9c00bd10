//! Facet kinds describing properties, collections, actions and action parameters.

use std::any::Any;

use strum::{Display, EnumString};

use crate::{
    metamodel::{
        facets::{AsFacet, Facet, FacetBase, InteractionContext, Precedence},
        identifier::FeatureIdentifier,
        reflect::{MethodDescriptorRc, TypeRef, Value},
    },
    Result,
};

/// Display name of a feature
pub trait NamedFacet: Facet + AsFacet {
    /// The name
    fn name(&self) -> &str;
}

/// Description of a feature
pub trait DescribedAsFacet: Facet + AsFacet {
    /// The description
    fn description(&self) -> &str;
}

/// Position of a member in the rendered member list
pub trait MemberOrderFacet: Facet + AsFacet {
    /// Dotted sequence, e.g. `1.2.10`
    fn sequence(&self) -> &str;

    /// Optional group (field set / collection tab)
    fn group(&self) -> Option<&str>;
}

/// Whether a value is required
pub trait MandatoryFacet: Facet + AsFacet {
    /// Returns true if the value may be left empty
    fn is_optional(&self) -> bool;
}

/// Maximum length of a string value
pub trait MaxLengthFacet: Facet + AsFacet {
    /// The maximum length
    fn max_length(&self) -> usize;
}

/// Side-effect classification of an action
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum ActionSemantics {
    /// No side effects; may be invoked freely
    #[strum(serialize = "SAFE")]
    Safe,
    /// Repeated invocation has the same effect as a single one
    #[strum(serialize = "IDEMPOTENT")]
    Idempotent,
    /// Anything else
    #[strum(serialize = "NON_IDEMPOTENT")]
    NonIdempotent,
}

/// Side-effect classification of an action
pub trait ActionSemanticsFacet: Facet + AsFacet {
    /// The classification
    fn semantics(&self) -> ActionSemantics;
}

/// How a mixin or service action is contributed to its target type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum Contributed {
    /// Rendered as an action of the target
    #[strum(serialize = "AS_ACTION")]
    AsAction,
    /// Rendered as a derived property/collection of the target
    #[strum(serialize = "AS_ASSOCIATION")]
    AsAssociation,
    /// Rendered as both
    #[strum(serialize = "AS_BOTH")]
    AsBoth,
    /// Not contributed
    #[strum(serialize = "AS_NEITHER")]
    AsNeither,
}

impl Contributed {
    /// Returns true if the contribution shows up as an action
    #[must_use]
    pub fn as_action(self) -> bool {
        matches!(self, Contributed::AsAction | Contributed::AsBoth)
    }

    /// Returns true if the contribution shows up as an association
    #[must_use]
    pub fn as_association(self) -> bool {
        matches!(self, Contributed::AsAssociation | Contributed::AsBoth)
    }
}

/// Contribution mode of a contributed action
pub trait NotContributedFacet: Facet + AsFacet {
    /// The contribution mode
    fn contributed(&self) -> Contributed;
}

/// Reads a property
pub trait PropertyAccessorFacet: Facet + AsFacet {
    /// Current value of the property on `target`
    ///
    /// # Errors
    /// Returns an error if the accessor fails.
    fn get(&self, target: &dyn Any) -> Result<Value>;

    /// Declared type of the property
    fn value_type(&self) -> &TypeRef;
}

/// Writes a property
pub trait PropertySetterFacet: Facet + AsFacet {
    /// Assigns `value` on `target`
    ///
    /// # Errors
    /// Returns an error if the mutator fails.
    fn set(&self, target: &dyn Any, value: Value) -> Result<()>;
}

/// Clears a property
pub trait PropertyClearFacet: Facet + AsFacet {
    /// Clears the property on `target`
    ///
    /// # Errors
    /// Returns an error if the mutator fails.
    fn clear(&self, target: &dyn Any) -> Result<()>;
}

/// Reads a collection
pub trait CollectionAccessorFacet: Facet + AsFacet {
    /// Current elements of the collection on `target`
    ///
    /// # Errors
    /// Returns an error if the accessor fails.
    fn get(&self, target: &dyn Any) -> Result<Vec<Value>>;
}

/// Adds to a collection
pub trait CollectionAddToFacet: Facet + AsFacet {
    /// Adds `element` on `target`
    ///
    /// # Errors
    /// Returns an error if the mutator fails.
    fn add(&self, target: &dyn Any, element: Value) -> Result<()>;
}

/// Removes from a collection
pub trait CollectionRemoveFromFacet: Facet + AsFacet {
    /// Removes `element` on `target`
    ///
    /// # Errors
    /// Returns an error if the mutator fails.
    fn remove(&self, target: &dyn Any, element: Value) -> Result<()>;
}

/// Element type of a collection
pub trait TypeOfFacet: Facet + AsFacet {
    /// Name of the element class
    fn element_class(&self) -> &str;
}

/// Invokes an action
pub trait ActionInvocationFacet: Facet + AsFacet {
    /// Invokes the action on `target` with `args`
    ///
    /// # Errors
    /// Returns an error if the action fails.
    fn invoke(&self, target: Option<&dyn Any>, args: &[Value]) -> Result<Value>;

    /// Declared return type
    fn return_type(&self) -> &TypeRef;
}

/// Choices for a property or parameter
pub trait ChoicesFacet: Facet + AsFacet {
    /// The choices in this context
    ///
    /// # Errors
    /// Returns an error if the support method fails.
    fn choices(&self, ctx: &InteractionContext<'_>) -> Result<Vec<Value>>;
}

/// Default value for a property or parameter
pub trait DefaultedFacet: Facet + AsFacet {
    /// The default in this context
    ///
    /// # Errors
    /// Returns an error if the support method fails.
    fn default_value(&self, ctx: &InteractionContext<'_>) -> Result<Value>;
}

/// Auto-complete candidates for a property or parameter
pub trait AutoCompleteFacet: Facet + AsFacet {
    /// Candidates matching `search`
    ///
    /// # Errors
    /// Returns an error if the support method fails.
    fn auto_complete(&self, ctx: &InteractionContext<'_>, search: &str) -> Result<Vec<Value>>;
}

/// `NamedFacet` from an annotation or inferred from the member name
#[derive(Debug)]
pub struct NamedFacetImpl {
    base: FacetBase,
    name: String,
}

impl NamedFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, name: &str, precedence: Precedence) -> Self {
        NamedFacetImpl {
            base: FacetBase::new(holder, precedence),
            name: name.to_string(),
        }
    }
}

impl NamedFacet for NamedFacetImpl {
    fn name(&self) -> &str {
        &self.name
    }
}

/// `DescribedAsFacet` from `@DescribedAs`
#[derive(Debug)]
pub struct DescribedAsFacetImpl {
    base: FacetBase,
    description: String,
}

impl DescribedAsFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, description: &str) -> Self {
        DescribedAsFacetImpl {
            base: FacetBase::new(holder, Precedence::Annotated),
            description: description.to_string(),
        }
    }
}

impl DescribedAsFacet for DescribedAsFacetImpl {
    fn description(&self) -> &str {
        &self.description
    }
}

/// `MemberOrderFacet` from `@MemberOrder`
#[derive(Debug)]
pub struct MemberOrderFacetImpl {
    base: FacetBase,
    sequence: String,
    group: Option<String>,
}

impl MemberOrderFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, sequence: &str, group: Option<&str>) -> Self {
        MemberOrderFacetImpl {
            base: FacetBase::new(holder, Precedence::Annotated),
            sequence: sequence.trim().to_string(),
            group: group.map(str::to_string),
        }
    }
}

impl MemberOrderFacet for MemberOrderFacetImpl {
    fn sequence(&self) -> &str {
        &self.sequence
    }

    fn group(&self) -> Option<&str> {
        self.group.as_deref()
    }
}

/// `MandatoryFacet`: annotated optionality or the mandatory default
#[derive(Debug)]
pub struct MandatoryFacetImpl {
    base: FacetBase,
    optional: bool,
}

impl MandatoryFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, optional: bool, precedence: Precedence) -> Self {
        MandatoryFacetImpl {
            base: FacetBase::new(holder, precedence),
            optional,
        }
    }
}

impl MandatoryFacet for MandatoryFacetImpl {
    fn is_optional(&self) -> bool {
        self.optional
    }
}

/// `MaxLengthFacet` from `@MaxLength` / `@Property(maxLength)`
#[derive(Debug)]
pub struct MaxLengthFacetImpl {
    base: FacetBase,
    max_length: usize,
}

impl MaxLengthFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, max_length: usize) -> Self {
        MaxLengthFacetImpl {
            base: FacetBase::new(holder, Precedence::Annotated),
            max_length,
        }
    }
}

impl MaxLengthFacet for MaxLengthFacetImpl {
    fn max_length(&self) -> usize {
        self.max_length
    }
}

/// `ActionSemanticsFacet` from `@Action(semantics)` or the non-idempotent default
#[derive(Debug)]
pub struct ActionSemanticsFacetImpl {
    base: FacetBase,
    semantics: ActionSemantics,
}

impl ActionSemanticsFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(
        holder: &FeatureIdentifier,
        semantics: ActionSemantics,
        precedence: Precedence,
    ) -> Self {
        ActionSemanticsFacetImpl {
            base: FacetBase::new(holder, precedence),
            semantics,
        }
    }
}

impl ActionSemanticsFacet for ActionSemanticsFacetImpl {
    fn semantics(&self) -> ActionSemantics {
        self.semantics
    }
}

/// `NotContributedFacet` from `@Action(contributed)` or derived for mixins
#[derive(Debug)]
pub struct NotContributedFacetImpl {
    base: FacetBase,
    contributed: Contributed,
}

impl NotContributedFacetImpl {
    /// Creates a directly contributed facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, contributed: Contributed) -> Self {
        NotContributedFacetImpl {
            base: FacetBase::new(holder, Precedence::Annotated),
            contributed,
        }
    }

    /// Creates a facet derived from another facet kind
    #[must_use]
    pub fn derived(
        holder: &FeatureIdentifier,
        contributed: Contributed,
        source: crate::metamodel::facets::FacetType,
    ) -> Self {
        NotContributedFacetImpl {
            base: FacetBase::derived(holder, source),
            contributed,
        }
    }
}

impl NotContributedFacet for NotContributedFacetImpl {
    fn contributed(&self) -> Contributed {
        self.contributed
    }
}

/// Property accessor backed by a `getXxx()` / `isXxx()` method
#[derive(Debug)]
pub struct PropertyAccessorFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl PropertyAccessorFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        PropertyAccessorFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl PropertyAccessorFacet for PropertyAccessorFacetViaMethod {
    fn get(&self, target: &dyn Any) -> Result<Value> {
        self.method.invoke(self.holder(), Some(target), &[])
    }

    fn value_type(&self) -> &TypeRef {
        &self.method.return_type
    }
}

/// Property mutator backed by a `setXxx(value)` method
#[derive(Debug)]
pub struct PropertySetterFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl PropertySetterFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        PropertySetterFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl PropertySetterFacet for PropertySetterFacetViaMethod {
    fn set(&self, target: &dyn Any, value: Value) -> Result<()> {
        self.method
            .invoke(self.holder(), Some(target), &[value])
            .map(|_| ())
    }
}

/// Property clearing backed by a `clearXxx()` method
#[derive(Debug)]
pub struct PropertyClearFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl PropertyClearFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        PropertyClearFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl PropertyClearFacet for PropertyClearFacetViaMethod {
    fn clear(&self, target: &dyn Any) -> Result<()> {
        self.method
            .invoke(self.holder(), Some(target), &[])
            .map(|_| ())
    }
}

/// Collection accessor backed by a `getXxx()` method
#[derive(Debug)]
pub struct CollectionAccessorFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl CollectionAccessorFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        CollectionAccessorFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl CollectionAccessorFacet for CollectionAccessorFacetViaMethod {
    fn get(&self, target: &dyn Any) -> Result<Vec<Value>> {
        Ok(self
            .method
            .invoke(self.holder(), Some(target), &[])?
            .into_list())
    }
}

/// Collection mutator backed by an `addToXxx(e)` / `removeFromXxx(e)` method
#[derive(Debug)]
pub struct CollectionMutatorFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl CollectionMutatorFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        CollectionMutatorFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl CollectionAddToFacet for CollectionMutatorFacetViaMethod {
    fn add(&self, target: &dyn Any, element: Value) -> Result<()> {
        self.method
            .invoke(self.holder(), Some(target), &[element])
            .map(|_| ())
    }
}

impl CollectionRemoveFromFacet for CollectionMutatorFacetViaMethod {
    fn remove(&self, target: &dyn Any, element: Value) -> Result<()> {
        self.method
            .invoke(self.holder(), Some(target), &[element])
            .map(|_| ())
    }
}

/// `TypeOfFacet` from the declared collection element type
#[derive(Debug)]
pub struct TypeOfFacetImpl {
    base: FacetBase,
    element_class: String,
}

impl TypeOfFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, element_class: &str) -> Self {
        TypeOfFacetImpl {
            base: FacetBase::new(holder, Precedence::Inferred),
            element_class: element_class.to_string(),
        }
    }
}

impl TypeOfFacet for TypeOfFacetImpl {
    fn element_class(&self) -> &str {
        &self.element_class
    }
}

/// Action invocation backed by the action method itself
#[derive(Debug)]
pub struct ActionInvocationFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl ActionInvocationFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        ActionInvocationFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl ActionInvocationFacet for ActionInvocationFacetViaMethod {
    fn invoke(&self, target: Option<&dyn Any>, args: &[Value]) -> Result<Value> {
        self.method.invoke(self.holder(), target, args)
    }

    fn return_type(&self) -> &TypeRef {
        &self.method.return_type
    }
}

/// Choices backed by a `choicesXxx()` / `choicesNXxx(..)` support method
#[derive(Debug)]
pub struct ChoicesFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl ChoicesFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        ChoicesFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl ChoicesFacet for ChoicesFacetViaMethod {
    fn choices(&self, ctx: &InteractionContext<'_>) -> Result<Vec<Value>> {
        Ok(self
            .method
            .invoke(self.holder(), ctx.target(), ctx.arguments())?
            .into_list())
    }
}

/// Default backed by a `defaultXxx()` / `defaultNXxx(..)` support method
#[derive(Debug)]
pub struct DefaultedFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl DefaultedFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        DefaultedFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl DefaultedFacet for DefaultedFacetViaMethod {
    fn default_value(&self, ctx: &InteractionContext<'_>) -> Result<Value> {
        self.method
            .invoke(self.holder(), ctx.target(), ctx.arguments())
    }
}

/// Auto-complete backed by an `autoCompleteXxx(search)` support method
#[derive(Debug)]
pub struct AutoCompleteFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl AutoCompleteFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        AutoCompleteFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl AutoCompleteFacet for AutoCompleteFacetViaMethod {
    fn auto_complete(&self, ctx: &InteractionContext<'_>, search: &str) -> Result<Vec<Value>> {
        let mut args = ctx.arguments().to_vec();
        args.push(Value::from(search));
        Ok(self
            .method
            .invoke(self.holder(), ctx.target(), &args)?
            .into_list())
    }
}

impl_facet!(
    NamedFacetImpl,
    DescribedAsFacetImpl,
    MemberOrderFacetImpl,
    MandatoryFacetImpl,
    MaxLengthFacetImpl,
    ActionSemanticsFacetImpl,
    NotContributedFacetImpl,
    PropertyAccessorFacetViaMethod,
    PropertySetterFacetViaMethod,
    PropertyClearFacetViaMethod,
    CollectionAccessorFacetViaMethod,
    CollectionMutatorFacetViaMethod,
    TypeOfFacetImpl,
    ActionInvocationFacetViaMethod,
    ChoicesFacetViaMethod,
    DefaultedFacetViaMethod,
    AutoCompleteFacetViaMethod,
);

#[cfg(test)]
mod tests {
    use std::{str::FromStr, sync::Arc};

    use super::*;
    use crate::metamodel::reflect::MethodBuilder;

    #[test]
    fn test_action_semantics_parse() {
        assert_eq!(ActionSemantics::from_str("SAFE").unwrap(), ActionSemantics::Safe);
        assert_eq!(
            ActionSemantics::from_str("non_idempotent").unwrap(),
            ActionSemantics::NonIdempotent
        );
        assert!(ActionSemantics::from_str("sometimes").is_err());
    }

    #[test]
    fn test_contributed_modes() {
        assert!(Contributed::AsBoth.as_action());
        assert!(Contributed::AsBoth.as_association());
        assert!(!Contributed::AsAction.as_association());
        assert!(!Contributed::AsNeither.as_action());
        assert_eq!(
            Contributed::from_str("as_association").unwrap(),
            Contributed::AsAssociation
        );
    }

    #[test]
    fn test_collection_accessor_flattens_list() {
        let id = FeatureIdentifier::collection("Order", "lines");
        let method = Arc::new(
            MethodBuilder::new("getLines")
                .returns(TypeRef::collection("OrderLine"))
                .returning(Value::List(vec![Value::Int(1), Value::Int(2)]))
                .build_method(),
        );
        let facet = CollectionAccessorFacetViaMethod::new(&id, method);
        let target = ();
        assert_eq!(facet.get(&target).unwrap().len(), 2);
    }

    #[test]
    fn test_auto_complete_appends_search() {
        let id = FeatureIdentifier::property("Order", "customer");
        let method = Arc::new(
            MethodBuilder::new("autoCompleteCustomer")
                .param("search", TypeRef::value("String"))
                .invoker(|_, args| Ok(Value::List(args.to_vec())))
                .build_method(),
        );
        let facet = AutoCompleteFacetViaMethod::new(&id, method);
        let found = facet
            .auto_complete(&InteractionContext::new(), "sv")
            .unwrap();
        assert_eq!(found, vec![Value::from("sv")]);
    }

    #[test]
    fn test_action_invocation_reports_return_type() {
        let id = FeatureIdentifier::action("Order", "cancel");
        let method = Arc::new(
            MethodBuilder::new("cancel")
                .returns(TypeRef::class("Order"))
                .returning("cancelled")
                .build_method(),
        );
        let facet = ActionInvocationFacetViaMethod::new(&id, method);
        assert_eq!(facet.return_type(), &TypeRef::class("Order"));
        assert_eq!(facet.invoke(None, &[]).unwrap(), Value::from("cancelled"));
    }
}
