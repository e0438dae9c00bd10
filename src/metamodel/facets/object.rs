//! Class-level facet kinds: title, value and entity semantics, immutability, mixins,
//! lifecycle callbacks and rendering hints.

use std::{any::Any, fmt, marker::PhantomData};

use strum::{Display, EnumString};

use crate::{
    metamodel::{
        facets::{AsFacet, Facet, FacetBase, Precedence},
        identifier::FeatureIdentifier,
        reflect::{MethodDescriptorRc, Value},
    },
    Result,
};

/// Renders the title of an instance
pub trait TitleFacet: Facet + AsFacet {
    /// Title of `target`
    ///
    /// # Errors
    /// Returns an error if a title method or title property accessor fails.
    fn title(&self, target: &dyn Any) -> Result<String>;
}

/// Instances of the type cannot be modified through the UI
pub trait ImmutableFacet: Facet + AsFacet {
    /// Reason reported for members disabled by immutability
    fn reason(&self) -> &str;
}

/// The type has value semantics
pub trait ValueFacet: Facet + AsFacet {
    /// Name of the value type
    fn value_type(&self) -> &str;
}

/// Identity management of a persistent type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Display, EnumString)]
#[strum(ascii_case_insensitive)]
pub enum IdentityStrategy {
    /// Identity managed by the datastore
    #[strum(serialize = "datastore")]
    Datastore,
    /// Identity derived from primary key properties
    #[strum(serialize = "application")]
    Application,
    /// Not persisted durably
    #[strum(serialize = "nondurable")]
    NonDurable,
}

/// The type is persisted by a persistence adapter
pub trait EntityFacet: Facet + AsFacet {
    /// How identity is managed
    fn identity_strategy(&self) -> IdentityStrategy;

    /// Explicit table / schema mapping, if any
    fn table(&self) -> Option<&str>;
}

/// The type is a mixin contributing a behavior to another type
pub trait MixinFacet: Facet + AsFacet {
    /// Name of the type the mixin contributes to
    fn target(&self) -> &str;

    /// Name of the method that implements the contributed behavior
    fn method_name(&self) -> &str;
}

/// Icon name of an instance
pub trait IconFacet: Facet + AsFacet {
    /// Icon for `target`
    ///
    /// # Errors
    /// Returns an error if the support method fails.
    fn icon_name(&self, target: &dyn Any) -> Result<Option<String>>;
}

/// CSS class hint for a type or member
pub trait CssClassFacet: Facet + AsFacet {
    /// The CSS class
    fn css_class(&self) -> &str;
}

/// A persistence lifecycle event, used to index callback facet kinds
pub trait LifecycleEvent: fmt::Debug + Send + Sync + 'static {
    /// Name of the callback method
    const METHOD: &'static str;
}

macro_rules! lifecycle_events {
    ($($event:ident => $method:literal),+ $(,)?) => {
        $(
            #[doc = concat!("Lifecycle event handled by `", $method, "()`")]
            #[derive(Debug, Clone, Copy)]
            pub struct $event;

            impl LifecycleEvent for $event {
                const METHOD: &'static str = $method;
            }
        )+
    };
}

lifecycle_events!(
    Created => "created",
    Loaded => "loaded",
    Persisting => "persisting",
    Persisted => "persisted",
    Updating => "updating",
    Updated => "updated",
    Removing => "removing",
);

/// Callback invoked by persistence adapters on lifecycle event `E`
pub trait CallbackFacet<E: LifecycleEvent>: Facet + AsFacet {
    /// Invokes the callback on `target`
    ///
    /// # Errors
    /// Returns an error if the callback fails.
    fn invoke(&self, target: &dyn Any) -> Result<()>;
}

/// Title backed by a `title()` method
#[derive(Debug)]
pub struct TitleFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl TitleFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        TitleFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl TitleFacet for TitleFacetViaMethod {
    fn title(&self, target: &dyn Any) -> Result<String> {
        Ok(self
            .method
            .invoke(self.holder(), Some(target), &[])?
            .to_string())
    }
}

/// One `@Title`-annotated property contributing to a composite title
#[derive(Debug, Clone)]
pub struct TitleComponent {
    /// Dotted sequence ordering the components
    pub sequence: String,
    /// Text rendered before the value
    pub prepend: String,
    /// Text rendered after the value
    pub append: String,
    /// The property accessor
    pub accessor: MethodDescriptorRc,
}

/// Composite title assembled from `@Title`-annotated properties
#[derive(Debug)]
pub struct TitleFacetViaAnnotations {
    base: FacetBase,
    components: Vec<TitleComponent>,
}

impl TitleFacetViaAnnotations {
    /// Creates the facet; components are rendered in the given order
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, components: Vec<TitleComponent>) -> Self {
        TitleFacetViaAnnotations {
            base: FacetBase::new(holder, Precedence::Annotated),
            components,
        }
    }

    /// The components in render order
    #[must_use]
    pub fn components(&self) -> &[TitleComponent] {
        &self.components
    }
}

impl TitleFacet for TitleFacetViaAnnotations {
    fn title(&self, target: &dyn Any) -> Result<String> {
        let mut title = String::new();
        for component in &self.components {
            let value = component
                .accessor
                .invoke(self.holder(), Some(target), &[])?;
            if value.is_null() {
                continue;
            }
            title.push_str(&component.prepend);
            title.push_str(&value.to_string());
            title.push_str(&component.append);
        }
        Ok(title.trim().to_string())
    }
}

/// `ImmutableFacet` from `@Immutable` / `@DomainObject(editing = DISABLED)`
#[derive(Debug)]
pub struct ImmutableFacetImpl {
    base: FacetBase,
    reason: String,
}

impl ImmutableFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, reason: &str) -> Self {
        ImmutableFacetImpl {
            base: FacetBase::new(holder, Precedence::Annotated),
            reason: reason.to_string(),
        }
    }
}

impl ImmutableFacet for ImmutableFacetImpl {
    fn reason(&self) -> &str {
        &self.reason
    }
}

/// `ValueFacet` from `@Value` or a built-in value type
#[derive(Debug)]
pub struct ValueFacetImpl {
    base: FacetBase,
    value_type: String,
}

impl ValueFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, value_type: &str, precedence: Precedence) -> Self {
        ValueFacetImpl {
            base: FacetBase::new(holder, precedence),
            value_type: value_type.to_string(),
        }
    }
}

impl ValueFacet for ValueFacetImpl {
    fn value_type(&self) -> &str {
        &self.value_type
    }
}

/// `EntityFacet` from `@PersistenceCapable` / `@Entity`
#[derive(Debug)]
pub struct EntityFacetAnnotation {
    base: FacetBase,
    identity_strategy: IdentityStrategy,
    table: Option<String>,
}

impl EntityFacetAnnotation {
    /// Creates the facet
    #[must_use]
    pub fn new(
        holder: &FeatureIdentifier,
        identity_strategy: IdentityStrategy,
        table: Option<&str>,
    ) -> Self {
        EntityFacetAnnotation {
            base: FacetBase::new(holder, Precedence::Annotated),
            identity_strategy,
            table: table.map(str::to_string),
        }
    }
}

impl EntityFacet for EntityFacetAnnotation {
    fn identity_strategy(&self) -> IdentityStrategy {
        self.identity_strategy
    }

    fn table(&self) -> Option<&str> {
        self.table.as_deref()
    }
}

/// `MixinFacet` from `@Mixin` plus the single-argument constructor
#[derive(Debug)]
pub struct MixinFacetImpl {
    base: FacetBase,
    target: String,
    method_name: String,
}

impl MixinFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, target: &str, method_name: &str) -> Self {
        MixinFacetImpl {
            base: FacetBase::new(holder, Precedence::Annotated),
            target: target.to_string(),
            method_name: method_name.to_string(),
        }
    }
}

impl MixinFacet for MixinFacetImpl {
    fn target(&self) -> &str {
        &self.target
    }

    fn method_name(&self) -> &str {
        &self.method_name
    }
}

/// Icon backed by an `iconName()` method
#[derive(Debug)]
pub struct IconFacetViaMethod {
    base: FacetBase,
    method: MethodDescriptorRc,
}

impl IconFacetViaMethod {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        IconFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
        }
    }
}

impl IconFacet for IconFacetViaMethod {
    fn icon_name(&self, target: &dyn Any) -> Result<Option<String>> {
        Ok(
            match self.method.invoke(self.holder(), Some(target), &[])? {
                Value::Str(name) if !name.is_empty() => Some(name),
                _ => None,
            },
        )
    }
}

/// `CssClassFacet` from `@CssClass`
#[derive(Debug)]
pub struct CssClassFacetImpl {
    base: FacetBase,
    css_class: String,
}

impl CssClassFacetImpl {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, css_class: &str) -> Self {
        CssClassFacetImpl {
            base: FacetBase::new(holder, Precedence::Annotated),
            css_class: css_class.to_string(),
        }
    }
}

impl CssClassFacet for CssClassFacetImpl {
    fn css_class(&self) -> &str {
        &self.css_class
    }
}

/// Lifecycle callback backed by a method named after the event
pub struct CallbackFacetViaMethod<E: LifecycleEvent> {
    base: FacetBase,
    method: MethodDescriptorRc,
    _event: PhantomData<fn() -> E>,
}

impl<E: LifecycleEvent> CallbackFacetViaMethod<E> {
    /// Creates the facet
    #[must_use]
    pub fn new(holder: &FeatureIdentifier, method: MethodDescriptorRc) -> Self {
        CallbackFacetViaMethod {
            base: FacetBase::new(holder, Precedence::Default),
            method,
            _event: PhantomData,
        }
    }
}

impl<E: LifecycleEvent> fmt::Debug for CallbackFacetViaMethod<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CallbackFacetViaMethod")
            .field("event", &E::METHOD)
            .field("holder", self.holder())
            .finish()
    }
}

impl<E: LifecycleEvent> Facet for CallbackFacetViaMethod<E> {
    fn base(&self) -> &FacetBase {
        &self.base
    }
}

impl<E: LifecycleEvent> CallbackFacet<E> for CallbackFacetViaMethod<E> {
    fn invoke(&self, target: &dyn Any) -> Result<()> {
        self.method
            .invoke(self.holder(), Some(target), &[])
            .map(|_| ())
    }
}

impl_facet!(
    TitleFacetViaMethod,
    TitleFacetViaAnnotations,
    ImmutableFacetImpl,
    ValueFacetImpl,
    EntityFacetAnnotation,
    MixinFacetImpl,
    IconFacetViaMethod,
    CssClassFacetImpl,
);

#[cfg(test)]
mod tests {
    use std::{str::FromStr, sync::Arc};

    use super::*;
    use crate::metamodel::reflect::{MethodBuilder, TypeRef};

    struct Customer {
        first: &'static str,
        last: Option<&'static str>,
    }

    fn accessor(name: &str, f: fn(&Customer) -> Value) -> MethodDescriptorRc {
        Arc::new(
            MethodBuilder::new(name)
                .returns(TypeRef::value("String"))
                .invoker(move |target, _| {
                    target
                        .and_then(|t| t.downcast_ref::<Customer>())
                        .map(f)
                        .ok_or_else(|| "not a customer".to_string())
                })
                .build_method(),
        )
    }

    #[test]
    fn test_composite_title_skips_nulls() {
        let id = FeatureIdentifier::type_id("Customer");
        let facet = TitleFacetViaAnnotations::new(
            &id,
            vec![
                TitleComponent {
                    sequence: "1".into(),
                    prepend: String::new(),
                    append: " ".into(),
                    accessor: accessor("getFirst", |c| Value::from(c.first)),
                },
                TitleComponent {
                    sequence: "2".into(),
                    prepend: "(".into(),
                    append: ")".into(),
                    accessor: accessor("getLast", |c| Value::from(c.last)),
                },
            ],
        );

        let full = Customer {
            first: "Ada",
            last: Some("Lovelace"),
        };
        let partial = Customer {
            first: "Ada",
            last: None,
        };
        assert_eq!(facet.title(&full).unwrap(), "Ada (Lovelace)");
        assert_eq!(facet.title(&partial).unwrap(), "Ada");
    }

    #[test]
    fn test_title_reports_invocation_failure() {
        let id = FeatureIdentifier::type_id("Customer");
        let facet = TitleFacetViaMethod::new(&id, accessor("title", |c| Value::from(c.first)));
        assert!(facet.title(&"not a customer").is_err());
    }

    #[test]
    fn test_identity_strategy_parse() {
        assert_eq!(
            IdentityStrategy::from_str("APPLICATION").unwrap(),
            IdentityStrategy::Application
        );
        assert_eq!(IdentityStrategy::Datastore.to_string(), "datastore");
    }

    #[test]
    fn test_callback_kinds_are_distinct() {
        assert_eq!(Created::METHOD, "created");
        assert_eq!(Removing::METHOD, "removing");

        let id = FeatureIdentifier::type_id("Customer");
        let method = Arc::new(MethodBuilder::new("loaded").returning(Value::Null).build_method());
        let facet: CallbackFacetViaMethod<Loaded> = CallbackFacetViaMethod::new(&id, method);
        assert!(facet.invoke(&()).is_ok());
        assert!(format!("{facet:?}").contains("loaded"));
    }
}
