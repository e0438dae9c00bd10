//! Raw class descriptors consumed by the facet factory pipeline.
//!
//! The metamodel is built from an explicit, immutable description of every domain class:
//! its annotations, its declared methods (with parameters, modifiers and an optional
//! invoker standing in for reflective invocation), its constructors and its supertypes.
//! Descriptors are produced by the host application, usually through [`ClassBuilder`], and
//! served to the loader through a [`ClassRepository`].
//!
//! # Key Components
//!
//! - [`ClassDescriptor`] / [`MethodDescriptor`] / [`ParameterDescriptor`] - the raw class model
//! - [`Annotation`] / [`AnnotationValue`] - behavioral metadata attached to classes and methods
//! - [`TypeRef`] - declared return and parameter types
//! - [`Value`] / [`MethodInvoker`] - runtime values and invocation of domain methods
//! - [`ClassRepository`] / [`MemoryClassRepository`] - lookup of descriptors by class name
//!
//! # Examples
//!
//! ```rust
//! use facetmodel::metamodel::reflect::{
//!     Annotation, ClassBuilder, ClassRepository, MemoryClassRepository, MethodBuilder, TypeRef,
//! };
//!
//! let customer = ClassBuilder::new("Customer")
//!     .annotate(Annotation::new("DomainObject"))
//!     .method(MethodBuilder::new("getName").returns(TypeRef::value("String")))
//!     .build()?;
//!
//! let repository = MemoryClassRepository::new();
//! repository.register(customer);
//! assert!(repository.find_class("Customer").is_some());
//! # Ok::<(), facetmodel::Error>(())
//! ```

mod builder;

use std::{any::Any, fmt, sync::Arc};

use bitflags::bitflags;
use dashmap::DashMap;

pub use builder::{ClassBuilder, MethodBuilder};

use crate::{metamodel::identifier::FeatureIdentifier, Error, Result};

/// Reference to a `ClassDescriptor`
pub type ClassDescriptorRc = Arc<ClassDescriptor>;
/// Reference to a `MethodDescriptor`
pub type MethodDescriptorRc = Arc<MethodDescriptor>;

/// A runtime value produced by invoking a domain method
#[derive(Clone, Default)]
pub enum Value {
    /// No value (`null`)
    #[default]
    Null,
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    Str(String),
    /// A list of values
    List(Vec<Value>),
    /// An opaque domain object
    Object(Arc<dyn Any + Send + Sync>),
}

impl Value {
    /// Returns true for [`Value::Null`]
    #[must_use]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// String content, if this is a string
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean content, if this is a boolean
    #[must_use]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Interprets a support method result as a veto reason.
    ///
    /// `null` and the empty string mean "no veto"; `true` vetoes without a specific reason;
    /// any other string is the reason itself.
    #[must_use]
    pub fn into_reason(self, default_reason: &str) -> Option<String> {
        match self {
            Value::Null | Value::Bool(false) => None,
            Value::Str(s) if s.is_empty() => None,
            Value::Str(s) => Some(s),
            Value::Bool(true) => Some(default_reason.to_string()),
            _ => Some(default_reason.to_string()),
        }
    }

    /// Flattens the value into a list (a non-list value becomes a one-element list)
    #[must_use]
    pub fn into_list(self) -> Vec<Value> {
        match self {
            Value::Null => Vec::new(),
            Value::List(items) => items,
            other => vec![other],
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => write!(f, "Null"),
            Value::Bool(b) => write!(f, "Bool({b})"),
            Value::Int(i) => write!(f, "Int({i})"),
            Value::Str(s) => write!(f, "Str({s:?})"),
            Value::List(items) => f.debug_tuple("List").field(items).finish(),
            Value::Object(_) => write!(f, "Object(..)"),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => Ok(()),
            Value::Bool(b) => write!(f, "{b}"),
            Value::Int(i) => write!(f, "{i}"),
            Value::Str(s) => write!(f, "{s}"),
            Value::List(items) => {
                let rendered: Vec<String> = items.iter().map(ToString::to_string).collect();
                write!(f, "{}", rendered.join(", "))
            }
            Value::Object(_) => write!(f, "<object>"),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(a), Value::Int(b)) => a == b,
            (Value::Str(a), Value::Str(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::Str(value)
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Value::Bool(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Value::Int(value)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map_or(Value::Null, Into::into)
    }
}

/// Signature of the closure behind a [`MethodInvoker`]
pub type InvokeFn =
    dyn Fn(Option<&dyn Any>, &[Value]) -> std::result::Result<Value, String> + Send + Sync;

/// Invokes a domain method on an (optional) target with positional arguments.
#[derive(Clone)]
pub struct MethodInvoker(Arc<InvokeFn>);

impl MethodInvoker {
    /// Wraps a closure as an invoker
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(Option<&dyn Any>, &[Value]) -> std::result::Result<Value, String>
            + Send
            + Sync
            + 'static,
    {
        MethodInvoker(Arc::new(f))
    }

    /// An invoker that always returns `value`
    pub fn constant(value: impl Into<Value>) -> Self {
        let value = value.into();
        MethodInvoker::new(move |_, _| Ok(value.clone()))
    }

    /// Calls the wrapped closure
    ///
    /// # Errors
    /// Returns the message produced by the domain method on failure.
    pub fn invoke(
        &self,
        target: Option<&dyn Any>,
        args: &[Value],
    ) -> std::result::Result<Value, String> {
        (self.0)(target, args)
    }
}

impl fmt::Debug for MethodInvoker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "MethodInvoker")
    }
}

/// A single annotation argument value
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    /// Boolean
    Bool(bool),
    /// Integer
    Int(i64),
    /// String
    Str(String),
    /// Enum constant (by name)
    Enum(String),
    /// Array of values
    Array(Vec<AnnotationValue>),
}

impl From<bool> for AnnotationValue {
    fn from(value: bool) -> Self {
        AnnotationValue::Bool(value)
    }
}

impl From<i64> for AnnotationValue {
    fn from(value: i64) -> Self {
        AnnotationValue::Int(value)
    }
}

impl From<&str> for AnnotationValue {
    fn from(value: &str) -> Self {
        AnnotationValue::Str(value.to_string())
    }
}

impl From<String> for AnnotationValue {
    fn from(value: String) -> Self {
        AnnotationValue::Str(value)
    }
}

/// Behavioral metadata attached to a class, method or parameter
#[derive(Debug, Clone, PartialEq)]
pub struct Annotation {
    /// Simple name of the annotation type (e.g. `Hidden`, `MemberOrder`)
    pub name: String,
    /// Named arguments in declaration order
    pub args: Vec<(String, AnnotationValue)>,
}

impl Annotation {
    /// Creates an annotation without arguments
    pub fn new(name: impl Into<String>) -> Self {
        Annotation {
            name: name.into(),
            args: Vec::new(),
        }
    }

    /// Adds a named argument, builder style
    #[must_use]
    pub fn with(mut self, key: impl Into<String>, value: impl Into<AnnotationValue>) -> Self {
        self.args.push((key.into(), value.into()));
        self
    }

    /// Adds an enum-valued argument, builder style
    #[must_use]
    pub fn with_enum(mut self, key: impl Into<String>, constant: impl Into<String>) -> Self {
        self.args
            .push((key.into(), AnnotationValue::Enum(constant.into())));
        self
    }

    /// Raw argument by name
    #[must_use]
    pub fn arg(&self, key: &str) -> Option<&AnnotationValue> {
        self.args.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    /// String argument (enum constants are returned by name)
    #[must_use]
    pub fn str_arg(&self, key: &str) -> Option<&str> {
        match self.arg(key)? {
            AnnotationValue::Str(s) | AnnotationValue::Enum(s) => Some(s),
            _ => None,
        }
    }

    /// Boolean argument
    #[must_use]
    pub fn bool_arg(&self, key: &str) -> Option<bool> {
        match self.arg(key)? {
            AnnotationValue::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Integer argument
    #[must_use]
    pub fn int_arg(&self, key: &str) -> Option<i64> {
        match self.arg(key)? {
            AnnotationValue::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns true if the string/enum argument `key` equals `expected` (case-insensitive)
    #[must_use]
    pub fn arg_is(&self, key: &str, expected: &str) -> bool {
        self.str_arg(key)
            .is_some_and(|v| v.eq_ignore_ascii_case(expected))
    }
}

/// Access to the annotations of a reflected element
pub trait Annotated {
    /// All annotations in declaration order
    fn annotations(&self) -> &[Annotation];

    /// The first annotation called `name`
    fn annotation(&self, name: &str) -> Option<&Annotation> {
        self.annotations().iter().find(|a| a.name == name)
    }

    /// Returns true if an annotation called `name` is present
    fn has_annotation(&self, name: &str) -> bool {
        self.annotation(name).is_some()
    }
}

/// Declared type of a return value or parameter
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeRef {
    /// No value
    Void,
    /// A built-in value type (`String`, `int`, `boolean`, ...)
    Value(String),
    /// A domain class
    Class(String),
    /// A collection of domain objects
    Collection(String),
}

impl TypeRef {
    /// Built-in value type
    pub fn value(name: impl Into<String>) -> Self {
        TypeRef::Value(name.into())
    }

    /// Domain class
    pub fn class(name: impl Into<String>) -> Self {
        TypeRef::Class(name.into())
    }

    /// Collection of a domain class
    pub fn collection(element: impl Into<String>) -> Self {
        TypeRef::Collection(element.into())
    }

    /// Returns true for [`TypeRef::Void`]
    #[must_use]
    pub fn is_void(&self) -> bool {
        matches!(self, TypeRef::Void)
    }

    /// Returns true for [`TypeRef::Collection`]
    #[must_use]
    pub fn is_collection(&self) -> bool {
        matches!(self, TypeRef::Collection(_))
    }

    /// Returns true for the boolean value types
    #[must_use]
    pub fn is_boolean(&self) -> bool {
        matches!(self, TypeRef::Value(name) if matches!(name.as_str(), "boolean" | "bool" | "Boolean"))
    }

    /// The domain class referenced by this type (the element type for collections)
    #[must_use]
    pub fn referenced_class(&self) -> Option<&str> {
        match self {
            TypeRef::Class(name) | TypeRef::Collection(name) => Some(name),
            _ => None,
        }
    }
}

impl fmt::Display for TypeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TypeRef::Void => write!(f, "void"),
            TypeRef::Value(name) | TypeRef::Class(name) => write!(f, "{name}"),
            TypeRef::Collection(name) => write!(f, "Collection<{name}>"),
        }
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Method modifiers
    pub struct MethodModifiers: u32 {
        /// Method is public
        const PUBLIC = 0x0001;
        /// Method is static
        const STATIC = 0x0008;
        /// Method is abstract
        const ABSTRACT = 0x0400;
        /// Method was generated by the compiler
        const SYNTHETIC = 0x1000;
    }
}

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    /// Class modifiers
    pub struct ClassModifiers: u32 {
        /// Class is abstract
        const ABSTRACT = 0x0400;
        /// Class is an interface
        const INTERFACE = 0x0200;
        /// Class cannot be subclassed
        const FINAL = 0x0010;
    }
}

/// A declared method parameter
#[derive(Debug, Clone, PartialEq)]
pub struct ParameterDescriptor {
    /// Parameter name as declared
    pub name: String,
    /// Declared type
    pub param_type: TypeRef,
    /// Parameter annotations
    pub annotations: Vec<Annotation>,
}

impl ParameterDescriptor {
    /// Creates a parameter without annotations
    pub fn new(name: impl Into<String>, param_type: TypeRef) -> Self {
        ParameterDescriptor {
            name: name.into(),
            param_type,
            annotations: Vec::new(),
        }
    }

    /// Adds an annotation, builder style
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.annotations.push(annotation);
        self
    }
}

impl Annotated for ParameterDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// A declared method of a domain class
#[derive(Debug, Clone)]
pub struct MethodDescriptor {
    /// Method name
    pub name: String,
    /// Declared return type
    pub return_type: TypeRef,
    /// Parameters in declaration order
    pub parameters: Vec<ParameterDescriptor>,
    /// Method annotations
    pub annotations: Vec<Annotation>,
    /// Modifiers
    pub modifiers: MethodModifiers,
    /// Invocation entry point (absent for purely declarative descriptors)
    pub invoker: Option<MethodInvoker>,
}

impl MethodDescriptor {
    /// Number of declared parameters
    #[must_use]
    pub fn param_count(&self) -> usize {
        self.parameters.len()
    }

    /// Returns true if the method is static
    #[must_use]
    pub fn is_static(&self) -> bool {
        self.modifiers.contains(MethodModifiers::STATIC)
    }

    /// Returns true if the method is public
    #[must_use]
    pub fn is_public(&self) -> bool {
        self.modifiers.contains(MethodModifiers::PUBLIC)
    }

    /// Invokes the method on behalf of `identifier`.
    ///
    /// # Errors
    /// Returns [`Error::Invocation`] if no invoker is bound or the domain method fails.
    pub fn invoke(
        &self,
        identifier: &FeatureIdentifier,
        target: Option<&dyn Any>,
        args: &[Value],
    ) -> Result<Value> {
        let Some(invoker) = &self.invoker else {
            return Err(Error::Invocation {
                identifier: identifier.clone(),
                message: format!("method '{}' has no invoker bound", self.name),
            });
        };

        invoker
            .invoke(target, args)
            .map_err(|message| Error::Invocation {
                identifier: identifier.clone(),
                message,
            })
    }
}

impl Annotated for MethodDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// The raw description of one domain class
#[derive(Debug, Clone)]
pub struct ClassDescriptor {
    /// Fully qualified class name
    pub name: String,
    /// Name of the superclass, if any
    pub superclass: Option<String>,
    /// Names of the directly implemented interfaces
    pub interfaces: Vec<String>,
    /// Class-level annotations
    pub annotations: Vec<Annotation>,
    /// Declared methods in declaration order
    pub methods: Vec<MethodDescriptorRc>,
    /// Constructors, as parameter type lists
    pub constructors: Vec<Vec<TypeRef>>,
    /// Modifiers
    pub modifiers: ClassModifiers,
}

impl ClassDescriptor {
    /// Class name without package/namespace prefix
    #[must_use]
    pub fn simple_name(&self) -> &str {
        self.name.rsplit(['.', ':']).next().unwrap_or(&self.name)
    }

    /// All declared methods called `name`
    pub fn methods_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a MethodDescriptorRc> {
        self.methods.iter().filter(move |m| m.name == name)
    }

    /// Returns true if the class is abstract or an interface
    #[must_use]
    pub fn is_abstract(&self) -> bool {
        self.modifiers
            .intersects(ClassModifiers::ABSTRACT | ClassModifiers::INTERFACE)
    }

    /// Returns true if the class is an interface
    #[must_use]
    pub fn is_interface(&self) -> bool {
        self.modifiers.contains(ClassModifiers::INTERFACE)
    }
}

impl Annotated for ClassDescriptor {
    fn annotations(&self) -> &[Annotation] {
        &self.annotations
    }
}

/// Source of class descriptors.
///
/// This is the seam through which the host application decides which classes belong to
/// the domain: a class the repository does not know is simply not part of the metamodel.
pub trait ClassRepository: Send + Sync {
    /// Looks up a class by its fully qualified name
    fn find_class(&self, name: &str) -> Option<ClassDescriptorRc>;

    /// Names of every known class
    fn class_names(&self) -> Vec<String>;
}

/// A [`ClassRepository`] backed by an in-memory concurrent map
#[derive(Default)]
pub struct MemoryClassRepository {
    classes: DashMap<String, ClassDescriptorRc>,
}

impl MemoryClassRepository {
    /// Creates an empty repository
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers (or replaces) a class
    pub fn register(&self, class: impl Into<ClassDescriptorRc>) {
        let class = class.into();
        self.classes.insert(class.name.clone(), class);
    }

    /// Number of registered classes
    #[must_use]
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Returns true if no class is registered
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassDescriptor> for MemoryClassRepository {
    fn from_iter<T: IntoIterator<Item = ClassDescriptor>>(iter: T) -> Self {
        let repository = MemoryClassRepository::new();
        for class in iter {
            repository.register(class);
        }
        repository
    }
}

impl ClassRepository for MemoryClassRepository {
    fn find_class(&self, name: &str) -> Option<ClassDescriptorRc> {
        self.classes.get(name).map(|entry| entry.value().clone())
    }

    fn class_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.classes.iter().map(|e| e.key().clone()).collect();
        names.sort();
        names
    }
}
