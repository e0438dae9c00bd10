//! Builders for class and method descriptors.
//!
//! [`ClassBuilder`] and [`MethodBuilder`] offer a fluent API for describing domain classes
//! the way a reflective runtime would see them.
//!
//! # Example
//!
//! ```rust
//! use facetmodel::metamodel::reflect::{Annotation, ClassBuilder, MethodBuilder, TypeRef, Value};
//!
//! let customer = ClassBuilder::new("Customer")
//!     .extends("Party")
//!     .method(
//!         MethodBuilder::new("getName")
//!             .returns(TypeRef::value("String"))
//!             .annotate(Annotation::new("MemberOrder").with("sequence", "1")),
//!     )
//!     .method(MethodBuilder::new("disableName").returns(TypeRef::value("String")).returning("Locked"))
//!     .build()?;
//!
//! assert_eq!(customer.methods.len(), 2);
//! assert_eq!(customer.superclass.as_deref(), Some("Party"));
//! # Ok::<(), facetmodel::Error>(())
//! ```

use std::{any::Any, sync::Arc};

use crate::{
    metamodel::{
        identifier::FeatureIdentifier,
        reflect::{
            Annotation, ClassDescriptor, ClassModifiers, MethodDescriptor, MethodInvoker,
            MethodModifiers, ParameterDescriptor, TypeRef, Value,
        },
    },
    Result,
};

/// Provides a fluent API for building method descriptors
pub struct MethodBuilder {
    method: MethodDescriptor,
}

impl MethodBuilder {
    /// Starts a public, void, parameterless method
    pub fn new(name: impl Into<String>) -> Self {
        MethodBuilder {
            method: MethodDescriptor {
                name: name.into(),
                return_type: TypeRef::Void,
                parameters: Vec::new(),
                annotations: Vec::new(),
                modifiers: MethodModifiers::PUBLIC,
                invoker: None,
            },
        }
    }

    /// Sets the return type
    #[must_use]
    pub fn returns(mut self, return_type: TypeRef) -> Self {
        self.method.return_type = return_type;
        self
    }

    /// Appends a parameter
    #[must_use]
    pub fn param(mut self, name: impl Into<String>, param_type: TypeRef) -> Self {
        self.method
            .parameters
            .push(ParameterDescriptor::new(name, param_type));
        self
    }

    /// Appends a fully described parameter
    #[must_use]
    pub fn parameter(mut self, parameter: ParameterDescriptor) -> Self {
        self.method.parameters.push(parameter);
        self
    }

    /// Adds an annotation
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.method.annotations.push(annotation);
        self
    }

    /// Replaces the modifiers
    #[must_use]
    pub fn modifiers(mut self, modifiers: MethodModifiers) -> Self {
        self.method.modifiers = modifiers;
        self
    }

    /// Marks the method static
    #[must_use]
    pub fn static_method(mut self) -> Self {
        self.method.modifiers |= MethodModifiers::STATIC;
        self
    }

    /// Binds an invoker
    #[must_use]
    pub fn invoker<F>(mut self, f: F) -> Self
    where
        F: Fn(Option<&dyn Any>, &[Value]) -> std::result::Result<Value, String>
            + Send
            + Sync
            + 'static,
    {
        self.method.invoker = Some(MethodInvoker::new(f));
        self
    }

    /// Binds an invoker that always returns `value`
    #[must_use]
    pub fn returning(mut self, value: impl Into<Value>) -> Self {
        self.method.invoker = Some(MethodInvoker::constant(value));
        self
    }

    /// Finishes the method
    #[must_use]
    pub fn build_method(self) -> MethodDescriptor {
        self.method
    }
}

/// Provides a fluent API for building class descriptors
pub struct ClassBuilder {
    class: ClassDescriptor,
    methods: Vec<MethodDescriptor>,
}

impl ClassBuilder {
    /// Starts a concrete class without supertypes
    pub fn new(name: impl Into<String>) -> Self {
        ClassBuilder {
            class: ClassDescriptor {
                name: name.into(),
                superclass: None,
                interfaces: Vec::new(),
                annotations: Vec::new(),
                methods: Vec::new(),
                constructors: Vec::new(),
                modifiers: ClassModifiers::empty(),
            },
            methods: Vec::new(),
        }
    }

    /// Sets the superclass
    #[must_use]
    pub fn extends(mut self, superclass: impl Into<String>) -> Self {
        self.class.superclass = Some(superclass.into());
        self
    }

    /// Adds an implemented interface
    #[must_use]
    pub fn implements(mut self, interface: impl Into<String>) -> Self {
        self.class.interfaces.push(interface.into());
        self
    }

    /// Adds a class-level annotation
    #[must_use]
    pub fn annotate(mut self, annotation: Annotation) -> Self {
        self.class.annotations.push(annotation);
        self
    }

    /// Adds a constructor with the given parameter types
    #[must_use]
    pub fn constructor(mut self, params: Vec<TypeRef>) -> Self {
        self.class.constructors.push(params);
        self
    }

    /// Replaces the modifiers
    #[must_use]
    pub fn modifiers(mut self, modifiers: ClassModifiers) -> Self {
        self.class.modifiers = modifiers;
        self
    }

    /// Appends a declared method
    #[must_use]
    pub fn method(mut self, method: MethodBuilder) -> Self {
        self.methods.push(method.build_method());
        self
    }

    /// Finishes the class
    ///
    /// # Errors
    /// Returns [`crate::Error::Construction`] if the class or one of its methods is unnamed,
    /// or if the class names itself as its own superclass.
    pub fn build(mut self) -> Result<ClassDescriptor> {
        let identifier = FeatureIdentifier::type_id(self.class.name.clone());
        if self.class.name.trim().is_empty() {
            return Err(construction_error!(identifier, "class name must not be empty"));
        }
        if self.class.superclass.as_deref() == Some(self.class.name.as_str()) {
            return Err(construction_error!(
                identifier,
                "class '{}' cannot extend itself",
                self.class.name
            ));
        }
        if let Some(unnamed) = self.methods.iter().position(|m| m.name.trim().is_empty()) {
            return Err(construction_error!(
                identifier,
                "method #{} has no name",
                unnamed
            ));
        }

        self.class.methods = self.methods.into_iter().map(Arc::new).collect();
        Ok(self.class)
    }
}
