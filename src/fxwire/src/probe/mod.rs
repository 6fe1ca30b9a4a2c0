//! Metadata about injectable types.
//!
//! Rust has no runtime reflection, so the metadata the container works on is
//! generated at build time: `#[derive(Injectable)]` describes a struct's
//! fields and its embedded superclass, and `#[lifecycle]` describes the
//! post-construct and pre-destroy methods of an `impl` block. The generated
//! code lives next to the type, which is what lets the container write
//! private fields and call private methods.

mod descriptor;
mod target;

use std::error::Error;
use std::iter;

use snafu::prelude::*;

use crate::container::Managed;

pub use descriptor::{FieldDescriptor, Marker, MethodDescriptor, TypeDescriptor};
pub use target::InjectTarget;

/// The lifecycle callbacks declared directly on a type.
///
/// Implemented by `#[lifecycle]` on an `impl` block, or left empty by
/// `#[derive(Injectable)]` when the type declares no callbacks.
pub trait Lifecycle {
    /// Methods of this type (not of its superclass) carrying a lifecycle
    /// marker, in declaration order.
    fn declared_methods(&self) -> &'static [MethodDescriptor] {
        &[]
    }

    /// Invokes a method on an instance which is still exclusively owned,
    /// which is the case for post-construct callbacks.
    ///
    /// # Errors
    ///
    /// Returns an error if the method is unknown or reports a failure.
    fn invoke_mut(&mut self, method: &MethodDescriptor) -> Result<(), ProbeError> {
        Err(ProbeError::no_such_method(method.name()))
    }

    /// Invokes a method on a shared instance, which is the case for
    /// pre-destroy callbacks.
    ///
    /// # Errors
    ///
    /// Returns an error if the method is unknown, needs exclusive access or
    /// reports a failure.
    fn invoke(&self, method: &MethodDescriptor) -> Result<(), ProbeError> {
        Err(ProbeError::no_such_method(method.name()))
    }
}

/// An object whose fields can be wired by the container.
///
/// A type's "superclass" is a struct embedded in it and marked with
/// `#[inject(parent)]`. Walking [`Injectable::superclass`] repeatedly visits
/// the chain from the most derived type up to the root.
pub trait Injectable: Lifecycle + Managed {
    /// Describes the type declaring the fields returned by
    /// [`Injectable::declared_fields`].
    fn dyn_descriptor(&self) -> &'static TypeDescriptor;

    /// Fields declared directly on this type, in declaration order. The
    /// superclass is not a field.
    fn declared_fields(&self) -> &'static [FieldDescriptor];

    fn superclass(&self) -> Option<&dyn Injectable> {
        None
    }

    fn superclass_mut(&mut self) -> Option<&mut dyn Injectable> {
        None
    }

    /// Writes `value` into `field`, which must be declared on this type.
    ///
    /// # Errors
    ///
    /// Returns an error if the field is not injectable or the value doesn't
    /// fit the field's type.
    fn set_field(&mut self, field: &FieldDescriptor, value: Box<dyn Managed>)
        -> Result<(), ProbeError>;
}

/// A static variant of the [`Injectable`] trait, which allows the container to
/// look up a type's descriptor without an instance.
pub trait TypedInjectable: Injectable + Sized {
    fn descriptor() -> &'static TypeDescriptor;
}

/// Iterates over `instance` and its superclasses, from the most derived type
/// to the root.
pub fn class_chain(instance: &dyn Injectable) -> impl Iterator<Item = &dyn Injectable> {
    iter::successors(Some(instance), |level| level.superclass())
}

/// Finds out whether any level of the class chain declares a method with
/// `marker`.
pub fn has_lifecycle_method(instance: &dyn Injectable, marker: Marker) -> bool {
    class_chain(instance).any(|level| {
        level
            .declared_methods()
            .iter()
            .any(|method| method.has_marker(marker))
    })
}

/// The outcome of a lifecycle method. Methods may return `()` or a
/// `Result<(), E>`.
pub trait LifecycleOutcome {
    fn into_outcome(self) -> Result<(), Box<dyn Error + Send + Sync>>;
}

impl LifecycleOutcome for () {
    fn into_outcome(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        Ok(())
    }
}

impl<E> LifecycleOutcome for Result<(), E>
where
    E: Into<Box<dyn Error + Send + Sync>>,
{
    fn into_outcome(self) -> Result<(), Box<dyn Error + Send + Sync>> {
        self.map_err(Into::into)
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ProbeError {
    #[snafu(display("field `{field}` is not marked for injection"))]
    #[non_exhaustive]
    FieldNotInjectable { field: &'static str },
    #[snafu(display("field `{field}` cannot hold a value of type {value_type}"))]
    #[non_exhaustive]
    IncompatibleValue {
        field: &'static str,
        value_type: &'static str,
    },
    #[snafu(display("method `{method}` is not a lifecycle method"))]
    #[non_exhaustive]
    NoSuchMethod { method: &'static str },
    #[snafu(display("method `{method}` needs exclusive access to the instance"))]
    #[non_exhaustive]
    ExclusiveAccess { method: &'static str },
    #[snafu(display("method `{method}` failed"))]
    #[non_exhaustive]
    Invocation {
        method: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
}

impl ProbeError {
    pub fn field_not_injectable(field: &'static str) -> Self {
        Self::FieldNotInjectable { field }
    }

    pub fn incompatible_value(field: &'static str, value: &dyn Managed) -> Self {
        Self::IncompatibleValue {
            field,
            value_type: value.type_name(),
        }
    }

    pub fn no_such_method(method: &'static str) -> Self {
        Self::NoSuchMethod { method }
    }

    pub fn exclusive_access(method: &'static str) -> Self {
        Self::ExclusiveAccess { method }
    }

    pub fn invocation(method: &'static str, source: Box<dyn Error + Send + Sync>) -> Self {
        Self::Invocation { method, source }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::{lifecycle, Injectable};

    use super::*;

    #[derive(Default, Injectable)]
    #[injectable(lifecycle)]
    struct Base {
        #[inject]
        title: String,
        started: bool,
    }

    #[lifecycle]
    impl Base {
        #[post_construct]
        fn start(&mut self) {
            self.started = true;
        }

        #[pre_destroy]
        fn stop(&self) -> Result<(), String> {
            Err(String::from("still running"))
        }
    }

    #[derive(Default, Injectable)]
    struct Derived {
        #[inject]
        base_service: Option<Arc<Service>>,
        #[inject(parent)]
        base: Base,
    }

    #[derive(Default, Injectable)]
    struct Service;

    #[test]
    fn class_chain_succeeds() {
        let derived = Derived::default();
        let names: Vec<_> = class_chain(&derived)
            .map(|level| level.dyn_descriptor().short_name())
            .collect();
        assert_eq!(names, vec!["Derived", "Base"]);
    }

    #[test]
    fn declared_fields_succeeds() {
        let derived = Derived::default();
        let fields = derived.declared_fields();
        assert_eq!(fields.len(), 1);
        assert_eq!(fields[0].name(), "base_service");
        assert_eq!(fields[0].dependency(), Some(Service::descriptor()));

        let fields = derived.base.declared_fields();
        assert_eq!(fields.len(), 2);
        assert!(fields[0].has_marker(Marker::Inject));
        assert!(fields[0].dependency().is_none());
        assert!(!fields[1].has_marker(Marker::Inject));
    }

    #[test]
    fn set_field_succeeds() {
        let mut base = Base::default();
        let field = &base.declared_fields()[0];
        base.set_field(field, Box::new(String::from("hello"))).unwrap();
        assert_eq!(base.title, "hello");
    }

    #[test]
    fn set_field_fails_when_value_is_incompatible() {
        let mut base = Base::default();
        let field = &base.declared_fields()[0];
        let err = base.set_field(field, Box::new(vec![1u8])).unwrap_err();
        assert!(matches!(err, ProbeError::IncompatibleValue { field: "title", .. }));
    }

    #[test]
    fn set_field_fails_when_field_is_not_injectable() {
        let mut base = Base::default();
        let field = &base.declared_fields()[1];
        let err = base.set_field(field, Box::new(true)).unwrap_err();
        assert!(matches!(err, ProbeError::FieldNotInjectable { field: "started" }));
    }

    #[test]
    fn invoke_succeeds() {
        let mut base = Base::default();
        let methods = base.declared_methods();
        assert_eq!(methods.len(), 2);

        base.invoke_mut(&methods[0]).unwrap();
        assert!(base.started);

        let err = base.invoke(&methods[1]).unwrap_err();
        assert!(matches!(err, ProbeError::Invocation { method: "stop", .. }));
    }

    #[test]
    fn invoke_fails_when_method_needs_exclusive_access() {
        let base = Base::default();
        let start = &base.declared_methods()[0];
        assert!(matches!(
            base.invoke(start),
            Err(ProbeError::ExclusiveAccess { method: "start" })
        ));
    }

    #[test]
    fn has_lifecycle_method_succeeds() {
        let derived = Derived::default();
        assert!(has_lifecycle_method(&derived, Marker::PostConstruct));
        assert!(has_lifecycle_method(&derived, Marker::PreDestroy));
        assert!(!has_lifecycle_method(&Service, Marker::PreDestroy));
    }
}
