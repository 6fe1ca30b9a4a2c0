//! Per-call values, looked up by the bare field name.

use std::collections::HashMap;

use crate::container::Managed;

/// A lookup passed along with a single request. It is consulted after the
/// configuration and before the container falls back to singletons.
pub trait InjectionContext {
    fn lookup(&self, field_name: &str) -> Option<Box<dyn Managed>>;
}

impl<F> InjectionContext for F
where
    F: Fn(&str) -> Option<Box<dyn Managed>>,
{
    fn lookup(&self, field_name: &str) -> Option<Box<dyn Managed>> {
        (self)(field_name)
    }
}

/// Pins down the signature of a closure used as an [`InjectionContext`].
pub fn from_fn<F>(lookup: F) -> F
where
    F: Fn(&str) -> Option<Box<dyn Managed>>,
{
    lookup
}

/// The context used when the caller doesn't pass one. It knows nothing.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyContext;

impl InjectionContext for EmptyContext {
    fn lookup(&self, _field_name: &str) -> Option<Box<dyn Managed>> {
        None
    }
}

/// A context backed by a map from field names to values. Each lookup hands
/// out a clone of the stored value.
#[derive(Default)]
pub struct ContextMap {
    values: HashMap<String, Box<dyn ContextValue>>,
}

impl ContextMap {
    pub fn new() -> Self {
        Self {
            values: HashMap::new(),
        }
    }

    pub fn insert<T>(&mut self, field_name: impl Into<String>, value: T) -> &mut Self
    where
        T: Managed + Clone,
    {
        self.values.insert(field_name.into(), Box::new(value));
        self
    }

    pub fn with<T>(mut self, field_name: impl Into<String>, value: T) -> Self
    where
        T: Managed + Clone,
    {
        self.insert(field_name, value);
        self
    }

    pub fn contains(&self, field_name: &str) -> bool {
        self.values.contains_key(field_name)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl InjectionContext for ContextMap {
    fn lookup(&self, field_name: &str) -> Option<Box<dyn Managed>> {
        self.values
            .get(field_name)
            .map(|value| (**value).dyn_clone_value())
    }
}

trait ContextValue: Send + Sync {
    fn dyn_clone_value(&self) -> Box<dyn Managed>;
}

impl<T> ContextValue for T
where
    T: Managed + Clone,
{
    fn dyn_clone_value(&self) -> Box<dyn Managed> {
        Box::new(self.clone())
    }
}
