use std::error::Error;

use snafu::prelude::*;

use crate::probe::{Injectable, TypeDescriptor};

/// Produces raw, not yet wired instances of injectable types.
///
/// The container asks its factory whenever it needs a new singleton or
/// presenter. Closures of the matching signature are factories too.
#[cfg_attr(test, mockall::automock)]
pub trait InstanceFactory: Send + Sync + 'static {
    /// Creates an instance of the type described by `descriptor`.
    ///
    /// # Errors
    ///
    /// Returns an error if the instance can't be created.
    fn create(
        &self,
        descriptor: &'static TypeDescriptor,
    ) -> Result<Box<dyn Injectable>, Box<dyn Error + Send + Sync>>;
}

impl<F> InstanceFactory for F
where
    F: Fn(&'static TypeDescriptor) -> Result<Box<dyn Injectable>, Box<dyn Error + Send + Sync>>
        + Send
        + Sync
        + 'static,
{
    fn create(
        &self,
        descriptor: &'static TypeDescriptor,
    ) -> Result<Box<dyn Injectable>, Box<dyn Error + Send + Sync>> {
        (self)(descriptor)
    }
}

/// The factory used unless another one is installed. It calls the
/// zero-argument constructor recorded by `#[derive(Injectable)]`.
#[derive(Debug, Clone, Copy)]
pub struct DefaultFactory;

impl InstanceFactory for DefaultFactory {
    fn create(
        &self,
        descriptor: &'static TypeDescriptor,
    ) -> Result<Box<dyn Injectable>, Box<dyn Error + Send + Sync>> {
        match descriptor.construct() {
            Some(instance) => Ok(instance),
            None => Err(Box::new(FactoryError::NoConstructor {
                type_name: descriptor.name(),
            })),
        }
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum FactoryError {
    #[snafu(display("{type_name} has no zero-argument constructor"))]
    #[non_exhaustive]
    NoConstructor { type_name: &'static str },
}
