//! The process-wide container and functions forwarding to it.
//!
//! Applications which don't want to pass a [`Container`] around can use these
//! functions instead. They all operate on the same lazily created container.

use std::sync::Arc;

use once_cell::sync::Lazy;

use crate::config::ConfigurationSource;
use crate::container::factory::InstanceFactory;
use crate::container::{Container, InjectorError};
use crate::context::InjectionContext;
use crate::probe::{Injectable, TypedInjectable};

static GLOBAL_CONTAINER: Lazy<Container> = Lazy::new(Container::new);

/// Provides a reference to the global container.
pub fn global() -> &'static Container {
    &GLOBAL_CONTAINER
}

pub fn set_instance_supplier<F>(factory: F)
where
    F: InstanceFactory,
{
    global().set_instance_supplier(factory);
}

pub fn reset_instance_supplier() {
    global().reset_instance_supplier();
}

pub fn set_configuration_source<S>(source: S)
where
    S: ConfigurationSource,
{
    global().set_configuration_source(source);
}

pub fn reset_configuration_source() {
    global().reset_configuration_source();
}

/// # Errors
///
/// See [`Container::instantiate_model_or_service`].
pub fn instantiate_model_or_service<T>() -> Result<Arc<T>, InjectorError>
where
    T: TypedInjectable,
{
    global().instantiate_model_or_service()
}

/// # Errors
///
/// See [`Container::instantiate_model_or_service_with`].
pub fn instantiate_model_or_service_with<T, C>(context: &C) -> Result<Arc<T>, InjectorError>
where
    T: TypedInjectable,
    C: InjectionContext,
{
    global().instantiate_model_or_service_with(context)
}

pub fn set_model_or_service<T>(instance: Arc<T>)
where
    T: TypedInjectable,
{
    global().set_model_or_service(instance);
}

/// # Errors
///
/// See [`Container::instantiate_presenter`].
pub fn instantiate_presenter<T>() -> Result<Arc<T>, InjectorError>
where
    T: TypedInjectable,
{
    global().instantiate_presenter()
}

/// # Errors
///
/// See [`Container::instantiate_presenter_with`].
pub fn instantiate_presenter_with<T, C>(context: &C) -> Result<Arc<T>, InjectorError>
where
    T: TypedInjectable,
    C: InjectionContext,
{
    global().instantiate_presenter_with(context)
}

/// # Errors
///
/// See [`Container::register_existing_and_inject`].
pub fn register_existing_and_inject<T>(instance: T) -> Result<Arc<T>, InjectorError>
where
    T: TypedInjectable,
{
    global().register_existing_and_inject(instance)
}

/// # Errors
///
/// See [`Container::register_existing_and_inject_with`].
pub fn register_existing_and_inject_with<T, C>(
    instance: T,
    context: &C,
) -> Result<Arc<T>, InjectorError>
where
    T: TypedInjectable,
    C: InjectionContext,
{
    global().register_existing_and_inject_with(instance, context)
}

/// # Errors
///
/// See [`Container::inject_members_with`].
pub fn inject_members<C>(instance: &mut dyn Injectable, context: &C) -> Result<(), InjectorError>
where
    C: InjectionContext,
{
    global().inject_members_with(instance, context)
}

/// # Errors
///
/// See [`Container::forget_all`].
pub fn forget_all() -> Result<(), InjectorError> {
    global().forget_all()
}
