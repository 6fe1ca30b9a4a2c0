use std::sync::Arc;

use crate::config::ConfigurationSource;
use crate::container::core::ContainerCore;
use crate::container::factory::InstanceFactory;
use crate::container::registry::Registry;
use crate::container::InjectorError;
use crate::context::{EmptyContext, InjectionContext};
use crate::probe::{Injectable, TypedInjectable};
use crate::util::any::Downcast;

/// A handle to a container. Clones share the same singletons, presenters,
/// instance supplier and configuration source.
#[derive(Clone)]
pub struct Container {
    core: Arc<ContainerCore>,
}

impl Container {
    pub fn new() -> Self {
        Self {
            core: Arc::new(ContainerCore::new()),
        }
    }

    /// Replaces the factory used to create raw instances.
    pub fn set_instance_supplier<F>(&self, factory: F)
    where
        F: InstanceFactory,
    {
        self.core.set_instance_supplier(Arc::new(factory));
    }

    /// Goes back to creating instances with their zero-argument constructor.
    pub fn reset_instance_supplier(&self) {
        self.core.reset_instance_supplier();
    }

    pub fn set_configuration_source<S>(&self, source: S)
    where
        S: ConfigurationSource,
    {
        self.core.configurator().set(source);
    }

    pub fn reset_configuration_source(&self) {
        self.core.configurator().forget_all();
    }

    /// Returns the singleton of `T`, creating and wiring it on first use.
    ///
    /// # Errors
    ///
    /// Returns an error if `T` or one of its dependencies can't be created,
    /// wired or initialized.
    pub fn instantiate_model_or_service<T>(&self) -> Result<Arc<T>, InjectorError>
    where
        T: TypedInjectable,
    {
        self.instantiate_model_or_service_with(&EmptyContext)
    }

    /// Same as [`Container::instantiate_model_or_service`], consulting
    /// `context` for values while the singleton and its dependencies are
    /// wired. The context has no effect if the singleton already exists.
    ///
    /// # Errors
    ///
    /// Returns an error if `T` or one of its dependencies can't be created,
    /// wired or initialized.
    pub fn instantiate_model_or_service_with<T, C>(
        &self,
        context: &C,
    ) -> Result<Arc<T>, InjectorError>
    where
        T: TypedInjectable,
        C: InjectionContext,
    {
        let instance = self.core.instantiate_singleton(T::descriptor(), context)?;
        downcast_instance(instance)
    }

    /// Makes `instance` the singleton of `T`, replacing any existing one. The
    /// instance is neither wired nor initialized.
    pub fn set_model_or_service<T>(&self, instance: Arc<T>)
    where
        T: TypedInjectable,
    {
        self.core.set_singleton(instance);
    }

    /// Creates a fresh, wired presenter of type `T`.
    ///
    /// # Errors
    ///
    /// Returns an error if `T` or one of its dependencies can't be created,
    /// wired or initialized.
    pub fn instantiate_presenter<T>(&self) -> Result<Arc<T>, InjectorError>
    where
        T: TypedInjectable,
    {
        self.instantiate_presenter_with(&EmptyContext)
    }

    /// # Errors
    ///
    /// Returns an error if `T` or one of its dependencies can't be created,
    /// wired or initialized.
    pub fn instantiate_presenter_with<T, C>(&self, context: &C) -> Result<Arc<T>, InjectorError>
    where
        T: TypedInjectable,
        C: InjectionContext,
    {
        let instance = self.core.instantiate_presenter(T::descriptor(), context)?;
        downcast_instance(instance)
    }

    /// Wires an object created outside the container, runs its
    /// post-construct methods and tracks it like a presenter.
    ///
    /// # Errors
    ///
    /// Returns an error if a field can't be written, a dependency can't be
    /// created or a post-construct method fails.
    pub fn register_existing_and_inject<T>(&self, instance: T) -> Result<Arc<T>, InjectorError>
    where
        T: TypedInjectable,
    {
        self.register_existing_and_inject_with(instance, &EmptyContext)
    }

    /// # Errors
    ///
    /// Returns an error if a field can't be written, a dependency can't be
    /// created or a post-construct method fails.
    pub fn register_existing_and_inject_with<T, C>(
        &self,
        mut instance: T,
        context: &C,
    ) -> Result<Arc<T>, InjectorError>
    where
        T: TypedInjectable,
        C: InjectionContext,
    {
        self.core.inject_and_initialize(&mut instance, context)?;
        let instance = Arc::new(instance);
        self.core.track_presenter(instance.clone());
        Ok(instance)
    }

    /// Injects the fields of `instance` without running lifecycle methods or
    /// remembering it.
    ///
    /// # Errors
    ///
    /// Returns an error if a field can't be written or a dependency can't be
    /// created.
    pub fn inject_members(&self, instance: &mut dyn Injectable) -> Result<(), InjectorError> {
        self.core.inject_members(instance, &EmptyContext)
    }

    /// # Errors
    ///
    /// Returns an error if a field can't be written or a dependency can't be
    /// created.
    pub fn inject_members_with<C>(
        &self,
        instance: &mut dyn Injectable,
        context: &C,
    ) -> Result<(), InjectorError>
    where
        C: InjectionContext,
    {
        self.core.inject_members(instance, context)
    }

    /// Runs the pre-destroy methods of every singleton and live presenter,
    /// then forgets all of them and resets the instance supplier and the
    /// configuration source.
    ///
    /// # Errors
    ///
    /// Returns every pre-destroy failure at once, after the teardown has
    /// completed.
    pub fn forget_all(&self) -> Result<(), InjectorError> {
        self.core.forget_all()
    }

    pub fn registry(&self) -> &Registry {
        self.core.registry()
    }
}

fn downcast_instance<T>(instance: Arc<dyn Injectable>) -> Result<Arc<T>, InjectorError>
where
    T: TypedInjectable,
{
    instance
        .downcast::<T>()
        .map_err(|other| InjectorError::UnexpectedInstance {
            type_name: T::descriptor().name(),
            actual: other.dyn_descriptor().name(),
        })
}
