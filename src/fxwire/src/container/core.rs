use std::sync::Arc;

use parking_lot::RwLock;
use snafu::prelude::*;
use tracing::{debug, trace, warn};

use crate::config::Configurator;
use crate::container::error::{
    FieldWriteSnafu, InstantiationSnafu, SelfReferenceSnafu, ShutdownSnafu,
    UnexpectedInstanceSnafu,
};
use crate::container::factory::{DefaultFactory, InstanceFactory};
use crate::container::registry::Registry;
use crate::container::{lifecycle, InjectorError, Managed};
use crate::context::InjectionContext;
use crate::probe::{FieldDescriptor, Injectable, Marker, TypeDescriptor};
use crate::scope::Scope;

pub struct ContainerCore {
    registry: Registry,
    factory: RwLock<Arc<dyn InstanceFactory>>,
    configurator: Configurator,
}

impl ContainerCore {
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
            factory: RwLock::new(Arc::new(DefaultFactory)),
            configurator: Configurator::new(),
        }
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    pub fn configurator(&self) -> &Configurator {
        &self.configurator
    }

    pub fn set_instance_supplier(&self, factory: Arc<dyn InstanceFactory>) {
        *self.factory.write() = factory;
    }

    pub fn reset_instance_supplier(&self) {
        *self.factory.write() = Arc::new(DefaultFactory);
    }

    pub fn instantiate_singleton(
        &self,
        descriptor: &'static TypeDescriptor,
        context: &dyn InjectionContext,
    ) -> Result<Arc<dyn Injectable>, InjectorError> {
        if let Some(instance) = self.registry.get_singleton(descriptor) {
            return Ok(instance);
        }

        debug!("creating a singleton of {descriptor}");
        let mut instance = self.create(descriptor)?;
        self.inject_and_initialize(instance.as_mut(), context)?;
        Ok(self.publish(Scope::Singleton, descriptor, Arc::from(instance)))
    }

    pub fn instantiate_presenter(
        &self,
        descriptor: &'static TypeDescriptor,
        context: &dyn InjectionContext,
    ) -> Result<Arc<dyn Injectable>, InjectorError> {
        debug!("creating a presenter of {descriptor}");
        let mut instance = self.create(descriptor)?;
        self.inject_and_initialize(instance.as_mut(), context)?;
        Ok(self.publish(Scope::Presenter, descriptor, Arc::from(instance)))
    }

    /// Replaces the singleton registered for the instance's type.
    pub fn set_singleton(&self, instance: Arc<dyn Injectable>) {
        let descriptor = instance.dyn_descriptor();
        debug!("setting the singleton of {descriptor}");
        if self
            .registry
            .force_set_singleton(descriptor, instance)
            .is_some()
        {
            debug!("the previous singleton of {descriptor} is forgotten");
        }
    }

    /// Starts tracking an instance which has already been wired.
    pub fn track_presenter(&self, instance: Arc<dyn Injectable>) -> Arc<dyn Injectable> {
        let descriptor = instance.dyn_descriptor();
        self.publish(Scope::Presenter, descriptor, instance)
    }

    pub fn inject_and_initialize(
        &self,
        instance: &mut dyn Injectable,
        context: &dyn InjectionContext,
    ) -> Result<(), InjectorError> {
        self.inject_members(instance, context)?;
        lifecycle::initialize(instance)
    }

    /// Injects the fields of `instance`'s type, then those of each of its
    /// superclasses.
    pub fn inject_members(
        &self,
        instance: &mut dyn Injectable,
        context: &dyn InjectionContext,
    ) -> Result<(), InjectorError> {
        let root = instance.dyn_descriptor();
        debug!("injecting members of {root}");

        let mut level = Some(instance);
        while let Some(current) = level {
            self.inject_declared_fields(root, current, context)?;
            level = current.superclass_mut();
        }
        Ok(())
    }

    /// Destroys every remembered instance, then forgets them together with
    /// the instance supplier and the configuration source.
    pub fn forget_all(&self) -> Result<(), InjectorError> {
        let singletons = self.registry.snapshot_singletons();
        let presenters = self.registry.snapshot_presenters();
        debug!(
            "shutting down {} singletons and {} presenters",
            singletons.len(),
            presenters.len()
        );

        let errors = lifecycle::destroy_all(singletons, presenters);
        self.registry.clear_all();
        self.reset_instance_supplier();
        self.configurator.forget_all();

        if errors.is_empty() {
            Ok(())
        } else {
            ShutdownSnafu { errors }.fail()
        }
    }

    fn create(
        &self,
        descriptor: &'static TypeDescriptor,
    ) -> Result<Box<dyn Injectable>, InjectorError> {
        let factory = Arc::clone(&self.factory.read());
        let instance = factory.create(descriptor).context(InstantiationSnafu {
            type_name: descriptor.name(),
        })?;

        let actual = instance.dyn_descriptor();
        ensure!(
            actual == descriptor,
            UnexpectedInstanceSnafu {
                type_name: descriptor.name(),
                actual: actual.name(),
            }
        );
        Ok(instance)
    }

    fn inject_declared_fields(
        &self,
        root: &'static TypeDescriptor,
        instance: &mut dyn Injectable,
        context: &dyn InjectionContext,
    ) -> Result<(), InjectorError> {
        let declaring = instance.dyn_descriptor();
        for field in instance.declared_fields() {
            if !field.has_marker(Marker::Inject) {
                continue;
            }

            trace!("found injectable field `{}` of {declaring}", field.name());
            if let Some(value) = self.resolve(root, declaring, field, context)? {
                instance.set_field(field, value).context(FieldWriteSnafu {
                    type_name: declaring.name(),
                })?;
            }
        }
        Ok(())
    }

    fn resolve(
        &self,
        root: &'static TypeDescriptor,
        declaring: &'static TypeDescriptor,
        field: &FieldDescriptor,
        context: &dyn InjectionContext,
    ) -> Result<Option<Box<dyn Managed>>, InjectorError> {
        if let Some(value) = self.configurator.get_property(declaring, field.name()) {
            trace!("configuration provides `{}` of {declaring}", field.name());
            return Ok(Some(value));
        }

        if let Some(value) = context.lookup(field.name()) {
            trace!("injection context provides `{}`", field.name());
            return Ok(Some(value));
        }

        let Some(dependency) = field.dependency() else {
            trace!("no value for `{}` of {declaring}", field.name());
            return Ok(None);
        };

        ensure!(
            dependency != declaring && dependency != root,
            SelfReferenceSnafu {
                type_name: declaring.name(),
                field: field.name(),
            }
        );

        trace!("resolving `{}` of {declaring} as a singleton of {dependency}", field.name());
        let service = self.instantiate_singleton(dependency, context)?;
        Ok(Some(Box::new(service)))
    }

    fn publish(
        &self,
        scope: Scope,
        descriptor: &'static TypeDescriptor,
        instance: Arc<dyn Injectable>,
    ) -> Arc<dyn Injectable> {
        if scope.is_retained() {
            let published = self
                .registry
                .put_singleton_if_absent(descriptor, Arc::clone(&instance));
            if !Arc::ptr_eq(&published, &instance) {
                warn!("another singleton of {descriptor} was published first, discarding this one");
            }
            published
        } else {
            self.registry.track_presenter(&instance);
            instance
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::config;
    use crate::container::factory::MockInstanceFactory;
    use crate::context::{self, ContextMap, EmptyContext};
    use crate::probe::{ProbeError, TypedInjectable};
    use crate::util::any::{Downcast, DowncastRef};
    use crate::{lifecycle, Injectable};

    use super::*;

    #[derive(Default, Injectable)]
    struct Database {
        #[inject]
        url: String,
    }

    #[derive(Default, Injectable)]
    #[injectable(lifecycle)]
    struct Repository {
        #[inject]
        database: Option<Arc<Database>>,
        #[inject]
        page_size: u32,
        initialized: usize,
        destroyed: AtomicUsize,
    }

    #[lifecycle]
    impl Repository {
        #[post_construct]
        fn init(&mut self) {
            self.initialized += 1;
        }

        #[pre_destroy]
        fn close(&self) {
            self.destroyed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default, Injectable)]
    struct Node {
        #[inject]
        next: Option<Arc<Node>>,
    }

    #[derive(Default, Injectable)]
    struct Text {
        #[inject]
        content: String,
    }

    #[derive(Injectable)]
    #[injectable(no_default)]
    struct Remote {
        #[inject]
        endpoint: String,
    }

    #[derive(Default, Injectable)]
    #[injectable(lifecycle)]
    struct Faulty;

    #[lifecycle]
    impl Faulty {
        #[pre_destroy]
        fn close(&self) -> Result<(), String> {
            Err(String::from("disk full"))
        }
    }

    fn repository(instance: Arc<dyn Injectable>) -> Arc<Repository> {
        instance
            .downcast::<Repository>()
            .unwrap_or_else(|_| panic!("expected a repository"))
    }

    #[test]
    fn container_core_instantiate_singleton_succeeds() {
        let core = ContainerCore::new();

        let first = repository(
            core.instantiate_singleton(Repository::descriptor(), &EmptyContext)
                .unwrap(),
        );
        let second = repository(
            core.instantiate_singleton(Repository::descriptor(), &EmptyContext)
                .unwrap(),
        );

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(first.initialized, 1);
        assert!(first.database.is_some());
        assert!(core.registry().contains_singleton(Database::descriptor()));
    }

    #[test]
    fn container_core_instantiate_presenter_succeeds() {
        let core = ContainerCore::new();

        let first = core
            .instantiate_presenter(Repository::descriptor(), &EmptyContext)
            .unwrap();
        let second = core
            .instantiate_presenter(Repository::descriptor(), &EmptyContext)
            .unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(core.registry().live_presenters(), 2);
        assert!(!core.registry().contains_singleton(Repository::descriptor()));

        let first = repository(first);
        let second = repository(second);
        assert!(Arc::ptr_eq(
            first.database.as_ref().unwrap(),
            second.database.as_ref().unwrap()
        ));
    }

    #[test]
    fn container_core_resolve_prefers_configuration() {
        let core = ContainerCore::new();
        core.configurator().set(config::from_fn(|key| {
            if key.field() == "page_size" {
                Some(Box::new(50u32))
            } else {
                None
            }
        }));
        let context = ContextMap::new().with("page_size", 10u32);

        let instance = repository(
            core.instantiate_presenter(Repository::descriptor(), &context)
                .unwrap(),
        );

        assert_eq!(instance.page_size, 50);
    }

    #[test]
    fn container_core_resolve_prefers_context_over_singletons() {
        let core = ContainerCore::new();
        let database = Arc::new(Database {
            url: String::from("memory://"),
        });
        let context = ContextMap::new()
            .with("database", Arc::clone(&database))
            .with("page_size", 10u32);

        let instance = repository(
            core.instantiate_presenter(Repository::descriptor(), &context)
                .unwrap(),
        );

        assert!(Arc::ptr_eq(instance.database.as_ref().unwrap(), &database));
        assert_eq!(instance.page_size, 10);
        assert!(!core.registry().contains_singleton(Database::descriptor()));
    }

    #[test]
    fn container_core_resolve_passes_declaring_type_to_configuration() {
        let core = ContainerCore::new();
        core.configurator().set(config::from_fn(|key| {
            (key.declaring() == Database::descriptor() && key.field() == "url")
                .then(|| Box::new(String::from("postgres://")) as Box<dyn Managed>)
        }));

        let database = core
            .instantiate_singleton(Database::descriptor(), &EmptyContext)
            .unwrap();
        let database = database.downcast_ref::<Database>().unwrap();

        assert_eq!(database.url, "postgres://");
    }

    #[test]
    fn container_core_resolve_leaves_value_fields_unassigned() {
        let core = ContainerCore::new();

        let instance = repository(
            core.instantiate_presenter(Repository::descriptor(), &EmptyContext)
                .unwrap(),
        );

        assert_eq!(instance.page_size, 0);
    }

    #[test]
    fn container_core_resolve_fails_when_field_refers_to_its_own_type() {
        let core = ContainerCore::new();

        let err = core
            .instantiate_singleton(Node::descriptor(), &EmptyContext)
            .err()
            .unwrap();

        assert!(matches!(
            err,
            InjectorError::SelfReference { field: "next", .. }
        ));
        assert!(!core.registry().contains_singleton(Node::descriptor()));
    }

    #[test]
    fn container_core_inject_members_fails_when_value_is_incompatible() {
        let core = ContainerCore::new();
        let context = context::from_fn(|name| {
            (name == "content").then(|| Box::new(42i32) as Box<dyn Managed>)
        });

        let mut text = Text::default();
        let err = core.inject_members(&mut text, &context).unwrap_err();

        assert!(matches!(
            err,
            InjectorError::FieldWrite {
                source: ProbeError::IncompatibleValue {
                    field: "content",
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn container_core_create_fails_when_factory_fails() {
        let core = ContainerCore::new();
        let mut factory = MockInstanceFactory::new();
        factory
            .expect_create()
            .times(1)
            .returning(|_| Err(Box::<dyn Error + Send + Sync>::from("no display")));
        core.set_instance_supplier(Arc::new(factory));

        let err = core
            .instantiate_presenter(Text::descriptor(), &EmptyContext)
            .err()
            .unwrap();

        assert!(matches!(err, InjectorError::Instantiation { .. }));
        assert_eq!(core.registry().live_presenters(), 0);
    }

    #[test]
    fn container_core_create_fails_when_factory_returns_another_type() {
        let core = ContainerCore::new();
        let mut factory = MockInstanceFactory::new();
        factory
            .expect_create()
            .returning(|_| Ok(Box::new(Text::default())));
        core.set_instance_supplier(Arc::new(factory));

        let err = core
            .instantiate_singleton(Database::descriptor(), &EmptyContext)
            .err()
            .unwrap();

        assert!(matches!(err, InjectorError::UnexpectedInstance { .. }));
    }

    #[test]
    fn container_core_create_fails_when_type_has_no_constructor() {
        let core = ContainerCore::new();

        let err = core
            .instantiate_singleton(Remote::descriptor(), &EmptyContext)
            .err()
            .unwrap();

        assert!(matches!(err, InjectorError::Instantiation { .. }));
    }

    #[test]
    fn container_core_publish_keeps_first_singleton() {
        let core = ContainerCore::new();
        let first: Arc<dyn Injectable> = Arc::new(Text::default());
        let second: Arc<dyn Injectable> = Arc::new(Text::default());

        let published = core.publish(Scope::Singleton, Text::descriptor(), first.clone());
        assert!(Arc::ptr_eq(&published, &first));

        let published = core.publish(Scope::Singleton, Text::descriptor(), second);
        assert!(Arc::ptr_eq(&published, &first));
    }

    #[test]
    fn container_core_forget_all_succeeds() {
        let core = ContainerCore::new();
        let singleton = repository(
            core.instantiate_singleton(Repository::descriptor(), &EmptyContext)
                .unwrap(),
        );
        let presenter = repository(
            core.instantiate_presenter(Repository::descriptor(), &EmptyContext)
                .unwrap(),
        );
        core.track_presenter(singleton.clone());
        core.configurator().set(config::from_fn(|_| None));
        core.set_instance_supplier(Arc::new(MockInstanceFactory::new()));

        core.forget_all().unwrap();

        assert_eq!(singleton.destroyed.load(Ordering::SeqCst), 1);
        assert_eq!(presenter.destroyed.load(Ordering::SeqCst), 1);
        assert!(core.registry().snapshot_singletons().is_empty());
        assert_eq!(core.registry().live_presenters(), 0);
        assert!(!core.configurator().is_installed());

        let text = core.instantiate_presenter(Text::descriptor(), &EmptyContext);
        assert!(text.is_ok());
    }

    #[test]
    fn container_core_forget_all_fails_when_pre_destroy_fails() {
        let core = ContainerCore::new();
        core.set_singleton(Arc::new(Faulty::default()));
        let repository = repository(
            core.instantiate_singleton(Repository::descriptor(), &EmptyContext)
                .unwrap(),
        );

        let err = core.forget_all().unwrap_err();

        assert!(matches!(&err, InjectorError::Shutdown { errors } if errors.len() == 1));
        assert_eq!(repository.destroyed.load(Ordering::SeqCst), 1);
        assert!(core.registry().snapshot_singletons().is_empty());
    }
}
