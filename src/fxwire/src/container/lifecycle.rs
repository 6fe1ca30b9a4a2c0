use std::collections::HashSet;
use std::sync::Arc;

use snafu::prelude::*;
use tracing::{debug, trace, warn};

use crate::container::error::LifecycleSnafu;
use crate::container::InjectorError;
use crate::probe::{class_chain, has_lifecycle_method, Injectable, Marker};

/// Runs every post-construct method of `instance`, starting with the most
/// derived type. The first failure aborts the walk.
pub(crate) fn initialize(instance: &mut dyn Injectable) -> Result<(), InjectorError> {
    let mut level = Some(instance);
    while let Some(current) = level {
        let type_name = current.dyn_descriptor().name();
        for method in current.declared_methods() {
            if method.has_marker(Marker::PostConstruct) {
                current.invoke_mut(method).context(LifecycleSnafu {
                    type_name,
                    phase: Marker::PostConstruct,
                })?;
            }
        }
        level = current.superclass_mut();
    }
    Ok(())
}

/// Runs every pre-destroy method of `instance`, starting with the most
/// derived type. The first failure aborts the walk for this instance.
pub(crate) fn destroy(instance: &dyn Injectable) -> Result<(), InjectorError> {
    for level in class_chain(instance) {
        let type_name = level.dyn_descriptor().name();
        for method in level.declared_methods() {
            if method.has_marker(Marker::PreDestroy) {
                level.invoke(method).context(LifecycleSnafu {
                    type_name,
                    phase: Marker::PreDestroy,
                })?;
            }
        }
    }
    Ok(())
}

/// Destroys singletons first, then presenters. An instance that shows up more
/// than once is destroyed only the first time. Failures don't stop the
/// teardown; they are returned once every instance has been visited.
pub(crate) fn destroy_all(
    singletons: Vec<Arc<dyn Injectable>>,
    presenters: Vec<Arc<dyn Injectable>>,
) -> Vec<InjectorError> {
    let mut destroyed = HashSet::new();
    let mut errors = Vec::new();

    for instance in singletons.iter().chain(presenters.iter()) {
        let address = Arc::as_ptr(instance) as *const ();
        if !destroyed.insert(address) {
            continue;
        }

        if !has_lifecycle_method(instance.as_ref(), Marker::PreDestroy) {
            trace!("{} has no pre-destroy method", instance.dyn_descriptor());
            continue;
        }

        debug!("destroying an instance of {}", instance.dyn_descriptor());
        if let Err(err) = destroy(instance.as_ref()) {
            warn!("pre-destroy of {} failed: {err}", instance.dyn_descriptor());
            errors.push(err);
        }
    }

    errors
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};

    use crate::probe::ProbeError;
    use crate::{lifecycle, Injectable};

    use super::*;

    #[derive(Default, Injectable)]
    #[injectable(lifecycle)]
    struct Widget {
        steps: Vec<&'static str>,
        closed: AtomicUsize,
    }

    #[lifecycle]
    impl Widget {
        #[post_construct]
        fn layout(&mut self) {
            self.steps.push("widget");
        }

        #[pre_destroy]
        fn close(&self) {
            self.closed.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default, Injectable)]
    #[injectable(lifecycle)]
    struct Button {
        label_ready: bool,
        #[inject(parent)]
        widget: Widget,
    }

    #[lifecycle]
    impl Button {
        #[post_construct]
        fn prepare_label(&mut self) {
            self.label_ready = true;
            self.widget.steps.push("button");
        }
    }

    #[derive(Default, Injectable)]
    #[injectable(lifecycle)]
    struct Broken {
        closed: AtomicUsize,
    }

    #[lifecycle]
    impl Broken {
        #[post_construct]
        fn fail_to_start(&mut self) -> Result<(), String> {
            Err(String::from("no display"))
        }

        #[pre_destroy]
        fn fail_to_stop(&self) -> Result<(), String> {
            self.closed.fetch_add(1, Ordering::SeqCst);
            Err(String::from("still busy"))
        }
    }

    #[derive(Default, Injectable)]
    struct Label;

    #[test]
    fn initialize_succeeds() {
        let mut button = Button::default();
        initialize(&mut button).unwrap();

        assert!(button.label_ready);
        assert_eq!(button.widget.steps, vec!["button", "widget"]);
    }

    #[test]
    fn initialize_fails_when_method_fails() {
        let mut broken = Broken::default();
        let err = initialize(&mut broken).unwrap_err();

        assert!(matches!(
            err,
            InjectorError::Lifecycle {
                phase: Marker::PostConstruct,
                source: ProbeError::Invocation {
                    method: "fail_to_start",
                    ..
                },
                ..
            }
        ));
    }

    #[test]
    fn destroy_succeeds() {
        let button = Button::default();
        destroy(&button).unwrap();

        assert_eq!(button.widget.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn destroy_all_succeeds_when_instance_is_listed_twice() {
        let button = Arc::new(Button::default());
        let shared: Arc<dyn Injectable> = button.clone();

        let errors = destroy_all(vec![shared.clone()], vec![shared]);

        assert!(errors.is_empty());
        assert_eq!(button.widget.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn destroy_all_continues_when_method_fails() {
        let broken = Arc::new(Broken::default());
        let widget = Arc::new(Widget::default());
        let singletons: Vec<Arc<dyn Injectable>> = vec![broken.clone()];
        let presenters: Vec<Arc<dyn Injectable>> = vec![widget.clone()];

        let errors = destroy_all(singletons, presenters);

        assert_eq!(errors.len(), 1);
        assert_eq!(broken.closed.load(Ordering::SeqCst), 1);
        assert_eq!(widget.closed.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn destroy_all_skips_instances_without_pre_destroy() {
        let label: Arc<dyn Injectable> = Arc::new(Label);
        let widget = Arc::new(Widget::default());
        let presenters: Vec<Arc<dyn Injectable>> = vec![label, widget.clone()];

        let errors = destroy_all(Vec::new(), presenters);

        assert!(errors.is_empty());
        assert_eq!(widget.closed.load(Ordering::SeqCst), 1);
    }
}
