#![allow(clippy::new_without_default)]

extern crate self as fxwire;

pub mod config;
pub mod container;
pub mod context;
pub mod global;
pub mod probe;
pub mod scope;
mod util;

pub use fxwire_derive::{lifecycle, Injectable};

pub mod prelude {
    pub use crate::config::{ConfigKey, ConfigurationSource, FileConfiguration};
    pub use crate::container::factory::InstanceFactory;
    pub use crate::container::{Container, InjectorError};
    pub use crate::context::{ContextMap, EmptyContext, InjectionContext};
    pub use crate::probe::{Injectable, Lifecycle, TypedInjectable};
    pub use crate::{config, context, global, lifecycle, Injectable};
}
