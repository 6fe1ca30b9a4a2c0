pub mod factory;
pub mod registry;

mod core;
mod error;
mod handle;
mod lifecycle;

use crate::util::any::{AsAny, IntoAnyArc};

pub use error::InjectorError;
pub use handle::Container;

/// A value the container can hand around: configuration values, context
/// values and shared instances are all passed as `Box<dyn Managed>`.
pub trait Managed: AsAny + IntoAnyArc + Send + Sync + 'static {}

impl<T> Managed for T where T: AsAny + IntoAnyArc + Send + Sync + 'static {}
