//! Values supplied by the application, keyed by the declaring type and the
//! field name.

mod file;

use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::path::PathBuf;
use std::sync::Arc;

use parking_lot::RwLock;
use snafu::prelude::*;

use crate::container::Managed;
use crate::probe::TypeDescriptor;

pub use file::FileConfiguration;

/// The canonical query sent to a [`ConfigurationSource`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConfigKey {
    declaring: &'static TypeDescriptor,
    field: &'static str,
}

impl ConfigKey {
    pub fn new(declaring: &'static TypeDescriptor, field: &'static str) -> Self {
        Self { declaring, field }
    }

    /// The type declaring the field. For a field inherited from a superclass
    /// this is the superclass.
    pub fn declaring(&self) -> &'static TypeDescriptor {
        self.declaring
    }

    pub fn field(&self) -> &'static str {
        self.field
    }
}

impl Debug for ConfigKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("ConfigKey")
            .field("declaring", &self.declaring.name())
            .field("field", &self.field)
            .finish()
    }
}

impl Display for ConfigKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}.{}", self.declaring.short_name(), self.field)
    }
}

/// A lookup installed by the application. Returning `None` lets the
/// container fall through to the next source of values.
#[cfg_attr(test, mockall::automock)]
pub trait ConfigurationSource: Send + Sync + 'static {
    fn lookup(&self, key: &ConfigKey) -> Option<Box<dyn Managed>>;
}

impl<F> ConfigurationSource for F
where
    F: Fn(&ConfigKey) -> Option<Box<dyn Managed>> + Send + Sync + 'static,
{
    fn lookup(&self, key: &ConfigKey) -> Option<Box<dyn Managed>> {
        (self)(key)
    }
}

/// Pins down the signature of a closure used as a [`ConfigurationSource`].
pub fn from_fn<F>(lookup: F) -> F
where
    F: Fn(&ConfigKey) -> Option<Box<dyn Managed>> + Send + Sync + 'static,
{
    lookup
}

/// Holds the currently installed [`ConfigurationSource`], if any.
pub struct Configurator {
    source: RwLock<Option<Arc<dyn ConfigurationSource>>>,
}

impl Configurator {
    pub fn new() -> Self {
        Self {
            source: RwLock::new(None),
        }
    }

    /// Installs `source`, replacing the previous one.
    pub fn set<S>(&self, source: S)
    where
        S: ConfigurationSource,
    {
        *self.source.write() = Some(Arc::new(source));
    }

    pub fn is_installed(&self) -> bool {
        self.source.read().is_some()
    }

    /// Asks the installed source for the value of `field` declared on
    /// `declaring`. The lock is released before the source runs.
    pub fn get_property(
        &self,
        declaring: &'static TypeDescriptor,
        field: &'static str,
    ) -> Option<Box<dyn Managed>> {
        let source = self.source.read().clone()?;
        source.lookup(&ConfigKey::new(declaring, field))
    }

    /// Uninstalls the current source.
    pub fn forget_all(&self) {
        *self.source.write() = None;
    }
}

#[derive(Debug, Snafu)]
#[non_exhaustive]
pub enum ConfigError {
    #[snafu(display("configuration file {} does not exist", path.display()))]
    #[non_exhaustive]
    FileNotFound { path: PathBuf },
    #[snafu(display("configuration cannot be loaded"))]
    #[non_exhaustive]
    Load { source: Box<figment::Error> },
}
