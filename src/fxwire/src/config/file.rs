use std::path::Path;

use figment::providers::{Env, Format, Toml};
use figment::value::{Num, Value};
use figment::{Figment, Provider};
use snafu::prelude::*;
use tracing::{debug, trace};

use crate::config::{ConfigError, ConfigKey, ConfigurationSource, FileNotFoundSnafu, LoadSnafu};
use crate::container::Managed;

/// A [`ConfigurationSource`] reading a TOML document and environment
/// variables, where the environment overrides the document.
///
/// A field `user` of a type `Session` is looked up as `Session.user`, then as
/// `session.user` (environment keys are lowercased), then as the bare `user`.
/// The environment is searched for all three keys before the document is.
/// Strings, booleans, integers and floats are handed out as `String`, `bool`,
/// `i64` and `f64`. Arrays and tables are treated as absent.
#[derive(Debug, Clone)]
pub struct FileConfiguration {
    file: Figment,
    env: Figment,
}

impl FileConfiguration {
    pub fn new() -> Self {
        Self {
            file: Figment::new(),
            env: Figment::new(),
        }
    }

    /// Loads the TOML file at `path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the file doesn't exist or isn't valid TOML.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        ensure!(
            path.exists(),
            FileNotFoundSnafu {
                path: path.to_path_buf()
            }
        );

        debug!("loading configuration from {}", path.display());
        let configuration = Self {
            file: Figment::new().merge(Toml::file(path)),
            env: Figment::new(),
        };
        configuration.validate()?;
        Ok(configuration)
    }

    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns an error if `document` isn't valid TOML.
    pub fn from_toml_str(document: &str) -> Result<Self, ConfigError> {
        let configuration = Self {
            file: Figment::new().merge(Toml::string(document)),
            env: Figment::new(),
        };
        configuration.validate()?;
        Ok(configuration)
    }

    /// Merges environment variables starting with `prefix`. A double
    /// underscore separates the type from the field, e.g. `APP_SESSION__USER`.
    pub fn with_env_prefix(mut self, prefix: &str) -> Self {
        self.env = self.env.merge(Env::prefixed(prefix).split("__"));
        self
    }

    /// Checks that every provider can be read.
    ///
    /// # Errors
    ///
    /// Returns the first error reported by a provider.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.file.data().map_err(Box::new).context(LoadSnafu)?;
        self.env.data().map_err(Box::new).context(LoadSnafu)?;
        Ok(())
    }

    fn find(&self, key: &ConfigKey) -> Option<Value> {
        let type_name = key.declaring().short_name();
        let candidates = [
            format!("{type_name}.{}", key.field()),
            format!("{}.{}", type_name.to_lowercase(), key.field()),
            key.field().to_string(),
        ];

        [&self.env, &self.file].into_iter().find_map(|figment| {
            candidates.iter().find_map(|path| {
                let value = figment.find_value(path).ok();
                trace!("configuration key {path} resolves to {value:?}");
                value
            })
        })
    }
}

impl ConfigurationSource for FileConfiguration {
    fn lookup(&self, key: &ConfigKey) -> Option<Box<dyn Managed>> {
        self.find(key).and_then(into_managed)
    }
}

fn into_managed(value: Value) -> Option<Box<dyn Managed>> {
    match value {
        Value::String(_, text) => Some(Box::new(text)),
        Value::Char(_, c) => Some(Box::new(c)),
        Value::Bool(_, flag) => Some(Box::new(flag)),
        Value::Num(_, num) => num_into_managed(num),
        _ => None,
    }
}

fn num_into_managed(num: Num) -> Option<Box<dyn Managed>> {
    let integer = match num {
        Num::I8(n) => i64::from(n),
        Num::I16(n) => i64::from(n),
        Num::I32(n) => i64::from(n),
        Num::I64(n) => n,
        Num::I128(n) => i64::try_from(n).ok()?,
        Num::ISize(n) => i64::try_from(n).ok()?,
        Num::U8(n) => i64::from(n),
        Num::U16(n) => i64::from(n),
        Num::U32(n) => i64::from(n),
        Num::U64(n) => i64::try_from(n).ok()?,
        Num::U128(n) => i64::try_from(n).ok()?,
        Num::USize(n) => i64::try_from(n).ok()?,
        Num::F32(n) => return Some(Box::new(f64::from(n))),
        Num::F64(n) => return Some(Box::new(n)),
    };
    Some(Box::new(integer))
}
