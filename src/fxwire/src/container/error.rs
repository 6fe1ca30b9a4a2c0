use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use snafu::prelude::*;

use crate::probe::{Marker, ProbeError};

#[derive(Debug, Snafu)]
#[snafu(visibility(pub(crate)))]
#[non_exhaustive]
pub enum InjectorError {
    #[snafu(display("could not instantiate {type_name}"))]
    #[non_exhaustive]
    Instantiation {
        type_name: &'static str,
        source: Box<dyn Error + Send + Sync>,
    },
    #[snafu(display("the instance supplier produced a {actual} when asked for a {type_name}"))]
    #[non_exhaustive]
    UnexpectedInstance {
        type_name: &'static str,
        actual: &'static str,
    },
    #[snafu(display("could not set a field of {type_name}"))]
    #[non_exhaustive]
    FieldWrite {
        type_name: &'static str,
        source: ProbeError,
    },
    #[snafu(display("field `{field}` of {type_name} refers to its own type"))]
    #[non_exhaustive]
    SelfReference {
        type_name: &'static str,
        field: &'static str,
    },
    #[snafu(display("could not invoke a {phase} method of {type_name}"))]
    #[non_exhaustive]
    Lifecycle {
        type_name: &'static str,
        phase: Marker,
        source: ProbeError,
    },
    #[snafu(display("shutdown finished with errors:\n{}", AggregatedDisplayer::new(errors)))]
    #[non_exhaustive]
    Shutdown { errors: Vec<InjectorError> },
}

struct AggregatedDisplayer<'a> {
    errors: &'a [InjectorError],
}

impl<'a> AggregatedDisplayer<'a> {
    fn new(errors: &'a [InjectorError]) -> Self {
        Self { errors }
    }
}

impl Display for AggregatedDisplayer<'_> {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        for (i, error) in self.errors.iter().enumerate() {
            write!(f, "{:4}: {}", i + 1, error)?;
            if let Some(source) = error.source() {
                write!(f, ": {source}")?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn shutdown_display_succeeds() {
        let err = InjectorError::Shutdown {
            errors: vec![
                InjectorError::Lifecycle {
                    type_name: "app::Session",
                    phase: Marker::PreDestroy,
                    source: ProbeError::no_such_method("close"),
                },
                InjectorError::SelfReference {
                    type_name: "app::Node",
                    field: "next",
                },
            ],
        };

        let message = err.to_string();
        assert!(message.contains("could not invoke a pre-destroy method of app::Session"));
        assert!(message.contains("method `close` is not a lifecycle method"));
        assert!(message.contains("field `next` of app::Node refers to its own type"));
    }
}
