use std::fmt::{Display, Formatter, Result as FmtResult};

/// How long an object created by the container is remembered.
///
/// A singleton is created once per type and kept until the container is shut
/// down. A presenter is created fresh on every request; the container only
/// keeps a weak reference to it, so it can be destroyed at shutdown if it is
/// still alive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Scope {
    Singleton,
    Presenter,
}

impl Scope {
    /// Returns true if the container keeps objects of this scope alive.
    pub fn is_retained(self) -> bool {
        matches!(self, Self::Singleton)
    }

    /// Returns the name of the scope in a string literal.
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Singleton => "Singleton",
            Self::Presenter => "Presenter",
        }
    }
}

impl Display for Scope {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_str())
    }
}
