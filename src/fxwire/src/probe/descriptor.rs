use std::any::TypeId;
use std::fmt::{Debug, Display, Formatter, Result as FmtResult};
use std::hash::{Hash, Hasher};

use crate::probe::Injectable;

/// A marker attached to a field or a method of an injectable type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Marker {
    /// The field is resolved and written by the container.
    Inject,
    /// The method runs once all fields of the instance have been injected.
    PostConstruct,
    /// The method runs right before the container forgets the instance.
    PreDestroy,
}

impl Marker {
    pub fn to_str(&self) -> &'static str {
        match self {
            Self::Inject => "inject",
            Self::PostConstruct => "post-construct",
            Self::PreDestroy => "pre-destroy",
        }
    }
}

impl Display for Marker {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.to_str())
    }
}

/// Static metadata identifying one injectable type.
///
/// Two descriptors are equal if and only if they describe the same Rust type,
/// so a descriptor can be used as a map key standing for its type.
/// Descriptors are normally generated by `#[derive(Injectable)]`.
pub struct TypeDescriptor {
    name: &'static str,
    type_id: fn() -> TypeId,
    constructor: Option<fn() -> Box<dyn Injectable>>,
}

impl TypeDescriptor {
    /// Creates a descriptor for a type with a zero-argument constructor.
    pub const fn new(
        name: &'static str,
        type_id: fn() -> TypeId,
        constructor: fn() -> Box<dyn Injectable>,
    ) -> Self {
        Self {
            name,
            type_id,
            constructor: Some(constructor),
        }
    }

    /// Creates a descriptor for a type which can only be built by a custom
    /// instance supplier.
    pub const fn without_constructor(name: &'static str, type_id: fn() -> TypeId) -> Self {
        Self {
            name,
            type_id,
            constructor: None,
        }
    }

    /// The fully qualified name of the type.
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// The name of the type without its module path.
    pub fn short_name(&self) -> &'static str {
        self.name
            .rsplit_once("::")
            .map_or(self.name, |(_, short)| short)
    }

    pub fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Invokes the zero-argument constructor, if the type has one.
    pub fn construct(&self) -> Option<Box<dyn Injectable>> {
        self.constructor.map(|constructor| constructor())
    }
}

impl PartialEq for TypeDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.type_id() == other.type_id()
    }
}

impl Eq for TypeDescriptor {}

impl Hash for TypeDescriptor {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id().hash(state);
    }
}

impl Debug for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("TypeDescriptor")
            .field("name", &self.name)
            .field("has_constructor", &self.has_constructor())
            .finish_non_exhaustive()
    }
}

impl Display for TypeDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.name)
    }
}

/// Static metadata of a field declared directly on a type.
pub struct FieldDescriptor {
    name: &'static str,
    markers: &'static [Marker],
    dependency: fn() -> Option<&'static TypeDescriptor>,
}

impl FieldDescriptor {
    /// Describes a field marked for injection. `dependency` reports the
    /// service type the field holds, or `None` for value types.
    pub const fn injectable(
        name: &'static str,
        dependency: fn() -> Option<&'static TypeDescriptor>,
    ) -> Self {
        Self {
            name,
            markers: &[Marker::Inject],
            dependency,
        }
    }

    /// Describes a field the container never touches.
    pub const fn plain(name: &'static str) -> Self {
        Self {
            name,
            markers: &[],
            dependency: no_dependency,
        }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn markers(&self) -> &'static [Marker] {
        self.markers
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }

    /// The injectable type held by this field, or `None` if the field's type
    /// is a primitive or a string.
    pub fn dependency(&self) -> Option<&'static TypeDescriptor> {
        (self.dependency)()
    }
}

impl Debug for FieldDescriptor {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.debug_struct("FieldDescriptor")
            .field("name", &self.name)
            .field("markers", &self.markers)
            .finish_non_exhaustive()
    }
}

fn no_dependency() -> Option<&'static TypeDescriptor> {
    None
}

/// Static metadata of a no-argument method carrying lifecycle markers.
#[derive(Debug)]
pub struct MethodDescriptor {
    name: &'static str,
    markers: &'static [Marker],
}

impl MethodDescriptor {
    pub const fn new(name: &'static str, markers: &'static [Marker]) -> Self {
        Self { name, markers }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn markers(&self) -> &'static [Marker] {
        self.markers
    }

    pub fn has_marker(&self, marker: Marker) -> bool {
        self.markers.contains(&marker)
    }
}
