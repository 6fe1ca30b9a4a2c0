use std::sync::Arc;

use crate::container::Managed;
use crate::probe::{Injectable, TypeDescriptor, TypedInjectable};
use crate::util::any::Downcast;

/// A type which a field marked with `#[inject]` may have.
///
/// Primitives and strings are *value types*: the container only fills them
/// from the configuration or the injection context. Service handles
/// (`Option<Arc<T>>`) additionally fall back to the singleton of `T`.
pub trait InjectTarget: Sized + 'static {
    /// The injectable type this field refers to, or `None` for value types.
    fn dependency() -> Option<&'static TypeDescriptor> {
        None
    }

    /// Converts a resolved value into the field's type. The value is handed
    /// back if it doesn't fit.
    ///
    /// # Errors
    ///
    /// Returns the original value if the conversion is impossible.
    fn accept(value: Box<dyn Managed>) -> Result<Self, Box<dyn Managed>>;
}

macro_rules! try_exact {
    ($value:ident, $ty:ty) => {
        let $value = match $value.downcast::<$ty>() {
            Ok(exact) => return Ok(*exact),
            Err(other) => other,
        };
    };
}

macro_rules! impl_inject_target_for_integers {
    ($($ty:ty),*) => {
        $(
            impl InjectTarget for $ty {
                fn accept(value: Box<dyn Managed>) -> Result<Self, Box<dyn Managed>> {
                    try_exact!(value, $ty);
                    let value = match value.downcast::<i64>() {
                        Ok(wide) => return <$ty>::try_from(*wide).map_err(|_| -> Box<dyn Managed> { wide }),
                        Err(other) => other,
                    };
                    match value.downcast::<String>() {
                        Ok(text) => text.trim().parse::<$ty>().map_err(|_| -> Box<dyn Managed> { text }),
                        Err(other) => Err(other),
                    }
                }
            }
        )*
    };
}

impl_inject_target_for_integers!(i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize);

macro_rules! impl_inject_target_for_floats {
    ($($ty:ty),*) => {
        $(
            impl InjectTarget for $ty {
                fn accept(value: Box<dyn Managed>) -> Result<Self, Box<dyn Managed>> {
                    try_exact!(value, $ty);
                    let value = match value.downcast::<f64>() {
                        Ok(wide) => {
                            let narrowed = *wide as $ty;
                            if f64::from(narrowed) == *wide || wide.is_nan() {
                                return Ok(narrowed);
                            }
                            return Err(wide);
                        }
                        Err(other) => other,
                    };
                    let value = match value.downcast::<i64>() {
                        Ok(integer) => {
                            let converted = *integer as $ty;
                            // `as i64` saturates, so compare in a wider type.
                            if converted as i128 == i128::from(*integer) {
                                return Ok(converted);
                            }
                            return Err(integer);
                        }
                        Err(other) => other,
                    };
                    match value.downcast::<String>() {
                        Ok(text) => text.trim().parse::<$ty>().map_err(|_| -> Box<dyn Managed> { text }),
                        Err(other) => Err(other),
                    }
                }
            }
        )*
    };
}

impl_inject_target_for_floats!(f32, f64);

impl InjectTarget for bool {
    fn accept(value: Box<dyn Managed>) -> Result<Self, Box<dyn Managed>> {
        try_exact!(value, bool);
        match value.downcast::<String>() {
            Ok(text) => text
                .trim()
                .parse::<bool>()
                .map_err(|_| -> Box<dyn Managed> { text }),
            Err(other) => Err(other),
        }
    }
}

impl InjectTarget for char {
    fn accept(value: Box<dyn Managed>) -> Result<Self, Box<dyn Managed>> {
        try_exact!(value, char);
        match value.downcast::<String>() {
            Ok(text) => {
                let mut chars = text.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => Ok(c),
                    _ => Err(text),
                }
            }
            Err(other) => Err(other),
        }
    }
}

impl InjectTarget for String {
    fn accept(value: Box<dyn Managed>) -> Result<Self, Box<dyn Managed>> {
        try_exact!(value, String);
        match value.downcast::<&'static str>() {
            Ok(text) => Ok(String::from(*text)),
            Err(other) => Err(other),
        }
    }
}

impl InjectTarget for &'static str {
    fn accept(value: Box<dyn Managed>) -> Result<Self, Box<dyn Managed>> {
        value.downcast::<&'static str>().map(|text| *text)
    }
}

impl<T> InjectTarget for Option<Arc<T>>
where
    T: TypedInjectable,
{
    fn dependency() -> Option<&'static TypeDescriptor> {
        Some(T::descriptor())
    }

    fn accept(value: Box<dyn Managed>) -> Result<Self, Box<dyn Managed>> {
        let value = match value.downcast::<Arc<T>>() {
            Ok(service) => return Ok(Some(*service)),
            Err(other) => other,
        };
        try_exact!(value, Option<Arc<T>>);
        let erased = value.downcast::<Arc<dyn Injectable>>()?;
        match (*erased).downcast::<T>() {
            Ok(service) => Ok(Some(service)),
            Err(erased) => Err(Box::new(erased)),
        }
    }
}
