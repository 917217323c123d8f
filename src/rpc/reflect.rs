//! Declared-shape introspection for procedure parameters and results
//!
//! Rust offers no runtime reflection, so every type that crosses the wire
//! states its shape through [`Reflect`]. Records list their field names,
//! plain values list nothing, and [`Keyed`] marks a by-alias argument.

use std::{
    any,
    collections::{BTreeMap, HashMap},
    ops::{Deref, DerefMut},
};

use serde::Deserialize;
use serde_json::Value;

pub trait Reflect {
    /// Field names when `Self` is a named-field record.
    const FIELDS: Option<&'static [&'static str]> = None;

    /// Forces keyed marshalling for a single argument, even without fields.
    const BY_REFERENCE: bool = false;

    fn type_name() -> String {
        short_type_name(any::type_name::<Self>())
    }

    /// One-line form used when the type appears as a record field.
    fn summary() -> String {
        Self::type_name()
    }

    fn describe() -> String {
        Self::summary()
    }
}

/// Single-argument wrapper that selects keyed (object) marshalling.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(transparent)]
pub struct Keyed<T>(pub T);

impl<T> Keyed<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

impl<T> Deref for Keyed<T> {
    type Target = T;

    fn deref(&self) -> &T {
        &self.0
    }
}

impl<T> DerefMut for Keyed<T> {
    fn deref_mut(&mut self) -> &mut T {
        &mut self.0
    }
}

impl<T: Reflect> Reflect for Keyed<T> {
    const FIELDS: Option<&'static [&'static str]> = T::FIELDS;
    const BY_REFERENCE: bool = true;

    fn type_name() -> String {
        T::type_name()
    }

    fn summary() -> String {
        T::summary()
    }

    fn describe() -> String {
        T::describe()
    }
}

/// Strips module paths from `any::type_name` output, keeping generics.
pub fn short_type_name(full: &str) -> String {
    let mut short = String::with_capacity(full.len());
    let mut segment = String::new();

    for ch in full.chars() {
        if ch.is_alphanumeric() || ch == '_' || ch == ':' {
            segment.push(ch);
            continue;
        }
        short.push_str(last_path_segment(&segment));
        segment.clear();
        short.push(ch);
    }
    short.push_str(last_path_segment(&segment));
    short
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

pub fn describe_record(name: &str, fields: &[String]) -> String {
    if fields.is_empty() {
        return format!("{name} {{ }}");
    }
    format!("{name} {{ {} }}", fields.join(", "))
}

#[macro_export]
macro_rules! reflect_record {
    ($ty:ident { $($field:ident : $field_ty:ty),* $(,)? }) => {
        impl $crate::rpc::reflect::Reflect for $ty {
            const FIELDS: Option<&'static [&'static str]> = Some(&[$(stringify!($field)),*]);

            fn describe() -> String {
                let fields: Vec<String> = vec![$(
                    format!(
                        "{} :: {}",
                        stringify!($field),
                        <$field_ty as $crate::rpc::reflect::Reflect>::summary()
                    )
                ),*];
                $crate::rpc::reflect::describe_record(
                    &<Self as $crate::rpc::reflect::Reflect>::type_name(),
                    &fields,
                )
            }
        }
    };
}

#[macro_export]
macro_rules! reflect_enum {
    ($ty:ident [$($variant:literal),+ $(,)?]) => {
        impl $crate::rpc::reflect::Reflect for $ty {
            fn summary() -> String {
                format!(
                    "{} ({})",
                    <Self as $crate::rpc::reflect::Reflect>::type_name(),
                    <[&str]>::join(&[$($variant),+], ", ")
                )
            }
        }
    };
}

macro_rules! reflect_plain {
    ($($ty:ty),* $(,)?) => {
        $(impl Reflect for $ty {})*
    };
}

reflect_plain!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64, String,
    Value,
);

impl Reflect for () {
    fn type_name() -> String {
        "void".to_string()
    }
}

impl<T: Reflect> Reflect for Option<T> {}
impl<T: Reflect> Reflect for Vec<T> {}
impl<T: Reflect> Reflect for BTreeMap<String, T> {}
impl<T: Reflect> Reflect for HashMap<String, T> {}

impl<T: Reflect> Reflect for Box<T> {
    const FIELDS: Option<&'static [&'static str]> = T::FIELDS;

    fn type_name() -> String {
        T::type_name()
    }

    fn summary() -> String {
        T::summary()
    }

    fn describe() -> String {
        T::describe()
    }
}
