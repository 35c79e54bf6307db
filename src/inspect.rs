use std::borrow::Cow;

use crate::{
    StaticCowStr,
    value::{ToValue, Value},
};

/// A type whose instances can be logged as "complex" objects.
///
/// This is the snapshot the formatter uses for the `Class instance` segment and
/// for [`Value::instance`]. Only data fields belong in [`Inspect::fields`];
/// function-valued fields are dropped when rendered.
///
/// # Examples
///
/// ```
/// use class_logger::{Fields, Inspect, render, ToValue, Value};
/// use std::sync::Arc;
///
/// struct Account {
///     id: u32,
///     owner: String,
/// }
///
/// impl Inspect for Account {
///     fn fields(&self) -> Fields {
///         Fields::new().record("id", self.id).record("owner", &self.owner)
///     }
/// }
///
/// let account = Arc::new(Account { id: 7, owner: "alice".to_owned() });
/// assert_eq!(render(&account.to_value()), r#"Account {"id":7,"owner":"alice"}"#);
/// ```
pub trait Inspect {
    /// The name printed in front of the rendered fields.
    ///
    /// Defaults to the last path segment of the Rust type name.
    fn class_name(&self) -> StaticCowStr {
        Cow::Borrowed(short_type_name(std::any::type_name::<Self>()))
    }

    /// Own data fields, in declaration order.
    fn fields(&self) -> Fields {
        Fields::new()
    }
}

/// Ordered list of named field values produced by [`Inspect::fields`].
#[derive(Debug, Clone, Default)]
pub struct Fields(pub(crate) Vec<(StaticCowStr, Value)>);

impl Fields {
    #[must_use]
    pub const fn new() -> Self {
        Self(Vec::new())
    }

    #[must_use]
    pub fn record(mut self, key: impl Into<StaticCowStr>, value: impl ToValue) -> Self {
        self.push(key, value);
        self
    }

    pub fn push(&mut self, key: impl Into<StaticCowStr>, value: impl ToValue) {
        self.0.push((key.into(), value.to_value()));
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(key, value)| (key.as_ref(), value))
    }
}

impl<K, V> FromIterator<(K, V)> for Fields
where
    K: Into<StaticCowStr>,
    V: ToValue,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut fields = Self::new();
        for (key, value) in iter {
            fields.push(key, value);
        }
        fields
    }
}

/// Strips the module path and generic arguments from a type name.
pub(crate) fn short_type_name(full: &'static str) -> &'static str {
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
