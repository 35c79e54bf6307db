//! Dynamic values handed to the serializer.

use std::{
    any::Any,
    borrow::Cow,
    collections::{BTreeMap, BTreeSet, HashMap, HashSet},
    convert::Infallible,
    fmt,
    sync::Arc,
};

use crate::{
    StaticCowStr,
    inspect::{Inspect, short_type_name},
    render::render,
};

/// A loggable snapshot of an argument, a return value, an error or a field.
///
/// Values are cheap to clone: owned data is small and everything type-erased
/// lives behind an [`Arc`].
#[derive(Clone)]
pub struct Value(pub(crate) ValueInner);

#[derive(Clone)]
pub(crate) enum ValueInner {
    Undefined,
    Null,
    Bool(bool),
    Int(i64),
    UInt(u64),
    Float(f64),
    String(StaticCowStr),
    Symbol(Option<StaticCowStr>),
    Function(StaticCowStr),
    Array(Vec<Value>),
    Object(Vec<(StaticCowStr, Value)>),
    Error(Box<ErrorValue>),
    Instance(Arc<dyn Inspect + Send + Sync>),
    Map {
        type_name: StaticCowStr,
        entries: Vec<(Value, Value)>,
    },
    Set {
        type_name: StaticCowStr,
        items: Vec<Value>,
    },
    Display(Arc<dyn fmt::Display + Send + Sync>),
    Debug(Arc<dyn fmt::Debug + Send + Sync>),
    Serde(Arc<dyn erased_serde::Serialize + Send + Sync>),
}

impl From<ValueInner> for Value {
    fn from(inner: ValueInner) -> Self {
        Self(inner)
    }
}

impl Value {
    #[must_use]
    pub const fn undefined() -> Self {
        Self(ValueInner::Undefined)
    }

    #[must_use]
    pub const fn null() -> Self {
        Self(ValueInner::Null)
    }

    #[must_use]
    pub fn string(value: impl Into<StaticCowStr>) -> Self {
        ValueInner::String(value.into()).into()
    }

    /// A symbol-like opaque token, rendered as `Symbol(description)`.
    #[must_use]
    pub fn symbol(description: Option<&'static str>) -> Self {
        ValueInner::Symbol(description.map(Cow::Borrowed)).into()
    }

    /// A callable. Functions are dropped from JSON fragments and instance fields.
    #[must_use]
    pub fn function(name: impl Into<StaticCowStr>) -> Self {
        ValueInner::Function(name.into()).into()
    }

    #[must_use]
    pub fn array(items: impl IntoIterator<Item = Self>) -> Self {
        ValueInner::Array(items.into_iter().collect()).into()
    }

    /// A plain key-value object. Keys keep their insertion order.
    #[must_use]
    pub fn object<K>(entries: impl IntoIterator<Item = (K, Self)>) -> Self
    where
        K: Into<StaticCowStr>,
    {
        let entries = entries.into_iter().map(|(key, value)| (key.into(), value));
        ValueInner::Object(entries.collect()).into()
    }

    #[must_use]
    pub fn error(error: ErrorValue) -> Self {
        ValueInner::Error(Box::new(error)).into()
    }

    /// A shared class instance, inspected lazily when rendered.
    #[must_use]
    pub fn instance<T>(instance: Arc<T>) -> Self
    where
        T: Inspect + Send + Sync + 'static,
    {
        ValueInner::Instance(instance).into()
    }

    /// A map-like container named `type_name`.
    #[must_use]
    pub fn map(
        type_name: impl Into<StaticCowStr>,
        entries: impl IntoIterator<Item = (Self, Self)>,
    ) -> Self {
        ValueInner::Map {
            type_name: type_name.into(),
            entries: entries.into_iter().collect(),
        }
        .into()
    }

    /// A set-like container named `type_name`.
    #[must_use]
    pub fn set(type_name: impl Into<StaticCowStr>, items: impl IntoIterator<Item = Self>) -> Self {
        ValueInner::Set {
            type_name: type_name.into(),
            items: items.into_iter().collect(),
        }
        .into()
    }

    pub fn display<T>(value: T) -> Self
    where
        T: fmt::Display + Send + Sync + 'static,
    {
        ValueInner::Display(Arc::new(value)).into()
    }

    pub fn debug<T>(value: T) -> Self
    where
        T: fmt::Debug + Send + Sync + 'static,
    {
        ValueInner::Debug(Arc::new(value)).into()
    }

    /// A value that is rendered through its [`serde::Serialize`] implementation
    /// as a plain JSON fragment.
    pub fn serde<S>(value: S) -> Self
    where
        S: serde::Serialize + Send + Sync + 'static,
    {
        ValueInner::Serde(Arc::new(value)).into()
    }

    /// An error-like value captured from any [`std::error::Error`].
    ///
    /// Handy for implementing [`ToValue`] on error types:
    ///
    /// ```
    /// use class_logger::{ToValue, Value, render};
    ///
    /// #[derive(Debug)]
    /// struct Timeout;
    ///
    /// impl std::fmt::Display for Timeout {
    ///     fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    ///         f.write_str("timed out")
    ///     }
    /// }
    ///
    /// impl std::error::Error for Timeout {}
    ///
    /// impl ToValue for Timeout {
    ///     fn to_value(&self) -> Value {
    ///         Value::from_error(self)
    ///     }
    /// }
    ///
    /// assert_eq!(
    ///     render(&Timeout.to_value()),
    ///     r#"Timeout {"message":"timed out","name":"Error"}"#
    /// );
    /// ```
    #[must_use]
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::error(ErrorValue::from_error(error))
    }

    #[must_use]
    pub const fn is_undefined(&self) -> bool {
        matches!(self.0, ValueInner::Undefined)
    }

    /// Returns `true` for values rendered with a type name prefix.
    #[must_use]
    pub const fn is_complex(&self) -> bool {
        matches!(
            self.0,
            ValueInner::Error(_)
                | ValueInner::Instance(_)
                | ValueInner::Map { .. }
                | ValueInner::Set { .. }
        )
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&render(self))
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Value").field(&render(self)).finish()
    }
}

/// The error-like shape: a class name plus `code`, `message`, `name` and `stack`.
#[derive(Debug, Clone)]
pub struct ErrorValue {
    pub class_name: StaticCowStr,
    pub name: StaticCowStr,
    pub message: String,
    pub code: Option<Value>,
    pub stack: Option<String>,
}

impl ErrorValue {
    pub fn new(class_name: impl Into<StaticCowStr>, message: impl Into<String>) -> Self {
        Self {
            class_name: class_name.into(),
            name: Cow::Borrowed("Error"),
            message: message.into(),
            code: None,
            stack: None,
        }
    }

    /// Captures a [`std::error::Error`], naming it after its concrete type.
    pub fn from_error<E>(error: &E) -> Self
    where
        E: std::error::Error + 'static,
    {
        Self::new(short_type_name(std::any::type_name::<E>()), error.to_string())
    }

    /// Captures the payload of a panic, as produced by `catch_unwind`.
    #[must_use]
    pub fn from_panic(payload: &(dyn Any + Send)) -> Self {
        let message = payload
            .downcast_ref::<&str>()
            .map(|message| (*message).to_owned())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "Box<dyn Any>".to_owned());
        Self::new("Panic", message)
    }

    #[must_use]
    pub fn name(mut self, name: impl Into<StaticCowStr>) -> Self {
        self.name = name.into();
        self
    }

    #[must_use]
    pub fn code(mut self, code: impl ToValue) -> Self {
        self.code = Some(code.to_value());
        self
    }

    #[must_use]
    pub fn stack(mut self, stack: impl Into<String>) -> Self {
        self.stack = Some(stack.into());
        self
    }
}

/// Conversion of a borrowed Rust value into a loggable [`Value`].
///
/// The interceptor only ever borrows arguments and results, so implementors
/// must not consume or alter the value.
pub trait ToValue {
    fn to_value(&self) -> Value;
}

impl<T: ToValue + ?Sized> ToValue for &T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl<T: ToValue + ?Sized> ToValue for &mut T {
    fn to_value(&self) -> Value {
        (**self).to_value()
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Value {
        self.clone()
    }
}

impl ToValue for () {
    fn to_value(&self) -> Value {
        Value::undefined()
    }
}

impl ToValue for Infallible {
    fn to_value(&self) -> Value {
        match *self {}
    }
}

impl ToValue for bool {
    fn to_value(&self) -> Value {
        ValueInner::Bool(*self).into()
    }
}

macro_rules! impl_to_value {
    ($variant:ident as $repr:ty: $($ty:ty),+) => {
        $(
            impl ToValue for $ty {
                fn to_value(&self) -> Value {
                    ValueInner::$variant(<$repr>::from(*self)).into()
                }
            }
        )+
    };
}

impl_to_value!(Int as i64: i8, i16, i32, i64);
impl_to_value!(UInt as u64: u8, u16, u32, u64);
impl_to_value!(Float as f64: f32, f64);

impl ToValue for isize {
    fn to_value(&self) -> Value {
        // `isize` is at most 64 bits wide on every supported target.
        ValueInner::Int(i64::try_from(*self).unwrap_or(i64::MAX)).into()
    }
}

impl ToValue for usize {
    fn to_value(&self) -> Value {
        ValueInner::UInt(u64::try_from(*self).unwrap_or(u64::MAX)).into()
    }
}

impl ToValue for char {
    fn to_value(&self) -> Value {
        Value::string(self.to_string())
    }
}

impl ToValue for str {
    fn to_value(&self) -> Value {
        Value::string(self.to_owned())
    }
}

impl ToValue for String {
    fn to_value(&self) -> Value {
        Value::string(self.clone())
    }
}

impl ToValue for Cow<'_, str> {
    fn to_value(&self) -> Value {
        Value::string(self.clone().into_owned())
    }
}

impl<T: ToValue> ToValue for Option<T> {
    fn to_value(&self) -> Value {
        self.as_ref().map_or_else(Value::undefined, ToValue::to_value)
    }
}

impl<T: ToValue> ToValue for [T] {
    fn to_value(&self) -> Value {
        Value::array(self.iter().map(ToValue::to_value))
    }
}

impl<T: ToValue, const N: usize> ToValue for [T; N] {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T: ToValue> ToValue for Vec<T> {
    fn to_value(&self) -> Value {
        self.as_slice().to_value()
    }
}

impl<T> ToValue for Arc<T>
where
    T: Inspect + Send + Sync + 'static,
{
    fn to_value(&self) -> Value {
        Value::instance(Arc::clone(self))
    }
}

impl<K: ToValue, V: ToValue, S> ToValue for HashMap<K, V, S> {
    fn to_value(&self) -> Value {
        let mut entries = self
            .iter()
            .map(|(key, value)| (key.to_value(), value.to_value()))
            .collect::<Vec<_>>();
        // Hash order is random; keep the rendering deterministic.
        entries.sort_by_cached_key(|(key, _)| render(key));
        Value::map("HashMap", entries)
    }
}

impl<K: ToValue, V: ToValue> ToValue for BTreeMap<K, V> {
    fn to_value(&self) -> Value {
        let entries = self
            .iter()
            .map(|(key, value)| (key.to_value(), value.to_value()));
        Value::map("BTreeMap", entries)
    }
}

impl<T: ToValue, S> ToValue for HashSet<T, S> {
    fn to_value(&self) -> Value {
        let mut items = self.iter().map(ToValue::to_value).collect::<Vec<_>>();
        items.sort_by_cached_key(render);
        Value::set("HashSet", items)
    }
}

impl<T: ToValue> ToValue for BTreeSet<T> {
    fn to_value(&self) -> Value {
        Value::set("BTreeSet", self.iter().map(ToValue::to_value))
    }
}

impl ToValue for serde_json::Value {
    fn to_value(&self) -> Value {
        match self {
            Self::Null => Value::null(),
            Self::Bool(value) => value.to_value(),
            Self::Number(number) => {
                if let Some(value) = number.as_i64() {
                    ValueInner::Int(value).into()
                } else if let Some(value) = number.as_u64() {
                    ValueInner::UInt(value).into()
                } else {
                    ValueInner::Float(number.as_f64().unwrap_or(f64::NAN)).into()
                }
            }
            Self::String(value) => value.to_value(),
            Self::Array(items) => items.to_value(),
            Self::Object(entries) => Value::object(
                entries
                    .iter()
                    .map(|(key, value)| (key.clone(), value.to_value())),
            ),
        }
    }
}

impl ToValue for ErrorValue {
    fn to_value(&self) -> Value {
        Value::error(self.clone())
    }
}

impl ToValue for std::io::Error {
    fn to_value(&self) -> Value {
        let error = ErrorValue::from_error(self).code(format!("{:?}", self.kind()));
        Value::error(error)
    }
}

impl ToValue for Box<dyn std::error::Error + Send + Sync> {
    fn to_value(&self) -> Value {
        Value::error(ErrorValue::new("Error", self.to_string()))
    }
}

impl ToValue for Box<dyn std::error::Error> {
    fn to_value(&self) -> Value {
        Value::error(ErrorValue::new("Error", self.to_string()))
    }
}

/// An argument list that can be snapshotted before it is handed over.
///
/// Implemented for tuples of up to twelve [`ToValue`] elements; `()` is the
/// empty argument list.
pub trait Args {
    fn to_values(&self) -> Vec<Value>;
}

impl Args for () {
    fn to_values(&self) -> Vec<Value> {
        Vec::new()
    }
}

macro_rules! impl_args_for_tuple {
    ($($name:ident),+) => {
        impl<$($name: ToValue),+> Args for ($($name,)+) {
            #[allow(non_snake_case)]
            fn to_values(&self) -> Vec<Value> {
                let ($($name,)+) = self;
                vec![$($name.to_value()),+]
            }
        }
    };
}

impl_args_for_tuple!(A);
impl_args_for_tuple!(A, B);
impl_args_for_tuple!(A, B, C);
impl_args_for_tuple!(A, B, C, D);
impl_args_for_tuple!(A, B, C, D, E);
impl_args_for_tuple!(A, B, C, D, E, F);
impl_args_for_tuple!(A, B, C, D, E, F, G);
impl_args_for_tuple!(A, B, C, D, E, F, G, H);
impl_args_for_tuple!(A, B, C, D, E, F, G, H, I);
impl_args_for_tuple!(A, B, C, D, E, F, G, H, I, J);
impl_args_for_tuple!(A, B, C, D, E, F, G, H, I, J, K);
impl_args_for_tuple!(A, B, C, D, E, F, G, H, I, J, K, L);
