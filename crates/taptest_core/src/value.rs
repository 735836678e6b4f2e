//! Dynamic values compared by the assertion library.
//!
//! Primitives (`Undefined`, `Null`, `Bool`, `Number`, `String`) are compared by value. Everything else is a
//! *reference*: it lives behind an [`Arc`], cloning a [`Value`] shares it, and identity equality compares the
//! allocation rather than the contents.
//!
//! Values are immutable once built, so reference cycles cannot be formed.

use std::any::Any;
use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use serde::Serialize;

/// A value that assertions can compare and diagnostics can render.
#[derive(Debug, Clone, Default)]
pub enum Value {
    #[default]
    Undefined,
    Null,
    Bool(bool),
    Number(f64),
    String(Arc<str>),
    Symbol(Arc<Symbol>),
    Date(Arc<Date>),
    Array(Arc<[Value]>),
    Object(Arc<Object>),
    Host(HostRef),
}

/// A unique token. Two symbols are never equal unless they are the same allocation.
pub struct Symbol {
    description: Option<String>,
}

impl fmt::Debug for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Symbol({})", self.description.as_deref().unwrap_or_default())
    }
}

/// A point in time, stored as milliseconds since the Unix epoch.
#[derive(Debug)]
pub struct Date {
    millis: f64,
}

impl Date {
    pub fn millis(&self) -> f64 {
        self.millis
    }
}

/// Constructor identity of an object.
///
/// Classes compare by reference: two classes with the same name are still different classes.
#[derive(Clone)]
pub struct Class(Arc<ClassInfo>);

struct ClassInfo {
    name: String,
}

impl Class {
    pub fn new(name: impl Into<String>) -> Self {
        Self(Arc::new(ClassInfo { name: name.into() }))
    }

    pub fn name(&self) -> &str {
        &self.0.name
    }
}

impl PartialEq for Class {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl Eq for Class {}

impl fmt::Debug for Class {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Class({})", self.0.name)
    }
}

/// An object: an optional class plus own properties in insertion order.
#[derive(Debug)]
pub struct Object {
    class: Option<Class>,
    properties: Vec<(String, Value)>,
}

impl Object {
    /// Build an object. A repeated key keeps its first position and takes the last value.
    pub fn new<K, V>(class: Option<Class>, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        let mut entries: Vec<(String, Value)> = Vec::new();
        for (key, value) in properties {
            let key = key.into();
            let value = value.into();
            match entries.iter_mut().find(|(existing, _)| *existing == key) {
                Some(slot) => slot.1 = value,
                None => entries.push((key, value)),
            }
        }
        Self {
            class,
            properties: entries,
        }
    }

    pub fn class(&self) -> Option<&Class> {
        self.class.as_ref()
    }

    pub fn properties(&self) -> &[(String, Value)] {
        &self.properties
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.properties.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }
}

/// An opaque Rust object, compared only by identity.
#[derive(Clone)]
pub struct HostRef {
    type_name: &'static str,
    inner: Arc<dyn Any + Send + Sync>,
}

impl HostRef {
    pub fn new<T: Any + Send + Sync>(value: Arc<T>) -> Self {
        Self {
            type_name: std::any::type_name::<T>(),
            inner: value,
        }
    }

    pub fn ptr_eq(&self, other: &HostRef) -> bool {
        std::ptr::addr_eq(Arc::as_ptr(&self.inner), Arc::as_ptr(&other.inner))
    }
}

impl fmt::Debug for HostRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Host({})", self.type_name)
    }
}

/// The prototype of a composite value, used by deep equality.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Prototype<'a> {
    Array,
    /// `None` for plain objects.
    Object(Option<&'a Class>),
}

impl Value {
    pub fn string(s: impl Into<Arc<str>>) -> Self {
        Value::String(s.into())
    }

    pub fn symbol(description: impl Into<String>) -> Self {
        Value::Symbol(Arc::new(Symbol {
            description: Some(description.into()),
        }))
    }

    pub fn date(millis: f64) -> Self {
        Value::Date(Arc::new(Date { millis }))
    }

    pub fn array<V: Into<Value>>(items: impl IntoIterator<Item = V>) -> Self {
        Value::Array(items.into_iter().map(V::into).collect())
    }

    /// Build a plain object.
    pub fn object<K, V>(properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(Arc::new(Object::new(None, properties)))
    }

    /// Build an object whose constructor is `class`.
    pub fn instance<K, V>(class: &Class, properties: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<Value>,
    {
        Value::Object(Arc::new(Object::new(Some(class.clone()), properties)))
    }

    pub fn host<T: Any + Send + Sync>(value: T) -> Self {
        Value::Host(HostRef::new(Arc::new(value)))
    }

    /// Convert any serializable Rust value through its JSON form.
    ///
    /// Every call builds fresh references, so two conversions are deep-equal but never identical.
    pub fn from_serialize<T: Serialize + ?Sized>(value: &T) -> Result<Self, serde_json::Error> {
        serde_json::to_value(value).map(Value::from)
    }

    /// Whether this value is an object or array, i.e. takes part in key-by-key comparison.
    pub fn is_composite(&self) -> bool {
        self.prototype().is_some()
    }

    pub fn prototype(&self) -> Option<Prototype<'_>> {
        match self {
            Value::Array(_) => Some(Prototype::Array),
            Value::Object(obj) => Some(Prototype::Object(obj.class())),
            _ => None,
        }
    }

    /// Own enumerable entries. Arrays use their indices as keys; non-composites have none.
    pub fn own_entries(&self) -> Vec<(Cow<'_, str>, &Value)> {
        match self {
            Value::Array(items) => items
                .iter()
                .enumerate()
                .map(|(i, v)| (Cow::Owned(i.to_string()), v))
                .collect(),
            Value::Object(obj) => obj
                .properties()
                .iter()
                .map(|(k, v)| (Cow::Borrowed(k.as_str()), v))
                .collect(),
            _ => Vec::new(),
        }
    }

    /// Truthiness: `false`, `0`, `-0`, `NaN`, `""`, `null` and `undefined` are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Undefined | Value::Null => false,
            Value::Bool(b) => *b,
            Value::Number(n) => !(*n == 0.0 || n.is_nan()),
            Value::String(s) => !s.is_empty(),
            _ => true,
        }
    }
}

impl From<&Value> for Value {
    fn from(value: &Value) -> Self {
        value.clone()
    }
}

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Undefined
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

macro_rules! impl_from_number {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(n: $ty) -> Self {
                    Value::Number(n as f64)
                }
            }
        )*
    };
}

impl_from_number!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64);

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    fn from(s: Arc<str>) -> Self {
        Value::String(s)
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(opt: Option<T>) -> Self {
        opt.map_or(Value::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::array(items)
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => Value::Number(n.as_f64().unwrap_or(f64::NAN)),
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => Value::array(items),
            serde_json::Value::Object(map) => Value::object(map),
        }
    }
}
