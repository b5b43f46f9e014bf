//! Runtime values a path navigates
//!
//! [`Value`] is a small dynamic model of Go-like data: scalars with their
//! declared width, sequences, mappings with a declared key type, named
//! records, references, and host objects that resolve members lazily.

use std::any::Any;
use std::fmt;
use std::sync::Arc;

use serde::ser::{SerializeMap, SerializeSeq};
use serde::{Deserialize, Serialize, Serializer};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum IntKind {
    Int,
    Int8,
    Int16,
    Int32,
    Int64,
}

impl IntKind {
    pub fn name(self) -> &'static str {
        match self {
            IntKind::Int => "int",
            IntKind::Int8 => "int8",
            IntKind::Int16 => "int16",
            IntKind::Int32 => "int32",
            IntKind::Int64 => "int64",
        }
    }

    /// Inclusive range of the kind; `int` is 64 bits wide
    pub fn bounds(self) -> (i64, i64) {
        match self {
            IntKind::Int8 => (i8::MIN.into(), i8::MAX.into()),
            IntKind::Int16 => (i16::MIN.into(), i16::MAX.into()),
            IntKind::Int32 => (i32::MIN.into(), i32::MAX.into()),
            IntKind::Int | IntKind::Int64 => (i64::MIN, i64::MAX),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UintKind {
    Uint,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
}

impl UintKind {
    pub fn name(self) -> &'static str {
        match self {
            UintKind::Uint => "uint",
            UintKind::Uint8 => "uint8",
            UintKind::Uint16 => "uint16",
            UintKind::Uint32 => "uint32",
            UintKind::Uint64 => "uint64",
        }
    }

    pub fn max(self) -> u64 {
        match self {
            UintKind::Uint8 => u8::MAX.into(),
            UintKind::Uint16 => u16::MAX.into(),
            UintKind::Uint32 => u32::MAX.into(),
            UintKind::Uint | UintKind::Uint64 => u64::MAX,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FloatKind {
    Float32,
    Float64,
}

impl FloatKind {
    pub fn name(self) -> &'static str {
        match self {
            FloatKind::Float32 => "float32",
            FloatKind::Float64 => "float64",
        }
    }
}

/// Declared key type of a [`Mapping`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum KeyType {
    Int(IntKind),
    Uint(UintKind),
    Float(FloatKind),
    String,
    Bool,
    /// Composite keys; mappings with these cannot be indexed by a path
    Other,
}

impl fmt::Display for KeyType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyType::Int(k) => f.write_str(k.name()),
            KeyType::Uint(k) => f.write_str(k.name()),
            KeyType::Float(k) => f.write_str(k.name()),
            KeyType::String => f.write_str("string"),
            KeyType::Bool => f.write_str("bool"),
            KeyType::Other => f.write_str("composite"),
        }
    }
}

/// A value whose members are produced on demand.
///
/// Host objects let a path walk data that is not materialized as a tree,
/// such as views over a type graph.
pub trait Navigable: Send + Sync + fmt::Debug {
    /// Name shown in error messages
    fn type_name(&self) -> String;

    /// The member called `name`, if the object has one
    fn field(&self, name: &str) -> Option<Value>;

    /// Names of the members, for listing helpers
    fn field_names(&self) -> Vec<String> {
        Vec::new()
    }

    /// Text used when the object is printed
    fn describe(&self) -> String {
        self.type_name()
    }

    fn as_any(&self) -> &dyn Any;
}

#[derive(Debug, Clone)]
pub enum Value {
    Null,
    Bool(bool),
    Int(IntKind, i64),
    Uint(UintKind, u64),
    Float(FloatKind, f64),
    String(String),
    Seq(Vec<Value>),
    Map(Mapping),
    Record(Record),
    /// Pointer or interface indirection
    Ref(Arc<Value>),
    Object(Arc<dyn Navigable>),
}

/// Entries keyed by a declared key type, in insertion order
#[derive(Debug, Clone, PartialEq)]
pub struct Mapping {
    key_type: KeyType,
    entries: Vec<(Value, Value)>,
}

impl Mapping {
    pub fn new(key_type: KeyType) -> Self {
        Self {
            key_type,
            entries: Vec::new(),
        }
    }

    /// A string-keyed mapping
    pub fn strings<K, I>(entries: I) -> Self
    where
        K: Into<String>,
        I: IntoIterator<Item = (K, Value)>,
    {
        let mut mapping = Self::new(KeyType::String);
        for (k, v) in entries {
            mapping.insert(Value::String(k.into()), v);
        }
        mapping
    }

    pub fn key_type(&self) -> KeyType {
        self.key_type
    }

    /// Insert or replace the entry for `key`
    pub fn insert(&mut self, key: Value, value: Value) {
        match self.entries.iter_mut().find(|(k, _)| same_key(k, &key)) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn with(mut self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        self.insert(key.into(), value.into());
        self
    }

    /// Entry for `key`; integer and float keys compare by numeric value
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| same_key(k, key))
            .map(|(_, v)| v)
    }

    pub fn get_str(&self, key: &str) -> Option<&Value> {
        self.entries
            .iter()
            .find(|(k, _)| matches!(k, Value::String(s) if s == key))
            .map(|(_, v)| v)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter().map(|(k, v)| (k, v))
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.entries.iter().map(|(_, v)| v)
    }
}

fn same_key(a: &Value, b: &Value) -> bool {
    match (a, b) {
        (Value::Int(_, x), Value::Int(_, y)) => x == y,
        (Value::Uint(_, x), Value::Uint(_, y)) => x == y,
        (Value::Int(_, x), Value::Uint(_, y)) | (Value::Uint(_, y), Value::Int(_, x)) => {
            u64::try_from(*x).is_ok_and(|x| x == *y)
        }
        (Value::Float(_, x), Value::Float(_, y)) => x == y,
        _ => a == b,
    }
}

/// A named struct-like value with ordered fields
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub name: String,
    pub fields: Vec<(String, Value)>,
}

impl Record {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            fields: Vec::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.fields.push((name.into(), value.into()));
        self
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

impl Value {
    pub fn int(v: i64) -> Self {
        Value::Int(IntKind::Int, v)
    }

    pub fn uint(v: u64) -> Self {
        Value::Uint(UintKind::Uint, v)
    }

    pub fn float(v: f64) -> Self {
        Value::Float(FloatKind::Float64, v)
    }

    pub fn string(v: impl Into<String>) -> Self {
        Value::String(v.into())
    }

    pub fn seq<I: IntoIterator<Item = Value>>(items: I) -> Self {
        Value::Seq(items.into_iter().collect())
    }

    pub fn reference(v: Value) -> Self {
        Value::Ref(Arc::new(v))
    }

    pub fn object<N: Navigable + 'static>(object: N) -> Self {
        Value::Object(Arc::new(object))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Follow references down to the first non-reference value
    pub fn direct(&self) -> &Value {
        let mut current = self;
        while let Value::Ref(inner) = current {
            current = inner;
        }
        current
    }

    /// Short description of the value's type, Go style
    pub fn type_name(&self) -> String {
        match self {
            Value::Null => "nil".to_string(),
            Value::Bool(_) => "bool".to_string(),
            Value::Int(k, _) => k.name().to_string(),
            Value::Uint(k, _) => k.name().to_string(),
            Value::Float(k, _) => k.name().to_string(),
            Value::String(_) => "string".to_string(),
            Value::Seq(_) => "slice".to_string(),
            Value::Map(m) => format!("map[{}]", m.key_type),
            Value::Record(r) => r.name.clone(),
            Value::Ref(inner) => format!("*{}", inner.type_name()),
            Value::Object(o) => o.type_name(),
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self.direct() {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self.direct() {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Any integer that fits in `i64`
    pub fn as_i64(&self) -> Option<i64> {
        match self.direct() {
            Value::Int(_, v) => Some(*v),
            Value::Uint(_, v) => i64::try_from(*v).ok(),
            _ => None,
        }
    }

    pub fn as_seq(&self) -> Option<&[Value]> {
        match self.direct() {
            Value::Seq(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_object(&self) -> Option<&Arc<dyn Navigable>> {
        match self.direct() {
            Value::Object(o) => Some(o),
            _ => None,
        }
    }

    /// Member lookup on records, host objects and string-keyed mappings
    pub fn member(&self, name: &str) -> Option<Value> {
        match self.direct() {
            Value::Record(r) => r.get(name).cloned(),
            Value::Object(o) => o.field(name),
            Value::Map(m) if m.key_type == KeyType::String => m.get_str(name).cloned(),
            _ => None,
        }
    }

    /// Length of strings (in bytes), sequences and mappings
    pub fn len(&self) -> Option<usize> {
        match self.direct() {
            Value::String(s) => Some(s.len()),
            Value::Seq(items) => Some(items.len()),
            Value::Map(m) => Some(m.len()),
            _ => None,
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Int(ka, a), Value::Int(kb, b)) => ka == kb && a == b,
            (Value::Uint(ka, a), Value::Uint(kb, b)) => ka == kb && a == b,
            (Value::Float(ka, a), Value::Float(kb, b)) => ka == kb && a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Seq(a), Value::Seq(b)) => a == b,
            (Value::Map(a), Value::Map(b)) => a == b,
            (Value::Record(a), Value::Record(b)) => a == b,
            (Value::Ref(a), Value::Ref(b)) => Arc::ptr_eq(a, b) || a == b,
            (Value::Object(a), Value::Object(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

/// Go `%v` formatting
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Null => f.write_str("<nil>"),
            Value::Bool(b) => write!(f, "{}", b),
            Value::Int(_, v) => write!(f, "{}", v),
            Value::Uint(_, v) => write!(f, "{}", v),
            Value::Float(_, v) => write!(f, "{}", v),
            Value::String(s) => f.write_str(s),
            Value::Seq(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
            Value::Map(m) => {
                f.write_str("map[")?;
                for (i, (k, v)) in m.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}:{}", k, v)?;
                }
                f.write_str("]")
            }
            Value::Record(r) => {
                f.write_str("{")?;
                for (i, (_, v)) in r.fields.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write!(f, "{}", v)?;
                }
                f.write_str("}")
            }
            Value::Ref(inner) => match inner.as_ref() {
                Value::Record(_) => write!(f, "&{}", inner),
                other => write!(f, "{}", other),
            },
            Value::Object(o) => f.write_str(&o.describe()),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::Int(_, v) => serializer.serialize_i64(*v),
            Value::Uint(_, v) => serializer.serialize_u64(*v),
            Value::Float(_, v) => serializer.serialize_f64(*v),
            Value::String(s) => serializer.serialize_str(s),
            Value::Seq(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Map(m) => {
                let mut map = serializer.serialize_map(Some(m.len()))?;
                for (k, v) in m.iter() {
                    map.serialize_entry(&k.to_string(), v)?;
                }
                map.end()
            }
            Value::Record(r) => {
                let mut map = serializer.serialize_map(Some(r.fields.len()))?;
                for (name, v) in &r.fields {
                    map.serialize_entry(name, v)?;
                }
                map.end()
            }
            Value::Ref(inner) => inner.serialize(serializer),
            Value::Object(o) => serializer.serialize_str(&o.describe()),
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::Int(IntKind::Int64, i)
                } else if let Some(u) = n.as_u64() {
                    Value::Uint(UintKind::Uint64, u)
                } else {
                    Value::Float(FloatKind::Float64, n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Seq(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(fields) => Value::Map(Mapping::strings(
                fields.into_iter().map(|(k, v)| (k, Value::from(v))),
            )),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(IntKind::Int64, v)
    }
}

impl From<i32> for Value {
    fn from(v: i32) -> Self {
        Value::Int(IntKind::Int32, v.into())
    }
}

impl From<u64> for Value {
    fn from(v: u64) -> Self {
        Value::Uint(UintKind::Uint64, v)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(FloatKind::Float64, v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<Vec<Value>> for Value {
    fn from(v: Vec<Value>) -> Self {
        Value::Seq(v)
    }
}

impl From<Mapping> for Value {
    fn from(v: Mapping) -> Self {
        Value::Map(v)
    }
}

impl From<Record> for Value {
    fn from(v: Record) -> Self {
        Value::Record(v)
    }
}

/// Types a path result can be stored into.
///
/// Conversion follows assignability: the value must already have the
/// destination's type, no numeric conversion happens.
pub trait FromValue: Sized {
    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: &Value) -> Option<Self> {
        Some(value.clone())
    }
}

impl FromValue for bool {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::String(s) => Some(s.clone()),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(IntKind::Int | IntKind::Int64, v) => Some(*v),
            _ => None,
        }
    }
}

macro_rules! narrow_from_value {
    ($ty:ty, $variant:ident, $kind:expr) => {
        impl FromValue for $ty {
            fn from_value(value: &Value) -> Option<Self> {
                match value {
                    Value::$variant(k, v) if *k == $kind => <$ty>::try_from(*v).ok(),
                    _ => None,
                }
            }
        }
    };
}

narrow_from_value!(i32, Int, IntKind::Int32);
narrow_from_value!(i16, Int, IntKind::Int16);
narrow_from_value!(i8, Int, IntKind::Int8);
narrow_from_value!(u32, Uint, UintKind::Uint32);
narrow_from_value!(u16, Uint, UintKind::Uint16);
narrow_from_value!(u8, Uint, UintKind::Uint8);

impl FromValue for u64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uint(UintKind::Uint | UintKind::Uint64, v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(FloatKind::Float64, v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for f32 {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Float(FloatKind::Float32, v) => Some(*v as f32),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Vec<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Seq(items) => items.iter().map(T::from_value).collect(),
            _ => None,
        }
    }
}

impl<T: FromValue> FromValue for Option<T> {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Null => Some(None),
            other => T::from_value(other).map(Some),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_from_json() {
        let v = Value::from(json!({"a": [1, 2.5, "x"], "b": null, "c": true}));
        let Value::Map(m) = &v else {
            panic!("expected mapping, got {:?}", v);
        };
        assert_eq!(m.key_type(), KeyType::String);
        assert_eq!(
            m.get_str("a"),
            Some(&Value::seq([
                Value::Int(IntKind::Int64, 1),
                Value::float(2.5),
                Value::string("x"),
            ]))
        );
        assert_eq!(m.get_str("b"), Some(&Value::Null));
        assert_eq!(
            Value::from(json!(u64::MAX)),
            Value::Uint(UintKind::Uint64, u64::MAX)
        );
    }

    #[test]
    fn test_display_like_go() {
        let record = Record::new("C").field("N", Value::int(100));
        assert_eq!(Value::reference(record.clone().into()).to_string(), "&{100}");
        assert_eq!(Value::from(record).to_string(), "{100}");
        assert_eq!(
            Value::seq([Value::int(1), Value::int(2)]).to_string(),
            "[1 2]"
        );
        let m = Mapping::strings([("k", Value::from("v"))]);
        assert_eq!(Value::from(m).to_string(), "map[k:v]");
        assert_eq!(Value::Null.to_string(), "<nil>");
        assert_eq!(Value::float(1.5).to_string(), "1.5");
    }

    #[test]
    fn test_numeric_keys_compare_by_value() {
        let m = Mapping::new(KeyType::Int(IntKind::Int)).with(Value::int(-1), 100i64);
        assert_eq!(
            m.get(&Value::Int(IntKind::Int64, -1)),
            Some(&Value::from(100i64))
        );
        assert_eq!(m.get(&Value::int(1)), None);
    }

    #[test]
    fn test_from_value_requires_exact_type() {
        assert_eq!(i64::from_value(&Value::int(7)), Some(7));
        assert_eq!(i64::from_value(&Value::from(7i32)), None);
        assert_eq!(i32::from_value(&Value::from(7i32)), Some(7));
        assert_eq!(String::from_value(&Value::int(7)), None);
        assert_eq!(
            Vec::<i64>::from_value(&Value::seq([Value::int(1), Value::int(2)])),
            Some(vec![1, 2])
        );
        assert_eq!(Option::<bool>::from_value(&Value::Null), Some(None));
    }

    #[test]
    fn test_serialize_to_json() {
        let v = Value::from(
            Record::new("T")
                .field("A", Value::int(1))
                .field("B", Value::reference(Value::string("x"))),
        );
        assert_eq!(
            serde_json::to_value(&v).unwrap(),
            json!({"A": 1, "B": "x"})
        );
    }
}
