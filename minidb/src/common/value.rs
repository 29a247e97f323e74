use crate::collection::Document;
use crate::errors::{ErrorKind, MiniDbError, MiniDbResult};
use serde::de::{self, DeserializeOwned, MapAccess, SeqAccess, Visitor};
use serde::ser::SerializeSeq;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::cmp::Ordering;
use std::fmt::{Debug, Display, Formatter};

/// Represents a record value. It can be a scalar like [Value::I64] or
/// [Value::String], or a nested structure like [Value::Document] or
/// [Value::Array].
///
/// The variants mirror what a JSON file can hold. Integers keep their exact
/// representation (`I64` for signed, `U64` for values above `i64::MAX`);
/// everything else numeric is `F64`. Numbers compare across the three numeric
/// variants, so `val!(1) == val!(1.0)`.
///
/// Cloning a `Value` produces a fully independent deep copy, which is how the
/// store hands records to callers without aliasing its own state.
///
/// # Usage
/// ```rust
/// use minidb::{doc, val};
/// use minidb::common::Value;
///
/// let age: Value = 27.into();
/// let name = Value::from("Jim");
/// let person = doc! { name: "Jim", age: 27 };
/// assert_eq!(person.get("age"), Some(&age));
/// assert_eq!(person.get("name"), Some(&name));
/// assert_eq!(val!(true), Value::Bool(true));
/// ```
#[derive(Clone, Default)]
pub enum Value {
    /// Represents a null value.
    #[default]
    Null,
    /// Represents a boolean value.
    Bool(bool),
    /// Represents a signed 64-bit integer value.
    I64(i64),
    /// Represents an unsigned 64-bit integer too large for `I64`.
    U64(u64),
    /// Represents a 64-bit floating point value.
    F64(f64),
    /// Represents a string value.
    String(String),
    /// Represents an ordered array of values.
    Array(Vec<Value>),
    /// Represents a nested document (JSON object).
    Document(Document),
}

/// Compares two numeric values, `None` when either side is not a number.
pub(crate) fn compare_numbers(left: &Value, right: &Value) -> Option<Ordering> {
    match (left, right) {
        (Value::I64(a), Value::I64(b)) => Some(a.cmp(b)),
        (Value::U64(a), Value::U64(b)) => Some(a.cmp(b)),
        (Value::I64(a), Value::U64(b)) => Some((*a as i128).cmp(&(*b as i128))),
        (Value::U64(a), Value::I64(b)) => Some((*a as i128).cmp(&(*b as i128))),
        (Value::F64(a), Value::F64(b)) => a.partial_cmp(b),
        (Value::F64(a), Value::I64(b)) => compare_int_float(*b as i128, *a).map(Ordering::reverse),
        (Value::F64(a), Value::U64(b)) => compare_int_float(*b as i128, *a).map(Ordering::reverse),
        (Value::I64(a), Value::F64(b)) => compare_int_float(*a as i128, *b),
        (Value::U64(a), Value::F64(b)) => compare_int_float(*a as i128, *b),
        _ => None,
    }
}

/// Orders an integer against a float without rounding the integer, which
/// `as f64` would do above 2^53.
fn compare_int_float(int: i128, float: f64) -> Option<Ordering> {
    // every i64 and u64 lies in [-2^63, 2^64)
    const LOWER: f64 = -9_223_372_036_854_775_808.0;
    const UPPER: f64 = 18_446_744_073_709_551_616.0;

    if float.is_nan() {
        return None;
    }
    if float >= UPPER {
        return Some(Ordering::Less);
    }
    if float < LOWER {
        return Some(Ordering::Greater);
    }

    let whole = float.trunc();
    match int.cmp(&(whole as i128)) {
        Ordering::Equal => 0.0_f64.partial_cmp(&(float - whole)),
        ordering => Some(ordering),
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        if self.is_number() && other.is_number() {
            return compare_numbers(self, other) == Some(Ordering::Equal);
        }

        match (self, other) {
            (Value::Null, Value::Null) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Array(a), Value::Array(b)) => a == b,
            (Value::Document(a), Value::Document(b)) => a == b,
            _ => false,
        }
    }
}

impl Value {
    /// Converts any serializable Rust value into a record value.
    ///
    /// Fails with [ErrorKind::InvalidRecord] when the value has no JSON
    /// representation (for example a map with non-string keys).
    pub fn from_serializable<T: Serialize + ?Sized>(value: &T) -> MiniDbResult<Value> {
        let json = serde_json::to_value(value).map_err(|err| {
            log::error!("Value cannot be represented as a record: {}", err);
            MiniDbError::new(
                &format!("Value cannot be represented as a record: {}", err),
                ErrorKind::InvalidRecord,
            )
        })?;
        Ok(Value::from(json))
    }

    /// Converts this value into a typed Rust value.
    pub fn deserialize_into<T: DeserializeOwned>(&self) -> MiniDbResult<T> {
        T::deserialize(self.clone())
    }

    /// Checks that this value can be persisted.
    ///
    /// Non-finite floats have no JSON representation and are rejected,
    /// anywhere in the value tree.
    pub fn validate(&self) -> MiniDbResult<()> {
        match self {
            Value::F64(f) if !f.is_finite() => {
                log::error!("Record contains a non-finite number {}", f);
                Err(MiniDbError::new(
                    &format!("Record contains a non-finite number {}", f),
                    ErrorKind::InvalidRecord,
                ))
            }
            Value::Array(items) => items.iter().try_for_each(Value::validate),
            Value::Document(doc) => doc.iter().try_for_each(|(_, v)| v.validate()),
            _ => Ok(()),
        }
    }

    /// Merges `patch` into this value.
    ///
    /// Two documents merge field by field: fields present in `patch`
    /// overwrite or extend this document and all other fields are kept.
    /// Any other combination replaces this value with `patch`.
    pub fn merge(&mut self, patch: &Value) {
        match (self, patch) {
            (Value::Document(target), Value::Document(source)) => target.merge(source),
            (target, _) => *target = patch.clone(),
        }
    }

    /// JavaScript-style truthiness used by bare filter operands.
    pub fn is_truthy(&self) -> bool {
        match self {
            Value::Null => false,
            Value::Bool(b) => *b,
            Value::I64(i) => *i != 0,
            Value::U64(u) => *u != 0,
            Value::F64(f) => *f != 0.0 && !f.is_nan(),
            Value::String(s) => !s.is_empty(),
            Value::Array(_) | Value::Document(_) => true,
        }
    }

    /// Short name of the variant, used in log and error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::I64(_) | Value::U64(_) | Value::F64(_) => "number",
            Value::String(_) => "string",
            Value::Array(_) => "array",
            Value::Document(_) => "document",
        }
    }

    #[inline]
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    #[inline]
    pub fn is_number(&self) -> bool {
        matches!(self, Value::I64(_) | Value::U64(_) | Value::F64(_))
    }

    #[inline]
    pub fn is_document(&self) -> bool {
        matches!(self, Value::Document(_))
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::I64(i) => Some(*i),
            Value::U64(u) => i64::try_from(*u).ok(),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::I64(i) => Some(*i as f64),
            Value::U64(u) => Some(*u as f64),
            Value::F64(f) => Some(*f),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s.as_str()),
            _ => None,
        }
    }

    pub fn as_array(&self) -> Option<&Vec<Value>> {
        match self {
            Value::Array(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_document(&self) -> Option<&Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    pub fn as_document_mut(&mut self) -> Option<&mut Document> {
        match self {
            Value::Document(doc) => Some(doc),
            _ => None,
        }
    }

    /// Looks up a top level field when this value is a document.
    pub fn get(&self, field: &str) -> Option<&Value> {
        self.as_document().and_then(|doc| doc.get(field))
    }
}

impl Display for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

impl Debug for Value {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Value::F64(v) if !v.is_finite() => write!(f, "{}", v),
            _ => Display::fmt(self, f),
        }
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Value::Null => serializer.serialize_unit(),
            Value::Bool(b) => serializer.serialize_bool(*b),
            Value::I64(i) => serializer.serialize_i64(*i),
            Value::U64(u) => serializer.serialize_u64(*u),
            Value::F64(f) => serializer.serialize_f64(*f),
            Value::String(s) => serializer.serialize_str(s),
            Value::Array(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Document(doc) => doc.serialize(serializer),
        }
    }
}

struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "any JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> Result<Value, E> {
        Ok(Value::Bool(v))
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Value, E> {
        Ok(Value::I64(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Value, E> {
        Ok(Value::from(v))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Value, E> {
        Ok(Value::F64(v))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Value, E> {
        Ok(Value::String(v.to_string()))
    }

    fn visit_string<E: de::Error>(self, v: String) -> Result<Value, E> {
        Ok(Value::String(v))
    }

    fn visit_unit<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_none<E: de::Error>(self) -> Result<Value, E> {
        Ok(Value::Null)
    }

    fn visit_some<D: Deserializer<'de>>(self, deserializer: D) -> Result<Value, D::Error> {
        Deserialize::deserialize(deserializer)
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Value, A::Error> {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element()? {
            items.push(item);
        }
        Ok(Value::Array(items))
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Value, A::Error> {
        let mut doc = Document::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            doc.put(key, value);
        }
        Ok(Value::Document(doc))
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Value, D::Error> {
        deserializer.deserialize_any(ValueVisitor)
    }
}

// Lets a Value act as a serde data source, so records can be read back as
// typed structs without a JSON round trip.
impl<'de> Deserializer<'de> for Value {
    type Error = MiniDbError;

    fn deserialize_any<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Value::Null => visitor.visit_unit(),
            Value::Bool(b) => visitor.visit_bool(b),
            Value::I64(i) => visitor.visit_i64(i),
            Value::U64(u) => visitor.visit_u64(u),
            Value::F64(f) => visitor.visit_f64(f),
            Value::String(s) => visitor.visit_string(s),
            Value::Array(items) => {
                visitor.visit_seq(de::value::SeqDeserializer::new(items.into_iter()))
            }
            Value::Document(doc) => {
                visitor.visit_map(de::value::MapDeserializer::new(doc.into_iter()))
            }
        }
    }

    fn deserialize_option<V: Visitor<'de>>(self, visitor: V) -> Result<V::Value, Self::Error> {
        match self {
            Value::Null => visitor.visit_none(),
            other => visitor.visit_some(other),
        }
    }

    serde::forward_to_deserialize_any! {
        bool i8 i16 i32 i64 i128 u8 u16 u32 u64 u128 f32 f64 char str string
        bytes byte_buf unit unit_struct newtype_struct seq tuple
        tuple_struct map struct enum identifier ignored_any
    }
}

impl<'de> de::IntoDeserializer<'de, MiniDbError> for Value {
    type Deserializer = Value;

    fn into_deserializer(self) -> Self::Deserializer {
        self
    }
}

impl From<serde_json::Value> for Value {
    fn from(json: serde_json::Value) -> Self {
        match json {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => {
                if let Some(i) = n.as_i64() {
                    Value::I64(i)
                } else if let Some(u) = n.as_u64() {
                    Value::U64(u)
                } else {
                    Value::F64(n.as_f64().unwrap_or(f64::NAN))
                }
            }
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => {
                Value::Array(items.into_iter().map(Value::from).collect())
            }
            serde_json::Value::Object(map) => Value::Document(
                map.into_iter().map(|(k, v)| (k, Value::from(v))).collect(),
            ),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_signed {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    Value::I64(v as i64)
                }
            }
        )*
    };
}

impl_from_signed!(i8, i16, i32, i64);

macro_rules! impl_from_unsigned {
    ($($t:ty),*) => {
        $(
            impl From<$t> for Value {
                fn from(v: $t) -> Self {
                    let v = v as u64;
                    match i64::try_from(v) {
                        Ok(i) => Value::I64(i),
                        Err(_) => Value::U64(v),
                    }
                }
            }
        )*
    };
}

impl_from_unsigned!(u8, u16, u32, u64, usize);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::F64(v as f64)
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::F64(v)
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

impl From<Document> for Value {
    fn from(v: Document) -> Self {
        Value::Document(v)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(v) => v.into(),
            None => Value::Null,
        }
    }
}

/// Creates a [Value] from any expression convertible into one.
///
/// ```rust
/// use minidb::val;
/// use minidb::common::Value;
///
/// assert_eq!(val!("x"), Value::String("x".to_string()));
/// assert_eq!(val!(3), val!(3.0));
/// ```
#[macro_export]
macro_rules! val {
    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
