use crate::common::Value;
use indexmap::IndexMap;
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt::{Debug, Display, Formatter};

/// Represents a JSON object record.
///
/// A document is composed of key-value pairs. The key is always a [String]
/// and the value is a [Value]. Fields keep their insertion order, which is the
/// order they are written back to the file in.
///
/// Two documents are equal when they hold the same fields with equal values,
/// regardless of field order.
///
/// # Examples
///
/// ```rust
/// use minidb::doc;
/// use minidb::collection::Document;
///
/// let mut doc = Document::new();
/// doc.put("name", "Jim");
/// doc.put("age", 27);
///
/// assert_eq!(doc, doc! { age: 27, name: "Jim" });
/// assert_eq!(doc.keys().collect::<Vec<_>>(), vec!["name", "age"]);
/// ```
#[derive(Clone, Default, PartialEq)]
pub struct Document {
    data: IndexMap<String, Value>,
}

impl Document {
    /// Creates a new empty document.
    pub fn new() -> Self {
        Document {
            data: IndexMap::new(),
        }
    }

    /// Checks if the document is empty.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Returns the number of fields in the document.
    pub fn size(&self) -> usize {
        self.data.len()
    }

    /// Associates the specified value with the specified key in this document.
    ///
    /// If the key already exists its value is replaced in place, keeping the
    /// field's position. Otherwise the field is appended.
    ///
    /// # Arguments
    ///
    /// * `key` - The field name. Field names are taken literally; a `.` in the
    ///   name does not create a nested document.
    /// * `value` - Anything convertible into a [Value].
    ///
    /// # Returns
    ///
    /// The previous value of the field, if there was one.
    pub fn put<K: Into<String>, V: Into<Value>>(&mut self, key: K, value: V) -> Option<Value> {
        self.data.insert(key.into(), value.into())
    }

    /// Returns the value of a top level field.
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.data.get(key)
    }

    /// Returns a mutable reference to the value of a top level field.
    pub fn get_mut(&mut self, key: &str) -> Option<&mut Value> {
        self.data.get_mut(key)
    }

    /// Removes a field, preserving the order of the remaining fields.
    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.data.shift_remove(key)
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    /// Iterates over field names in order.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    /// Iterates over fields in order.
    pub fn iter(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.data.iter()
    }

    /// Shallow merge: every field of `other` overwrites or extends this
    /// document. Nested documents are replaced as a whole, not merged.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use minidb::doc;
    ///
    /// let mut record = doc! { name: "Jim", address: { city: "Oslo", zip: "0150" } };
    /// record.merge(&doc! { address: { city: "Bergen" }, age: 28 });
    ///
    /// assert_eq!(record, doc! { name: "Jim", address: { city: "Bergen" }, age: 28 });
    /// ```
    pub fn merge(&mut self, other: &Document) {
        for (key, value) in other.data.iter() {
            self.data.insert(key.clone(), value.clone());
        }
    }
}

impl IntoIterator for Document {
    type Item = (String, Value);
    type IntoIter = indexmap::map::IntoIter<String, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.data.into_iter()
    }
}

impl<K: Into<String>> FromIterator<(K, Value)> for Document {
    fn from_iter<T: IntoIterator<Item = (K, Value)>>(iter: T) -> Self {
        Document {
            data: iter.into_iter().map(|(k, v)| (k.into(), v)).collect(),
        }
    }
}

impl Display for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match serde_json::to_string(self) {
            Ok(json) => write!(f, "{}", json),
            Err(_) => Err(std::fmt::Error),
        }
    }
}

impl Debug for Document {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_map().entries(self.data.iter()).finish()
    }
}

impl Serialize for Document {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (key, value) in self.data.iter() {
            map.serialize_entry(key, value)?;
        }
        map.end()
    }
}

struct DocumentVisitor;

impl<'de> Visitor<'de> for DocumentVisitor {
    type Value = Document;

    fn expecting(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "a JSON object")
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Document, A::Error> {
        let mut doc = Document::new();
        while let Some((key, value)) = map.next_entry::<String, Value>()? {
            doc.put(key, value);
        }
        Ok(doc)
    }
}

impl<'de> Deserialize<'de> for Document {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Document, D::Error> {
        deserializer.deserialize_map(DocumentVisitor)
    }
}

/// Strips the quotes `stringify!` leaves around string literal keys.
#[doc(hidden)]
pub fn normalize(key: &str) -> String {
    key.trim_matches('"').to_string()
}

/// Creates a [Document] with JSON-like syntax.
///
/// Keys may be bare identifiers or string literals. Values may be literals,
/// nested `{ ... }` documents, `[ ... ]` arrays, `null`, or any expression in
/// parentheses.
///
/// # Examples
///
/// ```rust
/// use minidb::doc;
///
/// let limit = 10;
/// let doc = doc! {
///     name: "Jim",
///     "first name": "Jim",
///     age: (limit * 2 + 7),
///     balance: (-12.5),
///     tags: ["a", "b"],
///     address: { city: "Oslo" },
///     manager: null,
/// };
///
/// assert_eq!(doc.size(), 7);
/// ```
#[macro_export]
macro_rules! doc {
    () => {
        $crate::collection::Document::new()
    };

    ($($key:tt : $value:tt),* $(,)?) => {
        {
            let mut doc = $crate::collection::Document::new();
            $(
                doc.put($crate::collection::normalize(stringify!($key)), $crate::doc_value!($value));
            )*
            doc
        }
    };
}

/// Helper for [doc!]; converts one value token tree.
#[doc(hidden)]
#[macro_export]
macro_rules! doc_value {
    (null) => {
        $crate::common::Value::Null
    };

    ({ $($key:tt : $value:tt),* $(,)? }) => {
        $crate::common::Value::Document($crate::doc! { $($key : $value),* })
    };

    ([ $($value:tt),* $(,)? ]) => {
        $crate::common::Value::Array(vec![$($crate::doc_value!($value)),*])
    };

    ($value:expr) => {
        $crate::common::Value::from($value)
    };
}
