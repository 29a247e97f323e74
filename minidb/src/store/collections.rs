use crate::common::Value;
use crate::errors::{ErrorKind, MiniDbError, MiniDbResult};
use indexmap::IndexMap;
use serde::ser::SerializeMap;
use serde::{Serialize, Serializer};

/// The persisted root of a database: named collections of records.
///
/// Keys keep their insertion order. A key is present only while its
/// collection holds at least one record; emptying a collection removes the
/// key.
#[derive(Clone, Default, PartialEq, Debug)]
pub struct Collections {
    data: IndexMap<String, Vec<Value>>,
}

impl Collections {
    pub fn new() -> Self {
        Collections {
            data: IndexMap::new(),
        }
    }

    /// Builds collections from a parsed root value.
    ///
    /// The root must be a document whose fields are all arrays. Fields holding
    /// an empty array are dropped.
    pub fn from_value(root: Value) -> MiniDbResult<Self> {
        let document = match root {
            Value::Document(document) => document,
            other => {
                log::error!("Database root must be an object, found {}", other.type_name());
                return Err(MiniDbError::new(
                    &format!("Database root must be an object, found {}", other.type_name()),
                    ErrorKind::FileCorrupted,
                ));
            }
        };

        let mut data = IndexMap::with_capacity(document.size());
        for (key, value) in document {
            match value {
                Value::Array(records) if records.is_empty() => {
                    log::debug!("Dropping empty collection '{}' on load", key);
                }
                Value::Array(records) => {
                    data.insert(key, records);
                }
                other => {
                    log::error!(
                        "Collection '{}' must be an array, found {}",
                        key,
                        other.type_name()
                    );
                    return Err(MiniDbError::new(
                        &format!(
                            "Collection '{}' must be an array, found {}",
                            key,
                            other.type_name()
                        ),
                        ErrorKind::FileCorrupted,
                    ));
                }
            }
        }
        Ok(Collections { data })
    }

    /// Parses the JSON text of a database file. Blank text is an empty
    /// database.
    pub fn from_json(text: &str) -> MiniDbResult<Self> {
        if text.trim().is_empty() {
            return Ok(Collections::new());
        }

        let root: Value = serde_json::from_str(text).map_err(|err| {
            log::error!("Database content is not valid JSON: {}", err);
            MiniDbError::from(err)
        })?;
        Collections::from_value(root)
    }

    /// Serializes to JSON. `indent` of `None` produces compact output,
    /// otherwise the text is pretty printed with that many spaces per level.
    pub fn to_json(&self, indent: Option<usize>) -> MiniDbResult<String> {
        let bytes = match indent {
            None => serde_json::to_vec(self)?,
            Some(width) => {
                let indent = vec![b' '; width];
                let formatter = serde_json::ser::PrettyFormatter::with_indent(&indent);
                let mut bytes = Vec::new();
                let mut serializer = serde_json::Serializer::with_formatter(&mut bytes, formatter);
                self.serialize(&mut serializer)?;
                bytes
            }
        };
        Ok(String::from_utf8(bytes)?)
    }

    pub fn get(&self, key: &str) -> Option<&Vec<Value>> {
        self.data.get(key)
    }

    pub(crate) fn get_mut(&mut self, key: &str) -> Option<&mut Vec<Value>> {
        self.data.get_mut(key)
    }

    /// Returns the records of `key`, creating the collection if needed.
    ///
    /// The caller must append at least one record before releasing the
    /// borrow, or call [Collections::prune] afterwards.
    pub(crate) fn get_or_create(&mut self, key: &str) -> &mut Vec<Value> {
        self.data.entry(key.to_string()).or_default()
    }

    /// Removes `key` if its collection is empty. Returns `true` when removed.
    pub(crate) fn prune(&mut self, key: &str) -> bool {
        if self.data.get(key).is_some_and(Vec::is_empty) {
            self.data.shift_remove(key);
            log::debug!("Removed empty collection '{}'", key);
            true
        } else {
            false
        }
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.data.contains_key(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.data.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&String, &Vec<Value>)> {
        self.data.iter()
    }

    /// Number of collections.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Number of records across all collections.
    pub fn record_count(&self) -> usize {
        self.data.values().map(Vec::len).sum()
    }
}

impl Serialize for Collections {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.data.len()))?;
        for (key, records) in self.data.iter() {
            map.serialize_entry(key, records)?;
        }
        map.end()
    }
}
