use crate::collection::WriteResult;
use crate::common::Value;
use crate::errors::MiniDbResult;
use crate::minidb::MiniDb;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// A handle to one named collection of a [MiniDb].
///
/// The handle does not hold any records itself; every call goes through the
/// database. A collection that does not exist yet behaves as empty, and it
/// springs into existence on the first insert.
///
/// # Examples
///
/// ```rust
/// use minidb::doc;
/// use minidb::minidb::MiniDb;
///
/// let db = MiniDb::builder().in_memory().open().unwrap();
/// let people = db.collection("people");
///
/// people.insert(doc! { name: "Jim", age: 27 }).unwrap();
/// people.insert(doc! { name: "Kim", age: 31 }).unwrap();
///
/// assert_eq!(people.count(Some("$.age > 30")).unwrap(), 1);
/// ```
#[derive(Clone)]
pub struct Collection {
    db: MiniDb,
    name: String,
}

impl Collection {
    pub(crate) fn new(db: MiniDb, name: &str) -> Self {
        Collection {
            db,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// See [MiniDb::insert].
    pub fn insert<V: Into<Value>>(&self, record: V) -> MiniDbResult<WriteResult<Value>> {
        self.db.insert(&self.name, record)
    }

    /// See [MiniDb::insert_many].
    pub fn insert_many<I, V>(&self, records: I) -> MiniDbResult<WriteResult<Vec<Value>>>
    where
        I: IntoIterator<Item = V>,
        V: Into<Value>,
    {
        self.db.insert_many(&self.name, records)
    }

    /// See [MiniDb::insert_serializable].
    pub fn insert_serializable<T: Serialize>(&self, record: &T) -> MiniDbResult<WriteResult<Value>> {
        self.db.insert_serializable(&self.name, record)
    }

    /// See [MiniDb::select].
    pub fn select(&self, filter: Option<&str>) -> MiniDbResult<Vec<Value>> {
        self.db.select(&self.name, filter)
    }

    /// See [MiniDb::select_as].
    pub fn select_as<T: DeserializeOwned>(&self, filter: Option<&str>) -> MiniDbResult<Vec<T>> {
        self.db.select_as(&self.name, filter)
    }

    /// See [MiniDb::update].
    pub fn update<V: Into<Value>>(
        &self,
        patch: V,
        filter: Option<&str>,
    ) -> MiniDbResult<WriteResult<Vec<Value>>> {
        self.db.update(&self.name, patch, filter)
    }

    /// See [MiniDb::remove].
    pub fn remove(&self, filter: Option<&str>) -> MiniDbResult<WriteResult<Vec<Value>>> {
        self.db.remove(&self.name, filter)
    }

    pub fn count(&self, filter: Option<&str>) -> MiniDbResult<usize> {
        self.db.count(&self.name, filter)
    }

    /// Returns `true` if the collection holds at least one record.
    pub fn exists(&self) -> MiniDbResult<bool> {
        self.db.contains_key(&self.name)
    }
}

#[cfg(test)]
mod tests {
    use crate::doc;
    use crate::minidb::MiniDb;

    #[test]
    fn handle_is_bound_to_its_key() {
        let db = MiniDb::builder().in_memory().open().unwrap();
        let people = db.collection("people");
        let pets = db.collection("pets");

        people.insert(doc! { name: "Jim" }).unwrap();
        pets.insert_many(vec![doc! { name: "Rex" }, doc! { name: "Tom" }]).unwrap();

        assert_eq!(people.name(), "people");
        assert_eq!(people.count(None).unwrap(), 1);
        assert_eq!(pets.count(None).unwrap(), 2);
        assert_eq!(db.select("pets", Some("$.name == 'Tom'")).unwrap().len(), 1);
    }

    #[test]
    fn handle_follows_collection_lifecycle() {
        let db = MiniDb::builder().in_memory().open().unwrap();
        let people = db.collection("people");
        assert!(!people.exists().unwrap());

        people.insert(doc! { name: "Jim" }).unwrap();
        assert!(people.exists().unwrap());

        people.update(doc! { age: 30 }, None).unwrap();
        assert_eq!(people.select(Some("$.age == 30")).unwrap().len(), 1);

        people.remove(None).unwrap();
        assert!(!people.exists().unwrap());
        assert!(!db.keys().unwrap().contains(&"people".to_string()));
    }
}
