use crate::errors::MiniDbResult;
use crate::store::WriteTicket;

/// Outcome of a mutation.
///
/// Holds the records the mutation affected, available immediately, and the
/// [WriteTicket] of the persistence write it queued.
///
/// # Examples
///
/// ```rust
/// use minidb::doc;
/// use minidb::minidb::MiniDb;
///
/// let db = MiniDb::builder().in_memory().open().unwrap();
/// let result = db.insert("people", doc! { name: "Jim" }).unwrap();
///
/// assert_eq!(result.affected().get("name").and_then(|v| v.as_str()), Some("Jim"));
/// result.ticket().wait().unwrap();
/// ```
#[derive(Debug)]
pub struct WriteResult<T> {
    affected: T,
    ticket: WriteTicket,
}

impl<T> WriteResult<T> {
    pub fn new(affected: T, ticket: WriteTicket) -> Self {
        WriteResult { affected, ticket }
    }

    /// The records affected by the mutation, as they are after it.
    pub fn affected(&self) -> &T {
        &self.affected
    }

    pub fn into_affected(self) -> T {
        self.affected
    }

    pub fn ticket(&self) -> &WriteTicket {
        &self.ticket
    }

    /// Waits for the mutation to be persisted, then returns the affected
    /// records.
    pub fn persisted(self) -> MiniDbResult<T> {
        self.ticket.wait()?;
        Ok(self.affected)
    }
}

impl<V> WriteResult<Vec<V>> {
    pub fn len(&self) -> usize {
        self.affected.len()
    }

    pub fn is_empty(&self) -> bool {
        self.affected.is_empty()
    }
}

impl<V> IntoIterator for WriteResult<Vec<V>> {
    type Item = V;
    type IntoIter = std::vec::IntoIter<V>;

    fn into_iter(self) -> Self::IntoIter {
        self.affected.into_iter()
    }
}
