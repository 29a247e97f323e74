//! Record operations over [Collections].
//!
//! These functions hold the collection semantics and nothing else: callers
//! are responsible for locking, filter compilation and persistence.

use crate::common::Value;
use crate::errors::MiniDbResult;
use crate::filter::Filter;
use crate::store::Collections;

/// Appends `records` to `key`, creating the collection if needed.
///
/// Every record is validated before any is appended, so a rejected batch
/// leaves the collection untouched. Returns the appended records.
pub(crate) fn insert(
    collections: &mut Collections,
    key: &str,
    records: Vec<Value>,
) -> MiniDbResult<Vec<Value>> {
    records.iter().try_for_each(Value::validate)?;
    if records.is_empty() {
        return Ok(records);
    }

    collections
        .get_or_create(key)
        .extend(records.iter().cloned());
    log::debug!("Inserted {} records into '{}'", records.len(), key);
    Ok(records)
}

/// Copies of the records of `key` matching `filter`, in collection order.
pub(crate) fn select(collections: &Collections, key: &str, filter: &Filter) -> Vec<Value> {
    match collections.get(key) {
        Some(records) => records
            .iter()
            .enumerate()
            .filter(|(index, record)| filter.matches(record, *index))
            .map(|(_, record)| record.clone())
            .collect(),
        None => Vec::new(),
    }
}

pub(crate) fn count(collections: &Collections, key: &str, filter: &Filter) -> usize {
    match collections.get(key) {
        Some(records) if filter.is_match_all() => records.len(),
        Some(records) => records
            .iter()
            .enumerate()
            .filter(|(index, record)| filter.matches(record, *index))
            .count(),
        None => 0,
    }
}

/// Merges `patch` into every record of `key` matching `filter`.
///
/// Returns the matched records after the merge.
pub(crate) fn update(
    collections: &mut Collections,
    key: &str,
    patch: &Value,
    filter: &Filter,
) -> MiniDbResult<Vec<Value>> {
    patch.validate()?;

    let records = match collections.get_mut(key) {
        Some(records) => records,
        None => return Ok(Vec::new()),
    };

    let mut updated = Vec::new();
    for (index, record) in records.iter_mut().enumerate() {
        if filter.matches(record, index) {
            record.merge(patch);
            updated.push(record.clone());
        }
    }

    log::debug!("Updated {} records in '{}'", updated.len(), key);
    Ok(updated)
}

/// Removes the records of `key` matching `filter`.
///
/// Every record is tested against its position before anything is removed,
/// so `#` always refers to the original positions. A collection left empty
/// is deleted. Returns the removed records in their original order.
pub(crate) fn remove(collections: &mut Collections, key: &str, filter: &Filter) -> Vec<Value> {
    let records = match collections.get_mut(key) {
        Some(records) => records,
        None => return Vec::new(),
    };

    let marked: Vec<bool> = records
        .iter()
        .enumerate()
        .map(|(index, record)| filter.matches(record, index))
        .collect();

    let mut removed = Vec::new();
    let mut kept = Vec::with_capacity(records.len());
    for (record, remove) in records.drain(..).zip(marked) {
        if remove {
            removed.push(record);
        } else {
            kept.push(record);
        }
    }
    *records = kept;

    collections.prune(key);
    log::debug!("Removed {} records from '{}'", removed.len(), key);
    removed
}
