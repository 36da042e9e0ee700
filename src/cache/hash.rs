//! Hash Commands
//!
//! Field/value maps stored under a single key.

use std::collections::BTreeMap;

use crate::cache::store::validate_element;
use crate::cache::{Cache, Kind};
use crate::error::Result;

impl Cache {
    // == HSET ==
    /// Sets `field` in the hash at `key`, creating the hash if needed.
    ///
    /// Returns true if the field is new.
    ///
    /// # Errors
    /// `TypeMismatch` if `key` holds another kind.
    pub fn hset(&mut self, key: &str, field: &str, value: impl Into<String>) -> Result<bool> {
        let value = value.into();
        validate_element(field)?;
        validate_element(&value)?;

        let entry = self.entry_for_write(key, Kind::Hash)?;
        let is_new = entry
            .value
            .hash_mut(key)?
            .insert(field.to_string(), value)
            .is_none();

        self.commit_write(key);
        Ok(is_new)
    }

    // == HGET ==
    pub fn hget(&mut self, key: &str, field: &str) -> Result<Option<String>> {
        let Some(entry) = self.lookup(key, Some(Kind::Hash))? else {
            return Ok(None);
        };
        Ok(entry.value.hash_mut(key)?.get(field).cloned())
    }

    // == HGETALL ==
    /// Returns every field and value, or an empty map if the key is absent.
    pub fn hgetall(&mut self, key: &str) -> Result<BTreeMap<String, String>> {
        let Some(entry) = self.lookup(key, Some(Kind::Hash))? else {
            return Ok(BTreeMap::new());
        };
        Ok(entry.value.hash_mut(key)?.clone())
    }

    // == HDEL ==
    /// Removes `field`. Returns the number of fields removed (0 or 1).
    pub fn hdel(&mut self, key: &str, field: &str) -> Result<usize> {
        let Some(entry) = self.existing_for_write(key, Kind::Hash)? else {
            return Ok(0);
        };
        let removed = entry.value.hash_mut(key)?.remove(field).is_some();

        if removed {
            self.commit_write(key);
        }
        Ok(usize::from(removed))
    }

    // == HKEYS ==
    pub fn hkeys(&mut self, key: &str) -> Result<Vec<String>> {
        Ok(self.hgetall(key)?.into_keys().collect())
    }

    // == HVALS ==
    pub fn hvals(&mut self, key: &str) -> Result<Vec<String>> {
        Ok(self.hgetall(key)?.into_values().collect())
    }
}
