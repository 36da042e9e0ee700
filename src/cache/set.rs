//! Set Commands
//!
//! Unordered collections of distinct members.

use crate::cache::store::validate_element;
use crate::cache::{Cache, Kind};
use crate::error::{CacheError, Result};

impl Cache {
    // == SADD ==
    /// Adds members, creating the set if needed.
    ///
    /// Returns how many members were not already present.
    pub fn sadd<I, S>(&mut self, key: &str, members: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let members: Vec<String> = members.into_iter().map(Into::into).collect();
        if members.is_empty() {
            return Err(CacheError::InvalidArgument(
                "sadd requires at least one member".to_string(),
            ));
        }
        members.iter().try_for_each(|m| validate_element(m))?;

        let entry = self.entry_for_write(key, Kind::Set)?;
        let set = entry.value.set_mut(key)?;
        let added = members
            .into_iter()
            .map(|member| set.insert(member))
            .filter(|&inserted| inserted)
            .count();

        self.commit_write(key);
        Ok(added)
    }

    // == SREM ==
    /// Removes members. Returns how many were actually present.
    pub fn srem<I, S>(&mut self, key: &str, members: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let Some(entry) = self.existing_for_write(key, Kind::Set)? else {
            return Ok(0);
        };
        let set = entry.value.set_mut(key)?;
        let removed = members
            .into_iter()
            .map(Into::<String>::into)
            .filter(|member| set.remove(member))
            .count();

        if removed > 0 {
            self.commit_write(key);
        }
        Ok(removed)
    }

    // == SMEMBERS ==
    pub fn smembers(&mut self, key: &str) -> Result<Vec<String>> {
        let Some(entry) = self.lookup(key, Some(Kind::Set))? else {
            return Ok(Vec::new());
        };
        Ok(entry.value.set_mut(key)?.iter().cloned().collect())
    }

    // == SISMEMBER ==
    pub fn sismember(&mut self, key: &str, member: &str) -> Result<bool> {
        let Some(entry) = self.lookup(key, Some(Kind::Set))? else {
            return Ok(false);
        };
        Ok(entry.value.set_mut(key)?.contains(member))
    }

    // == SCARD ==
    pub fn scard(&mut self, key: &str) -> Result<usize> {
        let Some(entry) = self.lookup(key, Some(Kind::Set))? else {
            return Ok(0);
        };
        Ok(entry.value.set_mut(key)?.len())
    }
}
