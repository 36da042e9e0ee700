//! List Commands
//!
//! Ordered sequences with push/pop at both ends and inclusive range reads.

use crate::cache::store::validate_element;
use crate::cache::{Cache, Kind};
use crate::error::{CacheError, Result};

impl Cache {
    // == LPUSH ==
    /// Prepends values one at a time, so `lpush(k, ["a", "b"])` leaves `b` first.
    ///
    /// Creates the list if needed and returns its new length.
    pub fn lpush<I, S>(&mut self, key: &str, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(key, values, End::Front)
    }

    // == RPUSH ==
    /// Appends values in order. Creates the list if needed and returns its
    /// new length.
    pub fn rpush<I, S>(&mut self, key: &str, values: I) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.push(key, values, End::Back)
    }

    // == LPOP ==
    /// Removes and returns the first element, or None if the list is empty or absent.
    pub fn lpop(&mut self, key: &str) -> Result<Option<String>> {
        self.pop(key, End::Front)
    }

    // == RPOP ==
    /// Removes and returns the last element, or None if the list is empty or absent.
    pub fn rpop(&mut self, key: &str) -> Result<Option<String>> {
        self.pop(key, End::Back)
    }

    // == LRANGE ==
    /// Returns elements `start..=stop`.
    ///
    /// Negative indices count from the end (`-1` is the last element).
    /// Out-of-range indices are clamped, and an empty vec is returned when
    /// the range selects nothing.
    pub fn lrange(&mut self, key: &str, start: i64, stop: i64) -> Result<Vec<String>> {
        let Some(entry) = self.lookup(key, Some(Kind::List))? else {
            return Ok(Vec::new());
        };
        let items = entry.value.list_mut(key)?;

        Ok(match resolve_range(items.len(), start, stop) {
            Some((from, to)) => items.range(from..=to).cloned().collect(),
            None => Vec::new(),
        })
    }

    // == LLEN ==
    pub fn llen(&mut self, key: &str) -> Result<usize> {
        let Some(entry) = self.lookup(key, Some(Kind::List))? else {
            return Ok(0);
        };
        Ok(entry.value.list_mut(key)?.len())
    }

    fn push<I, S>(&mut self, key: &str, values: I, end: End) -> Result<usize>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let values: Vec<String> = values.into_iter().map(Into::into).collect();
        if values.is_empty() {
            return Err(CacheError::InvalidArgument(
                "push requires at least one value".to_string(),
            ));
        }
        values.iter().try_for_each(|v| validate_element(v))?;

        let entry = self.entry_for_write(key, Kind::List)?;
        let items = entry.value.list_mut(key)?;
        for value in values {
            match end {
                End::Front => items.push_front(value),
                End::Back => items.push_back(value),
            }
        }
        let len = items.len();

        self.commit_write(key);
        Ok(len)
    }

    fn pop(&mut self, key: &str, end: End) -> Result<Option<String>> {
        let Some(entry) = self.existing_for_write(key, Kind::List)? else {
            return Ok(None);
        };
        let items = entry.value.list_mut(key)?;
        let popped = match end {
            End::Front => items.pop_front(),
            End::Back => items.pop_back(),
        };

        if popped.is_some() {
            self.commit_write(key);
        }
        Ok(popped)
    }
}

#[derive(Debug, Clone, Copy)]
enum End {
    Front,
    Back,
}

/// Maps `start`/`stop` onto inclusive in-bounds indices for a list of `len`.
fn resolve_range(len: usize, start: i64, stop: i64) -> Option<(usize, usize)> {
    let len = len as i64;
    let start = if start < 0 { len + start } else { start }.max(0);
    let stop = if stop < 0 { len + stop } else { stop }.min(len - 1);

    (start <= stop && start < len).then_some((start as usize, stop as usize))
}
