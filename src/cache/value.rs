//! Value Module
//!
//! The typed payload stored under a key. Each key holds exactly one kind of
//! value; typed accessors fail closed with `TypeMismatch` instead of coercing.

use std::collections::{BTreeMap, BTreeSet, HashMap, HashSet, VecDeque};
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::{CacheError, Result};

// == Kind ==
/// The kind of value held by a key, fixed at creation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    Scalar,
    Hash,
    List,
    Set,
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Kind::Scalar => "scalar",
            Kind::Hash => "hash",
            Kind::List => "list",
            Kind::Set => "set",
        };
        f.write_str(name)
    }
}

// == Value ==
/// A stored payload.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "payload", rename_all = "lowercase")]
pub enum Value {
    /// A plain string value
    Scalar(String),
    /// Field to value mapping
    Hash(BTreeMap<String, String>),
    /// Ordered sequence
    List(VecDeque<String>),
    /// De-duplicated collection
    Set(BTreeSet<String>),
}

impl Value {
    /// Returns the kind of this value.
    pub fn kind(&self) -> Kind {
        match self {
            Value::Scalar(_) => Kind::Scalar,
            Value::Hash(_) => Kind::Hash,
            Value::List(_) => Kind::List,
            Value::Set(_) => Kind::Set,
        }
    }

    /// Returns an empty value of the given kind.
    pub fn empty(kind: Kind) -> Self {
        match kind {
            Kind::Scalar => Value::Scalar(String::new()),
            Kind::Hash => Value::Hash(BTreeMap::new()),
            Kind::List => Value::List(VecDeque::new()),
            Kind::Set => Value::Set(BTreeSet::new()),
        }
    }

    /// Approximate payload size in bytes.
    pub fn approximate_size(&self) -> usize {
        match self {
            Value::Scalar(s) => s.len(),
            Value::Hash(map) => map.iter().map(|(f, v)| f.len() + v.len()).sum(),
            Value::List(items) => items.iter().map(String::len).sum(),
            Value::Set(members) => members.iter().map(String::len).sum(),
        }
    }

    /// Returns the scalar string if this is a scalar.
    pub fn as_scalar(&self) -> Option<&str> {
        match self {
            Value::Scalar(s) => Some(s),
            _ => None,
        }
    }

    // == Typed Accessors ==
    // Each returns TypeMismatch for `key` when the kind differs.

    pub(crate) fn hash_mut(&mut self, key: &str) -> Result<&mut BTreeMap<String, String>> {
        match self {
            Value::Hash(map) => Ok(map),
            other => Err(CacheError::type_mismatch(key, Kind::Hash, other.kind())),
        }
    }

    pub(crate) fn list_mut(&mut self, key: &str) -> Result<&mut VecDeque<String>> {
        match self {
            Value::List(items) => Ok(items),
            other => Err(CacheError::type_mismatch(key, Kind::List, other.kind())),
        }
    }

    pub(crate) fn set_mut(&mut self, key: &str) -> Result<&mut BTreeSet<String>> {
        match self {
            Value::Set(members) => Ok(members),
            other => Err(CacheError::type_mismatch(key, Kind::Set, other.kind())),
        }
    }
}

// == Conversions ==
// The kind written by `set` is inferred from the shape of the argument.

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Scalar(s)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Scalar(s.to_string())
    }
}

impl From<BTreeMap<String, String>> for Value {
    fn from(map: BTreeMap<String, String>) -> Self {
        Value::Hash(map)
    }
}

impl From<HashMap<String, String>> for Value {
    fn from(map: HashMap<String, String>) -> Self {
        Value::Hash(map.into_iter().collect())
    }
}

impl From<Vec<String>> for Value {
    fn from(items: Vec<String>) -> Self {
        Value::List(items.into())
    }
}

impl From<VecDeque<String>> for Value {
    fn from(items: VecDeque<String>) -> Self {
        Value::List(items)
    }
}

impl From<BTreeSet<String>> for Value {
    fn from(members: BTreeSet<String>) -> Self {
        Value::Set(members)
    }
}

impl From<HashSet<String>> for Value {
    fn from(members: HashSet<String>) -> Self {
        Value::Set(members.into_iter().collect())
    }
}
