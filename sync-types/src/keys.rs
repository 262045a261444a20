//! Primary-key configuration and concrete record keys.
//!
//! A [`PrimaryKey`] names the field (or ordered fields) that identify a
//! record. A [`RecordKey`] is one concrete key value. Both scalar and
//! compound keys collapse into a single string *token* for storage; compound
//! tokens join their parts with [`COMPOUND_SEPARATOR`] in declared field
//! order, so the same ordered values always produce the same token.

use crate::error::SyncError;
use crate::Record;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;

/// Separator between the parts of a compound key token.
pub const COMPOUND_SEPARATOR: char = ',';

/// The field (or fields) that identify a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PrimaryKey {
    /// A single field holds the key.
    Field(String),
    /// Several fields, in declared order, form the key.
    Compound(Vec<String>),
}

impl PrimaryKey {
    /// A scalar primary key on `name`.
    pub fn field(name: impl Into<String>) -> Self {
        Self::Field(name.into())
    }

    /// A compound primary key over `fields`, in the given order.
    pub fn compound<I, S>(fields: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Compound(fields.into_iter().map(Into::into).collect())
    }

    /// Whether this key spans several fields.
    pub fn is_compound(&self) -> bool {
        matches!(self, Self::Compound(_))
    }

    /// Field names in declared order.
    pub fn fields(&self) -> Vec<&str> {
        match self {
            Self::Field(name) => vec![name.as_str()],
            Self::Compound(fields) => fields.iter().map(String::as_str).collect(),
        }
    }

    /// Reject key definitions that cannot identify anything.
    pub fn validate(&self) -> Result<(), SyncError> {
        match self {
            Self::Field(name) if name.trim().is_empty() => Err(SyncError::InvalidKey(
                "primary key field name is empty".into(),
            )),
            Self::Compound(fields) if fields.is_empty() => Err(SyncError::InvalidKey(
                "compound primary key has no fields".into(),
            )),
            Self::Compound(fields) if fields.iter().any(|f| f.trim().is_empty()) => Err(
                SyncError::InvalidKey("compound primary key has an empty field name".into()),
            ),
            _ => Ok(()),
        }
    }

    /// Derive the key of `record` from its key fields.
    ///
    /// Returns `None` when any key field is missing or `null`.
    pub fn key_of(&self, record: &Record) -> Option<RecordKey> {
        let mut parts = self
            .fields()
            .into_iter()
            .map(|field| match record.get(field) {
                None | Some(Value::Null) => None,
                Some(value) => Some(render_key_value(value)),
            })
            .collect::<Option<Vec<_>>>()?;
        if self.is_compound() {
            Some(RecordKey::Compound(parts))
        } else {
            parts.pop().map(RecordKey::Single)
        }
    }

    /// Rebuild a key from its storage token.
    ///
    /// Compound tokens are split on [`COMPOUND_SEPARATOR`]; parts that
    /// themselves contained the separator cannot be recovered.
    pub fn key_from_token(&self, token: &str) -> RecordKey {
        match self {
            Self::Field(_) => RecordKey::Single(token.to_string()),
            Self::Compound(_) => RecordKey::Compound(
                token
                    .split(COMPOUND_SEPARATOR)
                    .map(str::to_string)
                    .collect(),
            ),
        }
    }
}

impl fmt::Display for PrimaryKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Field(name) => write!(f, "{}", name),
            Self::Compound(fields) => write!(f, "[{}]", fields.join(", ")),
        }
    }
}

/// A concrete key value, scalar or compound.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum RecordKey {
    /// A scalar key.
    Single(String),
    /// The ordered parts of a compound key.
    Compound(Vec<String>),
}

impl RecordKey {
    /// A scalar key.
    pub fn single(value: impl Into<String>) -> Self {
        Self::Single(value.into())
    }

    /// A compound key from ordered parts.
    pub fn compound<I, S>(parts: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self::Compound(parts.into_iter().map(Into::into).collect())
    }

    /// The single storage token for this key.
    pub fn token(&self) -> String {
        match self {
            Self::Single(value) => value.clone(),
            Self::Compound(parts) => parts.join(&COMPOUND_SEPARATOR.to_string()),
        }
    }

    /// True when there is nothing to look up by.
    pub fn is_empty(&self) -> bool {
        match self {
            Self::Single(value) => value.is_empty(),
            Self::Compound(parts) => parts.is_empty(),
        }
    }

    /// Key parts in order (a scalar key has exactly one).
    pub fn parts(&self) -> Vec<&str> {
        match self {
            Self::Single(value) => vec![value.as_str()],
            Self::Compound(parts) => parts.iter().map(String::as_str).collect(),
        }
    }
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

impl From<&str> for RecordKey {
    fn from(value: &str) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<String> for RecordKey {
    fn from(value: String) -> Self {
        Self::Single(value)
    }
}

impl From<i64> for RecordKey {
    fn from(value: i64) -> Self {
        Self::Single(value.to_string())
    }
}

impl From<u64> for RecordKey {
    fn from(value: u64) -> Self {
        Self::Single(value.to_string())
    }
}

/// Render one key field value as token text.
///
/// Strings are used verbatim, `null` renders empty, everything else uses
/// its JSON text (`1`, `true`, ...).
pub fn render_key_value(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        other => other.to_string(),
    }
}
