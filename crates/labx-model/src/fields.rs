//! Named-field access over lab records.
//!
//! Field maps address record fields by name. Every record exposes its typed
//! attributes under fixed upper-case names and keeps any other value in a
//! [`FieldSet`]. Reads and writes go through [`FieldAccess`] so a failure on
//! one field can be reported without touching the rest of the record.

use std::fmt;
use std::str::FromStr;

use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::{FieldError, ModelError};

/// Customer identity field. Always driven from the job's customer, never from a field map.
pub const CUSTOMER_ID_FIELD: &str = "CUSTOMER_ID";

/// Result text field. Exported through the value-map translation, never raw.
pub const TEXT_FIELD: &str = "TEXT";

/// Normalize a field id for lookup.
pub fn normalize_field_name(raw: &str) -> String {
    raw.trim().to_uppercase()
}

/// Ordered field set where the first value written for an id wins on insert.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldSet {
    entries: Vec<(String, String)>,
}

impl FieldSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a value unless the id is already present. Returns true if inserted.
    pub fn insert_if_absent(&mut self, id: &str, value: impl Into<String>) -> bool {
        let id = normalize_field_name(id);
        if self.position(&id).is_some() {
            return false;
        }
        self.entries.push((id, value.into()));
        true
    }

    /// Insert or overwrite a value, keeping the original position.
    pub fn set(&mut self, id: &str, value: impl Into<String>) {
        let id = normalize_field_name(id);
        match self.position(&id) {
            Some(idx) => self.entries[idx].1 = value.into(),
            None => self.entries.push((id, value.into())),
        }
    }

    pub fn get(&self, id: &str) -> Option<&str> {
        let id = normalize_field_name(id);
        self.position(&id).map(|idx| self.entries[idx].1.as_str())
    }

    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.entries
            .iter()
            .map(|(id, value)| (id.as_str(), value.as_str()))
    }

    fn position(&self, normalized: &str) -> Option<usize> {
        self.entries.iter().position(|(id, _)| id == normalized)
    }
}

impl<K: AsRef<str>, V: Into<String>> FromIterator<(K, V)> for FieldSet {
    fn from_iter<T: IntoIterator<Item = (K, V)>>(iter: T) -> Self {
        let mut set = FieldSet::new();
        for (id, value) in iter {
            set.insert_if_absent(id.as_ref(), value);
        }
        set
    }
}

impl Serialize for FieldSet {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.entries.len()))?;
        for (id, value) in &self.entries {
            map.serialize_entry(id, value)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for FieldSet {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct FieldSetVisitor;

        impl<'de> Visitor<'de> for FieldSetVisitor {
            type Value = FieldSet;

            fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str("a map of field ids to string values")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<FieldSet, A::Error> {
                let mut set = FieldSet::new();
                while let Some((id, value)) = access.next_entry::<String, String>()? {
                    set.insert_if_absent(&id, value);
                }
                Ok(set)
            }
        }

        deserializer.deserialize_map(FieldSetVisitor)
    }
}

/// Record level a field map entry targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RecordKind {
    Job,
    Sample,
    Test,
    Result,
}

impl RecordKind {
    pub const ALL: [RecordKind; 4] = [
        RecordKind::Job,
        RecordKind::Sample,
        RecordKind::Test,
        RecordKind::Result,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            RecordKind::Job => "JOB",
            RecordKind::Sample => "SAMPLE",
            RecordKind::Test => "TEST",
            RecordKind::Result => "RESULT",
        }
    }

    /// Record a field of this kind is read from when it carries no prefix.
    pub fn own_source(self) -> SourceRecord {
        match self {
            RecordKind::Job => SourceRecord::Job,
            RecordKind::Sample => SourceRecord::Sample,
            RecordKind::Test => SourceRecord::Test,
            RecordKind::Result => SourceRecord::Result,
        }
    }
}

impl fmt::Display for RecordKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for RecordKind {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "JOB" => Ok(RecordKind::Job),
            "SAMPLE" => Ok(RecordKind::Sample),
            "TEST" => Ok(RecordKind::Test),
            "RESULT" => Ok(RecordKind::Result),
            _ => Err(ModelError::UnknownRecordKind(s.to_string())),
        }
    }
}

/// Record a qualified field name is read from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SourceRecord {
    Job,
    Sample,
    Test,
    Result,
    Request,
    Item,
}

impl SourceRecord {
    fn from_prefix(prefix: &str) -> Option<Self> {
        match prefix {
            "JOB" => Some(SourceRecord::Job),
            "SAMPLE" => Some(SourceRecord::Sample),
            "TEST" => Some(SourceRecord::Test),
            "RESULT" => Some(SourceRecord::Result),
            "REQUEST" => Some(SourceRecord::Request),
            "ITEM" => Some(SourceRecord::Item),
            _ => None,
        }
    }
}

/// Internal field name with an optional source record prefix (`SAMPLE.ID_NUMERIC`).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldRef {
    pub source: Option<SourceRecord>,
    pub name: String,
}

impl FieldRef {
    pub fn parse(raw: &str) -> Self {
        let normalized = normalize_field_name(raw);
        if let Some((prefix, rest)) = normalized.split_once('.')
            && let Some(source) = SourceRecord::from_prefix(prefix)
            && !rest.is_empty()
        {
            return Self {
                source: Some(source),
                name: rest.to_string(),
            };
        }
        Self {
            source: None,
            name: normalized,
        }
    }

    /// Source record, falling back to the record of the given kind.
    pub fn source_for(&self, kind: RecordKind) -> SourceRecord {
        self.source.unwrap_or_else(|| kind.own_source())
    }

    pub fn is(&self, name: &str) -> bool {
        self.name == name
    }
}

/// Read and write record fields by name.
pub trait FieldAccess {
    /// Record name used in diagnostics.
    fn record_name(&self) -> &'static str;

    fn get_field(&self, name: &str) -> Result<Option<String>, FieldError>;

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FieldError>;
}
