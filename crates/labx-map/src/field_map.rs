//! Field map: internal record fields to external document nodes.

use serde::{Deserialize, Serialize};

use labx_model::{CUSTOMER_ID_FIELD, FieldRef, RecordKind, normalize_field_name};

/// One internal field exported as (or imported from) one external node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldMapEntry {
    /// Record level the node belongs to.
    pub kind: RecordKind,
    /// Internal field name, optionally qualified with a source record (`SAMPLE.ID_NUMERIC`).
    pub field: String,
    /// External node name / field id.
    pub node: String,
}

impl FieldMapEntry {
    pub fn new(kind: RecordKind, field: impl Into<String>, node: impl Into<String>) -> Self {
        Self {
            kind,
            field: field.into(),
            node: node.into(),
        }
    }

    pub fn field_ref(&self) -> FieldRef {
        FieldRef::parse(&self.field)
    }

    /// True if the entry targets the customer identity field.
    pub fn is_customer_field(&self) -> bool {
        let field = self.field_ref();
        field.source.is_none() && field.is(CUSTOMER_ID_FIELD)
    }

    pub fn node_name(&self) -> &str {
        self.node.trim()
    }

    /// True if the node can be written as a document element.
    pub fn has_valid_node_name(&self) -> bool {
        is_valid_node_name(self.node_name())
    }
}

/// XML element name check: a letter or `_`, then letters, digits, `_`, `-` or `.`.
pub fn is_valid_node_name(name: &str) -> bool {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_alphabetic() || first == '_')
        && chars.all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

/// Ordered field map for one customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FieldMap {
    entries: Vec<FieldMapEntry>,
}

impl FieldMap {
    pub fn new(entries: Vec<FieldMapEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: FieldMapEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FieldMapEntry> {
        self.entries.iter()
    }

    /// All entries of one record kind, in configuration order.
    pub fn entries_for(&self, kind: RecordKind) -> impl Iterator<Item = &FieldMapEntry> {
        self.entries.iter().filter(move |entry| entry.kind == kind)
    }

    /// Entries of one kind excluding the customer identity field.
    ///
    /// The customer identity is written first from the customer record itself,
    /// so job and sample mappings never carry it.
    pub fn mapped_entries(&self, kind: RecordKind) -> impl Iterator<Item = &FieldMapEntry> {
        self.entries_for(kind)
            .filter(|entry| !entry.is_customer_field() && !entry.node_name().is_empty())
    }

    /// Entry for an internal field name at a given level.
    pub fn find(&self, kind: RecordKind, field: &str) -> Option<&FieldMapEntry> {
        let field = normalize_field_name(field);
        self.entries_for(kind)
            .find(|entry| normalize_field_name(&entry.field) == field)
    }
}

impl FromIterator<FieldMapEntry> for FieldMap {
    fn from_iter<T: IntoIterator<Item = FieldMapEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
