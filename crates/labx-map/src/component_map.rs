//! Component map: customer alias pairs to internal analysis/component.
//!
//! Every alias pair may map to several internal analyses, one per priority tier
//! ("analysis order"). Order 1 is the primary analysis; higher orders are
//! confirmation or fallback analyses whose results override the primary one
//! when present.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use labx_model::{RequestedItem, normalize_alias};

/// Primary analysis order.
pub const PRIMARY_ORDER: u32 = 1;

/// One literal translation for result text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValueMapping {
    pub external: String,
    pub internal: String,
}

impl ValueMapping {
    pub fn new(external: impl Into<String>, internal: impl Into<String>) -> Self {
        Self {
            external: external.into(),
            internal: internal.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComponentMapEntry {
    pub analysis_alias: String,
    pub component_alias: String,
    pub analysis: String,
    pub component: String,
    #[serde(default = "default_order")]
    pub analysis_order: u32,
    #[serde(default)]
    pub value_map: Vec<ValueMapping>,
}

fn default_order() -> u32 {
    PRIMARY_ORDER
}

impl ComponentMapEntry {
    pub fn new(
        analysis_alias: impl Into<String>,
        component_alias: impl Into<String>,
        analysis: impl Into<String>,
        component: impl Into<String>,
        analysis_order: u32,
    ) -> Self {
        Self {
            analysis_alias: analysis_alias.into(),
            component_alias: component_alias.into(),
            analysis: analysis.into(),
            component: component.into(),
            analysis_order,
            value_map: Vec::new(),
        }
    }

    pub fn with_value(mut self, external: impl Into<String>, internal: impl Into<String>) -> Self {
        self.value_map.push(ValueMapping::new(external, internal));
        self
    }

    pub fn is_primary(&self) -> bool {
        self.analysis_order == PRIMARY_ORDER
    }

    pub fn matches_item(&self, item: &RequestedItem) -> bool {
        let (analysis_alias, component_alias) = item.alias_key();
        normalize_alias(&self.analysis_alias) == analysis_alias
            && normalize_alias(&self.component_alias) == component_alias
    }

    pub fn matches_result(&self, analysis: &str, component: &str) -> bool {
        self.analysis.trim().eq_ignore_ascii_case(analysis.trim())
            && self.component.trim().eq_ignore_ascii_case(component.trim())
    }

    /// Requested item this entry answers.
    pub fn as_item(&self) -> RequestedItem {
        RequestedItem::new(self.analysis_alias.clone(), self.component_alias.clone())
    }

    /// Mapped literal for a raw result text, if the value map has one.
    pub fn translate(&self, raw: &str) -> Option<&str> {
        let raw = raw.trim();
        self.value_map
            .iter()
            .find(|mapping| mapping.external.trim().eq_ignore_ascii_case(raw))
            .map(|mapping| mapping.internal.as_str())
    }
}

/// Ordered component map for one customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentMap {
    entries: Vec<ComponentMapEntry>,
}

impl ComponentMap {
    pub fn new(entries: Vec<ComponentMapEntry>) -> Self {
        Self { entries }
    }

    pub fn push(&mut self, entry: ComponentMapEntry) {
        self.entries.push(entry);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ComponentMapEntry> {
        self.entries.iter()
    }

    /// Entries for a requested alias pair, highest analysis order first.
    ///
    /// Entries sharing an order keep their configuration order.
    pub fn matching(&self, item: &RequestedItem) -> Vec<&ComponentMapEntry> {
        let mut matches: Vec<&ComponentMapEntry> = self
            .entries
            .iter()
            .filter(|entry| entry.matches_item(item))
            .collect();
        matches.sort_by(|a, b| b.analysis_order.cmp(&a.analysis_order));
        matches
    }

    /// The order-1 entry for an alias pair.
    pub fn primary(&self, item: &RequestedItem) -> Option<&ComponentMapEntry> {
        self.entries
            .iter()
            .find(|entry| entry.is_primary() && entry.matches_item(item))
    }

    /// Lowest-order entry mapping to an internal analysis/component.
    pub fn for_result(&self, analysis: &str, component: &str) -> Option<&ComponentMapEntry> {
        self.entries
            .iter()
            .filter(|entry| entry.matches_result(analysis, component))
            .min_by_key(|entry| entry.analysis_order)
    }

    /// Distinct internal (analysis, component) pairs in first-seen order.
    pub fn distinct_components(&self) -> Vec<&ComponentMapEntry> {
        let mut seen = BTreeSet::new();
        let mut out = Vec::new();
        for entry in &self.entries {
            let key = (
                entry.analysis.trim().to_uppercase(),
                entry.component.trim().to_uppercase(),
            );
            if seen.insert(key) {
                out.push(entry);
            }
        }
        out
    }
}

impl FromIterator<ComponentMapEntry> for ComponentMap {
    fn from_iter<T: IntoIterator<Item = ComponentMapEntry>>(iter: T) -> Self {
        Self::new(iter.into_iter().collect())
    }
}
