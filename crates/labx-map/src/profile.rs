//! Customer exchange profiles.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use labx_model::{CustomerId, ExportPolicy, RecordKind, normalize_alias};

use crate::component_map::{ComponentMap, ComponentMapEntry};
use crate::error::MappingError;
use crate::field_map::{FieldMap, FieldMapEntry};

/// Exchange configuration for one customer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerProfile {
    pub customer_id: CustomerId,
    #[serde(default)]
    pub export_policy: ExportPolicy,
    /// Emit tests as an intermediate level instead of flattening results under samples.
    #[serde(default)]
    pub test_nodes: bool,
    /// Component list attached to new tests, keyed by internal analysis.
    #[serde(default)]
    pub component_lists: BTreeMap<String, String>,
    #[serde(default)]
    pub field_map: FieldMap,
    #[serde(default)]
    pub component_map: ComponentMap,
}

impl CustomerProfile {
    pub fn new(customer_id: CustomerId) -> Self {
        Self {
            customer_id,
            export_policy: ExportPolicy::default(),
            test_nodes: false,
            component_lists: BTreeMap::new(),
            field_map: FieldMap::default(),
            component_map: ComponentMap::default(),
        }
    }

    pub fn with_policy(mut self, policy: ExportPolicy) -> Self {
        self.export_policy = policy;
        self
    }

    pub fn with_test_nodes(mut self, enabled: bool) -> Self {
        self.test_nodes = enabled;
        self
    }

    pub fn with_field(mut self, entry: FieldMapEntry) -> Self {
        self.field_map.push(entry);
        self
    }

    pub fn with_component(mut self, entry: ComponentMapEntry) -> Self {
        self.component_map.push(entry);
        self
    }

    pub fn with_component_list(
        mut self,
        analysis: impl Into<String>,
        list: impl Into<String>,
    ) -> Self {
        self.component_lists.insert(analysis.into(), list.into());
        self
    }

    pub fn component_list_for(&self, analysis: &str) -> Option<&str> {
        self.component_lists
            .iter()
            .find(|(key, _)| key.trim().eq_ignore_ascii_case(analysis.trim()))
            .map(|(_, list)| list.as_str())
    }

    /// Configuration problems that make the profile unusable for exchange.
    pub fn validate(&self) -> Vec<MappingError> {
        let mut issues = Vec::new();
        for kind in [RecordKind::Sample, RecordKind::Test, RecordKind::Result] {
            if self
                .field_map
                .entries_for(kind)
                .any(FieldMapEntry::is_customer_field)
            {
                issues.push(MappingError::CustomerFieldRemapped {
                    kind: kind.to_string(),
                });
            }
        }
        for entry in self.field_map.iter() {
            if !entry.node_name().is_empty() && !entry.has_valid_node_name() {
                issues.push(MappingError::InvalidNodeName {
                    kind: entry.kind.to_string(),
                    node: entry.node_name().to_string(),
                });
            }
        }
        let mut primaries = BTreeSet::new();
        for entry in self.component_map.iter() {
            if entry.analysis_order == 0 {
                issues.push(MappingError::InvalidAnalysisOrder {
                    analysis: entry.analysis.clone(),
                    order: entry.analysis_order,
                });
            }
            if entry.is_primary() {
                let key = (
                    normalize_alias(&entry.analysis_alias),
                    normalize_alias(&entry.component_alias),
                );
                if !primaries.insert(key) {
                    issues.push(MappingError::DuplicatePrimary {
                        analysis_alias: entry.analysis_alias.clone(),
                        component_alias: entry.component_alias.clone(),
                    });
                }
            }
        }
        issues
    }
}

/// Read-only snapshot of customer profiles used for one ingestion or export call.
#[derive(Debug, Clone, Default)]
pub struct ProfileCatalog {
    profiles: BTreeMap<CustomerId, CustomerProfile>,
}

impl ProfileCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, profile: CustomerProfile) {
        self.profiles.insert(profile.customer_id.clone(), profile);
    }

    pub fn get(&self, customer_id: &CustomerId) -> Option<&CustomerProfile> {
        self.profiles.get(customer_id)
    }

    pub fn len(&self) -> usize {
        self.profiles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.profiles.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &CustomerProfile> {
        self.profiles.values()
    }
}

impl FromIterator<CustomerProfile> for ProfileCatalog {
    fn from_iter<T: IntoIterator<Item = CustomerProfile>>(iter: T) -> Self {
        let mut catalog = ProfileCatalog::new();
        for profile in iter {
            catalog.insert(profile);
        }
        catalog
    }
}
