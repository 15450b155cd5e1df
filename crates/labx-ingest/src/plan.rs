//! Test planning for one customer group.
//!
//! Requested items from every request in the group are reduced to a set of
//! distinct alias pairs and mapped through the primary component map entries.
//! Each sample is then sized from its own request: the statistical mode of the
//! component aliases that request asked for per analysis alias.

use std::collections::{BTreeSet, HashSet};

use labx_map::ComponentMap;
use labx_model::{ExternalRequest, RequestedItem};

/// A distinct requested alias pair with a primary mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TestDefinition {
    /// First physical occurrence of the alias pair.
    pub item: RequestedItem,
    pub analysis: String,
    pub component: String,
}

/// Most requested component alias for one analysis alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModalComponent {
    pub analysis_alias: String,
    pub component_alias: String,
    pub count: u32,
}

/// Tests to instantiate for one internal analysis.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlannedAnalysis {
    pub analysis: String,
    /// Component the analysis was instantiated for.
    pub component: String,
    pub replicates: u32,
    /// Normalized alias pairs that resolve to this analysis.
    pub alias_pairs: BTreeSet<(String, String)>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestPlan {
    /// Distinct mapped alias pairs across the whole group.
    pub definitions: Vec<TestDefinition>,
    /// Distinct alias pairs without a primary mapping.
    pub unmapped: Vec<RequestedItem>,
}

impl TestPlan {
    pub fn build(requests: &[&ExternalRequest], component_map: &ComponentMap) -> Self {
        let items: Vec<&RequestedItem> = requests
            .iter()
            .flat_map(|request| request.active_items())
            .collect();

        let mut plan = TestPlan::default();
        for item in distinct_items(&items) {
            match component_map.primary(item) {
                Some(entry) => plan.definitions.push(TestDefinition {
                    item: item.clone(),
                    analysis: entry.analysis.clone(),
                    component: entry.component.clone(),
                }),
                None => plan.unmapped.push(item.clone()),
            }
        }
        plan
    }

    /// Analyses to instantiate on the sample for `request`.
    ///
    /// Replicates come from this request's items only, so other requests in
    /// the group never change the size of its sample.
    pub fn analyses_for(&self, request: &ExternalRequest) -> Vec<PlannedAnalysis> {
        let items: Vec<&RequestedItem> = request.active_items().collect();
        let asked: HashSet<(String, String)> = items.iter().map(|item| item.alias_key()).collect();
        let definitions: Vec<&TestDefinition> = self
            .definitions
            .iter()
            .filter(|definition| asked.contains(&definition.item.alias_key()))
            .collect();
        plan_analyses(&definitions, &modal_components(&items))
    }
}

/// Distinct alias pairs, keeping the first occurrence of each.
pub fn distinct_items<'a>(items: &[&'a RequestedItem]) -> Vec<&'a RequestedItem> {
    let mut seen = HashSet::new();
    items
        .iter()
        .copied()
        .filter(|item| !item.is_blank() && seen.insert(item.alias_key()))
        .collect()
}

/// Modal component alias per analysis alias.
///
/// Groups keep first-encounter order; ties go to the component alias seen first.
pub fn modal_components(items: &[&RequestedItem]) -> Vec<ModalComponent> {
    let mut groups: Vec<(String, Vec<(String, u32)>)> = Vec::new();
    for item in items.iter().filter(|item| !item.is_blank()) {
        let (analysis_alias, component_alias) = item.alias_key();
        let idx = match groups.iter().position(|(alias, _)| *alias == analysis_alias) {
            Some(idx) => idx,
            None => {
                groups.push((analysis_alias, Vec::new()));
                groups.len() - 1
            }
        };
        let group = &mut groups[idx].1;
        match group.iter_mut().find(|(alias, _)| *alias == component_alias) {
            Some((_, count)) => *count += 1,
            None => group.push((component_alias, 1)),
        }
    }

    groups
        .into_iter()
        .filter_map(|(analysis_alias, counts)| {
            let mut best: Option<(String, u32)> = None;
            for (component_alias, count) in counts {
                if best.as_ref().is_none_or(|(_, top)| count > *top) {
                    best = Some((component_alias, count));
                }
            }
            best.map(|(component_alias, count)| ModalComponent {
                analysis_alias,
                component_alias,
                count,
            })
        })
        .collect()
}

fn plan_analyses(definitions: &[&TestDefinition], modes: &[ModalComponent]) -> Vec<PlannedAnalysis> {
    let mut planned: Vec<PlannedAnalysis> = Vec::new();
    for definition in definitions {
        let key = definition.item.alias_key();
        let mode = modes.iter().find(|mode| mode.analysis_alias == key.0);
        let replicates = mode.map_or(1, |mode| mode.count.max(1));
        let is_modal = mode.is_some_and(|mode| mode.component_alias == key.1);

        match planned
            .iter_mut()
            .find(|entry| entry.analysis.eq_ignore_ascii_case(&definition.analysis))
        {
            Some(entry) => {
                entry.alias_pairs.insert(key);
                if replicates > entry.replicates {
                    entry.replicates = replicates;
                }
                if is_modal {
                    entry.component = definition.component.clone();
                }
            }
            None => planned.push(PlannedAnalysis {
                analysis: definition.analysis.clone(),
                component: definition.component.clone(),
                replicates,
                alias_pairs: BTreeSet::from([key]),
            }),
        }
    }
    planned
}
