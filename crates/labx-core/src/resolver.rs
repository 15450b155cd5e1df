//! Selection of the results a customer receives for one sample.
//!
//! Every call runs one resolution pass with its own processed set, so a
//! physical result is selected at most once per pass and nothing carries over
//! between samples.
//!
//! # Policies
//!
//! - **ALL / FTPALL** - every result on the sample.
//! - **ALLCOMPS / FTPCOMPS** - one result per distinct internal analysis and
//!   component in the component map, taken from the latest test of that analysis.
//! - **FTPREQ** - only what the originating request asked for, resolved through
//!   the component map priority tiers.
//!
//! The FTP policies need a correlated request. Without one they select nothing.

use std::collections::HashSet;

use tracing::{debug, trace};

use labx_map::{ComponentMap, ComponentMapEntry};
use labx_model::{ExportPolicy, ExternalRequest, LabResult, RequestedItem, Sample, Test};

use crate::translate::synthesize_item;

/// Position of a result on a sample: index of the test, then of the result.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResultRef {
    pub test: usize,
    pub result: usize,
}

/// One result picked for export.
#[derive(Debug, Clone, PartialEq)]
pub struct Selection<'s> {
    pub at: ResultRef,
    pub result: &'s LabResult,
    /// Requested item the result answers.
    pub item: RequestedItem,
}

/// A test with the results selected from it, in selection order.
#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedTest<'s> {
    pub index: usize,
    pub test: &'s Test,
    pub selections: Vec<Selection<'s>>,
}

/// Results selected for one sample, grouped by test in first-selection order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedExport<'s> {
    tests: Vec<ResolvedTest<'s>>,
}

impl<'s> ResolvedExport<'s> {
    pub fn is_empty(&self) -> bool {
        self.tests.is_empty()
    }

    pub fn tests(&self) -> &[ResolvedTest<'s>] {
        &self.tests
    }

    pub fn result_count(&self) -> usize {
        self.tests.iter().map(|test| test.selections.len()).sum()
    }

    /// Every selection with the test it belongs to.
    pub fn selections(&self) -> impl Iterator<Item = (&'s Test, &Selection<'s>)> {
        self.tests.iter().flat_map(|resolved| {
            resolved
                .selections
                .iter()
                .map(move |selection| (resolved.test, selection))
        })
    }

    pub fn contains(&self, at: ResultRef) -> bool {
        self.selections().any(|(_, selection)| selection.at == at)
    }

    fn push(&mut self, sample: &'s Sample, at: ResultRef, item: RequestedItem) {
        let test = &sample.tests[at.test];
        let selection = Selection {
            at,
            result: &test.results[at.result],
            item,
        };
        match self.tests.iter_mut().find(|resolved| resolved.index == at.test) {
            Some(resolved) => resolved.selections.push(selection),
            None => self.tests.push(ResolvedTest {
                index: at.test,
                test,
                selections: vec![selection],
            }),
        }
    }
}

/// Resolve the results of `sample` to export under `policy`.
///
/// A degenerate request counts as no request at all.
pub fn resolve<'s>(
    sample: &'s Sample,
    request: Option<&ExternalRequest>,
    component_map: &ComponentMap,
    policy: ExportPolicy,
) -> ResolvedExport<'s> {
    let request = request.filter(|request| !request.is_degenerate());
    if policy.requires_request() && request.is_none() {
        debug!(sample = sample.id, policy = %policy, "no correlated request");
        return ResolvedExport::default();
    }

    let mut pass = Pass::new(sample);
    match policy {
        ExportPolicy::All | ExportPolicy::FtpAll => pass.select_all(component_map),
        ExportPolicy::AllComps | ExportPolicy::FtpComps => pass.select_components(component_map),
        ExportPolicy::FtpReq => {
            if let Some(request) = request {
                for item in request.active_items() {
                    pass.resolve_item(item, component_map);
                }
            }
        }
    }
    debug!(
        sample = sample.id,
        policy = %policy,
        tests = pass.export.tests.len(),
        results = pass.export.result_count(),
        "sample resolved"
    );
    pass.export
}

struct Pass<'s> {
    sample: &'s Sample,
    /// Test indexes by descending test number.
    test_order: Vec<usize>,
    processed: HashSet<ResultRef>,
    export: ResolvedExport<'s>,
}

impl<'s> Pass<'s> {
    fn new(sample: &'s Sample) -> Self {
        let mut test_order: Vec<usize> = (0..sample.tests.len()).collect();
        test_order.sort_by(|a, b| sample.tests[*b].number.cmp(&sample.tests[*a].number));
        Self {
            sample,
            test_order,
            processed: HashSet::new(),
            export: ResolvedExport::default(),
        }
    }

    fn result(&self, at: ResultRef) -> &'s LabResult {
        &self.sample.tests[at.test].results[at.result]
    }

    fn select(&mut self, at: ResultRef, item: RequestedItem) {
        self.processed.insert(at);
        trace!(
            test = self.sample.tests[at.test].number,
            result = %self.result(at).name,
            "result selected"
        );
        self.export.push(self.sample, at, item);
    }

    /// Unprocessed results answering `entry`, latest test first.
    fn candidates(&self, entry: &ComponentMapEntry) -> Vec<ResultRef> {
        let mut found = Vec::new();
        for &test_idx in &self.test_order {
            let test = &self.sample.tests[test_idx];
            for (result_idx, result) in test.results.iter().enumerate() {
                let at = ResultRef {
                    test: test_idx,
                    result: result_idx,
                };
                if entry.matches_result(&test.analysis, &result.name)
                    && !self.processed.contains(&at)
                {
                    found.push(at);
                }
            }
        }
        found
    }

    fn select_all(&mut self, component_map: &ComponentMap) {
        let sample = self.sample;
        for (test_idx, test) in sample.tests.iter().enumerate() {
            for (result_idx, result) in test.results.iter().enumerate() {
                let at = ResultRef {
                    test: test_idx,
                    result: result_idx,
                };
                self.select(at, synthesize_item(test, result, component_map));
            }
        }
    }

    fn select_components(&mut self, component_map: &ComponentMap) {
        for entry in component_map.distinct_components() {
            let latest = self.candidates(entry).into_iter().next();
            match latest {
                Some(at) => self.select(at, entry.as_item()),
                None => trace!(
                    analysis = %entry.analysis,
                    component = %entry.component,
                    "no result for component"
                ),
            }
        }
    }

    /// Priority resolution for one requested item.
    ///
    /// The primary tier proposes a result, out-of-range first. A higher tier
    /// with an unprocessed result overrides it; tiers between the primary and
    /// the overriding one are consumed without export.
    fn resolve_item(&mut self, item: &RequestedItem, component_map: &ComponentMap) {
        let entries = component_map.matching(item);
        let Some(primary) = entries.iter().copied().min_by_key(|entry| entry.analysis_order)
        else {
            debug!(
                analysis_alias = %item.analysis_alias,
                component_alias = %item.component_alias,
                "requested item has no component mapping"
            );
            return;
        };

        let primary_candidates = self.candidates(primary);
        let primary_pick = primary_candidates
            .iter()
            .copied()
            .find(|at| self.result(*at).out_of_range)
            .or_else(|| primary_candidates.first().copied());
        if let Some(at) = primary_pick {
            self.processed.insert(at);
        }

        let confirmation = entries
            .iter()
            .filter(|entry| entry.analysis_order > primary.analysis_order)
            .find_map(|entry| {
                self.candidates(entry)
                    .first()
                    .map(|at| (entry.analysis_order, *at))
            });

        match confirmation {
            Some((order, at)) => {
                for entry in entries.iter().filter(|entry| {
                    entry.analysis_order > primary.analysis_order && entry.analysis_order < order
                }) {
                    let skipped = self.candidates(entry);
                    self.processed.extend(skipped);
                }
                self.select(at, item.clone());
            }
            None => match primary_pick {
                Some(at) => self.select(at, item.clone()),
                None => debug!(
                    analysis_alias = %item.analysis_alias,
                    component_alias = %item.component_alias,
                    "no unprocessed result for requested item"
                ),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn candidates_prefer_latest_test() {
        let sample = Sample::new(1)
            .with_test(Test::new(10, "PH_TEST").with_result(LabResult::new("PH", "7.0")))
            .with_test(Test::new(12, "PH_TEST").with_result(LabResult::new("PH", "7.2")));
        let pass = Pass::new(&sample);
        let entry = ComponentMapEntry::new("PH", "PH", "PH_TEST", "PH", 1);

        let found = pass.candidates(&entry);
        assert_eq!(found[0], ResultRef { test: 1, result: 0 });
        assert_eq!(found.len(), 2);
    }

    #[test]
    fn processed_results_are_not_candidates() {
        let sample = Sample::new(1)
            .with_test(Test::new(10, "PH_TEST").with_result(LabResult::new("PH", "7.0")));
        let mut pass = Pass::new(&sample);
        let entry = ComponentMapEntry::new("PH", "PH", "PH_TEST", "PH", 1);
        pass.processed.insert(ResultRef { test: 0, result: 0 });

        assert!(pass.candidates(&entry).is_empty());
    }
}
