//! Transaction documents for customer result delivery.
//!
//! The builder walks job, sample, test and result, emitting the nodes the
//! customer's field map names at each level. Result text always goes through
//! the customer's value map. A result whose translated text is blank is left
//! out, and a document with no result text at all is never produced.

use anyhow::Result;
use tracing::{debug, warn};

use labx_core::{ResolvedExport, translate_result};
use labx_map::CustomerProfile;
use labx_model::{
    ExportPolicy, ExternalRequest, FieldAccess, FieldError, FieldRef, Job, LabResult, RecordKind,
    RequestedItem, Sample, SourceRecord, TEXT_FIELD, Test,
};

use crate::common::{DocumentWriter, FieldNode, element_name_ok};

/// Outcome of building a transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    Document(String),
    /// Nothing to send; callers must not deliver an empty transaction.
    Empty,
}

impl Transaction {
    pub fn is_empty(&self) -> bool {
        matches!(self, Transaction::Empty)
    }

    pub fn document(&self) -> Option<&str> {
        match self {
            Transaction::Document(xml) => Some(xml),
            Transaction::Empty => None,
        }
    }

    pub fn into_document(self) -> Option<String> {
        match self {
            Transaction::Document(xml) => Some(xml),
            Transaction::Empty => None,
        }
    }
}

/// A sample selected for export with its resolved results.
#[derive(Debug, Clone)]
pub struct SampleExport<'s> {
    pub sample: &'s Sample,
    pub request: Option<&'s ExternalRequest>,
    pub resolved: ResolvedExport<'s>,
}

type TranslatedResult<'e, 's> = (&'s LabResult, &'e RequestedItem, String);
type TranslatedTest<'e, 's> = (&'s Test, Vec<TranslatedResult<'e, 's>>);

/// Records a field can be read from while a node is written.
#[derive(Clone, Copy)]
struct Scope<'s> {
    job: &'s Job,
    sample: Option<&'s Sample>,
    request: Option<&'s ExternalRequest>,
    test: Option<&'s Test>,
    result: Option<&'s LabResult>,
    item: Option<&'s RequestedItem>,
    /// Translated result text.
    text: Option<&'s str>,
}

impl<'s> Scope<'s> {
    fn job(job: &'s Job) -> Self {
        Self {
            job,
            sample: None,
            request: None,
            test: None,
            result: None,
            item: None,
            text: None,
        }
    }

    fn record(&self, source: SourceRecord) -> Option<&'s dyn FieldAccess> {
        match source {
            SourceRecord::Job => Some(self.job as &dyn FieldAccess),
            SourceRecord::Sample => self.sample.map(|record| record as &dyn FieldAccess),
            SourceRecord::Test => self.test.map(|record| record as &dyn FieldAccess),
            SourceRecord::Result => self.result.map(|record| record as &dyn FieldAccess),
            SourceRecord::Request => self.request.map(|record| record as &dyn FieldAccess),
            SourceRecord::Item => self.item.map(|record| record as &dyn FieldAccess),
        }
    }

    fn read(&self, field: &FieldRef, kind: RecordKind) -> Result<Option<String>, FieldError> {
        let source = field.source_for(kind);
        if source == SourceRecord::Result
            && field.is(TEXT_FIELD)
            && let Some(text) = self.text
        {
            return Ok(Some(text.to_string()));
        }
        match self.record(source) {
            Some(record) => record.get_field(&field.name),
            None => Ok(None),
        }
    }
}

/// Builds transaction documents for one customer.
pub struct TransactionBuilder<'p> {
    profile: &'p CustomerProfile,
}

impl<'p> TransactionBuilder<'p> {
    pub fn new(profile: &'p CustomerProfile) -> Self {
        Self { profile }
    }

    /// Build the document for the selected samples of `job`.
    ///
    /// Samples are written in job order. Samples missing from `exports` are
    /// not selected.
    pub fn build<'s>(&self, job: &'s Job, exports: &[SampleExport<'s>]) -> Result<Transaction> {
        let mut included = Vec::new();
        for sample in &job.samples {
            let Some(export) = exports.iter().find(|export| export.sample.id == sample.id) else {
                continue;
            };
            if !sample.status.is_reportable() {
                debug!(sample = sample.id, status = %sample.status, "sample not reportable");
                continue;
            }
            if !self.request_allows(export) {
                debug!(sample = sample.id, "sample has no correlated request");
                continue;
            }
            let tests = self.translated_tests(export);
            if tests.is_empty() {
                debug!(sample = sample.id, "no result text to export");
                continue;
            }
            included.push((export, tests));
        }

        if included.is_empty() {
            debug!(job = %job.name, "nothing to export");
            return Ok(Transaction::Empty);
        }

        let mut doc = DocumentWriter::new(self.profile.test_nodes);
        let job_scope = Scope::job(job);
        doc.begin_job(
            job.customer_id.as_str(),
            &self.field_nodes(RecordKind::Job, &job_scope),
        )?;
        for (export, tests) in &included {
            let sample_scope = Scope {
                sample: Some(export.sample),
                request: export.request,
                ..job_scope
            };
            doc.begin_sample(&self.field_nodes(RecordKind::Sample, &sample_scope))?;
            for (test, results) in tests {
                let test_scope = Scope {
                    test: Some(*test),
                    ..sample_scope
                };
                doc.begin_test(&self.field_nodes(RecordKind::Test, &test_scope))?;
                for (result, item, text) in results {
                    let result_scope = Scope {
                        result: Some(*result),
                        item: Some(*item),
                        text: Some(text.as_str()),
                        ..test_scope
                    };
                    doc.result(&self.field_nodes(RecordKind::Result, &result_scope))?;
                }
                doc.end_test()?;
            }
            doc.end_sample()?;
        }
        let xml = doc.finish()?;
        debug!(job = %job.name, samples = included.len(), "transaction built");
        Ok(Transaction::Document(xml))
    }

    fn request_allows(&self, export: &SampleExport<'_>) -> bool {
        let correlated = export
            .request
            .is_some_and(|request| !request.is_degenerate());
        correlated
            || matches!(
                self.profile.export_policy,
                ExportPolicy::All | ExportPolicy::AllComps
            )
    }

    /// Selected results with non-blank translated text, grouped by test.
    fn translated_tests<'e, 's>(
        &self,
        export: &'e SampleExport<'s>,
    ) -> Vec<TranslatedTest<'e, 's>> {
        let mut tests = Vec::new();
        for resolved in export.resolved.tests() {
            let results: Vec<TranslatedResult<'e, 's>> = resolved
                .selections
                .iter()
                .filter_map(|selection| {
                    let text = translate_result(
                        &selection.item,
                        resolved.test,
                        selection.result,
                        &self.profile.component_map,
                    );
                    if text.trim().is_empty() {
                        debug!(
                            test = resolved.test.number,
                            result = %selection.result.name,
                            "blank result text skipped"
                        );
                        None
                    } else {
                        Some((selection.result, &selection.item, text))
                    }
                })
                .collect();
            if !results.is_empty() {
                tests.push((resolved.test, results));
            }
        }
        tests
    }

    fn field_nodes(&self, kind: RecordKind, scope: &Scope<'_>) -> Vec<FieldNode<'p>> {
        self.profile
            .field_map
            .mapped_entries(kind)
            .filter(|entry| element_name_ok(entry, kind))
            .map(|entry| {
                let field = entry.field_ref();
                let value = match scope.read(&field, kind) {
                    Ok(value) => value.unwrap_or_default(),
                    Err(error) => {
                        warn!(
                            kind = %kind,
                            node = %entry.node_name(),
                            "field read failed: {error}"
                        );
                        String::new()
                    }
                };
                (entry.node_name(), value)
            })
            .collect()
    }
}
