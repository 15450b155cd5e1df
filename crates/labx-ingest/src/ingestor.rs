//! Conversion of external requests into jobs, samples and tests.

use std::collections::BTreeSet;

use tracing::{debug, info, info_span, warn};

use labx_map::{CustomerProfile, FieldMapEntry, ProfileCatalog};
use labx_model::{
    CustomerId, ExternalRequest, FieldAccess, Job, RecordKind, RequestId, RequestedItem, Sample,
    SampleId, Test, TestNumber,
};

use crate::error::{IngestError, Result};
use crate::plan::TestPlan;
use crate::prompt::CustomerPrompt;

/// Reserved pass-through customer used for requests the lab logs on its own behalf.
pub const DEFAULT_HOUSE_CUSTOMER: &str = "HOUSE";

#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Customer id that needs a human to pick the real customer.
    pub house_customer: String,
    /// Known internal analyses. A mapping to anything else is a hard error.
    pub known_analyses: Option<BTreeSet<String>>,
    pub first_job_number: u64,
    pub first_sample_id: SampleId,
    pub first_test_number: TestNumber,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            house_customer: DEFAULT_HOUSE_CUSTOMER.to_string(),
            known_analyses: None,
            first_job_number: 1,
            first_sample_id: 1,
            first_test_number: 1,
        }
    }
}

impl IngestOptions {
    pub fn with_house_customer(mut self, customer: impl Into<String>) -> Self {
        self.house_customer = customer.into();
        self
    }

    pub fn with_known_analyses<I, S>(mut self, analyses: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.known_analyses = Some(
            analyses
                .into_iter()
                .map(|analysis| analysis.as_ref().trim().to_uppercase())
                .collect(),
        );
        self
    }

    fn is_house(&self, customer: &str) -> bool {
        let customer = customer.trim();
        customer.is_empty() || customer.eq_ignore_ascii_case(self.house_customer.trim())
    }
}

/// Alias pair a customer requested that has no primary mapping.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnmappedItem {
    pub customer: CustomerId,
    pub item: RequestedItem,
}

#[derive(Debug, Clone, Default)]
pub struct IngestOutcome {
    pub jobs: Vec<Job>,
    /// Requests turned into samples; the caller flags them converted.
    pub converted: Vec<RequestId>,
    /// House requests left untouched because the customer prompt was cancelled.
    pub cancelled: Vec<RequestId>,
    /// Requests ignored because they were already converted.
    pub skipped: Vec<RequestId>,
    pub unmapped: Vec<UnmappedItem>,
}

/// Converts request batches into lab work for each customer.
pub struct Ingestor<'a> {
    catalog: &'a ProfileCatalog,
    options: IngestOptions,
    next_job: u64,
    next_sample: SampleId,
    next_test: TestNumber,
}

impl<'a> Ingestor<'a> {
    pub fn new(catalog: &'a ProfileCatalog, options: IngestOptions) -> Self {
        Self {
            catalog,
            next_job: options.first_job_number,
            next_sample: options.first_sample_id,
            next_test: options.first_test_number,
            options,
        }
    }

    /// Convert a batch of requests into one job per customer.
    ///
    /// House requests without an override are handed to `prompt` as one batch.
    /// A cancelled prompt leaves those requests unconverted. A hard configuration
    /// error fails the whole call and no job is returned.
    pub fn ingest(
        &mut self,
        requests: &[ExternalRequest],
        prompt: &mut dyn CustomerPrompt,
    ) -> Result<IngestOutcome> {
        let mut outcome = IngestOutcome::default();
        let mut groups: Vec<(CustomerId, Vec<&ExternalRequest>)> = Vec::new();
        let mut house: Vec<&ExternalRequest> = Vec::new();

        for request in requests {
            if request.converted {
                outcome.skipped.push(request.id);
                continue;
            }
            let effective = request
                .selected_customer()
                .unwrap_or_else(|| request.declared_customer());
            if self.options.is_house(effective) {
                house.push(request);
                continue;
            }
            push_group(&mut groups, CustomerId::new(effective)?, request);
        }

        if !house.is_empty() {
            match prompt.choose_customer(&house) {
                Some(customer) => {
                    info!(customer = %customer, requests = house.len(), "house requests assigned");
                    for request in house {
                        push_group(&mut groups, customer.clone(), request);
                    }
                }
                None => {
                    info!(requests = house.len(), "house customer selection cancelled");
                    outcome.cancelled = house.iter().map(|request| request.id).collect();
                }
            }
        }

        for (customer, group) in groups {
            let span = info_span!("convert", customer = %customer, requests = group.len());
            let _guard = span.enter();
            let job = self.convert_group(&customer, &group, &mut outcome)?;
            info!(
                job = %job.name,
                samples = job.samples.len(),
                tests = job.test_count(),
                "job created"
            );
            outcome.converted.extend(group.iter().map(|request| request.id));
            outcome.jobs.push(job);
        }
        Ok(outcome)
    }

    fn convert_group(
        &mut self,
        customer: &CustomerId,
        requests: &[&ExternalRequest],
        outcome: &mut IngestOutcome,
    ) -> Result<Job> {
        let catalog = self.catalog;
        let fallback;
        let profile = match catalog.get(customer) {
            Some(profile) => profile,
            None => {
                warn!("no exchange profile; requests convert without tests");
                fallback = CustomerProfile::new(customer.clone());
                &fallback
            }
        };

        let plan = TestPlan::build(requests, &profile.component_map);
        self.check_known_analyses(customer, &plan)?;
        for item in &plan.unmapped {
            debug!(
                analysis_alias = %item.analysis_alias,
                component_alias = %item.component_alias,
                "no primary mapping"
            );
            outcome.unmapped.push(UnmappedItem {
                customer: customer.clone(),
                item: item.clone(),
            });
        }

        let mut job = Job::new(self.allocate_job_name(customer), customer.clone());
        if let Some(first) = requests.first() {
            apply_fields(&mut job, first, profile.field_map.mapped_entries(RecordKind::Job));
        }

        for request in requests {
            let mut sample = Sample::new(self.allocate_sample()).with_request(request.id);
            apply_fields(
                &mut sample,
                request,
                profile.field_map.mapped_entries(RecordKind::Sample),
            );
            for planned in plan.analyses_for(request) {
                for replicate in 1..=planned.replicates {
                    let mut test = Test::new(self.allocate_test(), planned.analysis.clone());
                    test.replicate = replicate;
                    apply_fields(
                        &mut test,
                        request,
                        profile.field_map.mapped_entries(RecordKind::Test),
                    );
                    if let Some(list) = profile.component_list_for(&planned.analysis) {
                        test.component_list = Some(list.to_string());
                    }
                    sample.tests.push(test);
                }
            }
            debug!(sample = sample.id, tests = sample.tests.len(), "sample created");
            job.samples.push(sample);
        }
        Ok(job)
    }

    fn check_known_analyses(&self, customer: &CustomerId, plan: &TestPlan) -> Result<()> {
        let Some(known) = &self.options.known_analyses else {
            return Ok(());
        };
        for definition in &plan.definitions {
            if !known.contains(&definition.analysis.trim().to_uppercase()) {
                return Err(IngestError::UnknownAnalysis {
                    customer: customer.clone(),
                    analysis: definition.analysis.clone(),
                    analysis_alias: definition.item.analysis_alias.clone(),
                    component_alias: definition.item.component_alias.clone(),
                });
            }
        }
        Ok(())
    }

    fn allocate_job_name(&mut self, customer: &CustomerId) -> String {
        let name = format!("{customer}-{:05}", self.next_job);
        self.next_job += 1;
        name
    }

    fn allocate_sample(&mut self) -> SampleId {
        let id = self.next_sample;
        self.next_sample += 1;
        id
    }

    fn allocate_test(&mut self) -> TestNumber {
        let number = self.next_test;
        self.next_test += 1;
        number
    }
}

fn push_group<'r>(
    groups: &mut Vec<(CustomerId, Vec<&'r ExternalRequest>)>,
    customer: CustomerId,
    request: &'r ExternalRequest,
) {
    match groups.iter_mut().find(|(existing, _)| *existing == customer) {
        Some((_, group)) => group.push(request),
        None => groups.push((customer, vec![request])),
    }
}

/// Copy mapped request values onto a record.
///
/// Missing or empty values leave the field at its default. A field that cannot
/// be read or written is logged and skipped; the remaining fields still apply.
pub fn apply_fields<'m, R, I>(record: &mut R, request: &ExternalRequest, entries: I)
where
    R: FieldAccess,
    I: IntoIterator<Item = &'m FieldMapEntry>,
{
    for entry in entries {
        let field = entry.field_ref();
        if field.source_for(entry.kind) != entry.kind.own_source() {
            continue;
        }
        let value = match request.get_field(entry.node_name()) {
            Ok(Some(value)) if !value.trim().is_empty() => value,
            Ok(_) => continue,
            Err(error) => {
                debug!(node = %entry.node_name(), "request value unavailable: {error}");
                continue;
            }
        };
        if let Err(error) = record.set_field(&field.name, &value) {
            warn!(
                record = record.record_name(),
                field = %field.name,
                "field skipped: {error}"
            );
        }
    }
}
