//! One-call export of jobs and samples.

use anyhow::{Result, bail, ensure};
use tracing::{debug, info, info_span};

use labx_core::resolve;
use labx_map::CustomerProfile;
use labx_model::{ExternalRequest, Job, SampleId};

use crate::transaction::{SampleExport, Transaction, TransactionBuilder};

/// Resolve, translate and build the transaction for one sample.
pub fn export_sample(
    job: &Job,
    sample_id: SampleId,
    requests: &[ExternalRequest],
    profile: &CustomerProfile,
) -> Result<Transaction> {
    if job.sample(sample_id).is_none() {
        bail!("sample {sample_id} is not part of job {}", job.name);
    }
    export_job(job, Some(std::slice::from_ref(&sample_id)), requests, profile)
}

/// Export the selected samples of a job, or all of them when `selected` is `None`.
///
/// Each sample is resolved with a fresh pass under the customer's policy.
pub fn export_job(
    job: &Job,
    selected: Option<&[SampleId]>,
    requests: &[ExternalRequest],
    profile: &CustomerProfile,
) -> Result<Transaction> {
    ensure!(
        profile.customer_id == job.customer_id,
        "job {} belongs to {}, not {}",
        job.name,
        job.customer_id,
        profile.customer_id
    );
    let span = info_span!("export", job = %job.name, customer = %job.customer_id);
    let _guard = span.enter();

    let mut exports = Vec::new();
    for sample in &job.samples {
        if selected.is_some_and(|selected| !selected.contains(&sample.id)) {
            continue;
        }
        let request = sample
            .request_id
            .and_then(|id| requests.iter().find(|request| request.id == id));
        if sample.request_id.is_some() && request.is_none() {
            debug!(sample = sample.id, "originating request not found");
        }
        let resolved = resolve(
            sample,
            request,
            &profile.component_map,
            profile.export_policy,
        );
        exports.push(SampleExport {
            sample,
            request,
            resolved,
        });
    }

    let transaction = TransactionBuilder::new(profile).build(job, &exports)?;
    match &transaction {
        Transaction::Document(xml) => info!(
            samples = exports.len(),
            bytes = xml.len(),
            "transaction ready"
        ),
        Transaction::Empty => info!("nothing to send"),
    }
    Ok(transaction)
}
