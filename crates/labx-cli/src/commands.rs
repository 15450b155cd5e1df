use std::fs;
use std::io::{self, BufRead, Write};

use anyhow::{Context, Result, anyhow, bail};
use tracing::{info, info_span, trace, warn};

use labx_cli::batch::{JobBatch, transaction_path};
use labx_cli::config::Settings;
use labx_cli::logging::redact_value;
use labx_ingest::{CustomerPrompt, FixedCustomer, IngestOutcome, Ingestor, read_requests};
use labx_map::ProfileMetadata;
use labx_model::{CustomerId, ExternalRequest};
use labx_report::{
    EntityRecord, Transaction, export_job, inbound_template, output_template,
    read_acknowledgement_file,
};

use crate::cli::{ExportArgs, IngestArgs, ReadAckArgs, TemplateArgs};
use crate::types::{ExportStatus, ExportSummary, JobExport};

/// Asks on the terminal which customer owns a batch of house requests.
struct StdinPrompt;

impl CustomerPrompt for StdinPrompt {
    fn choose_customer(&mut self, requests: &[&ExternalRequest]) -> Option<CustomerId> {
        let ids: Vec<String> = requests
            .iter()
            .map(|request| request.id.to_string())
            .collect();
        eprint!("Customer for house requests {} (blank to skip): ", ids.join(", "));
        if io::stderr().flush().is_err() {
            return None;
        }
        let mut line = String::new();
        match io::stdin().lock().read_line(&mut line) {
            Ok(0) | Err(_) => None,
            Ok(_) if line.trim().is_empty() => None,
            Ok(_) => match CustomerId::new(line.trim()) {
                Ok(customer) => Some(customer),
                Err(error) => {
                    warn!("invalid customer: {error}");
                    None
                }
            },
        }
    }
}

pub fn run_ingest(args: &IngestArgs, settings: &Settings) -> Result<IngestOutcome> {
    let mut requests = read_requests(&args.requests)?;
    let catalog = settings.repository()?.load_all()?;
    let mut options = settings.ingest_options();
    if let Some(house) = &args.house_customer {
        options = options.with_house_customer(house.clone());
    }
    let mut batch = match &args.output {
        Some(path) if path.exists() => {
            let batch = JobBatch::read(path)?;
            let marked = batch.mark_converted(&mut requests);
            batch.continue_numbering(&mut options);
            info!(path = %path.display(), marked, "previous jobs loaded");
            batch
        }
        _ => JobBatch::default(),
    };
    for request in &requests {
        for (field, value) in request.fields.iter() {
            trace!(request = request.id, field, value = redact_value(value), "request field");
        }
    }

    let mut ingestor = Ingestor::new(&catalog, options);
    let outcome = match &args.assign {
        Some(customer) => {
            let customer = CustomerId::new(customer)?;
            ingestor.ingest(&requests, &mut FixedCustomer(Some(customer)))?
        }
        None => ingestor.ingest(&requests, &mut StdinPrompt)?,
    };
    info!(
        requests = requests.len(),
        jobs = outcome.jobs.len(),
        converted = outcome.converted.len(),
        "ingestion complete"
    );

    if let Some(path) = &args.output {
        batch.merge(&outcome);
        batch.write(path)?;
        info!(path = %path.display(), "jobs written");
    }
    Ok(outcome)
}

pub fn run_export(args: &ExportArgs, settings: &Settings) -> Result<ExportSummary> {
    let batch = JobBatch::read(&args.jobs)?;
    let requests = read_requests(&args.requests)?;
    let catalog = settings.repository()?.load_all()?;

    let jobs: Vec<_> = match &args.job {
        Some(name) => vec![
            batch
                .job(name)
                .ok_or_else(|| anyhow!("job {name} not found in {}", args.jobs.display()))?,
        ],
        None => batch.jobs.iter().collect(),
    };
    let selected = (!args.samples.is_empty()).then_some(args.samples.as_slice());

    fs::create_dir_all(&args.output_dir)
        .with_context(|| format!("create output dir: {}", args.output_dir.display()))?;

    let mut summary = ExportSummary {
        output_dir: args.output_dir.clone(),
        jobs: Vec::new(),
    };
    for job in jobs {
        let span = info_span!("job", job = %job.name);
        let _guard = span.enter();
        let samples = job
            .samples
            .iter()
            .filter(|sample| selected.is_none_or(|ids| ids.contains(&sample.id)))
            .count();
        let status = match catalog.get(&job.customer_id) {
            None => {
                warn!(customer = %job.customer_id, "no profile, job not exported");
                ExportStatus::NoProfile
            }
            Some(profile) => match export_job(job, selected, &requests, profile)? {
                Transaction::Document(xml) => {
                    trace!(document = redact_value(&xml), "transaction document");
                    let path = transaction_path(&args.output_dir, &job.name);
                    fs::write(&path, xml)
                        .with_context(|| format!("write transaction: {}", path.display()))?;
                    ExportStatus::Written(path)
                }
                Transaction::Empty => ExportStatus::Empty,
            },
        };
        summary.jobs.push(JobExport {
            job: job.name.clone(),
            customer: job.customer_id.clone(),
            samples,
            status,
        });
    }
    Ok(summary)
}

pub fn run_template(args: &TemplateArgs, settings: &Settings) -> Result<String> {
    let customer = CustomerId::new(&args.customer)?;
    let profile = settings
        .repository()?
        .load(&customer)?
        .ok_or_else(|| anyhow!("no profile stored for customer {customer}"))?;
    if args.inbound {
        inbound_template(&profile)
    } else {
        output_template(&profile)
    }
}

pub fn run_read_ack(args: &ReadAckArgs) -> Result<String> {
    let entities: Vec<EntityRecord> = read_acknowledgement_file(&args.file)?;
    if entities.is_empty() {
        bail!("no entities in {}", args.file.display());
    }
    serde_json::to_string_pretty(&entities).context("serialize acknowledgement")
}

pub fn run_customers(settings: &Settings) -> Result<Vec<ProfileMetadata>> {
    settings.repository()?.list()
}
