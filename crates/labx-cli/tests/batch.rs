use std::fs;
use std::path::{Path, PathBuf};

use labx_cli::batch::{JobBatch, transaction_path};
use labx_cli::config::Settings;
use labx_ingest::{FixedCustomer, IngestOptions, Ingestor};
use labx_map::{ComponentMapEntry, CustomerProfile, FieldMapEntry};
use labx_model::{
    CustomerId, ExportPolicy, ExternalRequest, LabResult, RecordKind, RequestedItem,
    SampleStatus,
};
use labx_report::export_job;

fn temp_dir(label: &str) -> PathBuf {
    let mut dir = std::env::temp_dir();
    let stamp = std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    dir.push(format!("labx_cli_{label}_{}_{stamp}", std::process::id()));
    fs::create_dir_all(&dir).unwrap();
    dir
}

fn acme_profile() -> CustomerProfile {
    CustomerProfile::new(CustomerId::new("ACME").unwrap())
        .with_policy(ExportPolicy::FtpReq)
        .with_field(FieldMapEntry::new(RecordKind::Sample, "ID_NUMERIC", "SampleId"))
        .with_field(FieldMapEntry::new(RecordKind::Result, "TEXT", "Value"))
        .with_component(ComponentMapEntry::new("PH", "PH", "PH_TEST", "PH", 1))
}

fn ph_request(id: u64) -> ExternalRequest {
    ExternalRequest {
        id,
        customer_id: "ACME".to_string(),
        transaction_id: format!("TX-{id}"),
        items: vec![RequestedItem::new("PH", "PH")],
        ..ExternalRequest::default()
    }
}

#[test]
fn transaction_file_names_are_safe() {
    let dir = Path::new("/out");
    assert_eq!(
        transaction_path(dir, "ACME-00001"),
        PathBuf::from("/out/ACME-00001.xml")
    );
    assert_eq!(
        transaction_path(dir, " a/b c "),
        PathBuf::from("/out/a_b_c.xml")
    );
}

#[test]
fn ingested_jobs_survive_the_jobs_file_and_export() {
    let dir = temp_dir("batch");
    fs::write(dir.join("labx.toml"), "first_sample_id = 500\n").unwrap();
    let settings = Settings::load(&dir.join("labx.toml")).unwrap();
    settings.repository().unwrap().save(&acme_profile()).unwrap();

    let requests = vec![ph_request(1), ph_request(2)];
    let catalog = settings.repository().unwrap().load_all().unwrap();
    let mut ingestor = Ingestor::new(&catalog, settings.ingest_options());
    let outcome = ingestor
        .ingest(&requests, &mut FixedCustomer(None))
        .unwrap();

    let jobs_path = dir.join("jobs.json");
    JobBatch::from(&outcome).write(&jobs_path).unwrap();
    let mut batch = JobBatch::read(&jobs_path).unwrap();
    assert_eq!(batch.converted, vec![1, 2]);
    assert_eq!(batch.jobs.len(), 1);
    assert!(batch.job("acme-00001").is_some());
    assert_eq!(batch.jobs[0].samples[0].id, 500);

    // The lab enters and authorises the first sample's result.
    let sample = &mut batch.jobs[0].samples[0];
    sample.status = SampleStatus::Authorised;
    sample.tests[0].results.push(LabResult::new("PH", "7.1"));

    let profile = catalog.get(&CustomerId::new("ACME").unwrap()).unwrap();
    let transaction = export_job(&batch.jobs[0], None, &requests, profile).unwrap();
    let xml = transaction.document().expect("document");
    assert!(xml.contains("<SampleId>500</SampleId>"));
    assert!(xml.contains("<Value>7.1</Value>"));
    assert!(!xml.contains("<SampleId>501</SampleId>"));

    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn unreadable_jobs_file_is_an_error() {
    let dir = temp_dir("bad_jobs");
    let path = dir.join("jobs.json");
    fs::write(&path, "{ not json").unwrap();

    let error = JobBatch::read(&path).unwrap_err();
    assert!(format!("{error:#}").contains("jobs.json"));
    assert!(JobBatch::read(&dir.join("absent.json")).is_err());
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn rerun_against_the_jobs_file_skips_converted_requests() {
    let dir = temp_dir("rerun");
    let settings = Settings::load(&dir.join("labx.toml")).unwrap();
    settings.repository().unwrap().save(&acme_profile()).unwrap();
    let catalog = settings.repository().unwrap().load_all().unwrap();

    let first = Ingestor::new(&catalog, settings.ingest_options())
        .ingest(&[ph_request(1), ph_request(2)], &mut FixedCustomer(None))
        .unwrap();
    let mut batch = JobBatch::from(&first);

    // The same feed comes back with one new request.
    let mut requests = vec![ph_request(1), ph_request(2), ph_request(3)];
    assert_eq!(batch.mark_converted(&mut requests), 2);
    let mut options = settings.ingest_options();
    batch.continue_numbering(&mut options);
    let second = Ingestor::new(&catalog, options)
        .ingest(&requests, &mut FixedCustomer(None))
        .unwrap();

    assert_eq!(second.skipped, vec![1, 2]);
    assert_eq!(second.converted, vec![3]);
    assert_eq!(second.jobs.len(), 1);
    assert_eq!(second.jobs[0].name, "ACME-00002");
    assert_eq!(second.jobs[0].samples.len(), 1);
    assert_eq!(second.jobs[0].samples[0].id, 3);

    batch.merge(&second);
    assert_eq!(batch.converted, vec![1, 2, 3]);
    assert_eq!(batch.jobs.len(), 2);
    let _ = fs::remove_dir_all(&dir);
}

#[test]
fn numbering_continues_after_existing_jobs() {
    let mut job = labx_model::Job::new("ACME-00007", CustomerId::new("ACME").unwrap());
    let mut sample = labx_model::Sample::new(40);
    sample.tests.push(labx_model::Test::new(90, "PH_TEST"));
    job.samples.push(sample);
    let batch = JobBatch {
        jobs: vec![job],
        converted: vec![],
    };

    let mut options = IngestOptions::default();
    batch.continue_numbering(&mut options);
    assert_eq!(options.first_job_number, 8);
    assert_eq!(options.first_sample_id, 41);
    assert_eq!(options.first_test_number, 91);
}
