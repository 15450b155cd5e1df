use labx_map::{ComponentMapEntry, CustomerProfile, FieldMapEntry};
use labx_model::{
    CustomerId, ExportPolicy, ExternalRequest, FieldSet, Job, LabResult, RecordKind,
    RequestedItem, Sample, SampleStatus, Test,
};
use labx_report::{Transaction, export_job, export_sample};

fn customer() -> CustomerId {
    CustomerId::new("C").unwrap()
}

fn profile(policy: ExportPolicy, test_nodes: bool) -> CustomerProfile {
    CustomerProfile::new(customer())
        .with_policy(policy)
        .with_test_nodes(test_nodes)
        .with_field(FieldMapEntry::new(RecordKind::Job, "CUSTOMER_ID", "Customer"))
        .with_field(FieldMapEntry::new(RecordKind::Job, "NAME", "JobName"))
        .with_field(FieldMapEntry::new(RecordKind::Sample, "ID_NUMERIC", "SampleId"))
        .with_field(FieldMapEntry::new(RecordKind::Sample, "REQUEST.TRANSACTION_ID", "TxId"))
        .with_field(FieldMapEntry::new(RecordKind::Test, "ANALYSIS", "Method"))
        .with_field(FieldMapEntry::new(RecordKind::Result, "ITEM.COMPONENT_ALIAS", "Param"))
        .with_field(FieldMapEntry::new(RecordKind::Result, "TEXT", "Value"))
        .with_field(FieldMapEntry::new(RecordKind::Result, "UNITS", "Unit"))
        .with_field(FieldMapEntry::new(RecordKind::Result, "SAMPLE.ID_NUMERIC", "Ref"))
        .with_component(ComponentMapEntry::new("PH", "PH", "PH_TEST", "PH", 1))
        .with_component(
            ComponentMapEntry::new("PH", "PH", "PH_CONFIRM", "PH", 2).with_value("9.40", "HIGH"),
        )
}

fn request(id: u64) -> ExternalRequest {
    ExternalRequest {
        id,
        customer_id: "C".to_string(),
        transaction_id: format!("TX-{id}"),
        items: vec![RequestedItem::new("PH", "PH")],
        ..ExternalRequest::default()
    }
}

fn ph_sample(id: u64, request_id: Option<u64>, confirm_text: &str) -> Sample {
    let mut confirm = LabResult::new("PH", confirm_text).out_of_range();
    confirm.fields = FieldSet::from_iter([("UNITS", "pH")]);
    let mut sample = Sample::new(id)
        .with_status(SampleStatus::Authorised)
        .with_test(Test::new(10 * id, "PH_TEST").with_result(LabResult::new("PH", "7.1")))
        .with_test(Test::new(10 * id + 1, "PH_CONFIRM").with_result(confirm));
    sample.request_id = request_id;
    sample
}

fn job(samples: Vec<Sample>) -> Job {
    let mut job = Job::new("C-00001", customer());
    job.samples = samples;
    job
}

#[test]
fn confirmation_result_is_delivered_with_flattened_results() {
    let job = job(vec![ph_sample(1, Some(1), "9.40")]);
    let profile = profile(ExportPolicy::FtpReq, false);

    let transaction = export_sample(&job, 1, &[request(1)], &profile).unwrap();
    let xml = transaction.document().expect("document");

    let expected = "<jobs>
\t<job>
\t\t<CustomerId>C</CustomerId>
\t\t<JobName>C-00001</JobName>
\t\t<samples>
\t\t\t<sample>
\t\t\t\t<SampleId>1</SampleId>
\t\t\t\t<TxId>TX-1</TxId>
\t\t\t\t<results>
\t\t\t\t\t<result>
\t\t\t\t\t\t<Param>PH</Param>
\t\t\t\t\t\t<Value>HIGH</Value>
\t\t\t\t\t\t<Unit>pH</Unit>
\t\t\t\t\t\t<Ref>1</Ref>
\t\t\t\t\t</result>
\t\t\t\t</results>
\t\t\t</sample>
\t\t</samples>
\t</job>
</jobs>";
    assert_eq!(xml, expected);
}

#[test]
fn test_nodes_add_an_intermediate_level() {
    let job = job(vec![ph_sample(1, Some(1), "9.40")]);
    let profile = profile(ExportPolicy::FtpReq, true);

    let transaction = export_job(&job, None, &[request(1)], &profile).unwrap();
    let xml = transaction.document().expect("document");

    assert!(xml.contains("<tests>"));
    assert!(xml.contains("<Method>PH_CONFIRM</Method>"));
    assert!(!xml.contains("<Method>PH_TEST</Method>"));
    assert!(xml.contains("\t\t\t\t\t\t<results>"));
}

#[test]
fn unreadable_field_is_written_empty() {
    let mut sample = ph_sample(1, Some(1), "9.40");
    // Without UNITS the exported result cannot supply the Unit node.
    sample.tests[1].results[0].fields = FieldSet::new();
    let job = job(vec![sample]);
    let profile = profile(ExportPolicy::FtpReq, false);

    let transaction = export_job(&job, None, &[request(1)], &profile).unwrap();
    let xml = transaction.document().expect("document");

    assert!(xml.contains("<Unit></Unit>"));
    assert!(xml.contains("<Value>HIGH</Value>"));
}

#[test]
fn node_name_with_spaces_is_left_out_of_the_document() {
    let job = job(vec![ph_sample(1, None, "9.40")]);
    let profile = profile(ExportPolicy::All, false).with_field(FieldMapEntry::new(
        RecordKind::Result,
        "TEXT",
        "Result Value",
    ));

    let transaction = export_job(&job, None, &[], &profile).unwrap();
    let xml = transaction.document().expect("document");

    assert!(!xml.contains("Result Value"));
    assert!(xml.contains("<Value>7.1</Value>"));
    let mut reader = quick_xml::Reader::from_str(xml);
    loop {
        match reader.read_event() {
            Ok(quick_xml::events::Event::Eof) => break,
            Ok(_) => {}
            Err(error) => panic!("document does not parse: {error}"),
        }
    }
}

#[test]
fn blank_result_text_suppresses_the_document() {
    let job = job(vec![ph_sample(1, Some(1), "   ")]);
    let profile = profile(ExportPolicy::FtpReq, false);

    let transaction = export_job(&job, None, &[request(1)], &profile).unwrap();

    assert_eq!(transaction, Transaction::Empty);
    assert!(transaction.is_empty());
}

#[test]
fn ftp_policy_skips_samples_without_request() {
    let job = job(vec![ph_sample(1, None, "9.40"), ph_sample(2, Some(2), "9.40")]);
    let profile = profile(ExportPolicy::FtpAll, false);

    let transaction = export_job(&job, None, &[request(2)], &profile).unwrap();
    let xml = transaction.document().expect("document");

    assert!(!xml.contains("<SampleId>1</SampleId>"));
    assert!(xml.contains("<SampleId>2</SampleId>"));
    assert_eq!(xml.matches("<result>").count(), 2);
}

#[test]
fn all_policy_exports_without_request() {
    let job = job(vec![ph_sample(1, None, "9.40")]);
    let profile = profile(ExportPolicy::All, false);

    let transaction = export_job(&job, None, &[], &profile).unwrap();
    let xml = transaction.document().expect("document");

    assert_eq!(xml.matches("<result>").count(), 2);
    assert!(xml.contains("<TxId></TxId>"));
}

#[test]
fn unapproved_and_unselected_samples_are_skipped() {
    let pending = ph_sample(1, Some(1), "9.40").with_status(SampleStatus::Complete);
    let job = job(vec![pending, ph_sample(2, Some(2), "9.40"), ph_sample(3, Some(3), "9.40")]);
    let profile = profile(ExportPolicy::FtpReq, false);
    let requests = [request(1), request(2), request(3)];

    let transaction = export_job(&job, Some(&[1, 3][..]), &requests, &profile).unwrap();
    let xml = transaction.document().expect("document");

    assert!(!xml.contains("<SampleId>1</SampleId>"));
    assert!(!xml.contains("<SampleId>2</SampleId>"));
    assert!(xml.contains("<SampleId>3</SampleId>"));

    let only_pending = export_sample(&job, 1, &requests, &profile).unwrap();
    assert!(only_pending.is_empty());
}

#[test]
fn foreign_profile_or_sample_is_an_error() {
    let job = job(vec![ph_sample(1, Some(1), "9.40")]);
    let other = CustomerProfile::new(CustomerId::new("OTHER").unwrap());

    assert!(export_job(&job, None, &[], &other).is_err());
    assert!(export_sample(&job, 99, &[], &profile(ExportPolicy::All, false)).is_err());
}
