#![deny(unsafe_code)]

pub mod error;
pub mod fields;
pub mod ids;
pub mod policy;
pub mod records;

pub use error::{FieldError, ModelError, Result};
pub use fields::{
    CUSTOMER_ID_FIELD, FieldAccess, FieldRef, FieldSet, RecordKind, SourceRecord, TEXT_FIELD,
    normalize_field_name,
};
pub use ids::{CustomerId, RequestId, SampleId, TestNumber};
pub use policy::ExportPolicy;
pub use records::{
    ExternalRequest, Job, LabResult, RequestedItem, Sample, SampleStatus, Test, normalize_alias,
};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn customer_id_is_trimmed_and_upper_cased() {
        let id = CustomerId::new("  acme ").unwrap();
        assert_eq!(id.as_str(), "ACME");
        assert!(CustomerId::new("   ").is_err());
    }

    #[test]
    fn policy_requires_request() {
        assert!(!ExportPolicy::All.requires_request());
        assert!(!ExportPolicy::AllComps.requires_request());
        assert!(ExportPolicy::FtpAll.requires_request());
        assert!(ExportPolicy::FtpComps.requires_request());
        assert!(ExportPolicy::FtpReq.requires_request());
    }

    #[test]
    fn job_serializes() {
        let mut job = Job::new("JOB-1", CustomerId::new("ACME").unwrap());
        job.samples.push(
            Sample::new(10)
                .with_request(3)
                .with_test(Test::new(100, "PH_TEST").with_result(LabResult::new("PH", "7.1"))),
        );
        let json = serde_json::to_string(&job).expect("serialize job");
        let round: Job = serde_json::from_str(&json).expect("deserialize job");
        assert_eq!(round, job);
    }
}
