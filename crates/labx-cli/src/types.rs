use std::path::PathBuf;

use labx_model::CustomerId;

#[derive(Debug)]
pub struct ExportSummary {
    pub output_dir: PathBuf,
    pub jobs: Vec<JobExport>,
}

#[derive(Debug)]
pub struct JobExport {
    pub job: String,
    pub customer: CustomerId,
    pub samples: usize,
    pub status: ExportStatus,
}

#[derive(Debug)]
pub enum ExportStatus {
    Written(PathBuf),
    /// Nothing reportable; no document was produced.
    Empty,
    NoProfile,
}
