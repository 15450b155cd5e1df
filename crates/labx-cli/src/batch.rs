//! Jobs file shared by `labx ingest` and `labx export`.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use labx_ingest::{IngestOptions, IngestOutcome};
use labx_model::{ExternalRequest, Job, RequestId};

/// Ingested jobs plus the requests to flag as converted.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct JobBatch {
    pub jobs: Vec<Job>,
    #[serde(default)]
    pub converted: Vec<RequestId>,
}

impl From<&IngestOutcome> for JobBatch {
    fn from(outcome: &IngestOutcome) -> Self {
        Self {
            jobs: outcome.jobs.clone(),
            converted: outcome.converted.clone(),
        }
    }
}

impl JobBatch {
    pub fn read(path: &Path) -> Result<Self> {
        let contents =
            fs::read_to_string(path).with_context(|| format!("read jobs: {}", path.display()))?;
        serde_json::from_str(&contents).with_context(|| format!("parse jobs: {}", path.display()))
    }

    pub fn write(&self, path: &Path) -> Result<()> {
        let json = serde_json::to_string_pretty(self).context("serialize jobs")?;
        fs::write(path, json).with_context(|| format!("write jobs: {}", path.display()))
    }

    /// Flag requests this batch already converted so ingestion skips them.
    pub fn mark_converted(&self, requests: &mut [ExternalRequest]) -> usize {
        let mut marked = 0;
        for request in requests.iter_mut() {
            if !request.converted && self.converted.contains(&request.id) {
                request.converted = true;
                marked += 1;
            }
        }
        marked
    }

    /// Move the numbering past every job, sample and test already in the batch.
    pub fn continue_numbering(&self, options: &mut IngestOptions) {
        for job in &self.jobs {
            if let Some(number) = job
                .name
                .rsplit_once('-')
                .and_then(|(_, number)| number.parse::<u64>().ok())
            {
                options.first_job_number = options.first_job_number.max(number.saturating_add(1));
            }
            for sample in &job.samples {
                options.first_sample_id = options.first_sample_id.max(sample.id.saturating_add(1));
                for test in &sample.tests {
                    options.first_test_number =
                        options.first_test_number.max(test.number.saturating_add(1));
                }
            }
        }
    }

    /// Append a later ingestion run.
    pub fn merge(&mut self, outcome: &IngestOutcome) {
        self.jobs.extend(outcome.jobs.iter().cloned());
        for id in &outcome.converted {
            if !self.converted.contains(id) {
                self.converted.push(*id);
            }
        }
    }

    pub fn job(&self, name: &str) -> Option<&Job> {
        self.jobs
            .iter()
            .find(|job| job.name.eq_ignore_ascii_case(name.trim()))
    }
}

/// Where the transaction document for `job_name` is written.
pub fn transaction_path(dir: &Path, job_name: &str) -> PathBuf {
    let stem: String = job_name
        .trim()
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' || c == '_' {
                c
            } else {
                '_'
            }
        })
        .collect();
    dir.join(format!("{stem}.xml"))
}
