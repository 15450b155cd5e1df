//! `labx.toml` settings.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use labx_ingest::{DEFAULT_HOUSE_CUSTOMER, IngestOptions};
use labx_map::ProfileRepository;
use labx_model::{SampleId, TestNumber};

/// Engine settings. Every key is optional.
///
/// ```toml
/// profile_dir = "profiles"
/// house_customer = "HOUSE"
/// analyses = ["PH_TEST", "ICP_METALS"]
/// first_sample_id = 1000
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Settings {
    /// Directory of `<CUSTOMER>.json` profiles. Relative to the settings file.
    pub profile_dir: PathBuf,
    pub house_customer: String,
    /// Known internal analyses; when set, profiles mapping to anything else fail ingestion.
    pub analyses: Option<Vec<String>>,
    pub first_job_number: u64,
    pub first_sample_id: SampleId,
    pub first_test_number: TestNumber,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            profile_dir: PathBuf::from("profiles"),
            house_customer: DEFAULT_HOUSE_CUSTOMER.to_string(),
            analyses: None,
            first_job_number: 1,
            first_sample_id: 1,
            first_test_number: 1,
        }
    }
}

impl Settings {
    /// Load settings from `path`. A missing file yields the defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let base = path.parent().unwrap_or_else(|| Path::new(""));
        if !path.exists() {
            debug!(path = %path.display(), "no settings file, using defaults");
            return Ok(Self::default().relative_to(base));
        }
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read settings: {}", path.display()))?;
        let settings = Self::from_toml(&contents)
            .with_context(|| format!("parse settings: {}", path.display()))?;
        Ok(settings.relative_to(base))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Resolve a relative profile directory against `base`.
    pub fn relative_to(mut self, base: &Path) -> Self {
        if self.profile_dir.is_relative() {
            self.profile_dir = base.join(&self.profile_dir);
        }
        self
    }

    pub fn repository(&self) -> Result<ProfileRepository> {
        ProfileRepository::new(&self.profile_dir)
    }

    pub fn ingest_options(&self) -> IngestOptions {
        let mut options = IngestOptions {
            first_job_number: self.first_job_number,
            first_sample_id: self.first_sample_id,
            first_test_number: self.first_test_number,
            ..IngestOptions::default()
        }
        .with_house_customer(self.house_customer.clone());
        if let Some(analyses) = &self.analyses {
            options = options.with_known_analyses(analyses);
        }
        options
    }
}
