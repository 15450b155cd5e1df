//! Profile repository for persisting customer exchange profiles.
//!
//! Profiles are stored as JSON files named `{customer_id}.json` inside a base
//! directory. The repository supports:
//! - Saving a profile (rejecting profiles that fail validation)
//! - Loading one profile by customer
//! - Loading every profile into a [`ProfileCatalog`]
//! - Listing and deleting stored profiles

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use chrono::{SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use labx_model::CustomerId;

use crate::profile::{CustomerProfile, ProfileCatalog};

/// Repository for storing and retrieving customer profiles.
#[derive(Debug, Clone)]
pub struct ProfileRepository {
    base_dir: PathBuf,
}

/// Metadata about a stored profile.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfileMetadata {
    pub customer_id: String,
    pub file_path: PathBuf,
    pub export_policy: String,
    pub field_count: usize,
    pub component_count: usize,
    pub saved_at: Option<String>,
}

/// Profile plus repository metadata, as written to disk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StoredProfile {
    #[serde(flatten)]
    pub profile: CustomerProfile,
    /// RFC 3339 timestamp of the last save.
    pub saved_at: Option<String>,
    pub description: Option<String>,
    #[serde(default = "default_version")]
    pub version: String,
}

fn default_version() -> String {
    "1.0".to_string()
}

impl StoredProfile {
    pub fn new(profile: CustomerProfile) -> Self {
        Self {
            profile,
            saved_at: Some(Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true)),
            description: None,
            version: default_version(),
        }
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

impl ProfileRepository {
    /// Open a repository, creating the directory if needed.
    pub fn new(base_dir: impl Into<PathBuf>) -> Result<Self> {
        let base_dir = base_dir.into();
        fs::create_dir_all(&base_dir).with_context(|| {
            format!("Failed to create profile repository: {}", base_dir.display())
        })?;
        Ok(Self { base_dir })
    }

    pub fn base_dir(&self) -> &Path {
        &self.base_dir
    }

    pub fn save(&self, profile: &CustomerProfile) -> Result<PathBuf> {
        self.save_stored(&StoredProfile::new(profile.clone()))
    }

    pub fn save_stored(&self, stored: &StoredProfile) -> Result<PathBuf> {
        let issues = stored.profile.validate();
        if let Some(issue) = issues.first() {
            bail!(
                "Refusing to save profile {}: {issue}",
                stored.profile.customer_id
            );
        }
        let path = self.profile_path(&stored.profile.customer_id);
        let json = serde_json::to_string_pretty(stored).with_context(|| {
            format!(
                "Failed to serialize profile for {}",
                stored.profile.customer_id
            )
        })?;
        fs::write(&path, json)
            .with_context(|| format!("Failed to write profile to {}", path.display()))?;
        debug!(customer = %stored.profile.customer_id, path = %path.display(), "profile saved");
        Ok(path)
    }

    /// Load a customer's profile. Returns `None` if it was never stored.
    pub fn load(&self, customer_id: &CustomerId) -> Result<Option<CustomerProfile>> {
        Ok(self.load_stored(customer_id)?.map(|stored| stored.profile))
    }

    pub fn load_stored(&self, customer_id: &CustomerId) -> Result<Option<StoredProfile>> {
        let path = self.profile_path(customer_id);
        if !path.exists() {
            return Ok(None);
        }
        read_stored(&path).map(Some)
    }

    /// Load every readable profile. Unreadable files are logged and skipped.
    pub fn load_all(&self) -> Result<ProfileCatalog> {
        let mut catalog = ProfileCatalog::new();
        for path in self.profile_files()? {
            match read_stored(&path) {
                Ok(stored) => {
                    for issue in stored.profile.validate() {
                        warn!(
                            customer = %stored.profile.customer_id,
                            "profile issue: {issue}"
                        );
                    }
                    catalog.insert(stored.profile);
                }
                Err(error) => warn!(path = %path.display(), "skipping profile: {error:#}"),
            }
        }
        Ok(catalog)
    }

    /// List stored profiles ordered by customer.
    pub fn list(&self) -> Result<Vec<ProfileMetadata>> {
        let mut metadata = Vec::new();
        for path in self.profile_files()? {
            if let Ok(stored) = read_stored(&path) {
                metadata.push(ProfileMetadata {
                    customer_id: stored.profile.customer_id.to_string(),
                    file_path: path,
                    export_policy: stored.profile.export_policy.to_string(),
                    field_count: stored.profile.field_map.len(),
                    component_count: stored.profile.component_map.len(),
                    saved_at: stored.saved_at,
                });
            }
        }
        metadata.sort_by(|a, b| a.customer_id.cmp(&b.customer_id));
        Ok(metadata)
    }

    pub fn delete(&self, customer_id: &CustomerId) -> Result<bool> {
        let path = self.profile_path(customer_id);
        if path.exists() {
            fs::remove_file(&path)
                .with_context(|| format!("Failed to delete profile: {}", path.display()))?;
            Ok(true)
        } else {
            Ok(false)
        }
    }

    pub fn exists(&self, customer_id: &CustomerId) -> bool {
        self.profile_path(customer_id).exists()
    }

    fn profile_path(&self, customer_id: &CustomerId) -> PathBuf {
        self.base_dir
            .join(format!("{}.json", normalize_id(customer_id.as_str())))
    }

    fn profile_files(&self) -> Result<Vec<PathBuf>> {
        let mut files = Vec::new();
        for entry in fs::read_dir(&self.base_dir)
            .with_context(|| format!("Failed to read repository: {}", self.base_dir.display()))?
        {
            let path = entry?.path();
            if path.is_file() && path.extension().is_some_and(|ext| ext == "json") {
                files.push(path);
            }
        }
        files.sort();
        Ok(files)
    }
}

fn read_stored(path: &Path) -> Result<StoredProfile> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("Failed to read profile from {}", path.display()))?;
    serde_json::from_str(&contents)
        .with_context(|| format!("Failed to parse profile from {}", path.display()))
}

/// Normalize an ID for use in filenames.
fn normalize_id(id: &str) -> String {
    id.trim()
        .to_uppercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect()
}
