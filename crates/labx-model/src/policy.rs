//! Export policies selecting which results a sample reports.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::ModelError;

/// Customer-level export policy.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ExportPolicy {
    /// Every result on the sample.
    All,
    /// One result per mapped analysis/component, from the latest test.
    AllComps,
    /// As `All`, only for samples with an originating request.
    FtpAll,
    /// As `AllComps`, only for samples with an originating request.
    FtpComps,
    /// Only what the originating request asked for, resolved by priority.
    #[default]
    FtpReq,
}

impl ExportPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ExportPolicy::All => "ALL",
            ExportPolicy::AllComps => "ALLCOMPS",
            ExportPolicy::FtpAll => "FTPALL",
            ExportPolicy::FtpComps => "FTPCOMPS",
            ExportPolicy::FtpReq => "FTPREQ",
        }
    }

    /// Policies that yield nothing without an originating request.
    pub fn requires_request(self) -> bool {
        matches!(
            self,
            ExportPolicy::FtpAll | ExportPolicy::FtpComps | ExportPolicy::FtpReq
        )
    }
}

impl fmt::Display for ExportPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ExportPolicy {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().as_str() {
            "ALL" => Ok(ExportPolicy::All),
            "ALLCOMPS" => Ok(ExportPolicy::AllComps),
            "FTPALL" => Ok(ExportPolicy::FtpAll),
            "FTPCOMPS" => Ok(ExportPolicy::FtpComps),
            "FTPREQ" => Ok(ExportPolicy::FtpReq),
            _ => Err(ModelError::UnknownPolicy(s.to_string())),
        }
    }
}
