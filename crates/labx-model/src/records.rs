//! Inbound requests and the internal Job / Sample / Test / Result hierarchy.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::fields::{CUSTOMER_ID_FIELD, FieldAccess, FieldSet, TEXT_FIELD, normalize_field_name};
use crate::ids::{CustomerId, RequestId, SampleId, TestNumber};
use crate::{FieldError, ModelError};

/// One analysis/component alias pair requested by a customer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequestedItem {
    #[serde(default)]
    pub analysis_alias: String,
    #[serde(default)]
    pub component_alias: String,
}

impl RequestedItem {
    pub fn new(analysis_alias: impl Into<String>, component_alias: impl Into<String>) -> Self {
        Self {
            analysis_alias: analysis_alias.into(),
            component_alias: component_alias.into(),
        }
    }

    /// Both aliases blank.
    pub fn is_blank(&self) -> bool {
        self.analysis_alias.trim().is_empty() && self.component_alias.trim().is_empty()
    }

    /// Normalized alias pair used for grouping and lookups.
    pub fn alias_key(&self) -> (String, String) {
        (
            normalize_alias(&self.analysis_alias),
            normalize_alias(&self.component_alias),
        )
    }
}

/// Aliases are customer free text; compare them trimmed and case-insensitively.
pub fn normalize_alias(raw: &str) -> String {
    raw.trim().to_uppercase()
}

impl FieldAccess for RequestedItem {
    fn record_name(&self) -> &'static str {
        "ITEM"
    }

    fn get_field(&self, name: &str) -> Result<Option<String>, FieldError> {
        match normalize_field_name(name).as_str() {
            "ANALYSIS_ALIAS" | "ANALYSIS" => Ok(Some(self.analysis_alias.clone())),
            "COMPONENT_ALIAS" | "COMPONENT" => Ok(Some(self.component_alias.clone())),
            other => Err(FieldError::unknown(self.record_name(), other)),
        }
    }

    fn set_field(&mut self, name: &str, _value: &str) -> Result<(), FieldError> {
        Err(FieldError::read_only(
            self.record_name(),
            &normalize_field_name(name),
        ))
    }
}

/// A customer-submitted sample header.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExternalRequest {
    pub id: RequestId,
    #[serde(default)]
    pub customer_id: String,
    #[serde(default)]
    pub selected_customer: Option<String>,
    #[serde(default)]
    pub transaction_id: String,
    #[serde(default)]
    pub items: Vec<RequestedItem>,
    #[serde(default)]
    pub fields: FieldSet,
    #[serde(default)]
    pub converted: bool,
}

impl ExternalRequest {
    /// Non-blank "selected customer" override.
    pub fn selected_customer(&self) -> Option<&str> {
        self.selected_customer
            .as_deref()
            .map(str::trim)
            .filter(|value| !value.is_empty())
    }

    /// Declared customer id, trimmed.
    pub fn declared_customer(&self) -> &str {
        self.customer_id.trim()
    }

    /// A request with no transaction id and nothing requested cannot be correlated.
    pub fn is_degenerate(&self) -> bool {
        self.transaction_id.trim().is_empty() && self.items.iter().all(RequestedItem::is_blank)
    }

    /// Requested items with at least one alias filled in.
    pub fn active_items(&self) -> impl Iterator<Item = &RequestedItem> {
        self.items.iter().filter(|item| !item.is_blank())
    }
}

impl FieldAccess for ExternalRequest {
    fn record_name(&self) -> &'static str {
        "REQUEST"
    }

    fn get_field(&self, name: &str) -> Result<Option<String>, FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "ID" => Ok(Some(self.id.to_string())),
            CUSTOMER_ID_FIELD => Ok(Some(self.customer_id.clone())),
            "SELECTED_CUSTOMER" => Ok(self.selected_customer.clone()),
            "TRANSACTION_ID" => Ok(Some(self.transaction_id.clone())),
            _ => self
                .fields
                .get(&name)
                .map(|value| Some(value.to_string()))
                .ok_or_else(|| FieldError::unknown(self.record_name(), &name)),
        }
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "ID" | CUSTOMER_ID_FIELD | "SELECTED_CUSTOMER" | "TRANSACTION_ID" => {
                Err(FieldError::read_only(self.record_name(), &name))
            }
            _ => {
                self.fields.set(&name, value);
                Ok(())
            }
        }
    }
}

/// Lifecycle status of a sample.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SampleStatus {
    #[default]
    Unreceived,
    Available,
    InProgress,
    Complete,
    Authorised,
    Rejected,
    Cancelled,
}

impl SampleStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            SampleStatus::Unreceived => "UNRECEIVED",
            SampleStatus::Available => "AVAILABLE",
            SampleStatus::InProgress => "IN_PROGRESS",
            SampleStatus::Complete => "COMPLETE",
            SampleStatus::Authorised => "AUTHORISED",
            SampleStatus::Rejected => "REJECTED",
            SampleStatus::Cancelled => "CANCELLED",
        }
    }

    /// Only approved samples are reported back to customers.
    pub fn is_reportable(self) -> bool {
        matches!(self, SampleStatus::Authorised)
    }
}

impl fmt::Display for SampleStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleStatus {
    type Err = ModelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace(' ', "_").as_str() {
            "U" | "UNRECEIVED" => Ok(SampleStatus::Unreceived),
            "V" | "AVAILABLE" => Ok(SampleStatus::Available),
            "P" | "IN_PROGRESS" => Ok(SampleStatus::InProgress),
            "C" | "COMPLETE" => Ok(SampleStatus::Complete),
            "A" | "AUTHORISED" | "AUTHORIZED" => Ok(SampleStatus::Authorised),
            "R" | "REJECTED" => Ok(SampleStatus::Rejected),
            "X" | "CANCELLED" => Ok(SampleStatus::Cancelled),
            _ => Err(ModelError::UnknownStatus(s.to_string())),
        }
    }
}

/// One reportable component value on a test.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LabResult {
    pub name: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub out_of_range: bool,
    #[serde(default)]
    pub fields: FieldSet,
}

impl LabResult {
    pub fn new(name: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            ..Self::default()
        }
    }

    pub fn out_of_range(mut self) -> Self {
        self.out_of_range = true;
        self
    }
}

impl FieldAccess for LabResult {
    fn record_name(&self) -> &'static str {
        "RESULT"
    }

    fn get_field(&self, name: &str) -> Result<Option<String>, FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "NAME" => Ok(Some(self.name.clone())),
            TEXT_FIELD => Ok(Some(self.text.clone())),
            "OUT_OF_RANGE" => Ok(Some(yes_no(self.out_of_range).to_string())),
            _ => self
                .fields
                .get(&name)
                .map(|value| Some(value.to_string()))
                .ok_or_else(|| FieldError::unknown(self.record_name(), &name)),
        }
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "NAME" => Err(FieldError::read_only(self.record_name(), &name)),
            TEXT_FIELD => {
                self.text = value.to_string();
                Ok(())
            }
            "OUT_OF_RANGE" => {
                self.out_of_range = parse_flag(value)
                    .ok_or_else(|| FieldError::invalid(self.record_name(), &name, value))?;
                Ok(())
            }
            _ => {
                self.fields.set(&name, value);
                Ok(())
            }
        }
    }
}

/// One analysis run on a sample.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Test {
    pub number: TestNumber,
    pub analysis: String,
    #[serde(default = "default_replicate")]
    pub replicate: u32,
    #[serde(default)]
    pub component_list: Option<String>,
    #[serde(default)]
    pub results: Vec<LabResult>,
    #[serde(default)]
    pub fields: FieldSet,
}

fn default_replicate() -> u32 {
    1
}

impl Test {
    pub fn new(number: TestNumber, analysis: impl Into<String>) -> Self {
        Self {
            number,
            analysis: analysis.into(),
            replicate: 1,
            ..Self::default()
        }
    }

    pub fn with_result(mut self, result: LabResult) -> Self {
        self.results.push(result);
        self
    }

    pub fn result(&self, name: &str) -> Option<&LabResult> {
        self.results.iter().find(|result| result.name == name)
    }
}

impl FieldAccess for Test {
    fn record_name(&self) -> &'static str {
        "TEST"
    }

    fn get_field(&self, name: &str) -> Result<Option<String>, FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "TEST_NUMBER" => Ok(Some(self.number.to_string())),
            "ANALYSIS" => Ok(Some(self.analysis.clone())),
            "REPLICATE" => Ok(Some(self.replicate.to_string())),
            "COMPONENT_LIST" => Ok(self.component_list.clone()),
            _ => self
                .fields
                .get(&name)
                .map(|value| Some(value.to_string()))
                .ok_or_else(|| FieldError::unknown(self.record_name(), &name)),
        }
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "TEST_NUMBER" | "ANALYSIS" => Err(FieldError::read_only(self.record_name(), &name)),
            "REPLICATE" => {
                self.replicate = value
                    .trim()
                    .parse()
                    .map_err(|_| FieldError::invalid(self.record_name(), &name, value))?;
                Ok(())
            }
            "COMPONENT_LIST" => {
                self.component_list = Some(value.to_string());
                Ok(())
            }
            _ => {
                self.fields.set(&name, value);
                Ok(())
            }
        }
    }
}

/// A physical sample owned by a job.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sample {
    pub id: SampleId,
    #[serde(default)]
    pub status: SampleStatus,
    /// Originating request, if the sample was created from one.
    #[serde(default)]
    pub request_id: Option<RequestId>,
    #[serde(default)]
    pub tests: Vec<Test>,
    #[serde(default)]
    pub fields: FieldSet,
}

impl Sample {
    pub fn new(id: SampleId) -> Self {
        Self {
            id,
            ..Self::default()
        }
    }

    pub fn with_status(mut self, status: SampleStatus) -> Self {
        self.status = status;
        self
    }

    pub fn with_request(mut self, request_id: RequestId) -> Self {
        self.request_id = Some(request_id);
        self
    }

    pub fn with_test(mut self, test: Test) -> Self {
        self.tests.push(test);
        self
    }

    pub fn test(&self, number: TestNumber) -> Option<&Test> {
        self.tests.iter().find(|test| test.number == number)
    }
}

impl FieldAccess for Sample {
    fn record_name(&self) -> &'static str {
        "SAMPLE"
    }

    fn get_field(&self, name: &str) -> Result<Option<String>, FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "ID_NUMERIC" => Ok(Some(self.id.to_string())),
            "STATUS" => Ok(Some(self.status.as_str().to_string())),
            "REQUEST_ID" => Ok(self.request_id.map(|id| id.to_string())),
            _ => self
                .fields
                .get(&name)
                .map(|value| Some(value.to_string()))
                .ok_or_else(|| FieldError::unknown(self.record_name(), &name)),
        }
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "ID_NUMERIC" | "REQUEST_ID" | CUSTOMER_ID_FIELD => {
                Err(FieldError::read_only(self.record_name(), &name))
            }
            "STATUS" => {
                self.status = value
                    .parse()
                    .map_err(|_| FieldError::invalid(self.record_name(), &name, value))?;
                Ok(())
            }
            _ => {
                self.fields.set(&name, value);
                Ok(())
            }
        }
    }
}

/// One customer's unit of lab work.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Job {
    pub name: String,
    pub customer_id: CustomerId,
    #[serde(default)]
    pub samples: Vec<Sample>,
    #[serde(default)]
    pub fields: FieldSet,
}

impl Job {
    pub fn new(name: impl Into<String>, customer_id: CustomerId) -> Self {
        Self {
            name: name.into(),
            customer_id,
            samples: Vec::new(),
            fields: FieldSet::new(),
        }
    }

    pub fn sample(&self, id: SampleId) -> Option<&Sample> {
        self.samples.iter().find(|sample| sample.id == id)
    }

    pub fn test_count(&self) -> usize {
        self.samples.iter().map(|sample| sample.tests.len()).sum()
    }
}

impl FieldAccess for Job {
    fn record_name(&self) -> &'static str {
        "JOB"
    }

    fn get_field(&self, name: &str) -> Result<Option<String>, FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "NAME" | "JOB_NAME" => Ok(Some(self.name.clone())),
            CUSTOMER_ID_FIELD => Ok(Some(self.customer_id.to_string())),
            _ => self
                .fields
                .get(&name)
                .map(|value| Some(value.to_string()))
                .ok_or_else(|| FieldError::unknown(self.record_name(), &name)),
        }
    }

    fn set_field(&mut self, name: &str, value: &str) -> Result<(), FieldError> {
        let name = normalize_field_name(name);
        match name.as_str() {
            "NAME" | "JOB_NAME" | CUSTOMER_ID_FIELD => {
                Err(FieldError::read_only(self.record_name(), &name))
            }
            _ => {
                self.fields.set(&name, value);
                Ok(())
            }
        }
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag { "T" } else { "F" }
}

fn parse_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_uppercase().as_str() {
        "T" | "TRUE" | "Y" | "YES" | "1" => Some(true),
        "F" | "FALSE" | "N" | "NO" | "0" => Some(false),
        _ => None,
    }
}
