//! Inbound request feeds.
//!
//! Requests arrive either as a JSON array of [`ExternalRequest`] records or as
//! a CSV file with one row per requested item. CSV rows sharing a transaction
//! id form one request; columns other than the reserved ones become request
//! fields, first non-empty value wins.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use csv::{ReaderBuilder, Trim};
use tracing::debug;

use labx_model::{ExternalRequest, RequestId, RequestedItem, normalize_field_name};

const REQUEST_ID: &str = "REQUEST_ID";
const CUSTOMER_ID: &str = "CUSTOMER_ID";
const SELECTED_CUSTOMER: &str = "SELECTED_CUSTOMER";
const TRANSACTION_ID: &str = "TRANSACTION_ID";
const ANALYSIS_ALIAS: &str = "ANALYSIS_ALIAS";
const COMPONENT_ALIAS: &str = "COMPONENT_ALIAS";

const RESERVED_COLUMNS: [&str; 6] = [
    REQUEST_ID,
    CUSTOMER_ID,
    SELECTED_CUSTOMER,
    TRANSACTION_ID,
    ANALYSIS_ALIAS,
    COMPONENT_ALIAS,
];

/// Read a request feed, choosing the format from the file extension.
pub fn read_requests(path: &Path) -> Result<Vec<ExternalRequest>> {
    let extension = path
        .extension()
        .and_then(|ext| ext.to_str())
        .map(str::to_ascii_lowercase);
    match extension.as_deref() {
        Some("json") => read_requests_json(path),
        Some("csv") => read_requests_csv(path),
        _ => bail!("unsupported request feed: {}", path.display()),
    }
}

pub fn read_requests_json(path: &Path) -> Result<Vec<ExternalRequest>> {
    let contents =
        fs::read_to_string(path).with_context(|| format!("read requests: {}", path.display()))?;
    let requests: Vec<ExternalRequest> = serde_json::from_str(&contents)
        .with_context(|| format!("parse requests: {}", path.display()))?;
    debug!(path = %path.display(), count = requests.len(), "loaded request feed");
    Ok(requests)
}

pub fn read_requests_csv(path: &Path) -> Result<Vec<ExternalRequest>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .trim(Trim::All)
        .from_path(path)
        .with_context(|| format!("read csv: {}", path.display()))?;
    let headers: Vec<String> = reader
        .headers()
        .with_context(|| format!("read headers: {}", path.display()))?
        .iter()
        .map(|header| normalize_field_name(header.trim_matches('\u{feff}')))
        .collect();
    let column = |name: &str| headers.iter().position(|header| header == name);
    let request_col = column(REQUEST_ID);
    let customer_col = column(CUSTOMER_ID);
    let selected_col = column(SELECTED_CUSTOMER);
    let transaction_col = column(TRANSACTION_ID);
    let analysis_col = column(ANALYSIS_ALIAS);
    let component_col = column(COMPONENT_ALIAS);

    let mut requests: Vec<ExternalRequest> = Vec::new();
    let mut next_id: RequestId = 1;
    for (line, record) in reader.records().enumerate() {
        let record = record.with_context(|| format!("read record: {}", path.display()))?;
        let cell = |idx: Option<usize>| {
            idx.and_then(|idx| record.get(idx))
                .unwrap_or("")
                .to_string()
        };
        if record.iter().all(|value| value.is_empty()) {
            continue;
        }

        let transaction_id = cell(transaction_col);
        let existing = if transaction_id.is_empty() {
            None
        } else {
            requests
                .iter()
                .position(|request| request.transaction_id == transaction_id)
        };
        let idx = match existing {
            Some(idx) => idx,
            None => {
                let id = match request_col.and_then(|idx| record.get(idx)) {
                    Some(raw) if !raw.is_empty() => raw.parse::<RequestId>().with_context(|| {
                        format!("invalid {REQUEST_ID} {raw:?} on row {}", line + 2)
                    })?,
                    _ => next_id,
                };
                next_id = next_id.max(id).checked_add(1).with_context(|| {
                    format!("{REQUEST_ID} {id} on row {} leaves no id for the next request", line + 2)
                })?;
                let selected = cell(selected_col);
                requests.push(ExternalRequest {
                    id,
                    customer_id: cell(customer_col),
                    selected_customer: (!selected.is_empty()).then_some(selected),
                    transaction_id,
                    ..ExternalRequest::default()
                });
                requests.len() - 1
            }
        };

        let request = &mut requests[idx];
        let item = RequestedItem::new(cell(analysis_col), cell(component_col));
        if !item.is_blank() {
            request.items.push(item);
        }
        for (header, value) in headers.iter().zip(record.iter()) {
            if value.is_empty() || RESERVED_COLUMNS.contains(&header.as_str()) {
                continue;
            }
            request.fields.insert_if_absent(header, value);
        }
    }
    debug!(path = %path.display(), count = requests.len(), "loaded request feed");
    Ok(requests)
}
