//! Response decoding shared by every backend call.
//!
//! These functions take the HTTP status code and raw body, so the success and
//! error rules are testable without a socket:
//!
//! - non-2xx: message from `detail`, else `message`, else `HTTP error <status>`
//! - 2xx with a non-JSON body: transport failure
//! - 2xx: only `status == "success"` is a success

use serde_json::Value;

use crate::domain::{BrowserTable, Dataset, FitOutcome, FittingResponse, LoadedDataset, TableData};
use crate::gateway::GatewayError;
use crate::report::fit_summary;

const DATASET_FALLBACK: &str = "Failed to load dataset.";
const FIT_FALLBACK: &str = "Unknown error";
const TABLES_FALLBACK: &str = "Failed to load table list.";
const TABLE_DATA_FALLBACK: &str = "Failed to load table data.";

pub const INVALID_DATASET: &str = "Backend returned an invalid dataset payload.";
pub const DATASET_LOADED: &str = "Dataset loaded successfully.";

/// Decode `POST datasets/load`.
pub fn decode_dataset(status: u16, body: &[u8]) -> Result<LoadedDataset, GatewayError> {
    let body = success_body(status, body)?;
    if !is_success(&body) {
        return Err(GatewayError::Application(app_message(&body, DATASET_FALLBACK)));
    }

    let dataset = body
        .get("dataset")
        .filter(|d| d.is_object())
        .and_then(|d| serde_json::from_value::<Dataset>(d.clone()).ok())
        .ok_or_else(|| GatewayError::InvalidPayload(INVALID_DATASET.to_string()))?;

    let message = non_empty_str(&body, "summary").unwrap_or(DATASET_LOADED).to_string();
    Ok(LoadedDataset { dataset, message })
}

/// Decode `POST fitting/run`.
///
/// A 2xx answer whose `status` is not `"success"` is still returned as
/// `Ok`, with `succeeded == false` and the partial response attached.
pub fn decode_fit(status: u16, body: &[u8]) -> Result<FitOutcome, GatewayError> {
    let body = success_body(status, body)?;
    let response = fitting_response(&body);

    if !is_success(&body) {
        return Ok(FitOutcome {
            succeeded: false,
            message: app_message(&body, FIT_FALLBACK),
            response: Some(response),
        });
    }

    let message = match response.summary.as_deref() {
        Some(summary) => summary.to_string(),
        None => fit_summary(&response),
    };
    Ok(FitOutcome {
        succeeded: true,
        message,
        response: Some(response),
    })
}

/// Decode `GET browser/tables`.
pub fn decode_tables(status: u16, body: &[u8]) -> Result<Vec<BrowserTable>, GatewayError> {
    let body = success_body(status, body)?;
    if !is_success(&body) {
        return Err(GatewayError::Application(app_message(&body, TABLES_FALLBACK)));
    }
    body.get("tables")
        .filter(|t| t.is_array())
        .and_then(|t| serde_json::from_value::<Vec<BrowserTable>>(t.clone()).ok())
        .ok_or_else(|| GatewayError::InvalidPayload("Backend returned an invalid table list.".to_string()))
}

/// Decode `GET browser/data/<table>`.
///
/// This endpoint's body may omit `status`; only an explicit non-success
/// status is treated as a failure.
pub fn decode_table_data(table_name: &str, status: u16, body: &[u8]) -> Result<TableData, GatewayError> {
    let body = success_body(status, body)?;
    if body.get("status").is_some() && !is_success(&body) {
        return Err(GatewayError::Application(app_message(&body, TABLE_DATA_FALLBACK)));
    }

    let invalid = || GatewayError::InvalidPayload("Backend returned an invalid table payload.".to_string());

    let rows = match body.get("data") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| item.as_object().cloned())
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?,
        Some(Value::Null) | None => Vec::new(),
        Some(_) => return Err(invalid()),
    };

    let columns: Vec<String> = match body.get("columns") {
        Some(Value::Array(items)) => items
            .iter()
            .map(|c| c.as_str().map(str::to_string))
            .collect::<Option<Vec<_>>>()
            .ok_or_else(invalid)?,
        _ => rows.first().map(|r| r.keys().cloned().collect()).unwrap_or_default(),
    };

    let row_count = body
        .get("row_count")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(rows.len());
    let column_count = body
        .get("column_count")
        .and_then(Value::as_u64)
        .map(|n| n as usize)
        .unwrap_or(columns.len());
    let display_name = non_empty_str(&body, "display_name").unwrap_or(table_name).to_string();

    Ok(TableData {
        table_name: non_empty_str(&body, "table_name").unwrap_or(table_name).to_string(),
        display_name,
        columns,
        rows,
        row_count,
        column_count,
    })
}

/// Message for a non-2xx response: `detail`, then `message`, then a
/// generic line built from the status code.
pub fn extract_error_message(status: u16, body: Option<&Value>) -> String {
    body.and_then(|b| non_empty_str(b, "detail").or_else(|| non_empty_str(b, "message")))
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error {status}"))
}

fn success_body(status: u16, body: &[u8]) -> Result<Value, GatewayError> {
    if !(200..300).contains(&status) {
        let parsed = serde_json::from_slice::<Value>(body).ok();
        return Err(GatewayError::Http {
            status,
            message: extract_error_message(status, parsed.as_ref()),
        });
    }
    serde_json::from_slice::<Value>(body)
        .map_err(|e| GatewayError::Transport(format!("invalid JSON in response body: {e}")))
}

fn is_success(body: &Value) -> bool {
    body.get("status").and_then(Value::as_str) == Some("success")
}

fn app_message(body: &Value, fallback: &str) -> String {
    non_empty_str(body, "detail")
        .or_else(|| non_empty_str(body, "message"))
        .unwrap_or(fallback)
        .to_string()
}

fn non_empty_str<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str).filter(|s| !s.is_empty())
}

fn fitting_response(body: &Value) -> FittingResponse {
    let text = |key: &str| non_empty_str(body, key).map(str::to_string);
    FittingResponse {
        status: body.get("status").and_then(Value::as_str).map(str::to_string),
        summary: text("summary"),
        detail: text("detail"),
        message: text("message"),
        processed_rows: body.get("processed_rows").and_then(Value::as_f64),
        best_model_saved: body.get("best_model_saved").and_then(Value::as_bool),
        models: body.get("models").and_then(Value::as_array).map(|items| {
            items
                .iter()
                .filter_map(Value::as_str)
                .map(str::to_string)
                .collect()
        }),
    }
}
