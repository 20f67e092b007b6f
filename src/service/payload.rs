//! Field extraction over loosely-typed JSON request bodies.

use crate::service::error::ServiceError;
use serde_json::{Map, Value};

pub(crate) fn as_object(payload: &Value) -> Result<&Map<String, Value>, ServiceError> {
    payload
        .as_object()
        .ok_or_else(|| ServiceError::bad_request("request payload must be a JSON object"))
}

/// Present, a string, and non-empty after trimming.
pub(crate) fn required_string(
    payload: &Value,
    field_name: &'static str,
) -> Result<String, ServiceError> {
    match optional_string(payload, field_name)? {
        Some(value) if !value.is_empty() => Ok(value),
        _ => Err(ServiceError::bad_request(format!(
            "missing required field `{field_name}`"
        ))),
    }
}

/// Trimmed string value, `None` when absent or null.
pub(crate) fn optional_string(
    payload: &Value,
    field_name: &'static str,
) -> Result<Option<String>, ServiceError> {
    match as_object(payload)?.get(field_name) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(value)) => Ok(Some(value.trim().to_string())),
        Some(_) => Err(ServiceError::bad_request(format!(
            "field `{field_name}` must be a string"
        ))),
    }
}

/// Raw string value without trimming (passwords).
pub(crate) fn required_raw_string(
    payload: &Value,
    field_name: &'static str,
) -> Result<String, ServiceError> {
    match as_object(payload)?.get(field_name) {
        Some(Value::String(value)) if !value.is_empty() => Ok(value.clone()),
        Some(Value::String(_)) | None | Some(Value::Null) => Err(ServiceError::bad_request(
            format!("missing required field `{field_name}`"),
        )),
        Some(_) => Err(ServiceError::bad_request(format!(
            "field `{field_name}` must be a string"
        ))),
    }
}

pub(crate) fn optional_bool(
    payload: &Value,
    field_name: &'static str,
) -> Result<bool, ServiceError> {
    match as_object(payload)?.get(field_name) {
        None | Some(Value::Null) => Ok(false),
        Some(Value::Bool(value)) => Ok(*value),
        Some(_) => Err(ServiceError::bad_request(format!(
            "field `{field_name}` must be a boolean"
        ))),
    }
}

pub(crate) fn required_positive_i64(
    payload: &Value,
    field_name: &'static str,
) -> Result<i64, ServiceError> {
    let value = as_object(payload)?.get(field_name);
    let number = match value {
        None | Some(Value::Null) => {
            return Err(ServiceError::bad_request(format!(
                "missing required field `{field_name}`"
            )));
        }
        Some(Value::Number(number)) => number.as_i64(),
        Some(_) => None,
    };

    match number {
        Some(number) if number > 0 => Ok(number),
        _ => Err(ServiceError::bad_request(format!(
            "field `{field_name}` must be a positive integer"
        ))),
    }
}
