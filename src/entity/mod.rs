//! Service-schema entities parsed from untrusted JSON.
//!
//! Entities are the internal, wire-shaped representation of service
//! responses, distinct from the public value objects in [`crate::types`].
//! Each parse either yields a fully-populated entity or fails on the first
//! violated rule with a [`SfsError::ServiceInvalidResponse`] naming the exact
//! field path. There is no partially-valid entity, ever.
//!
//! # Validation Flow
//!
//! 1. The response body is parsed as JSON
//! 2. The root shape is checked (object or array, per endpoint)
//! 3. Required fields are checked for presence, then for type
//! 4. Variant discrimination happens on key presence (`UpdateId` +
//!    `Prerequisites` for versions, `FileMoniker` for files)
//!
//! Unrecognized keys are ignored; unrecognized *values* inside recognized
//! keys (an unknown hash algorithm, say) are kept raw here and only rejected
//! at the public value-object conversion layer.

mod file;
mod version;

pub(crate) use file::{
    parse_file_entities, AppFileEntity, ApplicabilityEntity, DeliveryOptimizationEntity,
    FileEntity, GenericFileEntity,
};
pub(crate) use version::{
    parse_specific_version, parse_version_entities, ContentIdEntity, VersionEntity,
};

use serde_json::{Map, Value};

use crate::error::{Result, SfsError};

/// Parse a raw response body as JSON.
pub(crate) fn parse_json_body(body: &[u8]) -> Result<Value> {
    serde_json::from_slice(body).map_err(|err| {
        SfsError::ServiceInvalidResponse(format!("Response is not valid JSON: {err}"))
    })
}

/// Require the root of a response to be a JSON object.
pub(super) fn as_root_object(value: &Value) -> Result<&Map<String, Value>> {
    value.as_object().ok_or_else(|| {
        SfsError::ServiceInvalidResponse("Response is not a JSON object".to_string())
    })
}

/// Require the root of a response to be a JSON array.
pub(super) fn as_root_array(value: &Value) -> Result<&Vec<Value>> {
    value.as_array().ok_or_else(|| {
        SfsError::ServiceInvalidResponse("Response is not a JSON array".to_string())
    })
}

/// Fetch a required key, failing with `Missing {path} in response`.
pub(super) fn required<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Value> {
    object.get(key).ok_or_else(|| {
        SfsError::ServiceInvalidResponse(format!("Missing {path} in response"))
    })
}

/// Fetch a required string field.
pub(super) fn required_string(
    object: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<String> {
    let value = required(object, key, path)?;
    value
        .as_str()
        .map(str::to_string)
        .ok_or_else(|| SfsError::ServiceInvalidResponse(format!("{path} is not a string")))
}

/// Fetch a required object field.
pub(super) fn required_object<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Map<String, Value>> {
    let value = required(object, key, path)?;
    value
        .as_object()
        .ok_or_else(|| SfsError::ServiceInvalidResponse(format!("{path} is not a JSON object")))
}

/// Fetch a required array field.
pub(super) fn required_array<'a>(
    object: &'a Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<&'a Vec<Value>> {
    let value = required(object, key, path)?;
    value
        .as_array()
        .ok_or_else(|| SfsError::ServiceInvalidResponse(format!("{path} is not an array")))
}

/// Fetch a required unsigned integral field.
///
/// Negative and fractional numbers are rejected; the count must fit an
/// unsigned 64-bit value.
pub(super) fn required_u64(object: &Map<String, Value>, key: &str, path: &str) -> Result<u64> {
    let value = required(object, key, path)?;
    value.as_u64().ok_or_else(|| {
        SfsError::ServiceInvalidResponse(format!("{path} is not an unsigned integer"))
    })
}

/// Fetch a required array-of-strings field.
pub(super) fn required_string_array(
    object: &Map<String, Value>,
    key: &str,
    path: &str,
) -> Result<Vec<String>> {
    let array = required_array(object, key, path)?;
    let mut strings = Vec::with_capacity(array.len());
    for (index, element) in array.iter().enumerate() {
        let text = element.as_str().ok_or_else(|| {
            SfsError::ServiceInvalidResponse(format!("{path}[{index}] is not a string"))
        })?;
        strings.push(text.to_string());
    }
    Ok(strings)
}
