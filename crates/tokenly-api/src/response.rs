//! Turning a raw response into a JSON value or an [`ApiError`]

use serde_json::Value;
use tokenly_auth::is_empty_params;
use tracing::warn;

use crate::error::{is_bad_status, ApiError, ApiResult, DEFAULT_ERROR_CODE};
use crate::transport::TransportResponse;

/// Parse and check a response
///
/// Body errors are looked for under `error`, then `errors` (preferring a
/// sibling `message`). A 4xx/5xx status always fails and its code replaces
/// the default code even when the body supplied the message.
pub fn normalize(response: &TransportResponse) -> ApiResult<Value> {
    let json: Value =
        serde_json::from_str(&response.body).map_err(|_| ApiError::unexpected_response())?;

    let mut message = body_error_message(&json);
    let mut code = DEFAULT_ERROR_CODE;

    if is_bad_status(response.status_code) {
        warn!(status_code = response.status_code, "Received bad status code");
        message.get_or_insert_with(|| {
            format!("Received bad status code: {}", response.status_code)
        });
        code = response.status_code;
    }

    match message {
        Some(message) => Err(ApiError::Api { message, code }),
        None => Ok(json),
    }
}

/// Error message carried in the body, if any
fn body_error_message(json: &Value) -> Option<String> {
    if is_empty_params(json) {
        return None;
    }
    let object = json.as_object()?;

    if let Some(error) = object.get("error").filter(|v| !v.is_null()) {
        return Some(render(error));
    }

    let errors = object.get("errors").filter(|v| !v.is_null())?;
    if let Some(message) = object.get("message").filter(|v| !v.is_null()) {
        return Some(render(message));
    }

    Some(match errors {
        Value::Array(items) => items.iter().map(render).collect::<Vec<_>>().join(", "),
        // Keyed errors join their values in document order
        Value::Object(map) => map.values().map(render).collect::<Vec<_>>().join(", "),
        other => render(other),
    })
}

fn render(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
