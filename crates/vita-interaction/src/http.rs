//! Shared HTTP plumbing for the hosted adapters.

use reqwest::{RequestBuilder, Response, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use vita_core::VitaError;

/// Sends `request` and decodes a JSON body, mapping every failure to
/// `VitaError::Provider` tagged with `provider`.
pub(crate) async fn send_json<T: DeserializeOwned>(
    provider: &'static str,
    request: RequestBuilder,
) -> Result<T, VitaError> {
    let response = request.send().await.map_err(|err| {
        VitaError::provider(provider, format!("request failed: {err}"))
    })?;

    let response = ensure_success(provider, response).await?;

    response
        .json::<T>()
        .await
        .map_err(|err| VitaError::provider(provider, format!("failed to parse response: {err}")))
}

async fn ensure_success(provider: &'static str, response: Response) -> Result<Response, VitaError> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body_text = response
        .text()
        .await
        .unwrap_or_else(|_| "failed to read error body".to_string());
    Err(map_http_error(provider, status, body_text))
}

#[derive(Deserialize)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize)]
struct ErrorBody {
    message: String,
}

/// Flat `{ "code", "message" }` body used by the vector database.
#[derive(Deserialize)]
struct FlatErrorResponse {
    message: String,
}

pub(crate) fn map_http_error(provider: &'static str, status: StatusCode, body: String) -> VitaError {
    let message = serde_json::from_str::<ErrorResponse>(&body)
        .map(|wrapper| wrapper.error.message)
        .or_else(|_| serde_json::from_str::<FlatErrorResponse>(&body).map(|flat| flat.message))
        .unwrap_or(body);

    let message = if message.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        message
    };

    tracing::warn!(provider, status = status.as_u16(), "provider returned an error status");
    VitaError::provider_status(provider, status.as_u16(), message)
}
