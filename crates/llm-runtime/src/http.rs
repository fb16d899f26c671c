//! Shared HTTP transport
//!
//! Every call races the caller's cancellation token, so an in-flight
//! request is abandoned as soon as the token fires.

use std::future::Future;

use llm_core::{LlmError, Options, Result};
use reqwest::{RequestBuilder, Response};
use serde::de::DeserializeOwned;

/// Run `future` unless the options' token fires first
pub(crate) async fn cancellable<T>(
    options: &Options,
    future: impl Future<Output = Result<T>>,
) -> Result<T> {
    match &options.cancel {
        Some(token) => tokio::select! {
            biased;
            () = token.cancelled() => Err(LlmError::Cancelled),
            result = future => result,
        },
        None => future.await,
    }
}

/// Send the request and fail on any non-success status
pub(crate) async fn send(request: RequestBuilder, options: &Options) -> Result<Response> {
    let request = request.timeout(options.timeout());
    cancellable(options, async move {
        let response = request.send().await.map_err(transport_error)?;
        check_status(response).await
    })
    .await
}

/// Send the request and decode a JSON body
pub(crate) async fn post_json<T: DeserializeOwned>(
    request: RequestBuilder,
    options: &Options,
) -> Result<T> {
    let response = send(request, options).await?;
    let body = cancellable(options, async move {
        response.bytes().await.map_err(transport_error)
    })
    .await?;

    serde_json::from_slice(&body)
        .map_err(|e| LlmError::Protocol(format!("failed to decode body: {e}")))
}

async fn check_status(response: Response) -> Result<Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    tracing::debug!(status = %status, "backend rejected request");
    Err(LlmError::http_status(
        status.as_u16(),
        format!("API request failed with status {status}: {body}"),
    ))
}

fn transport_error(err: reqwest::Error) -> LlmError {
    if err.is_timeout() {
        LlmError::transport(format!("request timed out: {err}"))
    } else {
        LlmError::transport(format!("failed to send request: {err}"))
    }
}
