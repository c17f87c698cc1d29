//! HTTP plumbing shared by the provider clients
//!
//! Every provider call is a single request/response exchange raced against
//! the run's cancellation token.

use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use std::future::Future;
use std::time::Duration;
use tokio_util::sync::CancellationToken;

use crate::error::ClientError;

const USER_AGENT: &str = concat!("openresearch/", env!("CARGO_PKG_VERSION"));

/// Build a [`reqwest::Client`] whose requests give up after `timeout`.
pub fn build_client(timeout: Duration) -> Result<Client, ClientError> {
    Client::builder()
        .timeout(timeout)
        .user_agent(USER_AGENT)
        .build()
        .map_err(|e| ClientError::Http(format!("failed to build HTTP client: {e}")))
}

/// Send `request` and decode a JSON body of type `T`.
///
/// Returns [`ClientError::Cancelled`] if `cancel` fires before the exchange
/// completes (including before it starts); the in-flight request is dropped.
pub async fn send_json<T: DeserializeOwned>(
    request: RequestBuilder,
    cancel: &CancellationToken,
) -> Result<T, ClientError> {
    race(cancel, async {
        let bytes = checked(request).await?.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Malformed(e.to_string()))
    })
    .await
}

/// Send `request` and return the raw body, refusing bodies over `max_bytes`.
pub async fn send_bytes(
    request: RequestBuilder,
    cancel: &CancellationToken,
    max_bytes: usize,
) -> Result<Vec<u8>, ClientError> {
    race(cancel, async {
        let response = checked(request).await?;
        if response.content_length().is_some_and(|len| len > max_bytes as u64) {
            return Err(ClientError::Malformed(format!("body exceeds {max_bytes} bytes")));
        }
        let bytes = response.bytes().await?;
        if bytes.len() > max_bytes {
            return Err(ClientError::Malformed(format!("body exceeds {max_bytes} bytes")));
        }
        Ok(bytes.to_vec())
    })
    .await
}

async fn race<T>(
    cancel: &CancellationToken,
    exchange: impl Future<Output = Result<T, ClientError>>,
) -> Result<T, ClientError> {
    if cancel.is_cancelled() {
        return Err(ClientError::Cancelled);
    }

    tokio::select! {
        biased;
        () = cancel.cancelled() => Err(ClientError::Cancelled),
        outcome = exchange => outcome,
    }
}

/// Send and turn a non-success status into [`ClientError::Status`].
async fn checked(request: RequestBuilder) -> Result<Response, ClientError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());
        return Err(ClientError::status(status, &body));
    }
    Ok(response)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn build_client_succeeds() {
        assert!(build_client(Duration::from_secs(5)).is_ok());
    }

    #[test]
    fn user_agent_names_the_crate() {
        assert!(USER_AGENT.starts_with("openresearch/"));
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits() {
        let client = build_client(Duration::from_secs(1)).expect("client");
        let cancel = CancellationToken::new();
        cancel.cancel();

        // Port 9 (discard) is never contacted because the token already fired.
        let request = client.get("http://127.0.0.1:9/never");
        let outcome: Result<serde_json::Value, _> = send_json(request, &cancel).await;
        assert_eq!(outcome.unwrap_err(), ClientError::Cancelled);
    }

    #[tokio::test]
    async fn pre_cancelled_token_short_circuits_byte_fetch() {
        let client = build_client(Duration::from_secs(1)).expect("client");
        let cancel = CancellationToken::new();
        cancel.cancel();

        let request = client.get("http://127.0.0.1:9/never.png");
        let outcome = send_bytes(request, &cancel, 1024).await;
        assert_eq!(outcome.unwrap_err(), ClientError::Cancelled);
    }
}
