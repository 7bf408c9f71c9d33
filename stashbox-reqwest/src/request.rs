use async_trait::async_trait;
use reqwest::{RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use stashbox::{Remote, RemoteError};
use tracing::debug;

use crate::parse_retry_after;

/// Sends a request as a stashbox remote call.
#[async_trait]
pub trait RemoteRequest {
    /// Sends the request and decodes a successful JSON body into `T`.
    ///
    /// See the [crate docs](crate) for how responses are classified.
    async fn send_json<T>(self) -> Result<Remote<T>, RemoteError>
    where
        T: DeserializeOwned + Send;
}

#[async_trait]
impl RemoteRequest for RequestBuilder {
    async fn send_json<T>(self) -> Result<Remote<T>, RemoteError>
    where
        T: DeserializeOwned + Send,
    {
        let response = self
            .send()
            .await
            .map_err(|e| RemoteError::failed(None, e.to_string()))?;
        classify_response(response).await
    }
}

/// Classifies an already received response.
///
/// Useful when the request is sent through something other than a plain
/// [`RequestBuilder`], such as a middleware client.
pub async fn classify_response<T>(response: Response) -> Result<Remote<T>, RemoteError>
where
    T: DeserializeOwned,
{
    let status = response.status();
    let retry_after = parse_retry_after(response.headers());

    if status == StatusCode::TOO_MANY_REQUESTS {
        debug!(url = %response.url(), ?retry_after, "remote rate limited");
        return Err(RemoteError::RateLimited { retry_after });
    }

    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        let message = match body.trim() {
            "" => status
                .canonical_reason()
                .unwrap_or("request failed")
                .to_string(),
            text => text.to_string(),
        };
        return Err(RemoteError::failed(Some(status.as_u16()), message));
    }

    let value = response
        .json::<T>()
        .await
        .map_err(|e| RemoteError::failed(None, format!("invalid response body: {e}")))?;

    Ok(Remote { value, retry_after })
}
