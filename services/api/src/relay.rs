//! Upstream Relay
//!
//! Performs the single outbound session-creation call against the realtime
//! voice API and hands the upstream status and body back for forwarding.

use async_trait::async_trait;
use axum::{body::Body, http::StatusCode};
use futures_util::TryStreamExt;
use immersion_core::OutboundSessionConfig;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, warn};

/// Errors raised while talking to the upstream API.
#[derive(Debug, thiserror::Error)]
pub enum RelayError {
    #[error("failed to build upstream HTTP client: {0}")]
    Client(#[source] reqwest::Error),
    #[error("upstream request failed: {0}")]
    Transport(#[from] reqwest::Error),
}

/// What came back from upstream: its status and its (possibly streaming) body.
pub struct UpstreamResponse {
    pub status: StatusCode,
    pub body: Body,
}

/// Issues ephemeral sessions against the upstream voice API.
///
/// Implementations make exactly one attempt per call and never reinterpret
/// upstream application errors; a 4xx/5xx from upstream is an `Ok` response.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SessionRelay: Send + Sync {
    async fn create_session(
        &self,
        config: &OutboundSessionConfig,
    ) -> Result<UpstreamResponse, RelayError>;
}

/// `SessionRelay` backed by the OpenAI realtime sessions endpoint.
pub struct OpenAIRealtimeRelay {
    client: reqwest::Client,
    url: String,
    api_key: SecretString,
}

impl OpenAIRealtimeRelay {
    /// Creates a relay for the given endpoint.
    ///
    /// # Arguments
    ///
    /// * `api_key` - The server-held secret sent as a bearer token.
    /// * `url` - The session-creation endpoint to POST to.
    /// * `timeout` - Optional overall request timeout. `None` means no timeout.
    pub fn new(
        api_key: SecretString,
        url: impl Into<String>,
        timeout: Option<Duration>,
    ) -> Result<Self, RelayError> {
        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder.build().map_err(RelayError::Client)?;

        Ok(Self {
            client,
            url: url.into(),
            api_key,
        })
    }
}

#[async_trait]
impl SessionRelay for OpenAIRealtimeRelay {
    async fn create_session(
        &self,
        config: &OutboundSessionConfig,
    ) -> Result<UpstreamResponse, RelayError> {
        let response = self
            .client
            .post(&self.url)
            .bearer_auth(self.api_key.expose_secret())
            .json(config)
            .send()
            .await?;

        let status = response.status();
        debug!(%status, "Upstream session endpoint responded");

        let stream = response
            .bytes_stream()
            .inspect_err(|e| warn!(error = %e, "Upstream body stream failed mid-response"));

        Ok(UpstreamResponse {
            status,
            body: Body::from_stream(stream),
        })
    }
}
