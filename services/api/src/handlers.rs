//! Axum Handlers
//!
//! The ephemeral-session endpoint: preflight short-circuit, secret check,
//! body reconciliation, and the upstream relay call.

use axum::{
    extract::State,
    http::{HeaderName, HeaderValue, Method, StatusCode, header},
    response::{IntoResponse, Json, Response},
};
use bytes::Bytes;
use immersion_core::{BodyError, InboundSessionRequest, OutboundSessionConfig, parse_body};
use serde::Serialize;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use crate::{relay::RelayError, state::AppState};

/// Marks which build of the mediator answered a successful request.
pub const VERSION_HEADER: HeaderName = HeaderName::from_static("x-immersion-version");

pub const MISSING_API_KEY_MESSAGE: &str = "Missing OPENAI_API_KEY";

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub error: String,
}

pub enum ApiError {
    /// No upstream secret is configured for this deployment.
    MissingApiKey,
    /// The body was not JSON and the reject policy is active.
    InvalidBody(BodyError),
    /// The upstream call never produced a response.
    Upstream(RelayError),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::MissingApiKey => {
                error!("Refusing session request: {}", MISSING_API_KEY_MESSAGE);
                (StatusCode::INTERNAL_SERVER_ERROR, MISSING_API_KEY_MESSAGE).into_response()
            }
            ApiError::InvalidBody(err) => {
                warn!(error = %err, "Rejecting malformed session request body");
                (
                    StatusCode::BAD_REQUEST,
                    Json(ErrorResponse {
                        error: "invalid JSON body".to_string(),
                    }),
                )
                    .into_response()
            }
            ApiError::Upstream(err) => {
                error!(error = ?err, "Failed to create upstream session");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(ErrorResponse {
                        error: "failed to create session".to_string(),
                    }),
                )
                    .into_response()
            }
        }
    }
}

/// Issue an ephemeral realtime session for the browser client.
///
/// `OPTIONS` is answered with an empty 204. Every other method is treated
/// as a session request.
pub async fn ephemeral_session(
    State(state): State<Arc<AppState>>,
    method: Method,
    body: Bytes,
) -> Result<Response, ApiError> {
    if method == Method::OPTIONS {
        return Ok(StatusCode::NO_CONTENT.into_response());
    }

    let relay = state.relay.as_ref().ok_or(ApiError::MissingApiKey)?;

    let body = parse_body(&body, state.body_policy).map_err(ApiError::InvalidBody)?;
    let request = InboundSessionRequest::new(&body);
    if let Some(user_id) = request.user_id() {
        debug!(user_id, "Session requested");
    }
    let config = OutboundSessionConfig::from(request);

    let upstream = relay
        .create_session(&config)
        .await
        .map_err(ApiError::Upstream)?;
    info!(status = %upstream.status, voice = %config.voice, "Upstream session response relayed");

    let mut response = Response::new(upstream.body);
    *response.status_mut() = upstream.status;
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("application/json"),
    );
    headers.insert(VERSION_HEADER, state.version_tag.clone());

    Ok(response)
}
