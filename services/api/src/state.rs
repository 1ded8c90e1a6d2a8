//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds the resources every
//! request needs. Nothing in it changes after startup.

use crate::{
    config::Config,
    relay::{OpenAIRealtimeRelay, RelayError, SessionRelay},
};
use axum::http::HeaderValue;
use immersion_core::BodyPolicy;
use std::sync::Arc;
use tracing::warn;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// `None` when no upstream secret was configured.
    pub relay: Option<Arc<dyn SessionRelay>>,
    pub body_policy: BodyPolicy,
    pub version_tag: HeaderValue,
}

impl AppState {
    /// Builds the state from startup configuration.
    ///
    /// The secret is moved into the relay here and is not reachable from
    /// anywhere else afterwards.
    pub fn from_config(config: Config) -> Result<Self, RelayError> {
        let relay = match config.openai_api_key {
            Some(api_key) => {
                let relay = OpenAIRealtimeRelay::new(
                    api_key,
                    config.upstream_sessions_url,
                    config.upstream_timeout,
                )?;
                Some(Arc::new(relay) as Arc<dyn SessionRelay>)
            }
            None => {
                warn!("OPENAI_API_KEY is not set; every session request will fail with 500");
                None
            }
        };

        Ok(Self {
            relay,
            body_policy: config.body_policy,
            version_tag: config.version_tag,
        })
    }
}
