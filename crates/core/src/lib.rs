//! Immersion Core
//!
//! Pure, I/O-free logic for turning a browser's loosely-typed session request
//! into the session configuration sent to the realtime voice API.

pub mod body;
pub mod session_config;

pub use body::{BodyError, BodyPolicy, parse_body};
pub use session_config::{InboundSessionRequest, OutboundSessionConfig, TurnDetection, normalize};
