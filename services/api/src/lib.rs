//! Immersion API Library Crate
//!
//! This library contains the HTTP side of the ephemeral-session mediator:
//! configuration, the upstream relay, handlers, and routing. The `api` binary
//! is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod relay;
pub mod router;
pub mod state;
