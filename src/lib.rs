//! A command-line client for the Marketo REST API.
//!
//! It authenticates with the OAuth client-credentials flow and reads,
//! writes and deletes leads and "snap" custom object records, plus
//! describes the remote schemas those records follow.
//!
//! - [`api`]: the client, its transport seam and response validation
//! - [`oauth`]: access token requests against the identity endpoint
//! - [`config`]: YAML configuration
//! - [`editor`]: editing that configuration in `$EDITOR`
//! - [`error`]: the crate-wide error type
//! - [`logging`]: the stderr `tracing` subscriber

pub mod api;
pub mod config;
pub mod editor;
pub mod error;
pub mod logging;
pub mod oauth;

pub use error::{Error, Result};
