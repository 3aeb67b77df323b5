//! Client core for the election service: a typed repository client, the
//! screen state machines that drive it, and the session they run under.

pub mod api;
pub mod config;
pub mod error;
pub mod logging;
pub mod model;
pub mod screen;
pub mod session;

pub use api::{ElectionClient, HttpTransport};
pub use config::Config;
pub use error::{Error, RequestFailure, Result};
pub use session::Session;

/// Build an HTTP-backed client from configuration.
pub fn connect(config: &Config) -> Result<ElectionClient<HttpTransport>> {
    Ok(ElectionClient::new(HttpTransport::new(config)?))
}
