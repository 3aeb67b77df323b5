//! The election repository client: typed operations over a pluggable transport.

mod client;
mod service;
mod transport;

#[cfg(test)]
pub(crate) mod fake;

pub use client::ElectionClient;
pub use service::{AuthService, ElectionService};
pub use transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};
