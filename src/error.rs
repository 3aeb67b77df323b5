use std::fmt::{Display, Formatter};

use serde::Deserialize;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, Error>;

/// Failures of a single round trip to the election service.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Http(#[from] reqwest::Error),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
    #[error("Service responded {status}: {}", message.as_deref().unwrap_or("no message"))]
    Status {
        status: u16,
        message: Option<String>,
    },
    #[error("Transport failure: {0}")]
    Transport(String),
    #[error("Invalid base URL: {0}")]
    InvalidBaseUrl(String),
}

impl Error {
    /// Build a status error from a non-success response, pulling the
    /// human-readable `message` out of the body if the service sent one.
    pub fn from_response(status: u16, body: &[u8]) -> Self {
        #[derive(Deserialize)]
        struct ErrorBody {
            message: Option<String>,
        }

        let message = serde_json::from_slice::<ErrorBody>(body)
            .ok()
            .and_then(|body| body.message)
            .filter(|message| !message.trim().is_empty());
        Self::Status { status, message }
    }

    /// The message the service supplied for this failure, if any.
    pub fn service_message(&self) -> Option<&str> {
        match self {
            Self::Status {
                message: Some(message),
                ..
            } => Some(message),
            _ => None,
        }
    }
}

/// The user-facing actions that can fail against the service.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub enum Action {
    ListElections,
    LoadElection,
    LoadResults,
    CreateElection,
    UpdateElection,
    DeleteElection,
    Vote,
    Login,
}

impl Action {
    /// Title of the notice shown when this action fails.
    pub fn title(&self) -> &'static str {
        match self {
            Self::ListElections => "Load Elections",
            Self::LoadElection => "Load Election",
            Self::LoadResults => "Live Results",
            Self::CreateElection => "Create Election",
            Self::UpdateElection => "Update Election",
            Self::DeleteElection => "Delete Election",
            Self::Vote => "Vote",
            Self::Login => "Login Failed",
        }
    }

    /// Message shown when the service gave no reason of its own.
    pub fn fallback_message(&self) -> &'static str {
        match self {
            Self::ListElections => "Failed to load elections",
            Self::LoadElection => "Failed to load election",
            Self::LoadResults => "Failed to load live results",
            Self::CreateElection | Self::UpdateElection => "Failed",
            Self::DeleteElection => "Delete failed",
            Self::Vote => "Voting failed",
            Self::Login => "Something went wrong",
        }
    }
}

impl Display for Action {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.title())
    }
}

/// A blocking notice describing a failed request. The state machine that
/// produced it has already returned to its pre-action state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{action}: {message}")]
pub struct RequestFailure {
    pub action: Action,
    pub message: String,
}

impl RequestFailure {
    pub fn new(action: Action, error: &Error) -> Self {
        let message = error
            .service_message()
            .unwrap_or_else(|| action.fallback_message())
            .to_string();
        Self { action, message }
    }
}
