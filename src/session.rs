use std::fmt::{Debug, Formatter};

use log::{info, warn};
use serde_json::Value;
use thiserror::Error;

use crate::{
    api::AuthService,
    error::{Action, RequestFailure},
    model::{Credentials, Role},
};

/// Why a login did not produce a session.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LoginError {
    #[error("Please fill all fields")]
    MissingFields,
    #[error(transparent)]
    Request(#[from] RequestFailure),
}

/// The logged-in user, and the client that carries their credentials.
/// Created only by a successful login and ended by [`Session::logout`];
/// screens borrow it rather than reading ambient state.
///
/// The session owns its client because the client holds the login cookie.
/// Dropping the session drops the cookie with it.
pub struct Session<C> {
    client: C,
    role: Role,
    user: Value,
}

impl<C: AuthService> Session<C> {
    /// Log in with the role-specific endpoint. Incomplete credentials are
    /// refused without contacting the service. The client is consumed
    /// either way; a failed login leaves nothing authenticated behind.
    pub async fn login(
        client: C,
        role: Role,
        credentials: &Credentials,
    ) -> Result<Self, LoginError> {
        if !credentials.is_complete() {
            return Err(LoginError::MissingFields);
        }
        match client.login(role, credentials).await {
            Ok(user) => {
                info!("Logged in as {role} {}", credentials.username);
                Ok(Self { client, role, user })
            }
            Err(err) => {
                let failure = RequestFailure::new(Action::Login, &err);
                warn!("Login as {role} {} failed: {err}", credentials.username);
                Err(failure.into())
            }
        }
    }
}

impl<C> Session<C> {
    /// The authenticated client. Every call made through it acts as this
    /// session's user.
    pub fn client(&self) -> &C {
        &self.client
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn is_admin(&self) -> bool {
        self.role.is_admin()
    }

    /// The user payload returned by the service, uninterpreted.
    pub fn user(&self) -> &Value {
        &self.user
    }

    /// End the session. The client and its login cookie go with it.
    pub fn logout(self) {
        info!("Logged out {}", self.role);
    }
}

impl<C> Debug for Session<C> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("role", &self.role)
            .field("user", &self.user)
            .finish_non_exhaustive()
    }
}
