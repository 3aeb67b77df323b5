use std::fmt::{Debug, Display, Formatter};

use serde::{Deserialize, Serialize};

/// Who is using the client. Fixed at login for the lifetime of the session.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// May browse elections and vote.
    Student,
    /// May browse, create, edit and delete elections and see live results.
    Admin,
}

impl Role {
    pub fn is_admin(&self) -> bool {
        matches!(self, Self::Admin)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Student => "student",
            Self::Admin => "admin",
        })
    }
}

/// Raw login credentials, as typed by the user.
#[derive(Clone, Deserialize, Serialize)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Both fields must be filled before a login is attempted.
    pub fn is_complete(&self) -> bool {
        !self.username.is_empty() && !self.password.is_empty()
    }
}

// Keep the password out of logs.
impl Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

#[cfg(test)]
mod examples {
    use super::*;

    impl Credentials {
        pub fn example_student() -> Self {
            Self::new("alice112", "dreip4lyfe")
        }

        pub fn example_admin() -> Self {
            Self::new("bobthesuperadmin", "totallysecurepassword")
        }
    }
}
