//! User types

use crate::workout::Workout;
use crate::{require, MissingField};
use serde::{Deserialize, Serialize};

/// User account with the workouts it owns.
///
/// The password hash is never part of the wire form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(rename = "workout", default)]
    pub workouts: Vec<Workout>,
}

/// Username/password body used by registration and authentication
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CredentialsRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

// Keep plaintext passwords out of logs
impl std::fmt::Debug for Credentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

impl CredentialsRequest {
    pub fn validate(self) -> Result<Credentials, MissingField> {
        Ok(Credentials {
            username: require(self.username, "username")?,
            password: require(self.password, "password")?,
        })
    }
}
