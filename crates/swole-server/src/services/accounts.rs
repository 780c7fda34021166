//! Account service: registration and one-shot password verification

use crate::storage::{is_unique_violation, Database};
use anyhow::{Context, Result};
use argon2::password_hash::SaltString;
use argon2::{Argon2, PasswordHash, PasswordHasher, PasswordVerifier};
use rand::rngs::OsRng;
use std::sync::Arc;
use tracing::info;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Registration {
    Created(i64),
    UsernameTaken,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verification {
    Verified,
    UnknownUser,
    WrongPassword,
}

pub struct AccountService {
    db: Arc<Database>,
    hasher: Argon2<'static>,
}

impl AccountService {
    pub fn new(db: Arc<Database>) -> Self {
        Self::with_hasher(db, Argon2::default())
    }

    pub fn with_hasher(db: Arc<Database>, hasher: Argon2<'static>) -> Self {
        Self { db, hasher }
    }

    pub async fn register(&self, username: &str, password: &str) -> Result<Registration> {
        if self.db.get_credentials(username).await?.is_some() {
            info!("Registration rejected, username taken: {}", username);
            return Ok(Registration::UsernameTaken);
        }

        let password_hash = self.hash(password).await?;

        match self.db.create_user(username, &password_hash).await {
            Ok(id) => {
                info!("Registered user {} ({})", id, username);
                Ok(Registration::Created(id))
            }
            // Lost a race with a concurrent registration
            Err(e) if is_unique_violation(&e) => Ok(Registration::UsernameTaken),
            Err(e) => Err(e.context("Failed to create user")),
        }
    }

    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Verification> {
        let Some((user_id, password_hash)) = self.db.get_credentials(username).await? else {
            info!("Verification failed, unknown user: {}", username);
            return Ok(Verification::UnknownUser);
        };

        if self.verify(password, password_hash).await? {
            info!("User {} verified", user_id);
            Ok(Verification::Verified)
        } else {
            info!("Verification failed, wrong password for user {}", user_id);
            Ok(Verification::WrongPassword)
        }
    }

    async fn hash(&self, password: &str) -> Result<String> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || -> Result<String> {
            let salt = SaltString::generate(&mut OsRng);
            hasher
                .hash_password(password.as_bytes(), &salt)
                .map(|hash| hash.to_string())
                .map_err(|e| anyhow::anyhow!("Failed to hash password: {}", e))
        })
        .await
        .context("Password hashing task failed")?
    }

    async fn verify(&self, password: &str, password_hash: String) -> Result<bool> {
        let hasher = self.hasher.clone();
        let password = password.to_owned();

        tokio::task::spawn_blocking(move || -> Result<bool> {
            let parsed_hash = PasswordHash::new(&password_hash)
                .map_err(|e| anyhow::anyhow!("Invalid password hash: {}", e))?;

            // Cost parameters come from the stored PHC string
            Ok(hasher
                .verify_password(password.as_bytes(), &parsed_hash)
                .is_ok())
        })
        .await
        .context("Password verification task failed")?
    }
}

#[cfg(test)]
pub(crate) fn fast_hasher() -> Argon2<'static> {
    use argon2::{Algorithm, Params, Version};

    let params = Params::new(Params::MIN_M_COST, 1, 1, None).expect("valid argon2 params");
    Argon2::new(Algorithm::Argon2id, Version::V0x13, params)
}
