//! Explicit per-request identity
//!
//! Feed actions receive the acting user as a value instead of reading a
//! process-wide "logged in" flag. Credential checks belong to the identity
//! collaborator behind `IdentityVerifier`; this crate only consumes the
//! username it vouches for.

use async_trait::async_trait;
use tracing::debug;

use crate::error::ValidationError;

/// Identity collaborator (email/password check lives outside this crate)
#[async_trait]
pub trait IdentityVerifier: Send + Sync {
    /// Returns the username for valid credentials, `None` otherwise
    async fn verify(&self, email: &str, credential: &str) -> Option<String>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestContext {
    username: String,
}

impl RequestContext {
    /// Context for a username already vouched for by the caller
    pub fn new(username: &str) -> Result<Self, ValidationError> {
        let username = username.trim();
        if username.is_empty() {
            return Err(ValidationError::EmptyUsername);
        }
        Ok(Self {
            username: username.to_string(),
        })
    }

    /// Ask the identity collaborator to vouch for a credential pair
    pub async fn sign_in(
        verifier: &dyn IdentityVerifier,
        email: &str,
        credential: &str,
    ) -> Option<Self> {
        let username = verifier.verify(email, credential).await?;
        debug!("Signed in {}", username);
        Self::new(&username).ok()
    }

    pub fn username(&self) -> &str {
        &self.username
    }
}
