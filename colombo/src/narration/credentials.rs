//! Bearer credential sources.

use parking_lot::RwLock;

use crate::provider::BoxFuture;

/// Environment variable read by [`EnvCredentials::default`].
pub const ACCESS_TOKEN_ENV: &str = "COLOMBO_ACCESS_TOKEN";

/// Supplies the bearer token attached to narration requests.
///
/// Returning `None` means the user is signed out; the narration service
/// then fails with `Unauthorized` without contacting the backend.
pub trait CredentialProvider: Send + Sync {
    fn access_token(&self) -> BoxFuture<'_, Option<String>>;
}

/// A token that can be replaced at runtime, e.g. after sign-in.
#[derive(Debug, Default)]
pub struct SessionCredentials {
    token: RwLock<Option<String>>,
}

impl SessionCredentials {
    pub fn new(token: Option<String>) -> Self {
        Self {
            token: RwLock::new(token.filter(|t| !t.is_empty())),
        }
    }

    pub fn set_token(&self, token: impl Into<String>) {
        *self.token.write() = Some(token.into());
    }

    pub fn sign_out(&self) {
        *self.token.write() = None;
    }

    pub fn is_signed_in(&self) -> bool {
        self.token.read().is_some()
    }
}

impl CredentialProvider for SessionCredentials {
    fn access_token(&self) -> BoxFuture<'_, Option<String>> {
        let token = self.token.read().clone();
        Box::pin(async move { token })
    }
}

/// Reads the token from an environment variable on every request.
#[derive(Debug, Clone)]
pub struct EnvCredentials {
    var: String,
}

impl EnvCredentials {
    pub fn new(var: impl Into<String>) -> Self {
        Self { var: var.into() }
    }
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new(ACCESS_TOKEN_ENV)
    }
}

impl CredentialProvider for EnvCredentials {
    fn access_token(&self) -> BoxFuture<'_, Option<String>> {
        let token = std::env::var(&self.var).ok().filter(|t| !t.trim().is_empty());
        Box::pin(async move { token })
    }
}

impl<T: CredentialProvider + ?Sized> CredentialProvider for std::sync::Arc<T> {
    fn access_token(&self) -> BoxFuture<'_, Option<String>> {
        (**self).access_token()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_session_credentials_lifecycle() {
        let credentials = SessionCredentials::default();
        assert!(credentials.access_token().await.is_none());

        credentials.set_token("abc");
        assert!(credentials.is_signed_in());
        assert_eq!(credentials.access_token().await.as_deref(), Some("abc"));

        credentials.sign_out();
        assert!(credentials.access_token().await.is_none());
    }

    #[tokio::test]
    async fn test_empty_token_is_signed_out() {
        let credentials = SessionCredentials::new(Some(String::new()));
        assert!(!credentials.is_signed_in());
    }

    #[tokio::test]
    async fn test_env_credentials_missing_var() {
        let credentials = EnvCredentials::new("COLOMBO_TEST_TOKEN_THAT_IS_NEVER_SET");
        assert!(credentials.access_token().await.is_none());
    }
}
