use crate::error::Result;
use async_trait::async_trait;
use blogger_oauth::{AuthorizationFlow, LoopbackFlow, obtain_credentials};
use std::path::PathBuf;

/// Source of the bearer token used for Blogger API calls
#[async_trait]
pub trait CredentialProvider {
    async fn access_token(&mut self) -> Result<String>;
}

/// Credentials kept in a token file, refreshed or re-authorized as needed
pub struct TokenFileProvider<F = LoopbackFlow> {
    http: reqwest::Client,
    credentials: PathBuf,
    token: PathBuf,
    flow: F,
}

impl TokenFileProvider<LoopbackFlow> {
    pub fn new(http: reqwest::Client, credentials: PathBuf, token: PathBuf) -> Self {
        let flow = LoopbackFlow::new(http.clone());
        Self::with_flow(http, credentials, token, flow)
    }
}

impl<F> TokenFileProvider<F> {
    pub fn with_flow(http: reqwest::Client, credentials: PathBuf, token: PathBuf, flow: F) -> Self {
        Self {
            http,
            credentials,
            token,
            flow,
        }
    }
}

#[async_trait]
impl<F> CredentialProvider for TokenFileProvider<F>
where
    F: AuthorizationFlow + Send + Sync,
{
    async fn access_token(&mut self) -> Result<String> {
        tracing::debug!("Using credentials file: {}", self.credentials.display());
        tracing::debug!("Using token file: {}", self.token.display());

        let obtained =
            obtain_credentials(&self.http, &self.credentials, &self.token, &self.flow).await?;
        tracing::debug!("Credentials obtained ({:?})", obtained.source);

        if obtained.saved {
            println!("Credentials saved to '{}' for future use.", self.token.display());
        }
        Ok(obtained.user.token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::GblogError;
    use blogger_oauth::{AuthorizedUser, ClientSecrets, OAuthError};
    use chrono::{Duration, Utc};

    struct RefusingFlow;

    #[async_trait]
    impl AuthorizationFlow for RefusingFlow {
        async fn authorize(
            &self,
            _secrets: &ClientSecrets,
            _scopes: &[&str],
        ) -> blogger_oauth::Result<AuthorizedUser> {
            Err(OAuthError::Denied("access_denied".to_string()))
        }
    }

    #[tokio::test]
    async fn missing_client_secrets_is_reported_with_guidance() {
        let dir = tempfile::tempdir().unwrap();
        let mut provider = TokenFileProvider::with_flow(
            reqwest::Client::new(),
            dir.path().join("credentials.json"),
            dir.path().join("token.json"),
            RefusingFlow,
        );

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, GblogError::MissingCredentialsFile { .. }));
    }

    #[tokio::test]
    async fn cancelled_authorization_is_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let credentials = dir.path().join("credentials.json");
        std::fs::write(
            &credentials,
            r#"{"installed": {"client_id": "id", "client_secret": "secret"}}"#,
        )
        .unwrap();
        let mut provider = TokenFileProvider::with_flow(
            reqwest::Client::new(),
            credentials,
            dir.path().join("token.json"),
            RefusingFlow,
        );

        let err = provider.access_token().await.unwrap_err();
        assert!(matches!(err, GblogError::Authorization(OAuthError::Denied(_))));
    }

    #[tokio::test]
    async fn valid_token_file_yields_its_access_token() {
        let dir = tempfile::tempdir().unwrap();
        let token = dir.path().join("token.json");
        AuthorizedUser {
            token: "ya29.valid".to_string(),
            refresh_token: None,
            token_uri: blogger_oauth::DEFAULT_TOKEN_URI.to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
            scopes: vec![blogger_oauth::BLOGGER_SCOPE.to_string()],
            expiry: Some(Utc::now() + Duration::hours(1)),
        }
        .save_to_file(&token)
        .unwrap();

        let mut provider = TokenFileProvider::with_flow(
            reqwest::Client::new(),
            dir.path().join("credentials.json"),
            token,
            RefusingFlow,
        );
        assert_eq!(provider.access_token().await.unwrap(), "ya29.valid");
    }
}
