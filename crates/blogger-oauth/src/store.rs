use crate::{AuthorizationFlow, AuthorizedUser, BLOGGER_SCOPE, ClientSecrets, OAuthError, Result};
use std::path::Path;

/// Where the credentials handed back by [`obtain_credentials`] came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CredentialSource {
    /// Still-valid token loaded from the token file
    Cached,
    /// Expired token brought back to life with its refresh token
    Refreshed,
    /// Fresh consent obtained through the authorization flow
    Authorized,
}

#[derive(Debug, Clone)]
pub struct ObtainedCredentials {
    pub user: AuthorizedUser,
    pub source: CredentialSource,
    /// Whether new credentials were written back to the token file
    pub saved: bool,
}

/// Load, refresh or (re)authorize Blogger credentials.
///
/// A token file that cannot be read and a refresh that fails both fall back
/// to the authorization flow, which requires the client secrets file. Newly
/// minted credentials are written to `token_path`; a failed write is only
/// logged since the in-memory credentials are still usable.
pub async fn obtain_credentials<F>(
    http: &reqwest::Client,
    credentials_path: &Path,
    token_path: &Path,
    flow: &F,
) -> Result<ObtainedCredentials>
where
    F: AuthorizationFlow + ?Sized,
{
    tracing::debug!("Looking for token file: {}", token_path.display());

    let mut cached = None;
    if token_path.exists() {
        match AuthorizedUser::load_from_file(token_path) {
            Ok(user) => {
                tracing::debug!("Loaded credentials from token file");
                cached = Some(user);
            }
            Err(e) => {
                tracing::warn!(
                    "Could not load token file '{}': {}. Will request new authorization",
                    token_path.display(),
                    e
                );
            }
        }
    }

    if let Some(user) = &cached {
        if user.is_valid() {
            return Ok(ObtainedCredentials {
                user: user.clone(),
                source: CredentialSource::Cached,
                saved: false,
            });
        }
    }

    let mut renewed = None;
    if let Some(mut user) = cached.filter(|u| u.is_expired() && u.can_refresh()) {
        tracing::debug!("Credentials expired, attempting refresh");
        match user.refresh(http).await {
            Ok(()) => renewed = Some((user, CredentialSource::Refreshed)),
            Err(e) => {
                tracing::warn!("Error refreshing credentials: {}. Requesting new authorization", e);
            }
        }
    }

    let (user, source) = match renewed {
        Some(renewed) => renewed,
        None => {
            tracing::debug!("Looking for credentials file: {}", credentials_path.display());
            if !credentials_path.exists() {
                return Err(OAuthError::MissingClientSecrets {
                    path: credentials_path.to_path_buf(),
                });
            }
            let secrets = ClientSecrets::load_from_file(credentials_path)?;
            tracing::debug!("Starting OAuth flow");
            let user = flow.authorize(&secrets, &[BLOGGER_SCOPE]).await?;
            tracing::debug!("OAuth flow completed successfully");
            (user, CredentialSource::Authorized)
        }
    };

    let saved = match user.save_to_file(token_path) {
        Ok(()) => {
            tracing::debug!("Saved credentials to: {}", token_path.display());
            true
        }
        Err(e) => {
            tracing::warn!(
                "Could not save credentials to '{}': {}. You may need to re-authenticate next time",
                token_path.display(),
                e
            );
            false
        }
    };

    Ok(ObtainedCredentials {
        user,
        source,
        saved,
    })
}
