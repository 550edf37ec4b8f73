use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

mod flow;
mod store;

pub use flow::{
    AuthorizationFlow, LoopbackFlow, authorization_url, exchange_code, generate_pkce,
    generate_state,
};
pub use store::{CredentialSource, ObtainedCredentials, obtain_credentials};

/// OAuth scope granting read/write access to the user's Blogger account
pub const BLOGGER_SCOPE: &str = "https://www.googleapis.com/auth/blogger";

/// Google's authorization endpoint, used when the client secrets omit one
pub const DEFAULT_AUTH_URI: &str = "https://accounts.google.com/o/oauth2/auth";

/// Google's token endpoint, used when the client secrets omit one
pub const DEFAULT_TOKEN_URI: &str = "https://oauth2.googleapis.com/token";

/// Tokens are treated as expired this many seconds before their actual expiry
const EXPIRY_SKEW_SECS: i64 = 60;

#[derive(Debug, Error)]
pub enum OAuthError {
    #[error("Failed to read '{}': {source}", path.display())]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse '{}': {source}", path.display())]
    Parse {
        path: PathBuf,
        source: serde_json::Error,
    },

    #[error(
        "Client secrets file '{}' has neither an \"installed\" nor a \"web\" section",
        path.display()
    )]
    InvalidClientSecrets { path: PathBuf },

    #[error("Credentials file '{}' not found", path.display())]
    MissingClientSecrets { path: PathBuf },

    #[error("Token endpoint returned status {status}: {body}")]
    TokenEndpoint { status: u16, body: String },

    #[error("Authorization was denied: {0}")]
    Denied(String),

    #[error("Authorization callback carried an unexpected state parameter")]
    StateMismatch,

    #[error("Authorization callback did not include a code")]
    MissingCode,

    #[error("OAuth authorization timeout ({0} seconds)")]
    Timeout(u64),

    #[error("Token has no refresh token")]
    MissingRefreshToken,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Local callback server failed: {0}")]
    Callback(std::io::Error),
}

pub type Result<T> = std::result::Result<T, OAuthError>;

/// Client identity from the JSON file downloaded from the Google Cloud console
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ClientSecrets {
    pub client_id: String,
    pub client_secret: String,
    #[serde(default = "default_auth_uri")]
    pub auth_uri: String,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
}

fn default_auth_uri() -> String {
    DEFAULT_AUTH_URI.to_string()
}

fn default_token_uri() -> String {
    DEFAULT_TOKEN_URI.to_string()
}

#[derive(Deserialize)]
struct ClientSecretsFile {
    installed: Option<ClientSecrets>,
    web: Option<ClientSecrets>,
}

impl ClientSecrets {
    /// Load a desktop ("installed") or web client secrets file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|source| OAuthError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let file: ClientSecretsFile =
            serde_json::from_str(&content).map_err(|source| OAuthError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        file.installed
            .or(file.web)
            .ok_or_else(|| OAuthError::InvalidClientSecrets {
                path: path.to_path_buf(),
            })
    }
}

/// Stored user credentials, in the "authorized user" layout Google's client
/// libraries write, so token files are interchangeable with them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthorizedUser {
    /// Access token for API requests
    pub token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    #[serde(default = "default_token_uri")]
    pub token_uri: String,
    pub client_id: String,
    pub client_secret: String,
    #[serde(default)]
    pub scopes: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expiry: Option<DateTime<Utc>>,
}

/// Body of a successful response from the token endpoint
#[derive(Debug, Deserialize)]
pub(crate) struct TokenResponse {
    pub access_token: String,
    #[serde(default)]
    pub expires_in: Option<i64>,
    #[serde(default)]
    pub refresh_token: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
}

impl TokenResponse {
    pub(crate) fn expiry(&self) -> Option<DateTime<Utc>> {
        self.expires_in
            .map(|secs| Utc::now() + Duration::seconds(secs))
    }
}

impl AuthorizedUser {
    /// Check if the token is expired or will expire within the skew window.
    /// A token without an expiry never expires.
    pub fn is_expired(&self) -> bool {
        match self.expiry {
            Some(expiry) => Utc::now() + Duration::seconds(EXPIRY_SKEW_SECS) >= expiry,
            None => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        !self.token.is_empty() && !self.is_expired()
    }

    pub fn can_refresh(&self) -> bool {
        self.refresh_token.as_deref().is_some_and(|t| !t.is_empty())
    }

    /// Load credentials from a token file (`.json` or `.js`, both read as JSON)
    pub fn load_from_file(path: &Path) -> Result<Self> {
        if path.extension().is_some_and(|ext| ext == "js") {
            tracing::debug!("Token file uses .js extension, treating as JSON: {}", path.display());
        }
        let content = std::fs::read_to_string(path).map_err(|source| OAuthError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&content).map_err(|source| OAuthError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    /// Save credentials to file, readable by the owner only
    pub fn save_to_file(&self, path: &Path) -> Result<()> {
        let io_err = |source| OAuthError::Io {
            path: path.to_path_buf(),
            source,
        };
        let content = serde_json::to_string_pretty(self).map_err(|source| OAuthError::Parse {
            path: path.to_path_buf(),
            source,
        })?;

        std::fs::write(path, content).map_err(io_err)?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            std::fs::set_permissions(path, std::fs::Permissions::from_mode(0o600))
                .map_err(io_err)?;
        }

        Ok(())
    }

    /// Obtain a fresh access token from `token_uri` using the refresh token.
    /// The refresh token is kept when the endpoint does not rotate it.
    pub async fn refresh(&mut self, http: &reqwest::Client) -> Result<()> {
        let refresh_token = self
            .refresh_token
            .clone()
            .filter(|t| !t.is_empty())
            .ok_or(OAuthError::MissingRefreshToken)?;

        tracing::debug!("Refreshing OAuth token via {}", self.token_uri);

        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token.as_str()),
            ("grant_type", "refresh_token"),
        ];
        let response = http.post(&self.token_uri).form(&params).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(OAuthError::TokenEndpoint { status, body });
        }

        let refreshed: TokenResponse = response.json().await?;
        self.expiry = refreshed.expiry();
        self.token = refreshed.access_token;
        if let Some(rotated) = refreshed.refresh_token {
            self.refresh_token = Some(rotated);
        }
        if let Some(scope) = refreshed.scope {
            self.scopes = scope.split_whitespace().map(str::to_string).collect();
        }

        tracing::debug!("OAuth token refreshed successfully");
        Ok(())
    }
}
