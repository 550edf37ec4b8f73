use crate::{AuthorizedUser, ClientSecrets, OAuthError, Result, TokenResponse};
use async_trait::async_trait;
use axum::{
    Router,
    extract::Query,
    response::{Html, IntoResponse},
    routing::get,
};
use serde::Deserialize;
use std::time::Duration;
use tokio::sync::mpsc;

const CALLBACK_PATH: &str = "/oauth2callback";
const AUTH_TIMEOUT_SECS: u64 = 300;

/// Interactive step that turns client secrets into fresh user credentials
#[async_trait]
pub trait AuthorizationFlow {
    async fn authorize(&self, secrets: &ClientSecrets, scopes: &[&str]) -> Result<AuthorizedUser>;
}

/// Browser-based flow with a loopback redirect to a one-shot local server
#[derive(Debug, Clone)]
pub struct LoopbackFlow {
    http: reqwest::Client,
    open_browser: bool,
}

impl LoopbackFlow {
    pub fn new(http: reqwest::Client) -> Self {
        Self {
            http,
            open_browser: true,
        }
    }

    /// Only print the authorization URL instead of launching a browser
    pub fn without_browser(mut self) -> Self {
        self.open_browser = false;
        self
    }
}

#[async_trait]
impl AuthorizationFlow for LoopbackFlow {
    async fn authorize(&self, secrets: &ClientSecrets, scopes: &[&str]) -> Result<AuthorizedUser> {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .map_err(OAuthError::Callback)?;
        let port = listener.local_addr().map_err(OAuthError::Callback)?.port();
        let redirect_uri = format!("http://127.0.0.1:{}{}", port, CALLBACK_PATH);

        let (verifier, challenge) = generate_pkce();
        let state = generate_state();
        let auth_url = authorization_url(secrets, &redirect_uri, scopes, &challenge, &state);

        eprintln!("\n=================================================");
        eprintln!("OAuth 2.0 Authorization Required");
        eprintln!("=================================================");
        eprintln!("\nPlease visit the following URL to authorize gblog:\n");
        eprintln!("{}\n", auth_url);
        eprintln!("Waiting for authorization...");
        eprintln!("=================================================\n");

        if self.open_browser {
            if let Err(e) = open::that(&auth_url) {
                tracing::warn!("Could not open a browser automatically: {}", e);
            }
        }

        let (tx, mut rx) = mpsc::channel::<Result<String>>(1);
        let app = Router::new().route(
            CALLBACK_PATH,
            get(move |query: Query<AuthCallback>| callback(query, state.clone(), tx.clone())),
        );

        let server_handle = tokio::spawn(async move {
            axum::serve(listener, app).await.ok();
        });

        let outcome = tokio::time::timeout(Duration::from_secs(AUTH_TIMEOUT_SECS), rx.recv()).await;
        server_handle.abort();

        let code = match outcome {
            Ok(Some(code)) => code?,
            Ok(None) => return Err(OAuthError::MissingCode),
            Err(_) => return Err(OAuthError::Timeout(AUTH_TIMEOUT_SECS)),
        };

        exchange_code(&self.http, secrets, &code, &verifier, &redirect_uri, scopes).await
    }
}

#[derive(Deserialize)]
struct AuthCallback {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
}

async fn callback(
    Query(params): Query<AuthCallback>,
    expected_state: String,
    tx: mpsc::Sender<Result<String>>,
) -> impl IntoResponse {
    let (outcome, page) = if let Some(error) = params.error {
        let page = format!(
            "<html><body><h1>Authorization Failed</h1><p>Error: {}</p>\
            <p>You can close this window.</p></body></html>",
            error
        );
        (Err(OAuthError::Denied(error)), page)
    } else if params.state.as_deref() != Some(expected_state.as_str()) {
        (
            Err(OAuthError::StateMismatch),
            "<html><body><h1>Authorization Failed</h1><p>State mismatch</p></body></html>"
                .to_string(),
        )
    } else if let Some(code) = params.code {
        (
            Ok(code),
            "<html><body><h1>Authorization Successful!</h1>\
            <p>You can close this window and return to gblog.</p></body></html>"
                .to_string(),
        )
    } else {
        (
            Err(OAuthError::MissingCode),
            "<html><body><h1>Authorization Failed</h1><p>No code received</p></body></html>"
                .to_string(),
        )
    };

    // Only the first callback matters; later ones find the channel full or closed.
    let _ = tx.try_send(outcome);
    Html(page)
}

/// Generate PKCE verifier and challenge
pub fn generate_pkce() -> (String, String) {
    use base64::Engine;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use sha2::{Digest, Sha256};

    let verifier = random_alphanumeric(64);

    // challenge = base64url(SHA256(verifier))
    let hash = Sha256::digest(verifier.as_bytes());
    let challenge = URL_SAFE_NO_PAD.encode(hash);

    (verifier, challenge)
}

/// Random anti-forgery token carried through the redirect
pub fn generate_state() -> String {
    random_alphanumeric(30)
}

fn random_alphanumeric(len: usize) -> String {
    use rand::Rng;
    use rand::distributions::Alphanumeric;

    rand::thread_rng()
        .sample_iter(&Alphanumeric)
        .take(len)
        .map(char::from)
        .collect()
}

/// Build the consent URL for the installed-app flow
pub fn authorization_url(
    secrets: &ClientSecrets,
    redirect_uri: &str,
    scopes: &[&str],
    challenge: &str,
    state: &str,
) -> String {
    format!(
        "{}?\
        client_id={}&\
        redirect_uri={}&\
        response_type=code&\
        scope={}&\
        state={}&\
        code_challenge={}&\
        code_challenge_method=S256&\
        access_type=offline&\
        prompt=consent",
        secrets.auth_uri,
        urlencoding::encode(&secrets.client_id),
        urlencoding::encode(redirect_uri),
        urlencoding::encode(&scopes.join(" ")),
        urlencoding::encode(state),
        urlencoding::encode(challenge),
    )
}

/// Exchange an authorization code for user credentials
pub async fn exchange_code(
    http: &reqwest::Client,
    secrets: &ClientSecrets,
    code: &str,
    verifier: &str,
    redirect_uri: &str,
    scopes: &[&str],
) -> Result<AuthorizedUser> {
    tracing::debug!("Exchanging authorization code for tokens");

    let params = [
        ("client_id", secrets.client_id.as_str()),
        ("client_secret", secrets.client_secret.as_str()),
        ("code", code),
        ("code_verifier", verifier),
        ("grant_type", "authorization_code"),
        ("redirect_uri", redirect_uri),
    ];
    let response = http.post(&secrets.token_uri).form(&params).send().await?;

    if !response.status().is_success() {
        let status = response.status().as_u16();
        let body = response.text().await.unwrap_or_default();
        return Err(OAuthError::TokenEndpoint { status, body });
    }

    let token: TokenResponse = response.json().await?;
    let granted = match &token.scope {
        Some(scope) => scope.split_whitespace().map(str::to_string).collect(),
        None => scopes.iter().map(|s| s.to_string()).collect(),
    };

    Ok(AuthorizedUser {
        expiry: token.expiry(),
        token: token.access_token,
        refresh_token: token.refresh_token,
        token_uri: secrets.token_uri.clone(),
        client_id: secrets.client_id.clone(),
        client_secret: secrets.client_secret.clone(),
        scopes: granted,
    })
}
