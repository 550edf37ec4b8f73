use anyhow::Context;
use blogger_oauth::{CredentialSource, LoopbackFlow, obtain_credentials};
use clap::Parser;
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

/// Authorize gblog against Blogger and store the token, without posting anything
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Path to the OAuth client secrets file downloaded from the Google Cloud console
    #[arg(short, long, default_value = "credentials.json")]
    credentials: PathBuf,

    /// Path to store the OAuth token file
    #[arg(long, default_value = "token.json")]
    token: PathBuf,

    /// Print the authorization URL instead of opening a browser
    #[arg(long)]
    no_browser: bool,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let default_level = if args.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();

    let http = reqwest::Client::new();
    let mut flow = LoopbackFlow::new(http.clone());
    if args.no_browser {
        flow = flow.without_browser();
    }

    let obtained = obtain_credentials(&http, &args.credentials, &args.token, &flow)
        .await
        .context("Failed to obtain Blogger credentials")?;

    match obtained.source {
        CredentialSource::Cached => {
            eprintln!("Existing token in '{}' is still valid", args.token.display())
        }
        CredentialSource::Refreshed => eprintln!("Access token refreshed"),
        CredentialSource::Authorized => eprintln!("Authorization complete"),
    }
    if obtained.saved {
        eprintln!("\nOAuth token saved to: {}", args.token.display());
        eprintln!("You can now use this token with gblog --token {}", args.token.display());
    }

    Ok(())
}
