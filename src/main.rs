use clap::Parser;
use gblog::auth::TokenFileProvider;
use gblog::blogger::BloggerClient;
use gblog::config::{self, CliOverrides};
use gblog::publish::{self, PublishRequest};
use gblog::select::{self, StdinSelection};
use std::path::PathBuf;
use std::process::ExitCode;
use tracing_subscriber::EnvFilter;

/// Post text/HTML files to Google Blogger using OAuth 2.0
#[derive(Parser, Debug)]
#[command(
    version,
    about,
    long_about = None,
    after_help = "Examples:\n  \
  # Post a file with a title\n  \
  gblog -f mypost.txt -t \"My Blog Post Title\"\n\n  \
  # Post as draft with labels\n  \
  gblog -f mypost.html -t \"Draft Post\" --draft --labels \"rust,blogging\"\n\n  \
  # Specify blog URL and credentials file\n  \
  gblog -f post.txt -t \"My Post\" -b https://myblog.blogspot.com -c my_creds.json\n\n  \
  # Specify blog ID directly (most efficient)\n  \
  gblog -f post.txt -t \"My Post\" --blog-id 1234567890123456789"
)]
struct Args {
    /// Text/HTML file to post
    #[arg(short, long)]
    file: PathBuf,

    /// Post title (if not provided, will attempt to extract from file)
    #[arg(short, long)]
    title: Option<String>,

    /// Blog URL (e.g., https://myblog.blogspot.com)
    #[arg(short, long)]
    blog_url: Option<String>,

    /// Blog ID (direct specification, takes precedence over --blog-url)
    #[arg(long)]
    blog_id: Option<String>,

    /// Comma-separated list of labels/tags
    #[arg(short, long)]
    labels: Option<String>,

    /// Create as draft instead of publishing
    #[arg(long, overrides_with = "no_draft")]
    draft: bool,

    /// Publish even if the config file asks for a draft
    #[arg(long, overrides_with = "draft")]
    no_draft: bool,

    /// Path to credentials.json file [default: credentials.json]
    #[arg(short, long)]
    credentials: Option<PathBuf>,

    /// Path to token file, .json or .js [default: token.json]
    #[arg(long)]
    token: Option<PathBuf>,

    /// Path to YAML configuration file
    #[arg(short = 'C', long)]
    config: Option<PathBuf>,

    /// Enable verbose output for debugging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn overrides(&self) -> CliOverrides {
        let draft = match (self.draft, self.no_draft) {
            (true, _) => Some(true),
            (_, true) => Some(false),
            _ => None,
        };
        CliOverrides {
            blog_url: self.blog_url.clone(),
            blog_id: self.blog_id.clone(),
            labels: self.labels.clone(),
            credentials: self.credentials.clone(),
            token: self.token.clone(),
            draft,
        }
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .compact()
        .init();
}

async fn run(args: Args) -> gblog::Result<()> {
    tracing::debug!("gblog v{} started", env!("CARGO_PKG_VERSION"));
    tracing::debug!("Arguments: {:?}", args);

    let file_config = args
        .config
        .as_deref()
        .map(config::load_config_file)
        .unwrap_or_default();
    let settings = config::resolve(file_config, args.overrides());

    let request = PublishRequest {
        file: args.file,
        title: args.title,
        settings,
    };

    let http = reqwest::Client::new();
    let mut credentials = TokenFileProvider::new(
        http.clone(),
        request.settings.credentials.clone(),
        request.settings.token.clone(),
    );
    let mut input = StdinSelection::new();

    let post = publish::publish(
        &request,
        &mut credentials,
        |token| BloggerClient::new(http.clone(), token),
        &mut input,
    )
    .await?;

    println!("{}", publish::summary(&post));
    Ok(())
}

/// Resolves on a Ctrl-C that the blog prompt is not handling
async fn interrupted() {
    loop {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::debug!("Could not listen for Ctrl-C: {}", e);
            std::future::pending::<()>().await;
        }
        if !select::prompt_active() {
            return;
        }
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();
    init_tracing(args.verbose);

    tokio::select! {
        result = run(args) => match result {
            Ok(()) => ExitCode::SUCCESS,
            Err(e) => {
                eprintln!("Error: {}", e);
                ExitCode::FAILURE
            }
        },
        _ = interrupted() => {
            eprintln!("\nInterrupted");
            ExitCode::from(130)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft_from(flags: &[&str]) -> Option<bool> {
        let argv = ["gblog", "-f", "post.txt"].iter().chain(flags).copied();
        Args::try_parse_from(argv).unwrap().overrides().draft
    }

    #[test]
    fn draft_flags_are_tri_state() {
        assert_eq!(draft_from(&[]), None);
        assert_eq!(draft_from(&["--draft"]), Some(true));
        assert_eq!(draft_from(&["--no-draft"]), Some(false));
    }

    #[test]
    fn last_draft_flag_wins() {
        assert_eq!(draft_from(&["--draft", "--no-draft"]), Some(false));
        assert_eq!(draft_from(&["--no-draft", "--draft"]), Some(true));
    }

    #[test]
    fn unset_flags_stay_unset() {
        let args = Args::try_parse_from(["gblog", "-f", "post.txt"]).unwrap();
        assert_eq!(
            args.overrides(),
            CliOverrides {
                draft: None,
                ..Default::default()
            }
        );
    }
}
