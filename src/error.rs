//! Errors surfaced by a gblog run.
//!
//! Every variant is fatal for the run; the recoverable cases (unreadable
//! config, unreadable or unsaveable token file, failed refresh) are logged
//! where they happen and never reach this type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum GblogError {
    #[error("File '{}' not found.", path.display())]
    FileNotFound { path: PathBuf },

    #[error("Permission denied reading file '{}'.", path.display())]
    PermissionDenied { path: PathBuf },

    #[error(
        "Unable to decode file '{}'. Please ensure it's a valid UTF-8 text file.",
        path.display()
    )]
    Decode { path: PathBuf },

    #[error("Error reading file '{}': {source}", path.display())]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error(
        "No title provided. Please specify --title or include title in file using:\n\
         <!-- title>Your Title Here<title -->"
    )]
    MissingTitle,

    #[error(
        "Credentials file '{}' not found.\n\n\
         To use gblog, you need to:\n\
         1. Go to https://console.cloud.google.com/\n\
         2. Create a new project or select an existing one\n\
         3. Enable the Blogger API v3\n\
         4. Create OAuth 2.0 credentials (Desktop application)\n\
         5. Download the credentials and save as 'credentials.json'",
        path.display()
    )]
    MissingCredentialsFile { path: PathBuf },

    #[error("Authorization failed: {0}")]
    Authorization(#[source] blogger_oauth::OAuthError),

    #[error("Blog ID '{blog_id}' not found or not accessible.")]
    BlogNotFound { blog_id: String },

    #[error("Blog URL '{url}' not found or not accessible.")]
    BlogUrlNotFound { url: String },

    #[error("Blogger API returned status {status}: {message}")]
    Api { status: u16, message: String },

    #[error("No blogs found for this user.")]
    NoBlogsFound,

    #[error("Blog selection aborted: no more input")]
    SelectionAborted,

    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),
}

pub type Result<T> = std::result::Result<T, GblogError>;

impl GblogError {
    /// Classify an I/O failure while reading the post file
    pub fn from_read(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        let path = path.into();
        match source.kind() {
            std::io::ErrorKind::NotFound => Self::FileNotFound { path },
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied { path },
            std::io::ErrorKind::InvalidData => Self::Decode { path },
            _ => Self::FileRead { path, source },
        }
    }
}

impl From<blogger_oauth::OAuthError> for GblogError {
    fn from(err: blogger_oauth::OAuthError) -> Self {
        match err {
            blogger_oauth::OAuthError::MissingClientSecrets { path } => {
                Self::MissingCredentialsFile { path }
            }
            other => Self::Authorization(other),
        }
    }
}
