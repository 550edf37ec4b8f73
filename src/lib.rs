//! Post text/HTML files to Google Blogger.
//!
//! A run reads one file, settles its title and labels from command line
//! flags, an optional YAML config file and markers embedded in the file,
//! obtains OAuth credentials and creates the post through the Blogger API.

pub mod auth;
pub mod blogger;
pub mod config;
pub mod error;
pub mod metadata;
pub mod publish;
pub mod select;

pub use error::{GblogError, Result};
