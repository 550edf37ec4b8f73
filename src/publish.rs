//! The publish pipeline: read the file, settle title and labels, authenticate,
//! pick the blog, create the post.

use crate::auth::CredentialProvider;
use crate::blogger::{BlogApi, CreatedPost, NewPost};
use crate::config::{BlogTarget, EffectiveSettings};
use crate::error::{GblogError, Result};
use crate::metadata;
use crate::select::{SelectionInput, choose_blog};
use std::path::{Path, PathBuf};

/// Everything one invocation asks for
#[derive(Debug, Clone)]
pub struct PublishRequest {
    pub file: PathBuf,
    pub title: Option<String>,
    pub settings: EffectiveSettings,
}

/// Read the post file as UTF-8 text
pub fn read_post_file(path: &Path) -> Result<String> {
    if !path.exists() {
        return Err(GblogError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    tracing::debug!("Reading file: {}", path.display());
    let bytes = std::fs::read(path).map_err(|e| GblogError::from_read(path, e))?;
    let content = String::from_utf8(bytes).map_err(|_| GblogError::Decode {
        path: path.to_path_buf(),
    })?;
    tracing::debug!(
        "Successfully read {} characters from {}",
        content.chars().count(),
        path.display()
    );
    Ok(content)
}

/// Build the post from the file and settings. Fails before anything touches
/// the network when the file is unusable or no title can be found.
pub fn prepare_post(request: &PublishRequest) -> Result<NewPost> {
    println!("Reading content from '{}'...", request.file.display());
    let content = read_post_file(&request.file)?;
    let extracted = metadata::extract(&content);

    let title = request
        .title
        .clone()
        .filter(|t| !t.trim().is_empty())
        .or(extracted.title)
        .ok_or(GblogError::MissingTitle)?;
    tracing::debug!("Using title: '{}'", title);

    let labels = request
        .settings
        .labels
        .clone()
        .or(extracted.labels)
        .unwrap_or_default();
    if !labels.is_empty() {
        tracing::debug!("Using labels: {:?}", labels);
    }

    Ok(NewPost {
        title,
        content,
        labels,
        draft: request.settings.draft,
    })
}

/// Turn the requested target into a blog ID, asking the user when they own
/// several blogs and named none.
pub async fn resolve_blog<A, I>(api: &A, target: &BlogTarget, input: &mut I) -> Result<String>
where
    A: BlogApi + ?Sized + Sync,
    I: SelectionInput + ?Sized + Send,
{
    match target {
        BlogTarget::Id(id) => {
            tracing::debug!("Using provided blog ID: {}", id);
            let blog = api.get_blog(id).await?;
            println!("Using blog: {} ({})", blog.name, blog.url);
            Ok(blog.id)
        }
        BlogTarget::Url(url) => {
            tracing::debug!("Resolving blog URL to ID: {}", url);
            let blog = api.get_blog_by_url(url).await?;
            tracing::debug!("Blog resolved: {}", blog.id);
            Ok(blog.id)
        }
        BlogTarget::Choose => {
            tracing::debug!("No blog specified, fetching user's blogs");
            let blogs = api.list_blogs().await?;
            tracing::debug!("Found {} blogs", blogs.len());
            match blogs.as_slice() {
                [] => Err(GblogError::NoBlogsFound),
                [only] => {
                    println!("Using blog: {} ({})", only.name, only.url);
                    Ok(only.id.clone())
                }
                several => Ok(choose_blog(several, input).await?.id.clone()),
            }
        }
    }
}

/// Run the whole pipeline and return the post the API created.
///
/// `connect` builds the API client once an access token is available.
pub async fn publish<P, A, C, I>(
    request: &PublishRequest,
    credentials: &mut P,
    connect: C,
    input: &mut I,
) -> Result<CreatedPost>
where
    P: CredentialProvider + ?Sized + Send,
    A: BlogApi + Sync,
    C: FnOnce(String) -> A,
    I: SelectionInput + ?Sized + Send,
{
    let post = prepare_post(request)?;

    println!("Authenticating with Google...");
    let token = credentials.access_token().await?;
    let api = connect(token);

    println!("Getting blog information...");
    let blog_id = resolve_blog(&api, &request.settings.target(), input).await?;
    tracing::debug!("Blog ID resolved: {}", blog_id);

    println!("Posting to blog...");
    tracing::debug!(
        "Creating post: '{}' (draft: {}), {} characters",
        post.title,
        post.draft,
        post.content.chars().count()
    );
    let created = api.create_post(&blog_id, &post).await?;
    tracing::debug!("Post created successfully: {}", created.id);
    Ok(created)
}

/// Confirmation block printed after a successful post
pub fn summary(post: &CreatedPost) -> String {
    let rule = "=".repeat(60);
    let mut lines = vec![
        String::new(),
        rule.clone(),
        "✓ Post created successfully!".to_string(),
        rule.clone(),
        format!("Title: {}", post.title),
        format!("URL: {}", post.url),
        format!("Published: {}", post.published.as_deref().unwrap_or("Draft")),
    ];
    if let Some(labels) = post.labels.as_deref().filter(|l| !l.is_empty()) {
        lines.push(format!("Labels: {}", labels.join(", ")));
    }
    lines.push(rule);
    lines.join("\n")
}
