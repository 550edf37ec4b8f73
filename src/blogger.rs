//! Blogger API v3 client.

use crate::error::{GblogError, Result};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

pub const DEFAULT_API_ADDRESS: &str = "https://www.googleapis.com/blogger/v3";

/// Environment variable overriding [`DEFAULT_API_ADDRESS`]
pub const API_ADDRESS_ENV: &str = "BLOGGER_API_ADDRESS";

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Blog {
    pub id: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Deserialize)]
struct BlogList {
    #[serde(default)]
    items: Vec<Blog>,
}

/// A post about to be submitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPost {
    pub title: String,
    pub content: String,
    pub labels: Vec<String>,
    pub draft: bool,
}

#[derive(Serialize)]
struct PostBody<'a> {
    kind: &'static str,
    title: &'a str,
    content: &'a str,
    #[serde(skip_serializing_if = "<[String]>::is_empty")]
    labels: &'a [String],
}

/// Post resource returned by the API
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct CreatedPost {
    pub id: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub url: String,
    /// Absent for drafts
    #[serde(default)]
    pub published: Option<String>,
    #[serde(default)]
    pub labels: Option<Vec<String>>,
}

#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Remote operations gblog needs from a blogging service
#[async_trait]
pub trait BlogApi {
    async fn get_blog(&self, blog_id: &str) -> Result<Blog>;
    async fn get_blog_by_url(&self, url: &str) -> Result<Blog>;
    async fn list_blogs(&self) -> Result<Vec<Blog>>;
    async fn create_post(&self, blog_id: &str, post: &NewPost) -> Result<CreatedPost>;
}

#[async_trait]
impl<T> BlogApi for &T
where
    T: BlogApi + Sync + ?Sized,
{
    async fn get_blog(&self, blog_id: &str) -> Result<Blog> {
        (**self).get_blog(blog_id).await
    }

    async fn get_blog_by_url(&self, url: &str) -> Result<Blog> {
        (**self).get_blog_by_url(url).await
    }

    async fn list_blogs(&self) -> Result<Vec<Blog>> {
        (**self).list_blogs().await
    }

    async fn create_post(&self, blog_id: &str, post: &NewPost) -> Result<CreatedPost> {
        (**self).create_post(blog_id, post).await
    }
}

pub struct BloggerClient {
    http: reqwest::Client,
    base_url: String,
    access_token: String,
}

impl BloggerClient {
    /// Client against the address in `BLOGGER_API_ADDRESS`, or the public API
    pub fn new(http: reqwest::Client, access_token: String) -> Self {
        let base_url =
            std::env::var(API_ADDRESS_ENV).unwrap_or_else(|_| DEFAULT_API_ADDRESS.to_string());
        Self::with_base_url(http, base_url, access_token)
    }

    pub fn with_base_url(http: reqwest::Client, base_url: String, access_token: String) -> Self {
        Self {
            http,
            base_url: base_url.trim_end_matches('/').to_string(),
            access_token,
        }
    }

    async fn send(&self, request: reqwest::RequestBuilder) -> Result<reqwest::Response> {
        let response = request.bearer_auth(&self.access_token).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorEnvelope>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            return Err(GblogError::Api { status, message });
        }

        Ok(response)
    }
}

#[async_trait]
impl BlogApi for BloggerClient {
    async fn get_blog(&self, blog_id: &str) -> Result<Blog> {
        let url = format!("{}/blogs/{}", self.base_url, urlencoding::encode(blog_id));
        match self.send(self.http.get(&url)).await {
            Ok(response) => Ok(response.json().await?),
            Err(GblogError::Api { status: 404, .. }) => Err(GblogError::BlogNotFound {
                blog_id: blog_id.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn get_blog_by_url(&self, blog_url: &str) -> Result<Blog> {
        let url = format!("{}/blogs/byurl", self.base_url);
        match self
            .send(self.http.get(&url).query(&[("url", blog_url)]))
            .await
        {
            Ok(response) => Ok(response.json().await?),
            Err(GblogError::Api { status: 404, .. }) => Err(GblogError::BlogUrlNotFound {
                url: blog_url.to_string(),
            }),
            Err(e) => Err(e),
        }
    }

    async fn list_blogs(&self) -> Result<Vec<Blog>> {
        let url = format!("{}/users/self/blogs", self.base_url);
        let list: BlogList = self.send(self.http.get(&url)).await?.json().await?;
        Ok(list.items)
    }

    async fn create_post(&self, blog_id: &str, post: &NewPost) -> Result<CreatedPost> {
        let url = format!(
            "{}/blogs/{}/posts/",
            self.base_url,
            urlencoding::encode(blog_id)
        );
        let body = PostBody {
            kind: "blogger#post",
            title: &post.title,
            content: &post.content,
            labels: &post.labels,
        };

        let mut request = self.http.post(&url).json(&body);
        if post.draft {
            request = request.query(&[("isDraft", "true")]);
        }

        Ok(self.send(request).await?.json().await?)
    }
}
