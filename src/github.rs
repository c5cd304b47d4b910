use crate::error::{Result, StarTallyError};
use crate::types::{Repository, UserProfile};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::de::DeserializeOwned;
use std::time::Duration;
use tracing::{debug, warn};
use url::Url;

pub const DEFAULT_API_BASE_URL: &str = "https://api.github.com/users/";
const DEFAULT_USER_AGENT: &str = concat!("github-star-tally/", env!("CARGO_PKG_VERSION"));
const ACCEPT_GITHUB_V3: &str = "application/vnd.github.v3+json";

/// The two read-only calls the profile controller depends on.
///
/// Implementations must be stateless: the controller may have calls from a
/// superseded fetch cycle still in flight while it starts a new one.
#[async_trait]
pub trait GitHubApi: Send + Sync {
    /// `GET {base_url}/{username}`
    async fn fetch_user(&self, username: &str) -> Result<UserProfile>;

    /// `GET {base_url}/{username}/repos`
    async fn fetch_repositories(&self, username: &str) -> Result<Vec<Repository>>;
}

#[derive(Debug, Clone)]
pub struct GitHubClientConfig {
    /// Endpoint that usernames are appended to, e.g. `https://api.github.com/users/`
    pub base_url: Url,
    pub user_agent: String,
    /// `None` keeps the transport default.
    pub timeout: Option<Duration>,
}

impl GitHubClientConfig {
    pub fn new(base_url: Url) -> Self {
        Self {
            base_url,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            timeout: None,
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }
}

pub struct GitHubClient {
    client: Client,
    base_url: Url,
}

impl GitHubClient {
    pub fn new(config: GitHubClientConfig) -> Result<Self> {
        if config.base_url.cannot_be_a_base() {
            return Err(StarTallyError::InvalidInput(format!(
                "{} cannot be used as an API base URL",
                config.base_url
            )));
        }

        let mut builder = Client::builder().user_agent(config.user_agent);
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(GitHubClient {
            client: builder.build()?,
            base_url: config.base_url,
        })
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Builds `{base_url}/{username}/{tail...}`, rejecting usernames that
    /// would change the shape of the request target.
    pub fn endpoint(&self, username: &str, tail: &[&str]) -> Result<Url> {
        validate_username(username)?;

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| {
                StarTallyError::InvalidInput(format!(
                    "{} cannot be used as an API base URL",
                    self.base_url
                ))
            })?
            .pop_if_empty()
            .push(username)
            .extend(tail);

        Ok(url)
    }

    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<T> {
        debug!(%url, "Sending GitHub API request");

        let response = self
            .client
            .get(url.clone())
            .header("Accept", ACCEPT_GITHUB_V3)
            .send()
            .await?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                return Err(StarTallyError::NotFound(url.to_string()));
            }
            status if status.is_success() => {}
            status => {
                let error_text = response.text().await.unwrap_or_default();
                warn!(%url, status = status.as_u16(), "GitHub API request failed");
                return Err(StarTallyError::ApiError {
                    status: status.as_u16(),
                    message: error_text,
                });
            }
        }

        let body = response.bytes().await?;
        if body.iter().all(u8::is_ascii_whitespace) {
            return Err(StarTallyError::NoData(format!("empty response body from {}", url)));
        }

        Ok(serde_json::from_slice(&body)?)
    }
}

#[async_trait]
impl GitHubApi for GitHubClient {
    async fn fetch_user(&self, username: &str) -> Result<UserProfile> {
        let url = self.endpoint(username, &[])?;
        self.get_json(url).await
    }

    async fn fetch_repositories(&self, username: &str) -> Result<Vec<Repository>> {
        let url = self.endpoint(username, &["repos"])?;
        let repos: Vec<Repository> = self.get_json(url).await?;
        debug!(username, count = repos.len(), "Fetched repositories");
        Ok(repos)
    }
}

fn validate_username(username: &str) -> Result<()> {
    if username.is_empty() {
        return Err(StarTallyError::InvalidInput("username is empty".to_string()));
    }

    let is_forbidden =
        |c: char| matches!(c, '/' | '?' | '#' | '%') || c.is_whitespace() || c.is_control();
    if username == "." || username == ".." || username.chars().any(is_forbidden) {
        return Err(StarTallyError::InvalidInput(format!(
            "username {:?} cannot be used in a request path",
            username
        )));
    }

    Ok(())
}
