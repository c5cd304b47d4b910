use crate::github::{GitHubClientConfig, DEFAULT_API_BASE_URL};
use clap::Parser;
use std::time::Duration;
use url::Url;

#[derive(Parser, Debug)]
#[command(name = "github-star-tally")]
#[command(about = "Looks up GitHub users and tallies the stars across their public repositories")]
#[command(version)]
pub struct Cli {
    /// GitHub usernames to look up, one after another
    pub usernames: Vec<String>,

    /// Endpoint that usernames are appended to
    #[arg(long, env = "GITHUB_API_BASE_URL", default_value = DEFAULT_API_BASE_URL)]
    pub api_base_url: Url,

    /// Request timeout in seconds (transport default when unset)
    #[arg(long, env = "GITHUB_API_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    /// Serve the state over HTTP on this port until Ctrl+C
    #[arg(long, env = "STATUS_PORT")]
    pub serve: Option<u16>,
}

impl Cli {
    /// Usernames that will actually be looked up: trimmed, blanks dropped.
    pub fn lookups(&self) -> Vec<&str> {
        self.usernames
            .iter()
            .map(|username| username.trim())
            .filter(|username| !username.is_empty())
            .collect()
    }

    pub fn client_config(&self) -> GitHubClientConfig {
        let config = GitHubClientConfig::new(self.api_base_url.clone());
        match self.timeout_secs {
            Some(secs) => config.with_timeout(Duration::from_secs(secs)),
            None => config,
        }
    }
}
