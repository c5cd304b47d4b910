use serde::{Deserialize, Serialize};

// GitHub API response structures

/// Profile returned by `GET /users/{username}`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub login: String,
    pub avatar_url: String,
    pub followers: u64,
    pub public_repos: u64,
}

/// Element of the array returned by `GET /users/{username}/repos`.
/// Only the star count is consumed; other fields are ignored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Repository {
    pub stargazers_count: u64,
}

/// Sum of stargazers across all repositories, 0 for an empty list.
pub fn total_stars(repos: &[Repository]) -> u64 {
    repos.iter().map(|r| r.stargazers_count).sum()
}
