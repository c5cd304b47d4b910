#![allow(dead_code)]

use async_trait::async_trait;
use axum::{http::StatusCode, routing::get, Json, Router};
use github_star_tally::actors::profile_controller::current_state;
use github_star_tally::actors::ProfileControllerMessage;
use github_star_tally::error::{Result, StarTallyError};
use github_star_tally::github::GitHubApi;
use github_star_tally::models::{AppState, FetchPhase, StateEvent};
use github_star_tally::types::{Repository, UserProfile};
use ractor::ActorRef;
use serde_json::json;
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{broadcast, Semaphore};

const WAIT_TIMEOUT: Duration = Duration::from_secs(5);

pub fn profile(login: &str, followers: u64, public_repos: u64) -> UserProfile {
    UserProfile {
        login: login.to_string(),
        avatar_url: format!("https://avatars.example.com/{}", login),
        followers,
        public_repos,
    }
}

pub fn repos(stars: &[u64]) -> Vec<Repository> {
    stars
        .iter()
        .map(|&stargazers_count| Repository { stargazers_count })
        .collect()
}

/// In-memory `GitHubApi` with call counters and optional per-user gates.
///
/// Unknown usernames fail with `NotFound`; usernames registered through
/// `with_failing_repos` fail the repositories call with a 500.
#[derive(Default)]
pub struct FakeGitHub {
    users: HashMap<String, UserProfile>,
    repos: HashMap<String, Vec<Repository>>,
    user_gates: HashMap<String, Arc<Semaphore>>,
    repo_gates: HashMap<String, Arc<Semaphore>>,
    pub user_calls: AtomicUsize,
    pub repo_calls: AtomicUsize,
}

impl FakeGitHub {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_user(mut self, username: &str, profile: UserProfile, repos: Vec<Repository>) -> Self {
        self.users.insert(username.to_string(), profile);
        self.repos.insert(username.to_string(), repos);
        self
    }

    pub fn with_failing_repos(mut self, username: &str, profile: UserProfile) -> Self {
        self.users.insert(username.to_string(), profile);
        self
    }

    /// The profile call for `username` blocks until a permit is added to the returned gate.
    pub fn gate_user(&mut self, username: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.user_gates.insert(username.to_string(), gate.clone());
        gate
    }

    pub fn gate_repos(&mut self, username: &str) -> Arc<Semaphore> {
        let gate = Arc::new(Semaphore::new(0));
        self.repo_gates.insert(username.to_string(), gate.clone());
        gate
    }

    pub fn user_calls(&self) -> usize {
        self.user_calls.load(Ordering::SeqCst)
    }

    pub fn repo_calls(&self) -> usize {
        self.repo_calls.load(Ordering::SeqCst)
    }
}

async fn pass_gate(gate: Option<&Arc<Semaphore>>) {
    if let Some(gate) = gate {
        gate.acquire().await.expect("gate closed").forget();
    }
}

#[async_trait]
impl GitHubApi for FakeGitHub {
    async fn fetch_user(&self, username: &str) -> Result<UserProfile> {
        self.user_calls.fetch_add(1, Ordering::SeqCst);
        pass_gate(self.user_gates.get(username)).await;

        self.users
            .get(username)
            .cloned()
            .ok_or_else(|| StarTallyError::NotFound(format!("users/{}", username)))
    }

    async fn fetch_repositories(&self, username: &str) -> Result<Vec<Repository>> {
        self.repo_calls.fetch_add(1, Ordering::SeqCst);
        pass_gate(self.repo_gates.get(username)).await;

        self.repos
            .get(username)
            .cloned()
            .ok_or_else(|| StarTallyError::ApiError {
                status: 500,
                message: "Internal Server Error".to_string(),
            })
    }
}

/// First terminal state published on `events`.
pub async fn wait_for_terminal(events: &mut broadcast::Receiver<StateEvent>) -> AppState {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        loop {
            let event = events.recv().await.expect("state event stream closed");
            if event.state.phase.is_terminal() {
                return event.state;
            }
        }
    })
    .await
    .expect("timed out waiting for a terminal state")
}

/// Polls the controller until its state reaches `phase`.
pub async fn wait_for_phase(
    controller: &ActorRef<ProfileControllerMessage>,
    phase: FetchPhase,
) -> AppState {
    tokio::time::timeout(WAIT_TIMEOUT, async {
        loop {
            let state = current_state(controller).await.expect("controller not responding");
            if state.phase == phase {
                return state;
            }
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("timed out waiting for phase")
}

/// Router mimicking the parts of the GitHub users API the client consumes.
pub fn fixture_router() -> Router {
    Router::new()
        .route(
            "/users/octocat",
            get(|| async {
                Json(json!({
                    "login": "octocat",
                    "id": 583231,
                    "avatar_url": "https://avatars.githubusercontent.com/u/583231?v=4",
                    "followers": 100,
                    "following": 9,
                    "public_repos": 2
                }))
            }),
        )
        .route(
            "/users/octocat/repos",
            get(|| async {
                Json(json!([
                    { "name": "Hello-World", "stargazers_count": 3 },
                    { "name": "Spoon-Knife", "stargazers_count": 5, "fork": false }
                ]))
            }),
        )
        .route("/users/lonely/repos", get(|| async { Json(json!([])) }))
        .route("/users/empty-body", get(|| async { "" }))
        .route("/users/garbled", get(|| async { "{not json" }))
        .route(
            "/users/wrong-shape",
            get(|| async { Json(json!({ "login": 5, "followers": "many" })) }),
        )
        .route(
            "/users/object-not-array/repos",
            get(|| async { Json(json!({ "stargazers_count": 1 })) }),
        )
        .route(
            "/users/broken",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "boom") }),
        )
}

pub async fn spawn_fixture_server(router: Router) -> SocketAddr {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("Failed to bind fixture server");
    let addr = listener.local_addr().expect("fixture server has no address");

    tokio::spawn(async move {
        axum::serve(listener, router).await.expect("fixture server failed");
    });

    addr
}
