use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Where the current fetch cycle is.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum FetchPhase {
    #[default]
    Idle,
    LoadingProfile,
    LoadingRepositories,
    Failed,
    Done,
}

impl FetchPhase {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FetchPhase::Failed | FetchPhase::Done)
    }
}

/// Observable state owned by the profile controller
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct AppState {
    pub username: String,
    pub avatar_url: String,
    pub followers: u64,
    pub public_repos: u64,
    pub total_stars: u64,
    pub is_loading: bool,
    pub error_message: Option<String>,
    pub phase: FetchPhase,
    /// Fetch cycle this state belongs to; 0 before the first cycle.
    pub generation: u64,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Published after every state transition.
#[derive(Debug, Clone)]
pub struct StateEvent {
    /// Username the cycle was started with (may differ in case from `state.username`).
    pub requested_username: String,
    pub state: AppState,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ControllerStats {
    pub cycles_started: u64,
    pub cycles_completed: u64,
    pub cycles_failed: u64,
    pub stale_results_dropped: u64,
}
