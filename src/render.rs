use crate::models::{AppState, FetchPhase, StateEvent};
use anyhow::Result;
use colored::*;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::warn;

/// Terminal line for a state transition, `None` for transitions with nothing to show.
pub fn describe(event: &StateEvent) -> Option<String> {
    let state = &event.state;
    match state.phase {
        FetchPhase::Idle => None,
        FetchPhase::LoadingProfile => Some(format!(
            "⏳ Loading profile for {}...",
            event.requested_username.bold()
        )),
        FetchPhase::LoadingRepositories => Some(format!(
            "📦 Found {}, counting stars across {} public repositories...",
            state.username.bold(),
            state.public_repos
        )),
        FetchPhase::Failed => Some(format!(
            "❌ {}",
            state.error_message.as_deref().unwrap_or("Unknown error").red()
        )),
        FetchPhase::Done => Some(summary(state)),
    }
}

pub fn summary(state: &AppState) -> String {
    format!(
        "✅ {}\n   Avatar:       {}\n   Followers:    {}\n   Public repos: {}\n   Total stars:  {}",
        state.username.bold().green(),
        state.avatar_url.dimmed(),
        state.followers,
        state.public_repos,
        format!("⭐ {}", state.total_stars).yellow()
    )
}

/// Prints every transition of the cycle started for `username` and returns
/// the terminal state.
pub async fn render_until_terminal(
    events: &mut broadcast::Receiver<StateEvent>,
    username: &str,
) -> Result<AppState> {
    loop {
        match events.recv().await {
            Ok(event) => {
                if event.requested_username != username {
                    continue;
                }
                if let Some(line) = describe(&event) {
                    println!("{}", line);
                }
                if event.state.phase.is_terminal() {
                    println!();
                    return Ok(event.state);
                }
            }
            Err(RecvError::Lagged(skipped)) => {
                warn!(skipped, "Renderer fell behind state events");
            }
            Err(RecvError::Closed) => {
                anyhow::bail!("Profile controller stopped before the lookup of {} finished", username);
            }
        }
    }
}
