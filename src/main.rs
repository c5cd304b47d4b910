use anyhow::Context;
use clap::Parser;
use colored::*;
use github_star_tally::actors::profile_controller::{self, ProfileController};
use github_star_tally::actors::ProfileControllerMessage;
use github_star_tally::cli::Cli;
use github_star_tally::github::GitHubClient;
use github_star_tally::models::FetchPhase;
use github_star_tally::render;
use github_star_tally::status::{start_status_server, StatusState};
use std::sync::Arc;
use tracing::{error, warn};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if it exists
    dotenv::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    if cli.usernames.is_empty() && cli.serve.is_none() {
        anyhow::bail!("Nothing to do: pass at least one username or --serve <PORT>");
    }

    println!("{}", "GitHub Star Tally".bold().green());
    println!("{}\n", "=".repeat(50).dimmed());

    let client = GitHubClient::new(cli.client_config())
        .context("Failed to build GitHub client")?;

    let controller = ProfileController::spawn(Arc::new(client))
        .await
        .map_err(|e| anyhow::anyhow!("Failed to start profile controller: {}", e))?;

    let lookups = cli.lookups();
    if lookups.len() < cli.usernames.len() {
        warn!(skipped = cli.usernames.len() - lookups.len(), "Skipping blank usernames");
    }

    let mut failures = 0;
    for &username in &lookups {
        // Subscribe first so the cycle's first transition is not missed
        let mut events = profile_controller::subscribe(&controller).await?;
        profile_controller::fetch_user_data(&controller, username)?;

        let final_state = render::render_until_terminal(&mut events, username).await?;
        if final_state.phase == FetchPhase::Failed {
            failures += 1;
        }
    }

    if let Some(port) = cli.serve {
        println!("📡 Serving state on port {}", port);
        println!("\nPress Ctrl+C to stop\n");

        tokio::select! {
            result = start_status_server(StatusState::new(controller.clone()), port) => {
                if let Err(e) = result {
                    error!("Status server failed: {}", e);
                }
            }
            _ = tokio::signal::ctrl_c() => {
                println!("\n🛑 Shutting down...");
            }
        }
    }

    controller
        .send_message(ProfileControllerMessage::Shutdown)
        .map_err(|e| anyhow::anyhow!("Failed to shut down profile controller: {}", e))?;

    if failures > 0 {
        anyhow::bail!("{} of {} lookups failed", failures, lookups.len());
    }

    Ok(())
}
