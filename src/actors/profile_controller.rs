use crate::error::StarTallyError;
use crate::github::GitHubApi;
use crate::models::{AppState, ControllerStats, FetchPhase, StateEvent};
use crate::types::{total_stars, Repository, UserProfile};
use anyhow::Result;
use chrono::Utc;
use ractor::{Actor, ActorProcessingErr, ActorRef, RpcReplyPort, SpawnErr};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

pub const USER_ERROR_PREFIX: &str = "Failed to fetch user";
pub const REPOSITORIES_ERROR_PREFIX: &str = "Failed to fetch repositories";

const DEFAULT_EVENT_CAPACITY: usize = 64;
const CALL_TIMEOUT: Duration = Duration::from_secs(5);

/// Single writer for [`AppState`]. Drives the profile -> repositories
/// sequence and publishes a [`StateEvent`] after every transition.
pub struct ProfileController;

/// State for the profile controller
pub struct ProfileControllerState {
    api: Arc<dyn GitHubApi>,
    app: AppState,
    requested_username: String,
    events: broadcast::Sender<StateEvent>,
    stats: ControllerStats,
}

/// Messages the controller can handle
#[derive(Debug)]
pub enum ProfileControllerMessage {
    /// Start a new fetch cycle. Blank usernames are ignored.
    FetchUserData(String),
    /// Completion of the profile call for the given cycle
    UserFetched {
        generation: u64,
        result: Result<UserProfile, StarTallyError>,
    },
    /// Completion of the repositories call for the given cycle
    RepositoriesFetched {
        generation: u64,
        result: Result<Vec<Repository>, StarTallyError>,
    },
    GetState(RpcReplyPort<AppState>),
    Subscribe(RpcReplyPort<broadcast::Receiver<StateEvent>>),
    GetStats(RpcReplyPort<ControllerStats>),
    Shutdown,
}

/// Arguments for starting the controller
pub struct ProfileControllerArgs {
    pub api: Arc<dyn GitHubApi>,
    pub event_capacity: usize,
}

impl ProfileController {
    pub async fn spawn(
        api: Arc<dyn GitHubApi>,
    ) -> std::result::Result<ActorRef<ProfileControllerMessage>, SpawnErr> {
        let args = ProfileControllerArgs {
            api,
            event_capacity: DEFAULT_EVENT_CAPACITY,
        };

        let (actor_ref, _handle) = Actor::spawn(None, ProfileController, args).await?;

        info!("Profile controller started");
        Ok(actor_ref)
    }
}

impl ProfileControllerState {
    fn publish(&mut self) {
        self.app.updated_at = Some(Utc::now());
        // No subscribers is not an error
        let _ = self.events.send(StateEvent {
            requested_username: self.requested_username.clone(),
            state: self.app.clone(),
        });
    }

    /// A completion is applied only if it belongs to the current cycle and
    /// the cycle is still waiting on that call.
    fn accepts(&mut self, generation: u64, expected: FetchPhase) -> bool {
        if generation == self.app.generation && self.app.phase == expected {
            return true;
        }

        self.stats.stale_results_dropped += 1;
        debug!(
            generation,
            current_generation = self.app.generation,
            "Dropping result from superseded fetch cycle"
        );
        false
    }

    fn start_cycle(&mut self, username: String) -> u64 {
        self.app.generation += 1;
        self.stats.cycles_started += 1;
        self.requested_username = username;

        self.app.is_loading = true;
        self.app.error_message = None;
        self.app.total_stars = 0;
        self.app.phase = FetchPhase::LoadingProfile;
        self.publish();

        self.app.generation
    }

    fn fail(&mut self, prefix: &str, err: &StarTallyError) {
        warn!(
            username = %self.requested_username,
            generation = self.app.generation,
            "{}: {}",
            prefix,
            err
        );

        self.stats.cycles_failed += 1;
        self.app.is_loading = false;
        self.app.error_message = Some(format!("{}: {}", prefix, err));
        self.app.phase = FetchPhase::Failed;
        self.publish();
    }
}

#[ractor::async_trait]
impl Actor for ProfileController {
    type Msg = ProfileControllerMessage;
    type State = ProfileControllerState;
    type Arguments = ProfileControllerArgs;

    async fn pre_start(
        &self,
        _myself: ActorRef<Self::Msg>,
        args: Self::Arguments,
    ) -> std::result::Result<Self::State, ActorProcessingErr> {
        let (events, _) = broadcast::channel(args.event_capacity.max(1));

        Ok(ProfileControllerState {
            api: args.api,
            app: AppState::default(),
            requested_username: String::new(),
            events,
            stats: ControllerStats::default(),
        })
    }

    async fn handle(
        &self,
        myself: ActorRef<Self::Msg>,
        message: Self::Msg,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        match message {
            ProfileControllerMessage::FetchUserData(username) => {
                let username = username.trim();
                if username.is_empty() {
                    debug!("Ignoring fetch request with blank username");
                    return Ok(());
                }

                let generation = state.start_cycle(username.to_string());
                info!(username, generation, "Starting fetch cycle");

                let api = state.api.clone();
                let username = username.to_string();
                tokio::spawn(async move {
                    let result = api.fetch_user(&username).await;
                    if let Err(e) =
                        myself.send_message(ProfileControllerMessage::UserFetched { generation, result })
                    {
                        debug!("Profile controller gone before user result arrived: {}", e);
                    }
                });
            }

            ProfileControllerMessage::UserFetched { generation, result } => {
                if !state.accepts(generation, FetchPhase::LoadingProfile) {
                    return Ok(());
                }

                match result {
                    Ok(profile) => {
                        state.app.username = profile.login;
                        state.app.avatar_url = profile.avatar_url;
                        state.app.followers = profile.followers;
                        state.app.public_repos = profile.public_repos;
                        state.app.phase = FetchPhase::LoadingRepositories;
                        state.publish();

                        debug!(
                            username = %state.requested_username,
                            generation,
                            "Profile loaded, fetching repositories"
                        );

                        let api = state.api.clone();
                        let username = state.requested_username.clone();
                        tokio::spawn(async move {
                            let result = api.fetch_repositories(&username).await;
                            if let Err(e) = myself.send_message(
                                ProfileControllerMessage::RepositoriesFetched { generation, result },
                            ) {
                                debug!("Profile controller gone before repositories arrived: {}", e);
                            }
                        });
                    }
                    Err(e) => state.fail(USER_ERROR_PREFIX, &e),
                }
            }

            ProfileControllerMessage::RepositoriesFetched { generation, result } => {
                if !state.accepts(generation, FetchPhase::LoadingRepositories) {
                    return Ok(());
                }

                match result {
                    Ok(repos) => {
                        state.stats.cycles_completed += 1;
                        state.app.total_stars = total_stars(&repos);
                        state.app.is_loading = false;
                        state.app.phase = FetchPhase::Done;
                        state.publish();

                        info!(
                            username = %state.app.username,
                            generation,
                            repositories = repos.len(),
                            total_stars = state.app.total_stars,
                            "Fetch cycle completed"
                        );
                    }
                    Err(e) => state.fail(REPOSITORIES_ERROR_PREFIX, &e),
                }
            }

            ProfileControllerMessage::GetState(reply) => {
                if !reply.is_closed() {
                    let _ = reply.send(state.app.clone());
                }
            }

            ProfileControllerMessage::Subscribe(reply) => {
                if !reply.is_closed() {
                    let _ = reply.send(state.events.subscribe());
                }
            }

            ProfileControllerMessage::GetStats(reply) => {
                if !reply.is_closed() {
                    let _ = reply.send(state.stats.clone());
                }
            }

            ProfileControllerMessage::Shutdown => {
                info!("Shutting down profile controller");
                myself.stop(Some("Shutdown requested".to_string()));
            }
        }

        Ok(())
    }

    async fn post_stop(
        &self,
        _myself: ActorRef<Self::Msg>,
        state: &mut Self::State,
    ) -> std::result::Result<(), ActorProcessingErr> {
        info!(
            cycles_started = state.stats.cycles_started,
            cycles_completed = state.stats.cycles_completed,
            cycles_failed = state.stats.cycles_failed,
            "Profile controller stopped"
        );
        Ok(())
    }
}

/// Fire-and-forget entry point for presentation code.
pub fn fetch_user_data(
    controller: &ActorRef<ProfileControllerMessage>,
    username: &str,
) -> Result<()> {
    controller
        .send_message(ProfileControllerMessage::FetchUserData(username.to_string()))
        .map_err(|e| anyhow::anyhow!("Failed to dispatch fetch for {}: {}", username, e))
}

pub async fn current_state(controller: &ActorRef<ProfileControllerMessage>) -> Result<AppState> {
    call_controller(controller, ProfileControllerMessage::GetState).await
}

pub async fn subscribe(
    controller: &ActorRef<ProfileControllerMessage>,
) -> Result<broadcast::Receiver<StateEvent>> {
    call_controller(controller, ProfileControllerMessage::Subscribe).await
}

pub async fn controller_stats(
    controller: &ActorRef<ProfileControllerMessage>,
) -> Result<ControllerStats> {
    call_controller(controller, ProfileControllerMessage::GetStats).await
}

async fn call_controller<T, F>(controller: &ActorRef<ProfileControllerMessage>, build: F) -> Result<T>
where
    T: Send + 'static,
    F: FnOnce(RpcReplyPort<T>) -> ProfileControllerMessage,
{
    match controller.call(build, Some(CALL_TIMEOUT)).await {
        Ok(ractor::rpc::CallResult::Success(value)) => Ok(value),
        Ok(ractor::rpc::CallResult::Timeout) => {
            Err(anyhow::anyhow!("Timed out waiting for profile controller"))
        }
        Ok(ractor::rpc::CallResult::SenderError) => {
            Err(anyhow::anyhow!("Profile controller dropped the reply"))
        }
        Err(e) => Err(anyhow::anyhow!("Failed to contact profile controller: {}", e)),
    }
}
