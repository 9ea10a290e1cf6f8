use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use anyhow::{Context, Result};
use salvo::prelude::*;
use salvo::serve_static::StaticDir;
use tracing::{info, warn};

use crate::config::Config;
use crate::db::DatabaseManager;
use crate::tracker::TrackerCore;

pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod views;

use self::error::AppError;
use self::handlers::{
    health::health_check,
    metrics::metrics_endpoint,
    tracker::{add_country, create_user, index, switch_user},
};
use self::middleware::session::session;

#[derive(Clone)]
pub struct AppState {
    pub tracker: Arc<TrackerCore>,
    pub db_manager: Arc<DatabaseManager>,
    pub config: Arc<Config>,
    pub started_at: Instant,
}

impl AppState {
    pub fn new(
        config: Arc<Config>,
        db_manager: Arc<DatabaseManager>,
        tracker: Arc<TrackerCore>,
    ) -> Self {
        Self {
            tracker,
            db_manager,
            config,
            started_at: Instant::now(),
        }
    }
}

pub fn app_state(depot: &Depot) -> Result<&AppState, AppError> {
    depot
        .obtain::<AppState>()
        .map_err(|_| AppError::Internal("application state is not initialized".to_string()))
}

struct InjectState(AppState);

#[handler]
impl InjectState {
    async fn handle(&self, depot: &mut Depot) {
        depot.inject(self.0.clone());
    }
}

pub fn create_router(state: AppState) -> Router {
    let static_dir = state.config.server.static_dir.clone();
    let metrics_enabled = state.config.metrics.enabled;

    let mut router = Router::new()
        .hoop(InjectState(state))
        .push(Router::with_path("health").get(health_check));

    if metrics_enabled {
        router = router.push(Router::with_path("metrics").get(metrics_endpoint));
    }

    if Path::new(&static_dir).is_dir() {
        router = router.push(Router::with_path("static/{**path}").get(StaticDir::new([static_dir])));
    } else {
        warn!("static directory {} not found, assets will not be served", static_dir);
    }

    router.push(
        Router::new()
            .hoop(session)
            .get(index)
            .push(Router::with_path("add").post(add_country))
            .push(Router::with_path("user").post(switch_user))
            .push(Router::with_path("new").post(create_user)),
    )
}

#[derive(Clone)]
pub struct WebServer {
    config: Arc<Config>,
    state: AppState,
}

impl WebServer {
    pub fn new(
        config: Arc<Config>,
        db_manager: Arc<DatabaseManager>,
        tracker: Arc<TrackerCore>,
    ) -> Self {
        let state = AppState::new(config.clone(), db_manager, tracker);
        Self { config, state }
    }

    pub async fn start(&self) -> Result<()> {
        let bind_addr = format!(
            "{}:{}",
            self.config.server.bind_address, self.config.server.port
        );
        info!("Starting web server on {}", bind_addr);

        let acceptor = TcpListener::new(bind_addr.clone())
            .try_bind()
            .await
            .with_context(|| format!("failed to bind {bind_addr}"))?;
        info!("Server running on http://localhost:{}", self.config.server.port);
        Server::new(acceptor)
            .serve(create_router(self.state.clone()))
            .await;

        Ok(())
    }
}
