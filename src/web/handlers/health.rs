use salvo::prelude::*;
use serde_json::json;
use tracing::warn;

use crate::web::app_state;

#[handler]
pub async fn health_check(depot: &mut Depot, res: &mut Response) {
    let state = match app_state(depot) {
        Ok(state) => state.clone(),
        Err(err) => {
            err.write_to(res);
            return;
        }
    };

    let uptime_seconds = state.started_at.elapsed().as_secs();
    match state.db_manager.ping().await {
        Ok(()) => res.render(Json(json!({
            "status": "ok",
            "database": "ok",
            "uptime_seconds": uptime_seconds,
            "version": env!("CARGO_PKG_VERSION"),
        }))),
        Err(err) => {
            warn!("health check failed: {}", err);
            res.status_code(StatusCode::SERVICE_UNAVAILABLE);
            res.render(Json(json!({
                "status": "unavailable",
                "database": err.to_string(),
                "uptime_seconds": uptime_seconds,
            })));
        }
    }
}
