use salvo::prelude::*;

use crate::web::app_state;
use crate::web::metrics::format_prometheus;

#[handler]
pub async fn metrics_endpoint(depot: &mut Depot, res: &mut Response) {
    let state = match app_state(depot) {
        Ok(state) => state,
        Err(err) => {
            err.write_to(res);
            return;
        }
    };

    let uptime_seconds = state.started_at.elapsed().as_secs();
    let active_sessions = state.tracker.sessions().len();

    res.render(Text::Plain(format_prometheus(uptime_seconds, active_sessions)));
}
