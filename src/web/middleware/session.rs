use salvo::http::cookie::{Cookie, SameSite};
use salvo::prelude::*;
use tracing::debug;

use crate::tracker::SessionId;
use crate::web::app_state;
use crate::web::metrics::Metrics;

/// Resolves the session cookie into a [`SessionId`] in the depot, minting a
/// new token when the cookie is absent or malformed. Minting stores nothing.
#[handler]
pub async fn session(req: &mut Request, depot: &mut Depot, res: &mut Response, ctrl: &mut FlowCtrl) {
    let state = match app_state(depot) {
        Ok(state) => state.clone(),
        Err(err) => {
            err.write_to(res);
            ctrl.skip_rest();
            return;
        }
    };

    let cookie_name = state.config.tracker.session_cookie.clone();
    let sessions = state.tracker.sessions();

    let existing = req
        .cookie(&cookie_name)
        .and_then(|cookie| SessionId::parse(cookie.value()));

    let session_id = match existing {
        Some(id) => id,
        None => {
            let id = sessions.open();
            Metrics::session_opened();
            debug!("opened session {}", id);
            res.add_cookie(
                Cookie::build((cookie_name, id.to_string()))
                    .path("/")
                    .http_only(true)
                    .same_site(SameSite::Lax)
                    .build(),
            );
            id
        }
    };

    depot.inject(session_id);
    ctrl.call_next(req, depot, res).await;
}
