use std::sync::Arc;

use salvo::http::header::{HeaderValue, LOCATION};
use salvo::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::tracker::{AddOutcome, IndexOutcome, SessionId, TrackerCore};
use crate::web::error::AppError;
use crate::web::metrics::Metrics;
use crate::web::{app_state, views};

#[derive(Debug, Deserialize)]
struct AddCountryForm {
    country: String,
}

#[derive(Debug, Deserialize)]
struct SwitchUserForm {
    #[serde(default)]
    user: Option<String>,
    #[serde(default)]
    add: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NewUserForm {
    name: String,
    color: String,
}

enum Reply {
    Page(String),
    Redirect(&'static str),
}

fn respond(res: &mut Response, result: Result<Reply, AppError>) {
    match result {
        Ok(Reply::Page(html)) => res.render(Text::Html(html)),
        Ok(Reply::Redirect(location)) => {
            res.status_code(StatusCode::FOUND);
            res.headers_mut()
                .insert(LOCATION, HeaderValue::from_static(location));
        }
        Err(err) => err.write_to(res),
    }
}

fn malformed(err: impl std::fmt::Display) -> AppError {
    AppError::BadRequest(format!("malformed form: {err}"))
}

/// Tracker core plus the session resolved by the session hoop.
fn context(depot: &Depot) -> Result<(Arc<TrackerCore>, SessionId), AppError> {
    let state = app_state(depot)?;
    let session = depot
        .obtain::<SessionId>()
        .copied()
        .map_err(|_| AppError::Internal("session was not resolved for this request".to_string()))?;
    Ok((state.tracker.clone(), session))
}

#[handler]
pub async fn index(depot: &mut Depot, res: &mut Response) {
    respond(res, show_index(depot).await);
}

async fn show_index(depot: &Depot) -> Result<Reply, AppError> {
    let (tracker, session) = context(depot)?;
    match tracker.index(session).await? {
        IndexOutcome::Ready(view) => Ok(Reply::Page(views::index_page(&view))),
        IndexOutcome::NoUsers => {
            debug!("no users yet, rendering the new user form");
            Ok(Reply::Page(views::new_user_page()))
        }
    }
}

#[handler]
pub async fn add_country(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    respond(res, record_country(req, depot).await);
}

async fn record_country(req: &mut Request, depot: &Depot) -> Result<Reply, AppError> {
    let form: AddCountryForm = req.parse_form().await.map_err(malformed)?;
    let (tracker, session) = context(depot)?;

    match tracker.add_country(session, &form.country).await? {
        AddOutcome::Recorded(_) => Metrics::visit_recorded(),
        AddOutcome::NoMatch => Metrics::country_unmatched(),
        AddOutcome::NoUser => warn!("dropping visit to {:?}: no users exist", form.country),
    }

    Ok(Reply::Redirect("/"))
}

#[handler]
pub async fn switch_user(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    respond(res, select_user(req, depot).await);
}

async fn select_user(req: &mut Request, depot: &Depot) -> Result<Reply, AppError> {
    let form: SwitchUserForm = req.parse_form().await.map_err(malformed)?;

    if form.add.as_deref() == Some("new") {
        return Ok(Reply::Page(views::new_user_page()));
    }

    let raw = form
        .user
        .ok_or_else(|| AppError::BadRequest("missing user".to_string()))?;
    let user_id: i32 = raw
        .trim()
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid user id {:?}", raw)))?;

    let (tracker, session) = context(depot)?;
    tracker.switch_user(session, user_id).await?;
    Metrics::user_switched();

    Ok(Reply::Redirect("/"))
}

#[handler]
pub async fn create_user(req: &mut Request, depot: &mut Depot, res: &mut Response) {
    respond(res, add_user(req, depot).await);
}

async fn add_user(req: &mut Request, depot: &Depot) -> Result<Reply, AppError> {
    let form: NewUserForm = req.parse_form().await.map_err(malformed)?;
    let (tracker, session) = context(depot)?;

    tracker.create_user(session, &form.name, &form.color).await?;
    Metrics::user_created();

    Ok(Reply::Redirect("/"))
}
