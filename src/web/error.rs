use salvo::http::StatusCode;
use salvo::prelude::*;
use thiserror::Error;
use tracing::{error, warn};

use crate::tracker::TrackerError;
use crate::web::metrics::Metrics;
use crate::web::views;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    BadRequest(String),
    #[error("{0}")]
    NotFound(String),
    #[error("{0}")]
    Internal(String),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Message shown to the client. Internal details stay in the logs.
    fn public_message(&self) -> String {
        match self {
            AppError::Internal(_) => "Something went wrong. Please try again.".to_string(),
            other => other.to_string(),
        }
    }

    pub fn write_to(&self, res: &mut Response) {
        let status = self.status();
        if status.is_server_error() {
            error!("request failed with {}: {}", status, self);
        } else {
            warn!("request rejected with {}: {}", status, self);
        }
        Metrics::request_failed();

        res.status_code(status);
        res.render(Text::Html(views::error_page(status, &self.public_message())));
    }
}

impl From<TrackerError> for AppError {
    fn from(value: TrackerError) -> Self {
        match value {
            TrackerError::Database(err) => AppError::Internal(err.to_string()),
            err @ TrackerError::UserNotFound(_) => AppError::NotFound(err.to_string()),
            TrackerError::InvalidInput(message) => AppError::BadRequest(message),
        }
    }
}

#[cfg(test)]
mod tests {
    use salvo::http::StatusCode;

    use super::AppError;
    use crate::db::DatabaseError;
    use crate::tracker::TrackerError;

    #[test]
    fn tracker_errors_map_to_statuses() {
        let missing = AppError::from(TrackerError::UserNotFound(9));
        assert_eq!(missing.status(), StatusCode::NOT_FOUND);
        assert_eq!(missing.to_string(), "user 9 does not exist");

        let invalid = AppError::from(TrackerError::InvalidInput("name cannot be empty".into()));
        assert_eq!(invalid.status(), StatusCode::BAD_REQUEST);

        let db = AppError::from(TrackerError::Database(DatabaseError::Query("boom".into())));
        assert_eq!(db.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn internal_details_are_not_shown() {
        let err = AppError::Internal("password authentication failed".into());
        assert!(!err.public_message().contains("password"));

        let bad = AppError::BadRequest("missing user".into());
        assert_eq!(bad.public_message(), "missing user");
    }
}
