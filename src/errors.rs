use crate::identity::IdentityError;
use crate::response::ApiResponse;
use anyhow::anyhow;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use deadpool_diesel::InteractError;
use deadpool_diesel::postgres::PoolError;
use thiserror::Error;
use tracing::error;

#[derive(Debug, Error)]
pub enum AppError {
    #[allow(dead_code)]
    #[error("Bad Request: {0}")]
    BadRequest(String), // 400

    #[error("Unauthorized: {0}")]
    Unauthorized(String), // 401

    #[error("Not Found: {0}")]
    NotFound(String), // 404

    #[error("Internal Server Error: {0}")]
    InternalServerError(#[from] anyhow::Error), // 500
}

impl From<PoolError> for AppError {
    fn from(err: PoolError) -> Self {
        error!("Database pool error encountered: {:?}", err);
        AppError::InternalServerError(anyhow::Error::new(err).context("Database pool error"))
    }
}

impl From<InteractError> for AppError {
    fn from(err: InteractError) -> Self {
        error!("Database interaction error encountered: {:?}", err);
        AppError::InternalServerError(anyhow!("Database interaction error: {}", err))
    }
}

impl From<diesel::result::Error> for AppError {
    fn from(err: diesel::result::Error) -> Self {
        match err {
            diesel::result::Error::NotFound => {
                error!(
                    "Diesel NotFound error reached generic conversion: {:?}",
                    err
                );
                AppError::NotFound("Resource not found (database query)".to_string())
            }
            _ => {
                error!("Unhandled Diesel error encountered: {:?}", err);
                AppError::InternalServerError(
                    anyhow::Error::new(err).context("Database query error"),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::BadRequest(message) => (StatusCode::BAD_REQUEST, message),
            AppError::Unauthorized(message) => (StatusCode::UNAUTHORIZED, message),
            AppError::NotFound(message) => (StatusCode::NOT_FOUND, message),

            AppError::InternalServerError(source) => {
                error!(
                    "Responding with 500 Internal Server Error. Source: {:?}",
                    source
                );
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "An internal server error occurred".to_string(),
                )
            }
        };

        let body = ApiResponse::<()> {
            status_code: status.as_u16(),
            status_message: error_message,
            data: None,
        };

        (status, body).into_response()
    }
}

/// The four per-user progress domains seeded at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeedDomain {
    QuizProgress,
    MissionProgress,
    AchievementProgress,
    LevelStreaks,
}

impl SeedDomain {
    pub fn setup_failure_message(&self) -> &'static str {
        match self {
            SeedDomain::QuizProgress => "Failed to setup user progress",
            SeedDomain::MissionProgress => "Failed to setup mission progress",
            SeedDomain::AchievementProgress => "Failed to setup achievement progress",
            SeedDomain::LevelStreaks => "Failed to setup level streaks",
        }
    }
}

impl std::fmt::Display for SeedDomain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            SeedDomain::QuizProgress => "quiz progress",
            SeedDomain::MissionProgress => "mission progress",
            SeedDomain::AchievementProgress => "achievement progress",
            SeedDomain::LevelStreaks => "level streaks",
        };
        f.write_str(name)
    }
}

/// Failure taxonomy of the signup bootstrap sequence. Every variant renders
/// the short user-facing string the signup view shows in its banner; the
/// underlying cause is logged at the failure site.
///
/// No variant rolls anything back: an identity record can outlive a failed
/// profile insert, and committed progress rows survive a later seeding
/// failure.
#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Auth(#[from] IdentityError),

    #[error("Failed to create user profile")]
    ProfileCreation(#[source] AppError),

    #[error("{}", .domain.setup_failure_message())]
    CatalogRead {
        domain: SeedDomain,
        #[source]
        source: AppError,
    },

    #[error("{}", .domain.setup_failure_message())]
    ProgressSeed {
        domain: SeedDomain,
        #[source]
        source: AppError,
    },
}
