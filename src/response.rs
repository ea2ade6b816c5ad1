use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Redirect, Response};
use serde::{Deserialize, Serialize};
use url::form_urlencoded;

#[derive(Serialize, Deserialize, Debug)]
pub struct ApiResponse<T: Serialize> {
    pub status_code: u16,
    pub status_message: String,
    pub data: Option<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// Creates a successful (200 OK) response with data.
    pub fn ok(data: T) -> Self {
        Self::success(StatusCode::OK, data)
    }

    /// Creates a successful response with a specific status code and data.
    pub fn success(status: StatusCode, data: T) -> Self {
        ApiResponse {
            status_code: status.as_u16(),
            status_message: status.canonical_reason().unwrap_or("Success").to_string(),
            data: Some(data),
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        let status =
            StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

        let body = Json(self);

        (status, body).into_response()
    }
}

/// Outcome of a browser form submission: a `303 See Other` redirect whose
/// query string carries the banner the receiving view renders
/// (`?success=...` or `?error=...`), or no banner at all for plain
/// navigation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FormRedirect {
    path: String,
    banner: Option<(BannerStatus, String)>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BannerStatus {
    Success,
    Error,
}

impl BannerStatus {
    fn query_key(self) -> &'static str {
        match self {
            BannerStatus::Success => "success",
            BannerStatus::Error => "error",
        }
    }
}

impl FormRedirect {
    /// Plain navigation, no banner (implicit success).
    pub fn to(path: impl Into<String>) -> Self {
        FormRedirect {
            path: path.into(),
            banner: None,
        }
    }

    pub fn success(path: impl Into<String>, message: impl Into<String>) -> Self {
        FormRedirect {
            path: path.into(),
            banner: Some((BannerStatus::Success, message.into())),
        }
    }

    pub fn error(path: impl Into<String>, message: impl Into<String>) -> Self {
        FormRedirect {
            path: path.into(),
            banner: Some((BannerStatus::Error, message.into())),
        }
    }

    pub fn location(&self) -> String {
        match &self.banner {
            None => self.path.clone(),
            Some((status, message)) => {
                let query: String = form_urlencoded::Serializer::new(String::new())
                    .append_pair(status.query_key(), message)
                    .finish();
                format!("{}?{}", self.path, query)
            }
        }
    }
}

impl IntoResponse for FormRedirect {
    fn into_response(self) -> Response {
        Redirect::to(&self.location()).into_response()
    }
}
