use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;
use uuid::Uuid;

/// An account known to the hosted identity provider.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub id: Uuid,
    pub email: String,
}

/// An established login session. Token format and lifetime are the
/// provider's business; the backend only carries the token around.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub access_token: String,
    pub identity: Identity,
}

#[derive(Debug, Error)]
pub enum IdentityError {
    /// The identity service rejected the request (malformed email, email
    /// already registered, ...). The message is surfaced to the caller
    /// verbatim.
    #[error("{0}")]
    Rejected(String),

    #[error("Invalid login credentials")]
    InvalidCredentials,

    #[error("Could not send password reset email: {0}")]
    EmailSend(String),

    #[error("Password update failed: {0}")]
    CredentialUpdate(String),

    #[error("Identity service unreachable: {0}")]
    Unreachable(#[from] reqwest::Error),
}

/// The hosted identity provider, consumed as an opaque collaborator.
/// Handlers receive this as a capability object instead of reading ambient
/// session state.
#[async_trait]
pub trait IdentityService: Send + Sync {
    /// Registers a new identity record and returns it.
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError>;

    /// Validates credentials and establishes a session.
    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError>;

    /// Triggers the provider's out-of-band password reset email.
    async fn reset_password_for_email(&self, email: &str) -> Result<(), IdentityError>;

    /// Replaces the credential of the session's identity.
    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), IdentityError>;

    /// Terminates the session. Callers treat failure as non-fatal.
    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError>;

    /// Resolves the identity behind a session token, `None` if the token is
    /// absent from or no longer known to the provider.
    async fn get_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError>;
}

// wire types

#[derive(Deserialize)]
struct WireUser {
    id: Uuid,
    email: Option<String>,
}

#[derive(Deserialize)]
struct SignUpBody {
    id: Option<Uuid>,
    email: Option<String>,
    user: Option<WireUser>,
}

#[derive(Deserialize)]
struct TokenBody {
    access_token: String,
    user: WireUser,
}

#[derive(Deserialize, Default)]
struct ErrorBody {
    msg: Option<String>,
    message: Option<String>,
    error_description: Option<String>,
}

impl ErrorBody {
    fn into_message(self, fallback: String) -> String {
        self.msg
            .or(self.message)
            .or(self.error_description)
            .unwrap_or(fallback)
    }
}

/// GoTrue-style REST client for the identity provider.
pub struct HttpIdentityService {
    http: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
}

impl HttpIdentityService {
    pub fn new(base_url: Url, api_key: Option<String>) -> Self {
        HttpIdentityService {
            http: reqwest::Client::new(),
            base_url: base_url.as_str().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        let mut builder = self
            .http
            .request(method, format!("{}{}", self.base_url, path));
        if let Some(key) = &self.api_key {
            builder = builder.header("apikey", key);
        }
        builder
    }

    async fn rejection_message(response: reqwest::Response) -> String {
        let fallback = format!("Identity service request failed ({})", response.status());
        match response.json::<ErrorBody>().await {
            Ok(body) => body.into_message(fallback),
            Err(_) => fallback,
        }
    }
}

#[async_trait]
impl IdentityService for HttpIdentityService {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Identity, IdentityError> {
        let response = self
            .request(reqwest::Method::POST, "/signup")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdentityError::Rejected(
                Self::rejection_message(response).await,
            ));
        }

        let body: SignUpBody = response.json().await?;
        let (id, wire_email) = match (body.user, body.id) {
            (Some(user), _) => (user.id, user.email),
            (None, Some(id)) => (id, body.email),
            (None, None) => {
                return Err(IdentityError::Rejected(
                    "Identity service returned no user id".to_string(),
                ));
            }
        };

        debug!("Identity service created identity {}", id);
        Ok(Identity {
            id,
            email: wire_email.unwrap_or_else(|| email.to_string()),
        })
    }

    async fn sign_in_with_password(
        &self,
        email: &str,
        password: &str,
    ) -> Result<Session, IdentityError> {
        let response = self
            .request(reqwest::Method::POST, "/token?grant_type=password")
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;

        let status = response.status();
        if status.is_client_error() {
            debug!("Identity service refused credentials ({})", status);
            return Err(IdentityError::InvalidCredentials);
        }
        if !status.is_success() {
            return Err(IdentityError::Rejected(
                Self::rejection_message(response).await,
            ));
        }

        let body: TokenBody = response.json().await?;
        Ok(Session {
            access_token: body.access_token,
            identity: Identity {
                id: body.user.id,
                email: body.user.email.unwrap_or_else(|| email.to_string()),
            },
        })
    }

    async fn reset_password_for_email(&self, email: &str) -> Result<(), IdentityError> {
        let response = self
            .request(reqwest::Method::POST, "/recover")
            .json(&serde_json::json!({ "email": email }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdentityError::EmailSend(
                Self::rejection_message(response).await,
            ));
        }
        Ok(())
    }

    async fn update_password(
        &self,
        access_token: &str,
        new_password: &str,
    ) -> Result<(), IdentityError> {
        let response = self
            .request(reqwest::Method::PUT, "/user")
            .bearer_auth(access_token)
            .json(&serde_json::json!({ "password": new_password }))
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(IdentityError::CredentialUpdate(
                Self::rejection_message(response).await,
            ));
        }
        Ok(())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), IdentityError> {
        let response = self
            .request(reqwest::Method::POST, "/logout")
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            warn!(
                "Identity service sign-out returned {}; session may outlive the logout",
                response.status()
            );
        }
        Ok(())
    }

    async fn get_user(&self, access_token: &str) -> Result<Option<Identity>, IdentityError> {
        let response = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(access_token)
            .send()
            .await?;

        if !response.status().is_success() {
            return Ok(None);
        }

        let user: WireUser = response.json().await?;
        Ok(Some(Identity {
            id: user.id,
            email: user.email.unwrap_or_default(),
        }))
    }
}
