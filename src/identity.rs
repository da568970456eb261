//! Identity provider contract.
//!
//! Credentials, password hashing and token issuance live in an external
//! GoTrue-compatible service; this module only relays to it.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use thiserror::Error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    config::{CONNECT_TIMEOUT, IdentityConfig, READ_TIMEOUT, REQUEST_TIMEOUT},
    models::ShippingAddress,
};

#[derive(Debug, Error)]
pub enum IdentityError {
    #[error("could not reach the identity provider: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("identity provider rejected the request ({status}): {message}")]
    Rejected { status: u16, message: String },

    #[error("identity provider sent an unreadable body: {0}")]
    Decode(String),
}

impl IdentityError {
    pub fn status(&self) -> Option<u16> {
        match self {
            IdentityError::Rejected { status, .. } => Some(*status),
            IdentityError::Transport(err) => err.status().map(|s| s.as_u16()),
            IdentityError::Decode(_) => None,
        }
    }

    /// 4xx answers mean the caller's input or token was refused, as opposed to
    /// the provider being down.
    pub fn is_rejection(&self) -> bool {
        matches!(self, IdentityError::Rejected { status, .. } if (400..500).contains(status))
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct UserMetadata {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub full_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    /// Saved [`ShippingAddress`] entries, kept as stored.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(value_type = Option<Vec<ShippingAddress>>)]
    pub addresses: Option<Vec<Value>>,
    /// Anything else the provider stores, kept so updates do not drop it.
    #[serde(flatten)]
    #[schema(value_type = Object)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema, PartialEq)]
pub struct IdentityUser {
    pub id: Uuid,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub user_metadata: UserMetadata,
}

fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: serde::Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct TokenBundle {
    pub access_token: String,
    #[serde(default)]
    pub refresh_token: Option<String>,
}

#[derive(Debug, Clone)]
pub struct AuthSession {
    pub tokens: Option<TokenBundle>,
    pub user: Option<IdentityUser>,
}

#[derive(Debug, Clone, Serialize)]
pub struct NewIdentity {
    pub email: String,
    pub password: String,
    pub data: UserMetadata,
}

#[derive(Debug, Clone, Default, Serialize, PartialEq)]
pub struct IdentityUpdate {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user_metadata: Option<UserMetadata>,
}

impl IdentityUpdate {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.password.is_none() && self.user_metadata.is_none()
    }
}

#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn sign_up(&self, identity: &NewIdentity) -> Result<AuthSession, IdentityError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError>;

    /// Resolves a bearer token to the user it was issued for.
    async fn user_for_token(&self, token: &str) -> Result<IdentityUser, IdentityError>;

    /// Admin read by id; `Ok(None)` when the provider does not know the id.
    async fn user_by_id(&self, id: Uuid) -> Result<Option<IdentityUser>, IdentityError>;

    async fn update_user(
        &self,
        id: Uuid,
        update: &IdentityUpdate,
    ) -> Result<IdentityUser, IdentityError>;
}

#[derive(Clone)]
pub struct HttpIdentityProvider {
    http: reqwest::Client,
    base_url: String,
    service_key: String,
}

/// Session-shaped answer from sign-up and password grant. Sign-up without
/// auto-confirm returns the bare user instead.
#[derive(Debug, Deserialize)]
struct SessionBody {
    #[serde(default)]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: Option<String>,
    #[serde(default)]
    user: Option<IdentityUser>,
}

impl HttpIdentityProvider {
    pub fn new(config: &IdentityConfig) -> Result<Self, IdentityError> {
        let http = reqwest::Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .read_timeout(READ_TIMEOUT)
            .timeout(REQUEST_TIMEOUT)
            .build()?;
        Ok(Self {
            http,
            base_url: config.url.trim_end_matches('/').to_string(),
            service_key: config.service_key.clone(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}/auth/v1{}", self.base_url, path)
    }

    fn request(&self, method: reqwest::Method, path: &str) -> reqwest::RequestBuilder {
        self.http
            .request(method, self.url(path))
            .header("apikey", &self.service_key)
    }

    async fn read<T: serde::de::DeserializeOwned>(
        resp: reqwest::Response,
    ) -> Result<T, IdentityError> {
        let status = resp.status();
        if !status.is_success() {
            let body: Value = resp.json().await.unwrap_or(Value::Null);
            let message = ["msg", "message", "error_description", "error"]
                .iter()
                .find_map(|k| body.get(*k).and_then(Value::as_str))
                .unwrap_or("request rejected")
                .to_string();
            return Err(IdentityError::Rejected {
                status: status.as_u16(),
                message,
            });
        }
        resp.json::<T>()
            .await
            .map_err(|e| IdentityError::Decode(e.to_string()))
    }

    fn session_from(body: Value) -> Result<AuthSession, IdentityError> {
        let session: SessionBody = serde_json::from_value(body.clone())
            .map_err(|e| IdentityError::Decode(e.to_string()))?;
        let user = match session.user {
            Some(user) => Some(user),
            None => serde_json::from_value::<IdentityUser>(body).ok(),
        };
        Ok(AuthSession {
            tokens: session.access_token.map(|access_token| TokenBundle {
                access_token,
                refresh_token: session.refresh_token,
            }),
            user,
        })
    }
}

#[async_trait]
impl IdentityProvider for HttpIdentityProvider {
    async fn sign_up(&self, identity: &NewIdentity) -> Result<AuthSession, IdentityError> {
        let resp = self
            .request(reqwest::Method::POST, "/signup")
            .json(identity)
            .send()
            .await?;
        let body: Value = Self::read(resp).await?;
        Self::session_from(body)
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<AuthSession, IdentityError> {
        let resp = self
            .request(reqwest::Method::POST, "/token")
            .query(&[("grant_type", "password")])
            .json(&serde_json::json!({ "email": email, "password": password }))
            .send()
            .await?;
        let body: Value = Self::read(resp).await?;
        Self::session_from(body)
    }

    async fn user_for_token(&self, token: &str) -> Result<IdentityUser, IdentityError> {
        let resp = self
            .request(reqwest::Method::GET, "/user")
            .bearer_auth(token)
            .send()
            .await?;
        Self::read(resp).await
    }

    async fn user_by_id(&self, id: Uuid) -> Result<Option<IdentityUser>, IdentityError> {
        let resp = self
            .request(reqwest::Method::GET, &format!("/admin/users/{id}"))
            .bearer_auth(&self.service_key)
            .send()
            .await?;
        if resp.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        Self::read(resp).await.map(Some)
    }

    async fn update_user(
        &self,
        id: Uuid,
        update: &IdentityUpdate,
    ) -> Result<IdentityUser, IdentityError> {
        let resp = self
            .request(reqwest::Method::PUT, &format!("/admin/users/{id}"))
            .bearer_auth(&self.service_key)
            .json(update)
            .send()
            .await?;
        Self::read(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn metadata_keeps_unknown_keys() {
        let user: IdentityUser = serde_json::from_value(json!({
            "id": "6b7c1a9e-2f7e-4a0c-9d55-0d1d9f3b9a10",
            "email": "a@example.com",
            "user_metadata": { "full_name": "Ann", "is_admin": true }
        }))
        .unwrap();

        assert_eq!(user.user_metadata.full_name.as_deref(), Some("Ann"));
        assert_eq!(user.user_metadata.extra.get("is_admin"), Some(&json!(true)));

        let back = serde_json::to_value(&user.user_metadata).unwrap();
        assert_eq!(back, json!({ "full_name": "Ann", "is_admin": true }));
    }

    #[test]
    fn session_accepts_bare_user_body() {
        let session = HttpIdentityProvider::session_from(json!({
            "id": "6b7c1a9e-2f7e-4a0c-9d55-0d1d9f3b9a10",
            "email": "a@example.com"
        }))
        .unwrap();
        assert!(session.tokens.is_none());
        assert_eq!(
            session.user.and_then(|u| u.email).as_deref(),
            Some("a@example.com")
        );
    }

    #[test]
    fn rejection_is_4xx_only() {
        let refused = IdentityError::Rejected {
            status: 401,
            message: "bad jwt".into(),
        };
        let down = IdentityError::Rejected {
            status: 503,
            message: "unavailable".into(),
        };
        assert!(refused.is_rejection());
        assert!(!down.is_rejection());
    }
}
