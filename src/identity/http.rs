// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! GoTrue-compatible REST client for the external identity provider.
//!
//! Two API keys are used: the anon key for end-user flows (sign-in,
//! verification, refresh) and the service key for the admin surface
//! (account create/update/delete). The service key never leaves this
//! module.

use std::time::Duration;

use serde::Deserialize;
use serde_json::json;
use url::Url;

use crate::auth::VerifiedIdentity;

use super::{IdentityError, Session, UserUpdates};

/// Request timeout for all provider calls. There are no retries; a slow
/// provider fails the request closed.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Ban duration passed to the admin API; the provider has no permanent
/// flag, so ~100 years stands in for one.
const BAN_FOREVER: &str = "876000h";

#[derive(Debug, Deserialize)]
struct UserBody {
    id: String,
    #[serde(default)]
    email: Option<String>,
}

#[derive(Debug, Deserialize)]
struct SessionBody {
    access_token: String,
    refresh_token: String,
    user: UserBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    #[serde(default, alias = "msg", alias = "error_description")]
    message: Option<String>,
}

/// HTTP identity provider client.
pub struct HttpIdentityClient {
    base_url: Url,
    anon_key: String,
    service_key: String,
    client: reqwest::Client,
}

impl HttpIdentityClient {
    /// Create a client against a provider base URL (e.g.
    /// `https://project.supabase.co`).
    pub fn new(base_url: Url, anon_key: impl Into<String>, service_key: impl Into<String>) -> Self {
        Self {
            base_url,
            anon_key: anon_key.into(),
            service_key: service_key.into(),
            client: reqwest::Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to create HTTP client"),
        }
    }

    fn endpoint(&self, path: &str) -> Result<Url, IdentityError> {
        self.base_url
            .join(path)
            .map_err(|e| IdentityError::Unavailable(format!("bad identity URL: {e}")))
    }

    async fn read_error(response: reqwest::Response) -> String {
        let status = response.status();
        match response.json::<ErrorBody>().await {
            Ok(ErrorBody { message: Some(msg) }) => msg,
            _ => format!("HTTP {status} from identity provider"),
        }
    }

    pub async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let response = self
            .client
            .get(self.endpoint("/auth/v1/user")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        match response.status() {
            s if s.is_success() => {
                let user: UserBody = response
                    .json()
                    .await
                    .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
                Ok(VerifiedIdentity {
                    id: user.id,
                    email: user.email.unwrap_or_default(),
                })
            }
            s if s.as_u16() == 401 || s.as_u16() == 403 => Err(IdentityError::InvalidToken),
            _ => Err(IdentityError::Unavailable(Self::read_error(response).await)),
        }
    }

    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Session, VerifiedIdentity), IdentityError> {
        let mut url = self.endpoint("/auth/v1/token")?;
        url.query_pairs_mut().append_pair("grant_type", "password");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email, "password": password }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if response.status().is_client_error() {
            return Err(IdentityError::InvalidCredentials);
        }
        if !response.status().is_success() {
            return Err(IdentityError::Unavailable(Self::read_error(response).await));
        }

        let body: SessionBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        let identity = VerifiedIdentity {
            id: body.user.id,
            email: body.user.email.unwrap_or_else(|| email.to_string()),
        };
        let session = Session {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
        };
        Ok((session, identity))
    }

    pub async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.endpoint("/auth/v1/logout")?)
            .header("apikey", &self.anon_key)
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(IdentityError::Rejected(Self::read_error(response).await))
        }
    }

    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        let mut url = self.endpoint("/auth/v1/token")?;
        url.query_pairs_mut()
            .append_pair("grant_type", "refresh_token");

        let response = self
            .client
            .post(url)
            .header("apikey", &self.anon_key)
            .json(&json!({ "refresh_token": refresh_token }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if response.status().is_client_error() {
            return Err(IdentityError::InvalidToken);
        }
        if !response.status().is_success() {
            return Err(IdentityError::Unavailable(Self::read_error(response).await));
        }

        let body: SessionBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(Session {
            access_token: body.access_token,
            refresh_token: body.refresh_token,
        })
    }

    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<String, IdentityError> {
        let response = self
            .client
            .post(self.endpoint("/auth/v1/admin/users")?)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&json!({
                "email": email,
                "password": password,
                "email_confirm": true,
                "user_metadata": metadata,
            }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if response.status().is_client_error() {
            return Err(IdentityError::Rejected(Self::read_error(response).await));
        }
        if !response.status().is_success() {
            return Err(IdentityError::Unavailable(Self::read_error(response).await));
        }

        let user: UserBody = response
            .json()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;
        Ok(user.id)
    }

    pub async fn update_user(&self, id: &str, updates: UserUpdates) -> Result<(), IdentityError> {
        let mut body = serde_json::Map::new();
        if let Some(password) = updates.password {
            body.insert("password".to_string(), json!(password));
        }
        if let Some(banned) = updates.banned {
            let duration = if banned { BAN_FOREVER } else { "none" };
            body.insert("ban_duration".to_string(), json!(duration));
        }

        let response = self
            .client
            .put(self.endpoint(&format!("/auth/v1/admin/users/{id}"))?)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .json(&serde_json::Value::Object(body))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else if response.status().is_client_error() {
            Err(IdentityError::Rejected(Self::read_error(response).await))
        } else {
            Err(IdentityError::Unavailable(Self::read_error(response).await))
        }
    }

    pub async fn delete_user(&self, id: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .delete(self.endpoint(&format!("/auth/v1/admin/users/{id}"))?)
            .header("apikey", &self.service_key)
            .bearer_auth(&self.service_key)
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else if response.status().is_client_error() {
            Err(IdentityError::Rejected(Self::read_error(response).await))
        } else {
            Err(IdentityError::Unavailable(Self::read_error(response).await))
        }
    }

    pub async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        let response = self
            .client
            .post(self.endpoint("/auth/v1/recover")?)
            .header("apikey", &self.anon_key)
            .json(&json!({ "email": email }))
            .send()
            .await
            .map_err(|e| IdentityError::Unavailable(e.to_string()))?;

        if response.status().is_success() {
            Ok(())
        } else {
            Err(IdentityError::Rejected(Self::read_error(response).await))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client() -> HttpIdentityClient {
        HttpIdentityClient::new(
            Url::parse("https://identity.example.test").unwrap(),
            "anon",
            "service",
        )
    }

    #[test]
    fn endpoint_joins_paths() {
        let c = client();
        assert_eq!(
            c.endpoint("/auth/v1/user").unwrap().as_str(),
            "https://identity.example.test/auth/v1/user"
        );
    }

    #[test]
    fn error_body_reads_gotrue_aliases() {
        let body: ErrorBody = serde_json::from_str(r#"{"msg":"User already registered"}"#).unwrap();
        assert_eq!(body.message.as_deref(), Some("User already registered"));
    }
}
