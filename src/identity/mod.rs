// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Identity Provider Integration
//!
//! Authentication is delegated entirely to an external identity provider.
//! This module exposes the capability surface the rest of the service
//! consumes: token verification, sign-in/out, token refresh, and account
//! management (create, update, ban, delete, password reset).
//!
//! ## Modes
//!
//! - **Http** — production mode, REST calls against a GoTrue-compatible
//!   provider (`IDENTITY_URL` configured).
//! - **Fixture** — development/test mode with in-memory accounts, used
//!   when no provider is configured.
//!
//! Provider unavailability fails the request closed; there are no retries.

pub mod http;

use std::collections::HashMap;
use std::sync::Mutex;

use uuid::Uuid;

pub use http::HttpIdentityClient;

use crate::auth::VerifiedIdentity;

/// Errors surfaced by the identity provider.
#[derive(Debug, thiserror::Error)]
pub enum IdentityError {
    /// Sign-in rejected (wrong email/password or banned account)
    #[error("invalid credentials")]
    InvalidCredentials,
    /// Token rejected during verification or refresh
    #[error("invalid or expired token")]
    InvalidToken,
    /// The provider refused an account operation (e.g. duplicate email)
    #[error("{0}")]
    Rejected(String),
    /// Transport failure or unexpected provider response
    #[error("{0}")]
    Unavailable(String),
}

/// Access/refresh token pair returned by sign-in and refresh.
#[derive(Debug, Clone)]
pub struct Session {
    pub access_token: String,
    pub refresh_token: String,
}

/// Account mutations supported by the provider's admin surface.
#[derive(Debug, Clone, Default)]
pub struct UserUpdates {
    pub password: Option<String>,
    pub banned: Option<bool>,
}

impl UserUpdates {
    pub fn password(password: impl Into<String>) -> Self {
        Self {
            password: Some(password.into()),
            ..Self::default()
        }
    }

    pub fn ban() -> Self {
        Self {
            banned: Some(true),
            ..Self::default()
        }
    }
}

/// The identity provider handle held in application state.
pub enum IdentityService {
    /// Production mode: GoTrue-compatible REST provider.
    Http(HttpIdentityClient),
    /// Development/test mode: in-memory accounts, no external calls.
    Fixture(FixtureIdentity),
}

impl IdentityService {
    /// Verify a bearer token and return the identity behind it.
    pub async fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        match self {
            IdentityService::Http(client) => client.verify_token(token).await,
            IdentityService::Fixture(fixture) => fixture.verify_token(token),
        }
    }

    /// Password sign-in. Returns the session and the verified identity.
    pub async fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Session, VerifiedIdentity), IdentityError> {
        match self {
            IdentityService::Http(client) => client.sign_in(email, password).await,
            IdentityService::Fixture(fixture) => fixture.sign_in(email, password),
        }
    }

    /// Invalidate the session behind a token.
    pub async fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        match self {
            IdentityService::Http(client) => client.sign_out(token).await,
            IdentityService::Fixture(fixture) => fixture.sign_out(token),
        }
    }

    /// Exchange a refresh token for a new session.
    pub async fn refresh_token(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        match self {
            IdentityService::Http(client) => client.refresh_token(refresh_token).await,
            IdentityService::Fixture(fixture) => fixture.refresh_token(refresh_token),
        }
    }

    /// Create a provider account. Returns the new account id.
    pub async fn create_user(
        &self,
        email: &str,
        password: &str,
        metadata: serde_json::Value,
    ) -> Result<String, IdentityError> {
        match self {
            IdentityService::Http(client) => client.create_user(email, password, metadata).await,
            IdentityService::Fixture(fixture) => fixture.create_user(email, password),
        }
    }

    /// Apply account mutations (password change, ban).
    pub async fn update_user(&self, id: &str, updates: UserUpdates) -> Result<(), IdentityError> {
        match self {
            IdentityService::Http(client) => client.update_user(id, updates).await,
            IdentityService::Fixture(fixture) => fixture.update_user(id, updates),
        }
    }

    /// Delete a provider account (compensating rollback path).
    pub async fn delete_user(&self, id: &str) -> Result<(), IdentityError> {
        match self {
            IdentityService::Http(client) => client.delete_user(id).await,
            IdentityService::Fixture(fixture) => fixture.delete_user(id),
        }
    }

    /// Trigger the provider's password-reset email flow.
    pub async fn send_password_reset(&self, email: &str) -> Result<(), IdentityError> {
        match self {
            IdentityService::Http(client) => client.send_password_reset(email).await,
            IdentityService::Fixture(_) => Ok(()),
        }
    }
}

/// An in-memory account held by [`FixtureIdentity`].
#[derive(Debug, Clone)]
struct FixtureAccount {
    id: String,
    email: String,
    password: String,
    banned: bool,
}

/// In-memory identity provider for development and tests.
///
/// Tokens are opaque strings issued at sign-in (or minted directly with
/// [`FixtureIdentity::issue_token`]) and map back to account ids.
#[derive(Default)]
pub struct FixtureIdentity {
    inner: Mutex<FixtureState>,
}

#[derive(Default)]
struct FixtureState {
    accounts: HashMap<String, FixtureAccount>,
    /// access token → account id
    tokens: HashMap<String, String>,
    /// refresh token → account id
    refresh_tokens: HashMap<String, String>,
}

impl FixtureIdentity {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register an account and return its id.
    pub fn seed_account(&self, email: &str, password: &str) -> String {
        let id = Uuid::new_v4().to_string();
        let mut state = self.inner.lock().unwrap();
        state.accounts.insert(
            id.clone(),
            FixtureAccount {
                id: id.clone(),
                email: email.to_string(),
                password: password.to_string(),
                banned: false,
            },
        );
        id
    }

    /// Mint a valid access token for an already-seeded account.
    pub fn issue_token(&self, email: &str) -> Option<String> {
        let mut state = self.inner.lock().unwrap();
        let id = state
            .accounts
            .values()
            .find(|a| a.email == email)?
            .id
            .clone();
        let token = format!("fixture-token-{}", Uuid::new_v4());
        state.tokens.insert(token.clone(), id);
        Some(token)
    }

    fn verify_token(&self, token: &str) -> Result<VerifiedIdentity, IdentityError> {
        let state = self.inner.lock().unwrap();
        let id = state.tokens.get(token).ok_or(IdentityError::InvalidToken)?;
        let account = state.accounts.get(id).ok_or(IdentityError::InvalidToken)?;
        if account.banned {
            return Err(IdentityError::InvalidToken);
        }
        Ok(VerifiedIdentity {
            id: account.id.clone(),
            email: account.email.clone(),
        })
    }

    fn sign_in(
        &self,
        email: &str,
        password: &str,
    ) -> Result<(Session, VerifiedIdentity), IdentityError> {
        let mut state = self.inner.lock().unwrap();
        let account = state
            .accounts
            .values()
            .find(|a| a.email == email && a.password == password && !a.banned)
            .cloned()
            .ok_or(IdentityError::InvalidCredentials)?;

        let session = Session {
            access_token: format!("fixture-token-{}", Uuid::new_v4()),
            refresh_token: format!("fixture-refresh-{}", Uuid::new_v4()),
        };
        state
            .tokens
            .insert(session.access_token.clone(), account.id.clone());
        state
            .refresh_tokens
            .insert(session.refresh_token.clone(), account.id.clone());

        let identity = VerifiedIdentity {
            id: account.id,
            email: account.email,
        };
        Ok((session, identity))
    }

    fn sign_out(&self, token: &str) -> Result<(), IdentityError> {
        let mut state = self.inner.lock().unwrap();
        state.tokens.remove(token);
        Ok(())
    }

    fn refresh_token(&self, refresh_token: &str) -> Result<Session, IdentityError> {
        let mut state = self.inner.lock().unwrap();
        let id = state
            .refresh_tokens
            .remove(refresh_token)
            .ok_or(IdentityError::InvalidToken)?;

        let session = Session {
            access_token: format!("fixture-token-{}", Uuid::new_v4()),
            refresh_token: format!("fixture-refresh-{}", Uuid::new_v4()),
        };
        state.tokens.insert(session.access_token.clone(), id.clone());
        state
            .refresh_tokens
            .insert(session.refresh_token.clone(), id);
        Ok(session)
    }

    fn create_user(&self, email: &str, password: &str) -> Result<String, IdentityError> {
        let mut state = self.inner.lock().unwrap();
        if state.accounts.values().any(|a| a.email == email) {
            return Err(IdentityError::Rejected(format!(
                "A user with email {email} already exists"
            )));
        }
        let id = Uuid::new_v4().to_string();
        state.accounts.insert(
            id.clone(),
            FixtureAccount {
                id: id.clone(),
                email: email.to_string(),
                password: password.to_string(),
                banned: false,
            },
        );
        Ok(id)
    }

    fn update_user(&self, id: &str, updates: UserUpdates) -> Result<(), IdentityError> {
        let mut state = self.inner.lock().unwrap();
        let account = state
            .accounts
            .get_mut(id)
            .ok_or_else(|| IdentityError::Rejected("User not found".to_string()))?;
        if let Some(password) = updates.password {
            account.password = password;
        }
        if let Some(banned) = updates.banned {
            account.banned = banned;
        }
        Ok(())
    }

    fn delete_user(&self, id: &str) -> Result<(), IdentityError> {
        let mut state = self.inner.lock().unwrap();
        if state.accounts.remove(id).is_none() {
            return Err(IdentityError::Rejected("User not found".to_string()));
        }
        state.tokens.retain(|_, account_id| account_id != id);
        state.refresh_tokens.retain(|_, account_id| account_id != id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_and_verify_round_trip() {
        let fixture = FixtureIdentity::new();
        fixture.seed_account("jo@acme.test", "secret");

        let (session, identity) = fixture.sign_in("jo@acme.test", "secret").unwrap();
        assert_eq!(identity.email, "jo@acme.test");

        let verified = fixture.verify_token(&session.access_token).unwrap();
        assert_eq!(verified.id, identity.id);
    }

    #[test]
    fn wrong_password_is_rejected() {
        let fixture = FixtureIdentity::new();
        fixture.seed_account("jo@acme.test", "secret");
        assert!(matches!(
            fixture.sign_in("jo@acme.test", "wrong"),
            Err(IdentityError::InvalidCredentials)
        ));
    }

    #[test]
    fn banned_account_fails_verification() {
        let fixture = FixtureIdentity::new();
        let id = fixture.seed_account("jo@acme.test", "secret");
        let token = fixture.issue_token("jo@acme.test").unwrap();

        fixture.update_user(&id, UserUpdates::ban()).unwrap();
        assert!(matches!(
            fixture.verify_token(&token),
            Err(IdentityError::InvalidToken)
        ));
    }

    #[test]
    fn refresh_rotates_the_session() {
        let fixture = FixtureIdentity::new();
        fixture.seed_account("jo@acme.test", "secret");
        let (session, _) = fixture.sign_in("jo@acme.test", "secret").unwrap();

        let rotated = fixture.refresh_token(&session.refresh_token).unwrap();
        assert_ne!(rotated.access_token, session.access_token);
        // The old refresh token is single-use.
        assert!(fixture.refresh_token(&session.refresh_token).is_err());
    }

    #[test]
    fn deleted_user_tokens_are_revoked() {
        let fixture = FixtureIdentity::new();
        let id = fixture.seed_account("jo@acme.test", "secret");
        let token = fixture.issue_token("jo@acme.test").unwrap();

        fixture.delete_user(&id).unwrap();
        assert!(fixture.verify_token(&token).is_err());
    }

    #[test]
    fn duplicate_email_is_rejected() {
        let fixture = FixtureIdentity::new();
        fixture.seed_account("jo@acme.test", "secret");
        assert!(matches!(
            fixture.create_user("jo@acme.test", "other"),
            Err(IdentityError::Rejected(_))
        ));
    }
}
