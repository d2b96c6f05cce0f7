// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Axum extractors composing the authorization gate.
//!
//! Routes declare the checks they need by choosing an extractor:
//!
//! ```rust,ignore
//! // Authenticated only
//! async fn me(Principal(ctx): Principal) -> impl IntoResponse { … }
//!
//! // Authenticated → TenantResolved → SubscriptionValid
//! async fn profile(tenant: Tenant) -> impl IntoResponse { … }
//!
//! // … → AdminRequired
//! async fn create_employee(TenantAdmin(tenant): TenantAdmin) -> … { … }
//!
//! // Super-admin surface
//! async fn list_companies(SuperAdminOnly(ctx): SuperAdminOnly) -> … { … }
//! ```
//!
//! Fine-grained permission checks run inside handlers via
//! [`gate::require_any_permission`].

use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};

use crate::identity::IdentityError;
use crate::models::Company;
use crate::state::AppState;

use super::error::AuthError;
use super::gate;
use super::principal::{PrincipalContext, VerifiedIdentity};

/// Header carrying the requested tenant on tenant-scoped routes. When
/// absent, the caller's own company is implied.
pub const COMPANY_ID_HEADER: &str = "x-company-id";

fn bearer_token(parts: &Parts) -> Result<String, AuthError> {
    let auth_header = parts
        .headers
        .get(AUTHORIZATION)
        .ok_or(AuthError::MissingAuthHeader)?
        .to_str()
        .map_err(|_| AuthError::InvalidAuthHeader)?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or(AuthError::InvalidAuthHeader)?
        .trim();
    if token.is_empty() {
        return Err(AuthError::MissingAuthHeader);
    }
    Ok(token.to_string())
}

fn requested_company_id(parts: &Parts) -> Option<String> {
    parts
        .headers
        .get(COMPANY_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
}

fn map_verify_error(err: IdentityError) -> AuthError {
    match err {
        IdentityError::Unavailable(msg) => AuthError::IdentityUnavailable(msg),
        _ => AuthError::InvalidToken,
    }
}

/// Raw bearer token, for handlers that pass it through to the identity
/// provider (logout).
pub struct BearerToken(pub String);

impl FromRequestParts<AppState> for BearerToken {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, _state: &AppState) -> Result<Self, Self::Rejection> {
        bearer_token(parts).map(BearerToken)
    }
}

/// Authentication gate: verifies the bearer token with the identity
/// provider and yields the verified identity.
pub struct Auth(pub VerifiedIdentity);

impl FromRequestParts<AppState> for Auth {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        // Reuse an identity a previous extractor already verified.
        if let Some(identity) = parts.extensions.get::<VerifiedIdentity>().cloned() {
            return Ok(Auth(identity));
        }

        let token = bearer_token(parts)?;
        let identity = state
            .identity
            .verify_token(&token)
            .await
            .map_err(map_verify_error)?;

        parts.extensions.insert(identity.clone());
        Ok(Auth(identity))
    }
}

/// Classification gate: verified identity plus optional `x-company-id`
/// resolved into a [`PrincipalContext`]. Never rejects on
/// classification; `Unknown` flows through for tenant gates to refuse.
pub struct Principal(pub PrincipalContext);

impl FromRequestParts<AppState> for Principal {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if let Some(ctx) = parts.extensions.get::<PrincipalContext>().cloned() {
            return Ok(Principal(ctx));
        }

        let Auth(identity) = Auth::from_request_parts(parts, state).await?;
        let requested = requested_company_id(parts);

        let directory = state.directory.read().await;
        let ctx = state
            .classifier
            .classify(&directory, &identity, requested.as_deref());
        drop(directory);

        parts.extensions.insert(ctx.clone());
        Ok(Principal(ctx))
    }
}

/// Tenant gate: Authenticated → TenantResolved → SubscriptionValid.
pub struct Tenant {
    pub company: Company,
    pub principal: PrincipalContext,
}

impl FromRequestParts<AppState> for Tenant {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Principal(ctx) = Principal::from_request_parts(parts, state).await?;
        let company_requested = requested_company_id(parts).is_some();

        let company = gate::require_tenant(&ctx, company_requested)?.clone();
        gate::require_valid_subscription(&ctx)?;

        Ok(Tenant {
            company,
            principal: ctx,
        })
    }
}

/// Admin gate on top of [`Tenant`].
pub struct TenantAdmin(pub Tenant);

impl FromRequestParts<AppState> for TenantAdmin {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let tenant = Tenant::from_request_parts(parts, state).await?;
        gate::require_tenant_admin(&tenant.principal)?;
        Ok(TenantAdmin(tenant))
    }
}

/// Super-admin gate for the cross-tenant surface. No tenant or
/// subscription checks apply.
pub struct SuperAdminOnly(pub PrincipalContext);

impl FromRequestParts<AppState> for SuperAdminOnly {
    type Rejection = AuthError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let Principal(ctx) = Principal::from_request_parts(parts, state).await?;
        gate::require_super_admin(&ctx)?;
        Ok(SuperAdminOnly(ctx))
    }
}
