// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication endpoints.
//!
//! Credentials and sessions live in the external identity provider; these
//! handlers broker sign-in/out and token refresh, and attach the caller's
//! classified tenant context to the login response so clients learn who
//! they are in one round trip.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::{Auth, BearerToken, Permission, Principal, PrincipalContext, RoleClass};
use crate::error::ApiError;
use crate::identity::{IdentityError, UserUpdates};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ChangePasswordRequest {
    pub current_password: String,
    pub new_password: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ForgotPasswordRequest {
    pub email: String,
}

/// The caller's resolved tenant context, embedded in login and `/me`.
#[derive(Debug, Serialize, ToSchema)]
pub struct UserContext {
    /// Identity-provider account id.
    pub id: String,
    pub email: String,
    pub role: RoleClass,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub company: Option<CompanySummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<EmployeeSummary>,
    /// Effective permissions (empty for company admins, who hold all).
    pub permissions: Vec<Permission>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanySummary {
    pub id: String,
    pub name: String,
    pub subscription_plan: String,
    pub subscription_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct EmployeeSummary {
    pub id: String,
    pub name: String,
    pub is_admin: bool,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub user: UserContext,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct SessionResponse {
    pub access_token: String,
    pub refresh_token: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl From<&PrincipalContext> for UserContext {
    fn from(ctx: &PrincipalContext) -> Self {
        Self {
            id: ctx.identity.id.clone(),
            email: ctx.identity.email.clone(),
            role: ctx.role_class,
            company: ctx.company.as_ref().map(|c| CompanySummary {
                id: c.id.clone(),
                name: c.name.clone(),
                subscription_plan: c.subscription.name.clone(),
                subscription_valid: c.is_subscription_valid(),
                subscription_end_date: c.subscription_end_date,
            }),
            employee: ctx.employee.as_ref().map(|e| EmployeeSummary {
                id: e.id.clone(),
                name: e.name.clone(),
                is_admin: e.is_admin,
            }),
            permissions: ctx.permissions.iter().copied().collect(),
        }
    }
}

/// Sign in with email and password.
///
/// Tenant callers whose company subscription has lapsed are rejected here
/// rather than being handed a token they cannot use.
#[utoipa::path(
    post,
    path = "/v1/auth/login",
    tag = "Auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Signed in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 403, description = "Subscription expired"),
    )
)]
pub async fn login(
    State(state): State<AppState>,
    Json(request): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, ApiError> {
    let (session, identity) = state.identity.sign_in(&request.email, &request.password).await?;

    let directory = state.directory.read().await;
    let ctx = state.classifier.classify(&directory, &identity, None);
    drop(directory);

    if ctx.role_class != RoleClass::SuperAdmin {
        if let Some(company) = &ctx.company {
            if !company.is_subscription_valid() {
                return Err(crate::auth::AuthError::SubscriptionExpired.into());
            }
        }
    }

    Ok(Json(LoginResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
        user: UserContext::from(&ctx),
    }))
}

/// Invalidate the current session.
#[utoipa::path(
    post,
    path = "/v1/auth/logout",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Signed out", body = MessageResponse),
        (status = 401, description = "No token provided"),
    )
)]
pub async fn logout(
    State(state): State<AppState>,
    BearerToken(token): BearerToken,
) -> Result<Json<MessageResponse>, ApiError> {
    state.identity.sign_out(&token).await?;
    Ok(Json(MessageResponse {
        message: "Logged out successfully".to_string(),
    }))
}

/// Exchange a refresh token for a new session.
#[utoipa::path(
    post,
    path = "/v1/auth/refresh",
    tag = "Auth",
    request_body = RefreshRequest,
    responses(
        (status = 200, description = "Session refreshed", body = SessionResponse),
        (status = 401, description = "Invalid refresh token"),
    )
)]
pub async fn refresh(
    State(state): State<AppState>,
    Json(request): Json<RefreshRequest>,
) -> Result<Json<SessionResponse>, ApiError> {
    let session = state.identity.refresh_token(&request.refresh_token).await?;
    Ok(Json(SessionResponse {
        access_token: session.access_token,
        refresh_token: session.refresh_token,
    }))
}

/// Get the caller's classified context.
#[utoipa::path(
    get,
    path = "/v1/auth/me",
    tag = "Auth",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Caller context", body = UserContext),
        (status = 401, description = "Invalid or missing token"),
    )
)]
pub async fn me(Principal(ctx): Principal) -> Json<UserContext> {
    Json(UserContext::from(&ctx))
}

/// Change the caller's password.
///
/// The current password is re-verified with the provider before the
/// change is applied.
#[utoipa::path(
    post,
    path = "/v1/auth/change-password",
    tag = "Auth",
    security(("bearer" = [])),
    request_body = ChangePasswordRequest,
    responses(
        (status = 200, description = "Password changed", body = MessageResponse),
        (status = 401, description = "Current password is incorrect"),
    )
)]
pub async fn change_password(
    State(state): State<AppState>,
    Auth(identity): Auth,
    Json(request): Json<ChangePasswordRequest>,
) -> Result<Json<MessageResponse>, ApiError> {
    state
        .identity
        .sign_in(&identity.email, &request.current_password)
        .await
        .map_err(|err| match err {
            IdentityError::InvalidCredentials => {
                ApiError::unauthorized("Current password is incorrect")
            }
            other => other.into(),
        })?;

    state
        .identity
        .update_user(&identity.id, UserUpdates::password(request.new_password))
        .await?;

    Ok(Json(MessageResponse {
        message: "Password changed successfully".to_string(),
    }))
}

/// Trigger the provider's password-reset email flow.
///
/// Always answers the same way so the endpoint cannot be used to probe
/// which emails have accounts.
#[utoipa::path(
    post,
    path = "/v1/auth/forgot-password",
    tag = "Auth",
    request_body = ForgotPasswordRequest,
    responses(
        (status = 200, description = "Reset email requested", body = MessageResponse),
    )
)]
pub async fn forgot_password(
    State(state): State<AppState>,
    Json(request): Json<ForgotPasswordRequest>,
) -> Json<MessageResponse> {
    if let Err(err) = state.identity.send_password_reset(&request.email).await {
        tracing::warn!(error = %err, "password reset request failed");
    }
    Json(MessageResponse {
        message: "If the account exists, a password reset email has been sent".to_string(),
    })
}
