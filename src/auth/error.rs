// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authentication and authorization errors.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use super::permissions::{permission_list, Permission};

/// Failure modes of the authorization pipeline.
///
/// Authentication failures (missing/invalid token) map to 401, every
/// authorization failure (wrong tenant, insufficient privilege, expired
/// subscription) maps to 403. Identity-provider unavailability fails the
/// request closed as a server error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthError {
    /// No authorization header present
    MissingAuthHeader,
    /// Authorization header is not `Bearer <token>`
    InvalidAuthHeader,
    /// The identity provider rejected the token
    InvalidToken,
    /// The identity provider could not be reached
    IdentityUnavailable(String),
    /// Route is tenant-scoped but no company could be resolved
    MissingTenantContext,
    /// Caller is not a member of the requested company
    CompanyAccessDenied,
    /// The requested company does not exist
    CompanyNotFound,
    /// The tenant's subscription is inactive or expired
    SubscriptionExpired,
    /// Route requires company-admin or employee-admin privileges
    AdminRequired,
    /// Route requires at least one of the listed permissions
    MissingPermissions(Vec<Permission>),
    /// Route is restricted to super admins
    SuperAdminRequired,
}

#[derive(Serialize)]
struct AuthErrorBody {
    error: String,
    error_code: String,
}

impl AuthError {
    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AuthError::MissingAuthHeader => "missing_auth_header",
            AuthError::InvalidAuthHeader => "invalid_auth_header",
            AuthError::InvalidToken => "invalid_token",
            AuthError::IdentityUnavailable(_) => "identity_unavailable",
            AuthError::MissingTenantContext => "missing_tenant_context",
            AuthError::CompanyAccessDenied => "company_access_denied",
            AuthError::CompanyNotFound => "company_not_found",
            AuthError::SubscriptionExpired => "subscription_expired",
            AuthError::AdminRequired => "admin_required",
            AuthError::MissingPermissions(_) => "missing_permissions",
            AuthError::SuperAdminRequired => "super_admin_required",
        }
    }

    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AuthError::MissingAuthHeader
            | AuthError::InvalidAuthHeader
            | AuthError::InvalidToken => StatusCode::UNAUTHORIZED,
            AuthError::MissingTenantContext
            | AuthError::CompanyAccessDenied
            | AuthError::CompanyNotFound
            | AuthError::SubscriptionExpired
            | AuthError::AdminRequired
            | AuthError::MissingPermissions(_)
            | AuthError::SuperAdminRequired => StatusCode::FORBIDDEN,
            AuthError::IdentityUnavailable(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl std::fmt::Display for AuthError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AuthError::MissingAuthHeader => write!(f, "No token provided"),
            AuthError::InvalidAuthHeader => {
                write!(f, "Invalid authorization header format (expected 'Bearer <token>')")
            }
            AuthError::InvalidToken => write!(f, "Invalid or expired token"),
            AuthError::IdentityUnavailable(msg) => {
                write!(f, "Identity provider unavailable: {msg}")
            }
            AuthError::MissingTenantContext => {
                write!(f, "Missing authentication or company information")
            }
            AuthError::CompanyAccessDenied => write!(f, "Access denied to this company"),
            AuthError::CompanyNotFound => write!(f, "Company not found"),
            AuthError::SubscriptionExpired => write!(
                f,
                "Your company subscription has expired. Please contact your administrator to renew."
            ),
            AuthError::AdminRequired => write!(f, "Admin privileges required"),
            AuthError::MissingPermissions(perms) => {
                write!(f, "Required permissions: {}", permission_list(perms))
            }
            AuthError::SuperAdminRequired => {
                write!(f, "Access denied. Super admin privileges required.")
            }
        }
    }
}

impl std::error::Error for AuthError {}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let body = Json(AuthErrorBody {
            error: self.to_string(),
            error_code: self.error_code().to_string(),
        });
        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;

    #[tokio::test]
    async fn missing_token_returns_401() {
        let response = AuthError::MissingAuthHeader.into_response();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

        let body_bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body: serde_json::Value = serde_json::from_slice(&body_bytes).unwrap();
        assert_eq!(body["error_code"], "missing_auth_header");
        assert_eq!(body["error"], "No token provided");
    }

    #[tokio::test]
    async fn wrong_tenant_returns_403() {
        let response = AuthError::CompanyAccessDenied.into_response();
        assert_eq!(response.status(), StatusCode::FORBIDDEN);
    }

    #[test]
    fn missing_permissions_lists_required_set() {
        let err = AuthError::MissingPermissions(vec![
            Permission::EditEmployees,
            Permission::DeleteEmployees,
        ]);
        assert_eq!(
            err.to_string(),
            "Required permissions: edit_employees, delete_employees"
        );
    }

    #[test]
    fn identity_unavailable_is_server_error() {
        let err = AuthError::IdentityUnavailable("connection refused".to_string());
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
