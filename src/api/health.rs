// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{extract::State, Json};
use serde::Serialize;
use utoipa::ToSchema;

use crate::identity::IdentityService;
use crate::state::AppState;

/// Health check response.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Overall service status ("ok").
    pub status: String,
    /// Identity provider mode ("http" or "fixture").
    pub identity_mode: String,
}

/// Health check endpoint handler.
///
/// Liveness only; does not call the identity provider.
#[utoipa::path(
    get,
    path = "/health",
    tag = "Health",
    responses(
        (status = 200, description = "Service is healthy", body = HealthResponse)
    )
)]
pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let identity_mode = match *state.identity {
        IdentityService::Http(_) => "http",
        IdentityService::Fixture(_) => "fixture",
    };
    Json(HealthResponse {
        status: "ok".to_string(),
        identity_mode: identity_mode.to_string(),
    })
}
