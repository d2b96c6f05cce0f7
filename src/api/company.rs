// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Tenant-scoped company endpoints.

use axum::{extract::State, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::auth::{Tenant, TenantAdmin};
use crate::models::{Company, Employee, Role};
use crate::state::AppState;

/// Response for GET /v1/company/profile.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyProfileResponse {
    pub company: Company,
    /// The caller's own employee record, absent for the company admin.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub employee: Option<Employee>,
    /// Roles assigned to the caller.
    pub roles: Vec<Role>,
}

/// Response for GET /v1/company/stats.
#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyStatsResponse {
    pub total_employees: usize,
    pub total_roles: usize,
    pub max_employees: u32,
    /// Seats left on the current plan.
    pub remaining_seats: u32,
    pub subscription_plan: String,
    pub subscription_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<DateTime<Utc>>,
}

/// Get the caller's company profile.
#[utoipa::path(
    get,
    path = "/v1/company/profile",
    tag = "Company",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Company profile", body = CompanyProfileResponse),
        (status = 403, description = "No resolvable tenant or expired subscription"),
    )
)]
pub async fn profile(State(state): State<AppState>, tenant: Tenant) -> Json<CompanyProfileResponse> {
    let directory = state.directory.read().await;
    let roles = tenant
        .principal
        .employee
        .as_ref()
        .map(|e| directory.roles_for_employee(e))
        .unwrap_or_default();
    drop(directory);

    Json(CompanyProfileResponse {
        company: tenant.company,
        employee: tenant.principal.employee,
        roles,
    })
}

/// Get head-count and subscription statistics for the caller's company.
#[utoipa::path(
    get,
    path = "/v1/company/stats",
    tag = "Company",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Company statistics", body = CompanyStatsResponse),
        (status = 403, description = "Admin privileges required"),
    )
)]
pub async fn stats(
    State(state): State<AppState>,
    TenantAdmin(tenant): TenantAdmin,
) -> Json<CompanyStatsResponse> {
    let directory = state.directory.read().await;
    let total_employees = directory.count_employees(&tenant.company.id);
    let total_roles = directory.find_roles_by_company(&tenant.company.id).len();
    drop(directory);

    let max_employees = tenant.company.subscription.max_employees;
    let remaining_seats = max_employees.saturating_sub(total_employees as u32);

    Json(CompanyStatsResponse {
        total_employees,
        total_roles,
        max_employees,
        remaining_seats,
        subscription_plan: tenant.company.subscription.name.clone(),
        subscription_valid: tenant.company.is_subscription_valid(),
        subscription_end_date: tenant.company.subscription_end_date,
    })
}
