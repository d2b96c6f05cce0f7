// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Employee management endpoints (tenant-scoped).
//!
//! Creation is a two-system write: the provider account is created first,
//! then the directory record. A failed directory write rolls the provider
//! account back so the email is not left orphaned. Deletion is soft: the
//! record stays (inactive) and the provider account is banned.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use serde_json::json;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{gate, Permission, Tenant, TenantAdmin};
use crate::compensate::with_compensation;
use crate::error::ApiError;
use crate::identity::UserUpdates;
use crate::models::Employee;
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateEmployeeRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    #[serde(default)]
    pub is_admin: bool,
    #[serde(default)]
    pub role_ids: Vec<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateEmployeeRequest {
    pub name: Option<String>,
    pub email: Option<String>,
    pub is_admin: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct AssignRoleRequest {
    pub role_id: String,
}

/// Fetch an employee, scoped to the tenant. Records of other companies
/// answer 404, never 403, so ids cannot be probed across tenants.
fn find_scoped(
    directory: &crate::directory::Directory,
    company_id: &str,
    employee_id: &str,
) -> Result<Employee, ApiError> {
    directory
        .find_employee_by_id(employee_id)
        .filter(|e| e.company_id == company_id)
        .ok_or_else(|| ApiError::not_found("Employee not found"))
}

/// List the company's employees.
#[utoipa::path(
    get,
    path = "/v1/company/employees",
    tag = "Employees",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Employees of the company", body = [Employee]),
        (status = 403, description = "Missing view_employees permission"),
    )
)]
pub async fn list_employees(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<Vec<Employee>>, ApiError> {
    gate::require_any_permission(&tenant.principal, &[Permission::ViewEmployees])?;
    let directory = state.directory.read().await;
    Ok(Json(directory.employees_by_company(&tenant.company.id)))
}

/// Get one employee.
#[utoipa::path(
    get,
    path = "/v1/company/employees/{id}",
    tag = "Employees",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee", body = Employee),
        (status = 404, description = "Employee not found"),
    )
)]
pub async fn get_employee(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    gate::require_any_permission(&tenant.principal, &[Permission::ViewEmployees])?;
    let directory = state.directory.read().await;
    Ok(Json(find_scoped(&directory, &tenant.company.id, &id)?))
}

/// Create an employee, with a provider account.
///
/// Rejected when the plan's employee limit is reached. The limit counts
/// active employees only.
#[utoipa::path(
    post,
    path = "/v1/company/employees",
    tag = "Employees",
    security(("bearer" = [])),
    request_body = CreateEmployeeRequest,
    responses(
        (status = 201, description = "Employee created", body = Employee),
        (status = 400, description = "Duplicate email, unknown role, or employee limit reached"),
        (status = 403, description = "Admin privileges required"),
    )
)]
pub async fn create_employee(
    State(state): State<AppState>,
    TenantAdmin(tenant): TenantAdmin,
    Json(request): Json<CreateEmployeeRequest>,
) -> Result<(StatusCode, Json<Employee>), ApiError> {
    let company = &tenant.company;

    // Cheap pre-checks before touching the provider. The authoritative
    // checks re-run under the write lock below.
    {
        let directory = state.directory.read().await;
        if directory
            .find_employee_by_email(&request.email, Some(&company.id))
            .is_some()
        {
            return Err(ApiError::bad_request(
                "Employee with this email already exists in the company",
            ));
        }
        if directory.count_employees(&company.id) >= company.subscription.max_employees as usize {
            return Err(ApiError::bad_request(
                "Employee limit reached for your subscription plan",
            ));
        }
        for role_id in &request.role_ids {
            let valid = directory
                .find_role_by_id(role_id)
                .is_some_and(|r| r.company_id == company.id);
            if !valid {
                return Err(ApiError::bad_request(format!("Unknown role: {role_id}")));
            }
        }
    }

    let external_user_id = state
        .identity
        .create_user(
            &request.email,
            &request.password,
            json!({ "name": request.name, "company_id": company.id }),
        )
        .await?;

    let now = Utc::now();
    let employee = Employee {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        email: request.email,
        external_user_id: Some(external_user_id.clone()),
        is_admin: request.is_admin,
        is_active: true,
        company_id: company.id.clone(),
        role_ids: request.role_ids,
        created_at: now,
        updated_at: now,
    };

    let identity = state.identity.clone();
    let created = with_compensation(
        async {
            let mut directory = state.directory.write().await;
            if directory.count_employees(&company.id) >= company.subscription.max_employees as usize
            {
                return Err(ApiError::bad_request(
                    "Employee limit reached for your subscription plan",
                ));
            }
            directory.insert_employee(employee.clone())?;
            Ok(employee)
        },
        || async move { identity.delete_user(&external_user_id).await },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Update an employee's name, email, or admin flag.
#[utoipa::path(
    put,
    path = "/v1/company/employees/{id}",
    tag = "Employees",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Employee id")),
    request_body = UpdateEmployeeRequest,
    responses(
        (status = 200, description = "Employee updated", body = Employee),
        (status = 404, description = "Employee not found"),
    )
)]
pub async fn update_employee(
    State(state): State<AppState>,
    TenantAdmin(tenant): TenantAdmin,
    Path(id): Path<String>,
    Json(request): Json<UpdateEmployeeRequest>,
) -> Result<Json<Employee>, ApiError> {
    let mut directory = state.directory.write().await;
    let mut employee = find_scoped(&directory, &tenant.company.id, &id)?;

    if let Some(email) = request.email {
        if email != employee.email
            && directory
                .find_employee_by_email(&email, Some(&tenant.company.id))
                .is_some()
        {
            return Err(ApiError::bad_request(
                "Employee with this email already exists in the company",
            ));
        }
        employee.email = email;
    }
    if let Some(name) = request.name {
        employee.name = name;
    }
    if let Some(is_admin) = request.is_admin {
        employee.is_admin = is_admin;
    }
    employee.updated_at = Utc::now();

    directory.save_employee(employee.clone());
    Ok(Json(employee))
}

/// Soft-delete an employee and ban their provider account.
#[utoipa::path(
    delete,
    path = "/v1/company/employees/{id}",
    tag = "Employees",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Employee id")),
    responses(
        (status = 200, description = "Employee deactivated", body = Employee),
        (status = 404, description = "Employee not found"),
    )
)]
pub async fn delete_employee(
    State(state): State<AppState>,
    TenantAdmin(tenant): TenantAdmin,
    Path(id): Path<String>,
) -> Result<Json<Employee>, ApiError> {
    let employee = {
        let mut directory = state.directory.write().await;
        let mut employee = find_scoped(&directory, &tenant.company.id, &id)?;
        employee.is_active = false;
        employee.updated_at = Utc::now();
        directory.save_employee(employee.clone());
        employee
    };

    // Best effort; the directory record is already deactivated.
    if let Some(external_id) = &employee.external_user_id {
        if let Err(err) = state.identity.update_user(external_id, UserUpdates::ban()).await {
            tracing::warn!(error = %err, employee_id = %employee.id, "failed to ban provider account");
        }
    }

    Ok(Json(employee))
}

/// Assign a role to an employee.
#[utoipa::path(
    post,
    path = "/v1/company/employees/{id}/roles",
    tag = "Employees",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Employee id")),
    request_body = AssignRoleRequest,
    responses(
        (status = 200, description = "Role assigned", body = Employee),
        (status = 400, description = "Role already assigned"),
        (status = 404, description = "Employee or role not found"),
    )
)]
pub async fn assign_role(
    State(state): State<AppState>,
    TenantAdmin(tenant): TenantAdmin,
    Path(id): Path<String>,
    Json(request): Json<AssignRoleRequest>,
) -> Result<Json<Employee>, ApiError> {
    // Check-then-append runs under the write lock, so two concurrent
    // assignments of the same role cannot both succeed.
    let mut directory = state.directory.write().await;
    let mut employee = find_scoped(&directory, &tenant.company.id, &id)?;

    let role_exists = directory
        .find_role_by_id(&request.role_id)
        .is_some_and(|r| r.company_id == tenant.company.id);
    if !role_exists {
        return Err(ApiError::not_found("Role not found"));
    }
    if employee.role_ids.iter().any(|r| r == &request.role_id) {
        return Err(ApiError::bad_request(
            "Role already assigned to this employee",
        ));
    }

    employee.role_ids.push(request.role_id);
    employee.updated_at = Utc::now();
    directory.save_employee(employee.clone());
    Ok(Json(employee))
}

/// Remove a role from an employee.
#[utoipa::path(
    delete,
    path = "/v1/company/employees/{id}/roles/{role_id}",
    tag = "Employees",
    security(("bearer" = [])),
    params(
        ("id" = String, Path, description = "Employee id"),
        ("role_id" = String, Path, description = "Role id"),
    ),
    responses(
        (status = 200, description = "Role removed", body = Employee),
        (status = 404, description = "Employee not found or role not assigned"),
    )
)]
pub async fn remove_role(
    State(state): State<AppState>,
    TenantAdmin(tenant): TenantAdmin,
    Path((id, role_id)): Path<(String, String)>,
) -> Result<Json<Employee>, ApiError> {
    let mut directory = state.directory.write().await;
    let mut employee = find_scoped(&directory, &tenant.company.id, &id)?;

    let before = employee.role_ids.len();
    employee.role_ids.retain(|r| r != &role_id);
    if employee.role_ids.len() == before {
        return Err(ApiError::not_found("Role not assigned to this employee"));
    }

    employee.updated_at = Utc::now();
    directory.save_employee(employee.clone());
    Ok(Json(employee))
}
