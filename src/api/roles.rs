// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role management endpoints (tenant-scoped).
//!
//! Role names are unique per company and permission lists are validated
//! against the closed enumeration on every create and update. A role
//! cannot be deleted while any employee still holds it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use chrono::Utc;
use serde::Deserialize;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::auth::{gate, Permission, Tenant, TenantAdmin};
use crate::error::ApiError;
use crate::models::{Employee, Role};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateRoleRequest {
    pub name: String,
    /// Permission tokens; every entry must belong to the closed set.
    pub permissions: Vec<String>,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateRoleRequest {
    pub name: Option<String>,
    pub permissions: Option<Vec<String>>,
    pub description: Option<String>,
}

fn find_scoped(
    directory: &crate::directory::Directory,
    company_id: &str,
    role_id: &str,
) -> Result<Role, ApiError> {
    directory
        .find_role_by_id(role_id)
        .filter(|r| r.company_id == company_id)
        .ok_or_else(|| ApiError::not_found("Role not found"))
}

/// List the company's roles.
#[utoipa::path(
    get,
    path = "/v1/company/roles",
    tag = "Roles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Roles of the company", body = [Role]),
        (status = 403, description = "Missing view_roles permission"),
    )
)]
pub async fn list_roles(
    State(state): State<AppState>,
    tenant: Tenant,
) -> Result<Json<Vec<Role>>, ApiError> {
    gate::require_any_permission(&tenant.principal, &[Permission::ViewRoles])?;
    let directory = state.directory.read().await;
    Ok(Json(directory.find_roles_by_company(&tenant.company.id)))
}

/// List every permission token roles may reference.
#[utoipa::path(
    get,
    path = "/v1/company/roles/permissions",
    tag = "Roles",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "The closed permission set", body = [Permission]),
    )
)]
pub async fn list_permissions(tenant: Tenant) -> Result<Json<Vec<Permission>>, ApiError> {
    gate::require_any_permission(&tenant.principal, &[Permission::ViewRoles])?;
    Ok(Json(Permission::ALL.to_vec()))
}

/// Get one role.
#[utoipa::path(
    get,
    path = "/v1/company/roles/{id}",
    tag = "Roles",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role", body = Role),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn get_role(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> Result<Json<Role>, ApiError> {
    gate::require_any_permission(&tenant.principal, &[Permission::ViewRoles])?;
    let directory = state.directory.read().await;
    Ok(Json(find_scoped(&directory, &tenant.company.id, &id)?))
}

/// Employees currently holding a role.
#[utoipa::path(
    get,
    path = "/v1/company/roles/{id}/employees",
    tag = "Roles",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Role id")),
    responses(
        (status = 200, description = "Employees with this role", body = [Employee]),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn role_employees(
    State(state): State<AppState>,
    tenant: Tenant,
    Path(id): Path<String>,
) -> Result<Json<Vec<Employee>>, ApiError> {
    gate::require_any_permission(&tenant.principal, &[Permission::ViewRoles])?;
    let directory = state.directory.read().await;
    let role = find_scoped(&directory, &tenant.company.id, &id)?;
    Ok(Json(directory.employees_with_role(&role.id)))
}

/// Create a role.
#[utoipa::path(
    post,
    path = "/v1/company/roles",
    tag = "Roles",
    security(("bearer" = [])),
    request_body = CreateRoleRequest,
    responses(
        (status = 201, description = "Role created", body = Role),
        (status = 400, description = "Invalid permissions or duplicate name"),
        (status = 403, description = "Admin privileges required"),
    )
)]
pub async fn create_role(
    State(state): State<AppState>,
    TenantAdmin(tenant): TenantAdmin,
    Json(request): Json<CreateRoleRequest>,
) -> Result<(StatusCode, Json<Role>), ApiError> {
    let permissions = Permission::validate_names(&request.permissions)
        .map_err(|err| ApiError::bad_request(err.to_string()))?;

    let now = Utc::now();
    let role = Role {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        permissions,
        description: request.description,
        company_id: tenant.company.id.clone(),
        created_at: now,
        updated_at: now,
    };

    let mut directory = state.directory.write().await;
    directory.insert_role(role.clone())?;
    Ok((StatusCode::CREATED, Json(role)))
}

/// Update a role's name, permissions, or description.
#[utoipa::path(
    put,
    path = "/v1/company/roles/{id}",
    tag = "Roles",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Role id")),
    request_body = UpdateRoleRequest,
    responses(
        (status = 200, description = "Role updated", body = Role),
        (status = 400, description = "Invalid permissions or duplicate name"),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn update_role(
    State(state): State<AppState>,
    TenantAdmin(tenant): TenantAdmin,
    Path(id): Path<String>,
    Json(request): Json<UpdateRoleRequest>,
) -> Result<Json<Role>, ApiError> {
    let mut directory = state.directory.write().await;
    let mut role = find_scoped(&directory, &tenant.company.id, &id)?;

    if let Some(names) = &request.permissions {
        role.permissions = Permission::validate_names(names)
            .map_err(|err| ApiError::bad_request(err.to_string()))?;
    }
    if let Some(name) = request.name {
        if name != role.name
            && directory
                .find_role_by_name(&name, &tenant.company.id)
                .is_some()
        {
            return Err(ApiError::bad_request("Role with this name already exists"));
        }
        role.name = name;
    }
    if let Some(description) = request.description {
        role.description = Some(description);
    }
    role.updated_at = Utc::now();

    directory.save_role(role.clone());
    Ok(Json(role))
}

/// Delete a role. Refused while any employee still holds it.
#[utoipa::path(
    delete,
    path = "/v1/company/roles/{id}",
    tag = "Roles",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Role id")),
    responses(
        (status = 200, description = "Role deleted"),
        (status = 400, description = "Role is still assigned to employees"),
        (status = 404, description = "Role not found"),
    )
)]
pub async fn delete_role(
    State(state): State<AppState>,
    TenantAdmin(tenant): TenantAdmin,
    Path(id): Path<String>,
) -> Result<Json<Role>, ApiError> {
    let mut directory = state.directory.write().await;
    let role = find_scoped(&directory, &tenant.company.id, &id)?;

    let holders = directory.employees_with_role(&role.id);
    if !holders.is_empty() {
        return Err(ApiError::bad_request(
            "Cannot delete a role that is assigned to employees",
        ));
    }

    directory.delete_role(&role.id)?;
    Ok(Json(role))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityClassifier, PrincipalContext, RoleClass, VerifiedIdentity};
    use crate::directory::Directory;
    use crate::identity::{FixtureIdentity, IdentityService};
    use crate::models::Company;
    use crate::testutil::{sample_company, sample_employee, sample_plan, sample_role};

    fn tenant(company: Company) -> Tenant {
        let mut principal = PrincipalContext::unknown(VerifiedIdentity {
            id: "ext_owner".to_string(),
            email: company.email.clone(),
        });
        principal.role_class = RoleClass::CompanyAdmin;
        principal.company = Some(company.clone());
        Tenant { company, principal }
    }

    fn setup() -> (AppState, Company) {
        let mut directory = Directory::new();
        let company = sample_company("Acme", "owner@acme.test", sample_plan("Starter", 10));
        directory.insert_company(company.clone()).unwrap();
        let state = AppState::new(
            directory,
            IdentityService::Fixture(FixtureIdentity::new()),
            IdentityClassifier::new(vec![]),
        );
        (state, company)
    }

    #[tokio::test]
    async fn create_validates_permission_tokens() {
        let (state, company) = setup();
        let err = create_role(
            State(state),
            TenantAdmin(tenant(company)),
            Json(CreateRoleRequest {
                name: "Manager".to_string(),
                permissions: vec![
                    "view_employees".to_string(),
                    "fly_to_the_moon".to_string(),
                ],
                description: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid permissions: fly_to_the_moon");
    }

    #[tokio::test]
    async fn create_and_fetch_round_trip() {
        let (state, company) = setup();
        let (status, Json(role)) = create_role(
            State(state.clone()),
            TenantAdmin(tenant(company.clone())),
            Json(CreateRoleRequest {
                name: "Manager".to_string(),
                permissions: vec!["view_employees".to_string(), "edit_employees".to_string()],
                description: Some("People managers".to_string()),
            }),
        )
        .await
        .unwrap();
        assert_eq!(status, StatusCode::CREATED);
        assert_eq!(
            role.permissions,
            vec![Permission::ViewEmployees, Permission::EditEmployees]
        );

        let Json(fetched) = get_role(State(state), tenant(company), Path(role.id.clone()))
            .await
            .unwrap();
        assert_eq!(fetched.id, role.id);
    }

    #[tokio::test]
    async fn duplicate_name_is_rejected_per_company() {
        let (state, company) = setup();
        {
            let mut directory = state.directory.write().await;
            directory
                .insert_role(sample_role(&company.id, "Manager", vec![]))
                .unwrap();
        }

        let err = create_role(
            State(state),
            TenantAdmin(tenant(company)),
            Json(CreateRoleRequest {
                name: "Manager".to_string(),
                permissions: vec![],
                description: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_refused_while_role_is_assigned() {
        let (state, company) = setup();
        let role = sample_role(&company.id, "Viewer", vec![Permission::ViewEmployees]);
        {
            let mut directory = state.directory.write().await;
            directory.insert_role(role.clone()).unwrap();
            let mut employee = sample_employee(&company.id, "jo@acme.test", false);
            employee.role_ids = vec![role.id.clone()];
            directory.insert_employee(employee).unwrap();
        }

        let err = delete_role(
            State(state.clone()),
            TenantAdmin(tenant(company.clone())),
            Path(role.id.clone()),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        // After the assignment is gone the delete succeeds.
        {
            let mut directory = state.directory.write().await;
            let mut employee = directory
                .find_employee_by_email("jo@acme.test", Some(&company.id))
                .unwrap();
            employee.role_ids.clear();
            directory.save_employee(employee);
        }
        delete_role(State(state), TenantAdmin(tenant(company)), Path(role.id))
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn update_revalidates_permissions() {
        let (state, company) = setup();
        let role = sample_role(&company.id, "Viewer", vec![Permission::ViewEmployees]);
        {
            let mut directory = state.directory.write().await;
            directory.insert_role(role.clone()).unwrap();
        }

        let err = update_role(
            State(state),
            TenantAdmin(tenant(company)),
            Path(role.id),
            Json(UpdateRoleRequest {
                name: None,
                permissions: Some(vec!["not_a_permission".to_string()]),
                description: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
        assert_eq!(err.message, "Invalid permissions: not_a_permission");
    }

    #[tokio::test]
    async fn foreign_company_role_reads_as_not_found() {
        let (state, company) = setup();
        let other = sample_company("Beta", "owner@beta.test", sample_plan("Pro", 50));
        let foreign = sample_role(&other.id, "Viewer", vec![]);
        {
            let mut directory = state.directory.write().await;
            directory.insert_company(other).unwrap();
            directory.insert_role(foreign.clone()).unwrap();
        }

        let err = get_role(State(state), tenant(company), Path(foreign.id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }
}
