// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use axum::{
    middleware,
    routing::{delete, get, post},
    Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use crate::{
    auth::{Permission, RoleClass},
    models::{Company, Employee, Role, SubscriptionPlan},
    state::AppState,
};

pub mod auth;
pub mod company;
pub mod employees;
pub mod envelope;
pub mod health;
pub mod roles;
pub mod super_admin;

pub fn router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/auth/refresh", post(auth::refresh))
        .route("/auth/me", get(auth::me))
        .route("/auth/change-password", post(auth::change_password))
        .route("/auth/forgot-password", post(auth::forgot_password))
        .route("/company/profile", get(company::profile))
        .route("/company/stats", get(company::stats))
        .route(
            "/company/employees",
            get(employees::list_employees).post(employees::create_employee),
        )
        .route(
            "/company/employees/{id}",
            get(employees::get_employee)
                .put(employees::update_employee)
                .delete(employees::delete_employee),
        )
        .route("/company/employees/{id}/roles", post(employees::assign_role))
        .route(
            "/company/employees/{id}/roles/{role_id}",
            delete(employees::remove_role),
        )
        .route(
            "/company/roles",
            get(roles::list_roles).post(roles::create_role),
        )
        .route("/company/roles/permissions", get(roles::list_permissions))
        .route(
            "/company/roles/{id}",
            get(roles::get_role)
                .put(roles::update_role)
                .delete(roles::delete_role),
        )
        .route("/company/roles/{id}/employees", get(roles::role_employees))
        .route(
            "/super-admin/companies",
            get(super_admin::list_companies).post(super_admin::create_company),
        )
        .route(
            "/super-admin/companies/expiring",
            get(super_admin::expiring_companies),
        )
        .route(
            "/super-admin/companies/{id}",
            get(super_admin::get_company)
                .put(super_admin::update_company)
                .delete(super_admin::delete_company),
        )
        .route(
            "/super-admin/companies/{id}/stats",
            get(super_admin::company_stats),
        )
        .route(
            "/super-admin/companies/{id}/renew",
            post(super_admin::renew_subscription),
        )
        .route(
            "/super-admin/subscriptions",
            get(super_admin::list_plans).post(super_admin::create_plan),
        )
        .route(
            "/super-admin/subscriptions/comparison",
            get(super_admin::plan_comparison),
        )
        .route(
            "/super-admin/subscriptions/{id}",
            get(super_admin::get_plan)
                .put(super_admin::update_plan)
                .delete(super_admin::delete_plan),
        )
        .route(
            "/super-admin/subscriptions/{id}/stats",
            get(super_admin::plan_stats),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            envelope::wrap_response,
        ))
        .with_state(state.clone());

    Router::new()
        .route("/health", get(health::health))
        .with_state(state)
        .nest("/v1", v1_routes)
        .merge(SwaggerUi::new("/docs").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health,
        auth::login,
        auth::logout,
        auth::refresh,
        auth::me,
        auth::change_password,
        auth::forgot_password,
        company::profile,
        company::stats,
        employees::list_employees,
        employees::get_employee,
        employees::create_employee,
        employees::update_employee,
        employees::delete_employee,
        employees::assign_role,
        employees::remove_role,
        roles::list_roles,
        roles::list_permissions,
        roles::get_role,
        roles::role_employees,
        roles::create_role,
        roles::update_role,
        roles::delete_role,
        super_admin::list_companies,
        super_admin::create_company,
        super_admin::get_company,
        super_admin::update_company,
        super_admin::delete_company,
        super_admin::company_stats,
        super_admin::renew_subscription,
        super_admin::expiring_companies,
        super_admin::list_plans,
        super_admin::create_plan,
        super_admin::plan_comparison,
        super_admin::plan_stats,
        super_admin::get_plan,
        super_admin::update_plan,
        super_admin::delete_plan
    ),
    components(
        schemas(
            Permission,
            RoleClass,
            SubscriptionPlan,
            Company,
            Employee,
            Role,
            health::HealthResponse,
            auth::LoginRequest,
            auth::RefreshRequest,
            auth::ChangePasswordRequest,
            auth::ForgotPasswordRequest,
            auth::UserContext,
            auth::CompanySummary,
            auth::EmployeeSummary,
            auth::LoginResponse,
            auth::SessionResponse,
            auth::MessageResponse,
            company::CompanyProfileResponse,
            company::CompanyStatsResponse,
            employees::CreateEmployeeRequest,
            employees::UpdateEmployeeRequest,
            employees::AssignRoleRequest,
            roles::CreateRoleRequest,
            roles::UpdateRoleRequest,
            super_admin::CreateCompanyRequest,
            super_admin::UpdateCompanyRequest,
            super_admin::RenewSubscriptionRequest,
            super_admin::CreatePlanRequest,
            super_admin::UpdatePlanRequest,
            super_admin::CompanyOverview,
            super_admin::PlanComparisonEntry,
            super_admin::PlanStats
        )
    ),
    tags(
        (name = "Health", description = "Liveness"),
        (name = "Auth", description = "Sign-in, sessions, and password flows"),
        (name = "Company", description = "Tenant profile and statistics"),
        (name = "Employees", description = "Employee management"),
        (name = "Roles", description = "Roles and permissions"),
        (name = "SuperAdmin", description = "Cross-tenant administration")
    )
)]
struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::IdentityClassifier;
    use crate::directory::Directory;
    use crate::identity::{FixtureIdentity, IdentityService};

    #[tokio::test]
    async fn router_builds_with_all_routes() {
        let state = AppState::new(
            Directory::new(),
            IdentityService::Fixture(FixtureIdentity::new()),
            IdentityClassifier::new(vec![]),
        );
        let app = router(state);
        // Ensure the router can be converted into a service without panicking.
        let _ = app.into_make_service();
    }
}
