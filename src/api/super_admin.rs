// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Cross-tenant administration endpoints.
//!
//! Everything here sits behind the super-admin gate. Companies are
//! addressed by path id (tenant routes use the `x-company-id` header
//! instead). Plans are never hard-deleted; deletion deactivates, and is
//! refused while any company still references the plan.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use chrono::{DateTime, Duration, Months, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::auth::SuperAdminOnly;
use crate::compensate::with_compensation;
use crate::error::ApiError;
use crate::identity::UserUpdates;
use crate::models::{Company, SubscriptionPlan};
use crate::state::AppState;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCompanyRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub subscription_plan_id: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCompanyRequest {
    pub name: Option<String>,
    pub subscription_plan_id: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct RenewSubscriptionRequest {
    /// Switch to a different plan at renewal; defaults to the current one.
    pub subscription_plan_id: Option<String>,
    /// Renewal length override; defaults to the plan's duration.
    pub months: Option<u32>,
}

#[derive(Debug, Deserialize, IntoParams)]
pub struct ExpiringQuery {
    /// Look-ahead window in days (default 7).
    pub days: Option<i64>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePlanRequest {
    pub name: String,
    pub max_employees: u32,
    pub price: f64,
    pub duration_months: u32,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdatePlanRequest {
    pub name: Option<String>,
    pub max_employees: Option<u32>,
    pub price: Option<f64>,
    pub duration_months: Option<u32>,
    pub description: Option<String>,
    pub is_active: Option<bool>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CompanyOverview {
    pub id: String,
    pub name: String,
    pub total_employees: usize,
    pub total_roles: usize,
    pub subscription_plan: String,
    pub subscription_valid: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<DateTime<Utc>>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanComparisonEntry {
    pub plan: SubscriptionPlan,
    /// Companies currently subscribed to this plan.
    pub companies: usize,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PlanStats {
    pub id: String,
    pub name: String,
    pub companies: usize,
    pub max_employees: u32,
    pub price: f64,
    /// Price times current subscriber count.
    pub revenue: f64,
}

fn validate_plan_shape(max_employees: u32, duration_months: u32, price: f64) -> Result<(), ApiError> {
    if max_employees == 0 {
        return Err(ApiError::bad_request("max_employees must be greater than zero"));
    }
    if duration_months == 0 {
        return Err(ApiError::bad_request("duration_months must be at least 1"));
    }
    if price < 0.0 {
        return Err(ApiError::bad_request("price must not be negative"));
    }
    Ok(())
}

fn period_end(start: DateTime<Utc>, duration_months: u32) -> Result<DateTime<Utc>, ApiError> {
    start
        .checked_add_months(Months::new(duration_months))
        .ok_or_else(|| ApiError::internal("subscription end date out of range"))
}

// ----------------------------------------------------------------------
// Companies
// ----------------------------------------------------------------------

/// List every company, soft-deleted ones included.
#[utoipa::path(
    get,
    path = "/v1/super-admin/companies",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All companies", body = [Company]),
        (status = 403, description = "Super admin privileges required"),
    )
)]
pub async fn list_companies(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
) -> Json<Vec<Company>> {
    let directory = state.directory.read().await;
    Json(directory.list_companies())
}

/// Onboard a company with its owner account.
///
/// The subscription window starts now and runs for the plan's duration.
#[utoipa::path(
    post,
    path = "/v1/super-admin/companies",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    request_body = CreateCompanyRequest,
    responses(
        (status = 201, description = "Company created", body = Company),
        (status = 400, description = "Duplicate name/email or unknown plan"),
    )
)]
pub async fn create_company(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Json(request): Json<CreateCompanyRequest>,
) -> Result<(StatusCode, Json<Company>), ApiError> {
    let plan = {
        let directory = state.directory.read().await;
        if directory.find_company_by_email(&request.email).is_some() {
            return Err(ApiError::bad_request("Company with this email already exists"));
        }
        directory
            .find_plan_by_id(&request.subscription_plan_id)
            .ok_or_else(|| ApiError::bad_request("Unknown subscription plan"))?
    };
    if !plan.is_active {
        return Err(ApiError::bad_request(
            "Cannot subscribe a company to an inactive plan",
        ));
    }

    let external_user_id = state
        .identity
        .create_user(
            &request.email,
            &request.password,
            json!({ "name": request.name, "account_type": "company" }),
        )
        .await?;

    let now = Utc::now();
    let company = Company {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        email: request.email,
        external_user_id: external_user_id.clone(),
        subscription_start_date: now,
        subscription_end_date: Some(period_end(now, plan.duration_months)?),
        subscription: plan,
        is_active: true,
        created_at: now,
        updated_at: now,
    };

    let identity = state.identity.clone();
    let created = with_compensation(
        async {
            let mut directory = state.directory.write().await;
            directory.insert_company(company.clone())?;
            Ok::<_, ApiError>(company)
        },
        || async move { identity.delete_user(&external_user_id).await },
    )
    .await?;

    Ok((StatusCode::CREATED, Json(created)))
}

/// Get one company.
#[utoipa::path(
    get,
    path = "/v1/super-admin/companies/{id}",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company", body = Company),
        (status = 404, description = "Company not found"),
    )
)]
pub async fn get_company(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Path(id): Path<String>,
) -> Result<Json<Company>, ApiError> {
    let directory = state.directory.read().await;
    directory
        .find_company_by_id(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Company not found"))
}

/// Update a company's name, plan, or active flag.
///
/// A plan change takes effect immediately but keeps the current billing
/// window; the next renewal derives from the new plan's duration.
#[utoipa::path(
    put,
    path = "/v1/super-admin/companies/{id}",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Company id")),
    request_body = UpdateCompanyRequest,
    responses(
        (status = 200, description = "Company updated", body = Company),
        (status = 404, description = "Company not found"),
    )
)]
pub async fn update_company(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Path(id): Path<String>,
    Json(request): Json<UpdateCompanyRequest>,
) -> Result<Json<Company>, ApiError> {
    let mut directory = state.directory.write().await;
    let mut company = directory
        .find_company_by_id(&id)
        .ok_or_else(|| ApiError::not_found("Company not found"))?;

    if let Some(name) = request.name {
        if name != company.name && directory.list_companies().iter().any(|c| c.name == name) {
            return Err(ApiError::bad_request("Company with this name already exists"));
        }
        company.name = name;
    }
    if let Some(plan_id) = request.subscription_plan_id {
        let plan = directory
            .find_plan_by_id(&plan_id)
            .ok_or_else(|| ApiError::bad_request("Unknown subscription plan"))?;
        if !plan.is_active {
            return Err(ApiError::bad_request(
                "Cannot subscribe a company to an inactive plan",
            ));
        }
        company.subscription = plan;
    }
    if let Some(is_active) = request.is_active {
        company.is_active = is_active;
    }
    company.updated_at = Utc::now();

    directory.save_company(company.clone());
    Ok(Json(company))
}

/// Soft-delete a company and ban its owner account.
#[utoipa::path(
    delete,
    path = "/v1/super-admin/companies/{id}",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company deactivated", body = Company),
        (status = 404, description = "Company not found"),
    )
)]
pub async fn delete_company(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Path(id): Path<String>,
) -> Result<Json<Company>, ApiError> {
    let company = {
        let mut directory = state.directory.write().await;
        let mut company = directory
            .find_company_by_id(&id)
            .ok_or_else(|| ApiError::not_found("Company not found"))?;
        company.is_active = false;
        company.updated_at = Utc::now();
        directory.save_company(company.clone());
        company
    };

    if let Err(err) = state
        .identity
        .update_user(&company.external_user_id, UserUpdates::ban())
        .await
    {
        tracing::warn!(error = %err, company_id = %company.id, "failed to ban company owner account");
    }

    Ok(Json(company))
}

/// Head-count and subscription overview for one company.
#[utoipa::path(
    get,
    path = "/v1/super-admin/companies/{id}/stats",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Company id")),
    responses(
        (status = 200, description = "Company overview", body = CompanyOverview),
        (status = 404, description = "Company not found"),
    )
)]
pub async fn company_stats(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Path(id): Path<String>,
) -> Result<Json<CompanyOverview>, ApiError> {
    let directory = state.directory.read().await;
    let company = directory
        .find_company_by_id(&id)
        .ok_or_else(|| ApiError::not_found("Company not found"))?;

    Ok(Json(CompanyOverview {
        total_employees: directory.count_employees(&company.id),
        total_roles: directory.find_roles_by_company(&company.id).len(),
        subscription_plan: company.subscription.name.clone(),
        subscription_valid: company.is_subscription_valid(),
        subscription_end_date: company.subscription_end_date,
        id: company.id,
        name: company.name,
    }))
}

/// Renew a company's subscription.
///
/// A still-valid subscription extends from its end date; a lapsed one
/// restarts from now. The renewal length defaults to the plan's
/// duration unless `months` overrides it.
#[utoipa::path(
    post,
    path = "/v1/super-admin/companies/{id}/renew",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Company id")),
    request_body = RenewSubscriptionRequest,
    responses(
        (status = 200, description = "Subscription renewed", body = Company),
        (status = 404, description = "Company not found"),
    )
)]
pub async fn renew_subscription(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Path(id): Path<String>,
    Json(request): Json<RenewSubscriptionRequest>,
) -> Result<Json<Company>, ApiError> {
    let mut directory = state.directory.write().await;
    let mut company = directory
        .find_company_by_id(&id)
        .ok_or_else(|| ApiError::not_found("Company not found"))?;

    if let Some(plan_id) = request.subscription_plan_id {
        let plan = directory
            .find_plan_by_id(&plan_id)
            .ok_or_else(|| ApiError::bad_request("Unknown subscription plan"))?;
        if !plan.is_active {
            return Err(ApiError::bad_request(
                "Cannot subscribe a company to an inactive plan",
            ));
        }
        company.subscription = plan;
    }

    if request.months == Some(0) {
        return Err(ApiError::bad_request("months must be at least 1"));
    }
    let months = request.months.unwrap_or(company.subscription.duration_months);

    let now = Utc::now();
    let base = if company.is_subscription_valid() {
        company.subscription_end_date.unwrap_or(now)
    } else {
        company.subscription_start_date = now;
        now
    };
    company.subscription_end_date = Some(period_end(base, months)?);
    company.updated_at = now;

    directory.save_company(company.clone());
    Ok(Json(company))
}

/// Companies whose subscription ends within the look-ahead window.
#[utoipa::path(
    get,
    path = "/v1/super-admin/companies/expiring",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(ExpiringQuery),
    responses(
        (status = 200, description = "Companies expiring soon", body = [Company]),
    )
)]
pub async fn expiring_companies(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Query(query): Query<ExpiringQuery>,
) -> Json<Vec<Company>> {
    let now = Utc::now();
    let cutoff = now + Duration::days(query.days.unwrap_or(7).max(0));

    let directory = state.directory.read().await;
    let expiring = directory
        .list_active_companies()
        .into_iter()
        .filter(|c| {
            c.subscription_end_date
                .is_some_and(|end| end >= now && end <= cutoff)
        })
        .collect();
    Json(expiring)
}

// ----------------------------------------------------------------------
// Subscription plans
// ----------------------------------------------------------------------

/// List every plan, inactive ones included.
#[utoipa::path(
    get,
    path = "/v1/super-admin/subscriptions",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "All subscription plans", body = [SubscriptionPlan]),
    )
)]
pub async fn list_plans(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
) -> Json<Vec<SubscriptionPlan>> {
    let directory = state.directory.read().await;
    Json(directory.list_plans(false))
}

/// Create a subscription plan.
#[utoipa::path(
    post,
    path = "/v1/super-admin/subscriptions",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    request_body = CreatePlanRequest,
    responses(
        (status = 201, description = "Plan created", body = SubscriptionPlan),
        (status = 400, description = "Invalid shape or duplicate name"),
    )
)]
pub async fn create_plan(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Json(request): Json<CreatePlanRequest>,
) -> Result<(StatusCode, Json<SubscriptionPlan>), ApiError> {
    validate_plan_shape(request.max_employees, request.duration_months, request.price)?;

    let now = Utc::now();
    let plan = SubscriptionPlan {
        id: Uuid::new_v4().to_string(),
        name: request.name,
        max_employees: request.max_employees,
        price: request.price,
        duration_months: request.duration_months,
        is_active: true,
        description: request.description,
        created_at: now,
        updated_at: now,
    };

    let mut directory = state.directory.write().await;
    directory.insert_plan(plan.clone())?;
    Ok((StatusCode::CREATED, Json(plan)))
}

/// Active plans side by side with their subscriber counts.
#[utoipa::path(
    get,
    path = "/v1/super-admin/subscriptions/comparison",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    responses(
        (status = 200, description = "Plan comparison", body = [PlanComparisonEntry]),
    )
)]
pub async fn plan_comparison(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
) -> Json<Vec<PlanComparisonEntry>> {
    let directory = state.directory.read().await;
    let mut entries: Vec<_> = directory
        .list_plans(true)
        .into_iter()
        .map(|plan| PlanComparisonEntry {
            companies: directory.companies_on_plan(&plan.id),
            plan,
        })
        .collect();
    entries.sort_by(|a, b| a.plan.price.total_cmp(&b.plan.price));
    Json(entries)
}

/// Subscriber count and revenue for one plan.
#[utoipa::path(
    get,
    path = "/v1/super-admin/subscriptions/{id}/stats",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Plan statistics", body = PlanStats),
        (status = 404, description = "Plan not found"),
    )
)]
pub async fn plan_stats(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Path(id): Path<String>,
) -> Result<Json<PlanStats>, ApiError> {
    let directory = state.directory.read().await;
    let plan = directory
        .find_plan_by_id(&id)
        .ok_or_else(|| ApiError::not_found("Subscription plan not found"))?;

    let companies = directory.companies_on_plan(&plan.id);
    Ok(Json(PlanStats {
        id: plan.id,
        name: plan.name,
        companies,
        max_employees: plan.max_employees,
        price: plan.price,
        revenue: plan.price * companies as f64,
    }))
}

/// Get one plan.
#[utoipa::path(
    get,
    path = "/v1/super-admin/subscriptions/{id}",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Plan", body = SubscriptionPlan),
        (status = 404, description = "Plan not found"),
    )
)]
pub async fn get_plan(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionPlan>, ApiError> {
    let directory = state.directory.read().await;
    directory
        .find_plan_by_id(&id)
        .map(Json)
        .ok_or_else(|| ApiError::not_found("Subscription plan not found"))
}

/// Update a plan. Changes propagate to subscribed companies immediately.
#[utoipa::path(
    put,
    path = "/v1/super-admin/subscriptions/{id}",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Plan id")),
    request_body = UpdatePlanRequest,
    responses(
        (status = 200, description = "Plan updated", body = SubscriptionPlan),
        (status = 400, description = "Invalid shape or duplicate name"),
        (status = 404, description = "Plan not found"),
    )
)]
pub async fn update_plan(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Path(id): Path<String>,
    Json(request): Json<UpdatePlanRequest>,
) -> Result<Json<SubscriptionPlan>, ApiError> {
    let mut directory = state.directory.write().await;
    let mut plan = directory
        .find_plan_by_id(&id)
        .ok_or_else(|| ApiError::not_found("Subscription plan not found"))?;

    if let Some(name) = request.name {
        if name != plan.name && directory.find_plan_by_name(&name).is_some() {
            return Err(ApiError::bad_request(
                "Subscription plan with this name already exists",
            ));
        }
        plan.name = name;
    }
    if let Some(max_employees) = request.max_employees {
        plan.max_employees = max_employees;
    }
    if let Some(price) = request.price {
        plan.price = price;
    }
    if let Some(duration_months) = request.duration_months {
        plan.duration_months = duration_months;
    }
    if let Some(description) = request.description {
        plan.description = Some(description);
    }
    if let Some(is_active) = request.is_active {
        plan.is_active = is_active;
    }
    validate_plan_shape(plan.max_employees, plan.duration_months, plan.price)?;
    plan.updated_at = Utc::now();

    directory.save_plan(plan.clone());
    Ok(Json(plan))
}

/// Deactivate a plan. Refused while any company references it.
#[utoipa::path(
    delete,
    path = "/v1/super-admin/subscriptions/{id}",
    tag = "SuperAdmin",
    security(("bearer" = [])),
    params(("id" = String, Path, description = "Plan id")),
    responses(
        (status = 200, description = "Plan deactivated", body = SubscriptionPlan),
        (status = 400, description = "Plan is still referenced by companies"),
        (status = 404, description = "Plan not found"),
    )
)]
pub async fn delete_plan(
    State(state): State<AppState>,
    _admin: SuperAdminOnly,
    Path(id): Path<String>,
) -> Result<Json<SubscriptionPlan>, ApiError> {
    let mut directory = state.directory.write().await;
    let mut plan = directory
        .find_plan_by_id(&id)
        .ok_or_else(|| ApiError::not_found("Subscription plan not found"))?;

    if directory.companies_on_plan(&plan.id) > 0 {
        return Err(ApiError::bad_request(
            "Cannot delete a plan that companies are subscribed to",
        ));
    }

    plan.is_active = false;
    plan.updated_at = Utc::now();
    directory.save_plan(plan.clone());
    Ok(Json(plan))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{IdentityClassifier, PrincipalContext, VerifiedIdentity};
    use crate::directory::Directory;
    use crate::identity::{FixtureIdentity, IdentityService};
    use crate::testutil::{sample_company, sample_plan};

    fn admin() -> SuperAdminOnly {
        let mut ctx = PrincipalContext::unknown(VerifiedIdentity {
            id: "ext_root".to_string(),
            email: "root@hq.test".to_string(),
        });
        ctx.role_class = crate::auth::RoleClass::SuperAdmin;
        SuperAdminOnly(ctx)
    }

    fn state() -> AppState {
        AppState::new(
            Directory::new(),
            IdentityService::Fixture(FixtureIdentity::new()),
            IdentityClassifier::new(vec!["root@hq.test".to_string()]),
        )
    }

    #[tokio::test]
    async fn create_company_derives_subscription_window_from_plan() {
        let state = state();
        let plan = sample_plan("Quarterly", 10);
        {
            let mut directory = state.directory.write().await;
            let mut plan = plan.clone();
            plan.duration_months = 3;
            directory.insert_plan(plan).unwrap();
        }

        let (status, Json(company)) = create_company(
            State(state),
            admin(),
            Json(CreateCompanyRequest {
                name: "Acme".to_string(),
                email: "owner@acme.test".to_string(),
                password: "pw".to_string(),
                subscription_plan_id: plan.id,
            }),
        )
        .await
        .unwrap();

        assert_eq!(status, StatusCode::CREATED);
        let end = company.subscription_end_date.unwrap();
        let expected = company
            .subscription_start_date
            .checked_add_months(Months::new(3))
            .unwrap();
        assert_eq!(end, expected);
        assert!(company.is_subscription_valid());
    }

    #[tokio::test]
    async fn provider_conflict_leaves_no_company_record() {
        let state = state();
        let plan = sample_plan("Starter", 10);
        {
            let mut directory = state.directory.write().await;
            directory.insert_plan(plan.clone()).unwrap();
        }
        if let IdentityService::Fixture(fixture) = &*state.identity {
            fixture.seed_account("owner@acme.test", "existing");
        }

        let err = create_company(
            State(state.clone()),
            admin(),
            Json(CreateCompanyRequest {
                name: "Acme".to_string(),
                email: "owner@acme.test".to_string(),
                password: "pw".to_string(),
                subscription_plan_id: plan.id,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);

        let directory = state.directory.read().await;
        assert!(directory.find_company_by_email("owner@acme.test").is_none());
    }

    #[tokio::test]
    async fn renewal_extends_a_valid_subscription_from_its_end_date() {
        let state = state();
        let company = sample_company("Acme", "owner@acme.test", sample_plan("Starter", 10));
        let original_end = company.subscription_end_date.unwrap();
        {
            let mut directory = state.directory.write().await;
            directory.insert_company(company.clone()).unwrap();
        }

        let Json(renewed) = renew_subscription(
            State(state),
            admin(),
            Path(company.id),
            Json(RenewSubscriptionRequest {
                subscription_plan_id: None,
                months: None,
            }),
        )
        .await
        .unwrap();

        let expected = original_end.checked_add_months(Months::new(1)).unwrap();
        assert_eq!(renewed.subscription_end_date.unwrap(), expected);
    }

    #[tokio::test]
    async fn renewal_months_override_beats_the_plan_duration() {
        let state = state();
        let company = sample_company("Acme", "owner@acme.test", sample_plan("Starter", 10));
        let original_end = company.subscription_end_date.unwrap();
        {
            let mut directory = state.directory.write().await;
            directory.insert_company(company.clone()).unwrap();
        }

        let Json(renewed) = renew_subscription(
            State(state),
            admin(),
            Path(company.id),
            Json(RenewSubscriptionRequest {
                subscription_plan_id: None,
                months: Some(6),
            }),
        )
        .await
        .unwrap();

        let expected = original_end.checked_add_months(Months::new(6)).unwrap();
        assert_eq!(renewed.subscription_end_date.unwrap(), expected);
    }

    #[tokio::test]
    async fn renewal_rejects_a_zero_month_override() {
        let state = state();
        let company = sample_company("Acme", "owner@acme.test", sample_plan("Starter", 10));
        {
            let mut directory = state.directory.write().await;
            directory.insert_company(company.clone()).unwrap();
        }

        let err = renew_subscription(
            State(state),
            admin(),
            Path(company.id),
            Json(RenewSubscriptionRequest {
                subscription_plan_id: None,
                months: Some(0),
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn renewal_of_a_lapsed_subscription_restarts_from_now() {
        let state = state();
        let mut company = sample_company("Acme", "owner@acme.test", sample_plan("Starter", 10));
        company.subscription_end_date = Some(Utc::now() - Duration::days(30));
        {
            let mut directory = state.directory.write().await;
            directory.insert_company(company.clone()).unwrap();
        }

        let before = Utc::now();
        let Json(renewed) = renew_subscription(
            State(state),
            admin(),
            Path(company.id),
            Json(RenewSubscriptionRequest {
                subscription_plan_id: None,
                months: None,
            }),
        )
        .await
        .unwrap();

        assert!(renewed.subscription_start_date >= before);
        assert!(renewed.subscription_end_date.unwrap() > Utc::now());
        assert!(renewed.is_subscription_valid());
    }

    #[tokio::test]
    async fn plan_delete_refused_while_referenced() {
        let state = state();
        let plan = sample_plan("Starter", 10);
        {
            let mut directory = state.directory.write().await;
            directory.insert_plan(plan.clone()).unwrap();
            directory
                .insert_company(sample_company("Acme", "owner@acme.test", plan.clone()))
                .unwrap();
        }

        let err = delete_plan(State(state), admin(), Path(plan.id))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn plan_delete_deactivates_instead_of_removing() {
        let state = state();
        let plan = sample_plan("Orphan", 10);
        {
            let mut directory = state.directory.write().await;
            directory.insert_plan(plan.clone()).unwrap();
        }

        let Json(deleted) = delete_plan(State(state.clone()), admin(), Path(plan.id.clone()))
            .await
            .unwrap();
        assert!(!deleted.is_active);

        // Still present, just inactive.
        let directory = state.directory.read().await;
        assert!(directory.find_plan_by_id(&plan.id).is_some());
    }

    #[tokio::test]
    async fn expiring_window_filters_by_end_date() {
        let state = state();
        let plan = sample_plan("Starter", 10);
        {
            let mut directory = state.directory.write().await;
            let mut soon = sample_company("Soon", "soon@x.test", plan.clone());
            soon.subscription_end_date = Some(Utc::now() + Duration::days(3));
            let mut later = sample_company("Later", "later@x.test", plan.clone());
            later.subscription_end_date = Some(Utc::now() + Duration::days(60));
            directory.insert_company(soon).unwrap();
            directory.insert_company(later).unwrap();
        }

        let Json(expiring) = expiring_companies(
            State(state),
            admin(),
            Query(ExpiringQuery { days: Some(7) }),
        )
        .await;
        assert_eq!(expiring.len(), 1);
        assert_eq!(expiring[0].name, "Soon");
    }

    #[tokio::test]
    async fn plan_update_propagates_to_subscribed_companies() {
        let state = state();
        let plan = sample_plan("Starter", 10);
        let company = sample_company("Acme", "owner@acme.test", plan.clone());
        {
            let mut directory = state.directory.write().await;
            directory.insert_plan(plan.clone()).unwrap();
            directory.insert_company(company.clone()).unwrap();
        }

        update_plan(
            State(state.clone()),
            admin(),
            Path(plan.id),
            Json(UpdatePlanRequest {
                name: None,
                max_employees: Some(25),
                price: None,
                duration_months: None,
                description: None,
                is_active: None,
            }),
        )
        .await
        .unwrap();

        let directory = state.directory.read().await;
        let reloaded = directory.find_company_by_id(&company.id).unwrap();
        assert_eq!(reloaded.subscription.max_employees, 25);
    }

    #[tokio::test]
    async fn plan_stats_reports_subscribers_and_revenue() {
        let state = state();
        let mut plan = sample_plan("Starter", 10);
        plan.price = 49.0;
        {
            let mut directory = state.directory.write().await;
            directory.insert_plan(plan.clone()).unwrap();
            directory
                .insert_company(sample_company("Acme", "owner@acme.test", plan.clone()))
                .unwrap();
            directory
                .insert_company(sample_company("Beta", "owner@beta.test", plan.clone()))
                .unwrap();
        }

        let Json(stats) = plan_stats(State(state), admin(), Path(plan.id.clone()))
            .await
            .unwrap();
        assert_eq!(stats.id, plan.id);
        assert_eq!(stats.companies, 2);
        assert_eq!(stats.max_employees, 10);
        assert_eq!(stats.revenue, 98.0);
    }

    #[tokio::test]
    async fn plan_stats_for_an_unknown_plan_is_not_found() {
        let state = state();
        let err = plan_stats(State(state), admin(), Path("missing".to_string()))
            .await
            .unwrap_err();
        assert_eq!(err.status, StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn plan_shape_is_validated() {
        let state = state();
        let err = create_plan(
            State(state),
            admin(),
            Json(CreatePlanRequest {
                name: "Broken".to_string(),
                max_employees: 0,
                price: 10.0,
                duration_months: 1,
                description: None,
            }),
        )
        .await
        .unwrap_err();
        assert_eq!(err.status, StatusCode::BAD_REQUEST);
    }
}
