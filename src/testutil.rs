// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Shared fixtures for unit tests.

use chrono::{Duration, Utc};
use uuid::Uuid;

use crate::auth::Permission;
use crate::models::{Company, Employee, Role, SubscriptionPlan};

pub(crate) fn sample_plan(name: &str, max_employees: u32) -> SubscriptionPlan {
    SubscriptionPlan {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        max_employees,
        price: 49.0,
        duration_months: 1,
        is_active: true,
        description: None,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn sample_company(name: &str, email: &str, plan: SubscriptionPlan) -> Company {
    Company {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        email: email.to_string(),
        external_user_id: Uuid::new_v4().to_string(),
        subscription: plan,
        subscription_start_date: Utc::now(),
        subscription_end_date: Some(Utc::now() + Duration::days(30)),
        is_active: true,
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn sample_employee(company_id: &str, email: &str, is_admin: bool) -> Employee {
    Employee {
        id: Uuid::new_v4().to_string(),
        name: email.split('@').next().unwrap().to_string(),
        email: email.to_string(),
        external_user_id: Some(Uuid::new_v4().to_string()),
        is_admin,
        is_active: true,
        company_id: company_id.to_string(),
        role_ids: vec![],
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}

pub(crate) fn sample_role(company_id: &str, name: &str, permissions: Vec<Permission>) -> Role {
    Role {
        id: Uuid::new_v4().to_string(),
        name: name.to_string(),
        permissions,
        description: None,
        company_id: company_id.to_string(),
        created_at: Utc::now(),
        updated_at: Utc::now(),
    }
}
