// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Domain Models
//!
//! Persistent entities of the HR backend. All types derive `Serialize`,
//! `Deserialize`, and `ToSchema` for automatic JSON handling and OpenAPI
//! documentation.
//!
//! ## Ownership
//!
//! - A [`Company`] owns its [`Employee`]s and [`Role`]s (cascade delete).
//! - Employee ↔ Role is a shared many-to-many association (`role_ids`).
//! - A [`SubscriptionPlan`] is referenced, never owned, by companies.
//!
//! Soft deletion: companies and employees carry `is_active`; plans are
//! deactivated instead of removed once any company references them.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::auth::Permission;

/// A subscription plan that companies purchase.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct SubscriptionPlan {
    /// Unique plan identifier (UUID).
    pub id: String,
    /// Globally unique plan name.
    pub name: String,
    /// Maximum number of employees a company on this plan may have.
    pub max_employees: u32,
    /// Price per billing period.
    pub price: f64,
    /// Billing period length in months.
    pub duration_months: u32,
    /// Inactive plans cannot be assigned to new companies.
    pub is_active: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A tenant company.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Company {
    /// Unique company identifier (UUID).
    pub id: String,
    /// Globally unique company name.
    pub name: String,
    /// Globally unique owner-account email. The identity whose email
    /// matches this field is the company admin.
    pub email: String,
    /// Identity-provider account id of the owner.
    pub external_user_id: String,
    /// The plan this company is subscribed to, resolved eagerly on reads.
    pub subscription: SubscriptionPlan,
    pub subscription_start_date: DateTime<Utc>,
    /// End of the paid period. A company with no end date is treated as
    /// expired (fail closed).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subscription_end_date: Option<DateTime<Utc>>,
    /// Soft-delete flag.
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Company {
    /// Whether the company may use tenant-scoped functionality right now.
    ///
    /// Requires the company to be active and its subscription end date to
    /// be present and not in the past.
    pub fn is_subscription_valid(&self) -> bool {
        self.is_subscription_valid_at(Utc::now())
    }

    /// Validity check against an explicit clock, used by tests.
    pub fn is_subscription_valid_at(&self, now: DateTime<Utc>) -> bool {
        if !self.is_active {
            return false;
        }
        match self.subscription_end_date {
            Some(end) => now <= end,
            None => false,
        }
    }
}

/// An employee of a company.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Employee {
    /// Unique employee identifier (UUID).
    pub id: String,
    pub name: String,
    /// Unique within the company, not globally.
    pub email: String,
    /// Identity-provider account id, absent until the account is linked.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub external_user_id: Option<String>,
    /// Employee admins pass the admin gate for their own company.
    pub is_admin: bool,
    /// Soft-delete flag.
    pub is_active: bool,
    /// Owning company.
    pub company_id: String,
    /// Assigned roles (many-to-many).
    pub role_ids: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A named bundle of permissions, scoped to one company.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Role {
    /// Unique role identifier (UUID).
    pub id: String,
    /// Unique within the company.
    pub name: String,
    /// Validated permission tokens. Stored as a list, semantically a set.
    pub permissions: Vec<Permission>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Owning company.
    pub company_id: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn plan() -> SubscriptionPlan {
        SubscriptionPlan {
            id: "plan_1".to_string(),
            name: "Starter".to_string(),
            max_employees: 10,
            price: 29.0,
            duration_months: 1,
            is_active: true,
            description: None,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    fn company(end: Option<DateTime<Utc>>, is_active: bool) -> Company {
        Company {
            id: "comp_1".to_string(),
            name: "Acme".to_string(),
            email: "owner@acme.test".to_string(),
            external_user_id: "ext_1".to_string(),
            subscription: plan(),
            subscription_start_date: Utc::now(),
            subscription_end_date: end,
            is_active,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        }
    }

    #[test]
    fn subscription_valid_while_active_and_unexpired() {
        let c = company(Some(Utc::now() + Duration::days(30)), true);
        assert!(c.is_subscription_valid());
    }

    #[test]
    fn subscription_invalid_when_inactive() {
        let c = company(Some(Utc::now() + Duration::days(30)), false);
        assert!(!c.is_subscription_valid());
    }

    #[test]
    fn subscription_invalid_when_expired() {
        let c = company(Some(Utc::now() - Duration::days(1)), true);
        assert!(!c.is_subscription_valid());
    }

    #[test]
    fn subscription_invalid_without_end_date() {
        let c = company(None, true);
        assert!(!c.is_subscription_valid());
    }

    #[test]
    fn subscription_valid_exactly_at_end_date() {
        let end = Utc::now() + Duration::days(1);
        let c = company(Some(end), true);
        assert!(c.is_subscription_valid_at(end));
    }
}
