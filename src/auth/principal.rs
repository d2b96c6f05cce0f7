// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Role classification and the resolved per-request principal.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::{Company, Employee};

use super::permissions::Permission;

/// The single authoritative classification of a caller.
///
/// Every verified identity resolves to exactly one class; `Unknown` is a
/// valid terminal classification that tenant-requiring gates reject.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum RoleClass {
    /// Cross-tenant administrator, recognized by configured email set
    SuperAdmin,
    /// The company's own owner account (email matches the company record)
    CompanyAdmin,
    /// Employee with `is_admin`, scoped to one company
    EmployeeAdmin,
    /// Regular employee
    Employee,
    /// Verified identity with no company or employee record
    Unknown,
}

impl std::fmt::Display for RoleClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RoleClass::SuperAdmin => "super_admin",
            RoleClass::CompanyAdmin => "company_admin",
            RoleClass::EmployeeAdmin => "employee_admin",
            RoleClass::Employee => "employee",
            RoleClass::Unknown => "unknown",
        };
        f.write_str(s)
    }
}

/// The identity returned by the external verifier for a bearer token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VerifiedIdentity {
    /// Identity-provider account id.
    pub id: String,
    /// Account email.
    pub email: String,
}

/// Tenant and permission context attached to a request after
/// classification. Derived, never persisted.
#[derive(Debug, Clone)]
pub struct PrincipalContext {
    /// The externally verified identity this context was derived from.
    pub identity: VerifiedIdentity,
    pub role_class: RoleClass,
    /// Resolved tenant. Absent for super admins without a requested
    /// company, and always absent for `Unknown`.
    pub company: Option<Company>,
    /// Present only for employee classifications.
    pub employee: Option<Employee>,
    /// Union of permissions across the employee's roles. Empty for
    /// company admins, who bypass the permission model.
    pub permissions: BTreeSet<Permission>,
}

impl PrincipalContext {
    /// Context for an identity with no company or employee record.
    pub fn unknown(identity: VerifiedIdentity) -> Self {
        Self {
            identity,
            role_class: RoleClass::Unknown,
            company: None,
            employee: None,
            permissions: BTreeSet::new(),
        }
    }

    /// Whether the caller passes the admin gate: company admins always,
    /// employee admins through their `is_admin` flag.
    pub fn is_tenant_admin(&self) -> bool {
        match self.role_class {
            RoleClass::CompanyAdmin => true,
            RoleClass::EmployeeAdmin => {
                self.employee.as_ref().is_some_and(|e| e.is_admin)
            }
            _ => false,
        }
    }

    /// OR-semantics permission check: holding any one of `required`
    /// grants access. Company admins implicitly hold every permission.
    pub fn has_any_permission(&self, required: &[Permission]) -> bool {
        if self.role_class == RoleClass::CompanyAdmin {
            return true;
        }
        required.iter().any(|p| self.permissions.contains(p))
    }
}
