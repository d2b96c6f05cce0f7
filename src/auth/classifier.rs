// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! The identity classifier.
//!
//! Resolves a verified external identity (plus an optional requested
//! company id) into a single authoritative [`PrincipalContext`]. This is
//! the one place tenant resolution happens; every route gate consumes its
//! output.
//!
//! ## Precedence
//!
//! 1. Super-admin email set (case-sensitive). Super-admin status must
//!    never be shadowed by a same-email company or employee record.
//! 2. Company by owner email — the company's own account outranks any
//!    employee record sharing the email.
//! 3. Employee by email, falling back to external id.
//! 4. `Unknown`.
//!
//! Classification never fails. A caller that matches nothing, or matches
//! a record outside the requested company, classifies as `Unknown` and is
//! rejected downstream by the tenant gate.

use crate::directory::Directory;

use super::permissions::resolve_role_permissions;
use super::principal::{PrincipalContext, RoleClass, VerifiedIdentity};

/// Stateless classifier configured once at startup with the super-admin
/// email set. All tenant data is read from the directory per call.
#[derive(Debug, Clone)]
pub struct IdentityClassifier {
    super_admin_emails: Vec<String>,
}

impl IdentityClassifier {
    pub fn new(super_admin_emails: Vec<String>) -> Self {
        Self { super_admin_emails }
    }

    /// Parse the `SUPER_ADMIN_EMAILS` value: comma-separated, entries
    /// trimmed, empties removed. Matching is case-sensitive.
    pub fn parse_email_list(raw: &str) -> Vec<String> {
        raw.split(',')
            .map(str::trim)
            .filter(|e| !e.is_empty())
            .map(str::to_string)
            .collect()
    }

    pub fn is_super_admin(&self, email: &str) -> bool {
        !email.is_empty() && self.super_admin_emails.iter().any(|e| e == email)
    }

    /// Classify a verified identity, deterministically and read-only.
    ///
    /// When `requested_company_id` is given it constrains the result: a
    /// company admin or employee of a different company classifies as
    /// `Unknown` rather than leaking cross-tenant context. A super admin
    /// instead acts *as* the requested tenant's admin, keeping the
    /// `SuperAdmin` label with the resolved company attached.
    pub fn classify(
        &self,
        directory: &Directory,
        identity: &VerifiedIdentity,
        requested_company_id: Option<&str>,
    ) -> PrincipalContext {
        if self.is_super_admin(&identity.email) {
            let company =
                requested_company_id.and_then(|id| directory.find_company_by_id(id));
            return PrincipalContext {
                identity: identity.clone(),
                role_class: RoleClass::SuperAdmin,
                company,
                employee: None,
                permissions: Default::default(),
            };
        }

        if !identity.email.is_empty() {
            if let Some(company) = directory.find_company_by_email(&identity.email) {
                if requested_company_id.is_none_or(|id| id == company.id) {
                    return PrincipalContext {
                        identity: identity.clone(),
                        role_class: RoleClass::CompanyAdmin,
                        company: Some(company),
                        employee: None,
                        permissions: Default::default(),
                    };
                }
                // Owner of a different company; fall through so a
                // same-email employee record of the requested company
                // can still match.
            }
        }

        let employee = if identity.email.is_empty() {
            None
        } else {
            directory.find_employee_by_email(&identity.email, requested_company_id)
        }
        .or_else(|| directory.find_employee_by_external_id(&identity.id));

        if let Some(employee) = employee {
            if requested_company_id.is_none_or(|id| id == employee.company_id) {
                if let Some(company) = directory.find_company_by_id(&employee.company_id) {
                    let roles = directory.roles_for_employee(&employee);
                    let role_class = if employee.is_admin {
                        RoleClass::EmployeeAdmin
                    } else {
                        RoleClass::Employee
                    };
                    return PrincipalContext {
                        identity: identity.clone(),
                        role_class,
                        company: Some(company),
                        permissions: resolve_role_permissions(&roles),
                        employee: Some(employee),
                    };
                }
            }
        }

        PrincipalContext::unknown(identity.clone())
    }
}
