// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Closed permission enumeration and resolution.
//!
//! Permissions are fixed tokens grouped into [`Role`]s; an employee's
//! effective permission set is the union over all assigned roles. Company
//! admins bypass this model entirely (they implicitly hold every
//! permission).
//!
//! [`Role`]: crate::models::Role

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Role;

/// A single action-scoped permission token.
///
/// The set is closed: role definitions may only reference tokens from this
/// enumeration, enforced by [`Permission::validate_names`] on every role
/// create/update.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum Permission {
    ViewEmployees,
    CreateEmployees,
    EditEmployees,
    DeleteEmployees,
    ViewRoles,
    CreateRoles,
    EditRoles,
    DeleteRoles,
    AssignRoles,
    ViewReports,
    GenerateReports,
    ViewCompanySettings,
    EditCompanySettings,
}

impl Permission {
    /// Every member of the closed enumeration, in declaration order.
    pub const ALL: [Permission; 13] = [
        Permission::ViewEmployees,
        Permission::CreateEmployees,
        Permission::EditEmployees,
        Permission::DeleteEmployees,
        Permission::ViewRoles,
        Permission::CreateRoles,
        Permission::EditRoles,
        Permission::DeleteRoles,
        Permission::AssignRoles,
        Permission::ViewReports,
        Permission::GenerateReports,
        Permission::ViewCompanySettings,
        Permission::EditCompanySettings,
    ];

    /// Wire representation of the token.
    pub fn as_str(&self) -> &'static str {
        match self {
            Permission::ViewEmployees => "view_employees",
            Permission::CreateEmployees => "create_employees",
            Permission::EditEmployees => "edit_employees",
            Permission::DeleteEmployees => "delete_employees",
            Permission::ViewRoles => "view_roles",
            Permission::CreateRoles => "create_roles",
            Permission::EditRoles => "edit_roles",
            Permission::DeleteRoles => "delete_roles",
            Permission::AssignRoles => "assign_roles",
            Permission::ViewReports => "view_reports",
            Permission::GenerateReports => "generate_reports",
            Permission::ViewCompanySettings => "view_company_settings",
            Permission::EditCompanySettings => "edit_company_settings",
        }
    }

    /// Parse a wire token. Returns `None` for anything outside the
    /// enumeration.
    pub fn parse(s: &str) -> Option<Permission> {
        Permission::ALL.iter().copied().find(|p| p.as_str() == s)
    }

    /// Validate a requested permission list against the enumeration.
    ///
    /// Returns the parsed permissions in input order, or the invalid
    /// subset (also in input order) when any token is unknown.
    pub fn validate_names(names: &[String]) -> Result<Vec<Permission>, InvalidPermissions> {
        let mut parsed = Vec::with_capacity(names.len());
        let mut invalid = Vec::new();
        for name in names {
            match Permission::parse(name) {
                Some(p) => parsed.push(p),
                None => invalid.push(name.clone()),
            }
        }
        if invalid.is_empty() {
            Ok(parsed)
        } else {
            Err(InvalidPermissions { names: invalid })
        }
    }
}

impl std::fmt::Display for Permission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Rejection listing exactly the tokens that are not part of the
/// enumeration.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid permissions: {}", names.join(", "))]
pub struct InvalidPermissions {
    pub names: Vec<String>,
}

/// Union of permissions across an employee's assigned roles.
///
/// Role order is irrelevant and duplicates collapse; the result is an
/// ordered set so error messages and serialized output are deterministic.
pub fn resolve_role_permissions(roles: &[Role]) -> BTreeSet<Permission> {
    roles
        .iter()
        .flat_map(|role| role.permissions.iter().copied())
        .collect()
}

/// Render a permission set for "Required permissions: …" messages.
pub fn permission_list(perms: &[Permission]) -> String {
    perms
        .iter()
        .map(Permission::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}
