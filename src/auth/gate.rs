// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Authorization gate checks.
//!
//! Each check is a pure predicate over the [`PrincipalContext`]; routes
//! compose the subset they need through the extractors in
//! [`extractor`](super::extractor) or call the permission check directly
//! in the handler. The first failing check rejects the request; no later
//! check runs.

use crate::models::Company;

use super::error::AuthError;
use super::permissions::Permission;
use super::principal::{PrincipalContext, RoleClass};

/// Resolve the tenant a request operates on.
///
/// `company_requested` records whether the caller explicitly named a
/// company (`x-company-id`); it only affects which rejection is
/// returned. A super admin must name a resolvable company to obtain
/// tenant context.
pub fn require_tenant(
    ctx: &PrincipalContext,
    company_requested: bool,
) -> Result<&Company, AuthError> {
    match (ctx.role_class, &ctx.company) {
        (RoleClass::Unknown, _) => {
            if company_requested {
                Err(AuthError::CompanyAccessDenied)
            } else {
                Err(AuthError::MissingTenantContext)
            }
        }
        (RoleClass::SuperAdmin, None) => {
            if company_requested {
                Err(AuthError::CompanyNotFound)
            } else {
                Err(AuthError::MissingTenantContext)
            }
        }
        (_, Some(company)) => Ok(company),
        // Classifier always attaches a company for the employee and
        // company-admin classes; treat a missing one as unresolved.
        (_, None) => Err(AuthError::MissingTenantContext),
    }
}

/// Subscription gate. Super admins are exempt; everyone else needs an
/// active company with an unexpired subscription.
pub fn require_valid_subscription(ctx: &PrincipalContext) -> Result<(), AuthError> {
    if ctx.role_class == RoleClass::SuperAdmin {
        return Ok(());
    }
    match &ctx.company {
        Some(company) if company.is_subscription_valid() => Ok(()),
        _ => Err(AuthError::SubscriptionExpired),
    }
}

/// Admin gate: company admins, employee admins, and super admins acting
/// as a resolved tenant.
pub fn require_tenant_admin(ctx: &PrincipalContext) -> Result<(), AuthError> {
    let allowed = match ctx.role_class {
        RoleClass::SuperAdmin => ctx.company.is_some(),
        _ => ctx.is_tenant_admin(),
    };
    if allowed {
        Ok(())
    } else {
        Err(AuthError::AdminRequired)
    }
}

/// Permission gate with OR semantics: holding any one of `required`
/// grants access. Company admins (and super admins acting as a tenant)
/// bypass the permission model.
pub fn require_any_permission(
    ctx: &PrincipalContext,
    required: &[Permission],
) -> Result<(), AuthError> {
    if ctx.role_class == RoleClass::SuperAdmin && ctx.company.is_some() {
        return Ok(());
    }
    if ctx.has_any_permission(required) {
        Ok(())
    } else {
        Err(AuthError::MissingPermissions(required.to_vec()))
    }
}

/// Super-admin gate for the cross-tenant surface.
pub fn require_super_admin(ctx: &PrincipalContext) -> Result<(), AuthError> {
    if ctx.role_class == RoleClass::SuperAdmin {
        Ok(())
    } else {
        Err(AuthError::SuperAdminRequired)
    }
}
