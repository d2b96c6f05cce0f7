// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Authentication & Authorization
//!
//! The service never validates credentials itself; it verifies bearer
//! tokens with the external identity provider and then decides, locally,
//! who the caller is and what they may do:
//!
//! 1. **Verification** — the `Authorization: Bearer` token is checked
//!    against the provider ([`crate::identity`]), yielding a
//!    [`VerifiedIdentity`] (provider account id + email).
//! 2. **Classification** — the [`IdentityClassifier`] maps that identity
//!    (plus an optional `x-company-id` header) onto the directory:
//!    super admin, company admin, employee admin, employee, or unknown.
//!    Classification never rejects.
//! 3. **Gates** — pure checks in [`gate`] enforce tenant resolution,
//!    subscription validity, admin status, permissions, and the
//!    super-admin boundary. Routes compose them via the extractors in
//!    [`extractor`].
//!
//! Authorization state lives entirely in the request; nothing here holds
//! per-session data.

pub mod classifier;
pub mod error;
pub mod extractor;
pub mod gate;
pub mod permissions;
pub mod principal;

pub use classifier::IdentityClassifier;
pub use error::AuthError;
pub use extractor::{
    Auth, BearerToken, Principal, SuperAdminOnly, Tenant, TenantAdmin, COMPANY_ID_HEADER,
};
pub use permissions::{permission_list, InvalidPermissions, Permission};
pub use principal::{PrincipalContext, RoleClass, VerifiedIdentity};
