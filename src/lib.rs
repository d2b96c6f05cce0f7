// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! Relational HR - Multi-Tenant HR Administration Backend
//!
//! Companies subscribe to plans, manage employees, and assign role-based
//! permissions; a super-admin tier manages companies and plans globally.
//! Authentication is delegated to an external identity provider; this
//! service classifies verified identities into tenant context and
//! enforces authorization on every request.
//!
//! ## Modules
//!
//! - `api` - HTTP API handlers (Axum) and the response envelope
//! - `auth` - Identity classification and the authorization gate
//! - `identity` - External identity provider integration
//! - `directory` - In-memory tenant directory (plans, companies,
//!   employees, roles)

pub mod api;
pub mod auth;
pub mod compensate;
pub mod config;
pub mod directory;
pub mod error;
pub mod identity;
pub mod models;
pub mod state;

#[cfg(test)]
pub(crate) mod testutil;
