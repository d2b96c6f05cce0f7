// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration Constants
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `SUPER_ADMIN_EMAILS` | Comma-separated super-admin email list | Empty (no super admins) |
//! | `IDENTITY_URL` | Identity provider base URL | Unset → in-memory fixture provider |
//! | `IDENTITY_ANON_KEY` | Provider API key for end-user flows | Required with `IDENTITY_URL` |
//! | `IDENTITY_SERVICE_KEY` | Provider API key for the admin surface | Required with `IDENTITY_URL` |
//! | `APP_ENV` | `production` enables error redaction | `development` |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |

/// Environment variable name for the server bind address.
pub const HOST_ENV: &str = "HOST";

/// Environment variable name for the server bind port.
pub const PORT_ENV: &str = "PORT";

/// Environment variable name for the super-admin email allow-list.
///
/// Comma-separated; entries are trimmed and matched case-sensitively
/// against the verified identity email. An empty or unset value means no
/// caller can reach the super-admin surface.
pub const SUPER_ADMIN_EMAILS_ENV: &str = "SUPER_ADMIN_EMAILS";

/// Environment variable name for the identity provider base URL.
///
/// When unset the server runs against the in-memory fixture provider,
/// which accepts no external traffic and exists for development and
/// tests only.
pub const IDENTITY_URL_ENV: &str = "IDENTITY_URL";

/// Environment variable name for the provider anon key (end-user flows:
/// sign-in, verification, refresh, password reset).
pub const IDENTITY_ANON_KEY_ENV: &str = "IDENTITY_ANON_KEY";

/// Environment variable name for the provider service key (admin
/// surface: account create/update/ban/delete). Never sent to clients.
pub const IDENTITY_SERVICE_KEY_ENV: &str = "IDENTITY_SERVICE_KEY";

/// Environment variable name for the deployment environment.
///
/// `production` collapses unexpected 5xx messages to a generic body.
pub const APP_ENV: &str = "APP_ENV";

/// Environment variable name for the log format (`json` or `pretty`).
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";
