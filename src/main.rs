// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::env;

use tracing_subscriber::EnvFilter;
use url::Url;

use relational_hr_server::api::router;
use relational_hr_server::auth::IdentityClassifier;
use relational_hr_server::config::{
    APP_ENV, HOST_ENV, IDENTITY_ANON_KEY_ENV, IDENTITY_SERVICE_KEY_ENV, IDENTITY_URL_ENV,
    LOG_FORMAT_ENV, PORT_ENV, SUPER_ADMIN_EMAILS_ENV,
};
use relational_hr_server::directory::Directory;
use relational_hr_server::identity::{FixtureIdentity, HttpIdentityClient, IdentityService};
use relational_hr_server::state::AppState;

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,tower_http=debug"));

    let json = env::var(LOG_FORMAT_ENV).as_deref() == Ok("json");
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .with_target(false)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

fn build_identity_service() -> IdentityService {
    match env::var(IDENTITY_URL_ENV) {
        Ok(raw_url) => {
            let base_url = Url::parse(&raw_url).expect("IDENTITY_URL is not a valid URL");
            let anon_key = env::var(IDENTITY_ANON_KEY_ENV)
                .expect("IDENTITY_ANON_KEY is required when IDENTITY_URL is set");
            let service_key = env::var(IDENTITY_SERVICE_KEY_ENV)
                .expect("IDENTITY_SERVICE_KEY is required when IDENTITY_URL is set");
            tracing::info!(url = %base_url, "using HTTP identity provider");
            IdentityService::Http(HttpIdentityClient::new(base_url, anon_key, service_key))
        }
        Err(_) => {
            tracing::warn!("IDENTITY_URL not set, using in-memory fixture identity provider");
            IdentityService::Fixture(FixtureIdentity::new())
        }
    }
}

#[tokio::main]
async fn main() {
    init_tracing();

    let super_admin_emails = env::var(SUPER_ADMIN_EMAILS_ENV)
        .map(|raw| IdentityClassifier::parse_email_list(&raw))
        .unwrap_or_default();
    if super_admin_emails.is_empty() {
        tracing::warn!("SUPER_ADMIN_EMAILS is empty, the super-admin surface is unreachable");
    }

    let production = env::var(APP_ENV).as_deref() == Ok("production");

    let state = AppState::new(
        Directory::new(),
        build_identity_service(),
        IdentityClassifier::new(super_admin_emails),
    )
    .with_production(production);
    let app = router(state);

    let host = env::var(HOST_ENV).unwrap_or_else(|_| "0.0.0.0".to_string());
    let port: u16 = env::var(PORT_ENV)
        .unwrap_or_else(|_| "8080".to_string())
        .parse()
        .unwrap_or(8080);

    let listener = tokio::net::TcpListener::bind((host.as_str(), port))
        .await
        .expect("Failed to bind server address");
    let addr = listener.local_addr().expect("Failed to read bound address");

    tracing::info!("Relational HR server listening on http://{addr} (docs at /docs)");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .expect("Server failed");
}
