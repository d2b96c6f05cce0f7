// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::auth::IdentityClassifier;
use crate::directory::Directory;
use crate::identity::IdentityService;

/// Shared application state.
///
/// The directory is the only mutable piece; the classifier and identity
/// handle are configured once at startup.
#[derive(Clone)]
pub struct AppState {
    pub directory: Arc<RwLock<Directory>>,
    pub identity: Arc<IdentityService>,
    pub classifier: Arc<IdentityClassifier>,
    /// Controls response redaction: in production, unexpected errors
    /// collapse to a generic message.
    pub production: bool,
}

impl AppState {
    pub fn new(
        directory: Directory,
        identity: IdentityService,
        classifier: IdentityClassifier,
    ) -> Self {
        Self {
            directory: Arc::new(RwLock::new(directory)),
            identity: Arc::new(identity),
            classifier: Arc::new(classifier),
            production: false,
        }
    }

    pub fn with_production(mut self, production: bool) -> Self {
        self.production = production;
        self
    }
}
