// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::sync::Arc;

use crate::config::{AdminConfig, SiteConfig, ValidatedConfig};
use crate::content::{ContentStore, LifecycleAuthority, VisitorTracker};

/// Shared request state, registered once as `web::Data<AppState>`.
pub struct AppState {
    pub store: Arc<ContentStore>,
    pub lifecycle: LifecycleAuthority,
    pub visitors: VisitorTracker,
    pub site: SiteConfig,
    pub admin: AdminConfig,
}

impl AppState {
    pub fn new(config: &ValidatedConfig, store: Arc<ContentStore>) -> Self {
        Self {
            store,
            lifecycle: LifecycleAuthority::new(&config.lifecycle),
            visitors: VisitorTracker::new(),
            site: config.site.clone(),
            admin: config.admin.clone(),
        }
    }
}
