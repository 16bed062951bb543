// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::AdminConfig;
use crate::iam::Principal;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GateDecision {
    Allow,
    RedirectLogin,
    RedirectRoot,
}

/// The protected prefix and the login page that stays reachable inside it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatePaths {
    pub protected_prefix: String,
    pub login_path: String,
}

impl GatePaths {
    pub fn from_config(admin: &AdminConfig) -> Self {
        Self {
            protected_prefix: admin.path.trim_end_matches('/').to_string(),
            login_path: admin.login_path.clone(),
        }
    }

    pub fn is_protected(&self, path: &str) -> bool {
        path == self.protected_prefix
            || path
                .strip_prefix(self.protected_prefix.as_str())
                .is_some_and(|rest| rest.starts_with('/'))
    }

    pub fn is_login(&self, path: &str) -> bool {
        path.trim_end_matches('/') == self.login_path.trim_end_matches('/')
    }
}

/// Decides whether a request may reach a page. Paths outside the protected
/// prefix and the login page are always allowed.
pub fn decide(paths: &GatePaths, path: &str, principal: Option<&Principal>) -> GateDecision {
    if !paths.is_protected(path) || paths.is_login(path) {
        return GateDecision::Allow;
    }
    match principal {
        None => GateDecision::RedirectLogin,
        Some(principal) if principal.role().is_some() => GateDecision::Allow,
        Some(_) => GateDecision::RedirectRoot,
    }
}
