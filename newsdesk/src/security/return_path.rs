// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::AdminConfig;

/// Accepts a post-login return path only when it is a local path under the
/// admin prefix. Anything else (absolute URLs, protocol-relative paths, the
/// login page itself) is dropped.
pub fn validate_login_return_path(raw_path: &str, admin: &AdminConfig) -> Option<String> {
    let cleaned = raw_path.trim().replace(['\r', '\n'], "");
    if cleaned.is_empty() || !cleaned.starts_with('/') || cleaned.starts_with("//") {
        return None;
    }
    if cleaned.contains('\\') {
        return None;
    }

    let path_part = match cleaned.find(['?', '#']) {
        Some(idx) => &cleaned[..idx],
        None => cleaned.as_str(),
    };
    if path_part.split('/').any(|segment| segment == "..") {
        return None;
    }
    if path_part == admin.login_path {
        return None;
    }

    let admin_root = admin.path.trim_end_matches('/');
    if path_part == admin_root || path_part.starts_with(&format!("{}/", admin_root)) {
        Some(cleaned)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_admin_paths_with_query() {
        let admin = AdminConfig::default();
        assert_eq!(
            validate_login_return_path("/admin/dashboard?range=7", &admin),
            Some("/admin/dashboard?range=7".to_string())
        );
        assert_eq!(
            validate_login_return_path("/admin", &admin),
            Some("/admin".to_string())
        );
    }

    #[test]
    fn rejects_foreign_and_malformed_paths() {
        let admin = AdminConfig::default();
        for raw in [
            "",
            "https://evil.example.com/admin",
            "//evil.example.com/admin",
            "/news/story",
            "/administrator",
            "/admin/../api",
            "/admin/login",
            "/admin\\x",
        ] {
            assert_eq!(validate_login_return_path(raw, &admin), None, "{}", raw);
        }
    }
}
