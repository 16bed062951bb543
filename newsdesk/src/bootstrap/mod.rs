// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{Config, ConfigError, ValidatedConfig};
use crate::runtime_paths::RuntimePaths;
use std::error::Error;
use std::fmt;
use std::path::Path;

pub mod config;
pub mod users;

#[derive(Debug)]
pub struct BootstrapResult {
    pub validated_config: ValidatedConfig,
    pub runtime_paths: RuntimePaths,
    pub created_config: bool,
    pub created_users: bool,
}

#[derive(Debug)]
pub enum BootstrapError {
    Config(ConfigError),
    Io(std::io::Error),
}

impl fmt::Display for BootstrapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BootstrapError::Config(err) => write!(f, "{}", err),
            BootstrapError::Io(err) => write!(f, "Bootstrap I/O error: {}", err),
        }
    }
}

impl Error for BootstrapError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            BootstrapError::Config(err) => Some(err),
            BootstrapError::Io(err) => Some(err),
        }
    }
}

impl From<ConfigError> for BootstrapError {
    fn from(err: ConfigError) -> Self {
        BootstrapError::Config(err)
    }
}

impl From<std::io::Error> for BootstrapError {
    fn from(err: std::io::Error) -> Self {
        BootstrapError::Io(err)
    }
}

/// Prepares a runtime root for serving: writes a default `config.yaml` and a
/// `users.yaml` with one administrator when they are missing, then loads the
/// configuration and resolves the data directory. Existing files are never
/// touched.
pub fn bootstrap_runtime(root: &Path) -> Result<BootstrapResult, BootstrapError> {
    let created_config = config::ensure_config(root)?;

    let validated_config = Config::load_and_validate(root)?;

    let created_users = users::ensure_users(root, &validated_config)?;

    let runtime_paths = RuntimePaths::from_root(root, &validated_config)?;

    Ok(BootstrapResult {
        validated_config,
        runtime_paths,
        created_config,
        created_users,
    })
}

pub(crate) fn log_action(message: impl AsRef<str>) {
    eprintln!("[bootstrap] {}", message.as_ref());
}

pub(crate) fn log_warning(message: impl AsRef<str>) {
    eprintln!("[bootstrap] WARNING: {}", message.as_ref());
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::YamlUsersData;
    use crate::roles::Role;
    use crate::util::test_fixtures::TestFixtureRoot;
    use std::fs;

    #[test]
    fn bootstrap_creates_defaults_when_missing() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-default").unwrap();
        let result = bootstrap_runtime(fixture.path()).expect("bootstrap should succeed");

        assert!(result.created_config);
        assert!(result.created_users);
        assert_eq!(result.validated_config.server.port, 8080);
        assert_eq!(result.validated_config.admin.path, "/admin");
        assert_eq!(result.validated_config.users.jwt.secret.len(), 64);
        assert!(result.runtime_paths.data_dir.is_dir());

        let users_content = fs::read_to_string(fixture.path().join("users.yaml")).unwrap();
        let users: YamlUsersData = serde_yaml::from_str(&users_content).unwrap();
        let admin = users.get(users::ADMIN_EMAIL).expect("admin user missing");
        assert_eq!(admin.name, "Administrator");
        assert_eq!(admin.role, Role::Admin.as_str());
        assert!(
            admin
                .password_hash
                .as_deref()
                .is_some_and(|hash| hash.starts_with("$argon2id$"))
        );
        assert_eq!(admin.password_version, Some(1));
    }

    #[test]
    fn bootstrap_is_idempotent() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-idempotent").unwrap();
        let first = bootstrap_runtime(fixture.path()).expect("bootstrap should succeed");
        assert!(first.created_config);

        let config_path = fixture.path().join("config.yaml");
        let users_path = fixture.path().join("users.yaml");
        let config_before = fs::read_to_string(&config_path).unwrap();
        let users_before = fs::read_to_string(&users_path).unwrap();

        let second = bootstrap_runtime(fixture.path()).expect("bootstrap should succeed");
        assert!(!second.created_config);
        assert!(!second.created_users);
        assert_eq!(config_before, fs::read_to_string(&config_path).unwrap());
        assert_eq!(users_before, fs::read_to_string(&users_path).unwrap());
    }

    #[test]
    fn bootstrap_rejects_invalid_existing_config() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-invalid").unwrap();
        fs::write(
            fixture.path().join("config.yaml"),
            "server:\n  host: \"127.0.0.1\"\n  port: 8080\n",
        )
        .unwrap();

        let error = bootstrap_runtime(fixture.path()).expect_err("bootstrap should fail");
        assert!(matches!(error, BootstrapError::Config(_)));
        assert!(!fixture.path().join("users.yaml").exists());
    }
}
