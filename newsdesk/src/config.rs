// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::content::lifecycle::TransitionTable;
use crate::content::model::ArticleStatus;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

pub const ENV_DATA_DIR: &str = "NEWSDESK_DATA_DIR";
pub const ENV_JWT_SECRET: &str = "NEWSDESK_JWT_SECRET";
pub const ENV_BASE_URL: &str = "NEWSDESK_BASE_URL";
pub const ENV_LOG_LEVEL: &str = "NEWSDESK_LOG_LEVEL";

#[derive(Debug)]
pub enum ConfigError {
    LoadError(String),
    ValidationError(String),
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ConfigError::LoadError(msg) => write!(f, "Configuration load error: {}", msg),
            ConfigError::ValidationError(msg) => {
                write!(f, "Configuration validation error: {}", msg)
            }
        }
    }
}

impl std::error::Error for ConfigError {}

#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub server: ServerConfig,
    #[serde(default)]
    pub admin: AdminConfig,
    pub users: UsersConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
    #[serde(default)]
    pub storage: StorageConfig,
    pub site: SiteConfig,
    #[serde(default)]
    pub lifecycle: LifecycleConfig,
}

#[derive(Debug, Clone)]
pub struct ValidatedConfig {
    pub server: ServerConfig,
    pub admin: AdminConfig,
    pub users: ValidatedUsersConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
    pub site: SiteConfig,
    pub lifecycle: LifecycleSettings,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    #[serde(default = "default_workers")]
    pub workers: usize,
}

fn default_workers() -> usize {
    4
}

impl ServerConfig {
    pub fn address_tuple(&self) -> (&str, u16) {
        (self.host.as_str(), self.port)
    }
}

/// The protected admin prefix and the login page inside it.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct AdminConfig {
    #[serde(default = "default_admin_path")]
    pub path: String,
    #[serde(default = "default_login_path")]
    pub login_path: String,
}

impl Default for AdminConfig {
    fn default() -> Self {
        Self {
            path: default_admin_path(),
            login_path: default_login_path(),
        }
    }
}

fn default_admin_path() -> String {
    "/admin".to_string()
}

fn default_login_path() -> String {
    "/admin/login".to_string()
}

#[derive(Debug, Deserialize, Serialize)]
pub struct UsersConfig {
    pub jwt: JwtConfig,
    #[serde(default)]
    pub password: Argon2ParamsConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct JwtConfig {
    pub secret: String,
    #[serde(default = "default_jwt_issuer")]
    pub issuer: String,
    #[serde(default = "default_jwt_audience")]
    pub audience: String,
    #[serde(default = "default_jwt_expiration_hours")]
    pub expiration_hours: u64,
    #[serde(default = "default_jwt_cookie_name")]
    pub cookie_name: String,
    #[serde(default)]
    pub disable_refresh: bool,
    #[serde(default = "default_jwt_refresh_threshold_percentage")]
    pub refresh_threshold_percentage: u32,
    #[serde(default = "default_jwt_refresh_threshold_hours")]
    pub refresh_threshold_hours: u64,
}

fn default_jwt_issuer() -> String {
    "newsdesk".to_string()
}

fn default_jwt_audience() -> String {
    "newsdesk-admin".to_string()
}

fn default_jwt_expiration_hours() -> u64 {
    12
}

fn default_jwt_cookie_name() -> String {
    "newsdesk_session".to_string()
}

fn default_jwt_refresh_threshold_percentage() -> u32 {
    50
}

fn default_jwt_refresh_threshold_hours() -> u64 {
    24
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Argon2ParamsConfig {
    #[serde(default)]
    pub memory_kib: Option<u32>,
    #[serde(default)]
    pub iterations: Option<u32>,
    #[serde(default)]
    pub parallelism: Option<u32>,
    #[serde(default)]
    pub output_len: Option<u32>,
    #[serde(default)]
    pub salt_len: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Argon2Params {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
    pub output_len: u32,
    pub salt_len: u32,
}

pub const DEFAULT_ARGON2_PARAMS: Argon2Params = Argon2Params {
    memory_kib: 19456,
    iterations: 2,
    parallelism: 1,
    output_len: 32,
    salt_len: 16,
};

impl Argon2Params {
    fn resolve(config: &Argon2ParamsConfig) -> Result<Self, ConfigError> {
        let defaults = DEFAULT_ARGON2_PARAMS;
        let resolved = Argon2Params {
            memory_kib: config.memory_kib.unwrap_or(defaults.memory_kib),
            iterations: config.iterations.unwrap_or(defaults.iterations),
            parallelism: config.parallelism.unwrap_or(defaults.parallelism),
            output_len: config.output_len.unwrap_or(defaults.output_len),
            salt_len: config.salt_len.unwrap_or(defaults.salt_len),
        };

        if resolved.salt_len < 8 {
            return Err(ConfigError::ValidationError(format!(
                "Argon2id salt_len must be at least 8 bytes, got {}",
                resolved.salt_len
            )));
        }

        argon2::Params::new(
            resolved.memory_kib,
            resolved.iterations,
            resolved.parallelism,
            Some(resolved.output_len as usize),
        )
        .map_err(|err| ConfigError::ValidationError(format!("Invalid Argon2id params: {}", err)))?;

        Ok(resolved)
    }
}

#[derive(Debug, Clone)]
pub struct ValidatedUsersConfig {
    pub jwt: JwtConfig,
    pub password: Argon2Params,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

/// Where the content collections live. Relative paths resolve against the runtime root.
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StorageConfig {
    #[serde(default = "default_data_dir")]
    pub data_dir: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
        }
    }
}

fn default_data_dir() -> PathBuf {
    PathBuf::from("data")
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SiteConfig {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub base_url: String,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct LifecycleConfig {
    /// Allowed status edges, keyed by source status. Absent means every edge is allowed.
    #[serde(default)]
    pub transitions: Option<BTreeMap<ArticleStatus, Vec<ArticleStatus>>>,
    #[serde(default)]
    pub editors_own_articles: bool,
}

#[derive(Debug, Clone)]
pub struct LifecycleSettings {
    pub transitions: TransitionTable,
    pub editors_own_articles: bool,
}

impl Default for LifecycleSettings {
    fn default() -> Self {
        Self {
            transitions: TransitionTable::permissive(),
            editors_own_articles: false,
        }
    }
}

impl ValidatedConfig {
    pub fn is_localhost_only(&self) -> bool {
        matches!(
            self.server.host.as_str(),
            "127.0.0.1" | "localhost" | "::1"
        )
    }
}

/// Configuration used by unit and integration tests: cheap password hashing,
/// localhost cookies, permissive lifecycle.
pub fn test_config() -> ValidatedConfig {
    ValidatedConfig {
        server: ServerConfig {
            host: "127.0.0.1".to_string(),
            port: 0,
            workers: 1,
        },
        admin: AdminConfig::default(),
        users: ValidatedUsersConfig {
            jwt: JwtConfig {
                secret: "test-secret".to_string(),
                issuer: default_jwt_issuer(),
                audience: default_jwt_audience(),
                expiration_hours: default_jwt_expiration_hours(),
                cookie_name: default_jwt_cookie_name(),
                disable_refresh: false,
                refresh_threshold_percentage: default_jwt_refresh_threshold_percentage(),
                refresh_threshold_hours: default_jwt_refresh_threshold_hours(),
            },
            password: Argon2Params {
                memory_kib: 1024,
                iterations: 1,
                parallelism: 1,
                output_len: 32,
                salt_len: 16,
            },
        },
        logging: LoggingConfig::default(),
        storage: StorageConfig::default(),
        site: SiteConfig {
            name: "Newsdesk Test".to_string(),
            description: "Test edition".to_string(),
            base_url: "http://localhost:8080".to_string(),
        },
        lifecycle: LifecycleSettings::default(),
    }
}

impl Config {
    pub fn load(root: &Path) -> Result<Self, ConfigError> {
        let config_path = root.join("config.yaml");
        let content = fs::read_to_string(&config_path).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to read config file '{}': {}",
                config_path.display(),
                e
            ))
        })?;
        Self::parse(&content).map_err(|e| {
            ConfigError::LoadError(format!(
                "Failed to parse config file '{}': {}",
                config_path.display(),
                e
            ))
        })
    }

    fn parse(content: &str) -> Result<Self, serde_yaml::Error> {
        serde_yaml::from_str(content)
    }

    /// Loads, applies environment overrides and validates. The server must not
    /// start when this fails.
    pub fn load_and_validate(root: &Path) -> Result<ValidatedConfig, ConfigError> {
        let mut config = Self::load(root)?;
        config.apply_env_overrides(|key| std::env::var(key).ok());
        config.validate()
    }

    pub fn apply_env_overrides<F>(&mut self, lookup: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        let lookup = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        if let Some(dir) = lookup(ENV_DATA_DIR) {
            self.storage.data_dir = PathBuf::from(dir);
        }
        if let Some(secret) = lookup(ENV_JWT_SECRET) {
            self.users.jwt.secret = secret;
        }
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.site.base_url = base_url;
        }
        if let Some(level) = lookup(ENV_LOG_LEVEL) {
            self.logging.level = level;
        }
    }

    pub fn validate(self) -> Result<ValidatedConfig, ConfigError> {
        if self.server.workers == 0 {
            return Err(ConfigError::ValidationError(
                "server.workers must be at least 1".to_string(),
            ));
        }

        let admin = Self::validate_admin(self.admin)?;

        let jwt = &self.users.jwt;
        if jwt.secret.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "users.jwt.secret must not be empty".to_string(),
            ));
        }
        if !(10..=90).contains(&jwt.refresh_threshold_percentage) {
            return Err(ConfigError::ValidationError(format!(
                "JWT refresh_threshold_percentage must be between 10 and 90, got: {}",
                jwt.refresh_threshold_percentage
            )));
        }
        if jwt.refresh_threshold_hours < 1 {
            return Err(ConfigError::ValidationError(format!(
                "JWT refresh_threshold_hours must be at least 1, got: {}",
                jwt.refresh_threshold_hours
            )));
        }
        if jwt.refresh_threshold_hours > jwt.expiration_hours {
            log::warn!(
                "JWT refresh_threshold_hours ({}) is greater than expiration_hours ({}); long-lived tokens will not refresh",
                jwt.refresh_threshold_hours,
                jwt.expiration_hours
            );
        }
        let password = Argon2Params::resolve(&self.users.password)?;

        let mut site = self.site;
        site.base_url = site.base_url.trim().trim_end_matches('/').to_string();
        if !(site.base_url.starts_with("http://") || site.base_url.starts_with("https://")) {
            return Err(ConfigError::ValidationError(format!(
                "site.base_url must start with http:// or https://, got: '{}'",
                site.base_url
            )));
        }

        let transitions = match &self.lifecycle.transitions {
            Some(edges) => TransitionTable::from_edges(edges),
            None => TransitionTable::permissive(),
        };

        Ok(ValidatedConfig {
            server: self.server,
            admin,
            users: ValidatedUsersConfig {
                jwt: self.users.jwt,
                password,
            },
            logging: self.logging,
            storage: self.storage,
            site,
            lifecycle: LifecycleSettings {
                transitions,
                editors_own_articles: self.lifecycle.editors_own_articles,
            },
        })
    }

    fn validate_admin(admin: AdminConfig) -> Result<AdminConfig, ConfigError> {
        let path = admin.path.trim().trim_end_matches('/').to_string();
        if !path.starts_with('/') || path.len() < 2 {
            return Err(ConfigError::ValidationError(format!(
                "admin.path must be an absolute path below '/', got: '{}'",
                admin.path
            )));
        }
        let login_path = admin.login_path.trim().to_string();
        if !login_path.starts_with(&format!("{}/", path)) {
            return Err(ConfigError::ValidationError(format!(
                "admin.login_path '{}' must live under admin.path '{}'",
                login_path, path
            )));
        }
        Ok(AdminConfig { path, login_path })
    }
}
