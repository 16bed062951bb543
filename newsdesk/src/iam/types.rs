// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::roles::Role;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};

pub const DEFAULT_PASSWORD_VERSION: u32 = 1;

/// A login account. Never serialized to public responses.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub email: String,
    pub name: String,
    /// Argon2id PHC string.
    pub password_hash: Option<String>,
    pub role: String,
    pub password_version: u32,
}

impl User {
    pub fn principal(&self) -> Principal {
        Principal {
            email: self.email.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
        }
    }
}

/// The authenticated caller of a request, as decoded from the session token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub email: String,
    pub name: String,
    pub role: String,
}

impl Principal {
    /// The role claim, if it names a staff role.
    pub fn role(&self) -> Option<Role> {
        self.role.parse().ok()
    }
}

// Structure matching the YAML file format
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct YamlUser {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_hash: Option<String>,
    pub role: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_version: Option<u32>,
}

impl YamlUser {
    pub fn into_user(self, email: String) -> User {
        User {
            email,
            name: self.name,
            password_hash: self.password_hash,
            role: self.role,
            password_version: self.password_version.unwrap_or(DEFAULT_PASSWORD_VERSION),
        }
    }

    pub fn from_user(user: &User) -> Self {
        YamlUser {
            name: user.name.clone(),
            password_hash: user.password_hash.clone(),
            role: user.role.clone(),
            password_version: Some(user.password_version),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum IamError {
    UserNotFound(String),
    UserExists(String),
    ConfigurationError(String),
    FileError(String),
    ParseError(String),
}

impl std::fmt::Display for IamError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IamError::UserNotFound(email) => write!(f, "User not found: {}", email),
            IamError::UserExists(email) => write!(f, "User {} already exists", email),
            IamError::ConfigurationError(msg) => write!(f, "Configuration error: {}", msg),
            IamError::FileError(msg) => write!(f, "File error: {}", msg),
            IamError::ParseError(msg) => write!(f, "Parse error: {}", msg),
        }
    }
}

impl std::error::Error for IamError {}

// The users.yaml file structure: email -> yaml user data
pub type YamlUsersData = BTreeMap<String, YamlUser>;
pub type UsersData = HashMap<String, User>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn principal_role_parses_staff_roles_only() {
        let mut principal = Principal {
            email: "a@example.com".to_string(),
            name: "A".to_string(),
            role: "Editor".to_string(),
        };
        assert_eq!(principal.role(), Some(Role::Editor));
        principal.role = "reader".to_string();
        assert_eq!(principal.role(), None);
    }

    #[test]
    fn yaml_user_defaults_password_version() {
        let yaml: YamlUser =
            serde_yaml::from_str("name: Ann\nrole: admin\n").expect("parse yaml user");
        let user = yaml.into_user("ann@example.com".to_string());
        assert_eq!(user.password_version, DEFAULT_PASSWORD_VERSION);
        assert!(user.password_hash.is_none());
    }
}
