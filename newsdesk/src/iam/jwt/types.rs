// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use serde::{Deserialize, Serialize};

use crate::iam::types::{DEFAULT_PASSWORD_VERSION, Principal};

fn default_password_version() -> u32 {
    DEFAULT_PASSWORD_VERSION
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Claims {
    pub sub: String,  // Subject (user email)
    pub name: String, // Display name
    pub role: String, // Staff role
    pub iat: i64,
    pub exp: i64,
    pub iss: String,
    pub aud: String,
    pub jti: String,
    #[serde(default = "default_password_version")]
    pub password_version: u32, // Bumped on password change to revoke old tokens
}

impl Claims {
    pub fn principal(&self) -> Principal {
        Principal {
            email: self.sub.clone(),
            name: self.name.clone(),
            role: self.role.clone(),
        }
    }
}

#[derive(Debug, Clone)]
pub enum JwtError {
    Creation(String),
    Verification(String),
}

impl std::fmt::Display for JwtError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            JwtError::Creation(msg) => write!(f, "Token creation error: {}", msg),
            JwtError::Verification(msg) => write!(f, "Token verification error: {}", msg),
        }
    }
}

impl std::error::Error for JwtError {}
