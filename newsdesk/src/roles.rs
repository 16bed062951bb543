// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::error::Error;
use std::fmt;
use std::str::FromStr;

pub const ADMIN_ROLE: &str = "admin";
pub const EDITOR_ROLE: &str = "editor";

/// Staff roles. Tokens may carry other role strings; those principals are
/// authenticated but never staff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Role {
    Admin,
    Editor,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => ADMIN_ROLE,
            Role::Editor => EDITOR_ROLE,
        }
    }

    pub fn is_admin(&self) -> bool {
        matches!(self, Role::Admin)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug)]
pub struct RoleValidationError {
    message: String,
}

impl RoleValidationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for RoleValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl Error for RoleValidationError {}

impl FromStr for Role {
    type Err = RoleValidationError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            ADMIN_ROLE => Ok(Role::Admin),
            EDITOR_ROLE => Ok(Role::Editor),
            "" => Err(RoleValidationError::new("Role is required")),
            other => Err(RoleValidationError::new(format!(
                "Role '{}' is not one of: {}, {}",
                other, ADMIN_ROLE, EDITOR_ROLE
            ))),
        }
    }
}
