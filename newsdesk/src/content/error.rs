// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use std::fmt;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContentError {
    /// Missing or malformed field, unknown reference, forbidden transition.
    Validation(String),
    /// Role or ownership check failed.
    Unauthorized(String),
    NotFound(String),
    /// Unique name/slug/email collision.
    Duplicate(String),
    /// Lock poisoning or persistence failure.
    Storage(String),
}

impl ContentError {
    pub fn validation(message: impl Into<String>) -> Self {
        ContentError::Validation(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ContentError::NotFound(message.into())
    }

    pub fn duplicate(message: impl Into<String>) -> Self {
        ContentError::Duplicate(message.into())
    }

    pub fn storage(message: impl Into<String>) -> Self {
        ContentError::Storage(message.into())
    }
}

impl fmt::Display for ContentError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ContentError::Validation(msg)
            | ContentError::Unauthorized(msg)
            | ContentError::NotFound(msg)
            | ContentError::Duplicate(msg) => write!(f, "{}", msg),
            ContentError::Storage(msg) => write!(f, "Storage error: {}", msg),
        }
    }
}

impl std::error::Error for ContentError {}

pub type ContentResult<T> = Result<T, ContentError>;
