// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use validator::ValidateEmail;

pub const MAX_EMAIL_CHARS: usize = 128;
pub const MAX_NAME_CHARS: usize = 256;

/// Validate staff account email input
pub fn validate_email_field(email: &str) -> Result<(), String> {
    let trimmed = email.trim();
    if trimmed.is_empty() {
        return Err("Email is required".to_string());
    }
    if trimmed.chars().count() > MAX_EMAIL_CHARS {
        return Err(format!(
            "Email must be at most {} characters",
            MAX_EMAIL_CHARS
        ));
    }
    if !trimmed.validate_email() {
        return Err("Email format is invalid".to_string());
    }
    Ok(())
}

/// Validate and sanitize staff display names.
/// Allows letters, numbers, spaces, apostrophes, hyphens and periods; anything
/// else becomes a space and runs of spaces collapse.
pub fn validate_and_sanitize_user_name(name: &str) -> Result<String, String> {
    if name.trim().is_empty() {
        return Err("Name cannot be empty".to_string());
    }

    let sanitized = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || c == ' ' || c == '\'' || c == '-' || c == '.' {
                c
            } else {
                ' '
            }
        })
        .collect::<String>();
    let sanitized = sanitized
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ");

    let sanitized_len = sanitized.chars().count();
    if !(2..=MAX_NAME_CHARS).contains(&sanitized_len) {
        return Err(format!(
            "Name must be between 2 and {} characters",
            MAX_NAME_CHARS
        ));
    }

    Ok(sanitized)
}
