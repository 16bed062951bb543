// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod return_path;
mod validation;

pub use return_path::validate_login_return_path;
pub use validation::{
    MAX_EMAIL_CHARS, MAX_NAME_CHARS, validate_and_sanitize_user_name, validate_email_field,
};
