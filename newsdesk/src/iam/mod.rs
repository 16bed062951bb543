// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod jwt;
pub mod middleware;
mod password;
mod service;
mod store;
pub(crate) mod types;
mod user_services;

pub use middleware::{SessionMiddlewareFactory, SessionRequest};
pub use password::{PasswordError, generate_password, generate_secret_hex, hash_password};
pub use service::IamService;
pub use store::{FileUserStore, UserStore};
pub use types::{IamError, Principal, User, YamlUser, YamlUsersData};
pub use user_services::{UserServiceError, UserServices};
