// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::IamService;
use super::jwt::{Claims, JwtService};
use super::password::{PasswordError, hash_password, hash_unchecked, verify_password};
use super::store::{FileUserStore, UserStore};
use super::types::User;
use crate::config::{Argon2Params, ValidatedConfig};
use crate::roles::Role;
use crate::security::{validate_and_sanitize_user_name, validate_email_field};
use std::fmt;
use std::path::PathBuf;
use std::sync::Arc;

/// Account management and authentication over the users file.
pub struct UserServices {
    iam_service: IamService,
    jwt_service: JwtService,
    password_params: Argon2Params,
    dummy_stored_hash: String,
}

pub type UserServiceResult<T> = Result<T, UserServiceError>;

#[derive(Debug)]
pub enum UserServiceError {
    Validation(String),
    Iam(String),
    Jwt(String),
    Password(PasswordError),
}

impl fmt::Display for UserServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserServiceError::Validation(message) => write!(f, "{}", message),
            UserServiceError::Iam(message) => write!(f, "{}", message),
            UserServiceError::Jwt(message) => write!(f, "{}", message),
            UserServiceError::Password(err) => write!(f, "{}", err),
        }
    }
}

impl std::error::Error for UserServiceError {}

impl From<PasswordError> for UserServiceError {
    fn from(err: PasswordError) -> Self {
        match err {
            PasswordError::TooShort => UserServiceError::Validation(err.to_string()),
            other => UserServiceError::Password(other),
        }
    }
}

impl UserServices {
    /// Loads `users_file` and starts the user mutation task.
    pub fn new(config: &ValidatedConfig, users_file: PathBuf) -> UserServiceResult<Self> {
        let store = Arc::new(
            FileUserStore::new(users_file).map_err(|err| UserServiceError::Iam(err.to_string()))?,
        );
        Self::new_with_store(config, store)
    }

    pub fn new_with_store(
        config: &ValidatedConfig,
        store: Arc<dyn UserStore>,
    ) -> UserServiceResult<Self> {
        let iam_service =
            IamService::new(store).map_err(|err| UserServiceError::Iam(err.to_string()))?;
        let password_params = config.users.password.clone();
        // Unknown accounts are verified against this so both paths cost the same.
        let dummy_stored_hash = hash_unchecked("dummy-password", &password_params)?;

        Ok(UserServices {
            iam_service,
            jwt_service: JwtService::new(config),
            password_params,
            dummy_stored_hash,
        })
    }

    pub fn jwt_service(&self) -> &JwtService {
        &self.jwt_service
    }

    pub fn get_user(&self, email: &str) -> UserServiceResult<Option<User>> {
        self.iam_service
            .get_user(email)
            .map_err(|err| UserServiceError::Iam(err.to_string()))
    }

    /// Returns the user when the password matches. Unknown users and accounts
    /// without a password never authenticate.
    pub fn authenticate(&self, email: &str, password: &str) -> UserServiceResult<Option<User>> {
        let user = self.get_user(email.trim())?;
        let stored_hash = match user.as_ref().and_then(|user| user.password_hash.as_deref()) {
            Some(hash) => hash,
            None => {
                if user.is_some() {
                    log::warn!("User {} has no password set", email.trim());
                }
                self.dummy_stored_hash.as_str()
            }
        };

        let valid = verify_password(password, stored_hash)?;
        Ok(user.filter(|user| valid && user.password_hash.is_some()))
    }

    /// Verifies the token and checks the account still exists with the same
    /// password version.
    pub fn validate_jwt(&self, token: &str) -> Option<(User, Claims)> {
        let claims = self.jwt_service.verify_token(token).ok()?;
        let user = self.iam_service.get_user(&claims.sub).ok().flatten()?;
        if user.password_version != claims.password_version {
            log::warn!("JWT password version mismatch for user {}", claims.sub);
            return None;
        }
        Some((user, claims))
    }

    pub fn issue_token(&self, user: &User) -> UserServiceResult<String> {
        self.jwt_service
            .create_token(user)
            .map_err(|err| UserServiceError::Jwt(err.to_string()))
    }

    pub fn list_users(&self) -> UserServiceResult<Vec<User>> {
        self.iam_service
            .list_users()
            .map_err(|err| UserServiceError::Iam(err.to_string()))
    }

    pub async fn add_user(
        &self,
        email: &str,
        name: &str,
        role: Role,
        password: &str,
    ) -> UserServiceResult<()> {
        validate_email_field(email).map_err(UserServiceError::Validation)?;
        let name = validate_and_sanitize_user_name(name).map_err(UserServiceError::Validation)?;
        let password_hash = hash_password(password, &self.password_params)?;
        self.iam_service
            .add_user(email.trim(), &name, password_hash, role.as_str())
            .await
            .map_err(|err| UserServiceError::Iam(err.to_string()))
    }

    /// Sets a new password, which revokes every token issued before.
    pub async fn change_password(&self, email: &str, password: &str) -> UserServiceResult<()> {
        let password_hash = hash_password(password, &self.password_params)?;
        self.iam_service
            .update_user(email.trim(), None, Some(password_hash), None)
            .await
            .map_err(|err| UserServiceError::Iam(err.to_string()))
    }

    pub async fn delete_user(&self, email: &str) -> UserServiceResult<()> {
        self.iam_service
            .delete_user(email.trim())
            .await
            .map_err(|err| UserServiceError::Iam(err.to_string()))
    }
}
