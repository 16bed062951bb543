// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{DEFAULT_PASSWORD_VERSION, IamError, UsersData, YamlUser, YamlUsersData};
use crate::util::yaml_store;
use std::path::PathBuf;

#[cfg(test)]
use super::types::User;
#[cfg(test)]
use std::sync::{Arc, RwLock};

pub trait UserStore: Send + Sync {
    fn load(&self) -> Result<UsersData, IamError>;
    fn save(&self, users: &UsersData) -> Result<(), IamError>;
}

pub struct FileUserStore {
    users_file: PathBuf,
}

impl FileUserStore {
    pub fn new(users_file: PathBuf) -> Result<Self, IamError> {
        if users_file.as_os_str().is_empty() {
            return Err(IamError::ConfigurationError(
                "Users file path is empty".to_string(),
            ));
        }

        Ok(Self { users_file })
    }

    fn to_users(yaml_users: YamlUsersData) -> (UsersData, usize) {
        let mut missing_password_versions = 0;
        let mut users_data = UsersData::new();
        for (email, yaml_user) in yaml_users {
            if yaml_user.password_version.is_none() {
                missing_password_versions += 1;
            }
            users_data.insert(email.clone(), yaml_user.into_user(email));
        }
        (users_data, missing_password_versions)
    }
}

impl UserStore for FileUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        let yaml_users: YamlUsersData = yaml_store::read_yaml_file(&self.users_file, "users")
            .map_err(|err| IamError::ParseError(err.to_string()))?
            .ok_or_else(|| {
                IamError::FileError(format!(
                    "Users file '{}' is missing or empty",
                    self.users_file.display()
                ))
            })?;
        let (users_data, missing_password_versions) = Self::to_users(yaml_users);

        if missing_password_versions > 0 {
            log::warn!(
                "users.yaml missing password_version for {} user(s); defaulting to {} and persisting",
                missing_password_versions,
                DEFAULT_PASSWORD_VERSION
            );
            self.save(&users_data)?;
        }

        Ok(users_data)
    }

    fn save(&self, users: &UsersData) -> Result<(), IamError> {
        let yaml_users: YamlUsersData = users
            .iter()
            .map(|(email, user)| (email.clone(), YamlUser::from_user(user)))
            .collect();
        yaml_store::write_yaml_file(&self.users_file, "users", &yaml_users)
            .map_err(|err| IamError::FileError(err.to_string()))
    }
}

#[cfg(test)]
pub struct MemoryUserStore {
    users: Arc<RwLock<UsersData>>,
}

#[cfg(test)]
impl MemoryUserStore {
    pub fn from_users(users: Vec<User>) -> Self {
        let data = users
            .into_iter()
            .map(|user| (user.email.clone(), user))
            .collect();
        Self {
            users: Arc::new(RwLock::new(data)),
        }
    }
}

#[cfg(test)]
impl UserStore for MemoryUserStore {
    fn load(&self) -> Result<UsersData, IamError> {
        match self.users.read() {
            Ok(guard) => Ok(guard.clone()),
            Err(poisoned) => Ok(poisoned.into_inner().clone()),
        }
    }

    fn save(&self, users: &UsersData) -> Result<(), IamError> {
        match self.users.write() {
            Ok(mut guard) => *guard = users.clone(),
            Err(poisoned) => *poisoned.into_inner() = users.clone(),
        }
        Ok(())
    }
}
