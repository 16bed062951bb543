// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action, log_warning};
use crate::config::ValidatedConfig;
use crate::iam::{generate_password, hash_password};
use crate::roles::Role;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

pub const ADMIN_EMAIL: &str = "admin@example.com";
const ADMIN_NAME: &str = "Administrator";

/// Creates `users.yaml` with a single administrator. The generated password
/// is printed once and never stored in clear.
pub fn ensure_users(root: &Path, config: &ValidatedConfig) -> Result<bool, BootstrapError> {
    let users_path = users_path(root);
    if users_path.exists() {
        return Ok(false);
    }

    let password = generate_password();
    let password_hash = hash_password(&password, &config.users.password)
        .map_err(|err| BootstrapError::Io(io::Error::other(err.to_string())))?;

    let yaml = format!(
        "\"{email}\":\n  name: \"{name}\"\n  password_hash: \"{password_hash}\"\n  role: \"{role}\"\n  password_version: 1\n",
        email = ADMIN_EMAIL,
        name = ADMIN_NAME,
        password_hash = password_hash,
        role = Role::Admin.as_str()
    );

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&users_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(BootstrapError::Io(err)),
    };

    file.write_all(yaml.as_bytes())?;
    file.sync_all()?;

    log_action(format!("created users.yaml with {}", ADMIN_EMAIL));
    log_warning(format!(
        "{} password: {} (change this immediately)",
        ADMIN_EMAIL, password
    ));

    Ok(true)
}

fn users_path(root: &Path) -> PathBuf {
    if root.as_os_str().is_empty() {
        PathBuf::from(".").join("users.yaml")
    } else {
        root.join("users.yaml")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::test_config;
    use crate::iam::{FileUserStore, UserStore};
    use crate::util::test_fixtures::TestFixtureRoot;

    #[test]
    fn generated_users_file_loads_through_the_user_store() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-users").unwrap();
        assert!(ensure_users(fixture.path(), &test_config()).unwrap());

        let store = FileUserStore::new(fixture.path().join("users.yaml")).unwrap();
        let users = store.load().expect("users load");
        let admin = users.get(ADMIN_EMAIL).expect("admin present");
        assert_eq!(admin.role, "admin");
        assert_eq!(admin.password_version, 1);
    }

    #[test]
    fn existing_users_file_is_left_alone() {
        let fixture = TestFixtureRoot::new_unique("bootstrap-users-existing").unwrap();
        std::fs::write(fixture.path().join("users.yaml"), "{}\n").unwrap();
        assert!(!ensure_users(fixture.path(), &test_config()).unwrap());
        assert_eq!(
            std::fs::read_to_string(fixture.path().join("users.yaml")).unwrap(),
            "{}\n"
        );
    }
}
