// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::{BootstrapError, log_action};
use crate::iam::generate_secret_hex;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

const DEFAULT_HOST: &str = "127.0.0.1";
const DEFAULT_PORT: u16 = 8080;
const DEFAULT_WORKERS: u16 = 4;
const JWT_SECRET_BYTES: usize = 32;

pub fn ensure_config(root: &Path) -> Result<bool, BootstrapError> {
    let root_path = normalize_root(root)?;
    let config_path = root_path.join("config.yaml");

    if config_path.exists() {
        return Ok(false);
    }

    let contents = default_config_yaml(&generate_secret_hex(JWT_SECRET_BYTES));

    let mut file = match OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&config_path)
    {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::AlreadyExists => return Ok(false),
        Err(err) => return Err(BootstrapError::Io(err)),
    };

    file.write_all(contents.as_bytes())?;
    file.sync_all()?;

    log_action(format!(
        "created config.yaml (http {}:{}, data under ./data)",
        DEFAULT_HOST, DEFAULT_PORT
    ));

    Ok(true)
}

fn normalize_root(root: &Path) -> Result<PathBuf, BootstrapError> {
    let root_path = if root.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        root.to_path_buf()
    };

    if root_path.exists() {
        if !root_path.is_dir() {
            return Err(BootstrapError::Io(io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Runtime root is not a directory: {}", root_path.display()),
            )));
        }
        return Ok(root_path);
    }

    fs::create_dir_all(&root_path)?;
    log_action(format!(
        "created runtime root directory {}",
        root_path.display()
    ));
    Ok(root_path)
}

fn default_config_yaml(jwt_secret: &str) -> String {
    format!(
        "server:\n  host: \"{host}\"\n  port: {port}\n  workers: {workers}\n\nadmin:\n  path: \"/admin\"\n  login_path: \"/admin/login\"\n\nusers:\n  jwt:\n    secret: \"{jwt_secret}\"\n    expiration_hours: 12\n\nlogging:\n  level: \"info\"\n\nstorage:\n  data_dir: \"data\"\n\nsite:\n  name: \"Newsdesk\"\n  description: \"Latest news\"\n  base_url: \"http://localhost:{port}\"\n\nlifecycle:\n  editors_own_articles: false\n",
        host = DEFAULT_HOST,
        port = DEFAULT_PORT,
        workers = DEFAULT_WORKERS,
        jwt_secret = jwt_secret,
    )
}
