// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::config::{ConfigError, ValidatedConfig};
use std::fs;
use std::path::{Path, PathBuf};
use uuid::Uuid;

#[derive(Debug, Clone)]
pub struct RuntimePaths {
    pub root: PathBuf,
    pub config_file: PathBuf,
    pub users_file: PathBuf,
    /// Directory holding the content collections.
    pub data_dir: PathBuf,
}

impl RuntimePaths {
    pub fn from_root(root: &Path, config: &ValidatedConfig) -> Result<Self, ConfigError> {
        let root_path = if root.as_os_str().is_empty() {
            PathBuf::from(".")
        } else {
            root.to_path_buf()
        };
        if !root_path.exists() {
            fs::create_dir_all(&root_path).map_err(|e| {
                ConfigError::ValidationError(format!(
                    "Failed to create runtime root '{}': {}",
                    root_path.display(),
                    e
                ))
            })?;
        }
        let root = canonicalize(&root_path, "runtime root")?;

        let data_dir = if config.storage.data_dir.is_absolute() {
            config.storage.data_dir.clone()
        } else {
            root.join(&config.storage.data_dir)
        };
        ensure_dir_exists(&data_dir)?;
        let data_dir = canonicalize(&data_dir, "data directory")?;

        Ok(Self {
            config_file: root.join("config.yaml"),
            users_file: root.join("users.yaml"),
            data_dir,
            root,
        })
    }
}

fn canonicalize(path: &Path, label: &str) -> Result<PathBuf, ConfigError> {
    path.canonicalize().map_err(|e| {
        ConfigError::ValidationError(format!(
            "Failed to canonicalize {} '{}': {}",
            label,
            path.display(),
            e
        ))
    })
}

fn ensure_dir_exists(path: &Path) -> Result<(), ConfigError> {
    if !path.exists() {
        fs::create_dir_all(path).map_err(|e| {
            ConfigError::ValidationError(format!(
                "Failed to create directory '{}': {}",
                path.display(),
                e
            ))
        })?;
    }
    if !path.is_dir() {
        return Err(ConfigError::ValidationError(format!(
            "Data directory is not a directory: {}",
            path.display()
        )));
    }

    let probe_path = path.join(format!(".newsdesk-write-check-{}", Uuid::new_v4()));
    fs::OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&probe_path)
        .and_then(|_| fs::remove_file(&probe_path))
        .map_err(|e| {
            ConfigError::ValidationError(format!(
                "Directory must be writable ({}): {}",
                path.display(),
                e
            ))
        })
}
