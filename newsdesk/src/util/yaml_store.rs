// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! YAML document files written with temp-file + rename so readers never see a
//! half-written file. Shared by the user store and the content collections.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

const MAX_TEMP_ATTEMPTS: u32 = 100;

#[derive(Debug)]
pub(crate) struct YamlStoreError {
    message: String,
}

impl YamlStoreError {
    fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

impl fmt::Display for YamlStoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for YamlStoreError {}

/// Returns `Ok(None)` when the file is missing or blank.
pub(crate) fn read_yaml_file<T: DeserializeOwned>(
    path: &Path,
    label: &str,
) -> Result<Option<T>, YamlStoreError> {
    if !path.exists() {
        return Ok(None);
    }
    let content = fs::read_to_string(path)
        .map_err(|err| YamlStoreError::new(format!("Failed to read {} file: {}", label, err)))?;
    if content.trim().is_empty() {
        return Ok(None);
    }
    serde_yaml::from_str(&content)
        .map(Some)
        .map_err(|err| YamlStoreError::new(format!("Failed to parse {} file: {}", label, err)))
}

pub(crate) fn write_yaml_file<T: Serialize>(
    path: &Path,
    label: &str,
    value: &T,
) -> Result<(), YamlStoreError> {
    let content = serde_yaml::to_string(value)
        .map_err(|err| YamlStoreError::new(format!("Failed to serialize {}: {}", label, err)))?;
    let parent = path
        .parent()
        .ok_or_else(|| YamlStoreError::new(format!("{} file path has no parent", label)))?;
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .ok_or_else(|| YamlStoreError::new(format!("{} file path has no file name", label)))?;

    let (mut file, temp_path) = create_temp_file(parent, file_name, label)?;
    let result = (|| {
        #[cfg(unix)]
        {
            if let Ok(metadata) = fs::metadata(path) {
                fs::set_permissions(&temp_path, metadata.permissions()).map_err(|err| {
                    format!("Failed to set temp {} file permissions: {}", label, err)
                })?;
            }
        }
        file.write_all(content.as_bytes())
            .map_err(|err| format!("Failed to write {} temp file: {}", label, err))?;
        file.sync_all()
            .map_err(|err| format!("Failed to sync {} temp file: {}", label, err))?;
        fs::rename(&temp_path, path)
            .map_err(|err| format!("Failed to replace {} file: {}", label, err))
    })();

    if let Err(message) = result {
        let _ = fs::remove_file(&temp_path);
        return Err(YamlStoreError::new(message));
    }

    #[cfg(unix)]
    {
        if let Err(err) = fs::File::open(parent).and_then(|dir| dir.sync_all()) {
            log::warn!("{} directory sync failed: {}", label, err);
        }
    }

    Ok(())
}

fn create_temp_file(
    parent: &Path,
    file_name: &str,
    label: &str,
) -> Result<(fs::File, PathBuf), YamlStoreError> {
    for attempt in 0..MAX_TEMP_ATTEMPTS {
        let candidate = parent.join(format!(
            ".{}.tmp.{}.{}",
            file_name,
            std::process::id(),
            attempt
        ));
        match fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&candidate)
        {
            Ok(file) => return Ok((file, candidate)),
            Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => continue,
            Err(err) => {
                return Err(YamlStoreError::new(format!(
                    "Failed to create temp {} file: {}",
                    label, err
                )));
            }
        }
    }
    Err(YamlStoreError::new(format!(
        "Failed to create temp {} file after {} attempts",
        label, MAX_TEMP_ATTEMPTS
    )))
}
