// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::{ContentError, ContentResult};
use crate::util::yaml_store;
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};

pub trait Document: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    fn id(&self) -> &str;
}

/// A keyed set of documents backed by one YAML file.
///
/// Every mutation runs inside the write lock, so a read-modify-write closure
/// passed to [`Collection::write`] is atomic with respect to other requests.
/// `write` persists before the new state becomes visible; `touch` mutates in
/// place and leaves persistence to the next `write` or [`Collection::flush`].
pub struct Collection<T> {
    label: &'static str,
    file: Option<PathBuf>,
    docs: RwLock<BTreeMap<String, T>>,
    dirty: AtomicBool,
}

impl<T: Document> Collection<T> {
    pub fn open(data_dir: &Path, label: &'static str) -> ContentResult<Self> {
        let file = data_dir.join(format!("{}.yaml", label));
        let stored: Option<Vec<T>> = yaml_store::read_yaml_file(&file, label)
            .map_err(|err| ContentError::storage(err.to_string()))?;

        let mut docs = BTreeMap::new();
        for doc in stored.unwrap_or_default() {
            let id = doc.id().to_string();
            if docs.insert(id.clone(), doc).is_some() {
                return Err(ContentError::storage(format!(
                    "Duplicate {} id '{}' in {}",
                    label,
                    id,
                    file.display()
                )));
            }
        }
        log::debug!("Loaded {} {} document(s)", docs.len(), label);

        Ok(Self {
            label,
            file: Some(file),
            docs: RwLock::new(docs),
            dirty: AtomicBool::new(false),
        })
    }

    pub fn in_memory(label: &'static str) -> Self {
        Self {
            label,
            file: None,
            docs: RwLock::new(BTreeMap::new()),
            dirty: AtomicBool::new(false),
        }
    }

    pub fn label(&self) -> &'static str {
        self.label
    }

    pub fn read<R>(&self, f: impl FnOnce(&BTreeMap<String, T>) -> R) -> ContentResult<R> {
        let guard = self.docs.read().map_err(|_| self.poisoned())?;
        Ok(f(&guard))
    }

    pub fn get(&self, id: &str) -> ContentResult<Option<T>> {
        self.read(|docs| docs.get(id).cloned())
    }

    pub fn all(&self) -> ContentResult<Vec<T>> {
        self.read(|docs| docs.values().cloned().collect())
    }

    pub fn filter(&self, pred: impl Fn(&T) -> bool) -> ContentResult<Vec<T>> {
        self.read(|docs| docs.values().filter(|doc| pred(doc)).cloned().collect())
    }

    pub fn find(&self, pred: impl Fn(&T) -> bool) -> ContentResult<Option<T>> {
        self.read(|docs| docs.values().find(|doc| pred(doc)).cloned())
    }

    pub fn count(&self, pred: impl Fn(&T) -> bool) -> ContentResult<usize> {
        self.read(|docs| docs.values().filter(|doc| pred(doc)).count())
    }

    pub fn contains(&self, id: &str) -> ContentResult<bool> {
        self.read(|docs| docs.contains_key(id))
    }

    /// Applies `f` to a working copy, persists it, then publishes it. An error
    /// from `f` or from persistence leaves the collection unchanged.
    ///
    /// Each call clones the map and rewrites the whole file, so bulk imports
    /// should insert every document inside one closure.
    pub fn write<R>(
        &self,
        f: impl FnOnce(&mut BTreeMap<String, T>) -> ContentResult<R>,
    ) -> ContentResult<R> {
        let mut guard = self.docs.write().map_err(|_| self.poisoned())?;
        let mut next = guard.clone();
        let result = f(&mut next)?;
        self.persist(&next)?;
        *guard = next;
        self.dirty.store(false, Ordering::Release);
        Ok(result)
    }

    /// In-place mutation for hot counters. Durable after the next `write` or `flush`.
    pub fn touch<R>(&self, f: impl FnOnce(&mut BTreeMap<String, T>) -> R) -> ContentResult<R> {
        let mut guard = self.docs.write().map_err(|_| self.poisoned())?;
        let result = f(&mut guard);
        self.dirty.store(true, Ordering::Release);
        Ok(result)
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty.load(Ordering::Acquire)
    }

    pub fn flush(&self) -> ContentResult<()> {
        if !self.is_dirty() {
            return Ok(());
        }
        let guard = self.docs.read().map_err(|_| self.poisoned())?;
        self.persist(&guard)?;
        self.dirty.store(false, Ordering::Release);
        Ok(())
    }

    fn persist(&self, docs: &BTreeMap<String, T>) -> ContentResult<()> {
        let Some(file) = &self.file else {
            return Ok(());
        };
        let ordered: Vec<&T> = docs.values().collect();
        yaml_store::write_yaml_file(file, self.label, &ordered)
            .map_err(|err| ContentError::storage(err.to_string()))
    }

    fn poisoned(&self) -> ContentError {
        ContentError::storage(format!("{} collection lock poisoned", self.label))
    }
}
