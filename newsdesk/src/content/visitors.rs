// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::{ContentError, ContentResult};
use super::model::DailyVisits;
use super::store::ContentStore;
use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use std::collections::VecDeque;
use std::sync::Mutex;

pub const ONLINE_WINDOW_SECONDS: i64 = 300;
const MAX_PRESENCE_EVENTS: usize = 100_000;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct VisitorStats {
    pub total_visitors: u64,
    pub current_online: u64,
    pub today_visitors: u64,
    pub page_views: u64,
}

/// Per-day visit counters kept in the store plus an in-memory presence log
/// that backs the "online now" gauge.
pub struct VisitorTracker {
    presence: Mutex<VecDeque<DateTime<Utc>>>,
    window: Duration,
}

impl Default for VisitorTracker {
    fn default() -> Self {
        Self::new()
    }
}

impl VisitorTracker {
    pub fn new() -> Self {
        Self::with_window(Duration::seconds(ONLINE_WINDOW_SECONDS))
    }

    pub fn with_window(window: Duration) -> Self {
        Self {
            presence: Mutex::new(VecDeque::new()),
            window,
        }
    }

    pub fn record_visit(&self, store: &ContentStore, now: DateTime<Utc>) -> ContentResult<()> {
        let today = now.date_naive();
        let key = today.to_string();
        store.visits.touch(|docs| {
            let day = docs.entry(key.clone()).or_insert_with(|| DailyVisits {
                id: key,
                date: today,
                total_visitors: 0,
                page_views: 0,
            });
            day.total_visitors += 1;
            day.page_views += 1;
        })?;

        let mut presence = self.presence()?;
        self.cleanup_expired(&mut presence, now);
        if presence.len() >= MAX_PRESENCE_EVENTS {
            presence.pop_front();
        }
        presence.push_back(now);
        Ok(())
    }

    pub fn stats(&self, store: &ContentStore, now: DateTime<Utc>) -> ContentResult<VisitorStats> {
        let today = now.date_naive().to_string();
        let (total_visitors, today_visits) = store.visits.read(|docs| {
            let total = docs.values().map(|day| day.total_visitors).sum::<u64>();
            (total, docs.get(&today).cloned())
        })?;

        let mut presence = self.presence()?;
        self.cleanup_expired(&mut presence, now);

        Ok(VisitorStats {
            total_visitors,
            current_online: presence.len() as u64,
            today_visitors: today_visits.as_ref().map_or(0, |day| day.total_visitors),
            page_views: today_visits.as_ref().map_or(0, |day| day.page_views),
        })
    }

    fn cleanup_expired(&self, presence: &mut VecDeque<DateTime<Utc>>, now: DateTime<Utc>) {
        let cutoff = now - self.window;
        while presence.front().is_some_and(|seen| *seen <= cutoff) {
            presence.pop_front();
        }
    }

    fn presence(&self) -> ContentResult<std::sync::MutexGuard<'_, VecDeque<DateTime<Utc>>>> {
        self.presence
            .lock()
            .map_err(|_| ContentError::storage("visitor presence lock poisoned"))
    }
}
