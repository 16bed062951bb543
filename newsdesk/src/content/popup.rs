// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::model::{DisplayFrequency, Popup};
use chrono::{DateTime, Utc};

/// Whether `now` falls inside the popup's optional start/end window (inclusive).
pub fn in_window(popup: &Popup, now: DateTime<Utc>) -> bool {
    popup.start_date.is_none_or(|start| start <= now) && popup.end_date.is_none_or(|end| end >= now)
}

/// Display-frequency policy for a visitor who last saw the popup at `last_shown`.
/// Calendar days are UTC days.
pub fn should_display(
    frequency: DisplayFrequency,
    last_shown: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> bool {
    match (frequency, last_shown) {
        (DisplayFrequency::Always, _) | (_, None) => true,
        (DisplayFrequency::Once, Some(_)) => false,
        (DisplayFrequency::Daily, Some(shown)) => shown.date_naive() != now.date_naive(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, day, hour, 0, 0).unwrap()
    }

    #[test]
    fn always_ignores_history() {
        assert!(should_display(DisplayFrequency::Always, Some(at(1, 9)), at(1, 10)));
    }

    #[test]
    fn first_view_is_always_shown() {
        for frequency in [DisplayFrequency::Once, DisplayFrequency::Daily] {
            assert!(should_display(frequency, None, at(1, 9)));
        }
    }

    #[test]
    fn once_hides_after_any_display() {
        assert!(!should_display(DisplayFrequency::Once, Some(at(1, 9)), at(20, 9)));
    }

    #[test]
    fn daily_hides_on_same_utc_day_only() {
        assert!(!should_display(DisplayFrequency::Daily, Some(at(1, 0)), at(1, 23)));
        assert!(should_display(DisplayFrequency::Daily, Some(at(1, 23)), at(2, 0)));
    }

    #[test]
    fn window_bounds_are_inclusive() {
        let popup = Popup {
            id: "p".to_string(),
            title: "Promo".to_string(),
            image: "/promo.png".to_string(),
            link: None,
            is_active: true,
            display_frequency: DisplayFrequency::Once,
            start_date: Some(at(1, 0)),
            end_date: Some(at(2, 0)),
            created_at: at(1, 0),
            updated_at: at(1, 0),
        };
        assert!(in_window(&popup, at(1, 0)));
        assert!(in_window(&popup, at(2, 0)));
        assert!(!in_window(&popup, at(2, 1)));
    }
}
