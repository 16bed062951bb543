// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use argon2::password_hash::rand_core::{OsRng, RngCore};

/// Exclusive upper bound of the random article suffix.
pub const SUFFIX_RANGE: u32 = 1000;
/// Random suffixes tried before falling back to a counter.
pub const RANDOM_ATTEMPTS: u32 = 16;
/// Base used when a title has no letters or digits at all.
pub const FALLBACK_ARTICLE_BASE: &str = "article";

/// Lower-cases `text`, collapses every run of non-alphanumeric characters into
/// a single hyphen and trims hyphens from both ends.
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    let mut pending_hyphen = false;
    for ch in text.chars().flat_map(char::to_lowercase) {
        if ch.is_alphanumeric() {
            if pending_hyphen && !slug.is_empty() {
                slug.push('-');
            }
            pending_hyphen = false;
            slug.push(ch);
        } else {
            pending_hyphen = true;
        }
    }
    slug
}

/// Picks `<base>-<n>` not rejected by `is_taken`. Random `n` first, then a
/// counter starting at [`SUFFIX_RANGE`], so the loop always terminates with a
/// free slug. Callers hold the collection write lock while calling this.
pub fn suffixed_unique(base: &str, is_taken: impl Fn(&str) -> bool) -> String {
    suffixed_unique_with(base, is_taken, || OsRng.next_u32() % SUFFIX_RANGE)
}

fn suffixed_unique_with(
    base: &str,
    is_taken: impl Fn(&str) -> bool,
    mut next_random: impl FnMut() -> u32,
) -> String {
    for _ in 0..RANDOM_ATTEMPTS {
        let candidate = format!("{}-{}", base, next_random());
        if !is_taken(&candidate) {
            return candidate;
        }
    }

    log::debug!(
        "Random slug suffixes exhausted for '{}', using counter fallback",
        base
    );
    let mut counter = u64::from(SUFFIX_RANGE);
    loop {
        let candidate = format!("{}-{}", base, counter);
        if !is_taken(&candidate) {
            return candidate;
        }
        counter += 1;
    }
}
