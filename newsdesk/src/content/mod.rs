// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

pub mod collection;
pub mod dashboard;
pub mod error;
pub mod feed;
pub mod lifecycle;
pub mod model;
pub mod popup;
pub mod search;
pub mod slug;
pub mod store;
pub mod view;
pub mod visitors;

pub use error::{ContentError, ContentResult};
pub use lifecycle::{LifecycleAuthority, TransitionTable};
pub use store::{ArticleQuery, ContentStore};
pub use view::{ArticleView, Audience, References};
pub use visitors::VisitorTracker;
