// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Editorial analytics for the admin dashboard.

use super::error::ContentResult;
use super::model::{Article, ArticleStatus};
use super::store::ContentStore;
use chrono::{DateTime, Duration, NaiveDate, Utc};
use serde::Serialize;
use std::collections::HashMap;

const RECENT_LIMIT: usize = 7;
const TOP_CATEGORIES: usize = 5;
const TOP_AUTHORS: usize = 5;
const TOP_TAGS: usize = 10;
const TREND_DAYS: i64 = 7;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardTotals {
    pub articles: usize,
    pub published: usize,
    pub drafts: usize,
    pub categories: usize,
    pub authors: usize,
    pub views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RecentArticle {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub status: ArticleStatus,
    pub author_name: Option<String>,
    pub category_name: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NamedCount {
    pub id: String,
    pub name: String,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthorReach {
    pub id: String,
    pub name: String,
    pub avatar: Option<String>,
    pub count: usize,
    pub total_views: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DailyCount {
    pub date: NaiveDate,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Dashboard {
    pub totals: DashboardTotals,
    pub recent_articles: Vec<RecentArticle>,
    pub top_categories: Vec<NamedCount>,
    pub top_authors: Vec<AuthorReach>,
    pub top_tags: Vec<NamedCount>,
    pub weekly_activity: Vec<DailyCount>,
}

/// Aggregates counts over every article regardless of status. References to
/// deleted categories, authors or tags are left out of the rankings.
pub fn build_dashboard(store: &ContentStore, now: DateTime<Utc>) -> ContentResult<Dashboard> {
    let mut articles = store.articles.all()?;
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    let categories = store.categories.all()?;
    let authors = store.authors.all()?;
    let tags = store.tags.all()?;

    let category_names: HashMap<&str, &str> = categories
        .iter()
        .map(|c| (c.id.as_str(), c.name.as_str()))
        .collect();
    let author_names: HashMap<&str, &str> = authors
        .iter()
        .map(|a| (a.id.as_str(), a.name.as_str()))
        .collect();

    let totals = DashboardTotals {
        articles: articles.len(),
        published: count_status(&articles, ArticleStatus::Published),
        drafts: count_status(&articles, ArticleStatus::Draft),
        categories: categories.len(),
        authors: authors.len(),
        views: articles.iter().map(|a| a.view_count).sum(),
    };

    let recent_articles = articles
        .iter()
        .take(RECENT_LIMIT)
        .map(|article| RecentArticle {
            id: article.id.clone(),
            title: article.title.clone(),
            slug: article.slug.clone(),
            status: article.status,
            author_name: author_names.get(article.author.as_str()).map(|n| n.to_string()),
            category_name: category_names
                .get(article.category.as_str())
                .map(|n| n.to_string()),
            created_at: article.created_at,
        })
        .collect();

    let mut per_category: HashMap<&str, usize> = HashMap::new();
    let mut per_tag: HashMap<&str, usize> = HashMap::new();
    let mut per_author: HashMap<&str, (usize, u64)> = HashMap::new();
    for article in &articles {
        *per_category.entry(article.category.as_str()).or_default() += 1;
        for tag in &article.tags {
            *per_tag.entry(tag.as_str()).or_default() += 1;
        }
        let reach = per_author.entry(article.author.as_str()).or_default();
        reach.0 += 1;
        reach.1 += article.view_count;
    }

    let top_categories = rank(
        categories
            .iter()
            .filter_map(|c| named_count(&c.id, &c.name, &per_category)),
        TOP_CATEGORIES,
    );
    let top_tags = rank(
        tags.iter()
            .filter_map(|t| named_count(&t.id, &t.name, &per_tag)),
        TOP_TAGS,
    );

    let mut top_authors: Vec<AuthorReach> = authors
        .iter()
        .filter_map(|author| {
            per_author
                .get(author.id.as_str())
                .map(|(count, views)| AuthorReach {
                    id: author.id.clone(),
                    name: author.name.clone(),
                    avatar: author.avatar.clone(),
                    count: *count,
                    total_views: *views,
                })
        })
        .collect();
    top_authors.sort_by(|a, b| {
        b.total_views
            .cmp(&a.total_views)
            .then_with(|| a.name.cmp(&b.name))
    });
    top_authors.truncate(TOP_AUTHORS);

    Ok(Dashboard {
        totals,
        recent_articles,
        top_categories,
        top_authors,
        top_tags,
        weekly_activity: weekly_activity(&articles, now),
    })
}

fn count_status(articles: &[Article], status: ArticleStatus) -> usize {
    articles.iter().filter(|a| a.status == status).count()
}

fn named_count(id: &str, name: &str, counts: &HashMap<&str, usize>) -> Option<NamedCount> {
    counts.get(id).map(|count| NamedCount {
        id: id.to_string(),
        name: name.to_string(),
        count: *count,
    })
}

fn rank(items: impl Iterator<Item = NamedCount>, limit: usize) -> Vec<NamedCount> {
    let mut items: Vec<NamedCount> = items.collect();
    items.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    items.truncate(limit);
    items
}

/// Articles created per UTC day over the last seven days, oldest first.
fn weekly_activity(articles: &[Article], now: DateTime<Utc>) -> Vec<DailyCount> {
    let today = now.date_naive();
    (0..TREND_DAYS)
        .rev()
        .map(|days_ago| {
            let date = today - Duration::days(days_ago);
            DailyCount {
                date,
                count: articles
                    .iter()
                    .filter(|a| a.created_at.date_naive() == date)
                    .count(),
            }
        })
        .collect()
}
