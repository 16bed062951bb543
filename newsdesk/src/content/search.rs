// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::ContentResult;
use super::feed::strip_html;
use super::model::Article;
use super::store::ContentStore;

pub const SEARCH_LIMIT: usize = 10;
const TITLE_WEIGHT: usize = 2;

fn terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|term| !term.is_empty())
        .map(str::to_lowercase)
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

fn score(article: &Article, terms: &[String]) -> usize {
    let title = article.title.to_lowercase();
    let mut body = strip_html(&article.content).to_lowercase();
    if let Some(excerpt) = &article.excerpt {
        body.push(' ');
        body.push_str(&excerpt.to_lowercase());
    }
    terms
        .iter()
        .map(|term| {
            title.matches(term.as_str()).count() * TITLE_WEIGHT + body.matches(term.as_str()).count()
        })
        .sum()
}

/// Published articles matching any term of `query`, best match first, ties
/// broken by recency. An empty query matches nothing.
pub fn search_articles(store: &ContentStore, query: &str) -> ContentResult<Vec<Article>> {
    let terms = terms(query);
    if terms.is_empty() {
        return Ok(Vec::new());
    }

    let mut ranked: Vec<(usize, Article)> = store
        .articles
        .filter(Article::is_published)?
        .into_iter()
        .filter_map(|article| {
            let hits = score(&article, &terms);
            (hits > 0).then_some((hits, article))
        })
        .collect();
    ranked.sort_by(|(a_hits, a), (b_hits, b)| {
        b_hits.cmp(a_hits).then_with(|| b.created_at.cmp(&a.created_at))
    });
    Ok(ranked
        .into_iter()
        .take(SEARCH_LIMIT)
        .map(|(_, article)| article)
        .collect())
}
