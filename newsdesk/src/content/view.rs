// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Article read model: category, author and tags resolved to their display
//! fields. The creating account is only shown to staff.

use super::error::ContentResult;
use super::model::{Article, ArticleStatus};
use super::store::ContentStore;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::collections::HashMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    Staff,
    Public,
}

/// Category or tag as embedded in an article.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TermRef {
    pub id: String,
    pub name: String,
    pub slug: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BylineRef {
    pub id: String,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub avatar: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ArticleView {
    pub id: String,
    pub title: String,
    pub slug: String,
    pub content: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub excerpt: Option<String>,
    /// `null` once the referenced category is gone.
    pub category: Option<TermRef>,
    pub author: Option<BylineRef>,
    pub tags: Vec<TermRef>,
    pub status: ArticleStatus,
    pub published_at: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub featured_image: Option<String>,
    pub images: Vec<String>,
    pub view_count: u64,
    pub share_count: u64,
    pub is_breaking: bool,
    pub is_live: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created_by: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Lookup tables for the documents articles point at, taken in one read of
/// each collection.
pub struct References {
    categories: HashMap<String, TermRef>,
    tags: HashMap<String, TermRef>,
    authors: HashMap<String, BylineRef>,
}

impl References {
    pub fn load(store: &ContentStore) -> ContentResult<Self> {
        let categories = store.categories.read(|docs| {
            docs.values()
                .map(|category| {
                    let term = TermRef {
                        id: category.id.clone(),
                        name: category.name.clone(),
                        slug: category.slug.clone(),
                    };
                    (category.id.clone(), term)
                })
                .collect()
        })?;
        let tags = store.tags.read(|docs| {
            docs.values()
                .map(|tag| {
                    let term = TermRef {
                        id: tag.id.clone(),
                        name: tag.name.clone(),
                        slug: tag.slug.clone(),
                    };
                    (tag.id.clone(), term)
                })
                .collect()
        })?;
        let authors = store.authors.read(|docs| {
            docs.values()
                .map(|author| {
                    let byline = BylineRef {
                        id: author.id.clone(),
                        name: author.name.clone(),
                        avatar: author.avatar.clone(),
                    };
                    (author.id.clone(), byline)
                })
                .collect()
        })?;
        Ok(Self {
            categories,
            tags,
            authors,
        })
    }

    pub fn category(&self, id: &str) -> Option<&TermRef> {
        self.categories.get(id)
    }

    pub fn author(&self, id: &str) -> Option<&BylineRef> {
        self.authors.get(id)
    }

    pub fn view(&self, article: Article, audience: Audience) -> ArticleView {
        let Article {
            id,
            title,
            slug,
            content,
            excerpt,
            category,
            author,
            tags,
            status,
            published_at,
            featured_image,
            images,
            view_count,
            share_count,
            is_breaking,
            is_live,
            created_by,
            created_at,
            updated_at,
        } = article;

        ArticleView {
            id,
            title,
            slug,
            content,
            excerpt,
            category: self.categories.get(&category).cloned(),
            author: self.authors.get(&author).cloned(),
            // Dangling tag ids are dropped.
            tags: tags
                .iter()
                .filter_map(|tag| self.tags.get(tag).cloned())
                .collect(),
            status,
            published_at,
            featured_image,
            images,
            view_count,
            share_count,
            is_breaking,
            is_live,
            created_by: match audience {
                Audience::Staff => created_by,
                Audience::Public => None,
            },
            created_at,
            updated_at,
        }
    }

    pub fn view_all(&self, articles: Vec<Article>, audience: Audience) -> Vec<ArticleView> {
        articles
            .into_iter()
            .map(|article| self.view(article, audience))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{AuthorInput, NameInput};
    use chrono::Utc;

    fn stored_article(store: &ContentStore, category: &str, author: &str, tags: Vec<String>) -> Article {
        let now = Utc::now();
        let article = Article {
            id: "a1".to_string(),
            title: "Budget passes".to_string(),
            slug: "budget-passes-12".to_string(),
            content: "<p>Late vote.</p>".to_string(),
            excerpt: None,
            category: category.to_string(),
            author: author.to_string(),
            tags,
            status: ArticleStatus::Published,
            published_at: Some(now),
            featured_image: None,
            images: Vec::new(),
            view_count: 3,
            share_count: 0,
            is_breaking: false,
            is_live: false,
            created_by: Some("editor@example.com".to_string()),
            created_at: now,
            updated_at: now,
        };
        store
            .articles
            .write(|docs| {
                docs.insert(article.id.clone(), article.clone());
                Ok(())
            })
            .expect("insert");
        article
    }

    #[test]
    fn resolves_references_and_hides_owner_from_public() {
        let store = ContentStore::in_memory();
        let now = Utc::now();
        let category = store
            .create_category(
                NameInput {
                    name: Some("Politics".to_string()),
                    description: None,
                },
                now,
            )
            .expect("category");
        let tag = store
            .create_tag(
                NameInput {
                    name: Some("Elections".to_string()),
                    description: None,
                },
                now,
            )
            .expect("tag");
        let author = store
            .create_author(
                AuthorInput {
                    name: Some("Jane Reporter".to_string()),
                    avatar: Some("/img/jane.png".to_string()),
                    ..AuthorInput::default()
                },
                now,
            )
            .expect("author");
        let article = stored_article(
            &store,
            &category.id,
            &author.id,
            vec![tag.id.clone(), "gone".to_string()],
        );

        let references = References::load(&store).expect("load");
        let public = references.view(article.clone(), Audience::Public);
        assert_eq!(public.category.as_ref().map(|c| c.name.as_str()), Some("Politics"));
        assert_eq!(public.category.as_ref().map(|c| c.slug.as_str()), Some("politics"));
        assert_eq!(
            public.author,
            Some(BylineRef {
                id: author.id.clone(),
                name: "Jane Reporter".to_string(),
                avatar: Some("/img/jane.png".to_string()),
            })
        );
        assert_eq!(public.tags.len(), 1);
        assert_eq!(public.tags[0].name, "Elections");
        assert_eq!(public.created_by, None);
        let json = serde_json::to_value(&public).expect("serialize");
        assert!(json.get("createdBy").is_none());

        let staff = references.view(article, Audience::Staff);
        assert_eq!(staff.created_by.as_deref(), Some("editor@example.com"));
    }

    #[test]
    fn missing_category_and_author_become_null() {
        let store = ContentStore::in_memory();
        let article = stored_article(&store, "no-such-category", "no-such-author", Vec::new());

        let view = References::load(&store)
            .expect("load")
            .view(article, Audience::Public);
        let json = serde_json::to_value(&view).expect("serialize");
        assert!(json["category"].is_null());
        assert!(json["author"].is_null());
        assert_eq!(json["tags"], serde_json::json!([]));
    }
}
