// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Article status changes and the role checks around article mutation.

use super::error::{ContentError, ContentResult};
use super::model::{
    Article, ArticlePatch, ArticleStatus, NewArticle, new_document_id, optional, required,
};
use super::slug::{FALLBACK_ARTICLE_BASE, slugify, suffixed_unique};
use super::store::ContentStore;
use crate::config::LifecycleSettings;
use crate::gate::rules::{Operation, Resource, authorize};
use crate::iam::Principal;
use crate::roles::Role;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, BTreeSet};

/// Allowed status edges. Self-transitions are always allowed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransitionTable {
    edges: BTreeMap<ArticleStatus, BTreeSet<ArticleStatus>>,
}

impl TransitionTable {
    pub fn permissive() -> Self {
        let edges = ArticleStatus::ALL
            .into_iter()
            .map(|from| (from, ArticleStatus::ALL.into_iter().collect()))
            .collect();
        Self { edges }
    }

    pub fn from_edges(edges: &BTreeMap<ArticleStatus, Vec<ArticleStatus>>) -> Self {
        let edges = edges
            .iter()
            .map(|(from, targets)| (*from, targets.iter().copied().collect()))
            .collect();
        Self { edges }
    }

    pub fn allows(&self, from: ArticleStatus, to: ArticleStatus) -> bool {
        from == to
            || self
                .edges
                .get(&from)
                .is_some_and(|targets| targets.contains(&to))
    }
}

impl Default for TransitionTable {
    fn default() -> Self {
        Self::permissive()
    }
}

pub struct LifecycleAuthority {
    transitions: TransitionTable,
    editors_own_articles: bool,
}

impl LifecycleAuthority {
    pub fn new(settings: &LifecycleSettings) -> Self {
        Self {
            transitions: settings.transitions.clone(),
            editors_own_articles: settings.editors_own_articles,
        }
    }

    pub fn create(
        &self,
        store: &ContentStore,
        input: NewArticle,
        actor: &Principal,
        now: DateTime<Utc>,
    ) -> ContentResult<Article> {
        authorize(Some(actor), Resource::Article, Operation::Create)?;

        let title = required(input.title, "Title")?;
        let content = required(input.content, "Content")?;
        let category = required(input.category, "Category")?;
        let author = required(input.author, "Author")?;
        let tags = normalize_tags(input.tags);
        check_references(store, Some(&category), Some(&author), &tags)?;

        let status = input.status.unwrap_or_default();
        let mut base = slugify(&title);
        if base.is_empty() {
            base = FALLBACK_ARTICLE_BASE.to_string();
        }

        let article = store.articles.write(|docs| {
            let slug = suffixed_unique(&base, |candidate| {
                docs.values().any(|existing| existing.slug == candidate)
            });
            let article = Article {
                id: new_document_id(),
                title,
                slug,
                content,
                excerpt: optional(input.excerpt),
                category,
                author,
                tags,
                status,
                published_at: (status == ArticleStatus::Published).then_some(now),
                featured_image: optional(input.featured_image),
                images: input.images,
                view_count: 0,
                share_count: 0,
                is_breaking: input.is_breaking,
                is_live: input.is_live,
                created_by: Some(actor.email.clone()),
                created_at: now,
                updated_at: now,
            };
            docs.insert(article.id.clone(), article.clone());
            Ok(article)
        })?;

        log::info!(
            "Article '{}' created by {} as {}",
            article.slug,
            actor.email,
            article.status
        );
        Ok(article)
    }

    /// Applies a partial update. The slug is kept when the title changes so
    /// that published links stay stable.
    pub fn update(
        &self,
        store: &ContentStore,
        id: &str,
        patch: ArticlePatch,
        actor: &Principal,
        now: DateTime<Utc>,
    ) -> ContentResult<Article> {
        let role = authorize(Some(actor), Resource::Article, Operation::Update)?;

        let title = patch.title.map(|t| required(Some(t), "Title")).transpose()?;
        let content = patch
            .content
            .map(|c| required(Some(c), "Content"))
            .transpose()?;
        let category = patch
            .category
            .map(|c| required(Some(c), "Category"))
            .transpose()?;
        let author = patch
            .author
            .map(|a| required(Some(a), "Author"))
            .transpose()?;
        let tags = patch.tags.map(normalize_tags);
        check_references(
            store,
            category.as_deref(),
            author.as_deref(),
            tags.as_deref().unwrap_or_default(),
        )?;

        let updated = store.articles.write(|docs| {
            let article = docs
                .get_mut(id)
                .ok_or_else(|| ContentError::not_found("Article not found"))?;
            self.check_owner(article, actor, role)?;

            if let Some(status) = patch.status {
                self.transition(article, status, now)?;
            }
            if let Some(title) = title {
                article.title = title;
            }
            if let Some(content) = content {
                article.content = content;
            }
            if let Some(excerpt) = patch.excerpt {
                article.excerpt = optional(Some(excerpt));
            }
            if let Some(category) = category {
                article.category = category;
            }
            if let Some(author) = author {
                article.author = author;
            }
            if let Some(tags) = tags {
                article.tags = tags;
            }
            if let Some(featured_image) = patch.featured_image {
                article.featured_image = optional(Some(featured_image));
            }
            if let Some(images) = patch.images {
                article.images = images;
            }
            if let Some(is_breaking) = patch.is_breaking {
                article.is_breaking = is_breaking;
            }
            if let Some(is_live) = patch.is_live {
                article.is_live = is_live;
            }
            article.updated_at = now;
            Ok(article.clone())
        })?;

        log::debug!("Article '{}' updated by {}", updated.slug, actor.email);
        Ok(updated)
    }

    /// Moves `article` to `to`. Entering `published` stamps `published_at`
    /// only the first time; it is never cleared.
    pub fn transition(
        &self,
        article: &mut Article,
        to: ArticleStatus,
        now: DateTime<Utc>,
    ) -> ContentResult<()> {
        let from = article.status;
        if !self.transitions.allows(from, to) {
            return Err(ContentError::validation(format!(
                "Cannot move article from {} to {}",
                from, to
            )));
        }
        article.status = to;
        if to == ArticleStatus::Published && article.published_at.is_none() {
            article.published_at = Some(now);
        }
        Ok(())
    }

    pub fn delete(&self, store: &ContentStore, id: &str, actor: &Principal) -> ContentResult<()> {
        authorize(Some(actor), Resource::Article, Operation::Delete)?;
        let removed = store.articles.write(|docs| {
            docs.remove(id)
                .ok_or_else(|| ContentError::not_found("Article not found"))
        })?;
        log::info!("Article '{}' deleted by {}", removed.slug, actor.email);
        Ok(())
    }

    fn check_owner(&self, article: &Article, actor: &Principal, role: Role) -> ContentResult<()> {
        if !self.editors_own_articles || role.is_admin() {
            return Ok(());
        }
        match &article.created_by {
            Some(owner) if owner.eq_ignore_ascii_case(&actor.email) => Ok(()),
            _ => Err(ContentError::Unauthorized("Unauthorized".to_string())),
        }
    }
}

fn normalize_tags(tags: Vec<String>) -> Vec<String> {
    let mut seen = BTreeSet::new();
    tags.into_iter()
        .map(|tag| tag.trim().to_string())
        .filter(|tag| !tag.is_empty() && seen.insert(tag.clone()))
        .collect()
}

fn check_references(
    store: &ContentStore,
    category: Option<&str>,
    author: Option<&str>,
    tags: &[String],
) -> ContentResult<()> {
    if let Some(category) = category
        && !store.categories.contains(category)?
    {
        return Err(ContentError::validation(format!(
            "Unknown category '{}'",
            category
        )));
    }
    if let Some(author) = author
        && !store.authors.contains(author)?
    {
        return Err(ContentError::validation(format!(
            "Unknown author '{}'",
            author
        )));
    }
    for tag in tags {
        if !store.tags.contains(tag)? {
            return Err(ContentError::validation(format!("Unknown tag '{}'", tag)));
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{AuthorInput, NameInput};
    use std::collections::HashSet;

    fn principal(email: &str, role: &str) -> Principal {
        Principal {
            email: email.to_string(),
            name: email.to_string(),
            role: role.to_string(),
        }
    }

    fn admin() -> Principal {
        principal("admin@example.com", "admin")
    }

    fn editor() -> Principal {
        principal("editor@example.com", "editor")
    }

    fn seeded_store() -> (ContentStore, String, String) {
        let store = ContentStore::in_memory();
        let now = Utc::now();
        let category = store
            .create_category(
                NameInput {
                    name: Some("World".to_string()),
                    description: None,
                },
                now,
            )
            .expect("category");
        let author = store
            .create_author(
                AuthorInput {
                    name: Some("Jane Reporter".to_string()),
                    ..Default::default()
                },
                now,
            )
            .expect("author");
        (store, category.id, author.id)
    }

    fn draft(title: &str, category: &str, author: &str) -> NewArticle {
        NewArticle {
            title: Some(title.to_string()),
            content: Some("<p>Body</p>".to_string()),
            category: Some(category.to_string()),
            author: Some(author.to_string()),
            ..Default::default()
        }
    }

    fn authority(settings: LifecycleSettings) -> LifecycleAuthority {
        LifecycleAuthority::new(&settings)
    }

    #[test]
    fn draft_has_no_publish_stamp_until_published() {
        let (store, category, author) = seeded_store();
        let lifecycle = authority(LifecycleSettings::default());
        let created_at = Utc::now();

        let article = lifecycle
            .create(&store, draft("Big Story", &category, &author), &editor(), created_at)
            .expect("create");
        assert_eq!(article.status, ArticleStatus::Draft);
        assert!(article.published_at.is_none());
        assert_eq!(article.created_by.as_deref(), Some("editor@example.com"));
        assert!(article.slug.starts_with("big-story-"));

        let first_publish = created_at + chrono::Duration::minutes(5);
        let published = lifecycle
            .update(
                &store,
                &article.id,
                ArticlePatch {
                    status: Some(ArticleStatus::Published),
                    ..Default::default()
                },
                &editor(),
                first_publish,
            )
            .expect("publish");
        assert_eq!(published.published_at, Some(first_publish));

        let republished = lifecycle
            .update(
                &store,
                &article.id,
                ArticlePatch {
                    status: Some(ArticleStatus::Published),
                    ..Default::default()
                },
                &admin(),
                first_publish + chrono::Duration::hours(1),
            )
            .expect("republish");
        assert_eq!(republished.published_at, Some(first_publish));
    }

    #[test]
    fn archiving_keeps_the_publish_stamp() {
        let (store, category, author) = seeded_store();
        let lifecycle = authority(LifecycleSettings::default());
        let now = Utc::now();
        let mut input = draft("Stamped", &category, &author);
        input.status = Some(ArticleStatus::Published);
        let article = lifecycle.create(&store, input, &admin(), now).expect("create");
        assert_eq!(article.published_at, Some(now));

        let archived = lifecycle
            .update(
                &store,
                &article.id,
                ArticlePatch {
                    status: Some(ArticleStatus::Archived),
                    ..Default::default()
                },
                &admin(),
                now + chrono::Duration::days(1),
            )
            .expect("archive");
        assert_eq!(archived.status, ArticleStatus::Archived);
        assert_eq!(archived.published_at, Some(now));
    }

    #[test]
    fn identical_titles_get_distinct_slugs() {
        let (store, category, author) = seeded_store();
        let lifecycle = authority(LifecycleSettings::default());
        let now = Utc::now();
        let mut slugs = HashSet::new();
        for _ in 0..1000 {
            let article = lifecycle
                .create(&store, draft("Same Headline", &category, &author), &admin(), now)
                .expect("create");
            assert!(slugs.insert(article.slug));
        }
        assert_eq!(slugs.len(), 1000);
    }

    #[test]
    fn punctuation_only_title_uses_fallback_base() {
        let (store, category, author) = seeded_store();
        let lifecycle = authority(LifecycleSettings::default());
        let article = lifecycle
            .create(&store, draft("?!", &category, &author), &admin(), Utc::now())
            .expect("create");
        assert!(article.slug.starts_with("article-"));
    }

    #[test]
    fn missing_fields_and_unknown_references_are_validation_errors() {
        let (store, category, author) = seeded_store();
        let lifecycle = authority(LifecycleSettings::default());
        let now = Utc::now();

        let mut input = draft("No body", &category, &author);
        input.content = Some("   ".to_string());
        let err = lifecycle.create(&store, input, &admin(), now).unwrap_err();
        assert_eq!(err, ContentError::validation("Content is required"));

        let input = draft("Lost", "missing-category", &author);
        let err = lifecycle.create(&store, input, &admin(), now).unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));

        let mut input = draft("Tagged", &category, &author);
        input.tags = vec!["nope".to_string()];
        let err = lifecycle.create(&store, input, &admin(), now).unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));
    }

    #[test]
    fn forbidden_edge_is_rejected_and_self_transition_allowed() {
        let (store, category, author) = seeded_store();
        let edges: BTreeMap<ArticleStatus, Vec<ArticleStatus>> = [
            (ArticleStatus::Draft, vec![ArticleStatus::Published]),
            (ArticleStatus::Published, vec![ArticleStatus::Archived]),
        ]
        .into_iter()
        .collect();
        let lifecycle = authority(LifecycleSettings {
            transitions: TransitionTable::from_edges(&edges),
            editors_own_articles: false,
        });
        let now = Utc::now();
        let article = lifecycle
            .create(&store, draft("Strict", &category, &author), &admin(), now)
            .expect("create");

        let err = lifecycle
            .update(
                &store,
                &article.id,
                ArticlePatch {
                    status: Some(ArticleStatus::Archived),
                    ..Default::default()
                },
                &admin(),
                now,
            )
            .unwrap_err();
        assert!(matches!(err, ContentError::Validation(_)));

        lifecycle
            .update(
                &store,
                &article.id,
                ArticlePatch {
                    status: Some(ArticleStatus::Draft),
                    title: Some("Still strict".to_string()),
                    ..Default::default()
                },
                &admin(),
                now,
            )
            .expect("self transition");
        let stored = store.articles.get(&article.id).expect("get").expect("article");
        assert_eq!(stored.title, "Still strict");
        assert_eq!(stored.slug, article.slug);
    }

    #[test]
    fn delete_is_admin_only() {
        let (store, category, author) = seeded_store();
        let lifecycle = authority(LifecycleSettings::default());
        let article = lifecycle
            .create(&store, draft("Doomed", &category, &author), &editor(), Utc::now())
            .expect("create");

        let err = lifecycle.delete(&store, &article.id, &editor()).unwrap_err();
        assert!(matches!(err, ContentError::Unauthorized(_)));

        lifecycle.delete(&store, &article.id, &admin()).expect("delete");
        let err = lifecycle.delete(&store, &article.id, &admin()).unwrap_err();
        assert_eq!(err, ContentError::not_found("Article not found"));
    }

    #[test]
    fn unknown_role_cannot_create() {
        let (store, category, author) = seeded_store();
        let lifecycle = authority(LifecycleSettings::default());
        let err = lifecycle
            .create(
                &store,
                draft("Nope", &category, &author),
                &principal("reader@example.com", "reader"),
                Utc::now(),
            )
            .unwrap_err();
        assert!(matches!(err, ContentError::Unauthorized(_)));
    }

    #[test]
    fn ownership_limits_editors_when_enabled() {
        let (store, category, author) = seeded_store();
        let lifecycle = authority(LifecycleSettings {
            transitions: TransitionTable::permissive(),
            editors_own_articles: true,
        });
        let now = Utc::now();
        let article = lifecycle
            .create(&store, draft("Mine", &category, &author), &editor(), now)
            .expect("create");

        let other = principal("other@example.com", "editor");
        let patch = || ArticlePatch {
            excerpt: Some("Short".to_string()),
            ..Default::default()
        };
        let err = lifecycle
            .update(&store, &article.id, patch(), &other, now)
            .unwrap_err();
        assert!(matches!(err, ContentError::Unauthorized(_)));

        lifecycle
            .update(&store, &article.id, patch(), &editor(), now)
            .expect("owner update");
        lifecycle
            .update(&store, &article.id, patch(), &admin(), now)
            .expect("admin update");
    }

    #[test]
    fn permissive_table_allows_every_edge() {
        let table = TransitionTable::permissive();
        for from in ArticleStatus::ALL {
            for to in ArticleStatus::ALL {
                assert!(table.allows(from, to));
            }
        }
    }
}
