// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::collection::{Collection, Document};
use super::error::{ContentError, ContentResult};
use super::model::{
    Article, ArticleStatus, Author, AuthorInput, Category, DailyVisits, EPaper, NameInput,
    NewEPaper, NewPoll, Poll, PollOption, Popup, PopupInput, Subscriber, Tag, new_document_id,
    optional, required,
};
use super::slug::slugify;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::path::Path;

pub const DEFAULT_ARTICLE_LIMIT: usize = 20;
pub const MAX_ARTICLE_LIMIT: usize = 100;
pub const EPAPER_LIMIT: usize = 50;
pub const BREAKING_NEWS_LIMIT: usize = 5;

/// Every document collection of the site. Created once at startup with
/// [`ContentStore::open`] and flushed at shutdown with [`ContentStore::flush`].
pub struct ContentStore {
    pub articles: Collection<Article>,
    pub categories: Collection<Category>,
    pub tags: Collection<Tag>,
    pub authors: Collection<Author>,
    pub polls: Collection<Poll>,
    pub popups: Collection<Popup>,
    pub epapers: Collection<EPaper>,
    pub subscribers: Collection<Subscriber>,
    pub visits: Collection<DailyVisits>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ArticleQuery {
    /// Category id or slug.
    pub category: Option<String>,
    /// Tag id or slug.
    pub tag: Option<String>,
    pub status: Option<ArticleStatus>,
    pub limit: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Headline {
    pub id: String,
    pub title: String,
    pub slug: String,
}

impl ContentStore {
    pub fn open(data_dir: &Path) -> ContentResult<Self> {
        let store = Self {
            articles: Collection::open(data_dir, "articles")?,
            categories: Collection::open(data_dir, "categories")?,
            tags: Collection::open(data_dir, "tags")?,
            authors: Collection::open(data_dir, "authors")?,
            polls: Collection::open(data_dir, "polls")?,
            popups: Collection::open(data_dir, "popups")?,
            epapers: Collection::open(data_dir, "epapers")?,
            subscribers: Collection::open(data_dir, "subscribers")?,
            visits: Collection::open(data_dir, "visits")?,
        };
        log::info!(
            "Content store opened at {} ({} articles)",
            data_dir.display(),
            store.articles.count(|_| true)?
        );
        Ok(store)
    }

    pub fn in_memory() -> Self {
        Self {
            articles: Collection::in_memory("articles"),
            categories: Collection::in_memory("categories"),
            tags: Collection::in_memory("tags"),
            authors: Collection::in_memory("authors"),
            polls: Collection::in_memory("polls"),
            popups: Collection::in_memory("popups"),
            epapers: Collection::in_memory("epapers"),
            subscribers: Collection::in_memory("subscribers"),
            visits: Collection::in_memory("visits"),
        }
    }

    /// Persists collections holding unsaved counter updates. Every collection
    /// is attempted; the first failure is returned.
    pub fn flush(&self) -> ContentResult<()> {
        let results = [
            self.articles.flush(),
            self.categories.flush(),
            self.tags.flush(),
            self.authors.flush(),
            self.polls.flush(),
            self.popups.flush(),
            self.epapers.flush(),
            self.subscribers.flush(),
            self.visits.flush(),
        ];
        let mut first_error = None;
        for err in results.into_iter().filter_map(Result::err) {
            log::error!("Failed to flush content store: {}", err);
            first_error.get_or_insert(err);
        }
        first_error.map_or(Ok(()), Err)
    }

    // Articles

    pub fn list_articles(&self, query: &ArticleQuery) -> ContentResult<Vec<Article>> {
        let category = match &query.category {
            Some(key) => match self.resolve_category(key)? {
                Some(id) => Some(id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };
        let tag = match &query.tag {
            Some(key) => match self.resolve_tag(key)? {
                Some(id) => Some(id),
                None => return Ok(Vec::new()),
            },
            None => None,
        };

        let mut articles = self.articles.filter(|article| {
            category.as_ref().is_none_or(|id| &article.category == id)
                && tag.as_ref().is_none_or(|id| article.tags.contains(id))
                && query.status.is_none_or(|status| article.status == status)
        })?;
        newest_first(&mut articles);
        articles.truncate(clamp_limit(query.limit));
        Ok(articles)
    }

    pub fn get_article(&self, id: &str) -> ContentResult<Article> {
        self.articles
            .get(id)?
            .ok_or_else(|| ContentError::not_found("Article not found"))
    }

    /// Returns the published article with `slug` and counts one view.
    pub fn view_published_article(&self, slug: &str) -> ContentResult<Article> {
        self.articles
            .touch(|docs| {
                docs.values_mut()
                    .find(|article| article.slug == slug && article.is_published())
                    .map(|article| {
                        article.view_count += 1;
                        article.clone()
                    })
            })?
            .ok_or_else(|| ContentError::not_found("Article not found"))
    }

    pub fn breaking_news(&self) -> ContentResult<Vec<Headline>> {
        let mut articles = self
            .articles
            .filter(|article| article.is_published() && article.is_breaking)?;
        newest_first(&mut articles);
        Ok(articles
            .into_iter()
            .take(BREAKING_NEWS_LIMIT)
            .map(|article| Headline {
                id: article.id,
                title: article.title,
                slug: article.slug,
            })
            .collect())
    }

    fn resolve_category(&self, key: &str) -> ContentResult<Option<String>> {
        self.categories.read(|docs| {
            docs.get(key)
                .or_else(|| docs.values().find(|category| category.slug == key))
                .map(|category| category.id.clone())
        })
    }

    fn resolve_tag(&self, key: &str) -> ContentResult<Option<String>> {
        self.tags.read(|docs| {
            docs.get(key)
                .or_else(|| docs.values().find(|tag| tag.slug == key))
                .map(|tag| tag.id.clone())
        })
    }

    // Categories and tags

    pub fn list_categories(&self) -> ContentResult<Vec<Category>> {
        list_by_name(&self.categories)
    }

    pub fn get_category(&self, id: &str) -> ContentResult<Category> {
        self.categories
            .get(id)?
            .ok_or_else(|| ContentError::not_found(format!("{} not found", Category::KIND)))
    }

    pub fn create_category(&self, input: NameInput, now: DateTime<Utc>) -> ContentResult<Category> {
        create_named(&self.categories, input, now)
    }

    pub fn update_category(
        &self,
        id: &str,
        input: NameInput,
        now: DateTime<Utc>,
    ) -> ContentResult<Category> {
        update_named(&self.categories, id, input, now)
    }

    /// Articles keep their reference to a deleted category.
    pub fn delete_category(&self, id: &str) -> ContentResult<()> {
        delete_named(&self.categories, id)
    }

    pub fn list_tags(&self) -> ContentResult<Vec<Tag>> {
        list_by_name(&self.tags)
    }

    pub fn create_tag(&self, input: NameInput, now: DateTime<Utc>) -> ContentResult<Tag> {
        create_named(&self.tags, input, now)
    }

    pub fn update_tag(&self, id: &str, input: NameInput, now: DateTime<Utc>) -> ContentResult<Tag> {
        update_named(&self.tags, id, input, now)
    }

    pub fn delete_tag(&self, id: &str) -> ContentResult<()> {
        delete_named(&self.tags, id)
    }

    // Authors

    pub fn list_authors(&self) -> ContentResult<Vec<Author>> {
        let mut authors = self.authors.all()?;
        authors.sort_by(|a, b| a.name.to_lowercase().cmp(&b.name.to_lowercase()));
        Ok(authors)
    }

    pub fn create_author(&self, input: AuthorInput, now: DateTime<Utc>) -> ContentResult<Author> {
        let name = required(input.name, "Name")?;
        let author = Author {
            id: new_document_id(),
            name,
            bio: optional(input.bio),
            avatar: optional(input.avatar),
            email: optional(input.email),
            created_at: now,
            updated_at: now,
        };
        self.authors.write(|docs| {
            docs.insert(author.id.clone(), author.clone());
            Ok(())
        })?;
        Ok(author)
    }

    pub fn update_author(
        &self,
        id: &str,
        input: AuthorInput,
        now: DateTime<Utc>,
    ) -> ContentResult<Author> {
        let name = input.name.map(|n| required(Some(n), "Name")).transpose()?;
        self.authors.write(|docs| {
            let author = docs
                .get_mut(id)
                .ok_or_else(|| ContentError::not_found("Author not found"))?;
            if let Some(name) = name {
                author.name = name;
            }
            if input.bio.is_some() {
                author.bio = optional(input.bio);
            }
            if input.avatar.is_some() {
                author.avatar = optional(input.avatar);
            }
            if input.email.is_some() {
                author.email = optional(input.email);
            }
            author.updated_at = now;
            Ok(author.clone())
        })
    }

    pub fn delete_author(&self, id: &str) -> ContentResult<()> {
        self.authors.write(|docs| {
            docs.remove(id)
                .map(|_| ())
                .ok_or_else(|| ContentError::not_found("Author not found"))
        })
    }

    // Polls

    /// Newest active poll that has not expired.
    pub fn active_poll(&self, now: DateTime<Utc>) -> ContentResult<Option<Poll>> {
        let polls = self
            .polls
            .filter(|poll| poll.is_active && !poll.is_expired(now))?;
        Ok(polls.into_iter().max_by_key(|poll| poll.created_at))
    }

    pub fn create_poll(&self, input: NewPoll, now: DateTime<Utc>) -> ContentResult<Poll> {
        let question = required(input.question, "Question")?;
        let options: Vec<PollOption> = input
            .options
            .into_iter()
            .map(|text| text.trim().to_string())
            .filter(|text| !text.is_empty())
            .map(|text| PollOption {
                id: new_document_id(),
                text,
                votes: 0,
            })
            .collect();
        if options.len() < 2 {
            return Err(ContentError::validation(
                "A poll needs at least two options",
            ));
        }
        let poll = Poll {
            id: new_document_id(),
            question,
            options,
            is_active: input.is_active.unwrap_or(true),
            expires_at: input.expires_at,
            total_votes: 0,
            created_at: now,
            updated_at: now,
        };
        self.polls.write(|docs| {
            docs.insert(poll.id.clone(), poll.clone());
            Ok(())
        })?;
        Ok(poll)
    }

    /// Counts one vote. The option and the poll total change together.
    pub fn vote(&self, poll_id: &str, option_id: &str, now: DateTime<Utc>) -> ContentResult<Poll> {
        if poll_id.trim().is_empty() || option_id.trim().is_empty() {
            return Err(ContentError::validation("Poll ID and option ID required"));
        }
        self.polls.write(|docs| {
            let poll = docs
                .get_mut(poll_id)
                .ok_or_else(|| ContentError::not_found("Poll not found"))?;
            if !poll.is_active {
                return Err(ContentError::validation("Poll is not active"));
            }
            if poll.is_expired(now) {
                return Err(ContentError::validation("Poll has expired"));
            }
            let option = poll
                .options
                .iter_mut()
                .find(|option| option.id == option_id)
                .ok_or_else(|| ContentError::not_found("Option not found"))?;
            option.votes += 1;
            poll.total_votes += 1;
            poll.updated_at = now;
            Ok(poll.clone())
        })
    }

    // Popups

    /// Newest active popup whose optional window contains `now`.
    pub fn current_popup(&self, now: DateTime<Utc>) -> ContentResult<Option<Popup>> {
        let popups = self
            .popups
            .filter(|popup| popup.is_active && super::popup::in_window(popup, now))?;
        Ok(popups.into_iter().max_by_key(|popup| popup.created_at))
    }

    pub fn create_popup(&self, input: PopupInput, now: DateTime<Utc>) -> ContentResult<Popup> {
        check_window(input.start_date, input.end_date)?;
        let popup = Popup {
            id: new_document_id(),
            title: required(input.title, "Title")?,
            image: required(input.image, "Image")?,
            link: optional(input.link),
            is_active: input.is_active.unwrap_or(true),
            display_frequency: input.display_frequency.unwrap_or_default(),
            start_date: input.start_date,
            end_date: input.end_date,
            created_at: now,
            updated_at: now,
        };
        self.popups.write(|docs| {
            docs.insert(popup.id.clone(), popup.clone());
            Ok(())
        })?;
        Ok(popup)
    }

    pub fn update_popup(
        &self,
        id: &str,
        input: PopupInput,
        now: DateTime<Utc>,
    ) -> ContentResult<Popup> {
        let title = input.title.map(|t| required(Some(t), "Title")).transpose()?;
        let image = input.image.map(|i| required(Some(i), "Image")).transpose()?;
        self.popups.write(|docs| {
            let popup = docs
                .get_mut(id)
                .ok_or_else(|| ContentError::not_found("Popup not found"))?;
            let start_date = input.start_date.or(popup.start_date);
            let end_date = input.end_date.or(popup.end_date);
            check_window(start_date, end_date)?;

            if let Some(title) = title {
                popup.title = title;
            }
            if let Some(image) = image {
                popup.image = image;
            }
            if input.link.is_some() {
                popup.link = optional(input.link);
            }
            if let Some(is_active) = input.is_active {
                popup.is_active = is_active;
            }
            if let Some(frequency) = input.display_frequency {
                popup.display_frequency = frequency;
            }
            popup.start_date = start_date;
            popup.end_date = end_date;
            popup.updated_at = now;
            Ok(popup.clone())
        })
    }

    pub fn delete_popup(&self, id: &str) -> ContentResult<()> {
        self.popups.write(|docs| {
            docs.remove(id)
                .map(|_| ())
                .ok_or_else(|| ContentError::not_found("Popup not found"))
        })
    }

    // E-paper

    pub fn list_epapers(&self) -> ContentResult<Vec<EPaper>> {
        let mut editions = self.epapers.filter(|edition| edition.is_active)?;
        editions.sort_by(|a, b| b.date.cmp(&a.date));
        editions.truncate(EPAPER_LIMIT);
        Ok(editions)
    }

    pub fn create_epaper(&self, input: NewEPaper, now: DateTime<Utc>) -> ContentResult<EPaper> {
        let title = required(input.title, "Title")?;
        let pdf_url = required(input.pdf_url, "PDF URL")?;
        let pages = input.pages.unwrap_or(1);
        if pages == 0 {
            return Err(ContentError::validation("Pages must be at least 1"));
        }
        let edition = EPaper {
            id: new_document_id(),
            title,
            date: input.date.unwrap_or(now),
            pdf_url,
            thumbnail: optional(input.thumbnail),
            pages,
            is_active: input.is_active.unwrap_or(true),
            created_at: now,
        };
        self.epapers.write(|docs| {
            docs.insert(edition.id.clone(), edition.clone());
            Ok(())
        })?;
        Ok(edition)
    }

    pub fn delete_epaper(&self, id: &str) -> ContentResult<()> {
        self.epapers.write(|docs| {
            docs.remove(id)
                .map(|_| ())
                .ok_or_else(|| ContentError::not_found("E-Paper not found"))
        })
    }

    // Newsletter

    pub fn subscribe(&self, email: &str, now: DateTime<Utc>) -> ContentResult<Subscriber> {
        let email = email.trim().to_lowercase();
        if email.is_empty() || !email.contains('@') {
            return Err(ContentError::validation("Valid email required"));
        }
        self.subscribers.write(|docs| {
            if docs.values().any(|existing| existing.email == email) {
                return Err(ContentError::duplicate("This email is already subscribed"));
            }
            let subscriber = Subscriber {
                id: new_document_id(),
                email,
                is_verified: false,
                subscribed_at: now,
            };
            docs.insert(subscriber.id.clone(), subscriber.clone());
            Ok(subscriber)
        })
    }

    pub fn list_subscribers(&self) -> ContentResult<Vec<Subscriber>> {
        let mut subscribers = self.subscribers.all()?;
        subscribers.sort_by(|a, b| b.subscribed_at.cmp(&a.subscribed_at));
        Ok(subscribers)
    }
}

/// Category and tag share naming, slug and uniqueness rules.
pub trait Named: Document {
    const KIND: &'static str;

    fn build(name: String, slug: String, description: Option<String>, now: DateTime<Utc>)
    -> Self;
    fn name(&self) -> &str;
    fn slug(&self) -> &str;
    fn rename(&mut self, name: String, slug: String);
    fn set_description(&mut self, _description: Option<String>) {}
    fn stamp(&mut self, now: DateTime<Utc>);
}

impl Named for Category {
    const KIND: &'static str = "Category";

    fn build(
        name: String,
        slug: String,
        description: Option<String>,
        now: DateTime<Utc>,
    ) -> Self {
        Category {
            id: new_document_id(),
            name,
            slug,
            description,
            created_at: now,
            updated_at: now,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn rename(&mut self, name: String, slug: String) {
        self.name = name;
        self.slug = slug;
    }

    fn set_description(&mut self, description: Option<String>) {
        self.description = description;
    }

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

impl Named for Tag {
    const KIND: &'static str = "Tag";

    fn build(name: String, slug: String, _description: Option<String>, now: DateTime<Utc>) -> Self {
        Tag {
            id: new_document_id(),
            name,
            slug,
            created_at: now,
            updated_at: now,
        }
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn slug(&self) -> &str {
        &self.slug
    }

    fn rename(&mut self, name: String, slug: String) {
        self.name = name;
        self.slug = slug;
    }

    fn stamp(&mut self, now: DateTime<Utc>) {
        self.updated_at = now;
    }
}

fn named_slug<T: Named>(name: &str) -> ContentResult<String> {
    let slug = slugify(name);
    if slug.is_empty() {
        return Err(ContentError::validation(format!(
            "{} name must contain letters or digits",
            T::KIND
        )));
    }
    Ok(slug)
}

fn collides<T: Named>(existing: &T, name: &str, slug: &str) -> bool {
    existing.slug() == slug || existing.name().eq_ignore_ascii_case(name)
}

fn create_named<T: Named>(
    collection: &Collection<T>,
    input: NameInput,
    now: DateTime<Utc>,
) -> ContentResult<T> {
    let name = required(input.name, "Name")?;
    let slug = named_slug::<T>(&name)?;
    collection.write(|docs| {
        if docs.values().any(|existing| collides(existing, &name, &slug)) {
            return Err(ContentError::duplicate(format!("{} already exists", T::KIND)));
        }
        let doc = T::build(name, slug, optional(input.description), now);
        docs.insert(doc.id().to_string(), doc.clone());
        Ok(doc)
    })
}

fn update_named<T: Named>(
    collection: &Collection<T>,
    id: &str,
    input: NameInput,
    now: DateTime<Utc>,
) -> ContentResult<T> {
    let renamed = match input.name {
        Some(name) => {
            let name = required(Some(name), "Name")?;
            let slug = named_slug::<T>(&name)?;
            Some((name, slug))
        }
        None => None,
    };
    collection.write(|docs| {
        if let Some((name, slug)) = &renamed
            && docs
                .values()
                .any(|other| other.id() != id && collides(other, name, slug))
        {
            return Err(ContentError::duplicate(format!("{} already exists", T::KIND)));
        }
        let doc = docs
            .get_mut(id)
            .ok_or_else(|| ContentError::not_found(format!("{} not found", T::KIND)))?;
        if let Some((name, slug)) = renamed {
            doc.rename(name, slug);
        }
        if input.description.is_some() {
            doc.set_description(optional(input.description));
        }
        doc.stamp(now);
        Ok(doc.clone())
    })
}

fn delete_named<T: Named>(collection: &Collection<T>, id: &str) -> ContentResult<()> {
    collection.write(|docs| {
        docs.remove(id)
            .map(|_| ())
            .ok_or_else(|| ContentError::not_found(format!("{} not found", T::KIND)))
    })
}

fn list_by_name<T: Named>(collection: &Collection<T>) -> ContentResult<Vec<T>> {
    let mut docs = collection.all()?;
    docs.sort_by(|a, b| a.name().to_lowercase().cmp(&b.name().to_lowercase()));
    Ok(docs)
}

fn newest_first(articles: &mut [Article]) {
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
}

fn clamp_limit(limit: usize) -> usize {
    match limit {
        0 => DEFAULT_ARTICLE_LIMIT,
        n => n.min(MAX_ARTICLE_LIMIT),
    }
}

fn check_window(start: Option<DateTime<Utc>>, end: Option<DateTime<Utc>>) -> ContentResult<()> {
    if let (Some(start), Some(end)) = (start, end)
        && end < start
    {
        return Err(ContentError::validation("End date must not precede start date"));
    }
    Ok(())
}
