// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::error::ContentResult;
use super::model::Article;
use super::store::ContentStore;
use super::view::References;
use crate::config::SiteConfig;
use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use std::fmt::Write;

pub const FEED_LIMIT: usize = 50;
pub const DESCRIPTION_CHARS: usize = 300;

static TAG_REGEX: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| Regex::new(r"<[^>]*>"));

/// Removes markup tags, leaving text content as-is.
pub fn strip_html(html: &str) -> String {
    match TAG_REGEX.as_ref() {
        Ok(regex) => regex.replace_all(html, "").into_owned(),
        Err(err) => {
            log::error!("Tag regex failed to compile: {}", err);
            html.to_string()
        }
    }
}

fn truncate_chars(text: &str, max: usize) -> &str {
    match text.char_indices().nth(max) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

fn escape_xml(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '\"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&apos;"),
            _ => escaped.push(ch),
        }
    }
    escaped
}

/// Wraps `text` in a CDATA section, splitting any embedded terminator.
fn cdata(text: &str) -> String {
    format!("<![CDATA[{}]]>", text.replace("]]>", "]]]]><![CDATA[>"))
}

/// RSS 2.0 document with the most recent published articles.
pub fn render_rss(store: &ContentStore, site: &SiteConfig, now: DateTime<Utc>) -> ContentResult<String> {
    let mut articles = store.articles.filter(Article::is_published)?;
    articles.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    articles.truncate(FEED_LIMIT);

    let references = References::load(store)?;

    let base_url = site.base_url.as_str();
    let mut xml = String::new();
    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<rss version=\"2.0\"\n");
    xml.push_str("     xmlns:content=\"http://purl.org/rss/1.0/modules/content/\"\n");
    xml.push_str("     xmlns:dc=\"http://purl.org/dc/elements/1.1/\"\n");
    xml.push_str("     xmlns:atom=\"http://www.w3.org/2005/Atom\"\n");
    xml.push_str("     xmlns:media=\"http://search.yahoo.com/mrss/\">\n");
    xml.push_str("  <channel>\n");
    let _ = writeln!(xml, "    <title>{}</title>", escape_xml(&site.name));
    let _ = writeln!(xml, "    <link>{}</link>", escape_xml(base_url));
    let _ = writeln!(
        xml,
        "    <description>{}</description>",
        escape_xml(&site.description)
    );
    xml.push_str("    <language>en-us</language>\n");
    let _ = writeln!(xml, "    <lastBuildDate>{}</lastBuildDate>", now.to_rfc2822());
    let _ = writeln!(
        xml,
        "    <atom:link href=\"{}/rss\" rel=\"self\" type=\"application/rss+xml\"/>",
        escape_xml(base_url)
    );

    for article in &articles {
        let link = escape_xml(&format!("{}/news/{}", base_url, article.slug));
        let text = strip_html(&article.content);
        let creator = references
            .author(&article.author)
            .map(|author| author.name.as_str())
            .unwrap_or(site.name.as_str());
        let category = references
            .category(&article.category)
            .map(|category| category.name.as_str())
            .unwrap_or("News");
        let pub_date = article.published_at.unwrap_or(article.created_at);

        xml.push_str("    <item>\n");
        let _ = writeln!(xml, "      <title>{}</title>", cdata(&article.title));
        let _ = writeln!(xml, "      <link>{}</link>", link);
        let _ = writeln!(xml, "      <guid isPermaLink=\"true\">{}</guid>", link);
        let _ = writeln!(
            xml,
            "      <description>{}</description>",
            cdata(&format!("{}...", truncate_chars(&text, DESCRIPTION_CHARS)))
        );
        let _ = writeln!(
            xml,
            "      <content:encoded>{}</content:encoded>",
            cdata(&article.content)
        );
        let _ = writeln!(xml, "      <pubDate>{}</pubDate>", pub_date.to_rfc2822());
        let _ = writeln!(xml, "      <dc:creator>{}</dc:creator>", escape_xml(creator));
        let _ = writeln!(xml, "      <category>{}</category>", escape_xml(category));
        if let Some(image) = article.lead_image() {
            let _ = writeln!(
                xml,
                "      <media:content url=\"{}\" medium=\"image\"/>",
                escape_xml(image)
            );
        }
        xml.push_str("    </item>\n");
    }

    xml.push_str("  </channel>\n");
    xml.push_str("</rss>\n");
    Ok(xml)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::content::model::{ArticleStatus, AuthorInput, NameInput};

    fn site() -> SiteConfig {
        SiteConfig {
            name: "Daily Ledger".to_string(),
            description: "News & views".to_string(),
            base_url: "https://news.example.com".to_string(),
        }
    }

    fn article(id: &str, status: ArticleStatus, content: &str) -> Article {
        let now = Utc::now();
        Article {
            id: id.to_string(),
            title: format!("Title {}", id),
            slug: format!("title-{}-7", id),
            content: content.to_string(),
            excerpt: None,
            category: "missing".to_string(),
            author: "missing".to_string(),
            tags: Vec::new(),
            status,
            published_at: Some(now),
            featured_image: None,
            images: vec!["/img/lead.jpg".to_string()],
            view_count: 0,
            share_count: 0,
            is_breaking: false,
            is_live: false,
            created_by: None,
            created_at: now,
            updated_at: now,
        }
    }

    fn insert(store: &ContentStore, article: Article) {
        store
            .articles
            .write(|docs| {
                docs.insert(article.id.clone(), article);
                Ok(())
            })
            .expect("insert");
    }

    #[test]
    fn strip_html_removes_tags() {
        assert_eq!(strip_html("<p>Hello <b>world</b></p>"), "Hello world");
    }

    #[test]
    fn truncation_respects_char_boundaries() {
        assert_eq!(truncate_chars("héllo", 2), "hé");
        assert_eq!(truncate_chars("hi", 10), "hi");
    }

    #[test]
    fn cdata_splits_terminators() {
        assert_eq!(cdata("a]]>b"), "<![CDATA[a]]]]><![CDATA[>b]]>");
    }

    #[test]
    fn feed_lists_published_items_with_fallback_names() {
        let store = ContentStore::in_memory();
        insert(&store, article("pub", ArticleStatus::Published, "<p>Body text</p>"));
        insert(&store, article("draft", ArticleStatus::Draft, "<p>Hidden</p>"));

        let xml = render_rss(&store, &site(), Utc::now()).expect("render");
        assert!(xml.starts_with("<?xml version=\"1.0\" encoding=\"UTF-8\"?>"));
        assert!(xml.contains("<title>Daily Ledger</title>"));
        assert!(xml.contains("<description>News &amp; views</description>"));
        assert!(xml.contains("<link>https://news.example.com/news/title-pub-7</link>"));
        assert!(xml.contains("<description><![CDATA[Body text...]]></description>"));
        assert!(xml.contains("<dc:creator>Daily Ledger</dc:creator>"));
        assert!(xml.contains("<category>News</category>"));
        assert!(xml.contains("<media:content url=\"/img/lead.jpg\" medium=\"image\"/>"));
        assert!(!xml.contains("title-draft-7"));
    }

    #[test]
    fn feed_uses_author_and_category_names() {
        let store = ContentStore::in_memory();
        let now = Utc::now();
        let category = store
            .create_category(
                NameInput {
                    name: Some("Markets".to_string()),
                    description: None,
                },
                now,
            )
            .expect("category");
        let author = store
            .create_author(
                AuthorInput {
                    name: Some("Sam Writer".to_string()),
                    ..Default::default()
                },
                now,
            )
            .expect("author");
        let mut item = article("named", ArticleStatus::Published, "x".repeat(400).as_str());
        item.category = category.id;
        item.author = author.id;
        insert(&store, item);

        let xml = render_rss(&store, &site(), now).expect("render");
        assert!(xml.contains("<dc:creator>Sam Writer</dc:creator>"));
        assert!(xml.contains("<category>Markets</category>"));
        assert!(xml.contains(&format!("<![CDATA[{}...]]>", "x".repeat(300))));
    }
}
