// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

mod common;

use actix_web::{http::StatusCode, test};
use serde_json::{Value, json};

#[actix_web::test]
async fn anonymous_listing_only_shows_published_articles() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    harness.article(&seed, "Budget passes", "published", false);
    harness.article(&seed, "Leak under embargo", "draft", false);
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = test::TestRequest::get()
        .uri("/api/articles?status=draft")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let json = common::read_json(resp).await;
    let titles: Vec<&str> = json
        .as_array()
        .expect("array")
        .iter()
        .filter_map(|article| article["title"].as_str())
        .collect();
    assert_eq!(titles, vec!["Budget passes"]);
}

#[actix_web::test]
async fn staff_listing_honours_status_and_filters() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    harness.article(&seed, "Budget passes", "published", false);
    harness.article(&seed, "Leak under embargo", "draft", false);
    let app = test::init_service(common::build_test_app(&harness)).await;
    let session = harness.editor_auth();

    let req = common::with_session(
        test::TestRequest::get().uri("/api/articles?status=draft"),
        &session,
    )
    .to_request();
    let json = common::read_json(test::call_service(&app, req).await).await;
    assert_eq!(json.as_array().map(Vec::len), Some(1));
    assert_eq!(json[0]["status"], "draft");

    let req = common::with_session(
        test::TestRequest::get().uri("/api/articles?category=politics&limit=1"),
        &session,
    )
    .to_request();
    let json = common::read_json(test::call_service(&app, req).await).await;
    assert_eq!(json.as_array().map(Vec::len), Some(1));

    let req = common::with_session(
        test::TestRequest::get().uri("/api/articles?category=sport"),
        &session,
    )
    .to_request();
    let json = common::read_json(test::call_service(&app, req).await).await;
    assert_eq!(json, json!([]));
}

#[actix_web::test]
async fn unknown_status_filter_is_a_bad_request() {
    let harness = common::TestHarness::new().await;
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = test::TestRequest::get()
        .uri("/api/articles?status=live")
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = common::read_json(resp).await;
    assert!(json["error"].is_string());
}

#[actix_web::test]
async fn create_requires_a_staff_session() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    let app = test::init_service(common::build_test_app(&harness)).await;
    let payload = json!({
        "title": "Storm warning",
        "content": "<p>Wind</p>",
        "category": seed.category,
        "author": seed.author,
    });

    let req = test::TestRequest::post()
        .uri("/api/articles")
        .set_json(&payload)
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(common::read_json(resp).await, json!({"error": "Unauthorized"}));

    let req = common::with_session(
        test::TestRequest::post()
            .uri("/api/articles")
            .set_json(&payload),
        &harness.reader_auth(),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[actix_web::test]
async fn editor_creates_a_draft_with_a_suffixed_slug() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = common::with_session(
        test::TestRequest::post().uri("/api/articles").set_json(json!({
            "title": "Storm warning",
            "content": "<p>Wind</p>",
            "category": seed.category,
            "author": seed.author,
            "tags": [seed.tag],
        })),
        &harness.editor_auth(),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::CREATED);
    let json = common::read_json(resp).await;
    assert_eq!(json["status"], "draft");
    assert!(json["publishedAt"].is_null());
    assert!(
        json["slug"]
            .as_str()
            .is_some_and(|slug| slug.starts_with("storm-warning-"))
    );
    assert_eq!(json["createdBy"], common::EDITOR_EMAIL);
}

#[actix_web::test]
async fn create_validates_required_fields_and_references() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    let app = test::init_service(common::build_test_app(&harness)).await;
    let session = harness.admin_auth();

    let req = common::with_session(
        test::TestRequest::post()
            .uri("/api/articles")
            .set_json(json!({"title": "No body"})),
        &session,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

    let req = common::with_session(
        test::TestRequest::post().uri("/api/articles").set_json(json!({
            "title": "Orphan",
            "content": "<p>x</p>",
            "category": "missing",
            "author": seed.author,
        })),
        &session,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    let json = common::read_json(resp).await;
    assert!(
        json["error"]
            .as_str()
            .is_some_and(|message| message.contains("category"))
    );
}

#[actix_web::test]
async fn publishing_stamps_published_at_once_and_keeps_the_slug() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    let draft = harness.article(&seed, "Harbour reopens", "draft", false);
    let app = test::init_service(common::build_test_app(&harness)).await;
    let session = harness.editor_auth();

    let req = common::with_session(
        test::TestRequest::patch()
            .uri(&format!("/api/articles/{}", draft.id))
            .set_json(json!({"status": "published", "title": "Harbour finally reopens"})),
        &session,
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    let published = common::read_json(resp).await;
    assert_eq!(published["status"], "published");
    assert_eq!(published["slug"], draft.slug.as_str());
    let first_stamp = published["publishedAt"].clone();
    assert!(first_stamp.is_string());

    for status in ["archived", "published"] {
        let req = common::with_session(
            test::TestRequest::patch()
                .uri(&format!("/api/articles/{}", draft.id))
                .set_json(json!({ "status": status })),
            &session,
        )
        .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let json = common::read_json(resp).await;
        assert_eq!(json["publishedAt"], first_stamp);
    }
}

#[actix_web::test]
async fn unpublished_article_is_hidden_from_readers() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    let draft = harness.article(&seed, "Quiet draft", "draft", false);
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = test::TestRequest::get()
        .uri(&format!("/api/articles/{}", draft.id))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);

    let req = common::with_session(
        test::TestRequest::get().uri(&format!("/api/articles/{}", draft.id)),
        &harness.editor_auth(),
    )
    .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);

    let req = test::TestRequest::get()
        .uri(&format!("/api/articles/slug/{}", draft.slug))
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::NOT_FOUND);
    assert_eq!(
        common::read_json(resp).await,
        json!({"error": "Article not found"})
    );
}

#[actix_web::test]
async fn reading_by_slug_counts_views() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    let article = harness.article(&seed, "Match report", "published", false);
    let app = test::init_service(common::build_test_app(&harness)).await;

    let mut last: Value = Value::Null;
    for _ in 0..2 {
        let req = test::TestRequest::get()
            .uri(&format!("/api/articles/slug/{}", article.slug))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        last = common::read_json(resp).await;
    }
    assert_eq!(last["viewCount"], 2);
}

#[actix_web::test]
async fn only_admins_delete_articles() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    let article = harness.article(&seed, "Short lived", "published", false);
    let app = test::init_service(common::build_test_app(&harness)).await;
    let uri = format!("/api/articles/{}", article.id);

    let req = common::with_session(
        test::TestRequest::delete().uri(&uri),
        &harness.editor_auth(),
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );

    let req = common::with_session(test::TestRequest::delete().uri(&uri), &harness.admin_auth())
        .to_request();
    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), StatusCode::OK);
    assert_eq!(
        common::read_json(resp).await,
        json!({"message": "Article deleted"})
    );

    let req = common::with_session(test::TestRequest::delete().uri(&uri), &harness.admin_auth())
        .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::NOT_FOUND
    );
}

#[actix_web::test]
async fn editors_may_only_touch_their_own_articles_when_ownership_is_on() {
    let mut config = newsdesk::config::test_config();
    config.lifecycle.editors_own_articles = true;
    let harness = common::TestHarness::with_config(config).await;
    let seed = harness.seed();
    let admins_article = harness.article(&seed, "Admin piece", "draft", false);
    let app = test::init_service(common::build_test_app(&harness)).await;

    let req = common::with_session(
        test::TestRequest::patch()
            .uri(&format!("/api/articles/{}", admins_article.id))
            .set_json(json!({"title": "Hijacked"})),
        &harness.editor_auth(),
    )
    .to_request();
    assert_eq!(
        test::call_service(&app, req).await.status(),
        StatusCode::UNAUTHORIZED
    );
}

#[actix_web::test]
async fn reader_responses_embed_references_without_the_owner() {
    let harness = common::TestHarness::new().await;
    let seed = harness.seed();
    let article = harness.article(&seed, "Budget passes", "published", false);
    let app = test::init_service(common::build_test_app(&harness)).await;

    for uri in [
        "/api/articles".to_string(),
        format!("/api/articles/{}", article.id),
        format!("/api/articles/slug/{}", article.slug),
        "/api/search?q=budget".to_string(),
    ] {
        let req = test::TestRequest::get().uri(&uri).to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK, "{}", uri);
        let json = common::read_json(resp).await;
        let body = json.as_array().map(|items| items[0].clone()).unwrap_or(json);

        assert!(body.get("createdBy").is_none(), "{} leaks the owner", uri);
        assert_eq!(
            body["category"],
            json!({"id": seed.category, "name": "Politics", "slug": "politics"}),
            "{}",
            uri
        );
        assert_eq!(body["author"]["id"], seed.author.as_str());
        assert_eq!(body["author"]["name"], "Jane Reporter");
        assert_eq!(body["tags"][0]["name"], "Elections");
        assert_eq!(body["tags"][0]["slug"], "elections");
    }

    let req = common::with_session(
        test::TestRequest::get().uri(&format!("/api/articles/{}", article.id)),
        &harness.editor_auth(),
    )
    .to_request();
    let json = common::read_json(test::call_service(&app, req).await).await;
    assert_eq!(json["createdBy"], common::ADMIN_EMAIL);
    assert_eq!(json["category"]["name"], "Politics");
}
