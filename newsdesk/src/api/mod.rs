// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use crate::content::Audience;
use crate::gate::{Operation, Resource, authorize};
use crate::iam::{Principal, SessionRequest};
use crate::roles::Role;

mod articles;
mod auth;
mod authors;
mod engagement;
pub mod error;
mod public;
mod taxonomy;

pub use error::{ApiError, ApiResult};

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/rss", web::get().to(public::rss)).service(
        web::scope("/api")
            .app_data(error::json_config())
            .app_data(error::query_config())
            .service(
                web::resource("/articles")
                    .route(web::get().to(articles::list))
                    .route(web::post().to(articles::create)),
            )
            .route("/articles/slug/{slug}", web::get().to(articles::get_by_slug))
            .service(
                web::resource("/articles/{id}")
                    .route(web::get().to(articles::get))
                    .route(web::patch().to(articles::update))
                    .route(web::delete().to(articles::delete)),
            )
            .service(
                web::resource("/categories")
                    .route(web::get().to(taxonomy::list_categories))
                    .route(web::post().to(taxonomy::create_category)),
            )
            .service(
                web::resource("/categories/{id}")
                    .route(web::get().to(taxonomy::get_category))
                    .route(web::patch().to(taxonomy::update_category))
                    .route(web::delete().to(taxonomy::delete_category)),
            )
            .service(
                web::resource("/tags")
                    .route(web::get().to(taxonomy::list_tags))
                    .route(web::post().to(taxonomy::create_tag)),
            )
            .service(
                web::resource("/tags/{id}")
                    .route(web::patch().to(taxonomy::update_tag))
                    .route(web::delete().to(taxonomy::delete_tag)),
            )
            .service(
                web::resource("/authors")
                    .route(web::get().to(authors::list))
                    .route(web::post().to(authors::create)),
            )
            .service(
                web::resource("/authors/{id}")
                    .route(web::patch().to(authors::update))
                    .route(web::delete().to(authors::delete)),
            )
            .route("/search", web::get().to(public::search))
            .service(
                web::resource("/polls")
                    .route(web::get().to(engagement::active_poll))
                    .route(web::post().to(engagement::create_poll)),
            )
            .route("/polls/vote", web::post().to(engagement::vote))
            .service(
                web::resource("/popup")
                    .route(web::get().to(engagement::current_popup))
                    .route(web::post().to(engagement::create_popup))
                    .route(web::put().to(engagement::update_popup))
                    .route(web::delete().to(engagement::delete_popup)),
            )
            .service(
                web::resource("/e-paper")
                    .route(web::get().to(public::list_epapers))
                    .route(web::post().to(public::create_epaper))
                    .route(web::delete().to(public::delete_epaper)),
            )
            .service(
                web::resource("/newsletter")
                    .route(web::get().to(public::list_subscribers))
                    .route(web::post().to(public::subscribe)),
            )
            .service(
                web::resource("/visitor-stats")
                    .route(web::get().to(public::visitor_stats))
                    .route(web::post().to(public::record_visit)),
            )
            .route("/breaking-news", web::get().to(public::breaking_news))
            .route("/auth/login", web::post().to(auth::login))
            .route("/auth/logout", web::post().to(auth::logout))
            .route("/auth/session", web::get().to(auth::session)),
    );
}

/// The authenticated caller, or 401.
fn caller(req: &HttpRequest) -> ApiResult<Principal> {
    req.principal().ok_or_else(ApiError::unauthorized)
}

fn is_staff(req: &HttpRequest) -> bool {
    req.principal().and_then(|principal| principal.role()).is_some()
}

/// Who an article read is rendered for.
fn audience(req: &HttpRequest) -> Audience {
    if is_staff(req) {
        Audience::Staff
    } else {
        Audience::Public
    }
}

fn require(req: &HttpRequest, resource: Resource, operation: Operation) -> ApiResult<Role> {
    Ok(authorize(req.principal().as_ref(), resource, operation)?)
}

fn deleted(message: &'static str) -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "message": message }))
}

fn success() -> HttpResponse {
    HttpResponse::Ok().json(serde_json::json!({ "success": true }))
}

/// `?id=` for endpoints that address a document through the query string.
#[derive(Debug, Deserialize)]
pub(crate) struct IdQuery {
    id: Option<String>,
}

impl IdQuery {
    fn required(&self, message: &str) -> ApiResult<&str> {
        self.id
            .as_deref()
            .map(str::trim)
            .filter(|id| !id.is_empty())
            .ok_or_else(|| ApiError::bad_request(message))
    }
}
