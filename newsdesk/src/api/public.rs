// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Reader-facing extras: search, RSS, breaking news, e-paper, newsletter and
//! visitor statistics.

use actix_web::{HttpRequest, HttpResponse, http::header, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use super::error::ApiResult;
use super::{IdQuery, audience, require, success};
use crate::app_state::AppState;
use crate::content::References;
use crate::content::feed::render_rss;
use crate::content::model::NewEPaper;
use crate::content::search::search_articles;
use crate::gate::{Operation, Resource};

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    q: String,
}

pub async fn search(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<SearchQuery>,
) -> ApiResult<HttpResponse> {
    let articles = search_articles(&state.store, &query.q)?;
    let references = References::load(&state.store)?;
    Ok(HttpResponse::Ok().json(references.view_all(articles, audience(&req))))
}

pub async fn rss(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let document = render_rss(&state.store, &state.site, Utc::now())?;
    Ok(HttpResponse::Ok()
        .content_type("application/rss+xml; charset=utf-8")
        .insert_header((header::CACHE_CONTROL, "public, max-age=600"))
        .body(document))
}

pub async fn breaking_news(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.breaking_news()?))
}

pub async fn list_epapers(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.list_epapers()?))
}

pub async fn create_epaper(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NewEPaper>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::EPaper, Operation::Create)?;
    let edition = state.store.create_epaper(body.into_inner(), Utc::now())?;
    Ok(HttpResponse::Created().json(edition))
}

pub async fn delete_epaper(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<IdQuery>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::EPaper, Operation::Delete)?;
    let id = query.required("E-Paper ID required")?;
    state.store.delete_epaper(id)?;
    Ok(success())
}

#[derive(Debug, Deserialize)]
pub struct SubscribeRequest {
    #[serde(default)]
    email: String,
}

#[derive(Serialize)]
struct Subscribed {
    message: &'static str,
    id: String,
}

pub async fn subscribe(
    state: web::Data<AppState>,
    body: web::Json<SubscribeRequest>,
) -> ApiResult<HttpResponse> {
    let subscriber = state.store.subscribe(&body.email, Utc::now())?;
    log::info!("Newsletter subscription added");
    Ok(HttpResponse::Created().json(Subscribed {
        message: "Successfully subscribed!",
        id: subscriber.id,
    }))
}

pub async fn list_subscribers(
    req: HttpRequest,
    state: web::Data<AppState>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Subscriber, Operation::List)?;
    Ok(HttpResponse::Ok().json(state.store.list_subscribers()?))
}

pub async fn visitor_stats(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let stats = state.visitors.stats(&state.store, Utc::now())?;
    Ok(HttpResponse::Ok().json(stats))
}

pub async fn record_visit(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    state.visitors.record_visit(&state.store, Utc::now())?;
    Ok(success())
}
