// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::{audience, caller, deleted, is_staff};
use crate::app_state::AppState;
use crate::content::{ArticleQuery, References};
use crate::content::model::{ArticlePatch, ArticleStatus, NewArticle};
use crate::content::store::DEFAULT_ARTICLE_LIMIT;

#[derive(Debug, Deserialize)]
pub struct ListQuery {
    category: Option<String>,
    tag: Option<String>,
    status: Option<ArticleStatus>,
    limit: Option<usize>,
}

pub async fn list(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<ListQuery>,
) -> ApiResult<HttpResponse> {
    let query = query.into_inner();
    // Anonymous readers only ever see published articles.
    let status = if is_staff(&req) {
        query.status
    } else {
        Some(ArticleStatus::Published)
    };
    let articles = state.store.list_articles(&ArticleQuery {
        category: query.category.filter(|value| !value.is_empty()),
        tag: query.tag.filter(|value| !value.is_empty()),
        status,
        limit: query.limit.unwrap_or(DEFAULT_ARTICLE_LIMIT),
    })?;
    let references = References::load(&state.store)?;
    Ok(HttpResponse::Ok().json(references.view_all(articles, audience(&req))))
}

pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NewArticle>,
) -> ApiResult<HttpResponse> {
    let actor = caller(&req)?;
    let article = state
        .lifecycle
        .create(&state.store, body.into_inner(), &actor, Utc::now())?;
    Ok(HttpResponse::Created().json(article))
}

pub async fn get(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let article = state.store.get_article(&path)?;
    if !article.is_published() && !is_staff(&req) {
        return Err(ApiError::NotFound("Article not found".to_string()));
    }
    let references = References::load(&state.store)?;
    Ok(HttpResponse::Ok().json(references.view(article, audience(&req))))
}

pub async fn get_by_slug(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let article = state.store.view_published_article(&path)?;
    let references = References::load(&state.store)?;
    Ok(HttpResponse::Ok().json(references.view(article, audience(&req))))
}

pub async fn update(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<ArticlePatch>,
) -> ApiResult<HttpResponse> {
    let actor = caller(&req)?;
    let article =
        state
            .lifecycle
            .update(&state.store, &path, body.into_inner(), &actor, Utc::now())?;
    Ok(HttpResponse::Ok().json(article))
}

pub async fn delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    let actor = caller(&req)?;
    state.lifecycle.delete(&state.store, &path, &actor)?;
    Ok(deleted("Article deleted"))
}
