// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use super::error::ApiResult;
use super::{deleted, require};
use crate::app_state::AppState;
use crate::content::model::AuthorInput;
use crate::gate::{Operation, Resource};

pub async fn list(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.list_authors()?))
}

pub async fn create(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<AuthorInput>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Author, Operation::Create)?;
    let author = state.store.create_author(body.into_inner(), Utc::now())?;
    Ok(HttpResponse::Created().json(author))
}

pub async fn update(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<AuthorInput>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Author, Operation::Update)?;
    let author = state
        .store
        .update_author(&path, body.into_inner(), Utc::now())?;
    Ok(HttpResponse::Ok().json(author))
}

pub async fn delete(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Author, Operation::Delete)?;
    state.store.delete_author(&path)?;
    Ok(deleted("Author deleted"))
}
