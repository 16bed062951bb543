// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Categories and tags.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;

use super::error::ApiResult;
use super::{deleted, require};
use crate::app_state::AppState;
use crate::content::model::NameInput;
use crate::gate::{Operation, Resource};

pub async fn list_categories(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.list_categories()?))
}

pub async fn get_category(
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.get_category(&path)?))
}

pub async fn create_category(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NameInput>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Category, Operation::Create)?;
    let category = state.store.create_category(body.into_inner(), Utc::now())?;
    log::info!("Category '{}' created", category.slug);
    Ok(HttpResponse::Created().json(category))
}

pub async fn update_category(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NameInput>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Category, Operation::Update)?;
    let category = state
        .store
        .update_category(&path, body.into_inner(), Utc::now())?;
    Ok(HttpResponse::Ok().json(category))
}

pub async fn delete_category(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Category, Operation::Delete)?;
    state.store.delete_category(&path)?;
    Ok(deleted("Category deleted"))
}

pub async fn list_tags(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    Ok(HttpResponse::Ok().json(state.store.list_tags()?))
}

pub async fn create_tag(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NameInput>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Tag, Operation::Create)?;
    let tag = state.store.create_tag(body.into_inner(), Utc::now())?;
    Ok(HttpResponse::Created().json(tag))
}

pub async fn update_tag(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
    body: web::Json<NameInput>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Tag, Operation::Update)?;
    let tag = state.store.update_tag(&path, body.into_inner(), Utc::now())?;
    Ok(HttpResponse::Ok().json(tag))
}

pub async fn delete_tag(
    req: HttpRequest,
    state: web::Data<AppState>,
    path: web::Path<String>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Tag, Operation::Delete)?;
    state.store.delete_tag(&path)?;
    Ok(deleted("Tag deleted"))
}
