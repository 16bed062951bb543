// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Polls and the site popup.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::{IdQuery, require, success};
use crate::app_state::AppState;
use crate::content::model::{NewPoll, PopupInput};
use crate::content::popup::should_display;
use crate::gate::{Operation, Resource};

pub async fn active_poll(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    // `null` when no poll is running.
    Ok(HttpResponse::Ok().json(state.store.active_poll(Utc::now())?))
}

pub async fn create_poll(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<NewPoll>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Poll, Operation::Create)?;
    let poll = state.store.create_poll(body.into_inner(), Utc::now())?;
    Ok(HttpResponse::Created().json(poll))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VoteRequest {
    #[serde(default)]
    poll_id: String,
    #[serde(default)]
    option_id: String,
}

pub async fn vote(
    state: web::Data<AppState>,
    body: web::Json<VoteRequest>,
) -> ApiResult<HttpResponse> {
    let poll = state
        .store
        .vote(&body.poll_id, &body.option_id, Utc::now())?;
    Ok(HttpResponse::Ok().json(poll))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PopupQuery {
    last_shown: Option<DateTime<Utc>>,
}

pub async fn current_popup(
    state: web::Data<AppState>,
    query: web::Query<PopupQuery>,
) -> ApiResult<HttpResponse> {
    let now = Utc::now();
    let popup = state
        .store
        .current_popup(now)?
        .filter(|popup| should_display(popup.display_frequency, query.last_shown, now));
    Ok(HttpResponse::Ok().json(popup))
}

pub async fn create_popup(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<PopupInput>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Popup, Operation::Create)?;
    let popup = state.store.create_popup(body.into_inner(), Utc::now())?;
    Ok(HttpResponse::Created().json(popup))
}

/// `PUT` body: the popup fields plus its id, as `id` or `_id`.
#[derive(Debug, Deserialize)]
pub struct PopupUpdate {
    #[serde(alias = "_id")]
    id: Option<String>,
    #[serde(flatten)]
    fields: PopupInput,
}

pub async fn update_popup(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: web::Json<PopupUpdate>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Popup, Operation::Update)?;
    let PopupUpdate { id, fields } = body.into_inner();
    let id = id
        .filter(|id| !id.trim().is_empty())
        .ok_or_else(|| ApiError::bad_request("Popup ID required"))?;
    let popup = state.store.update_popup(&id, fields, Utc::now())?;
    Ok(HttpResponse::Ok().json(popup))
}

pub async fn delete_popup(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<IdQuery>,
) -> ApiResult<HttpResponse> {
    require(&req, Resource::Popup, Operation::Delete)?;
    let id = query.required("Popup ID required")?;
    state.store.delete_popup(id)?;
    Ok(success())
}
