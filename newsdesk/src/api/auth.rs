// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::{HttpRequest, HttpResponse, web};
use serde::Deserialize;

use super::error::{ApiError, ApiResult};
use super::success;
use crate::iam::{SessionRequest, UserServices};

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    email: String,
    #[serde(default)]
    password: String,
}

pub async fn login(
    user_services: web::Data<UserServices>,
    body: web::Json<LoginRequest>,
) -> ApiResult<HttpResponse> {
    let email = body.email.trim();
    if email.is_empty() || body.password.is_empty() {
        return Err(ApiError::bad_request("Email and password required"));
    }

    let Some(user) = user_services.authenticate(email, &body.password)? else {
        log::warn!("Failed login attempt for {}", email);
        return Err(ApiError::Unauthorized("Invalid credentials".to_string()));
    };

    let token = user_services.issue_token(&user)?;
    let cookie = user_services.jwt_service().create_auth_cookie(&token);
    log::info!("User {} logged in as {}", user.email, user.role);
    Ok(HttpResponse::Ok().cookie(cookie).json(user.principal()))
}

pub async fn logout(user_services: web::Data<UserServices>) -> HttpResponse {
    let mut response = success();
    if let Err(err) = response.add_cookie(&user_services.jwt_service().create_logout_cookie()) {
        log::error!("Failed to clear session cookie: {}", err);
    }
    response
}

pub async fn session(req: HttpRequest) -> ApiResult<HttpResponse> {
    let principal = req.principal().ok_or_else(ApiError::unauthorized)?;
    Ok(HttpResponse::Ok().json(principal))
}
