// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! The admin surface. Everything under the admin prefix sits behind the
//! access gate; the login page is the only anonymous route.

use actix_web::{HttpRequest, HttpResponse, web};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, ApiResult};
use crate::app_state::AppState;
use crate::config::AdminConfig;
use crate::content::dashboard::build_dashboard;
use crate::gate::{AccessGate, GatePaths};
use crate::iam::SessionRequest;
use crate::security::validate_login_return_path;

pub fn configure(cfg: &mut web::ServiceConfig, admin: &AdminConfig) {
    let login_route = admin
        .login_path
        .strip_prefix(admin.path.as_str())
        .unwrap_or("/login")
        .to_string();
    let dashboard_path = format!("{}/dashboard", admin.path);

    cfg.service(
        web::scope(&admin.path)
            .wrap(AccessGate::new(GatePaths::from_config(admin)))
            .route(
                "",
                web::get().to(move || redirect_to(dashboard_path.clone())),
            )
            .route(&login_route, web::get().to(login_info))
            .route("/dashboard", web::get().to(dashboard))
            .route("/session", web::get().to(session)),
    );
}

async fn redirect_to(location: String) -> HttpResponse {
    HttpResponse::Found()
        .insert_header(("Location", location))
        .finish()
}

#[derive(Debug, Deserialize)]
struct LoginQuery {
    return_path: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginInfo {
    site: String,
    login_endpoint: &'static str,
    session_endpoint: &'static str,
    authenticated: bool,
    return_path: Option<String>,
}

/// Describes how to sign in. Carries the validated `return_path` so a client
/// can continue where the gate interrupted it.
async fn login_info(
    req: HttpRequest,
    state: web::Data<AppState>,
    query: web::Query<LoginQuery>,
) -> HttpResponse {
    let return_path = query
        .return_path
        .as_deref()
        .and_then(|raw| validate_login_return_path(raw, &state.admin));
    HttpResponse::Ok().json(LoginInfo {
        site: state.site.name.clone(),
        login_endpoint: "/api/auth/login",
        session_endpoint: "/api/auth/session",
        authenticated: req.is_authenticated(),
        return_path,
    })
}

async fn dashboard(state: web::Data<AppState>) -> ApiResult<HttpResponse> {
    let dashboard = build_dashboard(&state.store, Utc::now())?;
    Ok(HttpResponse::Ok().json(dashboard))
}

async fn session(req: HttpRequest) -> ApiResult<HttpResponse> {
    let principal = req.principal().ok_or_else(ApiError::unauthorized)?;
    Ok(HttpResponse::Ok().json(principal))
}
