// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::Error;
use actix_web::dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready};
use actix_web::web::Data;
use actix_web::{HttpMessage, HttpRequest};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

use super::jwt::Claims;
use super::types::Principal;
use crate::iam::user_services::UserServices;

pub const LOGOUT_PATH: &str = "/api/auth/logout";

/// Access to the session decoded by [`SessionMiddlewareFactory`].
pub trait SessionRequest {
    fn principal(&self) -> Option<Principal>;
    fn jwt_claims(&self) -> Option<Claims>;
    fn is_authenticated(&self) -> bool;
}

impl SessionRequest for HttpRequest {
    fn principal(&self) -> Option<Principal> {
        self.extensions().get::<Principal>().cloned()
    }

    fn jwt_claims(&self) -> Option<Claims> {
        self.extensions().get::<Claims>().cloned()
    }

    fn is_authenticated(&self) -> bool {
        self.principal().is_some()
    }
}

impl SessionRequest for ServiceRequest {
    fn principal(&self) -> Option<Principal> {
        self.extensions().get::<Principal>().cloned()
    }

    fn jwt_claims(&self) -> Option<Claims> {
        self.extensions().get::<Claims>().cloned()
    }

    fn is_authenticated(&self) -> bool {
        self.principal().is_some()
    }
}

/// Decodes the session cookie into a [`Principal`]. A missing or invalid
/// cookie leaves the request anonymous; it is never rejected here.
pub struct SessionMiddlewareFactory;

impl<S, B> Transform<S, ServiceRequest> for SessionMiddlewareFactory
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type InitError = ();
    type Transform = SessionMiddleware<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(SessionMiddleware {
            service: Rc::new(service),
        }))
    }
}

pub struct SessionMiddleware<S> {
    service: Rc<S>,
}

impl<S, B> Service<ServiceRequest> for SessionMiddleware<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error> + 'static,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<B>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let user_services = req.app_data::<Data<UserServices>>().cloned();
        let is_logout_request =
            req.path() == LOGOUT_PATH && req.method() == actix_web::http::Method::POST;
        let service = self.service.clone();

        Box::pin(async move {
            let mut refresh_cookie: Option<actix_web::cookie::Cookie> = None;

            if let Some(user_services) = user_services {
                let jwt_service = user_services.jwt_service();
                let token = req
                    .cookie(jwt_service.cookie_name())
                    .map(|cookie| cookie.value().to_string())
                    .filter(|value| !value.is_empty());

                if let Some(token) = token
                    && let Some((user, claims)) = user_services.validate_jwt(&token)
                {
                    if !is_logout_request && jwt_service.should_refresh_token(&claims) {
                        match jwt_service.create_refreshed_token(&claims) {
                            Ok(new_token) => {
                                refresh_cookie = Some(jwt_service.create_auth_cookie(&new_token));
                                log::debug!("JWT token refreshed for user: {}", claims.sub);
                            }
                            Err(e) => {
                                log::error!(
                                    "Failed to create refreshed token for user {}: {}",
                                    claims.sub,
                                    e
                                );
                            }
                        }
                    }
                    req.extensions_mut().insert(user.principal());
                    req.extensions_mut().insert(claims);
                }
            }

            let mut res = service.call(req).await?;

            if let Some(cookie) = refresh_cookie {
                res.response_mut().add_cookie(&cookie).map_err(|e| {
                    log::error!("Failed to set refresh cookie: {}", e);
                    actix_web::error::ErrorInternalServerError("Failed to set refresh cookie")
                })?;
            }

            Ok(res)
        })
    }
}
