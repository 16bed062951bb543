// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::decision::{GateDecision, GatePaths, decide};
use crate::iam::SessionRequest;
use actix_web::{
    Error, HttpResponse,
    body::EitherBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform, forward_ready},
    http::header::LOCATION,
};
use futures_util::future::LocalBoxFuture;
use std::future::{Ready, ready};
use std::rc::Rc;

/// Applies [`decide`] to every request under the admin scope. Must be wrapped
/// inside the session middleware so the principal is already decoded.
pub struct AccessGate {
    paths: Rc<GatePaths>,
}

impl AccessGate {
    pub fn new(paths: GatePaths) -> Self {
        Self {
            paths: Rc::new(paths),
        }
    }
}

impl<S, B> Transform<S, ServiceRequest> for AccessGate
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type InitError = ();
    type Transform = AccessGateService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ready(Ok(AccessGateService {
            service,
            paths: self.paths.clone(),
        }))
    }
}

pub struct AccessGateService<S> {
    service: S,
    paths: Rc<GatePaths>,
}

impl<S, B> Service<ServiceRequest> for AccessGateService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<B>, Error = Error>,
    S::Future: 'static,
    B: 'static,
{
    type Response = ServiceResponse<EitherBody<B>>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    forward_ready!(service);

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let principal = req.principal();
        let decision = decide(&self.paths, req.path(), principal.as_ref());

        let redirect_location = match decision {
            GateDecision::Allow => {
                let fut = self.service.call(req);
                return Box::pin(async move { fut.await.map(ServiceResponse::map_into_left_body) });
            }
            GateDecision::RedirectRoot => "/".to_string(),
            GateDecision::RedirectLogin => {
                let current_path = req
                    .uri()
                    .path_and_query()
                    .map(|pq| pq.as_str())
                    .unwrap_or(req.uri().path());
                format!(
                    "{}?return_path={}",
                    self.paths.login_path,
                    urlencoding::encode(current_path)
                )
            }
        };

        log::debug!(
            "Access gate redirecting {} to {}",
            req.path(),
            redirect_location
        );
        let (req, _) = req.into_parts();
        let response = HttpResponse::Found()
            .insert_header((LOCATION, redirect_location))
            .finish()
            .map_into_right_body();

        Box::pin(async move { Ok(ServiceResponse::new(req, response)) })
    }
}
