// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::types::{Claims, JwtError};
use crate::config::{JwtConfig, ValidatedConfig};
use crate::iam::User;
use actix_web::cookie::{Cookie, SameSite, time::OffsetDateTime};
use chrono::{Duration, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use uuid::Uuid;

pub struct JwtService {
    secret: String,
    issuer: String,
    audience: String,
    expiration_hours: u64,
    cookie_name: String,
    is_localhost: bool,
    disable_refresh: bool,
    refresh_threshold_percentage: u32,
    refresh_threshold_hours: u64,
}

impl JwtService {
    pub fn new(config: &ValidatedConfig) -> Self {
        Self::from_jwt_config(&config.users.jwt, config.is_localhost_only())
    }

    fn from_jwt_config(jwt_config: &JwtConfig, is_localhost: bool) -> Self {
        JwtService {
            secret: jwt_config.secret.clone(),
            issuer: jwt_config.issuer.clone(),
            audience: jwt_config.audience.clone(),
            expiration_hours: jwt_config.expiration_hours,
            cookie_name: jwt_config.cookie_name.clone(),
            is_localhost,
            disable_refresh: jwt_config.disable_refresh,
            refresh_threshold_percentage: jwt_config.refresh_threshold_percentage,
            refresh_threshold_hours: jwt_config.refresh_threshold_hours,
        }
    }

    pub fn cookie_name(&self) -> &str {
        &self.cookie_name
    }

    /// Issues a session token carrying the user's role and password version.
    pub fn create_token(&self, user: &User) -> Result<String, JwtError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user.email.clone(),
            name: user.name.clone(),
            role: user.role.clone(),
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiration_hours as i64)).timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            password_version: user.password_version,
        };
        self.encode_claims(&claims)
    }

    pub fn verify_token(&self, token: &str) -> Result<Claims, JwtError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);

        let token_data = decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_ref()),
            &validation,
        )
        .map_err(|e| JwtError::Verification(e.to_string()))?;

        Ok(token_data.claims)
    }

    fn encode_claims(&self, claims: &Claims) -> Result<String, JwtError> {
        encode(
            &Header::default(),
            claims,
            &EncodingKey::from_secret(self.secret.as_ref()),
        )
        .map_err(|e| JwtError::Creation(e.to_string()))
    }

    pub fn create_auth_cookie<'a>(&self, token: &str) -> Cookie<'a> {
        let expiration = Utc::now() + Duration::hours(self.expiration_hours as i64);
        let expires = match OffsetDateTime::from_unix_timestamp(expiration.timestamp()) {
            Ok(val) => val,
            Err(e) => {
                log::error!(
                    "Failed to convert expiration timestamp for auth cookie: {}",
                    e
                );
                OffsetDateTime::UNIX_EPOCH
            }
        };

        let mut cookie = self.base_cookie(token.to_string());
        cookie.set_expires(expires);
        cookie
    }

    /// An expired, empty cookie that clears the session.
    pub fn create_logout_cookie<'a>(&self) -> Cookie<'a> {
        let mut cookie = self.base_cookie(String::new());
        cookie.set_max_age(actix_web::cookie::time::Duration::seconds(0));
        cookie.set_expires(OffsetDateTime::UNIX_EPOCH);
        cookie
    }

    // Plain HTTP is only accepted when every listener is loopback.
    fn base_cookie<'a>(&self, value: String) -> Cookie<'a> {
        Cookie::build(self.cookie_name.clone(), value)
            .path("/")
            .secure(!self.is_localhost)
            .http_only(true)
            .same_site(SameSite::Lax)
            .finish()
    }

    /// Short tokens (up to a day) refresh after a share of their lifetime,
    /// longer ones after a fixed number of hours.
    pub fn should_refresh_token(&self, claims: &Claims) -> bool {
        if self.disable_refresh {
            return false;
        }

        let now = Utc::now().timestamp();
        let token_age_seconds = now - claims.iat;
        let token_lifetime_seconds = claims.exp - claims.iat;
        let token_lifetime_hours = token_lifetime_seconds / 3600;

        if token_lifetime_hours <= 24 {
            let threshold_seconds = (token_lifetime_seconds as f64
                * self.refresh_threshold_percentage as f64
                / 100.0) as i64;
            token_age_seconds >= threshold_seconds
        } else {
            token_age_seconds >= (self.refresh_threshold_hours * 3600) as i64
        }
    }

    pub fn create_refreshed_token(&self, old_claims: &Claims) -> Result<String, JwtError> {
        let now = Utc::now();
        let new_claims = Claims {
            iat: now.timestamp(),
            exp: (now + Duration::hours(self.expiration_hours as i64)).timestamp(),
            iss: self.issuer.clone(),
            aud: self.audience.clone(),
            jti: Uuid::new_v4().to_string(),
            ..old_claims.clone()
        };
        self.encode_claims(&new_claims)
    }
}
