// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

#![allow(dead_code)]

use actix_web::body::MessageBody;
use actix_web::dev::{ServiceFactory, ServiceRequest, ServiceResponse};
use actix_web::{App, web};
use chrono::Utc;
use newsdesk::admin;
use newsdesk::api;
use newsdesk::app_state::AppState;
use newsdesk::config::{ValidatedConfig, test_config};
use newsdesk::content::ContentStore;
use newsdesk::content::model::{Article, AuthorInput, NameInput, NewArticle};
use newsdesk::iam::{
    Principal, SessionMiddlewareFactory, User, UserServices, YamlUser, YamlUsersData,
    hash_password,
};
use newsdesk::runtime_paths::RuntimePaths;
use newsdesk::util::test_fixtures::TestFixtureRoot;
use serde_json::Value;
use std::fs;
use std::sync::Arc;

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const EDITOR_EMAIL: &str = "editor@example.com";
/// Authenticated, but holds no staff role.
pub const READER_EMAIL: &str = "reader@example.com";
pub const PASSWORD: &str = "test-password";

pub struct TestHarness {
    pub fixture: TestFixtureRoot,
    pub config: Arc<ValidatedConfig>,
    pub runtime_paths: RuntimePaths,
    pub store: Arc<ContentStore>,
    pub app_state: Arc<AppState>,
    pub user_services: Arc<UserServices>,
}

pub struct AuthSession {
    pub user: User,
    pub token: String,
    pub cookie: actix_web::cookie::Cookie<'static>,
}

/// Ids of the reference documents every harness starts with.
pub struct Seed {
    pub category: String,
    pub author: String,
    pub tag: String,
}

impl TestHarness {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_config(config: ValidatedConfig) -> Self {
        let fixture = TestFixtureRoot::new_unique("api-test-suite").expect("fixture root");
        let runtime_paths = fixture.runtime_paths().expect("runtime paths");
        let config = Arc::new(config);

        seed_users(&runtime_paths, &config);

        let store = Arc::new(ContentStore::open(&runtime_paths.data_dir).expect("content store"));
        let user_services = Arc::new(
            UserServices::new(&config, runtime_paths.users_file.clone()).expect("user services"),
        );
        let app_state = Arc::new(AppState::new(&config, store.clone()));

        Self {
            fixture,
            config,
            runtime_paths,
            store,
            app_state,
            user_services,
        }
    }

    pub fn admin_auth(&self) -> AuthSession {
        self.auth_for(ADMIN_EMAIL)
    }

    pub fn editor_auth(&self) -> AuthSession {
        self.auth_for(EDITOR_EMAIL)
    }

    pub fn reader_auth(&self) -> AuthSession {
        self.auth_for(READER_EMAIL)
    }

    pub fn auth_for(&self, email: &str) -> AuthSession {
        let user = self
            .user_services
            .get_user(email)
            .expect("user lookup")
            .expect("user exists");
        let token = self.user_services.issue_token(&user).expect("jwt token");
        let cookie = self
            .user_services
            .jwt_service()
            .create_auth_cookie(&token)
            .into_owned();
        AuthSession {
            user,
            token,
            cookie,
        }
    }

    pub fn admin_principal(&self) -> Principal {
        self.admin_auth().user.principal()
    }

    /// One category, author and tag, created straight through the store.
    pub fn seed(&self) -> Seed {
        let now = Utc::now();
        let category = self
            .store
            .create_category(
                NameInput {
                    name: Some("Politics".to_string()),
                    description: None,
                },
                now,
            )
            .expect("category");
        let author = self
            .store
            .create_author(
                AuthorInput {
                    name: Some("Jane Reporter".to_string()),
                    ..AuthorInput::default()
                },
                now,
            )
            .expect("author");
        let tag = self
            .store
            .create_tag(
                NameInput {
                    name: Some("Elections".to_string()),
                    description: None,
                },
                now,
            )
            .expect("tag");
        Seed {
            category: category.id,
            author: author.id,
            tag: tag.id,
        }
    }

    /// Creates an article through the lifecycle authority as the admin.
    pub fn article(&self, seed: &Seed, title: &str, status: &str, breaking: bool) -> Article {
        let input = NewArticle {
            title: Some(title.to_string()),
            content: Some(format!("<p>{} body</p>", title)),
            category: Some(seed.category.clone()),
            author: Some(seed.author.clone()),
            tags: vec![seed.tag.clone()],
            status: Some(status.parse().expect("status")),
            is_breaking: breaking,
            ..NewArticle::default()
        };
        self.app_state
            .lifecycle
            .create(&self.store, input, &self.admin_principal(), Utc::now())
            .expect("article")
    }
}

fn seed_users(runtime_paths: &RuntimePaths, config: &ValidatedConfig) {
    let password_hash = hash_password(PASSWORD, &config.users.password).expect("password hash");
    let mut users = YamlUsersData::new();
    for (email, name, role) in [
        (ADMIN_EMAIL, "Admin User", "admin"),
        (EDITOR_EMAIL, "Desk Editor", "editor"),
        (READER_EMAIL, "Casual Reader", "reader"),
    ] {
        users.insert(
            email.to_string(),
            YamlUser {
                name: name.to_string(),
                password_hash: Some(password_hash.clone()),
                role: role.to_string(),
                password_version: Some(1),
            },
        );
    }
    let yaml = serde_yaml::to_string(&users).expect("users yaml");
    fs::write(&runtime_paths.users_file, yaml).expect("users file");
}

pub fn build_test_app(
    harness: &TestHarness,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody + use<>>,
        Error = actix_web::Error,
        InitError = (),
    > + use<>,
> {
    let admin_config = harness.config.admin.clone();
    App::new()
        .app_data(web::Data::from(harness.app_state.clone()))
        .app_data(web::Data::from(harness.user_services.clone()))
        .wrap(SessionMiddlewareFactory)
        .configure(api::configure)
        .configure(move |cfg| admin::configure(cfg, &admin_config))
}

pub fn with_session(
    req: actix_web::test::TestRequest,
    session: &AuthSession,
) -> actix_web::test::TestRequest {
    req.cookie(session.cookie.clone())
}

pub async fn read_json<B: MessageBody>(resp: ServiceResponse<B>) -> Value {
    let body = actix_web::test::read_body(resp).await;
    serde_json::from_slice(&body).expect("json body")
}
