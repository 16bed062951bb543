// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use actix_web::rt::System;
use actix_web::{App, HttpServer, middleware::Logger, web};
use log::{error, info};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use newsdesk::app_state::AppState;
use newsdesk::bootstrap::{self, BootstrapResult};
use newsdesk::config::ValidatedConfig;
use newsdesk::content::ContentStore;
use newsdesk::iam::{SessionMiddlewareFactory, UserServices};
use newsdesk::runtime_paths::RuntimePaths;
use newsdesk::{admin, api, cli, util};

const FLUSH_INTERVAL: Duration = Duration::from_secs(30);

fn main() {
    let exit_code = run();
    std::process::exit(exit_code);
}

fn run() -> i32 {
    let parsed_args = match parse_args(std::env::args().skip(1)) {
        Ok(args) => args,
        Err(error) => {
            eprintln!("❌ Invalid command line arguments: {}", error);
            eprintln!("❌ Use -C <root> to set the runtime directory.");
            return 1;
        }
    };

    match parsed_args.mode {
        RunMode::Help => {
            print!("{}", cli::help_text());
            0
        }
        RunMode::Cli(tokens) => System::new()
            .block_on(async { cli::run_cli(&parsed_args.runtime_root, tokens).await }),
        RunMode::Serve => {
            let bootstrap = match bootstrap::bootstrap_runtime(&parsed_args.runtime_root) {
                Ok(result) => result,
                Err(error) => {
                    eprintln!("❌ Bootstrap error: {}", error);
                    eprintln!("❌ Application cannot start with invalid configuration.");
                    return 1;
                }
            };

            match System::new().block_on(run_server(bootstrap)) {
                Ok(()) => 0,
                Err(error) => {
                    eprintln!("❌ Server failed to start: {}", error);
                    1
                }
            }
        }
    }
}

async fn run_server(bootstrap: BootstrapResult) -> std::io::Result<()> {
    let validated_config = Arc::new(bootstrap.validated_config);
    let runtime_paths = bootstrap.runtime_paths;

    util::init_logging(&validated_config.logging.level).map_err(|error| {
        eprintln!("❌ Failed to initialize logger: {}", error);
        std::io::Error::other(error.to_string())
    })?;

    log_startup_info(&validated_config, &runtime_paths);

    let store = match ContentStore::open(&runtime_paths.data_dir) {
        Ok(store) => Arc::new(store),
        Err(error) => {
            eprintln!("❌ Failed to open content store: {}", error);
            return Err(std::io::Error::other(error.to_string()));
        }
    };
    info!("✅ Content store opened");

    let user_services =
        match UserServices::new(&validated_config, runtime_paths.users_file.clone()) {
            Ok(services) => Arc::new(services),
            Err(error) => {
                eprintln!("❌ Failed to initialize user services: {}", error);
                eprintln!("❌ Application cannot start without user services.");
                return Err(std::io::Error::other(error.to_string()));
            }
        };
    info!("✅ User services initialized successfully");

    let app_state = Arc::new(AppState::new(&validated_config, store.clone()));

    let flush_store = store.clone();
    actix_web::rt::spawn(async move {
        let mut interval = actix_web::rt::time::interval(FLUSH_INTERVAL);
        loop {
            interval.tick().await;
            if let Err(err) = flush_store.flush() {
                error!("Periodic content flush failed: {}", err);
            }
        }
    });

    let admin_config = validated_config.admin.clone();
    let server = HttpServer::new(move || {
        let admin_config = admin_config.clone();
        App::new()
            .app_data(web::Data::from(app_state.clone()))
            .app_data(web::Data::from(user_services.clone()))
            .wrap(SessionMiddlewareFactory)
            .wrap(Logger::new(
                r#"%a "%r" %s %b "%{Referer}i" "%{User-Agent}i" %T"#,
            ))
            .configure(api::configure)
            .configure(move |cfg| admin::configure(cfg, &admin_config))
    })
    .workers(validated_config.server.workers)
    .bind(validated_config.server.address_tuple())?
    .run();

    let result = server.await;

    match store.flush() {
        Ok(()) => info!("Content store flushed on shutdown"),
        Err(err) => error!("Final content flush failed: {}", err),
    }
    result
}

fn log_startup_info(config: &ValidatedConfig, runtime_paths: &RuntimePaths) {
    info!("Starting {} - {}", config.site.name, config.site.description);
    info!("Workers: {}", config.server.workers);
    info!(
        "Listening on http://{}:{}",
        config.server.host, config.server.port
    );
    info!(
        "Admin surface available at: http://{}:{}{}",
        config.server.host, config.server.port, config.admin.path
    );
    info!(
        "Runtime root (canonical): {}",
        runtime_paths.root.display()
    );
    info!(
        "Data directory (canonical): {}",
        runtime_paths.data_dir.display()
    );
}

#[derive(Debug)]
enum RunMode {
    Serve,
    Help,
    Cli(Vec<String>),
}

#[derive(Debug)]
struct ParsedArgs {
    runtime_root: PathBuf,
    mode: RunMode,
}

fn parse_args<I>(args: I) -> Result<ParsedArgs, String>
where
    I: IntoIterator<Item = String>,
{
    let mut runtime_root = PathBuf::from(".");
    let mut tokens = Vec::new();
    let mut args = args.into_iter();

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-C" => {
                let root = args.next().ok_or("-C requires a directory")?;
                runtime_root = PathBuf::from(root);
            }
            "-h" | "--help" => {
                return Ok(ParsedArgs {
                    runtime_root,
                    mode: RunMode::Help,
                });
            }
            flag if flag.starts_with('-') && tokens.is_empty() => {
                return Err(format!("Unknown option '{}'", flag));
            }
            _ => {
                tokens.push(arg);
                tokens.extend(args.by_ref());
            }
        }
    }

    let mode = match tokens.first().map(String::as_str) {
        None => RunMode::Serve,
        Some("help") => RunMode::Help,
        Some(_) => RunMode::Cli(tokens),
    };
    Ok(ParsedArgs { runtime_root, mode })
}
