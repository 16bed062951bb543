// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::parse_utils::{ensure_no_more_args, parse_required_arg};
use super::{CliCommand, CliError, CommandSpec, DomainSpec};
use crate::iam::UserServices;
use crate::roles::Role;
use rpassword::read_password;
use std::io::Write;

/// Non-interactive password source for scripted account management.
pub const ENV_PASSWORD: &str = "NEWSDESK_PASSWORD";
const MAX_PASSWORD_CHARS: usize = 1024;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UserCommand {
    Add {
        email: String,
        name: String,
        role: Role,
        password: String,
    },
    List,
    Delete {
        email: String,
    },
    Password {
        email: String,
        password: String,
    },
}

pub fn domain() -> DomainSpec {
    DomainSpec {
        name: "users",
        aliases: &["user", "u"],
        commands: vec![
            CommandSpec {
                name: "add",
                aliases: &[],
                usage: &["users add <email> <name> <admin|editor>"],
                parser: parse_add,
            },
            CommandSpec {
                name: "list",
                aliases: &["ls"],
                usage: &["users list"],
                parser: parse_list,
            },
            CommandSpec {
                name: "delete",
                aliases: &["rm"],
                usage: &["users delete <email>"],
                parser: parse_delete,
            },
            CommandSpec {
                name: "passwd",
                aliases: &["password"],
                usage: &["users passwd <email>"],
                parser: parse_password,
            },
        ],
    }
}

fn parse_add(args: &[String]) -> Result<CliCommand, CliError> {
    let (email, rest) = parse_required_arg(args, "email")?;
    let (name, rest) = parse_required_arg(rest, "name")?;
    let (role, rest) = parse_required_arg(rest, "role")?;
    ensure_no_more_args(rest, "users add <email> <name> <admin|editor>")?;
    let role: Role = role
        .parse()
        .map_err(|_| CliError::usage(format!("Unknown role '{}' (admin or editor)", role)))?;

    let password = read_new_password()?;
    Ok(CliCommand::Users(UserCommand::Add {
        email,
        name,
        role,
        password,
    }))
}

fn parse_list(args: &[String]) -> Result<CliCommand, CliError> {
    ensure_no_more_args(args, "users list")?;
    Ok(CliCommand::Users(UserCommand::List))
}

fn parse_delete(args: &[String]) -> Result<CliCommand, CliError> {
    let (email, rest) = parse_required_arg(args, "email")?;
    ensure_no_more_args(rest, "users delete <email>")?;
    Ok(CliCommand::Users(UserCommand::Delete { email }))
}

fn parse_password(args: &[String]) -> Result<CliCommand, CliError> {
    let (email, rest) = parse_required_arg(args, "email")?;
    ensure_no_more_args(rest, "users passwd <email>")?;
    let password = read_new_password()?;
    Ok(CliCommand::Users(UserCommand::Password { email, password }))
}

pub(super) async fn execute(
    user_services: &UserServices,
    command: UserCommand,
) -> Result<(), CliError> {
    match command {
        UserCommand::Add {
            email,
            name,
            role,
            password,
        } => {
            user_services
                .add_user(&email, &name, role, &password)
                .await
                .map_err(CliError::failure)?;
            println!("Added {} ({})", email.trim(), role);
        }
        UserCommand::List => {
            let users = user_services.list_users().map_err(CliError::failure)?;
            if users.is_empty() {
                println!("No users.");
            }
            for user in users {
                println!("{}\t{}\t{}", user.email, user.role, user.name);
            }
        }
        UserCommand::Delete { email } => {
            user_services
                .delete_user(&email)
                .await
                .map_err(CliError::failure)?;
            println!("Deleted {}", email.trim());
        }
        UserCommand::Password { email, password } => {
            user_services
                .change_password(&email, &password)
                .await
                .map_err(CliError::failure)?;
            println!("Password changed for {}", email.trim());
        }
    }
    Ok(())
}

fn read_new_password() -> Result<String, CliError> {
    let password = match std::env::var(ENV_PASSWORD) {
        Ok(value) if !value.is_empty() => value,
        _ => prompt_password("Enter password: ", "Confirm password: ")?,
    };
    validate_plain_password(&password)?;
    Ok(password)
}

fn prompt_password(prompt: &str, confirm: &str) -> Result<String, CliError> {
    let password1 = read_password_line(prompt)?;
    let password2 = read_password_line(confirm)?;
    if password1 != password2 {
        return Err(CliError::usage("Passwords do not match"));
    }
    Ok(password1)
}

fn read_password_line(prompt: &str) -> Result<String, CliError> {
    print!("{}", prompt);
    std::io::stdout()
        .flush()
        .map_err(|err| CliError::usage(format!("Failed to read password: {}", err)))?;
    read_password().map_err(|err| CliError::usage(format!("Failed to read password: {}", err)))
}

fn validate_plain_password(password: &str) -> Result<(), CliError> {
    if password.is_empty() {
        return Err(CliError::usage("Password is required"));
    }
    if password.chars().count() > MAX_PASSWORD_CHARS {
        return Err(CliError::usage(format!(
            "Password must be at most {} characters",
            MAX_PASSWORD_CHARS
        )));
    }
    Ok(())
}
