// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

//! Offline management commands. They operate directly on the files of a
//! runtime root, so they are meant for a stopped server or first setup.

pub(crate) mod parse_utils;
pub mod users;

use crate::config::Config;
use crate::iam::UserServices;
use crate::runtime_paths::RuntimePaths;
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CliErrorKind {
    Usage,
    Failure,
}

#[derive(Debug, Clone)]
pub struct CliError {
    kind: CliErrorKind,
    message: String,
}

impl CliError {
    pub fn usage(message: impl Into<String>) -> Self {
        Self {
            kind: CliErrorKind::Usage,
            message: message.into(),
        }
    }

    pub fn failure(err: impl fmt::Display) -> Self {
        Self {
            kind: CliErrorKind::Failure,
            message: err.to_string(),
        }
    }

    pub fn exit_code(&self) -> i32 {
        match self.kind {
            CliErrorKind::Usage => 2,
            CliErrorKind::Failure => 1,
        }
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

/// A parsed command, ready to run against a runtime root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CliCommand {
    Users(users::UserCommand),
}

pub struct CliRegistry {
    domains: Vec<DomainSpec>,
    aliases: BTreeSet<String>,
}

impl Default for CliRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl CliRegistry {
    pub fn new() -> Self {
        Self {
            domains: Vec::new(),
            aliases: BTreeSet::new(),
        }
    }

    pub fn register_domain(&mut self, domain: DomainSpec) -> Result<(), CliError> {
        let names = std::iter::once(domain.name).chain(domain.aliases.iter().copied());
        for name in names {
            if !self.aliases.insert(name.to_ascii_lowercase()) {
                return Err(CliError::usage(format!(
                    "Duplicate domain alias or name '{}'",
                    name
                )));
            }
        }

        domain.validate_commands()?;
        self.domains.push(domain);
        Ok(())
    }

    pub fn resolve_command(&self, tokens: &[String]) -> Result<CliCommand, CliError> {
        let Some(domain_token) = tokens.first() else {
            return Err(CliError::usage("Missing command domain"));
        };
        let domain = resolve_domain(&domain_token.to_ascii_lowercase(), &self.domains)?;
        let Some(command_token) = tokens.get(1) else {
            return Err(CliError::usage(format!(
                "Missing command for domain '{}'",
                domain.name
            )));
        };
        let command = resolve_command_spec(&command_token.to_ascii_lowercase(), domain)?;
        (command.parser)(&tokens[2..])
    }
}

pub struct DomainSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub commands: Vec<CommandSpec>,
}

impl DomainSpec {
    fn validate_commands(&self) -> Result<(), CliError> {
        let mut seen = BTreeSet::new();
        for command in self.commands.iter() {
            let names = std::iter::once(command.name).chain(command.aliases.iter().copied());
            for name in names {
                if !seen.insert(name.to_ascii_lowercase()) {
                    return Err(CliError::usage(format!(
                        "Duplicate command name or alias '{}' in domain '{}'",
                        name, self.name
                    )));
                }
            }
        }
        Ok(())
    }

    fn matches_exact(&self, token: &str) -> bool {
        self.name.eq_ignore_ascii_case(token)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(token))
    }

    fn matches_prefix(&self, token: &str) -> bool {
        self.name.to_ascii_lowercase().starts_with(token)
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_ascii_lowercase().starts_with(token))
    }
}

pub struct CommandSpec {
    pub name: &'static str,
    pub aliases: &'static [&'static str],
    pub usage: &'static [&'static str],
    pub parser: fn(&[String]) -> Result<CliCommand, CliError>,
}

impl CommandSpec {
    fn matches_exact(&self, token: &str) -> bool {
        self.name.eq_ignore_ascii_case(token)
            || self
                .aliases
                .iter()
                .any(|alias| alias.eq_ignore_ascii_case(token))
    }

    fn matches_prefix(&self, token: &str) -> bool {
        self.name.to_ascii_lowercase().starts_with(token)
            || self
                .aliases
                .iter()
                .any(|alias| alias.to_ascii_lowercase().starts_with(token))
    }
}

pub fn build_registry() -> Result<CliRegistry, CliError> {
    let mut registry = CliRegistry::new();
    registry.register_domain(users::domain())?;
    Ok(registry)
}

pub fn help_text() -> String {
    let registry = match build_registry() {
        Ok(registry) => registry,
        Err(err) => {
            return format!("Failed to build CLI registry: {}", err);
        }
    };

    let mut out = String::new();
    push_line(&mut out, "Usage:");
    push_line(&mut out, "  newsdesk [options]");
    push_line(&mut out, "  newsdesk [options] <domain> <command> [args]");
    push_line(&mut out, "  newsdesk help");
    push_line(&mut out, "");
    push_line(&mut out, "Options:");
    push_line(&mut out, "  -C <root>   Set the runtime root (default: .).");
    push_line(&mut out, "  -h, --help  Show this help.");
    push_line(&mut out, "");
    push_line(&mut out, "Domains and commands:");
    for domain in registry.domains.iter() {
        push_line(
            &mut out,
            &format!("  {}{}", domain.name, format_aliases(domain.aliases)),
        );
        for command in domain.commands.iter() {
            push_line(
                &mut out,
                &format!("    {}{}", command.name, format_aliases(command.aliases)),
            );
            for usage in command.usage.iter() {
                push_line(&mut out, &format!("      {}", usage));
            }
        }
    }
    push_line(&mut out, "");
    push_line(&mut out, "Notes:");
    push_line(
        &mut out,
        "  Domains and commands are case-insensitive and accept unambiguous prefixes.",
    );
    push_line(
        &mut out,
        &format!(
            "  Passwords are prompted for, or taken from {} when set.",
            users::ENV_PASSWORD
        ),
    );
    out
}

/// Parses and runs one command. Returns the process exit code.
pub async fn run_cli(runtime_root: &Path, tokens: Vec<String>) -> i32 {
    let result = match build_registry().and_then(|registry| registry.resolve_command(&tokens)) {
        Ok(command) => execute(runtime_root, command).await,
        Err(err) => Err(err),
    };

    match result {
        Ok(()) => 0,
        Err(err) => {
            eprintln!("{}", err);
            err.exit_code()
        }
    }
}

pub async fn execute(runtime_root: &Path, command: CliCommand) -> Result<(), CliError> {
    let config = Config::load_and_validate(runtime_root).map_err(CliError::failure)?;
    let paths = RuntimePaths::from_root(runtime_root, &config).map_err(CliError::failure)?;

    match command {
        CliCommand::Users(command) => {
            let user_services =
                UserServices::new(&config, paths.users_file).map_err(CliError::failure)?;
            users::execute(&user_services, command).await
        }
    }
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}

fn format_aliases(aliases: &[&str]) -> String {
    if aliases.is_empty() {
        String::new()
    } else {
        format!(" (aliases: {})", aliases.join(", "))
    }
}

fn resolve_domain<'a>(token: &str, domains: &'a [DomainSpec]) -> Result<&'a DomainSpec, CliError> {
    if let Some(domain) = domains.iter().find(|domain| domain.matches_exact(token)) {
        return Ok(domain);
    }
    resolve_prefix(
        token,
        domains,
        |domain| domain.matches_prefix(token),
        |domain| domain.name,
        "domain",
    )
}

fn resolve_command_spec<'a>(
    token: &str,
    domain: &'a DomainSpec,
) -> Result<&'a CommandSpec, CliError> {
    if let Some(command) = domain.commands.iter().find(|cmd| cmd.matches_exact(token)) {
        return Ok(command);
    }
    resolve_prefix(
        token,
        &domain.commands,
        |command| command.matches_prefix(token),
        |command| command.name,
        "command",
    )
}

fn resolve_prefix<'a, T>(
    token: &str,
    items: &'a [T],
    matches: impl Fn(&T) -> bool,
    name: impl Fn(&T) -> &'static str,
    kind: &str,
) -> Result<&'a T, CliError> {
    let matched: Vec<&T> = items.iter().filter(|item| matches(item)).collect();
    match matched.as_slice() {
        [item] => Ok(item),
        [] => Err(CliError::usage(format!("Unknown {} '{}'", kind, token))),
        many => {
            let mut names: Vec<&'static str> = many.iter().map(|item| name(item)).collect();
            names.sort();
            Err(CliError::usage(format!(
                "Ambiguous {} prefix '{}': {}",
                kind,
                token,
                names.join(", ")
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::users::UserCommand;
    use crate::iam::{FileUserStore, UserStore};
    use crate::util::test_fixtures::TestFixtureRoot;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn resolves_domain_alias_and_command_prefix() {
        let registry = build_registry().unwrap();
        let command = registry.resolve_command(&tokens(&["u", "li"])).unwrap();
        assert_eq!(command, CliCommand::Users(UserCommand::List));
    }

    #[test]
    fn detects_ambiguous_command_prefix() {
        let mut registry = CliRegistry::new();
        registry
            .register_domain(DomainSpec {
                name: "alpha",
                aliases: &[],
                commands: vec![
                    CommandSpec {
                        name: "list",
                        aliases: &[],
                        usage: &["alpha list"],
                        parser: |_args| Err(CliError::usage("no")),
                    },
                    CommandSpec {
                        name: "link",
                        aliases: &[],
                        usage: &["alpha link"],
                        parser: |_args| Err(CliError::usage("no")),
                    },
                ],
            })
            .unwrap();

        let err = registry
            .resolve_command(&tokens(&["alpha", "li"]))
            .unwrap_err();
        assert!(err.to_string().contains("Ambiguous"));
    }

    #[test]
    fn detects_unknown_domain_and_missing_command() {
        let registry = build_registry().unwrap();
        let err = registry
            .resolve_command(&tokens(&["articles", "list"]))
            .unwrap_err();
        assert!(err.to_string().contains("Unknown domain"));

        let err = registry.resolve_command(&tokens(&["users"])).unwrap_err();
        assert!(err.to_string().contains("Missing command"));
    }

    #[test]
    fn help_lists_user_commands() {
        let help = help_text();
        assert!(help.contains("users add <email> <name> <admin|editor>"));
        assert!(help.contains("users passwd <email>"));
    }

    #[actix_web::test]
    async fn execute_adds_and_deletes_users_in_the_runtime_root() {
        let fixture = TestFixtureRoot::new_unique("cli-users").unwrap();
        std::fs::write(
            fixture.path().join("config.yaml"),
            "server:\n  host: \"127.0.0.1\"\n  port: 8080\nusers:\n  jwt:\n    secret: \"cli-secret\"\n  password:\n    memory_kib: 1024\n    iterations: 1\n    parallelism: 1\nsite:\n  name: \"Test\"\n  base_url: \"http://localhost:8080\"\n",
        )
        .unwrap();
        std::fs::write(fixture.path().join("users.yaml"), "{}\n").unwrap();

        execute(
            fixture.path(),
            CliCommand::Users(UserCommand::Add {
                email: "desk@example.com".to_string(),
                name: "Desk".to_string(),
                role: crate::roles::Role::Editor,
                password: "correct horse".to_string(),
            }),
        )
        .await
        .expect("add succeeds");

        let store = FileUserStore::new(fixture.path().join("users.yaml")).unwrap();
        let users = store.load().unwrap();
        assert_eq!(users["desk@example.com"].role, "editor");

        execute(
            fixture.path(),
            CliCommand::Users(UserCommand::Delete {
                email: "desk@example.com".to_string(),
            }),
        )
        .await
        .expect("delete succeeds");
        assert!(store.load().unwrap().is_empty());
    }
}
