// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use crate::content::ContentError;
use crate::iam::Principal;
use crate::roles::Role;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Article,
    Category,
    Tag,
    Author,
    Poll,
    Popup,
    EPaper,
    Subscriber,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Create,
    Update,
    Delete,
    List,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessDenied {
    message: String,
}

impl AccessDenied {
    fn new() -> Self {
        Self {
            message: "Unauthorized".to_string(),
        }
    }
}

impl fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.message)
    }
}

impl std::error::Error for AccessDenied {}

impl From<AccessDenied> for ContentError {
    fn from(denied: AccessDenied) -> Self {
        ContentError::Unauthorized(denied.message)
    }
}

fn allowed_roles(resource: Resource, operation: Operation) -> &'static [Role] {
    const STAFF: &[Role] = &[Role::Admin, Role::Editor];
    const ADMIN: &[Role] = &[Role::Admin];
    match (resource, operation) {
        (Resource::Article, Operation::Create | Operation::Update | Operation::List) => STAFF,
        _ => ADMIN,
    }
}

/// Checks a mutation or privileged listing against the role table and
/// returns the caller's role on success.
pub fn authorize(
    principal: Option<&Principal>,
    resource: Resource,
    operation: Operation,
) -> Result<Role, AccessDenied> {
    let role = principal
        .and_then(Principal::role)
        .ok_or_else(AccessDenied::new)?;
    if allowed_roles(resource, operation).contains(&role) {
        Ok(role)
    } else {
        Err(AccessDenied::new())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn principal(role: &str) -> Principal {
        Principal {
            email: "staff@example.com".to_string(),
            name: "Staff".to_string(),
            role: role.to_string(),
        }
    }

    #[test]
    fn anonymous_is_denied_everything() {
        for resource in [Resource::Article, Resource::Category, Resource::Subscriber] {
            assert!(authorize(None, resource, Operation::Create).is_err());
        }
    }

    #[test]
    fn editors_write_articles_only() {
        let editor = principal("editor");
        assert_eq!(
            authorize(Some(&editor), Resource::Article, Operation::Create),
            Ok(Role::Editor)
        );
        assert!(authorize(Some(&editor), Resource::Article, Operation::Update).is_ok());
        assert!(authorize(Some(&editor), Resource::Article, Operation::Delete).is_err());
        for resource in [
            Resource::Category,
            Resource::Tag,
            Resource::Author,
            Resource::Poll,
            Resource::Popup,
            Resource::EPaper,
        ] {
            assert!(authorize(Some(&editor), resource, Operation::Create).is_err());
            assert!(authorize(Some(&editor), resource, Operation::Delete).is_err());
        }
        assert!(authorize(Some(&editor), Resource::Subscriber, Operation::List).is_err());
    }

    #[test]
    fn admins_may_do_everything() {
        let admin = principal("admin");
        for resource in [Resource::Article, Resource::Tag, Resource::Subscriber] {
            for operation in [
                Operation::Create,
                Operation::Update,
                Operation::Delete,
                Operation::List,
            ] {
                assert_eq!(authorize(Some(&admin), resource, operation), Ok(Role::Admin));
            }
        }
    }

    #[test]
    fn unknown_role_is_denied_with_unauthorized() {
        let reader = principal("reader");
        let err = authorize(Some(&reader), Resource::Article, Operation::Create).unwrap_err();
        assert_eq!(
            ContentError::from(err),
            ContentError::Unauthorized("Unauthorized".to_string())
        );
    }
}
