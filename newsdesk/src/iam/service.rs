// This file is part of the product NoPressure.
// SPDX-FileCopyrightText: 2025-2026 Zivatar Limited
// SPDX-License-Identifier: AGPL-3.0-or-later
// The code and documentation in this repository is licensed under the GNU Affero General Public License v3.0 or later (AGPL-3.0-or-later). See LICENSE.

use super::store::UserStore;
use super::types::{DEFAULT_PASSWORD_VERSION, IamError, User, UsersData};
use std::sync::{Arc, RwLock};
use tokio::sync::{mpsc, oneshot};

#[derive(Debug)]
enum UserMutation {
    Add {
        email: String,
        name: String,
        password_hash: String,
        role: String,
    },
    Update {
        email: String,
        name: Option<String>,
        password_hash: Option<String>,
        role: Option<String>,
    },
    Delete {
        email: String,
    },
}

type MutationRequest = (UserMutation, oneshot::Sender<Result<(), IamError>>);
type MutationSender = mpsc::UnboundedSender<MutationRequest>;

/// In-memory view of the users file. Reads are synchronous; mutations are
/// serialized through one background task that persists before publishing.
#[derive(Clone)]
pub struct IamService {
    users_data: Arc<RwLock<UsersData>>,
    mutation_sender: MutationSender,
    store: Arc<dyn UserStore>,
}

impl IamService {
    /// Loads users and starts the mutation task. Must be called inside a tokio runtime.
    pub fn new(store: Arc<dyn UserStore>) -> Result<Self, IamError> {
        let users_data = Arc::new(RwLock::new(store.load()?));
        let (mutation_sender, mut mutation_receiver) = mpsc::unbounded_channel::<MutationRequest>();

        let task_users = users_data.clone();
        let task_store = store.clone();
        tokio::spawn(async move {
            while let Some((mutation, reply)) = mutation_receiver.recv().await {
                let result = Self::handle_mutation(mutation, &task_users, &task_store);
                let _ = reply.send(result);
            }
        });

        Ok(IamService {
            users_data,
            mutation_sender,
            store,
        })
    }

    fn with_users_read<T>(&self, f: impl FnOnce(&UsersData) -> T) -> Result<T, IamError> {
        match self.users_data.read() {
            Ok(guard) => Ok(f(&guard)),
            Err(_) => {
                log::error!("Users lock poisoned on read; reloading from disk");
                let users = self.store.load()?;
                let mut guard = self
                    .users_data
                    .write()
                    .unwrap_or_else(|poisoned| poisoned.into_inner());
                *guard = users;
                self.users_data.clear_poison();
                Ok(f(&guard))
            }
        }
    }

    fn handle_mutation(
        mutation: UserMutation,
        users_data: &Arc<RwLock<UsersData>>,
        store: &Arc<dyn UserStore>,
    ) -> Result<(), IamError> {
        let mut guard = match users_data.write() {
            Ok(guard) => guard,
            Err(poisoned) => {
                log::error!("Users lock poisoned on write; reloading from disk");
                let mut guard = poisoned.into_inner();
                *guard = store.load()?;
                users_data.clear_poison();
                guard
            }
        };

        let mut updated = guard.clone();
        match mutation {
            UserMutation::Add {
                email,
                name,
                password_hash,
                role,
            } => {
                if updated.contains_key(&email) {
                    return Err(IamError::UserExists(email));
                }
                updated.insert(
                    email.clone(),
                    User {
                        email,
                        name,
                        password_hash: Some(password_hash),
                        role,
                        password_version: DEFAULT_PASSWORD_VERSION,
                    },
                );
            }
            UserMutation::Update {
                email,
                name,
                password_hash,
                role,
            } => {
                let user = updated
                    .get_mut(&email)
                    .ok_or_else(|| IamError::UserNotFound(email.clone()))?;
                if let Some(name) = name {
                    user.name = name;
                }
                if let Some(hash) = password_hash {
                    user.password_hash = Some(hash);
                    user.password_version = user.password_version.saturating_add(1);
                }
                if let Some(role) = role {
                    user.role = role;
                }
            }
            UserMutation::Delete { email } => {
                if updated.remove(&email).is_none() {
                    return Err(IamError::UserNotFound(email));
                }
            }
        }

        store.save(&updated)?;
        *guard = updated;
        Ok(())
    }

    async fn submit(&self, mutation: UserMutation) -> Result<(), IamError> {
        let (reply, response) = oneshot::channel();
        self.mutation_sender
            .send((mutation, reply))
            .map_err(|_| IamError::ConfigurationError("User mutation task stopped".to_string()))?;
        response
            .await
            .map_err(|_| IamError::ConfigurationError("User mutation task dropped reply".to_string()))?
    }

    pub fn get_user(&self, email: &str) -> Result<Option<User>, IamError> {
        self.with_users_read(|users| users.get(email).cloned())
    }

    /// All users ordered by email.
    pub fn list_users(&self) -> Result<Vec<User>, IamError> {
        let mut users = self.with_users_read(|users| users.values().cloned().collect::<Vec<_>>())?;
        users.sort_by(|a, b| a.email.cmp(&b.email));
        Ok(users)
    }

    pub async fn add_user(
        &self,
        email: &str,
        name: &str,
        password_hash: String,
        role: &str,
    ) -> Result<(), IamError> {
        self.submit(UserMutation::Add {
            email: email.to_string(),
            name: name.to_string(),
            password_hash,
            role: role.to_string(),
        })
        .await
    }

    /// A new password hash bumps the password version, revoking issued tokens.
    pub async fn update_user(
        &self,
        email: &str,
        name: Option<&str>,
        password_hash: Option<String>,
        role: Option<&str>,
    ) -> Result<(), IamError> {
        self.submit(UserMutation::Update {
            email: email.to_string(),
            name: name.map(str::to_string),
            password_hash,
            role: role.map(str::to_string),
        })
        .await
    }

    pub async fn delete_user(&self, email: &str) -> Result<(), IamError> {
        self.submit(UserMutation::Delete {
            email: email.to_string(),
        })
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::iam::store::MemoryUserStore;

    struct FailingUserStore {
        users: UsersData,
    }

    impl UserStore for FailingUserStore {
        fn load(&self) -> Result<UsersData, IamError> {
            Ok(self.users.clone())
        }

        fn save(&self, _users: &UsersData) -> Result<(), IamError> {
            Err(IamError::FileError(
                "Simulated users save failure".to_string(),
            ))
        }
    }

    fn sample_user() -> User {
        User {
            email: "user@example.com".to_string(),
            name: "User One".to_string(),
            password_hash: Some("hash".to_string()),
            role: "admin".to_string(),
            password_version: DEFAULT_PASSWORD_VERSION,
        }
    }

    fn failing_service(users: Vec<User>) -> IamService {
        let users = users
            .into_iter()
            .map(|user| (user.email.clone(), user))
            .collect();
        IamService::new(Arc::new(FailingUserStore { users })).expect("service")
    }

    #[tokio::test]
    async fn add_does_not_mutate_in_memory_on_save_error() {
        let service = failing_service(Vec::new());
        let result = service
            .add_user("user@example.com", "User One", "hash".to_string(), "admin")
            .await;
        assert!(result.is_err());
        assert!(service.list_users().expect("list users").is_empty());
    }

    #[tokio::test]
    async fn delete_does_not_mutate_in_memory_on_save_error() {
        let service = failing_service(vec![sample_user()]);
        assert!(service.delete_user("user@example.com").await.is_err());
        assert_eq!(service.list_users().expect("list users").len(), 1);
    }

    #[tokio::test]
    async fn duplicate_add_is_rejected() {
        let store = Arc::new(MemoryUserStore::from_users(vec![sample_user()]));
        let service = IamService::new(store).expect("service");
        let err = service
            .add_user("user@example.com", "Again", "hash".to_string(), "editor")
            .await
            .unwrap_err();
        assert_eq!(err, IamError::UserExists("user@example.com".to_string()));
    }

    #[tokio::test]
    async fn password_update_bumps_password_version() {
        let store = Arc::new(MemoryUserStore::from_users(vec![sample_user()]));
        let service = IamService::new(store).expect("service");

        service
            .update_user("user@example.com", None, Some("new-hash".to_string()), None)
            .await
            .expect("update user");
        let updated = service
            .get_user("user@example.com")
            .expect("get user")
            .expect("user");
        assert_eq!(updated.password_version, DEFAULT_PASSWORD_VERSION + 1);

        service
            .update_user("user@example.com", Some("Renamed"), None, Some("editor"))
            .await
            .expect("rename");
        let renamed = service
            .get_user("user@example.com")
            .expect("get user")
            .expect("user");
        assert_eq!(renamed.password_version, DEFAULT_PASSWORD_VERSION + 1);
        assert_eq!(renamed.role, "editor");
    }

    #[tokio::test]
    async fn delete_unknown_user_is_not_found() {
        let store = Arc::new(MemoryUserStore::from_users(Vec::new()));
        let service = IamService::new(store).expect("service");
        let err = service.delete_user("ghost@example.com").await.unwrap_err();
        assert!(matches!(err, IamError::UserNotFound(_)));
    }
}
