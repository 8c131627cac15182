//! User account persistence.
//!
//! Stored as a bare array in `users.json`. Usernames are unique and the
//! account named `admin` cannot be deleted.

use std::collections::HashSet;
use std::path::PathBuf;

use super::document::JsonDocument;
use super::types::{User, UserUpdate};
use crate::error::{DashboardError, Result};

/// Account that can never be removed.
pub const PROTECTED_USERNAME: &str = "admin";

pub struct UserStore {
    document: JsonDocument<Vec<User>>,
}

impl UserStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            document: JsonDocument::new(path),
        }
    }

    pub fn list(&self) -> Vec<User> {
        self.document.load_or_default()
    }

    /// Replace every account at once.
    pub fn replace_all(&self, users: Vec<User>) -> Result<()> {
        validate_unique(&users)?;
        for user in &users {
            validate_username(&user.username)?;
        }
        self.document.save(&users)?;
        log::info!("Replaced user list ({} accounts)", users.len());
        Ok(())
    }

    pub fn create(&self, user: User) -> Result<User> {
        validate_username(&user.username)?;
        self.document.update(|users| {
            if find_user(users, &user.username).is_some() {
                return Err(DashboardError::conflict(format!(
                    "User already exists: {}",
                    user.username
                )));
            }
            users.push(user.clone());
            log::info!("Created user {}", user.username);
            Ok(user)
        })
    }

    /// Apply a partial update. Renaming onto an existing username is a conflict.
    pub fn update(&self, username: &str, changes: UserUpdate) -> Result<User> {
        if let Some(new_name) = changes.username.as_deref() {
            validate_username(new_name)?;
        }

        self.document.update(|users| {
            let index = users
                .iter()
                .position(|u| u.username == username)
                .ok_or_else(|| DashboardError::not_found(format!("User not found: {username}")))?;

            if let Some(new_name) = changes.username.as_deref() {
                if new_name != username && find_user(users, new_name).is_some() {
                    return Err(DashboardError::conflict(format!(
                        "User already exists: {new_name}"
                    )));
                }
            }

            let user = &mut users[index];
            if let Some(new_name) = changes.username {
                user.username = new_name;
            }
            if let Some(password) = changes.password {
                user.password = password;
            }
            if let Some(role) = changes.role {
                user.role = role;
            }
            log::info!("Updated user {}", username);
            Ok(user.clone())
        })
    }

    pub fn delete(&self, username: &str) -> Result<()> {
        if username == PROTECTED_USERNAME {
            return Err(DashboardError::Forbidden(
                "The admin account cannot be deleted".to_string(),
            ));
        }

        self.document.update(|users| {
            let before = users.len();
            users.retain(|u| u.username != username);
            if users.len() == before {
                return Err(DashboardError::not_found(format!("User not found: {username}")));
            }
            log::info!("Deleted user {}", username);
            Ok(())
        })
    }
}

fn find_user<'a>(users: &'a [User], username: &str) -> Option<&'a User> {
    users.iter().find(|u| u.username == username)
}

fn validate_username(username: &str) -> Result<()> {
    if username.trim().is_empty() {
        return Err(DashboardError::validation("username must not be empty"));
    }
    Ok(())
}

fn validate_unique(users: &[User]) -> Result<()> {
    let mut seen = HashSet::new();
    for user in users {
        if !seen.insert(user.username.as_str()) {
            return Err(DashboardError::conflict(format!(
                "Duplicate username: {}",
                user.username
            )));
        }
    }
    Ok(())
}

// ============================================================================
// TESTS
// ============================================================================
