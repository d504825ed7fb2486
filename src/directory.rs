//! An in-memory user directory, token store and admin store.
//!
//! The fixture is loaded from a YAML file:
//!
//! ```yaml
//! realms: [realm1]
//! users:
//!   - { login: cornelius, realm: realm1, givenname: Cornelius, email: c@example.com }
//! tokens:
//!   - { serial: OATH123456, tokentype: hotp, realms: [realm1],
//!       owner: { login: cornelius, realm: realm1 } }
//! admins:
//!   - { username: testadmin, email: admin@example.com }
//! ```

use crate::core::{AdminAccount, AdminStore, DirectoryUser, Token, TokenStore, User, UserDirectory};
use anyhow::{Context, Result};
use itertools::Itertools;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct InMemoryDirectory {
    #[serde(default)]
    pub realms: Vec<String>,
    #[serde(default)]
    pub users: Vec<DirectoryUser>,
    #[serde(default)]
    pub tokens: Vec<Token>,
    #[serde(default)]
    pub admins: Vec<AdminAccount>,
}

impl InMemoryDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads a directory fixture from a YAML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read directory file: {}", path.display()))?;
        serde_yml::from_str(&content).with_context(|| {
            format!("Failed to parse YAML from directory file: {}", path.display())
        })
    }

    pub fn with_user(mut self, user: DirectoryUser) -> Self {
        self.users.push(user);
        self
    }

    pub fn with_token(mut self, token: Token) -> Self {
        self.tokens.push(token);
        self
    }

    pub fn with_admin(mut self, admin: AdminAccount) -> Self {
        self.admins.push(admin);
        self
    }
}

impl UserDirectory for InMemoryDirectory {
    /// The declared realms plus every realm a user lives in.
    fn realms(&self) -> Vec<String> {
        self.realms
            .iter()
            .cloned()
            .chain(self.users.iter().map(|u| u.user.realm.clone()))
            .filter(|r| !r.is_empty())
            .unique()
            .collect()
    }

    fn find_user(&self, login: &str, realm: &str) -> Option<DirectoryUser> {
        self.users
            .iter()
            .find(|u| u.user.login == login && u.user.realm == realm)
            .cloned()
    }

    fn list_users(&self, realm: &str) -> Vec<DirectoryUser> {
        self.users
            .iter()
            .filter(|u| u.user.realm == realm)
            .cloned()
            .collect()
    }
}

impl TokenStore for InMemoryDirectory {
    fn token_types(&self) -> Vec<String> {
        self.tokens
            .iter()
            .map(|t| t.tokentype.clone())
            .unique()
            .sorted()
            .collect()
    }

    fn token_by_serial(&self, serial: &str) -> Option<Token> {
        self.tokens.iter().find(|t| t.serial == serial).cloned()
    }

    fn tokens_of_user(&self, user: &User) -> Vec<Token> {
        self.tokens
            .iter()
            .filter(|t| t.owner.as_ref() == Some(user))
            .cloned()
            .collect()
    }
}

impl AdminStore for InMemoryDirectory {
    fn admin_usernames(&self) -> Vec<String> {
        self.admins.iter().map(|a| a.username.clone()).collect()
    }

    fn find_admin(&self, username: &str) -> Option<AdminAccount> {
        self.admins.iter().find(|a| a.username == username).cloned()
    }
}
