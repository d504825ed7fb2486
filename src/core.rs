//! Core domain types and collaborator traits for the user notification handler
//!
//! This module defines the data structures the handler reads from its
//! collaborators (user directory, token store, admin accounts) and the trait
//! contracts those collaborators implement. The handler never owns any of
//! this data; it only looks it up per event.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// The failcounter limit applied to tokens that do not carry their own.
pub const DEFAULT_MAX_FAILCOUNT: u32 = 10;

/// A user reference: a login within a realm.
///
/// An empty login means "no user", e.g. an unauthenticated request or a
/// token without an owner.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct User {
    #[serde(default)]
    pub login: String,
    #[serde(default)]
    pub realm: String,
}

impl User {
    pub fn new(login: impl Into<String>, realm: impl Into<String>) -> Self {
        Self {
            login: login.into(),
            realm: realm.into(),
        }
    }

    /// Returns true if this reference does not name a user.
    pub fn is_empty(&self) -> bool {
        self.login.is_empty()
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            write!(f, "<empty user>")
        } else {
            write!(f, "{}@{}", self.login, self.realm)
        }
    }
}

/// Profile attributes the directory exposes for a user.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct UserAttributes {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub givenname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

/// A user as found in the directory, with its profile attributes.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct DirectoryUser {
    #[serde(flatten)]
    pub user: User,
    #[serde(flatten)]
    pub attributes: UserAttributes,
}

/// An authentication token as seen by the handler.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Token {
    pub serial: String,
    pub tokentype: String,
    /// Realms the token is assigned to.
    #[serde(default)]
    pub realms: Vec<String>,
    #[serde(default)]
    pub owner: Option<User>,
    #[serde(default)]
    pub failcount: u32,
    #[serde(default = "default_max_failcount")]
    pub max_failcount: u32,
}

fn default_max_failcount() -> u32 {
    DEFAULT_MAX_FAILCOUNT
}

impl Token {
    pub fn new(serial: impl Into<String>, tokentype: impl Into<String>) -> Self {
        Self {
            serial: serial.into(),
            tokentype: tokentype.into(),
            realms: Vec::new(),
            owner: None,
            failcount: 0,
            max_failcount: DEFAULT_MAX_FAILCOUNT,
        }
    }

    /// A token is locked once its failcounter reaches the maximum.
    pub fn is_locked(&self) -> bool {
        self.failcount >= self.max_failcount
    }
}

/// An internal (database) administrator account.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AdminAccount {
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
}

/// The role of an authenticated session.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The authenticated session that triggered the event.
///
/// Internal administrators carry an empty realm.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct LoggedInUser {
    pub user: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub realm: String,
}

// =============================================================================
// Collaborator Traits
// =============================================================================

/// Read access to the user directory.
pub trait UserDirectory: Send + Sync {
    /// Names of all configured realms.
    fn realms(&self) -> Vec<String>;

    /// Looks up a single user by login and realm.
    fn find_user(&self, login: &str, realm: &str) -> Option<DirectoryUser>;

    /// Lists all users of a realm.
    fn list_users(&self, realm: &str) -> Vec<DirectoryUser>;
}

/// Read access to the token database.
pub trait TokenStore: Send + Sync {
    /// All token types known to the server.
    fn token_types(&self) -> Vec<String>;

    fn token_by_serial(&self, serial: &str) -> Option<Token>;

    /// All tokens assigned to the given user.
    fn tokens_of_user(&self, user: &User) -> Vec<Token>;

    /// The owner of the token with the given serial, if it has one.
    fn token_owner(&self, serial: &str) -> Option<User> {
        self.token_by_serial(serial).and_then(|token| token.owner)
    }
}

/// Read access to the internal administrator accounts.
pub trait AdminStore: Send + Sync {
    fn admin_usernames(&self) -> Vec<String>;

    fn find_admin(&self, username: &str) -> Option<AdminAccount>;
}

/// The collaborators the handler consults while processing an event.
#[derive(Clone)]
pub struct Services {
    pub users: Arc<dyn UserDirectory>,
    pub tokens: Arc<dyn TokenStore>,
    pub admins: Arc<dyn AdminStore>,
}

impl Services {
    pub fn new(
        users: Arc<dyn UserDirectory>,
        tokens: Arc<dyn TokenStore>,
        admins: Arc<dyn AdminStore>,
    ) -> Self {
        Self {
            users,
            tokens,
            admins,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_lock_state() {
        let mut token = Token::new("OATH0001", "hotp");
        assert!(!token.is_locked());

        token.failcount = 9;
        assert!(!token.is_locked());

        token.failcount = 10;
        assert!(token.is_locked());

        token.max_failcount = 20;
        assert!(!token.is_locked());
    }

    #[test]
    fn test_user_display() {
        assert_eq!(User::new("cornelius", "realm1").to_string(), "cornelius@realm1");
        assert_eq!(User::default().to_string(), "<empty user>");
        assert!(User::new("", "realm1").is_empty());
    }

    #[test]
    fn test_directory_user_deserializes_flat() {
        let yaml = r#"
login: hans
realm: realm1
givenname: Hans
email: hans@example.com
"#;
        let user: DirectoryUser = serde_yml::from_str(yaml).unwrap();
        assert_eq!(user.user, User::new("hans", "realm1"));
        assert_eq!(user.attributes.givenname.as_deref(), Some("Hans"));
        assert_eq!(user.attributes.email.as_deref(), Some("hans@example.com"));
        assert_eq!(user.attributes.mobile, None);
    }

    #[test]
    fn test_role_defaults_to_user() {
        let session: LoggedInUser = serde_json::from_str(r#"{"user": "hans"}"#).unwrap();
        assert_eq!(session.role, Role::User);
        assert_eq!(session.realm, "");
    }
}
