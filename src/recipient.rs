//! Recipient resolution.
//!
//! The `To` option of a handler definition selects who receives the
//! notification. Each [`NotifyMode`] has its own lookup strategy.

use crate::core::{DirectoryUser, LoggedInUser, Services, User};
use crate::event::HandlerOptions;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use tracing::debug;

/// Who should be notified.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
pub enum NotifyMode {
    #[default]
    #[serde(rename = "tokenowner")]
    TokenOwner,
    #[serde(rename = "logged_in_user")]
    LoggedInUser,
    #[serde(rename = "internal admin")]
    InternalAdmin,
    #[serde(rename = "admin realm")]
    AdminRealm,
    #[serde(rename = "email")]
    Email,
}

impl NotifyMode {
    pub const ALL: [NotifyMode; 5] = [
        NotifyMode::TokenOwner,
        NotifyMode::LoggedInUser,
        NotifyMode::InternalAdmin,
        NotifyMode::AdminRealm,
        NotifyMode::Email,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            NotifyMode::TokenOwner => "tokenowner",
            NotifyMode::LoggedInUser => "logged_in_user",
            NotifyMode::InternalAdmin => "internal admin",
            NotifyMode::AdminRealm => "admin realm",
            NotifyMode::Email => "email",
        }
    }

    /// The name of the option that parameterizes this mode, e.g.
    /// `To internal admin`.
    pub fn option_key(&self) -> String {
        format!("To {}", self.as_str())
    }
}

impl fmt::Display for NotifyMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for NotifyMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NotifyMode::ALL
            .into_iter()
            .find(|mode| mode.as_str() == s)
            .ok_or_else(|| format!("unknown notification target '{}'", s))
    }
}

/// The resolved receiver of a notification.
#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
pub struct Recipient {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub givenname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub userrealm: Option<String>,
    /// Addresses for mail delivery; several for realm-wide notifications.
    pub email: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub mobile: Option<String>,
}

impl Recipient {
    fn from_directory_user(user: DirectoryUser) -> Self {
        let DirectoryUser { user, attributes } = user;
        Self {
            givenname: attributes.givenname,
            surname: attributes.surname,
            username: Some(user.login),
            userrealm: Some(user.realm),
            email: attributes.email.into_iter().collect(),
            mobile: attributes.mobile,
        }
    }
}

impl fmt::Display for Recipient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self
            .username
            .as_deref()
            .or(self.givenname.as_deref())
            .unwrap_or("<unnamed>");
        write!(f, "{} <{}>", name, self.email.join(", "))
    }
}

/// Resolves the recipient for a notify-to mode.
pub struct RecipientResolver<'a> {
    services: &'a Services,
}

impl<'a> RecipientResolver<'a> {
    pub fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Returns `None` if no recipient could be determined for the mode.
    pub fn resolve(
        &self,
        mode: NotifyMode,
        options: &HandlerOptions,
        tokenowner: &User,
        logged_in_user: Option<&LoggedInUser>,
    ) -> Option<Recipient> {
        match mode {
            NotifyMode::TokenOwner => self.token_owner(tokenowner),
            NotifyMode::InternalAdmin => {
                let username = options.to_internal_admin.as_deref().unwrap_or_default();
                Some(self.internal_admin(username))
            }
            NotifyMode::AdminRealm => {
                let realm = options.to_admin_realm.as_deref().unwrap_or_default();
                Some(self.admin_realm(realm))
            }
            NotifyMode::LoggedInUser => logged_in_user.and_then(|u| self.logged_in_user(u)),
            NotifyMode::Email => Some(Recipient {
                email: split_addresses(options.to_email.as_deref().unwrap_or_default()),
                ..Default::default()
            }),
        }
    }

    fn token_owner(&self, owner: &User) -> Option<Recipient> {
        if owner.is_empty() {
            return None;
        }
        let record = self
            .services
            .users
            .find_user(&owner.login, &owner.realm)
            .unwrap_or_else(|| {
                debug!(%owner, "token owner not found in directory");
                DirectoryUser {
                    user: owner.clone(),
                    ..Default::default()
                }
            });
        Some(Recipient::from_directory_user(record))
    }

    /// A missing admin account still yields a recipient, without address.
    fn internal_admin(&self, username: &str) -> Recipient {
        let email = self
            .services
            .admins
            .find_admin(username)
            .and_then(|admin| admin.email);
        Recipient {
            givenname: Some(username.to_string()),
            email: email.into_iter().collect(),
            ..Default::default()
        }
    }

    fn admin_realm(&self, realm: &str) -> Recipient {
        let email = self
            .services
            .users
            .list_users(realm)
            .into_iter()
            .filter_map(|u| u.attributes.email)
            .filter(|e| !e.is_empty())
            .collect();
        Recipient {
            givenname: Some(format!("admin of realm {}", realm)),
            email,
            ..Default::default()
        }
    }

    fn logged_in_user(&self, session: &LoggedInUser) -> Option<Recipient> {
        if session.user.is_empty() {
            return None;
        }
        if session.realm.is_empty() {
            // Internal admins have no realm.
            let admin = self.services.admins.find_admin(&session.user)?;
            return Some(Recipient {
                givenname: Some(session.user.clone()),
                email: admin.email.into_iter().collect(),
                ..Default::default()
            });
        }
        let user = self
            .services
            .users
            .find_user(&session.user, &session.realm)?;
        let mut recipient = Recipient::from_directory_user(user);
        recipient.username = None;
        recipient.userrealm = None;
        Some(recipient)
    }
}

/// Splits a comma-separated address list.
pub fn split_addresses(list: &str) -> Vec<String> {
    list.split(',')
        .map(str::trim)
        .filter(|a| !a.is_empty())
        .map(String::from)
        .collect()
}
