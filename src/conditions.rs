//! The condition evaluator.
//!
//! A handler definition carries a set of optional conditions. Every condition
//! that is present must hold for the notification to fire; the checks run in
//! a fixed order and stop at the first one that fails.

use crate::core::{Role, Services, Token};
use crate::event::EventContext;
use regex::Regex;
use serde::{Deserialize, Deserializer, Serialize};
use thiserror::Error;
use tracing::debug;

/// The conditions of a handler definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct Conditions {
    /// The realm of the token owner.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub realm: Option<String>,
    /// Comma-separated list of token realms.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokenrealm: Option<String>,
    /// Comma-separated list of token types.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tokentype: Option<String>,
    /// The role of the authenticated session, `admin` or `user`. Other
    /// values are accepted but never match.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logged_in_user: Option<String>,
    /// The expected `result.value` of the response.
    #[serde(
        default,
        deserialize_with = "deserialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub result_value: Option<bool>,
    /// Whether the token must have reached its maximum failcounter.
    #[serde(
        default,
        deserialize_with = "deserialize_flag",
        skip_serializing_if = "Option::is_none"
    )]
    pub token_locked: Option<bool>,
    /// A regular expression the serial must match from its start.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub serial: Option<String>,
}

impl Conditions {
    /// Returns true if no condition is set.
    pub fn is_empty(&self) -> bool {
        *self == Conditions::default()
    }
}

/// Accepts a bool or the strings "True"/"False" in any case.
fn deserialize_flag<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum Flag {
        Bool(bool),
        Text(String),
    }

    match Option::<Flag>::deserialize(deserializer)? {
        None => Ok(None),
        Some(Flag::Bool(b)) => Ok(Some(b)),
        Some(Flag::Text(s)) => match s.trim().to_ascii_lowercase().as_str() {
            "true" => Ok(Some(true)),
            "false" => Ok(Some(false)),
            other => Err(serde::de::Error::custom(format!(
                "expected True or False, got '{}'",
                other
            ))),
        },
    }
}

#[derive(Error, Debug)]
pub enum ConditionError {
    #[error("invalid serial pattern '{pattern}': {source}")]
    InvalidSerialPattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Evaluates handler conditions against an event.
pub struct ConditionEvaluator<'a> {
    services: &'a Services,
}

impl<'a> ConditionEvaluator<'a> {
    pub fn new(services: &'a Services) -> Self {
        Self { services }
    }

    /// Checks the conditions of the context's handler definition.
    pub fn evaluate(&self, ctx: &EventContext<'_>) -> Result<bool, ConditionError> {
        let conditions = &ctx.handler_def.conditions;
        if conditions.is_empty() {
            return Ok(true);
        }

        let tokens = self.services.tokens.as_ref();
        let owner = ctx.token_owner(tokens);
        let serial = ctx.serial();
        let token = serial.and_then(|s| tokens.token_by_serial(s));

        if let Some(realm) = &conditions.realm {
            if owner.realm != *realm {
                debug!(owner = %owner, expected = %realm, "realm condition failed");
                return Ok(false);
            }
        }

        if let Some(role) = &conditions.logged_in_user {
            let actual = ctx.logged_in_user.map(|u| u.role).unwrap_or(Role::User);
            if actual.as_str() != role.as_str() {
                debug!(%actual, expected = %role, "logged_in_user condition failed");
                return Ok(false);
            }
        }

        if let Some(expected) = conditions.result_value {
            if ctx.response.result_value() != Some(expected) {
                debug!(expected, "result_value condition failed");
                return Ok(false);
            }
        }

        if let Some(expected) = conditions.token_locked {
            let locked = match serial {
                Some(_) => token.as_ref().map(Token::is_locked),
                None => Some(tokens.tokens_of_user(&owner).iter().any(Token::is_locked)),
            };
            // An unknown serial leaves the lock state undetermined.
            if let Some(locked) = locked {
                if locked != expected {
                    debug!(locked, expected, "token_locked condition failed");
                    return Ok(false);
                }
            }
        }

        if let Some(allowed) = &conditions.tokenrealm {
            if let Some(token) = token.as_ref().filter(|t| !t.realms.is_empty()) {
                if !token.realms.iter().any(|r| in_list(allowed, r)) {
                    debug!(realms = ?token.realms, %allowed, "tokenrealm condition failed");
                    return Ok(false);
                }
            }
        }

        if let Some(allowed) = &conditions.tokentype {
            if let Some(token) = &token {
                if !in_list(allowed, &token.tokentype) {
                    debug!(tokentype = %token.tokentype, %allowed, "tokentype condition failed");
                    return Ok(false);
                }
            }
        }

        if let Some(pattern) = &conditions.serial {
            if let Some(serial) = serial {
                if !serial_matches(pattern, serial)? {
                    debug!(serial, %pattern, "serial condition failed");
                    return Ok(false);
                }
            }
        }

        Ok(true)
    }
}

/// Checks whether `value` is one of the comma-separated entries of `list`.
fn in_list(list: &str, value: &str) -> bool {
    list.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .any(|entry| entry == value)
}

/// Matches a serial against a pattern anchored at the start of the serial.
fn serial_matches(pattern: &str, serial: &str) -> Result<bool, ConditionError> {
    let regex = Regex::new(&format!("^(?:{})", pattern)).map_err(|source| {
        ConditionError::InvalidSerialPattern {
            pattern: pattern.to_string(),
            source,
        }
    })?;
    Ok(regex.is_match(serial))
}
