//! The event model consumed by event handlers.
//!
//! An [`Event`] captures what the host framework hands over after a request
//! completed: the request, the JSON response, the authenticated session and
//! the serial recorded by the audit log. A [`HandlerDefinition`] is the
//! configured reaction to an event. [`EventContext`] borrows both for a single
//! handler invocation.

use crate::conditions::Conditions;
use crate::core::{LoggedInUser, TokenStore, User};
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::borrow::Cow;
use std::collections::BTreeMap;
use std::fs;
use std::path::PathBuf;

/// The request that triggered the event.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct EventRequest {
    /// The request path, e.g. `/token/init`.
    #[serde(default)]
    pub path: String,
    /// The root URL of the server, used as link in notifications.
    #[serde(default)]
    pub url_root: String,
    /// All request parameters. Values keep their JSON type, e.g. `otplen: 6`.
    #[serde(default)]
    pub all_data: BTreeMap<String, Value>,
    /// The user the request was made for.
    #[serde(default)]
    pub user: User,
}

impl EventRequest {
    /// Returns a request parameter as text. Numbers and bools are rendered;
    /// empty strings, `null` and structured values count as absent.
    pub fn param(&self, key: &str) -> Option<Cow<'_, str>> {
        match self.all_data.get(key)? {
            Value::String(s) if !s.is_empty() => Some(Cow::Borrowed(s.as_str())),
            Value::Number(n) => Some(Cow::Owned(n.to_string())),
            Value::Bool(b) => Some(Cow::Owned(b.to_string())),
            _ => None,
        }
    }

    /// The `serial` parameter. Serials are always strings.
    pub fn serial(&self) -> Option<&str> {
        self.all_data
            .get("serial")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
    }
}

/// The JSON body of the response to the triggering request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(transparent)]
pub struct EventResponse {
    content: Value,
}

impl EventResponse {
    pub fn new(content: Value) -> Self {
        Self { content }
    }

    /// The boolean `result.value` of the response, if present.
    pub fn result_value(&self) -> Option<bool> {
        self.content.pointer("/result/value").and_then(Value::as_bool)
    }

    /// A non-empty string entry of the response's `detail` object.
    pub fn detail(&self, key: &str) -> Option<&str> {
        self.content
            .get("detail")
            .and_then(|detail| detail.get(key))
            .and_then(Value::as_str)
            .filter(|v| !v.is_empty())
    }
}

/// A completed request as handed over by the host framework.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
pub struct Event {
    /// The lifecycle event name, e.g. `token_init`.
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub request: EventRequest,
    #[serde(default)]
    pub response: EventResponse,
    /// The authenticated session, absent for unauthenticated requests.
    #[serde(default)]
    pub logged_in_user: Option<LoggedInUser>,
    /// The serial the audit log recorded for this request.
    #[serde(default)]
    pub audit_serial: Option<String>,
}

impl Event {
    /// Loads an event from a JSON file.
    pub fn load_from_file(path: &PathBuf) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read event file: {}", path.display()))?;
        serde_json::from_str(&content)
            .with_context(|| format!("Failed to parse JSON from event file: {}", path.display()))
    }

    /// Borrows this event together with a handler definition.
    pub fn context<'a>(&'a self, handler_def: &'a HandlerDefinition) -> EventContext<'a> {
        EventContext {
            request: &self.request,
            response: &self.response,
            logged_in_user: self.logged_in_user.as_ref(),
            audit_serial: self.audit_serial.as_deref(),
            handler_def,
        }
    }
}

/// Everything a handler sees during one invocation.
#[derive(Debug, Clone, Copy)]
pub struct EventContext<'a> {
    pub request: &'a EventRequest,
    pub response: &'a EventResponse,
    pub logged_in_user: Option<&'a LoggedInUser>,
    pub audit_serial: Option<&'a str>,
    pub handler_def: &'a HandlerDefinition,
}

impl<'a> EventContext<'a> {
    /// The serial the event is about: the request parameter, else the
    /// serial reported in the response details.
    pub fn serial(&self) -> Option<&'a str> {
        self.request
            .serial()
            .or_else(|| self.response.detail("serial"))
    }

    /// Determines the token owner.
    ///
    /// This is the request user. If the request carries no user but a
    /// serial, the owner of that token is used instead.
    pub fn token_owner(&self, tokens: &dyn TokenStore) -> User {
        let user = &self.request.user;
        if user.is_empty() {
            if let Some(serial) = self.request.serial() {
                return tokens.token_owner(serial).unwrap_or_default();
            }
        }
        user.clone()
    }
}

/// The options of a handler definition.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Default)]
pub struct HandlerOptions {
    /// The notify-to mode, see [`crate::recipient::NotifyMode`].
    #[serde(rename = "To", default, skip_serializing_if = "Option::is_none")]
    pub to: Option<String>,
    #[serde(
        rename = "To internal admin",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_internal_admin: Option<String>,
    #[serde(
        rename = "To admin realm",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub to_admin_realm: Option<String>,
    #[serde(rename = "To email", default, skip_serializing_if = "Option::is_none")]
    pub to_email: Option<String>,
    /// Identifier of the mail server configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub emailconfig: Option<String>,
    /// Identifier of the SMS gateway configuration.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub smsconfig: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// A configured event handler: which events, which action, with which
/// options and under which conditions.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HandlerDefinition {
    #[serde(default)]
    pub name: String,
    /// Event names this definition reacts to; `*` matches every event.
    #[serde(default = "all_events")]
    pub events: Vec<String>,
    #[serde(default)]
    pub action: String,
    #[serde(default)]
    pub options: HandlerOptions,
    #[serde(default)]
    pub conditions: Conditions,
}

fn all_events() -> Vec<String> {
    vec!["*".to_string()]
}

impl Default for HandlerDefinition {
    fn default() -> Self {
        Self {
            name: String::new(),
            events: all_events(),
            action: String::new(),
            options: HandlerOptions::default(),
            conditions: Conditions::default(),
        }
    }
}

impl HandlerDefinition {
    /// Returns true if this definition is bound to the given event.
    pub fn applies_to(&self, event: &str) -> bool {
        self.events
            .iter()
            .map(|e| e.trim())
            .any(|e| e == "*" || e == event)
    }

    /// Loads all handler definitions from the given YAML files.
    pub fn load_from_files(paths: &[PathBuf]) -> Result<Vec<HandlerDefinition>> {
        let mut definitions = Vec::new();
        for file_path in paths {
            let file_content = fs::read_to_string(file_path).with_context(|| {
                format!("Failed to read handler file: {}", file_path.display())
            })?;

            let defs: Vec<HandlerDefinition> =
                serde_yml::from_str(&file_content).with_context(|| {
                    format!(
                        "Failed to parse YAML from handler file: {}",
                        file_path.display()
                    )
                })?;
            definitions.extend(defs);
        }
        Ok(definitions)
    }
}
