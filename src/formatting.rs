// src/formatting.rs

use std::collections::{BTreeMap, HashMap};
use strfmt::{strfmt, FmtError};
use thiserror::Error;

/// The body used when a handler definition does not configure one.
pub const DEFAULT_BODY: &str = "
Hello {user},

the administrator {admin}@{realm} performed the action
{action} on your token {serial}.

To check your tokens you may login to the Web UI:
{url}
";

/// The subject used when a handler definition does not configure one.
pub const DEFAULT_SUBJECT: &str = "An action was performed on your token.";

/// The placeholders a template may reference.
pub const PLACEHOLDERS: [&str; 14] = [
    "admin",
    "realm",
    "action",
    "serial",
    "url",
    "user",
    "surname",
    "givenname",
    "username",
    "userrealm",
    "tokentype",
    "registrationcode",
    "recipient_givenname",
    "recipient_surname",
];

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown placeholder in notification template: {0}")]
    UnknownPlaceholder(String),

    #[error("malformed notification template: {0}")]
    Malformed(String),
}

impl From<FmtError> for TemplateError {
    fn from(err: FmtError) -> Self {
        match err {
            FmtError::KeyError(msg) => TemplateError::UnknownPlaceholder(msg),
            FmtError::Invalid(msg) | FmtError::TypeError(msg) => TemplateError::Malformed(msg),
        }
    }
}

/// The values available to a notification template.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MessageContext {
    values: BTreeMap<&'static str, String>,
}

impl MessageContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets a placeholder value. Names outside [`PLACEHOLDERS`] are ignored;
    /// `None` leaves the placeholder empty.
    pub fn set(mut self, name: &str, value: Option<impl Into<String>>) -> Self {
        if let Some(key) = PLACEHOLDERS.iter().find(|p| **p == name) {
            match value {
                Some(v) => {
                    self.values.insert(*key, v.into());
                }
                None => {
                    self.values.remove(*key);
                }
            }
        }
        self
    }

    /// Renders a `str.format` style template.
    ///
    /// Supports `{name}`, format specs such as `{user:>10}`, the conversions
    /// `{name!s}` and `{name!r}`, and `{{`/`}}` for literal braces. Absent
    /// values render empty.
    pub fn render(&self, template: &str) -> Result<String, TemplateError> {
        let mut vars = HashMap::with_capacity(PLACEHOLDERS.len() * 3);
        for name in PLACEHOLDERS {
            let value = self.values.get(name).cloned().unwrap_or_default();
            vars.insert(format!("{}!r", name), format!("'{}'", value));
            vars.insert(format!("{}!s", name), value.clone());
            vars.insert(name.to_string(), value);
        }
        Ok(strfmt(template, &vars)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn context() -> MessageContext {
        MessageContext::new()
            .set("user", Some("Cornelius"))
            .set("admin", Some("admin"))
            .set("realm", None::<String>)
            .set("action", Some("/token/init"))
            .set("serial", Some("OATH123456"))
            .set("url", Some("https://pi.example.com/"))
    }

    #[test]
    fn test_render_default_body() {
        let body = context().render(DEFAULT_BODY).unwrap();
        assert!(body.contains("Hello Cornelius,"));
        assert!(body.contains("the administrator admin@ performed the action"));
        assert!(body.contains("/token/init on your token OATH123456."));
        assert!(body.contains("https://pi.example.com/"));
    }

    #[test]
    fn test_absent_values_render_empty() {
        let body = context().render("code: [{registrationcode}]").unwrap();
        assert_eq!(body, "code: []");
    }

    #[test]
    fn test_escaped_braces() {
        let body = context().render("{{literal}} {serial}").unwrap();
        assert_eq!(body, "{literal} OATH123456");
    }

    #[test]
    fn test_conversions_and_format_specs() {
        let ctx = context();
        assert_eq!(ctx.render("{serial!s}").unwrap(), "OATH123456");
        assert_eq!(ctx.render("{user!r}").unwrap(), "'Cornelius'");
        assert_eq!(ctx.render("[{user:>10}]").unwrap(), "[ Cornelius]");
        assert_eq!(ctx.render("[{user:<10}]").unwrap(), "[Cornelius ]");
    }

    #[test]
    fn test_unknown_placeholder_is_an_error() {
        let err = context().render("Hello {nickname}").unwrap_err();
        assert!(matches!(err, TemplateError::UnknownPlaceholder(ref msg) if msg.contains("nickname")));
    }

    #[test]
    fn test_unbalanced_braces() {
        assert!(matches!(
            context().render("Hello {user"),
            Err(TemplateError::Malformed(_))
        ));
        assert!(matches!(
            context().render("Hello } there"),
            Err(TemplateError::Malformed(_))
        ));
    }

    #[test]
    fn test_set_ignores_unknown_names() {
        let ctx = MessageContext::new().set("nickname", Some("x"));
        assert_eq!(ctx, MessageContext::new());
        assert_eq!(ctx.render("[{serial}]").unwrap(), "[]");
    }
}
