//! Event handlers and the descriptors they publish to the host.
//!
//! The host application invokes an [`EventHandler`] after each lifecycle
//! event it is bound to: first [`EventHandler::check_condition`], then, if
//! that passed, [`EventHandler::do_action`] with the configured action.

pub mod user_notification;

use crate::conditions::ConditionError;
use crate::event::EventContext;
use crate::formatting::TemplateError;
use serde::Serialize;
use std::collections::BTreeMap;
use thiserror::Error;

pub use user_notification::UserNotificationHandler;

#[derive(Error, Debug)]
pub enum HandlerError {
    #[error("condition check failed: {0}")]
    Condition(#[from] ConditionError),

    #[error("failed to compose notification: {0}")]
    Template(#[from] TemplateError),
}

/// Describes one option of an action, for rendering configuration forms.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct OptionSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<&'static str>,
    /// The allowed values, if the option is a choice.
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<String>,
    /// The option is only shown if option `visibleIf` has `visibleValue`.
    #[serde(rename = "visibleIf", skip_serializing_if = "Option::is_none")]
    pub visible_if: Option<&'static str>,
    #[serde(rename = "visibleValue", skip_serializing_if = "Option::is_none")]
    pub visible_value: Option<&'static str>,
}

impl OptionSpec {
    pub fn new(kind: &'static str) -> Self {
        Self {
            kind,
            required: false,
            description: None,
            value: Vec::new(),
            visible_if: None,
            visible_value: None,
        }
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn description(mut self, description: &'static str) -> Self {
        self.description = Some(description);
        self
    }

    pub fn values(mut self, values: Vec<String>) -> Self {
        self.value = values;
        self
    }

    pub fn visible_if(mut self, option: &'static str, value: &'static str) -> Self {
        self.visible_if = Some(option);
        self.visible_value = Some(value);
        self
    }
}

/// Describes one condition a handler understands.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct ConditionSpec {
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub desc: &'static str,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub value: Vec<ConditionValue>,
}

/// An allowed condition value. `multi` conditions list `{"name": ...}`
/// entries, the others plain strings.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum ConditionValue {
    Plain(String),
    Named { name: String },
}

impl ConditionSpec {
    /// A single-valued condition, optionally restricted to `values`.
    pub fn single(kind: &'static str, desc: &'static str, values: Vec<String>) -> Self {
        Self {
            kind,
            desc,
            value: values.into_iter().map(ConditionValue::Plain).collect(),
        }
    }

    /// A condition that takes any subset of `names`.
    pub fn multi(desc: &'static str, names: Vec<String>) -> Self {
        Self {
            kind: "multi",
            desc,
            value: names
                .into_iter()
                .map(|name| ConditionValue::Named { name })
                .collect(),
        }
    }
}

/// Action name to option name to option description.
pub type ActionSpecs = BTreeMap<String, BTreeMap<String, OptionSpec>>;

/// Condition name to condition description.
pub type ConditionSpecs = BTreeMap<String, ConditionSpec>;

/// A plugin that reacts to lifecycle events of the host application.
pub trait EventHandler: Send + Sync {
    /// The name under which handler definitions refer to this handler.
    fn identifier(&self) -> &str;

    fn description(&self) -> &str;

    /// The events this handler can be bound to.
    fn events(&self) -> Vec<String> {
        vec!["*".to_string()]
    }

    /// The actions this handler can perform and their options.
    fn actions(&self) -> ActionSpecs;

    /// The conditions this handler can check.
    fn conditions(&self) -> ConditionSpecs;

    /// Returns true if the action of the handler definition should run.
    fn check_condition(&self, ctx: &EventContext<'_>) -> Result<bool, HandlerError>;

    /// Performs `action` and reports whether it succeeded.
    fn do_action(&self, action: &str, ctx: &EventContext<'_>) -> Result<bool, HandlerError>;
}
