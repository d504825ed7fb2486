//! Configuration management for the usernotify tool
//!
//! This module defines the main `Config` struct and its sub-structs. It uses
//! the `figment` crate to layer defaults, a `usernotify.toml` file,
//! environment variables and command-line arguments.

use crate::cli::Cli;
use anyhow::Result;
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// The configuration file read when none is given on the command line.
pub const DEFAULT_CONFIG_FILE: &str = "usernotify.toml";

/// The main configuration struct for the application.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct Config {
    /// The logging level for the application.
    pub log_level: String,
    /// Where handler definitions come from.
    pub handlers: HandlersConfig,
    /// The directory fixture backing user, token and admin lookups.
    pub directory: DirectoryConfig,
    /// Delivery settings.
    pub notification: NotificationConfig,
}

/// Configuration for handler definitions.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct HandlersConfig {
    /// YAML files containing lists of handler definitions.
    pub definition_files: Vec<PathBuf>,
}

/// Configuration for the directory fixture.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
pub struct DirectoryConfig {
    /// Path to the YAML directory fixture. Without one, all lookups are empty.
    pub fixture: Option<PathBuf>,
}

/// Configuration for notification delivery.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct NotificationConfig {
    /// Realms offered as `admin realm` notification targets.
    pub admin_realms: Vec<String>,
    /// Identifiers of the configured mail servers.
    pub mail_servers: Vec<String>,
    /// Identifiers of the configured SMS gateways.
    pub sms_gateways: Vec<String>,
}

impl Config {
    /// Loads the configuration by layering defaults, the TOML file,
    /// environment variables and the command-line arguments.
    pub fn load(cli: &Cli) -> Result<Self> {
        let config_path = cli
            .config
            .clone()
            .unwrap_or_else(|| PathBuf::from(DEFAULT_CONFIG_FILE));

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(config_path))
            // e.g. USERNOTIFY_LOG_LEVEL=debug or USERNOTIFY_DIRECTORY__FIXTURE=dir.yml
            .merge(Env::prefixed("USERNOTIFY_").split("__"))
            .merge(cli.clone())
            .extract()?;
        Ok(config)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            handlers: HandlersConfig::default(),
            directory: DirectoryConfig::default(),
            notification: NotificationConfig {
                admin_realms: vec![],
                mail_servers: vec![],
                sms_gateways: vec![],
            },
        }
    }
}
