//! Command-Line Interface (CLI) argument parsing.
//!
//! The arguments are parsed at startup and merged over the configuration
//! from the `usernotify.toml` file and environment variables.

use clap::Parser;
use figment::{
    value::{Dict, Map, Value},
    Error, Metadata, Profile, Provider,
};
use std::path::PathBuf;

/// Runs user notification handler definitions against a recorded event.
#[derive(Parser, Debug, Default, Clone)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the TOML configuration file.
    #[arg(short, long, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// JSON file describing the event to process.
    #[arg(short, long, value_name = "FILE")]
    pub event: Option<PathBuf>,

    /// YAML file with handler definitions. Replaces the configured files.
    #[arg(long = "handlers", value_name = "FILE")]
    pub handlers: Vec<PathBuf>,

    /// YAML directory fixture with users, tokens and admins.
    #[arg(long, value_name = "FILE")]
    pub directory: Option<PathBuf>,

    /// Print the actions and conditions of the handler as JSON and exit.
    #[arg(long)]
    pub describe: bool,

    /// The logging level, e.g. `debug`.
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,
}

impl Provider for Cli {
    fn metadata(&self) -> Metadata {
        Metadata::named("Command-Line Arguments")
    }

    fn data(&self) -> Result<Map<Profile, Dict>, Error> {
        let mut dict = Dict::new();

        if let Some(level) = &self.log_level {
            dict.insert("log_level".into(), Value::from(level.clone()));
        }

        if !self.handlers.is_empty() {
            let files: Vec<String> = self
                .handlers
                .iter()
                .map(|p| p.display().to_string())
                .collect();
            let mut handlers = Dict::new();
            handlers.insert("definition_files".into(), Value::from(files));
            dict.insert("handlers".into(), Value::from(handlers));
        }

        if let Some(fixture) = &self.directory {
            let mut directory = Dict::new();
            directory.insert(
                "fixture".into(),
                Value::from(fixture.display().to_string()),
            );
            dict.insert("directory".into(), Value::from(directory));
        }

        let mut map = Map::new();
        map.insert(Profile::Default, dict);
        Ok(map)
    }
}
