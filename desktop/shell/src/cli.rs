use std::path::PathBuf;

use clap::{Parser, Subcommand};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "brief-desk")]
#[command(about = "Desktop host for the Brief Desk backend")]
#[command(version)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Data directory (defaults to BD_DATA_DIR, then the platform data dir)
    #[arg(long, global = true)]
    pub data_dir: Option<PathBuf>,

    /// Use the packaged layout regardless of BD_ENV
    #[arg(long, global = true)]
    pub packaged: bool,

    /// Pretty-print JSON output
    #[arg(long, global = true)]
    pub pretty: bool,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum Commands {
    /// Start the backend and run until an exit signal (default)
    Run,

    /// Print the endpoint published by the running instance
    Endpoint,

    /// Inspect or edit the persistent settings store
    Store {
        #[command(subcommand)]
        action: StoreCommands,
    },

    /// Print the port the backend wrote to the temp directory
    PortFile,

    /// Print resolved locations and build mode
    Paths,
}

#[derive(Subcommand, Debug, Clone, PartialEq)]
pub enum StoreCommands {
    /// Print the value stored under a key
    Get { key: String },

    /// Store a value; input that is not valid JSON is stored as a string
    Set { key: String, value: String },

    /// Remove a key
    Delete { key: String },
}

/// `true` stays a boolean, `hello` becomes the string "hello".
pub fn parse_value(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_owned()))
}
