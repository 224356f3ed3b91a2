//! Command-line interface for yamdb.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// yamdb - media review catalog API
#[derive(Parser)]
#[command(name = "yamdb")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Config file to use instead of the default search locations
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP API (default)
    Serve,

    /// Create an active admin account with a password
    CreateAdmin {
        #[arg(long)]
        email: String,
        #[arg(long)]
        username: String,
        #[arg(long)]
        password: String,
    },

    /// Validate the effective configuration and print it
    CheckConfig,
}

pub use commands::*;
