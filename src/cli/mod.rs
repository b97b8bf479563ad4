//! Command-line interface.

mod commands;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::domain::Role;

/// Assetdesk - IT asset inventory with directory sync and audit trail
#[derive(Parser)]
#[command(name = "assetdesk")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the web server (default)
    #[command(alias = "web")]
    Serve,

    /// Write a default config file
    #[command(alias = "--init")]
    Init {
        /// Target file
        #[arg(default_value = "config.toml")]
        path: PathBuf,
    },

    /// Pull users from the configured directory once
    #[command(alias = "sync")]
    SyncDirectory,

    /// Create a local login account
    CreateUser {
        email: String,
        /// viewer, manager or admin
        #[arg(long, default_value = "viewer", value_parser = parse_role)]
        role: Role,
        /// Display name (defaults to the email)
        #[arg(long)]
        name: Option<String>,
        /// Initial password; a random one is generated and printed when omitted
        #[arg(long)]
        password: Option<String>,
    },

    /// Print inventory totals
    Stats,
}

fn parse_role(value: &str) -> Result<Role, String> {
    value.parse()
}

pub use commands::*;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_create_user() {
        let cli = Cli::try_parse_from([
            "assetdesk",
            "create-user",
            "ops@example.com",
            "--role",
            "manager",
        ])
        .unwrap();

        match cli.command {
            Some(Commands::CreateUser {
                email,
                role,
                password,
                ..
            }) => {
                assert_eq!(email, "ops@example.com");
                assert_eq!(role, Role::Manager);
                assert!(password.is_none());
            }
            _ => panic!("expected create-user"),
        }
    }

    #[test]
    fn test_no_subcommand_defaults_to_none() {
        let cli = Cli::try_parse_from(["assetdesk"]).unwrap();
        assert!(cli.command.is_none());
    }
}
