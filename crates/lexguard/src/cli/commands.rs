//! CLI command definitions.
//!
//! This module defines the structure of all CLI subcommands.

use std::path::PathBuf;

use clap::{Args, Subcommand};

/// Check command arguments.
#[derive(Debug, Args)]
pub struct CheckCommand {
    /// Text to classify
    #[arg(required_unless_present = "stdin")]
    pub text: Option<String>,

    /// Read one text per line from stdin instead
    #[arg(long, conflicts_with = "text")]
    pub stdin: bool,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Scan command arguments.
#[derive(Debug, Args)]
pub struct ScanCommand {
    /// Text to scan for dictionary sub-tokens
    pub text: String,

    /// Output as JSON
    #[arg(short, long)]
    pub json: bool,
}

/// Dictionary commands.
#[derive(Debug, Subcommand)]
pub enum DictCommand {
    /// Show build statistics for the dictionary
    Stats {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },
}

/// Configuration commands.
#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Show current configuration
    Show {
        /// Output as JSON
        #[arg(short, long)]
        json: bool,
    },

    /// Show the configuration file path
    Path,

    /// Validate configuration
    Validate {
        /// Path to configuration file to validate
        #[arg(short, long)]
        file: Option<PathBuf>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_check_command_debug() {
        let cmd = CheckCommand {
            text: Some("胖子".to_string()),
            stdin: false,
            json: true,
        };
        let debug_str = format!("{cmd:?}");
        assert!(debug_str.contains("胖子"));
        assert!(debug_str.contains("json"));
    }

    #[test]
    fn test_dict_command_debug() {
        let cmd = DictCommand::Stats { json: false };
        assert!(format!("{cmd:?}").contains("Stats"));
    }

    #[test]
    fn test_config_command_debug() {
        let cmd = ConfigCommand::Show { json: false };
        assert!(format!("{cmd:?}").contains("Show"));
    }
}
