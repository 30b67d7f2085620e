//! Command-line interface for lexguard.
//!
//! This module provides the CLI structure for the `lexguard` binary.

mod commands;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::config::Config;
use crate::logging::Verbosity;

pub use commands::{CheckCommand, ConfigCommand, DictCommand, ScanCommand};

/// lexguard - Classify text against a sensitive-word dictionary
///
/// Dictionary entries may require an exact full-text match, a single
/// substring, or several substrings that must all occur in the text.
#[derive(Debug, Parser)]
#[command(name = "lexguard")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Path to custom configuration file
    #[arg(short, long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// Dictionary file (overrides the configured path)
    #[arg(short, long, global = true, value_name = "FILE")]
    pub dict: Option<PathBuf>,

    /// Increase verbosity (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true)]
    pub quiet: bool,

    /// The command to execute
    #[command(subcommand)]
    pub command: Command,
}

/// Available commands.
#[derive(Debug, Subcommand)]
pub enum Command {
    /// Classify text against the dictionary
    Check(CheckCommand),

    /// Show the raw sub-token matches for a text
    Scan(ScanCommand),

    /// Inspect the dictionary
    #[command(subcommand)]
    Dict(DictCommand),

    /// View or validate configuration
    #[command(subcommand)]
    Config(ConfigCommand),
}

impl Cli {
    /// Get the verbosity level based on flags.
    #[must_use]
    pub fn verbosity(&self) -> Verbosity {
        if self.quiet {
            Verbosity::Quiet
        } else {
            match self.verbose {
                0 => Verbosity::Normal,
                1 => Verbosity::Verbose,
                _ => Verbosity::Trace,
            }
        }
    }

    /// The dictionary to load: `--dict` if given, else the configured path.
    #[must_use]
    pub fn dictionary_path(&self, config: &Config) -> Option<PathBuf> {
        self.dict
            .clone()
            .or_else(|| config.dictionary.path.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_cli_name() {
        assert_eq!(Cli::command().get_name(), "lexguard");
    }

    #[test]
    fn test_cli_verify() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_verbosity_levels() {
        let cases = [
            (Some("-q"), Verbosity::Quiet),
            (None, Verbosity::Normal),
            (Some("-v"), Verbosity::Verbose),
            (Some("-vv"), Verbosity::Trace),
        ];
        for (flag, expected) in cases {
            let mut args = vec!["lexguard"];
            args.extend(flag);
            args.extend(["config", "path"]);
            assert_eq!(parse(&args).verbosity(), expected);
        }
    }

    #[test]
    fn test_parse_check_text() {
        let cli = parse(&["lexguard", "check", "这个胖子"]);
        match cli.command {
            Command::Check(cmd) => {
                assert_eq!(cmd.text.as_deref(), Some("这个胖子"));
                assert!(!cmd.stdin);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_check_stdin() {
        let cli = parse(&["lexguard", "check", "--stdin", "--json"]);
        match cli.command {
            Command::Check(cmd) => {
                assert!(cmd.stdin);
                assert!(cmd.json);
                assert!(cmd.text.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_check_requires_text_or_stdin() {
        assert!(Cli::try_parse_from(["lexguard", "check"]).is_err());
        let both = Cli::try_parse_from(["lexguard", "check", "text", "--stdin"]);
        assert!(both.is_err());
    }

    #[test]
    fn test_parse_scan() {
        let cli = parse(&["lexguard", "scan", "ushers"]);
        assert!(matches!(cli.command, Command::Scan(_)));
    }

    #[test]
    fn test_parse_dict_stats() {
        let cli = parse(&["lexguard", "dict", "stats", "--json"]);
        assert!(matches!(
            cli.command,
            Command::Dict(DictCommand::Stats { json: true })
        ));
    }

    #[test]
    fn test_dictionary_path_prefers_flag() {
        let mut config = Config::default();
        config.dictionary.path = Some(PathBuf::from("/etc/lexguard/words.tsv"));

        let cli = parse(&["lexguard", "--dict", "/tmp/words.tsv", "dict", "stats"]);
        assert_eq!(
            cli.dictionary_path(&config),
            Some(PathBuf::from("/tmp/words.tsv"))
        );

        let cli = parse(&["lexguard", "dict", "stats"]);
        assert_eq!(
            cli.dictionary_path(&config),
            Some(PathBuf::from("/etc/lexguard/words.tsv"))
        );

        assert_eq!(cli.dictionary_path(&Config::default()), None);
    }

    #[test]
    fn test_parse_with_config() {
        let cli = parse(&["lexguard", "-c", "/custom/config.toml", "config", "show"]);
        assert_eq!(cli.config, Some(PathBuf::from("/custom/config.toml")));
    }
}
