//! `lexguard` - CLI for the lexguard classifier
//!
//! This binary loads a policy dictionary and classifies text against it.
//! `check` exits with status 1 for suspicious text and 2 for forbidden text.

#![warn(missing_debug_implementations)]
#![deny(unsafe_code)]

use std::process::ExitCode;

use clap::Parser;
use serde::Serialize;

use lexguard::cli::{CheckCommand, Cli, Command, ConfigCommand, DictCommand, ScanCommand};
use lexguard::{init_logging, Config, Error, Filter, Verdict};

fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    init_logging(cli.verbosity());

    let config = Config::load_from(cli.config.clone())?;

    match &cli.command {
        Command::Check(cmd) => Ok(handle_check(&open_filter(&cli, &config)?, cmd)?),
        Command::Scan(cmd) => {
            handle_scan(&open_filter(&cli, &config)?, cmd)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Dict(DictCommand::Stats { json }) => {
            handle_stats(&open_filter(&cli, &config)?, *json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Config(cmd) => {
            handle_config(&config, cmd)?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

fn open_filter(cli: &Cli, config: &Config) -> Result<Filter, Error> {
    let path = cli.dictionary_path(config).ok_or_else(|| {
        Error::config_validation("no dictionary configured (use --dict or dictionary.path)")
    })?;
    Filter::open(config, path)
}

fn handle_check(filter: &Filter, cmd: &CheckCommand) -> Result<ExitCode, Error> {
    let mut worst = 0u8;

    if cmd.stdin {
        filter.classify_lines(std::io::stdin().lock(), |text, verdict| {
            print_verdict(text, verdict, cmd.json)?;
            worst = worst.max(exit_status(verdict));
            Ok(())
        })?;
    } else if let Some(text) = &cmd.text {
        let verdict = filter.classify(text)?;
        print_verdict(text, &verdict, cmd.json)?;
        worst = exit_status(&verdict);
    }

    Ok(ExitCode::from(worst))
}

fn exit_status(verdict: &Verdict) -> u8 {
    if verdict.forbidding {
        2
    } else {
        u8::from(verdict.suspicious)
    }
}

fn print_verdict(text: &str, verdict: &Verdict, json: bool) -> Result<(), Error> {
    if json {
        let output = serde_json::json!({
            "text": text,
            "verdict": verdict,
        });
        println!("{}", serde_json::to_string(&output)?);
        return Ok(());
    }

    let label = if verdict.forbidding {
        "FORBID"
    } else if verdict.suspicious {
        "SUSPICIOUS"
    } else {
        "CLEAN"
    };
    println!("{label}\t{text}");
    for hit in &verdict.hits {
        println!(
            "  word: {}  key: {}  policy: {}",
            hit.word, hit.policy.key, hit.policy.policy
        );
    }
    Ok(())
}

/// One raw sub-token hit reported by `scan`.
#[derive(Debug, Serialize)]
struct ScanRow {
    token: String,
    end: usize,
}

fn handle_scan(filter: &Filter, cmd: &ScanCommand) -> Result<(), Error> {
    let automaton = filter.dictionary().automaton();
    let matches = automaton.find(filter.pool(), cmd.text.chars())?;

    let mut rows = Vec::with_capacity(matches.len());
    for raw in matches.iter() {
        let (symbols, _) = automaton.pattern(raw.pattern)?;
        rows.push(ScanRow {
            token: symbols.iter().collect(),
            end: raw.end,
        });
    }
    let truncated = matches.is_truncated();
    matches.release();

    if cmd.json {
        let output = serde_json::json!({
            "matches": rows,
            "truncated": truncated,
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        for row in &rows {
            println!("{:>6}  {}", row.end, row.token);
        }
        if truncated {
            println!("[truncated at {} matches]", filter.pool().capacity());
        }
    }
    Ok(())
}

fn handle_stats(filter: &Filter, json: bool) -> Result<(), Error> {
    let dictionary = filter.dictionary();
    let report = dictionary.report();

    if json {
        let output = serde_json::json!({
            "digest": dictionary.digest(),
            "report": report,
            "patterns": dictionary.automaton().pattern_count(),
            "nodes": dictionary.automaton().node_count(),
        });
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("Dictionary");
        println!("==========");
        println!("  Digest:          {}", dictionary.digest());
        println!("  Records:         {}", report.records);
        println!("  Skipped lines:   {}", report.skipped.len());
        println!("  Neutralised:     {}", report.neutralised);
        println!("  Exact keys:      {}", report.exact);
        println!("  Compound keys:   {}", report.compound);
        println!("  Sub-tokens:      {}", report.tokens);
        println!("  Trie nodes:      {}", dictionary.automaton().node_count());
    }
    Ok(())
}

fn handle_config(config: &Config, cmd: &ConfigCommand) -> Result<(), Error> {
    match cmd {
        ConfigCommand::Show { json } => {
            if *json {
                println!("{}", serde_json::to_string_pretty(config)?);
            } else {
                println!("Current Configuration");
                println!("=====================");
                println!();
                let dictionary = &config.dictionary;
                println!("[Dictionary]");
                match &dictionary.path {
                    Some(path) => println!("  Path:             {}", path.display()),
                    None => println!("  Path:             (not set)"),
                }
                println!("  Word separator:   {:?}", dictionary.word_separator);
                println!("  Field separator:  {:?}", dictionary.field_separator);
                println!("  Record separator: {:?}", dictionary.record_separator);
                println!("  Strict:           {}", dictionary.strict);
                println!();
                println!("[Matcher]");
                println!("  Buffer capacity:  {}", config.matcher.buffer_capacity);
                println!("  Max idle buffers: {}", config.matcher.max_idle_buffers);
                println!();
                println!("[Classify]");
                println!("  Report:           {:?}", config.classify.report);
            }
        }
        ConfigCommand::Path => {
            println!("{}", Config::default_config_path().display());
        }
        ConfigCommand::Validate { file } => {
            let path = file.clone().unwrap_or_else(Config::default_config_path);
            println!("Validating configuration: {}", path.display());
            match Config::load_from(Some(path)) {
                Ok(_) => println!("Configuration is valid."),
                Err(e) => println!("Configuration error: {e}"),
            }
        }
    }
    Ok(())
}
