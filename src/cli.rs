//! Command-line entrypoint for tracerr.
//!
//! Parses the command and flags, resolves the config, and dispatches every
//! input file to the analysis pipeline.

use crate::analysis_pipeline::{FileOutcome, collect_input_files, trace_files};
use crate::settings::{CONFIG_FILE_NAME, Config, OutputFormat};
use crate::ssa_analysis::analysis_errors::AnalysisError;
use crate::ssa_analysis::analysis_messages::display_messages::{
    print_analysis_messages, print_formatted_error, print_trace_report,
};
use saying::say;
use std::env;
use std::path::PathBuf;

#[derive(Debug, PartialEq, Eq)]
enum Command {
    // Traces every function of the given SSA documents
    Check(CheckOptions),

    Help,
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CheckOptions {
    inputs: Vec<PathBuf>,
    config_path: Option<PathBuf>,
    flags: Vec<Flag>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flag {
    Json,
    IncludeTests,
    HideWarnings,
}

pub fn start_cli() {
    let args: Vec<String> = env::args().collect();

    if args.len() < 2 {
        print_help(false);
        return;
    }

    let command = match get_command(&args[1..]) {
        Ok(command) => command,
        Err(e) => {
            say!(Red e);
            print_help(true);
            return;
        }
    };

    match command {
        Command::Help => print_help(false),
        Command::Check(options) => run_check(options),
    }
}

fn run_check(options: CheckOptions) {
    let config = match resolve_config(&options) {
        Ok(config) => config,
        Err(e) => {
            print_formatted_error(e);
            return;
        }
    };

    let inputs = match collect_input_files(&options.inputs) {
        Ok(inputs) => inputs,
        Err(e) => {
            print_formatted_error(e);
            return;
        }
    };

    let outcomes = trace_files(&inputs, &config);

    match config.output {
        OutputFormat::Json => print_json(&outcomes),
        OutputFormat::Text => {
            let show_warnings = !options.flags.contains(&Flag::HideWarnings);
            for mut outcome in outcomes {
                if let Ok(report) = &outcome.result {
                    print_trace_report(report);
                }

                let mut messages = outcome.take_messages();
                if !show_warnings {
                    messages.warnings.clear();
                }
                print_analysis_messages(messages);
            }
        }
    }
}

/// Config file first, then command line flags on top.
fn resolve_config(options: &CheckOptions) -> Result<Config, AnalysisError> {
    let mut config = match &options.config_path {
        Some(path) => Config::load(path)?,
        None => {
            let dir = env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
            Config::discover(&dir)?
        }
    };

    apply_flags(&mut config, &options.flags);
    Ok(config)
}

fn apply_flags(config: &mut Config, flags: &[Flag]) {
    for flag in flags {
        match flag {
            Flag::Json => config.output = OutputFormat::Json,
            Flag::IncludeTests => config.include_test_files = true,
            Flag::HideWarnings => {}
        }
    }
}

fn print_json(outcomes: &[FileOutcome]) {
    let documents = outcomes.iter().map(FileOutcome::to_json).collect::<Vec<_>>();

    match serde_json::to_string_pretty(&documents) {
        Ok(json) => println!("{json}"),
        Err(e) => {
            say!(Red "Could not serialise the report: ", e);
        }
    }
}

fn get_command(args: &[String]) -> Result<Command, String> {
    let command = args.first().map(String::as_str);

    match command {
        Some("help") | Some("--help") | Some("-h") => Ok(Command::Help),
        Some("check") => parse_check_command(&args[1..]).map(Command::Check),
        Some(other) => Err(format!("Invalid command: '{other}'")),
        None => Err(String::from("No command given")),
    }
}

fn parse_check_command(args: &[String]) -> Result<CheckOptions, String> {
    let mut options = CheckOptions::default();
    let mut index = 0usize;

    while let Some(arg) = args.get(index) {
        match arg.as_str() {
            "--config" => {
                let Some(path) = args.get(index + 1) else {
                    return Err(String::from("Missing value for --config"));
                };
                if path.starts_with("--") {
                    return Err(String::from("Missing value for --config"));
                }
                options.config_path = Some(PathBuf::from(path));
                index += 2;
            }
            _ if arg.starts_with("--") => {
                let Some(flag) = get_flag(arg) else {
                    return Err(format!(
                        "Unknown flag: '{arg}'. Supported flags are --json, --include-tests, --hide-warnings, --config <path>."
                    ));
                };
                if !options.flags.contains(&flag) {
                    options.flags.push(flag);
                }
                index += 1;
            }
            _ => {
                options.inputs.push(PathBuf::from(arg));
                index += 1;
            }
        }
    }

    if options.inputs.is_empty() {
        return Err(String::from(
            "The check command needs at least one SSA document or directory",
        ));
    }

    Ok(options)
}

fn get_flag(arg: &str) -> Option<Flag> {
    match arg {
        "--json" => Some(Flag::Json),
        "--include-tests" => Some(Flag::IncludeTests),
        "--hide-warnings" => Some(Flag::HideWarnings),
        _ => None,
    }
}

fn print_help(commands_only: bool) {
    if !commands_only {
        say!(Bright Black "------------------------------------");
        say!(Green Bold "tracerr - where do returned errors come from?");
        say!("Usage: ", Bold "<command>", Italic " <args>");
    }
    say!(Green Bold "\nCommands:");
    say!("  check <path>...   - Traces SSA documents (files or directories of .json)");
    say!("  help              - Shows this message");

    say!(Green Bold "\nFlags:");
    say!("  --json");
    say!("  --include-tests");
    say!("  --hide-warnings");
    say!("  --config <path>   (default: ./", CONFIG_FILE_NAME, ")");
}

#[cfg(test)]
#[path = "tests/cli_tests.rs"]
mod tests;
