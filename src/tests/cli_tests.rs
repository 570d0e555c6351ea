//! Tests for check-command parsing and flag handling.

use super::{CheckOptions, Command, Flag, apply_flags, get_command};
use crate::settings::{Config, OutputFormat};
use std::path::PathBuf;

fn args(values: &[&str]) -> Vec<String> {
    values.iter().map(|value| value.to_string()).collect()
}

#[test]
fn check_command_collects_inputs_in_order() {
    let command = get_command(&args(&["check", "a.json", "ssa_dir"])).expect("command should parse");
    assert_eq!(
        command,
        Command::Check(CheckOptions {
            inputs: vec![PathBuf::from("a.json"), PathBuf::from("ssa_dir")],
            config_path: None,
            flags: Vec::new(),
        })
    );
}

#[test]
fn check_command_parses_flags_and_config_anywhere() {
    let command = get_command(&args(&[
        "check",
        "--json",
        "a.json",
        "--config",
        "ci/tracerr.toml",
        "--include-tests",
        "--json",
    ]))
    .expect("command should parse");

    assert_eq!(
        command,
        Command::Check(CheckOptions {
            inputs: vec![PathBuf::from("a.json")],
            config_path: Some(PathBuf::from("ci/tracerr.toml")),
            flags: vec![Flag::Json, Flag::IncludeTests],
        })
    );
}

#[test]
fn check_command_requires_inputs() {
    let error = get_command(&args(&["check", "--json"])).expect_err("missing inputs should fail");
    assert!(error.contains("at least one SSA document"));
}

#[test]
fn check_command_rejects_unknown_flags() {
    let error = get_command(&args(&["check", "a.json", "--wat"])).expect_err("unknown flag should fail");
    assert!(error.contains("Unknown flag: '--wat'"));
}

#[test]
fn config_flag_needs_a_value() {
    let error = get_command(&args(&["check", "a.json", "--config"]))
        .expect_err("missing config path should fail");
    assert!(error.contains("Missing value for --config"));

    let error = get_command(&args(&["check", "a.json", "--config", "--json"]))
        .expect_err("flag is not a config path");
    assert!(error.contains("Missing value for --config"));
}

#[test]
fn help_and_invalid_commands() {
    assert_eq!(get_command(&args(&["help"])), Ok(Command::Help));
    assert_eq!(get_command(&args(&["-h"])), Ok(Command::Help));

    let error = get_command(&args(&["build"])).expect_err("unknown command should fail");
    assert_eq!(error, "Invalid command: 'build'");

    let error = get_command(&[]).expect_err("empty args should fail");
    assert_eq!(error, "No command given");
}

#[test]
fn flags_override_the_loaded_config() {
    let mut config = Config::default();
    apply_flags(&mut config, &[Flag::Json, Flag::IncludeTests, Flag::HideWarnings]);

    assert_eq!(config.output, OutputFormat::Json);
    assert!(config.include_test_files);
    assert!(config.trim_package_prefix);
}
