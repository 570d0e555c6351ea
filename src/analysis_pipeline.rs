//! Loads and traces whole input files.
//!
//! Each file gets its own `StringTable` and `TraceContext`, so files are
//! traced in parallel and results come back in input order.

use crate::settings::{Config, IR_FILE_EXTENSION};
use crate::ssa_analysis::analysis_errors::{AnalysisError, AnalysisMessages};
use crate::ssa_analysis::analysis_messages::analysis_warnings::TraceWarning;
use crate::ssa_analysis::error_tracer::{FunctionReportJson, TraceContext, TraceReport, trace_program};
use crate::ssa_analysis::ssa::ssa_loader::load_program_from_path;
use crate::ssa_analysis::string_interning::StringTable;
use crate::{return_file_error, timer_log};
use rayon::prelude::*;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Instant;

/// Result of tracing one input file.
#[derive(Debug)]
pub struct FileOutcome {
    pub path: PathBuf,
    pub result: Result<TraceReport, AnalysisError>,
}

impl FileOutcome {
    /// Moves errors and warnings out for printing. The report itself is left in place.
    pub fn take_messages(&mut self) -> AnalysisMessages {
        let mut messages = AnalysisMessages::new();
        match &mut self.result {
            Ok(report) => messages.warnings = std::mem::take(&mut report.warnings),
            Err(e) => messages.errors.push(e.clone()),
        }
        messages
    }

    pub fn to_json(&self) -> FileOutcomeJson {
        match &self.result {
            Ok(report) => FileOutcomeJson {
                file: self.path.to_string_lossy().to_string(),
                functions: report.functions.iter().map(|function| function.to_json()).collect(),
                warnings: report.warnings.clone(),
                error: None,
            },
            Err(e) => FileOutcomeJson {
                file: self.path.to_string_lossy().to_string(),
                functions: Vec::new(),
                warnings: Vec::new(),
                error: Some(e.clone()),
            },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct FileOutcomeJson {
    pub file: String,
    pub functions: Vec<FunctionReportJson>,
    pub warnings: Vec<TraceWarning>,
    pub error: Option<AnalysisError>,
}

/// Loads one SSA document and traces it.
pub fn trace_file(path: &Path, config: &Config) -> Result<TraceReport, AnalysisError> {
    let time = Instant::now();

    let mut string_table = StringTable::new();
    let program = load_program_from_path(path, &mut string_table)?;
    timer_log!(time, "SSA loaded in: ");

    let mut context = TraceContext::new();
    trace_program(&program, &string_table, &mut context, config)
}

pub fn trace_files(paths: &[PathBuf], config: &Config) -> Vec<FileOutcome> {
    paths
        .par_iter()
        .map(|path| FileOutcome {
            path: path.to_owned(),
            result: trace_file(path, config),
        })
        .collect()
}

/// Expands directories into the SSA documents directly inside them (sorted by name).
/// Files are passed through unchanged.
pub fn collect_input_files(inputs: &[PathBuf]) -> Result<Vec<PathBuf>, AnalysisError> {
    let mut files = Vec::with_capacity(inputs.len());

    for input in inputs {
        if !input.is_dir() {
            files.push(input.to_owned());
            continue;
        }

        let entries = match fs::read_dir(input) {
            Ok(entries) => entries,
            Err(e) => {
                return_file_error!(input, format!("Could not read directory: {e}"));
            }
        };

        let mut found = entries
            .filter_map(Result::ok)
            .map(|entry| entry.path())
            .filter(|path| {
                path.is_file()
                    && path
                        .extension()
                        .is_some_and(|extension| extension == IR_FILE_EXTENSION)
            })
            .collect::<Vec<_>>();

        found.sort();
        files.extend(found);
    }

    Ok(files)
}
