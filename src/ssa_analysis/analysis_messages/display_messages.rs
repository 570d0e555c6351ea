use crate::ssa_analysis::analysis_errors::{AnalysisError, AnalysisMessages, ErrorMetaDataKey, ErrorType};
use crate::ssa_analysis::analysis_messages::analysis_warnings::TraceWarning;
use crate::ssa_analysis::error_tracer::TraceReport;
use saying::say;
use std::env;
use std::path::Path;

fn relative_display_path(path: &str) -> String {
    let path = Path::new(path);

    match env::current_dir() {
        Ok(dir) => path
            .strip_prefix(&dir)
            .unwrap_or(path)
            .to_string_lossy()
            .to_string(),
        Err(_) => path.to_string_lossy().to_string(),
    }
}

pub fn print_analysis_messages(messages: AnalysisMessages) {
    for err in messages.errors {
        print_formatted_error(err);
    }

    for warning in messages.warnings {
        print_formatted_warning(warning);
    }
}

/// One line per reported function, in program order.
pub fn print_trace_report(report: &TraceReport) {
    for function in &report.functions {
        match &function.location {
            Some(location) => {
                let mut location = location.clone();
                location.file = relative_display_path(&location.file);
                say!(Dark Magenta location, ": ", function.error);
            }
            None => {
                say!(function.error);
            }
        }
    }
}

pub fn print_formatted_error(e: AnalysisError) {
    let relative_dir = e
        .location
        .as_ref()
        .map(|location| relative_display_path(&location.file))
        .unwrap_or_default();

    match e.error_type {
        ErrorType::File => {
            say!(Yellow "🏚 Can't find/read file or directory: ", relative_dir);
            say!(e.msg);
            return;
        }

        ErrorType::Config => {
            if !relative_dir.is_empty() {
                say!("\n (-_-)  🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥  <(^~^)/ ");
            }
            say!(Yellow "CONFIG FILE ISSUE - ");
        }

        ErrorType::Ir => {
            if !relative_dir.is_empty() {
                say!("\n(╯°□°)╯  🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥  Σ(°△°;) ");
            }
            say!(Red "Malformed SSA input");
        }

        ErrorType::Compiler => {
            if !relative_dir.is_empty() {
                say!("\nヽ༼☉ ‿ ⚆༽ﾉ  🔥🔥🔥🔥 ", Dark Magenta relative_dir, " 🔥🔥🔥🔥  ╰(° _ o╰) ");
            }
            say!(Yellow "TRACER BUG - ");
            say!(Dark Yellow "tracer developer skill issue (not your fault)");
        }
    }

    if let Some(location) = &e.location
        && location.line > 0
    {
        say!(Dark Magenta "Line ", Bright {location.line}, Dark Magenta " column ", Bright {location.column});
    }

    say!(Red e.msg);

    if let Some(suggestion) = e.metadata.get(&ErrorMetaDataKey::PrimarySuggestion) {
        say!(Dark Yellow "Suggestion: ", suggestion);
    }
    if let Some(suggestion) = e.metadata.get(&ErrorMetaDataKey::AlternativeSuggestion) {
        say!(Dark Yellow "Or: ", suggestion);
    }
}

pub fn print_formatted_warning(w: TraceWarning) {
    match &w.location {
        Some(location) => {
            let location = relative_display_path(&location.to_string());
            say!(Yellow "WARNING: ", Dark Magenta location, " ", w.warning_kind, ": ", w.msg);
        }
        None => {
            say!(Yellow "WARNING: ", w.warning_kind, ": ", w.msg);
        }
    }
}
