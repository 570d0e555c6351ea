use crate::ssa_analysis::analysis_messages::analysis_warnings::TraceWarning;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::Path;

// The final set of errors and warnings produced for one input program
#[derive(Debug, Default)]
pub struct AnalysisMessages {
    pub errors: Vec<AnalysisError>,
    pub warnings: Vec<TraceWarning>,
}

impl AnalysisMessages {
    pub fn new() -> Self {
        AnalysisMessages::default()
    }
}

#[derive(Debug, Clone, Copy, Eq, Hash, PartialEq, Serialize)]
pub enum ErrorMetaDataKey {
    CompilationStage,
    VariableName,
    ValueId,
    Opcode,

    // Optional suggestions
    PrimarySuggestion,
    AlternativeSuggestion,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorType {
    /// Unreadable input or config file
    File,

    /// The config file exists but makes no sense
    Config,

    /// The SSA document is malformed (bad JSON, dangling ids)
    Ir,

    /// Internal bug, never the user's fault
    Compiler,
}

/// Rendered source location. Errors outlive the string table of the program
/// they came from, so the location is kept as plain text.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ErrorLocation {
    pub file: String,
    pub line: u32,
    pub column: u32,
}

impl ErrorLocation {
    pub fn new(file: impl Into<String>, line: u32, column: u32) -> Self {
        ErrorLocation {
            file: file.into(),
            line,
            column,
        }
    }

    pub fn file(path: &Path) -> Self {
        ErrorLocation::new(path.to_string_lossy(), 0, 0)
    }
}

impl Display for ErrorLocation {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        if self.line == 0 {
            return write!(f, "{}", self.file);
        }
        write!(f, "{}:{}:{}", self.file, self.line, self.column)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AnalysisError {
    pub msg: String,
    pub location: Option<ErrorLocation>,
    pub error_type: ErrorType,

    // Structured detail for tooling that consumes the JSON output
    pub metadata: HashMap<ErrorMetaDataKey, String>,
}

impl AnalysisError {
    pub fn new(
        msg: impl Into<String>,
        location: Option<ErrorLocation>,
        error_type: ErrorType,
    ) -> AnalysisError {
        AnalysisError {
            msg: msg.into(),
            location,
            error_type,
            metadata: HashMap::new(),
        }
    }

    pub fn with_location(mut self, location: ErrorLocation) -> Self {
        self.location = Some(location);
        self
    }

    /// Internal bug, not caused by the analysed program
    pub fn compiler_error(msg: impl Into<String>) -> Self {
        AnalysisError::new(msg, None, ErrorType::Compiler)
    }

    pub fn file_error(path: &Path, msg: impl Into<String>) -> Self {
        AnalysisError::new(msg, Some(ErrorLocation::file(path)), ErrorType::File)
    }
}

impl Display for AnalysisError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.location {
            Some(location) => write!(f, "{}: {}", location, self.msg),
            None => write!(f, "{}", self.msg),
        }
    }
}

/// Returns a new AnalysisError for a malformed SSA document.
///
/// Usage: `return_ir_error!(format!("Operand {} does not exist", id), location, { ValueId => id.to_string() })`;
#[macro_export]
macro_rules! return_ir_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::ssa_analysis::analysis_errors::AnalysisError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::ssa_analysis::analysis_errors::ErrorType::Ir,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::ssa_analysis::analysis_errors::ErrorMetaDataKey::$key, String::from($value)); )*
                map
            },
        })
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::ssa_analysis::analysis_errors::AnalysisError::new(
            $msg,
            $location,
            $crate::ssa_analysis::analysis_errors::ErrorType::Ir,
        ))
    };
}

/// Returns a new AnalysisError for a config file that can't be understood.
#[macro_export]
macro_rules! return_config_error {
    ($msg:expr, $location:expr, { $( $key:ident => $value:expr ),* $(,)? }) => {
        return Err($crate::ssa_analysis::analysis_errors::AnalysisError {
            msg: $msg.into(),
            location: $location,
            error_type: $crate::ssa_analysis::analysis_errors::ErrorType::Config,
            metadata: {
                let mut map = std::collections::HashMap::new();
                $( map.insert($crate::ssa_analysis::analysis_errors::ErrorMetaDataKey::$key, String::from($value)); )*
                map
            },
        })
    };
    ($msg:expr, $location:expr) => {
        return Err($crate::ssa_analysis::analysis_errors::AnalysisError::new(
            $msg,
            $location,
            $crate::ssa_analysis::analysis_errors::ErrorType::Config,
        ))
    };
}

/// Returns a new AnalysisError for a file that can't be read.
///
/// Usage: `return_file_error!(path, "Could not read file")`;
#[macro_export]
macro_rules! return_file_error {
    ($path:expr, $msg:expr) => {
        return Err($crate::ssa_analysis::analysis_errors::AnalysisError::file_error(
            $path, $msg,
        ))
    };
}

/// Returns a new AnalysisError for an internal invariant violation.
#[macro_export]
macro_rules! return_compiler_error {
    ($msg:expr) => {
        return Err($crate::ssa_analysis::analysis_errors::AnalysisError::compiler_error($msg))
    };
    ($fmt:expr, $($arg:tt)+) => {
        return Err($crate::ssa_analysis::analysis_errors::AnalysisError::compiler_error(
            format!($fmt, $($arg)+),
        ))
    };
}
