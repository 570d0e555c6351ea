use crate::ssa_analysis::analysis_errors::ErrorLocation;
use crate::ssa_analysis::analysis_messages::analysis_warnings::TraceWarning;
use crate::ssa_analysis::error_tracer::function_error::FunctionError;
use crate::ssa_analysis::error_tracer::origin::Origin;
use serde::Serialize;

#[derive(Debug, Clone, Default)]
pub struct TraceReport {
    /// Functions with at least one non-empty return slot, in program order.
    pub functions: Vec<FunctionReport>,
    pub warnings: Vec<TraceWarning>,
    pub stats: TraceStats,
}

impl TraceReport {
    pub fn function(&self, name: &str) -> Option<&FunctionReport> {
        self.functions
            .iter()
            .find(|report| report.error.name == name)
    }

    /// One line per reported function, `<location>: func <name> #<slot>: [...]`.
    pub fn render_lines(&self) -> Vec<String> {
        self.functions
            .iter()
            .map(FunctionReport::render_line)
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct FunctionReport {
    pub location: Option<ErrorLocation>,
    pub error: FunctionError,
}

impl FunctionReport {
    pub fn render_line(&self) -> String {
        match &self.location {
            Some(location) => format!("{location}: {}", self.error),
            None => self.error.to_string(),
        }
    }

    pub fn to_json(&self) -> FunctionReportJson {
        FunctionReportJson {
            location: self.location.clone(),
            function: self.error.name.clone(),
            tuple_size: self.error.tuple_size,
            slots: self
                .error
                .slots()
                .map(|(index, origins)| SlotJson {
                    index,
                    rendered: origins.iter().map(Origin::key).collect(),
                    origins: origins.to_vec(),
                })
                .collect(),
            message: self.error.to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct FunctionReportJson {
    pub location: Option<ErrorLocation>,
    pub function: String,
    pub tuple_size: usize,
    pub slots: Vec<SlotJson>,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct SlotJson {
    pub index: usize,
    pub rendered: Vec<String>,
    pub origins: Vec<Origin>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct TraceStats {
    pub functions_analyzed: usize,
    pub functions_reported: usize,
    pub returns_analyzed: usize,
    pub closures_indexed: usize,
    pub values_classified: usize,
    pub cache_hits: usize,
    pub cycles_broken: usize,
}
