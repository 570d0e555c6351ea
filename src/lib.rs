pub mod analysis_pipeline;
pub mod cli;
pub mod settings;

pub mod ssa_analysis {
    pub mod analysis_errors;
    pub mod error_tracer;
    pub mod ssa;
    pub mod string_interning;

    pub mod analysis_messages {
        pub mod analysis_dev_logging;
        pub mod analysis_warnings;
        pub mod display_messages;
    }
}

pub use analysis_pipeline::{trace_file, trace_files};
pub use settings::Config;
pub use ssa_analysis::analysis_errors::{AnalysisError, ErrorType};
pub use ssa_analysis::error_tracer::{
    FunctionError, Origin, TraceContext, TraceReport, trace_function, trace_program,
};
