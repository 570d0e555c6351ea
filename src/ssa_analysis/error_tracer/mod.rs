//! ============================================================
//!                       Error Origin Tracer
//! ============================================================
//! For every function that returns error values, follows each error-typed
//! return operand back through the SSA graph and records where it can come
//! from: nil, a global, a call result, a memory read, or a closure that may
//! overwrite it.
//!
//! One `TraceContext` is shared by every function of a program so each value
//! is classified at most once. Nothing is shared between programs.

mod classify;
mod diagnostics;
mod function_error;
mod origin;
mod state;
mod types;

pub use function_error::FunctionError;
pub use origin::Origin;
pub use state::{ClosureEnvironment, MemoCache, TraceContext};
pub use types::{FunctionReport, FunctionReportJson, SlotJson, TraceReport, TraceStats};

use crate::return_compiler_error;
use crate::settings::Config;
use crate::ssa_analysis::analysis_errors::AnalysisError;
use crate::ssa_analysis::error_tracer::classify::OriginClassifier;
use crate::ssa_analysis::error_tracer::diagnostics::TraceDiagnostics;
use crate::ssa_analysis::ssa::ssa_nodes::{FunctionId, SsaFunction, SsaProgram, ValueKind};
use crate::ssa_analysis::string_interning::StringTable;
use crate::{timer_log, trace_log};
use std::time::Instant;

/// Traces every reportable function of `program`.
///
/// Closure bindings of the whole program are indexed before any function is
/// traced, so a closure body can be resolved no matter which function is
/// visited first.
pub fn trace_program(
    program: &SsaProgram,
    string_table: &StringTable,
    context: &mut TraceContext,
    config: &Config,
) -> Result<TraceReport, AnalysisError> {
    ErrorTracer::new(program, string_table, config).run(context)
}

/// Origins of every error-typed return slot of one function.
///
/// Records the closures created by this function into `context` while
/// scanning, but doesn't index the rest of the program.
pub fn trace_function(
    program: &SsaProgram,
    string_table: &StringTable,
    context: &mut TraceContext,
    config: &Config,
    function_id: FunctionId,
) -> FunctionError {
    ErrorTracer::new(program, string_table, config).trace_function(context, program.function(function_id))
}

struct ErrorTracer<'a> {
    program: &'a SsaProgram,
    config: &'a Config,
    diagnostics: TraceDiagnostics<'a>,
}

impl<'a> ErrorTracer<'a> {
    fn new(program: &'a SsaProgram, string_table: &'a StringTable, config: &'a Config) -> Self {
        Self {
            program,
            config,
            diagnostics: TraceDiagnostics::new(program, string_table, config.trim_package_prefix),
        }
    }

    fn run(self, context: &mut TraceContext) -> Result<TraceReport, AnalysisError> {
        let time = Instant::now();

        self.index_closures(context)?;
        timer_log!(time, "Closures indexed in: ");

        let mut report = TraceReport::default();

        for function in &self.program.functions {
            if !self.is_reportable(function) {
                continue;
            }

            let function_error = self.trace_function(context, function);
            context.stats.functions_analyzed += 1;

            if !function_error.has_origins() {
                continue;
            }

            context.stats.functions_reported += 1;
            report.functions.push(FunctionReport {
                location: self.diagnostics.function_location(function),
                error: function_error,
            });
        }

        timer_log!(time, "Error origins traced in: ");

        trace_log!(format!(
            "[Trace] Completed: functions={} reported={} returns={} values={} cache_hits={} cycles={}",
            context.stats.functions_analyzed,
            context.stats.functions_reported,
            context.stats.returns_analyzed,
            context.stats.values_classified,
            context.stats.cache_hits,
            context.stats.cycles_broken
        ));

        report.warnings = context.take_warnings();
        report.stats = context.stats.clone();
        Ok(report)
    }

    fn index_closures(&self, context: &mut TraceContext) -> Result<(), AnalysisError> {
        for (index, function) in self.program.functions.iter().enumerate() {
            if function.id.0 as usize != index {
                return_compiler_error!(
                    "Function '{}' is stored at index {} but has id {}",
                    self.diagnostics.resolve(function.name),
                    index,
                    function.id
                );
            }

            context.stats.closures_indexed += context.closures.index_function(self.program, function);
        }

        Ok(())
    }

    /// Generated wrappers and (by default) test files are not reported.
    fn is_reportable(&self, function: &SsaFunction) -> bool {
        if function.synthetic {
            return false;
        }

        if self.config.include_test_files {
            return true;
        }

        match self.diagnostics.file_name(function.position) {
            Some(file_name) => !self.config.is_test_file(file_name),
            None => true,
        }
    }

    fn trace_function(&self, context: &mut TraceContext, function: &'a SsaFunction) -> FunctionError {
        let program = self.program;
        let mut function_error = FunctionError::new(self.diagnostics.function_name(function.id));

        trace_log!(Blue "[Trace] Function ", function_error.name);

        for instruction in program.instructions(function) {
            if context.closures.record_if_closure(program, instruction) {
                continue;
            }

            // Returns synthesised by the front-end (no source position) are skipped
            if instruction.kind != ValueKind::Return || instruction.valid_position().is_none() {
                continue;
            }

            context.stats.returns_analyzed += 1;
            function_error.tuple_size = instruction.operands.len();

            let mut classifier = OriginClassifier::new(program, &self.diagnostics, context);
            for (slot, operand) in instruction.operands.iter().enumerate() {
                if !program.value(*operand).implements_error {
                    continue;
                }

                let origin = classifier.classify(*operand);
                function_error.add_origin(slot, origin);
            }
        }

        function_error
    }
}

#[cfg(test)]
mod tests;
