//! Origin classification.
//!
//! Walks the SSA dependency graph backwards from an error-typed value until it
//! reaches something it can name. Every classified value is memoized under its
//! `TraceKey`, with an `Unknown` placeholder written before descending, so
//! cyclic data flow terminates.

mod calls;
mod channels;
mod memory;

use crate::ssa_analysis::analysis_messages::analysis_warnings::{TraceWarning, WarningKind};
use crate::ssa_analysis::error_tracer::diagnostics::TraceDiagnostics;
use crate::ssa_analysis::error_tracer::origin::Origin;
use crate::ssa_analysis::error_tracer::state::{TraceContext, TraceKey};
use crate::ssa_analysis::ssa::ssa_nodes::{
    ConstValue, FunctionId, SsaProgram, SsaValue, UnaryOp, ValueId, ValueKind,
};
use crate::trace_log;

pub(crate) struct OriginClassifier<'a, 'c> {
    program: &'a SsaProgram,
    diagnostics: &'c TraceDiagnostics<'a>,
    context: &'c mut TraceContext,
}

impl<'a, 'c> OriginClassifier<'a, 'c> {
    pub(crate) fn new(
        program: &'a SsaProgram,
        diagnostics: &'c TraceDiagnostics<'a>,
        context: &'c mut TraceContext,
    ) -> Self {
        Self {
            program,
            diagnostics,
            context,
        }
    }

    /// Origin of an error-typed value.
    ///
    /// Values whose type doesn't satisfy the error contract are `Unknown` and
    /// are not cached.
    pub(crate) fn classify(&mut self, value_id: ValueId) -> Origin {
        let program = self.program;
        let value = program.value(value_id);

        if !value.implements_error {
            trace_log!(Yellow "[Trace] Skipping non-error value ", self.diagnostics.describe(value));
            return Origin::Unknown;
        }

        let key = TraceKey::of(value);
        if let Some(cached) = self.context.memo.get(&key).cloned() {
            if self.context.memo.is_in_progress(&key) {
                self.context.stats.cycles_broken += 1;
            } else {
                self.context.stats.cache_hits += 1;
            }
            return cached;
        }

        self.context.memo.begin(key);
        let origin = self.classify_uncached(value);
        self.context.stats.values_classified += 1;

        trace_log!(format!(
            "[Trace] {} -> {}",
            self.diagnostics.describe(value),
            origin
        ));

        self.context.memo.settle(key, origin.clone());
        origin
    }

    fn classify_uncached(&mut self, value: &'a SsaValue) -> Origin {
        match value.kind {
            ValueKind::Const(ConstValue::Nil) => Origin::Nil,

            // An error-typed constant that isn't nil can't be produced by the front-end
            ValueKind::Const(ConstValue::Literal(_)) => Origin::Unknown,

            ValueKind::Global => Origin::Global {
                name: self.diagnostics.symbol_name(value),
            },

            ValueKind::UnOp(UnaryOp::Deref) => self.classify_load(value),
            ValueKind::UnOp(UnaryOp::Receive) => self.classify_receive(value),
            ValueKind::UnOp(UnaryOp::Other) => self.unresolved(
                value,
                WarningKind::UnsupportedOperator,
                "unary operator other than a load or receive produced an error value",
            ),

            ValueKind::Call => self.classify_call(value, 0),
            ValueKind::Extract(index) => self.classify_extract(value, index),

            ValueKind::Phi => {
                let mut origins = Vec::with_capacity(value.operands.len());
                for edge in &value.operands {
                    origins.push(self.classify(*edge));
                }
                Origin::Phi { origins }
            }

            // Element provenance is not tracked
            ValueKind::Lookup => Origin::MemoryAccess,

            // Depends on the caller or on a dynamic type check
            ValueKind::Parameter | ValueKind::TypeAssert => Origin::Unknown,

            ValueKind::Function(_)
            | ValueKind::FreeVar(_)
            | ValueKind::Alloc
            | ValueKind::Store
            | ValueKind::IndexAddr
            | ValueKind::FieldAddr
            | ValueKind::MakeClosure
            | ValueKind::MakeChan
            | ValueKind::Send
            | ValueKind::Return
            | ValueKind::Unrecognized(_) => self.unresolved(
                value,
                WarningKind::UnrecognizedValue,
                "value kind is not modelled by the tracer",
            ),
        }
    }

    fn classify_extract(&mut self, extract: &'a SsaValue, index: usize) -> Origin {
        let program = self.program;
        let Some(tuple) = program.operand(extract, 0) else {
            return self.unresolved(extract, WarningKind::UnresolvedTuple, "extract has no tuple operand");
        };

        match tuple.kind {
            ValueKind::Call => self.classify_call(tuple, index),

            // `v, ok := x.(error)` can't be resolved statically
            ValueKind::TypeAssert => Origin::Unknown,

            _ => self.unresolved(
                tuple,
                WarningKind::UnresolvedTuple,
                "tuple is neither a call nor a type assertion",
            ),
        }
    }

    /// Records a non-fatal diagnostic and degrades to `Unknown`.
    fn unresolved(&mut self, value: &SsaValue, warning_kind: WarningKind, reason: &str) -> Origin {
        let msg = format!("{}: {}", self.diagnostics.describe(value), reason);
        trace_log!(Yellow "[Trace] ", warning_kind, ": ", msg);

        self.context.warnings.push(TraceWarning::new(
            msg,
            self.diagnostics.value_location(value),
            warning_kind,
        ));

        Origin::Unknown
    }

    /// The nested function and captured variable that `make_closure` binds `cell` to.
    fn captured_by(
        &self,
        make_closure: &'a SsaValue,
        cell: ValueId,
    ) -> Option<(FunctionId, &'a SsaValue)> {
        let program = self.program;
        let ValueKind::Function(function_id) = program.operand(make_closure, 0)?.kind else {
            return None;
        };

        let function = program.function(function_id);
        let binding_index = make_closure
            .operands
            .iter()
            .skip(1)
            .position(|binding| *binding == cell)?;
        let free_var = function.free_vars.get(binding_index)?;

        Some((function_id, program.value(*free_var)))
    }
}
