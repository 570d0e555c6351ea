use super::OriginClassifier;
use crate::ssa_analysis::error_tracer::origin::Origin;
use crate::ssa_analysis::ssa::ssa_nodes::{ConstValue, SsaValue, ValueKind};

impl<'a> OriginClassifier<'a, '_> {
    /// `name#index(args)` for the call, where `index` is the tuple slot the
    /// error came out of. Error-typed arguments are classified recursively.
    pub(super) fn classify_call(&mut self, call: &'a SsaValue, index: usize) -> Origin {
        let program = self.program;
        let mut operands = call.operands.iter().map(|id| program.value(*id));

        let name = match operands.next() {
            Some(callee) => self.callee_name(callee),
            None => self.diagnostics.value_name(call).to_owned(),
        };

        let mut args = Vec::with_capacity(call.operands.len().saturating_sub(1));
        for argument in operands {
            if argument.implements_error {
                args.push(self.classify(argument.id).key());
            } else {
                args.push(self.argument_text(argument));
            }
        }

        Origin::FunctionCall { name, args, index }
    }

    fn callee_name(&self, callee: &SsaValue) -> String {
        match callee.kind {
            ValueKind::Function(function_id) => self.diagnostics.function_name(function_id),

            // Immediately invoked literal, named after the function it wraps
            ValueKind::MakeClosure => match self.program.operand(callee, 0) {
                Some(SsaValue {
                    kind: ValueKind::Function(function_id),
                    ..
                }) => self.diagnostics.function_name(*function_id),
                _ => self.diagnostics.value_name(callee).to_owned(),
            },

            ValueKind::Global => self.diagnostics.symbol_name(callee),

            // Dynamic or interface call
            _ => self.diagnostics.value_name(callee).to_owned(),
        }
    }

    fn argument_text(&self, argument: &SsaValue) -> String {
        match argument.kind {
            ValueKind::Const(ConstValue::Nil) => String::from("nil"),
            ValueKind::Const(ConstValue::Literal(text)) => self.diagnostics.resolve(text).to_owned(),
            ValueKind::Function(function_id) => self.diagnostics.function_name(function_id),
            ValueKind::Global => self.diagnostics.symbol_name(argument),
            _ => self.diagnostics.value_name(argument).to_owned(),
        }
    }
}
