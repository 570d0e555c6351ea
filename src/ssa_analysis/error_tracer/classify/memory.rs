use super::OriginClassifier;
use crate::ssa_analysis::analysis_messages::analysis_warnings::WarningKind;
use crate::ssa_analysis::error_tracer::origin::Origin;
use crate::ssa_analysis::ssa::ssa_nodes::{FunctionId, SsaValue, ValueId, ValueKind};
use crate::trace_log;
use rustc_hash::FxHashSet;

impl<'a> OriginClassifier<'a, '_> {
    /// Origin of `*cell`.
    pub(super) fn classify_load(&mut self, load: &'a SsaValue) -> Origin {
        let program = self.program;
        let Some(cell) = program.operand(load, 0) else {
            return self.unresolved(load, WarningKind::UnrecognizedValue, "load has no address operand");
        };

        self.resolve_cell(cell, &mut FxHashSet::default())
    }

    /// Everything that may have been written into `cell`.
    ///
    /// Following closure bindings bypasses the memo, so `visited` holds the
    /// cells already entered on this walk.
    fn resolve_cell(&mut self, cell: &'a SsaValue, visited: &mut FxHashSet<ValueId>) -> Origin {
        if !visited.insert(cell.id) {
            trace_log!(Yellow "[Trace] Closure bindings loop back to ", self.diagnostics.describe(cell));
            return Origin::Unknown;
        }

        match cell.kind {
            ValueKind::Global => Origin::Global {
                name: self.diagnostics.symbol_name(cell),
            },

            ValueKind::IndexAddr | ValueKind::FieldAddr => Origin::MemoryAccess,

            ValueKind::FreeVar(owner) => self.resolve_captured_cell(cell, owner, visited),

            _ => self.resolve_local_cell(cell),
        }
    }

    /// Stores into the cell, plus one `Modified` entry naming the closures that
    /// capture the cell and assign through it.
    ///
    /// Only a local variable is known to be written solely through its
    /// referrers. Any other address with nothing found is `Unknown`.
    fn resolve_local_cell(&mut self, cell: &'a SsaValue) -> Origin {
        let program = self.program;
        let mut origins = Vec::new();
        let mut writers = Vec::new();

        for referrer in program.referrers(cell) {
            match referrer.kind {
                ValueKind::Store => {
                    if let Some(stored) = stored_value(referrer, cell) {
                        origins.push(self.classify(stored));
                    }
                }

                ValueKind::MakeClosure => {
                    if let Some((function_id, free_var)) = self.captured_by(referrer, cell.id)
                        && self.writes_through(free_var, &mut FxHashSet::default())
                    {
                        writers.push(self.diagnostics.function_name(function_id));
                    }
                }

                _ => {}
            }
        }

        if !writers.is_empty() {
            origins.push(Origin::modified_by(writers));
        }

        if origins.is_empty() && cell.kind != ValueKind::Alloc {
            trace_log!(Yellow "[Trace] Nothing is written into ", self.diagnostics.describe(cell));
            return Origin::Unknown;
        }

        Origin::Pointer { origins }
    }

    /// Stores inside the closure win. Without any, the cell is resolved in the
    /// enclosing function through the recorded closure bindings.
    fn resolve_captured_cell(
        &mut self,
        free_var: &'a SsaValue,
        owner: FunctionId,
        visited: &mut FxHashSet<ValueId>,
    ) -> Origin {
        let program = self.program;

        let mut origins = Vec::new();
        for referrer in program.referrers(free_var) {
            if referrer.kind != ValueKind::Store {
                continue;
            }
            if let Some(stored) = stored_value(referrer, free_var) {
                origins.push(self.classify(stored));
            }
        }

        if !origins.is_empty() {
            return Origin::Pointer { origins };
        }

        let Some(binding_index) = program.function(owner).free_var_index(free_var.id) else {
            trace_log!(Yellow "[Trace] Free variable not listed by its function: ", self.diagnostics.describe(free_var));
            return Origin::Unknown;
        };

        let Some(binding) = self
            .context
            .closures
            .bindings(owner)
            .and_then(|bindings| bindings.get(binding_index))
            .copied()
        else {
            trace_log!(Yellow "[Trace] No closure creation site recorded for ", self.diagnostics.function_name(owner));
            return Origin::Unknown;
        };

        self.resolve_cell(program.value(binding), visited)
    }

    /// Whether the captured variable is assigned inside its closure, or inside
    /// a closure nested further in that captures it again.
    fn writes_through(&self, free_var: &'a SsaValue, visited: &mut FxHashSet<ValueId>) -> bool {
        let program = self.program;
        if !visited.insert(free_var.id) {
            return false;
        }

        program.referrers(free_var).any(|referrer| match referrer.kind {
            ValueKind::Store => stored_value(referrer, free_var).is_some(),
            ValueKind::MakeClosure => self
                .captured_by(referrer, free_var.id)
                .is_some_and(|(_, nested)| self.writes_through(nested, visited)),
            _ => false,
        })
    }
}

/// The value a `Store` writes, when `cell` is the address it writes to.
fn stored_value(store: &SsaValue, cell: &SsaValue) -> Option<ValueId> {
    match store.operands.as_slice() {
        [address, value] if *address == cell.id => Some(*value),
        _ => None,
    }
}
