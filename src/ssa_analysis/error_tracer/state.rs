use crate::ssa_analysis::analysis_messages::analysis_warnings::TraceWarning;
use crate::ssa_analysis::error_tracer::origin::Origin;
use crate::ssa_analysis::error_tracer::types::TraceStats;
use crate::ssa_analysis::ssa::ssa_nodes::{FunctionId, Position, SsaFunction, SsaProgram, SsaValue, ValueId, ValueKind};
use rustc_hash::{FxHashMap, FxHashSet};

/// Stable identity of a classified value.
/// Source position when the front-end gave one, the value id otherwise.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum TraceKey {
    Position(Position),
    Value(ValueId),
}

impl TraceKey {
    pub(crate) fn of(value: &SsaValue) -> Self {
        match value.valid_position() {
            Some(position) => TraceKey::Position(position),
            None => TraceKey::Value(value.id),
        }
    }
}

/// Write-once-then-settle cache of classified origins.
///
/// `begin` stores an `Unknown` placeholder before the classifier descends into
/// a value, so a cycle that leads back to it resolves immediately.
#[derive(Debug, Default)]
pub struct MemoCache {
    entries: FxHashMap<TraceKey, Origin>,
    in_progress: FxHashSet<TraceKey>,
}

impl MemoCache {
    pub(crate) fn get(&self, key: &TraceKey) -> Option<&Origin> {
        self.entries.get(key)
    }

    pub(crate) fn is_in_progress(&self, key: &TraceKey) -> bool {
        self.in_progress.contains(key)
    }

    pub(crate) fn begin(&mut self, key: TraceKey) {
        self.entries.insert(key, Origin::Unknown);
        self.in_progress.insert(key);
    }

    pub(crate) fn settle(&mut self, key: TraceKey, origin: Origin) {
        self.in_progress.remove(&key);
        self.entries.insert(key, origin);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Maps a nested function to the values bound to its free variables at the
/// closure creation site. Binding `i` feeds free variable `i`.
#[derive(Debug, Default)]
pub struct ClosureEnvironment {
    bindings: FxHashMap<FunctionId, Vec<ValueId>>,
}

impl ClosureEnvironment {
    pub(crate) fn record(&mut self, function: FunctionId, bindings: Vec<ValueId>) {
        self.bindings.insert(function, bindings);
    }

    pub fn bindings(&self, function: FunctionId) -> Option<&[ValueId]> {
        self.bindings.get(&function).map(Vec::as_slice)
    }

    /// Records a `MakeClosure` instruction. Returns false for anything else.
    pub(crate) fn record_if_closure(&mut self, program: &SsaProgram, instruction: &SsaValue) -> bool {
        if instruction.kind != ValueKind::MakeClosure {
            return false;
        }

        let Some(target) = program.operand(instruction, 0) else {
            return false;
        };

        let ValueKind::Function(function) = target.kind else {
            return false;
        };

        self.record(function, instruction.operands[1..].to_vec());
        true
    }

    /// Single linear scan over the instructions of `function`.
    pub(crate) fn index_function(&mut self, program: &SsaProgram, function: &SsaFunction) -> usize {
        program
            .instructions(function)
            .filter(|instruction| self.record_if_closure(program, instruction))
            .count()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

/// Analysis state shared by every function traced in one program.
///
/// Passed by `&mut` into each trace, so separate programs (and separate tests)
/// never share anything.
#[derive(Debug, Default)]
pub struct TraceContext {
    pub memo: MemoCache,
    pub closures: ClosureEnvironment,
    pub(crate) warnings: Vec<TraceWarning>,
    pub(crate) stats: TraceStats,
}

impl TraceContext {
    pub fn new() -> Self {
        TraceContext::default()
    }

    pub fn warnings(&self) -> &[TraceWarning] {
        &self.warnings
    }

    pub fn stats(&self) -> &TraceStats {
        &self.stats
    }

    pub(crate) fn take_warnings(&mut self) -> Vec<TraceWarning> {
        std::mem::take(&mut self.warnings)
    }
}
