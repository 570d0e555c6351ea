//! Builds an `SsaProgram` one function and value at a time.
//!
//! Both the JSON loader and the unit tests go through this builder, so every
//! program the tracer sees has validated ids and derived referrer lists.

use crate::return_ir_error;
use crate::settings::VALUES_PER_FUNCTION_GUESS;
use crate::ssa_analysis::analysis_errors::{AnalysisError, ErrorLocation};
use crate::ssa_analysis::ssa::ssa_nodes::{
    FunctionId, Position, SsaBlock, SsaFunction, SsaProgram, SsaValue, ValueId, ValueKind,
};
use crate::ssa_analysis::string_interning::{StringId, StringTable};
use crate::ssa_log;
use rustc_hash::FxHashSet;

/// Everything needed to create one value.
#[derive(Debug, Clone)]
pub struct ValueSpec {
    pub kind: ValueKind,
    pub name: String,
    pub operands: Vec<ValueId>,
    pub position: Option<Position>,
    pub implements_error: bool,
}

impl ValueSpec {
    pub fn new(kind: ValueKind, name: impl Into<String>) -> Self {
        ValueSpec {
            kind,
            name: name.into(),
            operands: Vec::new(),
            position: None,
            implements_error: false,
        }
    }

    pub fn operands(mut self, operands: impl IntoIterator<Item = ValueId>) -> Self {
        self.operands = operands.into_iter().collect();
        self
    }

    pub fn at(mut self, position: Position) -> Self {
        self.position = Some(position);
        self
    }

    pub fn at_optional(mut self, position: Option<Position>) -> Self {
        self.position = position;
        self
    }

    /// Marks the value's type as satisfying the error contract.
    pub fn error_typed(mut self, implements_error: bool) -> Self {
        self.implements_error = implements_error;
        self
    }
}

pub struct SsaBuilder<'a> {
    string_table: &'a mut StringTable,
    package: StringId,
    values: Vec<SsaValue>,
    functions: Vec<SsaFunction>,
}

impl<'a> SsaBuilder<'a> {
    pub fn new(package: &str, string_table: &'a mut StringTable) -> Self {
        let package = string_table.intern(package);
        Self {
            string_table,
            package,
            values: Vec::new(),
            functions: Vec::new(),
        }
    }

    pub fn intern(&mut self, text: &str) -> StringId {
        self.string_table.intern(text)
    }

    pub fn position(&mut self, file: &str, line: u32, column: u32) -> Position {
        Position::new(self.string_table.intern(file), line, column)
    }

    /// Creates a function with a single empty entry block.
    pub fn begin_function(
        &mut self,
        name: &str,
        position: Option<Position>,
        parent: Option<FunctionId>,
    ) -> FunctionId {
        let id = FunctionId(self.functions.len() as u32);
        let name = self.string_table.intern(name);

        self.values.reserve(VALUES_PER_FUNCTION_GUESS);
        self.functions.push(SsaFunction {
            id,
            name,
            position,
            parent,
            free_vars: Vec::new(),
            synthetic: false,
            blocks: vec![SsaBlock::default()],
        });

        id
    }

    pub fn set_synthetic(&mut self, function: FunctionId, synthetic: bool) {
        if let Some(function) = self.functions.get_mut(function.0 as usize) {
            function.synthetic = synthetic;
        }
    }

    /// Starts a new block; later instructions of `function` are appended to it.
    /// The first block already exists, so the returned index starts at 1.
    pub fn new_block(&mut self, function: FunctionId) -> usize {
        match self.functions.get_mut(function.0 as usize) {
            Some(function) => {
                function.blocks.push(SsaBlock::default());
                function.blocks.len() - 1
            }
            None => 0,
        }
    }

    /// Adds a value that lives outside any block (constant, global, function
    /// reference, parameter). `function` is the owner for parameters.
    pub fn add_value(&mut self, spec: ValueSpec, function: Option<FunctionId>) -> ValueId {
        let id = ValueId(self.values.len() as u32);
        let name = self.string_table.intern(&spec.name);

        self.values.push(SsaValue {
            id,
            kind: spec.kind,
            name,
            operands: spec.operands,
            referrers: Vec::new(),
            position: spec.position,
            function,
            implements_error: spec.implements_error,
        });

        id
    }

    /// Adds an instruction to the last block of `function`.
    pub fn add_instruction(&mut self, function: FunctionId, spec: ValueSpec) -> ValueId {
        let id = self.add_value(spec, Some(function));
        self.place_instruction(function, id);
        id
    }

    /// Appends an existing value to the last block of `function`.
    /// The loader creates all values first and places them afterwards.
    pub fn place_instruction(&mut self, function: FunctionId, value: ValueId) {
        if let Some(owner) = self.values.get_mut(value.0 as usize) {
            owner.function = Some(function);
        }

        if let Some(function) = self.functions.get_mut(function.0 as usize) {
            if let Some(block) = function.blocks.last_mut() {
                block.instructions.push(value);
            }
        }
    }

    /// Adds a captured variable to `function`, in capture order.
    pub fn add_free_var(
        &mut self,
        function: FunctionId,
        name: &str,
        position: Option<Position>,
    ) -> ValueId {
        let id = self.add_value(
            ValueSpec::new(ValueKind::FreeVar(function), name).at_optional(position),
            Some(function),
        );
        self.attach_free_var(function, id);
        id
    }

    pub fn attach_free_var(&mut self, function: FunctionId, free_var: ValueId) {
        if let Some(function) = self.functions.get_mut(function.0 as usize) {
            function.free_vars.push(free_var);
        }
    }

    /// Replaces the operands of a value. Phi nodes that close a loop need
    /// operands that are created after the phi itself.
    pub fn set_operands(&mut self, value: ValueId, operands: Vec<ValueId>) {
        if let Some(value) = self.values.get_mut(value.0 as usize) {
            value.operands = operands;
        }
    }

    pub fn finish(self) -> Result<SsaProgram, AnalysisError> {
        let SsaBuilder {
            string_table,
            package,
            mut values,
            functions,
        } = self;

        validate_references(&values, &functions, string_table)?;

        // Referrers follow block order so every later walk over them is deterministic.
        let mut placed = FxHashSet::default();
        let mut order = Vec::with_capacity(values.len());
        for function in &functions {
            for block in &function.blocks {
                for instruction in &block.instructions {
                    if placed.insert(*instruction) {
                        order.push(*instruction);
                    }
                }
            }
        }
        for value in &values {
            if value.is_instruction() && !placed.contains(&value.id) {
                order.push(value.id);
            }
        }

        for user in order {
            let operands = values[user.0 as usize].operands.clone();
            let mut seen = FxHashSet::default();
            for operand in operands {
                if seen.insert(operand) {
                    values[operand.0 as usize].referrers.push(user);
                }
            }
        }

        ssa_log!(format!(
            "[SSA] Built package '{}': functions={} values={}",
            string_table.resolve(package),
            functions.len(),
            values.len()
        ));

        Ok(SsaProgram {
            package,
            values,
            functions,
        })
    }
}

fn location_of(position: Option<Position>, string_table: &StringTable) -> Option<ErrorLocation> {
    position.filter(Position::is_valid).map(|position| {
        ErrorLocation::new(
            string_table.resolve(position.file),
            position.line,
            position.column,
        )
    })
}

fn validate_references(
    values: &[SsaValue],
    functions: &[SsaFunction],
    string_table: &StringTable,
) -> Result<(), AnalysisError> {
    let value_count = values.len();
    let function_count = functions.len();

    for value in values {
        for operand in &value.operands {
            if operand.0 as usize >= value_count {
                return_ir_error!(
                    format!(
                        "Value '{}' ({}) uses operand {} which does not exist",
                        string_table.resolve(value.name),
                        value.id,
                        operand
                    ),
                    location_of(value.position, string_table),
                    {
                        CompilationStage => "SSA Building",
                        ValueId => value.id.to_string(),
                    }
                );
            }
        }

        if let ValueKind::Function(function) | ValueKind::FreeVar(function) = value.kind {
            if function.0 as usize >= function_count {
                return_ir_error!(
                    format!(
                        "Value '{}' ({}) refers to function {} which does not exist",
                        string_table.resolve(value.name),
                        value.id,
                        function
                    ),
                    location_of(value.position, string_table),
                    {
                        CompilationStage => "SSA Building",
                        ValueId => value.id.to_string(),
                    }
                );
            }
        }
    }

    for function in functions {
        if let Some(parent) = function.parent {
            if parent.0 as usize >= function_count {
                return_ir_error!(
                    format!(
                        "Function '{}' has parent {} which does not exist",
                        string_table.resolve(function.name),
                        parent
                    ),
                    location_of(function.position, string_table)
                );
            }
        }

        let instructions = function.blocks.iter().flat_map(|block| block.instructions.iter());
        for id in instructions.chain(function.free_vars.iter()) {
            if id.0 as usize >= value_count {
                return_ir_error!(
                    format!(
                        "Function '{}' lists value {} which does not exist",
                        string_table.resolve(function.name),
                        id
                    ),
                    location_of(function.position, string_table)
                );
            }
        }

        for free_var in &function.free_vars {
            if !matches!(values[free_var.0 as usize].kind, ValueKind::FreeVar(_)) {
                return_ir_error!(
                    format!(
                        "Function '{}' captures {} which is not a free variable",
                        string_table.resolve(function.name),
                        free_var
                    ),
                    location_of(function.position, string_table),
                    {
                        CompilationStage => "SSA Building",
                        ValueId => free_var.to_string(),
                    }
                );
            }
        }
    }

    Ok(())
}
