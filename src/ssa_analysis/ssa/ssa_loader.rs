//! JSON adapter for SSA programs exported by a front-end.
//!
//! Opcodes arrive as strings and are resolved into `ValueKind` here, once.
//! Anything this adapter doesn't know becomes `ValueKind::Unrecognized`
//! so newer front-ends never break loading.
//!
//! ```json
//! {
//!   "package": "a",
//!   "values": [
//!     { "id": 0, "op": "const", "name": "nil:error", "error": true },
//!     { "id": 1, "op": "return", "operands": [0], "pos": { "file": "a.go", "line": 10, "column": 2 } }
//!   ],
//!   "functions": [
//!     { "name": "a.returnNil", "pos": { "file": "a.go", "line": 9, "column": 6 }, "blocks": [[1]] }
//!   ]
//! }
//! ```

use crate::return_file_error;
use crate::return_ir_error;
use crate::ssa_analysis::analysis_errors::{AnalysisError, ErrorLocation};
use crate::ssa_analysis::ssa::ssa_builder::{SsaBuilder, ValueSpec};
use crate::ssa_analysis::ssa::ssa_nodes::{
    ConstValue, FunctionId, Position, SsaProgram, UnaryOp, ValueId, ValueKind,
};
use crate::ssa_analysis::string_interning::StringTable;
use crate::ssa_log;
use rustc_hash::FxHashMap;
use serde::Deserialize;
use std::fs;
use std::path::Path;

#[derive(Debug, Deserialize)]
struct ProgramDocument {
    package: String,
    #[serde(default)]
    values: Vec<ValueDocument>,
    #[serde(default)]
    functions: Vec<FunctionDocument>,
}

#[derive(Debug, Clone, Deserialize)]
struct PositionDocument {
    file: String,
    line: u32,
    #[serde(default)]
    column: u32,
}

#[derive(Debug, Deserialize)]
struct ValueDocument {
    id: u32,
    op: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    operands: Vec<u32>,
    #[serde(default)]
    pos: Option<PositionDocument>,
    #[serde(default)]
    error: bool,

    // Op-specific payloads
    #[serde(default)]
    literal: Option<String>,
    #[serde(default)]
    index: Option<usize>,
    #[serde(default)]
    function: Option<String>,
}

#[derive(Debug, Deserialize)]
struct FunctionDocument {
    name: String,
    #[serde(default)]
    pos: Option<PositionDocument>,
    #[serde(default)]
    parent: Option<String>,
    #[serde(default)]
    free_vars: Vec<u32>,
    #[serde(default)]
    synthetic: bool,
    #[serde(default)]
    blocks: Vec<Vec<u32>>,
}

pub fn load_program_from_path(
    path: &Path,
    string_table: &mut StringTable,
) -> Result<SsaProgram, AnalysisError> {
    let source = match fs::read_to_string(path) {
        Ok(source) => source,
        Err(e) => {
            return_file_error!(path, format!("Could not read SSA program: {e}"));
        }
    };

    load_program_from_str(&source, string_table)
        .map_err(|error| match error.location {
            Some(_) => error,
            None => error.with_location(ErrorLocation::file(path)),
        })
}

pub fn load_program_from_str(
    source: &str,
    string_table: &mut StringTable,
) -> Result<SsaProgram, AnalysisError> {
    let document = match serde_json::from_str::<ProgramDocument>(source) {
        Ok(document) => document,
        Err(e) => {
            return_ir_error!(
                format!("Malformed SSA document: {e}"),
                None,
                {
                    CompilationStage => "SSA Loading",
                    PrimarySuggestion => "Re-export the program with the front-end",
                }
            );
        }
    };

    ProgramLoader::new(&document.package, string_table).load(&document)
}

struct ProgramLoader<'a> {
    builder: SsaBuilder<'a>,
    function_by_name: FxHashMap<String, FunctionId>,
    value_by_document_id: FxHashMap<u32, ValueId>,
}

impl<'a> ProgramLoader<'a> {
    fn new(package: &str, string_table: &'a mut StringTable) -> Self {
        Self {
            builder: SsaBuilder::new(package, string_table),
            function_by_name: FxHashMap::default(),
            value_by_document_id: FxHashMap::default(),
        }
    }

    fn load(mut self, document: &ProgramDocument) -> Result<SsaProgram, AnalysisError> {
        self.declare_functions(document)?;
        self.create_values(document)?;
        self.link_operands(document)?;
        self.place_function_bodies(document)?;

        ssa_log!(format!(
            "[SSA] Loaded '{}' ({} functions, {} values)",
            document.package,
            document.functions.len(),
            document.values.len()
        ));

        self.builder.finish()
    }

    fn declare_functions(&mut self, document: &ProgramDocument) -> Result<(), AnalysisError> {
        // Parents can be declared after their closures, so names come first.
        for (index, function) in document.functions.iter().enumerate() {
            let id = FunctionId(index as u32);
            if self
                .function_by_name
                .insert(function.name.clone(), id)
                .is_some()
            {
                return_ir_error!(
                    format!("Function '{}' is declared twice", function.name),
                    None,
                    {
                        CompilationStage => "SSA Loading",
                        VariableName => function.name.as_str(),
                    }
                );
            }
        }

        for function in &document.functions {
            let position = self.position(function.pos.as_ref());
            let parent = match &function.parent {
                Some(parent) => Some(self.function_named(parent)?),
                None => None,
            };

            let id = self.builder.begin_function(&function.name, position, parent);
            self.builder.set_synthetic(id, function.synthetic);
        }

        Ok(())
    }

    fn create_values(&mut self, document: &ProgramDocument) -> Result<(), AnalysisError> {
        for value in &document.values {
            let kind = self.resolve_kind(value)?;
            let position = self.position(value.pos.as_ref());
            let spec = ValueSpec::new(kind, value.name.as_str())
                .at_optional(position)
                .error_typed(value.error);

            let id = self.builder.add_value(spec, None);
            if self.value_by_document_id.insert(value.id, id).is_some() {
                return_ir_error!(
                    format!("Value id {} is used twice", value.id),
                    None,
                    {
                        CompilationStage => "SSA Loading",
                        ValueId => value.id.to_string(),
                    }
                );
            }
        }

        Ok(())
    }

    fn link_operands(&mut self, document: &ProgramDocument) -> Result<(), AnalysisError> {
        for value in &document.values {
            let id = self.value_id(value.id)?;
            let operands = value
                .operands
                .iter()
                .map(|operand| self.value_id(*operand))
                .collect::<Result<Vec<_>, _>>()?;

            self.builder.set_operands(id, operands);
        }

        Ok(())
    }

    fn place_function_bodies(&mut self, document: &ProgramDocument) -> Result<(), AnalysisError> {
        for (index, function) in document.functions.iter().enumerate() {
            let id = FunctionId(index as u32);

            for free_var in &function.free_vars {
                let value = self.value_id(*free_var)?;
                self.builder.attach_free_var(id, value);
            }

            for (block_index, block) in function.blocks.iter().enumerate() {
                if block_index > 0 {
                    self.builder.new_block(id);
                }

                for instruction in block {
                    let value = self.value_id(*instruction)?;
                    self.builder.place_instruction(id, value);
                }
            }
        }

        Ok(())
    }

    fn resolve_kind(&mut self, value: &ValueDocument) -> Result<ValueKind, AnalysisError> {
        let kind = match value.op.as_str() {
            "const" => match &value.literal {
                Some(literal) => ValueKind::Const(ConstValue::Literal(self.builder.intern(literal))),
                None => ValueKind::Const(ConstValue::Nil),
            },
            "global" => ValueKind::Global,
            "function" => ValueKind::Function(self.payload_function(value)?),
            "parameter" => ValueKind::Parameter,
            "free_var" => ValueKind::FreeVar(self.payload_function(value)?),
            "alloc" => ValueKind::Alloc,
            "store" => ValueKind::Store,
            "deref" => ValueKind::UnOp(UnaryOp::Deref),
            "receive" => ValueKind::UnOp(UnaryOp::Receive),
            "unop" => ValueKind::UnOp(UnaryOp::Other),
            "index_addr" => ValueKind::IndexAddr,
            "field_addr" => ValueKind::FieldAddr,
            "lookup" => ValueKind::Lookup,
            "call" => ValueKind::Call,
            "extract" => ValueKind::Extract(self.payload_index(value)?),
            "type_assert" => ValueKind::TypeAssert,
            "phi" => ValueKind::Phi,
            "return" => ValueKind::Return,
            "make_closure" => ValueKind::MakeClosure,
            "make_chan" => ValueKind::MakeChan,
            "send" => ValueKind::Send,
            other => {
                ssa_log!(Yellow "[SSA] Unrecognized opcode kept as-is: ", other);
                ValueKind::Unrecognized(self.builder.intern(other))
            }
        };

        Ok(kind)
    }

    fn payload_function(&self, value: &ValueDocument) -> Result<FunctionId, AnalysisError> {
        match &value.function {
            Some(name) => self.function_named(name),
            None => {
                return_ir_error!(
                    format!(
                        "Value {} ('{}') with op '{}' is missing its 'function' field",
                        value.id, value.name, value.op
                    ),
                    None,
                    {
                        CompilationStage => "SSA Loading",
                        ValueId => value.id.to_string(),
                        Opcode => value.op.as_str(),
                    }
                );
            }
        }
    }

    fn payload_index(&self, value: &ValueDocument) -> Result<usize, AnalysisError> {
        match value.index {
            Some(index) => Ok(index),
            None => {
                return_ir_error!(
                    format!(
                        "Value {} ('{}') with op '{}' is missing its 'index' field",
                        value.id, value.name, value.op
                    ),
                    None,
                    {
                        CompilationStage => "SSA Loading",
                        ValueId => value.id.to_string(),
                        Opcode => value.op.as_str(),
                    }
                );
            }
        }
    }

    fn function_named(&self, name: &str) -> Result<FunctionId, AnalysisError> {
        match self.function_by_name.get(name) {
            Some(id) => Ok(*id),
            None => {
                return_ir_error!(
                    format!("Function '{name}' is referenced but never declared"),
                    None,
                    {
                        CompilationStage => "SSA Loading",
                        VariableName => name,
                    }
                );
            }
        }
    }

    fn value_id(&self, document_id: u32) -> Result<ValueId, AnalysisError> {
        match self.value_by_document_id.get(&document_id) {
            Some(id) => Ok(*id),
            None => {
                return_ir_error!(
                    format!("Value id {document_id} is referenced but never defined"),
                    None,
                    {
                        CompilationStage => "SSA Loading",
                        ValueId => document_id.to_string(),
                    }
                );
            }
        }
    }

    fn position(&mut self, position: Option<&PositionDocument>) -> Option<Position> {
        position.map(|position| self.builder.position(&position.file, position.line, position.column))
    }
}
