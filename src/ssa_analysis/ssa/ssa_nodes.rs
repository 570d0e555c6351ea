//! ============================================================
//!                         SSA Nodes
//! ============================================================
//! Read-only view of a compiled package in static single assignment form.
//!  - Every value has exactly one defining instruction (or none, for constants,
//!    globals, functions, parameters and captured variables)
//!  - Operands are ordered, referrers are derived from them
//!  - Instruction kinds are resolved once, when the program is built
//!
//! The tracer only reads this structure. Building it is the job of
//! `SsaBuilder` (directly, or through the JSON loader).

use crate::ssa_analysis::string_interning::{StringId, StringTable};

// ============================================================
// Stable IDs
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ValueId(pub u32);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FunctionId(pub u32);

impl std::fmt::Display for ValueId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "v{}", self.0)
    }
}

impl std::fmt::Display for FunctionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "fn{}", self.0)
    }
}

// ============================================================
// Source positions
// ============================================================
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub file: StringId,
    pub line: u32,
    pub column: u32,
}

impl Position {
    pub fn new(file: StringId, line: u32, column: u32) -> Self {
        Position { file, line, column }
    }

    /// Line numbers start at 1. Zero means the front-end had no position.
    pub fn is_valid(&self) -> bool {
        self.line > 0
    }
}

// ============================================================
// Program
// ============================================================
#[derive(Debug, Clone)]
pub struct SsaProgram {
    /// Import path of the package, used to shorten names in reports.
    pub package: StringId,
    pub values: Vec<SsaValue>,
    pub functions: Vec<SsaFunction>,
}

impl SsaProgram {
    /// Ids are validated by `SsaBuilder::finish`, so indexing can't go out of range
    /// for ids that came from this program.
    #[inline]
    pub fn value(&self, id: ValueId) -> &SsaValue {
        &self.values[id.0 as usize]
    }

    #[inline]
    pub fn function(&self, id: FunctionId) -> &SsaFunction {
        &self.functions[id.0 as usize]
    }

    #[inline]
    pub fn operand(&self, value: &SsaValue, index: usize) -> Option<&SsaValue> {
        value.operands.get(index).map(|id| self.value(*id))
    }

    pub fn referrers<'a>(&'a self, value: &'a SsaValue) -> impl Iterator<Item = &'a SsaValue> + 'a {
        value.referrers.iter().map(|id| self.value(*id))
    }

    /// Instructions of a function in block order (dominator pre-order from the front-end).
    pub fn instructions<'a>(
        &'a self,
        function: &'a SsaFunction,
    ) -> impl Iterator<Item = &'a SsaValue> + 'a {
        function
            .blocks
            .iter()
            .flat_map(|block| block.instructions.iter())
            .map(|id| self.value(*id))
    }
}

// ============================================================
// Functions
// ============================================================
#[derive(Debug, Clone)]
pub struct SsaFunction {
    pub id: FunctionId,

    /// Fully qualified name as the front-end prints it, e.g. `a.deferReturn$1`.
    pub name: StringId,
    pub position: Option<Position>,

    /// Enclosing function for anonymous functions.
    pub parent: Option<FunctionId>,

    /// Captured variables in capture order.
    /// `MakeClosure` bindings line up with this list.
    pub free_vars: Vec<ValueId>,

    /// Wrappers and thunks generated by the front-end.
    pub synthetic: bool,

    pub blocks: Vec<SsaBlock>,
}

impl SsaFunction {
    pub fn free_var_index(&self, free_var: ValueId) -> Option<usize> {
        self.free_vars.iter().position(|id| *id == free_var)
    }
}

#[derive(Debug, Clone, Default)]
pub struct SsaBlock {
    pub instructions: Vec<ValueId>,
}

// ============================================================
// Values
// ============================================================
#[derive(Debug, Clone)]
pub struct SsaValue {
    pub id: ValueId,
    pub kind: ValueKind,

    /// SSA register name (`t3`), variable name for cells, symbol name for globals.
    pub name: StringId,
    pub operands: Vec<ValueId>,
    pub referrers: Vec<ValueId>,
    pub position: Option<Position>,

    /// Function whose body contains this value. `None` for package-level values.
    pub function: Option<FunctionId>,

    /// Whether the static type of this value satisfies the error contract.
    pub implements_error: bool,
}

impl SsaValue {
    pub fn valid_position(&self) -> Option<Position> {
        self.position.filter(Position::is_valid)
    }

    pub fn is_instruction(&self) -> bool {
        self.kind.is_instruction()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConstValue {
    Nil,

    /// Literal text exactly as the source spells it, quotes included.
    Literal(StringId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnaryOp {
    /// `*x`: load from a memory cell
    Deref,

    /// `<-ch`: channel receive
    Receive,

    /// Arithmetic or logical operator, never produces an error value
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    // --------------------------------------------------------
    // Non-instruction values
    // --------------------------------------------------------
    Const(ConstValue),
    Global,
    Function(FunctionId),
    Parameter,

    /// Captured variable inside the given (nested) function.
    FreeVar(FunctionId),

    // --------------------------------------------------------
    // Memory
    // --------------------------------------------------------
    Alloc,
    Store,
    UnOp(UnaryOp),
    IndexAddr,
    FieldAddr,
    Lookup,

    // --------------------------------------------------------
    // Calls and tuples
    // --------------------------------------------------------
    Call,
    Extract(usize),
    TypeAssert,

    // --------------------------------------------------------
    // Control flow
    // --------------------------------------------------------
    Phi,
    Return,

    // --------------------------------------------------------
    // Closures and channels
    // --------------------------------------------------------
    MakeClosure,
    MakeChan,
    Send,

    /// Opcode the adapter did not recognise, kept for diagnostics.
    Unrecognized(StringId),
}

impl ValueKind {
    pub fn is_instruction(&self) -> bool {
        !matches!(
            self,
            ValueKind::Const(_)
                | ValueKind::Global
                | ValueKind::Function(_)
                | ValueKind::Parameter
                | ValueKind::FreeVar(_)
        )
    }

    /// Opcode spelling used by the JSON loader and in diagnostics.
    pub fn opcode<'a>(&self, string_table: &'a StringTable) -> &'a str {
        match self {
            ValueKind::Const(_) => "const",
            ValueKind::Global => "global",
            ValueKind::Function(_) => "function",
            ValueKind::Parameter => "parameter",
            ValueKind::FreeVar(_) => "free_var",
            ValueKind::Alloc => "alloc",
            ValueKind::Store => "store",
            ValueKind::UnOp(UnaryOp::Deref) => "deref",
            ValueKind::UnOp(UnaryOp::Receive) => "receive",
            ValueKind::UnOp(UnaryOp::Other) => "unop",
            ValueKind::IndexAddr => "index_addr",
            ValueKind::FieldAddr => "field_addr",
            ValueKind::Lookup => "lookup",
            ValueKind::Call => "call",
            ValueKind::Extract(_) => "extract",
            ValueKind::TypeAssert => "type_assert",
            ValueKind::Phi => "phi",
            ValueKind::Return => "return",
            ValueKind::MakeClosure => "make_closure",
            ValueKind::MakeChan => "make_chan",
            ValueKind::Send => "send",
            ValueKind::Unrecognized(opcode) => string_table.resolve(*opcode),
        }
    }
}
