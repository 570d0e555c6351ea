use crate::ssa_analysis::analysis_errors::ErrorLocation;
use crate::ssa_analysis::ssa::ssa_nodes::{FunctionId, Position, SsaFunction, SsaProgram, SsaValue};
use crate::ssa_analysis::string_interning::{StringId, StringTable};

/// Names and locations as they appear in reports and warnings.
pub(crate) struct TraceDiagnostics<'a> {
    program: &'a SsaProgram,
    string_table: &'a StringTable,

    /// `"<package>."`, stripped from the front of names when set.
    package_prefix: Option<String>,
}

impl<'a> TraceDiagnostics<'a> {
    pub(crate) fn new(
        program: &'a SsaProgram,
        string_table: &'a StringTable,
        trim_package_prefix: bool,
    ) -> Self {
        let package_prefix = trim_package_prefix
            .then(|| format!("{}.", string_table.resolve(program.package)));

        Self {
            program,
            string_table,
            package_prefix,
        }
    }

    pub(crate) fn display_name(&self, qualified: &str) -> String {
        match &self.package_prefix {
            Some(prefix) => qualified
                .strip_prefix(prefix.as_str())
                .unwrap_or(qualified)
                .to_owned(),
            None => qualified.to_owned(),
        }
    }

    pub(crate) fn function_name(&self, function_id: FunctionId) -> String {
        let function = self.program.function(function_id);
        self.display_name(self.string_table.resolve(function.name))
    }

    /// Globals and functions get the shortened name, everything else keeps its SSA name.
    pub(crate) fn symbol_name(&self, value: &SsaValue) -> String {
        self.display_name(self.string_table.resolve(value.name))
    }

    pub(crate) fn value_name(&self, value: &SsaValue) -> &'a str {
        self.string_table.resolve(value.name)
    }

    pub(crate) fn resolve(&self, id: StringId) -> &'a str {
        self.string_table.resolve(id)
    }

    pub(crate) fn location(&self, position: Option<Position>) -> Option<ErrorLocation> {
        position.filter(Position::is_valid).map(|position| {
            ErrorLocation::new(
                self.string_table.resolve(position.file),
                position.line,
                position.column,
            )
        })
    }

    pub(crate) fn value_location(&self, value: &SsaValue) -> Option<ErrorLocation> {
        self.location(value.position)
    }

    pub(crate) fn function_location(&self, function: &SsaFunction) -> Option<ErrorLocation> {
        self.location(function.position)
    }

    /// `t3 = call` style description used in warnings.
    pub(crate) fn describe(&self, value: &SsaValue) -> String {
        format!(
            "{} = {} ({})",
            self.value_name(value),
            value.kind.opcode(self.string_table),
            value.id
        )
    }

    pub(crate) fn file_name(&self, position: Option<Position>) -> Option<&'a str> {
        position
            .filter(Position::is_valid)
            .map(|position| self.string_table.resolve(position.file))
    }
}
