use crate::ssa_analysis::analysis_errors::ErrorLocation;
use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Non-fatal diagnostic raised when the tracer meets an IR shape it does not model.
/// The value involved is always classified as `Unknown`; the run continues.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct TraceWarning {
    pub msg: String,
    pub location: Option<ErrorLocation>,
    pub warning_kind: WarningKind,
}

impl TraceWarning {
    pub fn new(
        msg: impl Into<String>,
        location: Option<ErrorLocation>,
        warning_kind: WarningKind,
    ) -> TraceWarning {
        TraceWarning {
            msg: msg.into(),
            location,
            warning_kind,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize)]
pub enum WarningKind {
    /// Opcode the adapter could not map, or a kind that never yields an error value
    UnrecognizedValue,

    /// Tuple extracted from something other than a call or type assertion
    UnresolvedTuple,

    /// Receive from a channel that is neither a local `make` nor a loaded cell
    UnresolvedChannel,

    /// A channel cell escapes through an instruction the tracer doesn't follow
    EscapingChannel,

    /// Unary operator other than a load or a receive
    UnsupportedOperator,
}

impl Display for WarningKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        let text = match self {
            WarningKind::UnrecognizedValue => "unrecognized value",
            WarningKind::UnresolvedTuple => "unresolved tuple",
            WarningKind::UnresolvedChannel => "unresolved channel",
            WarningKind::EscapingChannel => "escaping channel",
            WarningKind::UnsupportedOperator => "unsupported operator",
        };
        write!(f, "{text}")
    }
}
