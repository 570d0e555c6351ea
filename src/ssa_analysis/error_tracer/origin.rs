use serde::Serialize;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Symbolic description of where a value returned through an error slot comes from.
///
/// The `Display` form is the canonical key used to deduplicate origins inside
/// one return slot, and is what ends up in reports.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Origin {
    /// Absence of an error.
    Nil,

    /// Read from a package level variable.
    Global { name: String },

    /// Read from an array, slice or map element. Provenance stops here.
    MemoryAccess,

    /// Unresolved shape. Never fatal.
    Unknown,

    /// Value that closures may overwrite concurrently or after the return.
    /// Closure identities are kept in discovery order without duplicates.
    Modified { closures: Vec<String> },

    /// Received from a channel whose senders could be enumerated.
    Channel { senders: Vec<Origin> },

    /// Loaded from a memory cell, one origin per write site.
    Pointer { origins: Vec<Origin> },

    /// Result `index` of a call. Error arguments are rendered as their own origin.
    FunctionCall {
        name: String,
        args: Vec<String>,
        index: usize,
    },

    /// Merge of control flow edges, one origin per incoming edge in edge order.
    Phi { origins: Vec<Origin> },
}

impl Origin {
    pub fn modified_by(closures: impl IntoIterator<Item = String>) -> Origin {
        let mut unique: Vec<String> = Vec::new();
        for closure in closures {
            if !unique.contains(&closure) {
                unique.push(closure);
            }
        }

        Origin::Modified { closures: unique }
    }

    /// Wrapper kinds are flattened during aggregation and never reported.
    pub fn is_wrapper(&self) -> bool {
        matches!(
            self,
            Origin::Channel { .. } | Origin::Pointer { .. } | Origin::Phi { .. }
        )
    }

    /// Canonical string key.
    pub fn key(&self) -> String {
        self.to_string()
    }
}

fn write_list(f: &mut Formatter<'_>, origins: &[Origin]) -> FmtResult {
    write!(f, "[")?;
    for (index, origin) in origins.iter().enumerate() {
        if index > 0 {
            write!(f, ", ")?;
        }
        write!(f, "{origin}")?;
    }
    write!(f, "]")
}

impl Display for Origin {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Origin::Nil => write!(f, "nil"),
            Origin::Global { name } => write!(f, "global({name})"),
            Origin::MemoryAccess => write!(f, "memory access"),
            Origin::Unknown => write!(f, "Unknown"),
            Origin::Modified { closures } => write!(f, "modified by [{}]", closures.join(", ")),
            Origin::Channel { senders } => {
                write!(f, "channel ")?;
                write_list(f, senders)
            }
            Origin::Pointer { origins } => {
                write!(f, "pointer ")?;
                write_list(f, origins)
            }
            Origin::FunctionCall { name, args, index } => {
                write!(f, "{name}#{index}({})", args.join(", "))
            }
            Origin::Phi { origins } => write_list(f, origins),
        }
    }
}
