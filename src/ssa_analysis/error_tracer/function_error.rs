use crate::ssa_analysis::error_tracer::origin::Origin;
use rustc_hash::FxHashSet;
use std::collections::BTreeMap;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Deduplicated origins of every error-typed return slot of one function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FunctionError {
    /// Display name, also used to drop calls of the function to itself.
    pub name: String,

    /// Number of values the function returns.
    pub tuple_size: usize,
    slots: BTreeMap<usize, ReturnSlot>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
struct ReturnSlot {
    origins: Vec<Origin>,
    seen: FxHashSet<String>,
}

impl ReturnSlot {
    fn push_unique(&mut self, origin: Origin) {
        if self.seen.insert(origin.key()) {
            self.origins.push(origin);
        }
    }
}

impl FunctionError {
    pub fn new(name: impl Into<String>) -> Self {
        FunctionError {
            name: name.into(),
            ..FunctionError::default()
        }
    }

    /// Folds one traced origin into `slot`.
    ///
    /// Channel, pointer and phi origins are unwrapped so only leaf kinds are kept.
    /// Calls to the function itself and empty `Modified` sets are dropped.
    pub fn add_origin(&mut self, slot: usize, origin: Origin) {
        match origin {
            Origin::Pointer { origins } | Origin::Phi { origins } => {
                for nested in origins {
                    self.add_origin(slot, nested);
                }
            }

            Origin::Channel { senders } => {
                for nested in senders {
                    self.add_origin(slot, nested);
                }
            }

            Origin::FunctionCall { ref name, .. } if *name == self.name => {
                self.slots.entry(slot).or_default();
            }

            Origin::Modified { ref closures } if closures.is_empty() => {
                self.slots.entry(slot).or_default();
            }

            Origin::FunctionCall { .. }
            | Origin::Modified { .. }
            | Origin::Nil
            | Origin::Global { .. }
            | Origin::MemoryAccess
            | Origin::Unknown => {
                self.slots.entry(slot).or_default().push_unique(origin);
            }
        }
    }

    /// Origins of one slot in discovery order. Empty for unknown slots.
    pub fn slot(&self, index: usize) -> &[Origin] {
        self.slots
            .get(&index)
            .map(|slot| slot.origins.as_slice())
            .unwrap_or_default()
    }

    /// Non-empty slots in ascending index order.
    pub fn slots(&self) -> impl Iterator<Item = (usize, &[Origin])> + '_ {
        self.slots
            .iter()
            .filter(|(_, slot)| !slot.origins.is_empty())
            .map(|(index, slot)| (*index, slot.origins.as_slice()))
    }

    pub fn has_origins(&self) -> bool {
        self.slots().next().is_some()
    }
}

impl Display for FunctionError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "func {}", self.name)?;

        for (index, origins) in self.slots() {
            let rendered = origins
                .iter()
                .map(Origin::key)
                .collect::<Vec<_>>()
                .join(", ");
            write!(f, " #{index}: [{rendered}]")?;
        }

        Ok(())
    }
}
