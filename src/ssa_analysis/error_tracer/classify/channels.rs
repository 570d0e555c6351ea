use super::OriginClassifier;
use crate::ssa_analysis::analysis_messages::analysis_warnings::WarningKind;
use crate::ssa_analysis::error_tracer::origin::Origin;
use crate::ssa_analysis::ssa::ssa_nodes::{SsaProgram, SsaValue, UnaryOp, ValueId, ValueKind};
use rustc_hash::FxHashSet;

impl<'a> OriginClassifier<'a, '_> {
    /// Origin of `<-ch`.
    pub(super) fn classify_receive(&mut self, receive: &'a SsaValue) -> Origin {
        let program = self.program;
        let Some(channel) = program.operand(receive, 0) else {
            return self.unresolved(receive, WarningKind::UnresolvedChannel, "receive has no channel operand");
        };

        match channel.kind {
            ValueKind::MakeChan => self.local_channel(channel),

            ValueKind::UnOp(UnaryOp::Deref) => match program.operand(channel, 0) {
                Some(cell) if cell.kind == ValueKind::Alloc => self.shared_channel(cell),
                _ => self.unresolved(
                    receive,
                    WarningKind::UnresolvedChannel,
                    "channel is loaded from something other than a local variable",
                ),
            },

            _ => self.unresolved(
                receive,
                WarningKind::UnresolvedChannel,
                "channel is neither created locally nor loaded from a variable",
            ),
        }
    }

    /// Channel created in this function and never stored anywhere.
    /// Every send on it is known.
    fn local_channel(&mut self, channel: &'a SsaValue) -> Origin {
        let sent = sent_on(self.program, channel.id);

        let mut senders = Vec::with_capacity(sent.len());
        for value in sent {
            senders.push(self.classify(value));
        }

        Origin::Channel { senders }
    }

    /// Channel kept in a variable that closures may capture.
    ///
    /// Sends made through loads of the variable in this function are classified.
    /// Closures that send through their captured copy are named in a trailing
    /// `Modified` entry, which is always present (possibly empty).
    fn shared_channel(&mut self, cell: &'a SsaValue) -> Origin {
        let program = self.program;
        let mut senders = Vec::new();
        let mut closures = Vec::new();

        for referrer in program.referrers(cell) {
            match referrer.kind {
                // Initialisation of the variable
                ValueKind::Store => {}

                ValueKind::UnOp(UnaryOp::Deref) => {
                    for value in sent_on(program, referrer.id) {
                        senders.push(self.classify(value));
                    }
                }

                ValueKind::MakeClosure => {
                    if let Some((function_id, free_var)) = self.captured_by(referrer, cell.id)
                        && self.sends_through(free_var, &mut FxHashSet::default())
                    {
                        closures.push(self.diagnostics.function_name(function_id));
                    }
                }

                _ => {
                    return self.unresolved(
                        referrer,
                        WarningKind::EscapingChannel,
                        "channel variable is used by an instruction the tracer doesn't follow",
                    );
                }
            }
        }

        senders.push(Origin::modified_by(closures));
        Origin::Channel { senders }
    }

    /// Whether a captured channel variable is sent on inside its closure, or
    /// inside a closure nested further in that captures it again.
    fn sends_through(&self, free_var: &'a SsaValue, visited: &mut FxHashSet<ValueId>) -> bool {
        let program = self.program;
        if !visited.insert(free_var.id) {
            return false;
        }

        program.referrers(free_var).any(|referrer| match referrer.kind {
            ValueKind::UnOp(UnaryOp::Deref) => !sent_on(program, referrer.id).is_empty(),
            ValueKind::MakeClosure => self
                .captured_by(referrer, free_var.id)
                .is_some_and(|(_, nested)| self.sends_through(nested, visited)),
            _ => false,
        })
    }
}

/// Values sent with `channel <- value`, in referrer order.
fn sent_on(program: &SsaProgram, channel: ValueId) -> Vec<ValueId> {
    program
        .value(channel)
        .referrers
        .iter()
        .map(|id| program.value(*id))
        .filter_map(|referrer| match (referrer.kind, referrer.operands.as_slice()) {
            (ValueKind::Send, [target, value]) if *target == channel => Some(*value),
            _ => None,
        })
        .collect()
}
