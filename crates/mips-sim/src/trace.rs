//! Trace sink forwarding engine events to the `tracing` subscriber.

use mips_core::{disassemble_word, TraceEvent, TraceSink};

/// Logs every engine event at `trace` level, instructions with their disassembly.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogTraceSink {
    events: u64,
}

impl LogTraceSink {
    /// Number of events received so far.
    #[must_use]
    pub const fn events(&self) -> u64 {
        self.events
    }
}

impl TraceSink for LogTraceSink {
    fn on_event(&mut self, event: TraceEvent) {
        self.events += 1;
        match event {
            TraceEvent::InstructionStart { pc, word } => {
                tracing::trace!("{}", disassemble_word(pc, word));
            }
            TraceEvent::InstructionRetired { pc, instruction } => {
                tracing::trace!(pc = format_args!("{pc:#010x}"), "retired {instruction}");
            }
            TraceEvent::MemoryAccess { access, is_write } => {
                tracing::trace!(
                    addr = format_args!("{:#010x}", access.addr),
                    value = format_args!("{:#x}", access.value),
                    width = access.width.bytes(),
                    "{}",
                    if is_write { "store" } else { "load" }
                );
            }
            TraceEvent::FaultRaised { fault } => tracing::trace!(%fault, "fault raised"),
            TraceEvent::Halted { pc } => tracing::trace!(pc = format_args!("{pc:#010x}"), "halt"),
        }
    }
}
