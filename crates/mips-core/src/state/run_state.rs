use crate::Fault;

/// Execution-state machine observed by the run loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum RunState {
    /// Ready to fetch the next instruction.
    #[default]
    Running,
    /// The halt sentinel was fetched; no further instructions execute.
    Halted,
    /// A fault is latched and no further progress is possible.
    FaultLatched(Fault),
}

impl RunState {
    /// Returns the currently latched fault, if this state is fault-latched.
    #[must_use]
    pub const fn latched_fault(self) -> Option<Fault> {
        match self {
            Self::FaultLatched(fault) => Some(fault),
            Self::Running | Self::Halted => None,
        }
    }

    /// Returns true once the machine can make no further progress.
    #[must_use]
    pub const fn is_stopped(self) -> bool {
        !matches!(self, Self::Running)
    }
}

#[cfg(test)]
mod tests {
    use super::RunState;
    use crate::{Fault, FaultCode};

    const ILLEGAL: Fault = Fault::new(FaultCode::IllegalInstruction, 0x10, 0xFFFF_FFFF);

    #[test]
    fn run_state_default_is_running() {
        assert_eq!(RunState::default(), RunState::Running);
        assert!(!RunState::Running.is_stopped());
    }

    #[test]
    fn latched_fault_accessor_reports_only_fault_latched_variant() {
        assert_eq!(RunState::Running.latched_fault(), None);
        assert_eq!(RunState::Halted.latched_fault(), None);
        assert_eq!(RunState::FaultLatched(ILLEGAL).latched_fault(), Some(ILLEGAL));
    }

    #[test]
    fn halted_and_faulted_are_stopped() {
        assert!(RunState::Halted.is_stopped());
        assert!(RunState::FaultLatched(ILLEGAL).is_stopped());
    }
}
