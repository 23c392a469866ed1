use thiserror::Error;

/// Process exit status reported when execution stops on a terminal fault.
pub const FAULT_EXIT_STATUS: u8 = 127;

/// Stable fault taxonomy for conditions that stop the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum FaultCode {
    /// Opcode, or funct under opcode 0, is not in the recognised set.
    #[error("illegal instruction")]
    IllegalInstruction,
    /// A branch or jump was found in the delay slot of another one.
    #[error("control transfer in branch delay slot")]
    ControlTransferInDelaySlot,
}

impl FaultCode {
    /// Process exit status used when this fault ends a run.
    #[must_use]
    pub const fn exit_status(self) -> u8 {
        match self {
            Self::IllegalInstruction | Self::ControlTransferInDelaySlot => FAULT_EXIT_STATUS,
        }
    }
}

/// A fault raised while executing, with the location that raised it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Error)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
#[error("{code}: word {word:#010x} at pc {pc:#010x}")]
pub struct Fault {
    /// Fault classification.
    pub code: FaultCode,
    /// Address the offending word was fetched from.
    pub pc: u32,
    /// The offending instruction word.
    pub word: u32,
}

impl Fault {
    /// Creates a fault for the word fetched at `pc`.
    #[must_use]
    pub const fn new(code: FaultCode, pc: u32, word: u32) -> Self {
        Self { code, pc, word }
    }
}

#[cfg(test)]
mod tests {
    use super::{Fault, FaultCode, FAULT_EXIT_STATUS};

    #[test]
    fn faults_exit_127() {
        for code in [
            FaultCode::IllegalInstruction,
            FaultCode::ControlTransferInDelaySlot,
        ] {
            assert_eq!(code.exit_status(), FAULT_EXIT_STATUS);
        }
    }

    #[test]
    fn fault_display_names_word_and_pc() {
        let fault = Fault::new(FaultCode::IllegalInstruction, 0x10, 0xFFFF_FFFF);
        assert_eq!(
            fault.to_string(),
            "illegal instruction: word 0xffffffff at pc 0x00000010"
        );
    }
}
