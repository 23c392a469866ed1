#![no_main]

use libfuzzer_sys::fuzz_target;
use mips_core::{
    disassemble_word, load_image, run, CoreConfig, CoreState, Decoder, NullTraceSink,
    SparseMemory, ZeroRegisterPolicy,
};

const FUZZ_STEP_LIMIT: u64 = 4096;

fuzz_target!(|data: &[u8]| {
    if data.len() < 4 {
        return;
    }

    let word = u32::from_be_bytes([data[0], data[1], data[2], data[3]]);
    if let Ok(instr) = Decoder::decode(word) {
        assert_eq!(Decoder::decode(instr.encode()), Ok(instr));
    }
    let _ = disassemble_word(0, word);

    let image_len = data.len() - data.len() % 4;
    let mut memory = SparseMemory::new();
    if load_image(&data[..image_len], &mut memory).is_err() {
        return;
    }

    let config = CoreConfig {
        zero_register: if data[0] & 1 == 0 {
            ZeroRegisterPolicy::Writable
        } else {
            ZeroRegisterPolicy::Hardwired
        },
        step_limit: Some(FUZZ_STEP_LIMIT),
        tracing_enabled: false,
    };
    let mut state = CoreState::with_config(&config);
    let outcome = run(&mut state, &mut memory, &config, &mut NullTraceSink);
    assert!(outcome.steps <= FUZZ_STEP_LIMIT + 1);
});
