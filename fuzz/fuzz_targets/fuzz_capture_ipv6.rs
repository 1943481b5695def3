//! Fuzz target: split the input into `[u16 BE length][bytes]` packets and
//! feed them through one IPv6 capture run. If the decoder crashes, the
//! packets up to and including the crashing one stay in `dump/` for
//! `redump replay --decoder ipv6`.

#![no_main]

use libfuzzer_sys::fuzz_target;

use redump::capture::{IterationBudget, MemoryInput, run_capture};
use redump::config::HarnessConfig;
use redump::decode::DecoderKind;
use redump::dump::DumpDir;

fuzz_target!(|data: &[u8]| {
    let dump = DumpDir::new("dump");
    let mut source = MemoryInput::from_length_prefixed(data);
    if let Err(err) = run_capture(
        &dump,
        &mut source,
        &DecoderKind::Ipv6,
        IterationBudget::Unbounded,
        &HarnessConfig::default(),
    ) {
        panic!("harness contract violated: {err}");
    }
});
