#![no_main]
use libfuzzer_sys::fuzz_target;
use pngtex::{Limits, PixelFormat, SizeBy};

fuzz_target!(|data: &[u8]| {
    // Any input must fail with a status or decode; never panic
    let _ = pngtex::decode(data);
    let _ = pngtex::decode_with(
        data,
        SizeBy::PowerOfTwo,
        PixelFormat::Rgba4444,
        Limits::memory(Limits::DEFAULT_MAX_MEMORY),
    );
});
