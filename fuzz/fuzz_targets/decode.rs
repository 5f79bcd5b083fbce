#![no_main]
use libfuzzer_sys::fuzz_target;
use lzw12::{decode::Decoder, BitBuffer};

fuzz_target!(|raw_data: &[u8]| {
    // Arbitrary streams must fail cleanly, never panic.
    let mut buffer = BitBuffer::from_bytes(raw_data);
    let code_words = raw_data.len() * 8 / 12;
    let _ = Decoder::new().decompress(&mut buffer, code_words);
});
