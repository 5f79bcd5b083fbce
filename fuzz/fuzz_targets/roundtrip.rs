#![no_main]
use libfuzzer_sys::fuzz_target;
use lzw12::{decode::Decoder, encode::Encoder, SearchStrategy};

fuzz_target!(|data: &[u8]| {
    let mut linear = Encoder::with_search(SearchStrategy::Linear).compress(data);
    let sorted = Encoder::with_search(SearchStrategy::Sorted).compress(data);
    assert_eq!(linear.to_bytes(), sorted.to_bytes());

    let result = Decoder::new().decompress(&mut linear.buffer, linear.code_words);
    assert_eq!(result.as_deref(), Ok(data));
});
