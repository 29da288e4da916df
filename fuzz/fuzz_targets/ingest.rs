#![no_main]

use distinct_sketch::ingest::extract_address;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let line = String::from_utf8_lossy(data);
    if let Some(address) = extract_address(&line) {
        assert!(line.contains(address));
        assert_eq!(address.split('.').count(), 4);
        assert!(address.chars().all(|c| c.is_numeric() || c == '.'));
    }
});
