#![no_main]

use distinct_sketch::MembershipFilter;
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    let mut filter = MembershipFilter::new(512, 4);
    for chunk in data.chunks(3) {
        filter.add(chunk);
    }
    for chunk in data.chunks(3) {
        assert!(filter.contains(chunk));
    }
    assert!(filter.len() <= 4 * data.chunks(3).count());
});
