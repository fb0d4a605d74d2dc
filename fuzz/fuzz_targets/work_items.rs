#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        if let Ok(items) = volley::fuzzing::parse_work_items_input(input) {
            for item in &items {
                debug_assert!(!item.line().is_empty());
            }
        }
    }
});
