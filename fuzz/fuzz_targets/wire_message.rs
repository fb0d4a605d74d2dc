#![no_main]

use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &[u8]| {
    if let Ok(message) = volley::fuzzing::read_wire_message_input(data) {
        let encoded = serde_json::to_string(&message);
        debug_assert!(encoded.is_ok());
        if let Ok(encoded) = encoded {
            debug_assert!(!encoded.contains('\n'));
        }
    }
});
