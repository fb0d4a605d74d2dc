#![no_main]

use libfuzzer_sys::fuzz_target;
use volley::config::types::ConfigFile;

fuzz_target!(|data: &[u8]| {
    if let Ok(input) = std::str::from_utf8(data) {
        let parsed: Option<ConfigFile> = toml::from_str(input).ok();
        let applied = volley::fuzzing::apply_config_from_toml(input);
        if applied.is_ok() {
            if let Some(config) = parsed {
                if let Some(workers) = config.worker_count {
                    debug_assert!(workers >= 1);
                }
                if let Some(processes) = config.processes {
                    debug_assert!(processes >= 1);
                }
            }
        }
    }
});
