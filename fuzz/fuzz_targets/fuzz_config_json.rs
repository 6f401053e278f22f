//! Fuzz target: configuration parsing and validation
//!
//! Feeds arbitrary bytes to the JSON config parser and checks:
//! - No panics under any byte sequence
//! - Every config that passes `validate()` builds a `PetService`
//!
//! cargo fuzz run fuzz_config_json

#![no_main]

use libfuzzer_sys::fuzz_target;
use petpal::app::service::PetService;
use petpal::config::PetConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(cfg) = serde_json::from_slice::<PetConfig>(data) else {
        return;
    };
    if cfg.validate().is_ok() {
        assert!(PetService::new(cfg).is_ok(), "validated config rejected");
    }
});
