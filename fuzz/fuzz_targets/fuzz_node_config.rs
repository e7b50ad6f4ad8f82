//! Fuzz target: persisted node config
//!
//! Decodes arbitrary bytes as a postcard-encoded `NodeConfig`.  Anything
//! that decodes and passes validation must survive a save/load cycle
//! through the NVS adapter unchanged.
//!
//! cargo fuzz run fuzz_node_config

#![no_main]

use libfuzzer_sys::fuzz_target;
use lightnode::adapters::nvs::{NvsAdapter, validate_config};
use lightnode::app::ports::ConfigPort;
use lightnode::config::NodeConfig;

fuzz_target!(|data: &[u8]| {
    let Ok(config) = postcard::from_bytes::<NodeConfig>(data) else {
        return;
    };
    if validate_config(&config).is_err() {
        return;
    }

    let Ok(mut nvs) = NvsAdapter::new() else {
        return;
    };
    nvs.save(&config).expect("valid config must persist");
    assert_eq!(nvs.load().expect("saved config must load"), config);
});
