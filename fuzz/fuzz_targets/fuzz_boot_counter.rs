//! Fuzz target: persisted reboot counter
//!
//! Feeds arbitrary bytes in as the stored `boot_times` value and boots a
//! guard against it, verifying:
//! - No panics on short, long or out-of-range values
//! - The counter written back is always 4 bytes and within `1..=K`
//!
//! cargo fuzz run fuzz_boot_counter

#![no_main]

use std::collections::HashMap;

use libfuzzer_sys::fuzz_target;
use lightnode::app::ports::{StorageError, StoragePort};
use lightnode::config::RebootGuardConfig;
use lightnode::reboot_guard::{
    COUNTER_KEY, COUNTER_NAMESPACE, GuardOutcome, RebootGuard, decode_counter,
};

struct MemStore {
    data: HashMap<String, Vec<u8>>,
}

impl StoragePort for MemStore {
    fn read(&self, ns: &str, key: &str, buf: &mut [u8]) -> Result<usize, StorageError> {
        match self.data.get(&format!("{ns}::{key}")) {
            Some(v) => {
                let n = v.len().min(buf.len());
                buf[..n].copy_from_slice(&v[..n]);
                Ok(n)
            }
            None => Err(StorageError::NotFound),
        }
    }

    fn write(&mut self, ns: &str, key: &str, data: &[u8]) -> Result<(), StorageError> {
        self.data.insert(format!("{ns}::{key}"), data.to_vec());
        Ok(())
    }

    fn exists(&self, ns: &str, key: &str) -> bool {
        self.data.contains_key(&format!("{ns}::{key}"))
    }

    fn delete(&mut self, ns: &str, key: &str) -> Result<(), StorageError> {
        self.data.remove(&format!("{ns}::{key}"));
        Ok(())
    }
}

fuzz_target!(|data: &[u8]| {
    let Some((&k_seed, stored)) = data.split_first() else {
        return;
    };
    let k = u32::from(k_seed % 8) + 1;

    let v = decode_counter(stored, k);
    assert!(v <= k, "decoded {} outside 0..={}", v, k);

    let mut store = MemStore {
        data: HashMap::new(),
    };
    store
        .data
        .insert(format!("{COUNTER_NAMESPACE}::{COUNTER_KEY}"), stored.to_vec());

    let mut guard = RebootGuard::new(RebootGuardConfig {
        reset_count: k,
        window_ms: 3_000,
    });
    let outcome = guard.on_startup(&mut store, 1);
    assert_eq!(outcome == GuardOutcome::FactoryReset, v <= 1);

    let written = &store.data[&format!("{COUNTER_NAMESPACE}::{COUNTER_KEY}")];
    assert_eq!(written.len(), 4);
    assert!((1..=k).contains(&decode_counter(written, k)));
});
