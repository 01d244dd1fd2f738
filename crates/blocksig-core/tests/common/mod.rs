//! Shared helpers for pipeline integration tests.

use std::collections::BTreeMap;
use std::io::{self, Write};
use std::sync::{Arc, Mutex};

/// Writer whose bytes stay inspectable after the pipeline consumed it.
#[derive(Clone, Default)]
pub struct SharedOutput(Arc<Mutex<Vec<u8>>>);

impl SharedOutput {
    pub fn text(&self) -> String {
        String::from_utf8(self.0.lock().unwrap().clone()).unwrap()
    }

    /// Parse `Block #{index}: {hex}` lines into index -> hex, asserting no duplicates.
    pub fn digests(&self) -> BTreeMap<u64, String> {
        let mut map = BTreeMap::new();
        for line in self.text().lines() {
            let rest = line.strip_prefix("Block #").expect("line prefix");
            let (index, hex) = rest.split_once(": ").expect("line separator");
            let index: u64 = index.parse().expect("numeric index");
            assert!(
                map.insert(index, hex.to_string()).is_none(),
                "duplicate block index {}",
                index
            );
        }
        map
    }
}

impl Write for SharedOutput {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

/// Deterministic pseudo-random bytes.
pub fn sample_bytes(len: usize) -> Vec<u8> {
    let mut x: u32 = 0x9E37_79B9;
    (0..len)
        .map(|_| {
            x ^= x << 13;
            x ^= x >> 17;
            x ^= x << 5;
            (x >> 24) as u8
        })
        .collect()
}
