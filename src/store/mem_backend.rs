use std::cell::RefCell;
use std::collections::HashMap;

use super::backend::StorageBackend;
use crate::error::{Result, StashError};

/// In-memory storage backend for testing.
///
/// Uses `RefCell` for interior mutability since the engine is single-threaded.
/// This avoids the overhead of `RwLock` while still allowing the
/// `StorageBackend` trait to use `&self` for all methods.
pub struct MemBackend {
    blobs: RefCell<HashMap<String, Vec<u8>>>,
    simulate_write_error: RefCell<bool>,
    fail_key: RefCell<Option<String>>,
    fail_key_once: RefCell<Option<String>>,
}

impl Default for MemBackend {
    fn default() -> Self {
        Self {
            blobs: RefCell::new(HashMap::new()),
            simulate_write_error: RefCell::new(false),
            fail_key: RefCell::new(None),
            fail_key_once: RefCell::new(None),
        }
    }
}

impl MemBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fail every write, regardless of key.
    pub fn set_simulate_write_error(&self, simulate: bool) {
        *self.simulate_write_error.borrow_mut() = simulate;
    }

    /// Fail every write to `key` until cleared with `None`.
    pub fn set_fail_key(&self, key: Option<&str>) {
        *self.fail_key.borrow_mut() = key.map(str::to_string);
    }

    /// Fail only the next write to `key`, then behave normally.
    pub fn set_fail_key_once(&self, key: &str) {
        *self.fail_key_once.borrow_mut() = Some(key.to_string());
    }

    fn should_fail(&self, key: &str) -> bool {
        if *self.simulate_write_error.borrow() {
            return true;
        }
        if self.fail_key.borrow().as_deref() == Some(key) {
            return true;
        }
        let mut once = self.fail_key_once.borrow_mut();
        if once.as_deref() == Some(key) {
            *once = None;
            return true;
        }
        false
    }
}

impl StorageBackend for MemBackend {
    fn get(&self, key: &str) -> Result<Option<Vec<u8>>> {
        let blobs = self.blobs.borrow();
        Ok(blobs.get(key).cloned())
    }

    fn set(&self, key: &str, bytes: &[u8]) -> Result<()> {
        if self.should_fail(key) {
            return Err(StashError::Store("Simulated write error".to_string()));
        }
        let mut blobs = self.blobs.borrow_mut();
        blobs.insert(key.to_string(), bytes.to_vec());
        Ok(())
    }
}
