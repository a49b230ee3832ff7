//! In-memory state store
//!
//! Backs the replay binary and the test suites. Faults can be injected to
//! drive the processor's store-failure paths.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};

use parking_lot::RwLock;

use crate::{
    address::{LedgerAddress, Namespace},
    port::{StateAccess, StateStoreError},
};

/// Fault injected into store calls
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Fault {
    /// Behave normally
    #[default]
    None,
    /// Accept writes but report nothing committed
    DropWrites,
    /// Fail every read
    FailReads,
    /// Fail every write
    FailWrites,
}

/// Map-backed [`StateAccess`] implementation
#[derive(Debug, Default)]
pub struct InMemoryState {
    entries: RwLock<HashMap<LedgerAddress, Vec<u8>>>,
    authorized: Option<Namespace>,
    fault: Fault,
    reads: AtomicUsize,
    writes: AtomicUsize,
}

impl InMemoryState {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Reject reads and writes outside `namespace`
    pub fn restricted_to(mut self, namespace: Namespace) -> Self {
        self.authorized = Some(namespace);
        self
    }

    /// Inject a fault into every subsequent call
    pub fn with_fault(mut self, fault: Fault) -> Self {
        self.fault = fault;
        self
    }

    /// Seed an entry directly, bypassing write accounting
    pub fn insert(&self, address: LedgerAddress, value: Vec<u8>) {
        self.entries.write().insert(address, value);
    }

    /// Current value at `address`
    pub fn get(&self, address: &LedgerAddress) -> Option<Vec<u8>> {
        self.entries.read().get(address).cloned()
    }

    /// Number of stored entries
    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    /// Whether the store holds nothing
    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Number of `get_state` calls served
    pub fn read_count(&self) -> usize {
        self.reads.load(Ordering::SeqCst)
    }

    /// Number of `set_state` calls served
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    fn authorize(&self, address: &LedgerAddress) -> Result<(), StateStoreError> {
        match &self.authorized {
            Some(namespace) if !namespace.owns(address) => {
                Err(StateStoreError::Unauthorized(address.clone()))
            }
            _ => Ok(()),
        }
    }
}

impl StateAccess for InMemoryState {
    fn get_state(
        &self,
        addresses: &[LedgerAddress],
    ) -> Result<HashMap<LedgerAddress, Vec<u8>>, StateStoreError> {
        self.reads.fetch_add(1, Ordering::SeqCst);
        if self.fault == Fault::FailReads {
            return Err(StateStoreError::Read("injected read failure".to_string()));
        }

        let entries = self.entries.read();
        let mut found = HashMap::with_capacity(addresses.len());
        for address in addresses {
            self.authorize(address)?;
            if let Some(value) = entries.get(address) {
                found.insert(address.clone(), value.clone());
            }
        }
        Ok(found)
    }

    fn set_state(
        &self,
        entries: HashMap<LedgerAddress, Vec<u8>>,
    ) -> Result<Vec<LedgerAddress>, StateStoreError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        match self.fault {
            Fault::FailWrites => {
                return Err(StateStoreError::Write("injected write failure".to_string()))
            }
            Fault::DropWrites => return Ok(Vec::new()),
            _ => {}
        }

        for address in entries.keys() {
            self.authorize(address)?;
        }

        let mut stored = self.entries.write();
        let mut committed = Vec::with_capacity(entries.len());
        for (address, value) in entries {
            committed.push(address.clone());
            stored.insert(address, value);
        }
        committed.sort();

        tracing::trace!(count = committed.len(), "Committed state entries");
        Ok(committed)
    }
}
