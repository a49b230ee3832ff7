//! Transaction applier
//!
//! Drives one request through the apply cycle:
//!
//! ```text
//! Received ──parse──▶ Parsed ──dispatch──┬──▶ Applied (OTHER, no writes)
//!                                        │
//!                                        ▼
//!                                 AddressResolved
//!                                        │ read
//!                                        ▼
//!                                  StateChecked ──write──▶ Applied
//!
//! any failure ──▶ Rejected (returned as Err)
//! ```
//!
//! Each transaction type is handled by a [`TransactionStrategy`] looked up in a
//! [`StrategyTable`]. The write is always the last step, so a rejection never
//! leaves partial state behind.
//!
//! # Invariants
//!
//! - Create-once: an address is written only if it was absent or empty
//! - At most one read and one write per apply
//! - No caching across calls; the only shared state is immutable

use std::collections::{BTreeMap, HashMap};
use std::fmt;

use tracing::{debug, info, warn};

use crate::{
    address::{derive_address, AddressKeyPolicy, LedgerAddress, Namespace, TransactionTypeKey},
    payload,
    port::StateAccess,
    state,
    types::{TransactionRecord, TransactionType},
    Error, Result,
};

/// Stage of an apply cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Request accepted for processing
    Received,
    /// Payload decoded into a record
    Parsed,
    /// Target address derived
    AddressResolved,
    /// Existing state read and checked
    StateChecked,
    /// Terminal: writes committed (possibly none)
    Applied,
    /// Terminal: failure returned to the caller
    Rejected,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Received => "received",
            Stage::Parsed => "parsed",
            Stage::AddressResolved => "address_resolved",
            Stage::StateChecked => "state_checked",
            Stage::Applied => "applied",
            Stage::Rejected => "rejected",
        };
        f.write_str(name)
    }
}

/// Successful outcome of an apply cycle
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Applied {
    /// Type of the applied transaction
    pub transaction_type: TransactionType,

    /// Addresses the store reported as committed
    pub committed: Vec<LedgerAddress>,
}

impl Applied {
    /// Whether the transaction changed no state
    pub fn is_noop(&self) -> bool {
        self.committed.is_empty()
    }
}

/// Everything a strategy may use while applying one record
pub struct ApplyContext<'a> {
    /// Namespace addresses are derived under
    pub namespace: &'a Namespace,

    /// Key policy for address derivation
    pub key_policy: &'a dyn AddressKeyPolicy,

    /// Ledger state for this request
    pub state: &'a dyn StateAccess,
}

impl fmt::Debug for ApplyContext<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApplyContext")
            .field("namespace", self.namespace)
            .field("key_policy", &self.key_policy)
            .finish_non_exhaustive()
    }
}

impl ApplyContext<'_> {
    /// Address `record` is stored under
    pub fn address_of(&self, record: &TransactionRecord) -> LedgerAddress {
        derive_address(self.namespace, &self.key_policy.key(record))
    }
}

/// Validation and state transition for one transaction type
pub trait TransactionStrategy: fmt::Debug + Send + Sync {
    /// Type-specific checks on top of payload validation
    fn validate(&self, _record: &TransactionRecord) -> Result<()> {
        Ok(())
    }

    /// Apply `record`, returning the committed addresses
    fn apply(
        &self,
        record: &TransactionRecord,
        ctx: &ApplyContext<'_>,
    ) -> Result<Vec<LedgerAddress>>;
}

/// Accepts the transaction without touching state
#[derive(Debug, Clone, Copy, Default)]
pub struct NoOp;

impl TransactionStrategy for NoOp {
    fn apply(
        &self,
        _record: &TransactionRecord,
        _ctx: &ApplyContext<'_>,
    ) -> Result<Vec<LedgerAddress>> {
        Ok(Vec::new())
    }
}

/// Stores the record at its address unless something is already there
#[derive(Debug, Clone, Copy, Default)]
pub struct CreateOnce;

impl TransactionStrategy for CreateOnce {
    fn apply(
        &self,
        record: &TransactionRecord,
        ctx: &ApplyContext<'_>,
    ) -> Result<Vec<LedgerAddress>> {
        let address = ctx.address_of(record);
        debug!(stage = %Stage::AddressResolved, %address);

        let mut found = ctx.state.get_state(std::slice::from_ref(&address))?;
        if let Some(bytes) = found.remove(&address).filter(|bytes| !bytes.is_empty()) {
            let existing: TransactionRecord = state::decode(&bytes)?;
            return Err(Error::DuplicateAddress {
                address,
                existing: Box::new(existing),
            });
        }
        debug!(stage = %Stage::StateChecked, %address);

        let encoded = state::encode(record)?;
        let committed = ctx.state.set_state(HashMap::from([(address.clone(), encoded)]))?;
        if committed.is_empty() {
            return Err(Error::Internal(format!(
                "State error: no entries committed for {}",
                address
            )));
        }
        Ok(committed)
    }
}

/// Strategy lookup by transaction type
#[derive(Debug)]
pub struct StrategyTable {
    strategies: BTreeMap<TransactionType, Box<dyn TransactionStrategy>>,
}

impl StrategyTable {
    /// Table with nothing registered
    pub fn empty() -> Self {
        Self {
            strategies: BTreeMap::new(),
        }
    }

    /// Register (or replace) the strategy for a type
    pub fn register(
        mut self,
        transaction_type: TransactionType,
        strategy: impl TransactionStrategy + 'static,
    ) -> Self {
        self.strategies.insert(transaction_type, Box::new(strategy));
        self
    }

    /// Strategy for `transaction_type`, if registered
    pub fn get(&self, transaction_type: TransactionType) -> Option<&dyn TransactionStrategy> {
        self.strategies.get(&transaction_type).map(|s| s.as_ref())
    }
}

impl Default for StrategyTable {
    fn default() -> Self {
        Self::empty()
            .register(TransactionType::Exchange, CreateOnce)
            .register(TransactionType::Other, NoOp)
    }
}

/// Applies transactions against a [`StateAccess`] port
#[derive(Debug)]
pub struct TransactionApplier {
    namespace: Namespace,
    key_policy: Box<dyn AddressKeyPolicy>,
    strategies: StrategyTable,
}

impl TransactionApplier {
    /// Applier for `namespace` with the default key policy and strategies
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            key_policy: Box::new(TransactionTypeKey),
            strategies: StrategyTable::default(),
        }
    }

    /// Replace the address key policy
    pub fn with_key_policy(mut self, key_policy: Box<dyn AddressKeyPolicy>) -> Self {
        self.key_policy = key_policy;
        self
    }

    /// Replace the strategy table
    pub fn with_strategies(mut self, strategies: StrategyTable) -> Self {
        self.strategies = strategies;
        self
    }

    /// Namespace this applier writes under
    pub fn namespace(&self) -> &Namespace {
        &self.namespace
    }

    /// Parse `payload` and apply it
    pub fn apply(&self, payload: &[u8], state: &dyn StateAccess) -> Result<Applied> {
        debug!(stage = %Stage::Received, bytes = payload.len());

        let result = payload::parse(payload)
            .map_err(Error::from)
            .and_then(|record| {
                debug!(stage = %Stage::Parsed, transaction_type = %record.transaction_type);
                self.apply_record(&record, state)
            });

        match &result {
            Ok(applied) => info!(
                stage = %Stage::Applied,
                transaction_type = %applied.transaction_type,
                writes = applied.committed.len(),
                "Transaction applied"
            ),
            Err(err) => warn!(stage = %Stage::Rejected, reason = err.reason(), "{}", err),
        }
        result
    }

    /// Apply an already parsed record
    pub fn apply_record(
        &self,
        record: &TransactionRecord,
        state: &dyn StateAccess,
    ) -> Result<Applied> {
        let strategy = self.strategies.get(record.transaction_type).ok_or_else(|| {
            Error::Internal(format!(
                "No strategy registered for transaction type {}",
                record.transaction_type
            ))
        })?;
        strategy.validate(record)?;

        let ctx = ApplyContext {
            namespace: &self.namespace,
            key_policy: self.key_policy.as_ref(),
            state,
        };
        let committed = strategy.apply(record, &ctx)?;

        Ok(Applied {
            transaction_type: record.transaction_type,
            committed,
        })
    }
}
