//! Handler registration surface
//!
//! The host runtime discovers the handler by family name, version and the
//! namespaces it owns, then calls [`TransactionHandler::apply`] once per
//! transaction. All processing is delegated to the [`TransactionApplier`].

use std::time::Instant;

use crate::{
    applier::{Applied, TransactionApplier},
    config::Config,
    error::ApplyError,
    metrics::Metrics,
    port::StateAccess,
    Result,
};

/// Transaction delivered by the host runtime
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TransactionRequest {
    /// Serialized transaction header, opaque to the processor
    pub header: Vec<u8>,

    /// Comma-separated payload
    pub payload: Vec<u8>,
}

impl TransactionRequest {
    /// Request with an empty header
    pub fn from_payload(payload: impl Into<Vec<u8>>) -> Self {
        Self {
            header: Vec::new(),
            payload: payload.into(),
        }
    }
}

/// Contract between a transaction family and the host runtime
pub trait TransactionHandler: Send + Sync {
    /// Registered family name
    fn family_name(&self) -> &str;

    /// Supported family versions
    fn family_versions(&self) -> Vec<String>;

    /// Namespace prefixes the handler reads and writes under
    fn namespaces(&self) -> Vec<String>;

    /// Apply one transaction against `context`
    fn apply(
        &self,
        request: &TransactionRequest,
        context: &dyn StateAccess,
    ) -> std::result::Result<(), ApplyError>;
}

/// Handler for the `gcxb` card exchange family
pub struct GcxbHandler {
    family_name: String,
    family_version: String,
    applier: TransactionApplier,
    metrics: Option<Metrics>,
}

impl GcxbHandler {
    /// Handler with the default configuration
    pub fn new() -> Self {
        Self::from_config(&Config::default())
    }

    /// Handler for `config`; the namespace is derived here and never changes
    pub fn from_config(config: &Config) -> Self {
        let applier = TransactionApplier::new(config.namespace())
            .with_key_policy(config.address_key.policy());

        tracing::info!(
            family = %config.family_name,
            version = %config.family_version,
            namespace = %applier.namespace(),
            "Registered transaction handler"
        );

        Self {
            family_name: config.family_name.clone(),
            family_version: config.family_version.clone(),
            applier,
            metrics: None,
        }
    }

    /// Attach a metrics collector
    pub fn with_metrics(mut self, metrics: Metrics) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// The underlying applier
    pub fn applier(&self) -> &TransactionApplier {
        &self.applier
    }

    /// Apply `request` and return the detailed outcome
    pub fn process(
        &self,
        request: &TransactionRequest,
        context: &dyn StateAccess,
    ) -> Result<Applied> {
        let started = Instant::now();
        let result = self.applier.apply(&request.payload, context);

        if let Some(metrics) = &self.metrics {
            metrics.record_apply_duration(started.elapsed().as_secs_f64());
            match &result {
                Ok(applied) => {
                    metrics.record_applied(applied.transaction_type.name(), applied.committed.len())
                }
                Err(err) => metrics.record_rejected(err.reason()),
            }
        }
        result
    }
}

impl std::fmt::Debug for GcxbHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GcxbHandler")
            .field("family_name", &self.family_name)
            .field("family_version", &self.family_version)
            .field("applier", &self.applier)
            .field("metrics", &self.metrics.is_some())
            .finish()
    }
}

impl Default for GcxbHandler {
    fn default() -> Self {
        Self::new()
    }
}

impl TransactionHandler for GcxbHandler {
    fn family_name(&self) -> &str {
        &self.family_name
    }

    fn family_versions(&self) -> Vec<String> {
        vec![self.family_version.clone()]
    }

    fn namespaces(&self) -> Vec<String> {
        vec![self.applier.namespace().to_string()]
    }

    fn apply(
        &self,
        request: &TransactionRequest,
        context: &dyn StateAccess,
    ) -> std::result::Result<(), ApplyError> {
        self.process(request, context).map(|_| ()).map_err(ApplyError::from)
    }
}
