//! Operator-only diagnostic sink.
//!
//! The governance layer reports two kinds of events: a handler that bypassed
//! the envelope contract (warning) and a fault that was masked before reaching
//! the caller (error, with full detail). Both are keyed by execution id.
//! [`TracingSink`] forwards to `tracing`; [`MemorySink`] keeps records in
//! memory for inspection.

use crate::envelope::ExecutionId;
use crate::fault::Fault;
use parking_lot::Mutex;
use tracing::{error, warn};

/// Full detail of a masked fault.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FaultRecord {
    pub execution_id: ExecutionId,
    /// Endpoint or boundary condition where the fault was caught.
    pub origin: String,
    pub kind: String,
    pub message: String,
    /// Source location of a panic, when known.
    pub location: Option<String>,
    pub backtrace: String,
}

impl FaultRecord {
    pub fn new(execution_id: &ExecutionId, origin: &str, fault: &Fault) -> Self {
        Self {
            execution_id: execution_id.clone(),
            origin: origin.to_string(),
            kind: fault.kind().to_string(),
            message: fault.description(),
            location: fault.location().map(str::to_string),
            backtrace: fault.backtrace().to_string(),
        }
    }
}

/// Receiver for governance diagnostics.
pub trait DiagnosticSink: Send + Sync {
    /// A handler returned something other than an envelope and was coerced.
    fn contract_bypass(&self, execution_id: &ExecutionId, endpoint: &str);

    /// A fault was caught and masked.
    fn fault(&self, record: FaultRecord);
}

/// Default sink: structured `tracing` events.
#[derive(Debug, Default, Clone, Copy)]
pub struct TracingSink;

impl DiagnosticSink for TracingSink {
    fn contract_bypass(&self, execution_id: &ExecutionId, endpoint: &str) {
        warn!(
            execution_id = %execution_id,
            endpoint = %endpoint,
            "route returned a non-envelope response; wrapping automatically"
        );
    }

    fn fault(&self, record: FaultRecord) {
        error!(
            execution_id = %record.execution_id,
            origin = %record.origin,
            fault_type = %record.kind,
            fault = %record.message,
            location = ?record.location,
            backtrace = %record.backtrace,
            "fault masked at governance boundary"
        );
    }
}

/// A diagnostic event captured by [`MemorySink`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiagnosticEvent {
    ContractBypass {
        execution_id: ExecutionId,
        endpoint: String,
    },
    Fault(FaultRecord),
}

/// In-memory sink, mainly for tests.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: Mutex<Vec<DiagnosticEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<DiagnosticEvent> {
        self.events.lock().clone()
    }

    pub fn warnings(&self) -> usize {
        self.events
            .lock()
            .iter()
            .filter(|e| matches!(e, DiagnosticEvent::ContractBypass { .. }))
            .count()
    }

    pub fn faults(&self) -> Vec<FaultRecord> {
        self.events
            .lock()
            .iter()
            .filter_map(|e| match e {
                DiagnosticEvent::Fault(r) => Some(r.clone()),
                _ => None,
            })
            .collect()
    }
}

impl DiagnosticSink for MemorySink {
    fn contract_bypass(&self, execution_id: &ExecutionId, endpoint: &str) {
        self.events.lock().push(DiagnosticEvent::ContractBypass {
            execution_id: execution_id.clone(),
            endpoint: endpoint.to_string(),
        });
    }

    fn fault(&self, record: FaultRecord) {
        self.events.lock().push(DiagnosticEvent::Fault(record));
    }
}
