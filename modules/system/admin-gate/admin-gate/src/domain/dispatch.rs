//! Operation dispatch.
//!
//! Composition instead of a servlet hierarchy: each facility contributes an
//! [`OperationTable`] mapping `(scope, op-type)` to a handler entry that
//! declares the `(resource, operation)` pair the authorization decision is
//! evaluated against. `dispatch` runs the full gate pipeline; a denied
//! decision never reaches the handler.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use gate_security::{OperationResult, SessionContext};
use tokio::sync::Mutex;

use crate::domain::gate::Gate;
use crate::domain::request::{AdminRequest, OpType};

/// One administrative operation handler.
#[async_trait]
pub trait OperationHandler: Send + Sync {
    async fn handle(&self, session: &SessionContext, req: &AdminRequest) -> OperationResult;
}

/// Registration for one `(scope, op-type)` pair.
pub struct OperationEntry {
    /// Authorization resource, e.g. `certServer.log.configuration`.
    pub resource: String,
    /// Authorization operation verb, e.g. `modify`.
    pub operation: String,
    /// Mutating entries serialize through the table's lock.
    pub mutating: bool,
    pub handler: Arc<dyn OperationHandler>,
}

impl OperationEntry {
    #[must_use]
    pub fn new(
        resource: impl Into<String>,
        operation: impl Into<String>,
        mutating: bool,
        handler: Arc<dyn OperationHandler>,
    ) -> Self {
        Self {
            resource: resource.into(),
            operation: operation.into(),
            mutating,
            handler,
        }
    }
}

/// Outcome of a dispatch, split so the transport can distinguish a rejected
/// request (HTTP-level failure) from a completed one carrying a structured
/// status.
#[derive(Debug)]
pub enum DispatchOutcome {
    /// Authentication failed; already audited by the gate.
    Unauthenticated(OperationResult),
    /// The pipeline ran; the embedded status tells the admin client what
    /// happened.
    Completed(OperationResult),
}

impl DispatchOutcome {
    #[must_use]
    pub fn result(&self) -> &OperationResult {
        match self {
            DispatchOutcome::Unauthenticated(r) | DispatchOutcome::Completed(r) => r,
        }
    }
}

/// Per-facility operation table.
///
/// Mutating operations on the same table serialize through one lock
/// (per-servlet mutual exclusion in the source system); tables of different
/// facilities proceed independently.
pub struct OperationTable {
    facility: String,
    entries: HashMap<(String, OpType), OperationEntry>,
    mutate_lock: Mutex<()>,
}

impl OperationTable {
    #[must_use]
    pub fn new(facility: impl Into<String>) -> Self {
        Self {
            facility: facility.into(),
            entries: HashMap::new(),
            mutate_lock: Mutex::new(()),
        }
    }

    #[must_use]
    pub fn facility(&self) -> &str {
        &self.facility
    }

    /// Register a handler entry; replaces any previous entry for the pair.
    #[must_use]
    pub fn operation(mut self, scope: impl Into<String>, op: OpType, entry: OperationEntry) -> Self {
        self.entries.insert((scope.into(), op), entry);
        self
    }

    /// Run the pipeline: authenticate → resolve entry → authorize → handle.
    pub async fn dispatch(&self, gate: &Gate, req: &AdminRequest) -> DispatchOutcome {
        let mut session = match gate.authenticate(req).await {
            Ok(session) => session,
            Err(e) => {
                return DispatchOutcome::Unauthenticated(OperationResult::error(e.to_string()));
            }
        };

        let (Some(op), Some(scope)) = (req.op_type(), req.scope()) else {
            return DispatchOutcome::Completed(OperationResult::error(
                "missing operation type or scope",
            ));
        };

        let Some(entry) = self.entries.get(&(scope.to_owned(), op)) else {
            return DispatchOutcome::Completed(OperationResult::error(format!(
                "unknown operation {} on scope {scope}",
                op.as_str()
            )));
        };

        // Fail closed: a denial or evaluation error never reaches the
        // handler.
        if let Err(reason) = gate
            .authorize(&mut session, &entry.resource, &entry.operation)
            .await
        {
            return DispatchOutcome::Completed(OperationResult::error(reason.to_string()));
        }

        let result = if entry.mutating {
            let _serialized = self.mutate_lock.lock().await;
            entry.handler.handle(&session, req).await
        } else {
            entry.handler.handle(&session, req).await
        };
        DispatchOutcome::Completed(result)
    }
}

impl std::fmt::Debug for OperationTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("OperationTable")
            .field("facility", &self.facility)
            .field("entries", &self.entries.keys().collect::<Vec<_>>())
            .finish_non_exhaustive()
    }
}
