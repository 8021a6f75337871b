use std::collections::HashMap;
use std::sync::Arc;

use axum::Router;
use axum::routing::post;

use crate::domain::dispatch::OperationTable;
use crate::domain::gate::Gate;

use super::handlers;

/// Shared state of the admin surface: the gate plus one operation table per
/// facility mount.
#[derive(Clone)]
pub struct AdminState {
    pub gate: Arc<Gate>,
    pub tables: Arc<HashMap<String, Arc<OperationTable>>>,
}

/// Build the admin router: one POST route serving every registered facility.
#[must_use]
pub fn admin_router(gate: Arc<Gate>, tables: Vec<Arc<OperationTable>>) -> Router {
    let tables: HashMap<String, Arc<OperationTable>> = tables
        .into_iter()
        .map(|t| (t.facility().to_owned(), t))
        .collect();

    Router::new()
        .route("/admin/{facility}", post(handlers::handle_admin_op))
        .with_state(AdminState {
            gate,
            tables: Arc::new(tables),
        })
}
