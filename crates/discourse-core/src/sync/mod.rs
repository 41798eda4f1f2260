//! Node/Relation Sync Engine
//!
//! Creates discourse node documents, writes relation back-links into both
//! endpoints and, on a canvas, materializes the node and edge shapes.

mod flow;
mod relation;
mod session;
mod store;

pub use flow::{
    CreatedNode, CreationFlow, FailureKind, FlowState, NodeRequest, Placement, RelationRequest,
};
pub use relation::{link_documents, LinkProgress};
pub use session::SyncSession;
pub use store::{apply_field_update, DocumentStore, FieldUpdate, FieldWrite, MemoryDocumentStore};

use crate::error::SyncError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Caller-side cancellation for a running flow.
///
/// Steps already written stay written; the flow just stops awaiting the next one.
#[derive(Debug, Clone, Default)]
pub struct AbortSignal(Arc<AtomicBool>);

impl AbortSignal {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn abort(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_aborted(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    pub(crate) fn check(&self, state: FlowState) -> Result<(), SyncError> {
        if self.is_aborted() {
            log::info!("Creation flow aborted during {:?}", state);
            return Err(SyncError::Aborted { state });
        }
        Ok(())
    }
}
