use crate::canvas::ShapeId;
use crate::model::{NodeTypeId, RelationTypeId};
use crate::specification::FormattingFailure;
use crate::sync::{FlowState, LinkProgress};
use std::path::PathBuf;

/// Errors raised at the document store boundary.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("Document not found: {0}")]
    NotFound(String),

    #[error("Document already exists: {0:?}")]
    AlreadyExists(PathBuf),

    #[error("Invalid frontmatter: {0}")]
    Frontmatter(String),

    #[error("Write rejected: {0}")]
    Rejected(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by a canvas scene graph.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SceneError {
    #[error("Shape already exists: {0}")]
    DuplicateShape(ShapeId),

    #[error("Shape not found: {0}")]
    ShapeNotFound(ShapeId),

    #[error("Invalid binding for {edge}: {reason}")]
    InvalidBinding { edge: ShapeId, reason: String },
}

/// Why a relation between two node shapes (or documents) was refused.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InvalidRelationReason {
    /// One of the endpoints is not a discourse node
    NotANode,
    /// Source and destination are the same node
    SameNode,
    UnknownRelationType,
    /// No declaration permits this relation type between the two node types
    NoDeclaration,
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Invalid relation {relation_type_id} between {source_type:?} and {destination_type:?}: {reason:?}")]
pub struct InvalidRelationPair {
    pub relation_type_id: RelationTypeId,
    pub source_type: Option<NodeTypeId>,
    pub destination_type: Option<NodeTypeId>,
    pub reason: InvalidRelationReason,
}

/// Persistence stage at which a write failed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistStage {
    Document,
    Relation,
}

/// Errors of the node/relation creation flow.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    #[error("Unknown node type: {0}")]
    UnknownNodeType(NodeTypeId),

    #[error("Unknown relation type: {0}")]
    UnknownRelationType(RelationTypeId),

    #[error("Formatting failed: {0}")]
    Formatting(#[from] FormattingFailure),

    #[error(transparent)]
    InvalidRelationPair(#[from] InvalidRelationPair),

    #[error("Failed to persist {stage:?}: {source}")]
    Persistence {
        stage: PersistStage,
        #[source]
        source: StoreError,
    },

    /// One side of the paired back-link write landed, the other did not.
    #[error("Relation only partially persisted ({progress:?}): {source}")]
    PartialPersistence {
        progress: LinkProgress,
        #[source]
        source: StoreError,
    },

    #[error("Failed to materialize canvas shapes: {0}")]
    Visual(#[from] SceneError),

    #[error("Aborted during {state:?}")]
    Aborted { state: FlowState },
}

impl SyncError {
    /// True when the documents on disk were left in a half-linked state.
    pub fn is_partial(&self) -> bool {
        matches!(self, SyncError::PartialPersistence { .. })
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
