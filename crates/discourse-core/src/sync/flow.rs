use crate::canvas::{CanvasRelation, ImageDimensions, ShapeId, Vec2};
use crate::model::{DocumentRef, NodeTypeId, RelationTypeId};
use serde::Serialize;

use super::LinkProgress;

/// Why a creation flow ended in [`FlowState::Failed`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub enum FailureKind {
    Persistence,
    PartialPersistence,
    InvalidRelation,
    Visual,
    Aborted,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase", tag = "state", content = "reason")]
pub enum FlowState {
    Idle,
    AwaitingUserInput,
    Formatting,
    PersistingDocument,
    PersistingRelation,
    MaterializingVisual,
    Done,
    Failed(FailureKind),
}

impl FlowState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, FlowState::Done | FlowState::Failed(_))
    }
}

/// State of one creation flow, with every state it passed through.
#[derive(Debug, Clone)]
pub struct CreationFlow {
    state: FlowState,
    history: Vec<FlowState>,
}

impl Default for CreationFlow {
    fn default() -> Self {
        Self::new()
    }
}

impl CreationFlow {
    pub fn new() -> Self {
        Self {
            state: FlowState::Idle,
            history: vec![FlowState::Idle],
        }
    }

    pub fn state(&self) -> FlowState {
        self.state
    }

    pub fn history(&self) -> &[FlowState] {
        &self.history
    }

    pub(crate) fn transition(&mut self, next: FlowState) {
        log::debug!("Creation flow: {:?} -> {:?}", self.state, next);
        self.state = next;
        self.history.push(next);
    }

    pub(crate) fn fail(&mut self, kind: FailureKind) {
        self.transition(FlowState::Failed(kind));
    }

    /// Start over after a finished flow
    pub(crate) fn restart(&mut self) {
        *self = Self::new();
    }
}

/// A relation chosen together with the new node
#[derive(Debug, Clone, PartialEq)]
pub struct RelationRequest {
    pub relation_type_id: RelationTypeId,
    pub target: DocumentRef,
    /// Known type of the target; classified from the store when absent
    pub target_node_type_id: Option<NodeTypeId>,
    /// Whether the new node is the relation's source
    pub new_node_is_source: bool,
    /// The target's shape, when the flow runs on a canvas
    pub target_shape: Option<ShapeId>,
}

/// Where to put the node on a canvas
#[derive(Debug, Clone, PartialEq)]
pub struct Placement {
    pub position: Vec2,
    pub image_src: Option<String>,
    pub image: Option<ImageDimensions>,
}

impl Placement {
    pub fn at(position: Vec2) -> Self {
        Self {
            position,
            image_src: None,
            image: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct NodeRequest {
    pub node_type_id: NodeTypeId,
    pub content: String,
    /// Reuse this document instead of creating one
    pub existing: Option<DocumentRef>,
    /// Node substituted into the format's reference placeholder
    pub reference: Option<DocumentRef>,
    pub relation: Option<RelationRequest>,
    pub placement: Option<Placement>,
}

impl NodeRequest {
    pub fn new(node_type_id: NodeTypeId, content: impl Into<String>) -> Self {
        Self {
            node_type_id,
            content: content.into(),
            existing: None,
            reference: None,
            relation: None,
            placement: None,
        }
    }

    pub fn with_existing(mut self, document: DocumentRef) -> Self {
        self.existing = Some(document);
        self
    }

    pub fn with_reference(mut self, reference: DocumentRef) -> Self {
        self.reference = Some(reference);
        self
    }

    pub fn with_relation(mut self, relation: RelationRequest) -> Self {
        self.relation = Some(relation);
        self
    }

    pub fn with_placement(mut self, placement: Placement) -> Self {
        self.placement = Some(placement);
        self
    }
}

/// Everything a successful flow produced
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedNode {
    pub document: DocumentRef,
    pub node_type_id: NodeTypeId,
    /// Set only for newly created documents
    pub instance_id: Option<String>,
    pub relation: Option<LinkProgress>,
    pub shape: Option<ShapeId>,
    pub canvas_relation: Option<CanvasRelation>,
}
