use super::flow::{
    CreatedNode, CreationFlow, FailureKind, FlowState, NodeRequest, Placement, RelationRequest,
};
use super::relation::{link_documents, LinkProgress};
use super::store::{DocumentStore, FieldUpdate};
use super::AbortSignal;
use crate::canvas::{
    node_size, CanvasRelation, CanvasRelationIndex, CanvasScene, CreateRelationOutcome,
    NodeShapeProps, Shape, ShapeId, ShapeProps,
};
use crate::catalog::RelationCatalog;
use crate::config::DiscourseConfig;
use crate::error::{InvalidRelationPair, InvalidRelationReason, PersistStage, StoreError, SyncError};
use crate::model::{DiscourseSettings, DocumentRef, NodeType, NodeTypeId, RelationTypeId};
use crate::settings::SettingsStore;
use crate::specification::{format_title, Classification, SpecificationMatcher};
use crate::utils::id::generate_instance_id;
use serde_json::Value;
use std::sync::Arc;

/// Context for one user action.
///
/// Holds the settings snapshot taken when the action started plus the
/// store and (optionally) the canvas it acts on. Create one per action
/// and drop it afterwards.
pub struct SyncSession<'a> {
    settings: Arc<DiscourseSettings>,
    config: &'a DiscourseConfig,
    store: &'a dyn DocumentStore,
    canvas: Option<&'a mut (dyn CanvasScene + Send + Sync)>,
    abort: AbortSignal,
    flow: CreationFlow,
}

impl<'a> SyncSession<'a> {
    pub fn new(
        settings: &dyn SettingsStore,
        config: &'a DiscourseConfig,
        store: &'a dyn DocumentStore,
    ) -> Self {
        Self {
            settings: settings.snapshot(),
            config,
            store,
            canvas: None,
            abort: AbortSignal::new(),
            flow: CreationFlow::new(),
        }
    }

    pub fn with_canvas(mut self, canvas: &'a mut (dyn CanvasScene + Send + Sync)) -> Self {
        self.canvas = Some(canvas);
        self
    }

    pub fn with_abort(mut self, abort: AbortSignal) -> Self {
        self.abort = abort;
        self
    }

    pub fn settings(&self) -> &DiscourseSettings {
        &self.settings
    }

    pub fn flow(&self) -> &CreationFlow {
        &self.flow
    }

    pub fn state(&self) -> FlowState {
        self.flow.state()
    }

    /// Open the flow for user input. A finished flow starts over.
    pub fn begin(&mut self) {
        if self.flow.state().is_terminal() {
            self.flow.restart();
        }
        if self.flow.state() == FlowState::Idle {
            self.flow.transition(FlowState::AwaitingUserInput);
        }
    }

    /// Classify a stored document by its explicit tag, then by its title.
    pub async fn classify_document(&self, doc: &DocumentRef) -> Result<Classification, StoreError> {
        let frontmatter = self.store.read_frontmatter(doc).await?;
        let tag = frontmatter
            .get(&self.config.vault.node_type_key)
            .and_then(Value::as_str);
        Ok(SpecificationMatcher::new(&self.settings.node_types).classify(&doc.title, tag))
    }

    /// Check that `relation` may join documents of the given types.
    pub fn validate_relation(
        &self,
        relation: &RelationTypeId,
        source_type: Option<&NodeTypeId>,
        destination_type: Option<&NodeTypeId>,
        same_document: bool,
    ) -> Result<(), InvalidRelationPair> {
        let invalid = |reason| InvalidRelationPair {
            relation_type_id: relation.clone(),
            source_type: source_type.cloned(),
            destination_type: destination_type.cloned(),
            reason,
        };

        let (Some(source), Some(destination)) = (source_type, destination_type) else {
            return Err(invalid(InvalidRelationReason::NotANode));
        };
        if same_document {
            return Err(invalid(InvalidRelationReason::SameNode));
        }
        let catalog = RelationCatalog::new(&self.settings);
        if catalog.relation_type(relation).is_none() {
            return Err(invalid(InvalidRelationReason::UnknownRelationType));
        }
        if !catalog.declares(relation, source, destination) {
            return Err(invalid(InvalidRelationReason::NoDeclaration));
        }
        Ok(())
    }

    /// Run the creation flow for `request`.
    ///
    /// Input problems (unknown type, invalid relation, empty title) leave the
    /// flow in `AwaitingUserInput` with nothing written. Store failures end
    /// it in `Failed`.
    pub async fn create_node(&mut self, request: NodeRequest) -> Result<CreatedNode, SyncError> {
        self.begin();

        let settings = Arc::clone(&self.settings);
        let node_type = settings
            .node_type(&request.node_type_id)
            .ok_or_else(|| SyncError::UnknownNodeType(request.node_type_id.clone()))?;

        if let Some(relation) = &request.relation {
            self.check_requested_relation(node_type, &request, relation).await?;
        }

        self.checkpoint()?;
        self.flow.transition(FlowState::Formatting);
        let title = match &request.existing {
            Some(doc) => doc.title.clone(),
            None => match format_title(
                node_type,
                &request.content,
                request.reference.as_ref(),
                &settings.node_types,
            ) {
                Ok(title) => title,
                Err(failure) => {
                    log::warn!("Could not format a {} title: {}", node_type.label, failure);
                    self.flow.transition(FlowState::AwaitingUserInput);
                    return Err(failure.into());
                }
            },
        };

        self.checkpoint()?;
        self.flow.transition(FlowState::PersistingDocument);
        let (document, instance_id) = match request.existing.clone() {
            Some(doc) => (doc, None),
            None => match self.persist_document(&title, node_type).await {
                Ok((doc, instance_id)) => (doc, Some(instance_id)),
                Err(e) => return Err(self.failed(e)),
            },
        };

        let mut link_progress = None;
        if let Some(relation) = &request.relation {
            self.checkpoint()?;
            self.flow.transition(FlowState::PersistingRelation);
            let (source, destination) = if relation.new_node_is_source {
                (&document, &relation.target)
            } else {
                (&relation.target, &document)
            };
            match link_documents(
                self.store,
                &relation.relation_type_id,
                source,
                destination,
                &self.abort,
            )
            .await
            {
                Ok(progress) => link_progress = Some(progress),
                Err(e) => return Err(self.failed(e)),
            }
        }

        let mut shape = None;
        let mut canvas_relation = None;
        if let Some(placement) = &request.placement {
            if let Some(canvas) = self.canvas.take() {
                let materialized = match self.checkpoint() {
                    Ok(()) => {
                        self.flow.transition(FlowState::MaterializingVisual);
                        materialize(
                            &mut *canvas,
                            &settings,
                            self.config,
                            &document,
                            node_type,
                            placement,
                            request.relation.as_ref(),
                        )
                        .map_err(|e| self.failed(e))
                    }
                    Err(e) => Err(e),
                };
                self.canvas = Some(canvas);
                let (node_shape, relation) = materialized?;
                shape = Some(node_shape);
                canvas_relation = relation;
            }
        }

        self.flow.transition(FlowState::Done);
        log::info!("Created {} node '{}'", node_type.label, document.title);

        Ok(CreatedNode {
            document,
            node_type_id: node_type.id.clone(),
            instance_id,
            relation: link_progress,
            shape,
            canvas_relation,
        })
    }

    /// Validate and record a relation between two existing documents.
    pub async fn add_relation(
        &mut self,
        relation: &RelationTypeId,
        source: &DocumentRef,
        destination: &DocumentRef,
    ) -> Result<LinkProgress, SyncError> {
        self.begin();
        if self.settings.relation_type(relation).is_none() {
            return Err(SyncError::UnknownRelationType(relation.clone()));
        }

        let source_class = self.classify_for_relation(source).await?;
        let destination_class = self.classify_for_relation(destination).await?;
        if let Err(invalid) = self.validate_relation(
            relation,
            source_class.node_type_id(),
            destination_class.node_type_id(),
            source.id == destination.id,
        ) {
            log::warn!("{}", invalid);
            return Err(invalid.into());
        }

        self.checkpoint()?;
        self.flow.transition(FlowState::PersistingRelation);
        match link_documents(self.store, relation, source, destination, &self.abort).await {
            Ok(progress) => {
                self.flow.transition(FlowState::Done);
                Ok(progress)
            }
            Err(e) => Err(self.failed(e)),
        }
    }

    async fn check_requested_relation(
        &mut self,
        node_type: &NodeType,
        request: &NodeRequest,
        relation: &RelationRequest,
    ) -> Result<(), SyncError> {
        if self.settings.relation_type(&relation.relation_type_id).is_none() {
            return Err(SyncError::UnknownRelationType(
                relation.relation_type_id.clone(),
            ));
        }

        let target_type = match &relation.target_node_type_id {
            Some(id) => Some(id.clone()),
            None => self
                .classify_for_relation(&relation.target)
                .await?
                .node_type_id()
                .cloned(),
        };

        let (source_type, destination_type) = if relation.new_node_is_source {
            (Some(&node_type.id), target_type.as_ref())
        } else {
            (target_type.as_ref(), Some(&node_type.id))
        };
        let same_document = request
            .existing
            .as_ref()
            .is_some_and(|doc| doc.id == relation.target.id);

        self.validate_relation(
            &relation.relation_type_id,
            source_type,
            destination_type,
            same_document,
        )
        .map_err(|invalid| {
            log::warn!("{}", invalid);
            SyncError::from(invalid)
        })
    }

    async fn classify_for_relation(&mut self, doc: &DocumentRef) -> Result<Classification, SyncError> {
        match self.classify_document(doc).await {
            Ok(classification) => Ok(classification),
            Err(source) => Err(self.failed(SyncError::Persistence {
                stage: PersistStage::Relation,
                source,
            })),
        }
    }

    async fn persist_document(
        &self,
        title: &str,
        node_type: &NodeType,
    ) -> Result<(DocumentRef, String), SyncError> {
        let to_sync_error = |source| SyncError::Persistence {
            stage: PersistStage::Document,
            source,
        };

        let document = self
            .store
            .create_document(title)
            .await
            .map_err(to_sync_error)?;

        let instance_id = generate_instance_id();
        self.store
            .write_frontmatter_field(
                &document,
                &self.config.vault.node_type_key,
                FieldUpdate::Set(Value::String(node_type.id.to_string())),
            )
            .await
            .map_err(to_sync_error)?;
        self.store
            .write_frontmatter_field(
                &document,
                &self.config.vault.instance_id_key,
                FieldUpdate::Set(Value::String(instance_id.clone())),
            )
            .await
            .map_err(to_sync_error)?;

        Ok((document, instance_id))
    }

    fn checkpoint(&mut self) -> Result<(), SyncError> {
        if let Err(e) = self.abort.check(self.flow.state()) {
            self.flow.fail(FailureKind::Aborted);
            return Err(e);
        }
        Ok(())
    }

    fn failed(&mut self, error: SyncError) -> SyncError {
        let kind = match &error {
            SyncError::PartialPersistence { .. } => FailureKind::PartialPersistence,
            SyncError::InvalidRelationPair(_) => FailureKind::InvalidRelation,
            SyncError::Visual(_) => FailureKind::Visual,
            SyncError::Aborted { .. } => FailureKind::Aborted,
            _ => FailureKind::Persistence,
        };
        log::error!("Creation flow failed in {:?}: {}", self.flow.state(), error);
        self.flow.fail(kind);
        error
    }
}

fn materialize(
    canvas: &mut dyn CanvasScene,
    settings: &DiscourseSettings,
    config: &DiscourseConfig,
    document: &DocumentRef,
    node_type: &NodeType,
    placement: &Placement,
    relation: Option<&RelationRequest>,
) -> Result<(ShapeId, Option<CanvasRelation>), SyncError> {
    let size = node_size(
        &config.canvas.text_metrics,
        &document.title,
        Some(node_type),
        placement.image,
    );
    let shape = Shape::new(
        ShapeId::generate(),
        placement.position,
        ShapeProps::Node(NodeShapeProps {
            w: size.w,
            h: size.h,
            src: Some(document.id.clone()),
            title: document.title.clone(),
            node_type_id: node_type.id.clone(),
            image_src: placement.image_src.clone(),
        }),
    );
    let shape_id = shape.id.clone();
    canvas.create_shape(shape)?;

    let Some((relation, target_shape)) =
        relation.and_then(|r| r.target_shape.as_ref().map(|target| (r, target)))
    else {
        return Ok((shape_id, None));
    };

    let (source, destination) = if relation.new_node_is_source {
        (&shape_id, target_shape)
    } else {
        (target_shape, &shape_id)
    };
    let index = CanvasRelationIndex::new(settings, &config.canvas);
    match index.create_relation(canvas, source, destination, &relation.relation_type_id)? {
        CreateRelationOutcome::Created(r) | CreateRelationOutcome::Existing(r) => {
            Ok((shape_id, Some(r)))
        }
        CreateRelationOutcome::Invalid(invalid) => Err(invalid.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::{Canvas, Vec2};
    use crate::frontmatter::Frontmatter;
    use crate::sync::MemoryDocumentStore;
    use serde_json::json;

    fn tagged(node_type: &str) -> Frontmatter {
        let mut fm = Frontmatter::new();
        fm.insert("nodeTypeId".to_string(), json!(node_type));
        fm
    }

    fn supports_target(target: &DocumentRef) -> RelationRequest {
        RelationRequest {
            relation_type_id: RelationTypeId::new("relation_supports"),
            target: target.clone(),
            target_node_type_id: None,
            new_node_is_source: true,
            target_shape: None,
        }
    }

    #[tokio::test]
    async fn test_create_node_formats_and_tags_document() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let mut session = SyncSession::new(&settings, &config, &store);

        let created = session
            .create_node(NodeRequest::new(NodeTypeId::new("node_claim"), "  Sky is blue "))
            .await
            .unwrap();

        assert_eq!(created.document.title, "CLM - Sky is blue");
        let fm = store.read_frontmatter(&created.document).await.unwrap();
        assert_eq!(fm["nodeTypeId"], "node_claim");
        assert_eq!(
            fm["nodeInstanceId"].as_str(),
            created.instance_id.as_deref()
        );
        assert_eq!(
            session.flow().history(),
            &[
                FlowState::Idle,
                FlowState::AwaitingUserInput,
                FlowState::Formatting,
                FlowState::PersistingDocument,
                FlowState::Done,
            ]
        );
    }

    #[tokio::test]
    async fn test_empty_content_returns_to_input() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let mut session = SyncSession::new(&settings, &config, &store);

        let err = session
            .create_node(NodeRequest::new(NodeTypeId::new("node_claim"), "   "))
            .await
            .unwrap_err();

        assert!(matches!(err, SyncError::Formatting(_)));
        assert_eq!(session.state(), FlowState::AwaitingUserInput);
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_relation_is_written_to_both_documents() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let claim = store.insert("CLM - Wet streets", tagged("node_claim"));
        let mut session = SyncSession::new(&settings, &config, &store);

        let created = session
            .create_node(
                NodeRequest::new(NodeTypeId::new("node_evidence"), "Rain at 9am")
                    .with_relation(supports_target(&claim)),
            )
            .await
            .unwrap();

        assert_eq!(
            created.relation,
            Some(LinkProgress {
                source_linked: true,
                dest_linked: true
            })
        );
        assert_eq!(
            store.read_frontmatter(&created.document).await.unwrap()["relation_supports"],
            json!(["[[CLM - Wet streets]]"])
        );
        assert_eq!(
            store.read_frontmatter(&claim).await.unwrap()["relation_supports"],
            json!(["[[EVD - Rain at 9am]]"])
        );
        assert!(session
            .flow()
            .history()
            .contains(&FlowState::PersistingRelation));
    }

    #[tokio::test]
    async fn test_target_classified_by_title() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let claim = store.insert("CLM - Untagged", Frontmatter::new());
        let mut session = SyncSession::new(&settings, &config, &store);

        let mut relation = supports_target(&claim);
        relation.new_node_is_source = false;
        let request = NodeRequest::new(NodeTypeId::new("node_evidence"), "x").with_relation(relation);

        // Evidence as destination of supports from a claim: declared the other
        // way round, still legal
        assert!(session.create_node(request).await.is_ok());
    }

    #[tokio::test]
    async fn test_invalid_relation_writes_nothing() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let claim = store.insert("CLM - Wet streets", tagged("node_claim"));
        let mut session = SyncSession::new(&settings, &config, &store);

        let err = session
            .create_node(
                NodeRequest::new(NodeTypeId::new("node_question"), "Why wet?")
                    .with_relation(supports_target(&claim)),
            )
            .await
            .unwrap_err();

        match err {
            SyncError::InvalidRelationPair(invalid) => {
                assert_eq!(invalid.reason, InvalidRelationReason::NoDeclaration)
            }
            other => panic!("unexpected {:?}", other),
        }
        assert_eq!(store.len(), 1);
        assert_eq!(session.state(), FlowState::AwaitingUserInput);

        let plain = store.insert("Just a note", Frontmatter::new());
        let err = session
            .create_node(
                NodeRequest::new(NodeTypeId::new("node_evidence"), "x")
                    .with_relation(supports_target(&plain)),
            )
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            SyncError::InvalidRelationPair(InvalidRelationPair {
                reason: InvalidRelationReason::NotANode,
                ..
            })
        ));
    }

    #[tokio::test]
    async fn test_partial_link_failure_is_reported() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let claim = store.insert("CLM - Wet streets", tagged("node_claim"));
        store.reject_writes_to("CLM - Wet streets");
        let mut session = SyncSession::new(&settings, &config, &store);

        let err = session
            .create_node(
                NodeRequest::new(NodeTypeId::new("node_evidence"), "Rain")
                    .with_relation(supports_target(&claim)),
            )
            .await
            .unwrap_err();

        assert!(err.is_partial());
        assert_eq!(
            session.state(),
            FlowState::Failed(FailureKind::PartialPersistence)
        );
        assert_eq!(store.len(), 2);
    }

    #[tokio::test]
    async fn test_repeated_flow_creates_distinct_documents() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let mut session = SyncSession::new(&settings, &config, &store);

        let first = session
            .create_node(NodeRequest::new(NodeTypeId::new("node_question"), "Why?"))
            .await
            .unwrap();
        let second = session
            .create_node(NodeRequest::new(NodeTypeId::new("node_question"), "Why?"))
            .await
            .unwrap();

        assert_ne!(first.document.id, second.document.id);
        assert_eq!(store.titles(), vec!["QUE - Why?", "QUE - Why?"]);
    }

    #[tokio::test]
    async fn test_existing_document_is_passed_through() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let existing = store.insert("CLM - Already here", tagged("node_claim"));
        let mut session = SyncSession::new(&settings, &config, &store);

        let created = session
            .create_node(
                NodeRequest::new(NodeTypeId::new("node_claim"), "")
                    .with_existing(existing.clone()),
            )
            .await
            .unwrap();

        assert_eq!(created.document, existing);
        assert_eq!(created.instance_id, None);
        assert_eq!(store.len(), 1);
    }

    #[tokio::test]
    async fn test_abort_stops_before_writing() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let abort = AbortSignal::new();
        abort.abort();
        let mut session = SyncSession::new(&settings, &config, &store).with_abort(abort);

        let err = session
            .create_node(NodeRequest::new(NodeTypeId::new("node_claim"), "x"))
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Aborted {
                state: FlowState::AwaitingUserInput
            }
        ));
        assert_eq!(session.state(), FlowState::Failed(FailureKind::Aborted));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_canvas_flow_materializes_node_and_edge() {
        let settings = DiscourseSettings::default();
        let config = DiscourseConfig::default();
        let store = MemoryDocumentStore::new();
        let claim = store.insert("CLM - Wet streets", tagged("node_claim"));

        let mut canvas = Canvas::new();
        let claim_shape = Shape::new(
            ShapeId::new("shape:claim"),
            Vec2::new(0.0, 0.0),
            ShapeProps::Node(NodeShapeProps {
                w: 160.0,
                h: 64.0,
                src: Some(claim.id.clone()),
                title: claim.title.clone(),
                node_type_id: NodeTypeId::new("node_claim"),
                image_src: None,
            }),
        );
        canvas.create_shape(claim_shape).unwrap();

        let created = {
            let mut session = SyncSession::new(&settings, &config, &store).with_canvas(&mut canvas);
            let mut relation = supports_target(&claim);
            relation.target_shape = Some(ShapeId::new("shape:claim"));
            session
                .create_node(
                    NodeRequest::new(NodeTypeId::new("node_evidence"), "Rain")
                        .with_relation(relation)
                        .with_placement(Placement::at(Vec2::new(400.0, 0.0))),
                )
                .await
                .unwrap()
        };

        let node_shape = created.shape.unwrap();
        let node = canvas.shape(&node_shape).unwrap().as_node().unwrap();
        assert_eq!(node.src.as_deref(), Some(created.document.id.as_str()));
        assert_eq!(node.w, 160.0);

        let relation = created.canvas_relation.unwrap();
        assert_eq!(relation.source, node_shape);
        assert_eq!(relation.label, "supports");

        let index = CanvasRelationIndex::new(&settings, &config.canvas);
        assert_eq!(index.existing_relations(&canvas).len(), 1);
    }
}
