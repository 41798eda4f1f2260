//! Canvas Relation Index
//!
//! Derives relation instances from the live shape set on every query.
//! An edge's endpoints come from its binding. Edges without a binding
//! (older canvases) connect two nodes when its start and end each lie
//! within the configured proximity threshold of one node's center, or are
//! ignored when the fallback is off.

use super::geometry::{Rect, Vec2};
use super::scene::{CanvasScene, RelationBinding};
use super::shape::{RelationShapeProps, Shape, ShapeId, ShapeProps};
use crate::catalog::RelationCatalog;
use crate::config::CanvasConfig;
use crate::error::{InvalidRelationPair, InvalidRelationReason, SceneError};
use crate::model::{DiscourseSettings, NodeTypeId, RelationTypeId};
use serde::Serialize;
use std::collections::HashSet;

/// A relation between two node shapes on one canvas.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CanvasRelation {
    /// `{source}-{destination}-{relation type}`
    pub id: String,
    pub relation_type_id: RelationTypeId,
    pub source: ShapeId,
    pub destination: ShapeId,
    pub label: String,
    pub exists: bool,
    /// The edge shape, when one exists
    pub edge: Option<ShapeId>,
}

impl CanvasRelation {
    pub fn candidate_id(source: &ShapeId, destination: &ShapeId, relation: &RelationTypeId) -> String {
        format!("{}-{}-{}", source, destination, relation)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum CreateRelationOutcome {
    Created(CanvasRelation),
    /// The pair was already connected by this relation type
    Existing(CanvasRelation),
    Invalid(InvalidRelationPair),
}

impl CreateRelationOutcome {
    pub fn relation(&self) -> Option<&CanvasRelation> {
        match self {
            CreateRelationOutcome::Created(r) | CreateRelationOutcome::Existing(r) => Some(r),
            CreateRelationOutcome::Invalid(_) => None,
        }
    }
}

pub struct CanvasRelationIndex<'a> {
    settings: &'a DiscourseSettings,
    proximity: Option<f64>,
}

impl<'a> CanvasRelationIndex<'a> {
    pub fn new(settings: &'a DiscourseSettings, config: &CanvasConfig) -> Self {
        Self::with_proximity(settings, config.legacy_proximity_threshold)
    }

    pub fn with_proximity(settings: &'a DiscourseSettings, proximity: Option<f64>) -> Self {
        Self {
            settings,
            proximity,
        }
    }

    fn catalog(&self) -> RelationCatalog<'a> {
        RelationCatalog::new(self.settings)
    }

    /// Source and destination node shapes of `edge`.
    ///
    /// An unbound edge resolves to the pair of distinct nodes whose centers
    /// lie within the threshold of its start and end, preferring pairs the
    /// catalog declares for the edge's relation type, then the closest pair.
    pub fn endpoints(&self, scene: &dyn CanvasScene, edge: &Shape) -> Option<(ShapeId, ShapeId)> {
        let props = edge.as_relation()?;
        if let Some(binding) = scene.binding(&edge.id) {
            return Some((binding.source.clone(), binding.destination.clone()));
        }

        let threshold = self.proximity?;
        let (start, end) = edge.relation_endpoints()?;
        let near_start = nodes_near(scene, start, threshold);
        let near_end = nodes_near(scene, end, threshold);
        let catalog = self.catalog();

        near_start
            .iter()
            .flat_map(|s| near_end.iter().map(move |d| (s, d)))
            .filter(|(s, d)| s.id != d.id)
            .map(|(s, d)| {
                let declared = catalog.declares(&props.relation_type_id, s.node_type, d.node_type);
                (!declared, s.distance + d.distance, s, d)
            })
            .min_by(|a, b| a.0.cmp(&b.0).then(a.1.total_cmp(&b.1)))
            .map(|(_, _, s, d)| (s.id.clone(), d.id.clone()))
    }

    /// Whether `edge` joins `a` and `b`, in either direction.
    pub fn is_connected(
        &self,
        scene: &dyn CanvasScene,
        edge: &Shape,
        a: &ShapeId,
        b: &ShapeId,
    ) -> bool {
        self.connection(scene, edge, a, b).is_some()
    }

    /// `(a, b)` or `(b, a)`, following the direction `edge` runs between them.
    ///
    /// Unbound edges are tested against the two queried centers only, so a
    /// third node overlapping either end does not hide the connection.
    fn connection(
        &self,
        scene: &dyn CanvasScene,
        edge: &Shape,
        a: &ShapeId,
        b: &ShapeId,
    ) -> Option<(ShapeId, ShapeId)> {
        if !edge.is_relation() || a == b {
            return None;
        }
        if let Some(binding) = scene.binding(&edge.id) {
            return if &binding.source == a && &binding.destination == b {
                Some((a.clone(), b.clone()))
            } else if &binding.source == b && &binding.destination == a {
                Some((b.clone(), a.clone()))
            } else {
                None
            };
        }

        let threshold = self.proximity?;
        let (start, end) = edge.relation_endpoints()?;
        let center_a = scene.shape(a).filter(|s| s.is_node()).and(scene.shape_center(a))?;
        let center_b = scene.shape(b).filter(|s| s.is_node()).and(scene.shape_center(b))?;
        let near = |point: Vec2, center: Vec2| point.distance(center) < threshold;

        if near(start, center_a) && near(end, center_b) {
            Some((a.clone(), b.clone()))
        } else if near(start, center_b) && near(end, center_a) {
            Some((b.clone(), a.clone()))
        } else {
            None
        }
    }

    /// Every relation edge whose endpoints resolve to node shapes.
    pub fn existing_relations(&self, scene: &dyn CanvasScene) -> Vec<CanvasRelation> {
        scene
            .shapes()
            .into_iter()
            .filter_map(|shape| {
                let props = shape.as_relation()?;
                let Some((source, destination)) = self.endpoints(scene, shape) else {
                    log::debug!("Relation edge {} is not attached to two nodes", shape.id);
                    return None;
                };
                Some(CanvasRelation {
                    id: CanvasRelation::candidate_id(&source, &destination, &props.relation_type_id),
                    relation_type_id: props.relation_type_id.clone(),
                    label: props.text.clone(),
                    source,
                    destination,
                    exists: true,
                    edge: Some(shape.id.clone()),
                })
            })
            .collect()
    }

    /// The edge of type `relation` joining `a` and `b`, if any.
    pub fn find_edge<'s>(
        &self,
        scene: &'s dyn CanvasScene,
        a: &ShapeId,
        b: &ShapeId,
        relation: &RelationTypeId,
    ) -> Option<&'s Shape> {
        scene.shapes().into_iter().find(|shape| {
            shape
                .as_relation()
                .is_some_and(|props| &props.relation_type_id == relation)
                && self.is_connected(scene, shape, a, b)
        })
    }

    /// Every relation `node` could take part in with the other nodes on the canvas.
    ///
    /// Candidates come only from catalog declarations, so each one is legal.
    pub fn possible_relations(&self, scene: &dyn CanvasScene, node: &ShapeId) -> Vec<CanvasRelation> {
        let Some(node_type) = node_type_of(scene, node) else {
            return Vec::new();
        };
        let catalog = self.catalog();
        let nodes: Vec<&Shape> = scene.shapes().into_iter().filter(|s| s.is_node()).collect();

        let mut seen = HashSet::new();
        let mut candidates = Vec::new();

        for option in catalog.available_relation_types(&node_type) {
            let counterpart_types =
                catalog.counterparts(&node_type, &option.relation_type_id, option.is_source);

            for other in &nodes {
                if &other.id == node {
                    continue;
                }
                let Some(other_type) = other.as_node().map(|p| &p.node_type_id) else {
                    continue;
                };
                if !counterpart_types.iter().any(|nt| &nt.id == other_type) {
                    continue;
                }

                let (source, destination) = if option.is_source {
                    (node.clone(), other.id.clone())
                } else {
                    (other.id.clone(), node.clone())
                };
                let id = CanvasRelation::candidate_id(&source, &destination, &option.relation_type_id);
                if !seen.insert(id.clone()) {
                    continue;
                }

                let edge = self
                    .find_edge(scene, &source, &destination, &option.relation_type_id)
                    .map(|e| e.id.clone());
                let (source_type, destination_type) = if option.is_source {
                    (&node_type, other_type)
                } else {
                    (other_type, &node_type)
                };

                candidates.push(CanvasRelation {
                    id,
                    label: catalog
                        .directional_label(&option.relation_type_id, source_type, destination_type)
                        .unwrap_or_else(|| option.label.clone()),
                    relation_type_id: option.relation_type_id.clone(),
                    source,
                    destination,
                    exists: edge.is_some(),
                    edge,
                });
            }
        }

        candidates
    }

    /// Check that `relation` may join `source` and `destination`.
    pub fn validate_pair(
        &self,
        scene: &dyn CanvasScene,
        source: &ShapeId,
        destination: &ShapeId,
        relation: &RelationTypeId,
    ) -> Result<(NodeTypeId, NodeTypeId), InvalidRelationPair> {
        let source_type = node_type_of(scene, source);
        let destination_type = node_type_of(scene, destination);
        let invalid = |reason| InvalidRelationPair {
            relation_type_id: relation.clone(),
            source_type: source_type.clone(),
            destination_type: destination_type.clone(),
            reason,
        };

        let (Some(s), Some(d)) = (source_type.clone(), destination_type.clone()) else {
            return Err(invalid(InvalidRelationReason::NotANode));
        };
        if source == destination {
            return Err(invalid(InvalidRelationReason::SameNode));
        }
        let catalog = self.catalog();
        if catalog.relation_type(relation).is_none() {
            return Err(invalid(InvalidRelationReason::UnknownRelationType));
        }
        if !catalog.declares(relation, &s, &d) {
            return Err(invalid(InvalidRelationReason::NoDeclaration));
        }
        Ok((s, d))
    }

    /// Draw `relation` from `source` to `destination`, unless the pair is
    /// invalid or already connected by that relation type.
    pub fn create_relation(
        &self,
        scene: &mut dyn CanvasScene,
        source: &ShapeId,
        destination: &ShapeId,
        relation: &RelationTypeId,
    ) -> Result<CreateRelationOutcome, SceneError> {
        let (source_type, destination_type) =
            match self.validate_pair(scene, source, destination, relation) {
                Ok(types) => types,
                Err(invalid) => {
                    log::warn!("{}", invalid);
                    return Ok(CreateRelationOutcome::Invalid(invalid));
                }
            };

        if let Some(edge) = self.find_edge(scene, source, destination, relation) {
            log::debug!("Relation {} already exists as {}", relation, edge.id);
            let (s, d) = self
                .connection(scene, edge, source, destination)
                .unwrap_or_else(|| (source.clone(), destination.clone()));
            return Ok(CreateRelationOutcome::Existing(CanvasRelation {
                id: CanvasRelation::candidate_id(&s, &d, relation),
                relation_type_id: relation.clone(),
                label: edge.as_relation().map(|p| p.text.clone()).unwrap_or_default(),
                source: s,
                destination: d,
                exists: true,
                edge: Some(edge.id.clone()),
            }));
        }

        let (start, end) = self.anchor_points(scene, source, destination)?;
        let label = self
            .catalog()
            .directional_label(relation, &source_type, &destination_type)
            .unwrap_or_default();
        let edge = edge_shape(ShapeId::generate(), relation.clone(), label.clone(), start, end);
        let edge_id = edge.id.clone();

        scene.create_shape(edge)?;
        scene.create_binding(RelationBinding::new(
            edge_id.clone(),
            source.clone(),
            destination.clone(),
        ))?;
        log::info!("Created relation {} ({} -> {})", relation, source, destination);

        Ok(CreateRelationOutcome::Created(CanvasRelation {
            id: CanvasRelation::candidate_id(source, destination, relation),
            relation_type_id: relation.clone(),
            source: source.clone(),
            destination: destination.clone(),
            label,
            exists: true,
            edge: Some(edge_id),
        }))
    }

    /// Remove an edge. Its binding goes first so nothing points at a missing shape.
    pub fn delete_relation(&self, scene: &mut dyn CanvasScene, edge: &ShapeId) -> Option<Shape> {
        if !scene.shape(edge).is_some_and(Shape::is_relation) {
            return None;
        }
        scene.delete_binding(edge);
        scene.delete_shape(edge)
    }

    /// Move a node shape and re-anchor every edge bound to it.
    pub fn move_node(
        &self,
        scene: &mut dyn CanvasScene,
        node: &ShapeId,
        to: Vec2,
    ) -> Result<(), SceneError> {
        let mut shape = scene
            .shape(node)
            .cloned()
            .ok_or_else(|| SceneError::ShapeNotFound(node.clone()))?;
        shape.x = to.x;
        shape.y = to.y;
        scene.update_shape(shape)?;

        let bound: Vec<RelationBinding> = scene.bindings_to(node).into_iter().cloned().collect();
        for binding in bound {
            self.reanchor(scene, &binding)?;
        }
        Ok(())
    }

    /// Point a bound edge at the centers of its two nodes.
    pub fn reanchor(
        &self,
        scene: &mut dyn CanvasScene,
        binding: &RelationBinding,
    ) -> Result<(), SceneError> {
        let (start, end) = self.anchor_points(scene, &binding.source, &binding.destination)?;
        let mut edge = scene
            .shape(&binding.edge)
            .cloned()
            .ok_or_else(|| SceneError::ShapeNotFound(binding.edge.clone()))?;

        let ShapeProps::Relation(props) = &mut edge.props else {
            return Err(SceneError::InvalidBinding {
                edge: binding.edge.clone(),
                reason: "edge is not a relation shape".to_string(),
            });
        };
        let bounds = Rect::from_points(start, end);
        props.start = start.sub(bounds.origin());
        props.end = end.sub(bounds.origin());
        edge.x = bounds.x;
        edge.y = bounds.y;
        scene.update_shape(edge)
    }

    fn anchor_points(
        &self,
        scene: &dyn CanvasScene,
        source: &ShapeId,
        destination: &ShapeId,
    ) -> Result<(Vec2, Vec2), SceneError> {
        let start = scene
            .shape_center(source)
            .ok_or_else(|| SceneError::ShapeNotFound(source.clone()))?;
        let end = scene
            .shape_center(destination)
            .ok_or_else(|| SceneError::ShapeNotFound(destination.clone()))?;
        Ok((start, end))
    }
}

fn node_type_of(scene: &dyn CanvasScene, id: &ShapeId) -> Option<NodeTypeId> {
    scene
        .shape(id)
        .and_then(Shape::as_node)
        .map(|props| props.node_type_id.clone())
}

struct NearNode<'s> {
    id: &'s ShapeId,
    node_type: &'s NodeTypeId,
    distance: f64,
}

fn nodes_near(scene: &dyn CanvasScene, point: Vec2, threshold: f64) -> Vec<NearNode<'_>> {
    scene
        .shapes()
        .into_iter()
        .filter_map(|s| {
            let props = s.as_node()?;
            let distance = scene.shape_center(&s.id)?.distance(point);
            (distance < threshold).then_some(NearNode {
                id: &s.id,
                node_type: &props.node_type_id,
                distance,
            })
        })
        .collect()
}

/// Edge from `start` to `end`, stored relative to its top-left corner
pub fn edge_shape(
    id: ShapeId,
    relation_type_id: RelationTypeId,
    text: String,
    start: Vec2,
    end: Vec2,
) -> Shape {
    let bounds = Rect::from_points(start, end);
    Shape::new(
        id,
        bounds.origin(),
        ShapeProps::Relation(RelationShapeProps {
            relation_type_id,
            text,
            start: start.sub(bounds.origin()),
            end: end.sub(bounds.origin()),
        }),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::canvas::scene::Canvas;
    use crate::canvas::shape::NodeShapeProps;
    use crate::model::{DiscourseRelation, NodeType, RelationType};

    fn scenario() -> DiscourseSettings {
        let node = |id: &str, format: &str| NodeType {
            id: NodeTypeId::new(id),
            label: id.to_string(),
            format: format.to_string(),
            color: None,
            key_image: false,
        };
        DiscourseSettings {
            node_types: vec![
                node("Claim", "[[CLM]] - {content}"),
                node("Evidence", "[[EVD]] - {content} - {Claim}"),
                node("Question", "QUE - {content}"),
            ],
            relation_types: vec![RelationType {
                id: RelationTypeId::new("supports"),
                label: "supports".to_string(),
                complement_label: "is supported by".to_string(),
            }],
            discourse_relations: vec![DiscourseRelation {
                relationship_type_id: RelationTypeId::new("supports"),
                source_node_type_id: NodeTypeId::new("Evidence"),
                destination_node_type_id: NodeTypeId::new("Claim"),
            }],
        }
    }

    fn node_shape(id: &str, node_type: &str, x: f64, y: f64) -> Shape {
        Shape::new(
            ShapeId::new(id),
            Vec2::new(x, y),
            ShapeProps::Node(NodeShapeProps {
                w: 200.0,
                h: 100.0,
                src: None,
                title: id.to_string(),
                node_type_id: NodeTypeId::new(node_type),
                image_src: None,
            }),
        )
    }

    fn canvas() -> Canvas {
        let mut canvas = Canvas::new();
        canvas.create_shape(node_shape("A", "Claim", 0.0, 0.0)).unwrap();
        canvas.create_shape(node_shape("B", "Evidence", 400.0, 200.0)).unwrap();
        canvas
    }

    fn supports() -> RelationTypeId {
        RelationTypeId::new("supports")
    }

    #[test]
    fn test_create_then_reversed_returns_existing() {
        let settings = scenario();
        let index = CanvasRelationIndex::with_proximity(&settings, Some(50.0));
        let mut canvas = canvas();
        let (a, b) = (ShapeId::new("A"), ShapeId::new("B"));

        let created = index.create_relation(&mut canvas, &b, &a, &supports()).unwrap();
        let CreateRelationOutcome::Created(relation) = created else {
            panic!("expected a new relation, got {:?}", created);
        };
        assert_eq!(relation.id, "B-A-supports");
        assert_eq!(relation.label, "supports");

        let existing = index.existing_relations(&canvas);
        assert_eq!(existing.len(), 1);
        assert!(existing[0].exists);

        let reversed = index.create_relation(&mut canvas, &a, &b, &supports()).unwrap();
        assert!(matches!(reversed, CreateRelationOutcome::Existing(ref r) if r.edge == relation.edge));
        assert_eq!(index.existing_relations(&canvas).len(), 1);

        let again = index.create_relation(&mut canvas, &b, &a, &supports()).unwrap();
        assert!(matches!(again, CreateRelationOutcome::Existing(_)));
        assert_eq!(canvas.shapes().iter().filter(|s| s.is_relation()).count(), 1);
    }

    #[test]
    fn test_new_edge_spans_node_centers() {
        let settings = scenario();
        let index = CanvasRelationIndex::with_proximity(&settings, None);
        let mut canvas = canvas();

        let outcome = index
            .create_relation(&mut canvas, &"B".into(), &"A".into(), &supports())
            .unwrap();
        let edge_id = outcome.relation().and_then(|r| r.edge.clone()).unwrap();
        let edge = canvas.shape(&edge_id).unwrap();

        assert_eq!(
            edge.relation_endpoints(),
            Some((Vec2::new(500.0, 250.0), Vec2::new(100.0, 50.0)))
        );
        assert_eq!(edge.position(), Vec2::new(100.0, 50.0));
        assert_eq!(
            canvas.binding(&edge_id),
            Some(&RelationBinding::new(edge_id.clone(), "B".into(), "A".into()))
        );
    }

    #[test]
    fn test_invalid_pairs_are_reported() {
        let settings = scenario();
        let index = CanvasRelationIndex::with_proximity(&settings, Some(50.0));
        let mut canvas = canvas();
        canvas.create_shape(node_shape("Q", "Question", 0.0, 400.0)).unwrap();
        canvas
            .create_shape(Shape::new(
                "T".into(),
                Vec2::default(),
                ShapeProps::Other {
                    kind: "text".to_string(),
                    props: serde_json::json!({}),
                },
            ))
            .unwrap();

        let reason = |outcome: CreateRelationOutcome| match outcome {
            CreateRelationOutcome::Invalid(invalid) => invalid.reason,
            other => panic!("expected invalid, got {:?}", other),
        };

        let (a, b, q, t) = (
            ShapeId::new("A"),
            ShapeId::new("B"),
            ShapeId::new("Q"),
            ShapeId::new("T"),
        );
        assert_eq!(
            reason(index.create_relation(&mut canvas, &a, &q, &supports()).unwrap()),
            InvalidRelationReason::NoDeclaration
        );
        assert_eq!(
            reason(index.create_relation(&mut canvas, &a, &t, &supports()).unwrap()),
            InvalidRelationReason::NotANode
        );
        assert_eq!(
            reason(index.create_relation(&mut canvas, &a, &a, &supports()).unwrap()),
            InvalidRelationReason::SameNode
        );
        assert_eq!(
            reason(
                index
                    .create_relation(&mut canvas, &b, &a, &RelationTypeId::new("refutes"))
                    .unwrap()
            ),
            InvalidRelationReason::UnknownRelationType
        );
        assert!(index.existing_relations(&canvas).is_empty());
    }

    #[test]
    fn test_possible_relations_mark_existing() {
        let settings = scenario();
        let index = CanvasRelationIndex::with_proximity(&settings, Some(50.0));
        let mut canvas = canvas();
        canvas.create_shape(node_shape("C", "Claim", 0.0, 400.0)).unwrap();
        canvas.create_shape(node_shape("Q", "Question", 800.0, 0.0)).unwrap();
        let (a, b) = (ShapeId::new("A"), ShapeId::new("B"));

        index.create_relation(&mut canvas, &b, &a, &supports()).unwrap();

        let from_evidence = index.possible_relations(&canvas, &b);
        let ids: Vec<_> = from_evidence.iter().map(|r| r.id.as_str()).collect();
        assert_eq!(ids, vec!["B-A-supports", "B-C-supports"]);
        assert!(from_evidence[0].exists);
        assert!(!from_evidence[1].exists);
        assert!(from_evidence.iter().all(|r| r.label == "supports"));

        let from_claim = index.possible_relations(&canvas, &a);
        assert_eq!(from_claim.len(), 1);
        assert_eq!(from_claim[0].source, b);
        assert!(from_claim[0].exists);

        assert!(index.possible_relations(&canvas, &"Q".into()).is_empty());
    }

    #[test]
    fn test_unbound_edges_use_proximity_fallback() {
        let settings = scenario();
        let mut canvas = canvas();
        // Roughly from B's center (500, 250) to A's center (100, 50)
        canvas
            .create_shape(edge_shape(
                "E".into(),
                supports(),
                "supports".to_string(),
                Vec2::new(510.0, 240.0),
                Vec2::new(90.0, 60.0),
            ))
            .unwrap();

        let legacy = CanvasRelationIndex::with_proximity(&settings, Some(50.0));
        let existing = legacy.existing_relations(&canvas);
        assert_eq!(existing.len(), 1);
        assert_eq!(existing[0].source, ShapeId::new("B"));

        let outcome = legacy
            .create_relation(&mut canvas, &"A".into(), &"B".into(), &supports())
            .unwrap();
        assert!(matches!(outcome, CreateRelationOutcome::Existing(_)));

        let strict = CanvasRelationIndex::with_proximity(&settings, None);
        assert!(strict.existing_relations(&canvas).is_empty());

        let tight = CanvasRelationIndex::with_proximity(&settings, Some(10.0));
        assert!(tight.existing_relations(&canvas).is_empty());
    }

    #[test]
    fn test_unbound_edge_found_next_to_overlapping_node() {
        let settings = scenario();
        let mut canvas = canvas();
        // C overlaps A and its center is closer to the edge's end
        canvas.create_shape(node_shape("C", "Claim", 20.0, 0.0)).unwrap();
        canvas
            .create_shape(edge_shape(
                "E".into(),
                supports(),
                "supports".to_string(),
                Vec2::new(500.0, 250.0),
                Vec2::new(115.0, 50.0),
            ))
            .unwrap();
        let index = CanvasRelationIndex::with_proximity(&settings, Some(50.0));
        let edge = canvas.shape(&"E".into()).cloned().unwrap();

        assert!(index.is_connected(&canvas, &edge, &"B".into(), &"A".into()));
        assert!(index.is_connected(&canvas, &edge, &"A".into(), &"B".into()));
        assert!(index.is_connected(&canvas, &edge, &"B".into(), &"C".into()));
        assert!(!index.is_connected(&canvas, &edge, &"A".into(), &"C".into()));

        let outcome = index
            .create_relation(&mut canvas, &"B".into(), &"A".into(), &supports())
            .unwrap();
        let CreateRelationOutcome::Existing(existing) = outcome else {
            panic!("Expected the unbound edge to be reused");
        };
        assert_eq!(existing.source, ShapeId::new("B"));
        assert_eq!(existing.destination, ShapeId::new("A"));
        assert_eq!(existing.edge, Some(ShapeId::new("E")));

        let edges = canvas.shapes().into_iter().filter(|s| s.is_relation()).count();
        assert_eq!(edges, 1);
    }

    #[test]
    fn test_delete_relation_removes_binding_and_shape() {
        let settings = scenario();
        let index = CanvasRelationIndex::with_proximity(&settings, None);
        let mut canvas = canvas();
        let outcome = index
            .create_relation(&mut canvas, &"B".into(), &"A".into(), &supports())
            .unwrap();
        let edge = outcome.relation().and_then(|r| r.edge.clone()).unwrap();

        assert!(index.delete_relation(&mut canvas, &"A".into()).is_none());
        assert!(index.delete_relation(&mut canvas, &edge).is_some());
        assert!(canvas.bindings().is_empty());
        assert!(canvas.shape(&edge).is_none());
        assert_eq!(canvas.len(), 2);
    }

    #[test]
    fn test_move_node_reanchors_bound_edges() {
        let settings = scenario();
        let index = CanvasRelationIndex::with_proximity(&settings, None);
        let mut canvas = canvas();
        let outcome = index
            .create_relation(&mut canvas, &"B".into(), &"A".into(), &supports())
            .unwrap();
        let edge = outcome.relation().and_then(|r| r.edge.clone()).unwrap();

        index
            .move_node(&mut canvas, &"A".into(), Vec2::new(800.0, 400.0))
            .unwrap();

        let moved = canvas.shape(&edge).unwrap();
        assert_eq!(
            moved.relation_endpoints(),
            Some((Vec2::new(500.0, 250.0), Vec2::new(900.0, 450.0)))
        );
        assert_eq!(moved.position(), Vec2::new(500.0, 250.0));
    }
}
