use super::geometry::Vec2;
use super::shape::{Shape, ShapeId, ShapeProps};
use crate::error::SceneError;
use serde::{Deserialize, Serialize};

/// Explicit attachment of a relation edge to its two node shapes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationBinding {
    pub edge: ShapeId,
    pub source: ShapeId,
    pub destination: ShapeId,
}

impl RelationBinding {
    pub fn new(edge: ShapeId, source: ShapeId, destination: ShapeId) -> Self {
        Self {
            edge,
            source,
            destination,
        }
    }

    pub fn touches(&self, node: &ShapeId) -> bool {
        &self.source == node || &self.destination == node
    }
}

/// The host's live scene graph.
///
/// Reads always reflect the current in-memory state, including edits
/// the host has not flushed to storage yet.
pub trait CanvasScene {
    fn shapes(&self) -> Vec<&Shape>;

    fn shape(&self, id: &ShapeId) -> Option<&Shape>;

    fn create_shape(&mut self, shape: Shape) -> Result<(), SceneError>;

    fn update_shape(&mut self, shape: Shape) -> Result<(), SceneError>;

    /// Deleting a node shape also deletes the relation edges bound to it.
    fn delete_shape(&mut self, id: &ShapeId) -> Option<Shape>;

    fn bindings(&self) -> Vec<&RelationBinding>;

    fn create_binding(&mut self, binding: RelationBinding) -> Result<(), SceneError>;

    fn delete_binding(&mut self, edge: &ShapeId) -> Option<RelationBinding>;

    fn binding(&self, edge: &ShapeId) -> Option<&RelationBinding> {
        self.bindings().into_iter().find(|b| &b.edge == edge)
    }

    fn bindings_to(&self, node: &ShapeId) -> Vec<&RelationBinding> {
        self.bindings()
            .into_iter()
            .filter(|b| b.touches(node))
            .collect()
    }

    /// Center of a shape's bounds in absolute coordinates
    fn shape_center(&self, id: &ShapeId) -> Option<Vec2> {
        let shape = self.shape(id)?;
        Some(match &shape.props {
            ShapeProps::Node(props) => Vec2::new(shape.x + props.w / 2.0, shape.y + props.h / 2.0),
            ShapeProps::Relation(_) => {
                let (start, end) = shape.relation_endpoints()?;
                Vec2::new((start.x + end.x) / 2.0, (start.y + end.y) / 2.0)
            }
            ShapeProps::Other { .. } => shape.position(),
        })
    }
}

/// In-memory scene, serialisable as a JSON snapshot
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Canvas {
    #[serde(default)]
    shapes: Vec<Shape>,
    #[serde(default)]
    bindings: Vec<RelationBinding>,
}

impl Canvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        let canvas: Canvas = serde_json::from_str(json)?;
        let dangling = canvas
            .bindings
            .iter()
            .filter(|b| {
                canvas.find(&b.edge).is_none()
                    || canvas.find(&b.source).is_none()
                    || canvas.find(&b.destination).is_none()
            })
            .count();
        if dangling > 0 {
            log::warn!("Canvas snapshot has {} dangling bindings", dangling);
        }
        Ok(canvas)
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }

    pub fn len(&self) -> usize {
        self.shapes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.shapes.is_empty()
    }

    fn find(&self, id: &ShapeId) -> Option<usize> {
        self.shapes.iter().position(|s| &s.id == id)
    }
}

impl CanvasScene for Canvas {
    fn shapes(&self) -> Vec<&Shape> {
        self.shapes.iter().collect()
    }

    fn shape(&self, id: &ShapeId) -> Option<&Shape> {
        self.shapes.iter().find(|s| &s.id == id)
    }

    fn create_shape(&mut self, shape: Shape) -> Result<(), SceneError> {
        if self.find(&shape.id).is_some() {
            return Err(SceneError::DuplicateShape(shape.id));
        }
        self.shapes.push(shape);
        Ok(())
    }

    fn update_shape(&mut self, shape: Shape) -> Result<(), SceneError> {
        match self.find(&shape.id) {
            Some(i) => {
                self.shapes[i] = shape;
                Ok(())
            }
            None => Err(SceneError::ShapeNotFound(shape.id)),
        }
    }

    fn delete_shape(&mut self, id: &ShapeId) -> Option<Shape> {
        let i = self.find(id)?;
        let removed = self.shapes.remove(i);

        let attached: Vec<ShapeId> = self
            .bindings
            .iter()
            .filter(|b| b.touches(id))
            .map(|b| b.edge.clone())
            .collect();
        self.bindings
            .retain(|b| &b.edge != id && !attached.contains(&b.edge));
        self.shapes.retain(|s| !attached.contains(&s.id));
        if !attached.is_empty() {
            log::debug!("Deleted {} relation edges attached to {}", attached.len(), id);
        }
        Some(removed)
    }

    fn bindings(&self) -> Vec<&RelationBinding> {
        self.bindings.iter().collect()
    }

    fn create_binding(&mut self, binding: RelationBinding) -> Result<(), SceneError> {
        let invalid = |reason: &str| SceneError::InvalidBinding {
            edge: binding.edge.clone(),
            reason: reason.to_string(),
        };

        match self.shape(&binding.edge) {
            Some(edge) if edge.is_relation() => {}
            Some(_) => return Err(invalid("edge is not a relation shape")),
            None => return Err(SceneError::ShapeNotFound(binding.edge.clone())),
        }
        for endpoint in [&binding.source, &binding.destination] {
            match self.shape(endpoint) {
                Some(node) if node.is_node() => {}
                Some(_) => return Err(invalid("endpoint is not a node shape")),
                None => return Err(SceneError::ShapeNotFound(endpoint.clone())),
            }
        }

        self.bindings.retain(|b| b.edge != binding.edge);
        self.bindings.push(binding);
        Ok(())
    }

    fn delete_binding(&mut self, edge: &ShapeId) -> Option<RelationBinding> {
        let i = self.bindings.iter().position(|b| &b.edge == edge)?;
        Some(self.bindings.remove(i))
    }
}
