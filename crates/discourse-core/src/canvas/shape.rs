use super::geometry::{Rect, Vec2};
use crate::model::{DiscourseSettings, NodeTypeId, RelationTypeId};
use serde::{Deserialize, Serialize};
use std::fmt;

pub const NODE_SHAPE_TYPE: &str = "discourse-node";
pub const RELATION_SHAPE_TYPE: &str = "discourse-relation";

#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ShapeId(pub String);

impl ShapeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Fresh `shape:<nanoid>` id
    pub fn generate() -> Self {
        Self(format!("shape:{}", crate::utils::id::generate_id()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ShapeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ShapeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// Props of a node card bound to a document
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeShapeProps {
    pub w: f64,
    pub h: f64,
    /// Id of the backing document
    #[serde(default)]
    pub src: Option<String>,
    #[serde(default)]
    pub title: String,
    pub node_type_id: NodeTypeId,
    #[serde(default)]
    pub image_src: Option<String>,
}

/// Props of a relation edge.
///
/// `start` and `end` are relative to the shape's `x`/`y`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationShapeProps {
    pub relation_type_id: RelationTypeId,
    #[serde(default)]
    pub text: String,
    pub start: Vec2,
    pub end: Vec2,
}

#[derive(Debug, Clone, PartialEq)]
pub enum ShapeProps {
    Node(NodeShapeProps),
    Relation(RelationShapeProps),
    /// Host shapes this crate does not interpret (text, images, frames...)
    Other { kind: String, props: serde_json::Value },
}

impl ShapeProps {
    pub fn kind(&self) -> &str {
        match self {
            ShapeProps::Node(_) => NODE_SHAPE_TYPE,
            ShapeProps::Relation(_) => RELATION_SHAPE_TYPE,
            ShapeProps::Other { kind, .. } => kind,
        }
    }
}

/// A shape in the scene: `{id, type, x, y, props}` on the wire.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(try_from = "RawShape")]
pub struct Shape {
    pub id: ShapeId,
    pub x: f64,
    pub y: f64,
    pub props: ShapeProps,
}

impl Shape {
    pub fn new(id: ShapeId, position: Vec2, props: ShapeProps) -> Self {
        Self {
            id,
            x: position.x,
            y: position.y,
            props,
        }
    }

    pub fn kind(&self) -> &str {
        self.props.kind()
    }

    pub fn position(&self) -> Vec2 {
        Vec2::new(self.x, self.y)
    }

    pub fn as_node(&self) -> Option<&NodeShapeProps> {
        match &self.props {
            ShapeProps::Node(props) => Some(props),
            _ => None,
        }
    }

    pub fn as_relation(&self) -> Option<&RelationShapeProps> {
        match &self.props {
            ShapeProps::Relation(props) => Some(props),
            _ => None,
        }
    }

    pub fn is_node(&self) -> bool {
        self.as_node().is_some()
    }

    pub fn is_relation(&self) -> bool {
        self.as_relation().is_some()
    }

    /// Absolute endpoints of a relation edge
    pub fn relation_endpoints(&self) -> Option<(Vec2, Vec2)> {
        let props = self.as_relation()?;
        let origin = self.position();
        Some((origin.add(props.start), origin.add(props.end)))
    }
}

#[derive(Serialize, Deserialize)]
struct RawShape {
    id: ShapeId,
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    x: f64,
    #[serde(default)]
    y: f64,
    #[serde(default)]
    props: serde_json::Value,
}

impl TryFrom<RawShape> for Shape {
    type Error = serde_json::Error;

    fn try_from(raw: RawShape) -> Result<Self, Self::Error> {
        let props = match raw.kind.as_str() {
            NODE_SHAPE_TYPE => ShapeProps::Node(serde_json::from_value(raw.props)?),
            RELATION_SHAPE_TYPE => ShapeProps::Relation(serde_json::from_value(raw.props)?),
            _ => ShapeProps::Other {
                kind: raw.kind,
                props: raw.props,
            },
        };
        Ok(Shape {
            id: raw.id,
            x: raw.x,
            y: raw.y,
            props,
        })
    }
}

impl TryFrom<Shape> for RawShape {
    type Error = serde_json::Error;

    fn try_from(shape: Shape) -> Result<Self, Self::Error> {
        let (kind, props) = match shape.props {
            ShapeProps::Node(props) => (NODE_SHAPE_TYPE.to_string(), serde_json::to_value(props)?),
            ShapeProps::Relation(props) => {
                (RELATION_SHAPE_TYPE.to_string(), serde_json::to_value(props)?)
            }
            ShapeProps::Other { kind, props } => (kind, props),
        };
        Ok(RawShape {
            id: shape.id,
            kind,
            x: shape.x,
            y: shape.y,
            props,
        })
    }
}

impl Serialize for Shape {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        RawShape::try_from(self.clone())
            .map_err(serde::ser::Error::custom)?
            .serialize(serializer)
    }
}

/// What a host adapter needs to draw a shape
#[derive(Debug, Clone, PartialEq)]
pub enum RenderModel {
    NodeCard {
        title: String,
        type_label: Option<String>,
        color: Option<String>,
        image_src: Option<String>,
        bounds: Rect,
    },
    Arrow {
        start: Vec2,
        end: Vec2,
        label: String,
        color: Option<String>,
    },
}

/// Per-kind shape behaviour. The host dispatches on the shape's `type` tag.
pub trait ShapeUtil {
    fn kind(&self) -> &'static str;

    fn default_props(&self) -> ShapeProps;

    /// Bounds in absolute canvas coordinates
    fn geometry(&self, shape: &Shape) -> Option<Rect>;

    fn render(&self, shape: &Shape) -> Option<RenderModel>;
}

pub struct NodeShapeUtil<'a> {
    settings: &'a DiscourseSettings,
    default_width: f64,
    default_height: f64,
}

impl<'a> NodeShapeUtil<'a> {
    pub fn new(settings: &'a DiscourseSettings, default_width: f64, default_height: f64) -> Self {
        Self {
            settings,
            default_width,
            default_height,
        }
    }
}

impl ShapeUtil for NodeShapeUtil<'_> {
    fn kind(&self) -> &'static str {
        NODE_SHAPE_TYPE
    }

    fn default_props(&self) -> ShapeProps {
        let node_type_id = self
            .settings
            .node_types
            .first()
            .map(|nt| nt.id.clone())
            .unwrap_or_else(|| NodeTypeId::new(""));
        ShapeProps::Node(NodeShapeProps {
            w: self.default_width,
            h: self.default_height,
            src: None,
            title: String::new(),
            node_type_id,
            image_src: None,
        })
    }

    fn geometry(&self, shape: &Shape) -> Option<Rect> {
        let props = shape.as_node()?;
        Some(Rect::new(shape.x, shape.y, props.w, props.h))
    }

    fn render(&self, shape: &Shape) -> Option<RenderModel> {
        let props = shape.as_node()?;
        let node_type = self.settings.node_type(&props.node_type_id);
        Some(RenderModel::NodeCard {
            title: props.title.clone(),
            type_label: node_type.map(|nt| nt.label.clone()),
            color: node_type.and_then(|nt| nt.color.clone()),
            image_src: props.image_src.clone(),
            bounds: self.geometry(shape)?,
        })
    }
}

pub struct RelationShapeUtil<'a> {
    settings: &'a DiscourseSettings,
}

impl<'a> RelationShapeUtil<'a> {
    pub fn new(settings: &'a DiscourseSettings) -> Self {
        Self { settings }
    }
}

impl ShapeUtil for RelationShapeUtil<'_> {
    fn kind(&self) -> &'static str {
        RELATION_SHAPE_TYPE
    }

    fn default_props(&self) -> ShapeProps {
        let relation = self.settings.relation_types.first();
        ShapeProps::Relation(RelationShapeProps {
            relation_type_id: relation
                .map(|rt| rt.id.clone())
                .unwrap_or_else(|| RelationTypeId::new("")),
            text: relation.map(|rt| rt.label.clone()).unwrap_or_default(),
            start: Vec2::default(),
            end: Vec2::new(100.0, 0.0),
        })
    }

    fn geometry(&self, shape: &Shape) -> Option<Rect> {
        let (start, end) = shape.relation_endpoints()?;
        Some(Rect::from_points(start, end))
    }

    fn render(&self, shape: &Shape) -> Option<RenderModel> {
        let props = shape.as_relation()?;
        let (start, end) = shape.relation_endpoints()?;
        // The edge takes the color of the first node type it is declared from
        let color = self
            .settings
            .discourse_relations
            .iter()
            .find(|d| d.relationship_type_id == props.relation_type_id)
            .and_then(|d| self.settings.node_type(&d.source_node_type_id))
            .and_then(|nt| nt.color.clone());
        Some(RenderModel::Arrow {
            start,
            end,
            label: props.text.clone(),
            color,
        })
    }
}

/// Dispatch table from shape tag to its util
pub struct ShapeUtils<'a> {
    pub node: NodeShapeUtil<'a>,
    pub relation: RelationShapeUtil<'a>,
}

impl<'a> ShapeUtils<'a> {
    pub fn new(settings: &'a DiscourseSettings, default_width: f64, default_height: f64) -> Self {
        Self {
            node: NodeShapeUtil::new(settings, default_width, default_height),
            relation: RelationShapeUtil::new(settings),
        }
    }

    pub fn for_kind(&self, kind: &str) -> Option<&dyn ShapeUtil> {
        match kind {
            NODE_SHAPE_TYPE => Some(&self.node),
            RELATION_SHAPE_TYPE => Some(&self.relation),
            _ => None,
        }
    }

    pub fn geometry(&self, shape: &Shape) -> Option<Rect> {
        self.for_kind(shape.kind())?.geometry(shape)
    }

    pub fn render(&self, shape: &Shape) -> Option<RenderModel> {
        self.for_kind(shape.kind())?.render(shape)
    }
}
