//! Canvas model: shapes, the scene graph seam, and relation indexing.

mod geometry;
mod index;
mod scene;
mod shape;
mod sizing;

pub use geometry::{Rect, Size, Vec2};
pub use index::{edge_shape, CanvasRelation, CanvasRelationIndex, CreateRelationOutcome};
pub use scene::{Canvas, CanvasScene, RelationBinding};
pub use shape::{
    NodeShapeProps, NodeShapeUtil, RelationShapeProps, RelationShapeUtil, RenderModel, Shape,
    ShapeId, ShapeProps, ShapeUtil, ShapeUtils, NODE_SHAPE_TYPE, RELATION_SHAPE_TYPE,
};
pub use sizing::{node_size, ImageDimensions};
