//! Discourse Core Library
//!
//! Typed discourse graphs over Markdown notes: node types recognised by
//! title formats, relation types declared between them, and the flow that
//! writes new nodes and back-links into documents and onto a canvas.
//!

pub mod canvas;
pub mod catalog;
pub mod config;
pub mod error;
pub mod frontmatter;
pub mod model;
pub mod settings;
pub mod specification;
pub mod sync;
pub mod utils;
pub mod vault;
pub mod vfs;

pub use catalog::RelationCatalog;
pub use config::DiscourseConfig;
pub use model::{DiscourseSettings, DocumentRef, NodeTypeId, RelationTypeId};
pub use settings::{SettingsStore, SharedSettings};
pub use specification::{Classification, SpecificationMatcher};
pub use sync::{DocumentStore, SyncSession};
pub use vault::{MarkdownStore, Vault};
