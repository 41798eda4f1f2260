use serde::{Deserialize, Serialize};
use std::fmt;

/// Identity of a declared node type (e.g. "node_claim")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct NodeTypeId(pub String);

/// Identity of a declared relation type (e.g. "relation_supports")
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RelationTypeId(pub String);

impl NodeTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl RelationTypeId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl fmt::Display for RelationTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeTypeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

impl From<&str> for RelationTypeId {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

/// A user-declared kind of discourse node.
///
/// `format` is the title template, e.g. `CLM - {content}` or
/// `[[EVD]] - {content} - {Claim}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeType {
    pub id: NodeTypeId,
    #[serde(alias = "name")]
    pub label: String,
    #[serde(default)]
    pub format: String,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default, alias = "keyImage")]
    pub key_image: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RelationType {
    pub id: RelationTypeId,
    pub label: String,
    #[serde(alias = "complement", alias = "complementLabel")]
    pub complement_label: String,
}

/// Schema-level declaration: an edge of `relationship_type_id` is legal
/// between the two node types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiscourseRelation {
    #[serde(alias = "relationshipTypeId")]
    pub relationship_type_id: RelationTypeId,
    #[serde(alias = "sourceId", alias = "source_id")]
    pub source_node_type_id: NodeTypeId,
    #[serde(alias = "destinationId", alias = "destination_id")]
    pub destination_node_type_id: NodeTypeId,
}

impl DiscourseRelation {
    /// The endpoint opposite to `node_type_id`, from that type's perspective.
    pub fn other_endpoint(&self, node_type_id: &NodeTypeId) -> Option<&NodeTypeId> {
        if &self.source_node_type_id == node_type_id {
            Some(&self.destination_node_type_id)
        } else if &self.destination_node_type_id == node_type_id {
            Some(&self.source_node_type_id)
        } else {
            None
        }
    }

    /// Symmetric pair test: (a, b) or (b, a).
    pub fn connects(&self, a: &NodeTypeId, b: &NodeTypeId) -> bool {
        (&self.source_node_type_id == a && &self.destination_node_type_id == b)
            || (&self.source_node_type_id == b && &self.destination_node_type_id == a)
    }
}

/// The three catalogs, as one immutable snapshot.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiscourseSettings {
    #[serde(default, alias = "nodeTypes")]
    pub node_types: Vec<NodeType>,
    #[serde(default, alias = "relationTypes")]
    pub relation_types: Vec<RelationType>,
    #[serde(default, alias = "discourseRelations")]
    pub discourse_relations: Vec<DiscourseRelation>,
}

impl DiscourseSettings {
    pub fn empty() -> Self {
        Self {
            node_types: Vec::new(),
            relation_types: Vec::new(),
            discourse_relations: Vec::new(),
        }
    }

    pub fn node_type(&self, id: &NodeTypeId) -> Option<&NodeType> {
        self.node_types.iter().find(|nt| &nt.id == id)
    }

    pub fn node_type_by_str(&self, id: &str) -> Option<&NodeType> {
        self.node_types.iter().find(|nt| nt.id.as_str() == id)
    }

    pub fn relation_type(&self, id: &RelationTypeId) -> Option<&RelationType> {
        self.relation_types.iter().find(|rt| &rt.id == id)
    }
}

impl Default for DiscourseSettings {
    fn default() -> Self {
        let node = |id: &str, label: &str, format: &str| NodeType {
            id: NodeTypeId::new(id),
            label: label.to_string(),
            format: format.to_string(),
            color: None,
            key_image: false,
        };
        let relation = |id: &str, label: &str, complement: &str| RelationType {
            id: RelationTypeId::new(id),
            label: label.to_string(),
            complement_label: complement.to_string(),
        };
        let declare = |rel: &str, source: &str, destination: &str| DiscourseRelation {
            relationship_type_id: RelationTypeId::new(rel),
            source_node_type_id: NodeTypeId::new(source),
            destination_node_type_id: NodeTypeId::new(destination),
        };

        Self {
            node_types: vec![
                node("node_question", "Question", "QUE - {content}"),
                node("node_claim", "Claim", "CLM - {content}"),
                node("node_evidence", "Evidence", "EVD - {content}"),
            ],
            relation_types: vec![
                relation("relation_supports", "supports", "is supported by"),
                relation("relation_opposes", "opposes", "is opposed by"),
                relation("relation_informs", "informs", "is informed by"),
            ],
            discourse_relations: vec![
                declare("relation_informs", "node_evidence", "node_question"),
                declare("relation_supports", "node_evidence", "node_claim"),
                declare("relation_opposes", "node_evidence", "node_claim"),
            ],
        }
    }
}

/// Handle to a persisted document (page, block, or Markdown file).
///
/// `id` is the store's key; `title` is what links point at.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct DocumentRef {
    pub id: String,
    pub title: String,
}

impl DocumentRef {
    pub fn new(id: impl Into<String>, title: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            title: title.into(),
        }
    }

    /// Reference string stored in back-link fields: `[[title]]`
    pub fn link(&self) -> String {
        crate::utils::wikilink(&self.title)
    }
}

/// A document recognised as an instance of a node type.
#[derive(Debug, Clone, PartialEq)]
pub struct DiscourseNode {
    pub document: DocumentRef,
    pub node_type_id: NodeTypeId,
    /// Free text recovered from the `{content}` placeholder, when the title matched the format
    pub content: Option<String>,
}
