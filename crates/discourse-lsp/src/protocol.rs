use discourse_core::catalog::RelationOption;
use discourse_core::sync::LinkProgress;
use serde::{Deserialize, Serialize};

/// Documents are addressed by file URI or by vault-relative id.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeParams {
    pub node_type_id: String,
    pub content: String,
    /// Node filling the format's reference placeholder
    pub reference: Option<String>,
    pub relation: Option<NodeRelationParams>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeRelationParams {
    pub relation_type_id: String,
    pub target: String,
    /// Derived from the declarations when absent
    pub new_node_is_source: Option<bool>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateNodeResult {
    pub node: NodeSummary,
    pub instance_id: Option<String>,
    pub relation: Option<LinkProgress>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRelationParams {
    pub source: String,
    pub target: String,
    pub relation_type_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddRelationResult {
    pub progress: LinkProgress,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailableRelationsParams {
    pub document: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AvailableRelationsResult {
    pub relations: Vec<RelationOption>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompatibleNodesParams {
    pub document: String,
    pub relation_type_id: String,
}

#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ListNodesParams {
    pub node_type_id: Option<String>,
    /// Filter query, corresponds to VS Code QuickPick input
    pub query: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeSummary {
    /// Vault-relative document id
    pub id: String,
    pub uri: Option<String>,
    pub title: String,
    pub node_type_id: String,
    pub content: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ListNodesResult {
    pub nodes: Vec<NodeSummary>,
}
