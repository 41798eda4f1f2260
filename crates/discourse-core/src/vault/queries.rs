use super::{DocumentEntry, Vault};
use crate::catalog::RelationCatalog;
use crate::frontmatter::string_list;
use crate::model::{DiscourseNode, DiscourseSettings, DocumentRef, NodeTypeId, RelationTypeId};
use crate::specification::{Classification, SpecificationMatcher};
use crate::utils::parse_wikilink;
use serde::Serialize;

/// A back-link recorded in a document's frontmatter
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DocumentRelation {
    pub relation_type_id: RelationTypeId,
    /// Label read from this document towards the target
    pub label: String,
    /// The raw frontmatter entry
    pub link: String,
    /// The target, when the link resolves to a document in the vault
    pub target: Option<DocumentRef>,
}

impl Vault {
    /// Resolve a link target by title, exact match first.
    pub fn entry_by_title(&self, title: &str) -> Option<&DocumentEntry> {
        self.entries()
            .find(|e| e.document.title == title)
            .or_else(|| {
                self.entries()
                    .find(|e| e.document.title.eq_ignore_ascii_case(title))
            })
    }

    pub fn resolve_link(&self, link: &str) -> Option<&DocumentEntry> {
        let target = parse_wikilink(link)?;
        let title = target.target.rsplit('/').next().unwrap_or(&target.target);
        self.entry_by_title(title)
    }

    pub fn classify(&self, settings: &DiscourseSettings, id: &str) -> Option<Classification> {
        let entry = self.entry(id)?;
        Some(self.classify_entry(settings, entry))
    }

    pub(super) fn classify_entry(
        &self,
        settings: &DiscourseSettings,
        entry: &DocumentEntry,
    ) -> Classification {
        SpecificationMatcher::new(&settings.node_types).classify(
            &entry.document.title,
            entry.tag(&self.config().node_type_key),
        )
    }

    /// The discourse node stored in `id`, if it is one.
    pub fn node(&self, settings: &DiscourseSettings, id: &str) -> Option<DiscourseNode> {
        let entry = self.entry(id)?;
        self.node_of(settings, entry)
    }

    fn node_of(&self, settings: &DiscourseSettings, entry: &DocumentEntry) -> Option<DiscourseNode> {
        let node_type_id = self.classify_entry(settings, entry).node_type_id()?.clone();
        let content = settings.node_type(&node_type_id).and_then(|node_type| {
            SpecificationMatcher::new(&settings.node_types)
                .extract_placeholders(node_type, &entry.document.title)
                .and_then(|values| values.content().map(str::to_string))
        });
        Some(DiscourseNode {
            document: entry.document.clone(),
            node_type_id,
            content,
        })
    }

    /// All discourse nodes, ordered by title.
    pub fn nodes(&self, settings: &DiscourseSettings) -> Vec<DiscourseNode> {
        let mut nodes: Vec<DiscourseNode> = self
            .entries()
            .filter_map(|entry| self.node_of(settings, entry))
            .collect();
        nodes.sort_by(|a, b| a.document.title.cmp(&b.document.title));
        nodes
    }

    pub fn nodes_of_type(
        &self,
        settings: &DiscourseSettings,
        node_type: &NodeTypeId,
    ) -> Vec<DiscourseNode> {
        self.search(settings, Some(node_type), None)
    }

    /// Nodes filtered by type and a case-insensitive title substring.
    pub fn search(
        &self,
        settings: &DiscourseSettings,
        node_type: Option<&NodeTypeId>,
        query: Option<&str>,
    ) -> Vec<DiscourseNode> {
        let query = query.map(str::to_lowercase).filter(|q| !q.trim().is_empty());
        self.nodes(settings)
            .into_iter()
            .filter(|node| node_type.map_or(true, |t| &node.node_type_id == t))
            .filter(|node| {
                query
                    .as_deref()
                    .map_or(true, |q| node.document.title.to_lowercase().contains(q))
            })
            .collect()
    }

    /// Nodes that `relation` could link to from document `id`.
    pub fn compatible_documents(
        &self,
        settings: &DiscourseSettings,
        id: &str,
        relation: &RelationTypeId,
    ) -> Vec<DiscourseNode> {
        let Some(active) = self.node(settings, id) else {
            return Vec::new();
        };
        let compatible: Vec<NodeTypeId> = RelationCatalog::new(settings)
            .compatible_node_types(&active.node_type_id, relation)
            .into_iter()
            .map(|nt| nt.id.clone())
            .collect();

        self.nodes(settings)
            .into_iter()
            .filter(|node| node.document.id != id && compatible.contains(&node.node_type_id))
            .collect()
    }

    /// Back-links stored in `id`, one per frontmatter entry keyed by a relation type id.
    pub fn relations_of(&self, settings: &DiscourseSettings, id: &str) -> Vec<DocumentRelation> {
        let Some(entry) = self.entry(id) else {
            return Vec::new();
        };
        let catalog = RelationCatalog::new(settings);
        let own_type = self.classify_entry(settings, entry).node_type_id().cloned();

        let mut relations = Vec::new();
        for relation_type in &settings.relation_types {
            for link in string_list(&entry.frontmatter, relation_type.id.as_str()) {
                let target = self.resolve_link(&link);
                let target_type = target
                    .and_then(|t| self.classify_entry(settings, t).node_type_id().cloned());

                let label = match (&own_type, &target_type) {
                    (Some(own), Some(other)) => catalog
                        .directional_label(&relation_type.id, own, other)
                        .unwrap_or_else(|| relation_type.label.clone()),
                    _ => relation_type.label.clone(),
                };

                relations.push(DocumentRelation {
                    relation_type_id: relation_type.id.clone(),
                    label,
                    link,
                    target: target.map(|t| t.document.clone()),
                });
            }
        }
        relations
    }
}
