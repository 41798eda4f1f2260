use super::{DocumentEntry, Vault};
use crate::catalog::RelationCatalog;
use crate::error::{InvalidRelationPair, InvalidRelationReason};
use crate::frontmatter::string_list;
use crate::model::{DiscourseSettings, NodeTypeId, RelationTypeId};
use crate::specification::Classification;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq)]
pub enum FindingKind {
    /// Title matches several node formats and no tag disambiguates it
    AmbiguousMatch(Vec<NodeTypeId>),
    UnknownTag(String),
    UnreadableFrontmatter(String),
    /// Back-link to a document that is not in the vault
    MissingTarget {
        relation: RelationTypeId,
        link: String,
    },
    TargetNotNode {
        relation: RelationTypeId,
        target: String,
    },
    InvalidPair(InvalidRelationPair),
    /// The target does not link back with the same relation type
    MissingReciprocal {
        relation: RelationTypeId,
        target: String,
    },
}

/// One graph health problem, anchored on the document that carries it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Finding {
    pub document: String,
    #[serde(skip)]
    pub kind: FindingKind,
    pub message: String,
}

impl Finding {
    fn new(document: &str, kind: FindingKind) -> Self {
        let message = match &kind {
            FindingKind::AmbiguousMatch(ids) => format!(
                "Title matches several node types: {}",
                ids.iter()
                    .map(NodeTypeId::as_str)
                    .collect::<Vec<_>>()
                    .join(", ")
            ),
            FindingKind::UnknownTag(tag) => format!("Unknown node type '{}'", tag),
            FindingKind::UnreadableFrontmatter(e) => format!("Unreadable frontmatter: {}", e),
            FindingKind::MissingTarget { relation, link } => {
                format!("{}: target {} not found", relation, link)
            }
            FindingKind::TargetNotNode { relation, target } => {
                format!("{}: {} is not a discourse node", relation, target)
            }
            FindingKind::InvalidPair(pair) => pair.to_string(),
            FindingKind::MissingReciprocal { relation, target } => {
                format!("{}: {} does not link back", relation, target)
            }
        };
        Self {
            document: document.to_string(),
            kind,
            message,
        }
    }
}

impl Vault {
    /// Check every document of the vault against the catalogs.
    pub fn audit(&self, settings: &DiscourseSettings) -> Vec<Finding> {
        self.entries()
            .flat_map(|entry| self.audit_entry(settings, entry))
            .collect()
    }

    pub fn findings_for(&self, settings: &DiscourseSettings, id: &str) -> Vec<Finding> {
        self.entry(id)
            .map(|entry| self.audit_entry(settings, entry))
            .unwrap_or_default()
    }

    fn audit_entry(&self, settings: &DiscourseSettings, entry: &DocumentEntry) -> Vec<Finding> {
        let id = entry.document.id.as_str();
        let mut findings = Vec::new();

        if let Some(e) = &entry.frontmatter_error {
            findings.push(Finding::new(id, FindingKind::UnreadableFrontmatter(e.clone())));
            return findings;
        }

        if let Some(tag) = entry.tag(&self.config().node_type_key) {
            if settings.node_type_by_str(tag).is_none() {
                findings.push(Finding::new(id, FindingKind::UnknownTag(tag.to_string())));
            }
        }

        let own_type = match self.classify_entry(settings, entry) {
            Classification::Ambiguous(ids) => {
                findings.push(Finding::new(id, FindingKind::AmbiguousMatch(ids)));
                None
            }
            other => other.node_type_id().cloned(),
        };

        let catalog = RelationCatalog::new(settings);
        for relation_type in &settings.relation_types {
            let relation = &relation_type.id;
            for link in string_list(&entry.frontmatter, relation.as_str()) {
                let Some(target) = self.resolve_link(&link) else {
                    findings.push(Finding::new(
                        id,
                        FindingKind::MissingTarget {
                            relation: relation.clone(),
                            link,
                        },
                    ));
                    continue;
                };

                let target_type = self.classify_entry(settings, target).node_type_id().cloned();
                let Some(target_type) = target_type else {
                    findings.push(Finding::new(
                        id,
                        FindingKind::TargetNotNode {
                            relation: relation.clone(),
                            target: target.document.id.clone(),
                        },
                    ));
                    continue;
                };

                let reason = match &own_type {
                    None => Some(InvalidRelationReason::NotANode),
                    Some(_) if target.document.id == entry.document.id => {
                        Some(InvalidRelationReason::SameNode)
                    }
                    Some(own) if !catalog.declares(relation, own, &target_type) => {
                        Some(InvalidRelationReason::NoDeclaration)
                    }
                    Some(_) => None,
                };
                if let Some(reason) = reason {
                    findings.push(Finding::new(
                        id,
                        FindingKind::InvalidPair(InvalidRelationPair {
                            relation_type_id: relation.clone(),
                            source_type: own_type.clone(),
                            destination_type: Some(target_type),
                            reason,
                        }),
                    ));
                    continue;
                }

                if !links_back(target, relation, &entry.document.title) {
                    findings.push(Finding::new(
                        id,
                        FindingKind::MissingReciprocal {
                            relation: relation.clone(),
                            target: target.document.id.clone(),
                        },
                    ));
                }
            }
        }

        findings
    }
}

fn links_back(target: &DocumentEntry, relation: &RelationTypeId, title: &str) -> bool {
    string_list(&target.frontmatter, relation.as_str())
        .iter()
        .filter_map(|link| crate::utils::parse_wikilink(link))
        .any(|link| {
            let linked = link.target.rsplit('/').next().unwrap_or(&link.target);
            linked.eq_ignore_ascii_case(title)
        })
}
