//! Relation catalog queries over one settings snapshot.
//!
//! Declarations are symmetric for legality. Direction only picks the label:
//! the source type sees `label`, the destination sees `complement_label`.

use crate::model::{
    DiscourseRelation, DiscourseSettings, NodeType, NodeTypeId, RelationType, RelationTypeId,
};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One selectable relation from the active node type's point of view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RelationOption {
    pub relation_type_id: RelationTypeId,
    pub label: String,
    pub is_source: bool,
}

pub struct RelationCatalog<'a> {
    settings: &'a DiscourseSettings,
}

impl<'a> RelationCatalog<'a> {
    pub fn new(settings: &'a DiscourseSettings) -> Self {
        Self { settings }
    }

    pub fn node_type(&self, id: &NodeTypeId) -> Option<&'a NodeType> {
        self.settings.node_type(id)
    }

    pub fn relation_type(&self, id: &RelationTypeId) -> Option<&'a RelationType> {
        self.settings.relation_type(id)
    }

    /// Relation options for `active`, in declaration order.
    ///
    /// A relation type declared several times with the same direction
    /// relative to `active` yields a single option. Declarations naming an
    /// unknown relation type are skipped.
    pub fn available_relation_types(&self, active: &NodeTypeId) -> Vec<RelationOption> {
        let mut seen: HashSet<(&RelationTypeId, bool)> = HashSet::new();
        let mut options = Vec::new();

        for declaration in &self.settings.discourse_relations {
            // A self-referential declaration offers both directions
            let directions: &[bool] = match (
                &declaration.source_node_type_id == active,
                &declaration.destination_node_type_id == active,
            ) {
                (true, true) => &[true, false],
                (true, false) => &[true],
                (false, true) => &[false],
                (false, false) => continue,
            };

            let Some(relation_type) = self.relation_type(&declaration.relationship_type_id) else {
                log::warn!(
                    "Discourse relation names unknown relation type '{}'",
                    declaration.relationship_type_id
                );
                continue;
            };

            for &is_source in directions {
                if !seen.insert((&declaration.relationship_type_id, is_source)) {
                    continue;
                }
                options.push(RelationOption {
                    relation_type_id: relation_type.id.clone(),
                    label: if is_source {
                        relation_type.label.clone()
                    } else {
                        relation_type.complement_label.clone()
                    },
                    is_source,
                });
            }
        }

        options
    }

    /// Node types that can sit at the other end of `relation` from `active`.
    ///
    /// Empty when nothing is declared; that is a normal state.
    pub fn compatible_node_types(
        &self,
        active: &NodeTypeId,
        relation: &RelationTypeId,
    ) -> Vec<&'a NodeType> {
        let mut seen: HashSet<&NodeTypeId> = HashSet::new();
        let mut compatible = Vec::new();

        for declaration in self.declarations_of(relation) {
            let Some(other) = declaration.other_endpoint(active) else {
                continue;
            };
            if !seen.insert(other) {
                continue;
            }
            match self.node_type(other) {
                Some(node_type) => compatible.push(node_type),
                None => log::warn!(
                    "Discourse relation '{}' names unknown node type '{}'",
                    relation,
                    other
                ),
            }
        }

        compatible
    }

    /// Like [`Self::compatible_node_types`], restricted to declarations where
    /// `active` is the source (`as_source`) or the destination.
    pub fn counterparts(
        &self,
        active: &NodeTypeId,
        relation: &RelationTypeId,
        as_source: bool,
    ) -> Vec<&'a NodeType> {
        let mut seen: HashSet<&NodeTypeId> = HashSet::new();
        self.declarations_of(relation)
            .filter_map(|d| {
                if as_source && &d.source_node_type_id == active {
                    Some(&d.destination_node_type_id)
                } else if !as_source && &d.destination_node_type_id == active {
                    Some(&d.source_node_type_id)
                } else {
                    None
                }
            })
            .filter(|id| seen.insert(*id))
            .filter_map(|id| self.node_type(id))
            .collect()
    }

    /// Whether `relation` is declared between `a` and `b` in either direction.
    pub fn declares(&self, relation: &RelationTypeId, a: &NodeTypeId, b: &NodeTypeId) -> bool {
        self.declarations_of(relation).any(|d| d.connects(a, b))
    }

    /// Label of `relation` read from `source` towards `destination`.
    ///
    /// Falls back to the complement when only the reverse direction is declared.
    pub fn directional_label(
        &self,
        relation: &RelationTypeId,
        source: &NodeTypeId,
        destination: &NodeTypeId,
    ) -> Option<String> {
        let relation_type = self.relation_type(relation)?;
        let mut reverse = false;
        for declaration in self.declarations_of(relation) {
            if &declaration.source_node_type_id == source
                && &declaration.destination_node_type_id == destination
            {
                return Some(relation_type.label.clone());
            }
            if declaration.connects(source, destination) {
                reverse = true;
            }
        }
        reverse.then(|| relation_type.complement_label.clone())
    }

    fn declarations_of<'r>(
        &self,
        relation: &'r RelationTypeId,
    ) -> impl Iterator<Item = &'a DiscourseRelation> + 'r
    where
        'a: 'r,
    {
        self.settings
            .discourse_relations
            .iter()
            .filter(move |d| &d.relationship_type_id == relation)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn scenario() -> DiscourseSettings {
        DiscourseSettings {
            node_types: vec![
                NodeType {
                    id: NodeTypeId::new("Claim"),
                    label: "Claim".to_string(),
                    format: "[[CLM]] - {content}".to_string(),
                    color: None,
                    key_image: false,
                },
                NodeType {
                    id: NodeTypeId::new("Evidence"),
                    label: "Evidence".to_string(),
                    format: "[[EVD]] - {content} - {Claim}".to_string(),
                    color: None,
                    key_image: false,
                },
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

    #[test]
    fn test_available_relations_for_destination_use_complement() {
        let settings = scenario();
        let catalog = RelationCatalog::new(&settings);

        assert_eq!(
            catalog.available_relation_types(&NodeTypeId::new("Claim")),
            vec![RelationOption {
                relation_type_id: RelationTypeId::new("supports"),
                label: "is supported by".to_string(),
                is_source: false,
            }]
        );
        assert_eq!(
            catalog.available_relation_types(&NodeTypeId::new("Evidence"))[0].label,
            "supports"
        );
    }

    #[test]
    fn test_compatible_node_types_from_destination() {
        let settings = scenario();
        let catalog = RelationCatalog::new(&settings);

        let ids: Vec<_> = catalog
            .compatible_node_types(&NodeTypeId::new("Claim"), &RelationTypeId::new("supports"))
            .into_iter()
            .map(|nt| nt.id.as_str())
            .collect();
        assert_eq!(ids, vec!["Evidence"]);

        assert!(catalog
            .compatible_node_types(&NodeTypeId::new("Claim"), &RelationTypeId::new("opposes"))
            .is_empty());
    }

    #[test]
    fn test_available_relations_deduplicate_and_keep_order() {
        let settings = DiscourseSettings::default();
        let catalog = RelationCatalog::new(&settings);

        let mut settings_with_overload = settings.clone();
        settings_with_overload
            .discourse_relations
            .push(DiscourseRelation {
                relationship_type_id: RelationTypeId::new("relation_supports"),
                source_node_type_id: NodeTypeId::new("node_evidence"),
                destination_node_type_id: NodeTypeId::new("node_question"),
            });
        let overloaded = RelationCatalog::new(&settings_with_overload);

        let ids = |options: Vec<RelationOption>| {
            options
                .into_iter()
                .map(|o| o.relation_type_id.0)
                .collect::<Vec<_>>()
        };

        let expected = vec![
            "relation_informs".to_string(),
            "relation_supports".to_string(),
            "relation_opposes".to_string(),
        ];
        assert_eq!(
            ids(catalog.available_relation_types(&NodeTypeId::new("node_evidence"))),
            expected
        );
        assert_eq!(
            ids(overloaded.available_relation_types(&NodeTypeId::new("node_evidence"))),
            expected
        );

        let question = overloaded.available_relation_types(&NodeTypeId::new("node_question"));
        assert_eq!(question.len(), 2);
        assert_eq!(question[0].label, "is informed by");
        assert_eq!(question[1].label, "is supported by");
    }

    #[test]
    fn test_self_declaration_offers_both_directions() {
        let mut settings = scenario();
        settings.discourse_relations.push(DiscourseRelation {
            relationship_type_id: RelationTypeId::new("supports"),
            source_node_type_id: NodeTypeId::new("Claim"),
            destination_node_type_id: NodeTypeId::new("Claim"),
        });
        let catalog = RelationCatalog::new(&settings);

        let options = catalog.available_relation_types(&NodeTypeId::new("Claim"));
        assert_eq!(options.len(), 2);
        assert!(!options[0].is_source);
        assert!(options[1].is_source);
    }

    #[test]
    fn test_directional_label() {
        let settings = scenario();
        let catalog = RelationCatalog::new(&settings);
        let supports = RelationTypeId::new("supports");
        let claim = NodeTypeId::new("Claim");
        let evidence = NodeTypeId::new("Evidence");

        assert_eq!(
            catalog.directional_label(&supports, &evidence, &claim).as_deref(),
            Some("supports")
        );
        assert_eq!(
            catalog.directional_label(&supports, &claim, &evidence).as_deref(),
            Some("is supported by")
        );
        assert_eq!(catalog.directional_label(&supports, &claim, &claim), None);
        assert!(catalog.declares(&supports, &claim, &evidence));
    }

    fn arbitrary_settings() -> impl Strategy<Value = DiscourseSettings> {
        let ids = ["a", "b", "c", "d"];
        let rels = ["r1", "r2"];
        proptest::collection::vec((0..4usize, 0..4usize, 0..2usize), 0..10).prop_map(
            move |decls| DiscourseSettings {
                node_types: ids
                    .iter()
                    .map(|id| NodeType {
                        id: NodeTypeId::new(*id),
                        label: id.to_uppercase(),
                        format: format!("{} - {{content}}", id),
                        color: None,
                        key_image: false,
                    })
                    .collect(),
                relation_types: rels
                    .iter()
                    .map(|id| RelationType {
                        id: RelationTypeId::new(*id),
                        label: id.to_string(),
                        complement_label: format!("{} (rev)", id),
                    })
                    .collect(),
                discourse_relations: decls
                    .into_iter()
                    .map(|(s, d, r)| DiscourseRelation {
                        relationship_type_id: RelationTypeId::new(rels[r]),
                        source_node_type_id: NodeTypeId::new(ids[s]),
                        destination_node_type_id: NodeTypeId::new(ids[d]),
                    })
                    .collect(),
            },
        )
    }

    proptest! {
        #[test]
        fn test_compatible_node_types_is_symmetric(settings in arbitrary_settings()) {
            let catalog = RelationCatalog::new(&settings);
            for a in &settings.node_types {
                for rel in &settings.relation_types {
                    for b in catalog.compatible_node_types(&a.id, &rel.id) {
                        let back = catalog.compatible_node_types(&b.id, &rel.id);
                        prop_assert!(back.iter().any(|nt| nt.id == a.id));
                        prop_assert!(catalog.declares(&rel.id, &a.id, &b.id));
                    }
                }
            }
        }
    }
}
