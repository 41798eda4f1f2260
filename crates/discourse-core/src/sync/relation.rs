use super::store::{DocumentStore, FieldUpdate};
use super::{AbortSignal, FlowState};
use crate::error::{PersistStage, SyncError};
use crate::model::{DocumentRef, RelationTypeId};
use serde::{Deserialize, Serialize};

/// How far the paired back-link write got
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinkProgress {
    pub source_linked: bool,
    pub dest_linked: bool,
}

impl LinkProgress {
    pub fn is_complete(&self) -> bool {
        self.source_linked && self.dest_linked
    }
}

/// Record `relation` in both documents' frontmatter.
///
/// The source gets `[[destination]]` appended under the relation type id and
/// the destination gets `[[source]]`. The two writes are independent: when
/// the second fails the first is kept and the error carries the progress.
pub async fn link_documents(
    store: &dyn DocumentStore,
    relation: &RelationTypeId,
    source: &DocumentRef,
    destination: &DocumentRef,
    abort: &AbortSignal,
) -> Result<LinkProgress, SyncError> {
    let key = relation.as_str();
    let mut progress = LinkProgress::default();

    abort.check(FlowState::PersistingRelation)?;
    store
        .write_frontmatter_field(source, key, FieldUpdate::Append(destination.link()))
        .await
        .map_err(|source| SyncError::Persistence {
            stage: PersistStage::Relation,
            source,
        })?;
    progress.source_linked = true;

    if abort.is_aborted() {
        log::warn!(
            "Aborted after linking '{}'; '{}' has no back-link",
            source.title,
            destination.title
        );
        return Err(SyncError::Aborted {
            state: FlowState::PersistingRelation,
        });
    }

    match store
        .write_frontmatter_field(destination, key, FieldUpdate::Append(source.link()))
        .await
    {
        Ok(_) => {
            progress.dest_linked = true;
            log::info!(
                "Linked '{}' -[{}]-> '{}'",
                source.title,
                relation,
                destination.title
            );
            Ok(progress)
        }
        Err(e) => {
            log::error!(
                "'{}' links to '{}' but the back-link failed: {}",
                source.title,
                destination.title,
                e
            );
            Err(SyncError::PartialPersistence {
                progress,
                source: e,
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::StoreError;
    use crate::frontmatter::Frontmatter;
    use crate::sync::MemoryDocumentStore;
    use serde_json::json;

    fn supports() -> RelationTypeId {
        RelationTypeId::new("relation_supports")
    }

    #[tokio::test]
    async fn test_links_both_sides_once() {
        let store = MemoryDocumentStore::new();
        let evidence = store.insert("EVD - Rain", Frontmatter::new());
        let claim = store.insert("CLM - Wet", Frontmatter::new());
        let abort = AbortSignal::new();

        for _ in 0..2 {
            let progress = link_documents(&store, &supports(), &evidence, &claim, &abort)
                .await
                .unwrap();
            assert!(progress.is_complete());
        }

        assert_eq!(
            store.read_frontmatter(&evidence).await.unwrap()["relation_supports"],
            json!(["[[CLM - Wet]]"])
        );
        assert_eq!(
            store.read_frontmatter(&claim).await.unwrap()["relation_supports"],
            json!(["[[EVD - Rain]]"])
        );
    }

    #[tokio::test]
    async fn test_second_write_failure_is_partial() {
        let store = MemoryDocumentStore::new();
        let evidence = store.insert("EVD - Rain", Frontmatter::new());
        let claim = store.insert("CLM - Wet", Frontmatter::new());
        store.reject_writes_to("CLM - Wet");

        let err = link_documents(&store, &supports(), &evidence, &claim, &AbortSignal::new())
            .await
            .unwrap_err();

        match err {
            SyncError::PartialPersistence { progress, source } => {
                assert!(progress.source_linked);
                assert!(!progress.dest_linked);
                assert!(matches!(source, StoreError::Rejected(_)));
            }
            other => panic!("expected partial persistence, got {:?}", other),
        }
        assert!(store
            .read_frontmatter(&evidence)
            .await
            .unwrap()
            .contains_key("relation_supports"));
    }

    #[tokio::test]
    async fn test_first_write_failure_is_total() {
        let store = MemoryDocumentStore::new();
        let evidence = store.insert("EVD - Rain", Frontmatter::new());
        let claim = store.insert("CLM - Wet", Frontmatter::new());
        store.reject_writes_to("EVD - Rain");

        let err = link_documents(&store, &supports(), &evidence, &claim, &AbortSignal::new())
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            SyncError::Persistence {
                stage: PersistStage::Relation,
                ..
            }
        ));
        assert!(!err.is_partial());
        assert!(store.read_frontmatter(&claim).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_abort_before_writing() {
        let store = MemoryDocumentStore::new();
        let evidence = store.insert("EVD - Rain", Frontmatter::new());
        let claim = store.insert("CLM - Wet", Frontmatter::new());
        let abort = AbortSignal::new();
        abort.abort();

        let err = link_documents(&store, &supports(), &evidence, &claim, &abort)
            .await
            .unwrap_err();
        assert!(matches!(err, SyncError::Aborted { .. }));
        assert!(store.read_frontmatter(&evidence).await.unwrap().is_empty());
    }
}
