use crate::error::StoreError;
use crate::frontmatter::Frontmatter;
use crate::model::DocumentRef;
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::RwLock;

/// Change requested for one frontmatter field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldUpdate {
    /// Overwrite the field
    Set(Value),
    /// Add an entry to a list field unless it is already present
    Append(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldWrite {
    Changed,
    /// The field already held the value; nothing was written
    Unchanged,
}

/// The host's document store.
///
/// Each call is independent: two writes to two documents are never atomic.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    async fn read_frontmatter(&self, doc: &DocumentRef) -> Result<Frontmatter, StoreError>;

    async fn write_frontmatter_field(
        &self,
        doc: &DocumentRef,
        key: &str,
        update: FieldUpdate,
    ) -> Result<FieldWrite, StoreError>;

    /// Create a new document. Two calls with the same title create two documents.
    async fn create_document(&self, title: &str) -> Result<DocumentRef, StoreError>;
}

/// Apply `update` to `frontmatter` with set-union semantics for appends.
///
/// A scalar string already in the field is promoted to a one-entry list.
pub fn apply_field_update(frontmatter: &mut Frontmatter, key: &str, update: FieldUpdate) -> FieldWrite {
    match update {
        FieldUpdate::Set(value) => {
            if frontmatter.get(key) == Some(&value) {
                return FieldWrite::Unchanged;
            }
            frontmatter.insert(key.to_string(), value);
            FieldWrite::Changed
        }
        FieldUpdate::Append(entry) => {
            let mut items = match frontmatter.remove(key) {
                Some(Value::Array(items)) => items,
                Some(Value::Null) | None => Vec::new(),
                Some(other) => vec![other],
            };
            let present = items.iter().any(|v| v.as_str() == Some(entry.as_str()));
            if !present {
                items.push(Value::String(entry));
            }
            frontmatter.insert(key.to_string(), Value::Array(items));
            if present {
                FieldWrite::Unchanged
            } else {
                FieldWrite::Changed
            }
        }
    }
}

#[derive(Debug, Clone, Default)]
struct MemoryDocument {
    title: String,
    frontmatter: Frontmatter,
}

/// Document store held in memory, keyed by generated ids.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    documents: RwLock<HashMap<String, MemoryDocument>>,
    /// Titles whose writes are refused
    rejected: RwLock<Vec<String>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a document with the given frontmatter and return its handle.
    pub fn insert(&self, title: &str, frontmatter: Frontmatter) -> DocumentRef {
        let doc = DocumentRef::new(crate::utils::id::generate_id(), title);
        if let Ok(mut documents) = self.documents.write() {
            documents.insert(
                doc.id.clone(),
                MemoryDocument {
                    title: title.to_string(),
                    frontmatter,
                },
            );
        }
        doc
    }

    /// Refuse every later frontmatter write to documents titled `title`.
    pub fn reject_writes_to(&self, title: &str) {
        if let Ok(mut rejected) = self.rejected.write() {
            rejected.push(title.to_string());
        }
    }

    pub fn len(&self) -> usize {
        self.documents.read().map(|d| d.len()).unwrap_or_default()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn titles(&self) -> Vec<String> {
        let mut titles: Vec<String> = self
            .documents
            .read()
            .map(|d| d.values().map(|doc| doc.title.clone()).collect())
            .unwrap_or_default();
        titles.sort();
        titles
    }

    fn poisoned() -> StoreError {
        StoreError::Rejected("document store lock poisoned".to_string())
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn read_frontmatter(&self, doc: &DocumentRef) -> Result<Frontmatter, StoreError> {
        let documents = self.documents.read().map_err(|_| Self::poisoned())?;
        documents
            .get(&doc.id)
            .map(|d| d.frontmatter.clone())
            .ok_or_else(|| StoreError::NotFound(doc.id.clone()))
    }

    async fn write_frontmatter_field(
        &self,
        doc: &DocumentRef,
        key: &str,
        update: FieldUpdate,
    ) -> Result<FieldWrite, StoreError> {
        let refused = self
            .rejected
            .read()
            .map_err(|_| Self::poisoned())?
            .iter()
            .any(|t| t == &doc.title);
        if refused {
            return Err(StoreError::Rejected(format!("writes to '{}' are refused", doc.title)));
        }

        let mut documents = self.documents.write().map_err(|_| Self::poisoned())?;
        let document = documents
            .get_mut(&doc.id)
            .ok_or_else(|| StoreError::NotFound(doc.id.clone()))?;
        Ok(apply_field_update(&mut document.frontmatter, key, update))
    }

    async fn create_document(&self, title: &str) -> Result<DocumentRef, StoreError> {
        Ok(self.insert(title, Frontmatter::new()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_append_is_set_union() {
        let mut fm = Frontmatter::new();

        assert_eq!(
            apply_field_update(&mut fm, "supports", FieldUpdate::Append("[[A]]".into())),
            FieldWrite::Changed
        );
        assert_eq!(
            apply_field_update(&mut fm, "supports", FieldUpdate::Append("[[A]]".into())),
            FieldWrite::Unchanged
        );
        apply_field_update(&mut fm, "supports", FieldUpdate::Append("[[B]]".into()));

        assert_eq!(fm["supports"], json!(["[[A]]", "[[B]]"]));
    }

    #[test]
    fn test_append_promotes_scalar() {
        let mut fm = Frontmatter::new();
        fm.insert("supports".to_string(), json!("[[A]]"));

        apply_field_update(&mut fm, "supports", FieldUpdate::Append("[[A]]".into()));
        assert_eq!(fm["supports"], json!(["[[A]]"]));

        apply_field_update(&mut fm, "supports", FieldUpdate::Append("[[B]]".into()));
        assert_eq!(fm["supports"], json!(["[[A]]", "[[B]]"]));
    }

    #[test]
    fn test_set_reports_unchanged() {
        let mut fm = Frontmatter::new();
        assert_eq!(
            apply_field_update(&mut fm, "k", FieldUpdate::Set(json!("v"))),
            FieldWrite::Changed
        );
        assert_eq!(
            apply_field_update(&mut fm, "k", FieldUpdate::Set(json!("v"))),
            FieldWrite::Unchanged
        );
    }

    #[tokio::test]
    async fn test_memory_store_creates_distinct_documents() {
        let store = MemoryDocumentStore::new();
        let a = store.create_document("CLM - x").await.unwrap();
        let b = store.create_document("CLM - x").await.unwrap();

        assert_ne!(a.id, b.id);
        assert_eq!(store.len(), 2);

        store
            .write_frontmatter_field(&a, "k", FieldUpdate::Set(json!(1)))
            .await
            .unwrap();
        assert!(store.read_frontmatter(&b).await.unwrap().is_empty());

        let missing = DocumentRef::new("nope", "nope");
        assert!(matches!(
            store.read_frontmatter(&missing).await,
            Err(StoreError::NotFound(_))
        ));
    }
}
