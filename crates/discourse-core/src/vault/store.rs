use crate::error::StoreError;
use crate::frontmatter::{Frontmatter, MarkdownDocument};
use crate::model::DocumentRef;
use crate::specification::check_file_name;
use crate::sync::{apply_field_update, DocumentStore, FieldUpdate, FieldWrite};
use crate::utils::{normalize_document_id, title_from_path};
use crate::vfs::FileSystem;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

/// Document store over the Markdown files of a vault.
///
/// Document ids are vault-relative paths and titles are file basenames.
/// Every read-modify-write of a file runs under one lock.
pub struct MarkdownStore {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    nodes_folder: String,
    write_lock: Mutex<()>,
    touched: Mutex<Vec<String>>,
}

impl MarkdownStore {
    pub fn new(root: PathBuf, fs: Arc<dyn FileSystem>, nodes_folder: impl Into<String>) -> Self {
        Self {
            root,
            fs,
            nodes_folder: nodes_folder.into(),
            write_lock: Mutex::new(()),
            touched: Mutex::new(Vec::new()),
        }
    }

    /// Ids of documents written since the last call
    pub fn take_touched(&self) -> Vec<String> {
        match self.touched.lock() {
            Ok(mut touched) => {
                let mut ids = std::mem::take(&mut *touched);
                ids.dedup();
                ids
            }
            Err(_) => Vec::new(),
        }
    }

    pub fn path_of(&self, doc: &DocumentRef) -> PathBuf {
        self.root.join(&doc.id)
    }

    fn document_ref(&self, path: &Path) -> DocumentRef {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        DocumentRef::new(normalize_document_id(relative), title_from_path(path))
    }

    fn touch(&self, doc: &DocumentRef) {
        if let Ok(mut touched) = self.touched.lock() {
            touched.push(doc.id.clone());
        }
    }

    fn read_document(&self, doc: &DocumentRef) -> Result<MarkdownDocument, StoreError> {
        let path = self.path_of(doc);
        if !self.fs.exists(&path) {
            return Err(StoreError::NotFound(doc.id.clone()));
        }
        MarkdownDocument::parse(&self.fs.read_to_string(&path)?)
    }

    /// First free `<title>.md`, then `<title> 1.md`, `<title> 2.md`...
    fn available_path(&self, title: &str) -> PathBuf {
        let folder = self.root.join(self.nodes_folder.trim_matches('/'));
        let mut candidate = folder.join(format!("{}.md", title));
        let mut n = 1;
        while self.fs.exists(&candidate) {
            candidate = folder.join(format!("{} {}.md", title, n));
            n += 1;
        }
        candidate
    }
}

#[async_trait]
impl DocumentStore for MarkdownStore {
    async fn read_frontmatter(&self, doc: &DocumentRef) -> Result<Frontmatter, StoreError> {
        Ok(self.read_document(doc)?.frontmatter)
    }

    async fn write_frontmatter_field(
        &self,
        doc: &DocumentRef,
        key: &str,
        update: FieldUpdate,
    ) -> Result<FieldWrite, StoreError> {
        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Rejected("vault write lock poisoned".to_string()))?;

        let mut document = self.read_document(doc)?;
        let write = apply_field_update(&mut document.frontmatter, key, update);
        if write == FieldWrite::Changed {
            self.fs.write(&self.path_of(doc), &document.render()?)?;
            self.touch(doc);
            log::debug!("Updated '{}' in {}", key, doc.id);
        }
        Ok(write)
    }

    async fn create_document(&self, title: &str) -> Result<DocumentRef, StoreError> {
        check_file_name(title).map_err(StoreError::Rejected)?;

        let _guard = self
            .write_lock
            .lock()
            .map_err(|_| StoreError::Rejected("vault write lock poisoned".to_string()))?;

        let path = self.available_path(title.trim());
        if self.fs.exists(&path) {
            return Err(StoreError::AlreadyExists(path));
        }
        self.fs.write(&path, "")?;

        let doc = self.document_ref(&path);
        self.touch(&doc);
        log::info!("Created document {}", doc.id);
        Ok(doc)
    }
}
