//! Markdown vault: discovery of discourse nodes on disk and a document
//! store that writes their frontmatter.

mod audit;
mod queries;
mod store;

pub use audit::{Finding, FindingKind};
pub use queries::DocumentRelation;
pub use store::MarkdownStore;

use crate::config::VaultConfig;
use crate::frontmatter::{Frontmatter, MarkdownDocument};
use crate::model::DocumentRef;
use crate::utils::{normalize_document_id, title_from_path};
use crate::vfs::FileSystem;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct IndexStats {
    pub total_files: usize,
    /// Files whose frontmatter could not be parsed
    pub unreadable: usize,
}

/// One Markdown file as last seen by the index.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentEntry {
    pub document: DocumentRef,
    pub frontmatter: Frontmatter,
    pub frontmatter_error: Option<String>,
}

impl DocumentEntry {
    fn from_text(document: DocumentRef, text: &str) -> Self {
        match MarkdownDocument::parse(text) {
            Ok(parsed) => Self {
                document,
                frontmatter: parsed.frontmatter,
                frontmatter_error: None,
            },
            Err(e) => {
                log::warn!("Unreadable frontmatter in {}: {}", document.id, e);
                Self {
                    document,
                    frontmatter: Frontmatter::new(),
                    frontmatter_error: Some(e.to_string()),
                }
            }
        }
    }

    /// Value of the explicit node type tag, if any
    pub fn tag(&self, key: &str) -> Option<&str> {
        self.frontmatter.get(key).and_then(|v| v.as_str())
    }
}

/// Index of a vault's Markdown files keyed by document id.
///
/// Only raw frontmatter is kept. Classification runs against the settings
/// passed to each query, so a settings reload needs no re-index.
pub struct Vault {
    root: PathBuf,
    fs: Arc<dyn FileSystem>,
    config: VaultConfig,
    entries: BTreeMap<String, DocumentEntry>,
}

impl Vault {
    pub fn new(root: PathBuf, fs: Arc<dyn FileSystem>, config: VaultConfig) -> Self {
        Self {
            root,
            fs,
            config,
            entries: BTreeMap::new(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config(&self) -> &VaultConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: VaultConfig) {
        self.config = config;
    }

    /// A store writing into this vault's files.
    pub fn store(&self) -> MarkdownStore {
        MarkdownStore::new(
            self.root.clone(),
            Arc::clone(&self.fs),
            self.config.nodes_folder.clone(),
        )
    }

    /// Scan every Markdown file under the root.
    pub fn initialize(&mut self) -> IndexStats {
        self.entries.clear();
        let files = self
            .fs
            .list_files(&self.root, "md", &self.config.ignore_patterns);

        let mut stats = IndexStats {
            total_files: files.len(),
            ..IndexStats::default()
        };
        for path in files {
            match self.fs.read_to_string(&path) {
                Ok(text) => {
                    let entry = DocumentEntry::from_text(self.document_ref(&path), &text);
                    if entry.frontmatter_error.is_some() {
                        stats.unreadable += 1;
                    }
                    self.entries.insert(entry.document.id.clone(), entry);
                }
                Err(e) => {
                    log::warn!("Failed to read {:?}: {}", path, e);
                    stats.unreadable += 1;
                }
            }
        }
        stats
    }

    /// Re-index one file from in-memory text (editor buffers included).
    pub fn update_content(&mut self, path: &Path, text: &str) {
        let entry = DocumentEntry::from_text(self.document_ref(path), text);
        self.entries.insert(entry.document.id.clone(), entry);
    }

    /// Re-read one document from disk.
    pub fn refresh(&mut self, id: &str) {
        let path = self.root.join(id);
        match self.fs.read_to_string(&path) {
            Ok(text) => self.update_content(&path, &text),
            Err(_) => {
                self.entries.remove(id);
            }
        }
    }

    pub fn delete_file(&mut self, path: &Path) {
        let id = self.document_id(path);
        self.entries.remove(&id);
    }

    pub fn document_id(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        normalize_document_id(relative)
    }

    pub fn path_of(&self, id: &str) -> PathBuf {
        self.root.join(id)
    }

    fn document_ref(&self, path: &Path) -> DocumentRef {
        DocumentRef::new(self.document_id(path), title_from_path(path))
    }

    pub fn entries(&self) -> impl Iterator<Item = &DocumentEntry> {
        self.entries.values()
    }

    pub fn entry(&self, id: &str) -> Option<&DocumentEntry> {
        self.entries.get(id)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
