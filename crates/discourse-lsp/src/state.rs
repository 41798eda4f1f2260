use crate::config::ServerSettings;
use discourse_core::vfs::FileSystem;
use discourse_core::{DiscourseConfig, SharedSettings, Vault};
use std::sync::Arc;
use tokio::sync::RwLock;

/// Global state for LSP server
/// Must be Send + Sync
#[derive(Clone)]
pub struct GlobalState {
    /// Index of the open vault, `None` until initialize ran
    pub vault: Arc<RwLock<Option<Vault>>>,
    /// Live catalogs; every request takes its own snapshot
    pub settings: Arc<SharedSettings>,
    /// Last loaded `.discourse/config.yaml`
    pub config: Arc<RwLock<DiscourseConfig>>,
    pub server: Arc<RwLock<ServerSettings>>,
    pub fs: Arc<dyn FileSystem>,
}

impl GlobalState {
    pub fn new(fs: Arc<dyn FileSystem>) -> Self {
        Self {
            vault: Arc::new(RwLock::new(None)),
            settings: Arc::new(SharedSettings::default()),
            config: Arc::new(RwLock::new(DiscourseConfig::default())),
            server: Arc::new(RwLock::new(ServerSettings::default())),
            fs,
        }
    }
}
