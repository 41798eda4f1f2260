use crate::model::DiscourseSettings;
use std::sync::{Arc, RwLock};

/// Read-only access to the current catalogs.
///
/// Callers take a fresh snapshot per user action and never hold one across actions,
/// so edits made in a settings panel are picked up by the next query.
pub trait SettingsStore: Send + Sync {
    fn snapshot(&self) -> Arc<DiscourseSettings>;
}

/// Hot-reloadable settings holder
#[derive(Debug)]
pub struct SharedSettings {
    current: RwLock<Arc<DiscourseSettings>>,
}

impl SharedSettings {
    pub fn new(settings: DiscourseSettings) -> Self {
        Self {
            current: RwLock::new(Arc::new(settings)),
        }
    }

    /// Swap in a new catalog snapshot. Snapshots already handed out stay valid.
    pub fn replace(&self, settings: DiscourseSettings) {
        match self.current.write() {
            Ok(mut guard) => *guard = Arc::new(settings),
            Err(poisoned) => *poisoned.into_inner() = Arc::new(settings),
        }
        log::info!("Discourse settings reloaded");
    }
}

impl Default for SharedSettings {
    fn default() -> Self {
        Self::new(DiscourseSettings::default())
    }
}

impl SettingsStore for SharedSettings {
    fn snapshot(&self) -> Arc<DiscourseSettings> {
        match self.current.read() {
            Ok(guard) => guard.clone(),
            Err(poisoned) => poisoned.into_inner().clone(),
        }
    }
}

impl SettingsStore for DiscourseSettings {
    fn snapshot(&self) -> Arc<DiscourseSettings> {
        Arc::new(self.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_replace_does_not_affect_taken_snapshot() {
        let shared = SharedSettings::default();
        let before = shared.snapshot();

        shared.replace(DiscourseSettings::empty());

        assert_eq!(before.node_types.len(), 3);
        assert!(shared.snapshot().node_types.is_empty());
    }
}
