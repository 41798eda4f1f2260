use crate::error::ConfigError;
use crate::model::DiscourseSettings;
use crate::specification::validate_all_node_types;
use crate::vfs::FileSystem;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;

/// Top-level configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscourseConfig {
    #[serde(default)]
    pub settings: DiscourseSettings,
    #[serde(default)]
    pub canvas: CanvasConfig,
    #[serde(default)]
    pub vault: VaultConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Canvas behaviour
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CanvasConfig {
    /// Distance (layout units) under which an unbound edge endpoint counts as
    /// attached to a node center. `None` ignores unbound edges entirely.
    #[serde(default = "default_proximity")]
    pub legacy_proximity_threshold: Option<f64>,
    #[serde(default = "default_node_width")]
    pub default_node_width: f64,
    #[serde(default = "default_node_height")]
    pub default_node_height: f64,
    #[serde(default)]
    pub text_metrics: TextMetrics,
}

/// Deterministic text layout model used to size node shapes.
///
/// Values mirror the node card layout: 8px padding, 2px border, a 16px title
/// with 4px margins and a 14px subtitle.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextMetrics {
    pub title_font_size: f64,
    pub title_line_height: f64,
    pub title_margin: f64,
    pub subtitle_font_size: f64,
    pub subtitle_line_height: f64,
    /// Average glyph advance as a fraction of the font size
    pub average_char_width: f64,
    pub padding: f64,
    pub border: f64,
    pub min_width: f64,
    pub max_width: f64,
    pub max_image_height: f64,
    pub image_gap: f64,
}

/// Markdown vault settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VaultConfig {
    /// Directory names skipped while scanning
    #[serde(default = "default_ignore_patterns")]
    pub ignore_patterns: Vec<String>,
    /// Frontmatter key carrying an explicit node type tag
    #[serde(default = "default_node_type_key")]
    pub node_type_key: String,
    /// Frontmatter key carrying the node instance id
    #[serde(default = "default_instance_id_key")]
    pub instance_id_key: String,
    /// Vault-relative folder new node documents are created in
    #[serde(default)]
    pub nodes_folder: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Whether to show indexing statistics on startup
    #[serde(default = "default_true")]
    pub show_indexing_stats: bool,
}

fn default_proximity() -> Option<f64> {
    Some(50.0)
}

fn default_node_width() -> f64 {
    160.0
}

fn default_node_height() -> f64 {
    64.0
}

fn default_ignore_patterns() -> Vec<String> {
    vec![
        ".git".to_string(),
        "node_modules".to_string(),
        ".obsidian".to_string(),
    ]
}

fn default_node_type_key() -> String {
    "nodeTypeId".to_string()
}

fn default_instance_id_key() -> String {
    "nodeInstanceId".to_string()
}

fn default_true() -> bool {
    true
}

impl Default for CanvasConfig {
    fn default() -> Self {
        Self {
            legacy_proximity_threshold: default_proximity(),
            default_node_width: default_node_width(),
            default_node_height: default_node_height(),
            text_metrics: TextMetrics::default(),
        }
    }
}

impl Default for TextMetrics {
    fn default() -> Self {
        Self {
            title_font_size: 16.0,
            title_line_height: 1.5,
            title_margin: 4.0,
            subtitle_font_size: 14.0,
            subtitle_line_height: 1.25,
            average_char_width: 0.55,
            padding: 8.0,
            border: 2.0,
            min_width: 160.0,
            max_width: 400.0,
            max_image_height: 250.0,
            image_gap: 4.0,
        }
    }
}

impl Default for VaultConfig {
    fn default() -> Self {
        Self {
            ignore_patterns: default_ignore_patterns(),
            node_type_key: default_node_type_key(),
            instance_id_key: default_instance_id_key(),
            nodes_folder: String::new(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            show_indexing_stats: true,
        }
    }
}

impl DiscourseConfig {
    /// Parse config from YAML text
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        let config: DiscourseConfig = serde_yaml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Serialize to YAML
    pub fn to_yaml(&self) -> Result<String, ConfigError> {
        Ok(serde_yaml::to_string(self)?)
    }

    /// Load config from a file. A missing file yields the defaults.
    pub fn load(path: &Path, fs: &dyn FileSystem) -> Result<Self, ConfigError> {
        if !fs.exists(path) {
            log::info!("No config at {:?}, using defaults", path);
            return Ok(Self::default());
        }
        let content = fs.read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Reject catalogs with duplicate ids, unusable node formats, or
    /// declarations naming unknown ids.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let settings = &self.settings;

        if let Some((id, issue)) = validate_all_node_types(&settings.node_types)
            .into_iter()
            .next()
        {
            return Err(ConfigError::Invalid(format!("node type '{}': {}", id, issue)));
        }

        let mut node_ids = HashSet::new();
        for node_type in &settings.node_types {
            if !node_ids.insert(node_type.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate node type id '{}'",
                    node_type.id
                )));
            }
        }

        let mut relation_ids = HashSet::new();
        for relation_type in &settings.relation_types {
            if !relation_ids.insert(relation_type.id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "duplicate relation type id '{}'",
                    relation_type.id
                )));
            }
        }

        for (i, declaration) in settings.discourse_relations.iter().enumerate() {
            if !relation_ids.contains(declaration.relationship_type_id.as_str()) {
                return Err(ConfigError::Invalid(format!(
                    "discourse relation #{} names unknown relation type '{}'",
                    i, declaration.relationship_type_id
                )));
            }
            for endpoint in [
                &declaration.source_node_type_id,
                &declaration.destination_node_type_id,
            ] {
                if !node_ids.contains(endpoint.as_str()) {
                    return Err(ConfigError::Invalid(format!(
                        "discourse relation #{} names unknown node type '{}'",
                        i, endpoint
                    )));
                }
            }
        }

        Ok(())
    }
}
