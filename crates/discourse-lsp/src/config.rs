use serde::{Deserialize, Serialize};
use tower_lsp::lsp_types::MessageType;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ServerSettings {
    /// Lowest level mirrored to the client's log channel
    pub log_level: LogLevel,

    /// Whether audit findings are published as diagnostics
    pub publish_diagnostics: bool,

    /// Vault-relative path of the discourse config file
    pub config_path: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub enum LogLevel {
    Trace,
    Debug,
    Info,
    Warning,
    Error,
}

impl LogLevel {
    fn rank(self) -> u8 {
        match self {
            LogLevel::Error => 1,
            LogLevel::Warning => 2,
            LogLevel::Info => 3,
            LogLevel::Debug | LogLevel::Trace => 4,
        }
    }

    pub fn allows(self, typ: MessageType) -> bool {
        let rank = match typ {
            MessageType::ERROR => 1,
            MessageType::WARNING => 2,
            MessageType::INFO => 3,
            _ => 4,
        };
        rank <= self.rank()
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            log_level: LogLevel::Info,
            publish_diagnostics: true,
            config_path: ".discourse/config.yaml".to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_settings_use_defaults() {
        let settings: ServerSettings =
            serde_json::from_value(serde_json::json!({ "logLevel": "warning" })).unwrap();
        assert_eq!(settings.log_level, LogLevel::Warning);
        assert!(settings.publish_diagnostics);
        assert_eq!(settings.config_path, ".discourse/config.yaml");

        assert!(settings.log_level.allows(MessageType::ERROR));
        assert!(!settings.log_level.allows(MessageType::INFO));
    }
}
