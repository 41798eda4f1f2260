use super::{log_to_client, publish_findings};
use crate::config::ServerSettings;
use crate::state::GlobalState;
use discourse_core::{DiscourseConfig, DiscourseSettings};
use serde::Deserialize;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;

/// The client's `discourse` settings section
#[derive(Debug, Deserialize)]
struct ClientSettings {
    #[serde(flatten)]
    server: ServerSettings,
    /// Catalogs edited in the client's settings panel
    #[serde(default)]
    catalogs: Option<DiscourseSettings>,
}

/// Swap in a freshly loaded config: catalog snapshot, vault options, stored copy.
pub(crate) async fn apply_config(state: &GlobalState, config: DiscourseConfig) {
    state.settings.replace(config.settings.clone());

    let mut vault_lock = state.vault.write().await;
    if let Some(vault) = &mut *vault_lock {
        let rescan = vault.config().ignore_patterns != config.vault.ignore_patterns;
        vault.set_config(config.vault.clone());
        if rescan {
            vault.initialize();
        }
    }
    drop(vault_lock);

    *state.config.write().await = config;
}

/// Re-read the config file after it changed on disk. A broken file keeps the old config.
pub async fn reload_config_file(client: &Client, state: &GlobalState) {
    let path = {
        let vault_lock = state.vault.read().await;
        let Some(vault) = &*vault_lock else {
            return;
        };
        vault.root().join(&state.server.read().await.config_path)
    };

    match DiscourseConfig::load(&path, state.fs.as_ref()) {
        Ok(config) => {
            apply_config(state, config).await;
            log_to_client(client, state, MessageType::INFO, "Discourse config reloaded").await;
            publish_findings(client, state, None).await;
        }
        Err(e) => {
            log_to_client(
                client,
                state,
                MessageType::ERROR,
                format!("Keeping previous config, {:?} is invalid: {}", path, e),
            )
            .await;
        }
    }
}

pub async fn handle_did_change_configuration(
    client: &Client,
    state: &GlobalState,
    params: DidChangeConfigurationParams,
) {
    let serde_json::Value::Object(map) = params.settings else {
        return;
    };
    let Some(section) = map.get("discourse") else {
        return;
    };

    match serde_json::from_value::<ClientSettings>(section.clone()) {
        Ok(new_settings) => {
            *state.server.write().await = new_settings.server;

            if let Some(catalogs) = new_settings.catalogs {
                let mut config = state.config.read().await.clone();
                config.settings = catalogs;
                match config.validate() {
                    Ok(()) => {
                        apply_config(state, config).await;
                        publish_findings(client, state, None).await;
                    }
                    Err(e) => {
                        log_to_client(
                            client,
                            state,
                            MessageType::ERROR,
                            format!("Rejected catalog update: {}", e),
                        )
                        .await;
                        return;
                    }
                }
            }

            log_to_client(client, state, MessageType::INFO, "Server settings updated").await;
        }
        Err(e) => {
            log_to_client(
                client,
                state,
                MessageType::ERROR,
                format!("Failed to parse updated settings: {}", e),
            )
            .await;
        }
    }
}
