use super::{apply_config, log_to_client, publish_findings};
use crate::config::ServerSettings;
use crate::state::GlobalState;
use discourse_core::{DiscourseConfig, Vault};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;

pub const COMMANDS: [&str; 5] = [
    "discourse/createNode",
    "discourse/addRelation",
    "discourse/availableRelations",
    "discourse/compatibleNodes",
    "discourse/listNodes",
];

/// Handle "initialize" request
pub async fn handle_initialize(
    client: &Client,
    state: &GlobalState,
    params: InitializeParams,
) -> Result<InitializeResult> {
    if let Some(options) = params.initialization_options {
        match serde_json::from_value::<ServerSettings>(options) {
            Ok(settings) => *state.server.write().await = settings,
            Err(e) => {
                log_to_client(
                    client,
                    state,
                    MessageType::WARNING,
                    format!("Ignoring invalid initialization options: {}", e),
                )
                .await
            }
        }
    }

    if let Some(uri) = params.root_uri {
        if let Ok(root_path) = uri.to_file_path() {
            log_to_client(
                client,
                state,
                MessageType::INFO,
                format!("Initializing vault at: {:?}", root_path),
            )
            .await;

            let config_path = root_path.join(&state.server.read().await.config_path);
            let config = match DiscourseConfig::load(&config_path, state.fs.as_ref()) {
                Ok(config) => config,
                Err(e) => {
                    log_to_client(
                        client,
                        state,
                        MessageType::ERROR,
                        format!("Failed to load {:?}, using defaults: {}", config_path, e),
                    )
                    .await;
                    DiscourseConfig::default()
                }
            };
            apply_config(state, config.clone()).await;

            let fs = state.fs.clone();
            let vault_config = config.vault.clone();
            let (vault, stats) = tokio::task::spawn_blocking(move || {
                let mut v = Vault::new(root_path, fs, vault_config);
                let stats = v.initialize();
                (v, stats)
            })
            .await
            .map_err(|e| tower_lsp::jsonrpc::Error {
                code: tower_lsp::jsonrpc::ErrorCode::InternalError,
                message: format!("Failed to initialize vault: {}", e).into(),
                data: None,
            })?;

            if config.logging.show_indexing_stats {
                let nodes = vault.nodes(&config.settings).len();
                log_to_client(
                    client,
                    state,
                    MessageType::INFO,
                    format!(
                        "Indexed {} markdown files ({} unreadable), {} discourse nodes",
                        stats.total_files, stats.unreadable, nodes
                    ),
                )
                .await;
            }

            let mut vault_lock = state.vault.write().await;
            *vault_lock = Some(vault);
        }
    } else {
        log_to_client(client, state, MessageType::WARNING, "No rootUri provided!").await;
    }

    Ok(InitializeResult {
        capabilities: ServerCapabilities {
            text_document_sync: Some(TextDocumentSyncCapability::Kind(TextDocumentSyncKind::FULL)),
            hover_provider: Some(HoverProviderCapability::Simple(true)),
            execute_command_provider: Some(ExecuteCommandOptions {
                commands: COMMANDS.iter().map(|c| c.to_string()).collect(),
                work_done_progress_options: Default::default(),
            }),
            ..Default::default()
        },
        server_info: Some(ServerInfo {
            name: "discourse-lsp".to_string(),
            version: Some(env!("CARGO_PKG_VERSION").to_string()),
        }),
    })
}

/// Handle "initialized" notification: the client can now receive diagnostics
pub async fn handle_initialized(client: &Client, state: &GlobalState) {
    log::info!("Client initialized, ready to accept requests");
    publish_findings(client, state, None).await;
}
