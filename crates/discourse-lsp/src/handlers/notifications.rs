use super::{publish_findings, reload_config_file};
use crate::state::GlobalState;
use std::path::Path;
use tower_lsp::lsp_types::*;
use tower_lsp::Client;

/// Handle "textDocument/didOpen" notification
pub async fn handle_did_open(client: &Client, state: &GlobalState, params: DidOpenTextDocumentParams) {
    let uri = params.text_document.uri;
    update_document(client, state, &uri, &params.text_document.text).await;
}

/// Handle "textDocument/didChange" notification
pub async fn handle_did_change(
    client: &Client,
    state: &GlobalState,
    params: DidChangeTextDocumentParams,
) {
    if let Some(last_change) = params.content_changes.last() {
        update_document(client, state, &params.text_document.uri, &last_change.text).await;
    }
}

async fn update_document(client: &Client, state: &GlobalState, uri: &Url, text: &str) {
    let Ok(path) = uri.to_file_path() else {
        return;
    };
    if !is_markdown(&path) {
        return;
    }

    let id = {
        let mut vault_lock = state.vault.write().await;
        let Some(v) = &mut *vault_lock else {
            return;
        };
        v.update_content(&path, text);
        v.document_id(&path)
    };
    publish_findings(client, state, Some(&[id])).await;
}

/// Handle "workspace/didChangeWatchedFiles" notification
pub async fn handle_did_change_watched_files(
    client: &Client,
    state: &GlobalState,
    params: DidChangeWatchedFilesParams,
) {
    let config_path = {
        let vault_lock = state.vault.read().await;
        let Some(v) = &*vault_lock else {
            return;
        };
        v.root().join(&state.server.read().await.config_path)
    };

    let mut config_changed = false;
    let mut touched = Vec::new();
    let mut deleted = Vec::new();
    {
        let mut vault_lock = state.vault.write().await;
        let Some(v) = &mut *vault_lock else {
            return;
        };
        for change in params.changes {
            let Ok(path) = change.uri.to_file_path() else {
                continue;
            };
            if path == config_path {
                config_changed = true;
                continue;
            }
            if !is_markdown(&path) {
                continue;
            }

            match change.typ {
                FileChangeType::CREATED | FileChangeType::CHANGED => {
                    if let Ok(content) = state.fs.read_to_string(&path) {
                        v.update_content(&path, &content);
                        touched.push(v.document_id(&path));
                    }
                }
                FileChangeType::DELETED => {
                    v.delete_file(&path);
                    deleted.push(change.uri);
                }
                _ => {}
            }
        }
    }

    for uri in deleted {
        client.publish_diagnostics(uri, Vec::new(), None).await;
    }
    if config_changed {
        reload_config_file(client, state).await;
    } else if !touched.is_empty() {
        publish_findings(client, state, Some(&touched)).await;
    }
}

fn is_markdown(path: &Path) -> bool {
    path.extension().map_or(false, |ext| ext == "md")
}
