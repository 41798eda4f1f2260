use super::{log_to_client, publish_findings};
use crate::conversion::{document_id, node_summary};
use crate::protocol::*;
use crate::state::GlobalState;
use discourse_core::error::SyncError;
use discourse_core::model::{DiscourseNode, DocumentRef};
use discourse_core::sync::{NodeRequest, RelationRequest};
use discourse_core::{
    MarkdownStore, NodeTypeId, RelationCatalog, RelationTypeId, SettingsStore, SyncSession, Vault,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tower_lsp::jsonrpc::{Error, ErrorCode, Result};
use tower_lsp::lsp_types::*;
use tower_lsp::Client;

/// Handle "workspace/executeCommand" request
pub async fn handle_execute_command(
    client: &Client,
    state: &GlobalState,
    params: ExecuteCommandParams,
) -> Result<Option<serde_json::Value>> {
    match params.command.as_str() {
        "discourse/createNode" => handle_create_node(client, state, parse_args(&params)?).await,
        "discourse/addRelation" => handle_add_relation(client, state, parse_args(&params)?).await,
        "discourse/availableRelations" => {
            handle_available_relations(state, parse_args(&params)?).await
        }
        "discourse/compatibleNodes" => handle_compatible_nodes(state, parse_args(&params)?).await,
        "discourse/listNodes" => {
            let args = if params.arguments.is_empty() {
                ListNodesParams::default()
            } else {
                parse_args(&params)?
            };
            handle_list_nodes(state, args).await
        }
        other => Err(Error::invalid_params(format!("Unknown command: {}", other))),
    }
}

fn parse_args<T: DeserializeOwned>(params: &ExecuteCommandParams) -> Result<T> {
    let Some(first_arg) = params.arguments.first() else {
        return Err(Error::invalid_params("Missing params"));
    };
    serde_json::from_value(first_arg.clone())
        .map_err(|e| Error::invalid_params(format!("Invalid params: {}", e)))
}

fn to_value<T: Serialize>(result: T) -> Result<Option<serde_json::Value>> {
    serde_json::to_value(result).map(Some).map_err(|e| Error {
        code: ErrorCode::InternalError,
        message: format!("Failed to serialize results: {}", e).into(),
        data: None,
    })
}

fn vault_not_initialized() -> Error {
    Error {
        code: ErrorCode::InternalError,
        message: "Vault not initialized".into(),
        data: None,
    }
}

/// Rejections of the request are invalid params; failures while writing are internal.
fn sync_error(e: SyncError) -> Error {
    let message = e.to_string();
    match e {
        SyncError::UnknownNodeType(_)
        | SyncError::UnknownRelationType(_)
        | SyncError::Formatting(_)
        | SyncError::InvalidRelationPair(_) => Error::invalid_params(message),
        _ => Error {
            code: ErrorCode::InternalError,
            message: message.into(),
            data: None,
        },
    }
}

fn resolve_document(vault: &Vault, reference: &str) -> Result<DocumentRef> {
    document_id(vault, reference)
        .and_then(|id| vault.entry(&id))
        .map(|entry| entry.document.clone())
        .ok_or_else(|| Error::invalid_params(format!("Unknown document: {}", reference)))
}

/// Pick up the files a store wrote and republish their diagnostics.
async fn refresh_touched(client: &Client, state: &GlobalState, store: &MarkdownStore) {
    let touched = store.take_touched();
    if touched.is_empty() {
        return;
    }
    {
        let mut vault_lock = state.vault.write().await;
        if let Some(vault) = &mut *vault_lock {
            for id in &touched {
                vault.refresh(id);
            }
        }
    }
    publish_findings(client, state, Some(&touched)).await;
}

pub async fn handle_create_node(
    client: &Client,
    state: &GlobalState,
    params: CreateNodeParams,
) -> Result<Option<serde_json::Value>> {
    let settings = state.settings.snapshot();
    let node_type_id = NodeTypeId::new(params.node_type_id);

    let (store, request) = {
        let vault_guard = state.vault.read().await;
        let vault = vault_guard.as_ref().ok_or_else(vault_not_initialized)?;

        let mut request = NodeRequest::new(node_type_id.clone(), params.content);
        if let Some(reference) = &params.reference {
            request = request.with_reference(resolve_document(vault, reference)?);
        }
        if let Some(relation) = params.relation {
            let target = resolve_document(vault, &relation.target)?;
            let target_type = vault
                .classify(&settings, &target.id)
                .and_then(|c| c.node_type_id().cloned());
            let relation_type_id = RelationTypeId::new(relation.relation_type_id);
            let new_node_is_source = relation.new_node_is_source.unwrap_or_else(|| {
                RelationCatalog::new(&settings)
                    .counterparts(&node_type_id, &relation_type_id, true)
                    .iter()
                    .any(|nt| Some(&nt.id) == target_type.as_ref())
            });
            request = request.with_relation(RelationRequest {
                relation_type_id,
                target,
                target_node_type_id: target_type,
                new_node_is_source,
                target_shape: None,
            });
        }
        (vault.store(), request)
    };

    let config = state.config.read().await.clone();
    let outcome = {
        let mut session = SyncSession::new(&*settings, &config, &store);
        session.create_node(request).await
    };
    refresh_touched(client, state, &store).await;

    let created = match outcome {
        Ok(created) => created,
        Err(e) => {
            log_to_client(
                client,
                state,
                MessageType::ERROR,
                format!("Failed to create node: {}", e),
            )
            .await;
            return Err(sync_error(e));
        }
    };
    log_to_client(
        client,
        state,
        MessageType::INFO,
        format!("Created discourse node {}", created.document.id),
    )
    .await;

    let vault_guard = state.vault.read().await;
    let vault = vault_guard.as_ref().ok_or_else(vault_not_initialized)?;
    let node = vault
        .node(&settings, &created.document.id)
        .unwrap_or_else(|| DiscourseNode {
            document: created.document.clone(),
            node_type_id: created.node_type_id.clone(),
            content: None,
        });
    to_value(CreateNodeResult {
        node: node_summary(vault, node),
        instance_id: created.instance_id,
        relation: created.relation,
    })
}

pub async fn handle_add_relation(
    client: &Client,
    state: &GlobalState,
    params: AddRelationParams,
) -> Result<Option<serde_json::Value>> {
    let settings = state.settings.snapshot();
    let (store, source, target) = {
        let vault_guard = state.vault.read().await;
        let vault = vault_guard.as_ref().ok_or_else(vault_not_initialized)?;
        (
            vault.store(),
            resolve_document(vault, &params.source)?,
            resolve_document(vault, &params.target)?,
        )
    };

    let config = state.config.read().await.clone();
    let relation = RelationTypeId::new(params.relation_type_id);
    let outcome = {
        let mut session = SyncSession::new(&*settings, &config, &store);
        session.add_relation(&relation, &source, &target).await
    };
    refresh_touched(client, state, &store).await;

    match outcome {
        Ok(progress) => to_value(AddRelationResult { progress }),
        Err(e) => {
            log_to_client(
                client,
                state,
                MessageType::ERROR,
                format!("Failed to add relation: {}", e),
            )
            .await;
            Err(sync_error(e))
        }
    }
}

pub async fn handle_available_relations(
    state: &GlobalState,
    params: AvailableRelationsParams,
) -> Result<Option<serde_json::Value>> {
    let settings = state.settings.snapshot();
    let vault_guard = state.vault.read().await;
    let vault = vault_guard.as_ref().ok_or_else(vault_not_initialized)?;

    let document = resolve_document(vault, &params.document)?;
    let relations = match vault.node(&settings, &document.id) {
        Some(node) => RelationCatalog::new(&settings).available_relation_types(&node.node_type_id),
        None => Vec::new(),
    };
    to_value(AvailableRelationsResult { relations })
}

pub async fn handle_compatible_nodes(
    state: &GlobalState,
    params: CompatibleNodesParams,
) -> Result<Option<serde_json::Value>> {
    let settings = state.settings.snapshot();
    let vault_guard = state.vault.read().await;
    let vault = vault_guard.as_ref().ok_or_else(vault_not_initialized)?;

    let document = resolve_document(vault, &params.document)?;
    let relation = RelationTypeId::new(params.relation_type_id);
    let nodes = vault
        .compatible_documents(&settings, &document.id, &relation)
        .into_iter()
        .map(|node| node_summary(vault, node))
        .collect();
    to_value(ListNodesResult { nodes })
}

pub async fn handle_list_nodes(
    state: &GlobalState,
    params: ListNodesParams,
) -> Result<Option<serde_json::Value>> {
    let settings = state.settings.snapshot();
    let vault_guard = state.vault.read().await;
    let vault = vault_guard.as_ref().ok_or_else(vault_not_initialized)?;

    let node_type = params.node_type_id.map(NodeTypeId::new);
    let nodes = vault
        .search(&settings, node_type.as_ref(), params.query.as_deref())
        .into_iter()
        .map(|node| node_summary(vault, node))
        .collect();
    to_value(ListNodesResult { nodes })
}
