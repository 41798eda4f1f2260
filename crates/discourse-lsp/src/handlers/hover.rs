use crate::state::GlobalState;
use discourse_core::{Classification, SettingsStore};
use tower_lsp::jsonrpc::Result;
use tower_lsp::lsp_types::*;

/// Handle "textDocument/hover" request
///
/// Anywhere in a discourse node document: its type, extracted content and relations.
pub async fn handle_hover(state: &GlobalState, params: HoverParams) -> Result<Option<Hover>> {
    let uri = &params.text_document_position_params.text_document.uri;
    let Ok(path) = uri.to_file_path() else {
        return Ok(None);
    };

    let settings = state.settings.snapshot();
    let state_lock = state.vault.read().await;
    let Some(vault) = &*state_lock else {
        return Ok(None);
    };
    let id = vault.document_id(&path);

    let value = match vault.classify(&settings, &id) {
        Some(Classification::Ambiguous(ids)) => format!(
            "**Ambiguous discourse node**\n\nTitle matches: {}",
            ids.iter()
                .map(|id| format!("`{}`", id))
                .collect::<Vec<_>>()
                .join(", ")
        ),
        Some(classification) if classification.is_node() => {
            let Some(node) = vault.node(&settings, &id) else {
                return Ok(None);
            };
            let label = settings
                .node_type(&node.node_type_id)
                .map(|nt| nt.label.as_str())
                .unwrap_or_else(|| node.node_type_id.as_str());

            let mut value = format!("**{}** `{}`", label, node.node_type_id);
            if let Some(content) = &node.content {
                value.push_str(&format!("\n\n{}", content));
            }

            let relations = vault.relations_of(&settings, &id);
            if !relations.is_empty() {
                value.push_str("\n\n---\n");
                for relation in relations {
                    let marker = if relation.target.is_some() { "" } else { " (missing)" };
                    value.push_str(&format!("\n- {} {}{}", relation.label, relation.link, marker));
                }
            }
            value
        }
        _ => return Ok(None),
    };

    Ok(Some(Hover {
        contents: HoverContents::Markup(MarkupContent {
            kind: MarkupKind::Markdown,
            value,
        }),
        range: None,
    }))
}
