use crate::conversion::{finding_to_diagnostic, path_to_uri};
use crate::state::GlobalState;
use discourse_core::SettingsStore;
use std::collections::BTreeMap;
use tower_lsp::lsp_types::{Diagnostic, Url};
use tower_lsp::Client;

/// Publish audit findings for `ids`, or for the whole vault when `None`.
///
/// Documents without findings get an empty list so stale diagnostics clear.
pub async fn publish_findings(client: &Client, state: &GlobalState, ids: Option<&[String]>) {
    if !state.server.read().await.publish_diagnostics {
        return;
    }

    let settings = state.settings.snapshot();
    let batches: Vec<(Url, Vec<Diagnostic>)> = {
        let vault_lock = state.vault.read().await;
        let Some(vault) = &*vault_lock else {
            return;
        };

        let mut grouped: BTreeMap<String, Vec<Diagnostic>> = match ids {
            Some(ids) => ids.iter().map(|id| (id.clone(), Vec::new())).collect(),
            None => vault
                .entries()
                .map(|e| (e.document.id.clone(), Vec::new()))
                .collect(),
        };

        let findings: Vec<_> = match ids {
            Some(ids) => ids
                .iter()
                .flat_map(|id| vault.findings_for(&settings, id))
                .collect(),
            None => vault.audit(&settings),
        };
        for finding in &findings {
            grouped
                .entry(finding.document.clone())
                .or_default()
                .push(finding_to_diagnostic(finding));
        }

        grouped
            .into_iter()
            .filter_map(|(id, diagnostics)| {
                let uri = path_to_uri(&vault.path_of(&id))?;
                Some((uri, diagnostics))
            })
            .collect()
    };

    for (uri, diagnostics) in batches {
        client.publish_diagnostics(uri, diagnostics, None).await;
    }
}
