//! Conversion utilities between Core types and LSP types

use crate::protocol::NodeSummary;
use discourse_core::model::DiscourseNode;
use discourse_core::vault::{Finding, FindingKind};
use discourse_core::Vault;
use std::path::Path;
use tower_lsp::lsp_types::{Diagnostic, DiagnosticSeverity, NumberOrString, Range};
use url::Url;

/// Convert a path to LSP Url
pub fn path_to_uri(path: &Path) -> Option<Url> {
    Url::from_file_path(path).ok()
}

/// Resolve a command argument to a document id.
///
/// `file:` URIs are made vault-relative; anything else is taken as an id.
pub fn document_id(vault: &Vault, reference: &str) -> Option<String> {
    match Url::parse(reference) {
        Ok(url) if url.scheme() == "file" => {
            let path = url.to_file_path().ok()?;
            Some(vault.document_id(&path))
        }
        _ => Some(reference.trim_start_matches(['/', '\\']).to_string()),
    }
}

pub fn node_summary(vault: &Vault, node: DiscourseNode) -> NodeSummary {
    NodeSummary {
        uri: path_to_uri(&vault.path_of(&node.document.id)).map(|u| u.to_string()),
        id: node.document.id,
        title: node.document.title,
        node_type_id: node.node_type_id.0,
        content: node.content,
    }
}

/// Convert an audit finding to an LSP Diagnostic on the first line of its document
pub fn finding_to_diagnostic(finding: &Finding) -> Diagnostic {
    let (severity, code) = match &finding.kind {
        FindingKind::UnreadableFrontmatter(_) => (DiagnosticSeverity::ERROR, "unreadable-frontmatter"),
        FindingKind::AmbiguousMatch(_) => (DiagnosticSeverity::WARNING, "ambiguous-match"),
        FindingKind::UnknownTag(_) => (DiagnosticSeverity::WARNING, "unknown-tag"),
        FindingKind::MissingTarget { .. } => (DiagnosticSeverity::WARNING, "missing-target"),
        FindingKind::InvalidPair(_) => (DiagnosticSeverity::WARNING, "invalid-relation"),
        FindingKind::TargetNotNode { .. } => (DiagnosticSeverity::INFORMATION, "target-not-node"),
        FindingKind::MissingReciprocal { .. } => {
            (DiagnosticSeverity::INFORMATION, "missing-reciprocal")
        }
    };

    Diagnostic {
        range: Range::default(),
        severity: Some(severity),
        code: Some(NumberOrString::String(code.to_string())),
        code_description: None,
        source: Some("discourse".to_string()),
        message: finding.message.clone(),
        related_information: None,
        tags: None,
        data: None,
    }
}
