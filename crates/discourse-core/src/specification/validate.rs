use super::{tokenize, Segment};
use crate::model::{NodeType, NodeTypeId};

/// Why a node type definition cannot be used to create Markdown notes
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormatIssue {
    #[error("Name and format are required")]
    Missing,
    #[error("Format cannot be empty")]
    EmptyFormat,
    #[error("Format should not contain double brackets [[ or ]]")]
    DoubleBrackets,
    #[error("Format must include the placeholder \"{{content}}\"")]
    MissingContent,
    #[error("Format has unbalanced braces: {0}")]
    Malformed(String),
    #[error("Format must be unique")]
    DuplicateFormat,
    #[error("Name must be unique")]
    DuplicateName,
}

/// Check one format in the context of the whole catalog.
///
/// Titles double as file names in a Markdown vault, so wikilink brackets
/// are refused here even though the matcher handles them.
pub fn validate_node_format(format: &str, node_types: &[NodeType]) -> Result<(), FormatIssue> {
    let format = format.trim();
    if format.is_empty() {
        return Err(FormatIssue::EmptyFormat);
    }
    if format.contains("[[") || format.contains("]]") {
        return Err(FormatIssue::DoubleBrackets);
    }
    let segments = tokenize(format).map_err(FormatIssue::Malformed)?;
    let has_content = segments.iter().any(|segment| {
        matches!(segment, Segment::Placeholder(name) if name.eq_ignore_ascii_case("content"))
    });
    if !has_content {
        return Err(FormatIssue::MissingContent);
    }
    if node_types
        .iter()
        .filter(|nt| nt.format.trim() == format)
        .count()
        > 1
    {
        return Err(FormatIssue::DuplicateFormat);
    }
    Ok(())
}

/// Every invalid node type paired with its first issue, in catalog order.
pub fn validate_all_node_types(node_types: &[NodeType]) -> Vec<(NodeTypeId, FormatIssue)> {
    node_types
        .iter()
        .filter_map(|node_type| {
            let issue = if node_type.label.trim().is_empty() || node_type.format.trim().is_empty()
            {
                Some(FormatIssue::Missing)
            } else if let Err(issue) = validate_node_format(&node_type.format, node_types) {
                Some(issue)
            } else if node_types
                .iter()
                .filter(|nt| nt.label.trim() == node_type.label.trim())
                .count()
                > 1
            {
                Some(FormatIssue::DuplicateName)
            } else {
                None
            };
            issue.map(|issue| (node_type.id.clone(), issue))
        })
        .collect()
}

const FORBIDDEN_FILE_NAME_CHARS: &[char] = &['\\', '/', ':', '*', '?', '"', '<', '>', '|'];

/// Reject titles that cannot be used as a Markdown file name.
pub fn check_file_name(title: &str) -> Result<(), String> {
    let title = title.trim();
    if title.is_empty() {
        return Err("file name is empty".to_string());
    }
    if title.starts_with('.') {
        return Err(format!("'{}' starts with a dot", title));
    }
    if let Some(c) = title.chars().find(|c| FORBIDDEN_FILE_NAME_CHARS.contains(c)) {
        return Err(format!("'{}' contains forbidden character '{}'", title, c));
    }
    Ok(())
}
