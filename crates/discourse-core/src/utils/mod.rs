pub mod id;

use std::path::Path;

/// Wrap a document title as a wikilink.
///
/// # Examples
///
/// ```
/// use discourse_core::utils::wikilink;
///
/// assert_eq!(wikilink("CLM - Sky is blue"), "[[CLM - Sky is blue]]");
/// ```
pub fn wikilink(title: &str) -> String {
    format!("[[{}]]", title)
}

/// A parsed `[[target#anchor|alias]]` reference (Obsidian ordering).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WikiLinkTarget {
    pub target: String,
    pub anchor: Option<String>,
    pub alias: Option<String>,
}

/// Parse a frontmatter link value such as `[[EVD - Rain|evidence]]`.
///
/// Returns `None` for anything that is not a single wikilink.
///
/// # Examples
///
/// ```
/// use discourse_core::utils::parse_wikilink;
///
/// let link = parse_wikilink("[[note#section|Shown]]").unwrap();
/// assert_eq!(link.target, "note");
/// assert_eq!(link.anchor.as_deref(), Some("section"));
/// assert_eq!(link.alias.as_deref(), Some("Shown"));
/// assert!(parse_wikilink("plain text").is_none());
/// ```
pub fn parse_wikilink(raw: &str) -> Option<WikiLinkTarget> {
    let inner = raw.trim().strip_prefix("[[")?.strip_suffix("]]")?;
    if inner.contains("[[") || inner.contains("]]") {
        return None;
    }

    let (left, alias) = match inner.split_once('|') {
        Some((left, alias)) => (left, Some(alias.trim().to_string())),
        None => (inner, None),
    };

    let (target, anchor) = match left.split_once('#') {
        Some((target, anchor)) => (target, Some(anchor.trim().to_string())),
        None => (left, None),
    };

    let target = target.trim();
    if target.is_empty() {
        return None;
    }

    Some(WikiLinkTarget {
        target: strip_markdown_extension(target).to_string(),
        anchor,
        alias: alias.filter(|a| !a.is_empty()),
    })
}

/// Document title of a Markdown file: its file name without the `.md` extension.
///
/// # Examples
///
/// ```
/// use std::path::Path;
/// use discourse_core::utils::title_from_path;
///
/// assert_eq!(title_from_path(Path::new("notes/CLM - Sky.md")), "CLM - Sky");
/// assert_eq!(title_from_path(Path::new("plain.md")), "plain");
/// ```
pub fn title_from_path(path: &Path) -> String {
    path.file_name()
        .map(|name| name.to_string_lossy().to_string())
        .map(|name| strip_markdown_extension(&name).to_string())
        .unwrap_or_default()
}

/// Normalize a vault-relative path into a document id.
///
/// Backslashes become forward slashes (Windows compatibility); the extension is kept
/// so the id round-trips to a path.
pub fn normalize_document_id(path: &Path) -> String {
    let mut s = path.to_string_lossy().to_string();
    if std::path::MAIN_SEPARATOR == '\\' {
        s = s.replace('\\', "/");
    }
    s
}

fn strip_markdown_extension(name: &str) -> &str {
    name.strip_suffix(".md").unwrap_or(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_wikilink_variants() {
        assert_eq!(parse_wikilink("[[CLM - A]]").unwrap().target, "CLM - A");
        assert_eq!(parse_wikilink("[[CLM - A.md]]").unwrap().target, "CLM - A");
        assert_eq!(parse_wikilink("  [[x|]]  ").unwrap().alias, None);
        assert!(parse_wikilink("[[]]").is_none());
        assert!(parse_wikilink("[[a]] and [[b]]").is_none());
        assert!(parse_wikilink("[[a").is_none());
    }

    #[test]
    fn test_title_from_nested_path() {
        assert_eq!(title_from_path(Path::new("a/b/EVD - x.md")), "EVD - x");
        assert_eq!(title_from_path(Path::new("a/b/canvas.json")), "canvas.json");
    }
}
