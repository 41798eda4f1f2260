//! Specification Matcher
//!
//! A node type's `format` is both a recogniser and a generator for titles.
//! `{name}` placeholders become capturing wildcards, everything else is
//! matched literally and the whole title is anchored.
//!
//! Formats are compiled on every call against the catalog passed in;
//! nothing is cached between calls so a settings edit is visible immediately.

mod format;
mod validate;

pub use format::{format_title, FormattingFailure};
pub use validate::{check_file_name, validate_all_node_types, validate_node_format, FormatIssue};

use crate::model::{NodeType, NodeTypeId};
use regex::Regex;
use std::collections::BTreeMap;

/// Format value meaning "no format configured"
pub const UNCONFIGURED_FORMAT: &str = "\\";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlaceholderKind {
    /// `{content}`: the node's free-text payload
    Content,
    /// `{context}`: reserved, never a reference
    Context,
    /// A placeholder naming another node type's label
    Reference(NodeTypeId),
    /// Unknown name: still a wildcard, but nothing is bound
    Unknown,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder {
    pub name: String,
    pub kind: PlaceholderKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FormatStatus {
    Compiled,
    NoFormatConfigured,
    /// Unbalanced braces. The format is matched literally.
    Malformed { reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Segment {
    Literal(String),
    Placeholder(String),
}

/// A format compiled to an anchored regular expression.
///
/// Capture group `i + 1` holds `placeholders[i]`.
#[derive(Debug, Clone)]
pub struct CompiledFormat {
    pub status: FormatStatus,
    pub placeholders: Vec<Placeholder>,
    pub(crate) segments: Vec<Segment>,
    regex: Option<Regex>,
}

impl CompiledFormat {
    /// Compile `format`, resolving placeholder names against `node_types`.
    pub fn compile(format: &str, node_types: &[NodeType]) -> Self {
        let trimmed = format.trim();
        if trimmed.is_empty() || trimmed == UNCONFIGURED_FORMAT {
            return Self {
                status: FormatStatus::NoFormatConfigured,
                placeholders: Vec::new(),
                segments: Vec::new(),
                regex: None,
            };
        }

        let segments = match tokenize(trimmed) {
            Ok(segments) => segments,
            Err(reason) => {
                log::warn!("Malformed node format {:?}: {}", trimmed, reason);
                return Self::literal(trimmed, reason);
            }
        };

        let placeholders: Vec<Placeholder> = segments
            .iter()
            .filter_map(|segment| match segment {
                Segment::Placeholder(name) => Some(Placeholder {
                    name: name.clone(),
                    kind: resolve_placeholder(name, node_types),
                }),
                Segment::Literal(_) => None,
            })
            .collect();

        let wildcard = if placeholders.len() > 1 { "(.+?)" } else { "(.+)" };
        let mut pattern = String::from("^");
        for segment in &segments {
            match segment {
                Segment::Literal(text) => pattern.push_str(&regex::escape(text)),
                Segment::Placeholder(_) => pattern.push_str(wildcard),
            }
        }
        pattern.push('$');

        match Regex::new(&pattern) {
            Ok(regex) => Self {
                status: FormatStatus::Compiled,
                placeholders,
                segments,
                regex: Some(regex),
            },
            Err(e) => {
                log::warn!("Node format {:?} did not compile: {}", trimmed, e);
                Self::literal(trimmed, e.to_string())
            }
        }
    }

    fn literal(format: &str, reason: String) -> Self {
        let regex = Regex::new(&format!("^{}$", regex::escape(format))).ok();
        Self {
            status: FormatStatus::Malformed { reason },
            placeholders: Vec::new(),
            segments: vec![Segment::Literal(format.to_string())],
            regex,
        }
    }

    pub fn is_configured(&self) -> bool {
        self.status != FormatStatus::NoFormatConfigured
    }

    /// A format with no literal text (e.g. `{content}`) matches every title.
    pub fn is_universal(&self) -> bool {
        self.status == FormatStatus::Compiled
            && self
                .segments
                .iter()
                .all(|segment| matches!(segment, Segment::Placeholder(_)))
    }

    pub fn has_content(&self) -> bool {
        self.placeholders
            .iter()
            .any(|p| p.kind == PlaceholderKind::Content)
    }

    pub fn has_reference(&self) -> bool {
        self.placeholders
            .iter()
            .any(|p| matches!(p.kind, PlaceholderKind::Reference(_)))
    }

    pub fn is_match(&self, text: &str) -> bool {
        match &self.regex {
            Some(regex) => regex.is_match(text.trim()),
            None => false,
        }
    }

    /// Captured placeholder values, or `None` when `text` does not match.
    pub fn captures(&self, text: &str) -> Option<PlaceholderValues> {
        let regex = self.regex.as_ref()?;
        let captures = regex.captures(text.trim())?;

        let mut values = PlaceholderValues::default();
        for (i, placeholder) in self.placeholders.iter().enumerate() {
            let Some(captured) = captures.get(i + 1) else {
                continue;
            };
            let captured = captured.as_str().to_string();
            match &placeholder.kind {
                PlaceholderKind::Content => {
                    values.values.insert("content".to_string(), captured);
                }
                PlaceholderKind::Context => {
                    values.values.insert("context".to_string(), captured);
                }
                PlaceholderKind::Reference(node_type_id) => {
                    values
                        .references
                        .push((node_type_id.clone(), captured.clone()));
                    values.values.insert(placeholder.name.clone(), captured);
                }
                PlaceholderKind::Unknown => {}
            }
        }
        Some(values)
    }
}

/// Values recovered from a matching title, keyed by placeholder name.
///
/// `content` and `context` are stored under their lowercase names.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PlaceholderValues {
    pub values: BTreeMap<String, String>,
    /// Reference captures paired with the node type they point at
    pub references: Vec<(NodeTypeId, String)>,
}

impl PlaceholderValues {
    pub fn content(&self) -> Option<&str> {
        self.values.get("content").map(String::as_str)
    }

    /// Case-insensitive lookup by placeholder name
    pub fn get(&self, name: &str) -> Option<&str> {
        self.values
            .iter()
            .find(|(key, _)| key.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Result of classifying one title against the whole catalog.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TitleMatch {
    None,
    Unique(NodeTypeId),
    /// More than one node type matched; resolution is left to the caller
    Ambiguous(Vec<NodeTypeId>),
}

/// How a document was recognised as a discourse node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// Explicit frontmatter tag naming a known node type
    Tagged(NodeTypeId),
    /// Title matched exactly one node type's format
    Matched(NodeTypeId),
    Ambiguous(Vec<NodeTypeId>),
    NotDiscourseNode,
}

impl Classification {
    pub fn node_type_id(&self) -> Option<&NodeTypeId> {
        match self {
            Classification::Tagged(id) | Classification::Matched(id) => Some(id),
            Classification::Ambiguous(_) | Classification::NotDiscourseNode => None,
        }
    }

    pub fn is_node(&self) -> bool {
        self.node_type_id().is_some()
    }
}

/// Stateless matcher over one catalog snapshot.
pub struct SpecificationMatcher<'a> {
    node_types: &'a [NodeType],
}

impl<'a> SpecificationMatcher<'a> {
    pub fn new(node_types: &'a [NodeType]) -> Self {
        Self { node_types }
    }

    pub fn compile(&self, node_type: &NodeType) -> CompiledFormat {
        CompiledFormat::compile(&node_type.format, self.node_types)
    }

    /// Whether `text` is a title of `node_type`.
    pub fn matches(&self, node_type: &NodeType, text: &str) -> bool {
        let compiled = self.compile(node_type);
        if !compiled.is_configured() {
            log::debug!(
                "Node type '{}' has no format configured; '{}' is not a discourse node",
                node_type.id,
                text
            );
            return false;
        }
        compiled.is_match(text)
    }

    /// Placeholder captures for `text`, or `None` when it does not match.
    pub fn extract_placeholders(
        &self,
        node_type: &NodeType,
        text: &str,
    ) -> Option<PlaceholderValues> {
        let compiled = self.compile(node_type);
        if !compiled.is_configured() {
            return None;
        }
        compiled.captures(text)
    }

    /// All node types whose format recognises `title`.
    ///
    /// Universal formats are skipped: they would make every title ambiguous.
    pub fn classify_title(&self, title: &str) -> TitleMatch {
        let matched: Vec<NodeTypeId> = self
            .node_types
            .iter()
            .filter(|node_type| {
                let compiled = self.compile(node_type);
                compiled.is_configured() && !compiled.is_universal() && compiled.is_match(title)
            })
            .map(|node_type| node_type.id.clone())
            .collect();

        match matched.as_slice() {
            [] => TitleMatch::None,
            [only] => TitleMatch::Unique(only.clone()),
            _ => {
                log::warn!(
                    "Multiple node types match '{}': {}",
                    title,
                    matched
                        .iter()
                        .map(NodeTypeId::as_str)
                        .collect::<Vec<_>>()
                        .join(", ")
                );
                TitleMatch::Ambiguous(matched)
            }
        }
    }

    /// Classify a document from its explicit tag, falling back to its title.
    ///
    /// A tag naming an unknown node type is ignored (with a warning) and the
    /// title is tried instead.
    pub fn classify(&self, title: &str, tag: Option<&str>) -> Classification {
        if let Some(tag) = tag {
            match self.node_types.iter().find(|nt| nt.id.as_str() == tag) {
                Some(node_type) => return Classification::Tagged(node_type.id.clone()),
                None => log::warn!("'{}' is tagged with unknown node type '{}'", title, tag),
            }
        }

        match self.classify_title(title) {
            TitleMatch::None => Classification::NotDiscourseNode,
            TitleMatch::Unique(id) => Classification::Matched(id),
            TitleMatch::Ambiguous(ids) => Classification::Ambiguous(ids),
        }
    }
}

fn resolve_placeholder(name: &str, node_types: &[NodeType]) -> PlaceholderKind {
    if name.eq_ignore_ascii_case("content") {
        return PlaceholderKind::Content;
    }
    if name.eq_ignore_ascii_case("context") {
        return PlaceholderKind::Context;
    }

    let lowered = name.to_lowercase();
    node_types
        .iter()
        .find(|nt| !nt.label.trim().is_empty() && lowered.contains(&nt.label.to_lowercase()))
        .map(|nt| PlaceholderKind::Reference(nt.id.clone()))
        .unwrap_or(PlaceholderKind::Unknown)
}

/// Split a format into literal text and `{name}` placeholders.
///
/// Braces around anything other than `[A-Za-z0-9_-]*` are literal text;
/// an unclosed `{` or a stray `}` is an error.
pub(crate) fn tokenize(format: &str) -> Result<Vec<Segment>, String> {
    let mut segments = Vec::new();
    let mut literal = String::new();
    let mut chars = format.char_indices().peekable();

    while let Some((i, c)) = chars.next() {
        match c {
            '{' => {
                let rest = &format[i + 1..];
                let close = rest
                    .find('}')
                    .ok_or_else(|| format!("unclosed '{{' at byte {}", i))?;
                let inner = &rest[..close];
                if inner.contains('{') {
                    return Err(format!("nested '{{' at byte {}", i));
                }

                if inner
                    .chars()
                    .all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '-')
                {
                    if !literal.is_empty() {
                        segments.push(Segment::Literal(std::mem::take(&mut literal)));
                    }
                    segments.push(Segment::Placeholder(inner.to_string()));
                } else {
                    literal.push('{');
                    literal.push_str(inner);
                    literal.push('}');
                }

                // Skip past the closing brace
                while let Some((j, _)) = chars.peek() {
                    if *j > i + close + 1 {
                        break;
                    }
                    chars.next();
                }
            }
            '}' => return Err(format!("unmatched '}}' at byte {}", i)),
            _ => literal.push(c),
        }
    }

    if !literal.is_empty() {
        segments.push(Segment::Literal(literal));
    }
    Ok(segments)
}
