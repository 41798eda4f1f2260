use crate::error::StoreError;
use pulldown_cmark::{Event, MetadataBlockKind, Options, Parser, Tag, TagEnd};
use serde_json::{Map, Value};

pub type Frontmatter = Map<String, Value>;

/// A Markdown document split into its YAML frontmatter and body.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MarkdownDocument {
    pub frontmatter: Frontmatter,
    pub body: String,
}

impl MarkdownDocument {
    pub fn new(frontmatter: Frontmatter, body: impl Into<String>) -> Self {
        Self {
            frontmatter,
            body: body.into(),
        }
    }

    /// Parse `text`. A document without a metadata block has empty frontmatter.
    pub fn parse(text: &str) -> Result<Self, StoreError> {
        let (yaml, body) = split(text);
        let frontmatter = match yaml {
            Some(yaml) => parse_yaml(&yaml)?,
            None => Frontmatter::new(),
        };
        Ok(Self {
            frontmatter,
            body: body.to_string(),
        })
    }

    /// Render back to text. Empty frontmatter omits the metadata block.
    pub fn render(&self) -> Result<String, StoreError> {
        if self.frontmatter.is_empty() {
            return Ok(self.body.clone());
        }
        let yaml = serde_yaml::to_string(&self.frontmatter)
            .map_err(|e| StoreError::Frontmatter(e.to_string()))?;
        Ok(format!("---\n{}---\n{}", yaml, self.body))
    }
}

/// Locate the leading YAML metadata block.
///
/// Returns the block's YAML text and the remaining body.
pub fn split(text: &str) -> (Option<String>, &str) {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_YAML_STYLE_METADATA_BLOCKS);

    let mut in_frontmatter = false;
    let mut yaml = String::new();

    for (event, range) in Parser::new_ext(text, options).into_offset_iter() {
        match event {
            Event::Start(Tag::MetadataBlock(MetadataBlockKind::YamlStyle)) => {
                in_frontmatter = true;
            }
            Event::Text(chunk) if in_frontmatter => yaml.push_str(&chunk),
            Event::End(TagEnd::MetadataBlock(MetadataBlockKind::YamlStyle)) => {
                let rest = &text[range.end..];
                let body = rest
                    .strip_prefix("\r\n")
                    .or_else(|| rest.strip_prefix('\n'))
                    .unwrap_or(rest);
                return (Some(yaml), body);
            }
            // Metadata can only open the document
            _ if !in_frontmatter => break,
            _ => {}
        }
    }

    (None, text)
}

fn parse_yaml(yaml: &str) -> Result<Frontmatter, StoreError> {
    let value: Value =
        serde_yaml::from_str(yaml).map_err(|e| StoreError::Frontmatter(e.to_string()))?;
    match value {
        Value::Object(map) => Ok(map),
        Value::Null => Ok(Frontmatter::new()),
        other => Err(StoreError::Frontmatter(format!(
            "expected a mapping, found {}",
            other
        ))),
    }
}

/// Entries of a link-list field. A scalar string counts as a one-entry list.
pub fn string_list(frontmatter: &Frontmatter, key: &str) -> Vec<String> {
    match frontmatter.get(key) {
        Some(Value::String(s)) => vec![s.clone()],
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(|v| v.as_str().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}
