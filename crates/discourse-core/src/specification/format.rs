use super::{CompiledFormat, FormatStatus, PlaceholderKind, Segment};
use crate::model::{DocumentRef, NodeType};

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FormattingFailure {
    #[error("node content is empty")]
    EmptyContent,

    #[error("formatted title is empty")]
    EmptyTitle,

    #[error("node type has no format configured")]
    NoFormatConfigured,

    #[error("node format is malformed: {0}")]
    MalformedFormat(String),

    #[error("node format needs a referenced node")]
    MissingReference,

    #[error("content {0:?} runs into the format's separators")]
    AmbiguousContent(String),

    #[error("formatted title {0:?} does not match its own format")]
    Unrecognisable(String),
}

/// Render a title for `node_type` from user text and an optional referenced node.
///
/// `{content}` receives the trimmed text and a reference placeholder receives
/// `[[title]]` of `reference`. Formats without a reference placeholder go
/// through the plain content formatter and ignore `reference`.
///
/// The rendered title always matches `node_type` again and reads back the
/// trimmed content; anything else is a failure.
pub fn format_title(
    node_type: &NodeType,
    content: &str,
    reference: Option<&DocumentRef>,
    node_types: &[NodeType],
) -> Result<String, FormattingFailure> {
    let compiled = CompiledFormat::compile(&node_type.format, node_types);
    match &compiled.status {
        FormatStatus::Compiled => {}
        FormatStatus::NoFormatConfigured => return Err(FormattingFailure::NoFormatConfigured),
        FormatStatus::Malformed { reason } => {
            return Err(FormattingFailure::MalformedFormat(reason.clone()))
        }
    }

    let content = content.trim();
    if content.is_empty() && compiled.has_content() {
        return Err(FormattingFailure::EmptyContent);
    }

    let title = if compiled.has_reference() {
        let Some(reference) = reference else {
            return Err(FormattingFailure::MissingReference);
        };
        render(&compiled, content, Some(reference))
    } else {
        render(&compiled, content, None)
    };

    let title = title.trim().to_string();
    if title.is_empty() {
        return Err(FormattingFailure::EmptyTitle);
    }

    let Some(values) = compiled.captures(&title) else {
        return Err(FormattingFailure::Unrecognisable(title));
    };
    if compiled.has_content() && values.content() != Some(content) {
        return Err(FormattingFailure::AmbiguousContent(content.to_string()));
    }
    Ok(title)
}

fn render(compiled: &CompiledFormat, content: &str, reference: Option<&DocumentRef>) -> String {
    let mut placeholders = compiled.placeholders.iter();
    let mut out = String::new();

    for segment in &compiled.segments {
        match segment {
            Segment::Literal(text) => out.push_str(text),
            Segment::Placeholder(_) => match placeholders.next().map(|p| &p.kind) {
                Some(PlaceholderKind::Content) => out.push_str(content),
                Some(PlaceholderKind::Reference(_)) => {
                    if let Some(reference) = reference {
                        out.push_str(&reference.link());
                    }
                }
                _ => {}
            },
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::NodeTypeId;
    use crate::specification::SpecificationMatcher;
    use proptest::prelude::*;

    fn node(id: &str, label: &str, format: &str) -> NodeType {
        NodeType {
            id: NodeTypeId::new(id),
            label: label.to_string(),
            format: format.to_string(),
            color: None,
            key_image: false,
        }
    }

    fn catalog() -> Vec<NodeType> {
        vec![
            node("claim", "Claim", "[[CLM]] - {content}"),
            node("evidence", "Evidence", "[[EVD]] - {content} - {Claim}"),
        ]
    }

    #[test]
    fn test_format_substitutes_trimmed_content() {
        let types = catalog();
        let title = format_title(&types[0], "  Sky is blue  ", None, &types).unwrap();
        assert_eq!(title, "[[CLM]] - Sky is blue");
    }

    #[test]
    fn test_format_wraps_reference_as_link() {
        let types = catalog();
        let claim = DocumentRef::new("claims/1.md", "[[CLM]] - Sky is blue");

        let title = format_title(&types[1], "Spectroscopy", Some(&claim), &types).unwrap();
        assert_eq!(title, "[[EVD]] - Spectroscopy - [[[[CLM]] - Sky is blue]]");
    }

    #[test]
    fn test_reference_ignored_without_reference_placeholder() {
        let types = catalog();
        let other = DocumentRef::new("x", "X");
        let title = format_title(&types[0], "a", Some(&other), &types).unwrap();
        assert_eq!(title, "[[CLM]] - a");
    }

    #[test]
    fn test_reference_format_requires_reference() {
        let types = catalog();
        assert_eq!(
            format_title(&types[1], "Rain", None, &types),
            Err(FormattingFailure::MissingReference)
        );
    }

    #[test]
    fn test_content_with_separator_is_rejected_for_multi_placeholder_format() {
        let types = catalog();
        let matcher = SpecificationMatcher::new(&types);
        let claim = DocumentRef::new("c.md", "[[CLM]] - Wet");

        // The first placeholder is non-greedy, so the separator ends the content early
        let values = matcher
            .extract_placeholders(&types[1], "[[EVD]] - Rain - heavy - [[[[CLM]] - Wet]]")
            .unwrap();
        assert_eq!(values.content(), Some("Rain"));

        assert_eq!(
            format_title(&types[1], "Rain - heavy", Some(&claim), &types),
            Err(FormattingFailure::AmbiguousContent("Rain - heavy".to_string()))
        );
        // A single placeholder takes the separator verbatim
        assert_eq!(
            format_title(&types[0], "Rain - heavy", None, &types).unwrap(),
            "[[CLM]] - Rain - heavy"
        );
    }

    #[test]
    fn test_format_failures() {
        let types = vec![
            node("q", "Question", "QUE - {content}"),
            node("none", "None", "\\"),
            node("bad", "Bad", "QUE - {content"),
            node("ctx", "Context", "{context}"),
        ];

        assert_eq!(
            format_title(&types[0], "   ", None, &types),
            Err(FormattingFailure::EmptyContent)
        );
        assert_eq!(
            format_title(&types[1], "x", None, &types),
            Err(FormattingFailure::NoFormatConfigured)
        );
        assert!(matches!(
            format_title(&types[2], "x", None, &types),
            Err(FormattingFailure::MalformedFormat(_))
        ));
        assert_eq!(
            format_title(&types[3], "x", None, &types),
            Err(FormattingFailure::EmptyTitle)
        );
    }

    proptest! {
        #[test]
        fn test_formatted_title_round_trips(
            content in "[A-Za-z0-9][A-Za-z0-9 ,.?]{0,30}",
            padding in " {0,3}",
        ) {
            let types = catalog();
            let matcher = SpecificationMatcher::new(&types);
            let raw = format!("{}{}{}", padding, content, padding);

            let title = format_title(&types[0], &raw, None, &types).unwrap();
            prop_assert!(matcher.matches(&types[0], &title));

            let values = matcher.extract_placeholders(&types[0], &title).unwrap();
            prop_assert_eq!(values.content(), Some(raw.trim()));
        }

        #[test]
        fn test_formatted_title_with_reference_round_trips(
            content in "[A-Za-z0-9][A-Za-z0-9 ,.?]{0,30}",
            claim in "[A-Za-z0-9][A-Za-z0-9 ,.?-]{0,30}",
        ) {
            let types = catalog();
            let matcher = SpecificationMatcher::new(&types);
            let reference = DocumentRef::new("c.md", format!("[[CLM]] - {}", claim.trim()));

            let title = format_title(&types[1], &content, Some(&reference), &types).unwrap();
            prop_assert!(matcher.matches(&types[1], &title));

            let values = matcher.extract_placeholders(&types[1], &title).unwrap();
            prop_assert_eq!(values.content(), Some(content.trim()));
            let link = reference.link();
            prop_assert_eq!(values.get("Claim"), Some(link.as_str()));
        }

        #[test]
        fn test_formatted_or_rejected_never_mismatches(
            content in "\\PC{0,30}",
            with_reference in any::<bool>(),
        ) {
            let types = catalog();
            let matcher = SpecificationMatcher::new(&types);
            let reference = DocumentRef::new("c.md", "[[CLM]] - Wet");
            let reference = with_reference.then_some(&reference);

            for node_type in &types {
                if let Ok(title) = format_title(node_type, &content, reference, &types) {
                    prop_assert!(matcher.matches(node_type, &title));
                }
            }
        }

        #[test]
        fn test_match_implies_content_capture(
            content in "\\PC{1,30}",
            claim in "[A-Za-z0-9 ]{1,20}",
        ) {
            let types = catalog();
            let matcher = SpecificationMatcher::new(&types);
            let titles = [
                format!("[[CLM]] - {}", content),
                format!("[[EVD]] - {} - [[{}]]", content, claim),
            ];

            for (node_type, title) in types.iter().zip(&titles) {
                if matcher.matches(node_type, title) {
                    let values = matcher.extract_placeholders(node_type, title).unwrap();
                    prop_assert!(values.content().is_some());
                }
            }
            // Titles built from the format match whenever the content survives trimming
            if !content.trim().is_empty() {
                prop_assert!(matcher.matches(&types[0], &titles[0]));
            }
        }
    }
}
