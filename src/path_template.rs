//! URL path template parsing.
//!
//! A mapping path like `/orders/{order-id}/items/{id:[0-9]+}` is parsed into
//! an ordered sequence of literal and parameter parts. Parameter parts keep
//! the raw placeholder name and a sanitized identifier usable as a
//! programming-language parameter name. Regex constraints after `:` are
//! discarded. Malformed placeholders (unbalanced braces) degrade to literal
//! text instead of failing, since mapping strings are developer-authored and
//! one bad controller must not abort a whole generation run.

use log::debug;

/// One part of a parsed path template.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathPart {
    /// Literal path text, separators included.
    Literal(String),
    /// A `{name}` placeholder.
    Parameter {
        /// The raw placeholder text, constraint stripped.
        original_name: String,
        /// `original_name` sanitized into a valid bare identifier, unique
        /// within the template.
        valid_name: String,
    },
}

/// Parsed representation of a URL path pattern.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathTemplate {
    parts: Vec<PathPart>,
}

impl PathTemplate {
    /// Parses a path pattern into its ordered parts.
    ///
    /// An empty pattern yields an empty part list; a pattern without
    /// placeholders yields a single literal.
    pub fn parse(pattern: &str) -> PathTemplate {
        let mut parts = Vec::new();
        let mut literal = String::new();
        let mut used_names: Vec<String> = Vec::new();

        let chars: Vec<char> = pattern.chars().collect();
        let mut i = 0;
        while i < chars.len() {
            if chars[i] == '{' {
                match find_closing_brace(&chars, i) {
                    Some(end) => {
                        if !literal.is_empty() {
                            parts.push(PathPart::Literal(std::mem::take(&mut literal)));
                        }
                        let inner: String = chars[i + 1..end].iter().collect();
                        // A regex constraint follows the first colon.
                        let original_name = match inner.find(':') {
                            Some(colon) => inner[..colon].to_string(),
                            None => inner,
                        };
                        let valid_name = unique_valid_name(&original_name, &mut used_names);
                        parts.push(PathPart::Parameter {
                            original_name,
                            valid_name,
                        });
                        i = end + 1;
                        continue;
                    }
                    None => {
                        debug!("Unbalanced '{{' in path pattern '{}', treating rest as literal", pattern);
                        literal.extend(&chars[i..]);
                        break;
                    }
                }
            }
            literal.push(chars[i]);
            i += 1;
        }
        if !literal.is_empty() {
            parts.push(PathPart::Literal(literal));
        }

        PathTemplate { parts }
    }

    pub fn parts(&self) -> &[PathPart] {
        &self.parts
    }

    /// The parameter parts in template order.
    pub fn parameters(&self) -> impl Iterator<Item = (&str, &str)> {
        self.parts.iter().filter_map(|part| match part {
            PathPart::Parameter {
                original_name,
                valid_name,
            } => Some((original_name.as_str(), valid_name.as_str())),
            PathPart::Literal(_) => None,
        })
    }
}

/// Finds the index of the `}` matching the `{` at `start`, counting nested
/// braces so regex constraints like `{id:\d{3}}` stay balanced.
fn find_closing_brace(chars: &[char], start: usize) -> Option<usize> {
    let mut depth = 0usize;
    for (offset, &c) in chars[start..].iter().enumerate() {
        match c {
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(start + offset);
                }
            }
            _ => {}
        }
    }
    None
}

/// Sanitizes a placeholder name into a bare identifier, disambiguating
/// against names already used within the same template.
fn unique_valid_name(original: &str, used: &mut Vec<String>) -> String {
    let mut name: String = original
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '_' { c } else { '_' })
        .collect();
    if name.is_empty() || name.chars().next().is_some_and(|c| c.is_ascii_digit()) {
        name.insert(0, '_');
    }
    if used.iter().any(|n| n == &name) {
        let mut suffix = 2usize;
        while used.iter().any(|n| *n == format!("{}{}", name, suffix)) {
            suffix += 1;
        }
        name = format!("{}{}", name, suffix);
    }
    used.push(name.clone());
    name
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(template: &PathTemplate) -> String {
        template
            .parts()
            .iter()
            .map(|part| match part {
                PathPart::Literal(text) => text.clone(),
                PathPart::Parameter { original_name, .. } => format!("{{{}}}", original_name),
            })
            .collect()
    }

    #[test]
    fn test_empty_pattern() {
        let template = PathTemplate::parse("");
        assert!(template.parts().is_empty());
    }

    #[test]
    fn test_pattern_without_placeholders_is_single_literal() {
        let template = PathTemplate::parse("/orders/pending");
        assert_eq!(
            template.parts(),
            &[PathPart::Literal("/orders/pending".to_string())]
        );
    }

    #[test]
    fn test_single_parameter() {
        let template = PathTemplate::parse("/orders/{id}");
        assert_eq!(
            template.parts(),
            &[
                PathPart::Literal("/orders/".to_string()),
                PathPart::Parameter {
                    original_name: "id".to_string(),
                    valid_name: "id".to_string(),
                },
            ]
        );
    }

    #[test]
    fn test_parameter_between_literals() {
        let template = PathTemplate::parse("/orders/{id}/items");
        assert_eq!(template.parts().len(), 3);
        assert_eq!(
            template.parts()[2],
            PathPart::Literal("/items".to_string())
        );
    }

    #[test]
    fn test_regex_constraint_is_discarded() {
        let template = PathTemplate::parse("/orders/{id:[0-9]+}");
        let params: Vec<_> = template.parameters().collect();
        assert_eq!(params, vec![("id", "id")]);
    }

    #[test]
    fn test_nested_braces_in_constraint() {
        let template = PathTemplate::parse("/orders/{id:\\d{3}}/x");
        let params: Vec<_> = template.parameters().collect();
        assert_eq!(params, vec![("id", "id")]);
        assert_eq!(
            template.parts()[2],
            PathPart::Literal("/x".to_string())
        );
    }

    #[test]
    fn test_invalid_identifier_characters_are_sanitized() {
        let template = PathTemplate::parse("/orders/{order-id}/v/{a.b}");
        let params: Vec<_> = template.parameters().collect();
        assert_eq!(params, vec![("order-id", "order_id"), ("a.b", "a_b")]);
    }

    #[test]
    fn test_leading_digit_is_prefixed() {
        let template = PathTemplate::parse("/{1st}");
        let params: Vec<_> = template.parameters().collect();
        assert_eq!(params, vec![("1st", "_1st")]);
    }

    #[test]
    fn test_sanitized_collisions_stay_unique() {
        let template = PathTemplate::parse("/{a.b}/{a-b}/{a_b}");
        let valid: Vec<_> = template.parameters().map(|(_, v)| v.to_string()).collect();
        assert_eq!(valid, vec!["a_b", "a_b2", "a_b3"]);
    }

    #[test]
    fn test_unbalanced_brace_degrades_to_literal() {
        let template = PathTemplate::parse("/orders/{id");
        assert_eq!(
            template.parts(),
            &[PathPart::Literal("/orders/{id".to_string())]
        );
    }

    #[test]
    fn test_reconstruction_round_trip() {
        for pattern in [
            "",
            "/",
            "/orders",
            "/orders/{id}",
            "/a/{x}/b/{y}",
            "/orders/{order-id}/items/{id}",
            "/trailing/{id}/",
        ] {
            let template = PathTemplate::parse(pattern);
            assert_eq!(reconstruct(&template), pattern, "pattern: {}", pattern);
        }
    }
}
