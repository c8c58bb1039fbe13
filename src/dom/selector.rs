//! Compound selector groups: `tag#id.class[attr][attr=value], ...`

use super::{Document, NodeId};
use crate::error::{LoadError, Result};

#[derive(Debug, Clone, PartialEq, Eq)]
enum Condition {
    Id(String),
    Class(String),
    Has(String),
    Equals(String, String),
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
struct Compound {
    tag: Option<String>,
    conditions: Vec<Condition>,
}

impl Compound {
    fn matches(&self, doc: &dyn Document, node: NodeId) -> bool {
        if let Some(tag) = &self.tag {
            match doc.tag_name(node) {
                Some(actual) if actual.eq_ignore_ascii_case(tag) => {}
                _ => return false,
            }
        }
        self.conditions.iter().all(|cond| match cond {
            Condition::Id(id) => doc.attribute(node, "id").as_deref() == Some(id.as_str()),
            Condition::Class(class) => doc
                .attribute(node, "class")
                .is_some_and(|v| v.split_whitespace().any(|c| c == class)),
            Condition::Has(name) => doc.has_attribute(node, name),
            Condition::Equals(name, value) => {
                doc.attribute(node, name).as_deref() == Some(value.as_str())
            }
        })
    }
}

/// Parsed selector group; a node matches if any compound matches
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Selector {
    source: String,
    groups: Vec<Compound>,
}

impl Selector {
    /// `[name]`
    pub fn attribute(name: &str) -> Self {
        Self {
            source: format!("[{name}]"),
            groups: vec![Compound {
                tag: None,
                conditions: vec![Condition::Has(name.to_string())],
            }],
        }
    }

    pub fn parse(source: &str) -> Result<Self> {
        let invalid = |reason: &str| LoadError::InvalidSelector {
            selector: source.to_string(),
            reason: reason.to_string(),
        };

        let mut groups = Vec::new();
        for part in source.split(',') {
            let part = part.trim();
            if part.is_empty() {
                return Err(invalid("empty selector in group"));
            }
            groups.push(parse_compound(part).map_err(|reason| invalid(&reason))?);
        }
        Ok(Self {
            source: source.to_string(),
            groups,
        })
    }

    pub fn as_str(&self) -> &str {
        &self.source
    }

    pub fn matches(&self, doc: &dyn Document, node: NodeId) -> bool {
        doc.is_live(node) && self.groups.iter().any(|g| g.matches(doc, node))
    }
}

impl std::fmt::Display for Selector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.source)
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_ident(chars: &[char], pos: &mut usize) -> std::result::Result<String, String> {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    if *pos == start {
        return Err(format!("expected identifier at position {start}"));
    }
    Ok(chars[start..*pos].iter().collect())
}

fn parse_compound(part: &str) -> std::result::Result<Compound, String> {
    let chars: Vec<char> = part.chars().collect();
    let mut pos = 0;
    let mut compound = Compound::default();

    if chars[0] == '*' {
        pos = 1;
    } else if is_ident_char(chars[0]) {
        compound.tag = Some(take_ident(&chars, &mut pos)?);
    }

    while pos < chars.len() {
        match chars[pos] {
            '#' => {
                pos += 1;
                compound.conditions.push(Condition::Id(take_ident(&chars, &mut pos)?));
            }
            '.' => {
                pos += 1;
                compound
                    .conditions
                    .push(Condition::Class(take_ident(&chars, &mut pos)?));
            }
            '[' => {
                pos += 1;
                let name = take_ident(&chars, &mut pos)?;
                match chars.get(pos) {
                    Some(']') => {
                        pos += 1;
                        compound.conditions.push(Condition::Has(name));
                    }
                    Some('=') => {
                        pos += 1;
                        let value = take_value(&chars, &mut pos)?;
                        if chars.get(pos) != Some(&']') {
                            return Err("unterminated attribute selector".to_string());
                        }
                        pos += 1;
                        compound.conditions.push(Condition::Equals(name, value));
                    }
                    _ => return Err("unterminated attribute selector".to_string()),
                }
            }
            c if c.is_whitespace() || c == '>' || c == '+' || c == '~' => {
                return Err("combinators are not supported".to_string());
            }
            c => return Err(format!("unexpected '{c}' at position {pos}")),
        }
    }
    Ok(compound)
}

fn take_value(chars: &[char], pos: &mut usize) -> std::result::Result<String, String> {
    match chars.get(*pos) {
        Some(&quote) if quote == '"' || quote == '\'' => {
            let start = *pos + 1;
            let end = chars[start..]
                .iter()
                .position(|&c| c == quote)
                .map(|offset| start + offset)
                .ok_or_else(|| "unterminated quoted value".to_string())?;
            *pos = end + 1;
            Ok(chars[start..end].iter().collect())
        }
        _ => {
            let start = *pos;
            while *pos < chars.len() && chars[*pos] != ']' {
                *pos += 1;
            }
            Ok(chars[start..*pos].iter().collect())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::MemoryDocument;

    fn fixture() -> (MemoryDocument, NodeId, NodeId) {
        let doc = MemoryDocument::new();
        let main = doc.append(
            doc.body(),
            "section",
            &[("id", "main"), ("class", "panel wide"), ("data-app", "app")],
        );
        let other = doc.append(doc.body(), "div", &[("data-role", "aside")]);
        (doc, main, other)
    }

    #[test]
    fn test_id_selector() {
        let (doc, main, other) = fixture();
        let sel = Selector::parse("#main").unwrap();
        assert!(sel.matches(&doc, main));
        assert!(!sel.matches(&doc, other));
    }

    #[test]
    fn test_compound_tag_class_attribute() {
        let (doc, main, _) = fixture();
        assert!(Selector::parse("section.wide[data-app]").unwrap().matches(&doc, main));
        assert!(!Selector::parse("div.wide").unwrap().matches(&doc, main));
    }

    #[test]
    fn test_attribute_value_quoted_and_bare() {
        let (doc, _, other) = fixture();
        assert!(Selector::parse("[data-role=aside]").unwrap().matches(&doc, other));
        assert!(Selector::parse("[data-role=\"aside\"]").unwrap().matches(&doc, other));
        assert!(!Selector::parse("[data-role='main']").unwrap().matches(&doc, other));
    }

    #[test]
    fn test_group_matches_any() {
        let (doc, main, other) = fixture();
        let sel = Selector::parse("#main, [data-role]").unwrap();
        assert!(sel.matches(&doc, main));
        assert!(sel.matches(&doc, other));
    }

    #[test]
    fn test_combinators_rejected() {
        let err = Selector::parse("div span").unwrap_err();
        assert!(matches!(err, LoadError::InvalidSelector { .. }));
    }

    #[test]
    fn test_empty_group_rejected() {
        assert!(Selector::parse("#a,").is_err());
        assert!(Selector::parse("[unterminated").is_err());
    }

    #[test]
    fn test_universal_selector() {
        let (doc, main, other) = fixture();
        let sel = Selector::parse("*").unwrap();
        assert!(sel.matches(&doc, main) && sel.matches(&doc, other));
    }
}
