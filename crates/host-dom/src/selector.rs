//! CSS selector subset.
//!
//! Supported: type and universal selectors, `#id`, `.class`, attribute
//! selectors (`[a]`, `[a=v]`, `[a*=v]`, `[a^=v]`, `[a$=v]`, `[a~=v]`),
//! descendant and child combinators, and comma-separated lists. Anything
//! else is reported as [`SelectorError::Unsupported`] so callers can fall
//! through to their next selector.

use crate::document::Document;
use crate::errors::SelectorError;
use crate::node::{ElementData, NodeId};

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SelectorList {
    selectors: Vec<ComplexSelector>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct ComplexSelector {
    /// Compounds left to right; the combinator on entry `i` relates it to
    /// entry `i - 1` and is ignored on the first entry.
    parts: Vec<(Combinator, Compound)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Combinator {
    Descendant,
    Child,
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
struct Compound {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrSelector>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
struct AttrSelector {
    name: String,
    test: Option<(AttrOp, String)>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum AttrOp {
    Equals,
    Contains,
    Prefix,
    Suffix,
    Word,
}

impl SelectorList {
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }
        let selectors = split_top_level(trimmed)
            .into_iter()
            .map(|part| parse_complex(part.trim(), trimmed))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self { selectors })
    }

    pub fn matches(&self, doc: &Document, node: NodeId) -> bool {
        self.selectors
            .iter()
            .any(|selector| matches_at(doc, node, selector, selector.parts.len() - 1))
    }
}

fn split_top_level(input: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;
    let mut start = 0;
    for (idx, ch) in input.char_indices() {
        match (quote, ch) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"') | (None, '\'') => quote = Some(ch),
            (None, '[') | (None, '(') => depth += 1,
            (None, ']') | (None, ')') => depth = depth.saturating_sub(1),
            (None, ',') if depth == 0 => {
                parts.push(&input[start..idx]);
                start = idx + 1;
            }
            _ => {}
        }
    }
    parts.push(&input[start..]);
    parts
}

fn unsupported(selector: &str, fragment: &str) -> SelectorError {
    SelectorError::Unsupported {
        selector: selector.to_string(),
        fragment: fragment.to_string(),
    }
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}

fn parse_complex(input: &str, whole: &str) -> Result<ComplexSelector, SelectorError> {
    if input.is_empty() {
        return Err(SelectorError::Malformed(whole.to_string()));
    }
    let chars: Vec<char> = input.chars().collect();
    let mut parts: Vec<(Combinator, Compound)> = Vec::new();
    let mut current = Compound::default();
    let mut current_started = false;
    let mut pending = Combinator::Descendant;
    let mut i = 0;

    let take_ident = |i: &mut usize| -> String {
        let start = *i;
        while *i < chars.len() && is_ident_char(chars[*i]) {
            *i += 1;
        }
        chars[start..*i].iter().collect()
    };

    while i < chars.len() {
        let ch = chars[i];
        match ch {
            c if c.is_whitespace() || c == '>' => {
                let mut saw_child = false;
                while i < chars.len() && (chars[i].is_whitespace() || chars[i] == '>') {
                    if chars[i] == '>' {
                        if saw_child {
                            return Err(SelectorError::Malformed(whole.to_string()));
                        }
                        saw_child = true;
                    }
                    i += 1;
                }
                if !current_started {
                    // leading combinator such as "> span" (scoped queries)
                    if saw_child || !parts.is_empty() {
                        return Err(unsupported(whole, ">"));
                    }
                    continue;
                }
                parts.push((pending, std::mem::take(&mut current)));
                current_started = false;
                pending = if saw_child {
                    Combinator::Child
                } else {
                    Combinator::Descendant
                };
            }
            '+' | '~' => return Err(unsupported(whole, &ch.to_string())),
            ':' => {
                let rest: String = chars[i..].iter().take_while(|c| **c != ' ').collect();
                return Err(unsupported(whole, &rest));
            }
            '*' => {
                i += 1;
                current_started = true;
            }
            '#' => {
                i += 1;
                let ident = take_ident(&mut i);
                if ident.is_empty() {
                    return Err(SelectorError::Malformed(whole.to_string()));
                }
                current.id = Some(ident);
                current_started = true;
            }
            '.' => {
                i += 1;
                let ident = take_ident(&mut i);
                if ident.is_empty() {
                    return Err(SelectorError::Malformed(whole.to_string()));
                }
                current.classes.push(ident);
                current_started = true;
            }
            '[' => {
                let close = chars[i..]
                    .iter()
                    .position(|c| *c == ']')
                    .ok_or_else(|| SelectorError::Malformed(whole.to_string()))?;
                let body: String = chars[i + 1..i + close].iter().collect();
                current.attrs.push(parse_attr(&body, whole)?);
                i += close + 1;
                current_started = true;
            }
            c if is_ident_char(c) => {
                if current_started {
                    return Err(SelectorError::Malformed(whole.to_string()));
                }
                let ident = take_ident(&mut i);
                current.tag = Some(ident.to_ascii_lowercase());
                current_started = true;
            }
            _ => return Err(unsupported(whole, &ch.to_string())),
        }
    }

    if !current_started {
        return Err(SelectorError::Malformed(whole.to_string()));
    }
    parts.push((pending, current));
    Ok(ComplexSelector { parts })
}

fn parse_attr(body: &str, whole: &str) -> Result<AttrSelector, SelectorError> {
    let body = body.trim();
    let ops = [
        ("*=", AttrOp::Contains),
        ("^=", AttrOp::Prefix),
        ("$=", AttrOp::Suffix),
        ("~=", AttrOp::Word),
        ("|=", AttrOp::Prefix),
        ("=", AttrOp::Equals),
    ];
    for (token, op) in ops {
        if let Some((name, value)) = body.split_once(token) {
            let name = name.trim();
            if name.is_empty() || !name.chars().all(is_ident_char) {
                return Err(SelectorError::Malformed(whole.to_string()));
            }
            let value = value
                .trim()
                .trim_end_matches(" i")
                .trim()
                .trim_matches(|c| c == '"' || c == '\'');
            return Ok(AttrSelector {
                name: name.to_ascii_lowercase(),
                test: Some((op, value.to_string())),
            });
        }
    }
    if body.is_empty() || !body.chars().all(is_ident_char) {
        return Err(SelectorError::Malformed(whole.to_string()));
    }
    Ok(AttrSelector {
        name: body.to_ascii_lowercase(),
        test: None,
    })
}

fn matches_at(doc: &Document, node: NodeId, selector: &ComplexSelector, idx: usize) -> bool {
    let Some(element) = doc.element(node) else {
        return false;
    };
    let (combinator, compound) = &selector.parts[idx];
    if !compound_matches(element, compound) {
        return false;
    }
    if idx == 0 {
        return true;
    }
    match combinator {
        Combinator::Child => doc
            .parent(node)
            .map(|parent| matches_at(doc, parent, selector, idx - 1))
            .unwrap_or(false),
        Combinator::Descendant => {
            let mut cursor = doc.parent(node);
            while let Some(ancestor) = cursor {
                if matches_at(doc, ancestor, selector, idx - 1) {
                    return true;
                }
                cursor = doc.parent(ancestor);
            }
            false
        }
    }
}

fn compound_matches(element: &ElementData, compound: &Compound) -> bool {
    if let Some(tag) = &compound.tag {
        if &element.tag != tag {
            return false;
        }
    }
    if let Some(id) = &compound.id {
        if element.id() != Some(id.as_str()) {
            return false;
        }
    }
    if !compound.classes.iter().all(|class| element.has_class(class)) {
        return false;
    }
    compound.attrs.iter().all(|attr| {
        let Some(actual) = element.attr(&attr.name) else {
            return false;
        };
        match &attr.test {
            None => true,
            Some((AttrOp::Equals, expected)) => actual == expected,
            Some((AttrOp::Contains, expected)) => actual.contains(expected.as_str()),
            Some((AttrOp::Prefix, expected)) => actual.starts_with(expected.as_str()),
            Some((AttrOp::Suffix, expected)) => actual.ends_with(expected.as_str()),
            Some((AttrOp::Word, expected)) => actual.split_whitespace().any(|w| w == expected),
        }
    })
}
