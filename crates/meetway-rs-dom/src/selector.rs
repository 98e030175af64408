//! Compound simple-selector parsing and matching.
//!
//! The catalogs the engine scans with only ever use single compound
//! selectors (`h1`, `.event-title`, `[data-event-id]`,
//! `input[type="email"]`). Combinators and selector lists are rejected at
//! parse time so a misconfigured catalog entry is skipped, not misread.

use crate::document::Element;
use crate::error::SelectorError;

/// One compound simple selector.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<AttrMatch>,
}

/// Attribute presence or exact-value requirement.
#[derive(Debug, Clone, PartialEq, Eq)]
struct AttrMatch {
    name: String,
    value: Option<String>,
}

impl Selector {
    /// Parse a selector string.
    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(SelectorError::Empty);
        }
        if input.contains(',') || input.contains('>') || input.contains('~') || input.contains('+')
        {
            return Err(SelectorError::Unsupported(input.to_string()));
        }

        let mut selector = Selector::default();
        let mut rest_start = 0;
        if input
            .chars()
            .next()
            .is_some_and(|ch| ch.is_ascii_alphabetic())
        {
            rest_start = input
                .find(|ch: char| !ch.is_ascii_alphanumeric() && ch != '-')
                .unwrap_or(input.len());
            selector.tag = Some(input[..rest_start].to_ascii_lowercase());
        }
        let mut chars = input[rest_start..]
            .char_indices()
            .map(|(offset, ch)| (offset + rest_start, ch))
            .peekable();

        while let Some((start, ch)) = chars.next() {
            match ch {
                '.' | '#' => {
                    let name: String = take_while(&mut chars, is_ident_char);
                    if name.is_empty() {
                        return Err(SelectorError::Invalid(input.to_string()));
                    }
                    if ch == '.' {
                        selector.classes.push(name);
                    } else if selector.id.replace(name).is_some() {
                        return Err(SelectorError::Invalid(input.to_string()));
                    }
                }
                '[' => {
                    let body_end = input[start..]
                        .find(']')
                        .ok_or_else(|| SelectorError::Invalid(input.to_string()))?
                        + start;
                    let body = &input[start + 1..body_end];
                    selector.attrs.push(parse_attr(body, input)?);
                    while let Some((offset, _)) = chars.peek() {
                        if *offset > body_end {
                            break;
                        }
                        chars.next();
                    }
                }
                ch if ch.is_whitespace() => {
                    // Descendant combinators are out of scope.
                    return Err(SelectorError::Unsupported(input.to_string()));
                }
                _ => return Err(SelectorError::Invalid(input.to_string())),
            }
        }

        Ok(selector)
    }

    /// Whether an element satisfies every part of the selector.
    pub fn matches(&self, element: &Element<'_>) -> bool {
        if let Some(tag) = &self.tag {
            if element.tag() != tag {
                return false;
            }
        }
        if let Some(id) = &self.id {
            if element.attr("id") != Some(id.as_str()) {
                return false;
            }
        }
        if !self.classes.is_empty() {
            let class_attr = element.attr("class").unwrap_or("");
            let mut found: Vec<&str> = class_attr.split_whitespace().collect();
            found.sort_unstable();
            if !self
                .classes
                .iter()
                .all(|class| found.binary_search(&class.as_str()).is_ok())
            {
                return false;
            }
        }
        self.attrs.iter().all(|attr| {
            match element.attr(&attr.name) {
                Some(actual) => attr
                    .value
                    .as_deref()
                    .is_none_or(|expected| actual == expected),
                None => false,
            }
        })
    }
}

/// Parse the inside of `[...]`: `name` or `name=value` (value may be quoted).
fn parse_attr(body: &str, input: &str) -> Result<AttrMatch, SelectorError> {
    let body = body.trim();
    if body.is_empty() {
        return Err(SelectorError::Invalid(input.to_string()));
    }
    match body.split_once('=') {
        None => Ok(AttrMatch {
            name: body.to_ascii_lowercase(),
            value: None,
        }),
        Some((name, raw_value)) => {
            let name = name.trim();
            if name.is_empty() || name.ends_with(['^', '$', '*', '|', '~']) {
                return Err(SelectorError::Unsupported(input.to_string()));
            }
            let value = raw_value
                .trim()
                .trim_matches('"')
                .trim_matches('\'')
                .to_string();
            Ok(AttrMatch {
                name: name.to_ascii_lowercase(),
                value: Some(value),
            })
        }
    }
}

fn take_while<I>(chars: &mut std::iter::Peekable<I>, keep: fn(char) -> bool) -> String
where
    I: Iterator<Item = (usize, char)>,
{
    let mut out = String::new();
    while let Some((_, ch)) = chars.peek() {
        if !keep(*ch) {
            break;
        }
        out.push(*ch);
        chars.next();
    }
    out
}

fn is_ident_char(ch: char) -> bool {
    ch.is_ascii_alphanumeric() || ch == '-' || ch == '_'
}
