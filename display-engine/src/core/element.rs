//! Clicked-element abstraction and compound-selector matching.
//!
//! The host page supplies the element behind an [`Element`] implementation.
//! [`ElementSnapshot`] is the serializable form used by the CLI and tests; it
//! evaluates one compound selector (`div.cta#buy[data-plan="pro"]`) against
//! itself. Combinators and pseudo-classes are reported as unsupported.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::core::error::MatchError;

/// A clicked element as seen by action matching.
pub trait Element {
    /// Inner markup of the element, compared verbatim against `innerHtml`.
    fn inner_html(&self) -> String;

    /// Structural selector test, like the DOM's `Element.matches`.
    fn matches(&self, selector: &str) -> Result<bool, MatchError>;
}

/// Static description of an element captured from the page.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementSnapshot {
    pub tag: String,
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub classes: Vec<String>,
    #[serde(default)]
    pub attributes: BTreeMap<String, String>,
    #[serde(default)]
    pub inner_html: String,
}

impl ElementSnapshot {
    fn attribute(&self, name: &str) -> Option<String> {
        match name {
            "id" => self.id.clone(),
            "class" if !self.classes.is_empty() => Some(self.classes.join(" ")),
            _ => self.attributes.get(name).cloned(),
        }
    }
}

impl Element for ElementSnapshot {
    fn inner_html(&self) -> String {
        self.inner_html.clone()
    }

    fn matches(&self, selector: &str) -> Result<bool, MatchError> {
        let compound = parse_compound(selector)?;
        Ok(compound.matches(self))
    }
}

#[derive(Debug, Default, PartialEq, Eq)]
struct CompoundSelector {
    tag: Option<String>,
    ids: Vec<String>,
    classes: Vec<String>,
    attributes: Vec<(String, Option<String>)>,
}

impl CompoundSelector {
    fn matches(&self, element: &ElementSnapshot) -> bool {
        if let Some(tag) = &self.tag
            && !tag.eq_ignore_ascii_case(&element.tag)
        {
            return false;
        }
        if self
            .ids
            .iter()
            .any(|id| element.id.as_deref() != Some(id.as_str()))
        {
            return false;
        }
        if !self
            .classes
            .iter()
            .all(|class| element.classes.iter().any(|have| have == class))
        {
            return false;
        }
        self.attributes
            .iter()
            .all(|(name, expected)| match (element.attribute(name), expected) {
                (None, _) => false,
                (Some(_), None) => true,
                (Some(actual), Some(expected)) => &actual == expected,
            })
    }
}

fn parse_compound(selector: &str) -> Result<CompoundSelector, MatchError> {
    if selector.trim().is_empty() {
        return Err(MatchError::invalid_selector(selector, "empty selector"));
    }

    let mut compound = CompoundSelector::default();
    let mut chars = selector.chars().peekable();

    match chars.peek() {
        Some('*') => {
            chars.next();
        }
        Some(c) if is_ident_start(*c) => {
            compound.tag = Some(take_ident(&mut chars));
        }
        _ => {}
    }

    while let Some(c) = chars.next() {
        match c {
            '.' => {
                let class = take_ident(&mut chars);
                if class.is_empty() {
                    return Err(MatchError::invalid_selector(selector, "empty class name"));
                }
                compound.classes.push(class);
            }
            '#' => {
                let id = take_ident(&mut chars);
                if id.is_empty() {
                    return Err(MatchError::invalid_selector(selector, "empty id"));
                }
                compound.ids.push(id);
            }
            '[' => compound
                .attributes
                .push(parse_attribute(selector, &mut chars)?),
            ':' => {
                return Err(MatchError::unsupported_selector(
                    selector,
                    "pseudo-classes are not evaluated",
                ));
            }
            '>' | '+' | '~' | ',' | ' ' => {
                return Err(MatchError::unsupported_selector(
                    selector,
                    "combinators and selector lists are not evaluated",
                ));
            }
            other => {
                return Err(MatchError::invalid_selector(
                    selector,
                    format!("unexpected character '{other}'"),
                ));
            }
        }
    }

    Ok(compound)
}

fn parse_attribute(
    selector: &str,
    chars: &mut std::iter::Peekable<std::str::Chars<'_>>,
) -> Result<(String, Option<String>), MatchError> {
    let name = take_ident(chars);
    if name.is_empty() {
        return Err(MatchError::invalid_selector(selector, "empty attribute name"));
    }
    match chars.next() {
        Some(']') => Ok((name, None)),
        Some('=') => {
            let value = match chars.peek() {
                Some(quote @ ('"' | '\'')) => {
                    let quote = *quote;
                    chars.next();
                    let mut value = String::new();
                    loop {
                        match chars.next() {
                            Some(c) if c == quote => break,
                            Some(c) => value.push(c),
                            None => {
                                return Err(MatchError::invalid_selector(
                                    selector,
                                    "unterminated attribute value",
                                ));
                            }
                        }
                    }
                    value
                }
                _ => take_ident(chars),
            };
            match chars.next() {
                Some(']') => Ok((name, Some(value))),
                _ => Err(MatchError::invalid_selector(
                    selector,
                    "expected ']' after attribute value",
                )),
            }
        }
        Some('~' | '|' | '^' | '$' | '*') => Err(MatchError::unsupported_selector(
            selector,
            "attribute operators other than '=' are not evaluated",
        )),
        _ => Err(MatchError::invalid_selector(
            selector,
            "unterminated attribute selector",
        )),
    }
}

fn is_ident_start(c: char) -> bool {
    c.is_alphabetic() || c == '_' || c == '-'
}

fn take_ident(chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> String {
    let mut ident = String::new();
    while let Some(&c) = chars.peek() {
        if c.is_alphanumeric() || c == '-' || c == '_' {
            ident.push(c);
            chars.next();
        } else {
            break;
        }
    }
    ident
}
