//! Message Templates
//!
//! Action messages use `{name}` slots for the first object of each kind,
//! `{N}` for the N-th remaining argument and `{N.attr}` for one of its fields.
//! `{{` and `}}` produce literal braces.

use std::fmt;

/// Slots filled from the first matching argument, or from the actor for `{user}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedSlot {
    Addon,
    Review,
    Version,
    Collection,
    Tag,
    User,
    Group,
}

impl NamedSlot {
    fn parse(name: &str) -> Option<Self> {
        Some(match name {
            "addon" => NamedSlot::Addon,
            "review" => NamedSlot::Review,
            "version" => NamedSlot::Version,
            "collection" => NamedSlot::Collection,
            "tag" => NamedSlot::Tag,
            "user" => NamedSlot::User,
            "group" => NamedSlot::Group,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Segment<'a> {
    Literal(&'a str),
    /// A doubled brace collapsed to one
    Brace(char),
    Named(NamedSlot),
    Positional {
        index: usize,
        attribute: Option<&'a str>,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    Unclosed { offset: usize },
    UnmatchedClose { offset: usize },
    EmptyField { offset: usize },
    UnknownField { field: String },
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TemplateError::Unclosed { offset } => write!(f, "unclosed '{{' at byte {}", offset),
            TemplateError::UnmatchedClose { offset } => {
                write!(f, "single '}}' at byte {}", offset)
            }
            TemplateError::EmptyField { offset } => write!(f, "empty field at byte {}", offset),
            TemplateError::UnknownField { field } => write!(f, "unknown field '{}'", field),
        }
    }
}

impl std::error::Error for TemplateError {}

fn parse_field(field: &str, offset: usize) -> Result<Segment<'_>, TemplateError> {
    if field.is_empty() {
        return Err(TemplateError::EmptyField { offset });
    }

    let (head, attribute) = match field.split_once('.') {
        Some((head, attribute)) => (head, Some(attribute)),
        None => (field, None),
    };

    if let Ok(index) = head.parse::<usize>() {
        if attribute.is_some_and(str::is_empty) {
            return Err(TemplateError::UnknownField { field: field.to_string() });
        }
        return Ok(Segment::Positional { index, attribute });
    }

    match (NamedSlot::parse(head), attribute) {
        (Some(slot), None) => Ok(Segment::Named(slot)),
        _ => Err(TemplateError::UnknownField { field: field.to_string() }),
    }
}

/// Split a template into segments.
pub fn parse(template: &str) -> Result<Vec<Segment<'_>>, TemplateError> {
    let mut segments = Vec::new();
    let bytes = template.as_bytes();
    let mut literal_start = 0;
    let mut i = 0;

    while i < bytes.len() {
        match bytes[i] {
            b'{' | b'}' if bytes.get(i + 1) == Some(&bytes[i]) => {
                if literal_start < i {
                    segments.push(Segment::Literal(&template[literal_start..i]));
                }
                segments.push(Segment::Brace(bytes[i] as char));
                i += 2;
                literal_start = i;
            }
            b'{' => {
                if literal_start < i {
                    segments.push(Segment::Literal(&template[literal_start..i]));
                }
                let close = template[i + 1..]
                    .find('}')
                    .map(|pos| pos + i + 1)
                    .ok_or(TemplateError::Unclosed { offset: i })?;
                segments.push(parse_field(&template[i + 1..close], i)?);
                i = close + 1;
                literal_start = i;
            }
            b'}' => return Err(TemplateError::UnmatchedClose { offset: i }),
            _ => i += 1,
        }
    }

    if literal_start < template.len() {
        segments.push(Segment::Literal(&template[literal_start..]));
    }

    Ok(segments)
}
