//! Reader for returned `<limsml>` entity documents.
//!
//! Customers send acknowledgements and result returns as nested `entity`
//! elements, each carrying `field` elements keyed by an `id` attribute. The
//! reader keeps the nesting and flattens each entity's fields into an ordered
//! set where the first value for a repeated id wins.

use std::fs;
use std::path::Path;

use anyhow::{Context, Result, bail};
use quick_xml::Reader;
use quick_xml::escape::{resolve_predefined_entity, unescape};
use quick_xml::events::{BytesStart, Event};
use serde::Serialize;
use tracing::debug;

use labx_model::FieldSet;

/// One entity of an acknowledgement document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EntityRecord {
    /// Value of the `type` attribute, upper-cased.
    pub kind: String,
    pub fields: FieldSet,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<EntityRecord>,
}

impl EntityRecord {
    pub fn new(kind: impl AsRef<str>) -> Self {
        Self {
            kind: kind.as_ref().trim().to_uppercase(),
            ..Self::default()
        }
    }

    pub fn field(&self, id: &str) -> Option<&str> {
        self.fields.get(id)
    }

    /// Direct children of one kind.
    pub fn children_of<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a EntityRecord> {
        self.children
            .iter()
            .filter(move |child| child.kind.eq_ignore_ascii_case(kind))
    }
}

pub fn read_acknowledgement_file(path: &Path) -> Result<Vec<EntityRecord>> {
    let contents = fs::read_to_string(path)
        .with_context(|| format!("read acknowledgement: {}", path.display()))?;
    read_acknowledgement(&contents)
        .with_context(|| format!("parse acknowledgement: {}", path.display()))
}

/// Parse an acknowledgement into its top-level entities.
pub fn read_acknowledgement(xml: &str) -> Result<Vec<EntityRecord>> {
    let mut reader = Reader::from_str(xml);
    let mut stack: Vec<EntityRecord> = Vec::new();
    let mut roots = Vec::new();
    let mut field: Option<(String, String)> = None;

    loop {
        match reader.read_event()? {
            Event::Start(start) => match start.local_name().as_ref() {
                b"entity" => stack.push(EntityRecord::new(attribute(&start, b"type")?)),
                b"field" => field = Some((attribute(&start, b"id")?, String::new())),
                _ => {}
            },
            Event::Empty(start) => match start.local_name().as_ref() {
                b"entity" => {
                    let entity = EntityRecord::new(attribute(&start, b"type")?);
                    close_entity(&mut stack, &mut roots, entity);
                }
                b"field" => {
                    let id = attribute(&start, b"id")?;
                    add_field(&mut stack, &id, "");
                }
                _ => {}
            },
            Event::Text(text) => {
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(std::str::from_utf8(&text)?);
                }
            }
            Event::CData(data) => {
                if let Some((_, value)) = field.as_mut() {
                    value.push_str(std::str::from_utf8(&data)?);
                }
            }
            Event::GeneralRef(reference) => {
                if let Some((_, value)) = field.as_mut() {
                    let name = std::str::from_utf8(&reference)?;
                    match resolve_reference(name) {
                        Some(resolved) => value.push_str(&resolved),
                        None => bail!("unknown entity reference &{name};"),
                    }
                }
            }
            Event::End(end) => match end.local_name().as_ref() {
                b"field" => {
                    if let Some((id, value)) = field.take() {
                        add_field(&mut stack, &id, value.trim());
                    }
                }
                b"entity" => {
                    if let Some(entity) = stack.pop() {
                        close_entity(&mut stack, &mut roots, entity);
                    }
                }
                _ => {}
            },
            Event::Eof => break,
            _ => {}
        }
    }

    if !stack.is_empty() {
        bail!("unclosed entity element");
    }
    debug!(entities = roots.len(), "acknowledgement parsed");
    Ok(roots)
}

fn attribute(start: &BytesStart<'_>, name: &[u8]) -> Result<String> {
    for attr in start.attributes() {
        let attr = attr?;
        if attr.key.local_name().as_ref() == name {
            let raw = std::str::from_utf8(&attr.value)?;
            return Ok(unescape(raw)?.into_owned());
        }
    }
    Ok(String::new())
}

fn add_field(stack: &mut [EntityRecord], id: &str, value: &str) {
    if id.trim().is_empty() {
        debug!("field without id ignored");
        return;
    }
    match stack.last_mut() {
        Some(entity) => {
            entity.fields.insert_if_absent(id, value);
        }
        None => debug!(field = id, "field outside an entity ignored"),
    }
}

fn close_entity(stack: &mut [EntityRecord], roots: &mut Vec<EntityRecord>, entity: EntityRecord) {
    match stack.last_mut() {
        Some(parent) => parent.children.push(entity),
        None => roots.push(entity),
    }
}

fn resolve_reference(name: &str) -> Option<String> {
    if let Some(code) = name.strip_prefix('#') {
        let value = match code.strip_prefix('x') {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => code.parse().ok()?,
        };
        return char::from_u32(value).map(String::from);
    }
    resolve_predefined_entity(name).map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn character_references_resolve() {
        assert_eq!(resolve_reference("#65").as_deref(), Some("A"));
        assert_eq!(resolve_reference("#x42").as_deref(), Some("B"));
        assert_eq!(resolve_reference("amp").as_deref(), Some("&"));
        assert_eq!(resolve_reference("bogus"), None);
    }
}
