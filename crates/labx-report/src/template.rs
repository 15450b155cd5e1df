//! Illustrative documents for customer onboarding.
//!
//! The output template shows a customer what a delivered transaction looks
//! like under their profile: two synthetic samples walked through the same
//! field map as a real export. The inbound template shows the request shape
//! the lab expects back.

use std::collections::BTreeSet;

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};

use labx_map::{ComponentMapEntry, CustomerProfile};
use labx_model::{CUSTOMER_ID_FIELD, RecordKind, SourceRecord, TEXT_FIELD};

use crate::common::{DocumentWriter, FieldNode, element_name_ok};

const TEMPLATE_SAMPLES: u32 = 2;

/// Analysis and component a synthetic test result stands for.
struct SyntheticResult<'a> {
    analysis: &'a str,
    component: &'a str,
    text: String,
}

/// Output document with two synthetic samples.
pub fn output_template(profile: &CustomerProfile) -> Result<String> {
    let groups = synthetic_tests(profile);
    let mut doc = DocumentWriter::new(profile.test_nodes);
    doc.begin_job(
        profile.customer_id.as_str(),
        &synthetic_nodes(profile, RecordKind::Job, 1, None),
    )?;
    for sample in 1..=TEMPLATE_SAMPLES {
        doc.begin_sample(&synthetic_nodes(profile, RecordKind::Sample, sample, None))?;
        for results in &groups {
            doc.begin_test(&synthetic_nodes(
                profile,
                RecordKind::Test,
                sample,
                results.first(),
            ))?;
            for result in results {
                doc.result(&synthetic_nodes(
                    profile,
                    RecordKind::Result,
                    sample,
                    Some(result),
                ))?;
            }
            doc.end_test()?;
        }
        doc.end_sample()?;
    }
    doc.finish()
}

/// One synthetic test per internal analysis, one result per component.
fn synthetic_tests(profile: &CustomerProfile) -> Vec<Vec<SyntheticResult<'_>>> {
    let mut groups: Vec<Vec<SyntheticResult<'_>>> = Vec::new();
    for entry in profile.component_map.distinct_components() {
        let result = SyntheticResult {
            analysis: &entry.analysis,
            component: &entry.component,
            text: example_text(entry),
        };
        match groups.iter_mut().find(|group| {
            group
                .first()
                .is_some_and(|first| first.analysis.eq_ignore_ascii_case(&entry.analysis))
        }) {
            Some(group) => group.push(result),
            None => groups.push(vec![result]),
        }
    }
    if groups.is_empty() {
        groups.push(vec![SyntheticResult {
            analysis: "ANALYSIS",
            component: "COMPONENT",
            text: "0.00".to_string(),
        }]);
    }
    groups
}

fn example_text(entry: &ComponentMapEntry) -> String {
    entry
        .value_map
        .first()
        .map_or_else(|| "0.00".to_string(), |mapping| mapping.internal.clone())
}

fn synthetic_nodes<'p>(
    profile: &'p CustomerProfile,
    kind: RecordKind,
    sample: u32,
    result: Option<&SyntheticResult<'_>>,
) -> Vec<FieldNode<'p>> {
    profile
        .field_map
        .mapped_entries(kind)
        .filter(|entry| element_name_ok(entry, kind))
        .map(|entry| {
            let field = entry.field_ref();
            let value = match (field.source_for(kind), field.name.as_str(), result) {
                (SourceRecord::Result, TEXT_FIELD, Some(result)) => result.text.clone(),
                (SourceRecord::Result, "NAME", Some(result)) => result.component.to_string(),
                (SourceRecord::Test, "ANALYSIS", Some(result)) => result.analysis.to_string(),
                _ => format!("{}{sample}", entry.node_name()),
            };
            (entry.node_name(), value)
        })
        .collect()
}

/// Node names of a request entity, in field map order without repeats.
fn inbound_nodes(profile: &CustomerProfile, kinds: &[RecordKind]) -> Vec<String> {
    let mut seen = BTreeSet::new();
    let mut nodes = Vec::new();
    for kind in kinds {
        for entry in profile.field_map.mapped_entries(*kind) {
            let field = entry.field_ref();
            if field.source_for(*kind) != kind.own_source() {
                continue;
            }
            let node = entry.node_name().to_string();
            if seen.insert(node.to_uppercase()) {
                nodes.push(node);
            }
        }
    }
    nodes
}

/// Request document a customer submits, with placeholder values.
///
/// `CUSTOMER_ID` always leads the sample fields and is marked mandatory.
pub fn inbound_template(profile: &CustomerProfile) -> Result<String> {
    let example = profile
        .component_map
        .iter()
        .find(|entry| entry.is_primary());
    let (analysis_alias, component_alias) = example.map_or(("ANALYSIS", "COMPONENT"), |entry| {
        (entry.analysis_alias.as_str(), entry.component_alias.as_str())
    });

    let mut xml = Writer::new_with_indent(Vec::new(), b'\t', 1);
    for name in ["limsml", "body", "transaction", "system"] {
        xml.write_event(Event::Start(BytesStart::new(name)))?;
    }

    start_entity(&mut xml, "SAMPLE")?;
    write_field(
        &mut xml,
        CUSTOMER_ID_FIELD,
        &format!("MANDATORY: {}", profile.customer_id),
    )?;
    for node in inbound_nodes(profile, &[RecordKind::Job, RecordKind::Sample]) {
        if node.eq_ignore_ascii_case(CUSTOMER_ID_FIELD) {
            continue;
        }
        write_field(&mut xml, &node, &node)?;
    }
    xml.write_event(Event::End(BytesEnd::new("fields")))?;

    xml.write_event(Event::Start(BytesStart::new("children")))?;
    start_entity(&mut xml, "TEST")?;
    write_field(&mut xml, "ANALYSIS_ALIAS", analysis_alias)?;
    write_field(&mut xml, "COMPONENT_ALIAS", component_alias)?;
    for node in inbound_nodes(profile, &[RecordKind::Test]) {
        write_field(&mut xml, &node, &node)?;
    }
    xml.write_event(Event::End(BytesEnd::new("fields")))?;
    xml.write_event(Event::End(BytesEnd::new("entity")))?;
    xml.write_event(Event::End(BytesEnd::new("children")))?;
    xml.write_event(Event::End(BytesEnd::new("entity")))?;

    for name in ["system", "transaction", "body", "limsml"] {
        xml.write_event(Event::End(BytesEnd::new(name)))?;
    }
    Ok(String::from_utf8(xml.into_inner())?)
}

/// Opens `<entity type=..><fields>`.
fn start_entity(xml: &mut Writer<Vec<u8>>, kind: &str) -> Result<()> {
    let mut entity = BytesStart::new("entity");
    entity.push_attribute(("type", kind));
    xml.write_event(Event::Start(entity))?;
    xml.write_event(Event::Start(BytesStart::new("fields")))?;
    Ok(())
}

fn write_field(xml: &mut Writer<Vec<u8>>, id: &str, value: &str) -> Result<()> {
    let mut field = BytesStart::new("field");
    field.push_attribute(("id", id));
    field.push_attribute(("direction", "in"));
    xml.write_event(Event::Start(field))?;
    xml.write_event(Event::Text(BytesText::new(value)))?;
    xml.write_event(Event::End(BytesEnd::new("field")))?;
    Ok(())
}
