//! Shared XML writing for transaction documents.

use std::io::Write;

use anyhow::Result;
use quick_xml::Writer;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use tracing::warn;

use labx_map::FieldMapEntry;
use labx_model::RecordKind;

/// Root collection node.
pub const JOBS_NODE: &str = "jobs";
pub const JOB_NODE: &str = "job";
/// Customer identity node, always the first child of a job.
pub const CUSTOMER_NODE: &str = "CustomerId";
pub const SAMPLES_NODE: &str = "samples";
pub const SAMPLE_NODE: &str = "sample";
pub const TESTS_NODE: &str = "tests";
pub const TEST_NODE: &str = "test";
pub const RESULTS_NODE: &str = "results";
pub const RESULT_NODE: &str = "result";

/// Write a simple text element.
pub fn write_text_element<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<()> {
    writer.write_event(Event::Start(BytesStart::new(name)))?;
    writer.write_event(Event::Text(BytesText::new(text)))?;
    writer.write_event(Event::End(BytesEnd::new(name)))?;
    Ok(())
}

/// False, with a warning, for entries whose node cannot be an element name.
pub fn element_name_ok(entry: &FieldMapEntry, kind: RecordKind) -> bool {
    let ok = entry.has_valid_node_name();
    if !ok {
        warn!(
            kind = %kind,
            node = %entry.node_name(),
            "node name is not a valid element name, skipped"
        );
    }
    ok
}

/// Node name and text of one emitted field.
pub type FieldNode<'a> = (&'a str, String);

/// Streams the `jobs > job > samples > sample` hierarchy.
///
/// With test nodes enabled results sit under `tests > test > results`,
/// otherwise directly under the sample's `results` node.
pub struct DocumentWriter {
    xml: Writer<Vec<u8>>,
    test_nodes: bool,
}

impl DocumentWriter {
    pub fn new(test_nodes: bool) -> Self {
        Self {
            xml: Writer::new_with_indent(Vec::new(), b'\t', 1),
            test_nodes,
        }
    }

    pub fn begin_job(&mut self, customer: &str, fields: &[FieldNode<'_>]) -> Result<()> {
        self.start(JOBS_NODE)?;
        self.start(JOB_NODE)?;
        write_text_element(&mut self.xml, CUSTOMER_NODE, customer)?;
        self.fields(fields)?;
        self.start(SAMPLES_NODE)
    }

    pub fn begin_sample(&mut self, fields: &[FieldNode<'_>]) -> Result<()> {
        self.start(SAMPLE_NODE)?;
        self.fields(fields)?;
        self.start(if self.test_nodes {
            TESTS_NODE
        } else {
            RESULTS_NODE
        })
    }

    /// Test fields are only written when test nodes are enabled.
    pub fn begin_test(&mut self, fields: &[FieldNode<'_>]) -> Result<()> {
        if self.test_nodes {
            self.start(TEST_NODE)?;
            self.fields(fields)?;
            self.start(RESULTS_NODE)?;
        }
        Ok(())
    }

    pub fn result(&mut self, fields: &[FieldNode<'_>]) -> Result<()> {
        self.start(RESULT_NODE)?;
        self.fields(fields)?;
        self.end(RESULT_NODE)
    }

    pub fn end_test(&mut self) -> Result<()> {
        if self.test_nodes {
            self.end(RESULTS_NODE)?;
            self.end(TEST_NODE)?;
        }
        Ok(())
    }

    pub fn end_sample(&mut self) -> Result<()> {
        self.end(if self.test_nodes {
            TESTS_NODE
        } else {
            RESULTS_NODE
        })?;
        self.end(SAMPLE_NODE)
    }

    pub fn finish(mut self) -> Result<String> {
        self.end(SAMPLES_NODE)?;
        self.end(JOB_NODE)?;
        self.end(JOBS_NODE)?;
        Ok(String::from_utf8(self.xml.into_inner())?)
    }

    fn fields(&mut self, fields: &[FieldNode<'_>]) -> Result<()> {
        for (node, value) in fields {
            write_text_element(&mut self.xml, node, value)?;
        }
        Ok(())
    }

    fn start(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::Start(BytesStart::new(name)))?;
        Ok(())
    }

    fn end(&mut self, name: &str) -> Result<()> {
        self.xml.write_event(Event::End(BytesEnd::new(name)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn flattened_document_has_results_under_sample() {
        let mut doc = DocumentWriter::new(false);
        doc.begin_job("ACME", &[]).unwrap();
        doc.begin_sample(&[("SampleId", "7".to_string())]).unwrap();
        doc.begin_test(&[("Ignored", "x".to_string())]).unwrap();
        doc.result(&[("Value", "7.1".to_string())]).unwrap();
        doc.end_test().unwrap();
        doc.end_sample().unwrap();
        let xml = doc.finish().unwrap();

        assert!(!xml.starts_with("<?xml"));
        assert!(xml.contains("<CustomerId>ACME</CustomerId>"));
        assert!(xml.contains("\t\t\t\t<results>"));
        assert!(!xml.contains("<test>"));
        assert!(!xml.contains("Ignored"));
    }

    #[test]
    fn text_is_escaped() {
        let mut doc = DocumentWriter::new(true);
        doc.begin_job("A&B", &[]).unwrap();
        let xml = doc.finish().unwrap();
        assert!(xml.contains("<CustomerId>A&amp;B</CustomerId>"));
    }
}
