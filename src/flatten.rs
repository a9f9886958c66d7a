//! Record Flattening Module
//!
//! Converts one `<record>` of a parsed report into [`SenderRecord`] and then into
//! flat rows, one per DKIM signing result. A record without signing results still
//! produces exactly one row whose signing cells carry the schema's placeholder.

use crate::error::{DmarcError, Result};
use crate::models::{SenderRecord, SigningResult};
use crate::schema::ColumnSchema;
use crate::xml_parser::{Element, Node};

/// A flattened row: one text cell per column.
pub type Row = Vec<String>;

pub struct RecordFlattener<'a> {
    schema: &'a ColumnSchema,
}

impl<'a> RecordFlattener<'a> {
    pub fn new(schema: &'a ColumnSchema) -> Self {
        Self { schema }
    }

    /// Reads a record node.
    ///
    /// # Errors
    ///
    /// Fails when `row`, `source_ip`, `count`, `policy_evaluated` or one of the
    /// evaluated disposition/dkim/spf outcomes is absent, or when `count` is not a
    /// non-negative integer. No defaults are substituted for these fields.
    pub fn parse_record(&self, record: &Element) -> Result<SenderRecord> {
        let missing = self.schema.missing_value();

        let row = required_element(record, "row", "record")?;
        let source_ip = required_text(row, "source_ip", "record.row")?;
        let count_text = required_text(row, "count", "record.row")?.trim();
        let count = count_text
            .parse::<u64>()
            .map_err(|_| DmarcError::invalid_number("record.row.count", count_text))?;

        let evaluated = required_element(row, "policy_evaluated", "record.row")?;
        let path = "record.row.policy_evaluated";
        let disposition = required_text(evaluated, "disposition", path)?;
        let dkim = required_text(evaluated, "dkim", path)?;
        let spf = required_text(evaluated, "spf", path)?;

        let reason = self.schema.has_reason().then(|| reason_text(evaluated));

        let header_from = record
            .element("identifiers")
            .and_then(|identifiers| identifiers.text("header_from"))
            .unwrap_or(missing);

        let auth_results = record.element("auth_results");
        let signatures: Vec<SigningResult> = auth_results
            .map(|auth| {
                auth.all("dkim")
                    .iter()
                    .map(|node| self.signing_result(node))
                    .collect()
            })
            .unwrap_or_default();

        let spf_entry = auth_results.and_then(|auth| auth.element("spf"));
        let spf_domain = spf_entry.and_then(|s| s.text("domain")).unwrap_or(missing);
        let spf_result = spf_entry.and_then(|s| s.text("result")).unwrap_or(missing);

        Ok(SenderRecord {
            source_ip: source_ip.to_string(),
            count_text: count_text.to_string(),
            count,
            disposition: disposition.to_string(),
            dkim: dkim.to_string(),
            spf: spf.to_string(),
            reason,
            header_from: header_from.to_string(),
            spf_domain: spf_domain.to_string(),
            spf_result: spf_result.to_string(),
            signatures,
        })
    }

    fn signing_result(&self, node: &Node) -> SigningResult {
        let missing = self.schema.missing_value();
        match node.as_element() {
            Some(dkim) => SigningResult {
                domain: dkim.text("domain").unwrap_or(missing).to_string(),
                result: dkim.text("result").unwrap_or(missing).to_string(),
                selector: dkim.text("selector").unwrap_or(missing).to_string(),
            },
            // <dkim/> with no subfields
            None => SigningResult::placeholder(missing),
        }
    }

    /// Expands a record into its rows, one per signing result.
    pub fn flatten(&self, record: &SenderRecord) -> Vec<Row> {
        let mut base = vec![
            record.source_ip.clone(),
            record.count_text.clone(),
            record.disposition.clone(),
            record.dkim.clone(),
            record.spf.clone(),
        ];
        if let Some(reason) = &record.reason {
            base.push(reason.clone());
        }
        base.extend([
            record.header_from.clone(),
            record.spf_domain.clone(),
            record.spf_result.clone(),
        ]);

        let placeholder;
        let signatures: &[SigningResult] = if record.signatures.is_empty() {
            placeholder = [SigningResult::placeholder(self.schema.missing_value())];
            &placeholder
        } else {
            &record.signatures
        };

        signatures
            .iter()
            .map(|signature| {
                let mut row = base.clone();
                row.extend([
                    signature.domain.clone(),
                    signature.result.clone(),
                    signature.selector.clone(),
                ]);
                row
            })
            .collect()
    }

    pub fn flatten_node(&self, record: &Element) -> Result<Vec<Row>> {
        Ok(self.flatten(&self.parse_record(record)?))
    }
}

/// Joins `key=value` pairs of each `<reason>` entry with `,` and entries with ` ; `.
fn reason_text(evaluated: &Element) -> String {
    evaluated
        .all("reason")
        .iter()
        .filter_map(|node| match node {
            Node::Element(reason) => Some(
                reason
                    .entries()
                    .filter_map(|(key, value)| value.as_text().map(|v| format!("{}={}", key, v)))
                    .collect::<Vec<_>>()
                    .join(","),
            ),
            Node::Text(text) if !text.is_empty() => Some(text.clone()),
            Node::Text(_) => None,
        })
        .collect::<Vec<_>>()
        .join(" ; ")
}

pub(crate) fn required_element<'e>(parent: &'e Element, key: &str, path: &str) -> Result<&'e Element> {
    parent
        .element(key)
        .ok_or_else(|| DmarcError::missing(format!("{}.{}", path, key)))
}

pub(crate) fn required_text<'e>(parent: &'e Element, key: &str, path: &str) -> Result<&'e str> {
    parent
        .text(key)
        .ok_or_else(|| DmarcError::missing(format!("{}.{}", path, key)))
}
