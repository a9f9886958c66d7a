//! Report Model Module
//!
//! Reads report-level metadata and every sender record from a parsed DMARC
//! document, then produces the denormalized, sorted row set.

use crate::columns::ColumnRegistry;
use crate::error::{DmarcError, Result};
use crate::flatten::{required_element, required_text, RecordFlattener, Row};
use crate::models::{AlignmentMode, ReportMetadata, SenderRecord};
use crate::schema::ColumnSchema;
use crate::xml_parser::{parse_document, Element};
use chrono::{DateTime, Utc};

const DATE_FORMAT: &str = "%Y-%m-%d";

/// Published-policy fields fall back to this when absent, whatever the schema.
const POLICY_DEFAULT: &str = "none";

#[derive(Debug, Clone)]
pub struct DmarcReport {
    schema: ColumnSchema,
    metadata: ReportMetadata,
    records: Vec<SenderRecord>,
}

impl DmarcReport {
    /// Parses XML text and builds the report in one step.
    pub fn from_xml(xml_content: &str, schema: ColumnSchema) -> Result<Self> {
        let document = parse_document(xml_content)?;
        Self::from_document(&document, schema)
    }

    /// Builds the report from a parsed document.
    ///
    /// Records are ordered by descending message count before anything is
    /// flattened; records with equal counts keep their document order.
    pub fn from_document(document: &Element, schema: ColumnSchema) -> Result<Self> {
        let feedback = required_element(document, "feedback", "document")?;
        let metadata = read_metadata(feedback)?;

        let flattener = RecordFlattener::new(&schema);
        let mut records = feedback
            .all("record")
            .iter()
            .map(|node| {
                let record = node
                    .as_element()
                    .ok_or_else(|| DmarcError::missing("feedback.record.row"))?;
                flattener.parse_record(record)
            })
            .collect::<Result<Vec<_>>>()?;
        records.sort_by(|a, b| b.count.cmp(&a.count));

        log::debug!(
            "Loaded report from {} for {} with {} records",
            metadata.organization,
            metadata.domain,
            records.len()
        );

        Ok(DmarcReport {
            schema,
            metadata,
            records,
        })
    }

    pub fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    pub fn records(&self) -> &[SenderRecord] {
        &self.records
    }

    pub fn headers(&self) -> Vec<&'static str> {
        self.schema.headers(true)
    }

    /// All rows in emission order: report cells followed by each flattened record row.
    pub fn rows(&self) -> Vec<Row> {
        let flattener = RecordFlattener::new(&self.schema);
        let base = self.metadata.cells();
        self.records
            .iter()
            .flat_map(|record| flattener.flatten(record))
            .map(|detail| {
                let mut row = base.clone();
                row.extend(detail);
                row
            })
            .collect()
    }

    /// Rows ordered by `sort_by_column`, ascending unless `reverse` is set.
    pub fn plain(&self, sort_by_column: &str, reverse: bool) -> Result<Vec<Row>> {
        let registry = ColumnRegistry::new(&self.schema);
        let column = registry.resolve(sort_by_column)?;
        log::debug!(
            "Sorting by {} (column {}, reverse: {})",
            sort_by_column,
            column,
            reverse
        );
        registry.sort_rows(self.rows(), column, reverse)
    }
}

fn read_metadata(feedback: &Element) -> Result<ReportMetadata> {
    let metadata = required_element(feedback, "report_metadata", "feedback")?;
    let organization = required_text(metadata, "org_name", "feedback.report_metadata")?;
    let range = required_element(metadata, "date_range", "feedback.report_metadata")?;
    let path = "feedback.report_metadata.date_range";
    let begin_date = epoch_date(required_text(range, "begin", path)?, "begin")?;
    let end_date = epoch_date(required_text(range, "end", path)?, "end")?;

    let policy = required_element(feedback, "policy_published", "feedback")?;
    let domain = required_text(policy, "domain", "feedback.policy_published")?;
    let published = |key: &str| policy.text(key).unwrap_or(POLICY_DEFAULT).to_string();

    Ok(ReportMetadata {
        organization: organization.to_string(),
        begin_date,
        end_date,
        domain: domain.to_string(),
        adkim: AlignmentMode::from_code(policy.text("adkim")),
        aspf: AlignmentMode::from_code(policy.text("aspf")),
        p: published("p"),
        sp: published("sp"),
        pct: published("pct"),
    })
}

/// Renders Unix epoch seconds as a UTC calendar date.
fn epoch_date(value: &str, field: &str) -> Result<String> {
    let field = format!("feedback.report_metadata.date_range.{}", field);
    let seconds = value
        .trim()
        .parse::<i64>()
        .map_err(|_| DmarcError::invalid_number(field.as_str(), value))?;
    DateTime::<Utc>::from_timestamp(seconds, 0)
        .map(|date| date.format(DATE_FORMAT).to_string())
        .ok_or_else(|| DmarcError::invalid_number(field, value))
}
