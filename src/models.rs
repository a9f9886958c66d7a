//! Data Models Module
//!
//! This module defines the report-level metadata and per-sender records that a
//! DMARC aggregate report is flattened from.
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum AlignmentMode {
    #[default]
    Relaxed,
    Strict,
}

impl AlignmentMode {
    /// Interprets a published `adkim`/`aspf` code; only `s` means strict.
    pub fn from_code(code: Option<&str>) -> Self {
        match code {
            Some(code) if code.trim().eq_ignore_ascii_case("s") => AlignmentMode::Strict,
            _ => AlignmentMode::Relaxed,
        }
    }
}

impl fmt::Display for AlignmentMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AlignmentMode::Relaxed => write!(f, "relaxed"),
            AlignmentMode::Strict => write!(f, "strict"),
        }
    }
}

/// Report-level values shared by every row of one report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportMetadata {
    pub organization: String,
    /// `YYYY-MM-DD`, UTC.
    pub begin_date: String,
    pub end_date: String,
    pub domain: String,
    pub adkim: AlignmentMode,
    pub aspf: AlignmentMode,
    pub p: String,
    pub sp: String,
    pub pct: String,
}

impl ReportMetadata {
    /// Report-level cells in column order.
    pub fn cells(&self) -> Vec<String> {
        vec![
            self.organization.clone(),
            self.begin_date.clone(),
            self.end_date.clone(),
            self.domain.clone(),
            self.adkim.to_string(),
            self.aspf.to_string(),
            self.p.clone(),
            self.sp.clone(),
            self.pct.clone(),
        ]
    }
}

/// One DKIM signature evaluated for a sender record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SigningResult {
    pub domain: String,
    pub result: String,
    pub selector: String,
}

impl SigningResult {
    /// An entry whose every field is the given placeholder.
    pub fn placeholder(missing: &str) -> Self {
        SigningResult {
            domain: missing.to_string(),
            result: missing.to_string(),
            selector: missing.to_string(),
        }
    }
}

/// One `<record>` of the report: a sending source and how it was evaluated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SenderRecord {
    pub source_ip: String,
    /// Message count as written in the report, trimmed.
    pub count_text: String,
    pub count: u64,
    pub disposition: String,
    pub dkim: String,
    pub spf: String,
    /// Present only when the schema variant has a `Reason` column.
    pub reason: Option<String>,
    pub header_from: String,
    pub spf_domain: String,
    pub spf_result: String,
    pub signatures: Vec<SigningResult>,
}
