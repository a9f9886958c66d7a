//! Column Schema Module
//!
//! Report layouts drifted over time: the extended layout carries a `Reason`
//! column, treats `Pct` as numeric and leaves absent optional fields empty,
//! while the classic layout has no `Reason` column and fills gaps with `"none"`.
//! A [`ColumnSchema`] captures one layout and is handed explicitly to the
//! flattener, the report model and the column registry.

use std::fmt;
use std::str::FromStr;

/// Report-level columns, one value per report.
pub const REPORT_COLUMNS: &[&str] = &[
    "Organization",
    "Begin",
    "End",
    "Domain",
    "Adkim",
    "Aspf",
    "P",
    "Sp",
    "Pct",
];

/// Multi-valued signing-result columns, one set per DKIM entry.
pub const SIGNING_COLUMNS: &[&str] = &["DKIMDomain", "DMKIResult", "DKIMSelector"];

const CLASSIC_RECORD_COLUMNS: &[&str] = &[
    "SourceIP",
    "Count",
    "Disposition",
    "Dkim",
    "SPF",
    "HeaderFrom",
    "SPFDomain",
    "SPFResult",
];

const EXTENDED_RECORD_COLUMNS: &[&str] = &[
    "SourceIP",
    "Count",
    "Disposition",
    "Dkim",
    "SPF",
    "Reason",
    "HeaderFrom",
    "SPFDomain",
    "SPFResult",
];

/// Column sorted on when the user does not pick one.
pub const DEFAULT_SORT_COLUMN: &str = "Count";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SchemaVariant {
    #[default]
    Classic,
    Extended,
}

impl fmt::Display for SchemaVariant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SchemaVariant::Classic => write!(f, "classic"),
            SchemaVariant::Extended => write!(f, "extended"),
        }
    }
}

impl FromStr for SchemaVariant {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "classic" => Ok(SchemaVariant::Classic),
            "extended" => Ok(SchemaVariant::Extended),
            _ => Err(format!("Invalid schema variant: {}", s)),
        }
    }
}

/// Column layout and default policy for one schema variant.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSchema {
    variant: SchemaVariant,
    record_columns: &'static [&'static str],
    numeric_columns: &'static [&'static str],
    missing: &'static str,
}

impl ColumnSchema {
    pub fn new(variant: SchemaVariant) -> Self {
        match variant {
            SchemaVariant::Classic => Self {
                variant,
                record_columns: CLASSIC_RECORD_COLUMNS,
                numeric_columns: &["Count"],
                missing: "none",
            },
            SchemaVariant::Extended => Self {
                variant,
                record_columns: EXTENDED_RECORD_COLUMNS,
                numeric_columns: &["Pct", "Count"],
                missing: "",
            },
        }
    }

    pub fn variant(&self) -> SchemaVariant {
        self.variant
    }

    pub fn report_columns(&self) -> &'static [&'static str] {
        REPORT_COLUMNS
    }

    pub fn is_numeric(&self, column: &str) -> bool {
        self.numeric_columns.contains(&column)
    }

    /// Whether records carry a `Reason` cell.
    pub fn has_reason(&self) -> bool {
        self.record_columns.contains(&"Reason")
    }

    /// Value substituted for absent optional record fields.
    pub fn missing_value(&self) -> &'static str {
        self.missing
    }

    /// Canonical header list, optionally followed by the signing-result columns.
    pub fn headers(&self, with_signing: bool) -> Vec<&'static str> {
        let mut headers: Vec<&'static str> = REPORT_COLUMNS
            .iter()
            .chain(self.record_columns.iter())
            .copied()
            .collect();
        if with_signing {
            headers.extend_from_slice(SIGNING_COLUMNS);
        }
        headers
    }
}

impl Default for ColumnSchema {
    fn default() -> Self {
        Self::new(SchemaVariant::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_variant_parsing() {
        assert_eq!("classic".parse::<SchemaVariant>(), Ok(SchemaVariant::Classic));
        assert_eq!(" Extended ".parse::<SchemaVariant>(), Ok(SchemaVariant::Extended));
        assert!("v3".parse::<SchemaVariant>().is_err());
    }

    #[test]
    fn test_classic_layout() {
        let schema = ColumnSchema::new(SchemaVariant::Classic);
        assert!(!schema.has_reason());
        assert_eq!(schema.missing_value(), "none");
        assert!(schema.is_numeric("Count"));
        assert!(!schema.is_numeric("Pct"));
        assert_eq!(schema.headers(false).len(), 17);
        assert_eq!(schema.headers(true).len(), 20);
        assert_eq!(schema.headers(true)[9], "SourceIP");
        assert_eq!(schema.headers(true)[19], "DKIMSelector");
    }

    #[test]
    fn test_extended_layout() {
        let schema = ColumnSchema::new(SchemaVariant::Extended);
        assert!(schema.has_reason());
        assert_eq!(schema.missing_value(), "");
        assert!(schema.is_numeric("Pct"));
        let headers = schema.headers(true);
        assert_eq!(headers.len(), 21);
        assert_eq!(headers.iter().position(|h| *h == "Reason"), Some(14));
    }
}
