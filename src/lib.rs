//! dmarcview Library
//!
//! This library provides the building blocks of dmarcview: configuration,
//! error handling, report extraction, XML tree parsing, record flattening,
//! column resolution and sorting, and table rendering.

pub mod columns;
pub mod config;
pub mod error;
pub mod extract;
pub mod flatten;
pub mod models;
pub mod report;
pub mod schema;
pub mod table;
pub mod xml_parser;

pub use config::Config;
pub use extract::extract_report;
pub use report::DmarcReport;
pub use xml_parser::parse_document;
