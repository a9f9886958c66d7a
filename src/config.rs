//! Configuration Module
//!
//! This module reads configuration values from environment variables, provides
//! sensible defaults, and validates key security parameters such as maximum file
//! sizes and decompression limits. It also selects the report schema variant
//! used for the whole run.

use crate::schema::{ColumnSchema, SchemaVariant};
use anyhow::Result;
use std::env;
use std::str::FromStr;

#[derive(Debug, Clone)]
pub struct Config {
    pub max_file_size: usize,
    pub max_decompressed_size: usize,
    pub max_files_in_zip: usize,
    pub max_compression_ratio: f64,
    pub max_filename_length: usize,
    pub schema: SchemaVariant,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            max_file_size: 10 * 1024 * 1024,
            max_decompressed_size: 100 * 1024 * 1024,
            max_files_in_zip: 1000,
            max_compression_ratio: 1000.0,
            max_filename_length: 256,
            schema: SchemaVariant::Classic,
        }
    }
}

impl Config {
    /// Creates a new configuration by reading environment variables.
    /// If a variable is missing or empty, a default value is used.
    pub fn new() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Builds a configuration from an arbitrary key lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let parsed = |key: &str| -> Option<String> {
            lookup(key).map(|s| s.trim().to_string()).filter(|s| !s.is_empty())
        };

        let max_file_size = numeric_or(parsed("DMARC_MAX_FILE_SIZE"), defaults.max_file_size);
        if max_file_size > 500_000_000 {
            return Err(anyhow::anyhow!("Max file size too large (500MB limit)"));
        }

        let max_decompressed_size = numeric_or(
            parsed("DMARC_MAX_DECOMPRESSED_SIZE"),
            defaults.max_decompressed_size,
        );
        let max_files_in_zip = numeric_or(parsed("DMARC_MAX_FILES_IN_ZIP"), defaults.max_files_in_zip);
        let max_compression_ratio = numeric_or(
            parsed("DMARC_MAX_COMPRESSION_RATIO"),
            defaults.max_compression_ratio,
        );
        let max_filename_length = numeric_or(
            parsed("DMARC_MAX_FILENAME_LENGTH"),
            defaults.max_filename_length,
        );

        // Unknown variants are a configuration error.
        let schema = match parsed("DMARC_SCHEMA") {
            Some(value) => value.parse::<SchemaVariant>().map_err(anyhow::Error::msg)?,
            None => defaults.schema,
        };

        Ok(Config {
            max_file_size,
            max_decompressed_size,
            max_files_in_zip,
            max_compression_ratio,
            max_filename_length,
            schema,
        })
    }

    /// Column layout for the configured schema variant.
    pub fn column_schema(&self) -> ColumnSchema {
        ColumnSchema::new(self.schema)
    }
}

fn numeric_or<T: FromStr>(value: Option<String>, default: T) -> T {
    value.and_then(|s| s.parse().ok()).unwrap_or(default)
}
