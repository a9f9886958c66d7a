//! dmarcview - DMARC aggregate report viewer
//!
//! Reads a DMARC aggregate report (plain XML, GZIP or ZIP), flattens every
//! record into one row per DKIM signing result and prints the rows as a table
//! sorted by the chosen column.

use anyhow::{Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser};
use colored::Colorize;
use dmarcview::columns::ColumnRegistry;
use dmarcview::error::DmarcError;
use dmarcview::schema::DEFAULT_SORT_COLUMN;
use dmarcview::table::render_table;
use dmarcview::{extract_report, Config, DmarcReport};
use std::path::PathBuf;

/// CLI arguments for dmarcview.
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Process DMARC reports",
    long_about = "Flattens a DMARC aggregate report (.xml, .gz or .zip) into one row per \
                  DKIM signing result and prints it as a table sorted by the chosen column."
)]
struct Cli {
    /// Sort by column name
    #[arg(short = 's', long = "sort-by-column", default_value = DEFAULT_SORT_COLUMN)]
    sort_by_column: String,

    /// Sort in reverse order
    #[arg(short = 'r', long = "reverse")]
    reverse: bool,

    /// Path to the DMARC report
    #[arg(value_parser)]
    file: PathBuf,
}

/// Exits through clap so argument problems look and exit like usage errors.
fn argument_error(message: impl std::fmt::Display) -> ! {
    Cli::command().error(ErrorKind::InvalidValue, message).exit()
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let config = Config::new().context("Failed to load configuration")?;
    let schema = config.column_schema();
    log::debug!("Using {} report schema", schema.variant());

    // Column names are checked before the file is touched.
    let registry = ColumnRegistry::new(&schema);
    if let Err(err) = registry.resolve(&cli.sort_by_column) {
        argument_error(err);
    }

    log::info!("Processing file: {}", cli.file.display());
    let xml = match extract_report(&cli.file, &config) {
        Ok(xml) => xml,
        Err(DmarcError::UnsupportedFile(message)) => argument_error(message),
        Err(err) => {
            return Err(anyhow::Error::new(err).context(format!("Failed to read {}", cli.file.display())))
        }
    };

    let report = DmarcReport::from_xml(&xml, schema.clone()).context("Failed to parse DMARC report")?;
    let rows = report
        .plain(&cli.sort_by_column, cli.reverse)
        .context("Failed to sort report rows")?;

    if rows.is_empty() {
        eprintln!("{}", "No DMARC records found.".yellow());
    }
    print!("{}", render_table(&registry, &rows));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_defaults() {
        let cli = Cli::try_parse_from(["dmarcview", "report.xml"]).unwrap();
        assert_eq!(cli.sort_by_column, "Count");
        assert!(!cli.reverse);
        assert_eq!(cli.file, PathBuf::from("report.xml"));
    }

    #[test]
    fn test_cli_flags() {
        let cli = Cli::try_parse_from(["dmarcview", "-s", "SourceIP", "-r", "report.zip"]).unwrap();
        assert_eq!(cli.sort_by_column, "SourceIP");
        assert!(cli.reverse);
        let cli = Cli::try_parse_from(["dmarcview", "--sort-by-column", "Pct", "--reverse", "r.gz"]).unwrap();
        assert_eq!(cli.sort_by_column, "Pct");
        assert!(Cli::try_parse_from(["dmarcview"]).is_err());
        assert!(Cli::try_parse_from(["dmarcview", "--output", "json", "r.xml"]).is_err());
    }

    #[test]
    fn verify_cli() {
        Cli::command().debug_assert();
    }
}
