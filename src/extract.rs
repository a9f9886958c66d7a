//! Report Extraction Module
//!
//! This module reads a DMARC report from disk and unwraps it from its container:
//! a ZIP archive (detected by its magic bytes), a GZIP file (`.gz` in the file
//! name) or plain XML (`.xml` in the file name). It enforces the configured
//! limits on input size, decompressed size, archive entry count, compression
//! ratio and entry name length, and rejects path traversal in entry names.
use crate::config::Config;
use crate::error::{DmarcError, Result};
use flate2::read::GzDecoder;
use std::fs::File;
use std::io::{Cursor, Read};
use std::path::Path;
use zip::ZipArchive;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const EMPTY_ZIP_MAGIC: &[u8] = b"PK\x05\x06";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Zip,
    Gzip,
    Xml,
}

/// Decides how a report is wrapped: archive content first, then the file name.
///
/// Content counts as a ZIP archive when it starts with a local header or when
/// its central directory can be located, which also covers archives with
/// leading bytes.
pub fn detect_container(path: &Path, contents: &[u8]) -> Result<ContainerKind> {
    if contents.starts_with(ZIP_MAGIC) || contents.starts_with(EMPTY_ZIP_MAGIC) {
        return Ok(ContainerKind::Zip);
    }
    if ZipArchive::new(Cursor::new(contents)).is_ok() {
        log::debug!("Found a ZIP central directory past the start of {}", path.display());
        return Ok(ContainerKind::Zip);
    }
    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_lowercase())
        .unwrap_or_default();
    if file_name.contains(".gz") {
        Ok(ContainerKind::Gzip)
    } else if file_name.contains(".xml") {
        Ok(ContainerKind::Xml)
    } else {
        Err(DmarcError::UnsupportedFile(format!(
            "Extension not supported: {}",
            path.display()
        )))
    }
}

/// Reads the report at `file_path` and returns its XML text.
///
/// # Security Checks
///
/// - The input file may not exceed `max_file_size`.
/// - For ZIP archives: entry count, path traversal, entry name length,
///   compression ratio and decompressed size of the first entry.
/// - For GZIP files: decompressed size.
pub fn extract_report<P: AsRef<Path>>(file_path: P, config: &Config) -> Result<String> {
    let path = file_path.as_ref();
    let file = File::open(path)?;
    let file_size = file.metadata()?.len();
    if file_size > config.max_file_size as u64 {
        return Err(DmarcError::FileTooLarge(format!(
            "File size {} bytes exceeds limit of {} bytes",
            file_size, config.max_file_size
        )));
    }
    let mut contents = Vec::with_capacity(file_size as usize);
    file.take(config.max_file_size as u64 + 1)
        .read_to_end(&mut contents)?;
    if contents.len() > config.max_file_size {
        return Err(DmarcError::FileTooLarge("File too large".to_string()));
    }

    let kind = detect_container(path, &contents)?;
    log::info!("Reading {} as {:?}", path.display(), kind);
    let xml = match kind {
        ContainerKind::Zip => extract_first_entry(contents, config)?,
        ContainerKind::Gzip => gunzip(&contents, config)?,
        ContainerKind::Xml => contents,
    };
    String::from_utf8(xml)
        .map_err(|e| DmarcError::Format(format!("Report is not valid UTF-8: {}", e)))
}

fn extract_first_entry(contents: Vec<u8>, config: &Config) -> Result<Vec<u8>> {
    let mut archive = ZipArchive::new(Cursor::new(contents))?;
    if archive.len() > config.max_files_in_zip {
        return Err(DmarcError::Format("Too many files in archive".to_string()));
    }
    if archive.len() == 0 {
        return Err(DmarcError::Format("Archive contains no files".to_string()));
    }
    if archive.len() > 1 {
        log::warn!("Archive holds {} entries, reading only the first", archive.len());
    }

    let entry = archive.by_index(0)?;
    let inner_name = entry.name().to_string();
    // Prevent path traversal
    if inner_name.contains("..") || inner_name.starts_with('/') || inner_name.starts_with('\\') {
        return Err(DmarcError::Format(format!(
            "Path traversal attempt detected: {}",
            inner_name
        )));
    }
    if inner_name.len() > config.max_filename_length {
        return Err(DmarcError::Format("Filename too long".to_string()));
    }
    let compressed_size = entry.compressed_size();
    let uncompressed_size = entry.size();
    if compressed_size > 0 {
        let compression_ratio = uncompressed_size as f64 / compressed_size as f64;
        if compression_ratio > config.max_compression_ratio {
            return Err(DmarcError::Format(format!(
                "Suspicious compression ratio: {:.2}",
                compression_ratio
            )));
        }
    }
    if uncompressed_size > config.max_decompressed_size as u64 {
        return Err(DmarcError::FileTooLarge(
            "Total decompressed size too large".to_string(),
        ));
    }
    log::debug!("Extracting {} ({} bytes)", inner_name, uncompressed_size);
    read_capped(entry, config.max_decompressed_size)
}

fn gunzip(contents: &[u8], config: &Config) -> Result<Vec<u8>> {
    read_capped(GzDecoder::new(contents), config.max_decompressed_size)
}

/// Reads at most `limit` bytes, failing when the source holds more.
fn read_capped<R: Read>(reader: R, limit: usize) -> Result<Vec<u8>> {
    let mut out = Vec::new();
    reader.take(limit as u64 + 1).read_to_end(&mut out)?;
    if out.len() > limit {
        return Err(DmarcError::FileTooLarge(
            "Decompressed size too large".to_string(),
        ));
    }
    Ok(out)
}
