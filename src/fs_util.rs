use std::fs;
use std::io::{Read, Write};

use camino::Utf8Path;
use flate2::read::GzDecoder;
use serde::Serialize;

use crate::error::KiraError;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn is_gzip(bytes: &[u8]) -> bool {
    bytes.starts_with(&GZIP_MAGIC)
}

/// Inflates gzip payloads; anything else is returned as is.
pub fn decompress(bytes: Vec<u8>) -> Result<Vec<u8>, KiraError> {
    if !is_gzip(&bytes) {
        return Ok(bytes);
    }
    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut out = Vec::with_capacity(bytes.len() * 4);
    decoder
        .read_to_end(&mut out)
        .map_err(|err| KiraError::Filesystem(format!("gzip decode: {err}")))?;
    Ok(out)
}

pub fn write_bytes_atomic(path: &Utf8Path, content: &[u8]) -> Result<(), KiraError> {
    let mut temp = temp_sibling(path)?;
    temp.write_all(content)
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    persist(temp, path)
}

/// Writes `rows` as a CSV file with a header row, replacing `path` atomically.
pub fn write_csv_atomic<T: Serialize>(path: &Utf8Path, rows: &[T]) -> Result<(), KiraError> {
    let temp = temp_sibling(path)?;
    let mut writer = csv::Writer::from_writer(temp);
    for row in rows {
        writer
            .serialize(row)
            .map_err(|err| KiraError::Filesystem(format!("csv {path}: {err}")))?;
    }
    let temp = writer
        .into_inner()
        .map_err(|err| KiraError::Filesystem(format!("csv {path}: {err}")))?;
    persist(temp, path)
}

fn temp_sibling(path: &Utf8Path) -> Result<tempfile::NamedTempFile, KiraError> {
    let parent = path
        .parent()
        .filter(|parent| !parent.as_str().is_empty())
        .unwrap_or(Utf8Path::new("."));
    fs::create_dir_all(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    tempfile::Builder::new()
        .prefix("kira-sl-file")
        .tempfile_in(parent.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))
}

fn persist(temp: tempfile::NamedTempFile, path: &Utf8Path) -> Result<(), KiraError> {
    temp.persist(path.as_std_path())
        .map_err(|err| KiraError::Filesystem(err.to_string()))?;
    Ok(())
}
