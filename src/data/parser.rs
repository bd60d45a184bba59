use std::fs;
use std::path::{Path, PathBuf};

use log::warn;
use thiserror::Error;

use super::meta::MetadataExtractor;
use super::model::{FileMeta, SweepRow, SweepTable};

// ---------------------------------------------------------------------------
// Per-file failure modes
// ---------------------------------------------------------------------------

/// Why a single measurement file was rejected. Never fatal to a batch: the
/// session logs these and moves on to the next file.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("cannot read {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path}: contains NUL bytes, not text in any supported encoding")]
    Encoding { path: PathBuf },
    #[error("{path}: no line has at least 3 columns")]
    EmptyAfterFilter { path: PathBuf },
    #[error("{path}: no line has 3 parseable numeric columns")]
    InsufficientColumns { path: PathBuf },
}

/// Structural failure of the text itself, independent of any path.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextError {
    EmptyAfterFilter,
    InsufficientColumns,
}

impl TextError {
    fn at(self, path: &Path) -> ParseError {
        let path = path.to_path_buf();
        match self {
            TextError::EmptyAfterFilter => ParseError::EmptyAfterFilter { path },
            TextError::InsufficientColumns => ParseError::InsufficientColumns { path },
        }
    }
}

// ---------------------------------------------------------------------------
// Public entry-point
// ---------------------------------------------------------------------------

/// A successfully parsed measurement file.
#[derive(Debug, Clone)]
pub struct ParsedSweep {
    pub meta: FileMeta,
    pub table: SweepTable,
}

/// Parse one measurement file into a sweep table plus filename metadata.
pub fn parse(path: &Path, extractor: &dyn MetadataExtractor) -> Result<ParsedSweep, ParseError> {
    let bytes = fs::read(path).map_err(|source| ParseError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let text = decode(&bytes, path)?;
    let table = parse_text(&text).map_err(|e| e.at(path))?;
    Ok(ParsedSweep {
        meta: extractor.extract(path),
        table,
    })
}

/// UTF-8 first, ISO-8859-1 as the permissive fallback. Bytes containing NUL
/// are rejected as non-text rather than decoded into garbage.
fn decode(bytes: &[u8], path: &Path) -> Result<String, ParseError> {
    if bytes.contains(&0) {
        return Err(ParseError::Encoding {
            path: path.to_path_buf(),
        });
    }
    match std::str::from_utf8(bytes) {
        Ok(s) => Ok(s.to_string()),
        Err(_) => {
            warn!("{}: not valid UTF-8, decoding as ISO-8859-1", path.display());
            Ok(bytes.iter().map(|&b| b as char).collect())
        }
    }
}

// ---------------------------------------------------------------------------
// Text → SweepTable
// ---------------------------------------------------------------------------

/// Parse decoded file text into a sweep table. Pure, so tests never touch
/// the filesystem.
///
/// Instruments in comma-decimal locales write `1,25e-9`; every comma in the
/// raw text becomes a dot before any structural parsing, so input files must
/// not contain commas outside numeric fields.
pub fn parse_text(text: &str) -> Result<SweepTable, TextError> {
    let text = text.replace(',', ".");

    let survivors: Vec<&str> = text
        .lines()
        .filter(|line| line.split_whitespace().count() >= 3)
        .collect();
    if survivors.is_empty() {
        return Err(TextError::EmptyAfterFilter);
    }

    let mut rows = Vec::with_capacity(survivors.len());
    for line in survivors {
        // Only the first three columns matter; extra columns are ignored.
        // Rows where any kept field is non-numeric or NaN are dropped.
        let mut cols = line.split_whitespace();
        let mut field = || -> Option<f64> {
            cols.next()?.parse::<f64>().ok().filter(|v| !v.is_nan())
        };
        if let (Some(voltage), Some(c_forward), Some(c_backward)) = (field(), field(), field()) {
            rows.push(SweepRow {
                voltage,
                c_forward,
                c_backward,
            });
        }
    }

    if rows.is_empty() {
        return Err(TextError::InsufficientColumns);
    }
    Ok(SweepTable { rows })
}
