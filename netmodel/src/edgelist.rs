//! Reading the two column edge list that every analysis starts from.
//!
//! The input is a delimited file (tabs by default) whose first row is a
//! header and is discarded. Every other row holds one association between
//! two identifiers, e.g. a drug and a gene accession.

use csv::{ReaderBuilder, StringRecord, Trim};
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Error type for reading in an edge list.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Could not open edge list at {}: {source}", path.display())]
    InputNotFound { path: PathBuf, source: csv::Error },
    #[error("Problem reading row of the edge list: {source}")]
    InputMalformed { source: csv::Error },
    #[error("Line {line} has {fields} fields, an edge list has exactly two columns.")]
    TooManyFields { line: u64, fields: usize },
}

/// Why a row was left out of the edge list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// The row had fewer than two fields.
    MissingField,
    /// A field was blank.
    EmptyField,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkipReason::MissingField => write!(f, "missing field"),
            SkipReason::EmptyField => write!(f, "empty field"),
        }
    }
}

/// A row that was dropped before graph construction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkippedRow {
    /// 1-based line number in the input.
    pub line: u64,
    pub reason: SkipReason,
}

/// An identifier is just a `String`.
pub type Identifier = String;

/// The valid pairs of an edge list, plus the rows that
/// were skipped on the way.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct EdgeList {
    pub pairs: Vec<(Identifier, Identifier)>,
    pub skipped: Vec<SkippedRow>,
}

impl EdgeList {
    /// Read an edge list from a delimited file on disk.
    pub fn from_dsv<P: AsRef<Path>>(input: P, delimiter: u8) -> Result<Self, LoadError> {
        let input = input.as_ref();
        let rdr = Self::builder(delimiter)
            .from_path(input)
            .map_err(|source| LoadError::InputNotFound {
                path: input.to_path_buf(),
                source,
            })?;
        Self::from_csv(rdr)
    }

    /// Read an edge list from anything implementing `Read`.
    pub fn from_reader<R: Read>(reader: R, delimiter: u8) -> Result<Self, LoadError> {
        Self::from_csv(Self::builder(delimiter).from_reader(reader))
    }

    fn builder(delimiter: u8) -> ReaderBuilder {
        let mut builder = ReaderBuilder::new();
        // the header is always discarded, and short rows are
        // dealt with below rather than by csv.
        builder
            .delimiter(delimiter)
            .has_headers(true)
            .flexible(true)
            .trim(Trim::All);
        builder
    }

    fn from_csv<R: Read>(mut rdr: csv::Reader<R>) -> Result<Self, LoadError> {
        let mut edge_list = EdgeList::default();

        for result in rdr.records() {
            let record = result.map_err(|source| LoadError::InputMalformed { source })?;
            let line = record.position().map(|p| p.line()).unwrap_or_default();

            if record.len() > 2 {
                return Err(LoadError::TooManyFields {
                    line,
                    fields: record.len(),
                });
            }

            match parse_row(&record) {
                Ok(pair) => edge_list.pairs.push(pair),
                Err(reason) => {
                    log::warn!("Skipping line {} of the edge list: {}", line, reason);
                    edge_list.skipped.push(SkippedRow { line, reason });
                }
            }
        }

        log::info!(
            "Read {} pairs from the edge list ({} rows skipped)",
            edge_list.pairs.len(),
            edge_list.skipped.len()
        );
        Ok(edge_list)
    }

    /// Number of valid pairs.
    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}

/// A row of blank fields counts as empty, even with a single field.
fn parse_row(record: &StringRecord) -> Result<(Identifier, Identifier), SkipReason> {
    if record.iter().all(str::is_empty) {
        return Err(SkipReason::EmptyField);
    }
    match (record.get(0), record.get(1)) {
        (Some(a), Some(b)) if !a.is_empty() && !b.is_empty() => {
            Ok((a.to_string(), b.to_string()))
        }
        (Some(_), Some(_)) => Err(SkipReason::EmptyField),
        _ => Err(SkipReason::MissingField),
    }
}
