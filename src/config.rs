//! Run configuration: the tracked columns, which of them is the uid, and the
//! defaults the command-line tool falls back on.

use crate::error::{Error, Result};
use crate::melt::{MemoryCache, NoCache, RowCache, SpillCache};
use crate::source::{JqSource, NativeSource, PairsFile, StreamSource};
use clap::ValueEnum;
use once_cell::sync::Lazy;
use regex::Regex;
use std::path::Path;

/// Document read when no input is given
pub const DEFAULT_INPUT: &str = "json/test.json";

/// Where the CSV lands when no output is given
pub const DEFAULT_OUTPUT: &str = "csv/jq-out.csv";

/// Columns that match the bundled sample document
pub const SAMPLE_COLUMNS: [&str; 4] = ["balance", "eyeColor", "company", "name"];

/// Rows held by the replay cache before it gives up
pub const DEFAULT_CACHE_ROWS: usize = 100_000;

static COLUMN_SEPARATOR: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s*,\s*").unwrap());

/// The ordered set of target column names plus the designated uid column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnSpec {
    columns: Vec<String>,
    uid: String,
}

impl ColumnSpec {
    /// Build a spec. The uid defaults to the first column.
    pub fn new(columns: Vec<String>, uid: Option<String>) -> Result<Self> {
        if columns.is_empty() {
            return Err(Error::config("at least one column is required"));
        }

        for (i, column) in columns.iter().enumerate() {
            if column.is_empty() {
                return Err(Error::config("column names must not be empty"));
            }
            if columns[..i].contains(column) {
                return Err(Error::config(format!("column `{}` is listed twice", column)));
            }
        }

        let uid = match uid {
            Some(uid) if !uid.is_empty() => uid,
            _ => columns[0].clone(),
        };

        if !columns.contains(&uid) {
            return Err(Error::config(format!(
                "uid `{}` is not one of the columns ({})",
                uid,
                columns.join(", ")
            )));
        }

        Ok(ColumnSpec { columns, uid })
    }

    /// Parse a comma separated column list such as `"id, name"`
    pub fn parse(list: &str, uid: Option<&str>) -> Result<Self> {
        let list = list.trim();
        let columns = if list.is_empty() {
            Vec::new()
        } else {
            COLUMN_SEPARATOR.split(list).map(str::to_string).collect()
        };
        Self::new(columns, uid.map(str::to_string))
    }

    /// Resolve the columns the way the command-line tool does: an explicit
    /// list wins, otherwise the sample columns apply to the sample document.
    pub fn resolve(list: Option<&str>, uid: Option<&str>, input: &Path) -> Result<Self> {
        match list {
            Some(list) => Self::parse(list, uid),
            None if input == Path::new(DEFAULT_INPUT) => Self::new(
                SAMPLE_COLUMNS.iter().map(|c| c.to_string()).collect(),
                uid.map(str::to_string),
            ),
            None => Err(Error::config(format!(
                "no columns given for {}",
                input.display()
            ))),
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn uid(&self) -> &str {
        &self.uid
    }

    /// The tracked column with this name, borrowed from the spec
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.columns.iter().find(|c| *c == name).map(String::as_str)
    }

    pub fn is_uid(&self, name: &str) -> bool {
        self.uid == name
    }
}

/// How the leaf stream is produced
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum SourceKind {
    /// Run `jq --stream` on the input document
    Jq,
    /// Walk the input document in-process
    Native,
    /// The input already holds `[path, value]` lines
    Pairs,
}

/// Settings needed to build a stream source
#[derive(Debug, Clone)]
pub struct SourceSettings<'a> {
    pub kind: SourceKind,
    pub input: &'a Path,
    pub jq_program: &'a str,
    pub unbuffered: bool,
}

impl SourceSettings<'_> {
    pub fn build(&self) -> Box<dyn StreamSource> {
        match self.kind {
            SourceKind::Jq => Box::new(
                JqSource::new(self.input)
                    .with_program(self.jq_program)
                    .with_unbuffered(self.unbuffered),
            ),
            SourceKind::Native => Box::new(NativeSource::new(self.input)),
            SourceKind::Pairs => Box::new(PairsFile::new(self.input)),
        }
    }
}

/// Where the first pass is kept for the second
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum CacheKind {
    /// Read the source again for the write pass
    None,
    /// Hold rows in memory
    Memory,
    /// Spill rows to a temporary file
    Spill,
}

impl CacheKind {
    pub fn build(self, capacity: usize) -> Box<dyn RowCache> {
        match self {
            CacheKind::None => Box::new(NoCache),
            CacheKind::Memory => Box::new(MemoryCache::new(capacity)),
            CacheKind::Spill => Box::new(SpillCache::new(capacity)),
        }
    }
}
