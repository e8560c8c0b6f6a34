//! Leaf stream sources
//!
//! A source produces the `(path, value)` pairs of one document walk. Every
//! call to [`StreamSource::open`] starts a fresh, independent pass.

use crate::error::{Error, Result};
use crate::types::LeafPair;
use std::fs::File;
use std::io::{BufRead, BufReader, Lines};
use std::path::PathBuf;

pub mod jq;
pub mod native;

pub use jq::JqSource;
pub use native::NativeSource;

pub type LeafStream = Box<dyn Iterator<Item = Result<LeafPair>>>;

pub trait StreamSource {
    /// Human readable name for logs
    fn describe(&self) -> String;

    /// Start a new pass over the document
    fn open(&self) -> Result<LeafStream>;
}

impl<S: StreamSource + ?Sized> StreamSource for Box<S> {
    fn describe(&self) -> String {
        (**self).describe()
    }

    fn open(&self) -> Result<LeafStream> {
        (**self).open()
    }
}

/// An in-memory pair list; each pass replays a copy
impl StreamSource for Vec<LeafPair> {
    fn describe(&self) -> String {
        format!("{} in-memory pairs", self.len())
    }

    fn open(&self) -> Result<LeafStream> {
        Ok(Box::new(self.clone().into_iter().map(Ok)))
    }
}

/// Parses `[path, value]` lines from a reader. Blank lines are skipped.
pub struct PairLines<R> {
    lines: Lines<R>,
    line_no: usize,
}

impl<R: BufRead> PairLines<R> {
    pub fn new(reader: R) -> Self {
        PairLines {
            lines: reader.lines(),
            line_no: 0,
        }
    }

    /// Number of lines read so far
    pub fn line_no(&self) -> usize {
        self.line_no
    }
}

impl<R: BufRead> Iterator for PairLines<R> {
    type Item = Result<LeafPair>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let line = self.lines.next()?;
            self.line_no += 1;
            let line = match line {
                Ok(line) => line,
                Err(source) => {
                    return Some(Err(Error::ReadLine {
                        line: self.line_no,
                        source,
                    }))
                }
            };

            if line.trim().is_empty() {
                continue;
            }

            return Some(LeafPair::from_line(&line).map_err(|source| Error::Parse {
                line: self.line_no,
                source,
            }));
        }
    }
}

/// A file that already holds `jq --stream` output, one pair per line
#[derive(Debug, Clone)]
pub struct PairsFile {
    path: PathBuf,
}

impl PairsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        PairsFile { path: path.into() }
    }
}

impl StreamSource for PairsFile {
    fn describe(&self) -> String {
        format!("pairs file {}", self.path.display())
    }

    fn open(&self) -> Result<LeafStream> {
        let file = File::open(&self.path).map_err(|source| Error::InputOpen {
            path: self.path.clone(),
            source,
        })?;
        Ok(Box::new(PairLines::new(BufReader::new(file))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::io::{Cursor, Write};

    #[test]
    fn test_pair_lines() {
        let input = "[[\"a\"],1]\n\n[[\"b\",0],\"x\"]\n";
        let pairs: Vec<_> = PairLines::new(Cursor::new(input))
            .map(|p| p.unwrap())
            .collect();

        assert_eq!(pairs.len(), 2);
        assert_eq!(pairs[0].value, json!(1));
        assert_eq!(pairs[1].path.to_string(), "b.0");
    }

    #[test]
    fn test_pair_lines_reports_line_number() {
        let input = "[[\"a\"],1]\n[[\"a\"]]\n";
        let mut lines = PairLines::new(Cursor::new(input));
        assert!(lines.next().unwrap().is_ok());

        match lines.next() {
            Some(Err(Error::Parse { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_unreadable_line_reports_line_number() {
        let input: &[u8] = b"[[\"a\"],1]\n[[\"b\"],\"\xff\"]\n";
        let mut lines = PairLines::new(Cursor::new(input));
        assert!(lines.next().unwrap().is_ok());

        match lines.next() {
            Some(Err(Error::ReadLine { line, .. })) => assert_eq!(line, 2),
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_pairs_file_reopens() {
        let mut tmp = tempfile::NamedTempFile::new().unwrap();
        writeln!(tmp, "[[\"id\"],1]").unwrap();
        writeln!(tmp, "[[\"id\"],2]").unwrap();

        let source = PairsFile::new(tmp.path());
        assert_eq!(source.open().unwrap().count(), 2);
        assert_eq!(source.open().unwrap().count(), 2);
    }

    #[test]
    fn test_missing_pairs_file() {
        let source = PairsFile::new("/definitely/not/here.jsonl");
        assert!(matches!(source.open(), Err(Error::InputOpen { .. })));
    }
}
