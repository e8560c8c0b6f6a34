//! Row caches let the write pass replay the fieldname pass instead of
//! walking the source a second time.
//!
//! A cache is offered every row of the first pass. Once it cannot hold the
//! whole pass it says so and `replay` returns `None`; the caller then
//! re-opens the source.

use crate::error::{Error, Result};
use crate::types::Row;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Seek, SeekFrom, Write};
use tracing::{debug, warn};

pub type RowStream<'a> = Box<dyn Iterator<Item = Result<Row>> + 'a>;

pub trait RowCache {
    fn name(&self) -> &'static str;

    /// Forget everything recorded so far
    fn reset(&mut self) -> Result<()>;

    /// Record a row of the first pass. Returns `false` once the pass no
    /// longer fits.
    fn offer(&mut self, row: &Row) -> Result<bool>;

    /// The recorded pass, or `None` if it did not fit
    fn replay(&mut self) -> Result<Option<RowStream<'_>>>;
}

/// Never holds anything; every pass goes back to the source
#[derive(Debug, Default)]
pub struct NoCache;

impl RowCache for NoCache {
    fn name(&self) -> &'static str {
        "none"
    }

    fn reset(&mut self) -> Result<()> {
        Ok(())
    }

    fn offer(&mut self, _row: &Row) -> Result<bool> {
        Ok(false)
    }

    fn replay(&mut self) -> Result<Option<RowStream<'_>>> {
        Ok(None)
    }
}

/// Keeps up to `capacity` rows in memory
#[derive(Debug)]
pub struct MemoryCache {
    capacity: usize,
    rows: Vec<Row>,
    overflowed: bool,
}

impl MemoryCache {
    pub fn new(capacity: usize) -> Self {
        MemoryCache {
            capacity,
            rows: Vec::new(),
            overflowed: false,
        }
    }
}

impl RowCache for MemoryCache {
    fn name(&self) -> &'static str {
        "memory"
    }

    fn reset(&mut self) -> Result<()> {
        self.rows.clear();
        self.overflowed = false;
        Ok(())
    }

    fn offer(&mut self, row: &Row) -> Result<bool> {
        if self.overflowed {
            return Ok(false);
        }
        if self.rows.len() >= self.capacity {
            warn!(capacity = self.capacity, "row cache full; the source will be read again");
            self.rows = Vec::new();
            self.overflowed = true;
            return Ok(false);
        }
        self.rows.push(row.clone());
        Ok(true)
    }

    fn replay(&mut self) -> Result<Option<RowStream<'_>>> {
        if self.overflowed {
            return Ok(None);
        }
        debug!(rows = self.rows.len(), "replaying rows from memory");
        Ok(Some(Box::new(self.rows.iter().cloned().map(Ok))))
    }
}

/// Spills rows as JSON lines to an anonymous temporary file
#[derive(Debug)]
pub struct SpillCache {
    capacity: usize,
    file: Option<BufWriter<File>>,
    rows: usize,
    overflowed: bool,
    spent: bool,
}

impl SpillCache {
    pub fn new(capacity: usize) -> Self {
        SpillCache {
            capacity,
            file: None,
            rows: 0,
            overflowed: false,
            spent: false,
        }
    }
}

impl RowCache for SpillCache {
    fn name(&self) -> &'static str {
        "spill"
    }

    fn reset(&mut self) -> Result<()> {
        self.file = Some(BufWriter::new(tempfile::tempfile()?));
        self.rows = 0;
        self.overflowed = false;
        self.spent = false;
        Ok(())
    }

    fn offer(&mut self, row: &Row) -> Result<bool> {
        if self.overflowed {
            return Ok(false);
        }
        if self.rows >= self.capacity {
            warn!(capacity = self.capacity, "spill file full; the source will be read again");
            self.file = None;
            self.overflowed = true;
            return Ok(false);
        }
        if self.file.is_none() {
            self.reset()?;
        }

        let Some(file) = self.file.as_mut() else {
            return Err(Error::cache("spill file is not open"));
        };
        serde_json::to_writer(&mut *file, row)
            .map_err(|e| Error::cache(format!("failed to spill row: {}", e)))?;
        file.write_all(b"\n")?;
        self.rows += 1;
        Ok(true)
    }

    fn replay(&mut self) -> Result<Option<RowStream<'_>>> {
        // The spill file is read once; a second replay needs a fresh pass
        if self.overflowed || self.spent {
            return Ok(None);
        }
        self.spent = true;

        // Nothing offered at all is still a complete, empty pass
        let Some(writer) = self.file.take() else {
            return Ok(Some(Box::new(std::iter::empty())));
        };

        let mut file = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
        file.seek(SeekFrom::Start(0))?;
        debug!(rows = self.rows, "replaying rows from spill file");

        let lines = BufReader::new(file).lines().enumerate();
        Ok(Some(Box::new(lines.map(|(i, line)| -> Result<Row> {
            let line = line?;
            serde_json::from_str::<Row>(&line)
                .map_err(|e| Error::cache(format!("corrupt spill record {}: {}", i + 1, e)))
        }))))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: serde_json::Value) -> Row {
        serde_json::from_value(value).unwrap()
    }

    fn replayed(cache: &mut dyn RowCache) -> Option<Vec<Row>> {
        cache
            .replay()
            .unwrap()
            .map(|rows| rows.map(|r| r.unwrap()).collect())
    }

    #[test]
    fn test_memory_cache_replays_in_order() {
        let mut cache = MemoryCache::new(10);
        cache.reset().unwrap();
        assert!(cache.offer(&row(json!({"id": 1}))).unwrap());
        assert!(cache.offer(&row(json!({"id": 2}))).unwrap());

        let rows = replayed(&mut cache).unwrap();
        assert_eq!(rows, vec![row(json!({"id": 1})), row(json!({"id": 2}))]);
    }

    #[test]
    fn test_memory_cache_overflow() {
        let mut cache = MemoryCache::new(1);
        assert!(cache.offer(&row(json!({"id": 1}))).unwrap());
        assert!(!cache.offer(&row(json!({"id": 2}))).unwrap());
        assert!(!cache.offer(&row(json!({"id": 3}))).unwrap());
        assert!(replayed(&mut cache).is_none());

        cache.reset().unwrap();
        assert!(cache.offer(&row(json!({"id": 4}))).unwrap());
        assert_eq!(replayed(&mut cache).unwrap().len(), 1);
    }

    #[test]
    fn test_spill_cache_keeps_field_order() {
        let mut cache = SpillCache::new(10);
        cache.reset().unwrap();
        let original = row(json!({"zeta": "z", "alpha": 1, "mid.2": true}));
        assert!(cache.offer(&original).unwrap());

        let rows = replayed(&mut cache).unwrap();
        assert_eq!(rows.len(), 1);
        let keys: Vec<_> = rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["zeta", "alpha", "mid.2"]);
    }

    #[test]
    fn test_spill_cache_overflow_and_empty() {
        let mut cache = SpillCache::new(0);
        assert!(replayed(&mut cache).unwrap().is_empty());
        assert!(!cache.offer(&row(json!({"id": 1}))).unwrap());
        assert!(replayed(&mut cache).is_none());
    }

    #[test]
    fn test_no_cache() {
        let mut cache = NoCache;
        assert!(!cache.offer(&row(json!({"id": 1}))).unwrap());
        assert!(replayed(&mut cache).is_none());
    }
}
