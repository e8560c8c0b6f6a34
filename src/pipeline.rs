//! The two-pass run: collect the header, then write the rows.

use crate::config::ColumnSpec;
use crate::error::Result;
use crate::melt::{assemble, CsvEmitter, Fieldnames, LeafFilter, NoCache, RowAssembler, RowCache};
use crate::source::{LeafStream, StreamSource};
use std::io::Write;
use std::path::Path;
use std::time::{Duration, Instant};
use tracing::{debug, info};

/// Rows of one pass, straight from the source
pub type Rows = RowAssembler<LeafFilter<LeafStream>>;

/// What a run produced and how long each pass took
#[derive(Debug, Clone)]
pub struct RunReport {
    pub fieldnames: Vec<String>,
    pub rows_written: usize,
    pub fieldname_pass: Duration,
    pub write_pass: Duration,
    /// Whether the write pass was served from the row cache
    pub replayed: bool,
}

pub struct Smelter<S> {
    source: S,
    spec: ColumnSpec,
    cache: Box<dyn RowCache>,
}

impl<S: StreamSource> Smelter<S> {
    /// A smelter that reads the source once per pass
    pub fn new(source: S, spec: ColumnSpec) -> Self {
        Smelter {
            source,
            spec,
            cache: Box::new(NoCache),
        }
    }

    pub fn with_cache(mut self, cache: Box<dyn RowCache>) -> Self {
        self.cache = cache;
        self
    }

    /// Start a fresh pass over the source
    pub fn rows(&self) -> Result<Rows> {
        open_pass(&self.source, &self.spec)
    }

    /// First pass: the sorted union of all field keys. Rows are offered to
    /// the cache on the way through.
    pub fn fieldnames(&mut self) -> Result<Fieldnames> {
        self.cache.reset()?;
        let mut fieldnames = Fieldnames::new();
        let mut caching = true;
        let mut rows = 0usize;

        for row in open_pass(&self.source, &self.spec)? {
            let row = row?;
            fieldnames.observe(&row);
            if caching {
                caching = self.cache.offer(&row)?;
            }
            rows += 1;
        }

        debug!(rows, fields = fieldnames.len(), cached = caching, "fieldname pass done");
        Ok(fieldnames)
    }

    /// Second pass: write every row under the given header. Returns the
    /// number of rows written and whether the cache served them.
    pub fn write_rows<W: Write>(&mut self, emitter: &mut CsvEmitter<W>) -> Result<(usize, bool)> {
        let cache = self.cache.name();
        match self.cache.replay()? {
            Some(rows) => {
                debug!(cache, "write pass replays cached rows");
                Ok((emitter.write_rows(rows)?, true))
            }
            None => {
                debug!(source = %self.source.describe(), "write pass re-reads the source");
                Ok((emitter.write_rows(open_pass(&self.source, &self.spec)?)?, false))
            }
        }
    }

    /// Run both passes into the CSV file at `output`, truncating it
    pub fn run<P: AsRef<Path>>(&mut self, output: P) -> Result<RunReport> {
        let output = output.as_ref();
        self.run_with(|fieldnames| CsvEmitter::create(output, fieldnames))
    }

    /// Run both passes into any writer
    pub fn run_to_writer<W: Write>(&mut self, writer: W) -> Result<RunReport> {
        self.run_with(|fieldnames| CsvEmitter::new(writer, fieldnames))
    }

    fn run_with<W, F>(&mut self, make_emitter: F) -> Result<RunReport>
    where
        W: Write,
        F: FnOnce(&Fieldnames) -> Result<CsvEmitter<W>>,
    {
        info!(
            source = %self.source.describe(),
            columns = %self.spec.columns().join(","),
            uid = %self.spec.uid(),
            "smelting"
        );

        let start = Instant::now();
        let fieldnames = self.fieldnames()?;
        let fieldname_pass = start.elapsed();

        let start = Instant::now();
        let mut emitter = make_emitter(&fieldnames)?;
        let (rows_written, replayed) = self.write_rows(&mut emitter)?;
        emitter.finish()?;
        let write_pass = start.elapsed();

        info!(rows = rows_written, fields = fieldnames.len(), replayed, "csv written");

        Ok(RunReport {
            fieldnames: fieldnames.to_vec(),
            rows_written,
            fieldname_pass,
            write_pass,
            replayed,
        })
    }
}

fn open_pass<S: StreamSource>(source: &S, spec: &ColumnSpec) -> Result<Rows> {
    Ok(assemble(source.open()?, spec.clone()))
}
