use crate::error::{Error, Result};
use crate::melt::fieldnames::Fieldnames;
use crate::types::Row;
use csv::{QuoteStyle, WriterBuilder};
use serde_json::Value;
use std::fs::File;
use std::io::Write;
use std::path::Path;
use tracing::warn;

/// Writes rows as CSV under a fixed header, quoting every field
pub struct CsvEmitter<W: Write> {
    writer: csv::Writer<W>,
    fieldnames: Vec<String>,
    rows_written: usize,
}

impl CsvEmitter<File> {
    /// Create (or truncate) the output file and write the header.
    /// Missing parent directories are created.
    pub fn create<P: AsRef<Path>>(path: P, fieldnames: &Fieldnames) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).map_err(|source| Error::OutputOpen {
                    path: parent.to_path_buf(),
                    source,
                })?;
            }
        }

        let file = File::create(path).map_err(|source| Error::OutputOpen {
            path: path.to_path_buf(),
            source,
        })?;
        Self::new(file, fieldnames)
    }
}

impl<W: Write> CsvEmitter<W> {
    pub fn new(inner: W, fieldnames: &Fieldnames) -> Result<Self> {
        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(inner);

        let fieldnames = fieldnames.to_vec();
        if fieldnames.is_empty() {
            warn!("no tracked column matched any leaf; writing an empty file");
        } else {
            writer.write_record(&fieldnames)?;
        }

        Ok(CsvEmitter {
            writer,
            fieldnames,
            rows_written: 0,
        })
    }

    /// Write one row. Fields the row lacks are left empty; a field missing
    /// from the header is an error.
    pub fn write_row(&mut self, row: &Row) -> Result<()> {
        if let Some(unknown) = row
            .keys()
            .find(|key| self.fieldnames.binary_search(*key).is_err())
        {
            return Err(Error::UnknownField(unknown.clone()));
        }

        if self.fieldnames.is_empty() {
            return Ok(());
        }

        let record: Vec<String> = self
            .fieldnames
            .iter()
            .map(|name| row.get(name).map(render_cell).unwrap_or_default())
            .collect();
        self.writer.write_record(&record)?;
        self.rows_written += 1;
        Ok(())
    }

    pub fn write_rows<I>(&mut self, rows: I) -> Result<usize>
    where
        I: IntoIterator<Item = Result<Row>>,
    {
        let before = self.rows_written;
        for row in rows {
            self.write_row(&row?)?;
        }
        Ok(self.rows_written - before)
    }

    /// Flush and hand back the inner writer
    pub fn finish(self) -> Result<W> {
        self.writer
            .into_inner()
            .map_err(|e| Error::Io(e.into_error()))
    }
}

fn render_cell(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Null => String::new(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => b.to_string(),
        other => other.to_string(),
    }
}
