//! # Smelter - rebuild table rows from a flattened JSON leaf stream
//!
//! A document walk such as `jq --stream` turns a nested JSON document into
//! `[path, value]` pairs and loses every object and array boundary on the
//! way. Smelter takes that stream plus a few target column names and puts
//! the rows back together, then writes them as CSV.
//!
//! ## Modules
//!
//! - **source**: produce the leaf stream (`jq`, an in-process walk, or a
//!   file of pre-streamed pairs)
//! - **melt**: filter leaves, assemble rows, collect the header, write CSV
//! - **pipeline**: the two-pass run tying them together
//!
//! ## Quick Start
//!
//! ```rust
//! use smelter::{ColumnSpec, LeafPair, Smelter};
//!
//! # fn main() -> smelter::Result<()> {
//! let pairs: Vec<LeafPair> = [
//!     r#"[["id"],1]"#,
//!     r#"[["name"],"a"]"#,
//!     r#"[["id"],2]"#,
//!     r#"[["name"],"b"]"#,
//! ]
//! .iter()
//! .map(|line| LeafPair::from_line(line).unwrap())
//! .collect();
//!
//! let spec = ColumnSpec::parse("id, name", None)?;
//! let mut out = Vec::new();
//! Smelter::new(pairs, spec).run_to_writer(&mut out)?;
//!
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "\"id\",\"name\"\n\"1\",\"a\"\n\"2\",\"b\"\n"
//! );
//! # Ok(())
//! # }
//! ```

use std::path::Path;

pub mod config;
pub mod error;
pub mod melt;
pub mod pipeline;
pub mod source;
pub mod types;

// Re-export commonly used types for convenience
pub use config::{CacheKind, ColumnSpec, SourceKind, SourceSettings};
pub use error::{Error, Result};
pub use melt::{assemble, collect_fieldnames, CsvEmitter, Fieldnames, RowAssembler, RowCache};
pub use pipeline::{RunReport, Smelter};
pub use source::{JqSource, NativeSource, PairsFile, StreamSource};
pub use types::{LeafPair, Path as LeafPath, Row, Segment};

/// Main entry point: smelt a source into a CSV file, reading it once per pass
pub fn smelt_csv<S, P>(source: S, spec: ColumnSpec, output: P) -> Result<RunReport>
where
    S: StreamSource,
    P: AsRef<Path>,
{
    Smelter::new(source, spec).run(output)
}
