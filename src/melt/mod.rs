//! Row reconstruction - melt a flattened leaf stream back into table rows
//!
//! This module turns the `(path, value)` pairs of a document walk into rows
//! keyed by the tracked columns, then into CSV.
//!
//! ## Two passes
//!
//! The header is the union of every field key of every row, which is only
//! known after the whole stream has been seen. The first pass collects it;
//! the second writes the rows. A `RowCache` can record the first pass so the
//! second one does not need to walk the document again.

pub mod filter;
pub mod assembler;
pub mod fieldnames;
pub mod writer;
pub mod cache;

pub use filter::{is_informative, LeafFilter};
pub use assembler::{assemble, RowAssembler};
pub use fieldnames::{collect_fieldnames, Fieldnames};
pub use writer::CsvEmitter;
pub use cache::{MemoryCache, NoCache, RowCache, RowStream, SpillCache};
