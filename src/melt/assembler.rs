use crate::config::ColumnSpec;
use crate::error::Result;
use crate::melt::filter::LeafFilter;
use crate::types::{LeafPair, Row};
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use tracing::debug;

/// Rebuilds table rows from a flattened leaf stream.
///
/// Leaves whose last path segment names a tracked column are gathered into
/// the row in progress. A uid leaf at the same depth as the row's first uid
/// closes the row and opens the next one. Any other repeat of a column within
/// a row is stored as `column.N`, N being its occurrence count in that row.
/// The last row is flushed when the stream ends, even if it is empty.
pub struct RowAssembler<I> {
    pairs: I,
    spec: ColumnSpec,
    /// Matches the enumerated keys (`name.2`, `name.3`, ...) of each column
    families: HashMap<String, Regex>,
    row: Row,
    /// Path length first seen for each column in the current row
    depths: HashMap<String, usize>,
    emitted: usize,
    done: bool,
}

impl<I> RowAssembler<I>
where
    I: Iterator<Item = Result<LeafPair>>,
{
    /// Assemble rows from an already filtered pair stream
    pub fn new(pairs: I, spec: ColumnSpec) -> Self {
        let families = spec
            .columns()
            .iter()
            .map(|column| {
                let pattern = format!(r"^{}\.\d+$", regex::escape(column));
                // An escaped literal followed by a fixed suffix always compiles
                let family = Regex::new(&pattern).expect("escaped column pattern");
                (column.clone(), family)
            })
            .collect();

        RowAssembler {
            pairs,
            spec,
            families,
            row: Row::new(),
            depths: HashMap::new(),
            emitted: 0,
            done: false,
        }
    }

    /// Place one tracked leaf, returning the completed row if it closed one
    fn absorb(&mut self, column: String, depth: usize, value: Value) -> Option<Row> {
        if !self.row.contains(&column) {
            self.row.insert(column.clone(), value);
            self.depths.insert(column, depth);
            return None;
        }

        if self.spec.is_uid(&column) && self.depths.get(&column) == Some(&depth) {
            let mut next = Row::new();
            next.insert(column.clone(), value);
            self.depths.clear();
            self.depths.insert(column, depth);
            return Some(std::mem::replace(&mut self.row, next));
        }

        let key = self.enumerated_key(&column);
        self.row.insert(key, value);
        None
    }

    fn enumerated_key(&self, column: &str) -> String {
        let family = &self.families[column];
        let seen = self
            .row
            .keys()
            .filter(|key| key.as_str() == column || family.is_match(key))
            .count();

        let mut n = seen + 1;
        loop {
            let key = format!("{}.{}", column, n);
            if !self.row.contains(&key) {
                return key;
            }
            n += 1;
        }
    }

    fn finish(&mut self) -> Row {
        self.done = true;
        self.depths.clear();
        std::mem::take(&mut self.row)
    }
}

impl<I> Iterator for RowAssembler<I>
where
    I: Iterator<Item = Result<LeafPair>>,
{
    type Item = Result<Row>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        while let Some(next) = self.pairs.next() {
            let pair = match next {
                Ok(pair) => pair,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            };

            let Some(column) = pair
                .path
                .leaf_key()
                .and_then(|key| self.spec.lookup(key))
                .map(str::to_string)
            else {
                continue;
            };

            let depth = pair.path.len();
            if let Some(row) = self.absorb(column, depth, pair.value) {
                self.emitted += 1;
                return Some(Ok(row));
            }
        }

        self.emitted += 1;
        debug!(rows = self.emitted, "leaf stream exhausted");
        Some(Ok(self.finish()))
    }
}

/// Filter a raw pair stream and assemble it into rows
pub fn assemble<I>(pairs: I, spec: ColumnSpec) -> RowAssembler<LeafFilter<I>>
where
    I: Iterator<Item = Result<LeafPair>>,
{
    RowAssembler::new(LeafFilter::new(pairs), spec)
}
