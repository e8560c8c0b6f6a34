use crate::error::Result;
use crate::types::Row;
use std::collections::BTreeSet;

/// Sorted union of every field key seen over one pass
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fieldnames {
    names: BTreeSet<String>,
}

impl Fieldnames {
    pub fn new() -> Self {
        Fieldnames::default()
    }

    pub fn observe(&mut self, row: &Row) {
        for key in row.keys() {
            if !self.names.contains(key) {
                self.names.insert(key.clone());
            }
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn to_vec(&self) -> Vec<String> {
        self.names.iter().cloned().collect()
    }
}

/// Drain a full pass of rows and return the header it needs.
///
/// The whole pass is consumed: the last row can still introduce a key.
pub fn collect_fieldnames<I>(rows: I) -> Result<Fieldnames>
where
    I: IntoIterator<Item = Result<Row>>,
{
    let mut fieldnames = Fieldnames::new();
    for row in rows {
        fieldnames.observe(&row?);
    }
    Ok(fieldnames)
}
