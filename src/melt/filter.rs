use crate::error::Result;
use crate::types::LeafPair;
use serde_json::Value;

/// Check whether a leaf carries anything worth a column.
///
/// Null, `false`, zero, the empty string and empty containers (which
/// `jq --stream` reports as `[]` / `{}` leaves) do not.
pub fn is_informative(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().map_or(true, |f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Array(items) => !items.is_empty(),
        Value::Object(map) => !map.is_empty(),
    }
}

/// Iterator adapter dropping uninformative pairs. Errors pass through.
pub struct LeafFilter<I> {
    pairs: I,
}

impl<I> LeafFilter<I> {
    pub fn new(pairs: I) -> Self {
        LeafFilter { pairs }
    }
}

impl<I> Iterator for LeafFilter<I>
where
    I: Iterator<Item = Result<LeafPair>>,
{
    type Item = Result<LeafPair>;

    fn next(&mut self) -> Option<Self::Item> {
        self.pairs.find(|item| match item {
            Ok(pair) => is_informative(&pair.value),
            Err(_) => true,
        })
    }
}
