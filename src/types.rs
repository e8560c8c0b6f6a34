use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

/// One step from the document root towards a leaf
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Segment {
    Index(u64),
    Key(String),
}

impl Segment {
    pub fn key(key: impl Into<String>) -> Self {
        Segment::Key(key.into())
    }

    /// The object key, if this segment is one
    pub fn as_key(&self) -> Option<&str> {
        match self {
            Segment::Key(k) => Some(k),
            Segment::Index(_) => None,
        }
    }
}

impl fmt::Display for Segment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Segment::Index(i) => write!(f, "{}", i),
            Segment::Key(k) => f.write_str(k),
        }
    }
}

impl From<&str> for Segment {
    fn from(key: &str) -> Self {
        Segment::Key(key.to_string())
    }
}

impl From<u64> for Segment {
    fn from(index: u64) -> Self {
        Segment::Index(index)
    }
}

/// Location of a leaf inside a nested document
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Path(pub Vec<Segment>);

impl Path {
    pub fn new(segments: Vec<Segment>) -> Self {
        Path(segments)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// The last segment, when it is an object key. This is what gets matched
    /// against the tracked columns.
    pub fn leaf_key(&self) -> Option<&str> {
        self.0.last().and_then(Segment::as_key)
    }

    pub fn child(&self, segment: Segment) -> Path {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend(self.0.iter().cloned());
        segments.push(segment);
        Path(segments)
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            if i > 0 {
                f.write_str(".")?;
            }
            write!(f, "{}", segment)?;
        }
        Ok(())
    }
}

/// A `[path, value]` record as produced by `jq --stream`
#[derive(Debug, Clone, PartialEq)]
pub struct LeafPair {
    pub path: Path,
    pub value: Value,
}

impl LeafPair {
    pub fn new(path: Path, value: Value) -> Self {
        LeafPair { path, value }
    }

    /// Parse one stream line. The line must be a two element JSON array.
    pub fn from_line(line: &str) -> serde_json::Result<Self> {
        let (path, value): (Path, Value) = serde_json::from_str(line)?;
        Ok(LeafPair { path, value })
    }
}

/// A reconstructed table row: field key to leaf value, in insertion order
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Row {
    fields: Map<String, Value>,
}

impl Row {
    pub fn new() -> Self {
        Row::default()
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.fields.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.fields.insert(key.into(), value);
    }

    pub fn keys(&self) -> impl Iterator<Item = &String> {
        self.fields.keys()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl From<Map<String, Value>> for Row {
    fn from(fields: Map<String, Value>) -> Self {
        Row { fields }
    }
}
