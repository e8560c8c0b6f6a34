use crate::error::{Error, Result};
use crate::source::{LeafStream, StreamSource};
use crate::types::{LeafPair, Path, Segment};
use serde::de::{self, DeserializeSeed, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Integral doubles below this magnitude print without an exponent in jq
const PLAIN_INTEGER_LIMIT: f64 = 1e17;

/// Walks the document in-process, yielding the same pairs as `jq --stream`
#[derive(Debug, Clone)]
pub struct NativeSource {
    input: PathBuf,
}

impl NativeSource {
    pub fn new(input: impl Into<PathBuf>) -> Self {
        NativeSource {
            input: input.into(),
        }
    }
}

impl StreamSource for NativeSource {
    fn describe(&self) -> String {
        format!("native walk of {}", self.input.display())
    }

    fn open(&self) -> Result<LeafStream> {
        let content = std::fs::read(&self.input).map_err(|source| Error::InputOpen {
            path: self.input.clone(),
            source,
        })?;
        let pairs = walk_documents(&content)?;
        debug!(pairs = pairs.len(), input = %self.input.display(), "walked input");

        Ok(Box::new(pairs.into_iter().map(Ok)))
    }
}

/// Walk a single document, or a sequence of concatenated / newline
/// delimited documents, into its leaf pairs in document order.
///
/// Pairs are emitted while parsing, so repeated object keys each keep
/// their own leaf.
pub fn walk_documents(content: &[u8]) -> Result<Vec<LeafPair>> {
    // simd-json unescapes in place, so it gets its own copy
    let mut scratch = content.to_vec();
    match simd_json::serde::from_slice::<DocumentLeaves>(&mut scratch) {
        Ok(document) => return Ok(document.0),
        Err(e) => debug!(error = %e, "not a single document, reading as a stream"),
    }

    let mut pairs = Vec::new();
    let mut documents = 0usize;
    for document in serde_json::Deserializer::from_slice(content).into_iter::<DocumentLeaves>() {
        pairs.extend(document.map_err(Error::Document)?.0);
        documents += 1;
    }
    debug!(documents, "walked document stream");
    Ok(pairs)
}

/// The leaves of one whole document
struct DocumentLeaves(Vec<LeafPair>);

impl<'de> Deserialize<'de> for DocumentLeaves {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        let mut out = Vec::new();
        LeafSink {
            path: Path::default(),
            out: &mut out,
        }
        .deserialize(deserializer)?;
        Ok(DocumentLeaves(out))
    }
}

/// Pushes every leaf under `path` onto `out`.
///
/// Empty containers are leaves of their own, as in `jq --stream`.
struct LeafSink<'a> {
    path: Path,
    out: &'a mut Vec<LeafPair>,
}

impl LeafSink<'_> {
    fn leaf(self, value: Value) {
        self.out.push(LeafPair::new(self.path, value));
    }
}

impl<'de> DeserializeSeed<'de> for LeafSink<'_> {
    type Value = ();

    fn deserialize<D: Deserializer<'de>>(self, deserializer: D) -> std::result::Result<(), D::Error> {
        deserializer.deserialize_any(self)
    }
}

impl<'de> Visitor<'de> for LeafSink<'_> {
    type Value = ();

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a JSON value")
    }

    fn visit_bool<E: de::Error>(self, v: bool) -> std::result::Result<(), E> {
        self.leaf(Value::Bool(v));
        Ok(())
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> std::result::Result<(), E> {
        self.leaf(Value::from(v));
        Ok(())
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> std::result::Result<(), E> {
        self.leaf(Value::from(v));
        Ok(())
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> std::result::Result<(), E> {
        self.leaf(jq_number(v));
        Ok(())
    }

    fn visit_str<E: de::Error>(self, v: &str) -> std::result::Result<(), E> {
        self.leaf(Value::String(v.to_string()));
        Ok(())
    }

    fn visit_string<E: de::Error>(self, v: String) -> std::result::Result<(), E> {
        self.leaf(Value::String(v));
        Ok(())
    }

    fn visit_unit<E: de::Error>(self) -> std::result::Result<(), E> {
        self.leaf(Value::Null);
        Ok(())
    }

    fn visit_none<E: de::Error>(self) -> std::result::Result<(), E> {
        self.leaf(Value::Null);
        Ok(())
    }

    fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> std::result::Result<(), A::Error> {
        let LeafSink { path, out } = self;
        let mut index = 0u64;
        while seq
            .next_element_seed(LeafSink {
                path: path.child(Segment::Index(index)),
                out: &mut *out,
            })?
            .is_some()
        {
            index += 1;
        }

        if index == 0 {
            out.push(LeafPair::new(path, Value::Array(Vec::new())));
        }
        Ok(())
    }

    fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> std::result::Result<(), A::Error> {
        let LeafSink { path, out } = self;
        let mut entries = 0usize;
        while let Some(key) = map.next_key::<String>()? {
            map.next_value_seed(LeafSink {
                path: path.child(Segment::Key(key)),
                out: &mut *out,
            })?;
            entries += 1;
        }

        if entries == 0 {
            out.push(LeafPair::new(path, Value::Object(Map::new())));
        }
        Ok(())
    }
}

/// jq prints an integral double such as `1.0` or `1e2` as a plain integer
/// as long as it needs no exponent: under 1e17 and with at most 15 trailing
/// zeros. Everything else stays a float.
fn jq_number(v: f64) -> Value {
    if v.fract() != 0.0 || v.abs() >= PLAIN_INTEGER_LIMIT {
        return Value::from(v);
    }

    let n = v as i64;
    let mut trailing_zeros = 0;
    let mut rest = n;
    while rest != 0 && rest % 10 == 0 {
        rest /= 10;
        trailing_zeros += 1;
    }

    if trailing_zeros > 15 {
        Value::from(v)
    } else {
        Value::from(n)
    }
}
