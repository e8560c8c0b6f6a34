use smelter::config::DEFAULT_INPUT;
use smelter::melt::{collect_fieldnames, MemoryCache};
use smelter::{ColumnSpec, JqSource, LeafPair, NativeSource, Smelter, StreamSource};
use std::path::{Path, PathBuf};
use std::process::Command;

fn sample() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR")).join(DEFAULT_INPUT)
}

fn sample_spec() -> ColumnSpec {
    ColumnSpec::resolve(None, None, Path::new(DEFAULT_INPUT)).unwrap()
}

fn jq_available() -> bool {
    Command::new("jq")
        .arg("--version")
        .output()
        .map(|out| out.status.success())
        .unwrap_or(false)
}

#[test]
fn sample_document_rows() {
    let mut smelter = Smelter::new(NativeSource::new(sample()), sample_spec())
        .with_cache(Box::new(MemoryCache::new(100)));
    let mut out = Vec::new();
    let report = smelter.run_to_writer(&mut out).unwrap();

    assert!(report.replayed);
    assert_eq!(report.rows_written, 3);
    assert_eq!(
        String::from_utf8(out).unwrap(),
        concat!(
            "\"balance\",\"company\",\"eyeColor\",\"name\",\"name.2\",\"name.3\"\n",
            "\"$1,204.18\",\"ZENTRY\",\"brown\",\"Tessa Holloway\",\"Luna Marsh\",\"Boyer Quinn\"\n",
            "\"$3,870.55\",\"\",\"green\",\"Marcus Vance\",\"Ida Crane\",\"\"\n",
            "\"$2,016.90\",\"QUILK\",\"blue\",\"Rhoda Finch\",\"\",\"\"\n",
        )
    );
}

#[test]
fn fieldname_pass_is_repeatable() {
    let smelter = Smelter::new(NativeSource::new(sample()), sample_spec());
    let first = collect_fieldnames(smelter.rows().unwrap()).unwrap();
    let second = collect_fieldnames(smelter.rows().unwrap()).unwrap();
    assert_eq!(first, second);
}

fn pairs(source: impl StreamSource) -> Vec<LeafPair> {
    source.open().unwrap().map(|p| p.unwrap()).collect()
}

fn assert_same_pairs(input: &Path) {
    assert_eq!(pairs(NativeSource::new(input)), pairs(JqSource::new(input)));
}

#[test]
fn native_walk_matches_jq() {
    if !jq_available() {
        eprintln!("jq not installed; skipping");
        return;
    }
    assert_same_pairs(&sample());
}

#[test]
fn native_walk_matches_jq_on_awkward_documents() {
    if !jq_available() {
        eprintln!("jq not installed; skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let documents = [
        r#"[{"id":1,"name":"a","name":"b"}]"#,
        r#"{"a":1.0,"b":1e2,"c":2.5,"d":[],"e":{}}"#,
    ];
    for (i, document) in documents.iter().enumerate() {
        let input = dir.path().join(format!("doc{}.json", i));
        std::fs::write(&input, document).unwrap();
        assert_same_pairs(&input);
    }
}

#[test]
fn repeated_keys_become_enumerated_fields() {
    let dir = tempfile::tempdir().unwrap();
    let input = dir.path().join("dup.json");
    std::fs::write(&input, r#"[{"id":1,"name":"a","name":"b"},{"id":2.0,"name":"c"}]"#).unwrap();

    let mut out = Vec::new();
    Smelter::new(NativeSource::new(&input), ColumnSpec::parse("id, name", None).unwrap())
        .run_to_writer(&mut out)
        .unwrap();
    assert_eq!(
        String::from_utf8(out).unwrap(),
        "\"id\",\"name\",\"name.2\"\n\"1\",\"a\",\"b\"\n\"2\",\"c\",\"\"\n"
    );
}

#[test]
fn jq_failure_fails_the_pass() {
    if !jq_available() {
        eprintln!("jq not installed; skipping");
        return;
    }

    let dir = tempfile::tempdir().unwrap();
    let broken = dir.path().join("broken.json");
    std::fs::write(&broken, "{\"id\": ").unwrap();

    let results: Vec<_> = JqSource::new(&broken).open().unwrap().collect();
    assert!(matches!(results.last(), Some(Err(smelter::Error::SourceExit { .. }))));
}
