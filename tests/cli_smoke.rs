use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::io::Write;
use std::process::Command;
use tempfile::{tempdir, NamedTempFile};

#[test]
fn help_works() -> Result<(), Box<dyn std::error::Error>> {
    Command::new(assert_cmd::cargo::cargo_bin!("smelter"))
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--columns"));
    Ok(())
}

#[test]
fn native_source_writes_csv() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = NamedTempFile::new()?;
    write!(
        input,
        r#"[{{"id": 1, "name": "a", "skip": 0}}, {{"id": 2, "name": "b", "pets": [{{"name": "p"}}]}}]"#
    )?;
    let dir = tempdir()?;
    let output = dir.path().join("csv").join("out.csv");

    Command::new(assert_cmd::cargo::cargo_bin!("smelter"))
        .arg("--source")
        .arg("native")
        .arg("--input")
        .arg(input.path())
        .arg("--columns")
        .arg("id, name")
        .arg("--output")
        .arg(&output)
        .assert()
        .success()
        .stdout(predicate::str::contains("fieldnames completed in"))
        .stdout(predicate::str::contains("csv write completed in"));

    let csv = std::fs::read_to_string(&output)?;
    assert_eq!(
        csv,
        "\"id\",\"name\",\"name.2\"\n\"1\",\"a\",\"\"\n\"2\",\"b\",\"p\"\n"
    );
    Ok(())
}

#[test]
fn pairs_source_with_uid_override() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = NamedTempFile::new()?;
    writeln!(input, r#"[["name"],"a"]"#)?;
    writeln!(input, r#"[["id"],1]"#)?;
    writeln!(input, r#"[["name"],"b"]"#)?;
    writeln!(input, r#"[["id"],2]"#)?;
    let dir = tempdir()?;
    let output = dir.path().join("out.csv");

    Command::new(assert_cmd::cargo::cargo_bin!("smelter"))
        .args(["--source", "pairs", "--cache", "spill", "--columns", "id,name", "--uid", "name"])
        .arg("--input")
        .arg(input.path())
        .arg("-o")
        .arg(&output)
        .assert()
        .success();

    let csv = std::fs::read_to_string(&output)?;
    assert_eq!(csv, "\"id\",\"name\"\n\"1\",\"a\"\n\"2\",\"b\"\n");
    Ok(())
}

#[test]
fn unknown_uid_is_rejected() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    Command::new(assert_cmd::cargo::cargo_bin!("smelter"))
        .args(["--source", "native", "--columns", "id, name", "--uid", "email"])
        .arg("--output")
        .arg(dir.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("uid `email`"));
    Ok(())
}

#[test]
fn malformed_pairs_fail_the_run() -> Result<(), Box<dyn std::error::Error>> {
    let mut input = NamedTempFile::new()?;
    writeln!(input, r#"[["id"],1]"#)?;
    writeln!(input, "Error: something went wrong")?;
    let dir = tempdir()?;

    Command::new(assert_cmd::cargo::cargo_bin!("smelter"))
        .args(["--source", "pairs", "--columns", "id"])
        .arg("--input")
        .arg(input.path())
        .arg("--output")
        .arg(dir.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("line 2"));
    Ok(())
}

#[test]
fn missing_jq_is_reported() -> Result<(), Box<dyn std::error::Error>> {
    let dir = tempdir()?;
    Command::new(assert_cmd::cargo::cargo_bin!("smelter"))
        .args(["--jq", "smelter-no-such-jq-binary", "--columns", "id"])
        .arg("--output")
        .arg(dir.path().join("out.csv"))
        .assert()
        .failure()
        .stderr(predicate::str::contains("smelter-no-such-jq-binary"));
    Ok(())
}
