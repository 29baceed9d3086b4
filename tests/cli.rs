use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

fn write(dir: &Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

fn datarecon() -> Command {
    let mut cmd = Command::cargo_bin("datarecon").unwrap();
    cmd.args(["--color", "never"]);
    cmd
}

#[test]
fn perfect_match_exits_zero() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "Trade_Id,Price\n1,105\n");
    let b = write(dir.path(), "b.csv", "Trade_Id,Price\n1,105\n");

    datarecon()
        .arg("reconcile")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("No differences found."));
}

#[test]
fn tolerance_decides_numeric_mismatch() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "Trade_Id,Price\n1,105\n");
    let b = write(dir.path(), "b.csv", "TRADE ID;price\n1;105.001\n");

    datarecon()
        .args(["reconcile", "--tolerance", "0.01"])
        .arg(&a)
        .arg(&b)
        .assert()
        .code(0);

    let output = datarecon()
        .args(["reconcile", "--tolerance", "0.0001", "--format", "json"])
        .arg(&a)
        .arg(&b)
        .output()
        .unwrap();
    assert_eq!(output.status.code(), Some(1));

    let report: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(report["key_column_b"], "TRADE ID");
    assert_eq!(report["summary"]["mismatches"], 1);
    assert_eq!(report["detail"][0]["differences"]["Price"]["value_b"], 105.001);
}

#[test]
fn missing_rows_and_value_mismatch_in_terminal_report() {
    let dir = TempDir::new().unwrap();
    let a = write(
        dir.path(),
        "a.csv",
        "Trade_Id,CounterParty\n1,CITI\n2,HSBC\n3,JPM\n",
    );
    let b = write(dir.path(), "b.csv", "Trade_Id,CounterParty\n1,CITI Bank\n2,HSBC\n");

    datarecon()
        .arg("reconcile")
        .arg(&a)
        .arg(&b)
        .assert()
        .code(1)
        .stdout(predicate::str::contains("Only in A:\n  3\n"))
        .stdout(predicate::str::contains("CITI Bank"));
}

#[test]
fn csv_format_lists_cell_differences() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "id,desk,amount\n1,FX,10\n2,FX,20\n");
    let b = write(dir.path(), "b.json", r#"[{"id": 1, "desk": "FX", "amount": 11}, {"id": 2, "desk": "EQ", "amount": "20"}]"#);

    datarecon()
        .args(["reconcile", "--key", "id", "--format", "csv"])
        .arg(&a)
        .arg(&b)
        .assert()
        .code(1)
        .stdout("key,column,value_a,value_b\n1,amount,10,11\n2,desk,FX,EQ\n");
}

#[test]
fn explicit_map_overrides_suggestion() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "Ref,Amount\nX1,10\n");
    let b = write(dir.path(), "b.csv", "Reference,Total\nX1,10\n");

    datarecon()
        .args(["reconcile", "--key", "Ref", "--map", "Ref=Reference", "--map", "Amount=Total"])
        .arg(&a)
        .arg(&b)
        .assert()
        .success();

    datarecon()
        .args(["reconcile", "--map", "Ref"])
        .arg(&a)
        .arg(&b)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("expected A=B"));
}

#[test]
fn strict_mapping_assigns_each_b_column_once() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "Trade_Id,Price,price\n1,10,99\n");
    let b = write(dir.path(), "b.csv", "TradeId,PRICE\n1,10\n");

    let greedy = datarecon()
        .args(["reconcile", "--format", "json"])
        .arg(&a)
        .arg(&b)
        .output()
        .unwrap();
    assert_eq!(greedy.status.code(), Some(1));
    let report: serde_json::Value = serde_json::from_slice(&greedy.stdout).unwrap();
    assert_eq!(report["warnings"][0]["kind"], "ambiguous_mapping");

    let strict = datarecon()
        .args(["reconcile", "--strict-mapping", "--format", "json"])
        .arg(&a)
        .arg(&b)
        .output()
        .unwrap();
    assert_eq!(strict.status.code(), Some(0));
    let report: serde_json::Value = serde_json::from_slice(&strict.stdout).unwrap();
    assert_eq!(report["compared_columns"], serde_json::json!(["Trade_Id", "Price"]));
    assert_eq!(report["warnings"], serde_json::json!([]));
}

#[test]
fn unresolved_key_is_fatal() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "Trade_Id,Price\n1,105\n");
    let b = write(dir.path(), "b.csv", "Ref,Price\n1,105\n");

    datarecon()
        .args(["reconcile", "--key", "Trade_Id"])
        .arg(&a)
        .arg(&b)
        .assert()
        .code(2)
        .stderr(predicate::str::contains("could not be resolved in dataset B"));
}

#[test]
fn suggest_prints_key_and_mapping() {
    let dir = TempDir::new().unwrap();
    let a = write(dir.path(), "a.csv", "Desk,Trade_No,Price\nFX,1,1\nFX,2,1\n");
    let b = write(dir.path(), "b.csv", "trade no,PRICE,Extra\n1,1,x\n");

    let output = datarecon()
        .args(["suggest", "--json"])
        .arg(&a)
        .arg(&b)
        .output()
        .unwrap();
    assert!(output.status.success());

    let suggestion: serde_json::Value = serde_json::from_slice(&output.stdout).unwrap();
    assert_eq!(suggestion["key_column_a"], "Trade_No");
    assert_eq!(
        suggestion["mapping"],
        serde_json::json!({ "Trade_No": "trade no", "Price": "PRICE" })
    );

    datarecon()
        .arg("suggest")
        .arg(&a)
        .arg(&b)
        .assert()
        .success()
        .stdout(predicate::str::contains("Unmapped in A: Desk"));
}

#[test]
fn batch_continues_past_failed_pairs() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "a1.csv", "id,v\n1,1\n");
    write(dir.path(), "b1.csv", "id,v\n1,1\n");
    write(dir.path(), "a2.csv", "id,v\n1,1\n");
    write(dir.path(), "b2.csv", "other,v\n1,1\n");
    let job = write(
        dir.path(),
        "job.json",
        r#"{
            "defaults": { "key_column_a": "id" },
            "pairs": [
                { "file_a": "a1.csv", "file_b": "b1.csv" },
                { "file_a": "a2.csv", "file_b": "b2.csv" }
            ]
        }"#,
    );

    datarecon()
        .arg("batch")
        .arg(&job)
        .assert()
        .code(2)
        .stdout(predicate::str::contains("OK      "))
        .stdout(predicate::str::contains("FAILED  "))
        .stdout(predicate::str::contains("1 succeeded, 1 failed"))
        .stderr(predicate::str::contains("1 of 2 pair(s) failed"));
}
