use assert_cmd::Command;
use predicates::str::contains;
use rusqlite::Connection;
use std::fs;
use std::path::Path;
use tempfile::TempDir;

fn make_db(root: &Path, db_id: &str) {
    let dir = root.join(db_id);
    fs::create_dir_all(&dir).unwrap();
    let conn = Connection::open(dir.join(format!("{}.sqlite", db_id))).unwrap();
    conn.execute_batch(
        "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT);
         INSERT INTO t VALUES (1, 'alice'), (2, 'bob'), (3, 'carol');",
    )
    .unwrap();
}

fn fixture(metadata: &str, outputs: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    make_db(&dir.path().join("dbs"), "shop");
    fs::write(dir.path().join("dev.json"), metadata).unwrap();
    fs::write(dir.path().join("outputs.jsonl"), outputs).unwrap();
    dir
}

const METADATA: &str = r#"[
  {"SQL": "SELECT name FROM t WHERE id = 1", "db_id": "shop", "difficulty": "simple"},
  {"SQL": "SELECT count(*) FROM t", "db_id": "shop", "difficulty": "moderate"}
]"#;

const OUTPUTS: &str = concat!(
    r#"{"index": 0, "raw_text": "```sql\nSELECT name FROM t WHERE id = 1\n```"}"#,
    "\n",
    r#"{"index": 1, "raw_text": "```sql\nSELECT count(*) FROM t WHERE id > 1\n```"}"#,
    "\n",
);

fn exacc(dir: &TempDir) -> Command {
    let mut cmd = Command::cargo_bin("exacc").unwrap();
    cmd.current_dir(dir.path()).env_remove("EXACC_CONFIG");
    cmd
}

#[test]
fn test_run_scores_and_writes_in_place() {
    let dir = fixture(METADATA, OUTPUTS);
    exacc(&dir)
        .args(["run", "--metadata", "dev.json", "--db-root", "dbs"])
        .args(["--input", "outputs.jsonl", "--report-out", "report.json"])
        .assert()
        .success()
        .stdout(contains("ACCURACY"))
        .stdout(contains("1 correct, 1 incorrect"));

    let scored = fs::read_to_string(dir.path().join("outputs.jsonl")).unwrap();
    let lines: Vec<serde_json::Value> = scored
        .lines()
        .map(|l| serde_json::from_str(l).unwrap())
        .collect();
    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0]["is_correct"], true);
    assert_eq!(lines[1]["outcome"], "incorrect");
    assert_eq!(lines[1]["index"], 1);

    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    assert_eq!(report["overall"]["correct"], 1);
    assert_eq!(report["overall"]["total"], 2);
    assert_eq!(report["fingerprint"].as_str().unwrap().len(), 64);
}

#[test]
fn test_run_reads_settings_file() {
    let dir = fixture(METADATA, OUTPUTS);
    fs::write(
        dir.path().join("exacc.yaml"),
        "metadata_path: dev.json\ndb_root: dbs\ntimeout_seconds: 5\nconcurrency: 2\n",
    )
    .unwrap();

    exacc(&dir)
        .args(["run", "--config", "exacc.yaml", "--input", "outputs.jsonl"])
        .args(["--output", "scored.jsonl"])
        .assert()
        .success();

    // --output leaves the input untouched
    assert_eq!(
        fs::read_to_string(dir.path().join("outputs.jsonl")).unwrap(),
        OUTPUTS
    );
    assert!(dir.path().join("scored.jsonl").exists());
}

#[test]
fn test_count_mismatch_is_fatal() {
    let one_output = OUTPUTS.lines().next().unwrap().to_string() + "\n";
    let dir = fixture(METADATA, &one_output);

    exacc(&dir)
        .args(["run", "--metadata", "dev.json", "--db-root", "dbs"])
        .args(["--input", "outputs.jsonl"])
        .assert()
        .code(2)
        .stderr(contains("2 entries but model output has 1"));

    // nothing is written on a structural failure
    assert_eq!(
        fs::read_to_string(dir.path().join("outputs.jsonl")).unwrap(),
        one_output
    );
}

#[test]
fn test_missing_database_is_fatal() {
    let metadata = r#"[{"SQL": "SELECT 1", "db_id": "nowhere", "difficulty": "simple"}]"#;
    let outputs = "{\"raw_text\": \"no sql here\"}\n";
    let dir = fixture(metadata, outputs);

    exacc(&dir)
        .args(["run", "--metadata", "dev.json", "--db-root", "dbs"])
        .args(["--input", "outputs.jsonl"])
        .assert()
        .code(2)
        .stderr(contains("not found"));
}

#[test]
fn test_custom_regex_requires_pattern() {
    let dir = fixture(METADATA, OUTPUTS);
    exacc(&dir)
        .args(["run", "--metadata", "dev.json", "--db-root", "dbs"])
        .args(["--input", "outputs.jsonl", "--answer-format", "custom_regex"])
        .assert()
        .code(2)
        .stderr(contains("extraction_regex"));
}

#[test]
fn test_validate_flags_broken_ground_truth() {
    let metadata = r#"[
      {"SQL": "SELECT name FROM t", "db_id": "shop", "difficulty": "simple"},
      {"SQL": "SELECT * FROM missing_table", "db_id": "shop", "difficulty": "challenging"}
    ]"#;
    let dir = fixture(metadata, "");

    exacc(&dir)
        .args(["validate", "--metadata", "dev.json", "--db-root", "dbs"])
        .assert()
        .code(2)
        .stdout(contains("item 1"))
        .stdout(contains("1 of 2 ground-truth queries ok"));
}

#[test]
fn test_validate_passes_on_clean_benchmark() {
    let dir = fixture(METADATA, "");
    exacc(&dir)
        .args(["validate", "--metadata", "dev.json", "--db-root", "dbs"])
        .args(["--format", "json"])
        .assert()
        .success()
        .stdout(contains("\"status\": \"ok\""));
}

#[test]
fn test_init_writes_sample_config_once() {
    let dir = TempDir::new().unwrap();
    exacc(&dir).args(["init"]).assert().success();

    let path = dir.path().join("exacc.yaml");
    let body = fs::read_to_string(&path).unwrap();
    assert!(body.contains("answer_format: code_block"));

    fs::write(&path, "concurrency: 3\n").unwrap();
    exacc(&dir).args(["init"]).assert().success();
    assert_eq!(fs::read_to_string(&path).unwrap(), "concurrency: 3\n");
}

fn report_fingerprint(dir: &TempDir) -> String {
    let report: serde_json::Value =
        serde_json::from_str(&fs::read_to_string(dir.path().join("report.json")).unwrap())
            .unwrap();
    report["fingerprint"].as_str().unwrap().to_string()
}

#[test]
fn test_fingerprint_ignores_where_scores_are_written() {
    let in_place = fixture(METADATA, OUTPUTS);
    exacc(&in_place)
        .args(["run", "--metadata", "dev.json", "--db-root", "dbs"])
        .args(["--input", "outputs.jsonl", "--report-out", "report.json"])
        .assert()
        .success();

    let separate = fixture(METADATA, OUTPUTS);
    exacc(&separate)
        .args(["run", "--metadata", "dev.json", "--db-root", "dbs"])
        .args(["--input", "outputs.jsonl", "--report-out", "report.json"])
        .args(["--output", "scored.jsonl"])
        .assert()
        .success();

    // the in-place run really did replace its input
    assert_ne!(
        fs::read_to_string(in_place.path().join("outputs.jsonl")).unwrap(),
        OUTPUTS
    );
    assert_eq!(report_fingerprint(&in_place), report_fingerprint(&separate));
}
