#![allow(dead_code)]

use exacc_core::model::{BenchmarkItem, Difficulty, ExtractedAnswer};
use rusqlite::Connection;
use std::path::{Path, PathBuf};

/// Creates `<root>/<db_id>/<db_id>.sqlite` with a small `t` table.
pub fn make_db(root: &Path, db_id: &str) -> PathBuf {
    let dir = root.join(db_id);
    std::fs::create_dir_all(&dir).unwrap();
    let path = dir.join(format!("{}.sqlite", db_id));
    let conn = Connection::open(&path).unwrap();
    conn.execute_batch(
        "CREATE TABLE t (id INTEGER PRIMARY KEY, name TEXT, score REAL);
         INSERT INTO t VALUES (1, 'carol', 3.5);
         INSERT INTO t VALUES (2, 'alice', 2.0);
         INSERT INTO t VALUES (3, 'bob', 1.0);
         INSERT INTO t VALUES (4, 'alice', 4.0);",
    )
    .unwrap();
    path
}

pub fn item(index: usize, difficulty: Difficulty, db: &Path, gt: &str) -> BenchmarkItem {
    BenchmarkItem {
        index,
        difficulty,
        db_path: db.to_path_buf(),
        ground_truth_sql: gt.to_string(),
    }
}

pub fn answer(index: usize, sql: &str) -> ExtractedAnswer {
    ExtractedAnswer {
        index,
        predicted_sql: sql.to_string(),
        extracted: true,
    }
}

pub const HANG_SQL: &str =
    "WITH RECURSIVE r(x) AS (SELECT 1 UNION ALL SELECT x + 1 FROM r) SELECT count(*) FROM r";
