use crate::engine::executor::CancelHandle;
use crate::errors::CompareError;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, ErrorCode, OpenFlags};
use std::collections::HashSet;
use std::path::Path;

/// Decides whether two queries are equivalent on one database.
///
/// Implementations run on a blocking thread. They should guard their
/// connection with `cancel` so an abandoned call stops promptly.
pub trait ResultComparator: Send + Sync {
    fn compare(
        &self,
        predicted_sql: &str,
        ground_truth_sql: &str,
        db_path: &Path,
        cancel: &CancelHandle,
    ) -> Result<bool, CompareError>;
}

/// A single SQL value, hashable so rows can live in a set.
///
/// Integral reals fold into `Integer` so `1` and `1.0` compare equal, as
/// they do in the reference scorer. Text and numbers never compare equal.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Cell {
    Null,
    Integer(i64),
    Real(u64),
    Text(String),
    Blob(Vec<u8>),
}

// 2^63, the first f64 that no longer fits in an i64.
const I64_BOUND: f64 = 9_223_372_036_854_775_808.0;

impl Cell {
    fn from_real(f: f64) -> Self {
        if f.is_nan() {
            return Cell::Real(f64::NAN.to_bits());
        }
        if f.fract() == 0.0 && f >= -I64_BOUND && f < I64_BOUND {
            return Cell::Integer(f as i64);
        }
        Cell::Real(f.to_bits())
    }
}

impl From<ValueRef<'_>> for Cell {
    fn from(v: ValueRef<'_>) -> Self {
        match v {
            ValueRef::Null => Cell::Null,
            ValueRef::Integer(i) => Cell::Integer(i),
            ValueRef::Real(f) => Cell::from_real(f),
            // Invalid UTF-8 keeps its bytes so distinct values stay distinct.
            ValueRef::Text(t) => match std::str::from_utf8(t) {
                Ok(s) => Cell::Text(s.to_string()),
                Err(_) => Cell::Blob(t.to_vec()),
            },
            ValueRef::Blob(b) => Cell::Blob(b.to_vec()),
        }
    }
}

pub type Row = Vec<Cell>;

/// Runs `sql` and materialises every row.
pub fn fetch_rows(conn: &Connection, sql: &str) -> rusqlite::Result<Vec<Row>> {
    let mut stmt = conn.prepare(sql)?;
    let width = stmt.column_count();
    let mut rows = stmt.query([])?;
    let mut out = Vec::new();
    while let Some(row) = rows.next()? {
        let mut cells = Vec::with_capacity(width);
        for i in 0..width {
            cells.push(Cell::from(row.get_ref(i)?));
        }
        out.push(cells);
    }
    Ok(out)
}

/// Set equality over rows: order and duplicates are ignored, column order
/// inside a row is not.
pub fn same_row_set(a: Vec<Row>, b: Vec<Row>) -> bool {
    let a: HashSet<Row> = a.into_iter().collect();
    let b: HashSet<Row> = b.into_iter().collect();
    a == b
}

/// Compares queries against a SQLite file.
///
/// Every call opens its own read-only connection and works inside a
/// transaction that is rolled back when the connection is dropped, so a
/// predicted query can neither persist a write nor share state with another
/// call. Two calls on the same file may overlap; both only read.
#[derive(Debug, Clone, Default)]
pub struct SqliteComparator;

impl SqliteComparator {
    pub fn new() -> Self {
        Self
    }

    fn open(db_path: &Path, cancel: &CancelHandle) -> Result<Connection, CompareError> {
        let conn = Connection::open_with_flags(
            db_path,
            OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_NO_MUTEX,
        )
        .map_err(|e| CompareError::Open {
            path: db_path.to_path_buf(),
            message: e.to_string(),
        })?;
        cancel.guard(&conn);
        Ok(conn)
    }

    /// Runs only the ground-truth query and returns its row count.
    pub fn probe(
        &self,
        ground_truth_sql: &str,
        db_path: &Path,
        cancel: &CancelHandle,
    ) -> Result<usize, CompareError> {
        let mut conn = Self::open(db_path, cancel)?;
        let tx = conn
            .transaction()
            .map_err(|e| classify(e, CompareError::GroundTruth))?;
        let rows = fetch_rows(&tx, ground_truth_sql)
            .map_err(|e| classify(e, CompareError::GroundTruth))?;
        Ok(rows.len())
    }
}

impl ResultComparator for SqliteComparator {
    fn compare(
        &self,
        predicted_sql: &str,
        ground_truth_sql: &str,
        db_path: &Path,
        cancel: &CancelHandle,
    ) -> Result<bool, CompareError> {
        let mut conn = Self::open(db_path, cancel)?;
        // Dropping the transaction rolls it back; nothing is ever committed.
        let tx = conn
            .transaction()
            .map_err(|e| classify(e, CompareError::GroundTruth))?;

        let expected = fetch_rows(&tx, ground_truth_sql)
            .map_err(|e| classify(e, CompareError::GroundTruth))?;
        let actual =
            fetch_rows(&tx, predicted_sql).map_err(|e| classify(e, CompareError::Predicted))?;

        Ok(same_row_set(actual, expected))
    }
}

fn classify(e: rusqlite::Error, wrap: fn(String) -> CompareError) -> CompareError {
    match &e {
        rusqlite::Error::SqliteFailure(f, _) if f.code == ErrorCode::OperationInterrupted => {
            CompareError::Interrupted
        }
        _ => wrap(e.to_string()),
    }
}
