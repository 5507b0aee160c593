//! Year-scoped sequential report numbers: `<CODE>-<YYYY>-<NNNN>`.
//!
//! Each `(family, year)` pair owns a row in `report_counters`. Allocation is a
//! single upsert-and-increment executed inside the caller's insert
//! transaction, so two creators can never read the same value. Existing
//! report numbers are only scanned to seed a fresh counter, or to move it past
//! rows that were written without going through the counter.

use std::fmt;

use sqlx::SqliteConnection;

use crate::models::ReportFamily;

/// Minimum width of the numeric suffix.
const SEQUENCE_WIDTH: usize = 4;

/// The `<CODE>-<YEAR>-` part shared by every number in one sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportPrefix {
    code: &'static str,
    year: i32,
}

impl ReportPrefix {
    pub fn new(family: ReportFamily, year: i32) -> Self {
        Self {
            code: family.code(),
            year,
        }
    }

    /// Full report number for a sequence value.
    pub fn format(&self, sequence: i64) -> String {
        format!("{}{:0width$}", self, sequence, width = SEQUENCE_WIDTH)
    }

    /// Sequence value of a report number under this prefix.
    ///
    /// The third `-` separated segment must be all ASCII digits. Anything else
    /// (another prefix, a hand-edited suffix, trailing text) yields `None`.
    pub fn parse_sequence(&self, report_no: &str) -> Option<i64> {
        let rest = report_no.strip_prefix(&self.to_string())?;
        let segment = report_no.split('-').nth(2)?;
        if rest != segment || segment.is_empty() || !segment.bytes().all(|b| b.is_ascii_digit()) {
            return None;
        }
        segment.parse().ok()
    }

    /// Highest parsable sequence among `existing`, or 0.
    pub fn max_sequence<'a, I>(&self, existing: I) -> i64
    where
        I: IntoIterator<Item = &'a str>,
    {
        existing
            .into_iter()
            .filter_map(|report_no| self.parse_sequence(report_no))
            .max()
            .unwrap_or(0)
    }

    /// Sequence that follows the highest parsable one in `existing`.
    pub fn next_sequence<'a, I>(&self, existing: I) -> i64
    where
        I: IntoIterator<Item = &'a str>,
    {
        self.max_sequence(existing) + 1
    }
}

impl fmt::Display for ReportPrefix {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-", self.code, self.year)
    }
}

/// Allocate the next report number for `family` in `year`.
///
/// Must run on the connection of the transaction that inserts the record; the
/// counter upsert is its first write, which takes SQLite's write lock for the
/// rest of the transaction. With `reconcile` set, the counter is moved past the
/// highest number already stored even when the counter row already existed.
pub async fn allocate(
    conn: &mut SqliteConnection,
    family: ReportFamily,
    year: i32,
    reconcile: bool,
) -> Result<String, sqlx::Error> {
    let prefix = ReportPrefix::new(family, year);

    let issued: i64 = sqlx::query_scalar(
        r#"INSERT INTO report_counters (family, year, last_seq) VALUES (?, ?, 1)
           ON CONFLICT(family, year) DO UPDATE SET last_seq = last_seq + 1
           RETURNING last_seq"#,
    )
    .bind(family.as_str())
    .bind(year)
    .fetch_one(&mut *conn)
    .await?;

    if issued > 1 && !reconcile {
        return Ok(prefix.format(issued));
    }

    let prefix_str = prefix.to_string();
    let existing: Vec<String> = sqlx::query_scalar(&format!(
        "SELECT report_no FROM {} WHERE substr(report_no, 1, length(?1)) = ?1",
        family.table()
    ))
    .bind(&prefix_str)
    .fetch_all(&mut *conn)
    .await?;

    let floor = prefix.next_sequence(existing.iter().map(String::as_str));
    if floor <= issued {
        return Ok(prefix.format(issued));
    }

    tracing::debug!(
        "Seeding {} counter from stored numbers: {} -> {}",
        prefix_str,
        issued,
        floor
    );
    sqlx::query("UPDATE report_counters SET last_seq = ? WHERE family = ? AND year = ?")
        .bind(floor)
        .bind(family.as_str())
        .bind(year)
        .execute(&mut *conn)
        .await?;

    Ok(prefix.format(floor))
}
