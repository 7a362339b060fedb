use anyhow::bail;
use chrono::Utc;
use rusqlite::Connection;
use std::path::Path;
use uuid::Uuid;

use crate::score::ScoreResult;
use crate::stats::CandidateRecord;

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("screenscore.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute("PRAGMA foreign_keys = ON", [])?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS candidates(
            id TEXT PRIMARY KEY,
            last_name TEXT NOT NULL,
            first_name TEXT NOT NULL,
            program_code TEXT NOT NULL,
            utme_score REAL,
            score REAL,
            percentage REAL,
            grade TEXT,
            status TEXT,
            has_completed_test INTEGER NOT NULL DEFAULT 0,
            time_taken_seconds INTEGER,
            completed_at TEXT,
            updated_at TEXT
        )",
        [],
    )?;
    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_candidates_program ON candidates(program_code)",
        [],
    )?;

    Ok(conn)
}

#[derive(Debug, Clone)]
pub struct NewCandidate {
    pub last_name: String,
    pub first_name: String,
    pub program_code: String,
    pub utme_score: Option<f64>,
}

/// Registers a candidate ahead of the test. Score fields stay NULL until a
/// result is handed off.
pub fn insert_candidate(conn: &Connection, candidate: &NewCandidate) -> anyhow::Result<String> {
    let id = Uuid::new_v4().to_string();
    conn.execute(
        "INSERT INTO candidates(id, last_name, first_name, program_code, utme_score, has_completed_test)
         VALUES(?1, ?2, ?3, ?4, ?5, 0)",
        rusqlite::params![
            id,
            candidate.last_name,
            candidate.first_name,
            candidate.program_code,
            candidate.utme_score
        ],
    )?;
    Ok(id)
}

/// The persistence handoff: one logical write of the computed result onto the
/// candidate's row. Retries and recovery are the caller's concern. An unknown
/// candidate id is a caller-side lookup failure and errors out.
pub fn record_result(conn: &Connection, result: &ScoreResult) -> anyhow::Result<()> {
    let now = Utc::now().to_rfc3339();
    let updated = conn.execute(
        "UPDATE candidates SET
            score = ?1,
            percentage = ?2,
            grade = ?3,
            status = ?4,
            has_completed_test = 1,
            time_taken_seconds = ?5,
            completed_at = ?6,
            updated_at = ?6
         WHERE id = ?7",
        rusqlite::params![
            result.total_score,
            result.percentage,
            result.grade.as_str(),
            result.status.as_str(),
            result.time_taken_seconds,
            now,
            result.candidate_id
        ],
    )?;
    if updated == 0 {
        tracing::error!(
            candidate_id = %result.candidate_id,
            "score handoff for unknown candidate"
        );
        bail!("candidate {} not found", result.candidate_id);
    }
    tracing::debug!(candidate_id = %result.candidate_id, "candidate record updated");
    Ok(())
}

/// Feed for the aggregate reports: every candidate, scored or not.
pub fn load_candidates(conn: &Connection) -> anyhow::Result<Vec<CandidateRecord>> {
    let mut stmt = conn.prepare(
        "SELECT id, last_name, first_name, program_code, utme_score, score, percentage,
                grade, status, has_completed_test, time_taken_seconds, completed_at
         FROM candidates
         ORDER BY last_name, first_name",
    )?;
    let rows = stmt.query_map([], |r| {
        let last: String = r.get(1)?;
        let first: String = r.get(2)?;
        Ok(CandidateRecord {
            id: r.get(0)?,
            display_name: format!("{}, {}", last, first),
            program_code: r.get(3)?,
            utme_score: r.get(4)?,
            score: r.get(5)?,
            percentage: r.get(6)?,
            grade: r.get(7)?,
            status: r.get(8)?,
            has_completed_test: r.get::<_, i64>(9)? != 0,
            time_taken_seconds: r.get(10)?,
            completed_at: r.get(11)?,
        })
    })?;
    Ok(rows.collect::<Result<Vec<_>, _>>()?)
}
