use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use crate::score::round_off_2_decimals;

/// Stored projection of a candidate, as the persistence layer returns it.
/// Score fields are absent until the candidate has completed the test.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CandidateRecord {
    pub id: String,
    pub display_name: String,
    pub program_code: String,
    pub utme_score: Option<f64>,
    pub score: Option<f64>,
    pub percentage: Option<f64>,
    pub grade: Option<String>,
    pub status: Option<String>,
    pub has_completed_test: bool,
    pub time_taken_seconds: Option<u32>,
    pub completed_at: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgramStats {
    pub program_code: String,
    pub candidate_count: usize,
    pub completed_count: usize,
    pub average_percentage: f64,
    pub pass_rate: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CohortStats {
    pub candidate_count: usize,
    pub completed_count: usize,
    pub average_score: f64,
    pub average_percentage: f64,
    pub pass_rate: f64,
    pub per_program: Vec<ProgramStats>,
}

struct ProgramAccum {
    candidate_count: usize,
    completed_count: usize,
    sum_percent: f64,
    passed: usize,
}

/// Folds already-scored candidate records into cohort-level statistics.
/// Only completed candidates enter the averages and pass rate; registration
/// counts include everyone.
pub fn cohort_stats(records: &[CandidateRecord]) -> CohortStats {
    let mut completed_count: usize = 0;
    let mut passed: usize = 0;
    let mut sum_score = 0.0_f64;
    let mut sum_percent = 0.0_f64;
    let mut by_program: HashMap<&str, ProgramAccum> = HashMap::new();

    for r in records {
        let acc = by_program
            .entry(r.program_code.as_str())
            .or_insert(ProgramAccum {
                candidate_count: 0,
                completed_count: 0,
                sum_percent: 0.0,
                passed: 0,
            });
        acc.candidate_count += 1;

        if !r.has_completed_test {
            continue;
        }
        completed_count += 1;
        acc.completed_count += 1;
        sum_score += r.score.unwrap_or(0.0);
        let pct = r.percentage.unwrap_or(0.0);
        sum_percent += pct;
        acc.sum_percent += pct;
        if r.status.as_deref() == Some("PASSED") {
            passed += 1;
            acc.passed += 1;
        }
    }

    let average_score = if completed_count > 0 {
        round_off_2_decimals(sum_score / completed_count as f64)
    } else {
        0.0
    };
    let average_percentage = if completed_count > 0 {
        round_off_2_decimals(sum_percent / completed_count as f64)
    } else {
        0.0
    };
    let pass_rate = if completed_count > 0 {
        round_off_2_decimals(100.0 * passed as f64 / completed_count as f64)
    } else {
        0.0
    };

    let mut per_program: Vec<ProgramStats> = by_program
        .into_iter()
        .map(|(code, acc)| {
            let average_percentage = if acc.completed_count > 0 {
                round_off_2_decimals(acc.sum_percent / acc.completed_count as f64)
            } else {
                0.0
            };
            let pass_rate = if acc.completed_count > 0 {
                round_off_2_decimals(100.0 * acc.passed as f64 / acc.completed_count as f64)
            } else {
                0.0
            };
            ProgramStats {
                program_code: code.to_string(),
                candidate_count: acc.candidate_count,
                completed_count: acc.completed_count,
                average_percentage,
                pass_rate,
            }
        })
        .collect();
    per_program.sort_by(|a, b| a.program_code.cmp(&b.program_code));

    CohortStats {
        candidate_count: records.len(),
        completed_count,
        average_score,
        average_percentage,
        pass_rate,
        per_program,
    }
}
