use serde::{Deserialize, Serialize};
use std::collections::HashMap;

/// 2-decimal rounding in the classic `Int(k*x + 0.5) / k` shape, so stored
/// percentages match what the report pages print.
pub fn round_off_2_decimals(x: f64) -> f64 {
    ((100.0 * x) + 0.5).floor() / 100.0
}

#[derive(Debug, Clone, Serialize)]
pub struct ScoreError {
    pub code: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ScoreError {
    pub fn new(code: &str, message: impl Into<String>) -> Self {
        Self {
            code: code.to_string(),
            message: message.into(),
            details: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Grade {
    A,
    B,
    C,
    D,
    E,
    F,
}

impl Grade {
    pub fn as_str(&self) -> &'static str {
        match self {
            Grade::A => "A",
            Grade::B => "B",
            Grade::C => "C",
            Grade::D => "D",
            Grade::E => "E",
            Grade::F => "F",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TestStatus {
    Passed,
    Failed,
}

impl TestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            TestStatus::Passed => "PASSED",
            TestStatus::Failed => "FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Subject {
    pub id: String,
    pub name: String,
    pub code: String,
}

/// One item of the active test. Immutable once a test is in progress; the
/// correct answer and marks ride along so scoring needs no second lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Question {
    pub id: String,
    pub text: String,
    pub options: Vec<String>,
    pub correct_answer: String,
    pub marks: f64,
    pub subject: Subject,
}

/// A candidate's submitted answer. `selected` may be absent or blank, which
/// classifies the question as unanswered.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Answer {
    pub question_id: String,
    #[serde(default)]
    pub selected: Option<String>,
    #[serde(default)]
    pub time_spent_seconds: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Submission {
    pub candidate_id: String,
    pub answers: Vec<Answer>,
    pub time_taken_seconds: u32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SubjectScore {
    pub subject: Subject,
    pub total_questions: usize,
    pub correct_answers: usize,
    pub score: f64,
    pub max_score: f64,
    pub percentage: f64,
}

/// Computed fresh per submission and never mutated afterwards; a retake
/// produces a brand-new one.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoreResult {
    pub candidate_id: String,
    pub total_score: f64,
    pub max_score: f64,
    pub percentage: f64,
    pub correct_answers: usize,
    pub wrong_answers: usize,
    pub unanswered_questions: usize,
    pub time_taken_seconds: u32,
    pub subject_breakdown: Vec<SubjectScore>,
    pub grade: Grade,
    pub status: TestStatus,
}

/// A percentage band mapped to a single letter. Bands are kept as descending
/// lower bounds; a band covers `[min_percent, previous band's bound)`, and
/// the top band reaches 100 inclusive.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GradeBand {
    pub grade: Grade,
    pub min_percent: f64,
}

/// How pass/fail is decided. The legacy scoring code always used a fixed 40%
/// cutoff and ignored the screening's configured pass mark even though the
/// data model carries one; both behaviors are kept as named options so the
/// caller chooses deliberately.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", tag = "rule", content = "value")]
pub enum PassRule {
    /// Cutoff applied to the overall percentage.
    FixedPercentage(f64),
    /// The screening's configured pass mark, applied to the raw total score.
    ScreeningPassMarks(f64),
}

impl PassRule {
    fn passed(&self, total_score: f64, percentage: f64) -> bool {
        match self {
            PassRule::FixedPercentage(cutoff) => percentage >= *cutoff,
            PassRule::ScreeningPassMarks(marks) => total_score >= *marks,
        }
    }
}

/// Grading policy passed into the engine per call, replacing the legacy
/// module-level constants.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScoringPolicy {
    pub bands: Vec<GradeBand>,
    pub pass_rule: PassRule,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            bands: vec![
                GradeBand {
                    grade: Grade::A,
                    min_percent: 80.0,
                },
                GradeBand {
                    grade: Grade::B,
                    min_percent: 70.0,
                },
                GradeBand {
                    grade: Grade::C,
                    min_percent: 60.0,
                },
                GradeBand {
                    grade: Grade::D,
                    min_percent: 50.0,
                },
                GradeBand {
                    grade: Grade::E,
                    min_percent: 40.0,
                },
                GradeBand {
                    grade: Grade::F,
                    min_percent: 0.0,
                },
            ],
            pass_rule: PassRule::FixedPercentage(40.0),
        }
    }
}

impl ScoringPolicy {
    /// Band lookup in isolation, so report code can re-derive a letter from a
    /// stored percentage without recomputing the whole score. First matching
    /// band wins; anything below the table falls back to F.
    pub fn determine_grade(&self, percentage: f64) -> Grade {
        for band in &self.bands {
            if percentage >= band.min_percent {
                return band.grade;
            }
        }
        Grade::F
    }

    pub fn validate(&self) -> Result<(), ScoreError> {
        if self.bands.is_empty() {
            return Err(ScoreError::new("bad_policy", "grade table is empty"));
        }
        let mut prev: Option<f64> = None;
        for band in &self.bands {
            if !(0.0..=100.0).contains(&band.min_percent) {
                return Err(ScoreError::new(
                    "bad_policy",
                    format!(
                        "band {} lower bound {} outside 0-100",
                        band.grade.as_str(),
                        band.min_percent
                    ),
                ));
            }
            if let Some(p) = prev {
                if band.min_percent >= p {
                    return Err(ScoreError::new(
                        "bad_policy",
                        "grade bands must be strictly descending",
                    ));
                }
            }
            prev = Some(band.min_percent);
        }
        if prev != Some(0.0) {
            return Err(ScoreError::new(
                "bad_policy",
                "bottom grade band must start at 0 so the table covers 0-100",
            ));
        }
        match &self.pass_rule {
            PassRule::FixedPercentage(cutoff) if !(0.0..=100.0).contains(cutoff) => Err(
                ScoreError::new("bad_policy", "pass percentage outside 0-100"),
            ),
            PassRule::ScreeningPassMarks(marks) if *marks < 0.0 => {
                Err(ScoreError::new("bad_policy", "pass marks must not be negative"))
            }
            _ => Ok(()),
        }
    }

    /// Config entry point: absent or null means the default table.
    pub fn from_json(raw: Option<&serde_json::Value>) -> Result<ScoringPolicy, ScoreError> {
        let Some(raw) = raw else {
            return Ok(ScoringPolicy::default());
        };
        if raw.is_null() {
            return Ok(ScoringPolicy::default());
        }
        let policy: ScoringPolicy = serde_json::from_value(raw.clone())
            .map_err(|e| ScoreError::new("bad_policy", e.to_string()))?;
        policy.validate()?;
        Ok(policy)
    }
}

/// Case-insensitive match between a submitted value and the answer key.
/// Explicit ASCII-uppercase normalization on both sides; no locale rules.
fn answers_match(selected: &str, correct: &str) -> bool {
    selected.trim().to_ascii_uppercase() == correct.trim().to_ascii_uppercase()
}

fn is_blank(selected: Option<&str>) -> bool {
    selected.map(|s| s.trim().is_empty()).unwrap_or(true)
}

struct SubjectAccum {
    subject: Subject,
    total_questions: usize,
    correct_answers: usize,
    score: f64,
    max_score: f64,
}

/// Scores one submission against the authoritative question set.
///
/// Pure over its arguments: no I/O, deterministic, and it never fails on
/// malformed input. Answers with no matching question are ignored; questions
/// with no usable answer count as unanswered. Neither list needs to be in
/// any particular order.
pub fn compute_score(
    candidate_id: &str,
    answers: &[Answer],
    questions: &[Question],
    time_taken_seconds: u32,
    policy: &ScoringPolicy,
) -> ScoreResult {
    // First non-blank selection per question wins; blanks stay unanswered.
    let mut selected_by_question: HashMap<&str, &str> = HashMap::new();
    for a in answers {
        if is_blank(a.selected.as_deref()) {
            continue;
        }
        if let Some(sel) = a.selected.as_deref() {
            selected_by_question
                .entry(a.question_id.as_str())
                .or_insert(sel);
        }
    }

    let mut total_score = 0.0_f64;
    let mut max_score = 0.0_f64;
    let mut correct_answers: usize = 0;
    let mut wrong_answers: usize = 0;
    let mut unanswered_questions: usize = 0;

    // Subject aggregates in first-appearance order so output is stable.
    let mut index_by_subject: HashMap<&str, usize> = HashMap::new();
    let mut accums: Vec<SubjectAccum> = Vec::new();

    for q in questions {
        max_score += q.marks;

        let idx = *index_by_subject
            .entry(q.subject.id.as_str())
            .or_insert_with(|| {
                accums.push(SubjectAccum {
                    subject: q.subject.clone(),
                    total_questions: 0,
                    correct_answers: 0,
                    score: 0.0,
                    max_score: 0.0,
                });
                accums.len() - 1
            });
        let acc = &mut accums[idx];
        acc.total_questions += 1;
        acc.max_score += q.marks;

        match selected_by_question.get(q.id.as_str()) {
            None => unanswered_questions += 1,
            Some(sel) => {
                if answers_match(sel, &q.correct_answer) {
                    correct_answers += 1;
                    total_score += q.marks;
                    acc.correct_answers += 1;
                    acc.score += q.marks;
                } else {
                    wrong_answers += 1;
                }
            }
        }
    }

    let percentage = if max_score > 0.0 {
        round_off_2_decimals(100.0 * total_score / max_score)
    } else {
        0.0
    };

    let subject_breakdown: Vec<SubjectScore> = accums
        .into_iter()
        .map(|acc| {
            let percentage = if acc.max_score > 0.0 {
                round_off_2_decimals(100.0 * acc.score / acc.max_score)
            } else {
                0.0
            };
            SubjectScore {
                subject: acc.subject,
                total_questions: acc.total_questions,
                correct_answers: acc.correct_answers,
                score: acc.score,
                max_score: acc.max_score,
                percentage,
            }
        })
        .collect();

    let grade = policy.determine_grade(percentage);
    let status = if policy.pass_rule.passed(total_score, percentage) {
        TestStatus::Passed
    } else {
        TestStatus::Failed
    };

    tracing::debug!(
        candidate_id,
        total_score,
        max_score,
        percentage,
        grade = grade.as_str(),
        status = status.as_str(),
        "computed screening score"
    );

    ScoreResult {
        candidate_id: candidate_id.to_string(),
        total_score,
        max_score,
        percentage,
        correct_answers,
        wrong_answers,
        unanswered_questions,
        time_taken_seconds,
        subject_breakdown,
        grade,
        status,
    }
}

/// Scores each submission independently against the same question set.
/// Output order matches input order; one submission never influences
/// another's result.
pub fn batch_compute(
    submissions: &[Submission],
    questions: &[Question],
    policy: &ScoringPolicy,
) -> Vec<ScoreResult> {
    submissions
        .iter()
        .map(|s| {
            compute_score(
                &s.candidate_id,
                &s.answers,
                questions,
                s.time_taken_seconds,
                policy,
            )
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_off_keeps_two_decimals() {
        assert_eq!(round_off_2_decimals(0.0), 0.0);
        assert_eq!(round_off_2_decimals(66.66666), 66.67);
        assert_eq!(round_off_2_decimals(33.333), 33.33);
        assert_eq!(round_off_2_decimals(79.996), 80.0);
    }

    #[test]
    fn answer_match_is_case_insensitive_and_trimmed() {
        assert!(answers_match("b", "B"));
        assert!(answers_match(" c ", "C"));
        assert!(answers_match("Option A", "OPTION A"));
        assert!(!answers_match("A", "B"));
    }

    #[test]
    fn blank_selections_are_unanswered() {
        assert!(is_blank(None));
        assert!(is_blank(Some("")));
        assert!(is_blank(Some("   ")));
        assert!(!is_blank(Some("A")));
    }

    #[test]
    fn default_table_matches_legacy_bands() {
        let policy = ScoringPolicy::default();
        policy.validate().expect("default policy valid");
        assert_eq!(policy.determine_grade(100.0), Grade::A);
        assert_eq!(policy.determine_grade(80.0), Grade::A);
        assert_eq!(policy.determine_grade(79.99), Grade::B);
        assert_eq!(policy.determine_grade(40.0), Grade::E);
        assert_eq!(policy.determine_grade(39.99), Grade::F);
        assert_eq!(policy.determine_grade(0.0), Grade::F);
        // Below-table input falls back to F rather than erroring.
        assert_eq!(policy.determine_grade(-1.0), Grade::F);
    }

    #[test]
    fn policy_validation_rejects_bad_tables() {
        let mut policy = ScoringPolicy::default();
        policy.bands.reverse();
        assert!(policy.validate().is_err());

        let mut policy = ScoringPolicy::default();
        policy.bands.pop();
        assert!(policy.validate().is_err(), "table must reach 0");

        let mut policy = ScoringPolicy::default();
        policy.bands[0].min_percent = 120.0;
        assert!(policy.validate().is_err());

        let mut policy = ScoringPolicy::default();
        policy.pass_rule = PassRule::ScreeningPassMarks(-5.0);
        assert!(policy.validate().is_err());
    }

    #[test]
    fn policy_from_json_defaults_on_null() {
        let parsed = ScoringPolicy::from_json(None).expect("parse none");
        assert_eq!(parsed, ScoringPolicy::default());
        let parsed =
            ScoringPolicy::from_json(Some(&serde_json::Value::Null)).expect("parse null");
        assert_eq!(parsed, ScoringPolicy::default());
    }

    #[test]
    fn policy_from_json_roundtrips_and_validates() {
        let raw = serde_json::to_value(ScoringPolicy::default()).expect("to json");
        let parsed = ScoringPolicy::from_json(Some(&raw)).expect("parse policy");
        assert_eq!(parsed, ScoringPolicy::default());

        let bad = serde_json::json!({
            "bands": [
                { "grade": "A", "minPercent": 50.0 },
                { "grade": "B", "minPercent": 60.0 }
            ],
            "passRule": { "rule": "fixedPercentage", "value": 40.0 }
        });
        let err = ScoringPolicy::from_json(Some(&bad)).expect_err("ascending bands rejected");
        assert_eq!(err.code, "bad_policy");
    }
}
