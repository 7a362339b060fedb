//! Scoring engine for a polytechnic candidate-screening system.
//!
//! The engine itself is pure: it takes a candidate's submitted answers and
//! the authoritative question set, and produces a [`score::ScoreResult`]
//! with per-subject breakdown, letter grade, and pass/fail status. The
//! surrounding web application (dashboards, CRUD, auth) lives elsewhere and
//! calls in through [`score::compute_score`]; [`store`] implements the
//! single-write handoff that puts a result onto the candidate's stored
//! record, and [`stats`] folds stored records into cohort reports.

pub mod score;
pub mod stats;
pub mod store;

pub use score::{
    batch_compute, compute_score, Answer, Grade, GradeBand, PassRule, Question, ScoreError,
    ScoreResult, ScoringPolicy, Subject, SubjectScore, Submission, TestStatus,
};
pub use stats::{cohort_stats, CandidateRecord, CohortStats, ProgramStats};
pub use store::{insert_candidate, load_candidates, open_db, record_result, NewCandidate};
