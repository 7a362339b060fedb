use screenscore::{
    batch_compute, compute_score, Answer, Question, ScoringPolicy, Subject, Submission,
};

fn subject(id: &str, code: &str) -> Subject {
    Subject {
        id: id.to_string(),
        name: format!("{} subject", code),
        code: code.to_string(),
    }
}

fn question(id: &str, subj: &Subject, correct: &str, marks: f64) -> Question {
    Question {
        id: id.to_string(),
        text: format!("Question {}", id),
        options: vec!["A".into(), "B".into(), "C".into(), "D".into()],
        correct_answer: correct.to_string(),
        marks,
        subject: subj.clone(),
    }
}

fn answer(question_id: &str, selected: Option<&str>) -> Answer {
    Answer {
        question_id: question_id.to_string(),
        selected: selected.map(|s| s.to_string()),
        time_spent_seconds: None,
    }
}

fn test_questions() -> Vec<Question> {
    let cs = subject("s1", "CS");
    vec![
        question("q1", &cs, "A", 5.0),
        question("q2", &cs, "B", 5.0),
    ]
}

#[test]
fn output_order_matches_input_order() {
    let questions = test_questions();
    let submissions = vec![
        Submission {
            candidate_id: "cand-b".to_string(),
            answers: vec![answer("q1", Some("A")), answer("q2", Some("B"))],
            time_taken_seconds: 120,
        },
        Submission {
            candidate_id: "cand-a".to_string(),
            answers: vec![answer("q1", Some("C"))],
            time_taken_seconds: 45,
        },
    ];

    let results = batch_compute(&submissions, &questions, &ScoringPolicy::default());

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].candidate_id, "cand-b");
    assert_eq!(results[1].candidate_id, "cand-a");
    assert_eq!(results[0].total_score, 10.0);
    assert_eq!(results[1].total_score, 0.0);
}

#[test]
fn each_submission_matches_a_standalone_compute() {
    let questions = test_questions();
    let submissions = vec![
        Submission {
            candidate_id: "cand-1".to_string(),
            answers: vec![answer("q1", Some("A"))],
            time_taken_seconds: 80,
        },
        Submission {
            candidate_id: "cand-2".to_string(),
            answers: vec![answer("q1", Some("B")), answer("q2", Some("B"))],
            time_taken_seconds: 200,
        },
    ];
    let policy = ScoringPolicy::default();

    let batched = batch_compute(&submissions, &questions, &policy);
    for (submission, batch_result) in submissions.iter().zip(&batched) {
        let standalone = compute_score(
            &submission.candidate_id,
            &submission.answers,
            &questions,
            submission.time_taken_seconds,
            &policy,
        );
        assert_eq!(*batch_result, standalone);
    }
}

#[test]
fn empty_batch_gives_empty_output() {
    let questions = test_questions();
    let results = batch_compute(&[], &questions, &ScoringPolicy::default());
    assert!(results.is_empty());
}
