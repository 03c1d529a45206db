use std::sync::Arc;
use std::time::Duration;

use super::{Difference, EvaluationError, EvaluationReport, Evaluator, TeacherLabel};
use crate::embedding::MockEmbedder;
use crate::grading::{CancelHandle, Submission};
use crate::marking::{MarkingEngine, RubricSet, Thresholds};

const NUCLEUS: &str = "cell has nucleus";
const MITO: &str = "mitochondria produces energy";

fn embedder() -> MockEmbedder {
    MockEmbedder::new(3)
        .with_vector(NUCLEUS, vec![1.0, 0.0, 0.0])
        .with_vector(MITO, vec![0.0, 1.0, 0.0])
        .with_vector("the nucleus holds dna", vec![0.95, 0.1, 0.0])
        .with_vector("mitochondria make atp", vec![0.1, 0.95, 0.0])
        .with_vector("both: nucleus and mitochondria", vec![0.7, 0.7, 0.0])
        .with_vector("plants are green", vec![0.0, 0.0, 1.0])
}

fn rubrics() -> RubricSet {
    RubricSet::new().with_rubric("q1", &[MITO, NUCLEUS], Some(2))
}

fn evaluator(embedder: MockEmbedder) -> Evaluator<MockEmbedder> {
    Evaluator::new(MarkingEngine::new(embedder))
}

fn three_submissions() -> Vec<Submission> {
    vec![
        Submission::new("s1", "q1", "the nucleus holds dna"),
        Submission::new("s2", "q1", "both: nucleus and mitochondria"),
        Submission::new("s3", "q1", "plants are green"),
    ]
}

#[tokio::test]
async fn test_two_of_three_agree() {
    let labels = vec![
        TeacherLabel::new("s1", "q1", 1),
        TeacherLabel::new("s2", "q1", 2),
        TeacherLabel::new("s3", "q1", 1),
    ];

    let report = evaluator(embedder())
        .evaluate(&rubrics(), &three_submissions(), &labels, &Thresholds::default())
        .await;

    assert_eq!(report.total, 3);
    assert_eq!(report.correct, 2);
    let accuracy = report.accuracy.expect("labeled data");
    assert!((accuracy - 2.0 / 3.0).abs() < 1e-9);
    assert_eq!(report.differences.len(), 3);
    assert_eq!(
        report.mismatches().collect::<Vec<_>>(),
        vec![&Difference {
            student_id: "s3".to_string(),
            qid: "q1".to_string(),
            awarded: 0,
            teacher: 1,
        }]
    );
    assert!(report.summary().contains("Exact match accuracy: 0.667"));
}

#[tokio::test]
async fn test_no_overlap_reports_no_data() {
    let labels = vec![TeacherLabel::new("other", "q1", 1)];
    let embedder = Arc::new(embedder());

    let report = Evaluator::new(MarkingEngine::from_shared(embedder.clone()))
        .evaluate(&rubrics(), &three_submissions(), &labels, &Thresholds::default())
        .await;

    assert_eq!(report.total, 0);
    assert_eq!(report.accuracy, None);
    assert!(!report.has_labeled_data());
    assert_eq!(report.skipped, 3);
    assert_eq!(embedder.call_count(), 0);
    assert!(report.summary().contains("No matching teacher labels found"));
}

#[tokio::test]
async fn test_empty_inputs_report_no_data() {
    let report = evaluator(embedder())
        .evaluate(&rubrics(), &[], &[], &Thresholds::default())
        .await;

    assert_eq!(report, EvaluationReport::default());
}

#[tokio::test]
async fn test_unlabeled_submissions_are_skipped_not_graded() {
    let labels = vec![TeacherLabel::new("s1", "q1", 1)];
    let embedder = Arc::new(embedder());

    let report = Evaluator::new(MarkingEngine::from_shared(embedder.clone()))
        .evaluate(&rubrics(), &three_submissions(), &labels, &Thresholds::default())
        .await;

    assert_eq!(report.total, 1);
    assert_eq!(report.correct, 1);
    assert_eq!(report.skipped, 2);
    assert_eq!(embedder.batch_sizes(), vec![1, 2]);
}

#[tokio::test]
async fn test_unknown_question_on_unlabeled_submission_is_ignored() {
    let mut submissions = three_submissions();
    submissions.push(Submission::new("s4", "q404", "anything"));
    let labels = vec![TeacherLabel::new("s1", "q1", 1)];

    let report = evaluator(embedder())
        .evaluate(&rubrics(), &submissions, &labels, &Thresholds::default())
        .await;

    assert!(report.failures.is_empty());
    assert_eq!(report.skipped, 3);
}

#[tokio::test]
async fn test_failures_excluded_from_total() {
    let submissions = vec![
        Submission::new("s1", "q1", "the nucleus holds dna"),
        Submission::new("s1", "q404", "anything"),
    ];
    let labels = vec![
        TeacherLabel::new("s1", "q1", 1),
        TeacherLabel::new("s1", "q404", 0),
    ];

    let report = evaluator(embedder())
        .evaluate(&rubrics(), &submissions, &labels, &Thresholds::default())
        .await;

    assert_eq!(report.total, 1);
    assert_eq!(report.correct, 1);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].qid, "q404");
    assert_eq!(report.failures[0].kind, "unknown_question");
    assert!(report.summary().contains("Failed to grade: 1"));
}

#[tokio::test]
async fn test_embedding_failure_is_not_scored_as_zero() {
    let labels = vec![TeacherLabel::new("s3", "q1", 0)];

    let report = evaluator(MockEmbedder::new(3).failing("gpu lost"))
        .evaluate(&rubrics(), &three_submissions(), &labels, &Thresholds::default())
        .await;

    assert_eq!(report.total, 0);
    assert_eq!(report.correct, 0);
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, "embedding_unavailable");
}

#[tokio::test]
async fn test_last_duplicate_label_wins() {
    let labels = vec![
        TeacherLabel::new("s1", "q1", 0),
        TeacherLabel::new("s1", "q1", 1),
    ];
    let submissions = vec![Submission::new("s1", "q1", "the nucleus holds dna")];

    let report = evaluator(embedder())
        .evaluate(&rubrics(), &submissions, &labels, &Thresholds::default())
        .await;

    assert_eq!(report.total, 1);
    assert_eq!(report.correct, 1);
    assert_eq!(report.differences[0].teacher, 1);
}

#[tokio::test]
async fn test_differences_bounded_but_totals_complete() {
    let submissions: Vec<Submission> = (0..30)
        .map(|i| Submission::new(format!("s{i}"), "q1", "the nucleus holds dna"))
        .collect();
    let labels: Vec<TeacherLabel> = (0..30i64)
        .map(|i| TeacherLabel::new(format!("s{i}"), "q1", i % 2))
        .collect();

    let report = evaluator(embedder())
        .with_sample_limit(5)
        .evaluate(&rubrics(), &submissions, &labels, &Thresholds::default())
        .await;

    assert_eq!(report.total, 30);
    assert_eq!(report.correct, 15);
    assert_eq!(report.differences.len(), 5);
    assert_eq!(report.differences[0].student_id, "s0");
    assert_eq!(report.differences[4].student_id, "s4");
}

#[tokio::test]
async fn test_default_sample_limit_is_twenty() {
    let submissions: Vec<Submission> = (0..25)
        .map(|i| Submission::new(format!("s{i}"), "q1", "plants are green"))
        .collect();
    let labels: Vec<TeacherLabel> = (0..25)
        .map(|i| TeacherLabel::new(format!("s{i}"), "q1", 0))
        .collect();

    let report = evaluator(embedder())
        .evaluate(&rubrics(), &submissions, &labels, &Thresholds::default())
        .await;

    assert_eq!(report.total, 25);
    assert_eq!(report.accuracy, Some(1.0));
    assert_eq!(report.differences.len(), 20);
}

#[tokio::test]
async fn test_evaluation_is_deterministic() {
    let labels = vec![
        TeacherLabel::new("s1", "q1", 1),
        TeacherLabel::new("s2", "q1", 1),
        TeacherLabel::new("s3", "q1", 0),
    ];
    let evaluator = evaluator(embedder()).with_max_concurrent_batches(3);

    let first = evaluator
        .evaluate(&rubrics(), &three_submissions(), &labels, &Thresholds::default())
        .await;
    let second = evaluator
        .evaluate(&rubrics(), &three_submissions(), &labels, &Thresholds::default())
        .await;

    assert_eq!(first, second);
}

#[tokio::test]
async fn test_cancelled_run_returns_no_report() {
    let labels = vec![
        TeacherLabel::new("s1", "q1", 1),
        TeacherLabel::new("s1", "q2", 1),
    ];
    let submissions = vec![
        Submission::new("s1", "q1", "the nucleus holds dna"),
        Submission::new("s1", "q2", "mitochondria make atp"),
    ];
    let rubrics = rubrics().with_rubric("q2", &[MITO], None);
    let cancel = CancelHandle::new();
    cancel.cancel();

    let err = evaluator(embedder())
        .evaluate_with_cancel(&rubrics, &submissions, &labels, &Thresholds::default(), &cancel)
        .await
        .unwrap_err();

    let EvaluationError::Cancelled(cancelled) = err;
    assert_eq!(cancelled.processed_batches, 0);
    assert_eq!(cancelled.total_batches, 2);
}

#[tokio::test]
async fn test_cancel_during_run_discards_partial_totals() {
    let labels = vec![
        TeacherLabel::new("s1", "q1", 1),
        TeacherLabel::new("s1", "q2", 1),
    ];
    let submissions = vec![
        Submission::new("s1", "q1", "the nucleus holds dna"),
        Submission::new("s1", "q2", "mitochondria make atp"),
    ];
    let rubrics = rubrics().with_rubric("q2", &[MITO], None);
    let evaluator = evaluator(embedder().with_latency(Duration::from_millis(100)))
        .with_max_concurrent_batches(1);
    let cancel = CancelHandle::new();

    let thresholds = Thresholds::default();
    let canceller = cancel.clone();
    let (outcome, _) = tokio::join!(
        evaluator.evaluate_with_cancel(&rubrics, &submissions, &labels, &thresholds, &cancel),
        async move {
            tokio::time::sleep(Duration::from_millis(50)).await;
            canceller.cancel();
        }
    );

    assert!(matches!(outcome, Err(EvaluationError::Cancelled(_))));
}

#[tokio::test]
async fn test_uncancelled_run_matches_evaluate() {
    let labels = vec![TeacherLabel::new("s1", "q1", 1)];
    let evaluator = evaluator(embedder());

    let plain = evaluator
        .evaluate(&rubrics(), &three_submissions(), &labels, &Thresholds::default())
        .await;
    let cancellable = evaluator
        .evaluate_with_cancel(
            &rubrics(),
            &three_submissions(),
            &labels,
            &Thresholds::default(),
            &CancelHandle::new(),
        )
        .await
        .expect("not cancelled");

    assert_eq!(plain, cancellable);
}

#[test]
fn test_difference_agreement_is_exact() {
    let difference = Difference {
        student_id: "s1".into(),
        qid: "q1".into(),
        awarded: 2,
        teacher: 2,
    };
    assert!(difference.agrees());

    let negative = Difference {
        teacher: -2,
        ..difference
    };
    assert!(!negative.agrees());
}

#[test]
fn test_labels_deserialize_record_shape() {
    let json = r#"[{"student_id": "s1", "qid": "q1", "teacher_mark": 2}]"#;
    let labels: Vec<TeacherLabel> = serde_json::from_str(json).expect("parse");
    assert_eq!(labels, vec![TeacherLabel::new("s1", "q1", 2)]);
}

#[test]
fn test_report_serializes_null_accuracy() {
    let value = serde_json::to_value(EvaluationReport::default()).expect("serialize");
    assert!(value["accuracy"].is_null());
    assert_eq!(value["total"], 0);
}
