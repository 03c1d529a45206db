//! Integration tests for evaluation against teacher labels.

mod common;

use common::fixtures::{biology_embedder, write_data_dir};
use rubric::{
    CancelHandle, DataDir, EvaluationError, Evaluator, GraderConfig, MarkingEngine,
    SentenceEmbedderConfig, SharedEmbedder, TeacherLabel, Thresholds,
};

#[tokio::test]
async fn test_evaluate_from_data_dir() {
    let dir = write_data_dir();
    let data = DataDir::new(dir.path());
    let rubrics = data.rubrics().expect("Rubrics should load");
    let submissions = data.submissions().expect("Submissions should load");
    let labels = data.teacher_labels().expect("Labels should load");

    let report = Evaluator::new(MarkingEngine::new(biology_embedder()))
        .evaluate(&rubrics, &submissions, &labels, &Thresholds::default())
        .await;

    assert_eq!(report.total, 5);
    assert_eq!(report.correct, 4);
    assert_eq!(report.accuracy, Some(0.8));
    assert_eq!(report.skipped, 1);
    assert!(report.failures.is_empty());

    let mismatches: Vec<_> = report.mismatches().collect();
    assert_eq!(mismatches.len(), 1);
    assert_eq!(mismatches[0].student_id, "s2");
    assert_eq!(mismatches[0].awarded, 2);
    assert_eq!(mismatches[0].teacher, 1);
}

#[tokio::test]
async fn test_report_json_shape() {
    let dir = write_data_dir();
    let data = DataDir::new(dir.path());
    let rubrics = data.rubrics().expect("Rubrics should load");
    let submissions = data.submissions().expect("Submissions should load");
    let labels = data.teacher_labels().expect("Labels should load");

    let report = Evaluator::new(MarkingEngine::new(biology_embedder()))
        .with_sample_limit(2)
        .evaluate(&rubrics, &submissions, &labels, &Thresholds::default())
        .await;

    let value = serde_json::to_value(&report).expect("Report should serialize");
    assert_eq!(value["total"], 5);
    assert_eq!(value["correct"], 4);
    assert_eq!(value["accuracy"], 0.8);
    let differences = value["differences"].as_array().expect("array");
    assert_eq!(differences.len(), 2);
    assert_eq!(differences[0]["student_id"], "s1");
    assert_eq!(differences[0]["qid"], "q1");
    assert_eq!(differences[0]["awarded"], 1);
    assert_eq!(differences[0]["teacher"], 1);
}

#[tokio::test]
async fn test_summary_text() {
    let dir = write_data_dir();
    let data = DataDir::new(dir.path());

    let report = Evaluator::new(MarkingEngine::new(biology_embedder()))
        .evaluate(
            &data.rubrics().expect("rubrics"),
            &data.submissions().expect("submissions"),
            &data.teacher_labels().expect("labels"),
            &Thresholds::default(),
        )
        .await;

    let summary = report.summary();
    assert!(summary.starts_with("Evaluation Results"));
    assert!(summary.contains("Total compared: 5"));
    assert!(summary.contains("Exact match accuracy: 0.800"));
    assert!(summary.contains("Skipped (no teacher label): 1"));
}

#[tokio::test]
async fn test_no_labels_is_not_an_error() {
    let dir = write_data_dir();
    let data = DataDir::new(dir.path());
    let labels: Vec<TeacherLabel> = Vec::new();

    let report = Evaluator::new(MarkingEngine::new(biology_embedder()))
        .evaluate(
            &data.rubrics().expect("rubrics"),
            &data.submissions().expect("submissions"),
            &labels,
            &Thresholds::default(),
        )
        .await;

    assert_eq!(report.total, 0);
    assert_eq!(report.accuracy, None);
    assert_eq!(report.skipped, 6);
    assert!(report.summary().contains("No matching teacher labels found"));
}

#[tokio::test]
async fn test_cancelled_evaluation_yields_no_report() {
    let dir = write_data_dir();
    let data = DataDir::new(dir.path());
    let cancel = CancelHandle::new();
    cancel.cancel();

    let result = Evaluator::new(MarkingEngine::new(biology_embedder()))
        .evaluate_with_cancel(
            &data.rubrics().expect("rubrics"),
            &data.submissions().expect("submissions"),
            &data.teacher_labels().expect("labels"),
            &Thresholds::default(),
            &cancel,
        )
        .await;

    match result {
        Err(EvaluationError::Cancelled(cancelled)) => {
            assert_eq!(cancelled.processed_batches, 0);
            assert_eq!(cancelled.total_batches, 2);
        }
        Ok(report) => panic!("expected cancellation, got {report:?}"),
    }
}

#[tokio::test]
async fn test_config_driven_run_with_stub_embedder() {
    let dir = write_data_dir();
    let config = GraderConfig::default().with_data_dir(dir.path());
    config.validate().expect("Config should validate");
    assert!(config.embedder_config().testing_stub);

    let data = config.data();
    let engine = MarkingEngine::new(SharedEmbedder::new(SentenceEmbedderConfig::stub()))
        .with_timeout(config.embed_timeout);

    let report = Evaluator::new(engine)
        .with_sample_limit(config.sample_limit)
        .with_max_concurrent_batches(config.max_concurrent_batches)
        .evaluate(
            &data.rubrics().expect("rubrics"),
            &data.submissions().expect("submissions"),
            &data.teacher_labels().expect("labels"),
            &config.thresholds,
        )
        .await;

    assert_eq!(report.total + report.failures.len(), 5);
    assert!(report.accuracy.is_some());
}
