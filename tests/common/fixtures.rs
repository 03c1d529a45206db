//! Test fixtures for integration tests.

use std::fs;

use rubric::MockEmbedder;
use tempfile::TempDir;

pub const MITO: &str = "mitochondria produces energy";
pub const NUCLEUS: &str = "cell has nucleus";
pub const LIGHT: &str = "plants absorb light";
pub const CHLOROPHYLL: &str = "chlorophyll is green";

pub const ONE_POINT: &str = "the cell contains a nucleus";
pub const TWO_POINTS: &str = "nucleus and mitochondria both";
pub const NO_POINTS: &str = "i do not know";
pub const BOTH_Q2_POINTS: &str = "leaves absorb light and are green from chlorophyll";

pub const EMBEDDING_DIM: usize = 4;

pub fn model_answers_json() -> String {
    serde_json::json!({
        "q1": {
            "question": "Describe two features of an animal cell.",
            "points": [MITO, NUCLEUS],
            "max_marks": 2
        },
        "q2": {
            "question": "How do plants make food?",
            "points": [LIGHT, CHLOROPHYLL],
            "max_marks": 1
        }
    })
    .to_string()
}

/// Six submissions: five gradable, one for a question with no rubric.
pub fn student_answers_json() -> String {
    serde_json::json!([
        { "id": "s1", "qid": "q1", "answer": ONE_POINT },
        { "id": "s2", "qid": "q1", "answer": TWO_POINTS },
        { "id": "s3", "qid": "q1", "answer": NO_POINTS },
        { "id": "s1", "qid": "q2", "answer": BOTH_Q2_POINTS },
        { "id": "s2", "qid": "q2", "answer": "" },
        { "id": "s3", "qid": "q404", "answer": "orphan answer" }
    ])
    .to_string()
}

/// Labels agreeing on four of the five gradable submissions (s2/q1 disagrees).
pub fn teacher_labels_json() -> String {
    serde_json::json!([
        { "student_id": "s1", "qid": "q1", "teacher_mark": 1 },
        { "student_id": "s2", "qid": "q1", "teacher_mark": 1 },
        { "student_id": "s3", "qid": "q1", "teacher_mark": 0 },
        { "student_id": "s1", "qid": "q2", "teacher_mark": 1 },
        { "student_id": "s2", "qid": "q2", "teacher_mark": 0 },
        { "student_id": "s9", "qid": "q1", "teacher_mark": 2 }
    ])
    .to_string()
}

/// A data directory holding the three record files.
pub fn write_data_dir() -> TempDir {
    let dir = TempDir::new().expect("Temp dir should be created");
    fs::write(dir.path().join("model_answers.json"), model_answers_json())
        .expect("Rubrics should be written");
    fs::write(
        dir.path().join("student_answers.json"),
        student_answers_json(),
    )
    .expect("Submissions should be written");
    fs::write(dir.path().join("teacher_labels.json"), teacher_labels_json())
        .expect("Labels should be written");
    dir
}

/// Mock embedder placing each rubric point on its own axis.
pub fn biology_embedder() -> MockEmbedder {
    MockEmbedder::new(EMBEDDING_DIM)
        .with_vector(NUCLEUS, vec![1.0, 0.0, 0.0, 0.0])
        .with_vector(MITO, vec![0.0, 1.0, 0.0, 0.0])
        .with_vector(LIGHT, vec![0.0, 0.0, 1.0, 0.0])
        .with_vector(CHLOROPHYLL, vec![0.0, 0.0, 0.0, 1.0])
        .with_vector(ONE_POINT, vec![0.9, 0.1, 0.0, 0.0])
        .with_vector(TWO_POINTS, vec![0.7, 0.7, 0.0, 0.0])
        .with_vector(NO_POINTS, vec![0.0, 0.0, 0.2, 0.1])
        .with_vector(BOTH_Q2_POINTS, vec![0.0, 0.0, 0.7, 0.7])
}
