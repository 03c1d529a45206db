//! JSON record files.
//!
//! A data directory holds three files:
//!
//! | File                   | Shape                                                   |
//! |------------------------|---------------------------------------------------------|
//! | `model_answers.json`   | `{ qid: { points: [string], max_marks?: int } }`        |
//! | `student_answers.json` | `[{ id, qid, answer }]`                                 |
//! | `teacher_labels.json`  | `[{ student_id, qid, teacher_mark }]`                   |

pub mod error;


pub use error::{DatasetError, DatasetResult};

use std::fs;
use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use tracing::debug;

use crate::constants::{MODEL_ANSWERS_FILE, STUDENT_ANSWERS_FILE, TEACHER_LABELS_FILE};
use crate::evaluation::TeacherLabel;
use crate::grading::Submission;
use crate::marking::RubricSet;

/// Reads and deserializes one JSON file.
pub fn read_json<T: DeserializeOwned>(path: &Path) -> DatasetResult<T> {
    let raw = fs::read_to_string(path).map_err(|source| DatasetError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    let value = serde_json::from_str(&raw).map_err(|source| DatasetError::Parse {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = raw.len(), "Loaded record file");
    Ok(value)
}

pub fn load_rubric_set(path: &Path) -> DatasetResult<RubricSet> {
    read_json(path)
}

pub fn load_submissions(path: &Path) -> DatasetResult<Vec<Submission>> {
    read_json(path)
}

pub fn load_teacher_labels(path: &Path) -> DatasetResult<Vec<TeacherLabel>> {
    read_json(path)
}

/// A directory laid out with the standard record file names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataDir {
    root: PathBuf,
}

impl DataDir {
    pub fn new<P: Into<PathBuf>>(root: P) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn model_answers_path(&self) -> PathBuf {
        self.root.join(MODEL_ANSWERS_FILE)
    }

    pub fn student_answers_path(&self) -> PathBuf {
        self.root.join(STUDENT_ANSWERS_FILE)
    }

    pub fn teacher_labels_path(&self) -> PathBuf {
        self.root.join(TEACHER_LABELS_FILE)
    }

    pub fn rubrics(&self) -> DatasetResult<RubricSet> {
        load_rubric_set(&self.model_answers_path())
    }

    pub fn submissions(&self) -> DatasetResult<Vec<Submission>> {
        load_submissions(&self.student_answers_path())
    }

    pub fn teacher_labels(&self) -> DatasetResult<Vec<TeacherLabel>> {
        load_teacher_labels(&self.teacher_labels_path())
    }
}
