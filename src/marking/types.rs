use std::collections::BTreeMap;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::error::{MarkingError, MarkingResult};
use crate::constants::DEFAULT_THRESHOLDS;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
/// One canonical idea worth up to one mark.
pub struct RubricPoint(String);

impl RubricPoint {
    pub fn new(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    pub fn text(&self) -> &str {
        &self.0
    }
}

/// Validated rubric for one question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Rubric {
    qid: String,
    points: Vec<RubricPoint>,
    max_marks: u32,
}

impl Rubric {
    /// Builds a rubric; `max_marks` defaults to the number of points.
    ///
    /// Fails with [`MarkingError::MalformedRubric`] for a negative `max_marks` or
    /// for an empty point list paired with a nonzero `max_marks`.
    pub fn new(
        qid: impl Into<String>,
        points: Vec<String>,
        max_marks: Option<i64>,
    ) -> MarkingResult<Self> {
        let qid = qid.into();
        let max_marks = max_marks.unwrap_or(points.len() as i64);

        if max_marks < 0 {
            return Err(MarkingError::MalformedRubric {
                qid,
                reason: format!("max_marks must be >= 0, got {}", max_marks),
            });
        }

        let max_marks = u32::try_from(max_marks).map_err(|_| MarkingError::MalformedRubric {
            qid: qid.clone(),
            reason: format!("max_marks {} is out of range", max_marks),
        })?;

        if points.is_empty() && max_marks > 0 {
            return Err(MarkingError::MalformedRubric {
                qid,
                reason: format!("no rubric points but max_marks is {}", max_marks),
            });
        }

        Ok(Self {
            qid,
            points: points.into_iter().map(RubricPoint::new).collect(),
            max_marks,
        })
    }

    pub fn qid(&self) -> &str {
        &self.qid
    }

    pub fn points(&self) -> &[RubricPoint] {
        &self.points
    }

    pub fn max_marks(&self) -> u32 {
        self.max_marks
    }

    /// Returns `true` if the rubric has no points (always scores 0/0).
    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub(crate) fn point_texts(&self) -> Vec<String> {
        self.points.iter().map(|p| p.text().to_string()).collect()
    }
}

/// Rubric record as stored: `{ points, max_marks }` plus optional question text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RubricEntry {
    pub points: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_marks: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<String>,
}

impl RubricEntry {
    pub fn new(points: Vec<String>, max_marks: Option<i64>) -> Self {
        Self {
            points,
            max_marks,
            question: None,
        }
    }
}

/// Mapping from question id to rubric record.
///
/// Entries are validated when resolved, so one malformed rubric only affects the
/// submissions that reference it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RubricSet {
    entries: BTreeMap<String, RubricEntry>,
}

impl RubricSet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, qid: impl Into<String>, entry: RubricEntry) {
        self.entries.insert(qid.into(), entry);
    }

    /// Builder-style insert.
    pub fn with_rubric(mut self, qid: &str, points: &[&str], max_marks: Option<i64>) -> Self {
        self.insert(
            qid,
            RubricEntry::new(points.iter().map(|p| p.to_string()).collect(), max_marks),
        );
        self
    }

    /// Resolves and validates the rubric for `qid`.
    pub fn rubric(&self, qid: &str) -> MarkingResult<Rubric> {
        let entry = self
            .entries
            .get(qid)
            .ok_or_else(|| MarkingError::UnknownQuestion {
                qid: qid.to_string(),
            })?;
        Rubric::new(qid, entry.points.clone(), entry.max_marks)
    }

    pub fn contains(&self, qid: &str) -> bool {
        self.entries.contains_key(qid)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn qids(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }
}

/// Similarity cutoffs, highest first.
///
/// Only [`gate`](Self::gate) (the lowest value) decides whether a point matches;
/// the full sequence is preserved for reporting.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct Thresholds(Vec<f32>);

impl Thresholds {
    /// Accepts a non-empty, finite, non-increasing sequence within `[-1, 1]`.
    pub fn new(values: Vec<f32>) -> MarkingResult<Self> {
        Self::check_values(&values)?;

        if let Some(pair) = values.windows(2).find(|w| w[0] < w[1]) {
            return Err(MarkingError::InvalidThresholds {
                reason: format!(
                    "thresholds must be ordered highest first ({} < {})",
                    pair[0], pair[1]
                ),
            });
        }

        Ok(Self(values))
    }

    /// Like [`new`](Self::new) but sorts the values highest first instead of
    /// rejecting an unordered sequence.
    pub fn sorted(mut values: Vec<f32>) -> MarkingResult<Self> {
        Self::check_values(&values)?;
        values.sort_by(|a, b| b.total_cmp(a));
        Ok(Self(values))
    }

    fn check_values(values: &[f32]) -> MarkingResult<()> {
        if values.is_empty() {
            return Err(MarkingError::InvalidThresholds {
                reason: "at least one threshold is required".to_string(),
            });
        }

        if let Some(bad) = values
            .iter()
            .find(|v| !v.is_finite() || !(-1.0..=1.0).contains(*v))
        {
            return Err(MarkingError::InvalidThresholds {
                reason: format!("threshold {} is outside [-1, 1]", bad),
            });
        }

        Ok(())
    }

    /// The lowest (most lenient) threshold, which gates matching.
    pub fn gate(&self) -> f32 {
        // Non-empty by construction.
        self.0[self.0.len() - 1]
    }

    /// Returns `true` if `similarity` clears the gate.
    pub fn is_match(&self, similarity: f32) -> bool {
        similarity >= self.gate()
    }

    pub fn values(&self) -> &[f32] {
        &self.0
    }
}

impl Default for Thresholds {
    fn default() -> Self {
        Self(DEFAULT_THRESHOLDS.to_vec())
    }
}

impl FromStr for Thresholds {
    type Err = MarkingError;

    /// Parses a comma-separated list such as `0.85,0.75,0.60`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let values = s
            .split(',')
            .map(str::trim)
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.parse::<f32>()
                    .map_err(|e| MarkingError::InvalidThresholds {
                        reason: format!("'{}' is not a number: {}", part, e),
                    })
            })
            .collect::<MarkingResult<Vec<f32>>>()?;

        Self::new(values)
    }
}

impl std::fmt::Display for Thresholds {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let parts: Vec<String> = self.0.iter().map(|v| format!("{:.2}", v)).collect();
        write!(f, "({})", parts.join(", "))
    }
}

/// Per-point evidence behind an awarded mark.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchDetails {
    /// Cosine similarity of the answer to every rubric point, in rubric order.
    pub similarities: Vec<f32>,
    /// Indices of the points whose similarity cleared the gate, ascending.
    pub matched_indices: Vec<usize>,
}

/// Awarded mark plus the evidence that produced it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GradingResult {
    awarded: u32,
    max_marks: u32,
    details: MatchDetails,
}

impl GradingResult {
    pub(crate) fn new(awarded: u32, max_marks: u32, details: MatchDetails) -> Self {
        debug_assert!(awarded <= max_marks);
        Self {
            awarded,
            max_marks,
            details,
        }
    }

    pub fn awarded(&self) -> u32 {
        self.awarded
    }

    pub fn max_marks(&self) -> u32 {
        self.max_marks
    }

    pub fn details(&self) -> &MatchDetails {
        &self.details
    }

    pub fn into_details(self) -> MatchDetails {
        self.details
    }

    pub fn similarities(&self) -> &[f32] {
        &self.details.similarities
    }

    pub fn matched_indices(&self) -> &[usize] {
        &self.details.matched_indices
    }

    /// Number of matched points before the `max_marks` cap.
    pub fn matched_count(&self) -> usize {
        self.details.matched_indices.len()
    }

    pub fn is_full_marks(&self) -> bool {
        self.awarded == self.max_marks
    }
}

impl std::fmt::Display for GradingResult {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}/{} ({} of {} points matched)",
            self.awarded,
            self.max_marks,
            self.matched_count(),
            self.details.similarities.len()
        )
    }
}
