//! Loading and preprocessing of the raw student/course tables.
//!
//! Raw identifiers are mapped onto dense integer ids by [`IdEncoder`] so the
//! factorization model can index factor vectors directly. Ids are assigned in
//! lexicographic order of the raw labels, which keeps them reproducible for a
//! given input regardless of row order.

use crate::error::{RecsysError, Result};
use crate::models::{CourseRecord, CourseTable, Interaction, InteractionTable};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, info};

/// Bijection between raw string labels and dense ids `0..len`.
/// Fit once, immutable afterwards.
#[derive(Debug, Clone)]
pub struct IdEncoder {
    forward: HashMap<String, usize>,
    inverse: Vec<String>,
}

impl IdEncoder {
    /// Fit over the distinct labels in `values`, assigning ids in sorted
    /// label order.
    pub fn fit<I, S>(values: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut labels: Vec<String> = values
            .into_iter()
            .map(|v| v.as_ref().to_string())
            .collect();
        labels.sort();
        labels.dedup();

        let forward = labels
            .iter()
            .enumerate()
            .map(|(id, label)| (label.clone(), id))
            .collect();

        Self {
            forward,
            inverse: labels,
        }
    }

    pub fn encode(&self, label: &str) -> Option<usize> {
        self.forward.get(label).copied()
    }

    pub fn decode(&self, id: usize) -> Result<&str> {
        self.inverse
            .get(id)
            .map(String::as_str)
            .ok_or(RecsysError::UnknownId {
                kind: "encoded",
                id,
                size: self.inverse.len(),
            })
    }

    pub fn len(&self) -> usize {
        self.inverse.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inverse.is_empty()
    }

    pub fn labels(&self) -> &[String] {
        &self.inverse
    }
}

#[derive(Debug, Deserialize)]
struct RawInteractionRow {
    #[serde(rename = "Student_ID")]
    student_id: Option<String>,
    #[serde(rename = "Course_Name")]
    course_name: Option<String>,
    #[serde(rename = "Final_Exam_Score")]
    final_exam_score: Option<String>,
}

impl RawInteractionRow {
    /// A row survives only when all three fields are present and the score
    /// parses as a number.
    fn clean(self) -> Option<(String, String, f32)> {
        let student = self.student_id.filter(|s| !s.trim().is_empty())?;
        let course = self.course_name.filter(|s| !s.trim().is_empty())?;
        let score: f32 = self.final_exam_score?.trim().parse().ok()?;
        Some((student, course, score))
    }
}

#[derive(Debug, Deserialize)]
struct RawCourseRow {
    title: String,
    subject: Option<String>,
    level: Option<String>,
}

/// Everything the preprocessor produces; immutable inputs to training and
/// recommendation.
#[derive(Debug, Clone)]
pub struct PreprocessOutput {
    pub interactions: InteractionTable,
    pub user_encoder: IdEncoder,
    pub course_encoder: IdEncoder,
    pub courses: CourseTable,
}

/// Load the interaction and course-metadata CSVs, drop incomplete rows, fit
/// both encoders, and emit the normalized interaction table.
pub fn load_and_preprocess(
    interactions_path: impl AsRef<Path>,
    metadata_path: impl AsRef<Path>,
) -> Result<PreprocessOutput> {
    let cleaned = load_interaction_rows(interactions_path.as_ref())?;
    let courses = load_course_table(metadata_path.as_ref())?;

    let user_encoder = IdEncoder::fit(cleaned.iter().map(|(s, _, _)| s));
    let course_encoder = IdEncoder::fit(cleaned.iter().map(|(_, c, _)| c));

    // Cleaned rows only carry labels the encoders were just fit on.
    let rows = cleaned
        .iter()
        .map(|(student, course, score)| {
            let user_id = user_encoder.encode(student).ok_or_else(|| {
                RecsysError::DataLoad(format!("student {student:?} missing from encoder"))
            })?;
            let course_id = course_encoder.encode(course).ok_or_else(|| {
                RecsysError::DataLoad(format!("course {course:?} missing from encoder"))
            })?;
            Ok(Interaction::new(user_id, course_id, *score))
        })
        .collect::<Result<Vec<_>>>()?;

    info!(
        interactions = rows.len(),
        users = user_encoder.len(),
        courses = course_encoder.len(),
        "preprocessing complete"
    );

    Ok(PreprocessOutput {
        interactions: InteractionTable::new(rows),
        user_encoder,
        course_encoder,
        courses,
    })
}

fn load_interaction_rows(path: &Path) -> Result<Vec<(String, String, f32)>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut cleaned = Vec::new();
    let mut dropped = 0usize;
    for row in reader.deserialize::<RawInteractionRow>() {
        match row?.clean() {
            Some(entry) => cleaned.push(entry),
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        debug!(dropped, "dropped interaction rows with missing fields");
    }
    Ok(cleaned)
}

fn load_course_table(path: &Path) -> Result<CourseTable> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    let mut records = Vec::new();
    for row in reader.deserialize::<RawCourseRow>() {
        let row = row?;
        records.push(CourseRecord {
            title: row.title,
            subject: row.subject.unwrap_or_default(),
            level: row.level.unwrap_or_default(),
        });
    }
    Ok(CourseTable::new(records))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_temp(contents: &str) -> tempfile::NamedTempFile {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(contents.as_bytes()).unwrap();
        file
    }

    #[test]
    fn test_encoder_round_trip() {
        let encoder = IdEncoder::fit(["S3", "S1", "S2", "S1"]);
        assert_eq!(encoder.len(), 3);
        for label in ["S1", "S2", "S3"] {
            let id = encoder.encode(label).unwrap();
            assert_eq!(encoder.decode(id).unwrap(), label);
        }
        assert!(encoder.decode(3).is_err());
        assert!(encoder.encode("S9").is_none());
    }

    #[test]
    fn test_encoder_sorted_assignment() {
        let encoder = IdEncoder::fit(["Chemistry", "Algebra", "Biology"]);
        assert_eq!(encoder.encode("Algebra"), Some(0));
        assert_eq!(encoder.encode("Biology"), Some(1));
        assert_eq!(encoder.encode("Chemistry"), Some(2));
    }

    #[test]
    fn test_load_and_preprocess_drops_incomplete_rows() {
        let interactions = write_temp(
            "Student_ID,Course_Name,Final_Exam_Score\n\
             s1,Algebra,90\n\
             ,Algebra,50\n\
             s2,,60\n\
             s2,Biology,\n\
             s2,Biology,85\n\
             s3,Algebra,not-a-number\n",
        );
        let metadata = write_temp("title,subject,level\nAlgebra,Math,Intro\n");

        let out = load_and_preprocess(interactions.path(), metadata.path()).unwrap();
        assert_eq!(out.interactions.len(), 2);
        assert_eq!(out.user_encoder.len(), 2);
        assert_eq!(out.course_encoder.len(), 2);

        // Id ranges are contiguous from zero.
        for row in out.interactions.rows() {
            assert!(row.user_id < out.user_encoder.len());
            assert!(row.course_id < out.course_encoder.len());
        }
    }

    #[test]
    fn test_preprocess_preserves_row_order() {
        let interactions = write_temp(
            "Student_ID,Course_Name,Final_Exam_Score\n\
             s2,Biology,85\n\
             s1,Algebra,90\n",
        );
        let metadata = write_temp("title,subject,level\n");

        let out = load_and_preprocess(interactions.path(), metadata.path()).unwrap();
        let rows = out.interactions.rows();
        assert_eq!(rows[0].rating, 85.0);
        assert_eq!(rows[1].rating, 90.0);
    }

    #[test]
    fn test_missing_file_is_data_load_error() {
        let metadata = write_temp("title,subject,level\n");
        let err = load_and_preprocess("/nonexistent/interactions.csv", metadata.path())
            .unwrap_err();
        assert!(matches!(err, RecsysError::DataLoad(_)));
    }
}
