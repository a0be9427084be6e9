use serde::{Deserialize, Serialize};
use std::collections::HashSet;

/// One student-course interaction after preprocessing. Ids are dense
/// integers assigned by the encoders; the rating is the raw final score.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Interaction {
    pub user_id: usize,
    pub course_id: usize,
    pub rating: f32,
}

impl Interaction {
    pub fn new(user_id: usize, course_id: usize, rating: f32) -> Self {
        Self {
            user_id,
            course_id,
            rating,
        }
    }
}

/// Normalized interaction table. Row order is the cleaned source order and
/// is preserved by every accessor; downstream tie-breaking depends on it.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractionTable {
    rows: Vec<Interaction>,
}

impl InteractionTable {
    pub fn new(rows: Vec<Interaction>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[Interaction] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Distinct course ids in first-seen order.
    pub fn course_ids(&self) -> Vec<usize> {
        let mut seen = HashSet::new();
        let mut ids = Vec::new();
        for row in &self.rows {
            if seen.insert(row.course_id) {
                ids.push(row.course_id);
            }
        }
        ids
    }

    /// Course ids the given user has already rated.
    pub fn rated_by(&self, user_id: usize) -> HashSet<usize> {
        self.rows
            .iter()
            .filter(|row| row.user_id == user_id)
            .map(|row| row.course_id)
            .collect()
    }
}

/// One row of the course metadata table.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub title: String,
    pub subject: String,
    pub level: String,
}

/// Course metadata reference table, keyed by exact title match.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CourseTable {
    records: Vec<CourseRecord>,
}

impl CourseTable {
    pub fn new(records: Vec<CourseRecord>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[CourseRecord] {
        &self.records
    }

    /// First record whose title matches exactly, if any.
    pub fn find_by_title(&self, title: &str) -> Option<&CourseRecord> {
        self.records.iter().find(|r| r.title == title)
    }
}

/// A single model prediction. `rui` carries the true rating when the pair
/// comes from a labeled test set, `None` for pure scoring.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Prediction {
    pub uid: usize,
    pub iid: usize,
    pub rui: Option<f32>,
    pub est: f32,
}

/// Descriptive metadata attached to a recommendation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseMeta {
    pub title: String,
    pub subject: String,
    pub level: String,
}

impl CourseMeta {
    /// Sentinel used when the course table has no row for a title.
    pub fn not_available(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            subject: "N/A".to_string(),
            level: "N/A".to_string(),
        }
    }
}

impl From<&CourseRecord> for CourseMeta {
    fn from(record: &CourseRecord) -> Self {
        Self {
            title: record.title.clone(),
            subject: record.subject.clone(),
            level: record.level.clone(),
        }
    }
}

/// One ranked recommendation for a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Recommendation {
    pub course_title: String,
    pub predicted_rating: f64,
    pub metadata: CourseMeta,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_course_ids_first_seen_order() {
        let table = InteractionTable::new(vec![
            Interaction::new(0, 2, 80.0),
            Interaction::new(0, 0, 60.0),
            Interaction::new(1, 2, 70.0),
            Interaction::new(1, 1, 90.0),
        ]);
        assert_eq!(table.course_ids(), vec![2, 0, 1]);
    }

    #[test]
    fn test_rated_by() {
        let table = InteractionTable::new(vec![
            Interaction::new(0, 0, 50.0),
            Interaction::new(1, 1, 60.0),
            Interaction::new(0, 3, 70.0),
        ]);
        let rated = table.rated_by(0);
        assert!(rated.contains(&0) && rated.contains(&3));
        assert!(!rated.contains(&1));
    }

    #[test]
    fn test_metadata_sentinel() {
        let meta = CourseMeta::not_available("Quantum Mechanics");
        assert_eq!(meta.title, "Quantum Mechanics");
        assert_eq!(meta.subject, "N/A");
        assert_eq!(meta.level, "N/A");
    }

    #[test]
    fn test_find_by_title_first_match() {
        let table = CourseTable::new(vec![
            CourseRecord {
                title: "Algebra".into(),
                subject: "Math".into(),
                level: "Intro".into(),
            },
            CourseRecord {
                title: "Algebra".into(),
                subject: "Math".into(),
                level: "Advanced".into(),
            },
        ]);
        assert_eq!(table.find_by_title("Algebra").unwrap().level, "Intro");
        assert!(table.find_by_title("Topology").is_none());
    }
}
