//! Top-N recommendation assembly: candidate selection, ranking, and the
//! metadata join against the course table.

use crate::algorithms::SvdModel;
use crate::data::IdEncoder;
use crate::error::{RecsysError, Result};
use crate::models::{CourseMeta, CourseTable, InteractionTable, Recommendation};
use crate::utils::{round2, top_k_indices};
use std::collections::HashMap;
use tracing::{info, warn};

/// Rank the user's unrated courses by predicted rating and return the top
/// `top_n` with display titles and metadata.
///
/// `Ok(vec![])` means the user has rated every known course; internal
/// failures (an id the encoder cannot invert, for instance) surface as
/// [`RecsysError::Recommendation`]. Use [`recommend_or_empty`] for the
/// lenient legacy behavior.
pub fn recommend(
    user_id: usize,
    model: &SvdModel,
    interactions: &InteractionTable,
    course_encoder: &IdEncoder,
    name_to_title: &HashMap<String, String>,
    courses: &CourseTable,
    top_n: usize,
) -> Result<Vec<Recommendation>> {
    let rated = interactions.rated_by(user_id);
    let candidates: Vec<usize> = interactions
        .course_ids()
        .into_iter()
        .filter(|course_id| !rated.contains(course_id))
        .collect();

    if candidates.is_empty() {
        info!(user_id, "no unrated courses available");
        return Ok(Vec::new());
    }

    let predictions: Vec<_> = candidates
        .iter()
        .map(|&course_id| model.predict(user_id, course_id))
        .collect();
    let estimates: Vec<f32> = predictions.iter().map(|p| p.est).collect();

    let mut recommendations = Vec::new();
    for index in top_k_indices(&estimates, top_n) {
        let prediction = &predictions[index];
        let course_name = course_encoder.decode(prediction.iid).map_err(|err| {
            RecsysError::Recommendation {
                user_id,
                reason: err.to_string(),
            }
        })?;

        let title = name_to_title
            .get(course_name)
            .cloned()
            .unwrap_or_else(|| course_name.to_string());
        let metadata = courses
            .find_by_title(&title)
            .map(CourseMeta::from)
            .unwrap_or_else(|| CourseMeta::not_available(title.clone()));

        recommendations.push(Recommendation {
            course_title: title,
            predicted_rating: round2(prediction.est as f64),
            metadata,
        });
    }

    Ok(recommendations)
}

/// Legacy failure semantics: any internal error is logged and downgraded to
/// an empty result, leaving "none available" and "failed" indistinguishable
/// to the caller.
pub fn recommend_or_empty(
    user_id: usize,
    model: &SvdModel,
    interactions: &InteractionTable,
    course_encoder: &IdEncoder,
    name_to_title: &HashMap<String, String>,
    courses: &CourseTable,
    top_n: usize,
) -> Vec<Recommendation> {
    match recommend(
        user_id,
        model,
        interactions,
        course_encoder,
        name_to_title,
        courses,
        top_n,
    ) {
        Ok(recommendations) => recommendations,
        Err(err) => {
            warn!(user_id, error = %err, "recommendation failed, returning empty result");
            Vec::new()
        }
    }
}
