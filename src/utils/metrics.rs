//! Accuracy and ranking-quality metrics over labeled predictions.

use crate::models::Prediction;
use crate::utils::mean;
use std::collections::{HashMap, HashSet};

/// True-rating cutoff above which a test item counts as relevant.
/// Inherited from the upstream pipeline; see the config docs before
/// treating it as tunable.
pub const RELEVANCE_THRESHOLD: f32 = 70.0;

/// Root mean squared error over predictions that carry a true rating.
pub fn rmse(predictions: &[Prediction]) -> f64 {
    let labeled: Vec<f64> = predictions
        .iter()
        .filter_map(|p| p.rui.map(|rui| ((p.est - rui) as f64).powi(2)))
        .collect();
    if labeled.is_empty() {
        0.0
    } else {
        mean(&labeled).sqrt()
    }
}

#[derive(Debug, Clone)]
pub struct RankingMetrics {
    k: usize,
    threshold: f32,
}

impl RankingMetrics {
    pub fn new(k: usize, threshold: f32) -> Self {
        Self { k, threshold }
    }

    /// Precision@k and Recall@k averaged over users.
    ///
    /// Predictions are grouped per user and sorted by estimate, descending
    /// and stable. The relevant set is the user's test items whose true
    /// rating meets the threshold; users with an empty relevant set
    /// contribute to neither average. Returns (0, 0) when no user
    /// contributes.
    pub fn precision_recall_at_k(&self, predictions: &[Prediction]) -> (f64, f64) {
        let mut per_user: HashMap<usize, Vec<&Prediction>> = HashMap::new();
        for prediction in predictions {
            per_user.entry(prediction.uid).or_default().push(prediction);
        }

        let mut precisions = Vec::new();
        let mut recalls = Vec::new();
        for ratings in per_user.values_mut() {
            ratings.sort_by(|a, b| {
                b.est
                    .partial_cmp(&a.est)
                    .unwrap_or(std::cmp::Ordering::Equal)
            });

            let relevant: HashSet<usize> = ratings
                .iter()
                .filter(|p| p.rui.is_some_and(|rui| rui >= self.threshold))
                .map(|p| p.iid)
                .collect();
            if relevant.is_empty() {
                continue;
            }

            let true_positives = ratings
                .iter()
                .take(self.k)
                .filter(|p| relevant.contains(&p.iid))
                .count();

            precisions.push(true_positives as f64 / self.k as f64);
            recalls.push(true_positives as f64 / relevant.len() as f64);
        }

        (mean(&precisions), mean(&recalls))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labeled(uid: usize, iid: usize, rui: f32, est: f32) -> Prediction {
        Prediction {
            uid,
            iid,
            rui: Some(rui),
            est,
        }
    }

    #[test]
    fn test_rmse_exact() {
        let predictions = vec![labeled(0, 0, 80.0, 84.0), labeled(0, 1, 60.0, 57.0)];
        // errors 4 and 3 -> sqrt((16 + 9) / 2)
        assert!((rmse(&predictions) - (12.5f64).sqrt()).abs() < 1e-9);
    }

    #[test]
    fn test_rmse_empty() {
        assert_eq!(rmse(&[]), 0.0);
    }

    #[test]
    fn test_precision_recall_single_user() {
        // Top-3 by estimate: items 0, 1, 2. Relevant (>= 70): items 0, 3.
        let predictions = vec![
            labeled(0, 0, 90.0, 95.0),
            labeled(0, 1, 40.0, 85.0),
            labeled(0, 2, 50.0, 80.0),
            labeled(0, 3, 75.0, 60.0),
        ];
        let (precision, recall) =
            RankingMetrics::new(3, RELEVANCE_THRESHOLD).precision_recall_at_k(&predictions);
        assert!((precision - 1.0 / 3.0).abs() < 1e-9);
        assert!((recall - 0.5).abs() < 1e-9);
    }

    #[test]
    fn test_users_without_relevant_items_are_skipped() {
        let predictions = vec![
            // u0 has no item above the threshold.
            labeled(0, 0, 10.0, 95.0),
            labeled(0, 1, 20.0, 85.0),
            // u1 gets its single relevant item into the top 3.
            labeled(1, 0, 90.0, 88.0),
        ];
        let (precision, recall) =
            RankingMetrics::new(3, RELEVANCE_THRESHOLD).precision_recall_at_k(&predictions);
        assert!((precision - 1.0 / 3.0).abs() < 1e-9);
        assert!((recall - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_all_users_skipped_reports_zero() {
        let predictions = vec![labeled(0, 0, 10.0, 95.0), labeled(1, 1, 20.0, 85.0)];
        let (precision, recall) =
            RankingMetrics::new(3, RELEVANCE_THRESHOLD).precision_recall_at_k(&predictions);
        assert_eq!(precision, 0.0);
        assert_eq!(recall, 0.0);
    }

    #[test]
    fn test_metrics_stay_in_unit_interval() {
        let predictions = vec![
            labeled(0, 0, 90.0, 95.0),
            labeled(0, 1, 80.0, 85.0),
            labeled(0, 2, 85.0, 80.0),
            labeled(0, 3, 75.0, 60.0),
            labeled(1, 0, 72.0, 64.0),
            labeled(1, 2, 68.0, 92.0),
        ];
        let (precision, recall) =
            RankingMetrics::new(3, RELEVANCE_THRESHOLD).precision_recall_at_k(&predictions);
        assert!((0.0..=1.0).contains(&precision));
        assert!((0.0..=1.0).contains(&recall));
    }
}
