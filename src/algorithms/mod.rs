//! Biased matrix factorization trained by stochastic gradient descent.
//!
//! The predictor estimates r(u, i) = mu + b_u + b_i + p_u . q_i. Pairs unseen
//! during training fall back to whichever bias terms exist, bottoming out at
//! the global mean, so prediction never fails.

pub mod initializer;

use crate::error::{RecsysError, Result};
use crate::models::{Interaction, Prediction};
use nalgebra::DVector;
use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::{Deserialize, Serialize};
use tracing::debug;

const INIT_STD_DEV: f32 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SvdParams {
    pub n_factors: usize,
    pub n_epochs: usize,
    pub learning_rate: f32,
    pub regularization: f32,
}

impl Default for SvdParams {
    fn default() -> Self {
        Self {
            n_factors: 20,
            n_epochs: 20,
            learning_rate: 0.005,
            regularization: 0.02,
        }
    }
}

impl SvdParams {
    pub fn with_factors(n_factors: usize) -> Self {
        Self {
            n_factors,
            ..Self::default()
        }
    }
}

/// Latent-factor rating predictor. Immutable once fitted.
#[derive(Debug, Clone)]
pub struct SvdModel {
    params: SvdParams,
    rating_scale: (f32, f32),
    global_mean: f32,
    user_bias: Vec<f32>,
    item_bias: Vec<f32>,
    user_factors: Vec<DVector<f32>>,
    item_factors: Vec<DVector<f32>>,
}

impl SvdModel {
    /// Fit on the given interactions. Factor matrices are sized to the
    /// largest id seen in `train`; ids outside that range at prediction time
    /// use the bias fallback.
    pub fn fit(
        train: &[Interaction],
        params: SvdParams,
        rating_scale: (f32, f32),
        seed: u64,
    ) -> Result<Self> {
        if train.is_empty() {
            return Err(RecsysError::Training(
                "cannot fit on an empty training set".to_string(),
            ));
        }
        if rating_scale.0 >= rating_scale.1 {
            return Err(RecsysError::Training(format!(
                "degenerate rating scale ({}, {})",
                rating_scale.0, rating_scale.1
            )));
        }

        let n_users = train.iter().map(|r| r.user_id).max().unwrap_or(0) + 1;
        let n_items = train.iter().map(|r| r.course_id).max().unwrap_or(0) + 1;
        let global_mean =
            train.iter().map(|r| r.rating).sum::<f32>() / train.len() as f32;

        let mut rng = StdRng::seed_from_u64(seed);
        let mut model = Self {
            params,
            rating_scale,
            global_mean,
            user_bias: initializer::zeros(n_users),
            item_bias: initializer::zeros(n_items),
            user_factors: (0..n_users)
                .map(|_| {
                    DVector::from_vec(initializer::normal(
                        &mut rng,
                        params.n_factors,
                        0.0,
                        INIT_STD_DEV,
                    ))
                })
                .collect(),
            item_factors: (0..n_items)
                .map(|_| {
                    DVector::from_vec(initializer::normal(
                        &mut rng,
                        params.n_factors,
                        0.0,
                        INIT_STD_DEV,
                    ))
                })
                .collect(),
        };

        for epoch in 0..params.n_epochs {
            let mut squared_error = 0.0f64;
            for row in train {
                let error = model.sgd_update(row);
                squared_error += (error * error) as f64;
            }
            debug!(
                epoch,
                train_rmse = (squared_error / train.len() as f64).sqrt(),
                "epoch complete"
            );
        }

        if model
            .user_factors
            .iter()
            .chain(model.item_factors.iter())
            .any(|f| f.iter().any(|v| !v.is_finite()))
        {
            return Err(RecsysError::Training(
                "model diverged: non-finite factors after fitting".to_string(),
            ));
        }

        Ok(model)
    }

    /// One SGD step on a single interaction; returns the pre-update error.
    fn sgd_update(&mut self, row: &Interaction) -> f32 {
        let lr = self.params.learning_rate;
        let reg = self.params.regularization;

        let user_emb = self.user_factors[row.user_id].clone();
        let item_emb = self.item_factors[row.course_id].clone();

        let prediction = self.global_mean
            + self.user_bias[row.user_id]
            + self.item_bias[row.course_id]
            + user_emb.dot(&item_emb);
        let error = row.rating - prediction;

        self.user_bias[row.user_id] += lr * (error - reg * self.user_bias[row.user_id]);
        self.item_bias[row.course_id] += lr * (error - reg * self.item_bias[row.course_id]);

        let user_gradient = &item_emb * error - &user_emb * reg;
        let item_gradient = &user_emb * error - &item_emb * reg;
        self.user_factors[row.user_id] = &user_emb + user_gradient * lr;
        self.item_factors[row.course_id] = &item_emb + item_gradient * lr;

        error
    }

    /// Estimate a rating for any (user, course) pair. Unknown users or
    /// courses contribute no bias or factor terms.
    pub fn predict(&self, user_id: usize, course_id: usize) -> Prediction {
        let mut estimate = self.global_mean;
        if let Some(bias) = self.user_bias.get(user_id) {
            estimate += bias;
        }
        if let Some(bias) = self.item_bias.get(course_id) {
            estimate += bias;
        }
        if let (Some(user_emb), Some(item_emb)) = (
            self.user_factors.get(user_id),
            self.item_factors.get(course_id),
        ) {
            estimate += user_emb.dot(item_emb);
        }

        Prediction {
            uid: user_id,
            iid: course_id,
            rui: None,
            est: estimate.clamp(self.rating_scale.0, self.rating_scale.1),
        }
    }

    /// Predict every (user, course) pair in `test`, carrying the true rating
    /// through for evaluation.
    pub fn test(&self, test: &[Interaction]) -> Vec<Prediction> {
        test.iter()
            .map(|row| {
                let mut prediction = self.predict(row.user_id, row.course_id);
                prediction.rui = Some(row.rating);
                prediction
            })
            .collect()
    }

    pub fn params(&self) -> &SvdParams {
        &self.params
    }

    pub fn global_mean(&self) -> f32 {
        self.global_mean
    }
}
