//! Model training and evaluation: deterministic train/test splitting,
//! optional grid-search tuning with k-fold cross-validation, and RMSE plus
//! Precision@k / Recall@k on the held-out split.

use crate::algorithms::{SvdModel, SvdParams};
use crate::config::Config;
use crate::error::{RecsysError, Result};
use crate::models::{Interaction, InteractionTable};
use crate::utils::metrics::{rmse, RankingMetrics, RELEVANCE_THRESHOLD};
use crate::utils::mean;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::SeedableRng;
use rayon::prelude::*;
use tracing::{debug, info};

/// Ranking metrics are reported at this cutoff.
pub const EVAL_K: usize = 3;

const FACTOR_GRID: [usize; 4] = [10, 20, 50, 100];
const LEARNING_RATE_GRID: [f32; 3] = [0.002, 0.005, 0.01];
const REGULARIZATION_GRID: [f32; 3] = [0.02, 0.05, 0.1];
const CV_FOLDS: usize = 3;

#[derive(Debug, Clone, Copy)]
pub struct TrainOptions {
    pub rating_scale: (f32, f32),
    pub test_fraction: f64,
    pub seed: u64,
    pub tune: bool,
    pub relevance_threshold: f32,
}

impl Default for TrainOptions {
    fn default() -> Self {
        Self {
            rating_scale: (0.0, 100.0),
            test_fraction: 0.2,
            seed: 42,
            tune: false,
            relevance_threshold: RELEVANCE_THRESHOLD,
        }
    }
}

impl From<&Config> for TrainOptions {
    fn from(config: &Config) -> Self {
        Self {
            rating_scale: config.training.rating_scale(),
            test_fraction: config.training.test_fraction,
            seed: config.training.seed,
            tune: config.training.tune,
            relevance_threshold: config.recommendation.relevance_threshold,
        }
    }
}

/// Everything `train_model` produces.
#[derive(Debug, Clone)]
pub struct TrainOutcome {
    pub model: SvdModel,
    pub train_set: Vec<Interaction>,
    pub test_set: Vec<Interaction>,
    pub rmse: f64,
    pub precision_at_3: f64,
    pub recall_at_3: f64,
}

/// Deterministic row-level split: a seeded shuffle holds out `test_fraction`
/// of the rows.
pub fn train_test_split(
    table: &InteractionTable,
    test_fraction: f64,
    seed: u64,
) -> (Vec<Interaction>, Vec<Interaction>) {
    let mut rows = table.rows().to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    rows.shuffle(&mut rng);

    let n_test = ((rows.len() as f64) * test_fraction).round() as usize;
    let n_test = n_test.min(rows.len());
    let train = rows.split_off(n_test);
    (train, rows)
}

/// Fit a latent-factor model and evaluate it on a held-out split.
///
/// With `tune` set, a grid search over factor count, learning rate, and
/// regularization picks the configuration minimizing cross-validated RMSE on
/// the training rows; otherwise the 20-factor default is used.
pub fn train_model(table: &InteractionTable, options: &TrainOptions) -> Result<TrainOutcome> {
    info!(interactions = table.len(), "training model");

    let (train_set, test_set) = train_test_split(table, options.test_fraction, options.seed);
    if train_set.is_empty() {
        return Err(RecsysError::Training(
            "train split is empty; not enough interactions".to_string(),
        ));
    }

    let params = if options.tune {
        let best = grid_search(&train_set, options)?;
        info!(
            n_factors = best.n_factors,
            learning_rate = best.learning_rate as f64,
            regularization = best.regularization as f64,
            "grid search selected parameters"
        );
        best
    } else {
        SvdParams::with_factors(20)
    };

    let model = SvdModel::fit(&train_set, params, options.rating_scale, options.seed)?;

    let predictions = model.test(&test_set);
    let rmse = rmse(&predictions);
    let (precision_at_3, recall_at_3) = RankingMetrics::new(EVAL_K, options.relevance_threshold)
        .precision_recall_at_k(&predictions);

    info!(
        interactions = table.len(),
        train_size = train_set.len(),
        test_size = test_set.len(),
        rmse = format!("{rmse:.4}"),
        precision_at_3 = format!("{precision_at_3:.4}"),
        recall_at_3 = format!("{recall_at_3:.4}"),
        "model training summary"
    );

    Ok(TrainOutcome {
        model,
        train_set,
        test_set,
        rmse,
        precision_at_3,
        recall_at_3,
    })
}

/// Exhaustive search over the fixed hyperparameter grid, scored by k-fold
/// cross-validated RMSE on the training rows. The grid fans out across
/// threads; scores are collected back in grid order so ties resolve
/// deterministically.
fn grid_search(train: &[Interaction], options: &TrainOptions) -> Result<SvdParams> {
    let folds = make_folds(train, CV_FOLDS, options.seed.wrapping_add(1));

    let mut grid = Vec::new();
    for &n_factors in &FACTOR_GRID {
        for &learning_rate in &LEARNING_RATE_GRID {
            for &regularization in &REGULARIZATION_GRID {
                grid.push(SvdParams {
                    n_factors,
                    learning_rate,
                    regularization,
                    ..SvdParams::default()
                });
            }
        }
    }

    let scored: Vec<(SvdParams, f64)> = grid
        .into_par_iter()
        .map(|params| cross_validate(&folds, params, options).map(|score| (params, score)))
        .collect::<Result<Vec<_>>>()?;

    let mut best = None;
    for (params, score) in scored {
        debug!(
            n_factors = params.n_factors,
            learning_rate = params.learning_rate as f64,
            regularization = params.regularization as f64,
            cv_rmse = format!("{score:.4}"),
            "grid point evaluated"
        );
        match best {
            Some((_, best_score)) if score >= best_score => {}
            _ => best = Some((params, score)),
        }
    }

    let (params, score) =
        best.ok_or_else(|| RecsysError::Training("empty hyperparameter grid".to_string()))?;
    info!(cv_rmse = format!("{score:.4}"), "best cross-validated RMSE");
    Ok(params)
}

fn cross_validate(
    folds: &[Vec<Interaction>],
    params: SvdParams,
    options: &TrainOptions,
) -> Result<f64> {
    let mut fold_scores = Vec::with_capacity(folds.len());
    for held_out in 0..folds.len() {
        let train: Vec<Interaction> = folds
            .iter()
            .enumerate()
            .filter(|(i, _)| *i != held_out)
            .flat_map(|(_, fold)| fold.iter().copied())
            .collect();
        if train.is_empty() || folds[held_out].is_empty() {
            continue;
        }
        let model = SvdModel::fit(&train, params, options.rating_scale, options.seed)?;
        fold_scores.push(rmse(&model.test(&folds[held_out])));
    }

    if fold_scores.is_empty() {
        return Err(RecsysError::Training(
            "too few interactions for cross-validation".to_string(),
        ));
    }
    Ok(mean(&fold_scores))
}

/// Seeded shuffle, then round-robin assignment into `k` folds.
fn make_folds(rows: &[Interaction], k: usize, seed: u64) -> Vec<Vec<Interaction>> {
    let mut shuffled = rows.to_vec();
    let mut rng = StdRng::seed_from_u64(seed);
    shuffled.shuffle(&mut rng);

    let mut folds = vec![Vec::new(); k];
    for (i, row) in shuffled.into_iter().enumerate() {
        folds[i % k].push(row);
    }
    folds
}
