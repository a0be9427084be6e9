//! Latent-factor collaborative filtering for course recommendations.
//!
//! Three cooperating pieces, threaded together by value:
//! [`data::load_and_preprocess`] turns raw CSVs into an interaction table
//! plus identifier encoders, [`training::train_model`] fits and evaluates a
//! biased matrix-factorization model, and [`recommend::recommend`] ranks a
//! user's unrated courses.

pub mod algorithms;
pub mod config;
pub mod data;
pub mod error;
pub mod models;
pub mod recommend;
pub mod training;
pub mod utils;

pub use algorithms::{SvdModel, SvdParams};
pub use config::Config;
pub use data::{load_and_preprocess, IdEncoder, PreprocessOutput};
pub use error::{RecsysError, Result};
pub use models::*;
pub use recommend::{recommend, recommend_or_empty};
pub use training::{train_model, train_test_split, TrainOptions, TrainOutcome};

pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .init();
}
