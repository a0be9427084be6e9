use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub training: TrainingConfig,
    pub recommendation: RecommendationConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TrainingConfig {
    pub rating_min: f32,
    pub rating_max: f32,
    pub test_fraction: f64,
    pub seed: u64,
    /// Grid-search hyperparameters with 3-fold cross-validation instead of
    /// using the fixed defaults.
    pub tune: bool,
}

impl TrainingConfig {
    pub fn rating_scale(&self) -> (f32, f32) {
        (self.rating_min, self.rating_max)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendationConfig {
    pub top_n: usize,
    /// True-rating cutoff for counting a test item as relevant during
    /// evaluation. Fixed at 70 in the upstream data pipeline; whether it
    /// should vary per deployment is still an open product question.
    pub relevance_threshold: f32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            training: TrainingConfig {
                rating_min: 0.0,
                rating_max: 100.0,
                test_fraction: 0.2,
                seed: 42,
                tune: false,
            },
            recommendation: RecommendationConfig {
                top_n: 3,
                relevance_threshold: 70.0,
            },
        }
    }
}

impl Config {
    pub fn from_file(path: &str) -> anyhow::Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path))
            .add_source(config::Environment::with_prefix("COURSEREC"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }
}
