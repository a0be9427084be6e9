use rand::rngs::StdRng;
use rand::Rng;
use std::f32::consts::PI;

/// Standard normal draw via Box-Muller.
fn normal_sample(rng: &mut StdRng) -> f32 {
    let u1: f32 = rng.gen::<f32>().max(f32::MIN_POSITIVE);
    let u2: f32 = rng.gen();
    (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// Factor vector drawn from N(mean, std_dev), using the caller's seeded rng
/// so initialization is reproducible.
pub fn normal(rng: &mut StdRng, size: usize, mean: f32, std_dev: f32) -> Vec<f32> {
    (0..size).map(|_| normal_sample(rng) * std_dev + mean).collect()
}

pub fn zeros(size: usize) -> Vec<f32> {
    vec![0.0; size]
}
