use rand::rng;
use rand_distr::{Distribution, Uniform};

/// Uniform initialization over [-1, 1).
///
/// The raw noise source for weight initialization. Module constructors take
/// any `FnMut() -> f64` in their `with_init` variants, so this sampler can
/// be swapped for a deterministic one in tests.
pub fn uniform_sampler() -> impl Fn() -> f64 {
    let uniform = Uniform::new(-1.0, 1.0).unwrap();

    move || {
        let mut rng = rng();
        uniform.sample(&mut rng)
    }
}

/// Fan-in-scaled uniform initialization: U[-1, 1) / sqrt(fan_in).
///
/// Keeps the expected pre-activation magnitude of a neuron roughly
/// independent of its input width.
pub fn fan_in_uniform(fan_in: usize) -> impl Fn() -> f64 {
    let scale = 1.0 / (fan_in as f64).sqrt();
    let uniform = Uniform::new(-1.0, 1.0).unwrap();

    move || {
        let mut rng = rng();
        scale * uniform.sample(&mut rng)
    }
}
