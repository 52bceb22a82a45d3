use rand::Rng;

/// Draws an independent Bernoulli sample per entry of `probabilities`.
///
/// Entries of 0.0 and 1.0 are degenerate but valid parameters: the draw is
/// deterministic because the uniform variate lies in [0, 1).
pub fn sample_mask<R: Rng + ?Sized>(probabilities: &[f32], rng: &mut R) -> Vec<f32> {
    probabilities
        .iter()
        .map(|&p| if rng.r#gen::<f32>() < p { 1.0 } else { 0.0 })
        .collect()
}

/// Zeroes out unselected features via an element-wise product.
pub fn apply_mask(features: &[f32], mask: &[f32]) -> Vec<f32> {
    assert_eq!(
        features.len(),
        mask.len(),
        "mask must match the feature matrix element for element"
    );
    features
        .iter()
        .zip(mask.iter())
        .map(|(feature, keep)| feature * keep)
        .collect()
}

/// Deterministic selection used at evaluation time: probability > 0.5.
pub fn threshold_mask(probabilities: &[f32]) -> Vec<f32> {
    probabilities
        .iter()
        .map(|&p| if p > 0.5 { 1.0 } else { 0.0 })
        .collect()
}
