//! End-to-end loss computation tests.
//!
//! These exercise a full training step's worth of loss arithmetic the way a
//! training loop would drive it: one discriminator update and one generator
//! update over a multi-sub-discriminator ensemble, on both the magnitude
//! path and the complex path.

use mlx_rs::{complex64, Array};
use phasegan::loss::{
    complex_discriminator_loss, complex_feature_matching_loss, complex_generator_loss,
    discriminator_adversarial_loss, feature_matching_loss, generator_adversarial_loss,
    combined_generator_loss, LossWeights, MelReconstructionLoss,
};
use phasegan::MelLossConfig;

const NUM_DISCRIMINATORS: usize = 3;
const NUM_LAYERS: usize = 4;

fn dummy_scores(batch: i32) -> Vec<Array> {
    (0..NUM_DISCRIMINATORS)
        .map(|_| mlx_rs::random::normal::<f32>(&[batch, 1, 32], None, None, None).unwrap())
        .collect()
}

fn dummy_feature_maps(batch: i32) -> Vec<Vec<Array>> {
    (0..NUM_DISCRIMINATORS)
        .map(|d| {
            (0..NUM_LAYERS)
                .map(|l| {
                    let channels = 16 << l.min(2);
                    let frames = 64 >> (d.min(2));
                    mlx_rs::random::normal::<f32>(&[batch, channels as i32, frames as i32], None, None, None)
                        .unwrap()
                })
                .collect()
        })
        .collect()
}

fn dummy_complex_scores(batch: i32, value: complex64) -> Vec<Array> {
    (0..NUM_DISCRIMINATORS)
        .map(|_| Array::from_slice(&vec![value; (batch * 32) as usize], &[batch, 32]))
        .collect()
}

#[test]
fn test_discriminator_then_generator_step() {
    let real_scores = dummy_scores(2);
    let generated_scores = dummy_scores(2);

    let (d_total, r_losses, g_losses) =
        discriminator_adversarial_loss(&real_scores, &generated_scores).unwrap();
    d_total.eval().unwrap();

    assert_eq!(d_total.ndim(), 0);
    assert_eq!(r_losses.len(), NUM_DISCRIMINATORS);
    assert_eq!(g_losses.len(), NUM_DISCRIMINATORS);
    assert!(d_total.item::<f32>() >= 0.0);

    let (g_total, per_disc) = generator_adversarial_loss(&generated_scores).unwrap();
    g_total.eval().unwrap();

    assert_eq!(per_disc.len(), NUM_DISCRIMINATORS);
    assert!(g_total.item::<f32>() >= 0.0);

    // Total is the sum of the breakdown.
    let sum: f32 = per_disc.iter().map(|l| l.item::<f32>()).sum();
    assert!((g_total.item::<f32>() - sum).abs() < 1e-5);
}

#[test]
fn test_generator_objective_with_all_components() {
    let mel_loss = MelReconstructionLoss::new(&MelLossConfig::default()).unwrap();
    let real_audio = mlx_rs::random::normal::<f32>(&[2, 16384], None, None, None).unwrap();
    let generated_audio = mlx_rs::random::normal::<f32>(&[2, 16384], None, None, None).unwrap();
    let generated_scores = dummy_scores(2);
    let fmap_real = dummy_feature_maps(2);
    let fmap_generated = dummy_feature_maps(2);

    let output = combined_generator_loss(
        &mel_loss,
        &real_audio,
        &generated_audio,
        &generated_scores,
        &fmap_real,
        &fmap_generated,
        &LossWeights::default(),
    )
    .unwrap();
    output.total.eval().unwrap();

    // Different random waveforms and feature maps: every component is live.
    assert!(output.adversarial.item::<f32>() >= 0.0);
    assert!(output.feature_matching.item::<f32>() > 0.0);
    assert!(output.mel.item::<f32>() > 0.0);

    let expected = output.adversarial.item::<f32>()
        + 2.0 * output.feature_matching.item::<f32>()
        + 45.0 * output.mel.item::<f32>();
    assert!((output.total.item::<f32>() - expected).abs() / expected.max(1.0) < 1e-4);
}

#[test]
fn test_feature_matching_breakdown_consistency() {
    let fmap_real = dummy_feature_maps(1);
    let fmap_generated = dummy_feature_maps(1);

    let total = feature_matching_loss(&fmap_real, &fmap_generated).unwrap();
    total.eval().unwrap();

    // Summing per-discriminator calls reproduces the ensemble total.
    let mut sum = 0.0f32;
    for (r, g) in fmap_real.iter().zip(fmap_generated.iter()) {
        let part = feature_matching_loss(&[r.clone()], &[g.clone()]).unwrap();
        part.eval().unwrap();
        sum += part.item::<f32>();
    }
    assert!((total.item::<f32>() - sum).abs() < 1e-4);
}

#[test]
fn test_complex_training_step_at_equilibrium_targets() {
    // Real scores at 1 + 0i and generated scores at -1 + 0i are exactly the
    // phase targets: the complex discriminator loss reduces to the generated
    // magnitude term alone.
    let real_scores = dummy_complex_scores(2, complex64::new(1.0, 0.0));
    let generated_scores = dummy_complex_scores(2, complex64::new(-1.0, 0.0));

    let (total, r_losses, g_losses) =
        complex_discriminator_loss(&real_scores, &generated_scores).unwrap();
    total.eval().unwrap();

    assert_eq!(r_losses.len(), NUM_DISCRIMINATORS);
    assert_eq!(g_losses.len(), NUM_DISCRIMINATORS);
    // Per discriminator: real side 0, generated side |-1| = 1.
    assert!((total.item::<f32>() - NUM_DISCRIMINATORS as f32).abs() < 1e-5);

    // The generator wants 1 + 0i everywhere; at that point its loss is 0.
    let ideal = dummy_complex_scores(2, complex64::new(1.0, 0.0));
    let (g_total, _) = complex_generator_loss(&ideal).unwrap();
    g_total.eval().unwrap();
    assert!(g_total.item::<f32>().abs() < 1e-5);
}

#[test]
fn test_complex_feature_matching_over_ensemble() {
    let fmap: Vec<Vec<Array>> = (0..NUM_DISCRIMINATORS)
        .map(|_| {
            (0..NUM_LAYERS)
                .map(|_| {
                    Array::from_slice(
                        &vec![complex64::new(0.5, -0.5); 64],
                        &[1, 64],
                    )
                })
                .collect()
        })
        .collect();

    let loss = complex_feature_matching_loss(&fmap, &fmap).unwrap();
    loss.eval().unwrap();

    assert!(loss.item::<f32>().abs() < 1e-5);
}
