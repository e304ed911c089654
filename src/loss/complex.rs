//! Phase-aware losses for complex-valued discriminator outputs.
//!
//! When a discriminator operates in the complex STFT domain its scores and
//! feature maps carry phase as well as magnitude. The magnitude-only hinge
//! losses discard that phase, so each of them has a counterpart here with an
//! added phase term. Real scores are pushed toward phase 0, generated scores
//! toward phase pi.
//!
//! Phase convention: `angle(z) = atan2(im z, re z)`, so the phase of an
//! exact zero is zero, of a positive real is zero, and of a negative real is
//! pi. Real-valued inputs are accepted and degenerate accordingly.

use crate::error::Result;
use mlx_rs::{complex64, Array, Dtype};

/// Real part of an array; the identity for real inputs.
fn real_part(z: &Array) -> Result<Array> {
    Ok(z.as_dtype(Dtype::Float32)?)
}

/// Imaginary part, via rotation: re(-i * z) == im(z).
fn imag_part(z: &Array) -> Result<Array> {
    let rotate = Array::from_slice(&[complex64::new(0.0, -1.0)], &[1]);
    Ok(z.multiply(&rotate)?.as_dtype(Dtype::Float32)?)
}

/// cos(angle(z)), with the phase of an exact zero pinned to zero.
fn cos_angle(z: &Array) -> Result<Array> {
    let magnitude = z.abs()?;
    let zero = Array::from_f32(0.0);
    let one = Array::from_f32(1.0);
    let cos = real_part(z)?.divide(&magnitude)?;
    Ok(mlx_rs::ops::r#where(&magnitude.eq(&zero)?, &one, &cos)?)
}

/// cos(angle(a) - angle(b)), from the cosine difference identity:
/// (re a * re b + im a * im b) / (|a| * |b|). A zero-magnitude side has
/// phase zero, so the difference collapses to the other side's phase.
fn cos_angle_difference(a: &Array, b: &Array) -> Result<Array> {
    let (re_a, im_a) = (real_part(a)?, imag_part(a)?);
    let (re_b, im_b) = (real_part(b)?, imag_part(b)?);
    let magnitude_a = a.abs()?;
    let magnitude_b = b.abs()?;
    let zero = Array::from_f32(0.0);

    let numerator = re_a.multiply(&re_b)?.add(&im_a.multiply(&im_b)?)?;
    let cos = numerator.divide(&magnitude_a.multiply(&magnitude_b)?)?;
    let cos = mlx_rs::ops::r#where(&magnitude_a.eq(&zero)?, &cos_angle(b)?, &cos)?;
    Ok(mlx_rs::ops::r#where(&magnitude_b.eq(&zero)?, &cos_angle(a)?, &cos)?)
}

/// Generator adversarial loss for complex discriminator outputs.
///
/// Per output `d`: `mean(max(|1 - d|, 0)) + mean(1 - cos(angle d))`. The
/// phase term vanishes when the generated phase aligns with the real
/// reference phase of zero. Totals and breakdowns are real-valued.
pub fn complex_generator_loss(disc_outputs: &[Array]) -> Result<(Array, Vec<Array>)> {
    let zero = Array::from_f32(0.0);
    let one = Array::from_f32(1.0);

    let mut total = Array::from_f32(0.0);
    let mut gen_losses = Vec::with_capacity(disc_outputs.len());
    for dg in disc_outputs {
        let magnitude_term =
            mlx_rs::ops::maximum(&one.subtract(dg)?.abs()?, &zero)?.mean(None)?;
        let phase_term = one.subtract(&cos_angle(dg)?)?.mean(None)?;

        let loss = magnitude_term.add(&phase_term)?;
        total = total.add(&loss)?;
        gen_losses.push(loss);
    }

    Ok((total, gen_losses))
}

/// Discriminator adversarial loss for complex outputs.
///
/// Real side: `mean(max(1 - |dr|, 0)) + mean(1 - cos(angle dr))` — real
/// magnitudes below 1 and real phases away from 0 are penalized. Generated
/// side: `mean(max(|dg|, 0)) + mean(1 + cos(angle dg))` — generated
/// magnitudes above 0 and generated phases away from pi are penalized.
///
/// The generated phase term does not vanish at `dg == 0`: the phase of an
/// exact zero is zero, so it contributes `1 + cos(0) == 2` per element.
pub fn complex_discriminator_loss(
    real_outputs: &[Array],
    generated_outputs: &[Array],
) -> Result<(Array, Vec<Array>, Vec<Array>)> {
    let zero = Array::from_f32(0.0);
    let one = Array::from_f32(1.0);

    let mut total = Array::from_f32(0.0);
    let mut real_losses = Vec::with_capacity(real_outputs.len());
    let mut generated_losses = Vec::with_capacity(generated_outputs.len());
    for (dr, dg) in real_outputs.iter().zip(generated_outputs.iter()) {
        let real_magnitude =
            mlx_rs::ops::maximum(&one.subtract(&dr.abs()?)?, &zero)?.mean(None)?;
        let generated_magnitude = mlx_rs::ops::maximum(&dg.abs()?, &zero)?.mean(None)?;

        let real_phase = one.subtract(&cos_angle(dr)?)?.mean(None)?;
        let generated_phase = one.add(&cos_angle(dg)?)?.mean(None)?;

        let real_loss = real_magnitude.add(&real_phase)?;
        let generated_loss = generated_magnitude.add(&generated_phase)?;
        total = total.add(&real_loss.add(&generated_loss)?)?;
        real_losses.push(real_loss);
        generated_losses.push(generated_loss);
    }

    Ok((total, real_losses, generated_losses))
}

/// Feature matching loss for complex feature maps.
///
/// Per positionally paired layer: `mean(|rl - gl|)` plus the phase
/// difference term `mean(1 - cos(angle rl - angle gl))`, summed over all
/// layers and sub-discriminators.
pub fn complex_feature_matching_loss(
    fmap_real: &[Vec<Array>],
    fmap_generated: &[Vec<Array>],
) -> Result<Array> {
    let one = Array::from_f32(1.0);

    let mut total = Array::from_f32(0.0);
    for (real_layers, generated_layers) in fmap_real.iter().zip(fmap_generated.iter()) {
        for (rl, gl) in real_layers.iter().zip(generated_layers.iter()) {
            let magnitude_term = rl.subtract(gl)?.abs()?.mean(None)?;
            let phase_term = one.subtract(&cos_angle_difference(rl, gl)?)?.mean(None)?;
            total = total.add(&magnitude_term.add(&phase_term)?)?;
        }
    }

    Ok(total)
}
