//! Loss functions for adversarial vocoder training.
//!
//! The generator objective combines:
//! - Adversarial hinge loss against an ensemble of sub-discriminators
//! - Feature matching loss over discriminator activations
//! - Mel spectrogram reconstruction loss
//!
//! Discriminators train with the two-sided hinge loss. For discriminators
//! that emit complex scores, the `complex_*` functions add a phase term to
//! each adversarial and feature loss.

mod complex;

pub use complex::{
    complex_discriminator_loss, complex_feature_matching_loss, complex_generator_loss,
};

use crate::audio::{apply_filterbank, mel_filterbank, safe_log, stft, stft_magnitude};
use crate::audio::{MelConfig, SpectrumPower, StftConfig};
use crate::config::MelLossConfig;
use crate::error::{LossError, Result};
use mlx_rs::Array;

/// Mel spectrogram reconstruction loss.
///
/// L1 distance between the safe-log mel magnitude spectrograms of the ground
/// truth and the generated waveform. The spectral transform is fixed at
/// construction; the filterbank is built once and reused on every call.
#[derive(Debug, Clone)]
pub struct MelReconstructionLoss {
    mel_config: MelConfig,
    stft_config: StftConfig,
    filterbank: Array,
}

impl MelReconstructionLoss {
    /// Build the loss for the given transform configuration.
    pub fn new(config: &MelLossConfig) -> Result<Self> {
        if config.n_fft <= 0 || config.hop_length <= 0 || config.n_mels <= 0 {
            return Err(LossError::Config(format!(
                "mel loss sizes must be positive: n_fft={}, hop_length={}, n_mels={}",
                config.n_fft, config.hop_length, config.n_mels
            )));
        }

        let mel_config = MelConfig {
            sample_rate: config.sample_rate,
            n_fft: config.n_fft,
            n_mels: config.n_mels,
            ..Default::default()
        };
        let stft_config = StftConfig {
            n_fft: config.n_fft,
            hop_length: config.hop_length,
            ..Default::default()
        };
        let filterbank = mel_filterbank(&mel_config)?;
        tracing::debug!(
            "mel reconstruction loss: {} bands, n_fft={}, hop={}, sr={}",
            config.n_mels,
            config.n_fft,
            config.hop_length,
            config.sample_rate
        );

        Ok(Self {
            mel_config,
            stft_config,
            filterbank,
        })
    }

    /// L1 loss between the log-mel spectrograms of the two waveforms.
    ///
    /// # Arguments
    /// * `y_hat` - Generated audio waveform `[batch, samples]` or `[samples]`
    /// * `y` - Ground truth audio waveform, same shape
    pub fn forward(&self, y_hat: &Array, y: &Array) -> Result<Array> {
        let mel_hat = safe_log(&self.mel(y_hat)?)?;
        let mel = safe_log(&self.mel(y)?)?;
        Ok(mel.subtract(&mel_hat)?.abs()?.mean(None)?)
    }

    /// Mel spectrogram via the precomputed filterbank.
    fn mel(&self, audio: &Array) -> Result<Array> {
        let spectrum = stft(audio, &self.stft_config)?;
        let magnitude = stft_magnitude(&spectrum)?;
        let magnitude = match self.mel_config.power {
            SpectrumPower::Magnitude => magnitude,
            SpectrumPower::Power => magnitude.multiply(&magnitude)?,
        };
        apply_filterbank(&self.filterbank, &magnitude)
    }

    /// The mel configuration the loss was built with.
    pub fn mel_config(&self) -> &MelConfig {
        &self.mel_config
    }
}

/// Generator adversarial hinge loss.
///
/// For each sub-discriminator output `d`: `mean(max(1 - d, 0))`. The total is
/// the sum over the ensemble; per-discriminator values are returned in input
/// order. The accumulator takes its dtype from the first output.
pub fn generator_adversarial_loss(disc_outputs: &[Array]) -> Result<(Array, Vec<Array>)> {
    let zero = Array::from_f32(0.0);
    let one = Array::from_f32(1.0);

    let mut total = zero.as_dtype(disc_outputs[0].dtype())?;
    let mut gen_losses = Vec::with_capacity(disc_outputs.len());
    for dg in disc_outputs {
        let loss = mlx_rs::ops::maximum(&one.subtract(dg)?, &zero)?.mean(None)?;
        total = total.add(&loss)?;
        gen_losses.push(loss);
    }

    Ok((total, gen_losses))
}

/// Discriminator adversarial hinge loss.
///
/// Outputs are paired positionally: `real_outputs[i]` and
/// `generated_outputs[i]` come from the same sub-discriminator. Real scores
/// below 1 and generated scores above -1 are penalized:
/// `mean(max(1 - dr, 0)) + mean(max(1 + dg, 0))`.
///
/// # Returns
/// Total loss plus per-discriminator real and generated breakdowns, in input
/// order.
pub fn discriminator_adversarial_loss(
    real_outputs: &[Array],
    generated_outputs: &[Array],
) -> Result<(Array, Vec<Array>, Vec<Array>)> {
    let zero = Array::from_f32(0.0);
    let one = Array::from_f32(1.0);

    let mut total = zero.as_dtype(real_outputs[0].dtype())?;
    let mut real_losses = Vec::with_capacity(real_outputs.len());
    let mut generated_losses = Vec::with_capacity(generated_outputs.len());
    for (dr, dg) in real_outputs.iter().zip(generated_outputs.iter()) {
        let real_loss = mlx_rs::ops::maximum(&one.subtract(dr)?, &zero)?.mean(None)?;
        let generated_loss = mlx_rs::ops::maximum(&one.add(dg)?, &zero)?.mean(None)?;
        total = total.add(&real_loss.add(&generated_loss)?)?;
        real_losses.push(real_loss);
        generated_losses.push(generated_loss);
    }

    Ok((total, real_losses, generated_losses))
}

/// Feature matching loss.
///
/// Mean absolute difference between every positionally paired layer
/// activation, summed over all layers of all sub-discriminators. The outer
/// index is the sub-discriminator, the inner index is layer depth; both
/// nestings must line up between the real and generated collections.
pub fn feature_matching_loss(
    fmap_real: &[Vec<Array>],
    fmap_generated: &[Vec<Array>],
) -> Result<Array> {
    let mut total = Array::from_f32(0.0).as_dtype(fmap_real[0][0].dtype())?;
    for (real_layers, generated_layers) in fmap_real.iter().zip(fmap_generated.iter()) {
        for (rl, gl) in real_layers.iter().zip(generated_layers.iter()) {
            total = total.add(&rl.subtract(gl)?.abs()?.mean(None)?)?;
        }
    }

    Ok(total)
}

/// Weights for the combined generator objective.
///
/// L_G = lambda_adv * L_adv + lambda_fm * L_fm + lambda_mel * L_mel
#[derive(Debug, Clone)]
pub struct LossWeights {
    /// Weight for the adversarial loss.
    pub lambda_adv: f32,
    /// Weight for the feature matching loss.
    pub lambda_fm: f32,
    /// Weight for the mel reconstruction loss.
    pub lambda_mel: f32,
}

impl Default for LossWeights {
    fn default() -> Self {
        Self {
            lambda_adv: 1.0,
            lambda_fm: 2.0,
            lambda_mel: 45.0,
        }
    }
}

/// Components of the combined generator loss.
#[derive(Debug)]
pub struct GeneratorLossOutput {
    /// Total weighted loss.
    pub total: Array,
    /// Unweighted adversarial component.
    pub adversarial: Array,
    /// Unweighted feature matching component.
    pub feature_matching: Array,
    /// Unweighted mel reconstruction component.
    pub mel: Array,
}

/// Compute the combined weighted generator loss.
///
/// # Arguments
/// * `mel_loss` - The constructed mel reconstruction loss
/// * `real_audio` / `generated_audio` - Waveforms, `[batch, samples]`
/// * `disc_outputs` - Sub-discriminator scores for the generated audio
/// * `fmap_real` / `fmap_generated` - Feature maps from both forward passes
/// * `weights` - Component weights
pub fn combined_generator_loss(
    mel_loss: &MelReconstructionLoss,
    real_audio: &Array,
    generated_audio: &Array,
    disc_outputs: &[Array],
    fmap_real: &[Vec<Array>],
    fmap_generated: &[Vec<Array>],
    weights: &LossWeights,
) -> Result<GeneratorLossOutput> {
    let (adversarial, _) = generator_adversarial_loss(disc_outputs)?;
    let feature_matching = feature_matching_loss(fmap_real, fmap_generated)?;
    let mel = mel_loss.forward(generated_audio, real_audio)?;

    let total = adversarial
        .multiply(&Array::from_f32(weights.lambda_adv))?
        .add(&feature_matching.multiply(&Array::from_f32(weights.lambda_fm))?)?
        .add(&mel.multiply(&Array::from_f32(weights.lambda_mel))?)?;

    Ok(GeneratorLossOutput {
        total,
        adversarial,
        feature_matching,
        mel,
    })
}
