//! Training losses for GAN-based neural audio vocoders.
//!
//! A vocoder generator is trained against an ensemble of sub-discriminators
//! with three families of losses, all provided here as MLX tensor
//! computations:
//!
//! - Mel spectrogram reconstruction loss: L1 distance between safe-log mel
//!   magnitude spectrograms of the generated and ground-truth waveforms.
//! - Adversarial hinge losses for the generator and the discriminators,
//!   with per-sub-discriminator breakdowns.
//! - Feature matching loss over intermediate discriminator activations.
//!
//! Each adversarial/feature loss also has a complex-valued counterpart for
//! discriminators that emit complex STFT-domain scores: those add a phase
//! term on top of the magnitude term, pushing real phases toward 0 and
//! generated phases toward pi.
//!
//! # Example
//!
//! ```ignore
//! use phasegan::{MelLossConfig, MelReconstructionLoss};
//! use phasegan::loss::{discriminator_adversarial_loss, generator_adversarial_loss};
//!
//! let mel_loss = MelReconstructionLoss::new(&MelLossConfig::default())?;
//!
//! // Discriminator step
//! let (d_loss, _, _) = discriminator_adversarial_loss(&real_scores, &generated_scores)?;
//!
//! // Generator step
//! let (adv_loss, _) = generator_adversarial_loss(&generated_scores)?;
//! let mel = mel_loss.forward(&generated_audio, &real_audio)?;
//! ```
//!
//! Losses hold no state across calls; the mel loss's transform configuration
//! and filterbank are fixed at construction. Failures from the tensor
//! backend (shape mismatches, invalid sizes) propagate as [`LossError`].

pub mod audio;
pub mod config;
pub mod error;
pub mod loss;

pub use config::MelLossConfig;
pub use error::{LossError, Result};
pub use loss::{
    combined_generator_loss, complex_discriminator_loss, complex_feature_matching_loss,
    complex_generator_loss, discriminator_adversarial_loss, feature_matching_loss,
    generator_adversarial_loss, GeneratorLossOutput, LossWeights, MelReconstructionLoss,
};
