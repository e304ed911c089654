//! Mel reconstruction loss configuration.

use serde::{Deserialize, Serialize};

/// Configuration for the mel spectrogram reconstruction loss.
///
/// This is the crate's only externally configurable surface: the parameters
/// of the spectral transform the mel loss applies to both waveforms. All
/// values are fixed when the loss is constructed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MelLossConfig {
    /// Audio sampling rate in Hz.
    #[serde(default = "default_sample_rate")]
    pub sample_rate: i32,

    /// FFT size for the spectral transform.
    #[serde(default = "default_n_fft")]
    pub n_fft: i32,

    /// Hop size in samples.
    #[serde(default = "default_hop_length")]
    pub hop_length: i32,

    /// Number of mel frequency bins.
    #[serde(default = "default_n_mels")]
    pub n_mels: i32,
}

// Default functions for serde
fn default_sample_rate() -> i32 {
    24000
}
fn default_n_fft() -> i32 {
    1024
}
fn default_hop_length() -> i32 {
    256
}
fn default_n_mels() -> i32 {
    100
}

impl Default for MelLossConfig {
    fn default() -> Self {
        Self::for_24khz_100band()
    }
}

impl MelLossConfig {
    /// Configuration for 24kHz audio with 100 mel bands.
    ///
    /// Matches vocoders trained with a 256x upsampling factor at 24kHz.
    pub fn for_24khz_100band() -> Self {
        Self {
            sample_rate: 24000,
            n_fft: 1024,
            hop_length: 256,
            n_mels: 100,
        }
    }

    /// Configuration for 44.1kHz audio with 128 mel bands.
    pub fn for_44khz_128band() -> Self {
        Self {
            sample_rate: 44100,
            n_fft: 2048,
            hop_length: 512,
            n_mels: 128,
        }
    }

    /// Number of frequency bins in the underlying spectrogram.
    pub fn n_freqs(&self) -> i32 {
        self.n_fft / 2 + 1
    }
}
