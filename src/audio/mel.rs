//! Mel filterbank and mel-scaled magnitude spectrograms.

use crate::error::Result;
use mlx_rs::Array;

/// Values below this floor are clamped before taking a logarithm.
pub const LOG_CLIP_VALUE: f32 = 1e-7;

/// Mel filterbank configuration.
#[derive(Debug, Clone)]
pub struct MelConfig {
    /// Audio sampling rate in Hz.
    pub sample_rate: i32,
    /// FFT size.
    pub n_fft: i32,
    /// Number of mel frequency bins.
    pub n_mels: i32,
    /// Minimum frequency in Hz.
    pub fmin: f32,
    /// Maximum frequency in Hz (defaults to sample_rate/2).
    pub fmax: Option<f32>,
    /// Mel scale formula.
    pub scale: MelScale,
    /// Filterbank normalization.
    pub norm: MelNorm,
    /// Exponent applied to the spectrogram before the filterbank.
    pub power: SpectrumPower,
}

/// Mel scale formula.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MelScale {
    /// HTK formula: 2595 * log10(1 + f/700).
    #[default]
    Htk,
    /// Slaney formula (linear below 1kHz, logarithmic above).
    Slaney,
}

/// Mel filterbank normalization.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MelNorm {
    /// No normalization.
    #[default]
    None,
    /// Slaney-style area normalization.
    Slaney,
}

/// Spectrogram exponent.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SpectrumPower {
    /// Amplitude spectrogram, |z|.
    #[default]
    Magnitude,
    /// Power spectrogram, |z|^2.
    Power,
}

impl Default for MelConfig {
    fn default() -> Self {
        Self {
            sample_rate: 24000,
            n_fft: 1024,
            n_mels: 100,
            fmin: 0.0,
            fmax: None,
            scale: MelScale::Htk,
            norm: MelNorm::None,
            power: SpectrumPower::Magnitude,
        }
    }
}

/// Convert frequency in Hz to mel scale.
pub fn hz_to_mel(freq: f32, scale: MelScale) -> f32 {
    match scale {
        MelScale::Htk => 2595.0 * (1.0 + freq / 700.0).log10(),
        MelScale::Slaney => {
            let f_sp = 200.0 / 3.0;
            let min_log_hz = 1000.0;
            let min_log_mel = min_log_hz / f_sp;
            let logstep = (6.4f32).ln() / 27.0;

            if freq >= min_log_hz {
                min_log_mel + (freq / min_log_hz).ln() / logstep
            } else {
                freq / f_sp
            }
        }
    }
}

/// Convert mel scale to frequency in Hz.
pub fn mel_to_hz(mel: f32, scale: MelScale) -> f32 {
    match scale {
        MelScale::Htk => 700.0 * (10.0f32.powf(mel / 2595.0) - 1.0),
        MelScale::Slaney => {
            let f_sp = 200.0 / 3.0;
            let min_log_hz = 1000.0;
            let min_log_mel = min_log_hz / f_sp;
            let logstep = (6.4f32).ln() / 27.0;

            if mel >= min_log_mel {
                min_log_hz * ((mel - min_log_mel) * logstep).exp()
            } else {
                f_sp * mel
            }
        }
    }
}

/// Create a mel filterbank matrix.
///
/// Triangular filters are evaluated at the FFT bin center frequencies, with
/// band edges spaced uniformly on the configured mel scale.
///
/// # Returns
/// Filterbank matrix `[n_mels, n_fft/2+1]`.
pub fn mel_filterbank(config: &MelConfig) -> Result<Array> {
    let n_freqs = config.n_fft / 2 + 1;
    let fmax = config.fmax.unwrap_or(config.sample_rate as f32 / 2.0);

    // Band edges: n_mels + 2 points uniform in mel, converted back to Hz.
    let mel_min = hz_to_mel(config.fmin, config.scale);
    let mel_max = hz_to_mel(fmax, config.scale);
    let n_points = config.n_mels + 2;
    let hz_points: Vec<f32> = (0..n_points)
        .map(|i| mel_min + (mel_max - mel_min) * i as f32 / (n_points - 1) as f32)
        .map(|m| mel_to_hz(m, config.scale))
        .collect();

    // FFT bin center frequencies.
    let bin_hz: Vec<f32> = (0..n_freqs)
        .map(|k| k as f32 * config.sample_rate as f32 / config.n_fft as f32)
        .collect();

    let mut weights = vec![0.0f32; (config.n_mels * n_freqs) as usize];
    for m in 0..config.n_mels as usize {
        let left = hz_points[m];
        let center = hz_points[m + 1];
        let right = hz_points[m + 2];

        let gain = match config.norm {
            MelNorm::Slaney => 2.0 / (right - left),
            MelNorm::None => 1.0,
        };

        for (k, &f) in bin_hz.iter().enumerate() {
            let rising = (f - left) / (center - left + 1e-10);
            let falling = (right - f) / (right - center + 1e-10);
            let weight = rising.min(falling).max(0.0);
            weights[m * n_freqs as usize + k] = weight * gain;
        }
    }

    Ok(Array::from_slice(&weights, &[config.n_mels, n_freqs]))
}

/// Apply a mel filterbank to a magnitude spectrogram.
///
/// # Arguments
/// * `filterbank` - `[n_mels, n_freqs]`
/// * `magnitude` - `[n_freqs, frames]` or `[batch, n_freqs, frames]`
pub fn apply_filterbank(filterbank: &Array, magnitude: &Array) -> Result<Array> {
    if magnitude.ndim() == 2 {
        return Ok(filterbank.matmul(magnitude)?);
    }

    // Batched: [batch, frames, freq] @ [freq, n_mels], then back to
    // [batch, n_mels, frames].
    let magnitude_t = magnitude.transpose_axes(&[0, 2, 1])?;
    let filterbank_t = filterbank.transpose_axes(&[1, 0])?;
    let mel = magnitude_t.matmul(&filterbank_t)?;
    Ok(mel.transpose_axes(&[0, 2, 1])?)
}

/// Compute a mel spectrogram from audio.
///
/// # Arguments
/// * `audio` - Audio signal `[samples]` or `[batch, samples]`
/// * `config` - Mel configuration
/// * `stft_config` - STFT configuration
///
/// # Returns
/// Mel spectrogram `[batch, n_mels, frames]` or `[n_mels, frames]`.
pub fn mel_spectrogram(
    audio: &Array,
    config: &MelConfig,
    stft_config: &super::StftConfig,
) -> Result<Array> {
    let spectrum = super::stft(audio, stft_config)?;
    let magnitude = super::stft_magnitude(&spectrum)?;
    let magnitude = match config.power {
        SpectrumPower::Magnitude => magnitude,
        SpectrumPower::Power => magnitude.multiply(&magnitude)?,
    };

    let filterbank = mel_filterbank(config)?;
    apply_filterbank(&filterbank, &magnitude)
}

/// Logarithm clamped away from zero.
pub fn safe_log(x: &Array) -> Result<Array> {
    let floor = Array::from_f32(LOG_CLIP_VALUE);
    Ok(mlx_rs::ops::maximum(x, &floor)?.log()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio::StftConfig;

    #[test]
    fn test_hz_to_mel_htk() {
        let mel = hz_to_mel(1000.0, MelScale::Htk);
        assert!((mel - 999.99).abs() < 0.5);
    }

    #[test]
    fn test_hz_to_mel_slaney() {
        // Linear region ends at 1kHz = 15 mels.
        let mel = hz_to_mel(1000.0, MelScale::Slaney);
        assert!((mel - 15.0).abs() < 1e-3);
    }

    #[test]
    fn test_mel_to_hz_roundtrip() {
        for scale in [MelScale::Htk, MelScale::Slaney] {
            for freq in [100.0, 440.0, 2000.0, 11000.0] {
                let back = mel_to_hz(hz_to_mel(freq, scale), scale);
                assert!((freq - back).abs() < 0.5, "{scale:?} at {freq} Hz -> {back}");
            }
        }
    }

    #[test]
    fn test_mel_filterbank_shape() {
        let config = MelConfig::default();
        let fb = mel_filterbank(&config).unwrap();
        fb.eval().unwrap();
        assert_eq!(fb.shape(), &[100, 513]);
    }

    #[test]
    fn test_mel_filterbank_rows_nonempty() {
        let config = MelConfig {
            sample_rate: 16000,
            n_fft: 512,
            n_mels: 40,
            ..Default::default()
        };
        let fb = mel_filterbank(&config).unwrap();
        let row_sums = fb.sum_axis(1, None).unwrap();
        let min_sum = row_sums.min(None).unwrap();
        min_sum.eval().unwrap();

        // Every filter covers at least one FFT bin.
        assert!(min_sum.item::<f32>() > 0.0);
    }

    #[test]
    fn test_mel_spectrogram_shape() {
        let audio = mlx_rs::random::normal::<f32>(&[1, 8000], None, None, None).unwrap();
        let mel = mel_spectrogram(&audio, &MelConfig::default(), &StftConfig::default()).unwrap();
        mel.eval().unwrap();
        assert_eq!(mel.shape(), &[1, 100, 32]);
    }

    #[test]
    fn test_safe_log_guards_zero() {
        let zeros = mlx_rs::ops::zeros::<f32>(&[4]).unwrap();
        let logged = safe_log(&zeros).unwrap();
        let total = logged.mean(None).unwrap();
        total.eval().unwrap();

        // log(1e-7), not -inf
        assert!((total.item::<f32>() - LOG_CLIP_VALUE.ln()).abs() < 1e-3);
    }
}
