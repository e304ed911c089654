//! Short-Time Fourier Transform on MLX arrays.

use crate::error::{LossError, Result};
use mlx_rs::Array;

/// STFT configuration.
#[derive(Debug, Clone)]
pub struct StftConfig {
    /// FFT size.
    pub n_fft: i32,
    /// Hop size in samples.
    pub hop_length: i32,
    /// Window size (defaults to n_fft).
    pub win_length: Option<i32>,
    /// Whether to center each frame by padding the signal by n_fft/2.
    pub center: bool,
    /// Padding mode used when centering.
    pub pad_mode: PadMode,
}

/// Padding modes for centered framing.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum PadMode {
    /// Mirror the signal at its boundaries.
    #[default]
    Reflect,
    /// Zero padding.
    Zeros,
    /// Repeat the edge samples.
    Replicate,
}

impl Default for StftConfig {
    fn default() -> Self {
        Self {
            n_fft: 1024,
            hop_length: 256,
            win_length: None,
            center: true,
            pad_mode: PadMode::Reflect,
        }
    }
}

/// Create a periodic Hann window of the given size.
pub fn hann_window(size: i32) -> Result<Array> {
    // hann[n] = 0.5 * (1 - cos(2*pi*n / N)), periodic form
    let n = mlx_rs::ops::arange::<i32, f32>(0, size, None)?;
    let scale = Array::from_f32(2.0 * std::f32::consts::PI / size as f32);
    let cos_term = n.multiply(&scale)?.cos()?;
    let one = Array::from_f32(1.0);
    Ok(Array::from_f32(0.5).multiply(&one.subtract(&cos_term)?)?)
}

/// Analysis window for the configured sizes, zero-padded to n_fft when the
/// window is shorter than the FFT.
fn analysis_window(config: &StftConfig) -> Result<Array> {
    let win_length = config.win_length.unwrap_or(config.n_fft);
    if win_length > config.n_fft {
        return Err(LossError::Audio(format!(
            "win_length {} exceeds n_fft {}",
            win_length, config.n_fft
        )));
    }

    let window = hann_window(win_length)?;
    if win_length == config.n_fft {
        return Ok(window);
    }

    let pad_left = (config.n_fft - win_length) / 2;
    let pad_right = config.n_fft - win_length - pad_left;
    let zeros_left = mlx_rs::ops::zeros::<f32>(&[pad_left])?;
    let zeros_right = mlx_rs::ops::zeros::<f32>(&[pad_right])?;
    Ok(mlx_rs::ops::concatenate_axis(
        &[&zeros_left, &window, &zeros_right],
        0,
    )?)
}

/// Compute the Short-Time Fourier Transform.
///
/// # Arguments
/// * `signal` - Audio signal `[samples]` or `[batch, samples]`
/// * `config` - STFT configuration
///
/// # Returns
/// Complex spectrum `[batch, n_fft/2+1, frames]`, unbatched if the input was.
pub fn stft(signal: &Array, config: &StftConfig) -> Result<Array> {
    use mlx_rs::ops::indexing::IndexOp;

    let window = analysis_window(config)?;

    let (signal, was_1d) = if signal.ndim() == 1 {
        (signal.reshape(&[1, -1])?, true)
    } else {
        (signal.clone(), false)
    };

    let signal = if config.center {
        pad_signal(&signal, config.n_fft / 2, config.pad_mode)?
    } else {
        signal
    };

    let padded_length = signal.dim(1);
    let num_frames = (padded_length - config.n_fft) / config.hop_length + 1;
    if num_frames <= 0 {
        return Err(LossError::Audio(format!(
            "signal of {} samples is shorter than one {}-sample frame",
            padded_length, config.n_fft
        )));
    }

    let mut frames = Vec::with_capacity(num_frames as usize);
    for i in 0..num_frames {
        let start = i * config.hop_length;
        frames.push(signal.index((.., start..start + config.n_fft)));
    }

    // [batch, frames, n_fft]
    let frame_refs: Vec<&Array> = frames.iter().collect();
    let framed = mlx_rs::ops::stack_axis(&frame_refs, 1)?;
    let windowed = framed.multiply(&window)?;

    let spectrum = mlx_rs::fft::rfft(&windowed, Some(config.n_fft), -1)?;

    // [batch, freq, frames]
    let spectrum = spectrum.transpose_axes(&[0, 2, 1])?;
    if was_1d {
        Ok(spectrum.squeeze()?)
    } else {
        Ok(spectrum)
    }
}

/// Magnitude of a complex spectrum.
pub fn stft_magnitude(spectrum: &Array) -> Result<Array> {
    Ok(spectrum.abs()?)
}

/// Pad a `[batch, samples]` signal on both sides for centered framing.
fn pad_signal(signal: &Array, pad_amount: i32, mode: PadMode) -> Result<Array> {
    use mlx_rs::ops::indexing::IndexOp;

    let batch_size = signal.dim(0);
    let length = signal.dim(1);
    if pad_amount == 0 {
        return Ok(signal.clone());
    }

    let (left_pad, right_pad) = match mode {
        PadMode::Zeros => (
            mlx_rs::ops::zeros::<f32>(&[batch_size, pad_amount])?,
            mlx_rs::ops::zeros::<f32>(&[batch_size, pad_amount])?,
        ),
        PadMode::Reflect => {
            if pad_amount >= length {
                return Err(LossError::Audio(format!(
                    "cannot reflect-pad {} samples by {}",
                    length, pad_amount
                )));
            }
            // left: signal[pad..=1], right: signal[len-2..=len-pad-1]
            let left_indices: Vec<i32> = (1..=pad_amount).rev().collect();
            let right_indices: Vec<i32> = ((length - pad_amount - 1)..(length - 1)).rev().collect();
            let left = signal.take_axis(&Array::from_slice(&left_indices, &[pad_amount]), 1)?;
            let right = signal.take_axis(&Array::from_slice(&right_indices, &[pad_amount]), 1)?;
            (left, right)
        }
        PadMode::Replicate => {
            let first = signal.index((.., ..1));
            let last = signal.index((.., -1..));
            (
                mlx_rs::ops::broadcast_to(&first, &[batch_size, pad_amount])?,
                mlx_rs::ops::broadcast_to(&last, &[batch_size, pad_amount])?,
            )
        }
    };

    Ok(mlx_rs::ops::concatenate_axis(
        &[&left_pad, signal, &right_pad],
        1,
    )?)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = StftConfig::default();
        assert_eq!(config.n_fft, 1024);
        assert_eq!(config.hop_length, 256);
        assert!(config.center);
        assert_eq!(config.pad_mode, PadMode::Reflect);
    }

    #[test]
    fn test_hann_window_periodic() {
        let window = hann_window(4).unwrap();
        window.eval().unwrap();
        assert_eq!(window.shape(), &[4]);

        // Periodic hann(4) = [0, 0.5, 1, 0.5]
        let expected = Array::from_slice(&[0.0f32, 0.5, 1.0, 0.5], &[4]);
        let max_err = window.subtract(&expected).unwrap().abs().unwrap().max(None).unwrap();
        max_err.eval().unwrap();
        assert!(max_err.item::<f32>() < 1e-6);
    }

    #[test]
    fn test_stft_shape_batched() {
        let signal = mlx_rs::random::normal::<f32>(&[2, 4096], None, None, None).unwrap();
        let config = StftConfig::default();

        let spectrum = stft(&signal, &config).unwrap();
        spectrum.eval().unwrap();

        // Centered: 4096/256 + 1 frames, 1024/2 + 1 bins
        assert_eq!(spectrum.shape(), &[2, 513, 17]);
    }

    #[test]
    fn test_stft_shape_unbatched() {
        let signal = mlx_rs::random::normal::<f32>(&[4096], None, None, None).unwrap();
        let config = StftConfig::default();

        let spectrum = stft(&signal, &config).unwrap();
        spectrum.eval().unwrap();

        assert_eq!(spectrum.shape(), &[513, 17]);
    }

    #[test]
    fn test_stft_magnitude_is_real() {
        let signal = mlx_rs::random::normal::<f32>(&[1, 2048], None, None, None).unwrap();
        let spectrum = stft(&signal, &StftConfig::default()).unwrap();
        let magnitude = stft_magnitude(&spectrum).unwrap();
        magnitude.eval().unwrap();

        assert_eq!(magnitude.dtype(), mlx_rs::Dtype::Float32);
        assert_eq!(magnitude.shape(), spectrum.shape());
    }

    #[test]
    fn test_stft_rejects_short_signal() {
        let signal = mlx_rs::random::normal::<f32>(&[1, 64], None, None, None).unwrap();
        let config = StftConfig {
            center: false,
            ..Default::default()
        };
        assert!(stft(&signal, &config).is_err());
    }
}
