//! Channel mixing and sample-rate conversion for generated clips.
//!
//! Text-to-audio checkpoints differ in their native rate (MusicGen emits
//! 32 kHz, others 24 or 44.1 kHz); every segment is brought to the output
//! rate before stitching. Conversion uses rubato's windowed-sinc
//! resampler, so content above the target Nyquist frequency is filtered
//! out instead of folding back into the audible band.

use rubato::{
    Resampler as _, SincFixedIn, SincInterpolationParameters, SincInterpolationType,
    WindowFunction,
};

use super::wav::AudioClip;
use super::MusicError;

/// Mix interleaved multi-channel audio down to mono by averaging all channels.
///
/// * `channels == 1` returns the input unchanged.
/// * `channels == 0` returns an empty vector.
pub fn to_mono(samples: &[f32], channels: u16) -> Vec<f32> {
    match channels {
        0 => Vec::new(),
        1 => samples.to_vec(),
        n => {
            let n = n as usize;
            samples
                .chunks_exact(n)
                .map(|frame| frame.iter().sum::<f32>() / n as f32)
                .collect()
        }
    }
}

fn sinc_params() -> SincInterpolationParameters {
    SincInterpolationParameters {
        sinc_len: 256,
        f_cutoff: 0.95,
        interpolation: SincInterpolationType::Linear,
        oversampling_factor: 256,
        window: WindowFunction::BlackmanHarris2,
    }
}

/// Resample mono `samples` from `source_rate` to `target_rate`.
///
/// The whole input is processed as one chunk. The filter delay is trimmed
/// and the tail flushed, so the output is time-aligned with the input and
/// has exactly `ceil(len * target / source)` samples.
pub fn resample(
    samples: &[f32],
    source_rate: u32,
    target_rate: u32,
) -> Result<Vec<f32>, MusicError> {
    if source_rate == target_rate || source_rate == 0 {
        return Ok(samples.to_vec());
    }
    if samples.is_empty() || target_rate == 0 {
        return Ok(Vec::new());
    }

    let ratio = target_rate as f64 / source_rate as f64;
    let expected = (samples.len() as f64 * ratio).ceil() as usize;

    let mut resampler = SincFixedIn::<f32>::new(ratio, 1.0, sinc_params(), samples.len(), 1)
        .map_err(|e| MusicError::Resample(e.to_string()))?;
    let delay = resampler.output_delay();

    let input = [samples];
    let mut output = resampler
        .process(&input[..], None)
        .map_err(|e| MusicError::Resample(e.to_string()))?
        .remove(0);

    // Feed silence until the delayed tail has come out.
    while output.len() < delay + expected {
        let flushed = resampler
            .process_partial(None::<&[&[f32]]>, None)
            .map_err(|e| MusicError::Resample(e.to_string()))?
            .remove(0);
        if flushed.is_empty() {
            break;
        }
        output.extend(flushed);
    }

    output.drain(..delay.min(output.len()));
    output.resize(expected, 0.0);
    Ok(output)
}

/// Convert a clip to `target_rate`.
pub fn resample_clip(clip: AudioClip, target_rate: u32) -> Result<AudioClip, MusicError> {
    if clip.sample_rate == target_rate {
        return Ok(clip);
    }
    let samples = resample(&clip.samples, clip.sample_rate, target_rate)?;
    Ok(AudioClip::new(samples, target_rate))
}
