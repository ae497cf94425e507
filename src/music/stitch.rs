//! Crossfade concatenation and post-processing of generated segments.
//!
//! Segments are generated independently, so consecutive clips are joined
//! with an overlap in which the earlier clip fades out while the next one
//! fades in:
//!
//! ```text
//! a: ██████████████▓▓▒▒░░
//! b:               ░░▒▒▓▓██████████████
//!    |<- a[..-n] ->|<-n->|<- b[n..] ->|
//! ```
//!
//! With `k` segments of lengths `l_i` and overlap `n` the result has
//! `Σ l_i - (k-1)·n` samples.

use std::f32::consts::FRAC_PI_2;

use serde::{Deserialize, Serialize};

use super::resample::resample_clip;
use super::wav::AudioClip;
use super::MusicError;

/// Default loudness target for [`normalize`].
pub const DEFAULT_TARGET_DBFS: f32 = -20.0;
/// Default length of a preview.
pub const DEFAULT_PREVIEW_SECS: u32 = 30;
/// Default fade-out at the end of a preview.
pub const PREVIEW_FADE_OUT_MS: u32 = 2000;

/// Gain curve applied across a crossfade.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum FadeCurve {
    /// Fade-in `t`, fade-out `1 - t`.
    #[default]
    Linear,
    /// Fade-in `sin(t·π/2)`, fade-out `cos(t·π/2)`; constant perceived
    /// loudness through the overlap.
    EqualPower,
}

impl FadeCurve {
    /// Fade-in multiplier at normalized position `t` (0.0 to 1.0).
    pub fn fade_in(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => t,
            FadeCurve::EqualPower => (t * FRAC_PI_2).sin(),
        }
    }

    /// Fade-out multiplier at normalized position `t` (0.0 to 1.0).
    pub fn fade_out(&self, t: f32) -> f32 {
        let t = t.clamp(0.0, 1.0);
        match self {
            FadeCurve::Linear => 1.0 - t,
            FadeCurve::EqualPower => (t * FRAC_PI_2).cos(),
        }
    }
}

/// Append `b` to `a` with a crossfade of up to `crossfade_ms`.
///
/// The overlap is clamped to the length of the shorter clip. `b` is
/// resampled to `a`'s rate if they differ.
pub fn crossfade_append(
    a: &AudioClip,
    b: &AudioClip,
    crossfade_ms: u32,
    curve: FadeCurve,
) -> Result<AudioClip, MusicError> {
    let b = resample_clip(b.clone(), a.sample_rate)?;
    let overlap = a
        .samples_for_ms(crossfade_ms)
        .min(a.samples.len())
        .min(b.samples.len());

    let head_len = a.samples.len() - overlap;
    let mut out = Vec::with_capacity(head_len + b.samples.len());
    out.extend_from_slice(&a.samples[..head_len]);

    for k in 0..overlap {
        let t = k as f32 / overlap as f32;
        out.push(a.samples[head_len + k] * curve.fade_out(t) + b.samples[k] * curve.fade_in(t));
    }
    out.extend_from_slice(&b.samples[overlap..]);

    Ok(AudioClip::new(out, a.sample_rate))
}

/// Join all clips in order. An empty list is [`MusicError::EmptyAudio`].
pub fn stitch(
    clips: &[AudioClip],
    crossfade_ms: u32,
    curve: FadeCurve,
) -> Result<AudioClip, MusicError> {
    let (first, rest) = clips.split_first().ok_or(MusicError::EmptyAudio)?;
    rest.iter().try_fold(first.clone(), |acc, next| {
        crossfade_append(&acc, next, crossfade_ms, curve)
    })
}

/// RMS level in dBFS, `None` for silence.
pub fn rms_dbfs(clip: &AudioClip) -> Option<f32> {
    if clip.samples.is_empty() {
        return None;
    }
    let mean_sq = clip.samples.iter().map(|s| s * s).sum::<f32>() / clip.samples.len() as f32;
    let rms = mean_sq.sqrt();
    (rms > 0.0).then(|| 20.0 * rms.log10())
}

/// Apply the gain that brings the clip's RMS level to `target_dbfs`.
/// Silent clips are returned unchanged; samples are clipped to `[-1, 1]`.
pub fn normalize(clip: &AudioClip, target_dbfs: f32) -> AudioClip {
    let Some(current) = rms_dbfs(clip) else {
        return clip.clone();
    };
    let gain = 10f32.powf((target_dbfs - current) / 20.0);
    AudioClip::new(
        clip.samples.iter().map(|s| (s * gain).clamp(-1.0, 1.0)).collect(),
        clip.sample_rate,
    )
}

/// First `secs` seconds of the clip with a linear fade-out over the last
/// `fade_out_ms`.
pub fn preview(clip: &AudioClip, secs: u32, fade_out_ms: u32) -> AudioClip {
    let len = clip.samples_for_ms(secs.saturating_mul(1000)).min(clip.samples.len());
    let mut samples = clip.samples[..len].to_vec();

    let fade = clip.samples_for_ms(fade_out_ms).min(len);
    let start = len - fade;
    for k in 0..fade {
        samples[start + k] *= FadeCurve::Linear.fade_out(k as f32 / fade as f32);
    }
    AudioClip::new(samples, clip.sample_rate)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
