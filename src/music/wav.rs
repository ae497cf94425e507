//! Mono `f32` clips and WAV I/O.

use std::io::Cursor;
use std::path::Path;

use hound::{SampleFormat, WavReader, WavSpec, WavWriter};

use super::resample::to_mono;
use super::MusicError;

/// A mono clip of `f32` samples in `[-1.0, 1.0]`.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    pub samples: Vec<f32>,
    pub sample_rate: u32,
}

impl AudioClip {
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn duration_secs(&self) -> f32 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.samples.len() as f32 / self.sample_rate as f32
    }

    /// Number of samples covering `ms` milliseconds at this clip's rate.
    pub fn samples_for_ms(&self, ms: u32) -> usize {
        (self.sample_rate as u64 * ms as u64 / 1000) as usize
    }
}

/// Decode a WAV file (integer or float PCM, any channel count) to mono.
pub fn decode_wav(bytes: &[u8]) -> Result<AudioClip, MusicError> {
    let reader = WavReader::new(Cursor::new(bytes)).map_err(|e| MusicError::Decode(e.to_string()))?;
    let spec = reader.spec();

    let interleaved: Vec<f32> = match spec.sample_format {
        SampleFormat::Float => reader
            .into_samples::<f32>()
            .collect::<Result<_, _>>()
            .map_err(|e| MusicError::Decode(e.to_string()))?,
        SampleFormat::Int => {
            let scale = (1_i64 << (spec.bits_per_sample.saturating_sub(1))) as f32;
            reader
                .into_samples::<i32>()
                .map(|s| s.map(|v| v as f32 / scale))
                .collect::<Result<_, _>>()
                .map_err(|e| MusicError::Decode(e.to_string()))?
        }
    };

    Ok(AudioClip::new(
        to_mono(&interleaved, spec.channels),
        spec.sample_rate,
    ))
}

/// Write a clip as 16-bit PCM mono WAV.
pub fn write_wav(clip: &AudioClip, path: &Path) -> Result<(), MusicError> {
    let spec = WavSpec {
        channels: 1,
        sample_rate: clip.sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };
    let mut writer = WavWriter::create(path, spec)?;
    for &s in &clip.samples {
        writer.write_sample((s.clamp(-1.0, 1.0) * i16::MAX as f32) as i16)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Read a WAV file from disk.
pub fn read_wav(path: &Path) -> Result<AudioClip, MusicError> {
    decode_wav(&std::fs::read(path)?)
}
