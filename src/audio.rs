//! WAV output for the placeholder engine.

use std::path::Path;

use crate::Result;

/// Write mono f32 samples as a 32-bit float WAV file.
///
/// The placeholder engine only emits mono; channel layout is the real
/// engine's concern.
pub fn write_wav(path: impl AsRef<Path>, samples: &[f32], sample_rate: u32) -> Result<()> {
    let mut writer = hound::WavWriter::create(
        path,
        hound::WavSpec {
            channels: 1,
            sample_rate,
            bits_per_sample: 32,
            sample_format: hound::SampleFormat::Float,
        },
    )?;
    for &s in samples {
        writer.write_sample(s)?;
    }
    writer.finalize()?;
    Ok(())
}

/// Render a mono test tone of the given duration.
///
/// A 220 Hz sine at -10 dBFS with a 50 ms linear fade on both ends, so the
/// placeholder output is deterministic and click-free.
pub fn render_tone(duration_ms: u64, sample_rate: u32) -> Vec<f32> {
    const FREQ_HZ: f32 = 220.0;
    const AMPLITUDE: f32 = 0.3;

    let total = (duration_ms * u64::from(sample_rate) / 1000) as usize;
    let fade = (u64::from(sample_rate) * 50 / 1000) as usize;

    (0..total)
        .map(|i| {
            let t = i as f32 / sample_rate as f32;
            let mut s = AMPLITUDE * (2.0 * std::f32::consts::PI * FREQ_HZ * t).sin();
            if i < fade {
                s *= i as f32 / fade as f32;
            }
            if total - i <= fade {
                s *= (total - i) as f32 / fade as f32;
            }
            s
        })
        .collect()
}
