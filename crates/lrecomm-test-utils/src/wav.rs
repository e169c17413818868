// SPDX-FileCopyrightText: 2026 Lrecomm Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

use std::path::Path;

/// Write a mono 16-bit 8 kHz sine WAV of `seconds` length.
pub fn write_test_wav(path: &Path, seconds: u32) -> Result<(), hound::Error> {
    let spec = hound::WavSpec {
        channels: 1,
        sample_rate: 8000,
        bits_per_sample: 16,
        sample_format: hound::SampleFormat::Int,
    };
    let mut writer = hound::WavWriter::create(path, spec)?;
    let total = spec.sample_rate * seconds;
    for n in 0..total {
        let t = n as f32 / spec.sample_rate as f32;
        let sample = (t * 440.0 * std::f32::consts::TAU).sin() * 0.4 * f32::from(i16::MAX);
        writer.write_sample(sample as i16)?;
    }
    writer.finalize()
}
