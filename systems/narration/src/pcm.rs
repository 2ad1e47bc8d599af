//! Raw speech payload decoding.

/// Sample rate of the PCM payload returned by speech backends.
pub const SPEECH_SAMPLE_RATE: u32 = 24_000;

/// Decodes little-endian signed 16-bit mono PCM into samples in `[-1.0, 1.0)`.
///
/// A trailing odd byte cannot form a sample and is ignored.
#[must_use]
pub fn decode_pcm16(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(2)
        .map(|pair| f32::from(i16::from_le_bytes([pair[0], pair[1]])) / 32_768.0)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::decode_pcm16;

    #[test]
    fn decodes_extremes_and_zero() {
        let bytes = [0x00, 0x80, 0x00, 0x00, 0xff, 0x7f, 0x00, 0x40];
        let samples = decode_pcm16(&bytes);
        assert_eq!(samples.len(), 4);
        assert_eq!(samples[0], -1.0);
        assert_eq!(samples[1], 0.0);
        assert!((samples[2] - 32_767.0 / 32_768.0).abs() < f32::EPSILON);
        assert_eq!(samples[3], 0.5);
    }

    #[test]
    fn ignores_trailing_odd_byte() {
        assert_eq!(decode_pcm16(&[0x00, 0x40, 0x12]), vec![0.5]);
        assert!(decode_pcm16(&[0x7f]).is_empty());
        assert!(decode_pcm16(&[]).is_empty());
    }
}
