//! Clip encoding
//!
//! Rendered clips are stored as minimal uncompressed WAV: a fixed 44-byte
//! header (RIFF/WAVE/fmt /data, PCM format 1, mono, 16-bit) followed by
//! little-endian samples. Encoding goes through hound, which emits exactly
//! that layout for 16-bit mono integer specs.

use std::io::Cursor;

use hound::{SampleFormat, WavSpec, WavWriter};

use super::error::{AudioError, AudioResult};

pub const CLIP_MIME_TYPE: &str = "audio/wav";
pub const CLIP_SAMPLE_RATE: u32 = 44_100;
pub const WAV_HEADER_LEN: usize = 44;

/// Convert a normalized sample to 16-bit PCM, clamping to the valid range
pub fn to_pcm16(sample: f32) -> i16 {
    let scaled = (sample as f64 * 32767.0).round();
    scaled.clamp(i16::MIN as f64, i16::MAX as f64) as i16
}

/// Encode mono PCM samples (f32, normalized -1.0 to 1.0) as 16-bit WAV
pub fn encode_wav_mono16(pcm_samples: &[f32], sample_rate: u32) -> AudioResult<Vec<u8>> {
    let spec = WavSpec {
        channels: 1,
        sample_rate,
        bits_per_sample: 16,
        sample_format: SampleFormat::Int,
    };

    let capacity = WAV_HEADER_LEN + pcm_samples.len() * 2;
    let mut cursor = Cursor::new(Vec::with_capacity(capacity));
    let mut writer = WavWriter::new(&mut cursor, spec)
        .map_err(|e| AudioError::Encoding(format!("failed to create WAV writer: {e}")))?;

    for &sample in pcm_samples {
        writer
            .write_sample(to_pcm16(sample))
            .map_err(|e| AudioError::Encoding(format!("failed to write sample: {e}")))?;
    }

    writer
        .finalize()
        .map_err(|e| AudioError::Encoding(format!("failed to finalize WAV: {e}")))?;

    Ok(cursor.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pcm_clamping() {
        assert_eq!(to_pcm16(0.0), 0);
        assert_eq!(to_pcm16(1.0), 32767);
        assert_eq!(to_pcm16(-1.0), -32767);
        assert_eq!(to_pcm16(4.0), i16::MAX);
        assert_eq!(to_pcm16(-4.0), i16::MIN);
    }

    #[test]
    fn test_wav_encoding_header_is_bit_exact() {
        let samples = vec![0.0, 0.5, -0.5, 1.0, -1.0];
        let bytes = encode_wav_mono16(&samples, CLIP_SAMPLE_RATE).unwrap();

        assert_eq!(bytes.len(), WAV_HEADER_LEN + samples.len() * 2);
        assert_eq!(&bytes[0..4], b"RIFF");
        assert_eq!(u32::from_le_bytes(bytes[4..8].try_into().unwrap()), 36 + 10);
        assert_eq!(&bytes[8..12], b"WAVE");
        assert_eq!(&bytes[12..16], b"fmt ");
        assert_eq!(u32::from_le_bytes(bytes[16..20].try_into().unwrap()), 16);
        assert_eq!(u16::from_le_bytes(bytes[20..22].try_into().unwrap()), 1);
        assert_eq!(u16::from_le_bytes(bytes[22..24].try_into().unwrap()), 1);
        assert_eq!(u32::from_le_bytes(bytes[24..28].try_into().unwrap()), 44_100);
        assert_eq!(u32::from_le_bytes(bytes[28..32].try_into().unwrap()), 88_200);
        assert_eq!(u16::from_le_bytes(bytes[32..34].try_into().unwrap()), 2);
        assert_eq!(u16::from_le_bytes(bytes[34..36].try_into().unwrap()), 16);
        assert_eq!(&bytes[36..40], b"data");
        assert_eq!(u32::from_le_bytes(bytes[40..44].try_into().unwrap()), 10);
        assert_eq!(i16::from_le_bytes([bytes[46], bytes[47]]), 16384);
    }
}
