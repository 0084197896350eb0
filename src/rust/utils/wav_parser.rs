//! WAV header inspection
//!
//! Reads back the chunks of an encoded clip so tests and the `render` command
//! can check what was produced without a decoder.

use serde::Serialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WavInfo {
    pub audio_format: u16,
    pub channels: u16,
    pub sample_rate: u32,
    pub byte_rate: u32,
    pub block_align: u16,
    pub bits_per_sample: u16,
    /// Declared length of the `data` chunk in bytes
    pub data_len: u32,
    /// Offset of the first sample byte
    pub data_offset: usize,
}

impl WavInfo {
    pub fn sample_count(&self) -> usize {
        let bytes_per_sample = (self.bits_per_sample / 8).max(1) as usize;
        self.data_len as usize / bytes_per_sample / self.channels.max(1) as usize
    }

    pub fn duration_secs(&self) -> f64 {
        if self.sample_rate == 0 {
            return 0.0;
        }
        self.sample_count() as f64 / self.sample_rate as f64
    }
}

fn read_u16(data: &[u8], pos: usize) -> Result<u16, String> {
    data.get(pos..pos + 2)
        .and_then(|b| b.try_into().ok())
        .map(u16::from_le_bytes)
        .ok_or_else(|| format!("Truncated WAV field at byte {}", pos))
}

fn read_u32(data: &[u8], pos: usize) -> Result<u32, String> {
    data.get(pos..pos + 4)
        .and_then(|b| b.try_into().ok())
        .map(u32::from_le_bytes)
        .ok_or_else(|| format!("Truncated WAV field at byte {}", pos))
}

pub fn inspect_wav(data: &[u8]) -> Result<WavInfo, String> {
    if data.len() < 44 {
        return Err("File too short for WAV header".into());
    }

    // Validate RIFF/WAVE header
    if &data[0..4] != b"RIFF" || &data[8..12] != b"WAVE" {
        return Err("Invalid RIFF/WAVE header".into());
    }

    let mut pos = 12;
    let mut format: Option<(u16, u16, u32, u32, u16, u16)> = None;
    let mut data_chunk: Option<(u32, usize)> = None;

    while pos + 8 <= data.len() {
        let chunk_id = &data[pos..pos + 4];
        let chunk_size = read_u32(data, pos + 4)?;
        pos += 8;

        match chunk_id {
            b"fmt " => {
                if chunk_size < 16 {
                    return Err("fmt chunk too small".into());
                }
                format = Some((
                    read_u16(data, pos)?,
                    read_u16(data, pos + 2)?,
                    read_u32(data, pos + 4)?,
                    read_u32(data, pos + 8)?,
                    read_u16(data, pos + 12)?,
                    read_u16(data, pos + 14)?,
                ));
            }
            b"data" => {
                data_chunk = Some((chunk_size, pos));
                break;
            }
            _ => { /* Ignore other chunks */ }
        }

        pos += chunk_size as usize;
    }

    let (audio_format, channels, sample_rate, byte_rate, block_align, bits_per_sample) =
        format.ok_or("fmt chunk not found".to_string())?;
    let (data_len, data_offset) = data_chunk.ok_or("data chunk not found".to_string())?;

    if data_offset + data_len as usize > data.len() {
        return Err(format!(
            "data chunk declares {} bytes but only {} remain",
            data_len,
            data.len() - data_offset
        ));
    }

    Ok(WavInfo {
        audio_format,
        channels,
        sample_rate,
        byte_rate,
        block_align,
        bits_per_sample,
        data_len,
        data_offset,
    })
}

/// Samples of a mono 16-bit PCM clip
pub fn pcm16_samples(data: &[u8]) -> Result<Vec<i16>, String> {
    let info = inspect_wav(data)?;
    if info.audio_format != 1 {
        return Err("Only uncompressed PCM supported".into());
    }
    if info.bits_per_sample != 16 {
        return Err(format!(
            "Unsupported bit depth {} (expected 16)",
            info.bits_per_sample
        ));
    }

    let start = info.data_offset;
    let end = start + info.data_len as usize;
    Ok(data[start..end]
        .chunks_exact(2)
        .map(|ch| i16::from_le_bytes([ch[0], ch[1]]))
        .collect())
}

#[cfg(test)]
#[path = "test_wav_parser.rs"]
mod tests;
