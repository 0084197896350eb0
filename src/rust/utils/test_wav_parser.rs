use super::*;

fn minimal_header(data_len: u32) -> Vec<u8> {
    let mut data = vec![0u8; 44];
    data[0..4].copy_from_slice(b"RIFF");
    data[4..8].copy_from_slice(&(36 + data_len).to_le_bytes());
    data[8..12].copy_from_slice(b"WAVE");
    data[12..16].copy_from_slice(b"fmt ");
    data[16..20].copy_from_slice(&16u32.to_le_bytes()); // fmt size
    data[20..22].copy_from_slice(&1u16.to_le_bytes()); // PCM
    data[22..24].copy_from_slice(&1u16.to_le_bytes()); // mono
    data[24..28].copy_from_slice(&44100u32.to_le_bytes()); // sample rate
    data[28..32].copy_from_slice(&88200u32.to_le_bytes()); // byte rate
    data[32..34].copy_from_slice(&2u16.to_le_bytes()); // block align
    data[34..36].copy_from_slice(&16u16.to_le_bytes()); // bit depth
    data[36..40].copy_from_slice(b"data");
    data[40..44].copy_from_slice(&data_len.to_le_bytes());
    data
}

#[test]
fn test_invalid_wav() {
    let data = vec![0u8; 10];
    assert!(inspect_wav(&data).is_err());

    let mut bad_magic = minimal_header(0);
    bad_magic[0..4].copy_from_slice(b"RIFX");
    assert!(inspect_wav(&bad_magic).is_err());
}

#[test]
fn test_valid_wav_header() {
    let mut data = minimal_header(4);
    data.extend_from_slice(&100i16.to_le_bytes());
    data.extend_from_slice(&(-100i16).to_le_bytes());

    let info = inspect_wav(&data).unwrap();
    assert_eq!(info.audio_format, 1);
    assert_eq!(info.channels, 1);
    assert_eq!(info.sample_rate, 44100);
    assert_eq!(info.bits_per_sample, 16);
    assert_eq!(info.data_len, 4);
    assert_eq!(info.data_offset, 44);
    assert_eq!(info.sample_count(), 2);

    assert_eq!(pcm16_samples(&data).unwrap(), vec![100, -100]);
}

#[test]
fn test_truncated_data_chunk() {
    let data = minimal_header(8);
    assert!(inspect_wav(&data).is_err());
}
