//! Minimal RIFF/WAVE container emission for decoded PCM.

use crate::audio::AudioStreamInfo;

const HEADER_LEN: usize = 44;
const PCM_FORMAT_TAG: u16 = 1;
const BITS_PER_SAMPLE: u16 = 16;

/// Writes a canonical 44-byte RIFF/WAVE header followed by `pcm` into a
/// fresh buffer. `pcm` is interpreted as interleaved 16-bit little-endian
/// samples, matching `info.num_channels`.
///
/// The header is always little-endian, regardless of the source
/// container's byte order.
#[must_use]
pub fn write_wav(info: &AudioStreamInfo, pcm: &[u8]) -> Vec<u8> {
    let block_alignment = u16::try_from(info.num_channels).unwrap_or(u16::MAX) * (BITS_PER_SAMPLE / 8);
    let bytes_per_second = info.sample_rate * u32::from(block_alignment);
    let data_len = u32::try_from(pcm.len()).unwrap_or(u32::MAX);
    let riff_len = data_len + (HEADER_LEN as u32 - 8);

    let mut out = Vec::with_capacity(HEADER_LEN + pcm.len());
    out.extend_from_slice(b"RIFF");
    out.extend_from_slice(&riff_len.to_le_bytes());
    out.extend_from_slice(b"WAVE");

    out.extend_from_slice(b"fmt ");
    out.extend_from_slice(&16u32.to_le_bytes());
    out.extend_from_slice(&PCM_FORMAT_TAG.to_le_bytes());
    out.extend_from_slice(&u16::try_from(info.num_channels).unwrap_or(u16::MAX).to_le_bytes());
    out.extend_from_slice(&info.sample_rate.to_le_bytes());
    out.extend_from_slice(&bytes_per_second.to_le_bytes());
    out.extend_from_slice(&block_alignment.to_le_bytes());
    out.extend_from_slice(&BITS_PER_SAMPLE.to_le_bytes());

    out.extend_from_slice(b"data");
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(pcm);

    debug_assert_eq!(out.len(), HEADER_LEN + pcm.len());
    out
}

#[cfg(test)]
mod test {
    use super::write_wav;
    use crate::audio::{AudioFormat, AudioStreamInfo};

    fn pcm_info(num_channels: u32, sample_rate: u32, num_samples: u32) -> AudioStreamInfo {
        AudioStreamInfo {
            format: AudioFormat::Pcm,
            num_channels,
            endianness: crate::bytestream::Endianness::Little,
            sample_rate,
            num_samples,
            wavefile_cuuid: crate::cuuid::Cuuid::NULL,
        }
    }

    #[test]
    fn header_is_44_bytes_and_little_endian() {
        let info = pcm_info(2, 44100, 4);
        let pcm = vec![0u8; 16];
        let wav = write_wav(&info, &pcm);

        assert_eq!(&wav[0..4], b"RIFF");
        assert_eq!(&wav[8..12], b"WAVE");
        assert_eq!(&wav[12..16], b"fmt ");
        assert_eq!(u16::from_le_bytes([wav[22], wav[23]]), 2);
        assert_eq!(u32::from_le_bytes([wav[24], wav[25], wav[26], wav[27]]), 44100);
        assert_eq!(u16::from_le_bytes([wav[32], wav[33]]), 4);
        assert_eq!(&wav[36..40], b"data");
        assert_eq!(u32::from_le_bytes([wav[40], wav[41], wav[42], wav[43]]), 16);
        assert_eq!(wav.len(), 44 + 16);
    }

    #[test]
    fn riff_length_excludes_riff_header_itself() {
        let info = pcm_info(1, 8000, 2);
        let pcm = vec![0u8; 4];
        let wav = write_wav(&info, &pcm);
        let riff_len = u32::from_le_bytes([wav[4], wav[5], wav[6], wav[7]]);
        assert_eq!(riff_len, 36 + 4);
    }
}
