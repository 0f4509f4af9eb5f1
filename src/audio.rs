//! Audio format tags and the raw encoded-stream representation.

use crate::bytestream::Endianness;
use crate::cuuid::Cuuid;

/// The wire encoding of a `WaveFileIdObj`'s audio payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum AudioFormat {
    /// Raw linear PCM.
    Pcm = 0x01,
    /// Ubisoft's proprietary ADPCM variant (PC dialect only; opaque to this crate).
    Ubi = 0x02,
    /// PlayStation "PSX" 4-bit ADPCM.
    Psx = 0x03,
    /// GameCube "DSP" 4-bit ADPCM.
    Dsp = 0x04,
    /// IMA ADPCM (opaque to this crate; carried through unchanged).
    Ima = 0x05,
    /// MP3 (opaque to this crate; carried through unchanged).
    Mp3 = 0x55,
}

impl AudioFormat {
    /// Resolves a format from its wire tag byte.
    #[must_use]
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            0x01 => Some(Self::Pcm),
            0x02 => Some(Self::Ubi),
            0x03 => Some(Self::Psx),
            0x04 => Some(Self::Dsp),
            0x05 => Some(Self::Ima),
            0x55 => Some(Self::Mp3),
            _ => None,
        }
    }

    /// Returns this format's wire tag byte.
    #[must_use]
    pub fn tag(self) -> u8 {
        self as u8
    }

    /// Returns `true` if this crate can decode this format to PCM.
    #[must_use]
    pub fn is_decodable(self) -> bool {
        matches!(self, Self::Pcm | Self::Psx | Self::Dsp)
    }
}

/// Per-channel metadata describing an [`AudioStream`]'s encoding.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct AudioStreamInfo {
    /// Encoding of `data` in the owning [`AudioStream`].
    pub format: AudioFormat,
    /// Number of interleaved channels.
    pub num_channels: u32,
    /// Byte order `data`'s multi-byte fields (e.g. a DSP header's
    /// sample counts) were stored in, copied from the owning
    /// container's stream at parse time.
    pub endianness: Endianness,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Number of decoded samples per channel.
    pub num_samples: u32,
    /// The owning `WaveFileIdObj` entry's identifier. Invariant:
    /// always equal to that entry's own CUUID.
    pub wavefile_cuuid: Cuuid,
}

/// A raw encoded (or PCM) audio payload plus its decoding metadata.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct AudioStream {
    /// Format, channel count, sample rate, and sample count.
    pub info: AudioStreamInfo,
    /// Encoded bytes as stored in the container (or raw PCM bytes for `Pcm`).
    pub data: Vec<u8>,
}

impl AudioStream {
    /// Returns `true` if this stream's format can be decoded to PCM by this crate.
    #[must_use]
    pub fn is_decodable(&self) -> bool {
        self.info.format.is_decodable()
    }
}

#[cfg(test)]
mod test {
    use super::AudioFormat;

    #[test]
    fn tag_round_trips() {
        for fmt in [
            AudioFormat::Pcm,
            AudioFormat::Ubi,
            AudioFormat::Psx,
            AudioFormat::Dsp,
            AudioFormat::Ima,
            AudioFormat::Mp3,
        ] {
            assert_eq!(AudioFormat::from_tag(fmt.tag()), Some(fmt));
        }
    }

    #[test]
    fn unknown_tag_is_none() {
        assert_eq!(AudioFormat::from_tag(0xAA), None);
    }

    #[test]
    fn only_pcm_psx_dsp_are_decodable() {
        assert!(AudioFormat::Pcm.is_decodable());
        assert!(AudioFormat::Psx.is_decodable());
        assert!(AudioFormat::Dsp.is_decodable());
        assert!(!AudioFormat::Ubi.is_decodable());
        assert!(!AudioFormat::Ima.is_decodable());
        assert!(!AudioFormat::Mp3.is_decodable());
    }
}
