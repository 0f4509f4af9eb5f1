//! Audio codec conversions: ADPCM decode/encode and the format-pair façade.

pub mod dsp;
pub mod psx;

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::audio::{AudioFormat, AudioStream, AudioStreamInfo};

/// An error produced while converting between audio formats.
#[derive(Debug)]
pub struct CodecError {
    kind: CodecErrorKind,
}

#[derive(Debug)]
enum CodecErrorKind {
    PsxPredictorOutOfRange { predictor: u8 },
    UnsupportedConversion { from: AudioFormat, to: AudioFormat },
    InvalidWaveHeader { reason: &'static str },
}

impl CodecError {
    pub(crate) fn psx_predictor_out_of_range(predictor: u8) -> Self {
        Self { kind: CodecErrorKind::PsxPredictorOutOfRange { predictor } }
    }

    pub(crate) fn unsupported_conversion(from: AudioFormat, to: AudioFormat) -> Self {
        Self { kind: CodecErrorKind::UnsupportedConversion { from, to } }
    }

    /// Reports a malformed or unsupported WAV header encountered while
    /// importing PCM for re-encoding.
    #[must_use]
    pub fn invalid_wave_header(reason: &'static str) -> Self {
        Self { kind: CodecErrorKind::InvalidWaveHeader { reason } }
    }
}

impl Display for CodecError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            CodecErrorKind::PsxPredictorOutOfRange { predictor } => {
                write!(f, "PSX ADPCM predictor index {predictor} is out of range (must be 0..=4)")
            }
            CodecErrorKind::UnsupportedConversion { from, to } => {
                write!(f, "no conversion path from {from:?} to {to:?}")
            }
            CodecErrorKind::InvalidWaveHeader { reason } => {
                write!(f, "invalid WAV header: {reason}")
            }
        }
    }
}

impl Error for CodecError {}

/// Converts `stream` into the requested target format, decoding or
/// encoding as needed.
///
/// `Pcm -> Pcm` is a passthrough clone. `Dsp -> Pcm` and `Psx -> Pcm`
/// decode. `Pcm -> Dsp` encodes. All other pairs are unsupported.
///
/// # Errors
/// Returns [`CodecError`] if the pair is unsupported or the input is malformed.
pub fn convert(stream: &AudioStream, target: AudioFormat) -> Result<AudioStream, CodecError> {
    let from = stream.info.format;
    match (from, target) {
        (a, b) if a == b => Ok(stream.clone()),
        (AudioFormat::Dsp, AudioFormat::Pcm) => dsp::decode(stream),
        (AudioFormat::Psx, AudioFormat::Pcm) => psx::decode(stream),
        (AudioFormat::Pcm, AudioFormat::Dsp) => dsp::encode(stream),
        (from, to) => Err(CodecError::unsupported_conversion(from, to)),
    }
}

pub(crate) fn pcm_stream(info: AudioStreamInfo, samples: Vec<i16>) -> AudioStream {
    let mut data = Vec::with_capacity(samples.len() * 2);
    for s in samples {
        data.extend_from_slice(&s.to_le_bytes());
    }
    AudioStream { info: AudioStreamInfo { format: AudioFormat::Pcm, ..info }, data }
}

#[cfg(test)]
mod test {
    use super::convert;
    use crate::audio::{AudioFormat, AudioStream, AudioStreamInfo};

    #[test]
    fn pcm_to_pcm_is_passthrough() {
        let info = AudioStreamInfo {
            format: AudioFormat::Pcm,
            num_channels: 1,
            endianness: crate::bytestream::Endianness::Little,
            sample_rate: 8000,
            num_samples: 2,
            wavefile_cuuid: crate::cuuid::Cuuid::NULL,
        };
        let stream = AudioStream { info, data: vec![1, 2, 3, 4] };
        let out = convert(&stream, AudioFormat::Pcm).unwrap();
        assert_eq!(out.data, stream.data);
    }

    #[test]
    fn unsupported_pair_errors() {
        let info = AudioStreamInfo {
            format: AudioFormat::Mp3,
            num_channels: 1,
            endianness: crate::bytestream::Endianness::Little,
            sample_rate: 8000,
            num_samples: 2,
            wavefile_cuuid: crate::cuuid::Cuuid::NULL,
        };
        let stream = AudioStream { info, data: vec![] };
        assert!(convert(&stream, AudioFormat::Psx).is_err());
    }
}
