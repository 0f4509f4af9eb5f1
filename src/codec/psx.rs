//! PlayStation "PSX" 4-bit ADPCM decoding.

use super::{pcm_stream, CodecError};
use crate::audio::AudioStream;

const FRAME_LEN: usize = 16;
const SAMPLES_PER_FRAME: usize = 28;

/// Second-order predictor coefficient pairs, indexed by the high nibble
/// of each frame's `predict_shift` byte.
const COEFFS: [[i32; 2]; 5] = [[0, 0], [60, 0], [115, -52], [98, -55], [122, -60]];

/// Decodes a PSX ADPCM stream to interleaved 16-bit PCM.
///
/// # Errors
/// Returns [`CodecError::psx_predictor_out_of_range`] if a frame's
/// predictor nibble exceeds 4.
pub(super) fn decode(stream: &AudioStream) -> Result<AudioStream, CodecError> {
    let num_channels = stream.info.num_channels as usize;
    let bytes_per_channel = stream.data.len() / num_channels.max(1);
    let num_frames = bytes_per_channel / FRAME_LEN;
    let num_samples = num_frames * SAMPLES_PER_FRAME;

    let mut pcm = vec![0i16; num_samples * num_channels];
    let mut history = vec![(0i32, 0i32); num_channels];

    for frame_idx in 0..num_frames {
        for ch in 0..num_channels {
            let frame_start = ch * bytes_per_channel + frame_idx * FRAME_LEN;
            let frame = &stream.data[frame_start..frame_start + FRAME_LEN];
            let predict_shift = frame[0];
            let predictor = (predict_shift >> 4) as usize;
            let shift = predict_shift & 0x0F;
            if predictor > 4 {
                return Err(CodecError::psx_predictor_out_of_range(predict_shift >> 4));
            }
            let [c1, c2] = COEFFS[predictor];
            let (mut hist1, mut hist2) = history[ch];

            for nibble_idx in 0..SAMPLES_PER_FRAME {
                let byte = frame[2 + nibble_idx / 2];
                let nibble = if nibble_idx % 2 == 0 { byte & 0x0F } else { byte >> 4 };
                let mut sample = (i32::from(nibble) << 28 >> 28) << shift;
                sample += (hist1 * c1 + hist2 * c2) >> 6;
                let sample = sample.clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;

                hist2 = hist1;
                hist1 = i32::from(sample);

                pcm[(frame_idx * SAMPLES_PER_FRAME + nibble_idx) * num_channels + ch] = sample;
            }
            history[ch] = (hist1, hist2);
        }
    }

    let mut info = stream.info;
    info.num_samples = num_samples as u32;
    Ok(pcm_stream(info, pcm))
}

#[cfg(test)]
mod test {
    use super::decode;
    use crate::audio::{AudioFormat, AudioStream, AudioStreamInfo};

    fn frame(predict_shift: u8, nibbles: [u8; 28]) -> Vec<u8> {
        let mut f = vec![predict_shift, 0];
        for pair in nibbles.chunks(2) {
            f.push((pair[0] & 0x0F) | (pair[1] << 4));
        }
        f
    }

    fn psx_info(num_channels: u32) -> AudioStreamInfo {
        AudioStreamInfo {
            format: AudioFormat::Psx,
            num_channels,
            endianness: crate::bytestream::Endianness::Little,
            sample_rate: 22050,
            num_samples: 0,
            wavefile_cuuid: crate::cuuid::Cuuid::NULL,
        }
    }

    #[test]
    fn silent_frame_decodes_to_zero() {
        let data = frame(0, [0; 28]);
        let stream = AudioStream { info: psx_info(1), data };
        let out = decode(&stream).unwrap();
        assert_eq!(out.info.num_samples, 28);
        assert!(out.data.iter().all(|&b| b == 0));
    }

    #[test]
    fn predictor_above_four_errors() {
        let data = frame(5 << 4, [0; 28]);
        let stream = AudioStream { info: psx_info(1), data };
        assert!(decode(&stream).is_err());
    }

    #[test]
    fn two_channels_deinterleave_by_block() {
        let mut data = frame(0, [0; 28]);
        data.extend(frame(0, [0; 28]));
        let stream = AudioStream { info: psx_info(2), data };
        let out = decode(&stream).unwrap();
        assert_eq!(out.info.num_samples, 28);
        assert_eq!(out.data.len(), 28 * 2 * 2);
    }
}
