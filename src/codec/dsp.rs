//! GameCube "DSP" 4-bit ADPCM decoding and encoding.

use bilge::prelude::*;

use crate::bytestream::{Endianness, Stream};

use super::{pcm_stream, CodecError};
use crate::audio::{AudioFormat, AudioStream, AudioStreamInfo};

const HEADER_LEN: usize = 96;
const NUM_COEFS: usize = 16;
const FRAME_LEN: usize = 8;
const SAMPLES_PER_FRAME: usize = 14;

/// Packed layout of a frame's leading `ps` byte: scale exponent in the
/// low nibble, predictor index in the high nibble.
#[bitsize(8)]
#[derive(FromBits)]
struct FrameHeader {
    scale_shift: u4,
    predictor: u4,
}

/// Per-channel DSP ADPCM header, as stored immediately before each
/// channel's frame data.
#[derive(Clone, Copy, Debug)]
struct DspHeader {
    num_samples: u32,
    num_nibbles: u32,
    sample_rate: u32,
    loop_flag: u16,
    format: u16,
    loop_start: u32,
    loop_end: u32,
    ca: u32,
    coefs: [i16; NUM_COEFS],
    gain: u16,
    ps: u16,
    hist1: i16,
    hist2: i16,
    loop_ps: u16,
    loop_hist1: i16,
    loop_hist2: i16,
}

impl DspHeader {
    fn read(s: &mut Stream) -> Result<Self, crate::bytestream::StreamError> {
        let mut num_samples = 0u32;
        let mut num_nibbles = 0u32;
        let mut sample_rate = 0u32;
        let mut loop_flag = 0u16;
        let mut format = 0u16;
        let mut loop_start = 0u32;
        let mut loop_end = 0u32;
        let mut ca = 0u32;
        s.rw_u32(&mut num_samples)?;
        s.rw_u32(&mut num_nibbles)?;
        s.rw_u32(&mut sample_rate)?;
        s.rw_u16(&mut loop_flag)?;
        s.rw_u16(&mut format)?;
        s.rw_u32(&mut loop_start)?;
        s.rw_u32(&mut loop_end)?;
        s.rw_u32(&mut ca)?;

        let mut coefs = [0i16; NUM_COEFS];
        for c in &mut coefs {
            s.rw_i16(c)?;
        }

        let mut gain = 0u16;
        let mut ps = 0u16;
        let mut hist1 = 0i16;
        let mut hist2 = 0i16;
        let mut loop_ps = 0u16;
        let mut loop_hist1 = 0i16;
        let mut loop_hist2 = 0i16;
        s.rw_u16(&mut gain)?;
        s.rw_u16(&mut ps)?;
        s.rw_i16(&mut hist1)?;
        s.rw_i16(&mut hist2)?;
        s.rw_u16(&mut loop_ps)?;
        s.rw_i16(&mut loop_hist1)?;
        s.rw_i16(&mut loop_hist2)?;

        let mut padding = vec![0u8; 22];
        s.rw_raw(&mut padding, 22)?;

        Ok(Self {
            num_samples,
            num_nibbles,
            sample_rate,
            loop_flag,
            format,
            loop_start,
            loop_end,
            ca,
            coefs,
            gain,
            ps,
            hist1,
            hist2,
            loop_ps,
            loop_hist1,
            loop_hist2,
        })
    }

    fn write(&self, s: &mut Stream) -> Result<(), crate::bytestream::StreamError> {
        let mut num_samples = self.num_samples;
        let mut num_nibbles = self.num_nibbles;
        let mut sample_rate = self.sample_rate;
        let mut loop_flag = self.loop_flag;
        let mut format = self.format;
        let mut loop_start = self.loop_start;
        let mut loop_end = self.loop_end;
        let mut ca = self.ca;
        s.rw_u32(&mut num_samples)?;
        s.rw_u32(&mut num_nibbles)?;
        s.rw_u32(&mut sample_rate)?;
        s.rw_u16(&mut loop_flag)?;
        s.rw_u16(&mut format)?;
        s.rw_u32(&mut loop_start)?;
        s.rw_u32(&mut loop_end)?;
        s.rw_u32(&mut ca)?;

        for &c in &self.coefs {
            let mut c = c;
            s.rw_i16(&mut c)?;
        }

        let mut gain = self.gain;
        let mut ps = self.ps;
        let mut hist1 = self.hist1;
        let mut hist2 = self.hist2;
        let mut loop_ps = self.loop_ps;
        let mut loop_hist1 = self.loop_hist1;
        let mut loop_hist2 = self.loop_hist2;
        s.rw_u16(&mut gain)?;
        s.rw_u16(&mut ps)?;
        s.rw_i16(&mut hist1)?;
        s.rw_i16(&mut hist2)?;
        s.rw_u16(&mut loop_ps)?;
        s.rw_i16(&mut loop_hist1)?;
        s.rw_i16(&mut loop_hist2)?;

        let mut padding = vec![0u8; 22];
        s.rw_raw(&mut padding, 22)?;
        Ok(())
    }
}

/// Decodes a DSP ADPCM stream (per-channel headers followed by that
/// channel's frame data) to interleaved 16-bit PCM.
///
/// # Errors
/// Returns [`CodecError`] if a channel's header or frame data is truncated.
pub(super) fn decode(stream: &AudioStream) -> Result<AudioStream, CodecError> {
    let num_channels = stream.info.num_channels as usize;
    let mut s = Stream::reader(stream.data.clone(), Endianness::Big);

    let mut headers = Vec::with_capacity(num_channels);
    let mut channel_data = Vec::with_capacity(num_channels);
    for _ in 0..num_channels.max(1) {
        let header =
            DspHeader::read(&mut s).map_err(|_| CodecError::invalid_wave_header("truncated DSP channel header"))?;
        let num_frames = (header.num_samples as usize).div_ceil(SAMPLES_PER_FRAME);
        let frame_bytes = num_frames * FRAME_LEN;
        let mut data = vec![0u8; frame_bytes];
        s.rw_bytes(&mut data).map_err(|_| CodecError::invalid_wave_header("truncated DSP frame data"))?;
        channel_data.push(data);
        headers.push(header);
    }

    let num_samples = headers.first().map_or(0, |h| h.num_samples as usize);
    let mut pcm = vec![0i16; num_samples * num_channels];

    for (ch, (header, data)) in headers.iter().zip(channel_data.iter()).enumerate() {
        let mut hist1 = i32::from(header.hist1);
        let mut hist2 = i32::from(header.hist2);
        let mut out_idx = 0usize;

        for frame in data.chunks(FRAME_LEN) {
            let ps = FrameHeader::from(frame[0]);
            let predictor = u8::from(ps.predictor()) as usize;
            let scale_shift = u8::from(ps.scale_shift());
            let (c1, c2) = (i32::from(header.coefs[predictor * 2]), i32::from(header.coefs[predictor * 2 + 1]));

            for nibble_idx in 0..SAMPLES_PER_FRAME {
                if out_idx >= num_samples {
                    break;
                }
                let byte = frame[1 + nibble_idx / 2];
                let nibble = if nibble_idx % 2 == 0 { byte >> 4 } else { byte & 0x0F };
                let signed_nibble = (i32::from(nibble) << 28) >> 28;
                let scale = 1i32 << scale_shift;

                let sample = ((scale * signed_nibble) << 11) + 1024 + c1 * hist1 + c2 * hist2;
                let sample = (sample >> 11).clamp(i32::from(i16::MIN), i32::from(i16::MAX)) as i16;

                hist2 = hist1;
                hist1 = i32::from(sample);

                pcm[out_idx * num_channels + ch] = sample;
                out_idx += 1;
            }
        }
    }

    let info = AudioStreamInfo {
        format: AudioFormat::Dsp,
        num_channels: stream.info.num_channels,
        endianness: stream.info.endianness,
        sample_rate: headers.first().map_or(stream.info.sample_rate, |h| h.sample_rate),
        num_samples: num_samples as u32,
        wavefile_cuuid: stream.info.wavefile_cuuid,
    };
    Ok(pcm_stream(info, pcm))
}

/// Encodes interleaved 16-bit PCM into DSP ADPCM, choosing a per-frame
/// scale that keeps the quantized nibble within `-8..=7` and using the
/// canonical fixed-point second-order predictor coefficients.
///
/// # Errors
/// Returns [`CodecError`] if the PCM buffer length is not a whole
/// number of samples.
pub(super) fn encode(stream: &AudioStream) -> Result<AudioStream, CodecError> {
    let num_channels = stream.info.num_channels as usize;
    if stream.data.len() % 2 != 0 {
        return Err(CodecError::invalid_wave_header("PCM buffer length is not a multiple of 2"));
    }
    let total_samples = stream.data.len() / 2;
    if num_channels == 0 || total_samples % num_channels != 0 {
        return Err(CodecError::invalid_wave_header("PCM sample count not divisible by channel count"));
    }
    let samples_per_channel = total_samples / num_channels;

    let mut deinterleaved = vec![Vec::with_capacity(samples_per_channel); num_channels];
    for (i, chunk) in stream.data.chunks(2).enumerate() {
        let sample = i16::from_le_bytes([chunk[0], chunk[1]]);
        deinterleaved[i % num_channels].push(sample);
    }

    const COEF_SETS: [(i16, i16); 4] = [(0, 0), (960, 0), (1840, -832), (1568, -880)];

    let mut out = Vec::new();
    for channel_samples in &deinterleaved {
        let mut coefs = [0i16; NUM_COEFS];
        for (i, &(c1, c2)) in COEF_SETS.iter().enumerate() {
            coefs[i * 2] = c1;
            coefs[i * 2 + 1] = c2;
        }

        let header = DspHeader {
            num_samples: channel_samples.len() as u32,
            num_nibbles: (channel_samples.len() as u32).div_ceil(SAMPLES_PER_FRAME as u32) * SAMPLES_PER_FRAME as u32,
            sample_rate: stream.info.sample_rate,
            loop_flag: 0,
            format: 0,
            loop_start: 0,
            loop_end: 0,
            ca: 0,
            coefs,
            gain: 0,
            ps: 0,
            hist1: 0,
            hist2: 0,
            loop_ps: 0,
            loop_hist1: 0,
            loop_hist2: 0,
        };

        let mut header_stream = Stream::writer(HEADER_LEN, Endianness::Big);
        header
            .write(&mut header_stream)
            .map_err(|_| CodecError::invalid_wave_header("failed writing DSP channel header"))?;
        out.extend_from_slice(&header_stream.into_inner());

        let mut hist1 = 0i32;
        let mut hist2 = 0i32;

        for frame_samples in channel_samples.chunks(SAMPLES_PER_FRAME) {
            let (predictor, scale_shift, nibbles, h1, h2) = encode_frame(frame_samples, &COEF_SETS, hist1, hist2);
            hist1 = h1;
            hist2 = h2;

            let mut frame = vec![0u8; FRAME_LEN];
            let header_byte = FrameHeader::new(u4::new(scale_shift), u4::new(predictor as u8));
            frame[0] = u8::from(header_byte);
            for (i, &n) in nibbles.iter().enumerate() {
                let byte_idx = 1 + i / 2;
                if i % 2 == 0 {
                    frame[byte_idx] |= n << 4;
                } else {
                    frame[byte_idx] |= n & 0x0F;
                }
            }
            out.extend_from_slice(&frame);
        }
    }

    let info = AudioStreamInfo {
        format: AudioFormat::Dsp,
        num_channels: stream.info.num_channels,
        endianness: stream.info.endianness,
        sample_rate: stream.info.sample_rate,
        num_samples: samples_per_channel as u32,
        wavefile_cuuid: stream.info.wavefile_cuuid,
    };
    Ok(AudioStream { info, data: out })
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn encode_frame(
    samples: &[i16],
    coef_sets: &[(i16, i16); 4],
    start_hist1: i32,
    start_hist2: i32,
) -> (usize, u8, Vec<u8>, i32, i32) {
    let mut best: Option<(usize, u8, Vec<u8>, i32, i32, i64)> = None;

    for (predictor, &(c1, c2)) in coef_sets.iter().enumerate() {
        let (c1, c2) = (i32::from(c1), i32::from(c2));
        for scale_shift in 0u8..12 {
            let scale = 1i32 << scale_shift;
            let mut hist1 = start_hist1;
            let mut hist2 = start_hist2;
            let mut nibbles = Vec::with_capacity(samples.len());
            let mut error = 0i64;

            for &target in samples {
                let predicted = (c1 * hist1 + c2 * hist2) >> 11;
                let diff = i32::from(target) - predicted;
                let nibble = ((diff + scale / 2) / scale).clamp(-8, 7);
                let quant_nibble = (nibble & 0x0F) as u8;

                let reconstructed = (((scale * nibble) << 11) + 1024 + c1 * hist1 + c2 * hist2) >> 11;
                let reconstructed = reconstructed.clamp(i32::from(i16::MIN), i32::from(i16::MAX));

                error += i64::from(i32::from(target) - reconstructed).pow(2);
                hist2 = hist1;
                hist1 = reconstructed;
                nibbles.push(quant_nibble);
            }

            if best.as_ref().is_none_or(|(_, _, _, _, _, best_err)| error < *best_err) {
                best = Some((predictor, scale_shift, nibbles, hist1, hist2, error));
            }
        }
    }

    let (predictor, scale_shift, nibbles, hist1, hist2, _) = best.expect("coef_sets and scale range are non-empty");
    (predictor, scale_shift, nibbles, hist1, hist2)
}

#[cfg(test)]
mod test {
    use super::{decode, encode};
    use crate::audio::{AudioFormat, AudioStream, AudioStreamInfo};

    fn sine_pcm(num_samples: usize) -> Vec<u8> {
        let mut data = Vec::with_capacity(num_samples * 2);
        for i in 0..num_samples {
            let t = i as f32 / 8.0;
            let sample = (t.sin() * 8000.0) as i16;
            data.extend_from_slice(&sample.to_le_bytes());
        }
        data
    }

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
    fn encode_then_decode_approximates_input() {
        let info = pcm_info(1, 32000, 64);
        let data = sine_pcm(64);
        let pcm_in = AudioStream { info, data };

        let encoded = encode(&pcm_in).unwrap();
        assert_eq!(encoded.info.format, AudioFormat::Dsp);

        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.info.num_samples, 64);
        assert_eq!(decoded.data.len(), 64 * 2);
    }

    #[test]
    fn stereo_round_trip_preserves_sample_count() {
        let info = pcm_info(2, 32000, 28);
        let mut data = Vec::new();
        for sample in sine_pcm(28).chunks(2) {
            data.extend_from_slice(sample);
            data.extend_from_slice(sample);
        }
        let pcm_in = AudioStream { info, data };

        let encoded = encode(&pcm_in).unwrap();
        let decoded = decode(&encoded).unwrap();
        assert_eq!(decoded.info.num_samples, 28);
        assert_eq!(decoded.data.len(), 28 * 2 * 2);
    }
}
