//! `IdObjPtr`, the common base of the id-linked "pointer" classes, and
//! `WaveFileIdObj`, the leaf audio-bearing class.

use crate::audio::{AudioFormat, AudioStream, AudioStreamInfo};
use crate::bytestream::Stream;
use crate::container::ContainerIo;
use crate::cuuid::Cuuid;
use crate::version::Version;

use super::ClassError;

const WAVE_FORMAT_HEADER_LEN: u32 = 44;

const RIFF_CODE: u32 = 0x4646_4952; // "RIFF"
const WAVE_CODE: u32 = 0x4556_4157; // "WAVE"
const FMT_CODE: u32 = 0x2074_6d66; // "fmt "
const DATA_CODE: u32 = 0x6174_6164; // "data"
const DATA_EXT_CODE: u32 = 0x7874_6164; // "datx"

/// HX2's convention for an external-stream filename: stored on the wire
/// with a literal `.\` prefix, stripped before it's handed to a read
/// callback.
const HX2_PREFIX: &str = ".\\";

/// Fields shared by the classes that front a CUUID-identified object:
/// an id, an opaque `f32`, and a set of flags. The flags field's wire
/// width is version-dependent: a full `u32` (plus a trailing `u32`
/// `unknown2`) on `Hxg`, a single byte (no `unknown2`) on every other
/// version.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct IdObjPtr {
    /// Object identifier.
    pub id: u32,
    /// Opaque float, carried through unchanged.
    pub unknown: f32,
    /// Per-object flag bits. See [`IdObjPtr::EXTERNAL`].
    pub flags: u32,
    /// Opaque trailing `u32`, present only on `Hxg`; `0` on every other version.
    pub unknown2: u32,
}

impl IdObjPtr {
    /// Set when a `WaveFileIdObj`'s sample data lives in a separate
    /// asset file rather than inline in the container.
    pub const EXTERNAL: u32 = 1 << 0;

    pub(super) fn read(s: &mut Stream, version: Version) -> Result<Self, ClassError> {
        let mut id = 0u32;
        s.rw_u32(&mut id).map_err(ClassError::factory())?;
        let mut unknown = 0f32;
        s.rw_f32(&mut unknown).map_err(ClassError::factory())?;

        let (flags, unknown2) = if version == Version::Hxg {
            let mut flags = 0u32;
            s.rw_u32(&mut flags).map_err(ClassError::factory())?;
            let mut unknown2 = 0u32;
            s.rw_u32(&mut unknown2).map_err(ClassError::factory())?;
            (flags, unknown2)
        } else {
            let mut flags_byte = 0u8;
            s.rw_u8(&mut flags_byte).map_err(ClassError::factory())?;
            (u32::from(flags_byte), 0)
        };

        Ok(Self { id, unknown, flags, unknown2 })
    }

    pub(super) fn write(&self, s: &mut Stream, version: Version) -> Result<(), ClassError> {
        let mut id = self.id;
        s.rw_u32(&mut id).map_err(ClassError::factory())?;
        let mut unknown = self.unknown;
        s.rw_f32(&mut unknown).map_err(ClassError::factory())?;

        if version == Version::Hxg {
            let mut flags = self.flags;
            s.rw_u32(&mut flags).map_err(ClassError::factory())?;
            let mut unknown2 = self.unknown2;
            s.rw_u32(&mut unknown2).map_err(ClassError::factory())?;
        } else {
            let mut flags_byte = self.flags as u8;
            s.rw_u8(&mut flags_byte).map_err(ClassError::factory())?;
        }
        Ok(())
    }

    fn is_external(self) -> bool {
        self.flags & Self::EXTERNAL != 0
    }
}

/// The fixed-layout RIFF/WAVE-style header embedded in every
/// `WaveFileIdObj` body, ahead of either its inline sample data or its
/// external-stream pointer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct WaveFormatHeader {
    /// Must equal `"RIFF"` as a little-endian `u32`.
    pub riff_code: u32,
    /// `data_length + sizeof(WaveFormatHeader) - 8`.
    pub riff_length: u32,
    /// Must equal `"WAVE"` as a little-endian `u32`.
    pub wave_code: u32,
    /// Must equal `"fmt "` as a little-endian `u32`.
    pub fmt_code: u32,
    /// Size in bytes of the format sub-chunk that follows (always 16 here).
    pub chunk_size: u32,
    /// Codec tag, mirrored from the owning stream's [`AudioFormat`].
    pub format: u16,
    /// Interleaved channel count.
    pub channels: u16,
    /// Sample rate in Hz.
    pub sample_rate: u32,
    /// Average bytes per second.
    pub bytes_per_second: u32,
    /// Block alignment in bytes.
    pub alignment: u16,
    /// Bits per sample.
    pub bits_per_sample: u16,
    /// `"data"` for inline sample data, `"datx"` for an external stream.
    pub data_code: u32,
    /// Inline: the sample data's length in bytes. External: always `8`,
    /// the byte length of the `ext_stream_size`/`ext_stream_offset` pair.
    pub data_length: u32,
}

impl WaveFormatHeader {
    pub(super) fn read(s: &mut Stream) -> Result<Self, ClassError> {
        let mut riff_code = 0u32;
        s.rw_u32(&mut riff_code).map_err(ClassError::factory())?;
        let mut riff_length = 0u32;
        s.rw_u32(&mut riff_length).map_err(ClassError::factory())?;
        let mut wave_code = 0u32;
        s.rw_u32(&mut wave_code).map_err(ClassError::factory())?;
        let mut fmt_code = 0u32;
        s.rw_u32(&mut fmt_code).map_err(ClassError::factory())?;
        let mut chunk_size = 0u32;
        s.rw_u32(&mut chunk_size).map_err(ClassError::factory())?;
        let mut format = 0u16;
        s.rw_u16(&mut format).map_err(ClassError::factory())?;
        let mut channels = 0u16;
        s.rw_u16(&mut channels).map_err(ClassError::factory())?;
        let mut sample_rate = 0u32;
        s.rw_u32(&mut sample_rate).map_err(ClassError::factory())?;
        let mut bytes_per_second = 0u32;
        s.rw_u32(&mut bytes_per_second).map_err(ClassError::factory())?;
        let mut alignment = 0u16;
        s.rw_u16(&mut alignment).map_err(ClassError::factory())?;
        let mut bits_per_sample = 0u16;
        s.rw_u16(&mut bits_per_sample).map_err(ClassError::factory())?;
        let mut data_code = 0u32;
        s.rw_u32(&mut data_code).map_err(ClassError::factory())?;
        let mut data_length = 0u32;
        s.rw_u32(&mut data_length).map_err(ClassError::factory())?;

        let header = Self {
            riff_code,
            riff_length,
            wave_code,
            fmt_code,
            chunk_size,
            format,
            channels,
            sample_rate,
            bytes_per_second,
            alignment,
            bits_per_sample,
            data_code,
            data_length,
        };
        if header.riff_code != RIFF_CODE || header.wave_code != WAVE_CODE || header.fmt_code != FMT_CODE {
            return Err(ClassError::invalid_wave_header("bad RIFF/WAVE/fmt magic"));
        }
        Ok(header)
    }

    pub(super) fn write(&self, s: &mut Stream) -> Result<(), ClassError> {
        let mut riff_code = self.riff_code;
        s.rw_u32(&mut riff_code).map_err(ClassError::factory())?;
        let mut riff_length = self.riff_length;
        s.rw_u32(&mut riff_length).map_err(ClassError::factory())?;
        let mut wave_code = self.wave_code;
        s.rw_u32(&mut wave_code).map_err(ClassError::factory())?;
        let mut fmt_code = self.fmt_code;
        s.rw_u32(&mut fmt_code).map_err(ClassError::factory())?;
        let mut chunk_size = self.chunk_size;
        s.rw_u32(&mut chunk_size).map_err(ClassError::factory())?;
        let mut format = self.format;
        s.rw_u16(&mut format).map_err(ClassError::factory())?;
        let mut channels = self.channels;
        s.rw_u16(&mut channels).map_err(ClassError::factory())?;
        let mut sample_rate = self.sample_rate;
        s.rw_u32(&mut sample_rate).map_err(ClassError::factory())?;
        let mut bytes_per_second = self.bytes_per_second;
        s.rw_u32(&mut bytes_per_second).map_err(ClassError::factory())?;
        let mut alignment = self.alignment;
        s.rw_u16(&mut alignment).map_err(ClassError::factory())?;
        let mut bits_per_sample = self.bits_per_sample;
        s.rw_u16(&mut bits_per_sample).map_err(ClassError::factory())?;
        let mut data_code = self.data_code;
        s.rw_u32(&mut data_code).map_err(ClassError::factory())?;
        let mut data_length = self.data_length;
        s.rw_u32(&mut data_length).map_err(ClassError::factory())?;
        Ok(())
    }
}

/// A named audio resource: the leaf object that actually carries encoded
/// (or PCM) sample data, inline or in a separate asset file.
#[derive(Clone, Debug, PartialEq)]
pub struct WaveFileIdObj {
    /// Shared id-pointer fields, including the `EXTERNAL` flag.
    pub id_obj: IdObjPtr,
    /// Display name. Per-language links are named
    /// `"{name}_{lang_abbrev}"` by the post-read pass (see
    /// [`crate::container::Container::read`]). Not a wire field.
    pub name: String,
    /// External-stream filename, on-disk form (HX2 carries it with a
    /// literal `.\` prefix). Empty when `id_obj` is not `EXTERNAL`.
    pub ext_stream_filename: String,
    /// Byte length of the external stream's sample data.
    pub ext_stream_size: u32,
    /// Byte offset of the external stream's sample data within the
    /// external asset file.
    pub ext_stream_offset: u32,
    /// The embedded RIFF/WAVE-style header.
    pub wave_header: WaveFormatHeader,
    /// Format, channel count, sample rate, and the linked sample data.
    pub audio_stream: AudioStream,
    /// Trailing bytes past the declared `data_length`, preserved
    /// verbatim; this crate does not interpret them.
    pub extra_wave_data: Vec<u8>,
}

impl WaveFileIdObj {
    pub(crate) fn read(
        s: &mut Stream,
        version: Version,
        cuuid: Cuuid,
        io: &mut dyn ContainerIo,
    ) -> Result<Self, ClassError> {
        let id_obj = IdObjPtr::read(s, version)?;
        let external = id_obj.is_external();

        let mut name_len = 0u32;
        s.rw_u32(&mut name_len).map_err(ClassError::factory())?;
        let mut name_bytes = vec![0u8; name_len as usize];
        s.rw_raw(&mut name_bytes, name_len as usize).map_err(ClassError::factory())?;
        let name = String::from_utf8_lossy(&name_bytes).into_owned();

        let mut ext_stream_filename = String::new();
        if external {
            let mut filename_len = 0u32;
            s.rw_u32(&mut filename_len).map_err(ClassError::factory())?;
            let mut filename_bytes = vec![0u8; filename_len as usize];
            s.rw_raw(&mut filename_bytes, filename_len as usize).map_err(ClassError::factory())?;
            let raw = String::from_utf8_lossy(&filename_bytes).into_owned();
            ext_stream_filename =
                if version == Version::Hx2 && !raw.starts_with(HX2_PREFIX) { format!("{HX2_PREFIX}{raw}") } else { raw };
        }

        let wave_header = WaveFormatHeader::read(s)?;

        let format = AudioFormat::from_tag(wave_header.format as u8)
            .ok_or_else(|| ClassError::invalid_wave_header("unrecognized audio format tag"))?;

        let mut ext_stream_size = 0u32;
        let mut ext_stream_offset = 0u32;
        let data = if external {
            if wave_header.data_code != DATA_EXT_CODE || wave_header.data_length != 8 {
                return Err(ClassError::invalid_wave_header("external stream's data chunk must be \"datx\"/8"));
            }
            s.rw_u32(&mut ext_stream_size).map_err(ClassError::factory())?;
            s.rw_u32(&mut ext_stream_offset).map_err(ClassError::factory())?;

            let callback_path = ext_stream_filename.strip_prefix(HX2_PREFIX).unwrap_or(&ext_stream_filename);
            let mut size = u64::from(ext_stream_size);
            io.read(callback_path, u64::from(ext_stream_offset), &mut size)
                .ok_or_else(|| ClassError::callback_failure(callback_path))?
        } else {
            if wave_header.data_code != DATA_CODE {
                return Err(ClassError::invalid_wave_header("inline stream's data chunk must be \"data\""));
            }
            let mut data = vec![0u8; wave_header.data_length as usize];
            s.rw_raw(&mut data, wave_header.data_length as usize).map_err(ClassError::factory())?;
            data
        };

        let mut extra_len =
            i64::from(wave_header.riff_length) + 8 - i64::from(wave_header.data_length) - i64::from(WAVE_FORMAT_HEADER_LEN);
        if external {
            extra_len += 4;
        }
        let extra_wave_data = if extra_len > 0 {
            if !external {
                extra_len += 1;
            }
            let mut extra = vec![0u8; extra_len as usize];
            s.rw_raw(&mut extra, extra_len as usize).map_err(ClassError::factory())?;
            extra
        } else {
            Vec::new()
        };

        let audio_stream = AudioStream {
            info: AudioStreamInfo {
                format,
                num_channels: u32::from(wave_header.channels),
                endianness: s.endianness(),
                sample_rate: wave_header.sample_rate,
                num_samples: 0,
                wavefile_cuuid: cuuid,
            },
            data,
        };

        Ok(Self { id_obj, name, ext_stream_filename, ext_stream_size, ext_stream_offset, wave_header, audio_stream, extra_wave_data })
    }

    pub(crate) fn write(&self, s: &mut Stream, version: Version) -> Result<(), ClassError> {
        self.id_obj.write(s, version)?;
        let external = self.id_obj.is_external();

        let name_bytes = self.name.clone().into_bytes();
        let mut name_len = name_bytes.len() as u32;
        s.rw_u32(&mut name_len).map_err(ClassError::factory())?;
        let name_byte_len = name_bytes.len();
        let mut name_bytes = name_bytes;
        s.rw_raw(&mut name_bytes, name_byte_len).map_err(ClassError::factory())?;

        if external {
            let filename_bytes = self.ext_stream_filename.clone().into_bytes();
            let mut filename_len = filename_bytes.len() as u32;
            s.rw_u32(&mut filename_len).map_err(ClassError::factory())?;
            let filename_byte_len = filename_bytes.len();
            let mut filename_bytes = filename_bytes;
            s.rw_raw(&mut filename_bytes, filename_byte_len).map_err(ClassError::factory())?;
        }

        let mut header = self.wave_header;
        header.format = u16::from(self.audio_stream.info.format.tag());
        header.channels = u16::try_from(self.audio_stream.info.num_channels).unwrap_or(u16::MAX);
        header.sample_rate = self.audio_stream.info.sample_rate;
        header.data_code = if external { DATA_EXT_CODE } else { DATA_CODE };
        header.data_length = if external { 8 } else { u32::try_from(self.audio_stream.data.len()).unwrap_or(u32::MAX) };
        header.write(s)?;

        if external {
            let mut size = self.ext_stream_size;
            s.rw_u32(&mut size).map_err(ClassError::factory())?;
            let mut offset = self.ext_stream_offset;
            s.rw_u32(&mut offset).map_err(ClassError::factory())?;
        } else {
            let data_len = self.audio_stream.data.len();
            let mut data = self.audio_stream.data.clone();
            s.rw_raw(&mut data, data_len).map_err(ClassError::factory())?;
        }

        if !self.extra_wave_data.is_empty() {
            let len = self.extra_wave_data.len();
            let mut extra = self.extra_wave_data.clone();
            s.rw_raw(&mut extra, len).map_err(ClassError::factory())?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{IdObjPtr, WaveFileIdObj, WaveFormatHeader};
    use crate::audio::{AudioFormat, AudioStream, AudioStreamInfo};
    use crate::bytestream::{Endianness, Stream};
    use crate::container::{ContainerIo, ErrorSink};
    use crate::cuuid::Cuuid;
    use crate::version::Version;

    struct NoopIo;
    impl ErrorSink for NoopIo {
        fn error(&mut self, _message: &str) {}
    }
    impl ContainerIo for NoopIo {
        fn read(&mut self, _path: &str, _pos: u64, _size: &mut u64) -> Option<Vec<u8>> {
            None
        }
        fn write(&mut self, _path: &str, _data: &[u8]) -> bool {
            false
        }
    }

    fn inline_wave(data_len: u32) -> WaveFormatHeader {
        WaveFormatHeader {
            riff_code: super::RIFF_CODE,
            riff_length: data_len + super::WAVE_FORMAT_HEADER_LEN - 8,
            wave_code: super::WAVE_CODE,
            fmt_code: super::FMT_CODE,
            chunk_size: 16,
            format: AudioFormat::Dsp.tag().into(),
            channels: 1,
            sample_rate: 32000,
            bytes_per_second: 32000,
            alignment: 1,
            bits_per_sample: 4,
            data_code: super::DATA_CODE,
            data_length: data_len,
        }
    }

    #[test]
    fn round_trips_inline_audio_payload() {
        let cuuid = Cuuid::new(42);
        let data = WaveFileIdObj {
            id_obj: IdObjPtr { id: 1, unknown: 0.0, flags: 0, unknown2: 0 },
            name: "explosion_FR".into(),
            ext_stream_filename: String::new(),
            ext_stream_size: 0,
            ext_stream_offset: 0,
            wave_header: inline_wave(4),
            audio_stream: AudioStream {
                info: AudioStreamInfo {
                    format: AudioFormat::Dsp,
                    num_channels: 1,
                    endianness: Endianness::Big,
                    sample_rate: 32000,
                    num_samples: 0,
                    wavefile_cuuid: cuuid,
                },
                data: vec![1, 2, 3, 4],
            },
            extra_wave_data: Vec::new(),
        };

        let mut w = Stream::writer(128, Endianness::Big);
        data.write(&mut w, Version::Hxg).unwrap();
        let mut r = Stream::reader(w.into_inner(), Endianness::Big);
        let mut io = NoopIo;
        let read_back = WaveFileIdObj::read(&mut r, Version::Hxg, cuuid, &mut io).unwrap();
        assert_eq!(read_back, data);
        assert_eq!(read_back.audio_stream.info.wavefile_cuuid, cuuid);
    }

    #[test]
    fn hx2_prefix_is_restored_on_read_and_stripped_for_the_callback() {
        struct RecordingIo {
            seen_path: Option<String>,
        }
        impl ErrorSink for RecordingIo {
            fn error(&mut self, _message: &str) {}
        }
        impl ContainerIo for RecordingIo {
            fn read(&mut self, path: &str, _pos: u64, size: &mut u64) -> Option<Vec<u8>> {
                self.seen_path = Some(path.to_owned());
                Some(vec![0u8; *size as usize])
            }
            fn write(&mut self, _path: &str, _data: &[u8]) -> bool {
                false
            }
        }

        let mut w = Stream::writer(128, Endianness::Little);
        IdObjPtr { id: 0, unknown: 0.0, flags: IdObjPtr::EXTERNAL, unknown2: 0 }.write(&mut w, Version::Hx2).unwrap();

        let mut name_len = 0u32;
        w.rw_u32(&mut name_len).unwrap();

        let mut filename_bytes = b".\\Snd.bin".to_vec();
        let mut filename_len = filename_bytes.len() as u32;
        w.rw_u32(&mut filename_len).unwrap();
        w.rw_raw(&mut filename_bytes, 9).unwrap();

        let mut header = WaveFormatHeader {
            riff_code: super::RIFF_CODE,
            riff_length: 8 + super::WAVE_FORMAT_HEADER_LEN - 8 - 4,
            wave_code: super::WAVE_CODE,
            fmt_code: super::FMT_CODE,
            chunk_size: 16,
            format: AudioFormat::Psx.tag().into(),
            channels: 1,
            sample_rate: 22050,
            bytes_per_second: 22050,
            alignment: 1,
            bits_per_sample: 4,
            data_code: super::DATA_EXT_CODE,
            data_length: 8,
        };
        header.write(&mut w).unwrap();
        let mut ext_size = 0x100u32;
        w.rw_u32(&mut ext_size).unwrap();
        let mut ext_offset = 0x400u32;
        w.rw_u32(&mut ext_offset).unwrap();

        let mut r = Stream::reader(w.into_inner(), Endianness::Little);
        let mut io = RecordingIo { seen_path: None };
        let obj = WaveFileIdObj::read(&mut r, Version::Hx2, Cuuid::new(7), &mut io).unwrap();

        assert_eq!(obj.ext_stream_filename, ".\\Snd.bin");
        assert_eq!(io.seen_path.as_deref(), Some("Snd.bin"));
    }
}
