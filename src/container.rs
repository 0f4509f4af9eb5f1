//! Container read/write: the top-level index format and the post-read
//! cross-linking pass.

use std::collections::HashMap;
use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use log::{debug, warn};

use crate::bytestream::{Endianness, Stream, StreamError};
use crate::class::{ClassError, ClassTag, Entry, Payload};
use crate::cuuid::Cuuid;
use crate::language::Language;
use crate::version::Version;

const INDEX_MAGIC: u32 = 0x5844_4E49; // "INDX"
const INDEX_PADDING_LEN: usize = 32;

/// Which shape an index record uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum IndexType {
    /// Entry identity and location only.
    Basic = 1,
    /// Basic fields plus link and language-link CUUIDs, redundant with
    /// the entry body's own fields, used for faster scans.
    WithLinks = 2,
}

impl IndexType {
    fn from_u32(v: u32) -> Option<Self> {
        match v {
            1 => Some(Self::Basic),
            2 => Some(Self::WithLinks),
            _ => None,
        }
    }
}

struct IndexRecord {
    cuuid: Cuuid,
    class_tag: ClassTag,
    file_offset: u32,
    file_size: u32,
    /// Redundant per-language-link triples carried by `index_type == 2`
    /// records: decoded language, the opaque `unknown` field, and the
    /// linked `WaveFileIdObj`'s CUUID.
    lang_links: Vec<(Language, u32, Cuuid)>,
}

/// Options controlling how a [`Container`] reads and writes.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct ContainerOptions {
    /// If set, entry bodies are parsed lazily/streamed rather than all
    /// materialized at once, mirroring the source's memory-constrained
    /// console-platform mode.
    pub memory_less: bool,
}

/// A parsed hx-family container: its version and every entry it holds.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Container {
    /// The platform dialect this container was read as (or will be written as).
    pub version: Version,
    /// Every entry, in container order.
    pub entries: Vec<Entry>,
    /// Read/write behavior flags.
    pub options: ContainerOptions,
}

impl Container {
    /// Creates an empty container for the given version.
    #[must_use]
    pub fn new(version: Version, options: ContainerOptions) -> Self {
        Self { version, entries: Vec::new(), options }
    }

    /// Parses a complete container file held in `data`.
    ///
    /// Index records whose redundant `class_tag`/`cuuid` disagree with
    /// the entry body found at `file_offset` are logged at `warn!` and
    /// skipped, rather than failing the whole read, matching the
    /// source's tolerance of partially corrupt indices.
    ///
    /// # Errors
    /// Returns [`ContainerError`] if `data` is empty, the index header
    /// is malformed, or the index type is unrecognized.
    pub fn read(
        data: &[u8],
        version: Version,
        options: ContainerOptions,
        io: &mut dyn ContainerIo,
    ) -> Result<Self, ContainerError> {
        if data.is_empty() {
            return Err(ContainerError::empty_file());
        }

        let endian = version.endianness();
        let mut header = Stream::reader(data.to_vec(), endian);

        let mut index_pointer = 0u32;
        header.rw_u32(&mut index_pointer).map_err(ContainerError::stream_factory())?;

        let mut index = Stream::reader(data.to_vec(), endian);
        index.seek(index_pointer as usize).map_err(ContainerError::stream_factory())?;

        let mut magic = 0u32;
        index.rw_u32(&mut magic).map_err(ContainerError::stream_factory())?;
        if magic != INDEX_MAGIC {
            return Err(ContainerError::invalid_index_header());
        }

        let mut index_type_raw = 0u32;
        index.rw_u32(&mut index_type_raw).map_err(ContainerError::stream_factory())?;
        let index_type = IndexType::from_u32(index_type_raw).ok_or_else(ContainerError::invalid_index_type)?;

        let mut num_entries = 0u32;
        index.rw_u32(&mut num_entries).map_err(ContainerError::stream_factory())?;

        let mut records = Vec::with_capacity(num_entries as usize);
        for _ in 0..num_entries {
            let mut name_len = 0u32;
            index.rw_u32(&mut name_len).map_err(ContainerError::stream_factory())?;
            let mut name_bytes = vec![0u8; name_len as usize];
            index.rw_raw(&mut name_bytes, name_len as usize).map_err(ContainerError::stream_factory())?;
            let class_name = String::from_utf8_lossy(&name_bytes).into_owned();
            let class_tag = ClassTag::from_str_lenient(&class_name).map_err(ContainerError::class_factory())?;

            let mut cuuid = Cuuid::NULL;
            index.rw_cuuid(&mut cuuid).map_err(ContainerError::stream_factory())?;

            let mut file_offset = 0u32;
            index.rw_u32(&mut file_offset).map_err(ContainerError::stream_factory())?;

            let mut file_size = 0u32;
            index.rw_u32(&mut file_size).map_err(ContainerError::stream_factory())?;

            let mut zero = 0u32;
            index.rw_u32(&mut zero).map_err(ContainerError::stream_factory())?;
            if zero != 0 {
                return Err(ContainerError::invalid_index_zero());
            }

            let mut num_links = 0u32;
            index.rw_u32(&mut num_links).map_err(ContainerError::stream_factory())?;

            let mut lang_links = Vec::new();
            if index_type == IndexType::WithLinks {
                for _ in 0..num_links {
                    let mut link = Cuuid::NULL;
                    index.rw_cuuid(&mut link).map_err(ContainerError::stream_factory())?;
                }
                let mut num_lang_links = 0u32;
                index.rw_u32(&mut num_lang_links).map_err(ContainerError::stream_factory())?;
                for _ in 0..num_lang_links {
                    let mut code = [0u8; 4];
                    index.rw_bytes(&mut code).map_err(ContainerError::stream_factory())?;
                    let mut unknown = 0u32;
                    index.rw_u32(&mut unknown).map_err(ContainerError::stream_factory())?;
                    let mut link = Cuuid::NULL;
                    index.rw_cuuid(&mut link).map_err(ContainerError::stream_factory())?;
                    lang_links.push((Language::from_code(code), unknown, link));
                }
            }

            records.push(IndexRecord { cuuid, class_tag, file_offset, file_size, lang_links });
        }

        let mut entries = Vec::with_capacity(records.len());
        for record in records {
            let mut body = Stream::reader(data.to_vec(), endian);
            body.seek(record.file_offset as usize).map_err(ContainerError::stream_factory())?;

            let mut entry = match Entry::read_body(&mut body, version, io) {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("skipping entry at offset {}: {e}", record.file_offset);
                    continue;
                }
            };

            if entry.cuuid != record.cuuid {
                let e = ClassError::cuuid_mismatch(record.cuuid, entry.cuuid);
                warn!("at offset {}: {e}", record.file_offset);
                continue;
            }
            if entry.payload.tag() != record.class_tag {
                let e = ClassError::class_mismatch(record.class_tag, entry.payload.tag());
                warn!("at offset {}: {e}", record.file_offset);
                continue;
            }

            if let Payload::Wav(w) = &mut entry.payload {
                if w.language_links.len() == record.lang_links.len() {
                    for (link, &(_, unknown, _)) in w.language_links.iter_mut().zip(record.lang_links.iter()) {
                        link.unknown = unknown;
                    }
                } else if !record.lang_links.is_empty() {
                    warn!(
                        "entry {}: index carries {} language links but body has {}",
                        entry.cuuid,
                        record.lang_links.len(),
                        w.language_links.len()
                    );
                }
            }

            debug!(
                "read entry {} ({:?}) at offset {}, size {}",
                entry.cuuid,
                entry.payload.tag().canonical_name(),
                record.file_offset,
                record.file_size
            );
            entries.push(entry);
        }

        let mut container = Self { version, entries, options };
        container.post_read_pass();
        Ok(container)
    }

    /// Propagates HXG event names onto their linked `WavResData`, then
    /// names each language-linked `WaveFileIdObj` as
    /// `"{base_name}_{lang_abbrev}"`.
    fn post_read_pass(&mut self) {
        let index: HashMap<Cuuid, usize> = self.entries.iter().enumerate().map(|(i, e)| (e.cuuid, i)).collect();

        if self.version == Version::Hxg {
            let propagations: Vec<(Cuuid, Option<String>)> = self
                .entries
                .iter()
                .filter_map(|e| match &e.payload {
                    Payload::Event(ev) => Some((ev.wav_link, ev.base.name.clone())),
                    _ => None,
                })
                .collect();

            for (link, name) in propagations {
                if let Some(&i) = index.get(&link) {
                    if let Payload::Wav(w) = &mut self.entries[i].payload {
                        w.base.name = name;
                    }
                }
            }
        }

        let renames: Vec<(Cuuid, String)> = self
            .entries
            .iter()
            .filter_map(|e| match &e.payload {
                Payload::Wav(w) => {
                    let base_name = w.base.name.clone()?;
                    Some(
                        w.language_links
                            .iter()
                            .map(|l| (l.cuuid, format!("{base_name}_{}", l.language.abbreviation())))
                            .collect::<Vec<_>>(),
                    )
                }
                _ => None,
            })
            .flatten()
            .collect();

        for (cuuid, name) in renames {
            if let Some(&i) = index.get(&cuuid) {
                if let Payload::WaveFileId(w) = &mut self.entries[i].payload {
                    w.name = name;
                }
            }
        }
    }

    /// Serializes this container back to bytes, rebuilding the index
    /// from `entries` in their current order.
    ///
    /// # Errors
    /// Returns [`ContainerError`] if an entry fails to serialize.
    pub fn write(&self) -> Result<Vec<u8>, ContainerError> {
        let endian = self.version.endianness();

        let mut body_stream = Stream::writer(4096, endian);
        let mut placeholder = 0u32;
        body_stream.rw_u32(&mut placeholder).map_err(ContainerError::stream_factory())?;

        let mut spans = Vec::with_capacity(self.entries.len());
        for entry in &self.entries {
            let offset = body_stream.position() as u32;
            entry.write_body(&mut body_stream, self.version).map_err(ContainerError::class_factory())?;
            let file_size = body_stream.position() as u32 - offset;
            debug!(
                "wrote entry {} ({:?}) at offset {offset}, size {file_size}",
                entry.cuuid,
                entry.payload.tag().canonical_name()
            );
            spans.push((offset, file_size));
        }

        let index_pointer = body_stream.position() as u32;

        let mut index_stream = Stream::writer(1024, endian);
        let mut magic = INDEX_MAGIC;
        index_stream.rw_u32(&mut magic).map_err(ContainerError::stream_factory())?;
        let mut index_type = IndexType::WithLinks as u32;
        index_stream.rw_u32(&mut index_type).map_err(ContainerError::stream_factory())?;
        let mut num_entries = self.entries.len() as u32;
        index_stream.rw_u32(&mut num_entries).map_err(ContainerError::stream_factory())?;

        for (entry, &(offset, file_size)) in self.entries.iter().zip(spans.iter()) {
            let class_name = entry.payload.tag().to_string_for(self.version);
            let bytes = class_name.into_bytes();
            let mut len = bytes.len() as u32;
            index_stream.rw_u32(&mut len).map_err(ContainerError::stream_factory())?;
            let byte_len = bytes.len();
            let mut bytes = bytes;
            index_stream.rw_raw(&mut bytes, byte_len).map_err(ContainerError::stream_factory())?;

            let mut cuuid = entry.cuuid;
            index_stream.rw_cuuid(&mut cuuid).map_err(ContainerError::stream_factory())?;

            let mut file_offset = offset;
            index_stream.rw_u32(&mut file_offset).map_err(ContainerError::stream_factory())?;

            let mut file_size = file_size;
            index_stream.rw_u32(&mut file_size).map_err(ContainerError::stream_factory())?;

            let mut zero = 0u32;
            index_stream.rw_u32(&mut zero).map_err(ContainerError::stream_factory())?;

            let (links, lang_links): (Vec<Cuuid>, Vec<(Language, u32, Cuuid)>) = match &entry.payload {
                Payload::Wav(w) => (
                    vec![w.default_link],
                    w.language_links.iter().map(|l| (l.language, l.unknown, l.cuuid)).collect(),
                ),
                Payload::Event(e) => (vec![e.wav_link], vec![]),
                Payload::Random(r) => (r.links.iter().map(|l| l.cuuid).collect(), vec![]),
                Payload::Switch(s) => (s.links.iter().map(|l| l.cuuid).collect(), vec![]),
                Payload::Program(_) | Payload::WaveFileId(_) => (vec![], vec![]),
            };

            let mut num_links = links.len() as u32;
            index_stream.rw_u32(&mut num_links).map_err(ContainerError::stream_factory())?;
            for mut link in links {
                index_stream.rw_cuuid(&mut link).map_err(ContainerError::stream_factory())?;
            }

            let mut num_lang_links = lang_links.len() as u32;
            index_stream.rw_u32(&mut num_lang_links).map_err(ContainerError::stream_factory())?;
            for (language, unknown, mut cuuid) in lang_links {
                let mut code = language.to_code();
                index_stream.rw_bytes(&mut code).map_err(ContainerError::stream_factory())?;
                let mut unknown = unknown;
                index_stream.rw_u32(&mut unknown).map_err(ContainerError::stream_factory())?;
                index_stream.rw_cuuid(&mut cuuid).map_err(ContainerError::stream_factory())?;
            }
        }

        if self.version.pads_index() {
            let mut padding = vec![0u8; INDEX_PADDING_LEN];
            index_stream.rw_raw(&mut padding, INDEX_PADDING_LEN).map_err(ContainerError::stream_factory())?;
        }

        let mut out = body_stream.into_inner();
        out.extend_from_slice(index_stream.as_slice());

        let mut patch = Stream::writer(4, endian);
        let mut pointer = index_pointer;
        patch.rw_u32(&mut pointer).map_err(ContainerError::stream_factory())?;
        out[0..4].copy_from_slice(patch.as_slice());

        Ok(out)
    }
}

/// Reports I/O failure to an application-supplied callback, without
/// performing any filesystem access itself.
pub trait ErrorSink {
    /// Notified with a human-readable message; has no return value
    /// because the library cannot recover from a sink failure.
    fn error(&mut self, message: &str);
}

/// Supplies and accepts raw bytes for a multi-file hx-family asset set
/// (an index-bearing container file plus, in some titles, a separate
/// big data file the index's `file_offset`s point into).
pub trait ContainerIo: ErrorSink {
    /// Reads `size` bytes starting at `pos` from the asset named `path`.
    ///
    /// Returns `None` (and should call [`ErrorSink::error`]) on failure.
    /// `size` is updated to the number of bytes actually available if
    /// fewer than requested remain.
    fn read(&mut self, path: &str, pos: u64, size: &mut u64) -> Option<Vec<u8>>;

    /// Writes `data` to the asset named `path`, returning `true` on success.
    fn write(&mut self, path: &str, data: &[u8]) -> bool;
}

/// An error produced while reading or writing a [`Container`].
#[derive(Debug)]
pub struct ContainerError {
    kind: ContainerErrorKind,
}

#[derive(Debug)]
enum ContainerErrorKind {
    InvalidIndexHeader,
    InvalidIndexType,
    InvalidIndexZero,
    EmptyFile,
    UnsupportedVersion { extension: String },
    CallbackFailure { path: String },
    CorruptExtraWaveData,
    Stream(StreamError),
    Class(ClassError),
}

impl ContainerError {
    fn empty_file() -> Self {
        Self { kind: ContainerErrorKind::EmptyFile }
    }

    fn invalid_index_header() -> Self {
        Self { kind: ContainerErrorKind::InvalidIndexHeader }
    }

    fn invalid_index_type() -> Self {
        Self { kind: ContainerErrorKind::InvalidIndexType }
    }

    /// Reports that an index record's reserved `zero` field was nonzero.
    fn invalid_index_zero() -> Self {
        Self { kind: ContainerErrorKind::InvalidIndexZero }
    }

    /// Reports that a file extension does not match any known [`Version`].
    #[must_use]
    pub fn unsupported_version(extension: impl Into<String>) -> Self {
        Self { kind: ContainerErrorKind::UnsupportedVersion { extension: extension.into() } }
    }

    /// Reports that an application-supplied read/write callback failed.
    #[must_use]
    pub fn callback_failure(path: impl Into<String>) -> Self {
        Self { kind: ContainerErrorKind::CallbackFailure { path: path.into() } }
    }

    /// Reports that a secondary big-data file's bytes disagreed with
    /// what the index expected.
    #[must_use]
    pub fn corrupt_extra_wave_data() -> Self {
        Self { kind: ContainerErrorKind::CorruptExtraWaveData }
    }

    fn stream_factory() -> impl FnOnce(StreamError) -> Self {
        |e| Self { kind: ContainerErrorKind::Stream(e) }
    }

    fn class_factory() -> impl FnOnce(ClassError) -> Self {
        |e| Self { kind: ContainerErrorKind::Class(e) }
    }
}

impl Display for ContainerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ContainerErrorKind::InvalidIndexHeader => f.write_str("container index header is missing or malformed"),
            ContainerErrorKind::InvalidIndexType => f.write_str("container index type is not 1 or 2"),
            ContainerErrorKind::InvalidIndexZero => f.write_str("container index record's reserved zero field is nonzero"),
            ContainerErrorKind::EmptyFile => f.write_str("container file is empty"),
            ContainerErrorKind::UnsupportedVersion { extension } => {
                write!(f, "file extension {extension:?} does not match any known container version")
            }
            ContainerErrorKind::CallbackFailure { path } => write!(f, "I/O callback failed for {path:?}"),
            ContainerErrorKind::CorruptExtraWaveData => f.write_str("secondary wave data file is corrupt"),
            ContainerErrorKind::Stream(e) => write!(f, "{e}"),
            ContainerErrorKind::Class(e) => write!(f, "{e}"),
        }
    }
}

impl Error for ContainerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            ContainerErrorKind::Stream(e) => Some(e),
            ContainerErrorKind::Class(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{Container, ContainerIo, ContainerOptions, ErrorSink};
    use crate::class::random::RandomResData;
    use crate::class::wav_res_obj::WavResObj;
    use crate::class::{Entry, Payload};
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

    #[test]
    fn empty_container_round_trips() {
        let container = Container::new(Version::Hxc, ContainerOptions::default());
        let bytes = container.write().unwrap();
        let mut io = NoopIo;
        let read_back = Container::read(&bytes, Version::Hxc, ContainerOptions::default(), &mut io).unwrap();
        assert!(read_back.entries.is_empty());
    }

    #[test]
    fn single_entry_round_trips() {
        let mut container = Container::new(Version::Hx3, ContainerOptions::default());
        container.entries.push(Entry {
            cuuid: Cuuid::new(7),
            payload: Payload::Random(RandomResData { base: WavResObj::default(), links: vec![] }),
        });
        let bytes = container.write().unwrap();
        let mut io = NoopIo;
        let read_back = Container::read(&bytes, Version::Hx3, ContainerOptions::default(), &mut io).unwrap();
        assert_eq!(read_back.entries.len(), 1);
        assert_eq!(read_back.entries[0].cuuid, Cuuid::new(7));
    }

    #[test]
    fn empty_data_errors() {
        let mut io = NoopIo;
        assert!(Container::read(&[], Version::Hxc, ContainerOptions::default(), &mut io).is_err());
    }
}
