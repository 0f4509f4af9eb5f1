//! Class-tag dispatch: mapping on-disk class-name strings to typed payloads.

pub mod event;
pub mod id_obj;
pub mod program;
pub mod random;
pub mod switch;
pub mod wav_res_obj;

use std::error::Error;
use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::bytestream::StreamError;
use crate::container::ContainerIo;
use crate::cuuid::Cuuid;
use crate::version::Version;

use event::EventResData;
use id_obj::WaveFileIdObj;
use program::ProgramResData;
use random::RandomResData;
use switch::SwitchResData;
use wav_res_obj::WavResData;

/// Platform-name prefixes tried, in this fixed order, when stripping a
/// class-name string down to its canonical suffix. The order is a wire
/// quirk: it is tried regardless of the container's actual version, so
/// e.g. a `"CPS2WavResData"` string parses correctly even inside an
/// `Hxg` file, and must be preserved for round-trip byte-exactness.
const PREFIXES: [&str; 5] = ["PC", "GC", "PS2", "PS3", "XBox"];

/// Identifies which concrete payload an [`Entry`] carries.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum ClassTag {
    /// `EventResData`.
    Event,
    /// `WavResData`.
    Wav,
    /// `SwitchResData`.
    Switch,
    /// `RandomResData`.
    Random,
    /// `ProgramResData`.
    Program,
    /// `WaveFileIdObj`.
    WaveFileId,
}

impl ClassTag {
    /// Returns this class's canonical (prefix-stripped) name.
    #[must_use]
    pub fn canonical_name(self) -> &'static str {
        match self {
            Self::Event => "EventResData",
            Self::Wav => "WavResData",
            Self::Switch => "SwitchResData",
            Self::Random => "RandomResData",
            Self::Program => "ProgramResData",
            Self::WaveFileId => "WaveFileIdObj",
        }
    }

    /// Returns `true` if this class's on-disk name omits the platform
    /// prefix regardless of container version. `EventResData`,
    /// `RandomResData`, and `ProgramResData` are all platform-independent
    /// in the source's class table; `WavResData` and `WaveFileIdObj` are not.
    #[must_use]
    fn is_crossversion(self) -> bool {
        matches!(self, Self::Event | Self::Random | Self::Program)
    }

    /// Formats this class's on-disk name for the given container version.
    #[must_use]
    pub fn to_string_for(self, version: Version) -> String {
        if self.is_crossversion() {
            format!("C{}", self.canonical_name())
        } else {
            format!("C{}{}", version.class_prefix(), self.canonical_name())
        }
    }

    /// Parses a class-name string as read from a container, independent
    /// of the container's own version.
    ///
    /// # Errors
    /// Returns [`ClassError::unknown_class_name`] if `s` does not match
    /// any known class after prefix stripping.
    pub fn from_str_lenient(s: &str) -> Result<Self, ClassError> {
        let Some(rest) = s.strip_prefix('C') else {
            return Err(ClassError::unknown_class_name(s));
        };
        let canonical = PREFIXES.iter().find_map(|p| rest.strip_prefix(p)).unwrap_or(rest);

        match canonical {
            "EventResData" => Ok(Self::Event),
            "WavResData" => Ok(Self::Wav),
            "SwitchResData" => Ok(Self::Switch),
            "RandomResData" => Ok(Self::Random),
            "ProgramResData" => Ok(Self::Program),
            "WaveFileIdObj" => Ok(Self::WaveFileId),
            _ => Err(ClassError::unknown_class_name(s)),
        }
    }
}

/// A single object stored in a [`crate::container::Container`]: its
/// identity and its typed payload.
#[derive(Clone, Debug, PartialEq)]
pub struct Entry {
    /// This entry's unique identifier.
    pub cuuid: Cuuid,
    /// The entry's typed payload.
    pub payload: Payload,
}

/// The typed body of an [`Entry`], one variant per concrete class.
#[derive(Clone, Debug, PartialEq)]
#[non_exhaustive]
pub enum Payload {
    /// `EventResData`.
    Event(EventResData),
    /// `WavResData`.
    Wav(WavResData),
    /// `SwitchResData`.
    Switch(SwitchResData),
    /// `RandomResData`.
    Random(RandomResData),
    /// `ProgramResData`.
    Program(ProgramResData),
    /// `WaveFileIdObj`.
    WaveFileId(WaveFileIdObj),
}

impl Payload {
    /// Returns this payload's class tag.
    #[must_use]
    pub fn tag(&self) -> ClassTag {
        match self {
            Self::Event(_) => ClassTag::Event,
            Self::Wav(_) => ClassTag::Wav,
            Self::Switch(_) => ClassTag::Switch,
            Self::Random(_) => ClassTag::Random,
            Self::Program(_) => ClassTag::Program,
            Self::WaveFileId(_) => ClassTag::WaveFileId,
        }
    }

    fn read(
        s: &mut crate::bytestream::Stream,
        tag: ClassTag,
        version: Version,
        cuuid: Cuuid,
        io: &mut dyn ContainerIo,
    ) -> Result<Self, ClassError> {
        Ok(match tag {
            ClassTag::Event => Self::Event(EventResData::read(s)?),
            ClassTag::Wav => Self::Wav(WavResData::read(s)?),
            ClassTag::Switch => Self::Switch(SwitchResData::read(s)?),
            ClassTag::Random => Self::Random(RandomResData::read(s)?),
            ClassTag::Program => Self::Program(ProgramResData::read(s)?),
            ClassTag::WaveFileId => Self::WaveFileId(WaveFileIdObj::read(s, version, cuuid, io)?),
        })
    }

    fn write(&self, s: &mut crate::bytestream::Stream, version: Version) -> Result<(), ClassError> {
        match self {
            Self::Event(e) => e.write(s),
            Self::Wav(w) => w.write(s),
            Self::Switch(sw) => sw.write(s),
            Self::Random(r) => r.write(s),
            Self::Program(p) => p.write(s),
            Self::WaveFileId(w) => w.write(s, version),
        }
    }
}

impl Entry {
    /// Reads an entry body: its length-prefixed class-name string, its
    /// CUUID, then the dispatched payload.
    ///
    /// # Errors
    /// Returns [`ClassError`] if the class name is unrecognized, the
    /// payload is malformed, or the stream overruns.
    pub(crate) fn read_body(
        s: &mut crate::bytestream::Stream,
        version: Version,
        io: &mut dyn ContainerIo,
    ) -> Result<Self, ClassError> {
        let mut name_len = 0u32;
        s.rw_u32(&mut name_len).map_err(ClassError::factory())?;
        let mut name_bytes = vec![0u8; name_len as usize];
        s.rw_raw(&mut name_bytes, name_len as usize).map_err(ClassError::factory())?;
        let class_name = String::from_utf8_lossy(&name_bytes).into_owned();
        let tag = ClassTag::from_str_lenient(&class_name)?;

        let mut cuuid = Cuuid::NULL;
        s.rw_cuuid(&mut cuuid).map_err(ClassError::factory())?;

        let payload = Payload::read(s, tag, version, cuuid, io)?;
        Ok(Self { cuuid, payload })
    }

    /// Writes this entry's class-name string, CUUID, and payload.
    ///
    /// # Errors
    /// Returns [`ClassError`] if the stream cannot accept more data.
    pub(crate) fn write_body(&self, s: &mut crate::bytestream::Stream, version: Version) -> Result<(), ClassError> {
        let class_name = self.payload.tag().to_string_for(version);
        let bytes = class_name.into_bytes();
        let mut len = bytes.len() as u32;
        s.rw_u32(&mut len).map_err(ClassError::factory())?;
        let byte_len = bytes.len();
        let mut bytes = bytes;
        s.rw_raw(&mut bytes, byte_len).map_err(ClassError::factory())?;

        let mut cuuid = self.cuuid;
        s.rw_cuuid(&mut cuuid).map_err(ClassError::factory())?;

        self.payload.write(s, version)
    }
}

/// An error produced while parsing or validating a class's on-disk representation.
#[derive(Debug)]
pub struct ClassError {
    kind: ClassErrorKind,
}

#[derive(Debug)]
enum ClassErrorKind {
    UnknownClassName { name: String },
    ClassMismatch { expected: ClassTag, found: ClassTag },
    CuuidMismatch { index_cuuid: Cuuid, entry_cuuid: Cuuid },
    InvalidWaveHeader { reason: &'static str },
    CallbackFailure { path: String },
    Stream(StreamError),
}

impl ClassError {
    /// Builds an [`ClassError::unknown_class_name`]-kind error for an
    /// unrecognized on-disk class-name string.
    #[must_use]
    pub fn unknown_class_name(name: impl Into<String>) -> Self {
        Self { kind: ClassErrorKind::UnknownClassName { name: name.into() } }
    }

    /// Builds a [`ClassError`] reporting that an index record promised
    /// one class but the entry body's own prelude names another.
    #[must_use]
    pub fn class_mismatch(expected: ClassTag, found: ClassTag) -> Self {
        Self { kind: ClassErrorKind::ClassMismatch { expected, found } }
    }

    /// Builds a [`ClassError`] reporting that an index record's CUUID
    /// disagrees with the entry body's own CUUID prelude.
    #[must_use]
    pub fn cuuid_mismatch(index_cuuid: Cuuid, entry_cuuid: Cuuid) -> Self {
        Self { kind: ClassErrorKind::CuuidMismatch { index_cuuid, entry_cuuid } }
    }

    pub(crate) fn factory() -> impl FnOnce(StreamError) -> Self {
        |e| Self { kind: ClassErrorKind::Stream(e) }
    }

    /// Builds a [`ClassError`] reporting a malformed embedded
    /// `WaveFormatHeader` (bad magic, or an assertion on `data_code`/
    /// `data_length` the on-disk EXTERNAL flag requires).
    #[must_use]
    pub fn invalid_wave_header(reason: &'static str) -> Self {
        Self { kind: ClassErrorKind::InvalidWaveHeader { reason } }
    }

    /// Builds a [`ClassError`] reporting that an application-supplied
    /// [`crate::container::ContainerIo::read`] callback failed while
    /// fetching an external `WaveFileIdObj` stream.
    #[must_use]
    pub fn callback_failure(path: impl Into<String>) -> Self {
        Self { kind: ClassErrorKind::CallbackFailure { path: path.into() } }
    }
}

impl Display for ClassError {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match &self.kind {
            ClassErrorKind::UnknownClassName { name } => write!(f, "unknown class name {name:?}"),
            ClassErrorKind::ClassMismatch { expected, found } => write!(
                f,
                "index promised class {:?} but entry body names {:?}",
                expected.canonical_name(),
                found.canonical_name()
            ),
            ClassErrorKind::CuuidMismatch { index_cuuid, entry_cuuid } => {
                write!(f, "index CUUID {index_cuuid} disagrees with entry body CUUID {entry_cuuid}")
            }
            ClassErrorKind::InvalidWaveHeader { reason } => write!(f, "invalid embedded wave header: {reason}"),
            ClassErrorKind::CallbackFailure { path } => write!(f, "I/O callback failed for {path:?}"),
            ClassErrorKind::Stream(e) => write!(f, "malformed entry body: {e}"),
        }
    }
}

impl Error for ClassError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match &self.kind {
            ClassErrorKind::Stream(e) => Some(e),
            _ => None,
        }
    }
}

#[cfg(test)]
mod test {
    use super::ClassTag;
    use crate::version::Version;

    #[test]
    fn round_trips_through_every_version() {
        for tag in [ClassTag::Event, ClassTag::Wav, ClassTag::Switch, ClassTag::Random, ClassTag::WaveFileId] {
            for &version in Version::all() {
                let s = tag.to_string_for(version);
                assert_eq!(ClassTag::from_str_lenient(&s).unwrap(), tag);
            }
        }
    }

    #[test]
    fn crossversion_class_has_no_prefix() {
        assert_eq!(ClassTag::Program.to_string_for(Version::Hxg), "CProgramResData");
    }

    #[test]
    fn prefix_stripped_regardless_of_actual_version() {
        // A PS2-prefixed name parses fine even though we didn't say which
        // container version we're in — this is the preserved quirk.
        assert_eq!(ClassTag::from_str_lenient("CPS2WavResData").unwrap(), ClassTag::Wav);
    }

    #[test]
    fn unknown_name_errors() {
        assert!(ClassTag::from_str_lenient("CBogusThing").is_err());
        assert!(ClassTag::from_str_lenient("NoLeadingC").is_err());
    }
}
