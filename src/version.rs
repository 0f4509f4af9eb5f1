//! Container version tags: one per platform dialect of the file format.

use std::fmt::{Display, Formatter, Result as FmtResult};

use crate::audio::AudioFormat;
use crate::bytestream::Endianness;

/// Identifies which platform dialect a container file belongs to.
///
/// Each version fixes the file's byte order and which [`AudioFormat`]s
/// its `WaveFileIdObj` entries are expected to carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Version {
    /// Legacy PC dialect (Rayman M/Arena), big-endian.
    Hxd,
    /// PC dialect (Rayman 3), little-endian.
    Hxc,
    /// PlayStation 2 dialect, little-endian.
    Hx2,
    /// GameCube dialect, big-endian.
    Hxg,
    /// Xbox dialect, big-endian.
    Hxx,
    /// PlayStation 3 dialect, little-endian.
    Hx3,
}

impl Version {
    /// Returns every known version, in the source's declaration order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        &[Self::Hxd, Self::Hxc, Self::Hx2, Self::Hxg, Self::Hxx, Self::Hx3]
    }

    /// Returns the file extension associated with this version (without a leading dot).
    #[must_use]
    pub fn extension(self) -> &'static str {
        match self {
            Self::Hxd => "hxd",
            Self::Hxc => "hxc",
            Self::Hx2 => "hx2",
            Self::Hxg => "hxg",
            Self::Hxx => "hxx",
            Self::Hx3 => "hx3",
        }
    }

    /// Returns a human-readable platform name.
    #[must_use]
    pub fn platform(self) -> &'static str {
        match self {
            Self::Hxd => "PC (legacy)",
            Self::Hxc => "PC",
            Self::Hx2 => "PS2",
            Self::Hxg => "GC",
            Self::Hxx => "Xbox",
            Self::Hx3 => "PS3",
        }
    }

    /// Returns the platform-name prefix used when forming on-disk class
    /// strings (see [`crate::class::ClassTag`]).
    #[must_use]
    pub(crate) fn class_prefix(self) -> &'static str {
        match self {
            Self::Hxd | Self::Hxc => "PC",
            Self::Hx2 => "PS2",
            Self::Hxg => "GC",
            Self::Hxx => "XBox",
            Self::Hx3 => "PS3",
        }
    }

    /// Returns this version's fixed byte order.
    #[must_use]
    pub fn endianness(self) -> Endianness {
        match self {
            Self::Hxd | Self::Hxg | Self::Hxx => Endianness::Big,
            Self::Hxc | Self::Hx2 | Self::Hx3 => Endianness::Little,
        }
    }

    /// Returns `true` if this version appends 32 bytes of zero padding
    /// after the index block on write.
    #[must_use]
    pub(crate) fn pads_index(self) -> bool {
        matches!(self, Self::Hxg | Self::Hx2)
    }

    /// Returns the set of audio formats this version's `WaveFileIdObj`
    /// entries are expected to carry. An empty slice means the version's
    /// accepted formats are not constrained by this library.
    #[must_use]
    pub fn accepted_audio_formats(self) -> &'static [AudioFormat] {
        match self {
            Self::Hxc => &[AudioFormat::Pcm, AudioFormat::Ubi],
            Self::Hx2 => &[AudioFormat::Psx],
            Self::Hxg => &[AudioFormat::Dsp],
            Self::Hxd | Self::Hxx | Self::Hx3 => &[],
        }
    }

    /// Resolves a version from a case-insensitive file extension (without a leading dot).
    #[must_use]
    pub fn from_extension(ext: &str) -> Option<Self> {
        Self::all().iter().copied().find(|v| v.extension().eq_ignore_ascii_case(ext))
    }
}

impl Default for Version {
    /// Defaults to `Hxc`, the most common PC dialect.
    fn default() -> Self {
        Self::Hxc
    }
}

impl Display for Version {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{} ({})", self.extension(), self.platform())
    }
}

#[cfg(test)]
mod test {
    use super::Version;
    use crate::bytestream::Endianness;

    #[test]
    fn endianness_matches_table() {
        assert_eq!(Version::Hxd.endianness(), Endianness::Big);
        assert_eq!(Version::Hxc.endianness(), Endianness::Little);
        assert_eq!(Version::Hx2.endianness(), Endianness::Little);
        assert_eq!(Version::Hxg.endianness(), Endianness::Big);
        assert_eq!(Version::Hxx.endianness(), Endianness::Big);
        assert_eq!(Version::Hx3.endianness(), Endianness::Little);
    }

    #[test]
    fn from_extension_is_case_insensitive() {
        assert_eq!(Version::from_extension("HXG"), Some(Version::Hxg));
        assert_eq!(Version::from_extension("hxg"), Some(Version::Hxg));
        assert_eq!(Version::from_extension("xyz"), None);
    }

    #[test]
    fn class_prefix_hxd_and_hxc_share_pc() {
        assert_eq!(Version::Hxd.class_prefix(), "PC");
        assert_eq!(Version::Hxc.class_prefix(), "PC");
    }

    #[test]
    fn only_hxg_and_hx2_pad_index() {
        assert!(Version::Hxg.pads_index());
        assert!(Version::Hx2.pads_index());
        assert!(!Version::Hxc.pads_index());
        assert!(!Version::Hx3.pads_index());
    }
}
