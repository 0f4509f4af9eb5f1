//! `ProgramResData`: an opaque scripted-behavior blob, carried through
//! unparsed except for a scan that recovers embedded resource links.

use crate::bytestream::{Endianness, Stream};
use crate::cuuid::Cuuid;
use crate::version::Version;

use super::ClassError;

/// A tag value marking a scanned 64-bit word as a `WavResData` link
/// rather than program data, matching [`Cuuid::tag`]'s convention.
const WAV_LINK_TAG: u32 = 3;

/// An opaque scripted-behavior program.
///
/// The source library never parses program bytecode beyond copying it
/// whole; this class preserves that: `bytecode` is carried through
/// unmodified on read/write, and link resolution happens via
/// [`ProgramResData::scan_linked_cuuids`] rather than field access.
/// Unlike the other id-pointer classes, a program's size field is its
/// own `u32` length prefix, not a shared `IdObjPtr`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ProgramResData {
    /// Raw, unparsed program bytes.
    pub bytecode: Vec<u8>,
}

impl ProgramResData {
    pub(crate) fn read(s: &mut Stream) -> Result<Self, ClassError> {
        let mut size = 0u32;
        s.rw_u32(&mut size).map_err(ClassError::factory())?;
        let mut bytecode = vec![0u8; size as usize];
        s.rw_raw(&mut bytecode, size as usize).map_err(ClassError::factory())?;
        Ok(Self { bytecode })
    }

    pub(crate) fn write(&self, s: &mut Stream) -> Result<(), ClassError> {
        let mut size = self.bytecode.len() as u32;
        s.rw_u32(&mut size).map_err(ClassError::factory())?;
        let len = self.bytecode.len();
        let mut bytecode = self.bytecode.clone();
        s.rw_raw(&mut bytecode, len).map_err(ClassError::factory())
    }

    /// Scans `bytecode` for embedded `WavResData` links.
    ///
    /// The bytecode is interpreted as a sequence of 8-byte-aligned
    /// 64-bit words in `version`'s endianness; a word whose top 32 bits
    /// equal [`WAV_LINK_TAG`] is treated as a link. On HX2, scanned
    /// words carry their halves in swapped order relative to the normal
    /// wire convention, so they are corrected with
    /// [`Cuuid::half_swapped`] before tag inspection.
    #[must_use]
    pub fn scan_linked_cuuids(&self, version: Version) -> Vec<Cuuid> {
        let endian = version.endianness();
        self.bytecode
            .chunks_exact(8)
            .filter_map(|chunk| {
                let hi_bytes: [u8; 4] = chunk[0..4].try_into().expect("chunk is 8 bytes");
                let lo_bytes: [u8; 4] = chunk[4..8].try_into().expect("chunk is 8 bytes");
                let (hi, lo) = match endian {
                    Endianness::Big => (u32::from_be_bytes(hi_bytes), u32::from_be_bytes(lo_bytes)),
                    Endianness::Little => (u32::from_le_bytes(hi_bytes), u32::from_le_bytes(lo_bytes)),
                };
                let cuuid = Cuuid::new((u64::from(hi) << 32) | u64::from(lo));
                let cuuid = if matches!(version, Version::Hx2) { cuuid.half_swapped() } else { cuuid };
                (cuuid.tag() == WAV_LINK_TAG).then_some(cuuid)
            })
            .collect()
    }
}

#[cfg(test)]
mod test {
    use super::ProgramResData;
    use crate::bytestream::{Endianness, Stream};
    use crate::version::Version;

    #[test]
    fn round_trips_opaque_bytecode() {
        let data = ProgramResData { bytecode: vec![0xDE, 0xAD, 0xBE, 0xEF, 0x01, 0x02] };
        let mut w = Stream::writer(32, Endianness::Little);
        data.write(&mut w).unwrap();
        let mut r = Stream::reader(w.into_inner(), Endianness::Little);
        assert_eq!(ProgramResData::read(&mut r).unwrap(), data);
    }

    #[test]
    fn scan_finds_tagged_link_little_endian() {
        let mut bytecode = vec![0u8; 8];
        bytecode[4..8].copy_from_slice(&3u32.to_le_bytes());
        let data = ProgramResData { bytecode };
        let links = data.scan_linked_cuuids(Version::Hxc);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].tag(), 3);
    }

    #[test]
    fn scan_applies_half_swap_on_hx2() {
        // On-wire word has tag 3 in the *low* half; after half-swapping
        // it lands in the tag position.
        let mut bytecode = vec![0u8; 8];
        bytecode[0..4].copy_from_slice(&3u32.to_le_bytes());
        let data = ProgramResData { bytecode };
        let links = data.scan_linked_cuuids(Version::Hx2);
        assert_eq!(links.len(), 1);
    }
}
