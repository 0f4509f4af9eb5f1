//! `SwitchResData`: plays one of several links selected by an external
//! case index.
//!
//! Unlike the other five classes, `SwitchResData` has no counterpart in
//! the original C sources this format was reverse-engineered from; it
//! is reconstructed here structurally from `RandomResData`'s
//! `{header}{num_links}{link records}` shape, substituting a case index
//! for a selection weight in each link record.

use crate::bytestream::Stream;
use crate::cuuid::Cuuid;

use super::wav_res_obj::WavResObj;
use super::ClassError;

/// One candidate in a `SwitchResData`'s case table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SwitchLink {
    /// The external case value that selects this link.
    pub case_index: u32,
    /// The linked resource.
    pub cuuid: Cuuid,
}

/// A resource that plays the link whose `case_index` matches an
/// externally supplied switch value, starting the scan from
/// `start_index`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SwitchResData {
    /// Shared resource-data fields.
    pub base: WavResObj,
    /// Opaque per-object flag, carried through unchanged.
    pub flag: u32,
    /// First unknown/reserved field, carried through unchanged.
    pub u1: u32,
    /// Second unknown/reserved field, carried through unchanged.
    pub u2: u32,
    /// Index in `links` the scan starts from.
    pub start_index: u32,
    /// The case table.
    pub links: Vec<SwitchLink>,
}

impl SwitchResData {
    pub(crate) fn read(s: &mut Stream) -> Result<Self, ClassError> {
        let base = WavResObj::read(s, false)?;

        let mut flag = 0u32;
        let mut u1 = 0u32;
        let mut u2 = 0u32;
        let mut start_index = 0u32;
        s.rw_u32(&mut flag).map_err(ClassError::factory())?;
        s.rw_u32(&mut u1).map_err(ClassError::factory())?;
        s.rw_u32(&mut u2).map_err(ClassError::factory())?;
        s.rw_u32(&mut start_index).map_err(ClassError::factory())?;

        let mut num_links = 0u32;
        s.rw_u32(&mut num_links).map_err(ClassError::factory())?;

        let mut links = Vec::with_capacity(num_links as usize);
        for _ in 0..num_links {
            let mut case_index = 0u32;
            s.rw_u32(&mut case_index).map_err(ClassError::factory())?;
            let mut cuuid = Cuuid::NULL;
            s.rw_cuuid(&mut cuuid).map_err(ClassError::factory())?;
            links.push(SwitchLink { case_index, cuuid });
        }

        Ok(Self { base, flag, u1, u2, start_index, links })
    }

    pub(crate) fn write(&self, s: &mut Stream) -> Result<(), ClassError> {
        self.base.write(s, false)?;

        let mut flag = self.flag;
        let mut u1 = self.u1;
        let mut u2 = self.u2;
        let mut start_index = self.start_index;
        s.rw_u32(&mut flag).map_err(ClassError::factory())?;
        s.rw_u32(&mut u1).map_err(ClassError::factory())?;
        s.rw_u32(&mut u2).map_err(ClassError::factory())?;
        s.rw_u32(&mut start_index).map_err(ClassError::factory())?;

        let mut num_links = self.links.len() as u32;
        s.rw_u32(&mut num_links).map_err(ClassError::factory())?;

        for link in &self.links {
            let mut case_index = link.case_index;
            s.rw_u32(&mut case_index).map_err(ClassError::factory())?;
            let mut cuuid = link.cuuid;
            s.rw_cuuid(&mut cuuid).map_err(ClassError::factory())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{SwitchLink, SwitchResData};
    use crate::bytestream::{Endianness, Stream};
    use crate::cuuid::Cuuid;

    #[test]
    fn round_trips_with_case_table() {
        let data = SwitchResData {
            base: super::WavResObj::default(),
            flag: 1,
            u1: 0,
            u2: 0,
            start_index: 2,
            links: vec![
                SwitchLink { case_index: 0, cuuid: Cuuid::new(10) },
                SwitchLink { case_index: 1, cuuid: Cuuid::new(11) },
                SwitchLink { case_index: 2, cuuid: Cuuid::new(12) },
            ],
        };
        let mut w = Stream::writer(64, Endianness::Little);
        data.write(&mut w).unwrap();
        let mut r = Stream::reader(w.into_inner(), Endianness::Little);
        assert_eq!(SwitchResData::read(&mut r).unwrap(), data);
    }
}
