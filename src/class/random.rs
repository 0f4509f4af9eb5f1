//! `RandomResData`: plays one of several weighted links chosen at random.

use crate::bytestream::Stream;
use crate::cuuid::Cuuid;

use super::wav_res_obj::WavResObj;
use super::ClassError;

/// One candidate in a `RandomResData`'s weighted link table.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct RandomLink {
    /// Relative selection weight.
    pub weight: u32,
    /// The linked resource.
    pub cuuid: Cuuid,
}

/// A resource that, when played, selects one of `links` weighted by
/// [`RandomLink::weight`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct RandomResData {
    /// Shared resource-data fields.
    pub base: WavResObj,
    /// Weighted candidate links.
    pub links: Vec<RandomLink>,
}

impl RandomResData {
    pub(crate) fn read(s: &mut Stream) -> Result<Self, ClassError> {
        let base = WavResObj::read(s, false)?;

        let mut num_links = 0u32;
        s.rw_u32(&mut num_links).map_err(ClassError::factory())?;

        let mut links = Vec::with_capacity(num_links as usize);
        for _ in 0..num_links {
            let mut weight = 0u32;
            s.rw_u32(&mut weight).map_err(ClassError::factory())?;
            let mut cuuid = Cuuid::NULL;
            s.rw_cuuid(&mut cuuid).map_err(ClassError::factory())?;
            links.push(RandomLink { weight, cuuid });
        }

        Ok(Self { base, links })
    }

    pub(crate) fn write(&self, s: &mut Stream) -> Result<(), ClassError> {
        self.base.write(s, false)?;

        let mut num_links = self.links.len() as u32;
        s.rw_u32(&mut num_links).map_err(ClassError::factory())?;

        for link in &self.links {
            let mut weight = link.weight;
            s.rw_u32(&mut weight).map_err(ClassError::factory())?;
            let mut cuuid = link.cuuid;
            s.rw_cuuid(&mut cuuid).map_err(ClassError::factory())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{RandomLink, RandomResData};
    use crate::bytestream::{Endianness, Stream};
    use crate::cuuid::Cuuid;

    #[test]
    fn round_trips_with_multiple_links() {
        let data = RandomResData {
            base: super::WavResObj { name: None, flags: 3 },
            links: vec![
                RandomLink { weight: 1, cuuid: Cuuid::new(1) },
                RandomLink { weight: 5, cuuid: Cuuid::new(2) },
            ],
        };
        let mut w = Stream::writer(32, Endianness::Big);
        data.write(&mut w).unwrap();
        let mut r = Stream::reader(w.into_inner(), Endianness::Big);
        assert_eq!(RandomResData::read(&mut r).unwrap(), data);
    }

    #[test]
    fn no_name_field_on_wire() {
        let data = RandomResData::default();
        let mut w = Stream::writer(16, Endianness::Little);
        data.write(&mut w).unwrap();
        assert_eq!(w.into_inner().len(), 8);
    }
}
