//! `EventResData`: a named trigger that plays a single linked resource.

use crate::bytestream::Stream;
use crate::cuuid::Cuuid;

use super::wav_res_obj::WavResObj;
use super::ClassError;

/// A named event that, when triggered, plays the resource linked by
/// `wav_link`. On HXG, `EventResData` is the only class in an event/wav
/// pair that carries a name; the post-read pass propagates it onto the
/// linked `WavResData` (see [`crate::container::Container::read`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EventResData {
    /// Shared resource-data fields (carries this event's name).
    pub base: WavResObj,
    /// The resource this event plays.
    pub wav_link: Cuuid,
}

impl EventResData {
    pub(crate) fn read(s: &mut Stream) -> Result<Self, ClassError> {
        let base = WavResObj::read(s, true)?;
        let mut wav_link = Cuuid::NULL;
        s.rw_cuuid(&mut wav_link).map_err(ClassError::factory())?;
        Ok(Self { base, wav_link })
    }

    pub(crate) fn write(&self, s: &mut Stream) -> Result<(), ClassError> {
        self.base.write(s, true)?;
        let mut wav_link = self.wav_link;
        s.rw_cuuid(&mut wav_link).map_err(ClassError::factory())?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::EventResData;
    use crate::bytestream::{Endianness, Stream};
    use crate::class::wav_res_obj::WavResObj;
    use crate::cuuid::Cuuid;

    #[test]
    fn round_trips() {
        let data = EventResData {
            base: WavResObj { name: Some("OnDoorOpen".into()), flags: 0 },
            wav_link: Cuuid::new(42),
        };
        let mut w = Stream::writer(32, Endianness::Little);
        data.write(&mut w).unwrap();
        let mut r = Stream::reader(w.into_inner(), Endianness::Little);
        assert_eq!(EventResData::read(&mut r).unwrap(), data);
    }
}
