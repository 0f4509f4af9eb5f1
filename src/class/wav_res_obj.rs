//! `WavResObj`, the common base of the four playable resource-data
//! classes, and its direct serializer `WavResData`.

use tap::Pipe;

use crate::bytestream::Stream;
use crate::cuuid::Cuuid;
use crate::language::Language;

use super::ClassError;

/// Fields shared by every class that describes a playable resource:
/// `EventResData`, `WavResData`, `SwitchResData`, `RandomResData`.
///
/// Carries the resource's display name, which on HXG is only ever
/// populated on `EventResData` and must be propagated onto the linked
/// `WavResData` by the post-read pass (see
/// [`crate::container::Container::read`]).
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WavResObj {
    /// Display name, or `None` if this object carries no name of its own.
    pub name: Option<String>,
    /// Opaque per-object flags, carried through unchanged.
    pub flags: u32,
}

impl WavResObj {
    pub(super) fn read(s: &mut Stream, has_name: bool) -> Result<Self, ClassError> {
        let factory = ClassError::factory();
        let name = if has_name {
            let mut len = 0u32;
            s.rw_u32(&mut len).map_err(ClassError::factory())?;
            let mut bytes = vec![0u8; len as usize];
            s.rw_raw(&mut bytes, len as usize).map_err(factory)?;
            String::from_utf8_lossy(&bytes).into_owned().pipe(Some)
        } else {
            None
        };
        let mut flags = 0u32;
        s.rw_u32(&mut flags).map_err(ClassError::factory())?;
        Ok(Self { name, flags })
    }

    pub(super) fn write(&self, s: &mut Stream, has_name: bool) -> Result<(), ClassError> {
        if has_name {
            let name = self.name.clone().unwrap_or_default();
            let bytes = name.into_bytes();
            let mut len = bytes.len() as u32;
            s.rw_u32(&mut len).map_err(ClassError::factory())?;
            let byte_len = bytes.len();
            let mut bytes = bytes;
            s.rw_raw(&mut bytes, byte_len).map_err(ClassError::factory())?;
        }
        let mut flags = self.flags;
        s.rw_u32(&mut flags).map_err(ClassError::factory())?;
        Ok(())
    }
}

/// A link from a `WavResData` to a localized `WaveFileIdObj`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Default)]
pub struct LanguageLink {
    /// Which language this link provides audio for.
    pub language: Language,
    /// The linked `WaveFileIdObj`'s identifier.
    pub cuuid: Cuuid,
    /// Opaque value carried by the container index's redundant
    /// language-link record for this link (the body encoding itself has
    /// no such field). Preserved across read/write so type-2 index
    /// records round-trip exactly.
    pub unknown: u32,
}

/// The base sound-resource class: a single default audio link plus zero
/// or more per-language overrides.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WavResData {
    /// Fields shared with the other resource-data classes.
    pub base: WavResObj,
    /// The default (unlocalized) `WaveFileIdObj` link.
    pub default_link: Cuuid,
    /// Per-language overrides of `default_link`.
    pub language_links: Vec<LanguageLink>,
}

impl WavResData {
    pub(crate) fn read(s: &mut Stream) -> Result<Self, ClassError> {
        let base = WavResObj::read(s, true)?;
        let factory = ClassError::factory();

        let mut default_link = Cuuid::NULL;
        s.rw_cuuid(&mut default_link).map_err(factory)?;

        let mut num_links = 0u32;
        s.rw_u32(&mut num_links).map_err(ClassError::factory())?;

        let mut language_links = Vec::with_capacity(num_links as usize);
        for _ in 0..num_links {
            let mut code = [0u8; 4];
            s.rw_bytes(&mut code).map_err(ClassError::factory())?;
            let mut cuuid = Cuuid::NULL;
            s.rw_cuuid(&mut cuuid).map_err(ClassError::factory())?;
            language_links.push(LanguageLink { language: Language::from_code(code), cuuid, unknown: 0 });
        }

        Ok(Self { base, default_link, language_links })
    }

    pub(crate) fn write(&self, s: &mut Stream) -> Result<(), ClassError> {
        self.base.write(s, true)?;
        let mut default_link = self.default_link;
        s.rw_cuuid(&mut default_link).map_err(ClassError::factory())?;

        let mut num_links = self.language_links.len() as u32;
        s.rw_u32(&mut num_links).map_err(ClassError::factory())?;

        for link in &self.language_links {
            let mut code = link.language.to_code();
            s.rw_bytes(&mut code).map_err(ClassError::factory())?;
            let mut cuuid = link.cuuid;
            s.rw_cuuid(&mut cuuid).map_err(ClassError::factory())?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::{LanguageLink, WavResData};
    use crate::bytestream::{Endianness, Stream};
    use crate::cuuid::Cuuid;
    use crate::language::Language;

    #[test]
    fn round_trips_with_language_links() {
        let data = WavResData {
            base: super::WavResObj { name: Some("explosion".into()), flags: 7 },
            default_link: Cuuid::new(100),
            language_links: vec![
                LanguageLink { language: Language::Fr, cuuid: Cuuid::new(200), unknown: 0 },
                LanguageLink { language: Language::De, cuuid: Cuuid::new(300), unknown: 0 },
            ],
        };

        let mut w = Stream::writer(64, Endianness::Little);
        data.write(&mut w).unwrap();
        let bytes = w.into_inner();

        let mut r = Stream::reader(bytes, Endianness::Little);
        let read_back = WavResData::read(&mut r).unwrap();
        assert_eq!(read_back, data);
    }

    #[test]
    fn empty_name_round_trips_as_some_empty_string() {
        let data = WavResData { base: super::WavResObj::default(), default_link: Cuuid::NULL, language_links: vec![] };
        let mut w = Stream::writer(32, Endianness::Big);
        data.write(&mut w).unwrap();
        let mut r = Stream::reader(w.into_inner(), Endianness::Big);
        let read_back = WavResData::read(&mut r).unwrap();
        assert_eq!(read_back.base.name, Some(String::new()));
    }
}
