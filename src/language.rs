//! Language tags attached to localized `WaveFileIdObj` links.

use phf::phf_map;

/// A language a `WavResData` may carry a localized audio link for.
///
/// `Unknown` represents the wire value `0` (no language tag) and always
/// round-trips back to the all-zero 4-byte code.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum Language {
    /// German.
    De,
    /// English.
    En,
    /// Spanish.
    Es,
    /// French.
    Fr,
    /// Italian.
    It,
    /// No language tag, or an unrecognized one.
    #[default]
    Unknown,
}

static CODE_TO_LANGUAGE: phf::Map<[u8; 4], Language> = phf_map! {
    [b'd', b'e', b' ', b' '] => Language::De,
    [b'e', b'n', b' ', b' '] => Language::En,
    [b'e', b's', b' ', b' '] => Language::Es,
    [b'f', b'r', b' ', b' '] => Language::Fr,
    [b'i', b't', b' ', b' '] => Language::It,
};

impl Language {
    /// Decodes a 4-byte ASCII language code as stored on the wire.
    ///
    /// An all-zero or unrecognized code decodes to [`Language::Unknown`].
    #[must_use]
    pub fn from_code(code: [u8; 4]) -> Self {
        CODE_TO_LANGUAGE.get(&code).copied().unwrap_or(Self::Unknown)
    }

    /// Encodes this language as its 4-byte wire code: lowercase two-letter
    /// tag padded with two ASCII spaces (e.g. `"de  "`).
    ///
    /// [`Language::Unknown`] encodes as all zeros.
    #[must_use]
    pub fn to_code(self) -> [u8; 4] {
        match self {
            Self::De => [b'd', b'e', b' ', b' '],
            Self::En => [b'e', b'n', b' ', b' '],
            Self::Es => [b'e', b's', b' ', b' '],
            Self::Fr => [b'f', b'r', b' ', b' '],
            Self::It => [b'i', b't', b' ', b' '],
            Self::Unknown => [0, 0, 0, 0],
        }
    }

    /// Returns the uppercase two-letter abbreviation (or the literal
    /// `"Unknown Language"`) used when forming per-language
    /// `WaveFileIdObj` names (`"{base}_{lang_abbrev}"`).
    #[must_use]
    pub fn abbreviation(self) -> &'static str {
        match self {
            Self::De => "DE",
            Self::En => "EN",
            Self::Es => "ES",
            Self::Fr => "FR",
            Self::It => "IT",
            Self::Unknown => "Unknown Language",
        }
    }
}

#[cfg(test)]
mod test {
    use super::Language;

    #[test]
    fn known_codes_round_trip() {
        for lang in [Language::De, Language::En, Language::Es, Language::Fr, Language::It] {
            assert_eq!(Language::from_code(lang.to_code()), lang);
        }
    }

    #[test]
    fn zero_code_is_unknown() {
        assert_eq!(Language::from_code([0, 0, 0, 0]), Language::Unknown);
        assert_eq!(Language::Unknown.to_code(), [0, 0, 0, 0]);
    }

    #[test]
    fn unrecognized_code_is_unknown() {
        assert_eq!(Language::from_code([b'Z', b'Z', 0, 0]), Language::Unknown);
    }

    #[test]
    fn abbreviations_are_uppercase() {
        assert_eq!(Language::En.abbreviation(), "EN");
        assert_eq!(Language::Unknown.abbreviation(), "Unknown Language");
    }

    #[test]
    fn wire_codes_are_lowercase_space_padded() {
        assert_eq!(Language::En.to_code(), *b"en  ");
        assert_eq!(Language::Fr.to_code(), *b"fr  ");
    }
}
