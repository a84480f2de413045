//! Format dispatch: tries each registered [`Parser`](crate::meta::Parser) in
//! order against a streamfile and returns the first one that opens it.
//!
//! Order matters (§4.6): signature-checking parsers run before the
//! extension-only last resort ([`meta::RawPcm`](crate::meta::RawPcm)), and a
//! `phf` extension-hint table lets [`dispatch`] try the statistically likely
//! parser first without changing the fallback order when the hint misses
//! (a `.vag` file that turns out not to be a `VAGp` header still falls
//! through to every other parser, same as an unhinted extension would).

use crate::meta::{self, Parser};
use crate::stream::Stream;
use crate::streamfile::Streamfile;

/// Maps a lowercase extension to the name of the parser most likely to
/// claim it, used only to reorder the try-list for a faster common case;
/// never used to *skip* a parser.
static EXTENSION_HINTS: phf::Map<&'static str, &'static str> = phf::phf_map! {
    "vag" => "PlayStation VAG",
    "dsp" => "Nintendo GameCube/Wii DSP",
    "hca" => "CRI HCA",
    "nwa" => "VisualArt's NWA",
    "acx" => "CRI ACX",
    "ogg" => "Ogg Vorbis",
    "wav" => "RIFF/WAVE",
    "genh" => "GENH generic header",
    "fsb" => "FMOD FSB5",
};

/// An ordered collection of format parsers, tried in sequence.
#[derive(Debug)]
pub struct Registry {
    parsers: Vec<Box<dyn Parser>>,
}

impl Registry {
    /// Builds the registry covering every format this crate recognizes, in
    /// the fixed fallback order described in [`meta::standard_parsers`].
    #[must_use]
    pub fn standard() -> Self {
        Self { parsers: meta::standard_parsers() }
    }

    /// Tries each parser against `sf` in order, returning the first match.
    /// `subsong` is the caller's requested subsong (`0` meaning "default");
    /// each parser normalizes it itself.
    #[must_use]
    pub fn probe(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        let ext = extension_of(sf.name());
        let hinted_name = ext.and_then(|e| EXTENSION_HINTS.get(e)).copied();

        if let Some(hint) = hinted_name {
            if let Some(parser) = self.parsers.iter().find(|p| p.name() == hint) {
                if let Some(stream) = parser.probe_and_open(sf, subsong) {
                    return Some(stream);
                }
            }
        }

        self.parsers
            .iter()
            .filter(|p| hinted_name != Some(p.name()))
            .find_map(|p| p.probe_and_open(sf, subsong))
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::standard()
    }
}

fn extension_of(name: &str) -> Option<&str> {
    name.rsplit('.').next()
}

/// Free-function entry point used by parsers that recurse into the registry
/// on an embedded subfile (e.g. [`meta::Acx`](crate::meta::Acx)), without
/// needing to carry a [`Registry`] instance of their own.
#[must_use]
pub fn dispatch(sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
    Registry::standard().probe(sf, subsong)
}

#[cfg(test)]
mod test {
    use super::Registry;
    use crate::streamfile::SliceFile;

    #[test]
    fn recognizes_vag_by_signature() {
        let mut data = vec![0u8; 0x30 + 16];
        data[0..4].copy_from_slice(b"VAGp");
        data[0x0C..0x10].copy_from_slice(&16u32.to_be_bytes());
        data[0x10..0x14].copy_from_slice(&22050u32.to_be_bytes());
        let mut sf = SliceFile::new(data, "t.vag");

        let stream = Registry::standard().probe(&mut sf, 0).expect("should recognize VAG");
        assert_eq!(stream.channels, 1);
    }

    #[test]
    fn rejects_unrecognized_data() {
        let mut sf = SliceFile::new(vec![0u8; 64], "t.xyz");
        assert!(Registry::standard().probe(&mut sf, 0).is_none());
    }
}
