//! Headerless Vorbis framings: FSB, Wwise, OGL, SK, VID1, and AWC all strip
//! the standard three Ogg header packets and store audio packets back to
//! back with a 2-byte little-endian length prefix, grounded in
//! `fsb_vorbis_decoder.c`'s `read_vorbis_header`/packet-framing functions.
//!
//! Since the *ident* header's fields (sample rate, channel count, block
//! sizes) are cheap to reconstruct from container metadata, this crate
//! synthesizes it the same way the teacher's `encode/vorbis.rs` does for
//! the encode direction (`init_id_header_data`), just flipped to the decode
//! side. The *setup* header is not reconstructable (it carries per-encoder
//! codebooks) — `fsb_vorbis_decoder.c` resolves this via sidecar `.fvs`
//! files or a precompiled table; this crate implements the sidecar path
//! only (`load_fvs_sidecar`), per SPEC_FULL.md §11.

use crate::codecs::ChannelState;
use crate::io::{read_u16le, read_u32le};
use crate::streamfile::Streamfile;
use lewton::header::{read_header_ident, read_header_setup, HeaderReadError, IdentHeader, SetupHeader};

/// Which headerless container framing a custom Vorbis stream uses. All
/// variants here share the same 2-byte-length-prefixed packet framing; the
/// tag exists for `format_describe` reporting and as an extension point
/// should a variant need different framing later.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Framing {
    /// FMOD FSB5.
    Fsb,
    /// Audiokinetic Wwise.
    Wwise,
    /// "OGL" variant (Shin'en).
    Ogl,
    /// Silicon Knights.
    Sk,
    /// "VID1" variant.
    Vid1,
    /// Ubisoft AWC.
    Awc,
}

/// Reads the next length-prefixed Vorbis audio packet from `ch`, advancing
/// its offset. Returns `None` at or past the stream's declared end.
pub(super) fn next_packet(_framing: &Framing, ch: &mut ChannelState) -> Option<Vec<u8>> {
    if ch.offset + 2 > ch.streamfile.size() {
        return None;
    }
    let len = u64::from(read_u16le(ch.streamfile.as_mut(), ch.offset));
    if len == 0 {
        return None;
    }
    let mut packet = vec![0u8; len as usize];
    let got = ch.streamfile.read(&mut packet, ch.offset + 2);
    if (got as u64) < len {
        return None;
    }
    ch.offset += 2 + len;
    Some(packet)
}

/// Builds a synthetic Vorbis ident header from container-supplied sample
/// rate and channel count, the same field layout as the teacher's
/// `init_id_header_data` (encode direction), parsed back with
/// `lewton::header::read_header_ident` for the decode direction.
pub fn synth_ident_header(sample_rate: u32, channels: u8) -> Result<IdentHeader, HeaderReadError> {
    const MIN_BLOCK_SIZE_EXP2: u8 = 8;
    const MAX_BLOCK_SIZE_EXP2: u8 = 11;
    const BLOCK_SIZES: u8 = (MAX_BLOCK_SIZE_EXP2 << 4) | MIN_BLOCK_SIZE_EXP2;

    let mut data = Vec::with_capacity(30);
    data.push(1);
    data.extend_from_slice(b"vorbis");
    data.extend_from_slice(&[0; 4]); // vorbis_version
    data.push(channels);
    data.extend_from_slice(&sample_rate.to_le_bytes());
    data.extend_from_slice(&[0; 4]); // bitrate_maximum
    data.extend_from_slice(&[0; 4]); // bitrate_nominal
    data.extend_from_slice(&[0; 4]); // bitrate_minimum
    data.push(BLOCK_SIZES);
    data.push(1); // framing bit

    read_header_ident(&data)
}

/// Parses a setup header loaded from an `.fvs` sidecar against the ident
/// header's channel count and block sizes.
pub fn parse_setup_header(
    data: &[u8],
    ident: &IdentHeader,
) -> Result<SetupHeader, HeaderReadError> {
    read_header_setup(data, ident.audio_channels, (ident.blocksize_0, ident.blocksize_1))
}

/// Looks up a `name.fvs` sidecar next to `sf` and returns its raw bytes, per
/// `fsb_vorbis_decoder.c`'s `load_fvs_file_single` (sidecar-only; the
/// precompiled-table fallback is out of scope, see SPEC_FULL.md §11).
#[must_use]
pub fn load_fvs_sidecar(sf: &dyn Streamfile) -> Option<Vec<u8>> {
    let base = sf.name().rsplit_once('.').map_or(sf.name(), |(stem, _)| stem);
    let mut fvs = sf.open(&format!("{base}.fvs"))?;
    let size = fvs.size();
    let mut data = vec![0u8; size as usize];
    let got = fvs.read(&mut data, 0);
    data.truncate(got);
    Some(data)
}

/// Reads a `u32` CRC32 stored alongside a custom-Vorbis stream's setup
/// header reference (the teacher's own `vorbis_crc32` field, see
/// `header/mod.rs`'s `VorbisSeekTable` chunk), used to validate that a
/// loaded `.fvs` sidecar matches the stream that wants it.
#[must_use]
pub fn read_setup_crc32(sf: &mut dyn Streamfile, offset: u64) -> u32 {
    read_u32le(sf, offset)
}

#[cfg(test)]
mod test {
    use super::synth_ident_header;

    #[test]
    fn synthesizes_plausible_ident_header() {
        let header = synth_ident_header(44100, 2).expect("synthetic ident header should parse");
        assert_eq!(header.audio_channels, 2);
        assert_eq!(header.audio_sample_rate, 44100);
    }
}
