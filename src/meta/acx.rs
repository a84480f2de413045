//! CRI ACX (`.acx`): a simple subsong container, one flat table of
//! `(offset, size)` pairs pointing at independently-parseable embedded
//! streams (Ogg Vorbis in PC releases; other platforms used CRI ADX, not in
//! this crate's representative codec set). Each entry is handed to the
//! registry as its own subfile streamfile rather than parsed inline here —
//! ACX's only job is slicing out the right entry and recursing.

use super::Parser;
use crate::stream::Stream;
use crate::streamfile::{setup_subfile, Streamfile};

const MAX_SUBSONGS: u32 = 256;

/// Parser for the CRI ACX subsong container.
#[derive(Debug, Default)]
pub struct Acx;

impl Parser for Acx {
    fn name(&self) -> &'static str {
        "CRI ACX"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        if crate::io::read_u32be(sf, 0x00) != 0 {
            return None;
        }

        let total_subsongs = crate::io::read_u32be(sf, 0x04);
        if total_subsongs == 0 || total_subsongs > MAX_SUBSONGS {
            return None;
        }

        let target = super::normalize_subsong(subsong);
        if target > total_subsongs {
            return None;
        }

        let entry_offset = 0x08 + u64::from(target - 1) * 0x08;
        let subfile_offset = u64::from(crate::io::read_u32be(sf, entry_offset));
        let subfile_size = u64::from(crate::io::read_u32be(sf, entry_offset + 0x04));
        if subfile_offset + subfile_size > sf.size() {
            return None;
        }

        let fake_ext = if crate::io::is_id32be(subfile_offset, sf, "OggS") {
            "ogg"
        } else {
            return None;
        };

        let mut subfile = setup_subfile(sf, subfile_offset, subfile_size, fake_ext);
        let mut stream = crate::registry::dispatch(&mut *subfile, 1)?;
        stream.num_streams = total_subsongs;
        stream.stream_index = target;
        Some(stream)
    }
}

#[cfg(test)]
mod test {
    use super::{Acx, Parser};
    use crate::streamfile::SliceFile;

    fn ogg_payload() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(b"OggS");
        data.extend_from_slice(&[0u8; 2]);
        data.extend_from_slice(&100u64.to_le_bytes());
        data.extend_from_slice(&[0u8; 12]);
        data
    }

    #[test]
    fn rejects_too_many_subsongs() {
        let mut data = vec![0u8; 16];
        data[4..8].copy_from_slice(&300u32.to_be_bytes());
        let mut sf = SliceFile::new(data, "t.acx");
        assert!(Acx.probe_and_open(&mut sf, 0).is_none());
    }

    #[test]
    fn rejects_out_of_range_entry() {
        let payload = ogg_payload();
        let mut data = vec![0u8; 0x10];
        data[4..8].copy_from_slice(&1u32.to_be_bytes());
        data[8..12].copy_from_slice(&0x10u32.to_be_bytes());
        data[12..16].copy_from_slice(&(payload.len() as u32).to_be_bytes());
        data.extend_from_slice(&payload);
        let mut sf = SliceFile::new(data, "t.acx");
        assert!(Acx.probe_and_open(&mut sf, 2).is_none());
    }
}
