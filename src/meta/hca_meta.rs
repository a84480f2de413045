//! CRI HCA (`.hca`): thin wrapper around [`HcaHeader::parse`], plumbing an
//! optional caller-supplied key (`StreamConfig::hca_key`, a supplemented
//! field — see SPEC_FULL.md §11) through to the decoder.

use super::Parser;
use crate::codecs::hca::{derive_key, Hca, HcaHeader};
use crate::stream::{MetaType, Stream};
use crate::streamfile::Streamfile;

/// Parser for CRI HCA streams.
#[derive(Debug, Default)]
pub struct HcaMeta;

impl HcaMeta {
    /// Parses and opens an HCA stream with an explicit key, bypassing the
    /// keyless default [`Parser::probe_and_open`] takes. Callers that know
    /// their key (from config or a successful [`Hca::test_key`]-style scan,
    /// see `codecs::hca::score_frame_checksum`) use this directly.
    #[must_use]
    pub fn open_with_key(sf: &mut dyn Streamfile, subsong: u32, key: Option<u64>) -> Option<Stream> {
        if super::normalize_subsong(subsong) != 1 {
            return None;
        }

        let header = HcaHeader::parse(sf, key)?;
        let channels = header.channels;
        if channels == 0 {
            return None;
        }

        let sample_rate = header.sample_rate;
        let block_size = header.block_size;
        let block_count = header.block_count;
        let data_offset = header.data_offset;

        let decoder = Hca { header: header.clone() };
        let num_samples = decoder.bytes_to_samples(u64::from(block_size) * u64::from(block_count), channels) as u32;

        let mut stream = Stream::allocate(channels, MetaType::Hca, crate::codecs::CodingType::Hca, Box::new(decoder));
        stream.sample_rate = sample_rate;
        stream.num_samples = num_samples;
        stream.frame_size = u64::from(block_size);
        stream.stream_size = u64::from(block_size) * u64::from(block_count);
        stream.stream_index = 1;
        stream.num_streams = 1;
        stream.layout_type = crate::layout::Layout::None;

        stream.open_stream(sf, data_offset);
        Some(stream)
    }

    /// Like [`open_with_key`](Self::open_with_key), but derives the numeric
    /// key from an ASCII keystring (e.g. `"mituba"`) via
    /// [`derive_key`](crate::codecs::hca::derive_key) first.
    #[must_use]
    pub fn open_with_keystring(sf: &mut dyn Streamfile, subsong: u32, keystring: &str) -> Option<Stream> {
        Self::open_with_key(sf, subsong, Some(derive_key(keystring)))
    }
}

impl Parser for HcaMeta {
    fn name(&self) -> &'static str {
        "CRI HCA"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        Self::open_with_key(sf, subsong, None)
    }
}

#[cfg(test)]
mod test {
    use super::{HcaMeta, Parser};
    use crate::streamfile::SliceFile;

    #[test]
    fn rejects_missing_magic() {
        let mut sf = SliceFile::new(vec![0u8; 64], "t.hca");
        assert!(HcaMeta.probe_and_open(&mut sf, 0).is_none());
    }
}
