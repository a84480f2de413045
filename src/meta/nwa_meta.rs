//! VisualArt's NWA (`.nwa`): thin wrapper around [`NwaHeader::parse`]. NWA
//! carries no loop metadata of its own (loop points for visual-novel
//! engines using NWA typically come from an external script, out of scope
//! here); streams open as non-looping.

use super::Parser;
use crate::codecs::nwa::{Nwa, NwaHeader};
use crate::stream::{MetaType, Stream};
use crate::streamfile::Streamfile;

/// Parser for NWA differential-PCM streams.
#[derive(Debug, Default)]
pub struct NwaMeta;

impl Parser for NwaMeta {
    fn name(&self) -> &'static str {
        "VisualArt's NWA"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        if super::normalize_subsong(subsong) != 1 {
            return None;
        }

        let header = NwaHeader::parse(sf)?;
        let data_start = 0x2c + u64::from(header.blocks) * 4;
        if data_start > sf.size() {
            return None;
        }

        let channels = header.channels;
        let sample_rate = header.sample_rate;
        let samplecount = header.samplecount;
        let datasize = u64::from(header.datasize);

        let decoder = Nwa { header };

        let mut stream = Stream::allocate(channels, MetaType::Nwa, crate::codecs::CodingType::Nwa, Box::new(decoder));
        stream.sample_rate = sample_rate;
        stream.num_samples = samplecount / u32::from(channels.max(1));
        stream.stream_size = datasize;
        stream.stream_index = 1;
        stream.num_streams = 1;
        stream.layout_type = crate::layout::Layout::None;

        stream.open_stream(sf, data_start);
        Some(stream)
    }
}

#[cfg(test)]
mod test {
    use super::{NwaMeta, Parser};
    use crate::streamfile::SliceFile;

    #[test]
    fn rejects_bad_channel_count() {
        let mut data = vec![0u8; 0x2c];
        data[0..2].copy_from_slice(&3i16.to_le_bytes());
        data[0x10..0x14].copy_from_slice(&1u32.to_le_bytes());
        let mut sf = SliceFile::new(data, "t.nwa");
        assert!(NwaMeta.probe_and_open(&mut sf, 0).is_none());
    }
}
