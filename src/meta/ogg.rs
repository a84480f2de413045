//! Standard Ogg-encapsulated Vorbis passthrough: `lewton` parses the three
//! standard header packets itself (see
//! [`VorbisState::open_standard`](crate::codecs::vorbis::VorbisState::open_standard)),
//! so this parser's own job is just the container-level fields `lewton`
//! doesn't surface: total sample count (the last Ogg page's granule
//! position) and the probe/magic check.

use super::Parser;
use crate::codecs::vorbis::{Vorbis, VorbisState};
use crate::codecs::CodecState;
use crate::stream::{MetaType, Stream};
use crate::streamfile::Streamfile;

/// Parser for standard `.ogg` Vorbis files.
#[derive(Debug, Default)]
pub struct OggVorbis;

/// Bytes from the tail of the file searched for the last `OggS` page header,
/// whose granule position gives the stream's total sample count. Vorbis
/// encoders keep trailing pages small, so this comfortably covers real
/// files without scanning the whole stream.
const TAIL_SCAN_WINDOW: u64 = 64 * 1024;

fn last_page_granule(sf: &mut dyn Streamfile) -> Option<u64> {
    let size = sf.size();
    let scan_start = size.saturating_sub(TAIL_SCAN_WINDOW);
    let scan_len = (size - scan_start) as usize;
    let mut tail = vec![0u8; scan_len];
    sf.read(&mut tail, scan_start);

    tail.windows(4)
        .rposition(|w| w == b"OggS")
        .map(|pos| u64::from_le_bytes(tail[pos + 6..pos + 14].try_into().unwrap()))
}

impl Parser for OggVorbis {
    fn name(&self) -> &'static str {
        "Ogg Vorbis"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        if !crate::io::is_id32be(0, sf, "OggS") {
            return None;
        }
        if super::normalize_subsong(subsong) != 1 {
            return None;
        }

        let granule = last_page_granule(sf)?;

        let reopened = sf.open(sf.name())?;
        let state = VorbisState::open_standard(reopened, 0)?;
        let (channels, sample_rate) = match &state {
            VorbisState::Standard(ogg, _) => (
                ogg.ident_hdr.audio_channels,
                ogg.ident_hdr.audio_sample_rate,
            ),
            VorbisState::Custom(_) => unreachable!("open_standard only ever returns Standard"),
        };
        if channels == 0 {
            return None;
        }

        let mut stream = Stream::allocate(channels, MetaType::Ogg, crate::codecs::CodingType::Vorbis, Box::new(Vorbis));
        stream.sample_rate = sample_rate;
        stream.num_samples = granule as u32;
        stream.stream_size = sf.size();
        stream.stream_index = 1;
        stream.num_streams = 1;
        stream.layout_type = crate::layout::Layout::None;

        stream.open_stream(sf, 0);
        for ch in &mut stream.channels_state {
            let reopened = ch.streamfile.open(ch.streamfile.name())?;
            ch.codec = CodecState::Vorbis(Box::new(VorbisState::open_standard(reopened, 0)?));
        }

        Some(stream)
    }
}

#[cfg(test)]
mod test {
    use super::{last_page_granule, OggVorbis, Parser};
    use crate::streamfile::SliceFile;

    #[test]
    fn rejects_missing_magic() {
        let mut sf = SliceFile::new(vec![0u8; 64], "t.ogg");
        assert!(OggVorbis.probe_and_open(&mut sf, 0).is_none());
    }

    #[test]
    fn finds_last_page_granule() {
        let mut data = Vec::new();
        data.extend_from_slice(b"OggS");
        data.extend_from_slice(&[0u8; 2]);
        data.extend_from_slice(&1234u64.to_le_bytes());
        data.extend_from_slice(&[0u8; 12]);
        let mut sf = SliceFile::new(data, "t.ogg");
        assert_eq!(last_page_granule(&mut sf), Some(1234));
    }
}
