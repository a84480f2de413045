//! Headerless raw PCM, gated on file extension since the body carries no
//! identifying magic at all. Ordered last in the registry (after every
//! signature-based parser) so it only claims files nothing else recognized;
//! assumes 44.1kHz/16-bit/stereo, the commonest raw-dump convention, since
//! there is no header field to read the real parameters from. Best effort:
//! a raw PCM file at a different rate/channel count will open but sound
//! wrong, same tradeoff the representative format set's own raw-extension
//! parsers accept.

use super::Parser;
use crate::codecs::pcm::Pcm16;
use crate::codecs::Decoder;
use crate::stream::{MetaType, Stream};
use crate::streamfile::Streamfile;

const ASSUMED_SAMPLE_RATE: u32 = 44100;
const ASSUMED_CHANNELS: u8 = 2;
const RECOGNIZED_EXTENSIONS: [&str; 2] = ["raw", "pcm"];

/// Last-resort parser for extension-only raw PCM dumps.
#[derive(Debug, Default)]
pub struct RawPcm;

fn extension_of(name: &str) -> Option<&str> {
    name.rsplit('.').next()
}

impl Parser for RawPcm {
    fn name(&self) -> &'static str {
        "headerless raw PCM"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        if super::normalize_subsong(subsong) != 1 {
            return None;
        }

        let ext = extension_of(sf.name())?.to_ascii_lowercase();
        if !RECOGNIZED_EXTENSIONS.contains(&ext.as_str()) {
            return None;
        }

        let size = sf.size();
        if size == 0 || size % (2 * u64::from(ASSUMED_CHANNELS)) != 0 {
            return None;
        }

        let decoder = Pcm16 { big_endian: false };
        let num_samples = decoder.bytes_to_samples(size, ASSUMED_CHANNELS) as u32;

        let mut stream = Stream::allocate(
            ASSUMED_CHANNELS,
            MetaType::RawPcm,
            crate::codecs::CodingType::PcmS16Le,
            Box::new(decoder),
        );
        stream.sample_rate = ASSUMED_SAMPLE_RATE;
        stream.num_samples = num_samples;
        stream.stream_size = size;
        stream.stream_index = 1;
        stream.num_streams = 1;
        stream.layout_type = crate::layout::Layout::Interleave(crate::layout::InterleaveParams {
            data_start: 0,
            block_size: 2,
            first_block_size: 0,
            first_skip: 0,
            samples_per_block: 1,
        });

        stream.open_stream(sf, 0);
        Some(stream)
    }
}

#[cfg(test)]
mod test {
    use super::{Parser, RawPcm};
    use crate::streamfile::SliceFile;

    #[test]
    fn parses_raw_extension() {
        let data = vec![0u8; 16];
        let mut sf = SliceFile::new(data, "dump.raw");
        let stream = RawPcm.probe_and_open(&mut sf, 0).expect("should parse");
        assert_eq!(stream.channels, 2);
        assert_eq!(stream.sample_rate, 44100);
        assert_eq!(stream.num_samples, 4);
    }

    #[test]
    fn rejects_unrecognized_extension() {
        let mut sf = SliceFile::new(vec![0u8; 16], "dump.bin");
        assert!(RawPcm.probe_and_open(&mut sf, 0).is_none());
    }
}
