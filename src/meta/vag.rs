//! Raw headerless-body PS-ADPCM VAG (`.vag`), the classic PlayStation sound
//! format: a 0x30-byte header (magic, sample rate, declared data size, an
//! embedded name) directly followed by PS-ADPCM frames for one channel.
//! Loop points are not stored in the header — they are scanned out of the
//! ADPCM frame flag bytes via [`ps_adpcm::find_loop_offsets`].

use super::Parser;
use crate::codecs::ps_adpcm::{self, PsAdpcm};
use crate::stream::{MetaType, Stream};
use crate::streamfile::Streamfile;

const HEADER_SIZE: u64 = 0x30;

/// Parser for raw single-channel `.vag` files.
#[derive(Debug, Default)]
pub struct Vag;

impl Parser for Vag {
    fn name(&self) -> &'static str {
        "PlayStation VAG"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        if !crate::io::is_id32be(0, sf, "VAGp") {
            return None;
        }
        if super::normalize_subsong(subsong) != 1 {
            return None;
        }

        let data_size = u64::from(crate::io::read_u32be(sf, 0x0C));
        let sample_rate = crate::io::read_u32be(sf, 0x10);
        if sample_rate == 0 || data_size == 0 {
            return None;
        }
        if HEADER_SIZE + data_size > sf.size() {
            return None;
        }

        let channels = 1u8;
        let num_samples = ps_adpcm::PsAdpcm.bytes_to_samples(data_size, channels) as u32;
        let loop_info = ps_adpcm::find_loop_offsets(sf, HEADER_SIZE, data_size, channels, 0);

        let mut stream = Stream::allocate(channels, MetaType::Vag, crate::codecs::CodingType::PsxAdpcm, Box::new(PsAdpcm));
        stream.sample_rate = sample_rate;
        stream.num_samples = num_samples;
        stream.frame_size = 16;
        stream.stream_size = data_size;
        stream.stream_index = 1;
        stream.num_streams = 1;

        if let Some((loop_start, loop_end)) = loop_info {
            stream.loop_flag = true;
            stream.loop_start_sample = loop_start;
            stream.loop_end_sample = loop_end.min(num_samples);
        }

        stream.open_stream(sf, HEADER_SIZE);
        Some(stream)
    }
}

#[cfg(test)]
mod test {
    use super::{Parser, Vag};
    use crate::streamfile::SliceFile;

    fn silent_frame() -> [u8; 16] {
        [0u8; 16]
    }

    #[test]
    fn rejects_missing_magic() {
        let mut sf = SliceFile::new(vec![0u8; 0x40], "t.vag");
        assert!(Vag.probe_and_open(&mut sf, 0).is_none());
    }

    #[test]
    fn parses_mono_header_and_loop() {
        let mut data = vec![0u8; 0x30];
        data[0..4].copy_from_slice(b"VAGp");
        data[0x0C..0x10].copy_from_slice(&32u32.to_be_bytes()); // 2 frames
        data[0x10..0x14].copy_from_slice(&22050u32.to_be_bytes());

        let mut frame0 = silent_frame();
        frame0[1] = 0x06; // loop start marker
        let mut frame1 = silent_frame();
        frame1[1] = 0x03; // loop end marker

        data.extend_from_slice(&frame0);
        data.extend_from_slice(&frame1);

        let mut sf = SliceFile::new(data, "t.vag");
        let stream = Vag.probe_and_open(&mut sf, 0).expect("should parse");

        assert_eq!(stream.sample_rate, 22050);
        assert_eq!(stream.channels, 1);
        assert_eq!(stream.num_samples, 56);
        assert!(stream.loop_flag);
        assert_eq!(stream.loop_start_sample, 0);
        assert_eq!(stream.loop_end_sample, 56);
    }
}
