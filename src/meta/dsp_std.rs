//! Standard Nintendo GameCube/Wii "DSP" header (`.dsp`), mono, one stream
//! per file: a fixed 0x60-byte big-endian header carrying the declared
//! sample count, loop points (in nibbles), and the channel's 16-coefficient
//! predictor table, directly followed by NGC DSP frames.

use super::Parser;
use crate::codecs::ngc_dsp::{self, NgcDsp};
use crate::stream::{MetaType, Stream};
use crate::streamfile::Streamfile;

const HEADER_SIZE: u64 = 0x60;
const COEF_OFFSET: u64 = 0x1C;

/// Parser for standard mono `.dsp` files.
#[derive(Debug, Default)]
pub struct DspStd;

impl Parser for DspStd {
    fn name(&self) -> &'static str {
        "Nintendo GameCube/Wii DSP"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        if super::normalize_subsong(subsong) != 1 {
            return None;
        }
        if sf.size() < HEADER_SIZE {
            return None;
        }

        let num_samples = crate::io::read_u32be(sf, 0x00);
        let num_nibbles = u64::from(crate::io::read_u32be(sf, 0x04));
        let sample_rate = crate::io::read_u32be(sf, 0x08);
        let format = crate::io::read_u16be(sf, 0x0E);
        if num_samples == 0 || sample_rate == 0 || format != 0 {
            return None;
        }

        let loop_flag = crate::io::read_u16be(sf, 0x0C) != 0;
        let loop_start_offset = u64::from(crate::io::read_u32be(sf, 0x10));
        let loop_end_offset = u64::from(crate::io::read_u32be(sf, 0x14));

        let data_size_bytes = num_nibbles / 2;
        if HEADER_SIZE + data_size_bytes > sf.size() {
            return None;
        }

        let coefs = vec![ngc_dsp::read_coefs_be(sf, COEF_OFFSET)];
        let decoder = NgcDsp { coefs };

        let mut stream = Stream::allocate(1, MetaType::NgcDspStd, crate::codecs::CodingType::NgcDsp, Box::new(decoder));
        stream.sample_rate = sample_rate;
        stream.num_samples = num_samples;
        stream.frame_size = 8;
        stream.stream_size = data_size_bytes;
        stream.stream_index = 1;
        stream.num_streams = 1;

        if loop_flag {
            stream.loop_flag = true;
            stream.loop_start_sample = super::dsp_nibbles_to_samples(loop_start_offset) as u32;
            stream.loop_end_sample = (super::dsp_nibbles_to_samples(loop_end_offset) as u32 + 1).min(num_samples);
        }

        stream.open_stream(sf, HEADER_SIZE);
        Some(stream)
    }
}

#[cfg(test)]
mod test {
    use super::{DspStd, Parser};
    use crate::streamfile::SliceFile;

    #[test]
    fn parses_mono_header_with_coefs() {
        let mut data = vec![0u8; 0x60 + 8];
        data[0x00..0x04].copy_from_slice(&14u32.to_be_bytes()); // num_samples
        data[0x04..0x08].copy_from_slice(&16u32.to_be_bytes()); // num_nibbles (1 frame)
        data[0x08..0x0C].copy_from_slice(&32000u32.to_be_bytes());
        for i in 0..16i16 {
            data[(0x1C + i as u64 * 2) as usize..(0x1C + i as u64 * 2 + 2) as usize]
                .copy_from_slice(&i.to_be_bytes());
        }
        data[0x60] = 0x40; // header byte: predictor 4, scale 0
        // remaining 7 bytes of frame already zero

        let mut sf = SliceFile::new(data, "t.dsp");
        let stream = DspStd.probe_and_open(&mut sf, 0).expect("should parse");

        assert_eq!(stream.sample_rate, 32000);
        assert_eq!(stream.num_samples, 14);
        assert!(!stream.loop_flag);
    }

    #[test]
    fn rejects_short_file() {
        let mut sf = SliceFile::new(vec![0u8; 0x10], "t.dsp");
        assert!(DspStd.probe_and_open(&mut sf, 0).is_none());
    }
}
