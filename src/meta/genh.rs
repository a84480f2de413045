//! GENH: a generic external-header wrapper rather than one more
//! single-purpose raw-codec parser. A fixed-layout header in front of the
//! raw stream spells out everything a parser would otherwise have to infer
//! from a format-specific convention — channel count, sample rate,
//! interleave, loop points, a codec tag, and (for NGC DSP) a pointer to an
//! external coefficient table — so this one parser configures any of the
//! already-implemented codecs instead of needing a dedicated file per raw
//! variant.
//!
//! Layout (little-endian, all fields `u32` unless noted):
//! `"GENH"`, `channels`, `interleave`, `sample_rate`, `loop_start`,
//! `loop_end`, `codec_id`, `start_offset`, `coef_offset` (`0xFFFF_FFFF` if
//! the codec has none), `coef_spacing` (bytes between each channel's
//! coefficient block, only meaningful with DSP).

use super::Parser;
use crate::codecs::companding::{ALaw, MuLaw};
use crate::codecs::ima::{Ima, ImaVariant};
use crate::codecs::ngc_dsp::{self, NgcDsp};
use crate::codecs::pcm::{Pcm16, Pcm8};
use crate::codecs::ps_adpcm::PsAdpcm;
use crate::codecs::{CodingType, Decoder};
use crate::stream::{MetaType, Stream};
use crate::streamfile::Streamfile;

const HEADER_SIZE: u64 = 0x24;
const NO_COEF: u32 = 0xFFFF_FFFF;

const CODEC_PCM16LE: u32 = 0;
const CODEC_PCM8: u32 = 1;
const CODEC_PSX_ADPCM: u32 = 2;
const CODEC_NGC_DSP: u32 = 3;
const CODEC_IMA: u32 = 4;
const CODEC_MULAW: u32 = 5;
const CODEC_ALAW: u32 = 6;

/// Parser for the GENH generic-header convention.
#[derive(Debug, Default)]
pub struct Genh;

fn resolve_codec(
    sf: &mut dyn Streamfile,
    codec_id: u32,
    channels: u8,
    coef_offset: u32,
    coef_spacing: u32,
) -> Option<(CodingType, Box<dyn Decoder>)> {
    Some(match codec_id {
        CODEC_PCM16LE => (CodingType::PcmS16Le, Box::new(Pcm16 { big_endian: false }) as Box<dyn Decoder>),
        CODEC_PCM8 => (CodingType::Pcm8, Box::new(Pcm8 { unsigned: false })),
        CODEC_PSX_ADPCM => (CodingType::PsxAdpcm, Box::new(PsAdpcm)),
        CODEC_IMA => (CodingType::ImaAdpcm, Box::new(Ima { variant: ImaVariant::standard(0) })),
        CODEC_MULAW => (CodingType::MuLaw, Box::new(MuLaw)),
        CODEC_ALAW => (CodingType::ALaw, Box::new(ALaw)),
        CODEC_NGC_DSP => {
            if coef_offset == NO_COEF {
                return None;
            }
            let spacing = u64::from(if coef_spacing == 0 { 32 } else { coef_spacing });
            let coefs = (0..channels)
                .map(|i| ngc_dsp::read_coefs_be(sf, u64::from(coef_offset) + spacing * u64::from(i)))
                .collect();
            (CodingType::NgcDsp, Box::new(NgcDsp { coefs }))
        }
        _ => return None,
    })
}

impl Parser for Genh {
    fn name(&self) -> &'static str {
        "GENH generic header"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        if !crate::io::is_id32be(0, sf, "GENH") {
            return None;
        }
        if super::normalize_subsong(subsong) != 1 {
            return None;
        }

        let channels = crate::io::read_u32le(sf, 0x04) as u8;
        let interleave = u64::from(crate::io::read_u32le(sf, 0x08));
        let sample_rate = crate::io::read_u32le(sf, 0x0C);
        let loop_start = crate::io::read_u32le(sf, 0x10);
        let loop_end = crate::io::read_u32le(sf, 0x14);
        let codec_id = crate::io::read_u32le(sf, 0x18);
        let start_offset = u64::from(crate::io::read_u32le(sf, 0x1C));
        let coef_offset = crate::io::read_u32le(sf, 0x20);
        if channels == 0 || sample_rate == 0 {
            return None;
        }
        if start_offset < HEADER_SIZE && start_offset != 0 {
            return None;
        }

        let coef_spacing = 32;
        let (coding_type, decoder) = resolve_codec(sf, codec_id, channels, coef_offset, coef_spacing)?;

        let body_size = sf.size().saturating_sub(start_offset);
        let num_samples = decoder.bytes_to_samples(body_size, channels) as u32;

        let mut stream = Stream::allocate(channels, MetaType::Genh, coding_type, decoder);
        stream.sample_rate = sample_rate;
        stream.num_samples = num_samples;
        stream.stream_size = body_size;
        stream.stream_index = 1;
        stream.num_streams = 1;

        if channels > 1 && interleave > 0 {
            stream.layout_type = crate::layout::Layout::Interleave(crate::layout::InterleaveParams {
                data_start: start_offset,
                block_size: interleave,
                first_block_size: 0,
                first_skip: 0,
                samples_per_block: 0,
            });
        }

        if loop_end > loop_start {
            stream.loop_flag = true;
            stream.loop_start_sample = loop_start;
            stream.loop_end_sample = loop_end.min(num_samples);
        }

        stream.open_stream(sf, start_offset);
        Some(stream)
    }
}

#[cfg(test)]
mod test {
    use super::{Genh, Parser, CODEC_PCM16LE, NO_COEF};
    use crate::streamfile::SliceFile;

    fn header(channels: u32, sample_rate: u32, codec_id: u32, data: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; 0x24];
        out[0..4].copy_from_slice(b"GENH");
        out[0x04..0x08].copy_from_slice(&channels.to_le_bytes());
        out[0x0C..0x10].copy_from_slice(&sample_rate.to_le_bytes());
        out[0x18..0x1C].copy_from_slice(&codec_id.to_le_bytes());
        out[0x1C..0x20].copy_from_slice(&0x24u32.to_le_bytes());
        out[0x20..0x24].copy_from_slice(&NO_COEF.to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn parses_mono_pcm16() {
        let data = [1i16, 2, 3].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        let mut sf = SliceFile::new(header(1, 22050, CODEC_PCM16LE, &data), "t.genh");
        let stream = Genh.probe_and_open(&mut sf, 0).expect("should parse");
        assert_eq!(stream.channels, 1);
        assert_eq!(stream.sample_rate, 22050);
        assert_eq!(stream.num_samples, 3);
    }

    #[test]
    fn rejects_missing_magic() {
        let mut sf = SliceFile::new(vec![0u8; 0x24], "t.genh");
        assert!(Genh.probe_and_open(&mut sf, 0).is_none());
    }
}
