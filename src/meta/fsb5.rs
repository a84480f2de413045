//! FMOD Sample Bank v5 (`.fsb`), a multi-stream container: one global
//! header, a flat array of fixed-size per-stream headers (each an 8-byte
//! bitfield plus optional variable-length chunks), then every stream's raw
//! body back to back. Generalized from a standalone FSB extractor into a
//! [`Parser`] that builds one [`Stream`] for the requested subsong.

use super::Parser;
use crate::codecs::ima::{Ima, ImaVariant};
use crate::codecs::ngc_dsp::NgcDsp;
use crate::codecs::pcm::{Pcm16, Pcm24Le, Pcm32Le, Pcm8, PcmFloat};
use crate::codecs::ps_adpcm::PsAdpcm;
use crate::codecs::vorbis::custom::{load_fvs_sidecar, parse_setup_header, synth_ident_header, Framing};
use crate::codecs::vorbis::{Vorbis, VorbisState};
use crate::codecs::{CodecState, CodingType, Decoder};
use crate::stream::{MetaType, Stream};
use crate::streamfile::Streamfile;
use bilge::prelude::*;

const MAGIC: &[u8; 4] = b"FSB5";

/// Parser for FMOD FSB5 sample banks.
#[derive(Debug, Default)]
pub struct Fsb5;

#[bitsize(64)]
#[derive(Clone, Copy, FromBits)]
struct RawStreamHeader {
    has_chunks: bool,
    sample_rate_index: u4,
    channels_index: u2,
    data_offset: u27,
    num_samples: u30,
}

fn sample_rate_from_index(index: u32) -> Option<u32> {
    Some(match index {
        0 => 4000,
        1 => 8000,
        2 => 11000,
        3 => 11025,
        4 => 16000,
        5 => 22050,
        6 => 24000,
        7 => 32000,
        8 => 44100,
        9 => 48000,
        10 => 96000,
        _ => return None,
    })
}

fn channels_from_index(index: u32) -> Option<u8> {
    Some(match index {
        0 => 1,
        1 => 2,
        2 => 6,
        3 => 8,
        _ => return None,
    })
}

struct ParsedStream {
    data_offset: u64,
    size: u64,
    sample_rate: u32,
    channels: u8,
    num_samples: u32,
    loop_start: Option<u32>,
    loop_end: Option<u32>,
    dsp_coefs: Vec<[(i16, i16); 8]>,
    vorbis_setup_crc32: Option<u32>,
}

/// Reads the 8-byte stream header and, if present, its variable-length
/// chunk chain. Chunk layout is itself a 4-byte bitfield: `more_chunks`
/// flag, 24-bit size, 7-bit kind.
fn parse_stream_header(sf: &mut dyn Streamfile, offset: u64) -> Option<(ParsedStream, u64)> {
    let raw = crate::io::read_u64le(sf, offset);
    let header = RawStreamHeader::from(raw);

    let sample_rate = sample_rate_from_index(header.sample_rate_index().value().into())?;
    let channels = channels_from_index(header.channels_index().value().into())?;
    let num_samples = header.num_samples().value();
    let data_offset = u64::from(header.data_offset().value()) * 32;

    let mut parsed = ParsedStream {
        data_offset,
        size: 0,
        sample_rate,
        channels,
        num_samples,
        loop_start: None,
        loop_end: None,
        dsp_coefs: Vec::new(),
        vorbis_setup_crc32: None,
    };

    let mut cursor = offset + 8;
    if header.has_chunks() {
        loop {
            let raw_chunk = crate::io::read_u32le(sf, cursor);
            let more_chunks = raw_chunk & 1 != 0;
            let size = (raw_chunk >> 1) & 0x00FF_FFFF;
            let kind = (raw_chunk >> 25) & 0x7F;
            let body_offset = cursor + 4;

            match kind {
                1 => {
                    parsed.channels = crate::io::read_u8(sf, body_offset);
                }
                2 => {
                    parsed.sample_rate = crate::io::read_u32le(sf, body_offset);
                }
                3 => {
                    let start = crate::io::read_u32le(sf, body_offset);
                    let end = crate::io::read_u32le(sf, body_offset + 4);
                    parsed.loop_start = Some(start);
                    parsed.loop_end = Some(end);
                }
                7 => {
                    let mut coefs = Vec::with_capacity(parsed.channels as usize);
                    let mut off = body_offset;
                    for _ in 0..parsed.channels {
                        let mut pairs = [(0i16, 0i16); 8];
                        for pair in &mut pairs {
                            let c1 = crate::io::read_i16be(sf, off);
                            let c2 = crate::io::read_i16be(sf, off + 2);
                            *pair = (c1, c2);
                            off += 4;
                        }
                        off += 14;
                        coefs.push(pairs);
                    }
                    parsed.dsp_coefs = coefs;
                }
                11 => {
                    parsed.vorbis_setup_crc32 = Some(crate::io::read_u32le(sf, body_offset));
                }
                14 => {
                    let layers = crate::io::read_u32le(sf, body_offset);
                    parsed.channels = parsed.channels.saturating_mul(layers.min(255) as u8);
                }
                _ => {}
            }

            cursor = body_offset + u64::from(size);
            if !more_chunks {
                break;
            }
        }
    }

    Some((parsed, cursor.max(offset + 8)))
}

fn resolve_decoder(format: u32, dsp_coefs: Vec<[(i16, i16); 8]>) -> Option<(CodingType, Box<dyn Decoder>)> {
    Some(match format {
        1 => (CodingType::Pcm8, Box::new(Pcm8 { unsigned: true }) as Box<dyn Decoder>),
        2 => (CodingType::PcmS16Le, Box::new(Pcm16 { big_endian: false })),
        3 => (CodingType::PcmS24Le, Box::new(Pcm24Le)),
        4 => (CodingType::PcmS32Le, Box::new(Pcm32Le)),
        5 => (CodingType::PcmFloat, Box::new(PcmFloat)),
        6 => (CodingType::NgcDsp, Box::new(NgcDsp { coefs: dsp_coefs })),
        7 => (CodingType::ImaAdpcm, Box::new(Ima { variant: ImaVariant::standard(0) })),
        8 => (CodingType::PsxAdpcm, Box::new(PsAdpcm)),
        15 => (CodingType::FsbVorbis, Box::new(Vorbis)),
        // HEVAG, XMA, MPEG, CELT, ATRAC9, xWMA, FADPCM, Opus: no decoder in
        // the representative codec set; fall through to rejection below.
        _ => return None,
    })
}

impl Parser for Fsb5 {
    fn name(&self) -> &'static str {
        "FMOD FSB5"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        if crate::io::read_u32be(sf, 0) != u32::from_be_bytes(*MAGIC) {
            return None;
        }

        let version = crate::io::read_u32le(sf, 4);
        let num_streams = crate::io::read_u32le(sf, 8);
        let stream_headers_size = u64::from(crate::io::read_u32le(sf, 12));
        let name_table_size = crate::io::read_u32le(sf, 16);
        let format = crate::io::read_u32le(sf, 24);
        if num_streams == 0 || num_streams > 4096 {
            return None;
        }

        let base_header_size: u64 = if version == 0 { 64 } else { 60 };
        let target = super::normalize_subsong(subsong);
        if target > num_streams {
            return None;
        }

        let mut cursor = base_header_size;
        let mut streams = Vec::with_capacity(num_streams as usize);
        for _ in 0..num_streams {
            let (parsed, next) = parse_stream_header(sf, cursor)?;
            streams.push(parsed);
            cursor = next;
        }

        let body_start = base_header_size + stream_headers_size + u64::from(name_table_size);

        let index = (target - 1) as usize;
        let this = &streams[index];
        let next_data_offset = streams.get(index + 1).map_or(u64::MAX, |s| s.data_offset);
        let stream_size = next_data_offset.saturating_sub(this.data_offset).min(sf.size());

        let (coding_type, decoder) = resolve_decoder(format, this.dsp_coefs.clone())?;

        let mut stream = Stream::allocate(this.channels, MetaType::Fsb5, coding_type, decoder);
        stream.sample_rate = this.sample_rate;
        stream.num_samples = this.num_samples;
        stream.stream_size = stream_size;
        stream.stream_index = target;
        stream.num_streams = num_streams;

        if let (Some(start), Some(end)) = (this.loop_start, this.loop_end) {
            stream.loop_flag = true;
            stream.loop_start_sample = start;
            stream.loop_end_sample = end.min(this.num_samples);
        }

        let data_offset = body_start + this.data_offset;
        stream.open_stream(sf, data_offset);

        if format == 15 {
            let setup_data = load_fvs_sidecar(sf)?;
            for ch in &mut stream.channels_state {
                let ident = synth_ident_header(this.sample_rate, this.channels).ok()?;
                let setup = parse_setup_header(&setup_data, &ident).ok()?;
                let state = VorbisState::open_custom(ident, setup, Framing::Fsb);
                ch.codec = CodecState::Vorbis(Box::new(state));
            }
        }

        Some(stream)
    }
}

#[cfg(test)]
mod test {
    use super::{Fsb5, Parser};
    use crate::streamfile::SliceFile;

    fn minimal_fsb5_pcm16(num_samples: u32, data: &[u8]) -> Vec<u8> {
        let mut out = vec![0u8; 64];
        out[0..4].copy_from_slice(b"FSB5");
        out[4..8].copy_from_slice(&0u32.to_le_bytes()); // version 0
        out[8..12].copy_from_slice(&1u32.to_le_bytes()); // num_streams
        out[12..16].copy_from_slice(&8u32.to_le_bytes()); // stream_headers_size
        out[16..20].copy_from_slice(&0u32.to_le_bytes()); // name_table_size
        out[24..28].copy_from_slice(&2u32.to_le_bytes()); // format = Pcm16

        // stream header: has_chunks=false, sample_rate_index=8 (44100),
        // channels_index=0 (mono), data_offset=0, num_samples.
        let raw: u64 = (u64::from(num_samples) << 34) | (8u64 << 1) | 0;
        out.extend_from_slice(&raw.to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn parses_mono_pcm16_single_stream() {
        let data = [1i16, 2, 3].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        let mut sf = SliceFile::new(minimal_fsb5_pcm16(3, &data), "t.fsb");
        let stream = Fsb5.probe_and_open(&mut sf, 0).expect("should parse");
        assert_eq!(stream.channels, 1);
        assert_eq!(stream.sample_rate, 44100);
        assert_eq!(stream.num_samples, 3);
        assert_eq!(stream.num_streams, 1);
    }

    #[test]
    fn rejects_missing_magic() {
        let mut sf = SliceFile::new(vec![0u8; 64], "t.fsb");
        assert!(Fsb5.probe_and_open(&mut sf, 0).is_none());
    }

    #[test]
    fn rejects_out_of_range_subsong() {
        let data = [1i16].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        let mut sf = SliceFile::new(minimal_fsb5_pcm16(1, &data), "t.fsb");
        assert!(Fsb5.probe_and_open(&mut sf, 2).is_none());
    }
}
