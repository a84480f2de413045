//! Microsoft RIFF/WAVE (`.wav`): the base case every other PCM-in-RIFF
//! parser specializes. Reads the `fmt ` chunk for format tag/channels/
//! sample rate/bit depth, the `data` chunk for the sample body, and an
//! optional `smpl` chunk for loop points (the standard RIFF sampler chunk:
//! one or more loop records, each `[cue][type][start][end][fraction][play
//! count]`; this parser only needs the first record's start/end).

use super::Parser;
use crate::codecs::companding::{ALaw, MuLaw};
use crate::codecs::ima::{Ima, ImaVariant};
use crate::codecs::ms_adpcm::MsAdpcm;
use crate::codecs::pcm::{Pcm16, Pcm24Le, Pcm32Le, Pcm8, PcmFloat};
use crate::codecs::{CodingType, Decoder};
use crate::stream::{MetaType, Stream};
use crate::streamfile::Streamfile;

const FMT_PCM: u16 = 0x0001;
const FMT_MS_ADPCM: u16 = 0x0002;
const FMT_FLOAT: u16 = 0x0003;
const FMT_ALAW: u16 = 0x0006;
const FMT_MULAW: u16 = 0x0007;
const FMT_IMA_ADPCM: u16 = 0x0011;

/// Parser for standard RIFF/WAVE containers.
#[derive(Debug, Default)]
pub struct RiffWave;

fn resolve_codec(format_tag: u16, bits_per_sample: u16, block_align: u64) -> Option<(CodingType, Box<dyn Decoder>)> {
    Some(match format_tag {
        FMT_PCM if bits_per_sample == 8 => (CodingType::Pcm8, Box::new(Pcm8 { unsigned: true })),
        FMT_PCM if bits_per_sample == 16 => (CodingType::PcmS16Le, Box::new(Pcm16 { big_endian: false })),
        FMT_PCM if bits_per_sample == 24 => (CodingType::PcmS24Le, Box::new(Pcm24Le)),
        FMT_PCM if bits_per_sample == 32 => (CodingType::PcmS32Le, Box::new(Pcm32Le)),
        FMT_FLOAT if bits_per_sample == 32 => (CodingType::PcmFloat, Box::new(PcmFloat)),
        FMT_ALAW => (CodingType::ALaw, Box::new(ALaw)),
        FMT_MULAW => (CodingType::MuLaw, Box::new(MuLaw)),
        FMT_IMA_ADPCM => (CodingType::MsIma, Box::new(Ima { variant: ImaVariant::ms(block_align) })),
        FMT_MS_ADPCM => (CodingType::MsAdpcm, Box::new(MsAdpcm { block_align })),
        _ => return None,
    })
}

impl Parser for RiffWave {
    fn name(&self) -> &'static str {
        "RIFF/WAVE"
    }

    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream> {
        if !crate::io::is_id32be(0, sf, "RIFF") || !crate::io::is_id32be(8, sf, "WAVE") {
            return None;
        }
        if super::normalize_subsong(subsong) != 1 {
            return None;
        }

        let (fmt_offset, fmt_size) = crate::io::find_chunk(sf, "fmt ", 12, true)?;
        if fmt_size < 16 {
            return None;
        }
        let format_tag = crate::io::read_u16le(sf, fmt_offset);
        let channels = crate::io::read_u16le(sf, fmt_offset + 2) as u8;
        let sample_rate = crate::io::read_u32le(sf, fmt_offset + 4);
        let block_align = u64::from(crate::io::read_u16le(sf, fmt_offset + 12));
        let bits_per_sample = crate::io::read_u16le(sf, fmt_offset + 14);
        if channels == 0 || sample_rate == 0 {
            return None;
        }

        let (data_offset, data_size) = crate::io::find_chunk(sf, "data", 12, true)?;
        let (coding_type, decoder) = resolve_codec(format_tag, bits_per_sample, block_align)?;

        let bytes_per_sample = u8::try_from(bits_per_sample / 8).unwrap_or(2);
        let num_samples = decoder.bytes_to_samples(u64::from(data_size), channels).max(
            super::pcm_bytes_to_samples(u64::from(data_size), channels, bytes_per_sample),
        ) as u32;

        let mut stream = Stream::allocate(channels, MetaType::RiffWave, coding_type, decoder);
        stream.sample_rate = sample_rate;
        stream.num_samples = num_samples;
        stream.stream_size = u64::from(data_size);
        stream.frame_size = block_align;
        stream.stream_index = 1;
        stream.num_streams = 1;

        if block_align > 0 && channels > 1 && matches!(format_tag, FMT_MS_ADPCM) {
            // MS-ADPCM blocks are per-channel-interleaved at `block_align`
            // granularity handled inside the codec itself (it walks all
            // channels' headers from one shared cursor), so layout stays
            // `None` here; only PCM/IMA benefit from the interleave layout.
        } else if block_align > 0 && channels > 1 && !matches!(format_tag, FMT_IMA_ADPCM) {
            let samples_per_block = decoder_samples_per_block(coding_type, block_align, channels);
            stream.layout_type = crate::layout::Layout::Interleave(crate::layout::InterleaveParams {
                data_start: data_offset,
                block_size: block_align / u64::from(channels),
                first_block_size: 0,
                first_skip: 0,
                samples_per_block,
            });
        }

        stream.open_stream(sf, data_offset);

        if let Some((loop_start, loop_end)) = find_smpl_loop(sf) {
            stream.loop_flag = true;
            stream.loop_start_sample = loop_start;
            stream.loop_end_sample = loop_end.min(num_samples);
        }

        Some(stream)
    }
}

fn decoder_samples_per_block(coding_type: CodingType, block_align: u64, channels: u8) -> u32 {
    match coding_type {
        CodingType::Pcm8 => (block_align / u64::from(channels.max(1))) as u32,
        CodingType::PcmS16Le => (block_align / u64::from(channels.max(1)) / 2) as u32,
        _ => 1,
    }
}

/// Reads the first loop record of a `smpl` chunk, if present:
/// `[manufacturer][product][sample_period][midi_unity_note][midi_pitch_fraction]
/// [smpte_format][smpte_offset][num_sample_loops][sampler_data]` (36 bytes)
/// followed by `num_sample_loops` records of
/// `[cue_point][type][start][end][fraction][play_count]` (24 bytes each).
fn find_smpl_loop(sf: &mut dyn Streamfile) -> Option<(u32, u32)> {
    let (chunk_offset, chunk_size) = crate::io::find_chunk(sf, "smpl", 12, true)?;
    if chunk_size < 36 + 24 {
        return None;
    }
    let num_loops = crate::io::read_u32le(sf, chunk_offset + 28);
    if num_loops == 0 {
        return None;
    }
    let record_offset = chunk_offset + 36;
    let start = crate::io::read_u32le(sf, record_offset + 8);
    let end = crate::io::read_u32le(sf, record_offset + 12);
    Some((start, end))
}

#[cfg(test)]
mod test {
    use super::{Parser, RiffWave};
    use crate::streamfile::SliceFile;

    fn wav_header(channels: u16, sample_rate: u32, bits: u16, data: &[u8]) -> Vec<u8> {
        let mut out = Vec::new();
        out.extend_from_slice(b"RIFF");
        out.extend_from_slice(&(36 + data.len() as u32).to_le_bytes());
        out.extend_from_slice(b"WAVE");
        out.extend_from_slice(b"fmt ");
        out.extend_from_slice(&16u32.to_le_bytes());
        out.extend_from_slice(&1u16.to_le_bytes()); // PCM
        out.extend_from_slice(&channels.to_le_bytes());
        out.extend_from_slice(&sample_rate.to_le_bytes());
        out.extend_from_slice(&(sample_rate * u32::from(channels) * u32::from(bits) / 8).to_le_bytes());
        out.extend_from_slice(&(channels * bits / 8).to_le_bytes());
        out.extend_from_slice(&bits.to_le_bytes());
        out.extend_from_slice(b"data");
        out.extend_from_slice(&(data.len() as u32).to_le_bytes());
        out.extend_from_slice(data);
        out
    }

    #[test]
    fn parses_mono_pcm16() {
        let data = [1i16, 2, 3, 4].iter().flat_map(|v| v.to_le_bytes()).collect::<Vec<_>>();
        let mut sf = SliceFile::new(wav_header(1, 44100, 16, &data), "t.wav");
        let stream = RiffWave.probe_and_open(&mut sf, 0).expect("should parse");
        assert_eq!(stream.channels, 1);
        assert_eq!(stream.sample_rate, 44100);
        assert_eq!(stream.num_samples, 4);
    }

    #[test]
    fn rejects_non_riff() {
        let mut sf = SliceFile::new(vec![0u8; 16], "t.wav");
        assert!(RiffWave.probe_and_open(&mut sf, 0).is_none());
    }
}
