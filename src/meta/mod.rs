//! Format parsers: each recognizes one container convention and, on a
//! match, builds a fully-populated [`Stream`](crate::stream::Stream).
//!
//! A parser never has side effects on rejection (§4.5's failure policy): a
//! wrong magic, an out-of-range field, or an unsupported codec variant all
//! return `None` rather than an error. Only the [`Registry`](crate::registry::Registry)
//! observes the ordering between parsers; each one here is independent and
//! self-contained.

mod acx;
mod dsp_std;
mod fsb5;
mod genh;
mod hca_meta;
mod nwa_meta;
mod ogg;
mod raw_pcm;
mod riff_wav;
mod vag;

pub use acx::Acx;
pub use dsp_std::DspStd;
pub use fsb5::Fsb5;
pub use genh::Genh;
pub use hca_meta::HcaMeta;
pub use nwa_meta::NwaMeta;
pub use ogg::OggVorbis;
pub use raw_pcm::RawPcm;
pub use riff_wav::RiffWave;
pub use vag::Vag;

use crate::codecs::{ngc_dsp, ps_adpcm, Decoder};
use crate::stream::Stream;
use crate::streamfile::Streamfile;
use std::fmt::Debug;

/// Recognizes one container convention and extracts a [`Stream`] description
/// from it.
///
/// `subsong` is the caller's requested 1-based subsong index (`0` means
/// "default", already normalized to `1` by [`crate::api::create_stream`]
/// before reaching parsers). Single-stream formats ignore it; container
/// formats use it to pick which embedded stream to open and must reject
/// (return `None`) an out-of-range request rather than clamping it.
pub trait Parser: Debug {
    /// A short, human-readable name for this parser, surfaced in
    /// [`FormatInfo::meta_name`](crate::stream::FormatInfo::meta_name) and
    /// log messages.
    fn name(&self) -> &'static str;

    /// Attempts to recognize `sf` as this parser's format and, on a match,
    /// builds a [`Stream`] for subsong `subsong`. Returns `None` on any
    /// rejection — wrong magic, malformed fields, an out-of-range subsong
    /// index, or an unsupported codec variant — with no side effects on
    /// `sf` beyond ordinary buffered reads.
    fn probe_and_open(&self, sf: &mut dyn Streamfile, subsong: u32) -> Option<Stream>;
}

/// Normalizes a subsong request: `0` means "default", i.e. the first
/// subsong, per §4.6's "subsong index travels with the streamfile"
/// convention. Every parser applies this before comparing against its own
/// subsong count, so callers and the registry can both pass `0` through
/// unconditionally.
#[must_use]
pub fn normalize_subsong(subsong: u32) -> u32 {
    if subsong == 0 {
        1
    } else {
        subsong
    }
}

/// `ps_bytes_to_samples` (§4.5's shared-helper list): PS-ADPCM byte count to
/// sample count for `channels` interleaved channels.
#[must_use]
pub fn ps_bytes_to_samples(bytes: u64, channels: u8) -> u64 {
    ps_adpcm::PsAdpcm.bytes_to_samples(bytes, channels)
}

/// `dsp_bytes_to_samples`: NGC DSP byte count to sample count for `channels`
/// interleaved channels.
#[must_use]
pub fn dsp_bytes_to_samples(bytes: u64, channels: u8) -> u64 {
    ngc_dsp::NgcDsp { coefs: Vec::new() }.bytes_to_samples(bytes, channels)
}

/// `dsp_nibbles_to_samples`: NGC DSP nibble count (as some headers state
/// directly) to sample count — 2 samples per byte, 14 samples per 16-nibble
/// frame once the 2-nibble header is excluded.
#[must_use]
pub fn dsp_nibbles_to_samples(nibbles: u64) -> u64 {
    (nibbles / 16) * 14
}

/// `pcm_bytes_to_samples`: linear PCM byte count to sample count for
/// `channels` channels at `bytes_per_sample` bytes each.
#[must_use]
pub fn pcm_bytes_to_samples(bytes: u64, channels: u8, bytes_per_sample: u8) -> u64 {
    let denom = u64::from(channels.max(1)) * u64::from(bytes_per_sample.max(1));
    bytes / denom
}

/// The standard, representative set of parsers this crate ships, in
/// dispatch order (see [`crate::registry::Registry::standard`] for the
/// ordering rationale).
#[must_use]
pub fn standard_parsers() -> Vec<Box<dyn Parser>> {
    vec![
        Box::new(Fsb5),
        Box::new(Acx),
        Box::new(HcaMeta),
        Box::new(NwaMeta),
        Box::new(DspStd),
        Box::new(Vag),
        Box::new(OggVorbis),
        Box::new(RiffWave),
        Box::new(Genh),
        Box::new(RawPcm),
    ]
}
