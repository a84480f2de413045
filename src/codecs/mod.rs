//! Frame-to-PCM decoders and the per-channel state they operate on.
//!
//! A codec never seeks on its own: the [layout engine](crate::layout) is
//! solely responsible for positioning [`ChannelState::offset`] at block
//! boundaries; `decode` only ever reads forward from wherever the layout put
//! it.

pub mod aica;
pub mod companding;
pub mod delegate;
pub mod ea_xa;
mod error;
pub mod hca;
pub mod ima;
pub mod ms_adpcm;
pub mod ngc_dsp;
pub mod nwa;
pub mod oki;
pub mod pcm;
pub mod ps_adpcm;
pub mod ptadpcm;
pub mod vorbis;

pub use error::{CodecError, CodecErrorKind};

use crate::streamfile::Streamfile;

/// Per-channel decoder context: an independent streamfile cursor plus
/// whatever history a codec needs to carry across `decode` calls (ADPCM
/// predictor histories, step indices, etc).
#[derive(Debug)]
pub struct ChannelState {
    /// Independent streamfile handle for this channel.
    pub streamfile: Box<dyn Streamfile>,
    /// Current read position for this channel within the stream body.
    pub offset: u64,
    /// Anchor offset this channel's data started at.
    pub start_offset: u64,
    /// Sub-position within the frame/block currently anchored at `offset`:
    /// samples already produced from it for frame codecs (PS-ADPCM, NGC
    /// DSP), or an absolute sample cursor for codecs that index blocks by
    /// sample count rather than byte offset (NWA). Always starts at `0`.
    pub frame_offset: u64,
    /// Codec-specific decode state.
    pub codec: CodecState,
}

impl ChannelState {
    /// Builds a fresh channel state reading from `streamfile` starting at
    /// `start_offset`.
    #[must_use]
    pub fn new(streamfile: Box<dyn Streamfile>, start_offset: u64) -> Self {
        Self {
            streamfile,
            offset: start_offset,
            start_offset,
            frame_offset: 0,
            codec: CodecState::None,
        }
    }
}

/// Per-codec decode history, sized to the union of every codec this crate
/// implements. Codecs with no persistent history (PCM, companding) use
/// [`CodecState::None`].
///
/// Loop-restart does not snapshot and restore this state directly (it is not
/// `Clone` — the delegated-codec and Vorbis variants own non-trivially
/// cloneable decoder state). Instead [`Stream`](crate::stream::Stream)
/// re-derives it by calling [`Decoder::seek`] to `loop_start_sample`, which
/// for every codec implemented here is equivalent to a snapshot/restore
/// since history only depends on frame-aligned position.
#[derive(Debug)]
pub enum CodecState {
    /// No persistent history between `decode` calls.
    None,
    /// Two-sample ADPCM history, shared by PS-ADPCM, NGC DSP, and MS-ADPCM.
    Adpcm {
        /// Most recently decoded sample.
        hist1: i32,
        /// Second most recently decoded sample.
        hist2: i32,
    },
    /// IMA-family history: a running sample plus a step-table index.
    Ima {
        /// Running decoded sample.
        hist: i32,
        /// Index into the IMA step-size table.
        step_index: i32,
    },
    /// Platinum PTADPCM history (3D lookup table index plus two samples).
    PtAdpcm {
        /// Most recently decoded sample.
        hist1: i16,
        /// Second most recently decoded sample.
        hist2: i16,
        /// Current row into the PTADPCM lookup table.
        index: u8,
    },
    /// OKI/Dialogic ADPCM history.
    Oki {
        /// Running decoded sample.
        hist: i32,
        /// Current step size index.
        step_index: i32,
    },
    /// NWA run-length DPCM history.
    Nwa {
        /// Running decoded sample.
        hist: i32,
    },
    /// Vorbis packet-decoder state (lewton's block-size-dependent window
    /// carry between packets).
    Vorbis(Box<vorbis::VorbisState>),
    /// Opaque state owned by a caller-supplied delegated codec.
    Delegate(Box<dyn delegate::DelegatedDecoder>),
}

/// Identifies which codec a [`crate::stream::Stream`] was opened with.
///
/// Preserved purely as a reporting tag (`format_describe`, logging); dispatch
/// itself resolves to a concrete decoder once at `open_stream` time rather
/// than matching on this enum in the hot decode loop.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum CodingType {
    /// Signed/unsigned 8-bit PCM.
    Pcm8,
    /// 16-bit PCM, little-endian.
    PcmS16Le,
    /// 16-bit PCM, big-endian.
    PcmS16Be,
    /// 24-bit PCM, little-endian.
    PcmS24Le,
    /// 32-bit PCM, little-endian.
    PcmS32Le,
    /// 32-bit IEEE float PCM.
    PcmFloat,
    /// ITU-T G.711 µ-law companded PCM.
    MuLaw,
    /// ITU-T G.711 A-law companded PCM.
    ALaw,
    /// PlayStation 4-bit ADPCM (VAG family).
    PsxAdpcm,
    /// Nintendo GameCube/Wii ADPCM.
    NgcDsp,
    /// Standard IMA ADPCM.
    ImaAdpcm,
    /// Microsoft IMA ADPCM (per-channel blocks with redundant headers).
    MsIma,
    /// Xbox IMA ADPCM (interleaved nibbles across channels).
    XboxIma,
    /// FMOD's FSB-flavored IMA ADPCM.
    FsbIma,
    /// Wwise's IMA ADPCM variant.
    WwiseIma,
    /// Microsoft ADPCM (non-IMA).
    MsAdpcm,
    /// Yamaha AICA 4-bit ADPCM.
    YamahaAica,
    /// Electronic Arts XA ADPCM.
    EaXa,
    /// Platinum Games' PTADPCM (Wwise-hosted).
    PtAdpcm,
    /// OKI/Dialogic VOX ADPCM.
    OkiAdpcm,
    /// NWA run-length DPCM.
    Nwa,
    /// CRI HCA.
    Hca,
    /// Standard Ogg Vorbis passthrough.
    Vorbis,
    /// FSB's headerless Vorbis framing.
    FsbVorbis,
    /// Delegated to a caller-supplied external decoder (MP3/AAC/XMA/etc).
    Delegated(delegate::DelegatedCodec),
}

impl CodingType {
    /// Short, human-readable name surfaced in `format_describe` and log
    /// messages.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Pcm8 => "PCM8",
            Self::PcmS16Le => "PCM16LE",
            Self::PcmS16Be => "PCM16BE",
            Self::PcmS24Le => "PCM24LE",
            Self::PcmS32Le => "PCM32LE",
            Self::PcmFloat => "PCM float",
            Self::MuLaw => "G.711 u-law",
            Self::ALaw => "G.711 A-law",
            Self::PsxAdpcm => "PS-ADPCM",
            Self::NgcDsp => "NGC DSP",
            Self::ImaAdpcm => "IMA ADPCM",
            Self::MsIma => "MS-IMA ADPCM",
            Self::XboxIma => "Xbox IMA ADPCM",
            Self::FsbIma => "FSB IMA ADPCM",
            Self::WwiseIma => "Wwise IMA ADPCM",
            Self::MsAdpcm => "MS-ADPCM",
            Self::YamahaAica => "Yamaha AICA ADPCM",
            Self::EaXa => "EA-XA",
            Self::PtAdpcm => "Platinum PTADPCM",
            Self::OkiAdpcm => "OKI/Dialogic ADPCM",
            Self::Nwa => "NWA DPCM",
            Self::Hca => "CRI HCA",
            Self::Vorbis => "Ogg Vorbis",
            Self::FsbVorbis => "FSB Vorbis",
            Self::Delegated(codec) => codec.name(),
        }
    }
}

/// Transforms compressed frames into PCM for one channel at a time.
///
/// `out` is interleaved across all of the stream's channels; this channel's
/// samples land at `out[channel_index + channels * k]` for `k` in
/// `0..samples_to_do`.
pub trait Decoder {
    /// Decodes `samples_to_do` samples starting at the channel's logical
    /// `first_sample` (relative to the start of the current layout chunk),
    /// advancing `ch.offset` as bytes are consumed.
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        channel_index: u8,
    );

    /// Resets per-channel decode history (called on loop and explicit seek
    /// to sample 0).
    fn reset(&mut self, ch: &mut ChannelState) {
        ch.codec = CodecState::None;
    }

    /// Positions the channel's decode state as if `sample` samples had
    /// already been decoded from the start. The default reopens from scratch
    /// and is only correct for non-stateful codecs; stateful codecs override
    /// this to walk frame-by-frame from the nearest frame boundary.
    fn seek(&mut self, ch: &mut ChannelState, sample: u32) {
        let _ = sample;
        self.reset(ch);
    }

    /// Number of PCM samples produced by `bytes` bytes of this codec's data,
    /// used by format parsers to compute `num_samples` when the container
    /// doesn't state it directly.
    fn bytes_to_samples(&self, bytes: u64, channels: u8) -> u64;

    /// Whether this codec decodes all channels together from a single
    /// shared bitstream cursor (Vorbis, HCA, delegated formats) rather than
    /// one independent cursor per channel. The [layout engine](crate::layout)
    /// calls multichannel codecs once per render chunk against channel 0's
    /// [`ChannelState`]; per-channel codecs (the default) are called once
    /// per channel.
    fn is_multichannel(&self) -> bool {
        false
    }
}
