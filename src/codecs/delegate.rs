//! Delegated codecs: container formats whose bitstream this crate does not
//! implement (MP3, AAC, XMA, ATRAC3/3+/9, WMA, G.719, G.722.1, MPC, ...).
//!
//! The framework only requires a `decode`/`reset`/`seek` contract from these — an integrator supplies the actual bitstream decoder
//! (e.g. wrapping a system MP3/AAC library) as a [`DelegatedDecoder`] trait
//! object. This crate never implements the bitstreams itself.

use super::{ChannelState, CodecError, CodecState, Decoder};
use std::fmt::Debug;

/// Which external bitstream a [`DelegatedDecoder`] handles, kept purely for
/// reporting (`format_describe`, logging) since dispatch resolves to the
/// concrete boxed decoder at `open_stream` time.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[non_exhaustive]
pub enum DelegatedCodec {
    /// MPEG-1 Layer III.
    Mp3,
    /// MPEG-4 AAC.
    Aac,
    /// Xbox 360 XMA2.
    Xma,
    /// Sony ATRAC3.
    Atrac3,
    /// Sony ATRAC3plus.
    Atrac3Plus,
    /// Sony ATRAC9.
    Atrac9,
    /// Windows Media Audio.
    Wma,
    /// ITU-T G.719.
    G719,
    /// ITU-T G.722.1.
    G7221,
    /// Musepack.
    Mpc,
}

impl DelegatedCodec {
    /// Short, human-readable name for this delegated codec.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::Mp3 => "MP3",
            Self::Aac => "AAC",
            Self::Xma => "XMA2",
            Self::Atrac3 => "ATRAC3",
            Self::Atrac3Plus => "ATRAC3plus",
            Self::Atrac9 => "ATRAC9",
            Self::Wma => "WMA",
            Self::G719 => "G.719",
            Self::G7221 => "G.722.1",
            Self::Mpc => "Musepack",
        }
    }
}

/// Caller-supplied decoder for a container bytestream this crate does not
/// implement natively. The integrator constructs one per stream (typically
/// wrapping a system codec library) and hands it to `open_stream` as
/// `CodecState::Delegate`.
///
/// Unlike most [`Decoder`] impls, a `DelegatedDecoder` owns all channels'
/// state together (most delegated bitstreams interleave channels within one
/// encoded frame and cannot be decoded one channel at a time), so it is
/// driven once per render call against channel 0 rather than once per
/// channel — see [`Decoder::is_multichannel`].
pub trait DelegatedDecoder: Debug {
    /// Decodes `samples_to_do` interleaved samples across all of `channels`
    /// starting at `first_sample`, reading container bytes from `ch`
    /// (channel 0's streamfile, which owns the whole container's cursor for
    /// delegated formats) and writing interleaved PCM to `out`.
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
    ) -> Result<(), CodecError>;

    /// Resets decode state to the stream start.
    fn reset(&mut self, ch: &mut ChannelState);

    /// Positions decode state as if `sample` samples had already been
    /// produced. Default reopens from scratch (correct, if slow, for any
    /// delegated decoder).
    fn seek(&mut self, ch: &mut ChannelState, sample: u32) {
        let _ = sample;
        self.reset(ch);
    }

    /// The container's stated sample count, used as `num_samples` by format
    /// parsers that embed a delegated stream. Per DESIGN.md's open-question
    /// decision: XMA/ATRAC encoder-delay padding is not reconciled here —
    /// this returns the container's declared count verbatim, best-effort.
    fn declared_samples(&self) -> u64;
}

/// [`Decoder`] adapter around a boxed [`DelegatedDecoder`], so delegated
/// codecs participate in the same dispatch table as native ones. Errors
/// from the underlying decoder degrade to silence rather than propagating,
/// matching the crate's transient-decode-error handling.
#[derive(Debug)]
pub struct Delegate {
    /// The codec this delegate reports itself as.
    pub codec: DelegatedCodec,
}

impl Decoder for Delegate {
    fn decode(
        &mut self,
        ch: &mut ChannelState,
        out: &mut [i32],
        first_sample: u32,
        samples_to_do: u32,
        channels: u8,
        _channel_index: u8,
    ) {
        let mut inner = std::mem::replace(&mut ch.codec, CodecState::None);

        let Some(decoder) = delegate_mut(&mut inner) else {
            tracing::warn!("delegated decode called with no DelegatedDecoder installed");
            silence(out, samples_to_do, channels);
            ch.codec = inner;
            return;
        };

        if decoder.decode(ch, out, first_sample, samples_to_do, channels).is_err() {
            tracing::warn!("delegated decoder failed mid-stream, emitting silence");
            silence(out, samples_to_do, channels);
        }

        ch.codec = inner;
    }

    fn reset(&mut self, ch: &mut ChannelState) {
        let mut inner = std::mem::replace(&mut ch.codec, CodecState::None);
        if let Some(decoder) = delegate_mut(&mut inner) {
            decoder.reset(ch);
        }
        ch.codec = inner;
    }

    fn seek(&mut self, ch: &mut ChannelState, sample: u32) {
        let mut inner = std::mem::replace(&mut ch.codec, CodecState::None);
        if let Some(decoder) = delegate_mut(&mut inner) {
            decoder.seek(ch, sample);
        }
        ch.codec = inner;
    }

    fn bytes_to_samples(&self, _bytes: u64, _channels: u8) -> u64 {
        0
    }

    fn is_multichannel(&self) -> bool {
        true
    }
}

fn delegate_mut(state: &mut CodecState) -> Option<&mut Box<dyn DelegatedDecoder>> {
    match state {
        CodecState::Delegate(inner) => Some(inner),
        _ => None,
    }
}

fn silence(out: &mut [i32], samples_to_do: u32, channels: u8) {
    let n = (samples_to_do as usize) * (channels as usize);
    out.iter_mut().take(n).for_each(|s| *s = 0);
}
