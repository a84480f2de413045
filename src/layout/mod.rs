//! Maps a stream's on-disk byte layout to render calls against the codec:
//! flat (`None`), fixed-size interleaved blocks (`Interleave`), or
//! container-defined variable blocks (`Blocked`).
//!
//! [`Interleave`](Layout::Interleave) and [`Blocked`](Layout::Blocked) are
//! only ever paired with per-channel codecs (the ADPCM family, PCM,
//! companding) — every codec with a fixed block size decodes one channel's
//! cursor independently. Multichannel codecs (Vorbis, HCA, delegated
//! formats) own their own packet framing and always use
//! [`Layout::None`], which is why only `decode_none` branches on
//! [`Decoder::is_multichannel`].

mod blocked;
mod interleave;

pub use blocked::{BlockInfo, BlockUpdater, BlockedState, BlockedVariant, EaSwvr};
pub use interleave::InterleaveParams;

use crate::codecs::{ChannelState, Decoder};

/// A stream's byte-layout strategy plus whatever cursor state it needs
/// across `decode` calls.
#[derive(Debug)]
pub enum Layout {
    /// No block structure: each channel's cursor advances continuously.
    /// Used by unblocked PCM/ADPCM streams and by every multichannel codec.
    None,
    /// Fixed-size interleaved blocks.
    Interleave(InterleaveParams),
    /// Container-defined variable-size blocks.
    Blocked(BlockedState),
}

impl Layout {
    /// Decodes `samples_to_do` samples starting at `current_sample`,
    /// dispatching to the layout-appropriate chunking strategy.
    pub fn decode(
        &mut self,
        decoder: &mut dyn Decoder,
        channels: &mut [ChannelState],
        current_sample: u32,
        out: &mut [i32],
        samples_to_do: u32,
    ) {
        match self {
            Self::None => decode_none(decoder, channels, out, samples_to_do),
            Self::Interleave(params) => {
                interleave::decode(params, decoder, channels, current_sample, out, samples_to_do);
            }
            Self::Blocked(state) => blocked::decode(state, decoder, channels, out, samples_to_do),
        }
    }

    /// Short, human-readable name surfaced in `format_describe`.
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Interleave(_) => "interleave",
            Self::Blocked(_) => "blocked",
        }
    }
}

fn decode_none(decoder: &mut dyn Decoder, channels: &mut [ChannelState], out: &mut [i32], samples_to_do: u32) {
    let nch = channels.len() as u8;

    if decoder.is_multichannel() {
        let first_sample = 0;
        decoder.decode(&mut channels[0], out, first_sample, samples_to_do, nch, 0);
        return;
    }

    for (i, ch) in channels.iter_mut().enumerate() {
        decoder.decode(ch, out, 0, samples_to_do, nch, i as u8);
    }
}
